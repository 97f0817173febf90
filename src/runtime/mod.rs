//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, list_executors, status, status_all, ExecutorListing, ExecutorStatusResponse, Health};
pub use tokio_spawner::TokioSpawner;
