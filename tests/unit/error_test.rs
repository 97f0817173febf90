//! Tests for error types

use prometheus_task_executor::core::{AppResult, SchedulerError};

#[test]
fn test_invalid_argument_error() {
    let err = SchedulerError::InvalidArgument("slots must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid argument: slots must be greater than 0");
}

#[test]
fn test_closed_error() {
    let err = SchedulerError::Closed;
    assert_eq!(format!("{}", err), "executor is closed");
}

#[test]
fn test_conflict_error() {
    let err = SchedulerError::Conflict;
    assert_eq!(
        format!("{}", err),
        "another submission is already waiting for slots"
    );
}

#[test]
fn test_runtime_error() {
    let err = SchedulerError::Runtime("no reactor running".to_string());
    assert_eq!(format!("{}", err), "runtime error: no reactor running");
}

#[test]
fn test_converts_into_app_result() {
    fn submit() -> AppResult<()> {
        Err(SchedulerError::Closed)?;
        Ok(())
    }
    let err = submit().unwrap_err();
    assert_eq!(err.downcast_ref::<SchedulerError>(), Some(&SchedulerError::Closed));
}
