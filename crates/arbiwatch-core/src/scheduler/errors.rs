use crate::errors::ArbiwatchError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Refresh scheduler is already running")]
    AlreadyRunning,

    #[error("Refresh scheduler must be started inside a tokio runtime")]
    NoRuntime,
}

impl ArbiwatchError for SchedulerError {
    fn error_code(&self) -> &'static str {
        match self {
            SchedulerError::AlreadyRunning => "SCHEDULER_ALREADY_RUNNING",
            SchedulerError::NoRuntime => "SCHEDULER_NO_RUNTIME",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, SchedulerError::AlreadyRunning)
    }
}
