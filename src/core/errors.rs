use super::types::JobId;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A device operation was invoked outside its precondition state.
    /// The device and job are left untouched.
    #[error("{device} rejected {operation} while {state}")]
    InvalidTransition {
        device: String,
        operation: &'static str,
        state: String,
    },

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("job {0} not found")]
    UnknownJob(JobId),

    #[error("thread pool: {0}")]
    ThreadPool(String),
}

impl SimError {
    pub fn invalid_transition(
        device: impl Into<String>,
        operation: &'static str,
        state: impl std::fmt::Debug,
    ) -> Self {
        Self::InvalidTransition {
            device: device.into(),
            operation,
            state: format!("{:?}", state),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
