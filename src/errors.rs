use aws_sdk_sqs::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("AWS service error{}: {message}", code_suffix(.code))]
    Service {
        code: Option<String>,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Failed to serialize or parse data: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl ActionError {
    pub fn service(code: &str, message: impl Into<String>) -> Self {
        ActionError::Service {
            code: Some(code.to_string()),
            message: message.into(),
        }
    }

    /// AWS error code for service failures, e.g. `ResourceNotFoundException`.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            ActionError::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True for local not-found errors and for service codes that name a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            ActionError::NotFound(_) => true,
            ActionError::Service { code: Some(code), .. } => {
                code.contains("NotFound") || code.starts_with("NoSuch")
            }
            _ => false,
        }
    }
}

// Every aws-sdk-* crate re-exports the same SdkError type, so one impl covers all services.
impl<E, R> From<SdkError<E, R>> for ActionError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(error: SdkError<E, R>) -> Self {
        let code = error.code().map(str::to_string);
        let message = error
            .message()
            .map_or_else(|| DisplayErrorContext(&error).to_string(), str::to_string);
        ActionError::Service { code, message }
    }
}

impl From<BuildError> for ActionError {
    fn from(error: BuildError) -> Self {
        ActionError::InvalidInput(error.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(error: serde_json::Error) -> Self {
        ActionError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for ActionError {
    fn from(error: std::io::Error) -> Self {
        ActionError::Io(error.to_string())
    }
}
