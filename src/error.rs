use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotConfigured,
    NotSignedIn,
    Network,
    Unauthorized,
    NotFound,
    ValidationError,
    RateLimited,
    SerializationError,
    IoError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::Network => "NETWORK",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::IoError => "IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StudyError {
    pub code: ErrorCode,
    pub message: String,
    /// Server-provided Retry-After, seconds. Only set for RateLimited.
    pub retry_after: Option<u64>,
}

impl StudyError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn not_configured() -> Self {
        Self::new(
            ErrorCode::NotConfigured,
            "studytrack is not configured. Run `studytrack init --api-url <url>` first.",
        )
    }

    pub fn not_signed_in() -> Self {
        Self::new(
            ErrorCode::NotSignedIn,
            "Not signed in. Run `studytrack login` first.",
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Not found: {what}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        let message = match wait_hint(retry_after) {
            Some(hint) => format!("Rate limit reached. Please try again after {hint}."),
            None => "Rate limit reached. Please try again later.".to_string(),
        };
        Self {
            code: ErrorCode::RateLimited,
            message,
            retry_after,
        }
    }
}

impl From<serde_json::Error> for StudyError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

impl From<std::io::Error> for StudyError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

/// Human wait hint for a Retry-After value: seconds under a minute,
/// minutes (rounded up) otherwise.
fn wait_hint(retry_after: Option<u64>) -> Option<String> {
    let seconds = retry_after?;
    if seconds < 60 {
        Some(format!("{seconds} seconds"))
    } else {
        Some(format!("{} minutes", seconds.div_ceil(60)))
    }
}
