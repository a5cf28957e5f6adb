use std::fmt;

use crate::validate::ValidationError;

/// Why a dataset could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    /// The request never produced a response (connection, IO).
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The server answered with a non-success status.
    Status { code: u16, location: String },
    /// Nothing exists at the location.
    NotFound { location: String },
    /// The payload is not the expected JSON shape.
    Decode(serde_json::Error),
    /// The payload decoded but failed validation.
    Invalid(ValidationError),
}

impl LoadError {
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LoadError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Transient failures worth another attempt. Bad payloads never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Transport { .. } => true,
            LoadError::Status { code, .. } => *code >= 500 || *code == 429,
            LoadError::NotFound { .. } | LoadError::Decode(_) | LoadError::Invalid(_) => false,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Transport { message, source } => match source {
                Some(source) => write!(f, "{message}: {source}"),
                None => write!(f, "{message}"),
            },
            LoadError::Status { code, location } => write!(f, "{location} returned HTTP {code}"),
            LoadError::NotFound { location } => write!(f, "{location} not found"),
            LoadError::Decode(err) => write!(f, "malformed payload: {err}"),
            LoadError::Invalid(err) => write!(f, "invalid payload: {err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Transport { source, .. } => source.as_ref().map(|e| e.as_ref() as _),
            LoadError::Decode(err) => Some(err),
            LoadError::Invalid(err) => Some(err),
            LoadError::Status { .. } | LoadError::NotFound { .. } => None,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Decode(err)
    }
}

impl From<ValidationError> for LoadError {
    fn from(err: ValidationError) -> Self {
        LoadError::Invalid(err)
    }
}
