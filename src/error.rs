use std::fmt;

use thiserror::Error;

/// Failure to obtain a usable rule document.
///
/// `Clone` so a single failed rebuild can be reported to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSourceError {
    /// The file or endpoint could not be read.
    #[error("rule source '{location}' is unavailable: {message}")]
    SourceUnavailable { location: String, message: String },

    /// The content was read but is not a valid rule document.
    #[error("malformed rule document from '{location}': {message}")]
    MalformedDocument { location: String, message: String },
}

impl RuleSourceError {
    pub(crate) fn unavailable(location: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            location: location.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn malformed(location: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::MalformedDocument {
            location: location.to_string(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::SourceUnavailable { location, .. } | Self::MalformedDocument { location, .. } => {
                location
            }
        }
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument { .. })
    }
}

/// Outcome of a failed access check.
///
/// `Denied` is a policy decision; the other variants mean no decision could
/// be made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Access Denied: {message}")]
    Denied { message: String },

    #[error("access control is misconfigured: {0}")]
    Configuration(#[from] RuleSourceError),

    #[error("invalid access check: {message}")]
    InvalidRequest { message: String },
}

impl AccessError {
    pub(crate) fn denied(message: impl Into<String>) -> Self {
        Self::Denied {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Invalid access control configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key}: must not be empty")]
    MissingProperty { key: &'static str },

    #[error("Invalid configuration property {key}: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("unknown configuration property '{key}'")]
    UnknownProperty { key: String },

    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
}
