//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.
//!
//! Policy anomalies (for example a dropped apex NS record) are not errors:
//! they are logged with `tracing::warn!` and processing continues.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Collaborator I/O failure (network, non-2xx status)
    ///
    /// Always propagated to the caller and never retried internally.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Native record data that cannot be mapped to a canonical record
    #[error("Parse error in record {record}: {message}")]
    Parse {
        /// Identity of the offending record (name, type and id if known)
        record: String,
        /// What was wrong with it
        message: String,
    },

    /// Record type with no native encoding or not allowed by the provider
    #[error("Unsupported record type: {0}")]
    UnsupportedType(String),

    /// Internal invariant violation while diffing or planning
    #[error("Diff error: {0}")]
    Diff(String),

    /// A structural error scoped to one zone
    #[error("zone {zone}: {source}")]
    Zone {
        /// Zone name
        zone: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// Failure while executing one correction against the remote zone
    #[error("correction \"{description}\" failed: {source}")]
    Correction {
        /// Description of the correction that failed
        description: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a parse error for the given record identity
    pub fn parse(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type(rtype: impl Into<String>) -> Self {
        Self::UnsupportedType(rtype.into())
    }

    /// Create a diff (internal invariant) error
    pub fn diff(msg: impl Into<String>) -> Self {
        Self::Diff(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Attach a zone name to this error
    ///
    /// Errors that already carry a zone are returned unchanged.
    pub fn in_zone(self, zone: impl Into<String>) -> Self {
        match self {
            err @ Self::Zone { .. } => err,
            other => Self::Zone {
                zone: zone.into(),
                source: Box::new(other),
            },
        }
    }

    /// Attribute this error to a specific correction
    pub fn in_correction(self, description: impl Into<String>) -> Self {
        Self::Correction {
            description: description.into(),
            source: Box::new(self),
        }
    }

    /// True if this error (or the error it wraps) came from the transport
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Zone { source, .. } | Self::Correction { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
