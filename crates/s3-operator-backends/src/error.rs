//! Backend error types

use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Failures raised by storage backends
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend does not offer this operation at all
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// No backend with this name exists
    #[error("Unsupported backend: {name}. Valid backends: versitygw, minio, garage")]
    UnknownBackend { name: String },

    /// Backend configuration cannot be used to build a client
    #[error("Invalid backend configuration: {message}")]
    InvalidConfig { message: String },

    /// The admin API answered with a non-2xx status
    #[error("{operation} failed: status {status}, body: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect, timeout, I/O)
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The object-storage protocol call failed
    #[error("{operation} failed: {message}")]
    ObjectStore {
        operation: &'static str,
        message: String,
    },

    /// A response arrived but could not be understood
    #[error("{operation} returned an unreadable response: {message}")]
    Protocol {
        operation: &'static str,
        message: String,
    },
}

impl BackendError {
    /// Create an unsupported-operation error
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// Create an unknown backend error
    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::UnknownBackend { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            message: message.into(),
        }
    }

    /// Create an object storage error
    pub fn object_store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::ObjectStore {
            operation,
            message: message.into(),
        }
    }

    /// Whether a later attempt (next event or resync) may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Transport { .. } | Self::ObjectStore { .. } | Self::Protocol { .. }
        )
    }

    /// Whether the backend declined the operation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
