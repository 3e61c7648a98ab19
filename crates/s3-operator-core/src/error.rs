//! Error types for s3-operator-core

use thiserror::Error;

/// Result type alias using s3-operator-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the operator
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// One or more required configuration values are absent
    #[error("Missing required configuration: {}", fields.join(", "))]
    MissingConfig { fields: Vec<String> },

    /// A configuration value is present but unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Create a missing config error from the names of the absent values
    pub fn missing_config<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingConfig {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
