//! Error handling for the Rain or Shine client

use std::fmt;
use thiserror::Error;

/// Unified error type for the Rain or Shine client.
///
/// The four operation variants are the closed set of failures ever stored as
/// the session manager's "last error"; their `Display` output is the
/// user-visible message. Backend transport detail is logged, never surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Startup identity check failed in transit; resolves to logged-out
    #[error("{0}")]
    RestoreFailed(String),

    /// The provider authorization URL could not be obtained
    #[error("{0}")]
    AuthInit(String),

    /// A preference write was rejected; the local value is unchanged
    #[error("{0}")]
    UpdateFailed(String),

    /// The revoke call failed; the confirmation state is preserved
    #[error("{0}")]
    RevokeFailed(String),

    /// Client construction or configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new restore error
    pub fn restore_failed<T: fmt::Display>(msg: T) -> Self {
        Error::RestoreFailed(msg.to_string())
    }

    /// Create a new connect-flow error
    pub fn auth_init<T: fmt::Display>(msg: T) -> Self {
        Error::AuthInit(msg.to_string())
    }

    /// Create a new preference-update error
    pub fn update_failed<T: fmt::Display>(msg: T) -> Self {
        Error::UpdateFailed(msg.to_string())
    }

    /// Create a new revocation error
    pub fn revoke_failed<T: fmt::Display>(msg: T) -> Self {
        Error::RevokeFailed(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }
}

/// 結果型
pub type Result<T> = std::result::Result<T, Error>;
