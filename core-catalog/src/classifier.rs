//! # Error Classifier
//!
//! Maps a remote failure onto the closed [`ErrorKind`] taxonomy.
//!
//! | Failure                    | Kind                        |
//! |----------------------------|-----------------------------|
//! | status 400                 | `InvalidRequest`            |
//! | status 401                 | `ExpiredOrBadCredential`    |
//! | status 403                 | `BadAuthorizationRequest`   |
//! | status 429                 | `RateLimited`               |
//! | any other status           | `UnknownRemoteError`        |
//! | no response received       | `NetworkUnreachable`        |
//!
//! The table is fixed. Classification never triggers a retry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a remote call failed, as far as callers need to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRequest,
    ExpiredOrBadCredential,
    BadAuthorizationRequest,
    RateLimited,
    NetworkUnreachable,
    UnknownRemoteError,
}

impl ErrorKind {
    /// Stable identifier used in logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::ExpiredOrBadCredential => "ExpiredOrBadCredential",
            ErrorKind::BadAuthorizationRequest => "BadAuthorizationRequest",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::NetworkUnreachable => "NetworkUnreachable",
            ErrorKind::UnknownRemoteError => "UnknownRemoteError",
        }
    }

    /// Whether a caller may retry the same request after backing off.
    ///
    /// `InvalidRequest` and `BadAuthorizationRequest` are caller bugs and
    /// must never be retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::NetworkUnreachable)
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnreachable => "You appear to be offline. Check your connection.",
            ErrorKind::RateLimited => "Too many requests. Please try again in a moment.",
            _ => "Something went wrong. Please try again later.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote call, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// No response was received.
    Connectivity(String),
}

impl RemoteFailure {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        RemoteFailure::Status {
            status,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        RemoteFailure::Connectivity(message.into())
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::Status { status, message } => write!(f, "HTTP {}: {}", status, message),
            RemoteFailure::Connectivity(message) => write!(f, "no response: {}", message),
        }
    }
}

/// Classifies a remote failure.
///
/// # Examples
///
/// ```
/// use core_catalog::{classify, ErrorKind, RemoteFailure};
///
/// assert_eq!(classify(&RemoteFailure::status(429, "slow down")), ErrorKind::RateLimited);
/// assert_eq!(
///     classify(&RemoteFailure::connectivity("dns lookup failed")),
///     ErrorKind::NetworkUnreachable
/// );
/// ```
pub fn classify(failure: &RemoteFailure) -> ErrorKind {
    match failure {
        RemoteFailure::Connectivity(_) => ErrorKind::NetworkUnreachable,
        RemoteFailure::Status { status, .. } => match status {
            400 => ErrorKind::InvalidRequest,
            401 => ErrorKind::ExpiredOrBadCredential,
            403 => ErrorKind::BadAuthorizationRequest,
            429 => ErrorKind::RateLimited,
            _ => ErrorKind::UnknownRemoteError,
        },
    }
}
