//! # Result Envelope
//!
//! [`FetchResult`] carries either the fetched value or a classified error.
//! A failure may also carry fallback data (for example a stale copy) that a
//! caller can choose to display; fallback data never makes a failure count as
//! a success.

use crate::classifier::ErrorKind;
use serde::{Deserialize, Serialize};

/// Outcome of a fetch.
///
/// # Examples
///
/// ```
/// use core_catalog::{ErrorKind, FetchResult};
///
/// let ok: FetchResult<u32> = FetchResult::Success(7);
/// assert_eq!(ok.data(), Some(&7));
/// assert!(ok.error().is_none());
///
/// let stale = FetchResult::failure_with_fallback(ErrorKind::NetworkUnreachable, 3);
/// assert!(stale.data().is_none());
/// assert_eq!(stale.fallback(), Some(&3));
/// assert_eq!(stale.error(), Some(&ErrorKind::NetworkUnreachable));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchResult<T, E = ErrorKind> {
    Success(T),
    Failure { error: E, data: Option<T> },
}

impl<T, E> FetchResult<T, E> {
    /// Failure without fallback data.
    pub fn failure(error: E) -> Self {
        FetchResult::Failure { error, data: None }
    }

    pub fn failure_with_fallback(error: E, data: T) -> Self {
        FetchResult::Failure {
            error,
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The fetched value. `None` for failures, even with fallback data.
    pub fn data(&self) -> Option<&T> {
        match self {
            FetchResult::Success(data) => Some(data),
            FetchResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            FetchResult::Success(_) => None,
            FetchResult::Failure { error, .. } => Some(error),
        }
    }

    /// Fallback data attached to a failure.
    pub fn fallback(&self) -> Option<&T> {
        match self {
            FetchResult::Success(_) => None,
            FetchResult::Failure { data, .. } => data.as_ref(),
        }
    }

    /// Consumes the envelope, returning the fetched value if successful.
    pub fn into_data(self) -> Option<T> {
        match self {
            FetchResult::Success(data) => Some(data),
            FetchResult::Failure { .. } => None,
        }
    }

    /// Converts to a `Result`, discarding any fallback data.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            FetchResult::Success(data) => Ok(data),
            FetchResult::Failure { error, .. } => Err(error),
        }
    }

    /// Maps the success value and the fallback data alike.
    pub fn map<U, F>(self, mut f: F) -> FetchResult<U, E>
    where
        F: FnMut(T) -> U,
    {
        match self {
            FetchResult::Success(data) => FetchResult::Success(f(data)),
            FetchResult::Failure { error, data } => FetchResult::Failure {
                error,
                data: data.map(f),
            },
        }
    }

    pub fn map_err<F2, F>(self, f: F) -> FetchResult<T, F2>
    where
        F: FnOnce(E) -> F2,
    {
        match self {
            FetchResult::Success(data) => FetchResult::Success(data),
            FetchResult::Failure { error, data } => FetchResult::Failure {
                error: f(error),
                data,
            },
        }
    }
}

impl<T, E> From<Result<T, E>> for FetchResult<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => FetchResult::Success(data),
            Err(error) => FetchResult::failure(error),
        }
    }
}
