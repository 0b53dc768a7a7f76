//! # Fan-out Aggregation
//!
//! Runs independent fetches concurrently and keeps only the successful ones.
//!
//! Results come back in submission order regardless of completion order.
//! Members that return [`FetchResult::Failure`] are dropped (logged at debug
//! level). A member returning `Err` is fatal: the remaining members are
//! dropped, which cancels their in-flight requests, and the error is returned.
//! Dropping the aggregate future likewise cancels every member.

use crate::envelope::FetchResult;
use crate::error::{CatalogError, Result};
use futures::future::try_join_all;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs every fetch concurrently and returns the successful values in
/// submission order.
///
/// # Examples
///
/// ```
/// use core_catalog::{join_successful, ErrorKind, FetchResult};
///
/// # async fn example() -> core_catalog::Result<()> {
/// use std::future::ready;
///
/// let fetches = vec![
///     ready(Ok(FetchResult::Success("new releases"))),
///     ready(Ok(FetchResult::failure(ErrorKind::RateLimited))),
///     ready(Ok(FetchResult::Success("categories"))),
/// ];
///
/// assert_eq!(join_successful(fetches).await?, vec!["new releases", "categories"]);
/// # Ok(())
/// # }
/// ```
pub async fn join_successful<T, I, Fut>(fetches: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<FetchResult<T>>>,
{
    let outcomes = try_join_all(fetches).await?;
    let total = outcomes.len();

    let successes: Vec<T> = outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| match outcome {
            FetchResult::Success(value) => Some(value),
            FetchResult::Failure { error, .. } => {
                debug!(index, error_kind = %error, "Dropping failed fan-out member");
                None
            }
        })
        .collect();

    debug!(total, succeeded = successes.len(), "Fan-out complete");
    Ok(successes)
}

/// Like [`join_successful`], but each fetch carries a key that stays
/// attached to its value.
///
/// Use this instead of zipping positional results with external metadata:
/// once a member is dropped, positions no longer line up.
pub async fn join_successful_keyed<K, T, I, Fut>(fetches: I) -> Result<Vec<(K, T)>>
where
    I: IntoIterator<Item = (K, Fut)>,
    Fut: Future<Output = Result<FetchResult<T>>>,
{
    let (keys, futures): (Vec<K>, Vec<Fut>) = fetches.into_iter().unzip();
    let outcomes = try_join_all(futures).await?;

    Ok(keys
        .into_iter()
        .zip(outcomes)
        .enumerate()
        .filter_map(|(index, (key, outcome))| match outcome {
            FetchResult::Success(value) => Some((key, value)),
            FetchResult::Failure { error, .. } => {
                debug!(index, error_kind = %error, "Dropping failed fan-out member");
                None
            }
        })
        .collect())
}

/// Like [`join_successful`], but gives up as soon as `token` is cancelled.
///
/// # Errors
///
/// [`CatalogError::Cancelled`] when the token fires first; every in-flight
/// member is dropped.
pub async fn join_successful_until_cancelled<T, I, Fut>(
    token: &CancellationToken,
    fetches: I,
) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<FetchResult<T>>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("Fan-out cancelled");
            Err(CatalogError::Cancelled)
        }
        result = join_successful(fetches) => result,
    }
}
