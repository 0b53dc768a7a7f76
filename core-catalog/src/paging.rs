//! # Page Engine
//!
//! Turns a "fetch `limit` items starting at `offset`" function into a paged
//! source with previous/next key bookkeeping.
//!
//! ## Keys
//!
//! A key is a zero-based page number. For a load with key `n` and load size
//! `s` (capped at [`MAX_PAGE_SIZE`]):
//!
//! - `offset = n * min(s, 50)`
//! - `prev_key = n - 1` when `n > 0`
//! - `next_key = n + 1` unless this page, or an earlier load of this engine,
//!   reported zero items after it
//!
//! ## Termination
//!
//! Once a page reports `items_after == 0` its own `next_key` is `None`, and
//! every later page number loaded through the same engine also gets `None`.
//! The engine never offers a key past a page it already knows is the last.
//!
//! ## Failure and cancellation
//!
//! Loader failures come back as [`FetchResult::Failure`] and leave the
//! engine untouched, so the same key can be retried. Engine state is written
//! only after the loader resolves; dropping an in-flight `load` future
//! therefore changes nothing.
//!
//! ## Usage
//!
//! ```
//! use core_catalog::{FetchResult, LoadParams, LoadRequest, Pager, RemotePage};
//!
//! # async fn example() -> core_catalog::Result<()> {
//! let pager = Pager::new(2, |params: LoadParams| async move {
//!     let all = ["a", "b", "c"];
//!     let start = (params.offset as usize).min(all.len());
//!     let end = (start + params.limit as usize).min(all.len());
//!     Ok(FetchResult::Success(RemotePage {
//!         items: all[start..end].to_vec(),
//!         items_after: (all.len() - end) as u32,
//!     }))
//! });
//!
//! let engine = pager.source();
//! let first = engine.load(LoadRequest::initial(2)).await?;
//! assert_eq!(first.data().and_then(|page| page.next_key), Some(1));
//! # Ok(())
//! # }
//! ```

use crate::envelope::FetchResult;
use crate::error::{CatalogError, Result};
use futures::future::BoxFuture;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// Largest page the remote API serves; larger requests are capped.
pub const MAX_PAGE_SIZE: u32 = 50;

/// What a loader is asked to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    pub limit: u32,
    pub offset: u32,
}

/// A consumer's request for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    /// Page number; `None` for the first load.
    pub key: Option<u32>,
    pub load_size: u32,
}

impl LoadRequest {
    pub fn initial(load_size: u32) -> Self {
        Self {
            key: None,
            load_size,
        }
    }

    pub fn at(key: u32, load_size: u32) -> Self {
        Self {
            key: Some(key),
            load_size,
        }
    }
}

/// One page as returned by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage<T> {
    pub items: Vec<T>,
    /// How many items the remote list holds after this page.
    pub items_after: u32,
}

impl<T> RemotePage<T> {
    /// Builds a page from an offset/limit/total style response.
    ///
    /// `items_after = total - (offset + items.len())`, never negative.
    pub fn from_total(items: Vec<T>, offset: u32, total: u32) -> Self {
        let seen = u64::from(offset) + items.len() as u64;
        let items_after = u64::from(total).saturating_sub(seen);
        Self {
            items,
            items_after: u32::try_from(items_after).unwrap_or(u32::MAX),
        }
    }
}

/// One page with its neighbouring keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub prev_key: Option<u32>,
    pub next_key: Option<u32>,
    /// Items in the list before this page's first item.
    pub items_before: u32,
    pub items_after: u32,
}

/// Snapshot of what a consumer has loaded, used to pick a refresh key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingState<T> {
    /// Loaded pages in list order.
    pub pages: Vec<Page<T>>,
    /// Absolute index of the item the consumer is looking at.
    pub anchor_position: Option<usize>,
}

impl<T> PagingState<T> {
    pub fn new(pages: Vec<Page<T>>, anchor_position: Option<usize>) -> Self {
        Self {
            pages,
            anchor_position,
        }
    }

    /// The loaded page containing the anchor, or the nearest one to it.
    ///
    /// Pages are placed by `items_before`, so the window need not start at
    /// the head of the list.
    pub fn closest_page_to_anchor(&self) -> Option<&Page<T>> {
        let anchor = self.anchor_position?;
        self.pages.iter().min_by_key(|page| {
            let start = page.items_before as usize;
            let end = start.saturating_add(page.data.len());
            if anchor < start {
                start - anchor
            } else if anchor >= end {
                // An empty page sits at distance 1 from its own start
                anchor - end + 1
            } else {
                0
            }
        })
    }

    /// Key that reloads the window around the anchor.
    ///
    /// Prefers `prev_key + 1` of the closest page, falling back to
    /// `next_key - 1`.
    pub fn refresh_key(&self) -> Option<u32> {
        let page = self.closest_page_to_anchor()?;
        page.prev_key
            .map(|key| key + 1)
            .or_else(|| page.next_key.and_then(|key| key.checked_sub(1)))
    }
}

/// Fetches one page of `T`.
///
/// Implemented for any `Fn(LoadParams) -> impl Future<Output = Result<FetchResult<RemotePage<T>>>>`,
/// so most loaders are closures.
pub trait PageLoader<T>: Send + Sync {
    fn load_page(&self, params: LoadParams) -> BoxFuture<'_, Result<FetchResult<RemotePage<T>>>>;
}

impl<T, F, Fut> PageLoader<T> for F
where
    F: Fn(LoadParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResult<RemotePage<T>>>> + Send + 'static,
{
    fn load_page(&self, params: LoadParams) -> BoxFuture<'_, Result<FetchResult<RemotePage<T>>>> {
        Box::pin((self)(params))
    }
}

/// Paged source over a single loader. One engine per list stream.
pub struct PageEngine<T> {
    loader: Arc<dyn PageLoader<T>>,
    /// Lowest page number known to have nothing after it
    terminal_page: Mutex<Option<u32>>,
}

impl<T> PageEngine<T> {
    pub fn new(loader: Arc<dyn PageLoader<T>>) -> Self {
        Self {
            loader,
            terminal_page: Mutex::new(None),
        }
    }

    /// Loads the page at `request.key`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero load size or an offset beyond `u32`;
    /// otherwise whatever non-remote error the loader returns.
    #[instrument(skip(self, request), fields(key = ?request.key, load_size = request.load_size))]
    pub async fn load(&self, request: LoadRequest) -> Result<FetchResult<Page<T>>> {
        let page_number = request.key.unwrap_or(0);
        let limit = request.load_size.min(MAX_PAGE_SIZE);
        if limit == 0 {
            return Err(CatalogError::InvalidArgument(
                "load size must be greater than zero".to_string(),
            ));
        }
        let offset = page_number.checked_mul(limit).ok_or_else(|| {
            CatalogError::InvalidArgument(format!(
                "page {} with limit {} overflows the offset",
                page_number, limit
            ))
        })?;
        let prev_key = page_number.checked_sub(1);

        debug!(limit, offset, "Loading page");

        let remote = match self.loader.load_page(LoadParams { limit, offset }).await? {
            FetchResult::Success(remote) => remote,
            FetchResult::Failure { error, .. } => {
                debug!(error_kind = %error, "Page load failed; paging state unchanged");
                return Ok(FetchResult::failure(error));
            }
        };

        let is_terminal = self.record_load(page_number, remote.items_after);
        let next_key = if is_terminal {
            None
        } else {
            page_number.checked_add(1)
        };

        debug!(
            items = remote.items.len(),
            items_after = remote.items_after,
            ?next_key,
            "Page loaded"
        );

        Ok(FetchResult::Success(Page {
            data: remote.items,
            prev_key,
            next_key,
            items_before: offset,
            items_after: remote.items_after,
        }))
    }

    /// Key to reload from after the list was invalidated.
    pub fn refresh_key(&self, state: &PagingState<T>) -> Option<u32> {
        state.refresh_key()
    }

    /// Whether a successful load has already reported the end of the list.
    pub fn reached_end(&self) -> bool {
        self.terminal_page().is_some()
    }

    fn terminal_page(&self) -> Option<u32> {
        *self
            .terminal_page
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records a successful load and returns whether `page_number` is at or
    /// past the last page.
    fn record_load(&self, page_number: u32, items_after: u32) -> bool {
        let mut terminal = self
            .terminal_page
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if items_after == 0 {
            *terminal = Some(terminal.map_or(page_number, |known| known.min(page_number)));
        }

        terminal.is_some_and(|last| page_number >= last)
    }
}

impl<T> std::fmt::Debug for PageEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageEngine")
            .field("terminal_page", &self.terminal_page())
            .finish()
    }
}

/// Replayable factory of page engines over one loader.
///
/// Every call to [`source`](Self::source) or [`stream`](Self::stream) starts
/// from a fresh paging state, so re-subscribing to a list re-probes it.
pub struct Pager<T> {
    loader: Arc<dyn PageLoader<T>>,
    page_size: u32,
}

impl<T> Clone for Pager<T> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            page_size: self.page_size,
        }
    }
}

impl<T: Send + 'static> Pager<T> {
    /// Pager over a loader closure.
    pub fn new<F, Fut>(page_size: u32, loader: F) -> Self
    where
        F: Fn(LoadParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FetchResult<RemotePage<T>>>> + Send + 'static,
    {
        Self::from_loader(page_size, Arc::new(loader))
    }

    pub fn from_loader(page_size: u32, loader: Arc<dyn PageLoader<T>>) -> Self {
        Self { loader, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// A new engine with empty paging state.
    pub fn source(&self) -> PageEngine<T> {
        PageEngine::new(Arc::clone(&self.loader))
    }

    /// Loads pages front to back, one at a time.
    ///
    /// The stream ends after the last page, after the first failure, or
    /// after the first error; the failing item is still yielded.
    pub fn stream(&self) -> impl Stream<Item = Result<FetchResult<Page<T>>>> + Send + 'static {
        let load_size = self.page_size;
        let start = Some((self.source(), None::<u32>));

        stream::unfold(start, move |state| async move {
            let (engine, key) = state?;
            let result = engine.load(LoadRequest { key, load_size }).await;

            let next = match &result {
                Ok(FetchResult::Success(page)) => page.next_key.map(|next| (engine, Some(next))),
                _ => None,
            };

            Some((result, next))
        })
    }
}

impl<T> std::fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("page_size", &self.page_size)
            .finish()
    }
}
