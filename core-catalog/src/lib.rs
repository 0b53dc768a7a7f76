//! # Catalog Core
//!
//! Transport-agnostic data-access primitives for the catalog API.
//!
//! ## Overview
//!
//! - [`FetchResult`] - success/failure envelope returned by every fetch
//! - [`classify`] - maps a [`RemoteFailure`] onto the closed [`ErrorKind`] taxonomy
//! - [`FetchOrchestrator`] - runs a call with a valid credential and turns
//!   remote failures into data
//! - [`PageEngine`] / [`Pager`] - offset/limit paging with key bookkeeping
//! - [`fanout`] - concurrent fetches that keep only the successes
//!
//! Expected remote failures never surface as `Err`. Only credential issuance
//! and non-remote failures (decode, transport misconfiguration, cancellation)
//! propagate as [`CatalogError`].

pub mod classifier;
pub mod envelope;
pub mod error;
pub mod fanout;
pub mod orchestrator;
pub mod paging;

pub use classifier::{classify, ErrorKind, RemoteFailure};
pub use envelope::FetchResult;
pub use error::{CatalogError, Result};
pub use fanout::{join_successful, join_successful_keyed, join_successful_until_cancelled};
pub use orchestrator::FetchOrchestrator;
pub use paging::{
    LoadParams, LoadRequest, Page, PageEngine, PageLoader, Pager, PagingState, RemotePage,
    MAX_PAGE_SIZE,
};
