//! # Catalog Web API Provider
//!
//! Connector for an offset/limit catalog web API (albums, artists,
//! playlists, shows, search and browse endpoints).
//!
//! ## Overview
//!
//! This module provides:
//! - [`CatalogConnector`] - typed endpoint calls over the host `HttpClient`
//! - Response DTOs for every endpoint ([`types`])
//! - Status and error-body mapping into `CatalogError::Remote`
//! - [`loaders`] - page loaders for each list resource, routed through the
//!   fetch orchestrator
//!
//! The connector makes one attempt per call. Rate limiting and server errors
//! come back to the caller as classified failures.

pub mod connector;
pub mod error;
pub mod loaders;
pub mod types;

pub use connector::CatalogConnector;
pub use types::{AlbumGroup, PagingObject, SearchItem, SearchType};
