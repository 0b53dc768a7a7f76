//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//!
//! `Clock` and `LoggerSink` already have portable defaults in
//! `bridge-traits` (`SystemClock`, `ConsoleLogger`).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! // Pass to CatalogConfig::builder().http_client(http_client)
//! ```

mod http;

pub use http::ReqwestHttpClient;
