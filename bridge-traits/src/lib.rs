//! # Host Bridge Traits
//!
//! Contracts between the catalog core and the host platform.
//!
//! ## Overview
//!
//! The core needs three things it does not implement itself: a way to send
//! HTTP requests, a source of time, and somewhere to forward logs. Each is a
//! trait here so the host (desktop, mobile, tests) can supply its own adapter.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters must
//! report "no response received" as [`BridgeError::Network`],
//! [`BridgeError::Timeout`] or [`BridgeError::Io`]; the core classifies those
//! as connectivity failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single adapter can be shared
//! across concurrently running fetches.

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
