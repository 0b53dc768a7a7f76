//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the catalog core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its
//! configuration type, its tracing conventions and the broadcast channel
//! used to surface credential and fetch events to the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder};
pub use error::{Error, Result};
