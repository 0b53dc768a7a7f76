//! Workspace placeholder crate.
//!
//! This crate exposes a single feature flag that pulls in the catalog service
//! façade together with the desktop transport adapters. Host applications can
//! depend on `catalog-workspace` instead of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::ReqwestHttpClient;
#[cfg(feature = "desktop-shims")]
pub use core_service::{CatalogService, HomeDashboard};
