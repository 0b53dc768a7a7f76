//! Catalog service façade and bootstrap.
//!
//! This crate wires the configured transport into the catalog core:
//! configuration → HTTP client → credential issuer → credential cache →
//! fetch orchestrator → API connector. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) so that a
//! reqwest-backed client is used when none is injected; mobile hosts inject
//! their own `HttpClient` through [`CatalogConfig`].
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::{CatalogConfig, CatalogService};
//!
//! let config = CatalogConfig::builder()
//!     .client_id("my-client-id")
//!     .client_secret("my-client-secret")
//!     .market("SE")
//!     .build()?;
//!
//! let service = CatalogService::new(config)?;
//! let dashboard = service.home_dashboard().await?;
//! println!("{} new releases", dashboard.new_releases.len());
//! # Ok(())
//! # }
//! ```

pub mod dashboard;
pub mod error;
pub mod service;

pub use core_runtime::CatalogConfig;
pub use dashboard::{CategoryPlaylists, HomeDashboard};
pub use error::{Result, ServiceError};
pub use service::CatalogService;
