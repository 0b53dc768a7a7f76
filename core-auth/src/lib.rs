//! # Authentication Module
//!
//! Bearer credential management for the catalog API.
//!
//! ## Overview
//!
//! Every catalog request needs a bearer credential obtained with the OAuth 2.0
//! client-credentials grant. This crate models that credential, issues it, and
//! caches it so that any number of concurrent callers share one valid
//! credential and at most one issuance is ever in flight.
//!
//! ## Features
//!
//! - [`Credential`] with clock-based expiry and redacted `Debug`
//! - [`CredentialIssuer`] trait plus the HTTP [`ClientCredentialsIssuer`]
//! - [`CredentialCache`] with single-flight refresh
//! - Credential lifecycle events on the core event bus

pub mod cache;
pub mod error;
pub mod issuer;
pub mod types;

pub use cache::CredentialCache;
pub use error::{AuthError, Result};
pub use issuer::{ClientCredentialsIssuer, CredentialIssuer};
pub use types::{ClientCredentials, Credential};
