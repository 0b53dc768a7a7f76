use crate::classifier::RemoteFailure;
use bridge_traits::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Credential issuance failed; nothing can be fetched.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A remote call failed in a way the classifier understands.
    #[error("Remote call failed: {0}")]
    Remote(RemoteFailure),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CatalogError {
    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        CatalogError::Remote(RemoteFailure::status(status, message))
    }
}

impl From<BridgeError> for CatalogError {
    fn from(error: BridgeError) -> Self {
        if error.is_connectivity() {
            CatalogError::Remote(RemoteFailure::Connectivity(error.to_string()))
        } else {
            CatalogError::Transport(error.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
