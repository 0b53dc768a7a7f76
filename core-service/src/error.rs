use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<core_auth::AuthError> for ServiceError {
    fn from(error: core_auth::AuthError) -> Self {
        ServiceError::Catalog(CatalogError::Auth(error))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
