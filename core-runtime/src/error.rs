use thiserror::Error;

/// Errors raised while configuring or wiring the catalog core.
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is missing or out of range.
    #[error("Invalid catalog configuration: {0}")]
    Config(String),

    /// A host bridge the core needs was not provided.
    #[error("Missing {capability} bridge: {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
