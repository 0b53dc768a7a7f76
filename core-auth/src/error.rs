use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token endpoint returned {status}: {message}")]
    IssuanceFailed { status: u16, message: String },

    #[error("Issued credential is unusable: {0}")]
    InvalidCredential(String),

    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    #[error("Authentication error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
