use logvault_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is locked")]
    Locked,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid or unauthorized API key")]
    InvalidApiKey,

    #[error("unknown user")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}
