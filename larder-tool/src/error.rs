use thiserror::Error;

use crate::store::TokenFileError;

#[derive(Debug, Error)]
pub enum LrdError {
    #[error("Not logged in. Run `lrd login` first")]
    NotLoggedIn,

    #[error("Session expired or rejected by the server ({0}). Run `lrd login` again")]
    SessionEnded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token storage error: {0}")]
    TokenFile(#[from] TokenFileError),

    #[error("Invalid token: {0}")]
    Token(#[from] larder_api::TokenError),

    #[error("{0}")]
    Withdrawal(#[from] larder_api::WithdrawalError),

    #[error("Item not found: {0}")]
    ItemNotFound(larder_api::ItemId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API error: {0}")]
    Api(#[from] larder_api::ApiError),
}

impl From<larder_api::StartSessionError<TokenFileError>> for LrdError {
    fn from(err: larder_api::StartSessionError<TokenFileError>) -> Self {
        match err {
            larder_api::StartSessionError::Token(e) => LrdError::Token(e),
            larder_api::StartSessionError::Store(e) => LrdError::TokenFile(e),
        }
    }
}
