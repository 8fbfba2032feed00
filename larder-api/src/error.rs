use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// The text to show the user: the server's own message when there is one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api { message, .. } | ApiError::Unauthorized(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token format: token must have 3 parts, found {0}")]
    WrongPartCount(usize),

    #[error("Invalid token payload encoding: {0}")]
    Encoding(String),

    #[error("Invalid token payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("Enter a withdrawal amount")]
    Empty,

    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),

    #[error("Withdrawal amount must be greater than zero")]
    NotPositive,

    #[error("Cannot withdraw more than available. Available: {}", available_text(.available, .unit))]
    ExceedsAvailable {
        requested: u64,
        available: u32,
        unit: Option<String>,
    },
}

fn available_text(available: &u32, unit: &Option<String>) -> String {
    match unit {
        Some(unit) if !unit.is_empty() => format!("{} {}", available, unit),
        _ => available.to_string(),
    }
}
