use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtorError {
    /// Transport-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("realtor API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The per-run call budget is spent
    #[error("call budget exhausted ({max} calls)")]
    BudgetExhausted { max: u32 },
}

pub type Result<T> = std::result::Result<T, RealtorError>;
