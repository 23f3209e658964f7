use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoinsApiError {
    #[error("Could not create the ledger API client. {0}")]
    Initialization(String),
    #[error("Could not build the request. {0}")]
    RestRequestError(String),
    #[error("Could not sign the request. {0}")]
    SigningError(String),
    #[error("No usable response from the ledger API. {0}")]
    RestResponseError(String),
    #[error("The ledger API response was not the expected JSON. {0}")]
    JsonError(String),
    #[error("Too many requests. The ledger API is throttling this client.")]
    Throttled,
    #[error("The ledger API rejected the request with status {status}. {message}")]
    QueryError { status: u16, message: String },
}
