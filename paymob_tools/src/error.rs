use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymobApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach Paymob: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Paymob rejected the request. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Unexpected Paymob response: {0}")]
    UnexpectedResponse(String),
}
