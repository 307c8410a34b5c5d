use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use festa_booking_engine::traits::BookingError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The requested change is not allowed. {0}")]
    TransitionNotAllowed(String),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity => StatusCode::UNAUTHORIZED,
                AuthError::MalformedIdentity(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::TransitionNotAllowed(_) => StatusCode::BAD_REQUEST,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No identity headers were supplied with the request.")]
    MissingIdentity,
    #[error("The identity headers could not be read. {0}")]
    MalformedIdentity(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<BookingError> for ServerError {
    fn from(e: BookingError) -> Self {
        let message = e.to_string();
        match e {
            // Storage faults stay opaque to the caller; the detail goes to the log only.
            BookingError::DatabaseError(db) => {
                error!("💻️ A storage error reached the request handler. {db}");
                Self::BackendError("An internal error occurred.".to_string())
            },
            BookingError::OrderNotFound(_) | BookingError::PaymentNotFound(_) | BookingError::PackageNotFound(_) => {
                Self::NoRecordFound(message)
            },
            BookingError::Forbidden { .. } => Self::InsufficientPermissions(message),
            BookingError::InvalidTransition { .. } |
            BookingError::DeleteBlocked { .. } |
            BookingError::InvalidLedgerTransition { .. } |
            BookingError::RefundUnavailable(_) => Self::TransitionNotAllowed(message),
            BookingError::GatewayUnavailable(reason) => Self::GatewayUnavailable(reason),
        }
    }
}
