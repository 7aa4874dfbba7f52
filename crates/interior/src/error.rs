use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

use crate::accounts::AccountError;
use crate::backoffice::{BackupError, ExportError};
use crate::booking::BookingError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::payment::{GatewayError, PaymentError};
use crate::review::ReviewError;
use crate::storage::RepositoryError;
use crate::telemetry::TelemetryError;

/// Application-level error, converted to a JSON `{"error": …}` body at the
/// HTTP boundary. Domain failures keep their own enums; this type only maps
/// them to transport semantics.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Account(AccountError),
    Catalog(CatalogError),
    Booking(BookingError),
    Payment(PaymentError),
    Review(ReviewError),
    Repository(RepositoryError),
    Export(ExportError),
    Backup(BackupError),
    Validation(String),
    Permission(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Account(err) => write!(f, "{}", err),
            AppError::Catalog(err) => write!(f, "{}", err),
            AppError::Booking(err) => write!(f, "{}", err),
            AppError::Payment(err) => write!(f, "{}", err),
            AppError::Review(err) => write!(f, "{}", err),
            AppError::Repository(err) => write!(f, "{}", err),
            AppError::Export(err) => write!(f, "{}", err),
            AppError::Backup(err) => write!(f, "{}", err),
            AppError::Validation(message) => write!(f, "{}", message),
            AppError::Permission(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Account(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Booking(err) => Some(err),
            AppError::Payment(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Backup(err) => Some(err),
            AppError::Validation(_) | AppError::Permission(_) => None,
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Account(err) => match err {
                AccountError::NotFound => StatusCode::NOT_FOUND,
                AccountError::InvalidUsername => StatusCode::UNPROCESSABLE_ENTITY,
                AccountError::UsernameTaken => StatusCode::CONFLICT,
                AccountError::CannotBlockAdmin => StatusCode::FORBIDDEN,
                AccountError::Repository(err) => repository_status(err),
            },
            AppError::Catalog(err) => match err {
                CatalogError::NotFound
                | CatalogError::CityNotFound
                | CatalogError::CategoryNotFound
                | CatalogError::ImageNotFound => StatusCode::NOT_FOUND,
                CatalogError::InvalidArea
                | CatalogError::InvalidCapacity
                | CatalogError::InvalidPrice => StatusCode::UNPROCESSABLE_ENTITY,
                CatalogError::Repository(err) => repository_status(err),
            },
            AppError::Booking(err) => match err {
                BookingError::NotFound
                | BookingError::ListingNotFound
                | BookingError::PeriodNotFound => StatusCode::NOT_FOUND,
                BookingError::PriceNotFound
                | BookingError::ListingInactive
                | BookingError::PeriodsOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::Conflict
                | BookingError::ConfirmRequiresPending
                | BookingError::CompleteRequiresConfirmed
                | BookingError::NotCancellable => StatusCode::CONFLICT,
                BookingError::Repository(err) => repository_status(err),
            },
            AppError::Payment(err) => match err {
                PaymentError::UnknownBooking => StatusCode::NOT_FOUND,
                PaymentError::NotPayable
                | PaymentError::AlreadyPaid
                | PaymentError::MissingPaymentRef
                | PaymentError::NothingToRefund
                | PaymentError::RefundAlreadyRequested => StatusCode::CONFLICT,
                PaymentError::MissingBookingMetadata => StatusCode::BAD_REQUEST,
                PaymentError::Gateway(GatewayError::NotConfigured) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Repository(err) => repository_status(err),
            },
            AppError::Review(err) => match err {
                ReviewError::NotFound | ReviewError::ListingNotFound => StatusCode::NOT_FOUND,
                ReviewError::AlreadyReviewed => StatusCode::CONFLICT,
                ReviewError::InvalidRating | ReviewError::InvalidComment(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ReviewError::Repository(err) => repository_status(err),
            },
            AppError::Repository(err) => repository_status(err),
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Export(_)
            | AppError::Backup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AccountError> for AppError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<BookingError> for AppError {
    fn from(value: BookingError) -> Self {
        Self::Booking(value)
    }
}

impl From<PaymentError> for AppError {
    fn from(value: PaymentError) -> Self {
        Self::Payment(value)
    }
}

impl From<ReviewError> for AppError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<BackupError> for AppError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            AppError::Booking(BookingError::Conflict).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Payment(PaymentError::RefundAlreadyRequested).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Review(ReviewError::AlreadyReviewed).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn unconfigured_gateway_maps_to_503() {
        assert_eq!(
            AppError::Payment(PaymentError::Gateway(GatewayError::NotConfigured)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn missing_records_map_to_404() {
        assert_eq!(
            AppError::Booking(BookingError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Catalog(CatalogError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
