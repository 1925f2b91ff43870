use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::errors::{ComposeError, EscrowError, LedgerError};
use persistence::journal::JournalError;
use persistence::StoreError;
use serde_json::json;
use thiserror::Error;
use types::errors::{InvariantViolation, OrderError};
use types::ids::PairId;

/// How an error must be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Reported back to the requester
    User,
    /// Accounting or logic defect; the node halts
    Invariant,
    /// Ledger, composer or storage failure; the pass is abandoned and retried later
    Collaborator,
}

/// Errors of the exchange node
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Composer failed on pair {pair_id}: {source}")]
    Compose {
        pair_id: PairId,
        #[source]
        source: ComposeError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl ExchangeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ExchangeError::Order(_) => ErrorClass::User,
            ExchangeError::Invariant(_) | ExchangeError::Escrow(_) => ErrorClass::Invariant,
            ExchangeError::Store(StoreError::AddressReuse(_)) => ErrorClass::User,
            ExchangeError::Store(StoreError::NotFound { .. })
            | ExchangeError::Store(StoreError::NotActive { .. })
            | ExchangeError::Store(StoreError::Order(_)) => ErrorClass::Invariant,
            ExchangeError::Compose { .. }
            | ExchangeError::Ledger(_)
            | ExchangeError::Store(_)
            | ExchangeError::Journal(_) => ErrorClass::Collaborator,
        }
    }

    /// Whether the node must stop instead of continuing.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Invariant
    }
}

/// Central error type for the HTTP surface
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ExchangeError> for AppError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Order(OrderError::PairNotFound { .. }) => AppError::NotFound(err.to_string()),
            ExchangeError::Order(OrderError::OperatorNotReady) => AppError::ServiceUnavailable(err.to_string()),
            ExchangeError::Order(OrderError::AddressReuse { .. }) | ExchangeError::Store(StoreError::AddressReuse(_)) => {
                AppError::Conflict(err.to_string())
            }
            ExchangeError::Order(_) => AppError::BadRequest(err.to_string()),
            ExchangeError::Ledger(LedgerError::Unavailable(_)) => AppError::ServiceUnavailable(err.to_string()),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                msg,
                "SERVICE_UNAVAILABLE",
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Address;

    #[test]
    fn test_error_classes() {
        let user: ExchangeError = OrderError::OperatorNotReady.into();
        assert_eq!(user.class(), ErrorClass::User);
        assert!(!user.is_fatal());

        let invariant: ExchangeError = InvariantViolation::Starvation { remaining: 3 }.into();
        assert!(invariant.is_fatal());

        let compose = ExchangeError::Compose {
            pair_id: PairId::new(1),
            source: ComposeError::NotEnoughFunds("GOLD".to_string()),
        };
        assert_eq!(compose.class(), ErrorClass::Collaborator);
        assert!(!compose.is_fatal());

        let reuse: ExchangeError = StoreError::AddressReuse(Address::from("A")).into();
        assert_eq!(reuse.class(), ErrorClass::User);
        let missing: ExchangeError = StoreError::not_found("orders", 7).into();
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_http_mapping() {
        let err: AppError = ExchangeError::from(OrderError::FeeBelowMinimum { fee: 500, min_fee: 1000 }).into();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err: AppError = ExchangeError::from(OrderError::OperatorNotReady).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
