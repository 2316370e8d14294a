//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured to
//! Sentry before the response is built; clients get a JSON body
//! `{ "error": "<message>" }` that never includes internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::content::ContentError;
use crate::services::{CheckoutError, StoreError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Loading or saving the client store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Catalog content could not be fetched.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Checkout session creation failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Content(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::MissingRedirectUrl { .. } => StatusCode::BAD_GATEWAY,
                CheckoutError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether this error indicates a fault on our side or upstream.
    const fn is_server_fault(&self) -> bool {
        match self {
            Self::Store(_) | Self::Content(_) | Self::Internal(_) => true,
            Self::Checkout(err) => !matches!(err, CheckoutError::Validation(_)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Content(_) => "Catalog is temporarily unavailable".to_string(),
            // Checkout messages are written for shoppers
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Called on sign-in so errors are associated with the shopper.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// Breadcrumbs appear in Sentry reports as the trail leading up to an error.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", &[("product_id", "p1")]);
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
