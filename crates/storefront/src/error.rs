//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type plus the failure policy from the
//! error-handling design: local storage problems degrade silently, remote
//! failures surface a user-facing message, and missing authentication is
//! short-circuited before any remote call is made.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Local key-value storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Hosted backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Operation requires a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// The message shown to the user for this failure.
    ///
    /// Internal details (URLs, status codes, file paths) never leak here;
    /// they go to tracing/Sentry via [`report`] instead.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "Please sign in to save items to your wishlist",
            Self::Backend(_) => "Something went wrong. Please try again.",
            Self::Storage(_) | Self::Config(_) | Self::NotFound(_) => {
                "Something went wrong. Please try again."
            }
        }
    }

    /// Whether this failure should be reported to error tracking.
    ///
    /// `NotSignedIn` is an expected user state, not a defect.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Self::NotSignedIn | Self::NotFound(_))
    }
}

/// Capture a reportable error to Sentry and log it.
pub fn report(error: &AppError) {
    if error.is_reportable() {
        let event_id = sentry::capture_error(error);
        tracing::error!(
            error = %error,
            sentry_event_id = %event_id,
            "Storefront error"
        );
    } else {
        tracing::debug!(error = %error, "Expected failure, not reported");
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
