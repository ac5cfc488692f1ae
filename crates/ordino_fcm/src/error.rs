//! Error taxonomy for the notification pipeline.

use thiserror::Error;

/// Errors that abort a dispatch batch or fail a pipeline component.
///
/// Per-device send failures are deliberately absent: they are soft, tallied
/// in the dispatch summary and never escalated to a batch-level error.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The trigger payload is missing a mandatory order field
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Token signing or the OAuth exchange failed; the whole batch aborts
    #[error("Authentication error: {0}")]
    AuthFailure(String),

    /// Missing or unusable configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error during an HTTP request to the provider
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The device registry could not be read
    #[error("Registry error: {0}")]
    RegistryError(String),
}
