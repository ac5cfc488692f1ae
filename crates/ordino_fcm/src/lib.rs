//! Order notification delivery over Firebase Cloud Messaging
//!
//! This crate implements the admin-side notification pipeline: when an order
//! trigger arrives, every registered admin device receives a high-priority
//! push. It covers
//!
//! - Authentication with a service account (RS256 assertion, jwt-bearer
//!   exchange, cached bearer token)
//! - The FCM HTTP v1 send client with the order-alert Android hints
//! - The fan-out dispatcher with per-device failure tallying and an
//!   invalid-token hook
//! - Axum handlers and routes for the trigger and device registration
//! - OpenAPI/Swagger documentation (with the `openapi` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use ordino_fcm::{Dispatcher, FcmClient, LogOnlySink, NotifyState, ServiceAccountIssuer};
//! use ordino_config::FcmConfig;
//! use std::sync::Arc;
//!
//! fn setup(
//!     config: &FcmConfig,
//!     registry: Arc<dyn ordino_common::services::TokenRegistry<
//!         Error = ordino_common::services::BoxedError,
//!     >>,
//! ) -> Result<axum::Router, ordino_fcm::NotifyError> {
//!     let issuer = Arc::new(ServiceAccountIssuer::from_env(config)?);
//!     let sender = Arc::new(FcmClient::new(config)?);
//!     let dispatcher = Arc::new(Dispatcher::new(
//!         registry.clone(),
//!         issuer,
//!         sender,
//!         Arc::new(LogOnlySink),
//!     ));
//!     Ok(ordino_fcm::routes(NotifyState { dispatcher, registry }))
//! }
//! ```

pub mod auth;
pub mod client;
pub mod dispatch;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
pub mod routes;

pub use auth::ServiceAccountIssuer;
pub use client::FcmClient;
pub use dispatch::{DispatchSummary, Dispatcher, InvalidTokenSink, LogOnlySink};
pub use error::NotifyError;
pub use handlers::NotifyState;
// Re-export the routes function to be used by the backend service
pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::NotifyApiDoc;
}
