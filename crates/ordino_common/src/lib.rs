// Declare modules within this crate
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Data structures and models
pub mod services; // Service abstractions

// Re-export the most commonly used items for easier access
pub use http::client::{create_client, HTTP_CLIENT};
pub use logging::{init, init_with_level, token_prefix};
pub use models::{DeviceRegistration, OrderNotificationPayload, PushMessage};
pub use services::{AccessToken, AccessTokenIssuer, BoxFuture, BoxedError, TokenRegistry};
