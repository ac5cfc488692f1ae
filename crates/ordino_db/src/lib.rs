//! Device registry persistence for Ordino
//!
//! This crate provides the durable side of the Token Registry: a database
//! client built on SQLx's `Any` driver plus the `devices` table repository.
//! SQLite backs the test suite; the production deployment points the same
//! code at PostgreSQL through `APP_DATABASE__URL`.
//!
//! # Example
//!
//! ```rust,no_run
//! use ordino_db::{DbClient, DeviceRegistrationRepository, SqlDeviceRegistrationRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DbClient::from_url("sqlite:ordino.db").await?;
//!     let repo = SqlDeviceRegistrationRepository::new(client);
//!     repo.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

// Re-export the client and repository types for ease of use
pub use client::DbClient;
pub use error::DbError;
pub use repositories::{
    DeviceRegistration, DeviceRegistrationRepository, SqlDeviceRegistrationRepository,
};
