//! Repository for device registrations
//!
//! The `devices` table is the durable side of the Token Registry: one row
//! per push-capable device, keyed on the FCM token.

use crate::error::DbError;

// Re-export DeviceRegistration from ordino_common for convenience
pub use ordino_common::models::DeviceRegistration;

/// Storage interface for device registrations.
///
/// Registration is an upsert keyed on the token: the store's native
/// conflict handling makes concurrent registrations last-writer-wins, which
/// is safe because a token only ever belongs to one device at a time.
pub trait DeviceRegistrationRepository {
    /// Create the `devices` table if it does not already exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Upsert a registration keyed on its token.
    ///
    /// An existing row for the token has its owner, platform and
    /// `updated_at` overwritten; `created_at` and the row identity are
    /// preserved. The row count never grows for a known token.
    fn register_device(
        &self,
        registration: DeviceRegistration,
    ) -> impl std::future::Future<Output = Result<DeviceRegistration, DbError>> + Send;

    /// Delete the registration for a token.
    ///
    /// Returns `false` when no such token exists; a missing token is a
    /// no-op, not an error.
    fn remove_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Find the registration for a token, if any.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<DeviceRegistration>, DbError>> + Send;

    /// Every current registration.
    fn find_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<DeviceRegistration>, DbError>> + Send;
}
