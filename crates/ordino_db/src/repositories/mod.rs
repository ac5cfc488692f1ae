//! Repository modules for database access

pub mod device_registration;
pub mod device_registration_sql;

// Re-export the device registration repository for ease of use
pub use device_registration::{DeviceRegistration, DeviceRegistrationRepository};
pub use device_registration_sql::SqlDeviceRegistrationRepository;
