//! Client-side listener and alarm state machine for new-order pushes
//!
//! This crate is the receiving half of the notification pipeline: it keeps
//! the device's token registered, turns foreground pushes into a persistent
//! operator alarm and routes background taps straight to the order view.
//! The host shell supplies the platform seams (`PushChannel`, `AlarmUi`,
//! `Navigator`) and forwards the platform's push callbacks to
//! [`PushListenerService`].
//!
//! Alarm state is process-local to one client instance; acknowledgment on
//! one device never clears the alarm on another.

pub mod alarm;
pub mod error;
pub mod listener;
pub mod platform;

pub use alarm::{AlarmController, AlarmData};
pub use error::ListenError;
pub use listener::PushListenerService;
pub use platform::{AlarmUi, Navigator, PushChannel};
