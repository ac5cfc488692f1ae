//! Host-platform seams for the client listener.
//!
//! The listener itself is platform-neutral; everything that touches the
//! device (push permission, token lifecycle, the alarm overlay, navigation)
//! goes through these traits. The host shell implements them once and wires
//! the platform's push callbacks to the listener's event methods.

use crate::alarm::AlarmData;
use ordino_common::services::{BoxFuture, BoxedError};

/// The platform push-notification subsystem.
pub trait PushChannel: Send + Sync {
    /// Ask the operator for push permission. `false` means declined; the
    /// app keeps running without alarms.
    fn request_permission(&self) -> BoxFuture<'_, bool, BoxedError>;

    /// Obtain the current registration token, prompting the platform to
    /// mint one if needed.
    fn acquire_token(&self) -> BoxFuture<'_, String, BoxedError>;

    /// Invalidate the registration token on the platform side.
    fn delete_token(&self) -> BoxFuture<'_, (), BoxedError>;

    /// Platform tag stored with the registration ("android", "ios", "web").
    fn platform_tag(&self) -> &str;
}

/// The alarm overlay surface.
///
/// Methods may be called from the listener's context or from the pulse
/// timer task; implementations marshal to their UI context themselves.
pub trait AlarmUi: Send + Sync {
    /// Render the overlay with the given payload, replacing any overlay
    /// already shown.
    fn show_alarm(&self, data: &AlarmData);

    /// Remove the overlay.
    fn clear_alarm(&self);

    /// Block or restore background scrolling under the overlay.
    fn set_scroll_blocked(&self, blocked: bool);

    /// Toggle the breathing cue. Purely visual.
    fn set_pulse(&self, on: bool);
}

/// Navigation side effects.
pub trait Navigator: Send + Sync {
    /// Open the detail view for an order.
    fn open_order(&self, order_id: &str);
}
