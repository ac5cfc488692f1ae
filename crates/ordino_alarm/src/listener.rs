//! The client-side push listener.
//!
//! One listener per running client instance, constructed at startup and
//! handed to the host shell, which wires the platform's push callbacks to
//! the three event methods here. Foreground deliveries drive the alarm
//! state machine; background taps are a side channel that only navigates;
//! token rotations re-register transparently.

use crate::alarm::{AlarmController, AlarmData};
use crate::error::ListenError;
use crate::platform::{Navigator, PushChannel};
use ordino_common::models::{DeviceRegistration, PushMessage};
use ordino_common::services::{BoxedError, TokenRegistry};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Listens for push events and keeps the device registered.
pub struct PushListenerService {
    channel: Arc<dyn PushChannel>,
    registry: Arc<dyn TokenRegistry<Error = BoxedError>>,
    alarm: Arc<AlarmController>,
    navigator: Arc<dyn Navigator>,
    user_id: Option<String>,
    current_token: Mutex<Option<String>>,
}

impl PushListenerService {
    pub fn new(
        channel: Arc<dyn PushChannel>,
        registry: Arc<dyn TokenRegistry<Error = BoxedError>>,
        alarm: Arc<AlarmController>,
        navigator: Arc<dyn Navigator>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            channel,
            registry,
            alarm,
            navigator,
            user_id,
            current_token: Mutex::new(None),
        }
    }

    /// Permission request, token acquisition, registration.
    ///
    /// Returns `Ok(false)` when the operator declines push permission; the
    /// app continues without alarms. A failed registry write is a soft
    /// warning, not a failure: the device still alarms on pushes delivered
    /// through an earlier registration.
    ///
    /// # Errors
    ///
    /// Only a channel-level failure (permission prompt or token acquisition
    /// broke) is an error.
    pub async fn initialize(&self) -> Result<bool, ListenError> {
        let granted = self
            .channel
            .request_permission()
            .await
            .map_err(|e| ListenError::ChannelError(e.to_string()))?;
        if !granted {
            info!("Push permission declined, alarms disabled");
            return Ok(false);
        }

        let token = self
            .channel
            .acquire_token()
            .await
            .map_err(|e| ListenError::ChannelError(e.to_string()))?;

        self.save_token(token).await;
        Ok(true)
    }

    /// A foreground push arrived while the app is visible. Drives the
    /// alarm state machine; a repeat delivery replaces the overlay payload.
    /// Call from within the tokio runtime, see [`AlarmController::trigger`].
    pub fn notification_received(&self, message: PushMessage) {
        self.alarm.trigger(AlarmData::from_push(&message));
    }

    /// The operator tapped a notification while the app was backgrounded.
    /// Side channel: navigates to the order on resume, never raises the
    /// overlay.
    pub fn action_performed(&self, message: PushMessage) {
        match message.data.get("order_id") {
            Some(order_id) if !order_id.is_empty() => {
                info!("Background tap, opening order {}", order_id);
                self.navigator.open_order(order_id);
            }
            _ => warn!("Background tap without order_id, ignoring"),
        }
    }

    /// The platform rotated the registration token. Re-registers
    /// transparently; the alarm state is untouched.
    pub async fn token_received(&self, token: String) {
        self.save_token(token).await;
    }

    /// Logout path: invalidate the platform token and drop the
    /// registration row.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` when the platform deletion fails and
    /// `RegistryError` when the row removal does.
    pub async fn delete_token(&self) -> Result<(), ListenError> {
        self.channel
            .delete_token()
            .await
            .map_err(|e| ListenError::ChannelError(e.to_string()))?;

        let token = self.current_token.lock().unwrap().take();
        if let Some(token) = token {
            self.registry
                .remove(&token)
                .await
                .map_err(|e| ListenError::RegistryError(e.to_string()))?;
            info!("Registration removed on logout");
        }
        Ok(())
    }

    async fn save_token(&self, token: String) {
        let registration = DeviceRegistration::new(
            token.clone(),
            self.user_id.clone(),
            Some(self.channel.platform_tag().to_string()),
        );
        match self.registry.register(registration).await {
            Ok(_) => info!("Device token registered"),
            // Soft warning: the app keeps running with the old registration.
            Err(e) => warn!("Failed to save device token: {}", e),
        }
        *self.current_token.lock().unwrap() = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::AlarmUi;
    use ordino_common::services::BoxFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeChannel {
        permission: bool,
        token: &'static str,
        deletes: AtomicUsize,
    }

    impl FakeChannel {
        fn new(permission: bool, token: &'static str) -> Arc<Self> {
            Arc::new(Self {
                permission,
                token,
                deletes: AtomicUsize::new(0),
            })
        }
    }

    impl PushChannel for FakeChannel {
        fn request_permission(&self) -> BoxFuture<'_, bool, BoxedError> {
            let granted = self.permission;
            Box::pin(async move { Ok(granted) })
        }

        fn acquire_token(&self) -> BoxFuture<'_, String, BoxedError> {
            let token = self.token.to_string();
            Box::pin(async move { Ok(token) })
        }

        fn delete_token(&self) -> BoxFuture<'_, (), BoxedError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(()) })
        }

        fn platform_tag(&self) -> &str {
            "android"
        }
    }

    #[derive(Default)]
    struct MemoryRegistry {
        rows: Mutex<Vec<DeviceRegistration>>,
        fail_register: AtomicBool,
    }

    impl TokenRegistry for MemoryRegistry {
        type Error = BoxedError;

        fn register(
            &self,
            registration: DeviceRegistration,
        ) -> BoxFuture<'_, DeviceRegistration, BoxedError> {
            if self.fail_register.load(Ordering::SeqCst) {
                return Box::pin(async move {
                    Err(BoxedError::from("registry down".to_string()))
                });
            }
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|r| r.fcm_token != registration.fcm_token);
            rows.push(registration.clone());
            Box::pin(async move { Ok(registration) })
        }

        fn remove(&self, token: &str) -> BoxFuture<'_, bool, BoxedError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.fcm_token != token);
            let removed = rows.len() < before;
            Box::pin(async move { Ok(removed) })
        }

        fn list_all(&self) -> BoxFuture<'_, Vec<DeviceRegistration>, BoxedError> {
            let rows = self.rows.lock().unwrap().clone();
            Box::pin(async move { Ok(rows) })
        }
    }

    #[derive(Default)]
    struct NullUi;

    impl AlarmUi for NullUi {
        fn show_alarm(&self, _data: &AlarmData) {}
        fn clear_alarm(&self) {}
        fn set_scroll_blocked(&self, _blocked: bool) {}
        fn set_pulse(&self, _on: bool) {}
    }

    #[derive(Default)]
    struct RecordingNavigator {
        opened: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn open_order(&self, order_id: &str) {
            self.opened.lock().unwrap().push(order_id.to_string());
        }
    }

    fn listener(
        channel: Arc<FakeChannel>,
        registry: Arc<MemoryRegistry>,
    ) -> (PushListenerService, Arc<AlarmController>, Arc<RecordingNavigator>) {
        let nav = Arc::new(RecordingNavigator::default());
        let alarm = Arc::new(AlarmController::new(Arc::new(NullUi), nav.clone()));
        let service = PushListenerService::new(
            channel,
            registry,
            alarm.clone(),
            nav.clone(),
            Some("operator-1".to_string()),
        );
        (service, alarm, nav)
    }

    fn order_message(order_id: &str) -> PushMessage {
        let mut data = HashMap::new();
        data.insert("order_id".to_string(), order_id.to_string());
        data.insert("order_number".to_string(), "A100".to_string());
        PushMessage {
            title: Some("🍕 Nuovo Ordine!".to_string()),
            body: Some("Ordine A100 - Mario".to_string()),
            data,
        }
    }

    #[tokio::test]
    async fn initialize_registers_the_acquired_token() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, _, _) = listener(FakeChannel::new(true, "tok-1"), registry.clone());

        assert!(service.initialize().await.unwrap());

        let rows = registry.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fcm_token, "tok-1");
        assert_eq!(rows[0].user_id.as_deref(), Some("operator-1"));
        assert_eq!(rows[0].platform.as_deref(), Some("android"));
    }

    #[tokio::test]
    async fn declined_permission_is_a_negative_result_not_an_error() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, _, _) = listener(FakeChannel::new(false, "tok-1"), registry.clone());

        assert!(!service.initialize().await.unwrap());
        assert!(registry.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_registration_is_soft_and_initialize_still_succeeds() {
        let registry = Arc::new(MemoryRegistry::default());
        registry.fail_register.store(true, Ordering::SeqCst);
        let (service, _, _) = listener(FakeChannel::new(true, "tok-1"), registry.clone());

        assert!(service.initialize().await.unwrap());
    }

    #[tokio::test]
    async fn foreground_notification_raises_the_alarm() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, alarm, _) = listener(FakeChannel::new(true, "tok-1"), registry);

        service.notification_received(order_message("o1"));

        assert!(alarm.is_alarming());
        assert_eq!(alarm.current().unwrap().order_id, "o1");
    }

    #[tokio::test]
    async fn background_tap_navigates_without_raising_the_alarm() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, alarm, nav) = listener(FakeChannel::new(true, "tok-1"), registry);

        service.action_performed(order_message("o7"));

        assert!(!alarm.is_alarming());
        assert_eq!(nav.opened.lock().unwrap().as_slice(), ["o7"]);
    }

    #[tokio::test]
    async fn token_rotation_reregisters_without_touching_the_alarm() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, alarm, _) = listener(FakeChannel::new(true, "tok-1"), registry.clone());
        service.initialize().await.unwrap();
        service.notification_received(order_message("o1"));

        service.token_received("tok-2".to_string()).await;

        assert!(alarm.is_alarming());
        let rows = registry.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.fcm_token == "tok-2"));
    }

    #[tokio::test]
    async fn identical_token_rotation_is_an_idempotent_rewrite() {
        let registry = Arc::new(MemoryRegistry::default());
        let (service, _, _) = listener(FakeChannel::new(true, "tok-1"), registry.clone());
        service.initialize().await.unwrap();

        service.token_received("tok-1".to_string()).await;

        // Still one row for the token; the rewrite replaced it in place.
        assert_eq!(registry.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_token_removes_platform_token_and_registry_row() {
        let registry = Arc::new(MemoryRegistry::default());
        let channel = FakeChannel::new(true, "tok-1");
        let (service, _, _) = listener(channel.clone(), registry.clone());
        service.initialize().await.unwrap();

        service.delete_token().await.unwrap();

        assert_eq!(channel.deletes.load(Ordering::SeqCst), 1);
        assert!(registry.rows.lock().unwrap().is_empty());
    }
}
