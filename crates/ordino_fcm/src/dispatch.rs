//! Fan-out dispatcher for order notifications.
//!
//! One trigger, one batch: the dispatcher loads every registered device,
//! mints a single bearer token for the batch and walks the devices
//! sequentially, tallying per-device outcomes. A failed device never stops
//! the batch; a failed token mint or registry read aborts it before any
//! send is attempted.

use ordino_common::models::OrderNotificationPayload;
use ordino_common::services::{AccessTokenIssuer, BoxedError, PushSender, TokenRegistry};
pub use ordino_common::token_prefix;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::NotifyError;

/// Outcome tally of one dispatch batch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DispatchSummary {
    /// Devices that accepted the message
    pub success: usize,

    /// Devices that rejected it or timed out
    pub failed: usize,

    /// Devices the batch targeted
    pub total_devices: usize,
}

impl DispatchSummary {
    fn empty() -> Self {
        Self {
            success: 0,
            failed: 0,
            total_devices: 0,
        }
    }
}

/// Receives tokens the provider has permanently rejected.
///
/// The dispatcher reports a dead token here exactly once per batch; what to
/// do with it (log, prune, enqueue) is the sink's business.
pub trait InvalidTokenSink: Send + Sync {
    fn token_rejected(&self, token: &str, reason: &str);
}

/// Default sink: records the rejection in the log and nothing else.
pub struct LogOnlySink;

impl InvalidTokenSink for LogOnlySink {
    fn token_rejected(&self, token: &str, reason: &str) {
        warn!(
            "Token {} permanently rejected by provider: {}",
            token_prefix(token),
            reason
        );
    }
}

/// Sends an order notification to every registered device.
pub struct Dispatcher {
    registry: Arc<dyn TokenRegistry<Error = BoxedError>>,
    issuer: Arc<dyn AccessTokenIssuer<Error = NotifyError>>,
    sender: Arc<dyn PushSender>,
    invalid_tokens: Arc<dyn InvalidTokenSink>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn TokenRegistry<Error = BoxedError>>,
        issuer: Arc<dyn AccessTokenIssuer<Error = NotifyError>>,
        sender: Arc<dyn PushSender>,
        invalid_tokens: Arc<dyn InvalidTokenSink>,
    ) -> Self {
        Self {
            registry,
            issuer,
            sender,
            invalid_tokens,
        }
    }

    /// Run one dispatch batch for `payload`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` before touching the registry when the
    /// mandatory order fields are missing, `RegistryError` when the device
    /// list cannot be read, and `AuthFailure` when no bearer token could be
    /// minted. Per-device failures are tallied, never returned.
    pub async fn dispatch_order(
        &self,
        payload: &OrderNotificationPayload,
    ) -> Result<DispatchSummary, NotifyError> {
        if !payload.has_required_fields() {
            return Err(NotifyError::InvalidPayload(
                "order_id and order_number are required".to_string(),
            ));
        }

        let devices = self
            .registry
            .list_all()
            .await
            .map_err(|e| NotifyError::RegistryError(e.to_string()))?;

        if devices.is_empty() {
            info!("No registered devices, nothing to dispatch");
            return Ok(DispatchSummary::empty());
        }

        // One token per batch. Minting happens after the empty-registry
        // check so an idle installation never exchanges credentials.
        let bearer = self.issuer.bearer_token().await?;

        info!(
            "Dispatching order {} to {} device(s)",
            payload.order_number,
            devices.len()
        );

        let mut summary = DispatchSummary {
            success: 0,
            failed: 0,
            total_devices: devices.len(),
        };

        for device in &devices {
            match self
                .sender
                .send(&device.fcm_token, &bearer.token, payload)
                .await
            {
                Ok(message_id) => {
                    info!(
                        "Sent to device {}: {}",
                        token_prefix(&device.fcm_token),
                        message_id
                    );
                    summary.success += 1;
                }
                Err(e) => {
                    error!(
                        "Send to device {} failed: {}",
                        token_prefix(&device.fcm_token),
                        e
                    );
                    if e.permanent {
                        self.invalid_tokens
                            .token_rejected(&device.fcm_token, &e.message);
                    }
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Dispatch complete: {} sent, {} failed of {}",
            summary.success, summary.failed, summary.total_devices
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ordino_common::models::DeviceRegistration;
    use ordino_common::services::{AccessToken, BoxFuture, PushSendError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn payload() -> OrderNotificationPayload {
        serde_json::from_str(r#"{"order_id": "o1", "order_number": "A100"}"#).unwrap()
    }

    struct FixedRegistry {
        tokens: Vec<&'static str>,
        fail: bool,
    }

    impl TokenRegistry for FixedRegistry {
        type Error = BoxedError;

        fn register(
            &self,
            registration: DeviceRegistration,
        ) -> BoxFuture<'_, DeviceRegistration, BoxedError> {
            Box::pin(async move { Ok(registration) })
        }

        fn remove(&self, _token: &str) -> BoxFuture<'_, bool, BoxedError> {
            Box::pin(async move { Ok(false) })
        }

        fn list_all(&self) -> BoxFuture<'_, Vec<DeviceRegistration>, BoxedError> {
            let result = if self.fail {
                Err(BoxedError::from("registry unavailable".to_string()))
            } else {
                Ok(self
                    .tokens
                    .iter()
                    .map(|t| DeviceRegistration::new(t.to_string(), None, None))
                    .collect())
            };
            Box::pin(async move { result })
        }
    }

    struct CountingIssuer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingIssuer {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl AccessTokenIssuer for CountingIssuer {
        type Error = NotifyError;

        fn bearer_token(&self) -> BoxFuture<'_, AccessToken, NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(NotifyError::AuthFailure("invalid_grant".to_string()))
                } else {
                    Ok(AccessToken {
                        token: "bearer-test".to_string(),
                        expires_at: Utc::now() + Duration::seconds(3600),
                    })
                }
            })
        }
    }

    /// Sender that permanently rejects tokens starting with "dead" and
    /// transiently rejects tokens starting with "flaky".
    struct ScriptedSender {
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedSender {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl PushSender for ScriptedSender {
        fn send(
            &self,
            token: &str,
            _bearer: &str,
            _payload: &OrderNotificationPayload,
        ) -> BoxFuture<'_, String, PushSendError> {
            self.sent.lock().unwrap().push(token.to_string());
            let result = if token.starts_with("dead") {
                Err(PushSendError {
                    message: "UNREGISTERED".to_string(),
                    permanent: true,
                })
            } else if token.starts_with("flaky") {
                Err(PushSendError {
                    message: "unavailable".to_string(),
                    permanent: false,
                })
            } else {
                Ok(format!("msg-{}", token))
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        rejected: Mutex<Vec<String>>,
    }

    impl InvalidTokenSink for RecordingSink {
        fn token_rejected(&self, token: &str, _reason: &str) {
            self.rejected.lock().unwrap().push(token.to_string());
        }
    }

    fn dispatcher(
        tokens: Vec<&'static str>,
        registry_fails: bool,
        issuer_fails: bool,
    ) -> (Dispatcher, Arc<CountingIssuer>, Arc<ScriptedSender>, Arc<RecordingSink>) {
        let issuer = Arc::new(CountingIssuer::new(issuer_fails));
        let sender = Arc::new(ScriptedSender::new());
        let sink = Arc::new(RecordingSink::default());
        let d = Dispatcher::new(
            Arc::new(FixedRegistry {
                tokens,
                fail: registry_fails,
            }),
            issuer.clone(),
            sender.clone(),
            sink.clone(),
        );
        (d, issuer, sender, sink)
    }

    #[tokio::test]
    async fn empty_registry_yields_zero_summary_without_minting() {
        let (d, issuer, sender, _) = dispatcher(vec![], false, false);

        let summary = d.dispatch_order(&payload()).await.unwrap();
        assert_eq!(summary, DispatchSummary::empty());
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn per_device_failures_never_abort_the_batch() {
        let (d, _, sender, _) = dispatcher(vec!["ok-1", "flaky-2", "ok-3"], false, false);

        let summary = d.dispatch_order(&payload()).await.unwrap();
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_devices, 3);
        // Every device was attempted despite the failure in the middle.
        assert_eq!(sender.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn auth_failure_aborts_before_any_send() {
        let (d, _, sender, _) = dispatcher(vec!["ok-1", "ok-2"], false, true);

        let err = d.dispatch_order(&payload()).await.unwrap_err();
        assert!(matches!(err, NotifyError::AuthFailure(_)));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_failure_surfaces_as_registry_error() {
        let (d, issuer, _, _) = dispatcher(vec![], true, false);

        let err = d.dispatch_order(&payload()).await.unwrap_err();
        assert!(matches!(err, NotifyError::RegistryError(_)));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_the_registry_is_read() {
        let (d, _, sender, _) = dispatcher(vec!["ok-1"], false, false);
        let bad: OrderNotificationPayload =
            serde_json::from_str(r#"{"order_number": "A100"}"#).unwrap();

        let err = d.dispatch_order(&bad).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidPayload(_)));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn permanent_rejections_reach_the_invalid_token_sink() {
        let (d, _, _, sink) = dispatcher(vec!["dead-1", "flaky-2", "ok-3"], false, false);

        let summary = d.dispatch_order(&payload()).await.unwrap();
        assert_eq!(summary.failed, 2);

        let rejected = sink.rejected.lock().unwrap();
        // Only the permanent rejection reaches the sink, with the full token.
        assert_eq!(rejected.as_slice(), ["dead-1"]);
    }
}
