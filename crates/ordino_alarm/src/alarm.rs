//! The new-order alarm state machine.
//!
//! Two states, process-local to one client instance: `Idle` (no overlay)
//! and `Alarming` (persistent overlay, blocked scroll, breathing pulse).
//! A qualifying push while `Alarming` replaces the displayed payload; at
//! most one overlay is ever visible. Every exit path back to `Idle` stops
//! the pulse timer.

use crate::platform::{AlarmUi, Navigator};
use ordino_common::models::PushMessage;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const DEFAULT_TITLE: &str = "🍕 Nuovo Ordine!";
const DEFAULT_BODY: &str = "Hai ricevuto un nuovo ordine";

/// Pulse toggle period for the breathing cue.
const PULSE_PERIOD: Duration = Duration::from_secs(1);

/// The normalized payload displayed by the alarm overlay.
///
/// Every field is defensively defaulted; a malformed push still raises a
/// usable alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmData {
    pub title: String,
    pub body: String,
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub total_amount: String,
    pub order_type: String,
}

impl AlarmData {
    /// Normalize a delivered push message into the overlay payload.
    pub fn from_push(message: &PushMessage) -> Self {
        let field = |key: &str| message.data.get(key).cloned().unwrap_or_default();
        Self {
            title: message
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: message
                .body
                .clone()
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
            order_id: field("order_id"),
            order_number: field("order_number"),
            customer_name: field("customer_name"),
            total_amount: field("total_amount"),
            order_type: field("order_type"),
        }
    }
}

struct ActiveAlarm {
    data: AlarmData,
    pulse: JoinHandle<()>,
}

/// Drives the overlay through `Idle → Alarming → Idle`.
///
/// Construct one per client instance at startup and share it between the
/// push listener and the overlay's stop/view actions.
///
/// The pulse timer is spawned onto the ambient tokio runtime, so
/// [`AlarmController::trigger`] must be reached from within one. Host
/// shells that receive platform push callbacks on a foreign thread must
/// enter the runtime (e.g. `Handle::enter` or channeling the event into a
/// runtime task) before forwarding the event.
pub struct AlarmController {
    ui: Arc<dyn AlarmUi>,
    navigator: Arc<dyn Navigator>,
    active: Mutex<Option<ActiveAlarm>>,
}

impl AlarmController {
    pub fn new(ui: Arc<dyn AlarmUi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            ui,
            navigator,
            active: Mutex::new(None),
        }
    }

    pub fn is_alarming(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// The payload currently on the overlay, if any.
    pub fn current(&self) -> Option<AlarmData> {
        self.active.lock().unwrap().as_ref().map(|a| a.data.clone())
    }

    /// Raise the alarm for `data`.
    ///
    /// From `Idle` this blocks scrolling, starts the pulse and renders the
    /// overlay. While already `Alarming` it replaces the displayed payload
    /// in place; the running pulse and the single overlay are kept.
    ///
    /// # Panics
    ///
    /// Panics when called from outside a tokio runtime context; the pulse
    /// timer has to be spawned somewhere.
    pub fn trigger(&self, data: AlarmData) {
        let mut active = self.active.lock().unwrap();
        match active.as_mut() {
            Some(current) => {
                info!("Alarm replaced: order {}", data.order_number);
                current.data = data;
                self.ui.show_alarm(&current.data);
            }
            None => {
                info!("Alarm raised: order {}", data.order_number);
                self.ui.set_scroll_blocked(true);
                self.ui.show_alarm(&data);
                let pulse = spawn_pulse(self.ui.clone());
                *active = Some(ActiveAlarm { data, pulse });
            }
        }
    }

    /// Dismiss the alarm without navigating. No-op while `Idle`.
    pub fn stop(&self) {
        if let Some(alarm) = self.active.lock().unwrap().take() {
            info!("Alarm dismissed: order {}", alarm.data.order_number);
            self.clear(alarm);
        }
    }

    /// Dismiss the alarm and open the order's detail view. No-op while
    /// `Idle`; navigation fires exactly once per call.
    pub fn view_order(&self) {
        if let Some(alarm) = self.active.lock().unwrap().take() {
            let order_id = alarm.data.order_id.clone();
            self.clear(alarm);
            if order_id.is_empty() {
                warn!("Alarm payload had no order_id, skipping navigation");
            } else {
                self.navigator.open_order(&order_id);
            }
        }
    }

    fn clear(&self, alarm: ActiveAlarm) {
        alarm.pulse.abort();
        self.ui.set_pulse(false);
        self.ui.clear_alarm();
        self.ui.set_scroll_blocked(false);
    }
}

fn spawn_pulse(ui: Arc<dyn AlarmUi>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PULSE_PERIOD);
        // The first tick fires immediately; the overlay starts lit.
        interval.tick().await;
        let mut on = true;
        ui.set_pulse(on);
        loop {
            interval.tick().await;
            on = !on;
            ui.set_pulse(on);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingUi {
        shown: Mutex<Vec<AlarmData>>,
        cleared: AtomicUsize,
        scroll_blocked: AtomicBool,
        pulses: AtomicUsize,
    }

    impl AlarmUi for RecordingUi {
        fn show_alarm(&self, data: &AlarmData) {
            self.shown.lock().unwrap().push(data.clone());
        }

        fn clear_alarm(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }

        fn set_scroll_blocked(&self, blocked: bool) {
            self.scroll_blocked.store(blocked, Ordering::SeqCst);
        }

        fn set_pulse(&self, _on: bool) {
            self.pulses.fetch_add(1, Ordering::SeqCst);
        }
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

    fn data(order_id: &str, order_number: &str) -> AlarmData {
        AlarmData {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            order_id: order_id.to_string(),
            order_number: order_number.to_string(),
            customer_name: String::new(),
            total_amount: String::new(),
            order_type: String::new(),
        }
    }

    fn controller() -> (AlarmController, Arc<RecordingUi>, Arc<RecordingNavigator>) {
        let ui = Arc::new(RecordingUi::default());
        let nav = Arc::new(RecordingNavigator::default());
        (AlarmController::new(ui.clone(), nav.clone()), ui, nav)
    }

    #[test]
    fn normalization_defaults_every_missing_field() {
        let message = PushMessage {
            title: None,
            body: None,
            data: HashMap::new(),
        };
        let data = AlarmData::from_push(&message);
        assert_eq!(data.title, DEFAULT_TITLE);
        assert_eq!(data.body, DEFAULT_BODY);
        assert_eq!(data.order_id, "");
    }

    #[test]
    fn normalization_reads_order_fields_from_the_data_map() {
        let mut map = HashMap::new();
        map.insert("order_id".to_string(), "o1".to_string());
        map.insert("order_number".to_string(), "A100".to_string());
        map.insert("customer_name".to_string(), "Mario".to_string());
        let message = PushMessage {
            title: Some("t".to_string()),
            body: Some("b".to_string()),
            data: map,
        };
        let data = AlarmData::from_push(&message);
        assert_eq!(data.order_id, "o1");
        assert_eq!(data.order_number, "A100");
        assert_eq!(data.customer_name, "Mario");
    }

    #[tokio::test]
    async fn trigger_from_idle_raises_one_overlay_and_blocks_scroll() {
        let (controller, ui, _) = controller();

        controller.trigger(data("o1", "A100"));

        assert!(controller.is_alarming());
        assert!(ui.scroll_blocked.load(Ordering::SeqCst));
        assert_eq!(ui.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_trigger_replaces_the_payload_without_a_second_overlay() {
        let (controller, ui, _) = controller();

        controller.trigger(data("o1", "A100"));
        controller.trigger(data("o2", "A101"));

        assert!(controller.is_alarming());
        assert_eq!(controller.current().unwrap().order_id, "o2");
        // Re-rendered in place, never cleared between the two.
        assert_eq!(ui.shown.lock().unwrap().len(), 2);
        assert_eq!(ui.cleared.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_clears_payload_and_restores_scroll() {
        let (controller, ui, nav) = controller();

        controller.trigger(data("o1", "A100"));
        controller.stop();

        assert!(!controller.is_alarming());
        assert!(controller.current().is_none());
        assert!(!ui.scroll_blocked.load(Ordering::SeqCst));
        assert_eq!(ui.cleared.load(Ordering::SeqCst), 1);
        assert!(nav.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn view_order_navigates_exactly_once() {
        let (controller, _, nav) = controller();

        controller.trigger(data("o1", "A100"));
        controller.view_order();
        // Already idle: a second invocation must not navigate again.
        controller.view_order();

        assert!(!controller.is_alarming());
        assert_eq!(nav.opened.lock().unwrap().as_slice(), ["o1"]);
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let (controller, ui, _) = controller();
        controller.stop();
        assert_eq!(ui.cleared.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_toggles_while_alarming_and_halts_on_stop() {
        let (controller, ui, _) = controller();

        controller.trigger(data("o1", "A100"));
        // Let the spawned pulse task start its interval before the paused
        // clock is advanced; otherwise the interval begins after the jump.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        let while_alarming = ui.pulses.load(Ordering::SeqCst);
        assert!(while_alarming >= 3);

        controller.stop();
        let at_stop = ui.pulses.load(Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(ui.pulses.load(Ordering::SeqCst), at_stop);
    }
}
