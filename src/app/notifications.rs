use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Detection, EventCatalog, Priority, SoundEventSpec, Transcript};
use crate::domain::config::NotificationsSection;
use crate::ports::Wearable;

/// What a notification actually reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub visual: bool,
    pub haptic: bool,
}

impl Delivery {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Routes detections and transcripts to their delivery channels.
///
/// Each catalog event carries a cooldown; a detection landing inside its
/// event's cooldown window is dropped so a ringing alarm does not turn into
/// a vibration storm. Haptic delivery goes through the wearable, visual
/// delivery is reported to the caller (the controller owns the shell).
pub struct NotificationManager {
    catalog: Arc<EventCatalog>,
    config: NotificationsSection,
    wearable: Arc<dyn Wearable>,
    last_fired: Mutex<HashMap<String, Instant>>,
}

impl NotificationManager {
    pub fn new(
        catalog: Arc<EventCatalog>,
        config: NotificationsSection,
        wearable: Arc<dyn Wearable>,
    ) -> Self {
        Self {
            catalog,
            config,
            wearable,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Route a classified sound event.
    pub async fn notify_sound(&self, detection: &Detection) -> Delivery {
        let spec = match self.catalog.get(&detection.event_id) {
            Some(spec) => spec,
            None => {
                warn!(event = %detection.event_id, "Detection for unknown catalog event");
                return Delivery::none();
            }
        };

        if !self.try_fire(spec, Instant::now()) {
            debug!(event = %spec.id, "Notification suppressed by cooldown");
            return Delivery::none();
        }

        self.deliver(spec, Some(detection)).await
    }

    /// Route a recognized utterance. Speech has no cooldown; captions flow
    /// continuously.
    pub async fn notify_speech(&self, transcript: &Transcript) -> Delivery {
        match self.catalog.get("speech") {
            Some(spec) => {
                debug!(text_len = transcript.text.len(), "Routing speech notification");
                self.deliver(spec, None).await
            }
            None => Delivery::none(),
        }
    }

    async fn deliver(&self, spec: &SoundEventSpec, detection: Option<&Detection>) -> Delivery {
        let mut delivery = Delivery {
            visual: spec.channels.visual && self.config.visual,
            haptic: false,
        };

        if spec.channels.haptic && self.config.haptic {
            let params = serde_json::json!({
                "pattern": vibration_pattern(spec.priority),
                "event": spec.id,
                "confidence": detection.map(|d| d.confidence),
            });
            delivery.haptic = self.wearable.send_command("vibrate", params).await;
        }

        info!(
            event = %spec.id,
            priority = ?spec.priority,
            visual = delivery.visual,
            haptic = delivery.haptic,
            "Notification routed"
        );
        delivery
    }

    /// Record the firing unless the event is still cooling down.
    fn try_fire(&self, spec: &SoundEventSpec, now: Instant) -> bool {
        if spec.cooldown_secs == 0 {
            return true;
        }

        let mut last_fired = self.last_fired.lock();
        if let Some(&last) = last_fired.get(&spec.id) {
            if now.duration_since(last) < Duration::from_secs(spec.cooldown_secs) {
                return false;
            }
        }
        last_fired.insert(spec.id.clone(), now);
        true
    }
}

fn vibration_pattern(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "continuous",
        Priority::High => "double",
        Priority::Normal | Priority::Low => "single",
    }
}
