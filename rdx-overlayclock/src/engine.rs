//! The state store that every request handler shares.

use crate::common::{Target, Timestamp};
use crate::config::DefaultsConfig;
use crate::error::ControlError;
use crate::events::ControlEvent;
use crate::speech::{NoopNotifier, Notifier};
use crate::state::{OverlayState, Snapshot};
use crate::time::{Clock, SystemClock};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

/// The shared overlay state and its locked accessor API.
///
/// This struct is a handle: cloning it is cheap and every clone operates on
/// the same state. All four entities sit behind a single mutex. Each public
/// operation takes the lock once, brings the counters up to "now", applies
/// its change and releases the lock, so no caller ever observes a
/// half-applied command. Nothing ticks in the background; time only advances
/// when somebody touches the store.
#[derive(Clone)]
pub struct StateStore {
    state: Arc<Mutex<OverlayState>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    defaults: Arc<DefaultsConfig>,
    event_sender: broadcast::Sender<ControlEvent>,
}

// Core implementation block for internal logic.
impl StateStore {
    /// Creates a store on the wall clock with no speech side-channel.
    pub fn new(defaults: DefaultsConfig) -> Self {
        Self::with_parts(defaults, Arc::new(SystemClock), Arc::new(NoopNotifier))
    }

    /// Creates a store with an explicit clock and notifier.
    pub fn with_parts(
        defaults: DefaultsConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        const CHANNEL_CAPACITY: usize = 64;
        let (event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let state = OverlayState::new(clock.now());
        Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            notifier,
            defaults: Arc::new(defaults),
            event_sender,
        }
    }

    /// Runs `change` under the lock on freshly recomputed state.
    ///
    /// "Now" is read while holding the lock so timestamps follow lock order.
    /// Events and speech are handed off inside `change`, before the lock is
    /// released, so both streams follow lock order too. Neither hand-off blocks.
    #[doc(hidden)]
    async fn apply<R>(&self, change: impl FnOnce(&mut OverlayState, Timestamp) -> R) -> R {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        if state.recompute(now) {
            info!("Countdown reached zero.");
            self.publish(ControlEvent::CountdownFinished);
        }
        change(&mut *state, now)
    }

    /// Broadcasts `event`. Only called while holding the lock.
    #[doc(hidden)]
    fn publish(&self, event: ControlEvent) {
        debug!(?event, "Applied command.");
        self.event_sender.send(event).ok();
    }
}

// Public API implementation block.
impl StateStore {
    /// Returns a fully recomputed copy of the overlay state.
    ///
    /// The only fields this may change are the counters' `value`,
    /// `last_update` and, for a countdown hitting zero, `running`.
    pub async fn get_state(&self) -> Snapshot {
        self.apply(|state, now| state.snapshot(now)).await
    }

    /// Starts the stopwatch. Starting a running stopwatch loses no time.
    pub async fn timer_start(&self) {
        self.apply(|state, now| {
            state.timer.start(now);
            self.publish(ControlEvent::TimerStarted);
        })
        .await;
    }

    /// Stops the stopwatch, keeping the time elapsed up to this call.
    pub async fn timer_stop(&self) {
        self.apply(|state, _| {
            state.timer.stop();
            self.publish(ControlEvent::TimerStopped);
        })
        .await;
    }

    pub async fn timer_reset(&self) {
        self.apply(|state, _| {
            state.timer.reset();
            self.publish(ControlEvent::TimerReset);
        })
        .await;
    }

    /// Starts (or restarts) the countdown from `minutes`, which may be fractional.
    ///
    /// # Errors
    /// Negative or non-finite `minutes` are rejected and nothing changes.
    pub async fn countdown_start(&self, minutes: f64) -> Result<(), ControlError> {
        let minutes = ControlError::check_duration("minutes", minutes)?;
        let seconds = ControlError::check_duration("minutes", minutes * 60.0)?;
        self.apply(|state, now| {
            state.countdown.start(seconds, now);
            self.publish(ControlEvent::CountdownStarted { seconds });
        })
        .await;
        Ok(())
    }

    pub async fn countdown_stop(&self) {
        self.apply(|state, _| {
            state.countdown.stop();
            self.publish(ControlEvent::CountdownStopped);
        })
        .await;
    }

    /// Zeroes the countdown, including its `initial` value.
    pub async fn countdown_reset(&self) {
        self.apply(|state, _| {
            state.countdown.reset();
            self.publish(ControlEvent::CountdownReset);
        })
        .await;
    }

    /// Flips the visibility hint of `target` and returns the new value.
    pub async fn toggle_visibility(&self, target: Target) -> bool {
        self.apply(|state, _| {
            let flag = match target {
                Target::Timer => &mut state.timer.visible,
                Target::Countdown => &mut state.countdown.visible,
            };
            *flag = !*flag;
            let visible = *flag;
            self.publish(ControlEvent::VisibilityToggled { target, visible });
            visible
        })
        .await
    }

    /// Shows `text` for `duration` seconds and queues it for speech.
    ///
    /// `color` and `duration` fall back to the configured defaults. The text is
    /// queued while the lock is held, so speech follows the order messages
    /// were applied in. Speaking happens elsewhere and cannot fail this call.
    ///
    /// # Errors
    /// A negative or non-finite `duration` is rejected and nothing changes.
    pub async fn set_message(
        &self,
        text: String,
        color: Option<String>,
        duration: Option<f64>,
    ) -> Result<(), ControlError> {
        let duration = ControlError::check_duration(
            "duration",
            duration.unwrap_or(self.defaults.message_duration),
        )?;
        let color = color.unwrap_or_else(|| self.defaults.message_color.clone());
        self.apply(|state, now| {
            state.message.set(text.clone(), color, duration, now);
            if !text.trim().is_empty() {
                self.notifier.notify(&text);
            }
            let expires_at = state.message.expires_at;
            self.publish(ControlEvent::MessageSet { text, expires_at });
        })
        .await;
        Ok(())
    }

    /// Hides the current message immediately. A no-op when none is showing.
    pub async fn clear_message(&self) {
        self.apply(|state, _| {
            state.message.clear();
            self.publish(ControlEvent::MessageCleared);
        })
        .await;
    }

    /// Records a visual trigger for `duration` seconds (default from config).
    ///
    /// # Errors
    /// A negative or non-finite `duration` is rejected and nothing changes.
    pub async fn trigger_event(
        &self,
        event_type: String,
        duration: Option<f64>,
    ) -> Result<(), ControlError> {
        let duration = ControlError::check_duration(
            "duration",
            duration.unwrap_or(self.defaults.event_duration),
        )?;
        self.apply(|state, now| {
            state.event.trigger(event_type.clone(), duration, now);
            let expires_at = state.event.expires_at;
            self.publish(ControlEvent::EventTriggered {
                event_type,
                expires_at,
            });
        })
        .await;
        Ok(())
    }

    /// Whether a message is showing right now.
    pub async fn message_active(&self) -> bool {
        self.apply(|state, now| state.message.is_active(now)).await
    }

    /// Whether a visual event is active right now.
    pub async fn event_active(&self) -> bool {
        self.apply(|state, now| state.event.is_active(now)).await
    }

    /// The fallbacks this store applies to optional command fields.
    pub fn defaults(&self) -> &DefaultsConfig {
        &self.defaults
    }

    /// Subscribes to the `ControlEvent` stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlEvent> {
        self.event_sender.subscribe()
    }
}
