//! # Overlayclock
//!
//! The shared timed-state engine behind a live-stream overlay.
//!
//! A control panel issues commands (start a timer, start a countdown, show a
//! message, trigger a visual event) and a display page polls the shared state
//! and renders it. Overlayclock owns that shared state and keeps it consistent
//! under concurrent access from many HTTP requests.
//!
//! ## Core Concepts
//!
//! - **StateStore**: A cloneable handle over the four timed entities (`Timer`,
//!   `Countdown`, `Message`, `Event`). Every operation runs under one lock.
//! - **Lazy Recompute**: No background ticker. Running counters are advanced
//!   from their `last_update` anchor whenever the store is touched, so a poll
//!   always observes an up-to-date value.
//! - **Derived Activity**: Messages and events carry an expiry timestamp and are
//!   considered active only while the clock is before it.
//! - **Speech Side-Channel**: Setting a message hands its text to a queued
//!   worker that speaks it out of band. Failures there never reach the store.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use overlayclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load the configuration (defaults, optional file, environment).
//!     let config = OverlayConfig::load(None)?;
//!
//!     // 2. Create the store with the wall clock and no speech output.
//!     let store = StateStore::new(config.defaults.clone());
//!
//!     // 3. Drive it.
//!     store.timer_start().await;
//!     store.countdown_start(5.0).await?;
//!     let snapshot = store.get_state().await;
//!     println!("{}", serde_json::to_string(&snapshot)?);
//!
//!     // 4. Or serve it over HTTP until Ctrl+C.
//!     overlayclock::server::serve(&config.server, store).await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Overlayclock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod server;
pub mod speech;
pub mod state;
pub mod time;

/// A prelude module for easy importing of the most common Overlayclock types.
pub mod prelude {
    pub use crate::common::{Target, Timestamp};
    pub use crate::config::{DefaultsConfig, OverlayConfig, ServerConfig, SpeechConfig};
    pub use crate::engine::StateStore;
    pub use crate::error::ControlError;
    pub use crate::events::ControlEvent;
    pub use crate::speech::{Notifier, SpeechQueue};
    pub use crate::state::Snapshot;
    pub use crate::time::{Clock, ManualClock, SystemClock};
}
