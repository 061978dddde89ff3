//! Contains the timed entities the overlay displays.
//!
//! Counters (`Timer`, `Countdown`) advance lazily: each one remembers the
//! instant it was last brought up to date and catches up on the next
//! `recompute`. Banners (`Message`, `Event`) never advance at all; whether one
//! is showing is derived from its expiry timestamp at read time.

pub mod banner;
pub mod timer;

pub use banner::{Event, Message};
pub use timer::{Countdown, Timer};
