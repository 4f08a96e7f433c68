//! Frame-synchronous countdown timers for adventure game engines.
//!
//! A [`TimerTable`] holds a fixed number of independently clocked slots. The
//! host calls [`TimerTable::advance`] once per logical game tick; every
//! enabled slot counts down, fires its callback when it reaches zero and is
//! re-armed from its delay. Timing is expressed purely in ticks so replays
//! stay deterministic regardless of rendering speed.

mod control;
mod error;
mod slot;
mod table;

pub use control::TimerControl;
pub use error::TimerError;
pub use slot::{SlotState, TimerSnapshot};
pub use table::{callback, TimerCallback, TimerHandler, TimerTable};

/// Index of a slot inside a [`TimerTable`].
pub type TimerId = usize;

/// Delay value meaning "fire once, never re-arm automatically".
pub const ONE_SHOT: i32 = -1;

/// Countdown value that parks a slot until something re-arms it.
pub const PAUSED: i32 = -1;
