use serde::{Deserialize, Serialize};

use crate::table::TimerCallback;
use crate::{ONE_SHOT, PAUSED, TimerId};

/// One entry of the table. Slots are created inert and only ever
/// reconfigured, never removed.
pub(crate) struct TimerSlot<C> {
    pub(crate) callback: Option<TimerCallback<C>>,
    pub(crate) delay: i32,
    pub(crate) countdown: i32,
    pub(crate) enabled: bool,
    /// Set once a one-shot slot has fired; cleared by any explicit re-arm.
    pub(crate) spent: bool,
    /// Raised whenever the countdown is set from outside `advance`.
    pub(crate) reconfigured: bool,
}

impl<C> TimerSlot<C> {
    pub(crate) fn inert() -> Self {
        TimerSlot {
            callback: None,
            delay: ONE_SHOT,
            countdown: PAUSED,
            enabled: false,
            spent: false,
            reconfigured: false,
        }
    }

    pub(crate) fn state(&self, id: TimerId) -> SlotState {
        SlotState {
            id,
            delay: self.delay,
            countdown: self.countdown,
            enabled: self.enabled,
            spent: self.spent,
        }
    }

    pub(crate) fn apply(&mut self, state: &SlotState) {
        self.delay = state.delay;
        self.countdown = state.countdown;
        self.enabled = state.enabled;
        self.spent = state.spent;
        self.reconfigured = true;
    }
}

/// Serializable view of a single slot, used for save states and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotState {
    pub id: TimerId,
    pub delay: i32,
    pub countdown: i32,
    pub enabled: bool,
    #[serde(default)]
    pub spent: bool,
}

/// Full table state at a tick boundary. Callbacks are not part of the
/// snapshot; restoring keeps whatever the table was registered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub tick: u64,
    pub slots: Vec<SlotState>,
}
