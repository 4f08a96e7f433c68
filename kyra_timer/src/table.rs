use std::rc::Rc;

use crate::control::TimerControl;
use crate::error::TimerError;
use crate::slot::{TimerSlot, TimerSnapshot};
use crate::{ONE_SHOT, TimerId};

/// Work bound to a slot. Receives the game context, a control handle (so it
/// can reconfigure any slot, including its own) and the id that fired.
pub trait TimerHandler<C> {
    fn on_timer(
        &self,
        ctx: &mut C,
        timers: &mut TimerControl<'_, C>,
        id: TimerId,
    ) -> anyhow::Result<()>;
}

impl<C, F> TimerHandler<C> for F
where
    F: Fn(&mut C, &mut TimerControl<'_, C>, TimerId) -> anyhow::Result<()>,
{
    fn on_timer(
        &self,
        ctx: &mut C,
        timers: &mut TimerControl<'_, C>,
        id: TimerId,
    ) -> anyhow::Result<()> {
        self(ctx, timers, id)
    }
}

pub type TimerCallback<C> = Rc<dyn TimerHandler<C>>;

/// Wraps a function or closure as a slot callback.
pub fn callback<C, F>(handler: F) -> TimerCallback<C>
where
    C: 'static,
    F: Fn(&mut C, &mut TimerControl<'_, C>, TimerId) -> anyhow::Result<()> + 'static,
{
    Rc::new(handler)
}

/// Fixed-capacity table of countdown slots, advanced once per game tick.
pub struct TimerTable<C> {
    slots: Vec<TimerSlot<C>>,
    tick: u64,
}

impl<C> TimerTable<C> {
    /// Creates `capacity` inert slots: no callback, disabled, paused.
    pub fn new(capacity: usize) -> Self {
        TimerTable {
            slots: (0..capacity).map(|_| TimerSlot::inert()).collect(),
            tick: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of `advance` calls made so far, including ones cut short by a
    /// callback error.
    pub fn ticks_elapsed(&self) -> u64 {
        self.tick
    }

    /// Registers (or overwrites) slot `id`. The countdown starts at `delay`,
    /// so a one-shot registration stays paused until explicitly armed.
    pub fn add_timer(
        &mut self,
        id: TimerId,
        callback: Option<TimerCallback<C>>,
        delay: i32,
        enabled: bool,
    ) -> Result<(), TimerError> {
        check_delay(id, delay)?;
        let slot = self.slot_mut(id)?;
        *slot = TimerSlot {
            callback,
            delay,
            countdown: delay,
            enabled,
            spent: false,
            reconfigured: true,
        };
        log::trace!("timer {id}: registered (delay {delay}, enabled {enabled})");
        Ok(())
    }

    /// Changes the re-arm interval without touching the running countdown.
    pub fn set_delay(&mut self, id: TimerId, delay: i32) -> Result<(), TimerError> {
        check_delay(id, delay)?;
        let slot = self.slot_mut(id)?;
        slot.delay = delay;
        log::trace!("timer {id}: delay set to {delay}");
        Ok(())
    }

    /// Forces the remaining ticks of slot `id`. A negative value parks the
    /// slot; zero makes it fire on the next tick.
    pub fn set_countdown(&mut self, id: TimerId, countdown: i32) -> Result<(), TimerError> {
        let slot = self.slot_mut(id)?;
        slot.countdown = countdown;
        slot.spent = false;
        slot.reconfigured = true;
        log::trace!("timer {id}: countdown set to {countdown}");
        Ok(())
    }

    pub fn enable(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.slot_mut(id)?.enabled = true;
        Ok(())
    }

    /// Freezes slot `id`; its countdown is kept as-is until re-enabled.
    pub fn disable(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.slot_mut(id)?.enabled = false;
        Ok(())
    }

    pub fn delay(&self, id: TimerId) -> Result<i32, TimerError> {
        Ok(self.slot(id)?.delay)
    }

    pub fn countdown(&self, id: TimerId) -> Result<i32, TimerError> {
        Ok(self.slot(id)?.countdown)
    }

    pub fn is_enabled(&self, id: TimerId) -> Result<bool, TimerError> {
        Ok(self.slot(id)?.enabled)
    }

    pub fn has_callback(&self, id: TimerId) -> Result<bool, TimerError> {
        Ok(self.slot(id)?.callback.is_some())
    }

    /// Hands out the same reconfiguration handle callbacks receive.
    pub fn control(&mut self) -> TimerControl<'_, C> {
        TimerControl::new(self)
    }

    /// Runs one tick over every enabled slot in ascending id order and
    /// returns the ids that fired.
    ///
    /// Callbacks run synchronously and may reconfigure any slot; a change to
    /// a slot not yet visited applies within this same pass. A callback
    /// error stops the pass immediately and leaves the failing slot
    /// un-rearmed. The tick still counts, since earlier slots already moved.
    pub fn advance(&mut self, ctx: &mut C) -> Result<Vec<TimerId>, TimerError> {
        let pass = self.run_pass(ctx);
        self.tick += 1;
        pass
    }

    fn run_pass(&mut self, ctx: &mut C) -> Result<Vec<TimerId>, TimerError> {
        let mut fired = Vec::new();

        for id in 0..self.slots.len() {
            let slot = &mut self.slots[id];
            if !slot.enabled || slot.countdown < 0 {
                continue;
            }
            if slot.countdown > 0 {
                slot.countdown -= 1;
                if slot.countdown > 0 {
                    continue;
                }
            } else if slot.spent {
                continue;
            }

            slot.reconfigured = false;
            let handler = slot.callback.clone();
            if let Some(handler) = handler {
                log::trace!("timer {id}: firing callback");
                handler
                    .on_timer(ctx, &mut TimerControl::new(self), id)
                    .map_err(|source| TimerError::Callback { id, source })?;
            }

            let slot = &mut self.slots[id];
            if !slot.reconfigured {
                if slot.delay == ONE_SHOT {
                    slot.spent = true;
                } else {
                    slot.countdown = slot.delay;
                }
            }
            fired.push(id);
        }

        Ok(fired)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            tick: self.tick,
            slots: self
                .slots
                .iter()
                .enumerate()
                .map(|(id, slot)| slot.state(id))
                .collect(),
        }
    }

    /// Re-applies saved slot state by id. Every entry is validated before
    /// anything is written, so a bad snapshot leaves the table untouched.
    pub fn restore(&mut self, snapshot: &TimerSnapshot) -> Result<(), TimerError> {
        for state in &snapshot.slots {
            self.slot(state.id)?;
            check_delay(state.id, state.delay)?;
        }
        for state in &snapshot.slots {
            self.slots[state.id].apply(state);
        }
        self.tick = snapshot.tick;
        log::debug!(
            "restored {} timer slots at tick {}",
            snapshot.slots.len(),
            snapshot.tick
        );
        Ok(())
    }

    fn slot(&self, id: TimerId) -> Result<&TimerSlot<C>, TimerError> {
        let capacity = self.slots.len();
        self.slots
            .get(id)
            .ok_or(TimerError::SlotOutOfRange { id, capacity })
    }

    fn slot_mut(&mut self, id: TimerId) -> Result<&mut TimerSlot<C>, TimerError> {
        let capacity = self.slots.len();
        self.slots
            .get_mut(id)
            .ok_or(TimerError::SlotOutOfRange { id, capacity })
    }
}

fn check_delay(id: TimerId, delay: i32) -> Result<(), TimerError> {
    if delay < ONE_SHOT {
        return Err(TimerError::InvalidDelay { id, delay });
    }
    Ok(())
}
