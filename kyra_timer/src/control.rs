use crate::error::TimerError;
use crate::table::{TimerCallback, TimerTable};
use crate::TimerId;

/// The part of a [`TimerTable`] a callback may touch while a pass is
/// running: slot reconfiguration and reads. Advancing or restoring the
/// table is not reachable from here, so a pass can never nest.
///
/// ```compile_fail
/// use kyra_timer::{callback, TimerControl};
///
/// let _nested = callback(|ticks: &mut u32, timers: &mut TimerControl<'_, u32>, _| {
///     timers.advance(ticks)?;
///     Ok(())
/// });
/// ```
pub struct TimerControl<'a, C> {
    table: &'a mut TimerTable<C>,
}

impl<'a, C> TimerControl<'a, C> {
    pub(crate) fn new(table: &'a mut TimerTable<C>) -> Self {
        TimerControl { table }
    }

    pub fn add_timer(
        &mut self,
        id: TimerId,
        callback: Option<TimerCallback<C>>,
        delay: i32,
        enabled: bool,
    ) -> Result<(), TimerError> {
        self.table.add_timer(id, callback, delay, enabled)
    }

    pub fn set_delay(&mut self, id: TimerId, delay: i32) -> Result<(), TimerError> {
        self.table.set_delay(id, delay)
    }

    pub fn set_countdown(&mut self, id: TimerId, countdown: i32) -> Result<(), TimerError> {
        self.table.set_countdown(id, countdown)
    }

    pub fn enable(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.table.enable(id)
    }

    pub fn disable(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.table.disable(id)
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Passes completed before the one currently running.
    pub fn ticks_elapsed(&self) -> u64 {
        self.table.ticks_elapsed()
    }

    pub fn delay(&self, id: TimerId) -> Result<i32, TimerError> {
        self.table.delay(id)
    }

    pub fn countdown(&self, id: TimerId) -> Result<i32, TimerError> {
        self.table.countdown(id)
    }

    pub fn is_enabled(&self, id: TimerId) -> Result<bool, TimerError> {
        self.table.is_enabled(id)
    }

    pub fn has_callback(&self, id: TimerId) -> Result<bool, TimerError> {
        self.table.has_callback(id)
    }
}
