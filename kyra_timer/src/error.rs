use thiserror::Error;

use crate::TimerId;

/// Error conditions raised by the timer table.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer slot {id} is outside the table ({capacity} slots)")]
    SlotOutOfRange { id: TimerId, capacity: usize },
    #[error("timer slot {id}: delay {delay} is invalid (only -1 may be negative)")]
    InvalidDelay { id: TimerId, delay: i32 },
    #[error("timer slot {id} callback failed")]
    Callback {
        id: TimerId,
        #[source]
        source: anyhow::Error,
    },
}
