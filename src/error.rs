//! Errors for requests the current timer state does not allow

use thiserror::Error;

use crate::state::TimerState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("{0} seconds is not a preset duration")]
    NotAPreset(u64),

    #[error("Cannot {action} while the timer is {state:?}")]
    Conflict {
        action: &'static str,
        state: TimerState,
    },
}

pub type Result<T, E = TimerError> = std::result::Result<T, E>;
