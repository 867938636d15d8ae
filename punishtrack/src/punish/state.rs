//! Per-pair punish cursor.

use crate::model::ConversionRecord;

/// Mutable cursor for one directional participant pair.
///
/// Holds at most one open record. Reset to empty whenever the roster
/// changes and whenever a record closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerConversionState {
    /// Record currently accumulating, if any
    pub(crate) open: Option<ConversionRecord>,
    /// Index into `open.moves` of the move still accepting hits
    pub(crate) current_move: Option<usize>,
    /// Consecutive ticks the opponent has gone without being re-hit
    pub(crate) reset_counter: u32,
    /// Subject action state that landed the last hit
    pub(crate) last_hit_action_state: Option<u16>,
}

impl PlayerConversionState {
    /// Creates an idle cursor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The open record, if one is accumulating.
    #[must_use]
    pub const fn open_record(&self) -> Option<&ConversionRecord> {
        self.open.as_ref()
    }

    /// Whether no record is open.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.open.is_none()
    }

    /// Current value of the punish-timeout clock, in ticks.
    #[must_use]
    pub const fn reset_counter(&self) -> u32 {
        self.reset_counter
    }

    /// Action state recorded at the last connecting hit.
    #[must_use]
    pub const fn last_hit_action_state(&self) -> Option<u16> {
        self.last_hit_action_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle() {
        let state = PlayerConversionState::new();
        assert!(state.is_idle());
        assert!(state.open_record().is_none());
        assert_eq!(state.reset_counter(), 0);
        assert!(state.last_hit_action_state().is_none());
    }
}
