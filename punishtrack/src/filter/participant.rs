//! Participant index filter.

use crate::config::MatchMode;
use crate::model::ConversionRecord;

/// Resolved participant filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantFilter {
    /// Participant index to look for
    pub index: usize,
    /// Which side of the pair to compare
    pub mode: MatchMode,
}

impl ParticipantFilter {
    /// Creates a filter.
    #[must_use]
    pub const fn new(index: usize, mode: MatchMode) -> Self {
        Self { index, mode }
    }

    /// Whether the record's pair matches.
    #[must_use]
    pub const fn matches(&self, record: &ConversionRecord) -> bool {
        match self.mode {
            MatchMode::Subject => record.subject_index == self.index,
            MatchMode::Opponent => record.opponent_index == self.index,
            MatchMode::Either => {
                record.subject_index == self.index || record.opponent_index == self.index
            }
        }
    }
}
