//! Conversion records and the moves inside them.

use serde::{Deserialize, Serialize};

use super::contest::ParticipantPair;

/// How a conversion began.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpeningType {
    /// Not classified
    #[default]
    Unknown,
    /// Opened from neutral
    NeutralWin,
    /// Opened while being punished
    CounterAttack,
    /// Both sides opened on the same tick
    Trade,
}

/// Which punish rules produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PunishKind {
    /// Ends once the opponent has held control for longer than the reset window
    Conversion,
    /// Ends once the opponent has been out of hitstun for longer than the reset window
    Combo,
}

impl PunishKind {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conversion => "conversion",
            Self::Combo => "combo",
        }
    }
}

impl std::fmt::Display for PunishKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One distinct attack landing inside an open record.
///
/// Multi-hit attacks fold into a single entry while the same attack
/// instance is ongoing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvent {
    /// Tick the attack first connected
    pub frame: i32,
    /// Attack identifier reported by the subject's frame
    pub move_id: Option<u8>,
    /// Number of connecting hits
    pub hit_count: u32,
    /// Damage dealt across all hits
    pub damage: f32,
}

/// A bounded punish of `opponent_index` by `subject_index`.
///
/// Open while `end_frame` is `None`; the closing fields are always set
/// together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Participant dealing the punish
    pub subject_index: usize,
    /// Participant receiving it
    pub opponent_index: usize,
    /// Rules that produced the record
    pub kind: PunishKind,
    /// Tick the record opened
    pub start_frame: i32,
    /// Tick the record closed
    pub end_frame: Option<i32>,
    /// Opponent percent on the tick before opening
    pub start_percent: f32,
    /// Latest tracked opponent percent
    pub current_percent: f32,
    /// Opponent percent on the tick before closing
    pub end_percent: Option<f32>,
    /// Distinct attacks, in landing order
    pub moves: Vec<MoveEvent>,
    /// Whether the record closed on a stock loss
    pub did_kill: bool,
    /// How the record began
    pub opening_type: OpeningType,
}

impl ConversionRecord {
    /// Opens a record with no moves.
    #[must_use]
    pub fn open(
        pair: ParticipantPair,
        kind: PunishKind,
        start_frame: i32,
        start_percent: f32,
        current_percent: f32,
    ) -> Self {
        Self {
            subject_index: pair.subject,
            opponent_index: pair.opponent,
            kind,
            start_frame,
            end_frame: None,
            start_percent,
            current_percent,
            end_percent: None,
            moves: Vec::new(),
            did_kill: false,
            opening_type: OpeningType::Unknown,
        }
    }

    /// The pairing this record belongs to.
    #[must_use]
    pub const fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(self.subject_index, self.opponent_index)
    }

    /// Whether the record is still accumulating.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end_frame.is_none()
    }

    /// Sets both closing fields.
    pub(crate) const fn close(&mut self, end_frame: i32, end_percent: f32) {
        self.end_frame = Some(end_frame);
        self.end_percent = Some(end_percent);
    }

    /// Sum of damage over every recorded move.
    #[must_use]
    pub fn total_damage(&self) -> f32 {
        self.moves.iter().map(|m| m.damage).sum()
    }

    /// Percent gained by the opponent over the record's span.
    #[must_use]
    pub fn percent_dealt(&self) -> f32 {
        self.end_percent.unwrap_or(self.current_percent) - self.start_percent
    }
}
