//! Per-tick frame snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A damage percentage that may be absent from the source data.
///
/// Older replays and some frame sources omit the percent field. The
/// zero-default policy for those frames is applied in exactly one place:
/// [`Percent::resolved`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub Option<f32>);

impl Percent {
    /// A percent that is present.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(Some(value))
    }

    /// A percent the source did not report.
    #[must_use]
    pub const fn missing() -> Self {
        Self(None)
    }

    /// Returns the reported value, or `0.0` when it is missing.
    #[must_use]
    pub fn resolved(self) -> f32 {
        self.0.unwrap_or(0.0)
    }
}

impl From<f32> for Percent {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// One participant's state on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrame {
    /// Action-state identifier
    pub action_state: u16,
    /// Ticks spent in the current action state; restarts when the state
    /// is re-entered. Absent in old data.
    #[serde(default)]
    pub action_state_counter: Option<f32>,
    /// Cumulative damage percent
    #[serde(default)]
    pub percent: Percent,
    /// Stocks left, when reported
    #[serde(default)]
    pub stocks_remaining: Option<u8>,
    /// Identifier of the last attack this participant landed
    #[serde(default)]
    pub last_attack_landed: Option<u8>,
}

/// All participants' state on one tick. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Tick index
    pub frame: i32,
    /// Per-participant state keyed by participant index
    pub players: BTreeMap<usize, PlayerFrame>,
}

impl FrameSnapshot {
    /// Returns the state for the participant at `index`.
    #[must_use]
    pub fn player(&self, index: usize) -> Option<&PlayerFrame> {
        self.players.get(&index)
    }
}

/// Two consecutive snapshots of the same contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePair {
    /// Snapshot of the previous tick
    pub previous: FrameSnapshot,
    /// Snapshot of the current tick
    pub current: FrameSnapshot,
}

impl FramePair {
    /// Creates a pair from two consecutive snapshots.
    #[must_use]
    pub const fn new(previous: FrameSnapshot, current: FrameSnapshot) -> Self {
        Self { previous, current }
    }

    /// Returns `(previous, current)` for one participant if both ticks carry it.
    #[must_use]
    pub fn player(&self, index: usize) -> Option<(&PlayerFrame, &PlayerFrame)> {
        Some((self.previous.player(index)?, self.current.player(index)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_percent_resolves_to_zero() {
        assert!((Percent::missing().resolved()).abs() < f32::EPSILON);
        assert!((Percent::new(12.5).resolved() - 12.5).abs() < f32::EPSILON);
    }

    #[test]
    fn percent_deserializes_from_null_or_number() {
        let frame: PlayerFrame =
            serde_json::from_str(r#"{"action_state": 14, "percent": null}"#).unwrap();
        assert_eq!(frame.percent, Percent::missing());

        let frame: PlayerFrame =
            serde_json::from_str(r#"{"action_state": 14, "percent": 33.0}"#).unwrap();
        assert_eq!(frame.percent, Percent::new(33.0));

        let frame: PlayerFrame = serde_json::from_str(r#"{"action_state": 14}"#).unwrap();
        assert_eq!(frame.percent, Percent::missing());
    }

    #[test]
    fn snapshot_players_keyed_by_index() {
        let snapshot: FrameSnapshot = serde_json::from_str(
            r#"{"frame": 5, "players": {"0": {"action_state": 14}, "3": {"action_state": 80}}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.player(3).map(|p| p.action_state), Some(80));
        assert!(snapshot.player(1).is_none());
    }
}
