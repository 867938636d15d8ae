//! Contest roster and participant pairings.

use serde::{Deserialize, Serialize};

/// One participant in a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant index (port)
    pub index: usize,
    /// Character identifier, when known
    #[serde(default)]
    pub character_id: Option<u16>,
    /// Display tag, when set
    #[serde(default)]
    pub name_tag: Option<String>,
    /// Whether the participant is computer-controlled
    #[serde(default)]
    pub is_cpu: bool,
}

/// Contest configuration announced when a roster is (re)established.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestSettings {
    /// Stage identifier, when known
    #[serde(default)]
    pub stage_id: Option<u16>,
    /// Participants in index order
    pub players: Vec<Participant>,
}

impl ContestSettings {
    /// Looks up a participant by index.
    #[must_use]
    pub fn participant(&self, index: usize) -> Option<&Participant> {
        self.players.iter().find(|p| p.index == index)
    }

    /// Every ordered `(subject, opponent)` pairing, in participant order.
    #[must_use]
    pub fn ordered_pairs(&self) -> Vec<ParticipantPair> {
        self.players
            .iter()
            .flat_map(|subject| {
                self.players
                    .iter()
                    .filter(move |opponent| opponent.index != subject.index)
                    .map(move |opponent| ParticipantPair::new(subject.index, opponent.index))
            })
            .collect()
    }
}

/// A directional punish relationship: `subject` punishing `opponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantPair {
    /// Participant dealing the punish
    pub subject: usize,
    /// Participant receiving it
    pub opponent: usize,
}

impl ParticipantPair {
    /// Creates a pair.
    #[must_use]
    pub const fn new(subject: usize, opponent: usize) -> Self {
        Self { subject, opponent }
    }

    /// The same pairing seen from the other side.
    #[must_use]
    pub const fn mirror(self) -> Self {
        Self {
            subject: self.opponent,
            opponent: self.subject,
        }
    }
}

impl std::fmt::Display for ParticipantPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.subject, self.opponent)
    }
}
