//! Record criteria
//!
//! [`Criteria`] is the resolved form of [`CriteriaSettings`]: every field
//! has its default applied, so matching never has to consider "unset".

use crate::config::CriteriaSettings;
use crate::model::OpeningType;
use crate::tracker::RawEvent;

/// Resolved criteria for one subscription.
///
/// The defaults pass every record.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    /// Minimum total move damage
    pub min_damage: f32,
    /// Maximum total move damage
    pub max_damage: Option<f32>,
    /// Minimum number of moves
    pub min_moves: usize,
    /// Require a stock loss
    pub kills_only: bool,
    /// Accepted opening types
    pub opening_types: Option<Vec<OpeningType>>,
    /// Accepted subject characters
    pub character_ids: Option<Vec<u16>>,
    /// Accepted subject name tags
    pub name_tags: Option<Vec<String>>,
    /// Drop records where either participant is a CPU
    pub exclude_cpus: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            min_damage: 0.0,
            max_damage: None,
            min_moves: 0,
            kills_only: false,
            opening_types: None,
            character_ids: None,
            name_tags: None,
            exclude_cpus: false,
        }
    }
}

impl From<&CriteriaSettings> for Criteria {
    fn from(settings: &CriteriaSettings) -> Self {
        let defaults = Self::default();
        Self {
            min_damage: settings.min_damage.unwrap_or(defaults.min_damage),
            max_damage: settings.max_damage.or(defaults.max_damage),
            min_moves: settings.min_moves.unwrap_or(defaults.min_moves),
            kills_only: settings.kills_only.unwrap_or(defaults.kills_only),
            opening_types: settings.opening_types.clone(),
            character_ids: settings.character_ids.clone(),
            name_tags: settings.name_tags.clone(),
            exclude_cpus: settings.exclude_cpus.unwrap_or(defaults.exclude_cpus),
        }
    }
}

impl Criteria {
    /// Whether the event's record satisfies every criterion.
    #[must_use]
    pub fn matches(&self, event: &RawEvent) -> bool {
        let record = &event.record;
        let damage = record.total_damage();

        if damage < self.min_damage {
            return false;
        }
        if self.max_damage.is_some_and(|max| damage > max) {
            return false;
        }
        if record.moves.len() < self.min_moves {
            return false;
        }
        if self.kills_only && !record.did_kill {
            return false;
        }
        if let Some(openings) = &self.opening_types {
            if !openings.contains(&record.opening_type) {
                return false;
            }
        }

        let subject = event.contest.participant(record.subject_index);
        if let Some(ids) = &self.character_ids {
            if !subject
                .and_then(|p| p.character_id)
                .is_some_and(|id| ids.contains(&id))
            {
                return false;
            }
        }
        if let Some(tags) = &self.name_tags {
            if !subject
                .and_then(|p| p.name_tag.as_ref())
                .is_some_and(|tag| tags.contains(tag))
            {
                return false;
            }
        }
        if self.exclude_cpus {
            let opponent = event.contest.participant(record.opponent_index);
            if [subject, opponent].into_iter().flatten().any(|p| p.is_cpu) {
                return false;
            }
        }
        true
    }
}
