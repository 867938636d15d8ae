//! Configuration schema types
//!
//! These types are deserialized from the subscription file (YAML or JSON)
//! and describe what the composer should emit. They are resolved into the
//! runtime filter types by [`crate::filter::EventComposer::compile`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::OpeningType;

/// Prefix marking a reference into the variable table.
pub const VARIABLE_MARKER: char = '$';

/// String that disables criteria filtering for a subscription.
pub const NO_CRITERIA: &str = "none";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of a subscription file.
///
/// ```yaml
/// variables:
///   $me: 0
///   $strong: { min_damage: 40 }
/// events:
///   - id: big-punish
///     kind: conversion-closed
///     filter:
///       participant: $me
///       criteria: $strong
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ComposerConfig {
    /// Named values referenced from filters with a `$` prefix
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, VariableValue>,

    /// Subscriptions, in output order
    #[serde(default)]
    pub events: Vec<SubscriptionConfig>,

    /// Treat unresolved criteria variables as errors instead of passing all
    #[serde(default)]
    pub strict_variables: bool,
}

/// A value in the variable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A participant index
    Index(usize),
    /// A criteria object
    Criteria(CriteriaSettings),
}

impl VariableValue {
    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Index(_) => "participant index",
            Self::Criteria(_) => "criteria",
        }
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// One requested output stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SubscriptionConfig {
    /// Tag attached to every emission
    pub id: String,

    /// Event kind label, e.g. `conversion-closed`
    #[serde(alias = "type")]
    pub kind: String,

    /// Optional filtering
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Filters applied to a subscription's events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FilterConfig {
    /// Participant index filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantFilterConfig>,

    /// Criteria filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<CriteriaRef>,
}

// ============================================================================
// Participant Filter
// ============================================================================

/// Participant filter, short or long form.
///
/// The short form (`participant: 0` or `participant: $me`) matches the
/// record's subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipantFilterConfig {
    /// Index or variable, matched against the subject
    Short(IndexRef),
    /// Index or variable with an explicit comparison mode
    Detailed(DetailedParticipantFilter),
}

/// Long-form participant filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedParticipantFilter {
    /// Participant to match
    pub index: IndexRef,
    /// Which side of the pair to compare
    #[serde(default)]
    pub mode: MatchMode,
}

impl ParticipantFilterConfig {
    /// The referenced index.
    #[must_use]
    pub const fn index(&self) -> &IndexRef {
        match self {
            Self::Short(index) | Self::Detailed(DetailedParticipantFilter { index, .. }) => index,
        }
    }

    /// The comparison mode.
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        match self {
            Self::Short(_) => MatchMode::Subject,
            Self::Detailed(detailed) => detailed.mode,
        }
    }
}

/// Which side of a record's pair a participant filter compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The punishing participant
    #[default]
    Subject,
    /// The punished participant
    Opponent,
    /// Either orientation
    Either,
}

/// A participant index, literal or through the variable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIndexRef", into = "RawIndexRef")]
pub enum IndexRef {
    /// A literal index
    Literal(usize),
    /// A `$`-prefixed variable name
    Variable(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawIndexRef {
    Index(usize),
    Name(String),
}

impl TryFrom<RawIndexRef> for IndexRef {
    type Error = String;

    fn try_from(raw: RawIndexRef) -> Result<Self, Self::Error> {
        match raw {
            RawIndexRef::Index(index) => Ok(Self::Literal(index)),
            RawIndexRef::Name(name) if name.starts_with(VARIABLE_MARKER) => {
                Ok(Self::Variable(name))
            }
            RawIndexRef::Name(name) => Err(format!(
                "participant must be an index or a '{VARIABLE_MARKER}'-prefixed variable, got '{name}'"
            )),
        }
    }
}

impl From<IndexRef> for RawIndexRef {
    fn from(value: IndexRef) -> Self {
        match value {
            IndexRef::Literal(index) => Self::Index(index),
            IndexRef::Variable(name) => Self::Name(name),
        }
    }
}

// ============================================================================
// Criteria
// ============================================================================

/// Criteria filter reference.
///
/// `"none"` disables criteria filtering, a `$`-prefixed string refers to the
/// variable table, and a map is inline criteria. Any other string is
/// rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCriteriaRef", into = "RawCriteriaRef")]
pub enum CriteriaRef {
    /// Inline criteria
    Literal(CriteriaSettings),
    /// A `$`-prefixed variable name
    Variable(String),
    /// Explicitly pass everything
    Disabled,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCriteriaRef {
    Marker(String),
    Inline(CriteriaSettings),
}

impl TryFrom<RawCriteriaRef> for CriteriaRef {
    type Error = String;

    fn try_from(raw: RawCriteriaRef) -> Result<Self, Self::Error> {
        match raw {
            RawCriteriaRef::Inline(settings) => Ok(Self::Literal(settings)),
            RawCriteriaRef::Marker(marker) if marker == NO_CRITERIA => Ok(Self::Disabled),
            RawCriteriaRef::Marker(marker) if marker.starts_with(VARIABLE_MARKER) => {
                Ok(Self::Variable(marker))
            }
            RawCriteriaRef::Marker(marker) => Err(format!(
                "criteria must be a map, '{NO_CRITERIA}', or a '{VARIABLE_MARKER}'-prefixed variable, got '{marker}'"
            )),
        }
    }
}

impl From<CriteriaRef> for RawCriteriaRef {
    fn from(value: CriteriaRef) -> Self {
        match value {
            CriteriaRef::Literal(settings) => Self::Inline(settings),
            CriteriaRef::Variable(name) => Self::Marker(name),
            CriteriaRef::Disabled => Self::Marker(NO_CRITERIA.to_string()),
        }
    }
}

/// Criteria as written; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct CriteriaSettings {
    /// Minimum total damage (default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_damage: Option<f32>,

    /// Maximum total damage (default unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_damage: Option<f32>,

    /// Minimum number of moves (default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_moves: Option<usize>,

    /// Only records that ended in a stock loss (default false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kills_only: Option<bool>,

    /// Accepted opening types (default any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_types: Option<Vec<OpeningType>>,

    /// Accepted subject character ids (default any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_ids: Option<Vec<u16>>,

    /// Accepted subject name tags (default any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_tags: Option<Vec<String>>,

    /// Drop records involving a CPU participant (default false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_cpus: Option<bool>,
}
