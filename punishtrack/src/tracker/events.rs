//! Raw events published by the tracker.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{ContestSettings, ConversionRecord, PunishKind};

/// Kind of a published event.
///
/// Serialized in kebab-case (`"conversion-closed"`), which is also the
/// spelling subscriptions use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A conversion opened
    ConversionStart,
    /// An open conversion gained a new move
    ConversionExtend,
    /// A conversion closed
    ConversionClosed,
    /// A combo opened
    ComboStart,
    /// An open combo gained a new move
    ComboExtend,
    /// A combo closed
    ComboClosed,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ConversionStart,
        Self::ConversionExtend,
        Self::ConversionClosed,
        Self::ComboStart,
        Self::ComboExtend,
        Self::ComboClosed,
    ];

    /// Stable kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConversionStart => "conversion-start",
            Self::ConversionExtend => "conversion-extend",
            Self::ConversionClosed => "conversion-closed",
            Self::ComboStart => "combo-start",
            Self::ComboExtend => "combo-extend",
            Self::ComboClosed => "combo-closed",
        }
    }

    /// Start kind for a punish kind.
    #[must_use]
    pub const fn start(kind: PunishKind) -> Self {
        match kind {
            PunishKind::Conversion => Self::ConversionStart,
            PunishKind::Combo => Self::ComboStart,
        }
    }

    /// Extend kind for a punish kind.
    #[must_use]
    pub const fn extend(kind: PunishKind) -> Self {
        match kind {
            PunishKind::Conversion => Self::ConversionExtend,
            PunishKind::Combo => Self::ComboExtend,
        }
    }

    /// Closed kind for a punish kind.
    #[must_use]
    pub const fn closed(kind: PunishKind) -> Self {
        match kind {
            PunishKind::Conversion => Self::ConversionClosed,
            PunishKind::Combo => Self::ComboClosed,
        }
    }

    /// The punish kind this event belongs to.
    #[must_use]
    pub const fn punish_kind(self) -> PunishKind {
        match self {
            Self::ConversionStart | Self::ConversionExtend | Self::ConversionClosed => {
                PunishKind::Conversion
            }
            Self::ComboStart | Self::ComboExtend | Self::ComboClosed => PunishKind::Combo,
        }
    }

    /// Suggests the closest known kind for a misspelled label.
    #[must_use]
    pub fn suggest(input: &str) -> Option<&'static str> {
        Self::ALL
            .iter()
            .map(|k| (k.as_str(), strsim::damerau_levenshtein(input, k.as_str())))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(name, _)| name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown event kind '{s}'"))
    }
}

/// One event on the tracker's output stream.
///
/// Cheap to clone: the record and contest are shared.
#[derive(Debug, Clone, Serialize)]
pub struct RawEvent {
    /// What happened
    pub kind: EventKind,
    /// Tick on which it happened
    pub frame: i32,
    /// Record state at publication
    pub record: Arc<ConversionRecord>,
    /// Contest the record belongs to
    pub contest: Arc<ContestSettings>,
}
