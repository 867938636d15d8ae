//! Opening classification
//!
//! A record's opening type depends on what the mirrored pair (the opponent
//! punishing the subject) was doing when the record opened.

use crate::model::OpeningType;

/// Classifies a record that opened this tick.
///
/// - `mirror_opened`: the mirrored pair opened a record of the same kind on
///   the same tick
/// - `mirror_active`: the mirrored pair has a record of the same kind that
///   is still open after this tick's step, or that closed on this tick
#[must_use]
pub const fn classify_opening(mirror_opened: bool, mirror_active: bool) -> OpeningType {
    if mirror_opened {
        OpeningType::Trade
    } else if mirror_active {
        OpeningType::CounterAttack
    } else {
        OpeningType::NeutralWin
    }
}
