//! Action-state classification
//!
//! The punish state machine never looks at raw action-state numbers. It asks
//! an [`ActionStateClassifier`] whether an opponent is damaged, grabbed, or
//! back in control, and how much damage a tick dealt. [`MeleeStates`] is the
//! classifier for Melee action-state tables.

use crate::model::PlayerFrame;

/// Semantic predicates over action-state identifiers.
pub trait ActionStateClassifier {
    /// In hitstun or tumble.
    fn is_damaged(&self, state: u16) -> bool;

    /// Held by a grab or command grab.
    fn is_grabbed(&self, state: u16) -> bool;

    /// Freely actionable.
    fn is_in_control(&self, state: u16) -> bool;

    /// In a tech animation.
    fn is_teching(&self, state: u16) -> bool;

    /// Knocked down on the ground.
    fn is_down(&self, state: u16) -> bool;

    /// In a death animation.
    fn is_dying(&self, state: u16) -> bool;

    /// Damage taken between two ticks; missing percents count as zero.
    fn damage_taken(&self, previous: &PlayerFrame, current: &PlayerFrame) -> f32 {
        current.percent.resolved() - previous.percent.resolved()
    }

    /// Whether the stock count dropped between two ticks.
    fn lost_stock(&self, previous: &PlayerFrame, current: &PlayerFrame) -> bool {
        match (previous.stocks_remaining, current.stocks_remaining) {
            (Some(before), Some(after)) => after < before,
            _ => false,
        }
    }
}

const DAMAGE_START: u16 = 0x4B;
const DAMAGE_END: u16 = 0x5B;
const DAMAGE_FALL: u16 = 0x26;
const CAPTURE_START: u16 = 0xDF;
const CAPTURE_END: u16 = 0xE8;
const COMMAND_GRAB_RANGE_1: (u16, u16) = (0x10A, 0x130);
const COMMAND_GRAB_RANGE_2: (u16, u16) = (0x147, 0x152);
const BARREL_WAIT: u16 = 0x125;
const GROUNDED_CONTROL_START: u16 = 0x0E;
const GROUNDED_CONTROL_END: u16 = 0x18;
const SQUAT_START: u16 = 0x27;
const SQUAT_END: u16 = 0x29;
const GROUND_ATTACK_START: u16 = 0x2C;
const GROUND_ATTACK_END: u16 = 0x40;
const GRAB: u16 = 0xD4;
const TECH_START: u16 = 0xC7;
const TECH_END: u16 = 0xCC;
const DOWN_START: u16 = 0xB7;
const DOWN_END: u16 = 0xC6;
const DYING_START: u16 = 0x00;
const DYING_END: u16 = 0x0A;

/// Classifier for Melee action-state identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeleeStates;

impl ActionStateClassifier for MeleeStates {
    fn is_damaged(&self, state: u16) -> bool {
        (DAMAGE_START..=DAMAGE_END).contains(&state) || state == DAMAGE_FALL
    }

    fn is_grabbed(&self, state: u16) -> bool {
        let captured = (CAPTURE_START..=CAPTURE_END).contains(&state);
        let command_grabbed = ((COMMAND_GRAB_RANGE_1.0..=COMMAND_GRAB_RANGE_1.1).contains(&state)
            || (COMMAND_GRAB_RANGE_2.0..=COMMAND_GRAB_RANGE_2.1).contains(&state))
            && state != BARREL_WAIT;
        captured || command_grabbed
    }

    fn is_in_control(&self, state: u16) -> bool {
        (GROUNDED_CONTROL_START..=GROUNDED_CONTROL_END).contains(&state)
            || (SQUAT_START..=SQUAT_END).contains(&state)
            || (GROUND_ATTACK_START..=GROUND_ATTACK_END).contains(&state)
            || state == GRAB
    }

    fn is_teching(&self, state: u16) -> bool {
        (TECH_START..=TECH_END).contains(&state)
    }

    fn is_down(&self, state: u16) -> bool {
        (DOWN_START..=DOWN_END).contains(&state)
    }

    fn is_dying(&self, state: u16) -> bool {
        (DYING_START..=DYING_END).contains(&state)
    }
}
