//! Punish state machine
//!
//! One call to [`step`] advances one [`PlayerConversionState`] by one tick.
//! The machine is idle until the opponent is damaged or grabbed, punishing
//! while the opponent stays stunned or has only briefly regained control,
//! and closes the record on a stock loss or once the reset counter runs
//! past [`PunishRules::reset_frames`].

use tracing::trace;

use crate::classify::ActionStateClassifier;
use crate::model::{ConversionRecord, FramePair, MoveEvent, ParticipantPair, PunishKind};

use super::state::PlayerConversionState;

/// Ticks of uninterrupted opponent control that end a punish.
pub const DEFAULT_RESET_FRAMES: u32 = 45;

/// Rules for one kind of punish record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunishRules {
    /// Kind of record produced
    pub kind: PunishKind,
    /// Close once the reset counter is strictly greater than this
    pub reset_frames: u32,
}

impl PunishRules {
    /// Conversion rules with the default reset window.
    #[must_use]
    pub const fn conversion() -> Self {
        Self {
            kind: PunishKind::Conversion,
            reset_frames: DEFAULT_RESET_FRAMES,
        }
    }

    /// Combo rules with the default reset window.
    #[must_use]
    pub const fn combo() -> Self {
        Self {
            kind: PunishKind::Combo,
            reset_frames: DEFAULT_RESET_FRAMES,
        }
    }

    /// Overrides the reset window.
    #[must_use]
    pub const fn with_reset_frames(mut self, reset_frames: u32) -> Self {
        self.reset_frames = reset_frames;
        self
    }
}

/// What a single tick did to a pair's cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// A record opened this tick
    pub opened: bool,
    /// A new move was appended to a record that was already open
    pub new_move: bool,
    /// The record that closed this tick
    pub closed: Option<ConversionRecord>,
}

impl StepOutcome {
    /// Whether the tick changed anything worth publishing.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        !self.opened && !self.new_move && self.closed.is_none()
    }
}

/// Advances `state` by one tick for `pair`.
///
/// Returns a quiet outcome when either participant is missing from the
/// frame pair; the input boundary is expected to filter those out.
pub fn step<C: ActionStateClassifier + ?Sized>(
    state: &mut PlayerConversionState,
    rules: PunishRules,
    classifier: &C,
    pair: ParticipantPair,
    frames: &FramePair,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    let (Some((prev_subject, subject)), Some((prev_opponent, opponent))) =
        (frames.player(pair.subject), frames.player(pair.opponent))
    else {
        return outcome;
    };
    let current_frame = frames.current.frame;

    // A new action state, or the same one restarted, is a new attack instance.
    let action_changed = state.last_hit_action_state != Some(subject.action_state);
    let counter_restarted = matches!(
        (subject.action_state_counter, prev_subject.action_state_counter),
        (Some(now), Some(before)) if now < before
    );
    if action_changed || counter_restarted {
        state.last_hit_action_state = None;
    }

    let stunned =
        classifier.is_damaged(opponent.action_state) || classifier.is_grabbed(opponent.action_state);

    if stunned {
        if state.open.is_none() {
            state.open = Some(ConversionRecord::open(
                pair,
                rules.kind,
                current_frame,
                prev_opponent.percent.resolved(),
                opponent.percent.resolved(),
            ));
            state.current_move = None;
            outcome.opened = true;
            trace!(%pair, kind = %rules.kind, frame = current_frame, "record opened");
        }

        let damage = classifier.damage_taken(prev_opponent, opponent);
        if damage > 0.0 {
            if let Some(record) = state.open.as_mut() {
                if state.last_hit_action_state.is_none() {
                    record.moves.push(MoveEvent {
                        frame: current_frame,
                        move_id: subject.last_attack_landed,
                        hit_count: 0,
                        damage: 0.0,
                    });
                    state.current_move = Some(record.moves.len() - 1);
                    outcome.new_move = !outcome.opened;
                }

                if let Some(current) = state.current_move.and_then(|i| record.moves.get_mut(i)) {
                    current.hit_count += 1;
                    current.damage += damage;
                }
            }

            // On a trade the state that connected is the one from the prior tick.
            state.last_hit_action_state = Some(prev_subject.action_state);
        }
    }

    let Some(record) = state.open.as_mut() else {
        return outcome;
    };

    let lost_stock = classifier.lost_stock(prev_opponent, opponent);
    if !lost_stock {
        record.current_percent = opponent.percent.resolved();
    }

    match rules.kind {
        PunishKind::Conversion => {
            if stunned {
                state.reset_counter = 0;
            } else if (classifier.is_in_control(opponent.action_state) && state.reset_counter == 0)
                || state.reset_counter > 0
            {
                state.reset_counter += 1;
            }
        }
        PunishKind::Combo => {
            let still_in_sequence = stunned
                || classifier.is_teching(opponent.action_state)
                || classifier.is_down(opponent.action_state)
                || classifier.is_dying(opponent.action_state);
            if still_in_sequence {
                state.reset_counter = 0;
            } else {
                state.reset_counter += 1;
            }
        }
    }

    if lost_stock || state.reset_counter > rules.reset_frames {
        if let Some(mut closed) = std::mem::take(state).open {
            closed.did_kill = lost_stock;
            closed.close(current_frame, prev_opponent.percent.resolved());
            trace!(
                %pair,
                kind = %rules.kind,
                frame = current_frame,
                did_kill = lost_stock,
                moves = closed.moves.len(),
                "record closed"
            );
            outcome.closed = Some(closed);
        }
    }

    outcome
}
