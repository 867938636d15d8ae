//! Punish tracker
//!
//! The `PunishTracker` owns the per-pair registry, drives the punish state
//! machine once per tracked pair for every frame pair, and hands the
//! resulting events downstream in registry order. [`PunishTracker::run`]
//! forwards them over a bounded channel and waits for room, so a slow
//! consumer slows the tracker down instead of losing events.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::classify::{ActionStateClassifier, MeleeStates};
use crate::error::InputError;
use crate::model::{ContestSettings, ConversionRecord, FramePair, ParticipantPair, PunishKind};
use crate::observability::metrics;
use crate::punish::{PlayerConversionState, PunishRules, StepOutcome, classify_opening, step};

use super::events::{EventKind, RawEvent};

/// Only two-participant contests are tracked.
pub const TRACKED_PARTICIPANTS: usize = 2;

/// Default output buffer, in events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Registry key: one directional pair under one set of punish rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackedPair {
    /// Directional pairing
    pub pair: ParticipantPair,
    /// Punish rules applied
    pub kind: PunishKind,
}

impl TrackedPair {
    /// Creates a key.
    #[must_use]
    pub const fn new(pair: ParticipantPair, kind: PunishKind) -> Self {
        Self { pair, kind }
    }

    /// The mirrored pair under the same rules.
    #[must_use]
    pub const fn mirror(self) -> Self {
        Self {
            pair: self.pair.mirror(),
            kind: self.kind,
        }
    }
}

/// Tracker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Conversion rules
    pub conversion: PunishRules,
    /// Combo rules; `None` disables combo tracking
    pub combo: Option<PunishRules>,
    /// Resolve opening types for new records
    pub classify_openings: bool,
    /// Output buffer size, in events
    pub channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            conversion: PunishRules::conversion(),
            combo: Some(PunishRules::combo()),
            classify_openings: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl TrackerConfig {
    fn enabled_rules(&self) -> impl Iterator<Item = PunishRules> + '_ {
        std::iter::once(self.conversion).chain(self.combo)
    }

    const fn rules_for(&self, kind: PunishKind) -> PunishRules {
        match (kind, self.combo) {
            (PunishKind::Combo, Some(combo)) => combo,
            _ => self.conversion,
        }
    }
}

/// One item from the frame pair source.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerInput {
    /// A roster was (re)established
    Roster(ContestSettings),
    /// The next consecutive frame pair
    Frames(FramePair),
}

/// Counters reported when [`PunishTracker::run`] finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Roster announcements seen
    pub rosters: u64,
    /// Frame pairs processed
    pub frames: u64,
    /// Raw events published
    pub events_published: u64,
    /// Whether the run stopped early because the receiver went away
    pub receiver_closed: bool,
}

/// Drives punish detection for one contest stream.
///
/// All registry mutation goes through `&mut self`, so a tick is fully
/// processed before the next one starts and roster resets cannot
/// interleave with frame processing.
pub struct PunishTracker<C = MeleeStates> {
    classifier: C,
    config: TrackerConfig,
    registry: IndexMap<TrackedPair, PlayerConversionState>,
    contest: Option<Arc<ContestSettings>>,
}

impl PunishTracker<MeleeStates> {
    /// Creates a tracker using the Melee classifier.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_classifier(MeleeStates, config)
    }
}

impl<C: ActionStateClassifier> PunishTracker<C> {
    /// Creates a tracker with a custom classifier.
    #[must_use]
    pub fn with_classifier(classifier: C, config: TrackerConfig) -> Self {
        Self {
            classifier,
            config,
            registry: IndexMap::new(),
            contest: None,
        }
    }

    /// A bounded channel sized for this tracker's [`run`](Self::run).
    #[must_use]
    pub fn channel(&self) -> (mpsc::Sender<RawEvent>, mpsc::Receiver<RawEvent>) {
        mpsc::channel(self.config.channel_capacity.max(1))
    }

    /// The active roster, if a two-participant contest is being tracked.
    #[must_use]
    pub fn contest(&self) -> Option<&ContestSettings> {
        self.contest.as_deref()
    }

    /// Registry keys in processing order.
    pub fn tracked_pairs(&self) -> impl Iterator<Item = TrackedPair> + '_ {
        self.registry.keys().copied()
    }

    /// The cursor for one tracked pair.
    #[must_use]
    pub fn state(&self, key: TrackedPair) -> Option<&PlayerConversionState> {
        self.registry.get(&key)
    }

    /// Replaces the registry for a newly announced roster.
    ///
    /// Contests with other than two participants clear the registry and
    /// are otherwise ignored.
    pub fn establish_roster(&mut self, settings: ContestSettings) {
        let tracked = settings.players.len() == TRACKED_PARTICIPANTS;
        metrics::record_roster_reset(tracked);

        if !tracked {
            debug!(
                players = settings.players.len(),
                "roster ignored: only two-participant contests are tracked"
            );
            self.registry.clear();
            self.contest = None;
            return;
        }

        let registry: IndexMap<_, _> = settings
            .ordered_pairs()
            .into_iter()
            .flat_map(|pair| {
                self.config
                    .enabled_rules()
                    .map(move |rules| (TrackedPair::new(pair, rules.kind), PlayerConversionState::new()))
            })
            .collect();

        info!(
            players = ?settings.players.iter().map(|p| p.index).collect::<Vec<_>>(),
            tracked_pairs = registry.len(),
            "roster established"
        );
        self.registry = registry;
        self.contest = Some(Arc::new(settings));
    }

    /// Advances every tracked pair by one tick.
    ///
    /// Returns the tick's events in registry order; for one pair a start
    /// precedes an extend, which precedes a close.
    pub fn process(&mut self, frames: &FramePair) -> Vec<RawEvent> {
        let Some(contest) = self.contest.clone() else {
            return Vec::new();
        };
        metrics::record_frame();

        let config = &self.config;
        let classifier = &self.classifier;
        let mut results: Vec<(TrackedPair, StepOutcome)> = self
            .registry
            .iter_mut()
            .map(|(key, state)| {
                let rules = config.rules_for(key.kind);
                (*key, step(state, rules, classifier, key.pair, frames))
            })
            .collect();

        if self.config.classify_openings {
            self.resolve_openings(&mut results);
        }

        let frame = frames.current.frame;
        let mut published = Vec::new();
        for (key, outcome) in results {
            if outcome.is_quiet() {
                continue;
            }
            let snapshot = || self.snapshot(key, outcome.closed.as_ref());

            if outcome.opened {
                if let Some(record) = snapshot() {
                    published.push(publish(EventKind::start(key.kind), frame, record, &contest));
                }
            }
            if outcome.new_move {
                if let Some(record) = snapshot() {
                    published.push(publish(EventKind::extend(key.kind), frame, record, &contest));
                }
            }
            if let Some(closed) = outcome.closed {
                metrics::record_closed(key.kind, closed.did_kill);
                debug!(
                    pair = %key.pair,
                    kind = %key.kind,
                    start_frame = closed.start_frame,
                    end_frame = ?closed.end_frame,
                    moves = closed.moves.len(),
                    did_kill = closed.did_kill,
                    "record closed"
                );
                published.push(publish(
                    EventKind::closed(key.kind),
                    frame,
                    Arc::new(closed),
                    &contest,
                ));
            }
        }
        published
    }

    /// Consumes an input stream until it ends, fails, is cancelled, or
    /// `tx`'s receiver is dropped.
    ///
    /// Every event is sent on `tx` in order, waiting for buffer space, so
    /// none is dropped however slowly the receiver drains. `tx` is dropped
    /// on return, which ends the receiving stream.
    ///
    /// # Errors
    ///
    /// Returns the first input error; nothing after it is processed.
    pub async fn run<S>(
        mut self,
        mut input: S,
        tx: mpsc::Sender<RawEvent>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, InputError>
    where
        S: Stream<Item = Result<TrackerInput, InputError>> + Unpin,
    {
        let mut summary = RunSummary::default();
        'input: loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("tracker cancelled");
                    break;
                }
                next = input.next() => next,
            };
            let Some(item) = next else {
                break;
            };

            match item? {
                TrackerInput::Roster(settings) => {
                    self.establish_roster(settings);
                    summary.rosters += 1;
                }
                TrackerInput::Frames(frames) => {
                    summary.frames += 1;
                    for event in self.process(&frames) {
                        let sent = tokio::select! {
                            biased;
                            () = cancel.cancelled() => {
                                info!("tracker cancelled while output was full");
                                break 'input;
                            }
                            sent = tx.send(event) => sent,
                        };
                        if sent.is_err() {
                            info!("event receiver closed; stopping tracker");
                            summary.receiver_closed = true;
                            break 'input;
                        }
                        summary.events_published += 1;
                    }
                }
            }
        }

        info!(
            rosters = summary.rosters,
            frames = summary.frames,
            events = summary.events_published,
            "tracker finished"
        );
        Ok(summary)
    }

    fn resolve_openings(&mut self, results: &mut [(TrackedPair, StepOutcome)]) {
        let opened: Vec<TrackedPair> = results
            .iter()
            .filter(|(_, outcome)| outcome.opened)
            .map(|(key, _)| *key)
            .collect();
        if opened.is_empty() {
            return;
        }
        let closed: Vec<TrackedPair> = results
            .iter()
            .filter(|(_, outcome)| outcome.closed.is_some())
            .map(|(key, _)| *key)
            .collect();

        for (key, outcome) in results.iter_mut().filter(|(_, outcome)| outcome.opened) {
            let mirror = key.mirror();
            let mirror_opened = opened.contains(&mirror);
            let mirror_active = closed.contains(&mirror)
                || self.registry.get(&mirror).is_some_and(|s| !s.is_idle());
            let opening = classify_opening(mirror_opened, mirror_active);
            trace!(pair = %key.pair, kind = %key.kind, ?opening, "opening classified");

            let record = match outcome.closed.as_mut() {
                Some(record) => Some(record),
                None => self.registry.get_mut(key).and_then(|s| s.open.as_mut()),
            };
            if let Some(record) = record {
                record.opening_type = opening;
            }
        }
    }

    fn snapshot(&self, key: TrackedPair, closed: Option<&ConversionRecord>) -> Option<Arc<ConversionRecord>> {
        closed
            .or_else(|| self.registry.get(&key).and_then(PlayerConversionState::open_record))
            .map(|record| Arc::new(record.clone()))
    }

}

fn publish(
    kind: EventKind,
    frame: i32,
    record: Arc<ConversionRecord>,
    contest: &Arc<ContestSettings>,
) -> RawEvent {
    metrics::record_published(kind);
    RawEvent {
        kind,
        frame,
        record,
        contest: Arc::clone(contest),
    }
}

impl<C> std::fmt::Debug for PunishTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PunishTracker")
            .field("config", &self.config)
            .field("tracked_pairs", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{FrameSnapshot, OpeningType, Participant, Percent, PlayerFrame};

    const STANDING: u16 = 0x0E;
    const HITSTUN: u16 = 0x4B;
    const JAB: u16 = 0x2C;

    fn roster(indices: &[usize]) -> ContestSettings {
        ContestSettings {
            stage_id: Some(31),
            players: indices
                .iter()
                .map(|&index| Participant {
                    index,
                    character_id: Some(2),
                    name_tag: None,
                    is_cpu: false,
                })
                .collect(),
        }
    }

    fn player(action_state: u16, percent: f32) -> PlayerFrame {
        PlayerFrame {
            action_state,
            action_state_counter: Some(1.0),
            percent: Percent::new(percent),
            stocks_remaining: Some(4),
            last_attack_landed: Some(2),
        }
    }

    fn snapshot(frame: i32, p0: PlayerFrame, p1: PlayerFrame) -> FrameSnapshot {
        FrameSnapshot {
            frame,
            players: BTreeMap::from([(0, p0), (1, p1)]),
        }
    }

    fn conversions_only() -> TrackerConfig {
        TrackerConfig {
            combo: None,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn roster_registers_pair_and_mirror_per_kind() {
        let mut tracker = PunishTracker::new(TrackerConfig::default());
        tracker.establish_roster(roster(&[0, 1]));
        let keys: Vec<_> = tracker.tracked_pairs().collect();
        assert_eq!(
            keys,
            vec![
                TrackedPair::new(ParticipantPair::new(0, 1), PunishKind::Conversion),
                TrackedPair::new(ParticipantPair::new(0, 1), PunishKind::Combo),
                TrackedPair::new(ParticipantPair::new(1, 0), PunishKind::Conversion),
                TrackedPair::new(ParticipantPair::new(1, 0), PunishKind::Combo),
            ]
        );
    }

    #[test]
    fn non_two_player_roster_is_ignored() {
        let mut tracker = PunishTracker::new(TrackerConfig::default());
        tracker.establish_roster(roster(&[0, 1]));
        tracker.establish_roster(roster(&[0, 1, 2]));
        assert_eq!(tracker.tracked_pairs().count(), 0);
        assert!(tracker.contest().is_none());

        let frames = FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 9.0)),
        );
        assert!(tracker.process(&frames).is_empty());
    }

    #[test]
    fn roster_reset_discards_open_records() {
        let mut tracker = PunishTracker::new(conversions_only());
        tracker.establish_roster(roster(&[0, 1]));
        tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 9.0)),
        ));
        let key = TrackedPair::new(ParticipantPair::new(0, 1), PunishKind::Conversion);
        assert!(!tracker.state(key).unwrap().is_idle());

        tracker.establish_roster(roster(&[0, 1]));
        assert!(tracker.state(key).unwrap().is_idle());
    }

    #[test]
    fn publishes_start_with_opening_type() {
        let mut tracker = PunishTracker::new(conversions_only());
        tracker.establish_roster(roster(&[0, 1]));

        let published = tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 9.0)),
        ));
        assert_eq!(published.len(), 1);

        let event = &published[0];
        assert_eq!(event.kind, EventKind::ConversionStart);
        assert_eq!(event.frame, 2);
        assert_eq!(event.record.subject_index, 0);
        assert_eq!(event.record.opening_type, OpeningType::NeutralWin);
        assert_eq!(event.contest.stage_id, Some(31));
    }

    #[test]
    fn simultaneous_openings_are_trades() {
        let mut tracker = PunishTracker::new(conversions_only());
        tracker.establish_roster(roster(&[0, 1]));

        let published = tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(JAB, 0.0)),
            snapshot(2, player(HITSTUN, 5.0), player(HITSTUN, 5.0)),
        ));

        let [first, second] = published.as_slice() else {
            panic!("expected two starts, got {published:?}");
        };
        assert_eq!(first.record.subject_index, 0);
        assert_eq!(second.record.subject_index, 1);
        assert_eq!(first.record.opening_type, OpeningType::Trade);
        assert_eq!(second.record.opening_type, OpeningType::Trade);
    }

    #[test]
    fn opening_during_opponent_punish_is_counter_attack() {
        let mut tracker = PunishTracker::new(conversions_only());
        tracker.establish_roster(roster(&[0, 1]));

        // Player 0 opens on player 1
        tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 5.0)),
        ));
        // Player 1 hits back while player 0's conversion is still open
        let published = tracker.process(&FramePair::new(
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 5.0)),
            snapshot(3, player(HITSTUN, 7.0), player(JAB, 5.0)),
        ));

        let counter = published
            .iter()
            .find(|e| e.record.subject_index == 1)
            .unwrap();
        assert_eq!(counter.kind, EventKind::ConversionStart);
        assert_eq!(counter.record.subject_index, 1);
        assert_eq!(counter.record.opening_type, OpeningType::CounterAttack);
    }

    #[test]
    fn opening_as_mirror_record_closes_is_counter_attack() {
        let mut tracker = PunishTracker::new(TrackerConfig {
            conversion: PunishRules::conversion().with_reset_frames(0),
            ..conversions_only()
        });
        tracker.establish_roster(roster(&[0, 1]));

        tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 5.0)),
        ));
        // Player 1 regains control, closing player 0's record, and hits back
        let published = tracker.process(&FramePair::new(
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 5.0)),
            snapshot(3, player(HITSTUN, 4.0), player(STANDING, 5.0)),
        ));

        let kinds: Vec<_> = published
            .iter()
            .map(|e| (e.kind, e.record.subject_index))
            .collect();
        assert_eq!(
            kinds,
            vec![(EventKind::ConversionClosed, 0), (EventKind::ConversionStart, 1)]
        );
        assert_eq!(published[1].record.opening_type, OpeningType::CounterAttack);
    }

    #[test]
    fn disabled_classification_leaves_unknown() {
        let mut tracker = PunishTracker::new(TrackerConfig {
            classify_openings: false,
            ..conversions_only()
        });
        tracker.establish_roster(roster(&[0, 1]));
        let published = tracker.process(&FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 9.0)),
        ));
        assert_eq!(published[0].record.opening_type, OpeningType::Unknown);
    }

    #[test]
    fn process_without_roster_publishes_nothing() {
        let mut tracker = PunishTracker::new(TrackerConfig::default());
        let frames = FramePair::new(
            snapshot(1, player(JAB, 0.0), player(STANDING, 0.0)),
            snapshot(2, player(JAB, 0.0), player(HITSTUN, 9.0)),
        );
        assert!(tracker.process(&frames).is_empty());
    }

    #[tokio::test]
    async fn run_closes_channel_when_input_ends() {
        let tracker = PunishTracker::new(TrackerConfig::default());
        let (tx, mut rx) = tracker.channel();
        let input = tokio_stream::iter(vec![Ok(TrackerInput::Roster(roster(&[0, 1])))]);

        let summary = tracker.run(input, tx, CancellationToken::new()).await.unwrap();
        assert_eq!(summary.rosters, 1);
        assert!(rx.recv().await.is_none());
    }

    fn separate_punishes(count: i32) -> Vec<Result<TrackerInput, InputError>> {
        // Each punish is one hit followed by a stock loss, so it opens and
        // closes within two ticks.
        let mut inputs = vec![Ok(TrackerInput::Roster(roster(&[0, 1])))];
        let mut previous = snapshot(0, player(STANDING, 0.0), player(STANDING, 0.0));
        for i in 0..count {
            let base = i * 3;
            let hit = snapshot(base + 1, player(JAB, 0.0), player(HITSTUN, 10.0));
            let mut dead = snapshot(base + 2, player(STANDING, 0.0), player(STANDING, 0.0));
            if let Some(p) = dead.players.get_mut(&1) {
                p.stocks_remaining = Some(3);
            }
            let reset = snapshot(base + 3, player(STANDING, 0.0), player(STANDING, 0.0));
            for current in [hit, dead, reset] {
                inputs.push(Ok(TrackerInput::Frames(FramePair::new(previous, current.clone()))));
                previous = current;
            }
        }
        inputs
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_receiver_loses_nothing() {
        let tracker = PunishTracker::new(TrackerConfig {
            channel_capacity: 4,
            ..conversions_only()
        });
        let (tx, mut rx) = tracker.channel();
        let run = tokio::spawn(tracker.run(
            tokio_stream::iter(separate_punishes(200)),
            tx,
            CancellationToken::new(),
        ));

        let mut closed = 0;
        while let Some(event) = rx.recv().await {
            if event.kind == EventKind::ConversionClosed {
                closed += 1;
            }
            tokio::time::sleep(std::time::Duration::from_micros(200)).await;
        }

        let summary = run.await.unwrap().unwrap();
        assert_eq!(closed, 200);
        assert_eq!(summary.events_published, 400);
        assert!(!summary.receiver_closed);
    }

    #[tokio::test]
    async fn dropped_receiver_stops_run() {
        let tracker = PunishTracker::new(conversions_only());
        let (tx, rx) = tracker.channel();
        drop(rx);
        let summary = tracker
            .run(tokio_stream::iter(separate_punishes(3)), tx, CancellationToken::new())
            .await
            .unwrap();
        assert!(summary.receiver_closed);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.events_published, 0);
    }

    #[tokio::test]
    async fn run_stops_on_first_input_error() {
        let tracker = PunishTracker::new(TrackerConfig::default());
        let input = tokio_stream::iter(vec![
            Ok(TrackerInput::Roster(roster(&[0, 1]))),
            Err(InputError::Malformed {
                line: 2,
                message: "bad".to_string(),
            }),
        ]);
        let (tx, _rx) = tracker.channel();
        let err = tracker.run(input, tx, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, InputError::Malformed { line: 2, .. }));
    }

    #[tokio::test]
    async fn run_honours_cancellation() {
        let tracker = PunishTracker::new(TrackerConfig::default());
        let (tx, _rx) = tracker.channel();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = tracker
            .run(tokio_stream::pending::<Result<TrackerInput, InputError>>(), tx, cancel)
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
