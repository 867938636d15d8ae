//! Shared integration-test helpers: scripted frame sequences and a handle
//! on the `punishtrack` binary.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Output;

use punishtrack::error::InputError;
use punishtrack::model::{
    ContestSettings, FramePair, FrameSnapshot, Participant, Percent, PlayerFrame,
};
use punishtrack::source::InputRecord;
use punishtrack::tracker::TrackerInput;

pub const STANDING: u16 = 0x0E;
pub const AIRBORNE: u16 = 0x19;
pub const HITSTUN: u16 = 0x4B;
pub const JAB: u16 = 0x2C;
pub const GRABBED: u16 = 0xDF;
pub const DEAD: u16 = 0x01;

/// Two human participants at indices 0 and 1.
pub fn roster() -> ContestSettings {
    ContestSettings {
        stage_id: Some(31),
        players: (0..2)
            .map(|index| Participant {
                index,
                character_id: Some(if index == 0 { 2 } else { 9 }),
                name_tag: None,
                is_cpu: false,
            })
            .collect(),
    }
}

/// One participant's state.
pub fn player(action_state: u16, percent: f32, stocks: u8) -> PlayerFrame {
    PlayerFrame {
        action_state,
        action_state_counter: Some(1.0),
        percent: Percent::new(percent),
        stocks_remaining: Some(stocks),
        last_attack_landed: Some(2),
    }
}

/// A scripted two-participant frame sequence starting at frame 1.
#[derive(Debug, Default, Clone)]
pub struct Script {
    frames: Vec<FrameSnapshot>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tick with participant 0 and participant 1 state.
    pub fn tick(mut self, p0: PlayerFrame, p1: PlayerFrame) -> Self {
        let frame = i32::try_from(self.frames.len()).expect("script too long") + 1;
        self.frames.push(FrameSnapshot {
            frame,
            players: BTreeMap::from([(0, p0), (1, p1)]),
        });
        self
    }

    /// Appends `count` identical ticks.
    pub fn repeat(mut self, count: usize, p0: &PlayerFrame, p1: &PlayerFrame) -> Self {
        for _ in 0..count {
            self = self.tick(p0.clone(), p1.clone());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Consecutive frame pairs.
    pub fn pairs(&self) -> Vec<FramePair> {
        self.frames
            .windows(2)
            .map(|w| FramePair::new(w[0].clone(), w[1].clone()))
            .collect()
    }

    /// Roster followed by every pair, as tracker input.
    pub fn inputs(&self) -> Vec<Result<TrackerInput, InputError>> {
        std::iter::once(TrackerInput::Roster(roster()))
            .chain(self.pairs().into_iter().map(TrackerInput::Frames))
            .map(Ok)
            .collect()
    }

    /// Roster followed by every frame, as JSONL text.
    pub fn to_jsonl(&self) -> String {
        std::iter::once(InputRecord::ContestStart(roster()))
            .chain(self.frames.iter().cloned().map(InputRecord::Frame))
            .map(|record| serde_json::to_string(&record).expect("serializable record"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One 5% hit on frame 4, hitstun through frame 6, then `extra_ticks` of the
/// opponent standing in control. 46 extra ticks closes the punish on frame 52.
pub fn single_hit_then_neutral(extra_ticks: usize) -> Script {
    let idle = player(STANDING, 0.0, 4);
    Script::new()
        .repeat(2, &idle, &idle)
        .tick(player(JAB, 0.0, 4), player(STANDING, 0.0, 4))
        .tick(player(JAB, 0.0, 4), player(HITSTUN, 5.0, 4))
        .repeat(2, &player(STANDING, 0.0, 4), &player(HITSTUN, 5.0, 4))
        .repeat(extra_ticks, &idle, &player(STANDING, 5.0, 4))
}

/// Runs the binary with `args` and waits for it.
pub fn run_cli(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_punishtrack"))
        .args(args)
        .env_remove("PUNISHTRACK_LOG_LEVEL")
        .output()
        .expect("failed to spawn punishtrack")
}

/// Writes `contents` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}
