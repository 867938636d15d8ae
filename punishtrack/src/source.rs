//! JSONL frame input
//!
//! Each line is one record:
//!
//! ```text
//! {"type":"contest_start","stage_id":31,"players":[{"index":0},{"index":1}]}
//! {"type":"frame","frame":1,"players":{"0":{"action_state":14,"percent":0.0},"1":{...}}}
//! ```
//!
//! [`FramePairer`] turns the records into [`TrackerInput`]s. Frames only
//! pair up when both carry the roster's participant count; an incomplete
//! frame breaks the chain so the next pair starts after it.

use serde::{Deserialize, Serialize};
use tokio::io::AsyncBufRead;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::error::InputError;
use crate::model::{ContestSettings, FramePair, FrameSnapshot};
use crate::tracker::TrackerInput;

/// One decoded input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputRecord {
    /// A roster announcement
    ContestStart(ContestSettings),
    /// One tick of state
    Frame(FrameSnapshot),
}

/// Decodes one line. Blank lines decode to `None`.
///
/// # Errors
///
/// Returns [`InputError::Malformed`] when the line is not a valid record.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<InputRecord>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let malformed = |e: serde_json::Error| InputError::Malformed {
        line: line_number,
        message: e.to_string(),
    };

    // Decoded in two passes: integer player keys don't survive serde's
    // internally tagged enum buffering.
    let envelope: Envelope = serde_json::from_str(line).map_err(malformed)?;
    let record = match envelope.kind {
        RecordType::ContestStart => {
            InputRecord::ContestStart(serde_json::from_str(line).map_err(malformed)?)
        }
        RecordType::Frame => InputRecord::Frame(serde_json::from_str(line).map_err(malformed)?),
    };
    Ok(Some(record))
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: RecordType,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordType {
    ContestStart,
    Frame,
}

/// Pairs consecutive complete frames.
#[derive(Debug, Default)]
pub struct FramePairer {
    expected_players: Option<usize>,
    previous: Option<FrameSnapshot>,
    last_frame: Option<i32>,
}

impl FramePairer {
    /// Creates a pairer waiting for its first roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one record.
    ///
    /// Frames seen before any roster are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::OutOfOrder`] when a frame index does not
    /// strictly increase within a contest.
    pub fn push(
        &mut self,
        line_number: usize,
        record: InputRecord,
    ) -> Result<Option<TrackerInput>, InputError> {
        match record {
            InputRecord::ContestStart(settings) => {
                self.expected_players = Some(settings.players.len());
                self.previous = None;
                self.last_frame = None;
                Ok(Some(TrackerInput::Roster(settings)))
            }
            InputRecord::Frame(snapshot) => self.push_frame(line_number, snapshot),
        }
    }

    fn push_frame(
        &mut self,
        line_number: usize,
        snapshot: FrameSnapshot,
    ) -> Result<Option<TrackerInput>, InputError> {
        if let Some(previous) = self.last_frame {
            if snapshot.frame <= previous {
                return Err(InputError::OutOfOrder {
                    line: line_number,
                    previous,
                    frame: snapshot.frame,
                });
            }
        }
        self.last_frame = Some(snapshot.frame);

        let Some(expected) = self.expected_players else {
            trace!(frame = snapshot.frame, "frame before roster skipped");
            return Ok(None);
        };
        if snapshot.players.len() != expected {
            debug!(
                frame = snapshot.frame,
                players = snapshot.players.len(),
                expected,
                "incomplete frame skipped"
            );
            self.previous = None;
            return Ok(None);
        }

        let current = snapshot.clone();
        Ok(self
            .previous
            .replace(snapshot)
            .map(|previous| TrackerInput::Frames(FramePair::new(previous, current))))
    }
}

/// Streams tracker input from JSONL text.
///
/// The stream yields the first error it hits and may be dropped there.
pub fn read_jsonl<R>(reader: R) -> impl Stream<Item = Result<TrackerInput, InputError>> + Unpin
where
    R: AsyncBufRead + Unpin,
{
    let mut pairer = FramePairer::new();
    let mut line_number = 0usize;
    LinesStream::new(tokio::io::AsyncBufReadExt::lines(reader)).filter_map(move |line| {
        line_number += 1;
        let result = line
            .map_err(InputError::from)
            .and_then(|line| parse_line(line_number, &line))
            .and_then(|record| match record {
                Some(record) => pairer.push(line_number, record),
                None => Ok(None),
            });
        result.transpose()
    })
}
