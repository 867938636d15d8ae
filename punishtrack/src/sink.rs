//! JSONL output for tagged emissions.
//!
//! Every line is one [`TaggedEvent`] wrapped in an envelope carrying a
//! monotonically increasing sequence number and the wall-clock time it was
//! written.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filter::TaggedEvent;

/// Wraps a [`TaggedEvent`] with ordering metadata.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// When the line was written.
    emitted_at: DateTime<Utc>,
    /// The wrapped emission (flattened into the same JSON object).
    #[serde(flatten)]
    event: &'a TaggedEvent,
}

/// Thread-safe, buffered JSONL writer.
///
/// Each [`write`](Self::write) takes the next sequence number, serializes
/// one line, and flushes.
pub struct JsonlSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Creates a sink over any writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a sink that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates a sink that writes to a file at `path`, truncating it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes one emission as a single line.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if serialization or the write fails.
    pub fn write(&self, event: &TaggedEvent) -> std::io::Result<()> {
        let envelope = Envelope {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            emitted_at: Utc::now(),
            event,
        };
        let line = serde_json::to_string(&envelope)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("sink writer lock poisoned"))?;
        writeln!(writer, "{line}")?;
        writer.flush()
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}
