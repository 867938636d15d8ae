//! `run` command
//!
//! Loads the subscription file, wires the tracker's output channel into
//! the composer, and streams matching events to the output while the
//! tracker consumes the frame input. The channel is bounded, so a slow
//! output slows the tracker rather than dropping events.

use std::path::Path;

use tokio::io::{AsyncBufRead, BufReader};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::config::ConfigLoader;
use crate::error::PunishTrackError;
use crate::filter::EventComposer;
use crate::punish::PunishRules;
use crate::sink::JsonlSink;
use crate::source::read_jsonl;
use crate::tracker::{PunishTracker, TrackerConfig};

/// Track punishes in a frame stream and emit matching events.
///
/// # Errors
///
/// Returns a config error if the subscription file does not load, an input
/// error on the first malformed or out-of-order line, or an I/O error if the
/// input cannot be opened or the output cannot be written.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), PunishTrackError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    tracing::info!(config = %args.config.display(), "loading subscriptions");
    let load_result = ConfigLoader::with_defaults().load(&args.config)?;
    for warning in &load_result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    let composer = EventComposer::compile(&load_result.config)?;

    let tracker = PunishTracker::new(tracker_config(args));
    let (tx, rx) = tracker.channel();
    let mut emissions = composer.attach(rx);

    let sink = match &args.output {
        Some(path) => JsonlSink::from_file(path)?,
        None => JsonlSink::stdout(),
    };

    // A failed write stops the tracker too.
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = emissions.next().await {
            if let Err(e) = sink.write(&event) {
                writer_cancel.cancel();
                return Err(e);
            }
        }
        Ok(sink.written())
    });

    let input = open_input(&args.input).await?;
    let outcome = tracker.run(read_jsonl(input), tx, cancel).await;

    let written = writer
        .await
        .map_err(|e| std::io::Error::other(format!("output task failed: {e}")))??;
    let summary = outcome?;

    tracing::info!(
        frames = summary.frames,
        events = summary.events_published,
        emitted = written,
        "run complete"
    );
    Ok(())
}

fn tracker_config(args: &RunArgs) -> TrackerConfig {
    TrackerConfig {
        conversion: PunishRules::conversion().with_reset_frames(args.conversion_reset_frames),
        combo: (!args.no_combos)
            .then(|| PunishRules::combo().with_reset_frames(args.combo_reset_frames)),
        classify_openings: !args.no_opening_classification,
        channel_capacity: args.channel_capacity,
    }
}

async fn open_input(path: &Path) -> std::io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path.as_os_str() == "-" {
        tracing::info!("reading frames from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    tracing::info!(input = %path.display(), "reading frames");
    let file = tokio::fs::File::open(path).await?;
    Ok(Box::new(BufReader::new(file)))
}
