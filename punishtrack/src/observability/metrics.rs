//! Metrics collection for `punishtrack`.
//!
//! Prometheus-compatible counters for frame throughput, roster resets,
//! and event publication. All label values come from closed enums, so
//! label cardinality is bounded.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::PunishTrackError;
use crate::model::PunishKind;
use crate::tracker::EventKind;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `PunishTrackError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), PunishTrackError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| PunishTrackError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "punishtrack_frames_processed_total",
        "Frame pairs folded into the tracker"
    );
    describe_counter!(
        "punishtrack_roster_resets_total",
        "Roster announcements, tracked or ignored"
    );
    describe_counter!(
        "punishtrack_records_closed_total",
        "Conversion and combo records closed"
    );
    describe_counter!(
        "punishtrack_events_published_total",
        "Raw events published to subscribers"
    );
    describe_counter!(
        "punishtrack_emissions_total",
        "Tagged emissions delivered by subscriptions"
    );
}

/// Records one processed frame pair.
pub fn record_frame() {
    counter!("punishtrack_frames_processed_total").increment(1);
}

/// Records a roster announcement.
pub fn record_roster_reset(tracked: bool) {
    counter!(
        "punishtrack_roster_resets_total",
        "tracked" => if tracked { "true" } else { "false" }
    )
    .increment(1);
}

/// Records a closed record.
pub fn record_closed(kind: PunishKind, did_kill: bool) {
    counter!(
        "punishtrack_records_closed_total",
        "kind" => kind.as_str(),
        "did_kill" => if did_kill { "true" } else { "false" }
    )
    .increment(1);
}

/// Records a raw event publication.
pub fn record_published(kind: EventKind) {
    counter!("punishtrack_events_published_total", "kind" => kind.as_str()).increment(1);
}

/// Records a tagged emission.
pub fn record_emission(kind: EventKind) {
    counter!("punishtrack_emissions_total", "kind" => kind.as_str()).increment(1);
}
