//! Per-tap timing records.
//!
//! Every firing of a wrapped tap opens an [`OpenTiming`] before the original
//! function runs and closes it once the tap settles. Closed timings land in
//! the [`TimingRecorder`] in the order they finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::Clock;

/// Builds the record identifier for a tap on a hook: `"{hook}-{tap}"`.
#[must_use]
pub fn timing_id(hook_name: &str, tap_name: &str) -> String {
    format!("{hook_name}-{tap_name}")
}

/// A finalized measurement of one tap firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    /// `"{hook}-{tap}"`.
    pub id: Arc<str>,
    /// Sequence number of the firing that produced this record.
    pub firing: u64,
    /// Start marker, taken before the tap ran.
    pub start: Instant,
    /// Stop marker, taken when the tap's result was available.
    pub stop: Instant,
}

impl TimingRecord {
    /// Elapsed time between start and stop markers.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.stop.saturating_duration_since(self.start)
    }

    /// Duration in fractional milliseconds.
    #[must_use]
    pub fn millis(&self) -> f64 {
        self.duration().as_secs_f64() * 1000.0
    }
}

/// Append-only store of finalized timings.
///
/// Shared by every wrapped tap of one profiling session. Concurrent firings
/// of the same tap each get their own start marker, so overlapping async
/// taps never clobber one another.
pub struct TimingRecorder {
    clock: Clock,
    next_firing: AtomicU64,
    records: Mutex<Vec<TimingRecord>>,
}

impl TimingRecorder {
    /// Creates an empty store reading markers from `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            next_firing: AtomicU64::new(0),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Places a start marker for a new firing of `id`.
    #[must_use]
    pub fn start(self: &Arc<Self>, id: &Arc<str>) -> OpenTiming {
        let firing = self.next_firing.fetch_add(1, Ordering::Relaxed);
        OpenTiming {
            id: Arc::clone(id),
            firing,
            start: self.clock.now(),
            recorder: Arc::clone(self),
        }
    }

    /// Snapshot of finalized records in finalization order.
    #[must_use]
    pub fn records(&self) -> Vec<TimingRecord> {
        self.records.lock().clone()
    }

    /// Snapshot of the records finalized after the first `offset`.
    ///
    /// Empty if fewer than `offset` records exist.
    #[must_use]
    pub fn records_from(&self, offset: usize) -> Vec<TimingRecord> {
        self.records
            .lock()
            .get(offset..)
            .map(<[TimingRecord]>::to_vec)
            .unwrap_or_default()
    }

    /// Number of finalized records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no record has been finalized yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of firings started so far, finalized or not.
    #[must_use]
    pub fn started(&self) -> u64 {
        self.next_firing.load(Ordering::Relaxed)
    }

    fn finalize(&self, id: Arc<str>, firing: u64, start: Instant) {
        let stop = self.clock.now();
        let record = TimingRecord {
            id,
            firing,
            start,
            stop,
        };

        tracing::debug!(
            target: "tapscope::timing",
            id = %record.id,
            firing,
            duration_ms = record.millis(),
            "tap settled"
        );

        self.records.lock().push(record);
    }
}

impl std::fmt::Debug for TimingRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingRecorder")
            .field("started", &self.started())
            .field("finalized", &self.len())
            .finish_non_exhaustive()
    }
}

/// A firing whose start marker is placed but whose stop marker is not.
///
/// Dropping an `OpenTiming` without calling [`finish`](Self::finish) leaves
/// the firing unreported.
#[must_use = "an open timing records nothing until finished"]
pub struct OpenTiming {
    id: Arc<str>,
    firing: u64,
    start: Instant,
    recorder: Arc<TimingRecorder>,
}

impl OpenTiming {
    /// `"{hook}-{tap}"` of the firing being measured.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Places the stop marker and stores the record.
    pub fn finish(self) {
        let Self {
            id,
            firing,
            start,
            recorder,
        } = self;
        recorder.finalize(id, firing, start);
    }

    /// Converts into a guard that finishes the timing when dropped,
    /// including during unwinding.
    pub fn finish_on_drop(self) -> FinishOnDrop {
        FinishOnDrop(Some(self))
    }
}

/// Finishes the wrapped timing on drop.
pub struct FinishOnDrop(Option<OpenTiming>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        if let Some(timing) = self.0.take() {
            timing.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn recorder_with_step(step_ms: u64) -> Arc<TimingRecorder> {
        let mock = Arc::new(MockClock::stepping(
            Instant::now(),
            Duration::from_millis(step_ms),
        ));
        Arc::new(TimingRecorder::new(Clock::with_provider(mock)))
    }

    #[test]
    fn timing_id_joins_hook_and_tap() {
        assert_eq!(timing_id("emit", "MyPlugin"), "emit-MyPlugin");
    }

    #[test]
    fn finish_stores_record_with_duration() {
        let recorder = recorder_with_step(5);
        let id: Arc<str> = Arc::from("run-A");

        recorder.start(&id).finish();

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(&*records[0].id, "run-A");
        assert_eq!(records[0].duration(), Duration::from_millis(5));
        assert!((records[0].millis() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dropped_open_timing_is_not_recorded() {
        let recorder = recorder_with_step(1);
        let id: Arc<str> = Arc::from("run-A");

        drop(recorder.start(&id));

        assert!(recorder.is_empty());
        assert_eq!(recorder.started(), 1);
    }

    #[test]
    fn records_from_skips_earlier_records() {
        let recorder = recorder_with_step(1);
        for id in ["run-A", "emit-B", "done-C"] {
            recorder.start(&Arc::from(id)).finish();
        }

        let ids: Vec<_> = recorder
            .records_from(1)
            .into_iter()
            .map(|record| record.id.to_string())
            .collect();
        assert_eq!(ids, vec!["emit-B", "done-C"]);
        assert!(recorder.records_from(3).is_empty());
        assert!(recorder.records_from(7).is_empty());
    }

    #[test]
    fn overlapping_firings_keep_their_own_start() {
        let recorder = recorder_with_step(1);
        let id: Arc<str> = Arc::from("make-T");

        let first = recorder.start(&id);
        let second = recorder.start(&id);
        second.finish();
        first.finish();

        let records = recorder.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].firing, 1);
        assert_eq!(records[1].firing, 0);
        assert_eq!(records[0].duration(), Duration::from_millis(1));
        assert_eq!(records[1].duration(), Duration::from_millis(3));
    }

    #[test]
    fn finish_on_drop_records_during_unwind() {
        let recorder = recorder_with_step(1);
        let id: Arc<str> = Arc::from("emit-Boom");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = recorder.start(&id).finish_on_drop();
            panic!("tap exploded");
        }));

        assert!(result.is_err());
        assert_eq!(recorder.len(), 1);
    }
}
