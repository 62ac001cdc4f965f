// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ring::OutcomeRing;

/// Sliding window of the most recent call outcomes.
///
/// Each recorded outcome claims the next slot of the window by advancing an
/// atomic cursor and then writes its bit into a lock-free bit ring. Once the
/// window is full, new outcomes overwrite the oldest slot.
///
/// The failure rate is always computed against the full capacity of the window,
/// so a fresh recorder reports a diluted rate until the window has been filled once.
#[derive(Debug)]
pub struct MetricsRecorder {
    ring: OutcomeRing,
    cursor: AtomicUsize,
}

impl MetricsRecorder {
    /// Creates a recorder whose window holds at least `buffer_size` outcomes.
    ///
    /// The capacity is rounded up to a multiple of 64.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            ring: OutcomeRing::new(buffer_size),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let position = self.claim();
        self.ring.clear(position);
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let position = self.claim();
        self.ring.set(position);
    }

    /// Percentage of failed outcomes within the whole window capacity.
    #[must_use]
    pub fn failure_rate(&self) -> f32 {
        #[expect(clippy::cast_precision_loss, reason = "window sizes are far below f32 precision limits")]
        let rate = 100.0 * self.failed_count() as f32 / self.buffered_count() as f32;
        rate
    }

    /// Number of failed outcomes currently held by the window.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.ring.cardinality()
    }

    /// Capacity of the window.
    #[must_use]
    pub fn buffered_count(&self) -> usize {
        self.ring.size()
    }

    /// Clears the window and rewinds the cursor.
    ///
    /// The two steps are not atomic as a whole; concurrent readers may observe
    /// a partially reset window.
    pub fn reset(&self) {
        self.ring.reset();
        self.cursor.store(0, Ordering::Release);
    }

    /// Returns a point-in-time view of the window.
    #[must_use]
    pub fn snapshot(&self) -> Metrics {
        Metrics {
            failure_rate: self.failure_rate(),
            failed_count: self.failed_count(),
            buffered_count: self.buffered_count(),
        }
    }

    /// Renders the window as a string of `0` (success) and `1` (failure) slots.
    #[must_use]
    pub fn dump(&self) -> String {
        self.ring.to_string()
    }

    fn claim(&self) -> usize {
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.checked_add(1).unwrap_or(0))
            })
            .unwrap_or_else(|current| current);

        previous.checked_add(1).unwrap_or(0) % self.ring.size()
    }
}

/// Read-only snapshot of a breaker's outcome window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Metrics {
    failure_rate: f32,
    failed_count: usize,
    buffered_count: usize,
}

impl Metrics {
    /// Percentage of failed outcomes, in the `0.0..=100.0` range.
    #[must_use]
    pub fn failure_rate(&self) -> f32 {
        self.failure_rate
    }

    /// Number of failed outcomes in the window.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    /// Capacity of the window.
    #[must_use]
    pub fn buffered_count(&self) -> usize {
        self.buffered_count
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn new_recorder_is_empty() {
        let recorder = MetricsRecorder::new(1000);

        assert_eq!(recorder.buffered_count(), 1024);
        assert_eq!(recorder.failed_count(), 0);
        assert!(recorder.failure_rate().abs() < f32::EPSILON);
    }

    #[test]
    fn failure_rate_uses_full_capacity() {
        let recorder = MetricsRecorder::new(64);

        for _ in 0..16 {
            recorder.record_failure();
        }

        assert_eq!(recorder.failed_count(), 16);
        assert!((recorder.failure_rate() - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn successes_overwrite_failures_after_wrap() {
        let recorder = MetricsRecorder::new(64);

        for _ in 0..64 {
            recorder.record_failure();
        }
        assert_eq!(recorder.failed_count(), 64);

        for _ in 0..32 {
            recorder.record_success();
        }

        assert_eq!(recorder.failed_count(), 32);
        assert!((recorder.failure_rate() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_clears_window() {
        let recorder = MetricsRecorder::new(64);
        recorder.record_failure();
        recorder.record_failure();

        recorder.reset();

        assert_eq!(recorder.failed_count(), 0);
        assert_eq!(recorder.cursor.load(Ordering::Acquire), 0);
    }

    #[test]
    fn cursor_resets_on_overflow() {
        let recorder = MetricsRecorder::new(64);
        recorder.cursor.store(usize::MAX, Ordering::Release);

        recorder.record_failure();

        assert_eq!(recorder.cursor.load(Ordering::Acquire), 0);
        assert!(recorder.ring.get(0));
    }

    #[test]
    fn snapshot_matches_recorder() {
        let recorder = MetricsRecorder::new(10);
        recorder.record_failure();
        recorder.record_success();

        let metrics = recorder.snapshot();

        assert_eq!(metrics.failed_count(), 1);
        assert_eq!(metrics.buffered_count(), 64);
        assert!((metrics.failure_rate() - 100.0 / 64.0).abs() < f32::EPSILON);
    }

    #[test]
    fn dump_shows_recorded_slots() {
        let recorder = MetricsRecorder::new(64);
        recorder.record_failure();
        recorder.record_success();
        recorder.record_failure();

        let dump = recorder.dump();

        assert_eq!(&dump[..4], "0101");
    }

    #[test]
    fn concurrent_recording_claims_distinct_slots() {
        let recorder = Arc::new(MetricsRecorder::new(1024));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for _ in 0..256 {
                        recorder.record_failure();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.failed_count(), 1024);
    }
}
