pub const DEFAULT_MAX_DELTA_TIME_MS: f64 = 100.0;

/// Turns host frame timestamps (milliseconds) into clamped delta times (seconds).
///
/// The first timestamp has nothing to diff against, so `measure` reports no
/// delta for it and the caller skips that frame's work. Large gaps (a suspended
/// tab, a debugger pause) are capped at `max_delta_time_ms`.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    previous_elapsed_ms: Option<f64>,
    delta_time: f64,
    max_delta_time_ms: f64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA_TIME_MS)
    }
}

impl FrameTimer {
    pub fn new(max_delta_time_ms: f64) -> Self {
        Self {
            previous_elapsed_ms: None,
            delta_time: 0.0,
            max_delta_time_ms: normalize_max_delta_time(max_delta_time_ms),
        }
    }

    /// Last delta time handed to a frame, in seconds.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    pub fn max_delta_time_ms(&self) -> f64 {
        self.max_delta_time_ms
    }

    pub fn previous_elapsed_ms(&self) -> Option<f64> {
        self.previous_elapsed_ms
    }

    /// Computes the delta for `elapsed_ms` without recording the timestamp.
    /// Returns `None` when the frame must be skipped.
    pub fn measure(&mut self, elapsed_ms: f64) -> Option<f64> {
        if !elapsed_ms.is_finite() {
            return None;
        }
        let previous = self.previous_elapsed_ms?;
        let delta_time = clamp_frame_delta(elapsed_ms - previous, self.max_delta_time_ms) / 1000.0;
        if !delta_time.is_finite() {
            return None;
        }
        self.delta_time = delta_time;
        Some(delta_time)
    }

    pub fn commit(&mut self, elapsed_ms: f64) {
        if elapsed_ms.is_finite() {
            self.previous_elapsed_ms = Some(elapsed_ms);
        }
    }

    /// `measure` followed by `commit`.
    pub fn advance(&mut self, elapsed_ms: f64) -> Option<f64> {
        let delta_time = self.measure(elapsed_ms);
        self.commit(elapsed_ms);
        delta_time
    }
}

fn clamp_frame_delta(raw_delta_ms: f64, max_delta_time_ms: f64) -> f64 {
    raw_delta_ms.min(max_delta_time_ms).max(0.0)
}

pub(crate) fn normalize_max_delta_time(value_ms: f64) -> f64 {
    if value_ms.is_finite() && value_ms > 0.0 {
        value_ms
    } else {
        DEFAULT_MAX_DELTA_TIME_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn first_frame_is_skipped_but_recorded() {
        let mut timer = FrameTimer::default();

        assert_eq!(timer.advance(16.0), None);
        assert_eq!(timer.previous_elapsed_ms(), Some(16.0));
        assert_eq!(timer.delta_time(), 0.0);
    }

    #[test]
    fn delta_is_raw_gap_in_seconds_when_under_cap() {
        let mut timer = FrameTimer::default();
        timer.advance(1000.0);

        assert_close(timer.advance(1016.0).expect("delta"), 0.016);
        assert_close(timer.advance(1049.0).expect("delta"), 0.033);
        assert_close(timer.delta_time(), 0.033);
    }

    #[test]
    fn long_pause_is_capped_at_max_delta() {
        let mut timer = FrameTimer::new(100.0);
        timer.advance(0.0);

        assert_close(timer.advance(5000.0).expect("delta"), 0.1);
    }

    #[test]
    fn custom_cap_is_respected() {
        let mut timer = FrameTimer::new(250.0);
        timer.advance(0.0);

        assert_close(timer.advance(600.0).expect("delta"), 0.25);
    }

    #[test]
    fn backwards_timestamp_clamps_to_zero() {
        let mut timer = FrameTimer::default();
        timer.advance(500.0);

        assert_eq!(timer.advance(400.0), Some(0.0));
    }

    #[test]
    fn non_finite_timestamp_is_skipped_and_not_recorded() {
        let mut timer = FrameTimer::default();
        timer.advance(10.0);

        for elapsed_ms in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(timer.advance(elapsed_ms), None, "{elapsed_ms}");
            assert_eq!(timer.previous_elapsed_ms(), Some(10.0));
        }
        assert_close(timer.advance(20.0).expect("delta"), 0.01);
    }

    #[test]
    fn non_finite_first_timestamp_leaves_timer_unprimed() {
        let mut timer = FrameTimer::default();

        assert_eq!(timer.advance(f64::INFINITY), None);
        assert_eq!(timer.previous_elapsed_ms(), None);
        assert_eq!(timer.advance(0.0), None);
    }

    #[test]
    fn measure_without_commit_keeps_previous_timestamp() {
        let mut timer = FrameTimer::default();
        timer.advance(0.0);

        assert_close(timer.measure(40.0).expect("delta"), 0.04);
        assert_eq!(timer.previous_elapsed_ms(), Some(0.0));
        assert_close(timer.advance(60.0).expect("delta"), 0.06);
    }

    #[test]
    fn invalid_cap_falls_back_to_default() {
        assert_eq!(FrameTimer::new(0.0).max_delta_time_ms(), DEFAULT_MAX_DELTA_TIME_MS);
        assert_eq!(FrameTimer::new(-5.0).max_delta_time_ms(), DEFAULT_MAX_DELTA_TIME_MS);
        assert_eq!(
            FrameTimer::new(f64::INFINITY).max_delta_time_ms(),
            DEFAULT_MAX_DELTA_TIME_MS
        );
    }
}
