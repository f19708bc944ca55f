pub(crate) const FPS_SAMPLE_INTERVAL_MS: f64 = 1000.0;

/// Frames-per-second measured from frame timestamps over fixed intervals.
#[derive(Debug)]
pub(crate) struct FrameRateAccumulator {
    interval_ms: f64,
    interval_start_ms: Option<f64>,
    frames: u32,
    last_fps: f32,
}

impl FrameRateAccumulator {
    pub(crate) fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            interval_start_ms: None,
            frames: 0,
            last_fps: 0.0,
        }
    }

    pub(crate) fn fps(&self) -> f32 {
        self.last_fps
    }

    /// Records one frame at `elapsed_ms`. Returns a fresh reading whenever an
    /// interval completes.
    pub(crate) fn record_frame(&mut self, elapsed_ms: f64) -> Option<f32> {
        let Some(start) = self.interval_start_ms else {
            self.interval_start_ms = Some(elapsed_ms);
            return None;
        };

        self.frames = self.frames.saturating_add(1);
        let elapsed = elapsed_ms - start;
        if elapsed < self.interval_ms {
            return None;
        }

        let elapsed_seconds = (elapsed / 1000.0).max(f64::EPSILON);
        self.last_fps = (self.frames as f64 / elapsed_seconds) as f32;
        self.interval_start_ms = Some(elapsed_ms);
        self.frames = 0;
        Some(self.last_fps)
    }
}
