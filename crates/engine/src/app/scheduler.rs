use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

use super::engine::{Engine, TickError, TickOutcome};
use super::entity::CallbackError;

/// Host frame signal. `next_frame` waits for the next frame and returns its
/// timestamp in milliseconds, or `None` once the host has no more frames.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Replays a fixed list of timestamps.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    timestamps: VecDeque<f64>,
}

impl ManualFrames {
    pub fn new(timestamps: impl IntoIterator<Item = f64>) -> Self {
        Self {
            timestamps: timestamps.into_iter().collect(),
        }
    }

    pub fn push(&mut self, elapsed_ms: f64) {
        self.timestamps.push_back(elapsed_ms);
    }

    pub fn remaining(&self) -> usize {
        self.timestamps.len()
    }
}

impl FrameSource for ManualFrames {
    fn next_frame(&mut self) -> Option<f64> {
        self.timestamps.pop_front()
    }
}

/// Wall-clock frames paced to an optional frame-rate cap. Never runs out.
///
/// With a cap, each call hands out the planned instant of the next frame
/// without waiting for it; the wait happens at the start of the following
/// call. A scheduler that requests before ticking therefore ticks each frame
/// close to its timestamp.
#[derive(Debug)]
pub struct PacedFrames {
    started: Instant,
    planned: Option<Instant>,
    frame_target: Option<Duration>,
}

impl PacedFrames {
    pub fn new(max_fps: Option<u32>) -> Self {
        Self {
            started: Instant::now(),
            planned: None,
            frame_target: target_frame_duration(max_fps),
        }
    }

    fn timestamp_ms(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.started).as_secs_f64() * 1000.0
    }
}

impl FrameSource for PacedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(planned) = self.planned {
            let wait = planned.saturating_duration_since(Instant::now());
            if wait > Duration::ZERO {
                thread::sleep(wait);
            }
        }
        let now = Instant::now();
        let frame_at = next_frame_instant(self.planned, self.frame_target, now);
        self.planned = Some(frame_at);
        Some(self.timestamp_ms(frame_at))
    }
}

fn target_frame_duration(max_fps: Option<u32>) -> Option<Duration> {
    max_fps
        .filter(|fps| *fps > 0)
        .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

/// One frame target after the previous planned frame, or `now` when uncapped,
/// on the first frame, or when the loop has fallen behind.
fn next_frame_instant(
    previous: Option<Instant>,
    frame_target: Option<Duration>,
    now: Instant,
) -> Instant {
    match (previous, frame_target) {
        (Some(previous), Some(frame_target)) => (previous + frame_target).max(now),
        _ => now,
    }
}

/// Shared stop flag for a [`Scheduler`]. Clones observe the same flag, so a
/// game-loop callback can hold one and end the run.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    fn reset(&self) {
        self.stopped.set(false);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ran: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl RunSummary {
    pub fn ticks(&self) -> u64 {
        self.ran + self.skipped + self.failed
    }

    /// Counts one tick result, logging a failure as `tick_failed`.
    pub fn record(&mut self, elapsed_ms: f64, result: Result<TickOutcome, TickError>) {
        match result {
            Ok(TickOutcome::Ran { .. }) => self.ran += 1,
            Ok(TickOutcome::Skipped) => self.skipped += 1,
            Err(err) => {
                self.failed += 1;
                error!(elapsed_ms, phase = %err.phase, error = %err.source, "tick_failed");
            }
        }
    }
}

/// Drives [`Engine::tick`] once per frame from a [`FrameSource`].
#[derive(Debug, Default)]
pub struct Scheduler {
    stop: StopHandle,
    running: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running && !self.stop.is_stopped()
    }

    pub fn start(&mut self) {
        self.stop.reset();
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.stop.stop();
        self.running = false;
    }

    /// Ticks `engine` for every frame `frames` delivers until the source is
    /// exhausted or the scheduler is stopped.
    ///
    /// The next frame is requested before the current one is ticked. A failed
    /// tick is logged and the loop carries on with the next frame.
    pub fn run<S, F>(&mut self, engine: &mut Engine, frames: &mut S, mut game_loop: F) -> RunSummary
    where
        S: FrameSource + ?Sized,
        F: FnMut(&mut Engine, f64, f64) -> Result<(), CallbackError>,
    {
        self.start();
        let mut summary = RunSummary::default();
        info!("scheduler_started");

        let mut pending = frames.next_frame();
        while let Some(elapsed_ms) = pending {
            if self.stop.is_stopped() {
                break;
            }
            pending = frames.next_frame();

            summary.record(elapsed_ms, engine.tick(elapsed_ms, &mut game_loop));
        }

        self.running = false;
        info!(
            ran = summary.ran,
            skipped = summary.skipped,
            failed = summary.failed,
            "scheduler_stopped"
        );
        summary
    }
}
