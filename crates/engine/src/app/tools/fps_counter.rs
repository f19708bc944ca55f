use crate::app::entity::{CallbackError, Entity, Vec2};
use crate::app::metrics::{FrameRateAccumulator, FPS_SAMPLE_INTERVAL_MS};
use crate::app::rendering::{text_height, Rgba, Surface};

const FPS_TEXT_SCALE: i32 = 2;
const FPS_TEXT_COLOR: Rgba = [244, 248, 252, 255];
const FPS_PANEL_BG_COLOR: Rgba = [10, 12, 16, 255];
const FPS_PANEL_INSET: i32 = 2;
const FPS_PANEL_WIDTH: i32 = 64;

/// Diagnostic entity drawing the measured frame rate.
#[derive(Debug)]
pub struct FpsCounter {
    pub position: Vec2,
    accumulator: FrameRateAccumulator,
}

impl FpsCounter {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            accumulator: FrameRateAccumulator::new(FPS_SAMPLE_INTERVAL_MS),
        }
    }

    pub fn fps(&self) -> f32 {
        self.accumulator.fps()
    }

    pub fn label(&self) -> String {
        format!("FPS: {:.0}", self.fps())
    }
}

impl Entity for FpsCounter {
    fn update(&mut self, elapsed_ms: f64, _delta_time: f64) -> Result<(), CallbackError> {
        self.accumulator.record_frame(elapsed_ms);
        Ok(())
    }

    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        let x = self.position.x.round() as i32;
        let y = self.position.y.round() as i32;
        surface.fill_rect(
            x - FPS_PANEL_INSET,
            y - FPS_PANEL_INSET,
            FPS_PANEL_WIDTH,
            text_height(FPS_TEXT_SCALE) + FPS_PANEL_INSET * 2,
            FPS_PANEL_BG_COLOR,
        );
        surface.draw_text(x, y, &self.label(), FPS_TEXT_SCALE, FPS_TEXT_COLOR);
        Ok(())
    }

    fn debug_name(&self) -> &str {
        "fps_counter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_reports_zero_before_first_interval() {
        let counter = FpsCounter::new(Vec2::new(5.0, 20.0));
        assert_eq!(counter.label(), "FPS: 0");
    }

    #[test]
    fn update_feeds_frame_rate() {
        let mut counter = FpsCounter::new(Vec2::default());
        for frame in 0..=25 {
            counter.update(frame as f64 * 40.0, 0.04).expect("update");
        }

        assert_eq!(counter.label(), "FPS: 25");
    }

    #[test]
    fn draw_paints_panel_at_position() {
        let counter = FpsCounter::new(Vec2::new(5.0, 20.0));
        let mut surface = Surface::new(100, 40);

        counter.draw(&mut surface).expect("draw");

        assert_eq!(surface.pixel(4, 19), Some(FPS_PANEL_BG_COLOR));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        // 'F' top row is solid
        assert_eq!(surface.pixel(5, 20), Some(FPS_TEXT_COLOR));
    }
}
