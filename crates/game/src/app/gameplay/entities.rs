use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use pixel_engine::{CallbackError, Collidable, Entity, Rect, Rgba, Surface, Vec2};

pub(crate) const PLAYER_NAME: &str = "player";
pub(crate) const PLAYER_SIZE: f32 = 12.0;
pub(crate) const COIN_SIZE: f32 = 8.0;

pub(crate) const PLAYER_COLOR: Rgba = [80, 200, 255, 255];
pub(crate) const COIN_COLOR: Rgba = [255, 210, 40, 255];
const SCORE_COLOR: Rgba = [240, 240, 240, 255];
const SCORE_TEXT_SCALE: i32 = 2;

pub(crate) const KEY_LEFT: u32 = 37;
pub(crate) const KEY_UP: u32 = 38;
pub(crate) const KEY_RIGHT: u32 = 39;
pub(crate) const KEY_DOWN: u32 = 40;

/// Key codes currently held, fed by the keydown/keyup listeners.
pub(crate) type HeldKeys = Rc<RefCell<HashSet<u32>>>;

pub(crate) struct Player {
    position: Vec2,
    speed: f32,
    held: HeldKeys,
    arena: (f32, f32),
}

impl Player {
    pub(crate) fn new(position: Vec2, speed: f32, held: HeldKeys, arena: (u32, u32)) -> Self {
        Self {
            position,
            speed,
            held,
            arena: (arena.0 as f32, arena.1 as f32),
        }
    }

    fn direction(&self) -> Vec2 {
        let held = self.held.borrow();
        let axis = |negative: u32, positive: u32| {
            let mut value = 0.0;
            if held.contains(&negative) {
                value -= 1.0;
            }
            if held.contains(&positive) {
                value += 1.0;
            }
            value
        };
        Vec2::new(axis(KEY_LEFT, KEY_RIGHT), axis(KEY_UP, KEY_DOWN))
    }
}

impl Entity for Player {
    fn update(&mut self, _elapsed_ms: f64, delta_time: f64) -> Result<(), CallbackError> {
        let direction = self.direction();
        let step = self.speed * delta_time as f32;
        let max_x = (self.arena.0 - PLAYER_SIZE).max(0.0);
        let max_y = (self.arena.1 - PLAYER_SIZE).max(0.0);
        self.position.x = (self.position.x + direction.x * step).clamp(0.0, max_x);
        self.position.y = (self.position.y + direction.y * step).clamp(0.0, max_y);
        Ok(())
    }

    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        surface.fill_rect(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            PLAYER_SIZE as i32,
            PLAYER_SIZE as i32,
            PLAYER_COLOR,
        );
        Ok(())
    }

    fn debug_name(&self) -> &str {
        PLAYER_NAME
    }
}

impl Collidable for Player {
    fn bounds(&self) -> Rect {
        Rect::from_position(self.position, PLAYER_SIZE, PLAYER_SIZE)
    }

    fn on_collide(&mut self, _other: &dyn Collidable) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Collectible; flags itself when the player touches it. Removal happens in
/// the game loop.
pub(crate) struct Coin {
    position: Vec2,
    collected: Rc<Cell<bool>>,
}

impl Coin {
    pub(crate) fn new(position: Vec2, collected: Rc<Cell<bool>>) -> Self {
        Self {
            position,
            collected,
        }
    }
}

impl Entity for Coin {
    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        if self.collected.get() {
            return Ok(());
        }
        surface.fill_rect(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            COIN_SIZE as i32,
            COIN_SIZE as i32,
            COIN_COLOR,
        );
        Ok(())
    }

    fn debug_name(&self) -> &str {
        "coin"
    }
}

impl Collidable for Coin {
    fn bounds(&self) -> Rect {
        Rect::from_position(self.position, COIN_SIZE, COIN_SIZE)
    }

    fn on_collide(&mut self, other: &dyn Collidable) -> Result<(), CallbackError> {
        if other.debug_name() == PLAYER_NAME {
            self.collected.set(true);
        }
        Ok(())
    }
}

pub(crate) struct ScoreBoard {
    score: Rc<Cell<u32>>,
    total: u32,
}

impl ScoreBoard {
    pub(crate) fn new(score: Rc<Cell<u32>>, total: u32) -> Self {
        Self { score, total }
    }

    pub(crate) fn label(&self) -> String {
        format!("SCORE: {}/{}", self.score.get(), self.total)
    }
}

impl Entity for ScoreBoard {
    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        surface.draw_text(4, 4, &self.label(), SCORE_TEXT_SCALE, SCORE_COLOR);
        Ok(())
    }

    fn debug_name(&self) -> &str {
        "score_board"
    }
}
