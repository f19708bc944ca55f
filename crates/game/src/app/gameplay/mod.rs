use std::cell::Cell;
use std::rc::Rc;

use pixel_engine::{
    CallbackError, Engine, EngineError, EntityId, FileSound, KeyEvent, Sprite, StopHandle, Vec2,
};
use tracing::{debug, info};

use super::bootstrap::DemoConfig;

mod entities;

use entities::{Coin, HeldKeys, Player, ScoreBoard, COIN_SIZE};

pub(crate) const BACKGROUND_LAYER: &str = "background";
pub(crate) const COIN_LAYER: &str = "coins";
pub(crate) const PLAYER_LAYER: &str = "player";
pub(crate) const HUD_LAYER: &str = "hud";
pub(crate) const COIN_SOUND: &str = "coin";

const PLAYER_SPAWN: Vec2 = Vec2::new(16.0, 16.0);
const COIN_GRID_ORIGIN: Vec2 = Vec2::new(48.0, 64.0);
const COIN_SPACING: f32 = 56.0;
const KEY_F3: u32 = 114;

struct CoinHandle {
    id: EntityId,
    collected: Rc<Cell<bool>>,
}

/// Coin-collector state the game loop works on between ticks.
pub(crate) struct CoinGame {
    coins: Vec<CoinHandle>,
    score: Rc<Cell<u32>>,
    fps_toggle: Rc<Cell<bool>>,
    coin_sound: bool,
    exit_when_cleared: bool,
    stop: StopHandle,
}

/// Builds the demo scene on `engine`: layers, entities, sounds and key
/// listeners.
pub(crate) fn setup(engine: &mut Engine, config: &DemoConfig) -> Result<CoinGame, EngineError> {
    let (scene_width, scene_height) = engine.scene_size();

    if let Some(path) = &config.background {
        let background = engine.create_layer(BACKGROUND_LAYER)?;
        background.z_index = -10;
        background.add_entity(Sprite::new(path, Vec2::default()));
    }

    let mut game = CoinGame {
        coins: Vec::new(),
        score: Rc::new(Cell::new(0)),
        fps_toggle: Rc::new(Cell::new(false)),
        coin_sound: config.coin_sound.is_some(),
        exit_when_cleared: config.exit_when_cleared,
        stop: StopHandle::default(),
    };

    engine.create_layer(COIN_LAYER)?;
    for position in coin_positions(config, (scene_width, scene_height)) {
        game.spawn_coin(engine, position)?;
    }

    let held: HeldKeys = HeldKeys::default();
    engine.create_layer(PLAYER_LAYER)?.add_collidable(Player::new(
        PLAYER_SPAWN,
        config.player_speed,
        Rc::clone(&held),
        (scene_width, scene_height),
    ));

    let hud = engine.create_layer(HUD_LAYER)?;
    hud.z_index = 100;
    hud.add_entity(ScoreBoard::new(Rc::clone(&game.score), game.coins.len() as u32));

    if let Some(path) = &config.coin_sound {
        engine.create_sound(COIN_SOUND, FileSound::new(path))?;
    }

    let pressed = Rc::clone(&held);
    let fps_toggle = Rc::clone(&game.fps_toggle);
    engine.on(KeyEvent::Down, move |key_code| {
        // auto-repeat keydowns arrive while the key is already held
        let first_press = pressed.borrow_mut().insert(key_code);
        if first_press && key_code == KEY_F3 {
            fps_toggle.set(true);
        }
    });
    engine.on(KeyEvent::Up, move |key_code| {
        held.borrow_mut().remove(&key_code);
    });

    engine.set_display_fps(config.show_fps);
    info!(coins = game.coins.len(), "demo_scene_built");
    Ok(game)
}

/// Grid of coin positions, dropping any that would fall outside the scene.
pub(crate) fn coin_positions(config: &DemoConfig, scene: (u32, u32)) -> Vec<Vec2> {
    let mut positions = Vec::new();
    for row in 0..config.coin_rows {
        for column in 0..config.coin_columns {
            let position = Vec2::new(
                COIN_GRID_ORIGIN.x + column as f32 * COIN_SPACING,
                COIN_GRID_ORIGIN.y + row as f32 * COIN_SPACING,
            );
            if position.x + COIN_SIZE <= scene.0 as f32
                && position.y + COIN_SIZE <= scene.1 as f32
            {
                positions.push(position);
            }
        }
    }
    positions
}

impl CoinGame {
    pub(crate) fn score(&self) -> u32 {
        self.score.get()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.coins.len()
    }

    /// Stop flag for the host; set once every coin is collected when
    /// `exit_when_cleared` is configured.
    pub(crate) fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub(crate) fn spawn_coin(
        &mut self,
        engine: &mut Engine,
        position: Vec2,
    ) -> Result<EntityId, EngineError> {
        let collected = Rc::new(Cell::new(false));
        let id = engine
            .layer_mut(COIN_LAYER)?
            .add_collidable(Coin::new(position, Rc::clone(&collected)));
        self.coins.push(CoinHandle { id, collected });
        Ok(id)
    }

    /// Per-frame game logic: applies the overlay toggle and removes coins
    /// the player touched during this frame's collision scan.
    pub(crate) fn frame(
        &mut self,
        engine: &mut Engine,
        _elapsed_ms: f64,
        _delta_time: f64,
    ) -> Result<(), CallbackError> {
        if self.fps_toggle.replace(false) {
            let enabled = !engine.display_fps();
            engine.set_display_fps(enabled);
            debug!(enabled, "fps_overlay_toggled");
        }

        if self.coins.is_empty() {
            return Ok(());
        }

        let layer = engine.layer_mut(COIN_LAYER)?;
        let before = self.coins.len();
        self.coins.retain(|coin| {
            if coin.collected.get() {
                layer.remove(coin.id);
                false
            } else {
                true
            }
        });
        let collected = (before - self.coins.len()) as u32;
        if collected == 0 {
            return Ok(());
        }

        self.score.set(self.score.get() + collected);
        info!(
            score = self.score(),
            remaining = self.remaining(),
            "coins_collected"
        );
        if self.coin_sound {
            engine.play_sound(COIN_SOUND)?;
        }
        if self.coins.is_empty() {
            info!(score = self.score(), "all_coins_collected");
            if self.exit_when_cleared {
                self.stop.stop();
            }
        }
        Ok(())
    }
}
