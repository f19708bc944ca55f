use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use super::collision;
use super::config::EngineConfig;
use super::entity::{CallbackError, Vec2};
use super::input::{InputDispatcher, KeyEvent, KeyListener};
use super::layer::Layer;
use super::loading::{LoadCounter, LoadDone};
use super::rendering::Surface;
use super::sound::{Sound, SoundAsset};
use super::timing::FrameTimer;
use super::tools::FpsCounter;

/// Reserved name of the layer holding the frame-rate overlay.
pub const PERFORMANCE_LAYER: &str = "__pixel_performance_layer";
const PERFORMANCE_LAYER_Z_INDEX: i32 = 9999;
const FPS_COUNTER_POSITION: Vec2 = Vec2::new(5.0, 20.0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("layer '{name}' already exists")]
    DuplicateLayer { name: String },
    #[error("sound '{key}' already exists")]
    DuplicateSound { key: String },
    #[error("no sound registered under '{key}'")]
    UnknownSound { key: String },
    #[error("no layer named '{name}'")]
    UnknownLayer { name: String },
}

/// Tick phase an entity or game-loop callback failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickPhase {
    Update { layer: String },
    Collision { layer: String },
    GameLoop,
    Draw { layer: String },
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickPhase::Update { layer } => write!(f, "update of layer '{layer}'"),
            TickPhase::Collision { layer } => write!(f, "collision scan of layer '{layer}'"),
            TickPhase::GameLoop => f.write_str("game loop"),
            TickPhase::Draw { layer } => write!(f, "draw of layer '{layer}'"),
        }
    }
}

/// A callback failed mid-tick. The remaining phases of that tick did not run.
#[derive(Debug, Error)]
#[error("tick failed during {phase}: {source}")]
pub struct TickError {
    pub phase: TickPhase,
    #[source]
    pub source: CallbackError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No previous timestamp, or a non-finite one. Finite timestamps are still recorded.
    Skipped,
    Ran { delta_time: f64 },
}

/// Engine context: layers, sounds, input listeners and frame timing.
///
/// Layers update and collide in creation order and draw in ascending
/// `z_index` order (creation order breaks ties).
pub struct Engine {
    config: EngineConfig,
    surface: Surface,
    timer: FrameTimer,
    layers: Vec<Layer>,
    sounds: HashMap<String, Sound>,
    sound_keys: Vec<String>,
    input: InputDispatcher,
    display_fps: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::init(EngineConfig::default())
    }
}

impl Engine {
    pub fn init(config: EngineConfig) -> Self {
        let timer = FrameTimer::new(config.resolved_max_delta_time_ms());
        info!(
            container = config.container.as_str(),
            width = config.width,
            height = config.height,
            max_delta_time_ms = timer.max_delta_time_ms(),
            "engine_initialized"
        );
        Self {
            surface: Surface::new(config.width, config.height),
            config,
            timer,
            layers: Vec::new(),
            sounds: HashMap::new(),
            sound_keys: Vec::new(),
            input: InputDispatcher::default(),
            display_fps: false,
        }
    }

    pub fn container(&self) -> &str {
        &self.config.container
    }

    pub fn scene_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Delta time of the last tick that ran, in seconds.
    pub fn delta_time(&self) -> f64 {
        self.timer.delta_time()
    }

    pub fn max_delta_time_ms(&self) -> f64 {
        self.timer.max_delta_time_ms()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn create_layer(&mut self, name: impl Into<String>) -> Result<&mut Layer, EngineError> {
        let name = name.into();
        if self.layer_index(&name).is_some() {
            return Err(EngineError::DuplicateLayer { name });
        }

        info!(layer = name.as_str(), order = self.layers.len(), "layer_created");
        let index = self.layers.len();
        self.layers.push(Layer::new(name));
        Ok(&mut self.layers[index])
    }

    pub fn layer(&self, name: &str) -> Result<&Layer, EngineError> {
        self.layers
            .iter()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| EngineError::UnknownLayer {
                name: name.to_string(),
            })
    }

    pub fn layer_mut(&mut self, name: &str) -> Result<&mut Layer, EngineError> {
        self.layers
            .iter_mut()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| EngineError::UnknownLayer {
                name: name.to_string(),
            })
    }

    /// Layers in creation order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.layers.iter().map(Layer::name)
    }

    /// Layer names in the order they are drawn.
    pub fn draw_order(&self) -> Vec<&str> {
        self.draw_indices()
            .into_iter()
            .map(|index| self.layers[index].name())
            .collect()
    }

    fn draw_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.layers.len()).collect();
        indices.sort_by_key(|&index| self.layers[index].z_index);
        indices
    }

    fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    /// Registers a sound that [`Engine::load_sounds`] waits for.
    pub fn create_sound<A: SoundAsset + 'static>(
        &mut self,
        name: impl Into<String>,
        asset: A,
    ) -> Result<&mut Sound, EngineError> {
        let key = name.into();
        match self.sounds.entry(key.clone()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateSound { key }),
            Entry::Vacant(slot) => {
                debug!(sound = key.as_str(), "sound_created");
                self.sound_keys.push(key);
                Ok(slot.insert(Sound::new(asset)))
            }
        }
    }

    /// Registers a sound under `key` without tracking it for `load_sounds`.
    pub fn add_sound(&mut self, key: impl Into<String>, sound: Sound) -> Result<(), EngineError> {
        let key = key.into();
        match self.sounds.entry(key.clone()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateSound { key }),
            Entry::Vacant(slot) => {
                debug!(sound = key.as_str(), "sound_added");
                slot.insert(sound);
                Ok(())
            }
        }
    }

    pub fn sound(&self, key: &str) -> Option<&Sound> {
        self.sounds.get(key)
    }

    pub fn play_sound(&mut self, key: &str) -> Result<(), EngineError> {
        let sound = self
            .sounds
            .get_mut(key)
            .ok_or_else(|| EngineError::UnknownSound {
                key: key.to_string(),
            })?;
        sound.play();
        Ok(())
    }

    /// Loads every sound registered with `create_sound` and calls `done` once
    /// all of them are loaded. Sounds that are already loaded count
    /// immediately; with no tracked sounds `done` runs before this returns.
    pub fn load_sounds(&mut self, done: LoadDone) {
        let total = self.sound_keys.len();
        let counter = LoadCounter::new(
            total,
            Box::new(move || {
                info!(count = total, "sounds_loaded");
                done();
            }),
        );

        for key in &self.sound_keys {
            match self.sounds.get_mut(key) {
                Some(sound) if !sound.is_loaded() => sound.load(counter.completion()),
                _ => counter.complete_one(),
            }
        }
    }

    /// Loads every layer and calls `done` once all of them have finished.
    /// An engine without layers completes immediately.
    pub fn load_scene(&mut self, done: LoadDone) {
        let total = self.layers.len();
        let counter = LoadCounter::new(
            total,
            Box::new(move || {
                info!(layers = total, "scene_loaded");
                done();
            }),
        );

        for layer in &mut self.layers {
            layer.load(counter.completion());
        }
    }

    pub fn on(&mut self, event: KeyEvent, listener: impl FnMut(u32) + 'static) {
        let listener: KeyListener = Box::new(listener);
        self.input.on(event, listener);
    }

    /// Host entry point for keyboard events.
    pub fn dispatch_key(&mut self, event: KeyEvent, key_code: u32) -> usize {
        self.input.dispatch(event, key_code)
    }

    pub fn display_fps(&self) -> bool {
        self.display_fps
    }

    /// Shows or hides the frame-rate overlay. The overlay layer is created on
    /// first enable; later calls only toggle its visibility.
    pub fn set_display_fps(&mut self, enabled: bool) {
        self.display_fps = enabled;
        match self.layer_index(PERFORMANCE_LAYER) {
            Some(index) => self.layers[index].visible = enabled,
            None if enabled => {
                let mut layer = Layer::new(PERFORMANCE_LAYER);
                layer.z_index = PERFORMANCE_LAYER_Z_INDEX;
                layer.add_entity(FpsCounter::new(FPS_COUNTER_POSITION));
                info!(layer = PERFORMANCE_LAYER, "layer_created");
                self.layers.push(layer);
            }
            None => {}
        }
    }

    /// Runs one frame at host timestamp `elapsed_ms`: layer updates, the
    /// collision scan, `game_loop`, then drawing.
    ///
    /// The first timestamp only primes the timer. On error the remaining
    /// phases are skipped and the timestamp is not recorded, so the next
    /// frame sees a clamped delta.
    pub fn tick<F>(&mut self, elapsed_ms: f64, game_loop: &mut F) -> Result<TickOutcome, TickError>
    where
        F: FnMut(&mut Engine, f64, f64) -> Result<(), CallbackError>,
    {
        let Some(delta_time) = self.timer.measure(elapsed_ms) else {
            self.timer.commit(elapsed_ms);
            return Ok(TickOutcome::Skipped);
        };

        for layer in &mut self.layers {
            layer
                .update(elapsed_ms, delta_time)
                .map_err(|source| TickError {
                    phase: TickPhase::Update {
                        layer: layer.name().to_string(),
                    },
                    source,
                })?;
        }

        collision::scan(&mut self.layers).map_err(|failure| TickError {
            phase: TickPhase::Collision {
                layer: failure.layer,
            },
            source: failure.source,
        })?;

        game_loop(self, elapsed_ms, delta_time).map_err(|source| TickError {
            phase: TickPhase::GameLoop,
            source,
        })?;

        self.surface.clear(self.config.clear_color);
        for index in self.draw_indices() {
            let layer = &self.layers[index];
            layer.draw(&mut self.surface).map_err(|source| TickError {
                phase: TickPhase::Draw {
                    layer: layer.name().to_string(),
                },
                source,
            })?;
        }

        self.timer.commit(elapsed_ms);
        Ok(TickOutcome::Ran { delta_time })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("timer", &self.timer)
            .field("layers", &self.layers)
            .field("sound_keys", &self.sound_keys)
            .field("input", &self.input)
            .field("display_fps", &self.display_fps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::app::entity::{Collidable, Entity, Rect};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Entity for Recorder {
        fn update(&mut self, _elapsed_ms: f64, _delta_time: f64) -> Result<(), CallbackError> {
            self.log.borrow_mut().push(format!("update:{}", self.name));
            Ok(())
        }

        fn draw(&self, _surface: &mut Surface) -> Result<(), CallbackError> {
            self.log.borrow_mut().push(format!("draw:{}", self.name));
            Ok(())
        }
    }

    impl Collidable for Recorder {
        fn bounds(&self) -> Rect {
            Rect::new(0.0, 0.0, 10.0, 10.0)
        }

        fn on_collide(&mut self, _other: &dyn Collidable) -> Result<(), CallbackError> {
            self.log.borrow_mut().push(format!("collide:{}", self.name));
            Ok(())
        }
    }

    struct Failing;

    impl Entity for Failing {
        fn update(&mut self, _elapsed_ms: f64, _delta_time: f64) -> Result<(), CallbackError> {
            Err("update broke".into())
        }

        fn draw(&self, _surface: &mut Surface) -> Result<(), CallbackError> {
            Ok(())
        }
    }

    fn engine() -> Engine {
        Engine::init(EngineConfig {
            width: 32,
            height: 32,
            ..EngineConfig::default()
        })
    }

    fn no_game_loop(_: &mut Engine, _: f64, _: f64) -> Result<(), CallbackError> {
        Ok(())
    }

    #[test]
    fn duplicate_layer_is_rejected_and_order_kept() {
        let mut engine = engine();
        engine.create_layer("a").expect("a");
        engine.create_layer("b").expect("b");

        let error = engine.create_layer("a").expect_err("duplicate");

        assert_eq!(
            error,
            EngineError::DuplicateLayer {
                name: "a".to_string()
            }
        );
        assert_eq!(engine.layer_keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn unknown_layer_lookup_fails() {
        let engine = engine();
        assert!(matches!(
            engine.layer("missing"),
            Err(EngineError::UnknownLayer { .. })
        ));
    }

    #[test]
    fn tick_runs_phases_in_order() {
        let log: Log = Rc::default();
        let mut engine = engine();
        engine
            .create_layer("world")
            .expect("layer")
            .add_collidable(Recorder {
                name: "a",
                log: Rc::clone(&log),
            });
        engine
            .layer_mut("world")
            .expect("layer")
            .add_collidable(Recorder {
                name: "b",
                log: Rc::clone(&log),
            });
        let game_log = Rc::clone(&log);
        let mut game_loop = move |_: &mut Engine, _: f64, _: f64| -> Result<(), CallbackError> {
            game_log.borrow_mut().push("game_loop".to_string());
            Ok(())
        };

        assert_eq!(
            engine.tick(0.0, &mut game_loop).expect("first"),
            TickOutcome::Skipped
        );
        assert!(log.borrow().is_empty());

        engine.tick(16.0, &mut game_loop).expect("second");

        assert_eq!(
            *log.borrow(),
            vec![
                "update:a",
                "update:b",
                "collide:a",
                "collide:b",
                "game_loop",
                "draw:a",
                "draw:b"
            ]
        );
    }

    #[test]
    fn failed_update_aborts_tick_and_keeps_previous_timestamp() {
        let mut engine = engine();
        engine.create_layer("broken").expect("layer").add_entity(Failing);
        let game_loop_ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&game_loop_ran);
        let mut game_loop = move |_: &mut Engine, _: f64, _: f64| -> Result<(), CallbackError> {
            flag.set(true);
            Ok(())
        };

        engine.tick(0.0, &mut game_loop).expect("prime");
        let error = engine.tick(10.0, &mut game_loop).expect_err("update fails");

        assert_eq!(
            error.phase,
            TickPhase::Update {
                layer: "broken".to_string()
            }
        );
        assert_eq!(error.source.to_string(), "update broke");
        assert!(!game_loop_ran.get());
        assert_eq!(engine.timer.previous_elapsed_ms(), Some(0.0));
    }

    #[test]
    fn game_loop_can_mutate_engine() {
        let mut engine = engine();
        engine.create_layer("coins").expect("layer");
        let mut spawned = false;
        let mut game_loop = move |engine: &mut Engine, _: f64, _: f64| {
            if !spawned {
                engine.layer_mut("coins")?.add_entity(Failing);
                spawned = true;
            }
            Ok::<(), CallbackError>(())
        };

        engine.tick(0.0, &mut game_loop).expect("prime");
        engine.tick(16.0, &mut game_loop).expect("spawn");

        assert_eq!(engine.layer("coins").expect("layer").len(), 1);
        assert!(engine.tick(32.0, &mut game_loop).is_err());
    }

    #[test]
    fn game_loop_error_is_reported_with_phase() {
        let mut engine = engine();
        let mut game_loop =
            |_: &mut Engine, _: f64, _: f64| -> Result<(), CallbackError> { Err("boom".into()) };

        engine.tick(0.0, &mut game_loop).expect("prime");
        let error = engine.tick(5.0, &mut game_loop).expect_err("game loop fails");

        assert_eq!(error.phase, TickPhase::GameLoop);
        assert_eq!(error.to_string(), "tick failed during game loop: boom");
    }

    #[test]
    fn draw_follows_z_index_with_creation_order_ties() {
        let mut engine = engine();
        engine.create_layer("hud").expect("hud").z_index = 10;
        engine.create_layer("background").expect("bg").z_index = -1;
        engine.create_layer("world").expect("world");
        engine.create_layer("effects").expect("effects");

        assert_eq!(
            engine.draw_order(),
            vec!["background", "world", "effects", "hud"]
        );
        assert_eq!(
            engine.layer_keys().collect::<Vec<_>>(),
            vec!["hud", "background", "world", "effects"]
        );
    }

    #[test]
    fn display_fps_creates_overlay_once() {
        let mut engine = engine();
        assert!(!engine.display_fps());

        engine.set_display_fps(true);
        engine.set_display_fps(false);
        engine.set_display_fps(true);

        let overlays = engine
            .layer_keys()
            .filter(|name| *name == PERFORMANCE_LAYER)
            .count();
        assert_eq!(overlays, 1);
        let layer = engine.layer(PERFORMANCE_LAYER).expect("overlay");
        assert!(layer.visible);
        assert_eq!(layer.z_index, PERFORMANCE_LAYER_Z_INDEX);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn disabling_fps_before_enabling_creates_nothing() {
        let mut engine = engine();
        engine.set_display_fps(false);
        assert_eq!(engine.layers().len(), 0);
    }

    #[test]
    fn sounds_reject_duplicates_and_unknown_keys() {
        struct Silent;
        impl SoundAsset for Silent {
            fn is_loaded(&self) -> bool {
                true
            }
            fn load(&mut self, done: LoadDone) {
                done();
            }
            fn play(&mut self) {}
        }

        let mut engine = engine();
        engine.create_sound("jump", Silent).expect("jump");

        assert_eq!(
            engine.create_sound("jump", Silent).err(),
            Some(EngineError::DuplicateSound {
                key: "jump".to_string()
            })
        );
        assert_eq!(
            engine.add_sound("jump", Sound::new(Silent)),
            Err(EngineError::DuplicateSound {
                key: "jump".to_string()
            })
        );
        assert!(engine.play_sound("jump").is_ok());
        assert_eq!(
            engine.play_sound("coin"),
            Err(EngineError::UnknownSound {
                key: "coin".to_string()
            })
        );
    }

    #[test]
    fn load_scene_without_layers_completes_immediately() {
        let mut engine = engine();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);

        engine.load_scene(Box::new(move || flag.set(true)));

        assert!(done.get());
    }

    #[test]
    fn key_listeners_receive_codes() {
        let mut engine = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.on(KeyEvent::Down, move |code| sink.borrow_mut().push(code));

        assert_eq!(engine.dispatch_key(KeyEvent::Down, 39), 1);
        assert_eq!(engine.dispatch_key(KeyEvent::Up, 39), 0);
        assert_eq!(*seen.borrow(), vec![39]);
    }

    #[test]
    fn no_game_loop_helper_is_a_valid_callback() {
        let mut engine = engine();
        let mut game_loop = no_game_loop;
        engine.tick(0.0, &mut game_loop).expect("prime");
        assert_eq!(
            engine.tick(5000.0, &mut game_loop).expect("tick"),
            TickOutcome::Ran { delta_time: 0.1 }
        );
        assert_eq!(engine.delta_time(), 0.1);
    }

    #[test]
    fn infinite_timestamp_skips_the_frame_without_callbacks() {
        let mut engine = engine();
        let log: Log = Rc::default();
        engine.create_layer("world").expect("layer").add_entity(Recorder {
            name: "a",
            log: Rc::clone(&log),
        });
        let mut loop_calls = 0;
        let mut game_loop = |_: &mut Engine, _: f64, _: f64| {
            loop_calls += 1;
            Ok::<(), CallbackError>(())
        };

        engine.tick(10.0, &mut game_loop).expect("prime");
        for elapsed_ms in [f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                engine.tick(elapsed_ms, &mut game_loop).expect("non-finite"),
                TickOutcome::Skipped
            );
        }
        assert!(log.borrow().is_empty());

        assert_eq!(
            engine.tick(30.0, &mut game_loop).expect("tick"),
            TickOutcome::Ran { delta_time: 0.02 }
        );
        assert_eq!(loop_calls, 1);
        assert_eq!(*log.borrow(), vec!["update:a", "draw:a"]);
    }
}
