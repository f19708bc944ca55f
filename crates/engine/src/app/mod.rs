mod collision;
mod config;
mod engine;
mod entity;
mod input;
mod layer;
mod loading;
mod loop_runner;
mod metrics;
mod rendering;
mod scheduler;
mod sound;
mod timing;
mod tools;

pub use config::{EngineConfig, MAX_DELTA_ENV_VAR};
pub use engine::{Engine, EngineError, TickError, TickOutcome, TickPhase, PERFORMANCE_LAYER};
pub use entity::{CallbackError, Collidable, Entity, EntityId, Rect, Vec2};
pub use input::{InputDispatcher, KeyEvent, KeyListener, UnknownKeyEvent};
pub use layer::Layer;
pub use loading::LoadDone;
pub use loop_runner::{dom_key_code, run_app, AppError};
pub use rendering::{Rgba, Sprite, SpriteError, SpriteImage, Surface};
pub use scheduler::{FrameSource, ManualFrames, PacedFrames, RunSummary, Scheduler, StopHandle};
pub use sound::{FileSound, Sound, SoundAsset};
pub use timing::{FrameTimer, DEFAULT_MAX_DELTA_TIME_MS};
pub use tools::FpsCounter;
