//! Runtime core of a small 2D engine: ordered layers of entities, a frame
//! scheduler with clamped delta time, an all-pairs collision scan, keyboard
//! dispatch and sound loading.

pub mod app;

pub use app::{
    dom_key_code, run_app, AppError, CallbackError, Collidable, Engine, EngineConfig, EngineError,
    Entity, EntityId, FileSound, FpsCounter, FrameSource, FrameTimer, InputDispatcher, KeyEvent,
    KeyListener, Layer, LoadDone, ManualFrames, PacedFrames, Rect, Rgba, RunSummary, Scheduler,
    Sound, SoundAsset, Sprite, SpriteError, SpriteImage, StopHandle, Surface, TickError,
    TickOutcome, TickPhase, UnknownKeyEvent, Vec2, DEFAULT_MAX_DELTA_TIME_MS, MAX_DELTA_ENV_VAR,
    PERFORMANCE_LAYER,
};
