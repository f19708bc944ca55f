use std::sync::Arc;
use std::time::Instant;

use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::engine::Engine;
use super::entity::CallbackError;
use super::input::KeyEvent;
use super::scheduler::{RunSummary, StopHandle};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize pixel surface: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens a window sized to the engine's scene and drives `engine` once per
/// redraw until the window closes, Escape is pressed or `stop` is triggered.
///
/// Each redraw requests the following one before ticking, so a failing tick
/// is logged and the next frame still arrives. `stop` is checked after every
/// tick, so a game-loop callback holding a clone can end the run.
pub fn run_app<F>(mut engine: Engine, stop: StopHandle, mut game_loop: F) -> Result<(), AppError>
where
    F: FnMut(&mut Engine, f64, f64) -> Result<(), CallbackError>,
{
    let (scene_width, scene_height) = engine.scene_size();
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(engine.container())
            .with_inner_size(LogicalSize::new(scene_width as f64, scene_height as f64))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut pixels = build_pixels(
        Arc::clone(&window),
        (size.width, size.height),
        (scene_width, scene_height),
    )
    .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);
    info!(
        container = engine.container(),
        scene_width,
        scene_height,
        max_delta_time_ms = engine.max_delta_time_ms(),
        "host_started"
    );

    let started = Instant::now();
    let mut summary = RunSummary::default();
    window.request_redraw();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    match build_pixels(
                        Arc::clone(&window),
                        (new_size.width, new_size.height),
                        (scene_width, scene_height),
                    ) {
                        Ok(resized) => pixels = resized,
                        Err(error) => {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if is_escape(event.physical_key) && event.state == ElementState::Pressed {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                        return;
                    }
                    let Some(key_code) = dom_key_code(event.physical_key) else {
                        return;
                    };
                    let kind = match event.state {
                        ElementState::Pressed => KeyEvent::Down,
                        ElementState::Released => KeyEvent::Up,
                    };
                    engine.dispatch_key(kind, key_code);
                }
                WindowEvent::RedrawRequested => {
                    window.request_redraw();

                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    summary.record(elapsed_ms, engine.tick(elapsed_ms, &mut game_loop));
                    if stop.is_stopped() {
                        info!(reason = "stop_handle", "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    let frame = pixels.frame_mut();
                    let source = engine.surface().frame();
                    if frame.len() == source.len() {
                        frame.copy_from_slice(source);
                    }
                    if let Err(error) = pixels.render() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::LoopExiting => {
                info!(
                    ran = summary.ran,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "shutdown"
                );
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn build_pixels(
    window: Arc<Window>,
    (surface_width, surface_height): (u32, u32),
    (buffer_width, buffer_height): (u32, u32),
) -> Result<Pixels<'static>, PixelsError> {
    let surface = SurfaceTexture::new(surface_width, surface_height, window);
    Pixels::new(buffer_width, buffer_height, surface)
}

fn is_escape(key: PhysicalKey) -> bool {
    matches!(key, PhysicalKey::Code(KeyCode::Escape))
}

/// Maps a physical key to the DOM `keyCode` listeners expect.
pub fn dom_key_code(key: PhysicalKey) -> Option<u32> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let key_code = match code {
        KeyCode::Backspace => 8,
        KeyCode::Tab => 9,
        KeyCode::Enter | KeyCode::NumpadEnter => 13,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => 16,
        KeyCode::ControlLeft | KeyCode::ControlRight => 17,
        KeyCode::AltLeft | KeyCode::AltRight => 18,
        KeyCode::Escape => 27,
        KeyCode::Space => 32,
        KeyCode::ArrowLeft => 37,
        KeyCode::ArrowUp => 38,
        KeyCode::ArrowRight => 39,
        KeyCode::ArrowDown => 40,
        KeyCode::Digit0 => 48,
        KeyCode::Digit1 => 49,
        KeyCode::Digit2 => 50,
        KeyCode::Digit3 => 51,
        KeyCode::Digit4 => 52,
        KeyCode::Digit5 => 53,
        KeyCode::Digit6 => 54,
        KeyCode::Digit7 => 55,
        KeyCode::Digit8 => 56,
        KeyCode::Digit9 => 57,
        KeyCode::KeyA => 65,
        KeyCode::KeyB => 66,
        KeyCode::KeyC => 67,
        KeyCode::KeyD => 68,
        KeyCode::KeyE => 69,
        KeyCode::KeyF => 70,
        KeyCode::KeyG => 71,
        KeyCode::KeyH => 72,
        KeyCode::KeyI => 73,
        KeyCode::KeyJ => 74,
        KeyCode::KeyK => 75,
        KeyCode::KeyL => 76,
        KeyCode::KeyM => 77,
        KeyCode::KeyN => 78,
        KeyCode::KeyO => 79,
        KeyCode::KeyP => 80,
        KeyCode::KeyQ => 81,
        KeyCode::KeyR => 82,
        KeyCode::KeyS => 83,
        KeyCode::KeyT => 84,
        KeyCode::KeyU => 85,
        KeyCode::KeyV => 86,
        KeyCode::KeyW => 87,
        KeyCode::KeyX => 88,
        KeyCode::KeyY => 89,
        KeyCode::KeyZ => 90,
        KeyCode::F1 => 112,
        KeyCode::F2 => 113,
        KeyCode::F3 => 114,
        KeyCode::F4 => 115,
        KeyCode::F5 => 116,
        KeyCode::F6 => 117,
        KeyCode::F7 => 118,
        KeyCode::F8 => 119,
        KeyCode::F9 => 120,
        KeyCode::F10 => 121,
        KeyCode::F11 => 122,
        KeyCode::F12 => 123,
        _ => return None,
    };
    Some(key_code)
}
