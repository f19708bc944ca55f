use std::process::ExitCode;

use pixel_engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mut engine,
        mut game,
    } = app;

    engine.load_sounds(Box::new(|| info!("demo_sounds_ready")));
    engine.load_scene(Box::new(|| info!("demo_scene_ready")));

    let stop = game.stop_handle();
    if let Err(err) = run_app(engine, stop, move |engine, elapsed_ms, delta_time| {
        game.frame(engine, elapsed_ms, delta_time)
    }) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
