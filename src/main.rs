use color_eyre::{eyre::eyre, Result};
use flightdeck::controller::{
    DeviceAdapter, GamepadAdapter, GamepadSettings, PointerAdapter, PointerEvent, PointerSender,
};
use flightdeck::simulation::LoggingIntegrator;
use flightdeck::{Config, PipelineHandle};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// Queued pointer events between two input cycles
const POINTER_EVENT_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    // first argument, then FLIGHTDECK_CONFIG, then the user config dir
    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("FLIGHTDECK_CONFIG"))
        .map(PathBuf::from);
    let config = Config::load(config_path.as_deref())
        .map_err(|e| eyre!("Failed to load configuration: {}", e))?;

    let (adapters, _pointer_sender) = setup_adapters(&config);

    // Report the controls once per simulated second
    let report_every = (1.0 / config.simulation.dt).round().max(1.0) as u64;
    let pipeline = PipelineHandle::from_config(&config, adapters, LoggingIntegrator::new(report_every))?;

    info!("Pipeline running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    let ticks = pipeline.shutdown().await?;
    info!("Stopped after {} simulation ticks", ticks);
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Gamepads through gilrs, pointers announced from the configuration. The
/// sender keeps the pointer channel open and is where a windowing layer
/// would forward its motion events.
fn setup_adapters(config: &Config) -> (Vec<Box<dyn DeviceAdapter>>, PointerSender) {
    let mut adapters: Vec<Box<dyn DeviceAdapter>> = Vec::new();

    let gamepad_settings = GamepadSettings {
        joystick_deadzone: config.input.joystick_deadzone,
    };
    match GamepadAdapter::create(gamepad_settings) {
        Ok(adapter) => adapters.push(Box::new(adapter)),
        Err(e) => warn!("{}, continuing without gamepads", e),
    }

    let (pointer_sender, pointer_adapter) = PointerAdapter::channel(POINTER_EVENT_CAPACITY);
    for (id, name) in config.input.pointer_devices.iter().enumerate() {
        pointer_sender.send(PointerEvent::Added {
            id,
            name: name.clone(),
        });
    }
    adapters.push(Box::new(pointer_adapter));

    (adapters, pointer_sender)
}
