//! Pipeline lifecycle: spawns both loops around one shared store and stops
//! them together.
//!
//! ```text
//! input thread:     adapters ─► dispatch ─► Actuator ──┐
//!                                                      ▼
//!                                              ControlStateStore
//!                                                      │ snapshot per tick
//! simulation task:  interval(dt) ─► Integrator ◄───────┘
//! ```

use crate::config::Config;
use crate::controller::input_loop::{InputLoop, InputLoopHandle, InputLoopSettings};
use crate::controller::DeviceAdapter;
use crate::controls::actuator::Actuator;
use crate::controls::state::{ControlStateReader, ControlStateStore};
use crate::mapping::error::ConfigError;
use crate::mapping::table::DeviceMappingTable;
use crate::simulation::{run_simulation, Integrator, SimulationError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn input loop: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Simulation loop failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Simulation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Input loop thread panicked")]
    InputLoopPanicked,
}

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub dt: Duration,
    pub input: InputLoopSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dt: Duration::from_millis(50),
            input: InputLoopSettings::default(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dt: config.dt(),
            input: InputLoopSettings {
                poll_interval: config.poll_interval(),
                ..InputLoopSettings::default()
            },
        }
    }
}

/// Running pipeline. Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct PipelineHandle {
    cancel: CancellationToken,
    reset: watch::Sender<()>,
    store: Arc<ControlStateStore>,
    input: InputLoopHandle,
    simulation: JoinHandle<Result<u64, SimulationError>>,
}

impl PipelineHandle {
    /// Builds the mapping table and actuator from `config`, then spawns
    pub fn from_config<I: Integrator>(
        config: &Config,
        adapters: Vec<Box<dyn DeviceAdapter>>,
        integrator: I,
    ) -> Result<Self, PipelineError> {
        let table = config.mapping_table()?;
        let actuator = Actuator::new(config.actuator_settings()?);
        Self::spawn(
            adapters,
            table,
            actuator,
            integrator,
            PipelineSettings::from_config(config),
        )
    }

    pub fn spawn<I: Integrator>(
        adapters: Vec<Box<dyn DeviceAdapter>>,
        table: DeviceMappingTable,
        actuator: Actuator,
        mut integrator: I,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        info!("Spawning pipeline with settings: {:?}", settings);

        let cancel = CancellationToken::new();
        let (reset, reset_requests) = watch::channel(());
        let store = actuator.store();

        let input_loop =
            InputLoop::create(adapters, table, actuator, settings.input, reset_requests);
        let input = InputLoopHandle::spawn(input_loop, cancel.clone())?;

        let reader = store.reader();
        let simulation_cancel = cancel.clone();
        let dt = settings.dt;
        let simulation = tokio::spawn(async move {
            let result = run_simulation(&mut integrator, reader, dt, simulation_cancel).await;
            if let Err(e) = &result {
                error!("Simulation loop stopped: {}", e);
            }
            result
        });
        debug!("Simulation task spawned");

        info!("Pipeline started");
        Ok(Self {
            cancel,
            reset,
            store,
            input,
            simulation,
        })
    }

    pub fn store(&self) -> Arc<ControlStateStore> {
        Arc::clone(&self.store)
    }

    pub fn reader(&self) -> ControlStateReader {
        self.store.reader()
    }

    /// Asks the input loop to restore the initial control state
    pub fn request_reset(&self) {
        info!("Requesting control reset");
        self.reset.send_replace(());
    }

    pub fn is_simulation_running(&self) -> bool {
        !self.simulation.is_finished()
    }

    pub fn is_input_running(&self) -> bool {
        !self.input.is_finished()
    }

    /// Token that stops both loops when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops both loops and waits for them. Returns the simulation tick count,
    /// or the error that stopped the simulation loop early.
    pub async fn shutdown(self) -> Result<u64, PipelineError> {
        info!("Shutting down pipeline");
        self.cancel.cancel();

        let simulation = self.simulation.await;
        let input = self.input;
        let input_ok = tokio::task::spawn_blocking(move || input.join()).await?;

        let ticks = simulation??;
        if !input_ok {
            return Err(PipelineError::InputLoopPanicked);
        }
        info!("Pipeline stopped after {} simulation ticks", ticks);
        Ok(ticks)
    }
}
