//! Simulation side of the pipeline
//!
//! The dynamics integrator is an external collaborator behind [`Integrator`].
//! The simulation loop hands it one immutable [`ControlState`] snapshot per
//! tick of a fixed `dt` and never writes back to the store.

pub mod pipeline;

pub use pipeline::{PipelineError, PipelineHandle, PipelineSettings};

use crate::controls::state::{ControlState, ControlStateReader};
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Integrator failed: {0}")]
    Integrator(String),

    #[error("Vehicle state diverged: {0}")]
    Diverged(String),
}

/// Consumer of the control state, advanced once per simulation tick
pub trait Integrator: Send + 'static {
    fn step(&mut self, controls: &ControlState, dt: f64) -> Result<(), SimulationError>;
}

/// Runs `integrator` every `dt` until cancelled. Returns the number of ticks.
///
/// An integrator error ends this loop only; the input loop keeps writing to
/// the store.
pub async fn run_simulation<I: Integrator + ?Sized>(
    integrator: &mut I,
    mut reader: ControlStateReader,
    dt: Duration,
    cancel: CancellationToken,
) -> Result<u64, SimulationError> {
    info!("Starting simulation loop, dt {:?}", dt);
    let step = dt.as_secs_f64();
    let mut ticker = interval(dt);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = reader.snapshot();
                integrator.step(&snapshot, step)?;
                ticks += 1;
            }
        }
    }

    info!("Simulation loop stopped after {} ticks", ticks);
    Ok(ticks)
}

/// Integrator stand-in that only reports the controls it receives
#[derive(Debug, Clone)]
pub struct LoggingIntegrator {
    report_every: u64,
    ticks: u64,
    elapsed: f64,
}

impl LoggingIntegrator {
    pub fn new(report_every: u64) -> Self {
        Self {
            report_every: report_every.max(1),
            ticks: 0,
            elapsed: 0.0,
        }
    }

    /// Simulated time advanced so far, in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Integrator for LoggingIntegrator {
    fn step(&mut self, controls: &ControlState, dt: f64) -> Result<(), SimulationError> {
        self.ticks += 1;
        self.elapsed += dt;
        debug!("t={:.3}s controls {:?}", self.elapsed, controls);
        if self.ticks % self.report_every == 0 {
            info!("t={:.1}s controls {:?}", self.elapsed, controls);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::channel::ControlChannel;
    use crate::controls::state::ControlStateStore;

    struct FailAfter {
        remaining: u32,
    }

    impl Integrator for FailAfter {
        fn step(&mut self, _controls: &ControlState, _dt: f64) -> Result<(), SimulationError> {
            if self.remaining == 0 {
                return Err(SimulationError::Diverged("altitude is NaN".to_string()));
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn integrator_error_ends_the_loop() {
        let store = ControlStateStore::new(ControlState::neutral());
        let result = run_simulation(
            &mut FailAfter { remaining: 3 },
            store.reader(),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(SimulationError::Diverged(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_loop_reports_ticks() {
        let store = ControlStateStore::new(ControlState::neutral());
        let cancel = CancellationToken::new();
        let reader = store.reader();
        let mut integrator = LoggingIntegrator::new(10);

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(95)).await;
            stopper.cancel();
        });

        let ticks = run_simulation(&mut integrator, reader, Duration::from_millis(10), cancel)
            .await
            .unwrap();
        // first tick fires immediately
        assert_eq!(ticks, 10);
        assert!((integrator.elapsed() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn logging_integrator_accepts_any_state() {
        let mut integrator = LoggingIntegrator::new(0);
        let mut state = ControlState::neutral();
        state.set(ControlChannel::Flaps, 0.3);
        assert!(integrator.step(&state, 0.05).is_ok());
    }
}
