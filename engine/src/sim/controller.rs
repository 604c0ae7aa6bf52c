//! Paced, cancellable driver around [`Machine`].
//!
//! The controller owns the only copy of the simulation state behind a lock that
//! is never held across an await. A run is a loop of
//! `check cancel -> step -> publish progress -> paced sleep`; the cancel check
//! and the step happen under the same lock acquisition, so once `reset` has
//! cancelled the token and taken the lock, no later step can mutate state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use spin::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::cancel::CancelToken;
use super::machine::Machine;
use super::snapshot::{Progress, SimSnapshot};
use crate::config::SimConfig;
use crate::error::{ConfigError, SimError};
use crate::metrics::Metrics;

/// How a call to [`SimulationController::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { steps: usize, metrics: Metrics },
    Cancelled { steps: usize },
}

struct Shared {
    machine: Mutex<Machine>,
    running: AtomicBool,
    cancel: Mutex<CancelToken>,
    progress: watch::Sender<Progress>,
}

/// Cheap to clone; clones drive the same simulation.
#[derive(Clone)]
pub struct SimulationController {
    shared: Arc<Shared>,
}

/// Clears the running flag however the run future ends, including being dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SimulationController {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let machine = Machine::new(config)?;
        let (progress, _) = watch::channel(machine.progress());
        Ok(Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(machine),
                running: AtomicBool::new(false),
                cancel: Mutex::new(CancelToken::new()),
                progress,
            }),
        })
    }

    /// Progress updates, one per completed step and one per reset.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.shared.progress.subscribe()
    }

    pub fn progress(&self) -> Progress {
        *self.shared.progress.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn config(&self) -> SimConfig {
        self.shared.machine.lock().config().clone()
    }

    pub fn metrics(&self) -> Metrics {
        self.shared.machine.lock().metrics()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        self.shared.machine.lock().snapshot()
    }

    /// Read-only access to the full machine, e.g. for invariant checks.
    pub fn inspect<R>(&self, f: impl FnOnce(&Machine) -> R) -> R {
        f(&self.shared.machine.lock())
    }

    /// Runs the full step budget from a fresh state, sleeping `step_pacing_ms`
    /// between steps. Fails with [`SimError::AlreadyRunning`] if a run is in
    /// flight; that run is not disturbed.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunOutcome, SimError> {
        // claiming the run and installing its token happen under the cancel
        // lock, so a concurrent reset cancels either nothing or this run
        let token = {
            let mut current = self.shared.cancel.lock();
            if self
                .shared
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                warn!("run rejected: simulation already running");
                return Err(SimError::AlreadyRunning);
            }
            *current = CancelToken::new();
            current.clone()
        };
        let _guard = RunGuard(&self.shared.running);

        let (pacing, total_steps) = {
            let mut machine = self.shared.machine.lock();
            machine.reset();
            self.shared.progress.send_replace(machine.progress());
            let config = machine.config();
            info!(
                pattern = %config.access_pattern,
                strategy = %config.mapping_strategy,
                pages = machine.layout().num_virtual_pages,
                frames = machine.layout().num_physical_frames,
                "simulation started"
            );
            (Duration::from_millis(config.step_pacing_ms), config.total_steps)
        };

        let mut steps = 0;
        loop {
            let done = {
                let mut machine = self.shared.machine.lock();
                if token.is_cancelled() {
                    info!(steps, "simulation cancelled");
                    return Ok(RunOutcome::Cancelled { steps });
                }
                if machine.step().is_none() {
                    break;
                }
                let progress = machine.progress();
                self.shared.progress.send_replace(progress);
                progress.is_complete()
            };
            steps += 1;
            if done {
                break;
            }
            if !token.sleep(pacing).await {
                debug!(steps, "pacing interrupted");
                info!(steps, "simulation cancelled");
                return Ok(RunOutcome::Cancelled { steps });
            }
        }

        let metrics = self.metrics();
        info!(
            steps,
            total_steps,
            page_faults = metrics.page_faults,
            tlb_hit_rate = metrics.tlb_hit_rate(),
            "simulation completed"
        );
        Ok(RunOutcome::Completed { steps, metrics })
    }

    /// Cancels any in-flight run and restores the initial state.
    pub fn reset(&self) {
        let cancel = self.shared.cancel.lock();
        cancel.cancel();
        let mut machine = self.shared.machine.lock();
        drop(cancel);
        machine.reset();
        self.shared.progress.send_replace(machine.progress());
        info!("simulation reset");
    }

    /// Validates `config` and resets onto it. A rejected config leaves the
    /// current state and any in-flight run untouched.
    pub fn reconfigure(&self, config: SimConfig) -> Result<(), ConfigError> {
        let fresh = Machine::new(config)?;
        let cancel = self.shared.cancel.lock();
        cancel.cancel();
        let mut machine = self.shared.machine.lock();
        drop(cancel);
        *machine = fresh;
        self.shared.progress.send_replace(machine.progress());
        info!("simulation reconfigured");
        Ok(())
    }
}
