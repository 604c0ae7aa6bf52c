use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::snapshot::{Progress, SimSnapshot};
use crate::config::SimConfig;
use crate::error::{ConfigError, InvariantViolation};
use crate::mem::addr::{Layout, PhysAddr, VirtAddr, Vpn};
use crate::mem::space::{AccessKind, AccessOutcome, AddressSpace};
use crate::metrics::Metrics;
use crate::pattern::AccessPatternGenerator;
use crate::rng::{Stream, stream};
use crate::strategy::Prefetcher;

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: usize,
    pub batch: Vec<Vpn>,
    pub outcomes: Vec<AccessOutcome>,
    pub prefetched: usize,
}

impl StepReport {
    pub fn faults(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fault()).count()
    }

    pub fn tlb_hits(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, AccessOutcome::TlbHit { .. })).count()
    }
}

/// The synchronous simulation core: one configuration, one address space, one
/// access stream. Has no notion of time; pacing lives in the controller.
pub struct Machine {
    config: SimConfig,
    space: AddressSpace,
    pattern: AccessPatternGenerator,
    prefetcher: Prefetcher,
    kinds: ChaCha8Rng,
    metrics: Metrics,
    clock: u64,
}

impl Machine {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        Ok(Self::build(config, layout))
    }

    fn build(config: SimConfig, layout: Layout) -> Self {
        let seed = config.seed;
        let space =
            AddressSpace::new(layout, config.eviction_policy, config.tlb_replacement, seed);
        let pattern = AccessPatternGenerator::new(
            config.access_pattern,
            layout.num_virtual_pages,
            config.batch_size,
            config.total_steps,
            stream(seed, Stream::Pattern),
        )
        .with_locality(config.locality_window, config.locality_phase_steps);
        let prefetcher = Prefetcher::new(
            config.mapping_strategy,
            config.access_pattern,
            stream(seed, Stream::Strategy),
        );
        Self {
            space,
            pattern,
            prefetcher,
            kinds: stream(seed, Stream::AccessKind),
            metrics: Metrics::default(),
            clock: 0,
            config,
        }
    }

    /// Restores the initial state of the current configuration, random streams
    /// included, so the next run replays the same sequence.
    pub fn reset(&mut self) {
        let layout = *self.space.layout();
        *self = Self::build(self.config.clone(), layout);
    }

    /// Validates `config` and, only if it is accepted, resets onto it.
    pub fn reconfigure(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        let layout = config.validate()?;
        *self = Self::build(config, layout);
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        self.space.layout()
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.pattern.step(), self.config.total_steps)
    }

    pub fn is_finished(&self) -> bool {
        self.pattern.remaining() == 0
    }

    /// Runs the next step: resolve the batch, then let the strategy speculate.
    /// `None` once the step budget is spent.
    pub fn step(&mut self) -> Option<StepReport> {
        let step = self.pattern.step();
        let batch = self.pattern.next()?;
        let mut outcomes = Vec::with_capacity(batch.len());
        for &vpn in &batch {
            let kind = if self.kinds.gen_bool(self.config.write_ratio) {
                AccessKind::Write
            } else {
                AccessKind::Read
            };
            outcomes.extend(self.access(vpn, kind));
        }
        let prefetched =
            self.prefetcher.after_batch(&batch, &mut self.space, &mut self.metrics, self.clock);
        let report = StepReport { step, batch, outcomes, prefetched };
        debug!(
            step,
            faults = report.faults(),
            tlb_hits = report.tlb_hits(),
            prefetched,
            "step complete"
        );
        Some(report)
    }

    /// Steps until the budget is spent and returns the final counters.
    pub fn run_to_completion(&mut self) -> Metrics {
        while self.step().is_some() {}
        self.metrics
    }

    /// Resolves a single access outside the generated stream.
    pub fn access(&mut self, vpn: Vpn, kind: AccessKind) -> Option<AccessOutcome> {
        self.clock += 1;
        self.space.access(vpn, kind, self.clock, &mut self.metrics)
    }

    pub fn translate(&self, va: VirtAddr) -> Option<PhysAddr> {
        self.space.translate(va)
    }

    /// On failure the present page-table entries are dumped at trace level.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.space.check_invariants().inspect_err(|violation| {
            warn!(%violation, step = self.pattern.step(), "invariant violated");
            self.space.table().dump();
        })
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot::capture(&self.space, self.metrics, self.progress(), &self.config.preview)
    }
}
