//! Simulation parameters and their validation.
//!
//! A [`SimConfig`] is plain data: it can be built in code, deserialized from
//! JSON (field names accept both `snake_case` and the camelCase used by the UI),
//! or assembled from command-line flags. Nothing reads it until
//! [`SimConfig::validate`] has produced a [`Layout`], and a run never sees a
//! config change; swapping configurations goes through a reset.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mem::addr::Layout;
use crate::mem::replace::ReplacementPolicy;
use crate::mem::{PGSIZE_1G, PGSIZE_2M, PGSIZE_4K, TLB_ENTRIES};
use crate::pattern::AccessPattern;
use crate::sim::snapshot::PreviewLimits;
use crate::strategy::MappingStrategy;

pub const SUPPORTED_PAGE_SIZES: [u64; 3] = [PGSIZE_4K, PGSIZE_2M, PGSIZE_1G];
pub const MIN_PACING_MS: u64 = 50;
pub const MAX_PACING_MS: u64 = 1000;

pub const DEFAULT_TOTAL_STEPS: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_LOCALITY_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    #[serde(alias = "virtualAddressSpaceSizeMB")]
    pub virtual_space_mb: u64,
    #[serde(alias = "physicalMemorySizeMB")]
    pub physical_memory_mb: u64,
    #[serde(alias = "pageSizeBytes")]
    pub page_size: u64,
    #[serde(alias = "mappingStrategy")]
    pub mapping_strategy: MappingStrategy,
    #[serde(alias = "accessPattern")]
    pub access_pattern: AccessPattern,
    #[serde(alias = "stepPacingMs")]
    pub step_pacing_ms: u64,
    pub seed: u64,
    #[serde(alias = "totalSteps")]
    pub total_steps: usize,
    #[serde(alias = "batchSize")]
    pub batch_size: usize,
    #[serde(alias = "tlbCapacity")]
    pub tlb_capacity: usize,
    #[serde(alias = "evictionPolicy")]
    pub eviction_policy: ReplacementPolicy,
    #[serde(alias = "tlbReplacement")]
    pub tlb_replacement: ReplacementPolicy,
    /// Probability that an access is a write.
    #[serde(alias = "writeRatio")]
    pub write_ratio: f64,
    #[serde(alias = "localityWindow")]
    pub locality_window: usize,
    /// Steps between re-draws of the localized window. 1 re-draws every step.
    #[serde(alias = "localityPhaseSteps")]
    pub locality_phase_steps: usize,
    pub preview: PreviewLimits,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            virtual_space_mb: 4,
            physical_memory_mb: 1,
            page_size: PGSIZE_4K,
            mapping_strategy: MappingStrategy::Demand,
            access_pattern: AccessPattern::Sequential,
            step_pacing_ms: 100,
            seed: 0,
            total_steps: DEFAULT_TOTAL_STEPS,
            batch_size: DEFAULT_BATCH_SIZE,
            tlb_capacity: TLB_ENTRIES,
            eviction_policy: ReplacementPolicy::Random,
            tlb_replacement: ReplacementPolicy::Random,
            write_ratio: 0.25,
            locality_window: DEFAULT_LOCALITY_WINDOW,
            locality_phase_steps: 1,
            preview: PreviewLimits::default(),
        }
    }
}

impl SimConfig {
    #[must_use]
    pub const fn with_sizes(mut self, virtual_mb: u64, physical_mb: u64, page_size: u64) -> Self {
        self.virtual_space_mb = virtual_mb;
        self.physical_memory_mb = physical_mb;
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn with_pattern(mut self, pattern: AccessPattern) -> Self {
        self.access_pattern = pattern;
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: MappingStrategy) -> Self {
        self.mapping_strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_pacing_ms(mut self, ms: u64) -> Self {
        self.step_pacing_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_steps(mut self, total_steps: usize, batch_size: usize) -> Self {
        self.total_steps = total_steps;
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_eviction(mut self, policy: ReplacementPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_write_ratio(mut self, ratio: f64) -> Self {
        self.write_ratio = ratio;
        self
    }

    /// Checks every field and derives the sizes a run will use.
    pub fn validate(&self) -> Result<Layout, ConfigError> {
        if !SUPPORTED_PAGE_SIZES.contains(&self.page_size) {
            return Err(ConfigError::UnsupportedPageSize(self.page_size));
        }
        if self.virtual_space_mb == 0 {
            return Err(ConfigError::ZeroSize("virtual address space size"));
        }
        if self.physical_memory_mb == 0 {
            return Err(ConfigError::ZeroSize("physical memory size"));
        }
        if !(MIN_PACING_MS..=MAX_PACING_MS).contains(&self.step_pacing_ms) {
            return Err(ConfigError::PacingOutOfRange(self.step_pacing_ms));
        }
        if self.total_steps == 0 {
            return Err(ConfigError::ZeroSize("total steps"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroSize("batch size"));
        }
        if self.tlb_capacity == 0 {
            return Err(ConfigError::ZeroSize("tlb capacity"));
        }
        if self.locality_window == 0 {
            return Err(ConfigError::ZeroSize("locality window"));
        }
        if self.locality_phase_steps == 0 {
            return Err(ConfigError::ZeroSize("locality phase steps"));
        }
        if !(0.0..=1.0).contains(&self.write_ratio) {
            return Err(ConfigError::InvalidParameter {
                field: "write_ratio",
                reason: format!("{} is not a probability", self.write_ratio),
            });
        }
        Ok(Layout::derive(
            self.virtual_space_mb,
            self.physical_memory_mb,
            self.page_size,
            self.tlb_capacity,
        ))
    }
}
