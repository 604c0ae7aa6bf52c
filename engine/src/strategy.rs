//! Post-batch mapping strategies.
//!
//! After a batch has been resolved the strategy may load additional pages
//! speculatively. Speculative loads only ever use free frames: they never evict,
//! never touch the TLB and are not counted as faults.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mem::addr::Vpn;
use crate::mem::space::AddressSpace;
use crate::metrics::Metrics;
use crate::pattern::AccessPattern;

pub const PREFETCH_DISTANCE: usize = 3;
pub const PREFETCH_PROBABILITY: f64 = 0.3;
pub const STREAMING_DISTANCE: usize = 5;
pub const STREAMING_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStrategy {
    /// Load only what faults.
    #[default]
    Demand,
    /// Probabilistically load the few pages after each accessed page.
    Prefetch,
    /// Run ahead of a sequential stream.
    Streaming,
}

impl MappingStrategy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Demand => "demand",
            Self::Prefetch => "prefetch",
            Self::Streaming => "streaming",
        }
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MappingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "demand" => Ok(Self::Demand),
            "prefetch" => Ok(Self::Prefetch),
            "streaming" => Ok(Self::Streaming),
            _ => Err(ConfigError::UnknownVariant { kind: "mapping strategy", value: s.into() }),
        }
    }
}

/// Applies a [`MappingStrategy`] after every batch.
pub struct Prefetcher {
    strategy: MappingStrategy,
    pattern: AccessPattern,
    rng: ChaCha8Rng,
}

impl Prefetcher {
    pub fn new(strategy: MappingStrategy, pattern: AccessPattern, rng: ChaCha8Rng) -> Self {
        Self { strategy, pattern, rng }
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.strategy
    }

    /// Runs the strategy over the batch just resolved. Returns how many pages
    /// were loaded speculatively.
    pub fn after_batch(
        &mut self,
        batch: &[Vpn],
        space: &mut AddressSpace,
        metrics: &mut Metrics,
        clock: u64,
    ) -> usize {
        let n = space.num_pages();
        let mut loaded = 0;
        match self.strategy {
            MappingStrategy::Demand => {}
            MappingStrategy::Prefetch => {
                for &vpn in batch {
                    for offset in 1..=PREFETCH_DISTANCE {
                        let target = vpn + offset;
                        if target >= n {
                            break;
                        }
                        loaded += self.try_load(target, PREFETCH_PROBABILITY, space, clock);
                    }
                }
            }
            MappingStrategy::Streaming => {
                if self.pattern != AccessPattern::Sequential {
                    return 0;
                }
                let Some(&last) = batch.last() else {
                    return 0;
                };
                for offset in 1..=STREAMING_DISTANCE {
                    let target = (last + offset) % n;
                    loaded += self.try_load(target, STREAMING_PROBABILITY, space, clock);
                }
            }
        }
        metrics.prefetches += loaded as u64;
        loaded
    }

    fn try_load(&mut self, vpn: Vpn, probability: f64, space: &mut AddressSpace, clock: u64) -> usize {
        if space.is_present(vpn) || !space.has_free_frame() {
            return 0;
        }
        if !self.rng.gen_bool(probability) {
            return 0;
        }
        usize::from(space.load_speculative(vpn, clock))
    }
}
