//! Synthetic access streams.
//!
//! Each step the generator yields one batch of virtual page numbers. The
//! sequential stream depends only on the step index; the random and localized
//! streams draw from the generator's own seeded source.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mem::addr::Vpn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPattern {
    /// Consecutive pages, wrapping at the end of the address space.
    #[default]
    Sequential,
    /// Uniform over the whole address space.
    Random,
    /// Uniform inside a window that moves between phases.
    Localized,
}

impl AccessPattern {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Localized => "localized",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            "localized" => Ok(Self::Localized),
            _ => Err(ConfigError::UnknownVariant { kind: "access pattern", value: s.into() }),
        }
    }
}

/// Yields exactly `total_steps` batches of `batch_size` vpns in `[0, num_pages)`.
pub struct AccessPatternGenerator {
    pattern: AccessPattern,
    num_pages: usize,
    batch_size: usize,
    total_steps: usize,
    window: usize,
    phase_steps: usize,
    window_start: usize,
    step: usize,
    rng: ChaCha8Rng,
}

impl AccessPatternGenerator {
    pub fn new(
        pattern: AccessPattern,
        num_pages: usize,
        batch_size: usize,
        total_steps: usize,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            pattern,
            num_pages,
            batch_size,
            total_steps,
            window: crate::config::DEFAULT_LOCALITY_WINDOW,
            phase_steps: 1,
            window_start: 0,
            step: 0,
            rng,
        }
    }

    /// Sets the localized window width and how many steps each window lasts.
    #[must_use]
    pub fn with_locality(mut self, window: usize, phase_steps: usize) -> Self {
        self.window = window.max(1);
        self.phase_steps = phase_steps.max(1);
        self
    }

    pub fn pattern(&self) -> AccessPattern {
        self.pattern
    }

    /// Index of the next batch to be produced.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn remaining(&self) -> usize {
        self.total_steps - self.step
    }

    /// Current localized window as `start..end`. Meaningless for other patterns.
    pub fn window(&self) -> std::ops::Range<Vpn> {
        let width = self.window.min(self.num_pages);
        self.window_start..self.window_start + width
    }

    fn batch(&mut self, step: usize) -> Vec<Vpn> {
        let n = self.num_pages;
        match self.pattern {
            AccessPattern::Sequential => {
                (0..self.batch_size).map(|j| sequential_vpn(step, self.batch_size, j, n)).collect()
            }
            AccessPattern::Random => (0..self.batch_size).map(|_| self.rng.gen_range(0..n)).collect(),
            AccessPattern::Localized => {
                if step % self.phase_steps == 0 {
                    self.window_start = self.draw_window_start();
                }
                let range = self.window();
                (0..self.batch_size).map(|_| self.rng.gen_range(range.clone())).collect()
            }
        }
    }

    fn draw_window_start(&mut self) -> Vpn {
        // the whole space is one window when it is not wider than the window
        if self.num_pages <= self.window {
            0
        } else {
            self.rng.gen_range(0..self.num_pages - self.window)
        }
    }
}

/// `(step * batch_size + offset) mod num_pages`, reduced before multiplying so
/// large step budgets cannot overflow.
pub(crate) fn sequential_vpn(step: usize, batch_size: usize, offset: usize, num_pages: usize) -> Vpn {
    let base = (step % num_pages) * (batch_size % num_pages) % num_pages;
    (base + offset % num_pages) % num_pages
}

impl Iterator for AccessPatternGenerator {
    type Item = Vec<Vpn>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.total_steps {
            return None;
        }
        let batch = self.batch(self.step);
        self.step += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for AccessPatternGenerator {}
