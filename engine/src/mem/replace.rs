use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Victim selection for both the TLB and the frame pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    /// Uniformly random among the candidates.
    #[default]
    Random,
    /// Oldest load first.
    Fifo,
    /// Least recently used first.
    Lru,
}

impl ReplacementPolicy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Fifo => "fifo",
            Self::Lru => "lru",
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "fifo" => Ok(Self::Fifo),
            "lru" => Ok(Self::Lru),
            _ => Err(ConfigError::UnknownVariant { kind: "replacement policy", value: s.into() }),
        }
    }
}

/// A slot that may be replaced, with the logical timestamps FIFO/LRU order on.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub index: usize,
    pub loaded_at: u64,
    pub last_used: u64,
}

/// Picks one candidate according to `policy`. Ties go to the lowest index.
pub fn pick_victim<R, I>(policy: ReplacementPolicy, candidates: I, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = Candidate>,
{
    let candidates = candidates.into_iter();
    match policy {
        ReplacementPolicy::Random => {
            let all: Vec<usize> = candidates.map(|c| c.index).collect();
            if all.is_empty() {
                return None;
            }
            Some(all[rng.gen_range(0..all.len())])
        }
        ReplacementPolicy::Fifo => {
            candidates.min_by_key(|c| (c.loaded_at, c.index)).map(|c| c.index)
        }
        ReplacementPolicy::Lru => {
            candidates.min_by_key(|c| (c.last_used, c.index)).map(|c| c.index)
        }
    }
}
