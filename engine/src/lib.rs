//! Stepped simulation of virtual-to-physical address translation.
//!
//! The engine models a virtual address space, a TLB, a single-level page table
//! and a physical frame pool, and drives them with a synthetic access stream:
//!
//! ```text
//! pattern batch -> TLB -> page table -> frame pool (fault / evict) -> strategy -> metrics
//! ```
//!
//! [`Machine`] is the synchronous core. [`SimulationController`] wraps it with
//! pacing, cancellation and progress publication for an interactive front end.
//! All randomness is drawn from streams seeded by [`SimConfig::seed`].

pub mod config;
pub mod error;
pub mod mem;
pub mod metrics;
pub mod pattern;
pub mod rng;
pub mod sim;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use config::SimConfig;
pub use error::{ConfigError, InvariantViolation, SimError};
pub use mem::addr::{Layout, Ppn, Vpn};
pub use mem::replace::ReplacementPolicy;
pub use mem::space::{AccessKind, AccessOutcome, AddressSpace};
pub use metrics::{Metrics, Utilization};
pub use pattern::{AccessPattern, AccessPatternGenerator};
pub use sim::{
    CancelToken, Machine, PreviewLimits, Progress, RunOutcome, SimSnapshot, SimulationController,
    StepReport,
};
pub use strategy::{MappingStrategy, Prefetcher};
