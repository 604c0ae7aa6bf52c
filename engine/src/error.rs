//! Error types for configuration, run control and state diagnostics.

use thiserror::Error;

use crate::mem::addr::{Ppn, Vpn};

/// A configuration was rejected. Raised before any simulation state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported page size {0} bytes (expected 4096, 2097152 or 1073741824)")]
    UnsupportedPageSize(u64),

    #[error("{0} must be greater than zero")]
    ZeroSize(&'static str),

    #[error("step pacing {0} ms is outside [50, 1000]")]
    PacingOutOfRange(u64),

    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Errors surfaced by the simulation controller.
#[derive(Debug, Error)]
pub enum SimError {
    /// `run()` was called while another run was still in flight.
    #[error("simulation is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A broken cross-structure invariant, reported by `Machine::check_invariants`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{allocated} frames allocated but {present} page-table entries present")]
    FrameCountMismatch { allocated: usize, present: usize },

    #[error("vpn {vpn} is present but frame {ppn} is bound to {bound:?}")]
    DanglingMapping { vpn: Vpn, ppn: Ppn, bound: Option<Vpn> },

    #[error("vpn {vpn} is present without a frame")]
    PresentWithoutFrame { vpn: Vpn },

    #[error("virtual page {vpn} presence disagrees with its page-table entry")]
    PagePresenceMismatch { vpn: Vpn },

    #[error("tlb slot {slot} maps vpn {vpn} -> ppn {ppn} but the page table says {current:?}")]
    StaleTranslation { slot: usize, vpn: Vpn, ppn: Ppn, current: Option<Ppn> },
}
