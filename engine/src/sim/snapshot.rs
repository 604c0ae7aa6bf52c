//! Read-only views handed to the presentation layer.
//!
//! Previews are capped by [`PreviewLimits`] so rendering cost stays bounded no
//! matter how large the simulated address space is. The caps only affect what is
//! copied out; the model itself is never truncated.

use serde::{Deserialize, Serialize};

use crate::mem::addr::Layout;
use crate::mem::page::VirtualPage;
use crate::mem::pmem::PhysicalFrame;
use crate::mem::pte::PageTableEntry;
use crate::mem::space::AddressSpace;
use crate::mem::tlb::TlbEntry;
use crate::metrics::{Metrics, Utilization};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewLimits {
    pub pages: usize,
    pub frames: usize,
    pub tlb: usize,
    pub page_table: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self { pages: 100, frames: 100, tlb: 64, page_table: 100 }
    }
}

/// Completed steps out of the run's budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress {
    pub step: usize,
    pub total_steps: usize,
    /// `step / total_steps` scaled to `[0, 100]`.
    pub percent: f64,
}

impl Progress {
    pub fn new(step: usize, total_steps: usize) -> Self {
        let percent = if total_steps == 0 {
            0.0
        } else {
            (step.min(total_steps) as f64 / total_steps as f64) * 100.0
        };
        Self { step, total_steps, percent }
    }

    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && self.step >= self.total_steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub layout: Layout,
    pub progress: Progress,
    pub metrics: Metrics,
    pub utilization: Utilization,
    pub pages: Vec<VirtualPage>,
    pub frames: Vec<PhysicalFrame>,
    pub tlb: Vec<TlbEntry>,
    pub page_table: Vec<PageTableEntry>,
}

impl SimSnapshot {
    pub fn capture(
        space: &AddressSpace,
        metrics: Metrics,
        progress: Progress,
        limits: &PreviewLimits,
    ) -> Self {
        Self {
            layout: *space.layout(),
            progress,
            metrics,
            utilization: space.utilization(),
            pages: preview(space.pages(), limits.pages),
            frames: preview(space.frames().frames(), limits.frames),
            tlb: preview(space.tlb().entries(), limits.tlb),
            page_table: preview(space.table().entries(), limits.page_table),
        }
    }
}

fn preview<T: Clone>(items: &[T], cap: usize) -> Vec<T> {
    items[..items.len().min(cap)].to_vec()
}
