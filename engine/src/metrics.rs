//! Running counters and the ratios derived from them.

use serde::Serialize;

/// Counters for one run. Every field only grows until the next reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub page_faults: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    /// Simulated cost of every access so far, in cycles.
    pub memory_access_time: u64,
    pub page_table_walks: u64,
    pub accesses: u64,
    pub evictions: u64,
    pub prefetches: u64,
    pub writebacks: u64,
}

impl Metrics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of lookups served by the TLB, in `[0, 1]`.
    pub fn tlb_hit_rate(&self) -> f64 {
        ratio(self.tlb_hits, self.tlb_hits + self.tlb_misses)
    }

    pub fn average_access_cycles(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.memory_access_time as f64 / self.accesses as f64
        }
    }
}

/// Occupancy of the three structures, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Utilization {
    pub page_utilization: f64,
    pub frame_utilization: f64,
    pub tlb_utilization: f64,
}

impl Utilization {
    pub fn from_counts(
        present_pages: usize,
        total_pages: usize,
        allocated_frames: usize,
        total_frames: usize,
        valid_tlb: usize,
        tlb_capacity: usize,
    ) -> Self {
        Self {
            page_utilization: percent(present_pages, total_pages),
            frame_utilization: percent(allocated_frames, total_frames),
            tlb_utilization: percent(valid_tlb, tlb_capacity),
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

fn percent(part: usize, whole: usize) -> f64 {
    ratio(part as u64, whole as u64) * 100.0
}
