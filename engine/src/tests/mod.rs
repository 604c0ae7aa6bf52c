mod config;
mod controller;
mod invariants;

use crate::config::SimConfig;
use crate::mem::PGSIZE_2M;
use crate::mem::addr::Layout;

/// 32 pages of 2 MiB backed by 4 frames: small enough to force eviction quickly.
pub(crate) fn small_config() -> SimConfig {
    SimConfig::default().with_sizes(64, 8, PGSIZE_2M).with_pacing_ms(50)
}

pub(crate) fn small_layout(pages: usize, frames: usize, tlb: usize) -> Layout {
    Layout { page_size: 4096, num_virtual_pages: pages, num_physical_frames: frames, tlb_capacity: tlb }
}
