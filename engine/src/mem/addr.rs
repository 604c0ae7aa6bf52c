use serde::Serialize;

use super::{MAX_PHYSICAL_FRAMES, MAX_VIRTUAL_PAGES, MIB};

pub type VirtAddr = u64;
pub type PhysAddr = u64;
pub type Vpn = usize;
pub type Ppn = usize;

#[inline(always)]
pub const fn align_down(value: u64, page_size: u64) -> u64 {
    debug_assert!(page_size.is_power_of_two());
    value & !(page_size - 1)
}

#[inline(always)]
pub const fn vpn(addr: VirtAddr, page_size: u64) -> Vpn {
    (addr / page_size) as Vpn
}

#[inline(always)]
pub const fn page_base(ppn: Ppn, page_size: u64) -> PhysAddr {
    ppn as u64 * page_size
}

/// Number of whole pages of `page_size` in `size_mb` mebibytes, clamped to `[1, cap]`.
pub fn page_count(size_mb: u64, page_size: u64, cap: usize) -> usize {
    let pages = size_mb.saturating_mul(MIB) / page_size;
    (pages.min(cap as u64) as usize).max(1)
}

/// Sizes derived from a validated configuration. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub page_size: u64,
    pub num_virtual_pages: usize,
    pub num_physical_frames: usize,
    pub tlb_capacity: usize,
}

impl Layout {
    pub fn derive(virtual_mb: u64, physical_mb: u64, page_size: u64, tlb_capacity: usize) -> Self {
        Self {
            page_size,
            num_virtual_pages: page_count(virtual_mb, page_size, MAX_VIRTUAL_PAGES),
            num_physical_frames: page_count(physical_mb, page_size, MAX_PHYSICAL_FRAMES),
            tlb_capacity,
        }
    }

    /// Translates a virtual address given the frame backing its page.
    pub fn translate(&self, va: VirtAddr, ppn: Ppn) -> PhysAddr {
        page_base(ppn, self.page_size) + (va - align_down(va, self.page_size))
    }
}
