//! The simulated address space: virtual pages, page table, frame pool and TLB,
//! plus the per-access translation and fault path that ties them together.

use tracing::trace;

use super::addr::{Layout, PhysAddr, Ppn, VirtAddr, Vpn, vpn as vpn_of};
use super::page::{VirtualPage, materialize};
use super::pmem::FrameAllocator;
use super::pte::{PTE_A, PTE_D, PTE_DEFAULT};
use super::replace::ReplacementPolicy;
use super::tlb::Tlb;
use super::vm::PageTable;
use super::{FAULT_CYCLES, TLB_HIT_CYCLES, WALK_CYCLES};
use crate::error::InvariantViolation;
use crate::metrics::{Metrics, Utilization};
use crate::rng::{Stream, stream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Which path an access took through the translation hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    TlbHit { ppn: Ppn },
    TableHit { ppn: Ppn },
    Fault { ppn: Ppn, evicted: Option<Vpn> },
}

impl AccessOutcome {
    pub const fn ppn(&self) -> Ppn {
        match *self {
            Self::TlbHit { ppn } | Self::TableHit { ppn } | Self::Fault { ppn, .. } => ppn,
        }
    }

    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    pub const fn cycles(&self) -> u64 {
        match self {
            Self::TlbHit { .. } => TLB_HIT_CYCLES,
            Self::TableHit { .. } => WALK_CYCLES,
            Self::Fault { .. } => WALK_CYCLES + FAULT_CYCLES,
        }
    }
}

pub struct AddressSpace {
    layout: Layout,
    pages: Vec<VirtualPage>,
    table: PageTable,
    frames: FrameAllocator,
    tlb: Tlb,
}

impl AddressSpace {
    /// Materializes a fresh space: nothing present, nothing allocated, TLB empty.
    pub fn new(
        layout: Layout,
        eviction: ReplacementPolicy,
        tlb_replacement: ReplacementPolicy,
        seed: u64,
    ) -> Self {
        Self {
            layout,
            pages: materialize(layout.num_virtual_pages),
            table: PageTable::new(layout.num_virtual_pages),
            frames: FrameAllocator::new(
                layout.num_physical_frames,
                eviction,
                stream(seed, Stream::Eviction),
            ),
            tlb: Tlb::new(layout.tlb_capacity, tlb_replacement, stream(seed, Stream::Tlb)),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[VirtualPage] {
        &self.pages
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    pub fn frames(&self) -> &FrameAllocator {
        &self.frames
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn is_present(&self, vpn: Vpn) -> bool {
        self.table.getpte(vpn).is_some_and(|pte| pte.is_present())
    }

    pub fn has_free_frame(&self) -> bool {
        self.frames.has_free()
    }

    /// Resolves one access. Returns `None` for a vpn outside the address space,
    /// in which case nothing is touched.
    pub fn access(
        &mut self,
        vpn: Vpn,
        kind: AccessKind,
        clock: u64,
        metrics: &mut Metrics,
    ) -> Option<AccessOutcome> {
        if vpn >= self.pages.len() {
            return None;
        }
        let write = kind == AccessKind::Write;
        metrics.accesses += 1;
        self.pages[vpn].touch(write);

        if let Some(ppn) = self.tlb.lookup(vpn, clock) {
            metrics.tlb_hits += 1;
            metrics.memory_access_time += TLB_HIT_CYCLES;
            self.frames.touch(ppn, write, clock);
            if write {
                if let Some(pte) = self.table.walk(vpn) {
                    pte.set_flags(PTE_D);
                }
            }
            return Some(AccessOutcome::TlbHit { ppn });
        }

        metrics.tlb_misses += 1;
        metrics.page_table_walks += 1;
        metrics.memory_access_time += WALK_CYCLES;
        let pte = self.table.walk(vpn)?;
        pte.set_flags(PTE_A);
        if let Some(ppn) = pte.ppn().filter(|_| pte.is_present()) {
            if write {
                pte.set_flags(PTE_D);
            }
            self.frames.touch(ppn, write, clock);
            self.tlb.insert(vpn, ppn, clock);
            return Some(AccessOutcome::TableHit { ppn });
        }

        metrics.page_faults += 1;
        metrics.memory_access_time += FAULT_CYCLES;
        let (ppn, evicted) = match self.frames.allocate() {
            Some(ppn) => (ppn, None),
            None => {
                // an empty frame pool cannot back anything
                let (ppn, victim) = self.evict(metrics)?;
                (ppn, Some(victim))
            }
        };
        self.frames.bind(ppn, vpn, true, clock);
        self.frames.touch(ppn, write, clock);
        let flags = PTE_DEFAULT | PTE_A | if write { PTE_D } else { 0 };
        let mapped = self.table.map(vpn, ppn, flags);
        debug_assert!(mapped, "fault path: vpn {vpn} already mapped");
        self.pages[vpn].present = true;
        self.tlb.insert(vpn, ppn, clock);
        trace!(vpn, ppn, ?evicted, "page fault resolved");
        Some(AccessOutcome::Fault { ppn, evicted })
    }

    /// Loads `vpn` into a free frame without going through the fault path.
    /// Never evicts; returns false when the page is present or no frame is free.
    pub fn load_speculative(&mut self, vpn: Vpn, clock: u64) -> bool {
        if vpn >= self.pages.len() || self.is_present(vpn) {
            return false;
        }
        let Some(ppn) = self.frames.allocate() else {
            return false;
        };
        self.frames.bind(ppn, vpn, false, clock);
        self.table.map(vpn, ppn, PTE_DEFAULT);
        self.pages[vpn].present = true;
        trace!(vpn, ppn, "speculative load");
        true
    }

    /// Frees a frame by evicting its page. The frame stays allocated for the
    /// caller to rebind.
    fn evict(&mut self, metrics: &mut Metrics) -> Option<(Ppn, Vpn)> {
        let ppn = self.frames.choose_victim()?;
        let (victim, dirty) = self.frames.unbind(ppn)?;
        self.table.unmap(victim);
        let page = &mut self.pages[victim];
        page.present = false;
        page.dirty = false;
        let stale = self.tlb.invalidate(victim);
        metrics.evictions += 1;
        if dirty {
            metrics.writebacks += 1;
        }
        trace!(victim, ppn, dirty, stale, "evicted");
        Some((ppn, victim))
    }

    /// Side-effect free translation of a virtual address.
    pub fn translate(&self, va: VirtAddr) -> Option<PhysAddr> {
        let pte = self.table.getpte(vpn_of(va, self.layout.page_size))?;
        let ppn = pte.ppn().filter(|_| pte.is_present())?;
        Some(self.layout.translate(va, ppn))
    }

    pub fn utilization(&self) -> Utilization {
        Utilization::from_counts(
            self.table.present_count(),
            self.table.len(),
            self.frames.allocated_count(),
            self.frames.info().total,
            self.tlb.valid_count(),
            self.tlb.capacity(),
        )
    }

    /// Cross-checks the page table, frame pool, page records and TLB.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let allocated = self.frames.allocated_count();
        let present = self.table.present_count();
        if allocated != present {
            return Err(InvariantViolation::FrameCountMismatch { allocated, present });
        }
        for (pte, page) in self.table.entries().iter().zip(&self.pages) {
            let vpn = pte.vpn();
            if pte.is_present() != page.present {
                return Err(InvariantViolation::PagePresenceMismatch { vpn });
            }
            if !pte.is_present() {
                continue;
            }
            let Some(ppn) = pte.ppn() else {
                return Err(InvariantViolation::PresentWithoutFrame { vpn });
            };
            let bound = self.frames.frame(ppn).and_then(|f| f.bound_vpn);
            if bound != Some(vpn) {
                return Err(InvariantViolation::DanglingMapping { vpn, ppn, bound });
            }
        }
        for (slot, entry) in self.tlb.entries().iter().enumerate().filter(|(_, e)| e.valid) {
            let current = self.table.getpte(entry.vpn).and_then(|pte| pte.ppn());
            if current != Some(entry.ppn) {
                return Err(InvariantViolation::StaleTranslation {
                    slot,
                    vpn: entry.vpn,
                    ppn: entry.ppn,
                    current,
                });
            }
        }
        Ok(())
    }
}
