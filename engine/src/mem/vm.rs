use tracing::trace;

use super::addr::{Ppn, Vpn};
use super::pte::{PageTableEntry, PteFlags};

/// Single-level page table: one entry per virtual page, indexed by vpn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    pub fn new(num_pages: usize) -> Self {
        Self { entries: (0..num_pages).map(PageTableEntry::new).collect() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PageTableEntry] {
        &self.entries
    }

    /// O(1) entry lookup. `None` only for a vpn outside the address space.
    pub fn walk(&mut self, vpn: Vpn) -> Option<&mut PageTableEntry> {
        self.entries.get_mut(vpn)
    }

    pub fn getpte(&self, vpn: Vpn) -> Option<&PageTableEntry> {
        self.entries.get(vpn)
    }

    /// Maps `vpn` to `ppn`. An entry already present may only be refreshed
    /// with the same frame; a different frame is a conflict and returns false.
    pub fn map(&mut self, vpn: Vpn, ppn: Ppn, flags: PteFlags) -> bool {
        let Some(pte) = self.walk(vpn) else {
            return false;
        };
        if pte.is_present() && pte.ppn() != Some(ppn) {
            return false;
        }
        pte.set_mapping(ppn, flags);
        true
    }

    /// Clears the mapping of `vpn` and returns the frame it pointed to.
    pub fn unmap(&mut self, vpn: Vpn) -> Option<Ppn> {
        let pte = self.walk(vpn)?;
        if !pte.is_present() {
            return None;
        }
        pte.clear_mapping()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_present()).count()
    }

    pub fn dump(&self) {
        trace!("page table: {} entries, {} present", self.entries.len(), self.present_count());
        for pte in self.entries.iter().filter(|e| e.is_present()) {
            trace!(
                ".. vpn {:4} -> ppn {:4?} flags = {:#04x}",
                pte.vpn(),
                pte.ppn(),
                pte.flags()
            );
        }
    }
}
