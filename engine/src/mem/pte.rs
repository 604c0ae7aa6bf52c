use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::addr::{Ppn, Vpn};

pub const PTE_V: PteFlags = 1 << 0; // Valid (present)
pub const PTE_R: PteFlags = 1 << 1; // Read
pub const PTE_W: PteFlags = 1 << 2; // Write
pub const PTE_U: PteFlags = 1 << 4; // User
pub const PTE_A: PteFlags = 1 << 6; // Accessed
pub const PTE_D: PteFlags = 1 << 7; // Dirty

pub type PteFlags = u8;

/// Flags every fresh entry starts with: mapped nowhere, user-accessible, read/write.
pub const PTE_DEFAULT: PteFlags = PTE_R | PTE_W | PTE_U;

/// One page-table entry. `PTE_V` is set exactly when `ppn` is `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    vpn: Vpn,
    ppn: Option<Ppn>,
    flags: PteFlags,
}

impl PageTableEntry {
    pub const fn new(vpn: Vpn) -> Self {
        Self { vpn, ppn: None, flags: PTE_DEFAULT }
    }

    #[inline(always)]
    pub const fn vpn(&self) -> Vpn {
        self.vpn
    }

    #[inline(always)]
    pub const fn ppn(&self) -> Option<Ppn> {
        self.ppn
    }

    #[inline(always)]
    pub const fn flags(&self) -> PteFlags {
        self.flags
    }

    #[inline(always)]
    pub const fn is_present(&self) -> bool {
        (self.flags & PTE_V) != 0
    }

    #[inline(always)]
    pub const fn is_writable(&self) -> bool {
        (self.flags & PTE_W) != 0
    }

    #[inline(always)]
    pub const fn is_user(&self) -> bool {
        (self.flags & PTE_U) != 0
    }

    #[inline(always)]
    pub const fn is_accessed(&self) -> bool {
        (self.flags & PTE_A) != 0
    }

    #[inline(always)]
    pub const fn is_dirty(&self) -> bool {
        (self.flags & PTE_D) != 0
    }

    /// Points the entry at `ppn` and marks it present. `flags` replace the
    /// permission/status bits; `PTE_V` is always added.
    pub fn set_mapping(&mut self, ppn: Ppn, flags: PteFlags) {
        self.ppn = Some(ppn);
        self.flags = flags | PTE_V;
    }

    /// Drops the mapping and the status bits, keeping permissions.
    pub fn clear_mapping(&mut self) -> Option<Ppn> {
        self.flags &= !(PTE_V | PTE_A | PTE_D);
        self.ppn.take()
    }

    pub fn set_flags(&mut self, flags: PteFlags) {
        // V is owned by set_mapping/clear_mapping
        self.flags |= flags & !PTE_V;
    }

    pub fn clear_flags(&mut self, flags: PteFlags) {
        self.flags &= !(flags & !PTE_V);
    }
}

impl Serialize for PageTableEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PageTableEntry", 7)?;
        s.serialize_field("vpn", &self.vpn)?;
        s.serialize_field("ppn", &self.ppn)?;
        s.serialize_field("present", &self.is_present())?;
        s.serialize_field("writable", &self.is_writable())?;
        s.serialize_field("user", &self.is_user())?;
        s.serialize_field("accessed", &self.is_accessed())?;
        s.serialize_field("dirty", &self.is_dirty())?;
        s.end()
    }
}
