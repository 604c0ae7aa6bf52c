use serde::Serialize;

use super::addr::Vpn;

/// Per-page bookkeeping as seen by the simulated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualPage {
    pub vpn: Vpn,
    pub present: bool,
    pub accessed: bool,
    pub dirty: bool,
    pub reference_count: u64,
}

impl VirtualPage {
    pub const fn new(vpn: Vpn) -> Self {
        Self { vpn, present: false, accessed: false, dirty: false, reference_count: 0 }
    }

    pub fn touch(&mut self, write: bool) {
        self.accessed = true;
        self.dirty |= write;
        self.reference_count += 1;
    }
}

pub fn materialize(num_pages: usize) -> Vec<VirtualPage> {
    (0..num_pages).map(VirtualPage::new).collect()
}
