pub const PGSIZE_4K: u64 = 4096;
pub const PGSIZE_2M: u64 = 2 * 1024 * 1024;
pub const PGSIZE_1G: u64 = 1024 * 1024 * 1024;
pub const MIB: u64 = 1 << 20;

pub const MAX_VIRTUAL_PAGES: usize = 1024;
pub const MAX_PHYSICAL_FRAMES: usize = 4096;
pub const TLB_ENTRIES: usize = 64;

// cycle costs per access path
pub const TLB_HIT_CYCLES: u64 = 1;
pub const WALK_CYCLES: u64 = 10;
pub const FAULT_CYCLES: u64 = 1000;

pub mod addr;
pub mod page;
pub mod pmem;
pub mod pte;
pub mod replace;
pub mod space;
pub mod tlb;
pub mod vm;
