use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::trace;

use super::addr::{Ppn, Vpn};
use super::replace::{Candidate, ReplacementPolicy, pick_victim};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhysicalFrame {
    pub ppn: Ppn,
    pub bound_vpn: Option<Vpn>,
    pub allocated: bool,
    pub accessed: bool,
    pub dirty: bool,
    #[serde(skip)]
    pub loaded_at: u64,
    #[serde(skip)]
    pub last_used: u64,
}

impl PhysicalFrame {
    const fn new(ppn: Ppn) -> Self {
        Self {
            ppn,
            bound_vpn: None,
            allocated: false,
            accessed: false,
            dirty: false,
            loaded_at: 0,
            last_used: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub total: usize,
    pub allocable: usize,
}

/// Owner of every physical frame. Free frames are kept on a stack so that the
/// lowest-numbered free frame is handed out first.
pub struct FrameAllocator {
    frames: Vec<PhysicalFrame>,
    free: Vec<Ppn>,
    policy: ReplacementPolicy,
    rng: ChaCha8Rng,
}

impl FrameAllocator {
    pub fn new(num_frames: usize, policy: ReplacementPolicy, rng: ChaCha8Rng) -> Self {
        let frames = (0..num_frames).map(PhysicalFrame::new).collect();
        let free = (0..num_frames).rev().collect();
        Self { frames, free, policy, rng }
    }

    pub fn frames(&self) -> &[PhysicalFrame] {
        &self.frames
    }

    pub fn frame(&self, ppn: Ppn) -> Option<&PhysicalFrame> {
        self.frames.get(ppn)
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo { total: self.frames.len(), allocable: self.free.len() }
    }

    pub fn allocated_count(&self) -> usize {
        self.frames.len() - self.free.len()
    }

    pub fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    /// Takes a free frame off the stack and marks it allocated, unbound.
    pub fn allocate(&mut self) -> Option<Ppn> {
        let ppn = self.free.pop()?;
        let frame = &mut self.frames[ppn];
        frame.allocated = true;
        frame.bound_vpn = None;
        frame.accessed = false;
        frame.dirty = false;
        Some(ppn)
    }

    /// Returns a frame to the pool. `false` for an unknown or already free frame.
    pub fn free(&mut self, ppn: Ppn) -> bool {
        let Some(frame) = self.frames.get_mut(ppn) else {
            return false;
        };
        if !frame.allocated {
            return false;
        }
        *frame = PhysicalFrame::new(ppn);
        // the stack stays sorted high-to-low so `pop` yields the lowest ppn
        let at = self.free.partition_point(|&free| free > ppn);
        self.free.insert(at, ppn);
        true
    }

    /// Binds an allocated frame to `vpn`, starting a fresh residency.
    pub fn bind(&mut self, ppn: Ppn, vpn: Vpn, accessed: bool, clock: u64) {
        let frame = &mut self.frames[ppn];
        debug_assert!(frame.allocated, "bind: frame {ppn} not allocated");
        frame.bound_vpn = Some(vpn);
        frame.accessed = accessed;
        frame.dirty = false;
        frame.loaded_at = clock;
        frame.last_used = clock;
    }

    /// Records a use of a resident frame.
    pub fn touch(&mut self, ppn: Ppn, write: bool, clock: u64) {
        if let Some(frame) = self.frames.get_mut(ppn) {
            frame.accessed = true;
            frame.dirty |= write;
            frame.last_used = clock;
        }
    }

    /// Chooses an allocated frame to evict. `None` only when nothing is allocated.
    pub fn choose_victim(&mut self) -> Option<Ppn> {
        let candidates = self.frames.iter().filter(|f| f.allocated).map(|f| Candidate {
            index: f.ppn,
            loaded_at: f.loaded_at,
            last_used: f.last_used,
        });
        let victim = pick_victim(self.policy, candidates, &mut self.rng)?;
        trace!(ppn = victim, policy = %self.policy, "victim frame chosen");
        Some(victim)
    }

    /// Detaches the page bound to `ppn` and returns it with the frame's dirty
    /// bit. The frame stays allocated so it can be rebound immediately.
    pub fn unbind(&mut self, ppn: Ppn) -> Option<(Vpn, bool)> {
        let frame = self.frames.get_mut(ppn)?;
        let vpn = frame.bound_vpn.take()?;
        let dirty = frame.dirty;
        frame.accessed = false;
        frame.dirty = false;
        Some((vpn, dirty))
    }
}
