//! Translation lookaside buffer.
//!
//! A fully associative cache of VPN -> PPN translations with a fixed number of
//! slots. Slots are overwritten in place; the replacement policy decides which
//! one. Hit/miss accounting is done by the caller so that the cache itself stays
//! a plain lookup structure.

use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::addr::{Ppn, Vpn};
use super::replace::{Candidate, ReplacementPolicy, pick_victim};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TlbEntry {
    pub vpn: Vpn,
    pub ppn: Ppn,
    pub valid: bool,
    #[serde(skip)]
    loaded_at: u64,
    #[serde(skip)]
    last_used: u64,
}

pub struct Tlb {
    entries: Vec<TlbEntry>,
    policy: ReplacementPolicy,
    rng: ChaCha8Rng,
}

impl Tlb {
    pub fn new(capacity: usize, policy: ReplacementPolicy, rng: ChaCha8Rng) -> Self {
        Self { entries: vec![TlbEntry::default(); capacity], policy, rng }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    /// Scans every slot for a valid translation of `vpn`.
    pub fn lookup(&mut self, vpn: Vpn, clock: u64) -> Option<Ppn> {
        let entry = self.entries.iter_mut().find(|e| e.valid && e.vpn == vpn)?;
        entry.last_used = clock;
        Some(entry.ppn)
    }

    /// Installs `vpn -> ppn` and returns the slot used. A slot already holding
    /// `vpn` is refreshed in place.
    pub fn insert(&mut self, vpn: Vpn, ppn: Ppn, clock: u64) -> usize {
        let slot = match self.entries.iter().position(|e| e.valid && e.vpn == vpn) {
            Some(slot) => slot,
            None => self.pick_slot(),
        };
        self.entries[slot] = TlbEntry { vpn, ppn, valid: true, loaded_at: clock, last_used: clock };
        slot
    }

    /// Drops every translation of `vpn`. Returns how many slots were cleared.
    pub fn invalidate(&mut self, vpn: Vpn) -> usize {
        let mut cleared = 0;
        for entry in self.entries.iter_mut().filter(|e| e.valid && e.vpn == vpn) {
            entry.valid = false;
            cleared += 1;
        }
        cleared
    }

    pub fn flush(&mut self) {
        self.entries.fill(TlbEntry::default());
    }

    fn pick_slot(&mut self) -> usize {
        if self.policy != ReplacementPolicy::Random {
            if let Some(free) = self.entries.iter().position(|e| !e.valid) {
                return free;
            }
        }
        let candidates = self.entries.iter().enumerate().map(|(index, e)| Candidate {
            index,
            loaded_at: e.loaded_at,
            last_used: e.last_used,
        });
        // capacity is validated non-zero, so a candidate always exists
        pick_victim(self.policy, candidates, &mut self.rng).unwrap_or(0)
    }
}
