use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Independent random streams derived from one seed, one per concern, so that
/// switching e.g. the mapping strategy does not shift the access sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Pattern = 1,
    Tlb = 2,
    Eviction = 3,
    Strategy = 4,
    AccessKind = 5,
}

pub fn stream(seed: u64, which: Stream) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(which as u64);
    rng
}
