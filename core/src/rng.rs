//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! All randomness flows through GenRng instances derived
//! from a single master seed held by the RngBank.
//!
//! Each (report, stream) pair gets its own RNG, seeded deterministically
//! from the master seed. This means:
//!   - Adding a new stream slot never changes existing streams.
//!   - Generating report N never depends on how many draws report N-1 made.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for one generation stream.
pub struct GenRng {
    inner: Pcg64Mcg,
}

impl GenRng {
    /// Create an RNG straight from a seed. Tests and one-off callers
    /// use this; report generation goes through the RngBank.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a float in [-1.0, 1.0).
    pub fn next_signed_unit(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an index in [0, len).
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_u64_below(len as u64) as usize
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fill 16 bytes, used to mint reproducible UUIDs.
    pub fn next_bytes_16(&mut self) -> [u8; 16] {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        bytes
    }
}

/// All generation RNGs for one session, indexed by report and slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// The RNG for one stream of one report. The same
    /// (seed, report_index, slot) always yields the same stream.
    pub fn for_stream(&self, report_index: u64, slot: StreamSlot) -> GenRng {
        let report_mix = report_index.wrapping_add(1).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        let slot_mix = (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        GenRng::seeded(self.master_seed ^ report_mix ^ slot_mix)
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Decomposition = 0,
    Schedule = 1,
    // Add new streams here, append only.
}
