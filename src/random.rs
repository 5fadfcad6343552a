//! Pseudo-random sources used by the generators.
//!
//! Everything that rolls dice takes a `&mut dyn RandomSource`, so tests (and the spine generator)
//! can inject a seeded, reproducible sequence. [`Mulberry32`] is the small 32-bit bit-mixing
//! generator the network was tuned with; for interactive use any `rand` generator works as well.

use rand::RngCore;
use rand::rngs::{StdRng, ThreadRng};

pub trait RandomSource: RngCore {
    /// Uniformly distributed in [0, 1), derived from a single 32-bit draw.
    fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    fn next_bool(&mut self) -> bool {
        self.next_f64() < 0.5
    }
}

impl RandomSource for StdRng {}
impl RandomSource for ThreadRng {}

/// Mulberry32: a 32-bit state, one add and two multiply-xorshift rounds per draw.
///
/// Not suitable for anything security related, but tiny, fast and bit-exact reproducible across
/// platforms, which is all the road generator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let low = self.next_u32() as u64;
        let high = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl RandomSource for Mulberry32 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mulberry32_reference_sequence() {
        // Reference values of the canonical implementation for seed 42.
        let mut random = Mulberry32::new(42);
        let expected = [0.6011037519201636, 0.44829055899754167, 0.8524657934904099];
        for value in expected {
            assert!((random.next_f64() - value).abs() < 1.0e-12);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Mulberry32::new(1337);
        let mut b = Mulberry32::new(1337);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn fill_bytes_handles_partial_chunks() {
        let mut a = Mulberry32::new(7);
        let mut b = Mulberry32::new(7);
        let mut bytes = [0u8; 6];
        a.fill_bytes(&mut bytes);
        assert_eq!(&bytes[..4], &b.next_u32().to_le_bytes());
        assert_eq!(&bytes[4..], &b.next_u32().to_le_bytes()[..2]);
    }
}
