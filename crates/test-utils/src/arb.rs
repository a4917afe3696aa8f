use arbitrary::{Arbitrary, Unstructured};
use rand::{rngs::StdRng, SeedableRng};
use rand_core::{CryptoRngCore, OsRng, RngCore};

/// Bytes of entropy handed to [`Arbitrary`] per attempt.
const ENTROPY_LEN: usize = 16_384;

/// Attempts before giving up on a type that keeps rejecting the generated entropy.
const MAX_ATTEMPTS: usize = 16;

/// Produces random values of any [`Arbitrary`] type, reusing one entropy buffer.
#[derive(Debug)]
pub struct ArbitraryGenerator {
    buf: Vec<u8>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self::with_entropy_len(ENTROPY_LEN)
    }

    pub fn with_entropy_len(len: usize) -> Self {
        Self { buf: vec![0; len] }
    }

    /// Generates a value from OS randomness.
    pub fn generate<T>(&mut self) -> T
    where
        T: for<'a> Arbitrary<'a>,
    {
        self.generate_with_rng(&mut OsRng)
    }

    /// Generates a value reproducibly from `seed`.
    pub fn generate_seeded<T>(&mut self, seed: u64) -> T
    where
        T: for<'a> Arbitrary<'a>,
    {
        self.fill_and_build(&mut StdRng::seed_from_u64(seed))
    }

    pub fn generate_with_rng<T, R>(&mut self, rng: &mut R) -> T
    where
        T: for<'a> Arbitrary<'a>,
        R: CryptoRngCore,
    {
        self.fill_and_build(rng)
    }

    fn fill_and_build<T, R>(&mut self, rng: &mut R) -> T
    where
        T: for<'a> Arbitrary<'a>,
        R: RngCore + ?Sized,
    {
        let mut last_err = None;
        for _ in 0..MAX_ATTEMPTS {
            rng.fill_bytes(&mut self.buf);
            match T::arbitrary(&mut Unstructured::new(&self.buf)) {
                Ok(value) => return value,
                Err(err) => last_err = Some(err),
            }
        }
        match last_err {
            Some(err) => panic!("arbitrary generation failed after {MAX_ATTEMPTS} attempts: {err}"),
            None => panic!("arbitrary generation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use arbor_primitives::{Buf32, NodeHash};

    use super::*;

    #[test]
    fn test_seeded_is_reproducible() {
        let mut gen = ArbitraryGenerator::new();
        let a: Buf32 = gen.generate_seeded(7);
        let b: Buf32 = gen.generate_seeded(7);
        let c: Buf32 = gen.generate_seeded(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_generate_varies() {
        let mut gen = ArbitraryGenerator::new();
        let a: NodeHash = gen.generate();
        let b: NodeHash = gen.generate();
        assert_ne!(a, b);
    }
}
