use crate::Generator;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use snip_core::shortcode::{ALPHABET, DEFAULT_LENGTH};
use snip_core::ShortCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("short code length must be at least 1")]
    ZeroLength,
}

/// Generates fixed-length codes from the 62-symbol alphabet.
///
/// Every character is sampled uniformly and independently from a
/// cryptographically secure RNG, so codes cannot be predicted from the ones
/// handed out before. The RNG is owned by the generator; build one at startup
/// and share it.
#[derive(Debug)]
pub struct RandomGenerator<R = StdRng> {
    rng: Mutex<R>,
    length: usize,
}

impl RandomGenerator<StdRng> {
    /// Creates a generator producing codes of `length` characters, seeded
    /// from the operating system.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        Self::with_rng(length, StdRng::from_os_rng())
    }
}

impl Default for RandomGenerator<StdRng> {
    fn default() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            length: DEFAULT_LENGTH,
        }
    }
}

impl<R: RngCore + CryptoRng + Send + 'static> RandomGenerator<R> {
    /// Creates a generator drawing from the given RNG.
    pub fn with_rng(length: usize, rng: R) -> Result<Self, GeneratorError> {
        if length == 0 {
            return Err(GeneratorError::ZeroLength);
        }
        Ok(Self {
            rng: Mutex::new(rng),
            length,
        })
    }

    /// Length of the codes this generator produces.
    pub fn length(&self) -> usize {
        self.length
    }

    fn next_code(&self) -> String {
        let mut rng = self.rng.lock();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

impl<R: RngCore + CryptoRng + Send + 'static> Generator for RandomGenerator<R> {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        ShortCode::new_unchecked(self.next_code())
    }
}
