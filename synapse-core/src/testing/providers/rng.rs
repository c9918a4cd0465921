//! Random number generator provider for deterministic testing.
//!
//! Discovery in the engine is random on purpose. Tests inject a seeded or
//! fixed-sequence RNG to make it reproducible.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Provider trait for random number generation.
pub trait RngProvider: Send + Sync {
    /// Generate a random u64.
    fn next_u64(&self) -> u64;

    /// Generate a random f64 in the range [0, 1).
    fn next_f64(&self) -> f64;

    /// Fill a byte slice with random data.
    fn fill_bytes(&self, dest: &mut [u8]);

    /// Generate a random boolean with the given probability of being true.
    fn gen_bool(&self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Generate a random value in `[low, high)`. Returns `low` for an empty
    /// range.
    fn gen_range(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        low + (self.next_u64() % (high - low))
    }

    /// Generate a random index into a collection of `len` elements.
    fn gen_index(&self, len: usize) -> usize {
        self.gen_range(0, len as u64) as usize
    }

    /// Check if this is a mock provider.
    fn is_mock(&self) -> bool;
}

/// Real RNG seeded from the operating system's entropy source.
pub struct RealRng {
    rng: Mutex<StdRng>,
}

impl RealRng {
    /// Create a new real RNG.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for RealRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngProvider for RealRng {
    fn next_u64(&self) -> u64 {
        self.rng.lock().r#gen()
    }

    fn next_f64(&self) -> f64 {
        self.rng.lock().r#gen()
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        self.rng.lock().fill(dest);
    }

    fn is_mock(&self) -> bool {
        false
    }
}

enum MockSource {
    Seeded { rng: StdRng, seed: u64 },
    Fixed { values: Vec<u64>, position: usize },
}

/// Mock RNG for deterministic behavior.
///
/// # Example
///
/// ```
/// use synapse_core::testing::{MockRng, RngProvider};
///
/// let rng = MockRng::seeded(42);
/// let first = rng.next_u64();
///
/// // Same seed produces same sequence
/// let rng2 = MockRng::seeded(42);
/// assert_eq!(rng2.next_u64(), first);
///
/// // A fixed sequence repeats forever
/// let rng = MockRng::fixed(vec![0]);
/// assert_eq!(rng.gen_range(0, 6), 0);
/// assert_eq!(rng.gen_range(3, 6), 3);
/// ```
pub struct MockRng {
    source: Mutex<MockSource>,
}

impl MockRng {
    /// Create a new mock RNG with the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: Mutex::new(MockSource::Seeded {
                rng: StdRng::seed_from_u64(seed),
                seed,
            }),
        }
    }

    /// Create a mock RNG that cycles through a fixed sequence of values.
    ///
    /// An empty sequence behaves like `vec![0]`.
    pub fn fixed(values: Vec<u64>) -> Self {
        let values = if values.is_empty() { vec![0] } else { values };
        Self {
            source: Mutex::new(MockSource::Fixed {
                values,
                position: 0,
            }),
        }
    }

    /// Reset the RNG to its initial state.
    pub fn reset(&self) {
        match &mut *self.source.lock() {
            MockSource::Seeded { rng, seed } => *rng = StdRng::seed_from_u64(*seed),
            MockSource::Fixed { position, .. } => *position = 0,
        }
    }
}

impl RngProvider for MockRng {
    fn next_u64(&self) -> u64 {
        match &mut *self.source.lock() {
            MockSource::Seeded { rng, .. } => rng.r#gen(),
            MockSource::Fixed { values, position } => {
                let value = values[*position % values.len()];
                *position += 1;
                value
            }
        }
    }

    fn next_f64(&self) -> f64 {
        match &mut *self.source.lock() {
            MockSource::Seeded { rng, .. } => rng.r#gen(),
            MockSource::Fixed { values, position } => {
                let value = values[*position % values.len()];
                *position += 1;
                (value % 1_000) as f64 / 1_000.0
            }
        }
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_u64() as u8;
        }
    }

    fn is_mock(&self) -> bool {
        true
    }
}
