use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;
use crate::config::SimulationConfig;
use crate::PageId;

/// A source of uniform variates in `[0, 1)`
///
/// Passed explicitly to everything which needs randomness, so tests can substitute a fixed
/// sequence and parallel workers can each own an independent stream
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

/// The default source, a seedable ChaCha8 generator
pub struct SeededSource {
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    /// A generator sharing `seed` with others but producing an independent stream of variates
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// Seeds from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl UniformSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Draws an integer from a normal distribution using the Box-Muller transform
///
/// The first variate is re-drawn until it is non-zero, so the logarithm is always defined. The
/// result is truncated toward zero, not rounded to nearest
///
/// # Arguments
///
/// * `source`: Uniform variates, two are consumed per call plus one per retry
/// * `mean`: The mean of the distribution
/// * `std_dev`: The standard deviation of the distribution
///
/// returns: i64
///
/// # Examples
///
/// ```
/// use faultlib::trace::{normal_sample, UniformSource};
/// struct Fixed(Vec<f64>);
/// impl UniformSource for Fixed {
///     fn next_unit(&mut self) -> f64 { self.0.remove(0) }
/// }
/// // sqrt(-2 ln 0.5) * cos(0) * 2 + 10 = 12.35...
/// assert_eq!(normal_sample(&mut Fixed(vec![0.5, 0.0]), 10.0, 2.0), 12);
/// ```
pub fn normal_sample<U: UniformSource + ?Sized>(source: &mut U, mean: f64, std_dev: f64) -> i64 {
    let mut u1 = source.next_unit();
    while u1 == 0.0 {
        u1 = source.next_unit();
    }
    let u2 = source.next_unit();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev + mean) as i64
}

/// Generates synthetic reference traces made of contiguous regions, each centred on its own hot
/// spot
///
/// Reference `j` of a trace of length `T` with `R` regions is
/// `stride * (j / (T / R)) + normal_sample(mean, std_dev)`, with truncating division
#[derive(Debug, Clone)]
pub struct TraceGenerator {
    length: usize,
    regions: usize,
    region_stride: i64,
    mean: f64,
    std_dev: f64,
}

impl TraceGenerator {
    /// # Panics
    ///
    /// If `length` is smaller than `regions`, as regions would be empty
    pub fn new(length: usize, regions: usize, region_stride: i64, mean: f64, std_dev: f64) -> Self {
        assert!(regions > 0 && length >= regions, "each region needs at least one reference");
        Self {
            length,
            regions,
            region_stride,
            mean,
            std_dev,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.trace_length, config.regions, config.region_stride, config.mean, config.std_dev)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generates one new trace
    pub fn generate<U: UniformSource + ?Sized>(&self, source: &mut U) -> Vec<PageId> {
        let mut trace = Vec::with_capacity(self.length);
        self.fill(source, &mut trace);
        trace
    }

    /// Overwrites `trace` with a new trace, reusing its allocation
    pub fn fill<U: UniformSource + ?Sized>(&self, source: &mut U, trace: &mut Vec<PageId>) {
        trace.clear();
        let region_length = self.length / self.regions;
        for j in 0..self.length {
            let region = (j / region_length) as i64;
            trace.push(self.region_stride * region + normal_sample(source, self.mean, self.std_dev));
        }
    }
}
