//! Standard normal draws driving the asset dynamics

use crate::error::Result;
use crate::path::{Path, Time};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, StandardNormal};

/// Independent standard normal draws for one step.
///
/// `w1` drives the short rate and the correlated part of the equity shock,
/// `w2` the orthogonal equity component.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Variates {
    pub w1: f64,
    pub w2: f64,
}

/// Seeded source of standard normal numbers
#[derive(Debug, Clone)]
pub struct NormalSource {
    rng: ChaCha20Rng,
}

impl NormalSource {
    /// Stream 0 of the generator seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    /// Independent stream `stream` of the generator seeded with `seed`
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    pub fn next_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }
}

/// Fill a fresh variate path on `[start, horizon]` with step `dt`.
///
/// Every grid point receives a pair of draws, including the first one which
/// the dynamics never read.
pub fn make_variates(
    dt: Time,
    horizon: Time,
    start: Time,
    source: &mut NormalSource,
) -> Result<Path<Variates>> {
    let mut path: Path<Variates> = Path::new(dt, horizon, start)?;
    for v in path.values_mut() {
        v.w1 = source.next_normal();
        v.w2 = source.next_normal();
    }
    Ok(path)
}

/// Generator of independent variate paths over a fixed grid
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    dt: Time,
    horizon: Time,
    start: Time,
    source: NormalSource,
}

impl ScenarioGenerator {
    pub fn new(dt: Time, horizon: Time, start: Time, source: NormalSource) -> Self {
        Self {
            dt,
            horizon,
            start,
            source,
        }
    }

    pub fn next_scenario(&mut self) -> Result<Path<Variates>> {
        make_variates(self.dt, self.horizon, self.start, &mut self.source)
    }

    /// Draw `n` scenarios in sequence
    pub fn take(&mut self, n: usize) -> Result<Vec<Path<Variates>>> {
        (0..n).map(|_| self.next_scenario()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{time, years};

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = NormalSource::new(42);
        let mut b = NormalSource::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_normal().to_bits(), b.next_normal().to_bits());
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = NormalSource::with_stream(42, 1);
        let mut b = NormalSource::with_stream(42, 2);
        let xs: Vec<f64> = (0..10).map(|_| a.next_normal()).collect();
        let ys: Vec<f64> = (0..10).map(|_| b.next_normal()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_variates_cover_grid() {
        let mut source = NormalSource::new(7);
        let path = make_variates(time(1, 4), years(3), years(1), &mut source).unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.t0(), years(1));
        assert!(path.values().iter().all(|v| v.w1 != 0.0 && v.w2 != 0.0));
    }

    #[test]
    fn test_sample_moments() {
        let mut source = NormalSource::new(2024);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| source.next_normal()).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_generator_advances() {
        let mut generator = ScenarioGenerator::new(years(1), years(5), years(0), NormalSource::new(3));
        let scenarios = generator.take(2).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_ne!(scenarios[0], scenarios[1]);
    }
}
