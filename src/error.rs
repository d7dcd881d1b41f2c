//! Error types for path construction, model setup and simulation

use crate::path::Time;
use thiserror::Error;

/// Errors raised by the simulation engine.
///
/// Configuration variants are detected when paths, dynamics, contracts or
/// pricers are built. Domain variants indicate a lookup outside a path grid,
/// which means the outer and inner grids were not aligned.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Step size is zero or negative.
    #[error("invalid step size {dt}: must be positive")]
    InvalidStep { dt: Time },

    /// Horizon minus start is not an exact multiple of the step size.
    #[error("grid misaligned: horizon {horizon} - start {start} is not a multiple of step {dt}")]
    GridMisaligned { dt: Time, horizon: Time, start: Time },

    /// Two grids that must nest inside each other do not.
    #[error("incompatible grids: {0}")]
    IncompatibleGrids(String),

    /// Inner Monte Carlo asked to average over zero scenarios.
    #[error("inner Monte Carlo sample count must be positive")]
    ZeroSamples,

    /// Model name not in the known family table.
    #[error("unknown model family '{0}'")]
    UnknownModel(String),

    /// Parameter vector length does not match the model family.
    #[error("model {model} expects {expected} parameters, got {actual}")]
    ParameterCount {
        model: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Parameter value outside its admissible range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Contract terms that cannot produce a valid state path.
    #[error("invalid contract terms: {0}")]
    InvalidContract(String),

    /// Time is inside the path range but not on its grid.
    #[error("time {t} is not a grid point of path [{start}, {horizon}] with step {dt}")]
    OffGrid {
        t: Time,
        dt: Time,
        start: Time,
        horizon: Time,
    },

    /// Time lies outside the path range.
    #[error("time {t} outside path range [{start}, {horizon}]")]
    OutOfRange { t: Time, start: Time, horizon: Time },

    /// Integer index past the end of a path.
    #[error("index {index} out of bounds for path of {len} points")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Nested valuation failed at a rebalancing date.
    #[error("valuation at t={t} failed: {source}")]
    Valuation {
        t: Time,
        #[source]
        source: Box<SimulationError>,
    },

    /// One outer scenario of a batch failed.
    #[error("scenario {index} (seed {seed}) failed: {source}")]
    Scenario {
        index: usize,
        seed: u64,
        #[source]
        source: Box<SimulationError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SimulationError {
    /// Wrap an error with the valuation date it occurred at
    pub fn at_valuation(self, t: Time) -> Self {
        SimulationError::Valuation {
            t,
            source: Box::new(self),
        }
    }

    /// Wrap an error with the outer scenario it occurred in
    pub fn in_scenario(self, index: usize, seed: u64) -> Self {
        SimulationError::Scenario {
            index,
            seed,
            source: Box::new(self),
        }
    }

    /// True for errors that can only come from bad run configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidStep { .. }
                | SimulationError::GridMisaligned { .. }
                | SimulationError::IncompatibleGrids(_)
                | SimulationError::ZeroSamples
                | SimulationError::UnknownModel(_)
                | SimulationError::ParameterCount { .. }
                | SimulationError::InvalidParameter { .. }
                | SimulationError::InvalidContract(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Ratio;

    #[test]
    fn test_error_messages_name_context() {
        let err = SimulationError::GridMisaligned {
            dt: Ratio::new(1, 3),
            horizon: Ratio::from_integer(1),
            start: Ratio::new(1, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("1/3"));
        assert!(msg.contains("1/2"));

        let wrapped = SimulationError::ZeroSamples
            .at_valuation(Ratio::new(5, 2))
            .in_scenario(3, 45);
        let msg = wrapped.to_string();
        assert!(msg.contains("scenario 3"));
        assert!(msg.contains("seed 45"));
        assert!(msg.contains("t=5/2"));
    }

    #[test]
    fn test_configuration_classification() {
        assert!(SimulationError::ZeroSamples.is_configuration());
        assert!(SimulationError::UnknownModel("Heston".into()).is_configuration());
        let domain = SimulationError::IndexOutOfBounds { index: 4, len: 3 };
        assert!(!domain.is_configuration());
    }
}
