//! Valuation models used to price the contract and size the hedge
//!
//! A pricing model is instantiated per valuation date and answers three
//! questions: the contract value, the prices of the hedge instruments and
//! the hedge deltas. At maturity the answers are closed form; before
//! maturity they are expectations over an inner risk-neutral Monte Carlo.

mod deltas;
mod instruments;
mod nested;
mod terminal;

pub use deltas::{fd_delta, FdBumps};
pub use instruments::{Deltas, Underlyings};
pub use nested::{NestedMcPricingModel, NestedPricingFactory};
pub use terminal::TerminalPricingModel;

use crate::error::{Result, SimulationError};
use crate::value_vector::ValueVector;
use std::ops::{AddAssign, Div};

/// Value, hedge instrument prices and deltas at one valuation date
pub trait PricingModel {
    fn value(&self) -> Result<ValueVector>;
    fn underlyings(&self) -> Result<Underlyings>;
    fn deltas(&self) -> Result<Deltas>;
}

/// Pricing model chosen for a valuation date
#[derive(Debug)]
pub enum ValuationModel<'a> {
    Terminal(TerminalPricingModel),
    Nested(NestedMcPricingModel<'a>),
}

impl PricingModel for ValuationModel<'_> {
    fn value(&self) -> Result<ValueVector> {
        match self {
            ValuationModel::Terminal(m) => m.value(),
            ValuationModel::Nested(m) => m.value(),
        }
    }

    fn underlyings(&self) -> Result<Underlyings> {
        match self {
            ValuationModel::Terminal(m) => m.underlyings(),
            ValuationModel::Nested(m) => m.underlyings(),
        }
    }

    fn deltas(&self) -> Result<Deltas> {
        match self {
            ValuationModel::Terminal(m) => m.deltas(),
            ValuationModel::Nested(m) => m.deltas(),
        }
    }
}

/// Sample mean of `evaluate` over `scenarios`
pub fn mc_expectation<S, T, F>(scenarios: &[S], mut evaluate: F) -> Result<T>
where
    T: AddAssign + Div<f64, Output = T>,
    F: FnMut(&S) -> Result<T>,
{
    let (first, rest) = scenarios.split_first().ok_or(SimulationError::ZeroSamples)?;
    let mut accumulator = evaluate(first)?;
    for scenario in rest {
        accumulator += evaluate(scenario)?;
    }
    Ok(accumulator / scenarios.len() as f64)
}
