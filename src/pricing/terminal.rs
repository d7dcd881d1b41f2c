//! Closed-form valuation at contract maturity

use super::{Deltas, PricingModel, Underlyings};
use crate::contract::ContractState;
use crate::error::Result;
use crate::market::AssetState;
use crate::value_vector::ValueVector;

/// Pricing model at maturity: no simulation, realized values only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalPricingModel {
    assets: AssetState,
    state: ContractState,
}

impl TerminalPricingModel {
    pub fn new(assets: AssetState, state: ContractState) -> Self {
        Self { assets, state }
    }
}

impl PricingModel for TerminalPricingModel {
    fn value(&self) -> Result<ValueVector> {
        Ok(ValueVector {
            v: self.state.liability,
            c: self.state.guarantee_cost,
            d: self.state.distribution,
            res: self.state.pool - self.state.liability,
            surr: 0.0,
        })
    }

    fn underlyings(&self) -> Result<Underlyings> {
        Ok(Underlyings {
            stock: self.assets.stock,
            bond: 1.0,
        })
    }

    fn deltas(&self) -> Result<Deltas> {
        Ok(Deltas::default())
    }
}
