//! Nested Monte Carlo valuation at an interior date

use super::deltas::{stock_bond_deltas, FdBumps};
use super::{mc_expectation, Deltas, PricingModel, TerminalPricingModel, Underlyings, ValuationModel};
use crate::contract::{value_contract_from_path, ContractState, ContractTraits};
use crate::error::{Result, SimulationError};
use crate::market::{
    discount_bond, integrated_rate_between, update_path_from_variates, AssetState, Dynamics,
    Measure, NormalSource, ScenarioGenerator, Variates,
};
use crate::path::{is_multiple, Path, Time};
use crate::value_vector::ValueVector;
use log::debug;

/// Everything one inner scenario needs besides its variates
#[derive(Debug, Clone, Copy)]
pub(crate) struct InnerContext<'a> {
    pub t: Time,
    pub states: &'a Path<ContractState>,
    pub contract: &'a ContractTraits,
    pub dynamics: &'a Dynamics,
}

impl InnerContext<'_> {
    /// Re-simulate `path` after `t` along `variates` under the pricing measure
    pub fn extend(&self, path: &mut Path<AssetState>, variates: &Path<Variates>) -> Result<()> {
        update_path_from_variates(path, self.t, variates, self.dynamics, Measure::RiskNeutral)
    }

    /// Contract value at `t` along a completed inner path
    pub fn revalue(&self, path: &Path<AssetState>) -> Result<ValueVector> {
        value_contract_from_path(self.t, path, self.states, self.contract)
    }
}

/// Builds the valuation model for each rebalancing date of an outer scenario
#[derive(Debug, Clone)]
pub struct NestedPricingFactory {
    n_samples: usize,
    inner_dt: Time,
    seed: u64,
    dynamics: Dynamics,
    contract: ContractTraits,
    bumps: FdBumps,
}

impl NestedPricingFactory {
    /// Fails when no inner samples are requested or when contract
    /// anniversaries do not fall on the inner grid.
    pub fn new(
        n_samples: usize,
        inner_dt: Time,
        seed: u64,
        risk_neutral: &Dynamics,
        contract: ContractTraits,
        bumps: FdBumps,
    ) -> Result<Self> {
        if n_samples == 0 {
            return Err(SimulationError::ZeroSamples);
        }
        if !is_multiple(contract.dt, inner_dt) {
            return Err(SimulationError::IncompatibleGrids(format!(
                "contract step {} is not a multiple of inner step {}",
                contract.dt, inner_dt
            )));
        }
        let dynamics = risk_neutral.with_step(inner_dt)?;
        Ok(Self {
            n_samples,
            inner_dt,
            seed,
            dynamics,
            contract,
            bumps,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn inner_dt(&self) -> Time {
        self.inner_dt
    }

    pub fn contract(&self) -> &ContractTraits {
        &self.contract
    }

    /// Valuation model at `t` given the realized outer path up to `t`
    pub fn make<'a>(
        &'a self,
        t: Time,
        assets: &Path<AssetState>,
        states: &'a Path<ContractState>,
    ) -> Result<ValuationModel<'a>> {
        self.build(t, assets, states).map_err(|e| e.at_valuation(t))
    }

    fn build<'a>(
        &'a self,
        t: Time,
        assets: &Path<AssetState>,
        states: &'a Path<ContractState>,
    ) -> Result<ValuationModel<'a>> {
        let maturity = self.contract.maturity;
        if t == maturity {
            return Ok(ValuationModel::Terminal(TerminalPricingModel::new(
                *assets.at_time(t)?,
                *states.at_time(t)?,
            )));
        }
        if !is_multiple(self.inner_dt, assets.dt()) {
            return Err(SimulationError::IncompatibleGrids(format!(
                "inner step {} is not a multiple of asset step {}",
                self.inner_dt,
                assets.dt()
            )));
        }

        let mut base: Path<AssetState> = Path::new(self.inner_dt, maturity, assets.t0())?;
        let end = base.index_at(t)?;
        base[0] = *assets.first();
        for i in 1..=end {
            let (from, to) = (base.time_at(i - 1), base.time_at(i));
            base[i] = AssetState {
                integrated_rate: integrated_rate_between(assets, from, to)?,
                ..*assets.at_time(to)?
            };
        }

        let source = NormalSource::with_stream(self.seed, end as u64 + 1);
        let scenarios =
            ScenarioGenerator::new(self.inner_dt, maturity, t, source).take(self.n_samples)?;
        debug!("nested model at t={} with {} inner paths", t, scenarios.len());

        Ok(ValuationModel::Nested(NestedMcPricingModel {
            context: InnerContext {
                t,
                states,
                contract: &self.contract,
                dynamics: &self.dynamics,
            },
            base,
            scenarios,
            bumps: self.bumps,
        }))
    }
}

/// Inner Monte Carlo over risk-neutral continuations of an outer path.
///
/// The scenarios are drawn once when the model is built, so value,
/// underlyings and deltas are all averages over the same inner paths.
#[derive(Debug)]
pub struct NestedMcPricingModel<'a> {
    context: InnerContext<'a>,
    base: Path<AssetState>,
    scenarios: Vec<Path<Variates>>,
    bumps: FdBumps,
}

impl NestedMcPricingModel<'_> {
    pub fn t(&self) -> Time {
        self.context.t
    }

    pub fn n_samples(&self) -> usize {
        self.scenarios.len()
    }

    fn inner_path(&self, variates: &Path<Variates>) -> Result<Path<AssetState>> {
        let mut path = self.base.clone();
        self.context.extend(&mut path, variates)?;
        Ok(path)
    }
}

impl PricingModel for NestedMcPricingModel<'_> {
    fn value(&self) -> Result<ValueVector> {
        mc_expectation(&self.scenarios, |variates| {
            self.context.revalue(&self.inner_path(variates)?)
        })
    }

    /// The stock is the realized outer price; only the bond needs the inner paths.
    fn underlyings(&self) -> Result<Underlyings> {
        let bond = mc_expectation(&self.scenarios, |variates| {
            discount_bond(&self.inner_path(variates)?, self.context.t)
        })?;
        Ok(Underlyings {
            stock: self.base.at_time(self.context.t)?.stock,
            bond,
        })
    }

    fn deltas(&self) -> Result<Deltas> {
        mc_expectation(&self.scenarios, |variates| {
            let mut path = self.base.clone();
            stock_bond_deltas(&self.context, &mut path, variates, &self.bumps)
        })
    }
}
