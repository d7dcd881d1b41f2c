//! Run configuration of a profit and loss simulation
//!
//! `RunOptions` gathers every numeric knob of a run. The derived traits
//! (asset grid, contract terms, hedge settings, pricing measure) are built
//! from it on demand so that each one is validated where it is used.

pub mod loader;

use crate::contract::{ContractState, ContractTraits};
use crate::error::{Result, SimulationError};
use crate::market::{AssetPathTraits, AssetState, ModelFamily, ModelParams};
use crate::path::{time, years, Time};
use crate::pricing::FdBumps;
use crate::replication::{BaselineStepping, HedgeTraits};
use std::path::PathBuf;

/// Risk-neutral model inputs given on the command line.
///
/// Only the entries used by the selected family are read; the equity
/// drift under the pricing measure is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskNeutralInputs {
    pub stock_vol: f64,
    /// CEV elasticity, CEV-CKLS only
    pub stock_exp: f64,
    pub rate_speed: f64,
    pub rate_level: f64,
    pub rate_vol: f64,
    /// CKLS elasticity, CEV-CKLS only
    pub rate_exp: f64,
    pub correlation: f64,
}

impl Default for RiskNeutralInputs {
    fn default() -> Self {
        Self {
            stock_vol: 0.2,
            stock_exp: 1.0,
            rate_speed: 0.3,
            rate_level: 0.03,
            rate_vol: 0.01,
            rate_exp: 0.5,
            correlation: -0.3,
        }
    }
}

/// All settings of one simulation run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model: ModelFamily,
    /// CSV file with one real-world parameter set per row
    pub parameter_file: PathBuf,
    /// Number of outer scenarios
    pub n_paths: usize,
    /// Rebalancing dates over the contract life; 0 disables hedging
    pub n_hedges: i64,
    pub inner_samples: usize,
    /// Steps of the real-world asset grid over the contract life
    pub path_points: i64,
    pub r0: f64,
    pub s0: f64,
    pub l0: f64,
    /// Contract maturity in whole years
    pub maturity: i64,
    pub risk_neutral: RiskNeutralInputs,
    pub guarantee_rate: f64,
    pub participation: f64,
    pub distribution_ratio: f64,
    /// Initial pool as a multiple of the initial liability
    pub reserve_ratio: f64,
    pub bumps: FdBumps,
    /// Inner paths of the initial valuation per outer scenario
    pub initial_mc_multiplier: usize,
    pub baseline: BaselineStepping,
    pub output: PathBuf,
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model: ModelFamily::BlackScholesVasicek,
            parameter_file: PathBuf::from("parameters.csv"),
            n_paths: 100,
            n_hedges: 10,
            inner_samples: 100,
            path_points: 40,
            r0: 0.03,
            s0: 100.0,
            l0: 10_000.0,
            maturity: 10,
            risk_neutral: RiskNeutralInputs::default(),
            guarantee_rate: 0.035,
            participation: 0.5,
            distribution_ratio: 0.9,
            reserve_ratio: 1.1,
            bumps: FdBumps::default(),
            initial_mc_multiplier: 10,
            baseline: BaselineStepping::PayoffGrid,
            output: PathBuf::from("results.csv"),
            seed: 1,
        }
    }
}

impl RunOptions {
    pub fn horizon(&self) -> Time {
        years(self.maturity)
    }

    pub fn do_hedging(&self) -> bool {
        self.n_hedges > 0
    }

    /// Inner paths of the valuation at inception
    pub fn initial_mc_samples(&self) -> usize {
        self.n_paths * self.initial_mc_multiplier
    }

    pub fn asset_path_traits(&self) -> Result<AssetPathTraits> {
        self.check_maturity()?;
        if self.path_points <= 0 {
            return Err(SimulationError::InvalidParameter {
                name: "path_points",
                reason: format!("{} asset grid steps requested", self.path_points),
            });
        }
        Ok(AssetPathTraits {
            dt: time(self.maturity, self.path_points),
            horizon: self.horizon(),
            t0: years(0),
            initial: AssetState::new(self.s0, self.r0),
        })
    }

    /// Annual contract with the configured participation terms
    pub fn contract_traits(&self) -> Result<ContractTraits> {
        self.check_maturity()?;
        ContractTraits::new(
            self.guarantee_rate,
            self.participation,
            self.distribution_ratio,
            ContractState::new(self.l0, self.reserve_ratio * self.l0),
            years(1),
            self.horizon(),
        )
    }

    /// Hedge settings, `None` when hedging is disabled
    pub fn hedge_traits(&self) -> Result<Option<HedgeTraits>> {
        if self.n_hedges < 0 {
            return Err(SimulationError::InvalidParameter {
                name: "n_hedges",
                reason: format!("{} rebalancing dates requested", self.n_hedges),
            });
        }
        if !self.do_hedging() {
            return Ok(None);
        }
        self.check_maturity()?;
        Ok(Some(HedgeTraits {
            dt: time(self.maturity, self.n_hedges),
            inner_samples: self.inner_samples,
            bumps: self.bumps,
        }))
    }

    /// Pricing-measure parameters in the family's column order
    pub fn risk_neutral_params(&self) -> Result<ModelParams> {
        let rn = &self.risk_neutral;
        let values = match self.model {
            ModelFamily::BlackScholesVasicek => vec![
                0.0,
                rn.stock_vol,
                rn.rate_speed,
                rn.rate_level,
                rn.rate_vol,
                rn.correlation,
            ],
            ModelFamily::CevCkls => vec![
                0.0,
                rn.stock_vol,
                rn.stock_exp,
                rn.rate_speed,
                rn.rate_level,
                rn.rate_vol,
                rn.rate_exp,
                rn.correlation,
            ],
        };
        ModelParams::from_slice(self.model, &values)
    }

    fn check_maturity(&self) -> Result<()> {
        if self.maturity <= 0 {
            return Err(SimulationError::InvalidContract(format!(
                "maturity {} must be a positive number of years",
                self.maturity
            )));
        }
        Ok(())
    }
}
