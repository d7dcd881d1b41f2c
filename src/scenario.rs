//! Scenario runner for batches of outer simulations
//!
//! Builds the immutable setup of a run once (pricing dynamics, contract and
//! grid traits, initial value, P&L strategy), then runs any number of outer
//! scenarios against it. Scenarios share nothing mutable and run in parallel.

use crate::config::RunOptions;
use crate::contract::{
    make_contract_state_path, payoff_path_from_contract_states, ContractState, ContractTraits,
};
use crate::error::{Result, SimulationError};
use crate::market::{
    generate_real_world_path, AssetPathTraits, AssetState, Dynamics, ModelParams, NormalSource,
};
use crate::path::{is_multiple, Path, Time};
use crate::pricing::{FdBumps, NestedPricingFactory, PricingModel};
use crate::replication::{BaselineStepping, NoopObserver, ProfitAndLoss, RebalanceObserver};
use crate::value_vector::ValueVector;
use log::{debug, info};
use rayon::prelude::*;
use std::io::Write;

/// Value at inception by plain nested valuation on the asset grid
pub fn simple_mc(
    n_samples: usize,
    seed: u64,
    risk_neutral: &Dynamics,
    asset_traits: &AssetPathTraits,
    contract: &ContractTraits,
) -> Result<ValueVector> {
    let factory = NestedPricingFactory::new(
        n_samples,
        asset_traits.dt,
        seed,
        risk_neutral,
        *contract,
        FdBumps::default(),
    )?;
    let mut assets: Path<AssetState> =
        Path::new(asset_traits.dt, asset_traits.horizon, asset_traits.t0)?;
    assets[0] = asset_traits.initial;
    let mut states: Path<ContractState> = Path::new(contract.dt, contract.maturity, asset_traits.t0)?;
    states[0] = contract.initial;
    factory.make(asset_traits.t0, &assets, &states)?.value()
}

/// A fixed baseline step must tile the contract life and land on asset grid points
fn check_baseline_step(
    dt: Time,
    asset_traits: &AssetPathTraits,
    contract: &ContractTraits,
) -> Result<()> {
    if !is_multiple(contract.maturity - asset_traits.t0, dt) {
        return Err(SimulationError::GridMisaligned {
            dt,
            horizon: contract.maturity,
            start: asset_traits.t0,
        });
    }
    if !is_multiple(dt, asset_traits.dt) {
        return Err(SimulationError::IncompatibleGrids(format!(
            "baseline step {} is not a multiple of asset step {}",
            dt, asset_traits.dt
        )));
    }
    Ok(())
}

/// Pre-built setup shared by every outer scenario of a run
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    asset_traits: AssetPathTraits,
    contract: ContractTraits,
    initial_value: ValueVector,
    strategy: ProfitAndLoss,
    seed: u64,
}

impl ScenarioRunner {
    /// Validate the configuration, value the contract at inception and set
    /// up the P&L strategy
    pub fn new(options: &RunOptions) -> Result<Self> {
        let asset_traits = options.asset_path_traits()?;
        let contract = options.contract_traits()?;
        let risk_neutral = Dynamics::new(options.risk_neutral_params()?, asset_traits.dt)?;

        let strategy = match options.hedge_traits()? {
            Some(hedge) => {
                if !is_multiple(hedge.dt, asset_traits.dt) {
                    return Err(SimulationError::IncompatibleGrids(format!(
                        "hedge step {} is not a multiple of asset step {}",
                        hedge.dt, asset_traits.dt
                    )));
                }
                ProfitAndLoss::hedged(&hedge, options.seed, &risk_neutral, contract)?
            }
            None => {
                if let BaselineStepping::FixedStep(dt) = options.baseline {
                    check_baseline_step(dt, &asset_traits, &contract)?;
                }
                ProfitAndLoss::Unhedged(options.baseline)
            }
        };

        info!(
            "valuing contract at inception with {} inner paths",
            options.initial_mc_samples()
        );
        let initial_value = simple_mc(
            options.initial_mc_samples(),
            options.seed,
            &risk_neutral,
            &asset_traits,
            &contract,
        )?;
        info!("initial value: {}", initial_value);

        Ok(Self {
            asset_traits,
            contract,
            initial_value,
            strategy,
            seed: options.seed,
        })
    }

    pub fn initial_value(&self) -> ValueVector {
        self.initial_value
    }

    pub fn strategy(&self) -> &ProfitAndLoss {
        &self.strategy
    }

    /// Run one outer scenario with real-world parameters `params`
    pub fn run_single(&self, params: &ModelParams, seed: u64) -> Result<ValueVector> {
        self.run_observed(params, seed, &mut NoopObserver)
    }

    /// Run one outer scenario and report every rebalancing to `observer`
    pub fn run_observed(
        &self,
        params: &ModelParams,
        seed: u64,
        observer: &mut dyn RebalanceObserver,
    ) -> Result<ValueVector> {
        let dynamics = Dynamics::new(*params, self.asset_traits.dt)?;
        let mut source = NormalSource::new(seed);
        let assets: Path<AssetState> =
            generate_real_world_path(&mut source, &self.asset_traits, &dynamics)?;
        let states = make_contract_state_path(&assets, &self.contract)?;
        let payoffs = payoff_path_from_contract_states(&states)?;
        self.strategy
            .compute(self.initial_value, &assets, &states, &payoffs, observer)
    }

    /// Run scenario `i` with `params[i]` and seed `seed + i`, results in input order
    pub fn run_batch(&self, params: &[ModelParams]) -> Result<Vec<ValueVector>> {
        info!(
            "running {} scenarios ({})",
            params.len(),
            if self.strategy.is_hedged() { "hedged" } else { "unhedged" }
        );
        let results = params
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let seed = self.seed.wrapping_add(i as u64);
                let result = self
                    .run_single(p, seed)
                    .map_err(|e| e.in_scenario(i, seed))?;
                debug!("scenario {i} (seed {seed}): {result}");
                Ok(result)
            })
            .collect::<Result<Vec<_>>>()?;
        info!("finished {} scenarios", results.len());
        Ok(results)
    }
}

/// Write one line of five comma-separated fields per result
pub fn write_results<W: Write>(results: &[ValueVector], mut out: W) -> Result<()> {
    for result in results {
        writeln!(out, "{}", result)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::ModelFamily;
    use crate::path::{time, years};
    use approx::assert_relative_eq;

    fn unhedged_options() -> RunOptions {
        RunOptions {
            n_paths: 4,
            n_hedges: 0,
            path_points: 40,
            maturity: 10,
            seed: 2024,
            ..RunOptions::default()
        }
    }

    fn real_world(mu: f64) -> ModelParams {
        ModelParams::from_slice(
            ModelFamily::BlackScholesVasicek,
            &[mu, 0.2, 0.3, 0.03, 0.01, -0.3],
        )
        .unwrap()
    }

    #[test]
    fn test_unhedged_batch_is_reproducible() {
        let options = unhedged_options();
        let params = vec![real_world(0.07), real_world(0.05), real_world(0.07), real_world(0.05)];

        let first = ScenarioRunner::new(&options).unwrap().run_batch(&params).unwrap();
        let second = ScenarioRunner::new(&options).unwrap().run_batch(&params).unwrap();
        assert_eq!(first.len(), 4);
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_results(&first, &mut a).unwrap();
        write_results(&second, &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(String::from_utf8(a).unwrap().lines().count(), 4);
    }

    fn assert_close(actual: ValueVector, expected: ValueVector) {
        for (a, e) in actual.components().iter().zip(expected.components()) {
            assert_relative_eq!(*a, e, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unhedged_output_for_fixed_seed() {
        // two-year contract on a half-yearly grid with ten inner paths at inception
        let options = RunOptions {
            n_paths: 1,
            n_hedges: 0,
            path_points: 4,
            maturity: 2,
            seed: 7,
            ..RunOptions::default()
        };
        let runner = ScenarioRunner::new(&options).unwrap();
        assert_close(
            runner.initial_value(),
            ValueVector::new(
                10581.785376459131,
                1821.681946435488,
                79.56588571519032,
                -250.61285841191517,
                0.0,
            ),
        );

        let batch = runner.run_batch(&[real_world(0.07)]).unwrap();
        assert_close(
            batch[0],
            ValueVector::new(
                -1784.4609617267624,
                1821.681946435488,
                -215.58562827201,
                -3022.9434994312733,
                0.0,
            ),
        );
        let second = runner.run_single(&real_world(0.05), 8).unwrap();
        assert_close(
            second,
            ValueVector::new(
                -899.0776569715333,
                1821.6819464354883,
                -109.93720590917599,
                -1202.4811947182186,
                0.0,
            ),
        );
    }

    #[test]
    fn test_batch_order_matches_seeds() {
        let runner = ScenarioRunner::new(&unhedged_options()).unwrap();
        let params = vec![real_world(0.07); 3];
        let batch = runner.run_batch(&params).unwrap();
        for (i, result) in batch.iter().enumerate() {
            let single = runner.run_single(&params[i], 2024 + i as u64).unwrap();
            assert_eq!(*result, single);
        }
        assert_ne!(batch[0], batch[1]);
    }

    #[test]
    fn test_initial_value_is_positive() {
        let runner = ScenarioRunner::new(&unhedged_options()).unwrap();
        let value = runner.initial_value();
        assert!(value.is_finite());
        assert!(value.v > 0.0);
        assert!(value.c >= 0.0);
        assert!(value.d >= 0.0);
    }

    #[test]
    fn test_simple_mc_without_noise() {
        let params = ModelParams::from_slice(
            ModelFamily::BlackScholesVasicek,
            &[0.0, 0.0, 0.5, 0.03, 0.0, 0.0],
        )
        .unwrap();
        let traits = AssetPathTraits {
            dt: time(1, 4),
            horizon: years(5),
            t0: years(0),
            initial: AssetState::new(100.0, 0.03),
        };
        let contract = ContractTraits::standard(10_000.0, 5).unwrap();
        let dynamics = Dynamics::new(params, traits.dt).unwrap();
        let value = simple_mc(3, 1, &dynamics, &traits, &contract).unwrap();
        assert!((value.v + value.res - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_hedge_grid_must_nest_in_asset_grid() {
        let options = RunOptions {
            n_hedges: 20,
            path_points: 10,
            ..unhedged_options()
        };
        let err = ScenarioRunner::new(&options).unwrap_err();
        assert!(matches!(err, SimulationError::IncompatibleGrids(_)));
    }

    #[test]
    fn test_baseline_step_checked_at_setup() {
        let with_step = |dt| RunOptions {
            baseline: BaselineStepping::FixedStep(dt),
            ..unhedged_options()
        };
        // 1/3 tiles ten years but not the quarterly asset grid
        let err = ScenarioRunner::new(&with_step(time(1, 3))).unwrap_err();
        assert!(matches!(err, SimulationError::IncompatibleGrids(_)));

        let err = ScenarioRunner::new(&with_step(years(3))).unwrap_err();
        assert!(matches!(err, SimulationError::GridMisaligned { .. }));

        let runner = ScenarioRunner::new(&with_step(time(1, 2))).unwrap();
        let result = runner.run_single(&real_world(0.06), 3).unwrap();
        assert!(result.is_finite());
    }

    #[test]
    fn test_hedged_scenario_errors_name_the_scenario() {
        let options = RunOptions {
            n_hedges: 10,
            inner_samples: 2,
            n_paths: 1,
            ..unhedged_options()
        };
        let runner = ScenarioRunner::new(&options).unwrap();
        let broken = ModelParams::BsVasicek(crate::market::BsVasicekParams {
            mu: 0.05,
            sigma: 0.2,
            kappa: -1.0,
            theta: 0.03,
            rate_vol: 0.01,
            rho: 0.0,
        });
        let err = runner.run_batch(&[broken]).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Scenario {
                index: 0,
                seed: 2024,
                ..
            }
        ));
    }
}
