//! Money-account replication of the contract along one outer scenario

use super::observer::{RebalanceObserver, RebalanceRecord};
use crate::contract::{ContractState, ContractTraits};
use crate::error::{Result, SimulationError};
use crate::market::{compounding_factor, integrated_rate_between, AssetState, Dynamics};
use crate::path::{is_multiple, to_f64, Path, Time};
use crate::pricing::{Deltas, FdBumps, NestedPricingFactory, PricingModel};
use crate::value_vector::ValueVector;
use log::debug;

/// Rebalancing frequency and inner valuation settings of the hedge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HedgeTraits {
    /// Time between rebalancing dates; also the inner simulation step
    pub dt: Time,
    /// Inner Monte Carlo paths per rebalancing date
    pub inner_samples: usize,
    pub bumps: FdBumps,
}

/// Time stepping of the unhedged baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineStepping {
    /// Visit every payoff date in turn
    #[default]
    PayoffGrid,
    /// Visit `t0, t0 + dt, ...` and settle payoffs that fall on a visited date
    FixedStep(Time),
}

/// How one outer scenario is turned into a profit and loss
#[derive(Debug, Clone)]
pub enum ProfitAndLoss {
    Hedged {
        factory: NestedPricingFactory,
        dt: Time,
    },
    Unhedged(BaselineStepping),
}

impl ProfitAndLoss {
    /// Delta hedge rebalanced every `hedge.dt` with inner valuations seeded from `seed`
    pub fn hedged(
        hedge: &HedgeTraits,
        seed: u64,
        risk_neutral: &Dynamics,
        contract: ContractTraits,
    ) -> Result<Self> {
        if !is_multiple(contract.maturity, hedge.dt) {
            return Err(SimulationError::GridMisaligned {
                dt: hedge.dt,
                horizon: contract.maturity,
                start: Time::from_integer(0),
            });
        }
        let factory = NestedPricingFactory::new(
            hedge.inner_samples,
            hedge.dt,
            seed,
            risk_neutral,
            contract,
            hedge.bumps,
        )?;
        Ok(ProfitAndLoss::Hedged {
            factory,
            dt: hedge.dt,
        })
    }

    pub fn is_hedged(&self) -> bool {
        matches!(self, ProfitAndLoss::Hedged { .. })
    }

    pub fn compute(
        &self,
        initial: ValueVector,
        assets: &Path<AssetState>,
        states: &Path<ContractState>,
        payoffs: &Path<ValueVector>,
        observer: &mut dyn RebalanceObserver,
    ) -> Result<ValueVector> {
        match self {
            ProfitAndLoss::Hedged { factory, dt } => replication_profit_and_loss(
                initial, assets, states, payoffs, factory, *dt, observer,
            ),
            ProfitAndLoss::Unhedged(stepping) => {
                zero_hedge_profit_and_loss(initial, assets, payoffs, *stepping)
            }
        }
    }
}

/// Terminal money account of a delta hedge funded with `initial`.
///
/// At each rebalancing date the account is compounded at the realized short
/// rate, pays the contract cash flow due and trades into the new deltas.
pub fn replication_profit_and_loss<O>(
    initial: ValueVector,
    assets: &Path<AssetState>,
    states: &Path<ContractState>,
    payoffs: &Path<ValueVector>,
    factory: &NestedPricingFactory,
    hedge_dt: Time,
    observer: &mut O,
) -> Result<ValueVector>
where
    O: RebalanceObserver + ?Sized,
{
    let t0 = states.t0();
    let maturity = states.horizon();
    if !is_multiple(maturity - t0, hedge_dt) {
        return Err(SimulationError::GridMisaligned {
            dt: hedge_dt,
            horizon: maturity,
            start: t0,
        });
    }

    let mut money_account = initial;
    let mut deltas = Deltas::default();
    let mut old_t = t0;
    let mut t = t0;
    while t <= maturity {
        let log_compounding = integrated_rate_between(assets, old_t, t)?;
        money_account *= log_compounding.exp();

        if let Some(payoff) = payoffs.get_at_time(t) {
            money_account -= *payoff;
        }

        let model = factory.make(t, assets, states)?;
        let underlyings = model.underlyings()?;
        let new_deltas = model.deltas()?;
        money_account += deltas.rebalancing_cashflow(&new_deltas, &underlyings);
        deltas = new_deltas;

        let value = if observer.wants_value() {
            Some(model.value()?)
        } else {
            None
        };
        let state = assets.at_time(t)?;
        observer.on_rebalance(&RebalanceRecord {
            t: to_f64(t),
            stock: underlyings.stock,
            short_rate: state.short_rate,
            log_compounding,
            liability: states[states.last_index_on_or_before(t)?].liability,
            bond: underlyings.bond,
            value,
            money_account,
            stock_delta: deltas.stock,
            bond_delta: deltas.bond,
        });
        debug!("rebalanced at t={t}: money account V={:.4}", money_account.v);

        old_t = t;
        t += hedge_dt;
    }
    Ok(money_account)
}

/// Unhedged baseline: settle every cash flow out of the money account and
/// discount the terminal balance back to inception.
pub fn zero_hedge_profit_and_loss(
    initial: ValueVector,
    assets: &Path<AssetState>,
    payoffs: &Path<ValueVector>,
    stepping: BaselineStepping,
) -> Result<ValueVector> {
    let t0 = payoffs.t0();
    let maturity = payoffs.horizon();
    let mut money_account = initial;
    let mut old_t = t0;
    let mut t = t0;

    match stepping {
        BaselineStepping::PayoffGrid => loop {
            money_account *= compounding_factor(assets, old_t, t)?;
            money_account -= *payoffs.at_time(t)?;
            if t >= maturity {
                break;
            }
            old_t = t;
            t = payoffs.time_at(payoffs.first_index_after(t)?);
        },
        BaselineStepping::FixedStep(dt) => {
            if !is_multiple(maturity - t0, dt) {
                return Err(SimulationError::GridMisaligned {
                    dt,
                    horizon: maturity,
                    start: t0,
                });
            }
            while t <= maturity {
                money_account *= compounding_factor(assets, old_t, t)?;
                if let Some(payoff) = payoffs.get_at_time(t) {
                    money_account -= *payoff;
                }
                old_t = t;
                t += dt;
            }
        }
    }
    Ok(money_account / compounding_factor(assets, t0, maturity)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{make_contract_state_path, payoff_path_from_contract_states};
    use crate::market::{
        generate_real_world_path, AssetPathTraits, ModelFamily, ModelParams, NormalSource,
    };
    use crate::path::{time, years};
    use crate::replication::{NoopObserver, RecordingObserver};
    use approx::assert_abs_diff_eq;

    fn dynamics(params: [f64; 6], dt: Time) -> Dynamics {
        let params = ModelParams::from_slice(ModelFamily::BlackScholesVasicek, &params).unwrap();
        Dynamics::new(params, dt).unwrap()
    }

    struct Scenario {
        assets: Path<AssetState>,
        states: Path<ContractState>,
        payoffs: Path<ValueVector>,
        contract: ContractTraits,
    }

    fn scenario(params: [f64; 6], seed: u64, maturity: i64) -> Scenario {
        let traits = AssetPathTraits {
            dt: time(1, 4),
            horizon: years(maturity),
            t0: years(0),
            initial: AssetState::new(100.0, 0.03),
        };
        let mut source = NormalSource::new(seed);
        let assets =
            generate_real_world_path(&mut source, &traits, &dynamics(params, traits.dt)).unwrap();
        let contract = ContractTraits::standard(10_000.0, maturity).unwrap();
        let states = make_contract_state_path(&assets, &contract).unwrap();
        let payoffs = payoff_path_from_contract_states(&states).unwrap();
        Scenario {
            assets,
            states,
            payoffs,
            contract,
        }
    }

    const MARKET: [f64; 6] = [0.07, 0.2, 0.3, 0.03, 0.01, -0.3];

    #[test]
    fn test_zero_hedge_is_initial_minus_discounted_payoffs() {
        let s = scenario(MARKET, 5, 10);
        let initial = ValueVector::new(9_000.0, 50.0, 400.0, 600.0, 0.0);

        let mut expected = initial;
        for (t, payoff) in s.payoffs.iter() {
            let discount = compounding_factor(&s.assets, years(0), t).unwrap();
            expected -= *payoff / discount;
        }

        for stepping in [
            BaselineStepping::PayoffGrid,
            BaselineStepping::FixedStep(years(1)),
            BaselineStepping::FixedStep(time(1, 2)),
        ] {
            let pnl = zero_hedge_profit_and_loss(initial, &s.assets, &s.payoffs, stepping).unwrap();
            for (a, b) in pnl.components().iter().zip(expected.components()) {
                assert_abs_diff_eq!(*a, b, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_zero_hedge_rejects_misaligned_step() {
        let s = scenario(MARKET, 5, 10);
        let err = zero_hedge_profit_and_loss(
            ValueVector::ZERO,
            &s.assets,
            &s.payoffs,
            BaselineStepping::FixedStep(time(3, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::GridMisaligned { .. }));
    }

    #[test]
    fn test_deterministic_world_replicates_exactly() {
        // no noise and a flat curve: every instrument earns the short rate
        let flat = [0.03, 0.0, 0.5, 0.03, 0.0, 0.0];
        let s = scenario(flat, 1, 5);
        let hedge = HedgeTraits {
            dt: time(1, 2),
            inner_samples: 2,
            bumps: FdBumps::default(),
        };
        let rn = dynamics(flat, time(1, 4));
        let strategy = ProfitAndLoss::hedged(&hedge, 11, &rn, s.contract).unwrap();
        let ProfitAndLoss::Hedged { factory, .. } = &strategy else {
            panic!("expected a hedged strategy");
        };
        let initial = factory
            .make(years(0), &s.assets, &s.states)
            .unwrap()
            .value()
            .unwrap();

        let mut observer = RecordingObserver::new();
        let pnl = strategy
            .compute(initial, &s.assets, &s.states, &s.payoffs, &mut observer)
            .unwrap();
        for x in pnl.components() {
            assert_abs_diff_eq!(x, 0.0, epsilon = 1e-6);
        }
        assert_eq!(observer.records().len(), 11);
        let last = observer.records().last().unwrap();
        assert_eq!(last.t, 5.0);
        assert_eq!(last.stock_delta, ValueVector::ZERO);
        assert_eq!(last.bond, 1.0);
    }

    #[test]
    fn test_hedged_pnl_is_reproducible() {
        let s = scenario(MARKET, 8, 3);
        let hedge = HedgeTraits {
            dt: years(1),
            inner_samples: 20,
            bumps: FdBumps::default(),
        };
        let rn = dynamics([0.0, 0.2, 0.3, 0.03, 0.01, -0.3], time(1, 4));
        let strategy = ProfitAndLoss::hedged(&hedge, 99, &rn, s.contract).unwrap();
        let initial = ValueVector::new(9_500.0, 20.0, 300.0, 200.0, 0.0);
        let a = strategy
            .compute(initial, &s.assets, &s.states, &s.payoffs, &mut NoopObserver)
            .unwrap();
        let b = strategy
            .compute(initial, &s.assets, &s.states, &s.payoffs, &mut NoopObserver)
            .unwrap();
        assert!(a.is_finite());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hedge_step_must_divide_maturity() {
        let contract = ContractTraits::standard(10_000.0, 10).unwrap();
        let hedge = HedgeTraits {
            dt: time(3, 1),
            inner_samples: 10,
            bumps: FdBumps::default(),
        };
        let rn = dynamics(MARKET, time(1, 4));
        let err = ProfitAndLoss::hedged(&hedge, 1, &rn, contract).unwrap_err();
        assert!(err.is_configuration());
    }
}
