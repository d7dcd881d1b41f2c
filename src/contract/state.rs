//! Contract state recursion along an asset path

use crate::error::{Result, SimulationError};
use crate::market::{discount_value, AssetState};
use crate::path::{is_multiple, years, Path, Time};
use crate::value_vector::ValueVector;

/// State of the contract at one anniversary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContractState {
    /// Guaranteed liability
    pub liability: f64,
    /// Policyholder asset pool
    pub pool: f64,
    /// Guarantee cost incurred over the step ending here
    pub guarantee_cost: f64,
    /// Surplus distributed over the step ending here
    pub distribution: f64,
}

impl ContractState {
    pub fn new(liability: f64, pool: f64) -> Self {
        Self {
            liability,
            pool,
            guarantee_cost: 0.0,
            distribution: 0.0,
        }
    }

    /// Pool in excess of the liability, relative to the liability
    pub fn reserve_quotient(&self) -> f64 {
        (self.pool - self.liability) / self.liability
    }
}

/// Immutable contract terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractTraits {
    /// Guaranteed minimum rate g
    pub guarantee_rate: f64,
    /// Participation rate y in the pool return
    pub participation: f64,
    /// Share δ of the profit credited to the liability; the rest is paid out
    pub distribution_ratio: f64,
    /// Liability and pool at inception
    pub initial: ContractState,
    /// Anniversary spacing
    pub dt: Time,
    /// Contract maturity
    pub maturity: Time,
}

impl ContractTraits {
    pub fn new(
        guarantee_rate: f64,
        participation: f64,
        distribution_ratio: f64,
        initial: ContractState,
        dt: Time,
        maturity: Time,
    ) -> Result<Self> {
        if !(initial.liability > 0.0) {
            return Err(SimulationError::InvalidContract(format!(
                "initial liability {} must be positive",
                initial.liability
            )));
        }
        if !(initial.pool >= initial.liability) {
            return Err(SimulationError::InvalidContract(format!(
                "initial pool {} below initial liability {}",
                initial.pool, initial.liability
            )));
        }
        if !is_multiple(maturity, dt) {
            return Err(SimulationError::GridMisaligned {
                dt,
                horizon: maturity,
                start: years(0),
            });
        }
        Ok(Self {
            guarantee_rate,
            participation,
            distribution_ratio,
            initial,
            dt,
            maturity,
        })
    }

    /// Annual contract with g = 3.5%, y = 50%, δ = 90% and a pool of 110% of `liability`
    pub fn standard(liability: f64, maturity: i64) -> Result<Self> {
        Self::new(
            0.035,
            0.5,
            0.9,
            ContractState::new(liability, 1.1 * liability),
            years(1),
            years(maturity),
        )
    }
}

/// Re-run the contract recursion from grid index `from` to maturity.
///
/// The state at `from` is kept; every later state is recomputed from the
/// equity return between consecutive anniversaries on `assets`.
pub fn compute_contract_state_path(
    assets: &Path<AssetState>,
    states: &mut Path<ContractState>,
    from: usize,
    traits: &ContractTraits,
) -> Result<()> {
    let start = *states.at(from)?;
    let mut liability = start.liability;
    let mut pool = start.pool;
    let mut reserve_quotient = start.reserve_quotient();
    let mut s1 = assets.at_time(states.time_at(from))?.stock;

    let g = traits.guarantee_rate;
    let y = traits.participation;
    let delta = traits.distribution_ratio;

    for k in from + 1..states.len() {
        let s0 = s1;
        s1 = assets.at_time(states.time_at(k))?.stock;

        let x = s1 / s0 - 1.0;
        let market_pool = pool * (1.0 + x);
        let l0 = liability;

        let profit_share = y * x * (1.0 + reserve_quotient);
        let credited = delta * profit_share;
        let condition1 = credited > g;
        let condition3 = g <= profit_share;

        liability = (1.0 + credited.max(g)) * l0;
        let distribution = if condition1 {
            (1.0 - delta) * y * pool * x
        } else if condition3 {
            (profit_share - g) * l0
        } else {
            0.0
        };

        pool = (market_pool - distribution).max(liability);
        let guarantee_cost = (liability - market_pool).max(0.0);
        reserve_quotient = (pool - liability) / liability;

        states[k] = ContractState {
            liability,
            pool,
            guarantee_cost,
            distribution,
        };
    }
    Ok(())
}

/// Contract state path over the anniversaries of `traits` driven by `assets`
pub fn make_contract_state_path(
    assets: &Path<AssetState>,
    traits: &ContractTraits,
) -> Result<Path<ContractState>> {
    let mut states: Path<ContractState> = Path::from_zero(traits.dt, traits.maturity)?;
    states[0] = traits.initial;
    compute_contract_state_path(assets, &mut states, 0, traits)?;
    Ok(states)
}

/// Cash flows of the contract on its anniversary grid.
///
/// Inception carries the initial funding of the reserve as an outflow,
/// each anniversary the guarantee cost and distribution of its step, and
/// maturity additionally the liability and the remaining reserve.
pub fn payoff_path_from_contract_states(states: &Path<ContractState>) -> Result<Path<ValueVector>> {
    let mut payoffs: Path<ValueVector> = Path::new(states.dt(), states.horizon(), states.t0())?;
    let first = states.first();
    payoffs[0].res = -(first.pool - first.liability);
    for i in 1..states.len() {
        payoffs[i].c = states[i].guarantee_cost;
        payoffs[i].d = states[i].distribution;
    }
    let end = states.len() - 1;
    let last = states.last();
    payoffs[end].v = last.liability;
    payoffs[end].res = last.pool - last.liability;
    Ok(payoffs)
}

/// Value at `t` of the contract whose states are already known
pub fn value_contract(
    t: Time,
    assets: &Path<AssetState>,
    states: &Path<ContractState>,
) -> Result<ValueVector> {
    discount_value(t, assets, &payoff_path_from_contract_states(states)?)
}

/// Value at `t` after re-running the contract from the last anniversary on
/// or before `t` along `assets`
pub fn value_contract_from_path(
    t: Time,
    assets: &Path<AssetState>,
    states: &Path<ContractState>,
    traits: &ContractTraits,
) -> Result<ValueVector> {
    let mut states = states.clone();
    let anniversary = states.last_index_on_or_before(t)?;
    compute_contract_state_path(assets, &mut states, anniversary, traits)?;
    value_contract(t, assets, &states)
}
