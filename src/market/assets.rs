//! Asset states, asset paths and pathwise discounting

use super::dynamics::{Dynamics, Measure};
use super::variates::{make_variates, NormalSource, Variates};
use crate::error::{Result, SimulationError};
use crate::path::{Path, Time};
use std::ops::{Add, AddAssign, Neg};

/// Market state at one grid point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetState {
    /// Underlying equity price
    pub stock: f64,
    /// Short rate
    pub short_rate: f64,
    /// Short rate integrated over the step ending at this point.
    /// Per-step increment; cumulative discounting sums it along the path.
    pub integrated_rate: f64,
}

impl AssetState {
    pub fn new(stock: f64, short_rate: f64) -> Self {
        Self {
            stock,
            short_rate,
            integrated_rate: 0.0,
        }
    }
}

impl Add for AssetState {
    type Output = AssetState;

    fn add(self, other: Self) -> Self {
        AssetState {
            stock: self.stock + other.stock,
            short_rate: self.short_rate + other.short_rate,
            integrated_rate: self.integrated_rate + other.integrated_rate,
        }
    }
}

impl AddAssign for AssetState {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Neg for AssetState {
    type Output = AssetState;

    fn neg(self) -> Self {
        AssetState {
            stock: -self.stock,
            short_rate: -self.short_rate,
            integrated_rate: -self.integrated_rate,
        }
    }
}

/// Grid and starting values of a simulated asset path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetPathTraits {
    pub dt: Time,
    pub horizon: Time,
    pub t0: Time,
    pub initial: AssetState,
}

/// Build an asset path by applying `dynamics` along a variate path
pub fn make_path_from_variates(
    variates: &Path<Variates>,
    initial: AssetState,
    dynamics: &Dynamics,
    measure: Measure,
) -> Result<Path<AssetState>> {
    let mut path: Path<AssetState> = Path::new(variates.dt(), variates.horizon(), variates.t0())?;
    path[0] = initial;
    update_path_from_variates(&mut path, variates.t0(), variates, dynamics, measure)?;
    Ok(path)
}

/// Simulate the real-world asset path of one outer scenario
pub fn generate_real_world_path(
    source: &mut NormalSource,
    traits: &AssetPathTraits,
    dynamics: &Dynamics,
) -> Result<Path<AssetState>> {
    let variates = make_variates(traits.dt, traits.horizon, traits.t0, source)?;
    make_path_from_variates(&variates, traits.initial, dynamics, Measure::RealWorld)
}

/// Re-simulate `path` forward from `from`, keeping the state at `from`.
///
/// The variate path must share the asset grid from `from` onwards.
pub fn update_path_from_variates(
    path: &mut Path<AssetState>,
    from: Time,
    variates: &Path<Variates>,
    dynamics: &Dynamics,
    measure: Measure,
) -> Result<()> {
    if variates.dt() != path.dt() || dynamics.dt() != path.dt() {
        return Err(SimulationError::IncompatibleGrids(format!(
            "asset step {} vs variate step {} vs dynamics step {}",
            path.dt(),
            variates.dt(),
            dynamics.dt()
        )));
    }
    let start = path.index_at(from)?;
    let variate_start = variates.index_at(from)?;
    let steps = path.len() - start;
    if variates.len() - variate_start < steps {
        return Err(SimulationError::IndexOutOfBounds {
            index: variate_start + steps - 1,
            len: variates.len(),
        });
    }
    for k in 1..steps {
        let previous = path[start + k - 1];
        path[start + k] = dynamics.step(measure, &variates[variate_start + k], &previous);
    }
    Ok(())
}

/// Sum of the integrated short rate over `(from, to]`
pub fn integrated_rate_between(path: &Path<AssetState>, from: Time, to: Time) -> Result<f64> {
    let start = path.index_at(from)?;
    let end = path.index_at(to)?;
    Ok(path.values()[start + 1..=end.max(start)]
        .iter()
        .map(|a| a.integrated_rate)
        .sum())
}

/// Money-market growth factor `exp(sum intR)` over `(from, to]`
pub fn compounding_factor(path: &Path<AssetState>, from: Time, to: Time) -> Result<f64> {
    Ok(integrated_rate_between(path, from, to)?.exp())
}

/// Price at `t` of the zero-coupon bond maturing at the end of the path
pub fn discount_bond(path: &Path<AssetState>, t: Time) -> Result<f64> {
    let start = path.index_at(t)?;
    let sum: f64 = path.values()[start + 1..]
        .iter()
        .map(|a| a.integrated_rate)
        .sum();
    Ok((-sum).exp())
}

/// Value at `t` of a payoff stream: the payoff at `t` (if `t` is a payoff
/// date) plus every later payoff discounted with the path's short rate.
pub fn discount_value<T>(t: Time, assets: &Path<AssetState>, payoffs: &Path<T>) -> Result<T>
where
    T: Copy + Default + AddAssign + std::ops::Mul<f64, Output = T>,
{
    let mut value = payoffs.get_at_time(t).copied().unwrap_or_default();
    if t >= payoffs.horizon() {
        return Ok(value);
    }
    let mut ia = assets.index_at(t)?;
    let mut sum_int_rate = 0.0;
    let first = payoffs.first_index_after(t)?;
    for (tp, payoff) in payoffs.iter_from(first) {
        while assets.time_at(ia) < tp {
            ia += 1;
            sum_int_rate += assets.at(ia)?.integrated_rate;
        }
        value += *payoff * (-sum_int_rate).exp();
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dynamics::{ModelFamily, ModelParams};
    use crate::path::{time, years};
    use crate::ValueVector;
    use approx::assert_relative_eq;

    fn flat_path(rate: f64, dt: Time, horizon: Time) -> Path<AssetState> {
        let mut path: Path<AssetState> = Path::from_zero(dt, horizon).unwrap();
        let step = crate::path::to_f64(dt);
        for (i, a) in path.values_mut().iter_mut().enumerate() {
            *a = AssetState {
                stock: 100.0,
                short_rate: rate,
                integrated_rate: if i == 0 { 0.0 } else { rate * step },
            };
        }
        path
    }

    fn bs_dynamics(dt: Time) -> Dynamics {
        let params = ModelParams::from_slice(
            ModelFamily::BlackScholesVasicek,
            &[0.07, 0.2, 0.2, 0.04, 0.01, -0.3],
        )
        .unwrap();
        Dynamics::new(params, dt).unwrap()
    }

    #[test]
    fn test_discount_bond_and_compounding() {
        let path = flat_path(0.05, time(1, 2), years(4));
        assert_relative_eq!(discount_bond(&path, years(1)).unwrap(), (-0.15f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(discount_bond(&path, years(4)).unwrap(), 1.0);
        assert_relative_eq!(
            compounding_factor(&path, years(1), years(3)).unwrap(),
            0.1f64.exp(),
            epsilon = 1e-12
        );
        assert_eq!(compounding_factor(&path, years(2), years(2)).unwrap(), 1.0);
    }

    #[test]
    fn test_discount_value_includes_payoff_at_t() {
        let assets = flat_path(0.05, time(1, 4), years(3));
        let mut payoffs: Path<ValueVector> = Path::from_zero(years(1), years(3)).unwrap();
        for p in payoffs.values_mut() {
            p.v = 10.0;
        }

        let at_one = discount_value(years(1), &assets, &payoffs).unwrap();
        let expected = 10.0 + 10.0 * (-0.05f64).exp() + 10.0 * (-0.10f64).exp();
        assert_relative_eq!(at_one.v, expected, epsilon = 1e-10);

        let between = discount_value(time(3, 2), &assets, &payoffs).unwrap();
        let expected = 10.0 * (-0.025f64).exp() + 10.0 * (-0.075f64).exp();
        assert_relative_eq!(between.v, expected, epsilon = 1e-10);

        let at_end = discount_value(years(3), &assets, &payoffs).unwrap();
        assert_eq!(at_end.v, 10.0);
    }

    #[test]
    fn test_update_keeps_state_before_start() {
        let dynamics = bs_dynamics(time(1, 4));
        let mut source = NormalSource::new(11);
        let variates = make_variates(time(1, 4), years(2), years(0), &mut source).unwrap();
        let mut path =
            make_path_from_variates(&variates, AssetState::new(100.0, 0.03), &dynamics, Measure::RealWorld)
                .unwrap();
        let original = path.clone();

        let mut other = NormalSource::new(12);
        let fresh = make_variates(time(1, 4), years(2), years(1), &mut other).unwrap();
        update_path_from_variates(&mut path, years(1), &fresh, &dynamics, Measure::RiskNeutral).unwrap();

        assert_eq!(&path.values()[..=4], &original.values()[..=4]);
        assert_ne!(path.values()[5], original.values()[5]);
    }

    #[test]
    fn test_step_mismatch_rejected() {
        let dynamics = bs_dynamics(time(1, 2));
        let mut source = NormalSource::new(1);
        let variates = make_variates(time(1, 4), years(1), years(0), &mut source).unwrap();
        let err = make_path_from_variates(&variates, AssetState::new(100.0, 0.03), &dynamics, Measure::RiskNeutral)
            .unwrap_err();
        assert!(matches!(err, SimulationError::IncompatibleGrids(_)));
    }

    #[test]
    fn test_real_world_path_reproducible() {
        let traits = AssetPathTraits {
            dt: time(1, 12),
            horizon: years(10),
            t0: years(0),
            initial: AssetState::new(100.0, 0.03),
        };
        let dynamics = bs_dynamics(traits.dt);
        let a = generate_real_world_path(&mut NormalSource::new(5), &traits, &dynamics).unwrap();
        let b = generate_real_world_path(&mut NormalSource::new(5), &traits, &dynamics).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 121);
        assert!(a.values().iter().all(|s| s.stock > 0.0));
    }
}
