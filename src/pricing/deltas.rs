//! Bump-and-revalue hedge deltas for one inner scenario

use super::nested::InnerContext;
use super::Deltas;
use crate::error::Result;
use crate::market::{discount_bond, AssetState, Variates};
use crate::path::Path;
use crate::value_vector::ValueVector;
use log::warn;
use serde::{Deserialize, Serialize};

/// Finite-difference bump sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FdBumps {
    /// Relative shift of the equity price
    pub stock: f64,
    /// Absolute shift of the short rate
    pub rate: f64,
}

impl Default for FdBumps {
    fn default() -> Self {
        Self {
            stock: 0.005,
            rate: 0.002,
        }
    }
}

/// Central difference `(up - down) / (den_up - den_down)`.
///
/// Returns zero when both bumps land on the same denominator.
pub fn fd_delta(up: (ValueVector, f64), down: (ValueVector, f64)) -> ValueVector {
    let (value_up, den_up) = up;
    let (value_down, den_down) = down;
    let spread = den_up - den_down;
    if spread == 0.0 {
        warn!("finite-difference denominators coincide at {den_up}, using zero delta");
        return ValueVector::ZERO;
    }
    (value_up - value_down) / spread
}

/// Stock and bond deltas of the contract along one inner scenario.
///
/// `path` holds the realized outer state up to the valuation date; the
/// state there is shifted, the continuation re-simulated with the same
/// variates and the contract revalued. The contract itself sees the
/// unshifted state at the valuation date, the denominators the shifted one.
pub(crate) fn stock_bond_deltas(
    context: &InnerContext<'_>,
    path: &mut Path<AssetState>,
    variates: &Path<Variates>,
    bumps: &FdBumps,
) -> Result<Deltas> {
    let index = path.index_at(context.t)?;

    let stock_shift = AssetState {
        stock: path[index].stock * bumps.stock,
        ..AssetState::default()
    };
    let bumped_stock =
        |_: &Path<AssetState>, bumped: &AssetState| -> Result<f64> { Ok(bumped.stock) };
    let up = revalue_shifted(context, path, index, stock_shift, variates, bumped_stock)?;
    let down = revalue_shifted(context, path, index, -stock_shift, variates, bumped_stock)?;
    let stock = fd_delta(up, down);

    let rate_shift = AssetState {
        short_rate: bumps.rate,
        ..AssetState::default()
    };
    let bond = |p: &Path<AssetState>, _: &AssetState| discount_bond(p, context.t);
    let up = revalue_shifted(context, path, index, rate_shift, variates, bond)?;
    let down = revalue_shifted(context, path, index, -rate_shift, variates, bond)?;
    let bond = fd_delta(up, down);

    Ok(Deltas { stock, bond })
}

fn revalue_shifted<F>(
    context: &InnerContext<'_>,
    path: &mut Path<AssetState>,
    index: usize,
    shift: AssetState,
    variates: &Path<Variates>,
    denominator: F,
) -> Result<(ValueVector, f64)>
where
    F: Fn(&Path<AssetState>, &AssetState) -> Result<f64>,
{
    let original = path[index];
    let bumped = original + shift;
    path[index] = bumped;
    context.extend(path, variates)?;
    path[index] = original;
    let value = context.revalue(path)?;
    Ok((value, denominator(path, &bumped)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_delta_slope() {
        let up = (ValueVector::new(10.5, 1.0, 0.0, 2.0, 0.0), 101.0);
        let down = (ValueVector::new(9.5, 1.0, 0.2, 2.0, 0.0), 99.0);
        let delta = fd_delta(up, down);
        assert_eq!(delta, ValueVector::new(0.5, 0.0, -0.1, 0.0, 0.0));
    }

    #[test]
    fn test_fd_delta_degenerate_denominator() {
        let up = (ValueVector::splat(3.0), 0.9);
        let down = (ValueVector::splat(1.0), 0.9);
        assert_eq!(fd_delta(up, down), ValueVector::ZERO);
    }

    #[test]
    fn test_default_bumps() {
        let bumps = FdBumps::default();
        assert_eq!(bumps.stock, 0.005);
        assert_eq!(bumps.rate, 0.002);
    }
}
