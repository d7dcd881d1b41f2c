//! Hedge instruments: the equity and the zero-coupon bond maturing with the contract

use crate::value_vector::ValueVector;
use std::ops::{AddAssign, Div};

/// Prices of the two hedge instruments at a valuation date
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Underlyings {
    pub stock: f64,
    pub bond: f64,
}

/// Sensitivities of every contract component to the two hedge instruments
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Deltas {
    pub stock: ValueVector,
    pub bond: ValueVector,
}

impl Deltas {
    /// Cash received when moving from `self` to `target` at `prices`
    pub fn rebalancing_cashflow(&self, target: &Deltas, prices: &Underlyings) -> ValueVector {
        (self.stock - target.stock) * prices.stock + (self.bond - target.bond) * prices.bond
    }
}

impl AddAssign for Deltas {
    fn add_assign(&mut self, other: Self) {
        self.stock += other.stock;
        self.bond += other.bond;
    }
}

impl Div<f64> for Deltas {
    type Output = Deltas;

    fn div(self, h: f64) -> Self {
        Deltas {
            stock: self.stock / h,
            bond: self.bond / h,
        }
    }
}
