//! Five-component payoff and valuation vector
//!
//! The same vector space is used for per-step contract payoffs, discounted
//! contract values, hedge deltas and the replication money account.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Payoff/valuation aggregate of the profit-sharing contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueVector {
    /// European part: guaranteed liability paid at maturity
    pub v: f64,
    /// Interest rate guarantee cost
    pub c: f64,
    /// Surplus distribution (dividends) paid to the policyholder
    pub d: f64,
    /// Reserve: pool in excess of the liability
    pub res: f64,
    /// Surrender option
    pub surr: f64,
}

impl ValueVector {
    pub const ZERO: ValueVector = ValueVector {
        v: 0.0,
        c: 0.0,
        d: 0.0,
        res: 0.0,
        surr: 0.0,
    };

    pub fn new(v: f64, c: f64, d: f64, res: f64, surr: f64) -> Self {
        Self { v, c, d, res, surr }
    }

    /// Vector with every component equal to `h`
    pub fn splat(h: f64) -> Self {
        Self::new(h, h, h, h, h)
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.v), f(self.c), f(self.d), f(self.res), f(self.surr))
    }

    fn zip(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self::new(
            f(self.v, other.v),
            f(self.c, other.c),
            f(self.d, other.d),
            f(self.res, other.res),
            f(self.surr, other.surr),
        )
    }

    pub fn abs(self) -> Self {
        self.map(f64::abs)
    }

    pub fn sqrt(self) -> Self {
        self.map(f64::sqrt)
    }

    pub fn components(&self) -> [f64; 5] {
        [self.v, self.c, self.d, self.res, self.surr]
    }

    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|x| x.is_finite())
    }
}

impl Add for ValueVector {
    type Output = ValueVector;

    fn add(self, other: Self) -> Self {
        self.zip(other, |a, b| a + b)
    }
}

impl Sub for ValueVector {
    type Output = ValueVector;

    fn sub(self, other: Self) -> Self {
        self.zip(other, |a, b| a - b)
    }
}

impl Mul for ValueVector {
    type Output = ValueVector;

    fn mul(self, other: Self) -> Self {
        self.zip(other, |a, b| a * b)
    }
}

impl Div for ValueVector {
    type Output = ValueVector;

    fn div(self, other: Self) -> Self {
        self.zip(other, |a, b| a / b)
    }
}

impl Mul<f64> for ValueVector {
    type Output = ValueVector;

    fn mul(self, h: f64) -> Self {
        self.map(|a| a * h)
    }
}

impl Div<f64> for ValueVector {
    type Output = ValueVector;

    fn div(self, h: f64) -> Self {
        self.map(|a| a / h)
    }
}

impl Neg for ValueVector {
    type Output = ValueVector;

    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl AddAssign for ValueVector {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for ValueVector {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl MulAssign<f64> for ValueVector {
    fn mul_assign(&mut self, h: f64) {
        *self = *self * h;
    }
}

impl DivAssign<f64> for ValueVector {
    fn div_assign(&mut self, h: f64) {
        *self = *self / h;
    }
}

impl Sum for ValueVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ValueVector::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for ValueVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{},{}", self.v, self.c, self.d, self.res, self.surr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn close(a: ValueVector, b: ValueVector) -> bool {
        a.components()
            .iter()
            .zip(b.components().iter())
            .all(|(x, y)| (x - y).abs() <= 1e-9 * (1.0 + x.abs().max(y.abs())))
    }

    fn value_vector() -> impl Strategy<Value = ValueVector> {
        prop::array::uniform5(-1e6f64..1e6)
            .prop_map(|[v, c, d, res, surr]| ValueVector::new(v, c, d, res, surr))
    }

    proptest! {
        #[test]
        fn prop_add_then_subtract(a in value_vector(), b in value_vector()) {
            prop_assert!(close((a + b) - b, a));
        }

        #[test]
        fn prop_multiplicative_identity(a in value_vector()) {
            prop_assert_eq!(a * 1.0, a);
        }

        #[test]
        fn prop_self_difference_is_zero(a in value_vector()) {
            prop_assert_eq!((a - a).abs(), ValueVector::ZERO);
        }
    }

    #[test]
    fn test_componentwise_ops() {
        let a = ValueVector::new(1.0, 4.0, 9.0, -16.0, 25.0);
        let b = ValueVector::splat(2.0);

        assert_eq!(a * b, a * 2.0);
        assert_eq!(a / b, a / 2.0);
        assert_eq!(a.abs().res, 16.0);
        assert_relative_eq!(a.abs().sqrt().d, 3.0);
        assert_eq!(-a + a, ValueVector::ZERO);

        let mut m = a;
        m *= 3.0;
        m /= 3.0;
        m += b;
        m -= b;
        assert!(close(m, a));

        let total: ValueVector = vec![a, b, b].into_iter().sum();
        assert_eq!(total, a + b * 2.0);
    }

    #[test]
    fn test_display_is_comma_separated() {
        let a = ValueVector::new(1.5, 0.0, -2.0, 3.25, 0.0);
        assert_eq!(a.to_string(), "1.5,0,-2,3.25,0");
    }
}
