//! Exact simulation time
//!
//! Simulation grids are keyed by rational years so that a hedge date of 10/3
//! and an asset step of 1/12 compare without floating point drift.

use num_rational::Ratio;
use num_traits::ToPrimitive;

/// Simulation time in years as an exact fraction
pub type Time = Ratio<i64>;

/// Build a time value `numer / denom`
///
/// Panics if `denom` is zero, like `Ratio::new`.
pub fn time(numer: i64, denom: i64) -> Time {
    Ratio::new(numer, denom)
}

/// Whole number of years
pub fn years(n: i64) -> Time {
    Ratio::from_integer(n)
}

/// Time as a floating point year fraction
pub fn to_f64(t: Time) -> f64 {
    t.to_f64().unwrap_or(f64::NAN)
}

/// True when `span` is an exact non-negative multiple of `step`
pub fn is_multiple(span: Time, step: Time) -> bool {
    step > Ratio::from_integer(0) && span >= Ratio::from_integer(0) && (span / step).is_integer()
}
