//! Fixed-step, time-indexed paths
//!
//! A [`Path`] covers `[t0, T]` with spacing `dt` and holds one value per grid
//! point. Every simulated quantity (variates, asset states, contract states,
//! payoffs) lives on a path.

mod time;

pub use time::{is_multiple, time, to_f64, years, Time};

use crate::error::{Result, SimulationError};
use num_rational::Ratio;
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};

/// Dense sequence of values on the grid `t0, t0 + dt, ..., T`
#[derive(Debug, Clone, PartialEq)]
pub struct Path<V> {
    dt: Time,
    t0: Time,
    horizon: Time,
    points: Vec<V>,
}

impl<V: Clone + Default> Path<V> {
    /// Create a path of default values.
    ///
    /// Fails if `dt` is not positive or `horizon - t0` is not an exact
    /// multiple of `dt`.
    pub fn new(dt: Time, horizon: Time, t0: Time) -> Result<Self> {
        if dt <= Ratio::from_integer(0) {
            return Err(SimulationError::InvalidStep { dt });
        }
        let steps = (horizon - t0) / dt;
        if !steps.is_integer() || horizon < t0 {
            return Err(SimulationError::GridMisaligned {
                dt,
                horizon,
                start: t0,
            });
        }
        let len = steps.to_integer() as usize + 1;
        Ok(Self {
            dt,
            t0,
            horizon,
            points: vec![V::default(); len],
        })
    }

    /// Create a path starting at time zero
    pub fn from_zero(dt: Time, horizon: Time) -> Result<Self> {
        Self::new(dt, horizon, Ratio::from_integer(0))
    }
}

impl<V> Path<V> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dt(&self) -> Time {
        self.dt
    }

    pub fn t0(&self) -> Time {
        self.t0
    }

    pub fn horizon(&self) -> Time {
        self.horizon
    }

    /// Time of grid point `index`, computed from the offset
    pub fn time_at(&self, index: usize) -> Time {
        self.t0 + self.dt * Ratio::from_integer(index as i64)
    }

    /// Index of the grid point exactly at `t`
    pub fn index_at(&self, t: Time) -> Result<usize> {
        if t < self.t0 || t > self.horizon {
            return Err(self.out_of_range(t));
        }
        let offset = (t - self.t0) / self.dt;
        if !offset.is_integer() {
            return Err(SimulationError::OffGrid {
                t,
                dt: self.dt,
                start: self.t0,
                horizon: self.horizon,
            });
        }
        Ok(offset.to_integer() as usize)
    }

    /// Index of the last grid point on or before `t`, clamped to the final point
    pub fn last_index_on_or_before(&self, t: Time) -> Result<usize> {
        if t < self.t0 {
            return Err(self.out_of_range(t));
        }
        let index = ((t - self.t0) / self.dt).floor().to_integer() as usize;
        Ok(index.min(self.points.len() - 1))
    }

    /// Index of the first grid point strictly after `t`; requires `t < T`
    pub fn first_index_after(&self, t: Time) -> Result<usize> {
        if t >= self.horizon {
            return Err(self.out_of_range(t));
        }
        let index = ((t - self.t0) / self.dt).floor().to_integer() + 1;
        Ok(index.max(0) as usize)
    }

    pub fn at(&self, index: usize) -> Result<&V> {
        let len = self.points.len();
        self.points
            .get(index)
            .ok_or(SimulationError::IndexOutOfBounds { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut V> {
        let len = self.points.len();
        self.points
            .get_mut(index)
            .ok_or(SimulationError::IndexOutOfBounds { index, len })
    }

    pub fn at_time(&self, t: Time) -> Result<&V> {
        let index = self.index_at(t)?;
        Ok(&self.points[index])
    }

    pub fn at_time_mut(&mut self, t: Time) -> Result<&mut V> {
        let index = self.index_at(t)?;
        Ok(&mut self.points[index])
    }

    /// Value at `t` if `t` is a grid point
    pub fn get_at_time(&self, t: Time) -> Option<&V> {
        self.index_at(t).ok().map(|i| &self.points[i])
    }

    pub fn first(&self) -> &V {
        &self.points[0]
    }

    pub fn last(&self) -> &V {
        &self.points[self.points.len() - 1]
    }

    pub fn values(&self) -> &[V] {
        &self.points
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.points
    }

    /// Iterate `(time, value)` pairs from the start of the path
    pub fn iter(&self) -> Points<'_, V> {
        self.iter_from(0)
    }

    /// Iterate `(time, value)` pairs starting at grid index `start`
    pub fn iter_from(&self, start: usize) -> Points<'_, V> {
        Points {
            path: self,
            front: start.min(self.points.len()),
            back: self.points.len(),
        }
    }

    fn out_of_range(&self, t: Time) -> SimulationError {
        SimulationError::OutOfRange {
            t,
            start: self.t0,
            horizon: self.horizon,
        }
    }
}

impl<V> Index<usize> for Path<V> {
    type Output = V;

    fn index(&self, index: usize) -> &V {
        &self.points[index]
    }
}

impl<V> IndexMut<usize> for Path<V> {
    fn index_mut(&mut self, index: usize) -> &mut V {
        &mut self.points[index]
    }
}

/// Double-ended iterator over `(time, value)` pairs of a path
#[derive(Debug, Clone)]
pub struct Points<'a, V> {
    path: &'a Path<V>,
    front: usize,
    back: usize,
}

impl<'a, V> Iterator for Points<'a, V> {
    type Item = (Time, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let i = self.front;
        self.front += 1;
        Some((self.path.time_at(i), &self.path.points[i]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<V> DoubleEndedIterator for Points<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some((self.path.time_at(self.back), &self.path.points[self.back]))
    }
}

impl<V> ExactSizeIterator for Points<'_, V> {}

impl<V> FusedIterator for Points<'_, V> {}
