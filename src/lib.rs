//! Profit-sharing contract hedging by nested Monte Carlo
//!
//! This library provides:
//! - Exact rational time grids and fixed-step paths
//! - Black-Scholes/Vasicek and CEV/CKLS asset dynamics
//! - The profit-sharing contract recursion with guarantee and surplus distribution
//! - Nested Monte Carlo valuation with finite-difference hedge deltas
//! - Hedged and unhedged profit and loss per outer scenario, run in parallel batches

pub mod config;
pub mod contract;
pub mod error;
pub mod market;
pub mod path;
pub mod pricing;
pub mod replication;
pub mod scenario;
pub mod value_vector;

// Re-export commonly used types
pub use config::RunOptions;
pub use contract::{ContractState, ContractTraits};
pub use error::{Result, SimulationError};
pub use market::{AssetState, Dynamics, ModelFamily, ModelParams};
pub use path::{Path, Time};
pub use pricing::{NestedPricingFactory, PricingModel};
pub use replication::{BaselineStepping, HedgeTraits, ProfitAndLoss};
pub use scenario::ScenarioRunner;
pub use value_vector::ValueVector;
