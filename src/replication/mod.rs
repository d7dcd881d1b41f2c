//! Outer-scenario profit and loss of hedged and unhedged contracts

mod engine;
mod observer;

pub use engine::{
    replication_profit_and_loss, zero_hedge_profit_and_loss, BaselineStepping, HedgeTraits,
    ProfitAndLoss,
};
pub use observer::{NoopObserver, RebalanceObserver, RebalanceRecord, RecordingObserver, TraceRow};
