//! Hooks into the rebalancing loop

use crate::value_vector::ValueVector;
use serde::Serialize;

/// Snapshot taken right after the hedge is rebalanced at `t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalanceRecord {
    pub t: f64,
    pub stock: f64,
    pub short_rate: f64,
    /// Sum of the integrated short rate since the previous rebalancing
    pub log_compounding: f64,
    /// Liability at the last anniversary on or before `t`
    pub liability: f64,
    pub bond: f64,
    /// Contract value at `t`, only computed when the observer asks for it
    pub value: Option<ValueVector>,
    pub money_account: ValueVector,
    pub stock_delta: ValueVector,
    pub bond_delta: ValueVector,
}

/// Flat CSV row of a record; deltas and value are reported for the V component
#[derive(Debug, Clone, Serialize)]
pub struct TraceRow {
    pub t: f64,
    pub stock: f64,
    pub short_rate: f64,
    pub log_compounding: f64,
    pub liability: f64,
    pub bond: f64,
    pub value: Option<f64>,
    pub money_v: f64,
    pub money_c: f64,
    pub money_d: f64,
    pub money_res: f64,
    pub money_surr: f64,
    pub stock_delta: f64,
    pub bond_delta: f64,
}

impl From<&RebalanceRecord> for TraceRow {
    fn from(r: &RebalanceRecord) -> Self {
        Self {
            t: r.t,
            stock: r.stock,
            short_rate: r.short_rate,
            log_compounding: r.log_compounding,
            liability: r.liability,
            bond: r.bond,
            value: r.value.map(|v| v.v),
            money_v: r.money_account.v,
            money_c: r.money_account.c,
            money_d: r.money_account.d,
            money_res: r.money_account.res,
            money_surr: r.money_account.surr,
            stock_delta: r.stock_delta.v,
            bond_delta: r.bond_delta.v,
        }
    }
}

pub trait RebalanceObserver {
    /// Whether records should carry the contract value
    fn wants_value(&self) -> bool {
        false
    }

    fn on_rebalance(&mut self, record: &RebalanceRecord);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RebalanceObserver for NoopObserver {
    fn on_rebalance(&mut self, _record: &RebalanceRecord) {}
}

/// Keeps every record in rebalancing order
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    records: Vec<RebalanceRecord>,
    with_value: bool,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also price the contract at each rebalancing date
    pub fn with_value() -> Self {
        Self {
            records: Vec::new(),
            with_value: true,
        }
    }

    pub fn records(&self) -> &[RebalanceRecord] {
        &self.records
    }

    /// Write the trace as CSV with a header line
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> crate::error::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv.serialize(TraceRow::from(record))?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl RebalanceObserver for RecordingObserver {
    fn wants_value(&self) -> bool {
        self.with_value
    }

    fn on_rebalance(&mut self, record: &RebalanceRecord) {
        self.records.push(*record);
    }
}
