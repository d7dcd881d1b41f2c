//! Asset state transition models
//!
//! Two model families, each usable under the risk-neutral or the real-world
//! measure:
//! - Black-Scholes equity with a Vasicek short rate. The rate and its
//!   integral over the step use the exact Ornstein-Uhlenbeck transition.
//! - CEV equity with a CKLS short rate, both discretised with
//!   Euler-Maruyama.
//!
//! The measures differ only in the equity drift. Rates are clamped after each
//! step (`[1e-6, 0.5]` and `[0, 0.5]` respectively) so the elasticity terms
//! stay defined; this is a modelling approximation.

use super::assets::AssetState;
use super::variates::Variates;
use crate::error::{Result, SimulationError};
use crate::path::{to_f64, Time};
use std::fmt;
use std::str::FromStr;

const VASICEK_RATE_FLOOR: f64 = 1e-6;
const CKLS_RATE_FLOOR: f64 = 0.0;
const RATE_CAP: f64 = 0.5;

/// Probability measure the dynamics are simulated under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    RiskNeutral,
    RealWorld,
}

/// Closed table of supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    BlackScholesVasicek,
    CevCkls,
}

impl ModelFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::BlackScholesVasicek => "BS_Vas",
            ModelFamily::CevCkls => "CevCkls",
        }
    }

    /// Length of the parameter vector the family is built from
    pub fn parameter_count(&self) -> usize {
        match self {
            ModelFamily::BlackScholesVasicek => 6,
            ModelFamily::CevCkls => 8,
        }
    }
}

impl FromStr for ModelFamily {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BS_Vas" | "BSVasicek" | "bs-vasicek" => Ok(ModelFamily::BlackScholesVasicek),
            "CevCkls" | "CEV_CKLS" | "cev-ckls" => Ok(ModelFamily::CevCkls),
            other => Err(SimulationError::UnknownModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Black-Scholes / Vasicek parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsVasicekParams {
    /// Real-world equity drift
    pub mu: f64,
    /// Equity volatility
    pub sigma: f64,
    /// Mean reversion speed
    pub kappa: f64,
    /// Mean reversion level
    pub theta: f64,
    /// Short rate volatility
    pub rate_vol: f64,
    /// Rate/equity correlation
    pub rho: f64,
}

/// CEV / CKLS parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CevCklsParams {
    pub mu: f64,
    pub sigma: f64,
    /// Equity elasticity
    pub alpha: f64,
    pub kappa: f64,
    pub theta: f64,
    pub rate_vol: f64,
    /// Rate elasticity
    pub xi: f64,
    pub rho: f64,
}

/// Parameter set of one model family
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelParams {
    BsVasicek(BsVasicekParams),
    CevCkls(CevCklsParams),
}

impl ModelParams {
    /// Build from a flat parameter vector in the family's column order
    pub fn from_slice(family: ModelFamily, p: &[f64]) -> Result<Self> {
        if p.len() != family.parameter_count() {
            return Err(SimulationError::ParameterCount {
                model: family.name(),
                expected: family.parameter_count(),
                actual: p.len(),
            });
        }
        let params = match family {
            ModelFamily::BlackScholesVasicek => ModelParams::BsVasicek(BsVasicekParams {
                mu: p[0],
                sigma: p[1],
                kappa: p[2],
                theta: p[3],
                rate_vol: p[4],
                rho: p[5],
            }),
            ModelFamily::CevCkls => ModelParams::CevCkls(CevCklsParams {
                mu: p[0],
                sigma: p[1],
                alpha: p[2],
                kappa: p[3],
                theta: p[4],
                rate_vol: p[5],
                xi: p[6],
                rho: p[7],
            }),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParams::BsVasicek(_) => ModelFamily::BlackScholesVasicek,
            ModelParams::CevCkls(_) => ModelFamily::CevCkls,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            ModelParams::BsVasicek(p) => vec![p.mu, p.sigma, p.kappa, p.theta, p.rate_vol, p.rho],
            ModelParams::CevCkls(p) => vec![
                p.mu, p.sigma, p.alpha, p.kappa, p.theta, p.rate_vol, p.xi, p.rho,
            ],
        }
    }

    fn rho(&self) -> f64 {
        match self {
            ModelParams::BsVasicek(p) => p.rho,
            ModelParams::CevCkls(p) => p.rho,
        }
    }

    fn validate(&self) -> Result<()> {
        let rho = self.rho();
        if !(-1.0..=1.0).contains(&rho) {
            return Err(SimulationError::InvalidParameter {
                name: "rho",
                reason: format!("correlation {} outside [-1, 1]", rho),
            });
        }
        if let ModelParams::BsVasicek(p) = self {
            if p.kappa <= 0.0 {
                return Err(SimulationError::InvalidParameter {
                    name: "kappa",
                    reason: format!("mean reversion speed {} must be positive", p.kappa),
                });
            }
        }
        Ok(())
    }
}

/// Constants of the exact Vasicek transition over one step
#[derive(Debug, Clone, Copy, PartialEq)]
struct VasicekStep {
    sqrt_dt: f64,
    /// exp(-kappa dt)
    ekt: f64,
    /// (1 - exp(-kappa dt)) / kappa
    psi: f64,
    std_rate: f64,
    std_int_rate: f64,
    /// Ito correction of the log-normal equity step
    drift_correction: f64,
}

impl VasicekStep {
    fn new(p: &BsVasicekParams, dt: f64) -> Self {
        let ekt = (-p.kappa * dt).exp();
        let e2kt = ekt * ekt;
        let psi = (1.0 - ekt) / p.kappa;
        let std_rate = p.rate_vol * ((1.0 - e2kt) / (2.0 * p.kappa)).sqrt();
        let int_var = dt - 2.0 * (1.0 - ekt) / p.kappa + (1.0 - e2kt) / (2.0 * p.kappa);
        let std_int_rate = p.rate_vol / p.kappa * int_var.max(0.0).sqrt();
        Self {
            sqrt_dt: dt.sqrt(),
            ekt,
            psi,
            std_rate,
            std_int_rate,
            drift_correction: 0.5 * p.sigma * p.sigma * dt,
        }
    }
}

/// Parameters plus the step constants derived once from `dt`
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transition {
    BsVasicek(BsVasicekParams, VasicekStep),
    CevCkls(CevCklsParams, f64),
}

/// Immutable dynamics configuration for one step size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dynamics {
    params: ModelParams,
    dt: Time,
    dt_years: f64,
    rho_complement: f64,
    transition: Transition,
}

impl Dynamics {
    pub fn new(params: ModelParams, dt: Time) -> Result<Self> {
        let dt_years = to_f64(dt);
        if !(dt_years > 0.0) {
            return Err(SimulationError::InvalidStep { dt });
        }
        params.validate()?;
        let rho = params.rho();
        let transition = match params {
            ModelParams::BsVasicek(p) => Transition::BsVasicek(p, VasicekStep::new(&p, dt_years)),
            ModelParams::CevCkls(p) => Transition::CevCkls(p, dt_years.sqrt()),
        };
        Ok(Self {
            params,
            dt,
            dt_years,
            rho_complement: (1.0 - rho * rho).sqrt(),
            transition,
        })
    }

    /// Same model with constants recomputed for another step size
    pub fn with_step(&self, dt: Time) -> Result<Self> {
        Self::new(self.params, dt)
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn dt(&self) -> Time {
        self.dt
    }

    pub fn family(&self) -> ModelFamily {
        self.params.family()
    }

    pub fn risk_neutral_step(&self, v: &Variates, a: &AssetState) -> AssetState {
        self.step(Measure::RiskNeutral, v, a)
    }

    pub fn real_world_step(&self, v: &Variates, a: &AssetState) -> AssetState {
        self.step(Measure::RealWorld, v, a)
    }

    /// Next asset state after one step of size `dt`
    pub fn step(&self, measure: Measure, v: &Variates, a: &AssetState) -> AssetState {
        let equity_shock = self.equity_shock(v);
        match &self.transition {
            Transition::BsVasicek(p, k) => {
                let dt = self.dt_years;
                let rate = (a.short_rate * k.ekt + p.theta * (1.0 - k.ekt) + k.std_rate * v.w1)
                    .clamp(VASICEK_RATE_FLOOR, RATE_CAP);
                let integrated_rate =
                    (a.short_rate * k.psi + p.theta * (dt - k.psi) + k.std_int_rate * v.w1)
                        .clamp(VASICEK_RATE_FLOOR, RATE_CAP);
                let drift = match measure {
                    Measure::RiskNeutral => integrated_rate - k.drift_correction,
                    Measure::RealWorld => p.mu * dt,
                };
                AssetState {
                    stock: a.stock * (drift + p.sigma * k.sqrt_dt * equity_shock).exp(),
                    short_rate: rate,
                    integrated_rate,
                }
            }
            Transition::CevCkls(p, sqrt_dt) => {
                let dt = self.dt_years;
                // elasticity bases below zero (a bumped rate, an Euler undershoot) give NaN
                let rate = (a.short_rate
                    + p.kappa * (p.theta - a.short_rate) * dt
                    + p.rate_vol * a.short_rate.max(0.0).powf(p.xi) * sqrt_dt * v.w1)
                    .clamp(CKLS_RATE_FLOOR, RATE_CAP);
                let drift = match measure {
                    Measure::RiskNeutral => a.short_rate,
                    Measure::RealWorld => p.mu,
                };
                AssetState {
                    stock: a.stock
                        + drift * a.stock * dt
                        + p.sigma * a.stock.max(0.0).powf(p.alpha) * sqrt_dt * equity_shock,
                    short_rate: rate,
                    integrated_rate: 0.5 * (a.short_rate + rate) * dt,
                }
            }
        }
    }

    fn equity_shock(&self, v: &Variates) -> f64 {
        self.params.rho() * v.w1 + self.rho_complement * v.w2
    }
}
