//! Profit-sharing contract P&L simulator
//!
//! Simulates outer real-world scenarios, one per parameter set, and writes the
//! hedged (or unhedged) profit and loss of each scenario to a results file.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use profit_sharing_mc::config::{loader, RiskNeutralInputs, RunOptions};
use profit_sharing_mc::pricing::FdBumps;
use profit_sharing_mc::replication::RecordingObserver;
use profit_sharing_mc::scenario::write_results;
use profit_sharing_mc::{BaselineStepping, ModelFamily, ScenarioRunner, Time};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "profit_sharing_mc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model family: bs-vasicek or cev-ckls
    model: ModelFamily,

    /// CSV file of real-world parameter sets, one per row after a header
    parameter_file: PathBuf,

    /// Number of outer scenarios
    #[arg(long, default_value_t = 100)]
    paths: usize,

    /// Rebalancing dates over the contract life (0 disables hedging)
    #[arg(long, default_value_t = 10)]
    hedges: i64,

    /// Inner Monte Carlo paths per rebalancing date
    #[arg(long, default_value_t = 100)]
    inner_paths: usize,

    /// Steps of the real-world asset grid over the contract life
    #[arg(long, default_value_t = 40)]
    path_points: i64,

    #[arg(long, default_value_t = 0.03)]
    r0: f64,

    #[arg(long, default_value_t = 100.0)]
    s0: f64,

    #[arg(long, default_value_t = 10_000.0)]
    l0: f64,

    /// Contract maturity in years
    #[arg(long, default_value_t = 10)]
    maturity: i64,

    #[arg(long, default_value_t = 0.2)]
    rn_stock_vol: f64,

    #[arg(long, default_value_t = 1.0)]
    rn_stock_exp: f64,

    #[arg(long, default_value_t = 0.3)]
    rn_rate_speed: f64,

    #[arg(long, default_value_t = 0.03)]
    rn_rate_level: f64,

    #[arg(long, default_value_t = 0.01)]
    rn_rate_vol: f64,

    #[arg(long, default_value_t = 0.5)]
    rn_rate_exp: f64,

    #[arg(long, default_value_t = -0.3, allow_hyphen_values = true)]
    rn_correlation: f64,

    /// Relative stock bump of the finite-difference deltas
    #[arg(long, default_value_t = 0.005)]
    bump_stock: f64,

    /// Absolute short-rate bump of the finite-difference deltas
    #[arg(long, default_value_t = 0.002)]
    bump_rate: f64,

    /// Fixed step of the unhedged baseline, e.g. 1/2; payoff dates if omitted
    #[arg(long)]
    baseline_step: Option<Time>,

    /// Results file, one line per scenario
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Rebalancing trace of the first scenario as CSV
    #[arg(long)]
    trace_file: Option<PathBuf>,

    /// Base seed; scenario i uses seed + i
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            model: self.model,
            parameter_file: self.parameter_file.clone(),
            n_paths: self.paths,
            n_hedges: self.hedges,
            inner_samples: self.inner_paths,
            path_points: self.path_points,
            r0: self.r0,
            s0: self.s0,
            l0: self.l0,
            maturity: self.maturity,
            risk_neutral: RiskNeutralInputs {
                stock_vol: self.rn_stock_vol,
                stock_exp: self.rn_stock_exp,
                rate_speed: self.rn_rate_speed,
                rate_level: self.rn_rate_level,
                rate_vol: self.rn_rate_vol,
                rate_exp: self.rn_rate_exp,
                correlation: self.rn_correlation,
            },
            bumps: FdBumps {
                stock: self.bump_stock,
                rate: self.bump_rate,
            },
            baseline: self
                .baseline_step
                .map_or(BaselineStepping::PayoffGrid, BaselineStepping::FixedStep),
            output: self.output.clone(),
            seed: self.seed,
            ..RunOptions::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.run_options();
    info!("{:?}", options);

    let parameters = loader::load_parameter_sets(&options.parameter_file, options.model)
        .with_context(|| format!("loading {}", options.parameter_file.display()))?;
    let parameters = loader::expand_or_crop(parameters, options.n_paths)?;
    info!("{} parameter sets after expansion", parameters.len());

    let runner = ScenarioRunner::new(&options).context("setting up the simulation")?;
    println!("initial value: {}", runner.initial_value());

    if let (Some(trace_file), Some(first)) = (&cli.trace_file, parameters.first()) {
        let mut observer = RecordingObserver::with_value();
        runner.run_observed(first, options.seed, &mut observer)?;
        let file = File::create(trace_file)
            .with_context(|| format!("creating {}", trace_file.display()))?;
        observer.write_csv(BufWriter::new(file))?;
        info!("wrote {} rebalancing records", observer.records().len());
    }

    let results = runner.run_batch(&parameters)?;

    let file = File::create(&options.output)
        .with_context(|| format!("creating {}", options.output.display()))?;
    write_results(&results, BufWriter::new(file))?;
    println!(
        "Written {} scenarios to {}",
        results.len(),
        options.output.display()
    );
    Ok(())
}
