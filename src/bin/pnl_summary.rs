//! Summarize a results file: count, mean, standard deviation and mean
//! absolute P&L per value component

use anyhow::{bail, Context, Result};
use clap::Parser;
use profit_sharing_mc::ValueVector;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pnl_summary", about = "Summary statistics of simulated P&L")]
struct Cli {
    /// Results file with one `v,c,d,res,surr` line per scenario
    results: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    count: usize,
    mean: ValueVector,
    std_dev: ValueVector,
    mean_abs: ValueVector,
}

fn summarize(results: &[ValueVector]) -> Summary {
    let n = results.len() as f64;
    let mean = results.iter().copied().sum::<ValueVector>() / n;
    let variance = results
        .iter()
        .map(|&x| (x - mean) * (x - mean))
        .sum::<ValueVector>()
        / (n - 1.0).max(1.0);
    let mean_abs = results.iter().map(|x| x.abs()).sum::<ValueVector>() / n;
    Summary {
        count: results.len(),
        mean,
        std_dev: variance.sqrt(),
        mean_abs,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(&cli.results)
        .with_context(|| format!("opening {}", cli.results.display()))?;
    let results = reader
        .deserialize::<ValueVector>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("reading {}", cli.results.display()))?;
    if results.is_empty() {
        bail!("{} contains no results", cli.results.display());
    }

    let summary = summarize(&results);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} scenarios", summary.count);
    println!("{:>10} {:>14} {:>14} {:>14}", "", "mean", "std dev", "mean |x|");
    let names = ["V", "C", "D", "Res", "Surr"];
    let (mean, std_dev, mean_abs) = (
        summary.mean.components(),
        summary.std_dev.components(),
        summary.mean_abs.components(),
    );
    for (i, name) in names.iter().enumerate() {
        println!(
            "{:>10} {:>14.4} {:>14.4} {:>14.4}",
            name, mean[i], std_dev[i], mean_abs[i]
        );
    }
    Ok(())
}
