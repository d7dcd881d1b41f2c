//! Load real-world parameter sets from CSV
//!
//! The first line is a header. Each following row is one parameter set in
//! the column order of the model family.

use crate::error::{Result, SimulationError};
use crate::market::{ModelFamily, ModelParams};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load all parameter sets from a CSV file
pub fn load_parameter_sets(path: &Path, family: ModelFamily) -> Result<Vec<ModelParams>> {
    let file = File::open(path)?;
    load_parameter_sets_from_reader(file, family)
}

pub fn load_parameter_sets_from_reader<R: Read>(
    reader: R,
    family: ModelFamily,
) -> Result<Vec<ModelParams>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut sets = Vec::new();
    for (row, record) in csv.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| SimulationError::InvalidParameter {
                        name: "parameter file",
                        reason: format!("row {}: '{}' is not a number ({})", row + 1, field, e),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        sets.push(ModelParams::from_slice(family, &values)?);
    }
    Ok(sets)
}

/// Resize `sets` to `n` entries.
///
/// Longer lists are cropped. Shorter lists repeat each entry `n / len`
/// times in place, which requires `n` to be a multiple of the length.
pub fn expand_or_crop<T: Clone>(mut sets: Vec<T>, n: usize) -> Result<Vec<T>> {
    if sets.len() >= n {
        sets.truncate(n);
        return Ok(sets);
    }
    if sets.is_empty() || n % sets.len() != 0 {
        return Err(SimulationError::InvalidParameter {
            name: "n_paths",
            reason: format!(
                "{} scenarios cannot be spread evenly over {} parameter sets",
                n,
                sets.len()
            ),
        });
    }
    let quotient = n / sets.len();
    Ok((0..n).map(|i| sets[i / quotient].clone()).collect())
}
