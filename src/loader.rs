//! Builds the population a configuration describes.
//!
//! Cleaning happens here, once: whatever the source, downstream code only
//! ever sees a finite, non-empty population.

use crate::config::PopulationConfig;
use crate::population::Population;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Normal, Uniform};
use std::{fs::File, io::Read, path::Path};

/// Field values treated as missing and skipped when reading CSV data.
const MISSING_MARKERS: [&str; 6] = ["", "NA", "na", "NaN", "nan", "."];

/// Load the population described by `source`.
///
/// Synthetic sources carry their own seed, so the same configuration
/// always yields the same population regardless of the per-run seed.
pub fn load(source: &PopulationConfig) -> Result<Population> {
    let values = match source {
        PopulationConfig::Csv { path, column } => read_csv_file(path, column)?,
        PopulationConfig::Normal {
            mean,
            std_dev,
            count,
            seed,
        } => {
            let mut rng = ChaCha12Rng::seed_from_u64(*seed);
            let dist = Normal::new(*mean, *std_dev)?;
            (0..*count).map(|_| dist.sample(&mut rng)).collect()
        }
        PopulationConfig::Uniform {
            low,
            high,
            count,
            seed,
        } => {
            let mut rng = ChaCha12Rng::seed_from_u64(*seed);
            let dist = Uniform::new(*low, *high)?;
            (0..*count).map(|_| dist.sample(&mut rng)).collect()
        }
        PopulationConfig::Integers { start, end } => {
            (*start..=*end).map(|val| val as f64).collect()
        }
    };

    Ok(Population::new(values)?)
}

fn read_csv_file(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = File::open(path).with_context(|| format!("failed to open {path:?}"))?;
    let values = read_csv_column(file, column)
        .with_context(|| format!("failed to read column {column:?} from {path:?}"))?;
    log::info!("loaded {} values from column {column:?} of {path:?}", values.len());
    Ok(values)
}

fn read_csv_column<R: Read>(reader: R, column: &str) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers().context("failed to read csv headers")?;
    let i_col = headers
        .iter()
        .position(|name| name == column)
        .with_context(|| format!("column {column:?} not found in header {headers:?}"))?;

    let mut values = Vec::new();
    let mut skipped = 0;
    for (i_rec, record) in reader.records().enumerate() {
        let record = record.context("failed to read csv record")?;
        let field = record.get(i_col).unwrap_or("").trim();

        if MISSING_MARKERS.contains(&field) {
            skipped += 1;
            continue;
        }

        // Data rows start at 2: line 1 is the header.
        let value: f64 = field
            .parse()
            .with_context(|| format!("failed to parse {field:?} at row {}", i_rec + 2))?;
        if !value.is_finite() {
            bail!("non-finite value {field:?} at row {}", i_rec + 2);
        }
        values.push(value);
    }

    if skipped > 0 {
        log::info!("skipped {skipped} missing values in column {column:?}");
    }

    Ok(values)
}
