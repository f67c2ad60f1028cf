use crate::error;
use crate::population::Population;
use crate::sampler;
use anyhow::{Context, Result};
use rand::prelude::*;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Run one resampling experiment and collect the empirical sampling
/// distribution of the statistic.
///
/// Repeats `trials` times: draw a sample of `sample_size` values from the
/// population, apply `statistic`, append the result. Zero trials yield an
/// empty distribution. Any sampler or statistic error aborts the remaining
/// trials, so the output never holds partial garbage.
///
/// Trials are independent; for a fixed `rng` state the output sequence is
/// fully reproducible.
pub fn run<F, R>(
    population: &Population,
    sample_size: usize,
    trials: usize,
    replacement: bool,
    mut statistic: F,
    rng: &mut R,
) -> error::Result<Vec<f64>>
where
    F: FnMut(&[f64]) -> error::Result<f64>,
    R: Rng,
{
    let mut values = Vec::with_capacity(trials);
    let mut sample = Vec::with_capacity(sample_size);

    for _ in 0..trials {
        sampler::draw(&mut sample, population, sample_size, replacement, rng)?;
        values.push(statistic(&sample)?);
    }

    Ok(values)
}

/// Sampling distribution of one experiment, as persisted to disk.
///
/// Carries the sampling parameters, the descriptors of the population and
/// statistic that produced the values, and the seed/stream pair, so a
/// saved distribution can be checked against the configuration it is
/// analyzed with and reproduced exactly.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub experiment: String,
    pub population: String,
    pub statistic: String,
    pub sample_size: usize,
    pub trials: usize,
    pub replacement: bool,
    pub seed: u64,
    pub stream: u64,
    pub values: Vec<f64>,
}

impl DistributionRecord {
    /// Save the distribution to a binary file.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize distribution")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved distribution.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let record = decode::from_read(&mut reader).context("failed to deserialize distribution")?;
        Ok(record)
    }
}
