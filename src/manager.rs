use crate::analysis;
use crate::config::{CiMethod, Config, ExperimentConfig, PopulationConfig, StatisticConfig};
use crate::error;
use crate::loader;
use crate::population::Population;
use crate::runner::{self, DistributionRecord};
use crate::stats;
use anyhow::{Context, Result, bail};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Ties an experiment directory to the configuration inside it.
///
/// The directory holds `config.toml` and one `run-NNNN` subdirectory per
/// completed run, each with a saved distribution per experiment and the
/// analysis results.
pub struct Manager {
    exp_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(exp_dir: P) -> Result<Self> {
        let exp_dir = exp_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(exp_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { exp_dir, cfg })
    }

    /// Execute every configured experiment once, in a fresh run directory.
    ///
    /// Each experiment gets the run seed on its own RNG stream, so
    /// reordering or removing experiments never perturbs the others.
    pub fn run_experiments(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let run_seed = match self.cfg.seed {
            Some(seed) => seed.wrapping_add(run_idx as u64),
            None => ChaCha12Rng::try_from_os_rng()
                .context("failed to seed from os entropy")?
                .next_u64(),
        };
        log::info!("run {run_idx} uses seed {run_seed}");

        let pop = loader::load(&self.cfg.population).context("failed to load population")?;
        log::info!(
            "population of {} values, mean {:.6}, std dev {:.6}",
            pop.len(),
            pop.mean(),
            pop.std_dev()
        );

        for (i_exp, exp) in self.cfg.experiments.iter().enumerate() {
            let stream = i_exp as u64;
            let mut rng = ChaCha12Rng::seed_from_u64(run_seed);
            rng.set_stream(stream);

            let statistic = build_statistic(&exp.statistic, &pop, &exp.name);
            let values = runner::run(
                &pop,
                exp.sample_size,
                exp.trials,
                exp.replacement,
                statistic,
                &mut rng,
            )
            .with_context(|| format!("failed to run experiment {:?}", exp.name))?;

            let record = DistributionRecord {
                experiment: exp.name.clone(),
                population: self.cfg.population.to_string(),
                statistic: exp.statistic.to_string(),
                sample_size: exp.sample_size,
                trials: exp.trials,
                replacement: exp.replacement,
                seed: run_seed,
                stream,
                values,
            };
            let file = self.distribution_file(run_idx, i_exp);
            record
                .save(&file)
                .with_context(|| format!("failed to save {file:?}"))?;
            log::info!("completed experiment {:?} ({} trials)", exp.name, exp.trials);
        }

        Ok(())
    }

    /// Analyze every run and write a `results.json` per run directory.
    pub fn run_analysis(&self) -> Result<()> {
        let pop = loader::load(&self.cfg.population).context("failed to load population")?;

        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        if n_runs == 0 {
            bail!("no runs to analyze");
        }

        for run_idx in 0..n_runs {
            let mut reports = Vec::with_capacity(self.cfg.experiments.len());
            for (i_exp, exp) in self.cfg.experiments.iter().enumerate() {
                let file = self.distribution_file(run_idx, i_exp);
                let record = DistributionRecord::load(&file)
                    .with_context(|| format!("failed to load {file:?}"))?;
                check_record(exp, &self.cfg.population, &record)
                    .with_context(|| format!("{file:?} does not match the current config"))?;

                reports.push(analysis::experiment_report(
                    &pop,
                    exp,
                    &record,
                    self.cfg.output.hist_bins,
                ));
            }

            let results_file = self.results_file(run_idx);
            let file = File::create(&results_file)
                .with_context(|| format!("failed to create {results_file:?}"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &reports)?;
            writer.flush().context("failed to flush writer stream")?;
            log::info!("wrote {results_file:?}");
        }

        Ok(())
    }

    /// Delete every run directory.
    pub fn clean_runs(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.exp_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.exp_dir.join(format!("run-{run_idx:04}"))
    }

    fn distribution_file(&self, run_idx: usize, exp_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("distribution-{exp_idx:04}.msgpack"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}

/// Resolve a statistic configuration into the function the runner applies
/// to every sample.
///
/// The coverage indicator resolves its target against the population once,
/// up front, and logs the small-sample warning at most once per
/// experiment.
fn build_statistic(
    statistic: &StatisticConfig,
    pop: &Population,
    name: &str,
) -> Box<dyn FnMut(&[f64]) -> error::Result<f64>> {
    match statistic {
        StatisticConfig::Mean => Box::new(stats::mean),
        StatisticConfig::StdDev => Box::new(stats::sample_std_dev),
        StatisticConfig::StandardError => Box::new(stats::standard_error),
        StatisticConfig::CiCovers {
            method,
            level,
            target,
        } => {
            let target = target.unwrap_or_else(|| pop.mean());
            let method = *method;
            let level = *level;
            let name = name.to_string();
            let mut warned = false;
            Box::new(move |sample| {
                let est = match method {
                    CiMethod::Normal => stats::confidence_interval_95(sample)?,
                    CiMethod::StudentT => stats::student_t_interval(sample, level)?,
                };
                if let Some(warning) = est.warning {
                    if !warned {
                        log::warn!("experiment {name:?} ({} interval): {warning}", est.level);
                        warned = true;
                    }
                }
                Ok(if est.interval.contains(target) { 1.0 } else { 0.0 })
            })
        }
    }
}

/// Reject a saved distribution whose originating configuration differs in
/// any way from the current one, including the statistic and the
/// population source.
fn check_record(
    exp: &ExperimentConfig,
    population: &PopulationConfig,
    record: &DistributionRecord,
) -> Result<()> {
    if record.experiment != exp.name
        || record.sample_size != exp.sample_size
        || record.trials != exp.trials
        || record.replacement != exp.replacement
    {
        bail!(
            "recorded experiment {:?} ({} values of size {}) differs from configured {:?}",
            record.experiment,
            record.trials,
            record.sample_size,
            exp.name
        );
    }
    if record.statistic != exp.statistic.to_string() {
        bail!(
            "recorded statistic {:?} differs from configured {}",
            record.statistic,
            exp.statistic
        );
    }
    if record.population != population.to_string() {
        bail!(
            "recorded population {:?} differs from configured {}",
            record.population,
            population
        );
    }
    Ok(())
}
