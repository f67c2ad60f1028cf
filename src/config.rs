use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{self, Debug},
    fs,
    ops::RangeBounds,
    path::{Path, PathBuf},
};

/// Experiment suite configuration.
///
/// Loaded from a TOML file and validated before use. See
/// [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base seed for the random number generator. Omit to seed each run
    /// from operating system entropy.
    pub seed: Option<u64>,

    /// Source of the population values.
    pub population: PopulationConfig,

    /// Output parameters.
    #[serde(default)]
    pub output: OutputConfig,

    /// Experiments to run, in order.
    #[serde(default, rename = "experiment")]
    pub experiments: Vec<ExperimentConfig>,
}

/// Where the population comes from.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PopulationConfig {
    /// A named column of a CSV file with a header row.
    Csv { path: PathBuf, column: String },

    /// Normally distributed synthetic values.
    Normal {
        mean: f64,
        std_dev: f64,
        count: usize,
        #[serde(default)]
        seed: u64,
    },

    /// Uniformly distributed synthetic values on `[low, high)`.
    Uniform {
        low: f64,
        high: f64,
        count: usize,
        #[serde(default)]
        seed: u64,
    },

    /// The integers `start..=end` as real values.
    Integers { start: i64, end: i64 },
}

impl PopulationConfig {
    /// Population size, when it is known without loading the data.
    pub fn known_len(&self) -> Option<usize> {
        match self {
            Self::Csv { .. } => None,
            Self::Normal { count, .. } | Self::Uniform { count, .. } => Some(*count),
            Self::Integers { start, end } => usize::try_from(end - start + 1).ok(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Csv { column, .. } => {
                if column.is_empty() {
                    bail!("csv column name must not be empty");
                }
            }
            Self::Normal {
                mean,
                std_dev,
                count,
                ..
            } => {
                if !mean.is_finite() {
                    bail!("normal mean must be finite, but is {mean}");
                }
                if !(*std_dev > 0.0 && std_dev.is_finite()) {
                    bail!(
                        "normal standard deviation must be positive and finite, but is {std_dev}"
                    );
                }
                check_num(*count, 1..10_000_000).context("invalid population count")?;
            }
            Self::Uniform {
                low, high, count, ..
            } => {
                if !(low.is_finite() && high.is_finite()) {
                    bail!("uniform bounds must be finite, but are {low} and {high}");
                }
                if low >= high {
                    bail!("uniform low bound {low} must be less than high bound {high}");
                }
                check_num(*count, 1..10_000_000).context("invalid population count")?;
            }
            Self::Integers { start, end } => {
                check_num(*start, -5_000_000..=5_000_000).context("invalid integer range start")?;
                check_num(*end, -5_000_000..=5_000_000).context("invalid integer range end")?;
                if start > end {
                    bail!("integer range start {start} must not exceed end {end}");
                }
            }
        }
        Ok(())
    }
}

/// Canonical descriptor, stored in distribution records and compared
/// against the current configuration at analysis time.
impl fmt::Display for PopulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, column } => write!(f, "csv({path:?}, column {column:?})"),
            Self::Normal {
                mean,
                std_dev,
                count,
                seed,
            } => write!(
                f,
                "normal(mean {mean}, std_dev {std_dev}, count {count}, seed {seed})"
            ),
            Self::Uniform {
                low,
                high,
                count,
                seed,
            } => write!(f, "uniform({low}..{high}, count {count}, seed {seed})"),
            Self::Integers { start, end } => write!(f, "integers({start}..={end})"),
        }
    }
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of histogram bins in the analysis report.
    pub hist_bins: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { hist_bins: 16 }
    }
}

/// One resampling experiment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Unique name, used for file matching and reporting.
    pub name: String,
    /// Number of values drawn per trial.
    pub sample_size: usize,
    /// Number of trials.
    pub trials: usize,
    /// Whether to sample with replacement.
    #[serde(default)]
    pub replacement: bool,
    /// Statistic computed on each sample.
    pub statistic: StatisticConfig,
}

impl ExperimentConfig {
    fn validate(&self, population_len: Option<usize>) -> Result<()> {
        if self.name.is_empty() {
            bail!("experiment name must not be empty");
        }
        check_num(self.sample_size, 1..10_000_000).context("invalid sample size")?;
        check_num(self.trials, 0..10_000_000).context("invalid number of trials")?;

        if let Some(len) = population_len {
            if !self.replacement && self.sample_size > len {
                bail!(
                    "sample size {} exceeds population size {len} for sampling without replacement",
                    self.sample_size
                );
            }
        }

        self.statistic.validate().context("invalid statistic")?;

        Ok(())
    }
}

/// Statistic computed on each sample.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatisticConfig {
    /// Sample mean.
    Mean,

    /// Sample standard deviation, unbiased estimator.
    StdDev,

    /// Standard error of the mean.
    StandardError,

    /// Indicator of whether a confidence interval for the mean covers the
    /// target value: 1.0 if it does, 0.0 if not. The target defaults to
    /// the population mean.
    CiCovers {
        #[serde(default)]
        method: CiMethod,
        #[serde(default = "default_level")]
        level: f64,
        target: Option<f64>,
    },
}

impl StatisticConfig {
    fn validate(&self) -> Result<()> {
        if let Self::CiCovers {
            method,
            level,
            target,
        } = self
        {
            if !(*level > 0.0 && *level < 1.0) {
                bail!("confidence level must lie strictly between 0 and 1, but is {level}");
            }
            if *method == CiMethod::Normal && *level != 0.95 {
                bail!("the normal method only supports a 0.95 level; use the student_t method");
            }
            if let Some(target) = target {
                if !target.is_finite() {
                    bail!("coverage target must be finite, but is {target}");
                }
            }
        }
        Ok(())
    }
}

/// Canonical descriptor, stored in distribution records and compared
/// against the current configuration at analysis time.
impl fmt::Display for StatisticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::StdDev => write!(f, "std_dev"),
            Self::StandardError => write!(f, "standard_error"),
            Self::CiCovers {
                method,
                level,
                target: Some(target),
            } => write!(f, "ci_covers(method {method}, level {level}, target {target})"),
            Self::CiCovers {
                method,
                level,
                target: None,
            } => write!(f, "ci_covers(method {method}, level {level}, target population mean)"),
        }
    }
}

/// How the confidence interval multiplier is obtained.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiMethod {
    /// Large-sample normal approximation, fixed at the 0.95 level.
    #[default]
    Normal,
    /// Student-t multiplier with n - 1 degrees of freedom.
    StudentT,
}

impl fmt::Display for CiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::StudentT => write!(f, "student_t"),
        }
    }
}

fn default_level() -> f64 {
    0.95
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML and describe a population, output parameters,
    /// and at least one experiment. Performs validation on all parameters
    /// before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::parse(&text)
    }

    /// Parse and validate a [`Config`] from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.population.validate().context("invalid population")?;

        check_num(self.output.hist_bins, 1..10_000).context("invalid number of histogram bins")?;

        if self.experiments.is_empty() {
            bail!("at least one experiment must be defined");
        }
        let mut names = HashSet::new();
        for exp in &self.experiments {
            exp.validate(self.population.known_len())
                .with_context(|| format!("invalid experiment {:?}", exp.name))?;
            if !names.insert(exp.name.as_str()) {
                bail!("experiment name {:?} is not unique", exp.name);
            }
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
