//! Turns saved sampling distributions into JSON reports.

use crate::config::{CiMethod, ExperimentConfig, StatisticConfig};
use crate::population::Population;
use crate::runner::DistributionRecord;
use crate::stats;
use serde_json::json;

/// Build the report for one experiment.
///
/// Pairs the empirical summary and histogram of the recorded distribution
/// with the theoretical values the population predicts for the configured
/// statistic, so the two can be compared side by side.
pub fn experiment_report(
    pop: &Population,
    exp: &ExperimentConfig,
    record: &DistributionRecord,
    hist_bins: usize,
) -> serde_json::Value {
    json!({
        "experiment": exp.name,
        "sample_size": exp.sample_size,
        "trials": exp.trials,
        "replacement": exp.replacement,
        "seed": record.seed,
        "stream": record.stream,
        "summary": stats::summarize(&record.values),
        "histogram": stats::Histogram::build(&record.values, hist_bins),
        "statistic": statistic_report(pop, exp, record),
    })
}

fn statistic_report(
    pop: &Population,
    exp: &ExperimentConfig,
    record: &DistributionRecord,
) -> serde_json::Value {
    let predicted_std_error = pop.std_dev() / (exp.sample_size as f64).sqrt();

    match &exp.statistic {
        StatisticConfig::Mean => json!({
            "kind": "mean",
            "population_mean": pop.mean(),
            "predicted_std_error": predicted_std_error,
        }),
        StatisticConfig::StdDev => json!({
            "kind": "std_dev",
            "population_std_dev": pop.std_dev(),
        }),
        StatisticConfig::StandardError => json!({
            "kind": "standard_error",
            "predicted_std_error": predicted_std_error,
        }),
        StatisticConfig::CiCovers {
            method,
            level,
            target,
        } => {
            let covered: Vec<bool> = record.values.iter().map(|&val| val == 1.0).collect();
            // Student-t intervals never carry the small-sample warning.
            let small_sample =
                *method == CiMethod::Normal && exp.sample_size < stats::NORMAL_APPROX_MIN_LEN;
            json!({
                "kind": "ci_covers",
                "method": method,
                "level": level,
                "target": target.unwrap_or_else(|| pop.mean()),
                "coverage_rate": stats::coverage_rate(&covered),
                "small_sample": small_sample,
            })
        }
    }
}
