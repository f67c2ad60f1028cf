use crate::error::{Error, Result};

/// Finite, ordered collection of numeric observations.
///
/// A `Population` is immutable once constructed and guaranteed to be
/// non-empty and free of non-finite values, so samplers and statistics can
/// rely on clean input. Cleaning (dropping missing values) happens in the
/// loader before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    values: Vec<f64>,
}

impl Population {
    /// Construct a population, rejecting empty input and non-finite values.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        if let Some(index) = values.iter().position(|val| !val.is_finite()) {
            return Err(Error::NonFinite { index });
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Population mean (n denominator).
    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.len() as f64
    }

    /// Population standard deviation (n denominator, not the sample estimator).
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let var = self
            .values
            .iter()
            .map(|&val| (val - mean).powi(2))
            .sum::<f64>()
            / self.len() as f64;
        var.sqrt()
    }
}
