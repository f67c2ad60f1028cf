use crate::error::{Error, Result};
use crate::population::Population;
use rand::prelude::*;

/// Draw a sample of `size` values from the population into `sample`,
/// clearing any previous contents.
///
/// Without replacement every selected index is distinct and each subset of
/// the requested size is equally likely, which requires
/// `size <= population.len()`. With replacement each value is an
/// independent uniform pick and `size` is unbounded.
///
/// The buffer is taken by the caller so the runner's trial loop can reuse
/// one allocation. Results are reproducible for a fixed `rng`; the
/// population is never mutated.
pub fn draw<R: Rng>(
    sample: &mut Vec<f64>,
    population: &Population,
    size: usize,
    replacement: bool,
    rng: &mut R,
) -> Result<()> {
    sample.clear();

    if replacement {
        for _ in 0..size {
            let idx = rng.random_range(0..population.len());
            sample.push(population.values()[idx]);
        }
        return Ok(());
    }

    if size > population.len() {
        return Err(Error::InvalidSize {
            size,
            population: population.len(),
        });
    }
    sample.extend(population.values().choose_multiple(rng, size).copied());

    Ok(())
}
