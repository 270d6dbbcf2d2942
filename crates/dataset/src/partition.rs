use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{DatasetError, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
}

/// Seeded shuffle followed by a train/validation cut.
///
/// Train takes the first `floor(n * (1 - validation_fraction))` shuffled
/// items. The same input order, seed and fraction always produce the same
/// split; the generator is private to this call so diagnostic sampling
/// elsewhere cannot disturb it.
pub fn partition<T: Clone>(accepted: &[T], seed: u64, validation_fraction: f64) -> Result<Partition<T>> {
    if !validation_fraction.is_finite() || !(0.0..1.0).contains(&validation_fraction) {
        return Err(DatasetError::Config(format!(
            "validation fraction must be in [0, 1), got {validation_fraction}"
        )));
    }

    let mut items = accepted.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let split_at = ((items.len() as f64) * (1.0 - validation_fraction)).floor() as usize;
    let val = items.split_off(split_at.min(items.len()));

    Ok(Partition { train: items, val })
}
