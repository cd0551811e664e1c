use rand::Rng;

use crate::{Error, Result};

/// One bootstrap resample: `indices` holds n draws with replacement from
/// `0..n`, `oob` the sorted indices that were never drawn.
#[derive(Debug, Clone)]
pub struct BootstrapSample {
    pub indices: Vec<usize>,
    pub oob: Vec<usize>,
}

impl BootstrapSample {
    pub fn oob_fraction(&self) -> f64 {
        self.oob.len() as f64 / self.indices.len() as f64
    }
}

pub fn bootstrap<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<BootstrapSample> {
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    let mut drawn = vec![false; n];
    let indices: Vec<usize> = (0..n)
        .map(|_| {
            let i = rng.gen_range(0..n);
            drawn[i] = true;
            i
        })
        .collect();
    let oob: Vec<usize> = drawn
        .iter()
        .enumerate()
        .filter(|&(_, &d)| !d)
        .map(|(i, _)| i)
        .collect();
    Ok(BootstrapSample { indices, oob })
}
