use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::Init;
use crate::error::{ensure_shape, Error, Result};

/// Affine map `y = x W + b` over rows of a [batch, in_features] matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// [in_features, out_features]
    pub(crate) weight: Array2<f64>,
    pub(crate) bias: Array1<f64>,
}

impl Linear {
    pub fn new<R: Rng>(in_features: usize, out_features: usize, init: Init, rng: &mut R) -> Self {
        Self {
            weight: init.sample((in_features, out_features), in_features, rng),
            bias: init.sample(out_features, in_features, rng),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.in_features() {
            return Err(Error::shape(
                "linear",
                &[x.nrows(), self.in_features()],
                x.shape(),
            ));
        }
        Ok(x.dot(&self.weight) + &self.bias)
    }

    pub(crate) fn check(
        &self,
        op: &'static str,
        in_features: usize,
        out_features: usize,
    ) -> Result<()> {
        ensure_shape(op, &[in_features, out_features], self.weight.shape())?;
        ensure_shape(op, &[out_features], self.bias.shape())
    }
}
