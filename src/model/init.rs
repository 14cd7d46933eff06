use ndarray::{Array, Dimension, ShapeBuilder};
use rand::Rng;

/// Parameter initialiser, applied per tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    Const(f64),
    Uniform { lo: f64, up: f64 },
    /// U(-1/sqrt(fan_in), 1/sqrt(fan_in)), the usual default for linear, conv and recurrent weights
    FanInUniform,
}

impl Init {
    pub(crate) fn sample<Sh, D, R>(self, shape: Sh, fan_in: usize, rng: &mut R) -> Array<f64, D>
    where
        Sh: ShapeBuilder<Dim = D>,
        D: Dimension,
        R: Rng,
    {
        let (lo, up) = match self {
            Init::Const(value) => return Array::from_elem(shape, value),
            Init::Uniform { lo, up } => (lo, up),
            Init::FanInUniform => {
                let bound = 1. / (fan_in.max(1) as f64).sqrt();
                (-bound, bound)
            }
        };
        Array::from_shape_fn(shape, |_| lo + (up - lo) * rng.gen::<f64>())
    }
}
