use ndarray::{s, Array1, Array4, ArrayView4, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::Init;
use crate::error::{ensure_shape, Error, Result};

/// Valid (unpadded, stride 1) 2D convolution over [N, C, H, W] inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conv2d {
    /// [out_channels, in_channels, kernel_h, kernel_w]
    pub(crate) weight: Array4<f64>,
    pub(crate) bias: Array1<f64>,
}

impl Conv2d {
    pub fn new<R: Rng>(
        in_channels: usize,
        out_channels: usize,
        kernel: (usize, usize),
        init: Init,
        rng: &mut R,
    ) -> Self {
        let fan_in = in_channels * kernel.0 * kernel.1;
        Self {
            weight: init.sample((out_channels, in_channels, kernel.0, kernel.1), fan_in, rng),
            bias: init.sample(out_channels, fan_in, rng),
        }
    }

    pub fn out_channels(&self) -> usize {
        self.weight.len_of(Axis(0))
    }

    pub fn in_channels(&self) -> usize {
        self.weight.len_of(Axis(1))
    }

    pub fn kernel(&self) -> (usize, usize) {
        (self.weight.len_of(Axis(2)), self.weight.len_of(Axis(3)))
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }

    /// [N, C_in, H, W] -> [N, C_out, H - kh + 1, W - kw + 1]
    pub fn forward(&self, x: ArrayView4<f64>) -> Result<Array4<f64>> {
        let (batch, channels, height, width) = x.dim();
        let (kh, kw) = self.kernel();
        if channels != self.in_channels() || height < kh || width < kw {
            return Err(Error::shape(
                "conv2d",
                &[batch, self.in_channels(), kh.max(height), kw.max(width)],
                x.shape(),
            ));
        }

        let (out_h, out_w) = (height - kh + 1, width - kw + 1);
        let mut out = Array4::<f64>::zeros((batch, self.out_channels(), out_h, out_w));

        for ((n, o, y, w), value) in out.indexed_iter_mut() {
            let window = x.slice(s![n, .., y..y + kh, w..w + kw]);
            let kernel = self.weight.index_axis(Axis(0), o);
            *value = Zip::from(&window)
                .and(&kernel)
                .fold(self.bias[o], |acc, &a, &k| acc + a * k);
        }

        Ok(out)
    }

    pub(crate) fn check(&self, op: &'static str, expected: [usize; 4]) -> Result<()> {
        ensure_shape(op, &expected, self.weight.shape())?;
        ensure_shape(op, &expected[..1], self.bias.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn full_height_kernel_collapses_time_axis() {
        // kernel spans all 3 rows, width 1: each output is a weighted column sum
        let conv = Conv2d {
            weight: array![[[[1.0], [2.0], [3.0]]], [[[0.0], [0.0], [-1.0]]]],
            bias: array![0.5, 0.0],
        };
        let x = Array::from_shape_vec((1, 1, 3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let y = conv.forward(x.view()).unwrap();
        assert_eq!(y.dim(), (1, 2, 1, 2));
        // column 0 = [1, 3, 5], column 1 = [2, 4, 6]
        assert_abs_diff_eq!(y[[0, 0, 0, 0]], 1.0 + 6.0 + 15.0 + 0.5);
        assert_abs_diff_eq!(y[[0, 0, 0, 1]], 2.0 + 8.0 + 18.0 + 0.5);
        assert_abs_diff_eq!(y[[0, 1, 0, 0]], -5.0);
        assert_abs_diff_eq!(y[[0, 1, 0, 1]], -6.0);
    }

    #[test]
    fn sliding_kernel_output_extent() {
        let mut rng = StdRng::seed_from_u64(5);
        let conv = Conv2d::new(1, 4, (2, 1), Init::FanInUniform, &mut rng);
        let x = Array4::<f64>::zeros((3, 1, 6, 5));
        assert_eq!(conv.forward(x.view()).unwrap().dim(), (3, 4, 5, 5));
    }

    #[test]
    fn input_shorter_than_kernel_fails() {
        let mut rng = StdRng::seed_from_u64(5);
        let conv = Conv2d::new(1, 2, (4, 1), Init::FanInUniform, &mut rng);
        let x = Array4::<f64>::zeros((1, 1, 3, 2));
        assert!(matches!(
            conv.forward(x.view()),
            Err(Error::Shape { op: "conv2d", .. })
        ));
    }
}
