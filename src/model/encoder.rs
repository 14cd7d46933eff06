use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::Init;
use super::linear::Linear;
use super::lstm::Lstm;
use crate::constants::model::INPUT_SIZE;
use crate::error::{Error, Result};
use crate::types::History;
use crate::utils::{debug_numerics, relu};

/// Lifts each scalar observation into the hidden feature space: [N, L] -> [N, L, H]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputProjector {
    pub(crate) linear: Linear,
}

impl InputProjector {
    pub fn new<R: Rng>(hidden_size: usize, init: Init, rng: &mut R) -> Self {
        Self {
            linear: Linear::new(INPUT_SIZE, hidden_size, init, rng),
        }
    }

    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Array3<f64>> {
        let (entities, window) = x.dim();
        // Logical (row-major) order, whatever the layout of `x`
        let flat = Array2::from_shape_vec(
            (entities * window, INPUT_SIZE),
            x.iter().copied().collect(),
        )?;
        let projected = self.linear.forward(flat.view())?.mapv_into(relu);
        let projected = projected
            .to_shape((entities, window, self.linear.out_features()))?
            .into_owned();
        debug_numerics("input_projector", &projected);
        Ok(projected)
    }
}

/// Result of running the encoder over a whole window.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOutput {
    /// Rectified top-layer hidden states of timesteps 0..L-1, [N, 1, L-1, H]
    pub history: History,
    /// Unrectified top-layer hidden state of timestep L-1, [N, H]
    pub last_hidden: Array2<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentEncoder {
    pub(crate) lstm: Lstm,
}

impl RecurrentEncoder {
    pub fn new<R: Rng>(hidden_size: usize, n_layers: usize, init: Init, rng: &mut R) -> Self {
        Self {
            lstm: Lstm::new(hidden_size, hidden_size, n_layers, init, rng),
        }
    }

    /// Runs the recurrence over `projected` ([N, L, H]) one timestep at a time.
    ///
    /// The hidden state of every step except the last is written to the history;
    /// the last one is returned separately as the attention query.
    pub fn forward(&self, projected: ArrayView3<f64>) -> Result<EncoderOutput> {
        let (entities, window, hidden) = projected.dim();
        if window == 0 {
            return Err(Error::shape(
                "recurrent_encoder",
                &[entities, 1, hidden],
                projected.shape(),
            ));
        }

        let mut state = self.lstm.zero_state(entities);
        let mut history =
            Array3::<f64>::zeros((entities, window - 1, self.lstm.hidden_size()));

        for t in 0..window {
            let xt = projected.index_axis(Axis(1), t);
            self.lstm.step(xt, &mut state)?;

            if t != window - 1 {
                history.index_axis_mut(Axis(1), t).assign(&state.top_hidden()?);
            }
        }

        history.mapv_inplace(relu);
        debug_numerics("encoder_history", &history);

        let (_, steps, hidden) = history.dim();
        let history = history.into_shape_with_order((entities, 1, steps, hidden))?;

        Ok(EncoderOutput {
            history,
            last_hidden: state.top_hidden()?.to_owned(),
        })
    }
}
