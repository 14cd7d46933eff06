use ndarray::ArrayView2;
use tracing::debug;

use super::{EncoderOutput, TpaLstm};
use crate::error::Result;
use crate::types::{AttentionWeights, Forecast};
use crate::utils::debug_numerics;

impl TpaLstm {
    /// `x` is [N, L], one observation window per entity. Returns [N, predict_seq_len].
    pub fn forward(&self, x: ArrayView2<f64>) -> Result<Forecast> {
        Ok(self.forward_with_attention(x)?.0)
    }

    /// `x` is [L, N], one column per entity, as series are usually laid out on disk.
    pub fn forward_columns(&self, x: ArrayView2<f64>) -> Result<Forecast> {
        self.forward(x.t())
    }

    /// Same as [`forward`](Self::forward), also returning the attention gate [N, feat_size].
    pub fn forward_with_attention(
        &self,
        x: ArrayView2<f64>,
    ) -> Result<(Forecast, AttentionWeights)> {
        let (entities, window) = x.dim();
        debug!(entities, window, "tpa_lstm forward");

        let EncoderOutput { history, last_hidden } = self.encode(x)?;
        let attended = self.attention.forward(history.view(), last_hidden.view())?;

        let forecast = self.output.forward(attended.hidden.view())?;
        debug_numerics("forecast", &forecast);

        Ok((forecast, attended.alpha))
    }

    /// Input projection and recurrence only.
    pub fn encode(&self, x: ArrayView2<f64>) -> Result<EncoderOutput> {
        let projected = self.projector.forward(x)?;
        self.encoder.forward(projected.view())
    }
}
