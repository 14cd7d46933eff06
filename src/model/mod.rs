mod attention;
mod checkpoint;
mod config;
mod conv;
mod encoder;
mod forward;
mod init;
mod linear;
mod lstm;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use attention::{AttentionOutput, TemporalPatternAttention};
pub use config::TpaLstmConfig;
pub use conv::Conv2d;
pub use encoder::{EncoderOutput, InputProjector, RecurrentEncoder};
pub use init::Init;
pub use linear::Linear;
pub use lstm::{Lstm, LstmCell, LstmState};

use crate::error::Result;

/// LSTM encoder with temporal pattern attention, forecasting `predict_seq_len`
/// steps from a window of `num_obs_to_train` scalar observations per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpaLstm {
    config: TpaLstmConfig,
    projector: InputProjector,
    encoder: RecurrentEncoder,
    attention: TemporalPatternAttention,
    /// hidden_size -> predict_seq_len
    output: Linear,
}

impl TpaLstm {
    /// Fan-in uniform initialisation for every parameter
    pub fn new<R: Rng>(config: TpaLstmConfig, rng: &mut R) -> Result<Self> {
        Self::with_init(config, Init::FanInUniform, rng)
    }

    /// Every weight and bias set to zero
    pub fn zeros(config: TpaLstmConfig) -> Result<Self> {
        Self::with_init(config, Init::Const(0.), &mut StdRng::seed_from_u64(0))
    }

    pub fn with_init<R: Rng>(config: TpaLstmConfig, init: Init, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let hidden = config.hidden_size;
        let model = Self {
            config,
            projector: InputProjector::new(hidden, init, rng),
            encoder: RecurrentEncoder::new(hidden, config.n_layers, init, rng),
            attention: TemporalPatternAttention::new(
                config.filter_num,
                config.attn_len(),
                hidden,
                init,
                rng,
            ),
            output: Linear::new(hidden, config.predict_seq_len, init, rng),
        };

        debug!(
            hidden_size = hidden,
            window = config.num_obs_to_train,
            horizon = config.predict_seq_len,
            n_layers = config.n_layers,
            filter_num = config.filter_num,
            parameters = model.num_parameters(),
            "built TPA-LSTM"
        );
        Ok(model)
    }

    /// Rebuilds the attention convolution for a new window length.
    ///
    /// Every other weight is kept; the convolution is freshly initialised since
    /// its kernel height is the window length minus one.
    pub fn with_window<R: Rng>(mut self, num_obs_to_train: usize, rng: &mut R) -> Result<Self> {
        let config = self.config.with_num_obs_to_train(num_obs_to_train);
        config.validate()?;

        self.attention.conv = TemporalPatternAttention::build_conv(
            config.filter_num,
            config.attn_len(),
            Init::FanInUniform,
            rng,
        );
        debug!(
            from = self.config.num_obs_to_train,
            to = num_obs_to_train,
            "rebuilt attention convolution for new window"
        );
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &TpaLstmConfig {
        &self.config
    }

    pub fn attention(&self) -> &TemporalPatternAttention {
        &self.attention
    }

    pub fn num_parameters(&self) -> usize {
        self.projector.linear.num_parameters()
            + self.encoder.lstm.num_parameters()
            + self.attention.num_parameters()
            + self.output.num_parameters()
    }
}
