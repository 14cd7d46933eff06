use serde::{Deserialize, Serialize};

use crate::constants::model::{
    DEFAULT_FILTER_NUM, DEFAULT_HIDDEN_SIZE, DEFAULT_NUM_OBS_TO_TRAIN, DEFAULT_N_LAYERS,
    DEFAULT_PREDICT_SEQ_LEN, FILTER_SIZE, INPUT_SIZE,
};
use crate::error::{Error, Result};

/// Construction-time shape of a [`TpaLstm`](super::TpaLstm).
///
/// `num_obs_to_train` sizes the attention convolution kernel, so a model built
/// for one window length only accepts sequences of that length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpaLstmConfig {
    pub input_size: usize,
    /// Forecast horizon
    pub predict_seq_len: usize,
    pub hidden_size: usize,
    /// Window length L
    pub num_obs_to_train: usize,
    pub n_layers: usize,
    /// Number of attention convolution filters (F)
    pub filter_num: usize,
}

impl Default for TpaLstmConfig {
    fn default() -> Self {
        Self {
            input_size: INPUT_SIZE,
            predict_seq_len: DEFAULT_PREDICT_SEQ_LEN,
            hidden_size: DEFAULT_HIDDEN_SIZE,
            num_obs_to_train: DEFAULT_NUM_OBS_TO_TRAIN,
            n_layers: DEFAULT_N_LAYERS,
            filter_num: DEFAULT_FILTER_NUM,
        }
    }
}

impl TpaLstmConfig {
    pub fn new(
        predict_seq_len: usize,
        hidden_size: usize,
        num_obs_to_train: usize,
        n_layers: usize,
    ) -> Self {
        Self {
            predict_seq_len,
            hidden_size,
            num_obs_to_train,
            n_layers,
            ..Default::default()
        }
    }

    pub fn with_filter_num(mut self, filter_num: usize) -> Self {
        self.filter_num = filter_num;
        self
    }

    pub fn with_num_obs_to_train(mut self, num_obs_to_train: usize) -> Self {
        self.num_obs_to_train = num_obs_to_train;
        self
    }

    /// Time extent of the hidden-state history, and height of the conv kernel
    pub fn attn_len(&self) -> usize {
        self.num_obs_to_train.saturating_sub(1)
    }

    pub fn feat_size(&self) -> usize {
        self.hidden_size + 1 - FILTER_SIZE
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size != INPUT_SIZE {
            return Err(Error::Config(format!(
                "input_size must be {INPUT_SIZE}, got {}",
                self.input_size
            )));
        }
        if self.num_obs_to_train < 2 {
            return Err(Error::Config(format!(
                "num_obs_to_train must be at least 2 to leave a hidden-state history, got {}",
                self.num_obs_to_train
            )));
        }
        if self.hidden_size < FILTER_SIZE {
            return Err(Error::Config(format!(
                "hidden_size must be at least {FILTER_SIZE}, got {}",
                self.hidden_size
            )));
        }

        for (name, value) in [
            ("predict_seq_len", self.predict_seq_len),
            ("n_layers", self.n_layers),
            ("filter_num", self.filter_num),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_run() {
        let config = TpaLstmConfig::default();
        assert_eq!(config.hidden_size, 24);
        assert_eq!(config.filter_num, 32);
        assert_eq!(config.attn_len(), 4319);
        assert_eq!(config.feat_size(), 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_shapes() {
        let base = TpaLstmConfig::new(2, 4, 5, 1);
        assert!(base.validate().is_ok());

        assert!(matches!(
            base.with_num_obs_to_train(1).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            base.with_filter_num(0).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            TpaLstmConfig { hidden_size: 0, ..base }.validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            TpaLstmConfig { input_size: 3, ..base }.validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            TpaLstmConfig { n_layers: 0, ..base }.validate(),
            Err(Error::Config(_))
        ));
    }
}
