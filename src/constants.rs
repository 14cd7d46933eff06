pub mod model {
    /// Scalar observations only: one feature per timestep
    pub const INPUT_SIZE: usize = 1;
    /// Width of the attention convolution along the feature axis
    pub const FILTER_SIZE: usize = 1;
    pub const DEFAULT_FILTER_NUM: usize = 32;
    pub const DEFAULT_HIDDEN_SIZE: usize = 24;
    pub const DEFAULT_PREDICT_SEQ_LEN: usize = 432;
    pub const DEFAULT_NUM_OBS_TO_TRAIN: usize = 4320;
    pub const DEFAULT_N_LAYERS: usize = 1;
}

pub mod debug {
    /// Set to "1" to check intermediates for NaN/Inf during forward passes
    pub const DEBUG_ENV_VAR: &str = "TPA_LSTM_DEBUG";
}

pub mod demo {
    pub const DEFAULT_SEED: u64 = 42;
    pub const DEFAULT_COLUMNS: usize = 2;
    pub const DEFAULT_WINDOW: usize = 48;
    pub const DEFAULT_HORIZON: usize = 12;
    pub const DEFAULT_HIDDEN: usize = 24;
    /// Period, in observations, of the synthetic sine columns
    pub const SINE_PERIOD: f64 = 24.;
}
