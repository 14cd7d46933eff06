use ndarray::{Array2, Array4};

/// Batch of forecasts, one row per entity: [N, predict_seq_len]
pub type Forecast = Array2<f64>;

/// Rectified hidden-state history with a singleton channel axis: [N, 1, L-1, H]
pub type History = Array4<f64>;

/// Attention gate per entity and feature position: [N, feat_size]
pub type AttentionWeights = Array2<f64>;
