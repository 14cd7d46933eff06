//! Multi-step time-series forecasting with an LSTM encoder and temporal pattern attention.
//!
//! Each entity (column) contributes one window of scalar observations. The window is
//! projected into a hidden space, run through an LSTM step by step, and the hidden-state
//! history is scored against the final hidden state by a convolutional attention head
//! before being projected onto the forecast horizon.

pub mod constants;
pub mod error;
pub mod model;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use model::{Init, TpaLstm, TpaLstmConfig};
