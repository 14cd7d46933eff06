use std::env;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array2, ArrayBase, Data, Dimension};
use tracing::warn;

use crate::constants::debug::DEBUG_ENV_VAR;

#[inline]
pub fn relu(x: f64) -> f64 {
    x.max(0.)
}

/// Logistic function, split on sign so large magnitudes never overflow `exp`
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        let e = x.exp();
        e / (1. + e)
    }
}

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_INITIALIZED: AtomicBool = AtomicBool::new(false);

#[inline]
fn is_debug_enabled() -> bool {
    if !DEBUG_INITIALIZED.load(Ordering::Relaxed) {
        let enabled = env::var(DEBUG_ENV_VAR).ok().as_deref() == Some("1");
        DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
        DEBUG_INITIALIZED.store(true, Ordering::Relaxed);
    }
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Warns when an intermediate holds NaN or Inf. No-op unless `TPA_LSTM_DEBUG=1`.
#[inline]
pub fn debug_numerics<S, D>(tag: &str, t: &ArrayBase<S, D>)
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if !is_debug_enabled() {
        return;
    }
    let has_nan = t.iter().any(|v| v.is_nan());
    let has_inf = t.iter().any(|v| v.is_infinite());
    if has_nan || has_inf {
        warn!(
            tag,
            has_nan,
            has_inf,
            shape = ?t.shape(),
            "non-finite values in forward pass"
        );
    }
}

/// Sine series laid out one column per entity, [window, columns].
/// Each column is phase-shifted so entities are distinguishable.
pub fn sine_columns(window: usize, columns: usize, period: f64) -> Array2<f64> {
    Array2::from_shape_fn((window, columns), |(t, col)| {
        let phase = col as f64 * PI / 4.;
        (2. * PI * t as f64 / period + phase).sin()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(relu(-3.5), 0.);
        assert_eq!(relu(0.), 0.);
        assert_eq!(relu(2.25), 2.25);
    }

    #[test]
    fn sigmoid_is_symmetric_and_bounded() {
        assert_abs_diff_eq!(sigmoid(0.), 0.5);
        assert_abs_diff_eq!(sigmoid(2.) + sigmoid(-2.), 1., epsilon = 1e-12);
        assert!(sigmoid(-800.) >= 0.);
        assert!(sigmoid(800.) <= 1.);
        assert!(sigmoid(-800.).is_finite());
    }

    #[test]
    fn sine_columns_layout() {
        let series = sine_columns(10, 3, 24.);
        assert_eq!(series.dim(), (10, 3));
        assert_abs_diff_eq!(series[[0, 0]], 0.);
        assert_abs_diff_eq!(series[[0, 2]], 1., epsilon = 1e-12);
    }
}
