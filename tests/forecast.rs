use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, SeedableRng};

use tpa_lstm::utils::sine_columns;
use tpa_lstm::{Error, Init, TpaLstm, TpaLstmConfig};

#[test]
fn zero_model_forecasts_zero() {
    let config = TpaLstmConfig::new(2, 4, 5, 1).with_filter_num(3);
    let model = TpaLstm::with_init(config, Init::Const(0.), &mut StdRng::seed_from_u64(0)).unwrap();

    let forecast = model.forward(Array2::<f64>::zeros((1, 5)).view()).unwrap();
    assert_eq!(forecast, Array2::<f64>::zeros((1, 2)));
}

#[test]
fn column_layout_end_to_end() {
    let config = TpaLstmConfig::new(6, 8, 24, 1).with_filter_num(5);
    let model = TpaLstm::new(config, &mut StdRng::seed_from_u64(99)).unwrap();
    let series = sine_columns(24, 3, 12.);

    let forecast = model.forward_columns(series.view()).unwrap();
    assert_eq!(forecast.dim(), (3, 6));
    assert!(forecast.iter().all(|v| v.is_finite()));

    // Each column forecast alone agrees with its row in the batch
    for (col, series_col) in series.axis_iter(Axis(1)).enumerate() {
        let alone = model
            .forward_columns(series_col.insert_axis(Axis(1)))
            .unwrap();
        for (a, b) in alone.row(0).iter().zip(forecast.row(col).iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn checkpoint_keeps_window_binding() {
    let config = TpaLstmConfig::new(2, 4, 5, 1).with_filter_num(3);
    let model = TpaLstm::new(config, &mut StdRng::seed_from_u64(5)).unwrap();
    let restored = TpaLstm::from_bytes(&model.to_bytes().unwrap()).unwrap();

    assert_eq!(restored.config().num_obs_to_train, 5);
    assert!(matches!(
        restored.forward(Array2::<f64>::zeros((2, 7)).view()),
        Err(Error::Shape { op: "temporal_pattern_attention.conv", .. })
    ));
}
