use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::init::Init;
use crate::error::{ensure_shape, Error, Result};
use crate::utils::sigmoid;

/// Single LSTM cell. Gate columns are packed in `i, f, g, o` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmCell {
    /// [input_size, 4 * hidden_size]
    pub(crate) w_ih: Array2<f64>,
    /// [hidden_size, 4 * hidden_size]
    pub(crate) w_hh: Array2<f64>,
    pub(crate) b_ih: Array1<f64>,
    pub(crate) b_hh: Array1<f64>,
}

impl LstmCell {
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, init: Init, rng: &mut R) -> Self {
        let gates = 4 * hidden_size;
        Self {
            w_ih: init.sample((input_size, gates), hidden_size, rng),
            w_hh: init.sample((hidden_size, gates), hidden_size, rng),
            b_ih: init.sample(gates, hidden_size, rng),
            b_hh: init.sample(gates, hidden_size, rng),
        }
    }

    pub fn input_size(&self) -> usize {
        self.w_ih.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.w_hh.nrows()
    }

    pub fn num_parameters(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b_ih.len() + self.b_hh.len()
    }

    /// One gated update. `x` is [N, input_size], `h` and `c` are [N, hidden_size].
    pub fn step(
        &self,
        x: ArrayView2<f64>,
        h: ArrayView2<f64>,
        c: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let hidden = self.hidden_size();
        let batch = x.nrows();
        if x.ncols() != self.input_size() {
            return Err(Error::shape("lstm_cell.input", &[batch, self.input_size()], x.shape()));
        }
        ensure_shape("lstm_cell.hidden", &[batch, hidden], h.shape())?;
        ensure_shape("lstm_cell.cell", &[batch, hidden], c.shape())?;

        let gates = x.dot(&self.w_ih) + h.dot(&self.w_hh) + &self.b_ih + &self.b_hh;

        let input_gate = gates.slice(s![.., 0..hidden]).mapv(sigmoid);
        let forget_gate = gates.slice(s![.., hidden..2 * hidden]).mapv(sigmoid);
        let candidate = gates.slice(s![.., 2 * hidden..3 * hidden]).mapv(f64::tanh);
        let output_gate = gates.slice(s![.., 3 * hidden..]).mapv(sigmoid);

        let c_next = &forget_gate * &c + &input_gate * &candidate;
        let h_next = &output_gate * &c_next.mapv(f64::tanh);

        Ok((h_next, c_next))
    }

    pub(crate) fn check(
        &self,
        op: &'static str,
        input_size: usize,
        hidden_size: usize,
    ) -> Result<()> {
        let gates = 4 * hidden_size;
        ensure_shape(op, &[input_size, gates], self.w_ih.shape())?;
        ensure_shape(op, &[hidden_size, gates], self.w_hh.shape())?;
        ensure_shape(op, &[gates], self.b_ih.shape())?;
        ensure_shape(op, &[gates], self.b_hh.shape())
    }
}

/// Recurrent state, each [n_layers, N, hidden_size]
#[derive(Debug, Clone, PartialEq)]
pub struct LstmState {
    pub hidden: Array3<f64>,
    pub(crate) cell: Array3<f64>,
}

impl LstmState {
    pub fn zeros(n_layers: usize, batch: usize, hidden_size: usize) -> Self {
        Self {
            hidden: Array3::zeros((n_layers, batch, hidden_size)),
            cell: Array3::zeros((n_layers, batch, hidden_size)),
        }
    }

    /// Hidden state of the last layer, [N, hidden_size]
    pub fn top_hidden(&self) -> Result<ArrayView2<'_, f64>> {
        let (layers, batch, hidden) = self.hidden.dim();
        if layers == 0 {
            return Err(Error::shape("lstm.state", &[1, batch, hidden], self.hidden.shape()));
        }
        Ok(self.hidden.index_axis(Axis(0), layers - 1))
    }
}

/// Stack of LSTM cells; layer k > 0 reads the hidden state layer k - 1 produced at the same step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lstm {
    pub(crate) cells: Vec<LstmCell>,
}

impl Lstm {
    pub fn new<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        n_layers: usize,
        init: Init,
        rng: &mut R,
    ) -> Self {
        let mut cells = Vec::with_capacity(n_layers);
        for layer in 0..n_layers {
            let layer_input = if layer == 0 { input_size } else { hidden_size };
            cells.push(LstmCell::new(layer_input, hidden_size, init, rng));
        }
        Self { cells }
    }

    pub fn n_layers(&self) -> usize {
        self.cells.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.cells.first().map_or(0, LstmCell::hidden_size)
    }

    pub fn num_parameters(&self) -> usize {
        self.cells.iter().map(LstmCell::num_parameters).sum()
    }

    pub fn zero_state(&self, batch: usize) -> LstmState {
        LstmState::zeros(self.n_layers(), batch, self.hidden_size())
    }

    /// Advances every layer by one timestep. `x` is [N, input_size].
    pub fn step(&self, x: ArrayView2<f64>, state: &mut LstmState) -> Result<()> {
        let expected = [self.n_layers(), x.nrows(), self.hidden_size()];
        ensure_shape("lstm.state", &expected, state.hidden.shape())?;
        ensure_shape("lstm.state", &expected, state.cell.shape())?;

        let mut layer_input = x.to_owned();
        for (layer, cell) in self.cells.iter().enumerate() {
            let (h_next, c_next) = cell.step(
                layer_input.view(),
                state.hidden.index_axis(Axis(0), layer),
                state.cell.index_axis(Axis(0), layer),
            )?;
            state.hidden.index_axis_mut(Axis(0), layer).assign(&h_next);
            state.cell.index_axis_mut(Axis(0), layer).assign(&c_next);
            layer_input = h_next;
        }
        Ok(())
    }

    pub(crate) fn check(
        &self,
        input_size: usize,
        hidden_size: usize,
        n_layers: usize,
    ) -> Result<()> {
        ensure_shape("lstm.layers", &[n_layers], &[self.n_layers()])?;
        for (layer, cell) in self.cells.iter().enumerate() {
            let layer_input = if layer == 0 { input_size } else { hidden_size };
            cell.check("lstm.cell", layer_input, hidden_size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn zero_weights_keep_zero_state() {
        let mut rng = StdRng::seed_from_u64(0);
        let cell = LstmCell::new(3, 2, Init::Const(0.), &mut rng);
        let x = array![[1.0, -2.0, 0.5]];
        let zeros = Array2::<f64>::zeros((1, 2));

        let (h, c) = cell.step(x.view(), zeros.view(), zeros.view()).unwrap();
        assert!(h.iter().all(|&v| v == 0.));
        assert!(c.iter().all(|&v| v == 0.));
    }

    #[test]
    fn hand_computed_step() {
        // hidden 1, input 1: every gate pre-activation is x * 1 + 0
        let cell = LstmCell {
            w_ih: array![[1.0, 1.0, 1.0, 1.0]],
            w_hh: Array2::zeros((1, 4)),
            b_ih: Array1::zeros(4),
            b_hh: Array1::zeros(4),
        };
        let x = array![[0.5]];
        let c_prev = array![[0.2]];
        let h_prev = array![[0.0]];

        let (h, c) = cell.step(x.view(), h_prev.view(), c_prev.view()).unwrap();

        let gate = sigmoid(0.5);
        let expected_c = gate * 0.2 + gate * 0.5f64.tanh();
        assert_abs_diff_eq!(c[[0, 0]], expected_c, epsilon = 1e-12);
        assert_abs_diff_eq!(h[[0, 0]], gate * expected_c.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn stacked_step_updates_every_layer() {
        let mut rng = StdRng::seed_from_u64(11);
        let lstm = Lstm::new(3, 4, 2, Init::FanInUniform, &mut rng);
        let mut state = lstm.zero_state(2);
        let x = array![[0.3, -0.1, 0.8], [1.0, 0.0, -0.4]];

        lstm.step(x.view(), &mut state).unwrap();

        assert_eq!(state.hidden.dim(), (2, 2, 4));
        assert!(state.hidden.index_axis(Axis(0), 0).iter().any(|&v| v != 0.));
        assert!(state.top_hidden().unwrap().iter().any(|&v| v != 0.));
    }

    #[test]
    fn zero_layer_state_has_no_top_hidden() {
        let state = LstmState::zeros(0, 2, 3);
        match state.top_hidden() {
            Err(Error::Shape { op, expected, actual }) => {
                assert_eq!(op, "lstm.state");
                assert_eq!(expected, vec![1, 2, 3]);
                assert_eq!(actual, vec![0, 2, 3]);
            }
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_state_for_other_batch() {
        let mut rng = StdRng::seed_from_u64(2);
        let lstm = Lstm::new(1, 4, 1, Init::FanInUniform, &mut rng);
        let mut state = lstm.zero_state(3);
        let x = Array2::<f64>::zeros((2, 1));

        assert!(matches!(
            lstm.step(x.view(), &mut state),
            Err(Error::Shape { op: "lstm.state", .. })
        ));
    }
}
