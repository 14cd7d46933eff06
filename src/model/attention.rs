use ndarray::{concatenate, s, Array2, Array3, ArrayView2, ArrayView4, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::conv::Conv2d;
use super::init::Init;
use super::linear::Linear;
use crate::constants::model::FILTER_SIZE;
use crate::error::{Error, Result};
use crate::types::AttentionWeights;
use crate::utils::{debug_numerics, relu, sigmoid};

/// Temporal pattern attention over a hidden-state history.
///
/// A convolution whose kernel spans the whole history collapses the time axis
/// into one value per (feature position, filter). Each feature position is then
/// gated by `sigmoid(<conv row, W q>)`, independently of the others, and the gated
/// rows are summed into a context vector that is mixed back into the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalPatternAttention {
    /// 1 -> filter_num channels, kernel (attn_len, FILTER_SIZE)
    pub(crate) conv: Conv2d,
    /// attn_size -> filter_num
    pub(crate) linear1: Linear,
    /// attn_size + filter_num -> attn_size
    pub(crate) linear2: Linear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttentionOutput {
    /// Attention-refined query, [N, attn_size]
    pub hidden: Array2<f64>,
    /// Per-feature gate, [N, feat_size], each entry in (0, 1)
    pub alpha: AttentionWeights,
}

impl TemporalPatternAttention {
    pub fn new<R: Rng>(
        filter_num: usize,
        attn_len: usize,
        attn_size: usize,
        init: Init,
        rng: &mut R,
    ) -> Self {
        Self {
            conv: Self::build_conv(filter_num, attn_len, init, rng),
            linear1: Linear::new(attn_size, filter_num, init, rng),
            linear2: Linear::new(attn_size + filter_num, attn_size, init, rng),
        }
    }

    pub(crate) fn build_conv<R: Rng>(
        filter_num: usize,
        attn_len: usize,
        init: Init,
        rng: &mut R,
    ) -> Conv2d {
        Conv2d::new(1, filter_num, (attn_len, FILTER_SIZE), init, rng)
    }

    pub fn filter_num(&self) -> usize {
        self.conv.out_channels()
    }

    /// History length the convolution kernel was built for
    pub fn attn_len(&self) -> usize {
        self.conv.kernel().0
    }

    pub fn attn_size(&self) -> usize {
        self.linear1.in_features()
    }

    pub fn feat_size(&self) -> usize {
        self.attn_size() + 1 - FILTER_SIZE
    }

    pub fn num_parameters(&self) -> usize {
        self.conv.num_parameters() + self.linear1.num_parameters() + self.linear2.num_parameters()
    }

    /// `history` is [N, 1, attn_len, attn_size], `query` is [N, attn_size].
    pub fn forward(
        &self,
        history: ArrayView4<f64>,
        query: ArrayView2<f64>,
    ) -> Result<AttentionOutput> {
        let (entities, channels, steps, attn_size) = history.dim();
        let (filter_num, feat_size) = (self.filter_num(), self.feat_size());

        if query.dim() != (entities, self.attn_size()) {
            return Err(Error::shape(
                "temporal_pattern_attention.query",
                &[entities, self.attn_size()],
                query.shape(),
            ));
        }
        // The kernel must cover the history exactly; a longer history would
        // leave extra conv rows that no longer line up with the feature grid.
        if channels != 1 || steps != self.attn_len() || attn_size != self.attn_size() {
            return Err(Error::shape(
                "temporal_pattern_attention.conv",
                &[entities, 1, self.attn_len(), self.attn_size()],
                history.shape(),
            ));
        }

        // [N, F]
        let w = self.linear1.forward(query)?;

        // [N, F, 1, feat] reinterpreted in memory order as [N, feat, F]
        let conv_vecs: Array3<f64> = self
            .conv
            .forward(history)?
            .to_shape((entities, feat_size, filter_num))?
            .mapv(relu);
        debug_numerics("attention_conv", &conv_vecs);

        // s[n, i] = sum_f conv[n, i, f] * w[n, f]
        let scores = Array2::from_shape_fn((entities, feat_size), |(n, i)| {
            conv_vecs.slice(s![n, i, ..]).dot(&w.row(n))
        });
        let alpha = scores.mapv(sigmoid);

        // v[n, f] = sum_i alpha[n, i] * conv[n, i, f]
        let context = Array2::from_shape_fn((entities, filter_num), |(n, f)| {
            alpha.row(n).dot(&conv_vecs.slice(s![n, .., f]))
        });

        let concat = concatenate(Axis(1), &[query.view(), context.view()])?;
        let hidden = self.linear2.forward(concat.view())?;

        Ok(AttentionOutput { hidden, alpha })
    }

    pub(crate) fn check(&self, filter_num: usize, attn_len: usize, attn_size: usize) -> Result<()> {
        self.conv
            .check("temporal_pattern_attention.conv", [filter_num, 1, attn_len, FILTER_SIZE])?;
        self.linear1
            .check("temporal_pattern_attention.linear1", attn_size, filter_num)?;
        self.linear2
            .check("temporal_pattern_attention.linear2", attn_size + filter_num, attn_size)
    }
}
