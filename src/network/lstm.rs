//! Recurrent trunk
//!
//! Stacked LSTM layers consuming a `(batch, seq_length, step_size)` input and
//! retaining only the final timestep of the top layer. Gate order within the
//! packed weight matrices is `[input, forget, cell, output]`; the forget-gate
//! bias is initialized to the configured constant so early training favors
//! remembering. The gradient-clipping bound is recorded with the trunk — it
//! constrains training, not the forward pass.

use ndarray::{s, Array1, Array2, Array3, ArrayView3, Axis};
use rand::Rng;

use crate::config::LstmConfig;
use crate::network::dense::sigmoid;

/// One recurrent layer with packed gate weights
#[derive(Debug, Clone)]
pub struct LstmLayer {
    /// Input-to-gates weights, shape `(step_size, 4 * width)`
    pub(crate) w_in: Array2<f32>,
    /// Hidden-to-gates weights, shape `(width, 4 * width)`
    pub(crate) w_hid: Array2<f32>,
    /// Packed gate bias, shape `(4 * width,)`
    pub(crate) bias: Array1<f32>,
    width: usize,
}

impl LstmLayer {
    /// Create a layer with Glorot-uniform weights and the forget-gate bias
    /// set to `forget_bias`
    pub fn new(step_size: usize, width: usize, forget_bias: f32) -> Self {
        let mut rng = rand::thread_rng();
        let in_limit = (6.0 / (step_size + 4 * width) as f32).sqrt();
        let hid_limit = (6.0 / (width + 4 * width) as f32).sqrt();
        let w_in =
            Array2::from_shape_fn((step_size, 4 * width), |_| rng.gen_range(-in_limit..in_limit));
        let w_hid =
            Array2::from_shape_fn((width, 4 * width), |_| rng.gen_range(-hid_limit..hid_limit));
        let mut bias = Array1::zeros(4 * width);
        bias.slice_mut(s![width..2 * width]).fill(forget_bias);
        Self {
            w_in,
            w_hid,
            bias,
            width,
        }
    }

    /// Per-timestep input size
    pub fn step_size(&self) -> usize {
        self.w_in.nrows()
    }

    /// Hidden state size
    pub fn width(&self) -> usize {
        self.width
    }

    /// Evaluate the layer over a full sequence, returning the hidden state at
    /// every timestep as a `(batch, seq, width)` array
    pub fn forward_sequence(&self, x: ArrayView3<f32>) -> Array3<f32> {
        let (batch, seq, _) = x.dim();
        let w = self.width;
        let mut h = Array2::<f32>::zeros((batch, w));
        let mut c = Array2::<f32>::zeros((batch, w));
        let mut out = Array3::<f32>::zeros((batch, seq, w));

        for t in 0..seq {
            let x_t = x.slice(s![.., t, ..]);
            let mut gates = x_t.dot(&self.w_in) + h.dot(&self.w_hid);
            gates += &self.bias.view().insert_axis(Axis(0));

            let i = gates.slice(s![.., 0..w]).mapv(sigmoid);
            let f = gates.slice(s![.., w..2 * w]).mapv(sigmoid);
            let g = gates.slice(s![.., 2 * w..3 * w]).mapv(f32::tanh);
            let o = gates.slice(s![.., 3 * w..4 * w]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f32::tanh);
            out.slice_mut(s![.., t, ..]).assign(&h);
        }

        out
    }
}

/// Stack of recurrent layers retaining the final timestep
#[derive(Debug, Clone)]
pub struct LstmTrunk {
    pub(crate) layers: Vec<LstmLayer>,
    seq_length: usize,
    grad_clip: f32,
}

impl LstmTrunk {
    /// Build `depth` stacked layers for `step_size`-dimensional timesteps
    pub fn new(config: &LstmConfig, step_size: usize) -> Self {
        let mut layers = Vec::with_capacity(config.depth);
        let mut in_size = step_size;
        for _ in 0..config.depth {
            layers.push(LstmLayer::new(in_size, config.width, config.forget_bias));
            in_size = config.width;
        }
        Self {
            layers,
            seq_length: config.seq_length,
            grad_clip: config.grad_clip,
        }
    }

    /// Number of timesteps the trunk expects
    pub fn seq_length(&self) -> usize {
        self.seq_length
    }

    /// Width of the produced embedding
    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.width()).unwrap_or(0)
    }

    /// Training-time gradient-clipping bound recorded with the trunk
    pub fn grad_clip(&self) -> f32 {
        self.grad_clip
    }

    /// Evaluate the stack on `(batch, seq_length, step_size)` input and
    /// return the final timestep's hidden state of the top layer
    pub fn forward(&self, x: ArrayView3<f32>) -> Array2<f32> {
        let seq = x.dim().1;
        let mut sequence = x.to_owned();
        for layer in &self.layers {
            sequence = layer.forward_sequence(sequence.view());
        }
        sequence.slice(s![.., seq - 1, ..]).to_owned()
    }
}
