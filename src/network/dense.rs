//! Dense (fully connected) layer

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

/// Logistic sigmoid for a single value
pub(crate) fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Nonlinearity applied after the affine transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Identity (no nonlinearity)
    Linear,
    /// Rectified linear unit
    Rectify,
    /// Logistic sigmoid
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
}

impl Activation {
    fn apply(&self, x: Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Linear => x,
            Activation::Rectify => x.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => x.mapv(sigmoid),
            Activation::Tanh => x.mapv(f32::tanh),
        }
    }
}

/// Fully connected layer
///
/// Weight shape is `(in_features, out_features)` and the forward pass is
/// `activation(x · W + b)`, matching the orientation weight archives are
/// serialized in.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub(crate) weight: Array2<f32>,
    pub(crate) bias: Array1<f32>,
    activation: Activation,
}

impl DenseLayer {
    /// Create a layer with Glorot-uniform weights and zero bias
    pub fn new(in_features: usize, out_features: usize, activation: Activation) -> Self {
        let mut rng = rand::thread_rng();
        let limit = (6.0 / (in_features + out_features) as f32).sqrt();
        let weight =
            Array2::from_shape_fn((in_features, out_features), |_| rng.gen_range(-limit..limit));
        Self {
            weight,
            bias: Array1::zeros(out_features),
            activation,
        }
    }

    /// Number of input features
    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    /// Number of output features
    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    /// Evaluate the layer on a `(batch, in_features)` input
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut y = x.dot(&self.weight);
        y += &self.bias.view().insert_axis(Axis(0));
        self.activation.apply(y)
    }
}
