//! Feed-forward trunk
//!
//! A stack of rectified dense layers producing the shared embedding the two
//! output heads consume. Dropout rates from the configuration are recorded
//! with the trunk but never applied: this crate only evaluates networks, and
//! evaluation is deterministic.

use ndarray::{Array2, ArrayView2};

use crate::config::MlpConfig;
use crate::network::dense::{Activation, DenseLayer};

/// Stack of rectified dense layers
#[derive(Debug, Clone)]
pub struct MlpTrunk {
    pub(crate) layers: Vec<DenseLayer>,
    drop_input: f32,
    drop_hidden: f32,
    output_size: usize,
}

impl MlpTrunk {
    /// Build the trunk for a flat `input_size`-dimensional window descriptor
    ///
    /// With `depth == 0` the trunk is the identity and the heads attach
    /// directly to the input features.
    pub fn new(config: &MlpConfig, input_size: usize) -> Self {
        let mut layers = Vec::with_capacity(config.depth);
        let mut in_features = input_size;
        for _ in 0..config.depth {
            layers.push(DenseLayer::new(in_features, config.width, Activation::Rectify));
            in_features = config.width;
        }
        Self {
            layers,
            drop_input: config.drop_input,
            drop_hidden: config.drop_hidden,
            output_size: in_features,
        }
    }

    /// Width of the produced embedding
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Training-time dropout rates `(input, hidden)` recorded with the trunk
    pub fn dropout_rates(&self) -> (f32, f32) {
        (self.drop_input, self.drop_hidden)
    }

    /// Evaluate the trunk on a `(batch, input_size)` batch
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut h = x.to_owned();
        for layer in &self.layers {
            h = layer.forward(h.view());
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(depth: usize, width: usize) -> MlpConfig {
        MlpConfig {
            n_outputs: 1,
            depth,
            width,
            drop_input: 0.0,
            drop_hidden: 0.0,
        }
    }

    #[test]
    fn test_layer_chain_dimensions() {
        let trunk = MlpTrunk::new(&config(3, 7), 11);
        assert_eq!(trunk.layers.len(), 3);
        assert_eq!(trunk.layers[0].in_features(), 11);
        assert_eq!(trunk.layers[1].in_features(), 7);
        assert_eq!(trunk.layers[2].out_features(), 7);
        assert_eq!(trunk.output_size(), 7);
    }

    #[test]
    fn test_zero_depth_is_identity() {
        let trunk = MlpTrunk::new(&config(0, 7), 4);
        assert_eq!(trunk.output_size(), 4);

        let x = array![[1.0, -2.0, 3.0, 0.5]];
        assert_eq!(trunk.forward(x.view()), x);
    }

    #[test]
    fn test_forward_shape() {
        let trunk = MlpTrunk::new(&config(2, 5), 3);
        let out = trunk.forward(Array2::zeros((4, 3)).view());
        assert_eq!(out.dim(), (4, 5));
    }

    #[test]
    fn test_dropout_rates_recorded() {
        let trunk = MlpTrunk::new(
            &MlpConfig {
                drop_input: 0.2,
                drop_hidden: 0.5,
                ..config(1, 4)
            },
            3,
        );
        assert_eq!(trunk.dropout_rates(), (0.2, 0.5));
    }
}
