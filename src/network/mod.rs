//! Network construction and evaluation
//!
//! This module builds the proposal network (a trunk producing a shared
//! embedding plus two output heads), runs the deterministic forward pass,
//! restores parameters from weight archives, and provides the training loss:
//! - Dense and LSTM building blocks
//! - Trunk variants (feed-forward / recurrent)
//! - Positional weight loading from npz archives
//! - Weighted binary cross-entropy

pub mod dense;
pub mod loss;
pub mod lstm;
pub mod mlp;
pub mod weights;

use ndarray::{Array2, ArrayD, ArrayView2};

use crate::config::ModelConfig;
use crate::error::ProposalError;
use self::dense::{Activation, DenseLayer};
use self::lstm::LstmTrunk;
use self::mlp::MlpTrunk;

/// Trunk producing the shared embedding for both heads
#[derive(Debug, Clone)]
pub enum Trunk {
    /// Feed-forward stack of rectified dense layers
    Mlp(MlpTrunk),
    /// Stacked LSTM retaining the final timestep
    Lstm(LstmTrunk),
}

/// Proposal network: trunk plus localization and confidence heads
///
/// The localization head is a linear regressor of width `2 * n_outputs`
/// emitting `(start, length)` offset pairs normalized to the window; the
/// confidence head is a sigmoid classifier of width `n_outputs`. Both heads
/// attach to the trunk embedding identically for either trunk variant.
///
/// The structure is fixed at build time; parameters are mutable only through
/// [`weights::load_weights`] / [`ProposalNetwork::set_parameters`].
#[derive(Debug, Clone)]
pub struct ProposalNetwork {
    config: ModelConfig,
    input_size: usize,
    trunk: Trunk,
    localization: DenseLayer,
    confidence: DenseLayer,
}

impl ProposalNetwork {
    /// Build a network for flat `input_size`-dimensional window descriptors
    ///
    /// For the LSTM variant the flat descriptor is consumed as `seq_length`
    /// timesteps, so `input_size` must be divisible by `seq_length`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for degenerate hyperparameters (zero outputs,
    /// zero width, an LSTM without layers or timesteps, or a non-divisible
    /// LSTM input size).
    pub fn build(config: &ModelConfig, input_size: usize) -> Result<Self, ProposalError> {
        if input_size == 0 {
            return Err(ProposalError::ConfigError(
                "input size must be > 0".to_string(),
            ));
        }
        if config.n_outputs() == 0 {
            return Err(ProposalError::ConfigError(
                "n_outputs must be > 0".to_string(),
            ));
        }

        let trunk = match config {
            ModelConfig::Mlp(mlp) => {
                if mlp.depth > 0 && mlp.width == 0 {
                    return Err(ProposalError::ConfigError(
                        "mlp width must be > 0".to_string(),
                    ));
                }
                Trunk::Mlp(MlpTrunk::new(mlp, input_size))
            }
            ModelConfig::Lstm(lstm) => {
                if lstm.depth == 0 || lstm.width == 0 {
                    return Err(ProposalError::ConfigError(
                        "lstm depth and width must be > 0".to_string(),
                    ));
                }
                if lstm.seq_length == 0 {
                    return Err(ProposalError::ConfigError(
                        "lstm seq_length must be > 0".to_string(),
                    ));
                }
                if input_size % lstm.seq_length != 0 {
                    return Err(ProposalError::ConfigError(format!(
                        "input size {} is not divisible by seq_length {}",
                        input_size, lstm.seq_length
                    )));
                }
                Trunk::Lstm(LstmTrunk::new(lstm, input_size / lstm.seq_length))
            }
        };

        let embedding_size = match &trunk {
            Trunk::Mlp(t) => t.output_size(),
            Trunk::Lstm(t) => t.output_size(),
        };
        let n_outputs = config.n_outputs();

        log::debug!(
            "Built {} network: input={}, embedding={}, n_outputs={}",
            config.kind(),
            input_size,
            embedding_size,
            n_outputs
        );

        Ok(Self {
            config: config.clone(),
            input_size,
            trunk,
            localization: DenseLayer::new(embedding_size, 2 * n_outputs, Activation::Linear),
            confidence: DenseLayer::new(embedding_size, n_outputs, Activation::Sigmoid),
        })
    }

    /// The configuration the network was built from
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Flat per-window feature size the network consumes
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Number of proposals emitted per window
    pub fn n_outputs(&self) -> usize {
        self.config.n_outputs()
    }

    /// Deterministic forward pass over a `(batch, input_size)` feature batch
    ///
    /// Returns `(localization, confidence)`:
    /// - localization as `(batch * n_outputs, 2)` offset pairs, unbounded
    /// - confidence as `(batch, n_outputs)` sigmoid scores
    ///
    /// Stochastic layers are never active; evaluating the same batch twice
    /// yields identical outputs. The function mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the batch width does not match
    /// [`ProposalNetwork::input_size`].
    pub fn forward(
        &self,
        features: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>), ProposalError> {
        let (batch, dim) = features.dim();
        if dim != self.input_size {
            return Err(ProposalError::InvalidInput(format!(
                "feature batch has {} columns, network expects {}",
                dim, self.input_size
            )));
        }

        let embedding = match &self.trunk {
            Trunk::Mlp(trunk) => trunk.forward(features),
            Trunk::Lstm(trunk) => {
                let seq = trunk.seq_length();
                let stacked = features
                    .to_owned()
                    .into_shape((batch, seq, dim / seq))
                    .map_err(|e| {
                        ProposalError::InvalidInput(format!(
                            "cannot reshape feature batch to {} timesteps: {}",
                            seq, e
                        ))
                    })?;
                trunk.forward(stacked.view())
            }
        };

        let loc = self.localization.forward(embedding.view());
        let conf = self.confidence.forward(embedding.view());

        let pairs = loc
            .into_shape((batch * self.n_outputs(), 2))
            .map_err(|e| ProposalError::InvalidInput(format!("localization reshape: {}", e)))?;
        Ok((pairs, conf))
    }

    /// Shapes of all parameters in enumeration order
    ///
    /// The order is part of the weight-archive contract: trunk layers first
    /// (dense layers as `[W, b]`, LSTM layers as `[W_in, W_hid, b]`), then
    /// the localization head `[W, b]`, then the confidence head `[W, b]`.
    pub fn parameter_shapes(&self) -> Vec<Vec<usize>> {
        let mut shapes = Vec::new();
        match &self.trunk {
            Trunk::Mlp(trunk) => {
                for layer in &trunk.layers {
                    shapes.push(layer.weight.shape().to_vec());
                    shapes.push(layer.bias.shape().to_vec());
                }
            }
            Trunk::Lstm(trunk) => {
                for layer in &trunk.layers {
                    shapes.push(layer.w_in.shape().to_vec());
                    shapes.push(layer.w_hid.shape().to_vec());
                    shapes.push(layer.bias.shape().to_vec());
                }
            }
        }
        for head in [&self.localization, &self.confidence] {
            shapes.push(head.weight.shape().to_vec());
            shapes.push(head.bias.shape().to_vec());
        }
        shapes
    }

    /// Assign all parameters in enumeration order
    ///
    /// Validates array count and every shape before mutating anything, so a
    /// mismatched archive never leaves the network half-updated.
    ///
    /// # Errors
    ///
    /// Returns `WeightError` on count or shape mismatch.
    pub fn set_parameters(&mut self, params: Vec<ArrayD<f32>>) -> Result<(), ProposalError> {
        let expected = self.parameter_shapes();
        if params.len() != expected.len() {
            return Err(ProposalError::WeightError(format!(
                "archive holds {} arrays, network has {} parameters",
                params.len(),
                expected.len()
            )));
        }
        for (index, (param, shape)) in params.iter().zip(&expected).enumerate() {
            if param.shape() != shape.as_slice() {
                return Err(ProposalError::WeightError(format!(
                    "parameter {} has shape {:?}, network expects {:?}",
                    index,
                    param.shape(),
                    shape
                )));
            }
        }

        let mut iter = params.into_iter();
        match &mut self.trunk {
            Trunk::Mlp(trunk) => {
                for layer in &mut trunk.layers {
                    layer.weight = take_2d(&mut iter)?;
                    layer.bias = take_1d(&mut iter)?;
                }
            }
            Trunk::Lstm(trunk) => {
                for layer in &mut trunk.layers {
                    layer.w_in = take_2d(&mut iter)?;
                    layer.w_hid = take_2d(&mut iter)?;
                    layer.bias = take_1d(&mut iter)?;
                }
            }
        }
        for head in [&mut self.localization, &mut self.confidence] {
            head.weight = take_2d(&mut iter)?;
            head.bias = take_1d(&mut iter)?;
        }
        Ok(())
    }
}

fn take_2d(
    iter: &mut std::vec::IntoIter<ArrayD<f32>>,
) -> Result<ndarray::Array2<f32>, ProposalError> {
    iter.next()
        .ok_or_else(|| ProposalError::WeightError("parameter list exhausted".to_string()))?
        .into_dimensionality()
        .map_err(|e| ProposalError::WeightError(format!("expected a matrix parameter: {}", e)))
}

fn take_1d(
    iter: &mut std::vec::IntoIter<ArrayD<f32>>,
) -> Result<ndarray::Array1<f32>, ProposalError> {
    iter.next()
        .ok_or_else(|| ProposalError::WeightError("parameter list exhausted".to_string()))?
        .into_dimensionality()
        .map_err(|e| ProposalError::WeightError(format!("expected a vector parameter: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn mlp_network(spec: &str, input_size: usize) -> ProposalNetwork {
        let config: ModelConfig = spec.parse().unwrap();
        ProposalNetwork::build(&config, input_size).unwrap()
    }

    #[test]
    fn test_head_widths() {
        // "mlp:5,1,4,0.0,0.0" must yield a localization head of width 10 and
        // a confidence head of width 5.
        let network = mlp_network("mlp:5,1,4,0.0,0.0", 8);
        assert_eq!(network.localization.out_features(), 10);
        assert_eq!(network.confidence.out_features(), 5);
    }

    #[test]
    fn test_forward_shapes_mlp() {
        let network = mlp_network("mlp:5,1,4,0.0,0.0", 8);
        let (loc, conf) = network.forward(Array2::zeros((3, 8)).view()).unwrap();
        assert_eq!(loc.dim(), (15, 2));
        assert_eq!(conf.dim(), (3, 5));
    }

    #[test]
    fn test_forward_shapes_lstm() {
        let config: ModelConfig = "lstm:4,3,6,2".parse().unwrap();
        let network = ProposalNetwork::build(&config, 12).unwrap();
        let (loc, conf) = network.forward(Array2::zeros((2, 12)).view()).unwrap();
        assert_eq!(loc.dim(), (8, 2));
        assert_eq!(conf.dim(), (2, 4));
    }

    #[test]
    fn test_lstm_indivisible_input_rejected() {
        let config: ModelConfig = "lstm:4,5,6,1".parse().unwrap();
        let result = ProposalNetwork::build(&config, 12);
        assert!(matches!(result, Err(ProposalError::ConfigError(_))));
    }

    #[test]
    fn test_forward_wrong_width_rejected() {
        let network = mlp_network("mlp:2,1,4,0.0,0.0", 8);
        let result = network.forward(Array2::zeros((3, 9)).view());
        assert!(matches!(result, Err(ProposalError::InvalidInput(_))));
    }

    #[test]
    fn test_forward_deterministic() {
        let network = mlp_network("mlp:3,2,16,0.2,0.5", 8);
        let batch = Array2::from_shape_fn((4, 8), |(i, j)| (i * 8 + j) as f32 * 0.01);
        let (loc_a, conf_a) = network.forward(batch.view()).unwrap();
        let (loc_b, conf_b) = network.forward(batch.view()).unwrap();
        assert_eq!(loc_a, loc_b);
        assert_eq!(conf_a, conf_b);
    }

    #[test]
    fn test_zero_weights_forward() {
        // With every parameter zeroed, the regression head emits 0 and the
        // sigmoid confidence head emits exactly 0.5.
        let mut network = mlp_network("mlp:1,1,1,0.0,0.0", 2);
        let zeros: Vec<ArrayD<f32>> = network
            .parameter_shapes()
            .into_iter()
            .map(|shape| ArrayD::zeros(shape))
            .collect();
        network.set_parameters(zeros).unwrap();

        let (loc, conf) = network
            .forward(Array2::from_elem((2, 2), 3.5).view())
            .unwrap();
        assert!(loc.iter().all(|&v| v == 0.0));
        assert!(conf.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_hand_computed_minimal_mlp() {
        // depth=1, width=1: embedding = relu(x·w + b), loc = e·wl + bl,
        // conf = sigmoid(e·wc + bc).
        let mut network = mlp_network("mlp:1,1,1,0.0,0.0", 1);
        let params: Vec<ArrayD<f32>> = vec![
            Array2::from_elem((1, 1), 2.0).into_dyn(),  // trunk W
            Array1::from_elem(1, 1.0).into_dyn(),       // trunk b
            Array2::from_elem((1, 2), 0.5).into_dyn(),  // loc W
            Array1::from_elem(2, -1.0).into_dyn(),      // loc b
            Array2::from_elem((1, 1), 0.0).into_dyn(),  // conf W
            Array1::from_elem(1, 0.0).into_dyn(),       // conf b
        ];
        network.set_parameters(params).unwrap();

        // x = 3: embedding = relu(3*2 + 1) = 7; loc = 7*0.5 - 1 = 2.5
        let (loc, conf) = network
            .forward(Array2::from_elem((1, 1), 3.0).view())
            .unwrap();
        assert_eq!(loc, Array2::from_elem((1, 2), 2.5));
        assert_eq!(conf, Array2::from_elem((1, 1), 0.5));
    }

    #[test]
    fn test_set_parameters_count_mismatch() {
        let mut network = mlp_network("mlp:1,1,1,0.0,0.0", 2);
        let result = network.set_parameters(vec![ArrayD::zeros(vec![2, 1])]);
        assert!(matches!(result, Err(ProposalError::WeightError(_))));
    }

    #[test]
    fn test_set_parameters_shape_mismatch() {
        let mut network = mlp_network("mlp:1,1,1,0.0,0.0", 2);
        let mut params: Vec<ArrayD<f32>> = network
            .parameter_shapes()
            .into_iter()
            .map(|shape| ArrayD::zeros(shape))
            .collect();
        params[0] = ArrayD::zeros(vec![3, 3]);
        let result = network.set_parameters(params);
        assert!(matches!(result, Err(ProposalError::WeightError(_))));
    }

    #[test]
    fn test_parameter_shapes_lstm() {
        let config: ModelConfig = "lstm:2,4,3,2".parse().unwrap();
        let network = ProposalNetwork::build(&config, 8).unwrap();
        let shapes = network.parameter_shapes();
        // 2 layers * [w_in, w_hid, b] + 2 heads * [W, b]
        assert_eq!(shapes.len(), 10);
        assert_eq!(shapes[0], vec![2, 12]); // step size 8/4, 4 gates * width 3
        assert_eq!(shapes[1], vec![3, 12]);
        assert_eq!(shapes[2], vec![12]);
        assert_eq!(shapes[3], vec![3, 12]); // second layer consumes width 3
        assert_eq!(shapes[6], vec![3, 4]); // localization head
        assert_eq!(shapes[8], vec![3, 2]); // confidence head
    }
}
