//! Configuration parameters for network construction and proposal generation

use std::fmt;
use std::str::FromStr;

use crate::error::ProposalError;
use crate::features::pooling::PoolingStrategy;

/// Hyperparameters for the feed-forward (MLP) network variant
#[derive(Debug, Clone, PartialEq)]
pub struct MlpConfig {
    /// Number of proposals emitted per window
    pub n_outputs: usize,

    /// Number of hidden dense layers
    pub depth: usize,

    /// Width of each hidden dense layer
    pub width: usize,

    /// Input dropout rate (training-time only; evaluation is deterministic)
    pub drop_input: f32,

    /// Hidden dropout rate (training-time only; evaluation is deterministic)
    pub drop_hidden: f32,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            n_outputs: 16,
            depth: 2,
            width: 1024,
            drop_input: 0.2,
            drop_hidden: 0.5,
        }
    }
}

/// Hyperparameters for the recurrent (LSTM) network variant
#[derive(Debug, Clone, PartialEq)]
pub struct LstmConfig {
    /// Number of proposals emitted per window
    pub n_outputs: usize,

    /// Number of timesteps the flat input vector is reshaped into
    pub seq_length: usize,

    /// Hidden state size of each recurrent layer
    pub width: usize,

    /// Number of stacked recurrent layers
    pub depth: usize,

    /// Gradient clipping bound (training-time only; recorded with the model)
    pub grad_clip: f32,

    /// Initial forget-gate bias
    pub forget_bias: f32,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            n_outputs: 16,
            seq_length: 256,
            width: 512,
            depth: 2,
            grad_clip: 100.0,
            forget_bias: 1.0,
        }
    }
}

/// Network architecture selection
///
/// The two variants share the same output heads (a localization regressor of
/// width `2 * n_outputs` and a sigmoid confidence head of width `n_outputs`)
/// and differ only in the trunk producing the shared embedding.
///
/// Parsed from the compact string encodings used by configuration files and
/// command lines:
///
/// - `"mlp:n_outputs,depth,width,drop_in,drop_hid"`
/// - `"lstm:n_outputs,seq_length,width,depth"`
///
/// # Example
///
/// ```
/// use temporal_proposals::ModelConfig;
///
/// let config: ModelConfig = "mlp:5,1,4,0.0,0.0".parse().unwrap();
/// assert_eq!(config.n_outputs(), 5);
/// assert!("cnn:1,2,3".parse::<ModelConfig>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ModelConfig {
    /// Feed-forward trunk
    Mlp(MlpConfig),
    /// Recurrent trunk
    Lstm(LstmConfig),
}

impl ModelConfig {
    /// Number of proposals emitted per window, shared by both variants
    pub fn n_outputs(&self) -> usize {
        match self {
            ModelConfig::Mlp(c) => c.n_outputs,
            ModelConfig::Lstm(c) => c.n_outputs,
        }
    }

    /// Short tag naming the variant (`"mlp"` or `"lstm"`)
    pub fn kind(&self) -> &'static str {
        match self {
            ModelConfig::Mlp(_) => "mlp",
            ModelConfig::Lstm(_) => "lstm",
        }
    }
}

fn parse_field<T: FromStr>(raw: &str, name: &str, spec: &str) -> Result<T, ProposalError> {
    raw.trim().parse().map_err(|_| {
        ProposalError::ConfigError(format!(
            "cannot parse {} from '{}' in model configuration '{}'",
            name, raw, spec
        ))
    })
}

impl FromStr for ModelConfig {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once(':').ok_or_else(|| {
            ProposalError::ConfigError(format!("missing ':' in model configuration '{}'", s))
        })?;
        let fields: Vec<&str> = rest.split(',').collect();

        match kind {
            "mlp" => {
                if fields.len() != 5 {
                    return Err(ProposalError::ConfigError(format!(
                        "mlp configuration needs 5 fields (n_outputs,depth,width,drop_in,drop_hid), got {} in '{}'",
                        fields.len(),
                        s
                    )));
                }
                Ok(ModelConfig::Mlp(MlpConfig {
                    n_outputs: parse_field(fields[0], "n_outputs", s)?,
                    depth: parse_field(fields[1], "depth", s)?,
                    width: parse_field(fields[2], "width", s)?,
                    drop_input: parse_field(fields[3], "drop_in", s)?,
                    drop_hidden: parse_field(fields[4], "drop_hid", s)?,
                }))
            }
            "lstm" => {
                if fields.len() != 4 {
                    return Err(ProposalError::ConfigError(format!(
                        "lstm configuration needs 4 fields (n_outputs,seq_length,width,depth), got {} in '{}'",
                        fields.len(),
                        s
                    )));
                }
                Ok(ModelConfig::Lstm(LstmConfig {
                    n_outputs: parse_field(fields[0], "n_outputs", s)?,
                    seq_length: parse_field(fields[1], "seq_length", s)?,
                    width: parse_field(fields[2], "width", s)?,
                    depth: parse_field(fields[3], "depth", s)?,
                    ..LstmConfig::default()
                }))
            }
            _ => Err(ProposalError::ConfigError(format!(
                "unrecognized model type '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelConfig::Mlp(c) => write!(
                f,
                "mlp:{},{},{},{},{}",
                c.n_outputs, c.depth, c.width, c.drop_input, c.drop_hidden
            ),
            ModelConfig::Lstm(c) => write!(
                f,
                "lstm:{},{},{},{}",
                c.n_outputs, c.seq_length, c.width, c.depth
            ),
        }
    }
}

/// Sliding-window and feature-pooling parameters for proposal generation
#[derive(Debug, Clone)]
pub struct ProposalConfig {
    /// Canonical temporal size of an evaluation window, in frames (default: 256)
    pub window_size: usize,

    /// Step between consecutive window starts, in frames (default: 128)
    pub stride: usize,

    /// Temporal extent of one stored feature snippet, in frames (default: 16)
    pub snippet_size: usize,

    /// Step between consecutive stored snippets, in frames (default: 8)
    pub snippet_stride: usize,

    /// Pooling strategy applied over the snippets of a window (default: mean)
    pub pooling: PoolingStrategy,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            window_size: 256,
            stride: 128,
            snippet_size: 16,
            snippet_stride: 8,
            pooling: PoolingStrategy::Mean,
        }
    }
}
