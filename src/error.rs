//! Error types for the proposal engine

use std::fmt;

/// Errors that can occur while building networks or generating proposals
#[derive(Debug, Clone)]
pub enum ProposalError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Malformed or unrecognized model configuration
    ConfigError(String),

    /// Weight archive does not match the network
    WeightError(String),

    /// Feature store I/O or lookup error
    FeatureError(String),
}

impl fmt::Display for ProposalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ProposalError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ProposalError::WeightError(msg) => write!(f, "Weight error: {}", msg),
            ProposalError::FeatureError(msg) => write!(f, "Feature store error: {}", msg),
        }
    }
}

impl std::error::Error for ProposalError {}
