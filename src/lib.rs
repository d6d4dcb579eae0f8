//! # Temporal Proposals
//!
//! A temporal action proposal engine for untrimmed video: given precomputed
//! per-snippet video features, it predicts candidate time intervals likely to
//! contain an activity, with a confidence score per interval.
//!
//! ## Features
//!
//! - **Two network variants**: a feed-forward MLP and a stacked LSTM trunk,
//!   both with a localization head and a sigmoid confidence head
//! - **Positional weight loading**: restores pretrained parameters from npz
//!   archives (`arr_0..arr_{n-1}`)
//! - **Sliding-window scanning**: fixed-size windows with fixed stride,
//!   pooled feature reads batched per video
//! - **Deterministic evaluation**: stochastic layers are never active
//!
//! ## Quick Start
//!
//! ```no_run
//! use temporal_proposals::{
//!     generate_proposals, load_weights, ModelConfig, ProposalConfig, ProposalNetwork,
//! };
//!
//! let config: ModelConfig = "mlp:16,2,1024,0.0,0.0".parse()?;
//! let mut network = ProposalNetwork::build(&config, 4096)?;
//! load_weights("weights.npz", &mut network)?;
//!
//! let result = generate_proposals(
//!     "video_0001",
//!     5120,
//!     &network,
//!     &ProposalConfig::default(),
//!     "features.npz",
//! )?;
//!
//! for (segment, score) in result.ranked().iter().take(5) {
//!     println!("[{}, {}) score {:.3}", segment.start, segment.end, score);
//! }
//! # Ok::<(), temporal_proposals::ProposalError>(())
//! ```
//!
//! ## Architecture
//!
//! The generation pipeline follows this flow:
//!
//! ```text
//! Model config -> Network build -> Weight load -> (per video)
//! Feature store -> Window pooling -> Forward pass -> Segment mapping
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod features;
pub mod network;
pub mod proposals;

// Re-export main types
pub use config::{LstmConfig, MlpConfig, ModelConfig, ProposalConfig};
pub use error::ProposalError;
pub use features::pooling::{PoolBase, PoolingStrategy};
pub use features::store::FeatureStore;
pub use network::loss::weighted_binary_crossentropy;
pub use network::weights::load_weights;
pub use network::ProposalNetwork;
pub use proposals::result::{ProposalMetadata, Segment, VideoProposals};

/// Generate proposals for one video
///
/// Opens the feature store at `features_path`, scans the video with the
/// sliding-window geometry in `config`, evaluates the network over all
/// windows in one batch, and maps the outputs to absolute segments. The
/// store handle is released before the function returns.
///
/// # Arguments
///
/// * `video_name` - Video identifier in the feature store
/// * `video_length` - Total video length in frames
/// * `network` - Built network, typically with loaded weights
/// * `config` - Window geometry and pooling strategy
/// * `features_path` - Path to the npz feature store
///
/// # Returns
///
/// [`VideoProposals`] with parallel segment and score vectors. A video not
/// longer than one window yields zero proposals and zero scores.
///
/// # Errors
///
/// Returns [`ProposalError`] when the video name is empty, the store cannot
/// be read, or the pooled features do not match the network.
pub fn generate_proposals(
    video_name: &str,
    video_length: usize,
    network: &ProposalNetwork,
    config: &ProposalConfig,
    features_path: &str,
) -> Result<VideoProposals, ProposalError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Generating proposals for '{}' ({} frames) with {} model",
        video_name,
        video_length,
        network.config().kind()
    );

    if video_name.is_empty() {
        return Err(ProposalError::InvalidInput(
            "empty video name".to_string(),
        ));
    }

    let mut store = FeatureStore::open(
        features_path,
        config.snippet_size,
        config.snippet_stride,
        config.pooling,
    )?;
    let (segments, scores, num_windows) =
        proposals::assembler::retrieve_proposals(video_name, video_length, network, config, &mut store)?;
    let pooling = store.pooling().to_string();
    drop(store);

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!(
        "Video '{}': {} proposals in {:.2} ms",
        video_name,
        segments.len(),
        processing_time_ms
    );

    Ok(VideoProposals {
        video: video_name.to_string(),
        segments,
        scores,
        metadata: ProposalMetadata {
            num_windows,
            window_size: config.window_size,
            stride: config.stride,
            model: network.config().to_string(),
            pooling,
            processing_time_ms,
        },
    })
}
