//! Sliding-window proposal assembly
//!
//! The core pipeline: slide a fixed-size window across the video, read one
//! pooled descriptor per window, evaluate the network once over the whole
//! batch, and map the normalized `(start, length)` regressions back into
//! absolute frame coordinates.

use crate::config::ProposalConfig;
use crate::error::ProposalError;
use crate::features::store::FeatureStore;
use crate::network::ProposalNetwork;
use crate::proposals::result::Segment;
use crate::proposals::segment::corner_to_boundary;

/// Window start offsets for a video of `video_length` frames
///
/// The sequence is `0, stride, 2*stride, ...` up to and including
/// `video_length - window_size`, so a video longer than one window yields
/// `floor((L - T) / stride) + 1` offsets. A video not longer than one window
/// yields no offsets at all — callers must handle empty-proposal videos.
///
/// # Errors
///
/// Returns `InvalidInput` when `window_size` or `stride` is zero.
pub fn window_offsets(
    video_length: usize,
    window_size: usize,
    stride: usize,
) -> Result<Vec<usize>, ProposalError> {
    if window_size == 0 || stride == 0 {
        return Err(ProposalError::InvalidInput(
            "window size and stride must be > 0".to_string(),
        ));
    }
    if video_length <= window_size {
        return Ok(Vec::new());
    }
    Ok((0..=video_length - window_size).step_by(stride).collect())
}

/// Generate proposals for one video from an open feature store
///
/// Returns `(segments, scores, num_windows)`. Segments and scores run in
/// parallel, window-major and proposal-index-minor; each window contributes
/// `n_outputs` consecutive entries.
///
/// Localization regressions are clipped to `[0, 1]` before being scaled by
/// the window size, so out-of-range predictions never escape their window's
/// span; boundaries are truncated to integer frames.
///
/// # Errors
///
/// Propagates feature-store and network errors, and returns `InvalidInput`
/// when the pooled descriptor width does not match the network's input size.
pub fn retrieve_proposals(
    video_name: &str,
    video_length: usize,
    network: &ProposalNetwork,
    config: &ProposalConfig,
    store: &mut FeatureStore,
) -> Result<(Vec<Segment>, Vec<f32>, usize), ProposalError> {
    let window = config.window_size;
    let offsets = window_offsets(video_length, window, config.stride)?;
    if offsets.is_empty() {
        log::debug!(
            "Video '{}' ({} frames) is not longer than one window ({} frames), no proposals",
            video_name,
            video_length,
            window
        );
        return Ok((Vec::new(), Vec::new(), 0));
    }

    let features = store.read_pooled_windows(video_name, &offsets, window)?;
    if features.ncols() != network.input_size() {
        return Err(ProposalError::InvalidInput(format!(
            "pooled descriptors have {} dims but the network expects {} \
             (check the pooling strategy against the model)",
            features.ncols(),
            network.input_size()
        )));
    }

    let (loc, conf) = network.forward(features.view())?;
    let n_outputs = network.n_outputs();

    // Normalized (start, length) -> absolute corners. The second coordinate
    // is relative to length zero, so only the start picks up the window base.
    let mut corners = loc.mapv(|v| v.clamp(0.0, 1.0) * window as f32);
    for (row, mut pair) in corners.rows_mut().into_iter().enumerate() {
        pair[0] += offsets[row / n_outputs] as f32;
    }
    let bounds = corner_to_boundary(&corners)?;

    let segments: Vec<Segment> = bounds
        .rows()
        .into_iter()
        .map(|pair| Segment {
            start: pair[0] as i64,
            end: pair[1] as i64,
        })
        .collect();
    let scores: Vec<f32> = conf.iter().copied().collect();

    log::debug!(
        "Video '{}': {} windows -> {} proposals",
        video_name,
        offsets.len(),
        segments.len()
    );
    Ok((segments, scores, offsets.len()))
}
