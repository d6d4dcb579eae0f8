//! Proposal result types

use serde::{Deserialize, Serialize};

/// A temporal segment in absolute frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// First frame of the segment
    pub start: i64,
    /// One past the last frame of the segment
    pub end: i64,
}

impl Segment {
    /// Segment length in frames
    pub fn length(&self) -> i64 {
        self.end - self.start
    }
}

/// Metadata describing one proposal-generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalMetadata {
    /// Number of windows scanned
    pub num_windows: usize,

    /// Window size used, in frames
    pub window_size: usize,

    /// Window stride used, in frames
    pub stride: usize,

    /// Model configuration in its string encoding
    pub model: String,

    /// Pooling strategy in its string encoding
    pub pooling: String,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,
}

/// Proposals generated for one video
///
/// `segments` and `scores` run in parallel: `scores[i]` is the confidence of
/// `segments[i]`. Ordering is window-major, proposal-index-minor — the
/// `n_outputs` proposals of the first window come first, in head order, then
/// the proposals of the second window, and so on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProposals {
    /// Video identifier
    pub video: String,

    /// Proposal segments in absolute frame coordinates
    pub segments: Vec<Segment>,

    /// Confidence score per segment, parallel to `segments`
    pub scores: Vec<f32>,

    /// Run metadata
    pub metadata: ProposalMetadata,
}

impl VideoProposals {
    /// Number of proposals
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the video yielded no proposals (shorter than one window)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate `(segment, score)` pairs in emission order
    pub fn iter(&self) -> impl Iterator<Item = (Segment, f32)> + '_ {
        self.segments.iter().copied().zip(self.scores.iter().copied())
    }

    /// Proposals sorted by descending confidence
    pub fn ranked(&self) -> Vec<(Segment, f32)> {
        let mut pairs: Vec<(Segment, f32)> = self.iter().collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }
}
