//! npz-backed feature store
//!
//! A feature store is an npz archive holding one f32 array per video id,
//! shaped `(n_snippets, feature_dim)`. Snippet `j` describes the frames
//! `[j * snippet_stride, j * snippet_stride + snippet_size)` of its video.
//! Reads are batched: one call pools the snippets of every requested window
//! into a `(windows, pooled_dim)` matrix. The archive handle is released when
//! the store is dropped, so a store opened for one retrieval brackets its
//! reads with open/close.

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::{s, Array2};
use ndarray_npy::NpzReader;

use crate::error::ProposalError;
use crate::features::pooling::PoolingStrategy;

/// Handle to an open feature store
pub struct FeatureStore {
    npz: NpzReader<File>,
    entries: Vec<String>,
    path: PathBuf,
    snippet_size: usize,
    snippet_stride: usize,
    pooling: PoolingStrategy,
}

impl FeatureStore {
    /// Open a feature store archive
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the npz archive
    /// * `snippet_size` - Temporal extent of one stored snippet, in frames
    /// * `snippet_stride` - Step between consecutive snippets, in frames
    /// * `pooling` - Pooling strategy applied per window
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for zero snippet geometry and `FeatureError`
    /// when the archive cannot be opened.
    pub fn open<P: AsRef<Path>>(
        path: P,
        snippet_size: usize,
        snippet_stride: usize,
        pooling: PoolingStrategy,
    ) -> Result<Self, ProposalError> {
        if snippet_size == 0 || snippet_stride == 0 {
            return Err(ProposalError::InvalidInput(
                "snippet size and stride must be > 0".to_string(),
            ));
        }

        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            ProposalError::FeatureError(format!(
                "cannot open feature store '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            ProposalError::FeatureError(format!(
                "cannot read feature store '{}': {}",
                path.display(),
                e
            ))
        })?;
        let entries = npz.names().map_err(|e| {
            ProposalError::FeatureError(format!(
                "cannot list feature store '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::debug!(
            "Opened feature store {} with {} videos",
            path.display(),
            entries.len()
        );

        Ok(Self {
            npz,
            entries,
            path,
            snippet_size,
            snippet_stride,
            pooling,
        })
    }

    /// Pooling strategy this store applies per window
    pub fn pooling(&self) -> PoolingStrategy {
        self.pooling
    }

    /// Read pooled descriptors for a batch of windows of one video
    ///
    /// Each offset selects the window `[offset, offset + duration)`; the
    /// snippets fully contained in it are pooled into one row of the result.
    ///
    /// # Arguments
    ///
    /// * `video` - Video identifier (archive entry name)
    /// * `offsets` - Window start offsets, in frames
    /// * `duration` - Window duration, in frames
    ///
    /// # Returns
    ///
    /// A `(offsets.len(), pooled_dim)` matrix, one pooled descriptor per
    /// window in input order.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` when the video is not in the store, a window
    /// extends past the stored snippets, or a window covers no snippet;
    /// `InvalidInput` when `duration` is shorter than one snippet.
    pub fn read_pooled_windows(
        &mut self,
        video: &str,
        offsets: &[usize],
        duration: usize,
    ) -> Result<Array2<f32>, ProposalError> {
        if duration < self.snippet_size {
            return Err(ProposalError::InvalidInput(format!(
                "window duration {} is shorter than one snippet ({})",
                duration, self.snippet_size
            )));
        }

        let entry = self.resolve_entry(video).ok_or_else(|| {
            ProposalError::FeatureError(format!(
                "video '{}' not found in feature store '{}'",
                video,
                self.path.display()
            ))
        })?;
        let snippets: Array2<f32> = self.npz.by_name(&entry).map_err(|e| {
            ProposalError::FeatureError(format!("cannot read features for '{}': {}", video, e))
        })?;
        let (n_snippets, feature_dim) = snippets.dim();

        let pooled_dim = self.pooling.output_dim(feature_dim);
        let mut out = Array2::zeros((offsets.len(), pooled_dim));

        for (row, &offset) in offsets.iter().enumerate() {
            // Snippets fully contained in [offset, offset + duration).
            let first = (offset + self.snippet_stride - 1) / self.snippet_stride;
            let last = (offset + duration - self.snippet_size) / self.snippet_stride;
            if first > last {
                return Err(ProposalError::FeatureError(format!(
                    "window [{}, {}) of '{}' covers no snippet",
                    offset,
                    offset + duration,
                    video
                )));
            }
            if last >= n_snippets {
                return Err(ProposalError::FeatureError(format!(
                    "window [{}, {}) of '{}' extends past the {} stored snippets",
                    offset,
                    offset + duration,
                    video,
                    n_snippets
                )));
            }

            let pooled = self
                .pooling
                .pool(snippets.slice(s![first..=last, ..]))?;
            out.row_mut(row).assign(&pooled);
        }

        log::debug!(
            "Read {} pooled windows of dim {} for video '{}'",
            offsets.len(),
            pooled_dim,
            video
        );
        Ok(out)
    }

    /// Find the archive entry for a video id, tolerating writers that do or
    /// do not append the `.npy` suffix to member names
    fn resolve_entry(&self, video: &str) -> Option<String> {
        let suffixed = format!("{}.npy", video);
        self.entries
            .iter()
            .find(|name| **name == video || **name == suffixed)
            .cloned()
    }
}

impl std::fmt::Debug for FeatureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureStore")
            .field("path", &self.path)
            .field("videos", &self.entries.len())
            .field("snippet_size", &self.snippet_size)
            .field("snippet_stride", &self.snippet_stride)
            .field("pooling", &self.pooling)
            .finish()
    }
}
