//! Temporal pooling of snippet features
//!
//! A window of video covers a run of stored feature snippets; pooling
//! collapses that `(snippets, dim)` block into one flat descriptor. Besides
//! plain mean/max pooling, two structured variants preserve coarse temporal
//! layout: a temporal pyramid (every level `l` contributes `2^l` cells) and a
//! plain concatenation of `K` equal cells.

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array1, ArrayView2, Axis};

use crate::error::ProposalError;

/// Base reduction applied to one cell of snippet rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolBase {
    /// Arithmetic mean over snippets
    Mean,
    /// Element-wise maximum over snippets
    Max,
}

impl PoolBase {
    fn reduce(&self, rows: ArrayView2<f32>) -> Result<Array1<f32>, ProposalError> {
        if rows.nrows() == 0 {
            return Err(ProposalError::FeatureError(
                "cannot pool an empty snippet range".to_string(),
            ));
        }
        match self {
            PoolBase::Mean => rows.mean_axis(Axis(0)).ok_or_else(|| {
                ProposalError::FeatureError("cannot pool an empty snippet range".to_string())
            }),
            PoolBase::Max => Ok(rows.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &v| acc.max(v))),
        }
    }
}

impl fmt::Display for PoolBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolBase::Mean => write!(f, "mean"),
            PoolBase::Max => write!(f, "max"),
        }
    }
}

/// Global pooling strategy over the snippets of one window
///
/// Parsed from the compact encodings `"mean"`, `"max"`, `"pyr-L-mean"`,
/// `"pyr-L-max"`, `"concat-K-mean"`, `"concat-K-max"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Mean over all snippets
    Mean,
    /// Maximum over all snippets
    Max,
    /// Temporal pyramid: level `l` in `0..levels` splits the snippets into
    /// `2^l` cells; all cells are reduced with `base` and concatenated
    Pyramid {
        /// Number of pyramid levels
        levels: usize,
        /// Reduction applied per cell
        base: PoolBase,
    },
    /// `parts` equal cells reduced with `base` and concatenated
    Concat {
        /// Number of cells
        parts: usize,
        /// Reduction applied per cell
        base: PoolBase,
    },
}

impl PoolingStrategy {
    /// Dimension of the pooled descriptor for `feature_dim`-dimensional
    /// snippets
    pub fn output_dim(&self, feature_dim: usize) -> usize {
        match self {
            PoolingStrategy::Mean | PoolingStrategy::Max => feature_dim,
            PoolingStrategy::Pyramid { levels, .. } => ((1usize << levels) - 1) * feature_dim,
            PoolingStrategy::Concat { parts, .. } => parts * feature_dim,
        }
    }

    /// Pool a `(snippets, feature_dim)` block into one flat descriptor
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` when the block is empty or holds fewer
    /// snippets than the structured variants need cells.
    pub fn pool(&self, rows: ArrayView2<f32>) -> Result<Array1<f32>, ProposalError> {
        match self {
            PoolingStrategy::Mean => PoolBase::Mean.reduce(rows),
            PoolingStrategy::Max => PoolBase::Max.reduce(rows),
            PoolingStrategy::Pyramid { levels, base } => {
                let mut parts = Vec::new();
                for level in 0..*levels {
                    pool_cells(rows, 1 << level, *base, &mut parts)?;
                }
                Ok(Array1::from(parts))
            }
            PoolingStrategy::Concat { parts: k, base } => {
                let mut parts = Vec::new();
                pool_cells(rows, *k, *base, &mut parts)?;
                Ok(Array1::from(parts))
            }
        }
    }
}

/// Split `rows` into `cells` contiguous cells, reduce each, and append the
/// results to `out`
fn pool_cells(
    rows: ArrayView2<f32>,
    cells: usize,
    base: PoolBase,
    out: &mut Vec<f32>,
) -> Result<(), ProposalError> {
    let n = rows.nrows();
    if n < cells {
        return Err(ProposalError::FeatureError(format!(
            "window covers {} snippets but pooling needs {} cells",
            n, cells
        )));
    }
    for cell in 0..cells {
        let lo = cell * n / cells;
        let hi = (cell + 1) * n / cells;
        let reduced = base.reduce(rows.slice(s![lo..hi, ..]))?;
        out.extend(reduced.iter());
    }
    Ok(())
}

impl FromStr for PoolingStrategy {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => return Ok(PoolingStrategy::Mean),
            "max" => return Ok(PoolingStrategy::Max),
            _ => {}
        }

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(ProposalError::ConfigError(format!(
                "unrecognized pooling strategy '{}'",
                s
            )));
        }
        let count: usize = parts[1].parse().map_err(|_| {
            ProposalError::ConfigError(format!("bad cell count in pooling strategy '{}'", s))
        })?;
        if count == 0 {
            return Err(ProposalError::ConfigError(format!(
                "pooling strategy '{}' needs at least one cell",
                s
            )));
        }
        let base = match parts[2] {
            "mean" => PoolBase::Mean,
            "max" => PoolBase::Max,
            _ => {
                return Err(ProposalError::ConfigError(format!(
                    "unrecognized pooling base in '{}'",
                    s
                )))
            }
        };
        match parts[0] {
            "pyr" => Ok(PoolingStrategy::Pyramid {
                levels: count,
                base,
            }),
            "concat" => Ok(PoolingStrategy::Concat { parts: count, base }),
            _ => Err(ProposalError::ConfigError(format!(
                "unrecognized pooling strategy '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingStrategy::Mean => write!(f, "mean"),
            PoolingStrategy::Max => write!(f, "max"),
            PoolingStrategy::Pyramid { levels, base } => write!(f, "pyr-{}-{}", levels, base),
            PoolingStrategy::Concat { parts, base } => write!(f, "concat-{}-{}", parts, base),
        }
    }
}
