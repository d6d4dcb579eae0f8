//! Weighted binary cross-entropy
//!
//! Training loss for the confidence head. Predictions and `1 - predictions`
//! are clamped below at [`EPSILON`] before the logarithm, so predictions
//! saturated exactly at 0 or 1 produce large finite penalties instead of
//! infinities.

use ndarray::{Array2, ArrayView2, Zip};

use crate::error::ProposalError;

/// Lower clamp applied inside the logarithms
pub const EPSILON: f32 = 1e-7;

/// Element-wise weighted binary cross-entropy
///
/// Computes `-(w1 * t * ln(p) + w0 * (1 - t) * ln(1 - p))` per element, with
/// both logarithm arguments clamped below at [`EPSILON`]. The result is not
/// reduced; the caller chooses the aggregation.
///
/// With `w0 = w1 = 1` this is the standard binary cross-entropy.
///
/// # Arguments
///
/// * `predictions` - Values in `(0, 1)`, such as sigmoid outputs
/// * `targets` - Values in `{0, 1}`
/// * `w0` - Weight for the negative class
/// * `w1` - Weight for the positive class
///
/// # Errors
///
/// Returns `InvalidInput` when predictions and targets differ in shape.
pub fn weighted_binary_crossentropy(
    predictions: ArrayView2<f32>,
    targets: ArrayView2<f32>,
    w0: f32,
    w1: f32,
) -> Result<Array2<f32>, ProposalError> {
    if predictions.dim() != targets.dim() {
        return Err(ProposalError::InvalidInput(format!(
            "predictions shape {:?} does not match targets shape {:?}",
            predictions.dim(),
            targets.dim()
        )));
    }

    let mut out = Array2::zeros(predictions.raw_dim());
    Zip::from(&mut out)
        .and(&predictions)
        .and(&targets)
        .for_each(|o, &p, &t| {
            let pos_log = p.max(EPSILON).ln();
            let neg_log = (1.0 - p).max(EPSILON).ln();
            *o = -(w1 * t * pos_log + w0 * (1.0 - t) * neg_log);
        });
    Ok(out)
}
