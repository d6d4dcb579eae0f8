//! Segment coordinate conversions
//!
//! Segments move between three conventions, always as `(n, 2)` arrays:
//! boundary `[start, end]` (the canonical output form), corner
//! `[start, length]`, and center `[center, length]`.

use ndarray::Array2;

use crate::error::ProposalError;

fn check_pairs(x: &Array2<f32>, what: &str) -> Result<(), ProposalError> {
    if x.ncols() != 2 {
        return Err(ProposalError::InvalidInput(format!(
            "{} expects (n, 2) segments, got {} columns",
            what,
            x.ncols()
        )));
    }
    Ok(())
}

/// Convert corner segments `[start, length]` to boundaries `[start, end]`
pub fn corner_to_boundary(x: &Array2<f32>) -> Result<Array2<f32>, ProposalError> {
    check_pairs(x, "corner_to_boundary")?;
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        row[1] += row[0];
    }
    Ok(out)
}

/// Convert boundary segments `[start, end]` to corners `[start, length]`
pub fn boundary_to_corner(x: &Array2<f32>) -> Result<Array2<f32>, ProposalError> {
    check_pairs(x, "boundary_to_corner")?;
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        row[1] -= row[0];
    }
    Ok(out)
}

/// Convert center segments `[center, length]` to boundaries `[start, end]`
pub fn center_to_boundary(x: &Array2<f32>) -> Result<Array2<f32>, ProposalError> {
    check_pairs(x, "center_to_boundary")?;
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        let (center, length) = (row[0], row[1]);
        row[0] = center - length / 2.0;
        row[1] = center + length / 2.0;
    }
    Ok(out)
}

/// Convert boundary segments `[start, end]` to centers `[center, length]`
pub fn boundary_to_center(x: &Array2<f32>) -> Result<Array2<f32>, ProposalError> {
    check_pairs(x, "boundary_to_center")?;
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        let (start, end) = (row[0], row[1]);
        row[0] = (start + end) / 2.0;
        row[1] = end - start;
    }
    Ok(out)
}
