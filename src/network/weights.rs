//! Positional weight loading from npz archives
//!
//! A weight archive is a zip of numeric arrays under the enumerated keys
//! `arr_0 .. arr_{n-1}` (the numpy `savez` positional convention). Arrays map
//! onto the network's parameters in enumeration order — see
//! [`ProposalNetwork::parameter_shapes`](crate::ProposalNetwork::parameter_shapes)
//! for the order contract. An archive whose count or shapes disagree with the
//! network is an incompatible model/weight pairing and is rejected outright.

use std::fs::File;
use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::NpzReader;

use crate::error::ProposalError;
use crate::network::ProposalNetwork;

/// Restore network parameters from an npz weight archive
///
/// # Arguments
///
/// * `path` - Path to the archive
/// * `network` - Network to update in place
///
/// # Errors
///
/// Returns `WeightError` when the archive cannot be read, an enumerated key
/// is missing, or the array count/shapes do not match the network. The
/// network is left untouched on any error.
pub fn load_weights<P: AsRef<Path>>(
    path: P,
    network: &mut ProposalNetwork,
) -> Result<(), ProposalError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ProposalError::WeightError(format!("cannot open weight archive '{}': {}", path.display(), e))
    })?;
    let mut npz = NpzReader::new(file).map_err(|e| {
        ProposalError::WeightError(format!("cannot read weight archive '{}': {}", path.display(), e))
    })?;
    let names = npz.names().map_err(|e| {
        ProposalError::WeightError(format!("cannot list weight archive '{}': {}", path.display(), e))
    })?;

    let mut params: Vec<ArrayD<f32>> = Vec::with_capacity(names.len());
    for index in 0..names.len() {
        let entry = resolve_entry(&names, index).ok_or_else(|| {
            ProposalError::WeightError(format!(
                "weight archive '{}' has no entry 'arr_{}'",
                path.display(),
                index
            ))
        })?;
        let array = npz.by_name(&entry).map_err(|e| {
            ProposalError::WeightError(format!("cannot read entry '{}': {}", entry, e))
        })?;
        params.push(array);
    }

    log::debug!(
        "Loaded {} parameter arrays from {}",
        params.len(),
        path.display()
    );
    network.set_parameters(params)
}

/// Find the archive entry for positional index `index`, tolerating writers
/// that do or do not append the `.npy` suffix to member names
fn resolve_entry(names: &[String], index: usize) -> Option<String> {
    let bare = format!("arr_{}", index);
    let suffixed = format!("{}.npy", bare);
    names
        .iter()
        .find(|name| **name == bare || **name == suffixed)
        .cloned()
}
