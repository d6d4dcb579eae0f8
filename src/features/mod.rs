//! Feature access modules
//!
//! Reading pooled per-window descriptors from a feature store:
//! - Pooling strategies (mean/max/pyramid/concat)
//! - The npz-backed feature store

pub mod pooling;
pub mod store;
