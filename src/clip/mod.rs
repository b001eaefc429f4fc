//! Clip bridges: how an OFX clip turns image requests into pixel buffers.

/// The clip bridge and its descriptors.
pub mod bridge;
pub(crate) mod upstream;
/// Input clip to node input mapping.
pub mod input_map;
/// Bridge configuration.
pub mod opts;
