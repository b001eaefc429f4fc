//! Packed RGBA images and the conversions that fill them.

/// Pixel buffers and bit depths.
pub mod buffer;
/// Planar-to-packed scanline conversion.
pub mod convert;
/// Shared, reference-counted image handles.
pub mod handle;
