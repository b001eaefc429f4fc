//! Float image export: colour transfer tables and an 8-bit PNG writer.

/// Transfer functions and their byte lookup tables.
pub mod lut;
/// Float image to 8-bit RGBA / PNG conversion.
pub mod writer;
