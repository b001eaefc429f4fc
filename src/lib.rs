//! Host-side bridge between OFX image-effect clips and a node compositor's pixel pipeline.
//!
//! A plugin instance asks one of its clips for an image; the [`ClipBridge`] decides what that
//! means:
//!
//! - the output clip hands out its cached, writable buffer (reallocated when the requested
//!   bounds change)
//! - an input clip fed by another plugin renders that plugin and shares its output read-only
//! - an input clip fed by the native pipeline pulls planar scanlines through a
//!   [`RowPlaneSource`] and packs them into a fresh float image
//!
//! Images are handed out as counted [`ImageRef`] handles. [`ImageWriter`] turns a fetched float
//! image into an 8-bit PNG through an explicit [`ColorLut`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Clip bridges, their configuration and input mapping.
pub mod clip;
/// Float image export.
pub mod export;
/// Collaborator traits and in-memory implementations.
pub mod host;
/// Pixel buffers, image handles and scanline conversion.
pub mod image;

pub use crate::foundation::core::{
    Channel, ChannelMask, FrameSpan, INFINITE_MAX, INFINITE_MIN, Point, RectD, RectI, RenderScale,
    Size, Vec2,
};
pub use crate::foundation::error::{BridgeError, BridgeResult};

pub use crate::clip::bridge::{
    ClipBridge, ClipDescriptor, ClipId, ClipRole, ClipStats, OUTPUT_CLIP_NAME, PREMULTIPLICATION,
    SOURCE_CLIP_NAME, UNMAPPED_BIT_DEPTH, UNMAPPED_COMPONENTS,
};
pub use crate::clip::input_map::InputMap;
pub use crate::clip::opts::{BridgeOpts, InputOrdering};
pub use crate::export::lut::{ColorLut, Transfer};
pub use crate::export::writer::{ExportOpts, ImageWriter};
pub use crate::host::synthetic::{
    EffectOp, MemoryRow, MemoryRowSource, Pattern, ProjectSettings, SyntheticEffect, SyntheticNode,
};
pub use crate::host::traits::{
    EffectContext, FieldOrder, HostNode, ImageEffect, PlanarRow, Producer, RenderStatus,
    RowPlaneSource,
};
pub use crate::image::buffer::{BitDepth, PACKED_CHANNELS, PixelBuffer};
pub use crate::image::convert::{ChannelPlanes, PACKED_ORDER, pack_planes};
pub use crate::image::handle::{ImageAccess, ImageId, ImageRef, WeakImage};
