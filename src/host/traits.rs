use crate::clip::bridge::ClipBridge;
use crate::foundation::core::{
    Channel, ChannelMask, FrameSpan, Point, RectD, RectI, RenderScale, Size,
};
use std::sync::Arc;

/// OFX status codes returned by plugin actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderStatus {
    /// `kOfxStatOK`.
    Ok,
    /// `kOfxStatFailed`.
    Failed,
    /// `kOfxStatErrFatal`.
    ErrFatal,
    /// `kOfxStatErrUnknown`.
    ErrUnknown,
    /// `kOfxStatErrMissingHostFeature`.
    ErrMissingHostFeature,
    /// `kOfxStatErrUnsupported`.
    ErrUnsupported,
    /// `kOfxStatErrFormat`.
    ErrFormat,
    /// `kOfxStatErrMemory`.
    ErrMemory,
    /// `kOfxStatErrBadHandle`.
    ErrBadHandle,
    /// `kOfxStatErrValue`.
    ErrValue,
}

impl RenderStatus {
    /// Numeric OFX status code.
    pub fn code(self) -> i32 {
        match self {
            RenderStatus::Ok => 0,
            RenderStatus::Failed => 1,
            RenderStatus::ErrFatal => 2,
            RenderStatus::ErrUnknown => 3,
            RenderStatus::ErrMissingHostFeature => 4,
            RenderStatus::ErrUnsupported => 5,
            RenderStatus::ErrFormat => 7,
            RenderStatus::ErrMemory => 8,
            RenderStatus::ErrBadHandle => 9,
            RenderStatus::ErrValue => 11,
        }
    }

    /// Return `true` only for [`RenderStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == RenderStatus::Ok
    }
}

/// OFX image effect context an instance was created in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EffectContext {
    /// `kOfxImageEffectContextGenerator`: no source clip.
    Generator,
    /// `kOfxImageEffectContextFilter`.
    Filter,
    /// `kOfxImageEffectContextGeneral`.
    General,
}

/// Spatial field order of clip material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FieldOrder {
    /// `kOfxImageFieldNone`: unfielded.
    #[default]
    None,
    /// `kOfxImageFieldLower`: rows 0, 2, 4... first.
    Lower,
    /// `kOfxImageFieldUpper`: rows 1, 3, 5... first.
    Upper,
}

impl FieldOrder {
    /// OFX property string.
    pub fn as_ofx_str(self) -> &'static str {
        match self {
            FieldOrder::None => "OfxFieldNone",
            FieldOrder::Lower => "OfxFieldLower",
            FieldOrder::Upper => "OfxFieldUpper",
        }
    }
}

/// The OFX effect instance that owns a set of clips.
pub trait ImageEffect: Send + Sync {
    /// Context the instance was created in.
    fn context(&self) -> EffectContext;
    /// Project frame rate.
    fn frame_rate(&self) -> f64;
    /// Project size in canonical coordinates.
    fn project_extent(&self) -> Size;
    /// Project origin in canonical coordinates.
    fn project_offset(&self) -> Point;
    /// Project pixel aspect ratio.
    fn project_pixel_aspect_ratio(&self) -> f64;
    /// Field order of the output.
    fn default_output_fielding(&self) -> FieldOrder {
        FieldOrder::None
    }
    /// Render `window` of the output at `time`. Blocks until the render completes or fails.
    fn render_action(
        &self,
        time: f64,
        field: FieldOrder,
        window: RectI,
        scale: RenderScale,
    ) -> RenderStatus;
    /// Clip bridge by OFX clip name.
    fn clip(&self, name: &str) -> Option<Arc<ClipBridge>>;

    /// Project rect (offset + extent) in canonical coordinates.
    fn project_rect(&self) -> RectD {
        RectD::from_origin_size(self.project_offset(), self.project_extent())
    }
}

/// How a node produces its image, resolved once when the node is built.
#[derive(Clone)]
pub enum Producer {
    /// The node hosts an OFX effect; its image comes from that effect's output clip.
    OpenFx(Arc<dyn ImageEffect>),
    /// The node renders through the native row pipeline.
    Native,
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Producer::OpenFx(_) => f.write_str("OpenFx"),
            Producer::Native => f.write_str("Native"),
        }
    }
}

/// A compositor graph node as seen by clip bridges.
pub trait HostNode: Send + Sync {
    /// Node label, used in diagnostics.
    fn name(&self) -> &str;
    /// Return `true` for terminal output (viewer/writer) nodes.
    fn is_output_node(&self) -> bool;
    /// Return `true` for source nodes without inputs.
    fn is_input_node(&self) -> bool;
    /// Return `true` when something downstream consumes this node.
    fn has_output_connected(&self) -> bool;
    /// Region the node has pixels for, in canonical coordinates.
    fn data_window(&self) -> RectD;
    /// Frames the node has images for.
    fn frame_range(&self) -> FrameSpan;
    /// Upstream node connected at positional `index`.
    fn input(&self, index: usize) -> Option<Arc<dyn HostNode>>;
    /// Names of the input clips in declaration order (output clip excluded).
    fn input_clip_names(&self) -> Vec<String>;
    /// Producer capability of this node.
    fn producer(&self) -> Producer;
    /// Open a row source over `window` for the channels in `channels`.
    fn open_rows(&self, window: RectI, channels: ChannelMask) -> Box<dyn RowPlaneSource>;
}

/// One scanline of the native pipeline, with one optional plane per channel.
pub trait PlanarRow {
    /// First valid x (inclusive).
    fn offset(&self) -> i32;
    /// Last valid x (exclusive).
    fn right(&self) -> i32;
    /// Samples for `[offset, right)`, `None` while the channel is not computed.
    fn plane(&self, channel: Channel) -> Option<&[f32]>;
    /// Compute `channel` so that [`PlanarRow::plane`] returns it.
    fn compute_channel(&mut self, channel: Channel);
}

/// Scanline handle over a rectangle of native row storage.
pub trait RowPlaneSource: Send {
    /// Register interest in the rows; `lock_all_rows` keeps every row resident until erased.
    fn claim_interest(&mut self, lock_all_rows: bool);
    /// Row `y`, `None` when the pipeline has no data for it.
    fn at(&mut self, y: i32) -> Option<&mut dyn PlanarRow>;
    /// Release row `y`.
    fn erase(&mut self, y: i32);
}
