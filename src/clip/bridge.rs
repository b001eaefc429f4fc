use crate::clip::input_map::InputMap;
use crate::clip::opts::BridgeOpts;
use crate::clip::upstream::UpstreamWalk;
use crate::foundation::core::{Channel, ChannelMask, FrameSpan, RectD, RectI, RenderScale};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::host::traits::{
    EffectContext, FieldOrder, HostNode, ImageEffect, PlanarRow, Producer, RowPlaneSource,
};
use crate::image::buffer::{BitDepth, PACKED_CHANNELS, PixelBuffer};
use crate::image::convert::{ChannelPlanes, PACKED_ORDER, pack_planes};
use crate::image::handle::{ImageAccess, ImageRef, ImageSlot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// `kOfxImageEffectOutputClipName`.
pub const OUTPUT_CLIP_NAME: &str = "Output";
/// `kOfxImageEffectSimpleSourceClipName`.
pub const SOURCE_CLIP_NAME: &str = "Source";

/// Depth reported to plugins regardless of the node's native format.
pub const UNMAPPED_BIT_DEPTH: BitDepth = BitDepth::Float;
/// `kOfxImageComponentRGBA`.
pub const UNMAPPED_COMPONENTS: &str = "OfxImageComponentRGBA";
/// `kOfxImageUnPreMultiplied`.
pub const PREMULTIPLICATION: &str = "OfxImageUnPreMultiplied";

static NEXT_CLIP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a clip bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClipId(pub u64);

/// Whether a clip is the effect's output or one of its inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClipRole {
    /// The effect's output clip; images are cached and writable.
    Output,
    /// An input clip; images come from the upstream node.
    Input,
}

/// Static description of a clip, as declared by the plugin.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClipDescriptor {
    /// OFX clip name.
    pub name: String,
    /// Output or input.
    pub role: ClipRole,
    /// Optional clips may stay unconnected.
    pub optional: bool,
}

impl ClipDescriptor {
    /// The standard output clip.
    pub fn output() -> Self {
        Self {
            name: OUTPUT_CLIP_NAME.to_string(),
            role: ClipRole::Output,
            optional: false,
        }
    }

    /// A mandatory input clip.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ClipRole::Input,
            optional: false,
        }
    }

    /// An optional input clip.
    pub fn optional_input(name: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::input(name)
        }
    }
}

/// Counters describing what a bridge has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Output buffers allocated.
    pub allocations: u64,
    /// Cached output buffers dropped because a request had different bounds.
    pub evictions: u64,
    /// Output requests served from the cache.
    pub cache_hits: u64,
    /// Upstream plugin renders triggered.
    pub upstream_renders: u64,
    /// Scanlines the native pipeline had no data for, or handed out without every channel.
    pub rows_skipped: u64,
}

#[derive(Default)]
struct StatCounters {
    allocations: AtomicU64,
    evictions: AtomicU64,
    cache_hits: AtomicU64,
    upstream_renders: AtomicU64,
    rows_skipped: AtomicU64,
}

impl StatCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ClipStats {
        ClipStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            upstream_renders: self.upstream_renders.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Host side of one OFX clip of one effect instance.
///
/// Resolves what an image request means for this clip: the cached output buffer, another plugin's
/// output (rendered on demand), or scanlines pulled from the native pipeline and packed into a
/// fresh float image.
pub struct ClipBridge {
    id: ClipId,
    desc: ClipDescriptor,
    effect: Weak<dyn ImageEffect>,
    node: Weak<dyn HostNode>,
    inputs: InputMap,
    opts: BridgeOpts,
    cache: Mutex<Option<ImageSlot>>,
    stats: StatCounters,
}

impl ClipBridge {
    /// Create the bridge for clip `desc` of `effect`, hosted by `node`.
    ///
    /// Neither the effect nor the node is kept alive by the bridge.
    pub fn new(
        desc: ClipDescriptor,
        effect: Weak<dyn ImageEffect>,
        node: &Arc<dyn HostNode>,
        opts: BridgeOpts,
    ) -> BridgeResult<Self> {
        opts.validate()?;
        let inputs = InputMap::new(node.input_clip_names(), opts.input_ordering)?;
        if desc.role == ClipRole::Input && inputs.input_index(&desc.name).is_none() {
            return Err(BridgeError::validation(format!(
                "input clip '{}' is not declared by node '{}'",
                desc.name,
                node.name()
            )));
        }
        Ok(Self {
            id: ClipId(NEXT_CLIP_ID.fetch_add(1, Ordering::Relaxed)),
            desc,
            effect,
            node: Arc::downgrade(node),
            inputs,
            opts,
            cache: Mutex::new(None),
            stats: StatCounters::default(),
        })
    }

    /// Identity of this bridge.
    pub fn id(&self) -> ClipId {
        self.id
    }

    /// OFX clip name.
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Clip declaration.
    pub fn descriptor(&self) -> &ClipDescriptor {
        &self.desc
    }

    /// Return `true` for the output clip.
    pub fn is_output(&self) -> bool {
        self.desc.role == ClipRole::Output
    }

    /// Snapshot of the bridge counters.
    pub fn stats(&self) -> ClipStats {
        self.stats.snapshot()
    }

    fn effect(&self) -> BridgeResult<Arc<dyn ImageEffect>> {
        self.effect
            .upgrade()
            .ok_or_else(|| BridgeError::Detached(self.desc.name.clone()))
    }

    fn node(&self) -> BridgeResult<Arc<dyn HostNode>> {
        self.node
            .upgrade()
            .ok_or_else(|| BridgeError::Detached(self.desc.name.clone()))
    }

    /// Node this clip draws its image from: the hosting node for the output clip, the mapped
    /// upstream node for an input clip.
    pub fn associated_node(&self) -> BridgeResult<Option<Arc<dyn HostNode>>> {
        let node = self.node()?;
        if self.is_output() {
            return Ok(Some(node));
        }
        Ok(self
            .inputs
            .input_index(&self.desc.name)
            .and_then(|i| node.input(i)))
    }

    /// Fetch the image of this clip at `time` over `region` (the project rect when `None`).
    ///
    /// The returned handle counts as one reference on the image; drop or release it when done.
    #[tracing::instrument(level = "debug", skip(self), fields(clip = %self.desc.name))]
    pub fn get_image(&self, time: f64, region: Option<RectD>) -> BridgeResult<ImageRef> {
        let request = match region {
            Some(r) => r,
            None => self.effect()?.project_rect(),
        };
        if !request.is_finite()
            || request.is_infinite()
            || request.x2 < request.x1
            || request.y2 < request.y1
        {
            return Err(BridgeError::validation(format!(
                "clip '{}': image request rect must be finite and not inverted: {request:?}",
                self.desc.name
            )));
        }

        if self.desc.optional && !self.connected()? {
            tracing::debug!("optional clip is unconnected, returning placeholder");
            let placeholder =
                PixelBuffer::placeholder(BitDepth::Float, request.to_pixel_enclosing_unit());
            return Ok(ImageRef::detached(placeholder, ImageAccess::ReadOnly));
        }

        match self.desc.role {
            ClipRole::Output => self.output_image(request),
            ClipRole::Input => self.input_image(time, request),
        }
    }

    fn output_image(&self, request: RectD) -> BridgeResult<ImageRef> {
        let window = request.to_pixel_enclosing_unit();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(slot) = cache.as_ref().filter(|slot| slot.bounds() == window) {
            StatCounters::bump(&self.stats.cache_hits);
            return Ok(slot.acquire(ImageAccess::ReadWrite));
        }

        let buffer = PixelBuffer::try_new(BitDepth::Float, request)?;
        if let Some(old) = cache.take() {
            tracing::debug!(image = old.id().0, ?window, "evicting cached output image");
            StatCounters::bump(&self.stats.evictions);
            drop(old);
        }
        StatCounters::bump(&self.stats.allocations);
        let slot = cache.insert(ImageSlot::new(buffer));
        tracing::debug!(image = slot.id().0, ?window, "allocated output image");
        Ok(slot.acquire(ImageAccess::ReadWrite))
    }

    fn input_image(&self, time: f64, request: RectD) -> BridgeResult<ImageRef> {
        let upstream = self
            .associated_node()?
            .ok_or_else(|| BridgeError::unconnected(self.desc.name.clone()))?;

        match upstream.producer() {
            Producer::OpenFx(effect) => {
                self.fetch_from_plugin(time, request, &upstream, effect.as_ref())
            }
            Producer::Native => self.fetch_from_rows(upstream.as_ref(), request),
        }
    }

    fn fetch_from_plugin(
        &self,
        time: f64,
        request: RectD,
        upstream: &Arc<dyn HostNode>,
        effect: &dyn ImageEffect,
    ) -> BridgeResult<ImageRef> {
        let output = effect.clip(OUTPUT_CLIP_NAME).ok_or_else(|| {
            BridgeError::unconnected(format!("{}.{OUTPUT_CLIP_NAME}", upstream.name()))
        })?;
        let depth = UpstreamWalk::new(self.opts.max_upstream_depth).plugin_depth(upstream)?;

        let window = request.to_pixel_enclosing_unit();
        StatCounters::bump(&self.stats.upstream_renders);
        tracing::debug!(
            upstream = upstream.name(),
            ?window,
            depth,
            "rendering upstream plugin"
        );
        let status = effect.render_action(time, FieldOrder::None, window, RenderScale::UNIT);
        if !status.is_ok() {
            return Err(BridgeError::RenderFailed {
                clip: self.desc.name.clone(),
                status,
            });
        }

        Ok(output.get_image(time, Some(request))?.into_read_only())
    }

    fn fetch_from_rows(&self, upstream: &dyn HostNode, request: RectD) -> BridgeResult<ImageRef> {
        let window = request.to_pixel_enclosing_unit();
        let mut buffer = PixelBuffer::try_new(BitDepth::Float, request)?;
        let mut source: Box<dyn RowPlaneSource> = upstream.open_rows(window, ChannelMask::RGBA);
        source.claim_interest(true);

        for y in window.y1..window.y2 {
            let Some(dst) = buffer.row_f_mut(y) else {
                continue;
            };
            let Some(row) = source.at(y) else {
                StatCounters::bump(&self.stats.rows_skipped);
                tracing::warn!(
                    clip = %self.desc.name,
                    upstream = upstream.name(),
                    y,
                    "native source has no row, skipping"
                );
                continue;
            };
            if let Err(channel) = pack_row(row, window, dst) {
                StatCounters::bump(&self.stats.rows_skipped);
                tracing::warn!(
                    clip = %self.desc.name,
                    upstream = upstream.name(),
                    y,
                    ?channel,
                    "row channel still missing after compute, skipping"
                );
            }
            source.erase(y);
        }

        Ok(ImageRef::detached(buffer, ImageAccess::ReadWrite))
    }

    /// Canonical region this clip has pixels for at `time`.
    pub fn region_of_definition(&self, _time: f64) -> BridgeResult<RectD> {
        let node = self.node()?;
        if !node.is_input_node() || self.desc.name == OUTPUT_CLIP_NAME {
            return Ok(node.data_window());
        }
        Ok(self.effect()?.project_rect())
    }

    /// Bounds of the cached output image, if any.
    pub fn cached_bounds(&self) -> Option<RectI> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ImageSlot::bounds)
    }

    /// Drop the cached output image. Outstanding handles keep their pixels alive.
    pub fn clear_cache(&self) {
        let old = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if old.is_some() {
            StatCounters::bump(&self.stats.evictions);
        }
    }

    /// Raw component depth reported to plugins.
    pub fn unmapped_bit_depth(&self) -> &'static str {
        UNMAPPED_BIT_DEPTH.as_ofx_str()
    }

    /// Raw component layout reported to plugins.
    pub fn unmapped_components(&self) -> &'static str {
        UNMAPPED_COMPONENTS
    }

    /// Premultiplication state of fetched images.
    pub fn premultiplication(&self) -> &'static str {
        PREMULTIPLICATION
    }

    /// Pixel aspect ratio of the project.
    pub fn aspect_ratio(&self) -> BridgeResult<f64> {
        Ok(self.effect()?.project_pixel_aspect_ratio())
    }

    /// Frame rate of the project.
    pub fn frame_rate(&self) -> BridgeResult<f64> {
        Ok(self.effect()?.frame_rate())
    }

    /// Frames this clip has images for; generators report `0..=0`.
    pub fn frame_range(&self) -> BridgeResult<FrameSpan> {
        if self.effect()?.context() == EffectContext::Generator {
            return Ok(FrameSpan::new(0.0, 0.0));
        }
        Ok(self.node()?.frame_range())
    }

    /// Field order of the effect's output.
    pub fn field_order(&self) -> BridgeResult<FieldOrder> {
        Ok(self.effect()?.default_output_fielding())
    }

    /// Whether the clip is connected: the output clip of an output node always is, other output
    /// clips when something consumes the node, input clips when their upstream node exists.
    pub fn connected(&self) -> BridgeResult<bool> {
        if self.is_output() {
            let node = self.node()?;
            return Ok(node.is_output_node() || node.has_output_connected());
        }
        Ok(self.associated_node()?.is_some())
    }

    /// Frame rate before any retiming by the plugin.
    pub fn unmapped_frame_rate(&self) -> f64 {
        25.0
    }

    /// Frame range before any retiming by the plugin.
    pub fn unmapped_frame_range(&self) -> FrameSpan {
        FrameSpan::new(1.0, 1.0)
    }

    /// Images exist only at discrete frames.
    pub fn continuous_samples(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for ClipBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipBridge")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .field("cached_bounds", &self.cached_bounds())
            .finish()
    }
}

/// Pack the part of `row` that overlaps `window` into the packed scanline `dst`.
///
/// Channels the row has not computed yet are computed first. Fails with the first channel the row
/// still lacks afterwards, leaving `dst` untouched.
fn pack_row(row: &mut dyn PlanarRow, window: RectI, dst: &mut [f32]) -> Result<(), Channel> {
    for channel in PACKED_ORDER {
        if row.plane(channel).is_none() {
            row.compute_channel(channel);
        }
    }

    let offset = row.offset();
    let x_start = offset.max(window.x1);
    let x_end = row.right().min(window.x2);
    let planes = ChannelPlanes::from_row(&*row)?;
    if x_end <= x_start {
        return Ok(());
    }

    let src_start = (x_start - offset) as usize;
    let count = ((x_end - x_start) as usize).min(planes.len().saturating_sub(src_start));
    let dst_start = (x_start - window.x1) as usize * PACKED_CHANNELS;
    pack_planes(
        &planes.slice(src_start, count),
        count,
        &mut dst[dst_start..],
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/clip/bridge.rs"]
mod tests;
