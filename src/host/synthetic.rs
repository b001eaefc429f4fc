use crate::clip::bridge::{
    ClipBridge, ClipDescriptor, OUTPUT_CLIP_NAME, SOURCE_CLIP_NAME,
};
use crate::clip::opts::BridgeOpts;
use crate::foundation::core::{
    Channel, ChannelMask, FrameSpan, Point, RectD, RectI, RenderScale, Size,
};
use crate::foundation::error::BridgeResult;
use crate::host::traits::{
    EffectContext, FieldOrder, HostNode, ImageEffect, PlanarRow, Producer, RenderStatus,
    RowPlaneSource,
};
use crate::image::buffer::PACKED_CHANNELS;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Pixel content generated by a native [`SyntheticNode`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// The same RGBA value everywhere.
    Constant([f32; 4]),
    /// Red ramps with x over the data window, green with y, blue 0.5, alpha 1.
    Gradient,
}

impl Pattern {
    fn sample(self, channel: Channel, x: i32, y: i32, window: RectD) -> f32 {
        match self {
            Pattern::Constant(rgba) => match channel {
                Channel::Red => rgba[0],
                Channel::Green => rgba[1],
                Channel::Blue => rgba[2],
                Channel::Alpha => rgba[3],
                Channel::Depth => 0.0,
            },
            Pattern::Gradient => {
                let w = window.width().max(1.0);
                let h = window.height().max(1.0);
                match channel {
                    Channel::Red => ((f64::from(x) + 0.5 - window.x1) / w) as f32,
                    Channel::Green => ((f64::from(y) + 0.5 - window.y1) / h) as f32,
                    Channel::Blue => 0.5,
                    Channel::Alpha => 1.0,
                    Channel::Depth => 0.0,
                }
            }
        }
    }
}

/// Compositor node kept entirely in memory.
///
/// Native nodes serve rows generated from a [`Pattern`]; nodes hosting an effect report
/// [`Producer::OpenFx`] once [`SyntheticNode::host_effect`] has been called.
pub struct SyntheticNode {
    name: String,
    data_window: RectD,
    frames: FrameSpan,
    is_output: bool,
    pattern: Pattern,
    input_clips: Vec<String>,
    missing_rows: BTreeSet<i32>,
    lazy_channels: ChannelMask,
    inputs: Mutex<Vec<Option<Arc<dyn HostNode>>>>,
    output_connected: AtomicBool,
    producer: OnceLock<Producer>,
    rows_served: Arc<AtomicUsize>,
    rows_erased: Arc<AtomicUsize>,
}

impl SyntheticNode {
    /// Native source node producing `pattern` over `data_window`.
    pub fn source(name: impl Into<String>, data_window: RectD, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            data_window,
            frames: FrameSpan::new(1.0, 1.0),
            is_output: false,
            pattern,
            input_clips: Vec::new(),
            missing_rows: BTreeSet::new(),
            lazy_channels: ChannelMask::NONE,
            inputs: Mutex::new(Vec::new()),
            output_connected: AtomicBool::new(false),
            producer: OnceLock::new(),
            rows_served: Arc::new(AtomicUsize::new(0)),
            rows_erased: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Node with the given input clips, meant to host an effect.
    pub fn with_inputs(name: impl Into<String>, data_window: RectD, input_clips: &[&str]) -> Self {
        let n = input_clips.len();
        let mut node = Self::source(name, data_window, Pattern::Constant([0.0; 4]));
        node.input_clips = input_clips.iter().map(|s| s.to_string()).collect();
        node.inputs = Mutex::new(vec![None; n]);
        node
    }

    /// Mark the node as a terminal output node.
    pub fn as_output(mut self) -> Self {
        self.is_output = true;
        self
    }

    /// Frames the node reports images for.
    pub fn with_frames(mut self, frames: FrameSpan) -> Self {
        self.frames = frames;
        self
    }

    /// Rows the native source will report as unavailable.
    pub fn with_missing_rows(mut self, rows: impl IntoIterator<Item = i32>) -> Self {
        self.missing_rows = rows.into_iter().collect();
        self
    }

    /// Channels whose planes are absent until computed.
    pub fn with_lazy_channels(mut self, channels: ChannelMask) -> Self {
        self.lazy_channels = channels;
        self
    }

    /// Connect `upstream` at positional input `index`.
    pub fn connect_input(&self, index: usize, upstream: Arc<SyntheticNode>) {
        upstream.output_connected.store(true, Ordering::Release);
        let mut inputs = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        if inputs.len() <= index {
            inputs.resize(index + 1, None);
        }
        inputs[index] = Some(upstream as Arc<dyn HostNode>);
    }

    /// Disconnect positional input `index`.
    pub fn disconnect_input(&self, index: usize) {
        let mut inputs = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = inputs.get_mut(index) {
            *slot = None;
        }
    }

    /// Make this node host `effect`. The producer is fixed after the first call.
    pub fn host_effect(&self, effect: Arc<dyn ImageEffect>) -> bool {
        self.producer.set(Producer::OpenFx(effect)).is_ok()
    }

    /// Rows handed out by row sources opened on this node.
    pub fn rows_served(&self) -> usize {
        self.rows_served.load(Ordering::Acquire)
    }

    /// Rows released back by row sources opened on this node.
    pub fn rows_erased(&self) -> usize {
        self.rows_erased.load(Ordering::Acquire)
    }
}

impl HostNode for SyntheticNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_output_node(&self) -> bool {
        self.is_output
    }

    fn is_input_node(&self) -> bool {
        self.input_clips.is_empty()
    }

    fn has_output_connected(&self) -> bool {
        self.output_connected.load(Ordering::Acquire)
    }

    fn data_window(&self) -> RectD {
        self.data_window
    }

    fn frame_range(&self) -> FrameSpan {
        self.frames
    }

    fn input(&self, index: usize) -> Option<Arc<dyn HostNode>> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
            .flatten()
    }

    fn input_clip_names(&self) -> Vec<String> {
        self.input_clips.clone()
    }

    fn producer(&self) -> Producer {
        self.producer.get().cloned().unwrap_or(Producer::Native)
    }

    fn open_rows(&self, window: RectI, channels: ChannelMask) -> Box<dyn RowPlaneSource> {
        let dw = self.data_window.to_pixel_enclosing_unit();
        Box::new(MemoryRowSource {
            window,
            span: (window.x1.max(dw.x1), window.x2.min(dw.x2)),
            data_window: self.data_window,
            channels,
            pattern: self.pattern,
            missing_rows: self.missing_rows.clone(),
            lazy_channels: self.lazy_channels,
            rows: BTreeMap::new(),
            claimed: false,
            served: Arc::clone(&self.rows_served),
            erased: Arc::clone(&self.rows_erased),
        })
    }
}

/// One generated scanline.
pub struct MemoryRow {
    y: i32,
    offset: i32,
    right: i32,
    data_window: RectD,
    pattern: Pattern,
    planes: BTreeMap<Channel, Vec<f32>>,
}

impl MemoryRow {
    fn generate(&self, channel: Channel) -> Vec<f32> {
        (self.offset..self.right)
            .map(|x| self.pattern.sample(channel, x, self.y, self.data_window))
            .collect()
    }
}

impl PlanarRow for MemoryRow {
    fn offset(&self) -> i32 {
        self.offset
    }

    fn right(&self) -> i32 {
        self.right
    }

    fn plane(&self, channel: Channel) -> Option<&[f32]> {
        self.planes.get(&channel).map(Vec::as_slice)
    }

    fn compute_channel(&mut self, channel: Channel) {
        if !self.planes.contains_key(&channel) {
            let plane = self.generate(channel);
            self.planes.insert(channel, plane);
        }
    }
}

/// Row source over a [`SyntheticNode`]; rows are generated on first access.
pub struct MemoryRowSource {
    window: RectI,
    span: (i32, i32),
    data_window: RectD,
    channels: ChannelMask,
    pattern: Pattern,
    missing_rows: BTreeSet<i32>,
    lazy_channels: ChannelMask,
    rows: BTreeMap<i32, MemoryRow>,
    claimed: bool,
    served: Arc<AtomicUsize>,
    erased: Arc<AtomicUsize>,
}

impl MemoryRowSource {
    /// Return `true` once interest has been claimed.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

impl RowPlaneSource for MemoryRowSource {
    fn claim_interest(&mut self, _lock_all_rows: bool) {
        self.claimed = true;
    }

    fn at(&mut self, y: i32) -> Option<&mut dyn PlanarRow> {
        if y < self.window.y1 || y >= self.window.y2 || self.missing_rows.contains(&y) {
            return None;
        }
        if !self.rows.contains_key(&y) {
            let mut row = MemoryRow {
                y,
                offset: self.span.0,
                right: self.span.1.max(self.span.0),
                data_window: self.data_window,
                pattern: self.pattern,
                planes: BTreeMap::new(),
            };
            for channel in self.channels.iter() {
                if !self.lazy_channels.contains(channel) {
                    row.compute_channel(channel);
                }
            }
            self.rows.insert(y, row);
            self.served.fetch_add(1, Ordering::AcqRel);
        }
        self.rows.get_mut(&y).map(|row| row as &mut dyn PlanarRow)
    }

    fn erase(&mut self, y: i32) {
        if self.rows.remove(&y).is_some() {
            self.erased.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// What a [`SyntheticEffect`] does to its source when rendering.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOp {
    /// Copy the source unchanged.
    Passthrough,
    /// `1 - c` on colour channels, alpha kept.
    Invert,
    /// Multiply colour channels by a factor, alpha kept.
    Gain(f32),
    /// Ignore the source and write a constant.
    Fill([f32; 4]),
}

impl EffectOp {
    fn apply(self, px: [f32; 4]) -> [f32; 4] {
        match self {
            EffectOp::Passthrough => px,
            EffectOp::Invert => [1.0 - px[0], 1.0 - px[1], 1.0 - px[2], px[3]],
            EffectOp::Gain(k) => [px[0] * k, px[1] * k, px[2] * k, px[3]],
            EffectOp::Fill(rgba) => rgba,
        }
    }
}

/// Project settings shared by synthetic effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectSettings {
    /// Project size.
    pub extent: Size,
    /// Project origin.
    pub offset: Point,
    /// Pixel aspect ratio.
    pub pixel_aspect_ratio: f64,
    /// Frames per second.
    pub frame_rate: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            extent: Size::new(1920.0, 1080.0),
            offset: Point::ZERO,
            pixel_aspect_ratio: 1.0,
            frame_rate: 24.0,
        }
    }
}

/// Stand-in for a loaded OFX plugin instance.
///
/// Rendering pulls the `Source` clip (when declared) over the render window and writes the
/// processed pixels into the output clip's cached image.
pub struct SyntheticEffect {
    context: EffectContext,
    project: ProjectSettings,
    op: EffectOp,
    clips: OnceLock<Vec<Arc<ClipBridge>>>,
    fail_with: Mutex<Option<RenderStatus>>,
    renders: AtomicUsize,
}

impl SyntheticEffect {
    /// Build an effect hosted by `node`, with one input clip per node input clip name.
    ///
    /// Nodes without input clips host a generator.
    pub fn attach(
        node: &Arc<SyntheticNode>,
        op: EffectOp,
        project: ProjectSettings,
        opts: BridgeOpts,
    ) -> BridgeResult<Arc<Self>> {
        let context = if node.input_clips.is_empty() {
            EffectContext::Generator
        } else {
            EffectContext::Filter
        };
        let effect = Arc::new(Self {
            context,
            project,
            op,
            clips: OnceLock::new(),
            fail_with: Mutex::new(None),
            renders: AtomicUsize::new(0),
        });

        let as_effect: Arc<dyn ImageEffect> = effect.clone();
        let weak = Arc::downgrade(&as_effect);
        let host: Arc<dyn HostNode> = node.clone();
        let mut clips = vec![Arc::new(ClipBridge::new(
            ClipDescriptor::output(),
            weak.clone(),
            &host,
            opts.clone(),
        )?)];
        for name in &node.input_clips {
            let desc = if name == SOURCE_CLIP_NAME {
                ClipDescriptor::input(name.clone())
            } else {
                ClipDescriptor::optional_input(name.clone())
            };
            clips.push(Arc::new(ClipBridge::new(
                desc,
                weak.clone(),
                &host,
                opts.clone(),
            )?));
        }
        let _ = effect.clips.set(clips);
        node.host_effect(Arc::clone(&effect) as Arc<dyn ImageEffect>);
        Ok(effect)
    }

    /// Make every following render report `status` (`None` restores normal rendering).
    pub fn fail_with(&self, status: Option<RenderStatus>) {
        *self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Number of render actions received.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Acquire)
    }

    fn render_into(&self, time: f64, window: RectI) -> BridgeResult<()> {
        let Some(output) = self.clip(OUTPUT_CLIP_NAME) else {
            return Ok(());
        };
        let region = window.to_canonical();
        let out = output.get_image(time, Some(region))?;
        // No image lock is held while rows render in parallel.
        let input = match self.clip(SOURCE_CLIP_NAME) {
            Some(clip) => {
                let image = clip.get_image(time, Some(region))?;
                let pixels = image.read().clone();
                Some(pixels).filter(|p| !p.is_placeholder())
            }
            None => None,
        };

        let stride = window.width() * PACKED_CHANNELS;
        if stride == 0 {
            return Ok(());
        }
        let op = self.op;
        let mut rendered = vec![0.0_f32; stride * window.height()];
        rendered
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, line)| {
                let y = window.y1 + row as i32;
                for (col, px) in line.chunks_exact_mut(PACKED_CHANNELS).enumerate() {
                    let x = window.x1 + col as i32;
                    let sample = input
                        .as_ref()
                        .and_then(|s| s.pixel_f(x, y).copied())
                        .unwrap_or([0.0; 4]);
                    px.copy_from_slice(&op.apply(sample));
                }
            });

        let mut dst = out.write()?;
        for (row, line) in rendered.chunks_exact(stride).enumerate() {
            if let Some(dst_row) = dst
                .row_f_mut(window.y1 + row as i32)
                .filter(|r| r.len() == line.len())
            {
                dst_row.copy_from_slice(line);
            }
        }
        Ok(())
    }
}

impl ImageEffect for SyntheticEffect {
    fn context(&self) -> EffectContext {
        self.context
    }

    fn frame_rate(&self) -> f64 {
        self.project.frame_rate
    }

    fn project_extent(&self) -> Size {
        self.project.extent
    }

    fn project_offset(&self) -> Point {
        self.project.offset
    }

    fn project_pixel_aspect_ratio(&self) -> f64 {
        self.project.pixel_aspect_ratio
    }

    fn render_action(
        &self,
        time: f64,
        _field: FieldOrder,
        window: RectI,
        _scale: RenderScale,
    ) -> RenderStatus {
        self.renders.fetch_add(1, Ordering::AcqRel);
        if let Some(status) = *self.fail_with.lock().unwrap_or_else(PoisonError::into_inner) {
            return status;
        }
        match self.render_into(time, window) {
            Ok(()) => RenderStatus::Ok,
            Err(e) => {
                tracing::warn!(error = %e, "synthetic render failed");
                RenderStatus::Failed
            }
        }
    }

    fn clip(&self, name: &str) -> Option<Arc<ClipBridge>> {
        self.clips
            .get()?
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/synthetic.rs"]
mod tests;
