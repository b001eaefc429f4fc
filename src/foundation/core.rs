pub use kurbo::{Point, Size, Vec2};

/// `kOfxFlagInfiniteMin`: edges at or below this value mean "unbounded".
pub const INFINITE_MIN: f64 = i32::MIN as f64;
/// `kOfxFlagInfiniteMax`: edges at or above this value mean "unbounded".
pub const INFINITE_MAX: f64 = i32::MAX as f64;

/// Scale from canonical coordinates to the resolution an image is produced at.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderScale {
    /// Horizontal scale.
    pub x: f64,
    /// Vertical scale.
    pub y: f64,
}

impl RenderScale {
    /// Full resolution.
    pub const UNIT: Self = Self { x: 1.0, y: 1.0 };

    /// Create a scale from its two components.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self::UNIT
    }
}

impl From<Vec2> for RenderScale {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Axis-aligned rectangle in canonical (continuous) coordinates.
///
/// `x1 <= x2 && y1 <= y2` holds for a valid rect; anything with `x2 <= x1 || y2 <= y1` is "null".
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectD {
    /// Left edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Top edge.
    pub y2: f64,
}

impl RectD {
    /// Create a rect from its left/bottom/right/top edges.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a rect from an origin and a size (e.g. project offset + extent).
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
        )
    }

    /// Inverted "infinity" rect, the neutral starting value for [`RectD::merge`] accumulation.
    pub fn infinity_setup() -> Self {
        Self {
            x1: f64::INFINITY,
            y1: f64::INFINITY,
            x2: f64::NEG_INFINITY,
            y2: f64::NEG_INFINITY,
        }
    }

    /// Width (`x2 - x1`).
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height (`y2 - y1`).
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Area (`width * height`).
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Return `true` when the rect is empty or inverted.
    pub fn is_null(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Return `true` when any edge reaches the OFX infinite flags.
    pub fn is_infinite(&self) -> bool {
        self.x1 <= INFINITE_MIN
            || self.x2 >= INFINITE_MAX
            || self.y1 <= INFINITE_MIN
            || self.y2 >= INFINITE_MAX
    }

    /// Return `true` when all four edges are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Grow `self` to the smallest rect enclosing both `self` and `other`.
    pub fn merge(&mut self, other: &RectD) {
        self.x1 = self.x1.min(other.x1);
        self.y1 = self.y1.min(other.y1);
        self.x2 = self.x2.max(other.x2);
        self.y2 = self.y2.max(other.y2);
    }

    /// Smallest rect enclosing both rects.
    pub fn merged(mut self, other: &RectD) -> Self {
        self.merge(other);
        self
    }

    /// Intersection of two rects, `None` when either is null or they are disjoint.
    ///
    /// Rects sharing only an edge intersect with a zero-area result.
    pub fn intersect(&self, other: &RectD) -> Option<RectD> {
        if !self.intersects(other) {
            return None;
        }
        Some(RectD {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        })
    }

    /// Return `true` when both rects are non-null and overlap or touch.
    pub fn intersects(&self, other: &RectD) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        !(self.x1 > other.x2 || other.x1 > self.x2 || self.y1 > other.y2 || other.y1 > self.y2)
    }

    /// Return `true` when `other` lies entirely inside `self` (edges inclusive).
    pub fn contains_rect(&self, other: &RectD) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    /// Half-open point test: `x1 <= x < x2 && y1 <= y < y2`.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x < self.x2 && p.y >= self.y1 && p.y < self.y2
    }

    /// Smallest pixel rect covering this canonical rect at `scale` and pixel aspect ratio `par`.
    ///
    /// Minima are floored and maxima ceiled independently, so the result never under-covers.
    pub fn to_pixel_enclosing(&self, scale: RenderScale, par: f64) -> RectI {
        RectI {
            x1: (self.x1 * scale.x / par).floor() as i32,
            y1: (self.y1 * scale.y).floor() as i32,
            x2: (self.x2 * scale.x / par).ceil() as i32,
            y2: (self.y2 * scale.y).ceil() as i32,
        }
    }

    /// [`RectD::to_pixel_enclosing`] at unit scale and square pixels.
    pub fn to_pixel_enclosing_unit(&self) -> RectI {
        self.to_pixel_enclosing(RenderScale::UNIT, 1.0)
    }
}

impl From<kurbo::Rect> for RectD {
    fn from(r: kurbo::Rect) -> Self {
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

impl From<RectD> for kurbo::Rect {
    fn from(r: RectD) -> Self {
        kurbo::Rect::new(r.x1, r.y1, r.x2, r.y2)
    }
}

/// Integer pixel rectangle, inclusive minimum and exclusive maximum on both axes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RectI {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Bottom edge (inclusive).
    pub y1: i32,
    /// Right edge (exclusive).
    pub x2: i32,
    /// Top edge (exclusive).
    pub y2: i32,
}

impl RectI {
    /// Create a rect from its left/bottom/right/top edges.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width in pixels, zero for inverted rects.
    pub fn width(&self) -> usize {
        (i64::from(self.x2) - i64::from(self.x1)).max(0) as usize
    }

    /// Height in pixels, zero for inverted rects.
    pub fn height(&self) -> usize {
        (i64::from(self.y2) - i64::from(self.y1)).max(0) as usize
    }

    /// Pixel count.
    pub fn area(&self) -> usize {
        self.width().saturating_mul(self.height())
    }

    /// Return `true` when the rect covers no pixels.
    pub fn is_null(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Half-open pixel test.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Overlapping pixels of two rects, `None` when they share no pixel.
    pub fn intersect(&self, other: &RectI) -> Option<RectI> {
        let r = RectI {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (!r.is_null()).then_some(r)
    }

    /// Smallest rect enclosing both rects.
    pub fn merged(&self, other: &RectI) -> RectI {
        RectI {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// The same rect in canonical coordinates (unit scale).
    pub fn to_canonical(&self) -> RectD {
        RectD::new(
            f64::from(self.x1),
            f64::from(self.y1),
            f64::from(self.x2),
            f64::from(self.y2),
        )
    }
}

/// Image channel addressed by the native row pipeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Alpha.
    Alpha,
    /// Depth (Z). Carried by the pipeline but never packed into OFX images.
    Depth,
}

impl Channel {
    /// All channels in mask-bit order.
    pub const ALL: [Channel; 5] = [
        Channel::Red,
        Channel::Green,
        Channel::Blue,
        Channel::Alpha,
        Channel::Depth,
    ];

    fn bit(self) -> u8 {
        match self {
            Channel::Red => 1 << 0,
            Channel::Green => 1 << 1,
            Channel::Blue => 1 << 2,
            Channel::Alpha => 1 << 3,
            Channel::Depth => 1 << 4,
        }
    }
}

/// Set of [`Channel`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// No channels.
    pub const NONE: Self = Self(0);
    /// Red, green, blue.
    pub const RGB: Self = Self(0b0111);
    /// Red, green, blue, alpha.
    pub const RGBA: Self = Self(0b1111);

    /// Mask containing exactly `channels`.
    pub fn from_channels(channels: &[Channel]) -> Self {
        channels
            .iter()
            .fold(Self::NONE, |m, &c| m.with(c))
    }

    /// Copy of `self` with `c` added.
    pub fn with(self, c: Channel) -> Self {
        Self(self.0 | c.bit())
    }

    /// Return `true` when `c` is in the set.
    pub fn contains(self, c: Channel) -> bool {
        self.0 & c.bit() != 0
    }

    /// Iterate channels in the set.
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |&c| self.contains(c))
    }

    /// Return `true` when the set is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Inclusive frame range a clip has images over, in frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpan {
    /// First frame.
    pub start: f64,
    /// Last frame.
    pub end: f64,
}

impl FrameSpan {
    /// Create a span from its first and last frame.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
