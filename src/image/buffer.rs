use crate::foundation::core::{RectD, RectI};
use crate::foundation::error::{BridgeError, BridgeResult};
use std::collections::TryReserveError;

/// Number of channels in every packed pixel (RGBA).
pub const PACKED_CHANNELS: usize = 4;

/// Per-component storage depth of a [`PixelBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BitDepth {
    /// 8-bit unsigned components (`kOfxBitDepthByte`).
    Byte,
    /// 16-bit unsigned components (`kOfxBitDepthShort`).
    Short,
    /// 32-bit float components (`kOfxBitDepthFloat`).
    Float,
}

impl BitDepth {
    /// Bytes per RGBA pixel.
    pub fn pixel_bytes(self) -> usize {
        match self {
            BitDepth::Byte => 4,
            BitDepth::Short => 8,
            BitDepth::Float => 16,
        }
    }

    /// OFX property string for this depth.
    pub fn as_ofx_str(self) -> &'static str {
        match self {
            BitDepth::Byte => "OfxBitDepthByte",
            BitDepth::Short => "OfxBitDepthShort",
            BitDepth::Float => "OfxBitDepthFloat",
        }
    }
}

#[derive(Clone, Debug)]
enum Storage {
    Byte(Vec<u8>),
    Short(Vec<u16>),
    Float(Vec<f32>),
}

fn try_zeroed_vec<T: Copy + Default>(len: usize) -> Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}

impl Storage {
    fn empty(depth: BitDepth) -> Self {
        match depth {
            BitDepth::Byte => Storage::Byte(Vec::new()),
            BitDepth::Short => Storage::Short(Vec::new()),
            BitDepth::Float => Storage::Float(Vec::new()),
        }
    }

    fn try_zeroed(depth: BitDepth, components: usize) -> Result<Self, TryReserveError> {
        Ok(match depth {
            BitDepth::Byte => Storage::Byte(try_zeroed_vec(components)?),
            BitDepth::Short => Storage::Short(try_zeroed_vec(components)?),
            BitDepth::Float => Storage::Float(try_zeroed_vec(components)?),
        })
    }
}

/// One rectangular image of packed RGBA pixels.
///
/// Pixels are stored row-major starting at `bounds.y1`, each row holding `bounds.width()` pixels
/// of [`PACKED_CHANNELS`] components. The buffer owns its storage exclusively.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    depth: BitDepth,
    bounds: RectI,
    rod: RectI,
    row_bytes: usize,
    storage: Storage,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer covering `rect` (floor of the minimum, ceil of the maximum).
    ///
    /// # Panics
    ///
    /// Wherever [`PixelBuffer::try_new`] fails. Image requests go through `try_new`.
    pub fn new(depth: BitDepth, rect: RectD) -> Self {
        match Self::try_new(depth, rect) {
            Ok(buffer) => buffer,
            Err(e) => panic!("{e}"),
        }
    }

    /// Allocate a zeroed buffer covering `rect`, reporting bad or oversized rects as errors.
    ///
    /// Non-finite, infinite-flagged or inverted rects are [`BridgeError::Validation`]. Rects whose
    /// storage cannot be sized or allocated are [`BridgeError::Unsupported`].
    pub fn try_new(depth: BitDepth, rect: RectD) -> BridgeResult<Self> {
        if !rect.is_finite() || rect.is_infinite() {
            return Err(BridgeError::validation(format!(
                "pixel buffer rect must be finite: {rect:?}"
            )));
        }
        if rect.x1 > rect.x2 || rect.y1 > rect.y2 {
            return Err(BridgeError::validation(format!(
                "pixel buffer rect must not be inverted: {rect:?}"
            )));
        }

        let bounds = RectI {
            x1: rect.x1.floor() as i32,
            y1: rect.y1.floor() as i32,
            x2: rect.x2.ceil() as i32,
            y2: rect.y2.ceil() as i32,
        };

        let too_large = || {
            BridgeError::unsupported(format!(
                "{}x{} {depth:?} pixel buffer is too large",
                bounds.width(),
                bounds.height()
            ))
        };
        let row_bytes = bounds
            .width()
            .checked_mul(depth.pixel_bytes())
            .ok_or_else(too_large)?;
        let byte_len = row_bytes
            .checked_mul(bounds.height())
            .filter(|&n| isize::try_from(n).is_ok())
            .ok_or_else(too_large)?;
        let components = bounds.width() * bounds.height() * PACKED_CHANNELS;
        let storage = Storage::try_zeroed(depth, components).map_err(|e| {
            BridgeError::unsupported(format!(
                "cannot allocate {byte_len} bytes for a pixel buffer: {e}"
            ))
        })?;

        Ok(Self {
            depth,
            bounds,
            rod: bounds,
            row_bytes,
            storage,
        })
    }

    /// Area-zero "no data" buffer reporting `rod` as its region of definition.
    pub fn placeholder(depth: BitDepth, rod: RectI) -> Self {
        let bounds = RectI::new(rod.x1, rod.y1, rod.x1, rod.y1);
        Self {
            depth,
            bounds,
            rod,
            row_bytes: 0,
            storage: Storage::empty(depth),
        }
    }

    /// Component depth.
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Pixel rect backed by storage.
    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    /// Region of definition reported to plugins.
    pub fn rod(&self) -> RectI {
        self.rod
    }

    /// Bytes per scanline.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Total bytes of pixel storage.
    pub fn byte_len(&self) -> usize {
        self.row_bytes * self.bounds.height()
    }

    /// Return `true` for area-zero buffers, which carry no pixel data.
    pub fn is_placeholder(&self) -> bool {
        self.bounds.area() == 0
    }

    fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let col = (x - self.bounds.x1) as usize;
        let row = (y - self.bounds.y1) as usize;
        Some(row * self.bounds.width() + col)
    }

    fn row_range(&self, y: i32) -> Option<std::ops::Range<usize>> {
        if self.bounds.is_null() || y < self.bounds.y1 || y >= self.bounds.y2 {
            return None;
        }
        let stride = self.bounds.width() * PACKED_CHANNELS;
        let start = (y - self.bounds.y1) as usize * stride;
        Some(start..start + stride)
    }

    /// Byte address of pixel `(x, y)` from the start of the block, `None` outside `bounds`.
    pub fn pixel_offset(&self, x: i32, y: i32) -> Option<usize> {
        self.pixel_index(x, y)
            .map(|i| i * self.depth.pixel_bytes())
    }

    fn assert_depth(&self, want: BitDepth) {
        assert_eq!(
            self.depth, want,
            "pixel accessor for {want:?} used on a {:?} buffer",
            self.depth
        );
    }

    /// 8-bit pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// When the buffer is not [`BitDepth::Byte`].
    pub fn pixel_b(&self, x: i32, y: i32) -> Option<&[u8; 4]> {
        self.assert_depth(BitDepth::Byte);
        let i = self.pixel_index(x, y)?;
        let Storage::Byte(data) = &self.storage else {
            return None;
        };
        data[i * 4..i * 4 + 4].try_into().ok()
    }

    /// Mutable 8-bit pixel at `(x, y)`.
    pub fn pixel_b_mut(&mut self, x: i32, y: i32) -> Option<&mut [u8; 4]> {
        self.assert_depth(BitDepth::Byte);
        let i = self.pixel_index(x, y)?;
        let Storage::Byte(data) = &mut self.storage else {
            return None;
        };
        (&mut data[i * 4..i * 4 + 4]).try_into().ok()
    }

    /// 16-bit pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// When the buffer is not [`BitDepth::Short`].
    pub fn pixel_s(&self, x: i32, y: i32) -> Option<&[u16; 4]> {
        self.assert_depth(BitDepth::Short);
        let i = self.pixel_index(x, y)?;
        let Storage::Short(data) = &self.storage else {
            return None;
        };
        data[i * 4..i * 4 + 4].try_into().ok()
    }

    /// Mutable 16-bit pixel at `(x, y)`.
    pub fn pixel_s_mut(&mut self, x: i32, y: i32) -> Option<&mut [u16; 4]> {
        self.assert_depth(BitDepth::Short);
        let i = self.pixel_index(x, y)?;
        let Storage::Short(data) = &mut self.storage else {
            return None;
        };
        (&mut data[i * 4..i * 4 + 4]).try_into().ok()
    }

    /// Float pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// When the buffer is not [`BitDepth::Float`].
    pub fn pixel_f(&self, x: i32, y: i32) -> Option<&[f32; 4]> {
        self.assert_depth(BitDepth::Float);
        let i = self.pixel_index(x, y)?;
        let Storage::Float(data) = &self.storage else {
            return None;
        };
        data[i * 4..i * 4 + 4].try_into().ok()
    }

    /// Mutable float pixel at `(x, y)`.
    pub fn pixel_f_mut(&mut self, x: i32, y: i32) -> Option<&mut [f32; 4]> {
        self.assert_depth(BitDepth::Float);
        let i = self.pixel_index(x, y)?;
        let Storage::Float(data) = &mut self.storage else {
            return None;
        };
        (&mut data[i * 4..i * 4 + 4]).try_into().ok()
    }

    /// Packed float scanline `y` (`4 * width` components).
    pub fn row_f(&self, y: i32) -> Option<&[f32]> {
        self.assert_depth(BitDepth::Float);
        let range = self.row_range(y)?;
        let Storage::Float(data) = &self.storage else {
            return None;
        };
        data.get(range)
    }

    /// Mutable packed float scanline `y`.
    pub fn row_f_mut(&mut self, y: i32) -> Option<&mut [f32]> {
        self.assert_depth(BitDepth::Float);
        let range = self.row_range(y)?;
        let Storage::Float(data) = &mut self.storage else {
            return None;
        };
        data.get_mut(range)
    }

    /// All float components, row-major from `bounds.y1`.
    pub fn as_f32(&self) -> &[f32] {
        self.assert_depth(BitDepth::Float);
        match &self.storage {
            Storage::Float(data) => data,
            _ => &[],
        }
    }

    /// Set every float pixel to `rgba`.
    pub fn fill_f(&mut self, rgba: [f32; 4]) {
        self.assert_depth(BitDepth::Float);
        if let Storage::Float(data) = &mut self.storage {
            for px in data.chunks_exact_mut(PACKED_CHANNELS) {
                px.copy_from_slice(&rgba);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/buffer.rs"]
mod tests;
