//! Planar-to-packed scanline conversion.
//!
//! The native pipeline stores each channel of a scanline in its own plane; OFX images interleave
//! the channels of every pixel. [`PACKED_ORDER`] is the single declaration of the interleaved
//! slot order used by every packed image in this crate.

use crate::foundation::core::Channel;
use crate::host::traits::PlanarRow;
use crate::image::buffer::PACKED_CHANNELS;

/// Channel stored in each slot of a packed pixel.
pub const PACKED_ORDER: [Channel; PACKED_CHANNELS] =
    [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

/// Four complete channel planes of one scanline, in [`PACKED_ORDER`].
#[derive(Clone, Copy, Debug)]
pub struct ChannelPlanes<'a> {
    planes: [&'a [f32]; PACKED_CHANNELS],
}

impl<'a> ChannelPlanes<'a> {
    /// Planes given in [`PACKED_ORDER`].
    pub fn new(planes: [&'a [f32]; PACKED_CHANNELS]) -> Self {
        Self { planes }
    }

    /// Borrow the four planes of `row`, or name the first channel that is not computed yet.
    pub fn from_row(row: &'a dyn PlanarRow) -> Result<Self, Channel> {
        let mut planes: [&'a [f32]; PACKED_CHANNELS] = [&[]; PACKED_CHANNELS];
        for (slot, channel) in PACKED_ORDER.into_iter().enumerate() {
            planes[slot] = row.plane(channel).ok_or(channel)?;
        }
        Ok(Self { planes })
    }

    /// Samples available in every plane.
    pub fn len(&self) -> usize {
        self.planes.iter().map(|p| p.len()).min().unwrap_or(0)
    }

    /// Return `true` when no plane has samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-span `[start, start + len)` of every plane.
    ///
    /// # Panics
    ///
    /// When the span runs past the end of any plane.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        Self {
            planes: self.planes.map(|p| &p[start..start + len]),
        }
    }
}

/// Interleave `count` pixels of `planes` into `dst` (`4 * count` components, [`PACKED_ORDER`]).
///
/// The converter never invents data: every plane must be present (enforced by
/// [`ChannelPlanes`]) and hold at least `count` samples.
///
/// # Panics
///
/// When a plane is shorter than `count` or `dst` shorter than `4 * count`.
pub fn pack_planes(planes: &ChannelPlanes<'_>, count: usize, dst: &mut [f32]) {
    assert!(
        planes.len() >= count,
        "channel planes hold {} samples, {count} requested",
        planes.len()
    );
    assert!(
        dst.len() >= count * PACKED_CHANNELS,
        "packed destination holds {} components, {} required",
        dst.len(),
        count * PACKED_CHANNELS
    );

    for (i, px) in dst
        .chunks_exact_mut(PACKED_CHANNELS)
        .take(count)
        .enumerate()
    {
        for (slot, plane) in planes.planes.iter().enumerate() {
            px[slot] = plane[i];
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/convert.rs"]
mod tests;
