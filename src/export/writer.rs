use crate::export::lut::{ColorLut, Transfer, quantize};
use crate::foundation::core::{Channel, ChannelMask};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::image::buffer::{BitDepth, PACKED_CHANNELS, PixelBuffer};
use crate::image::handle::ImageRef;
use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;

/// Options for [`ImageWriter`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOpts {
    /// Transfer applied to colour channels.
    pub transfer: Transfer,
    /// Multiply colour by alpha before quantising (only when alpha is written).
    pub premultiply: bool,
}

/// Converts float images into 8-bit RGBA and writes them as PNG.
#[derive(Clone, Debug)]
pub struct ImageWriter {
    opts: ExportOpts,
    lut: ColorLut,
}

impl ImageWriter {
    /// Build a writer; the colour table is computed once here.
    pub fn new(opts: ExportOpts) -> Self {
        let lut = ColorLut::new(opts.transfer);
        Self { opts, lut }
    }

    /// Writer options.
    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Colour table in use.
    pub fn lut(&self) -> &ColorLut {
        &self.lut
    }

    /// Reject channel sets the 8-bit RGBA writer cannot express.
    pub fn check_channels(&self, channels: ChannelMask) -> BridgeResult<()> {
        if channels.is_empty() {
            return Err(BridgeError::unsupported("no channels selected for export"));
        }
        if let Some(extra) = channels.iter().find(|c| *c == Channel::Depth) {
            return Err(BridgeError::unsupported(format!(
                "PNG export only supports red/green/blue/alpha, got {extra:?}"
            )));
        }
        Ok(())
    }

    /// Quantise `buffer` to a top-down 8-bit RGBA image.
    ///
    /// Canonical rows run bottom-up, so the last buffer row becomes the first image row. Colour
    /// channels missing from `channels` are written as 0, a missing alpha as fully opaque.
    pub fn to_rgba8(
        &self,
        buffer: &PixelBuffer,
        channels: ChannelMask,
    ) -> BridgeResult<image::RgbaImage> {
        self.check_channels(channels)?;
        if buffer.depth() != BitDepth::Float {
            return Err(BridgeError::unsupported(format!(
                "export expects float images, got {:?}",
                buffer.depth()
            )));
        }
        if buffer.is_placeholder() {
            return Err(BridgeError::unsupported("cannot export a placeholder image"));
        }

        let bounds = buffer.bounds();
        let width = bounds.width();
        let height = bounds.height();
        let w = u32::try_from(width).context("image width does not fit u32")?;
        let h = u32::try_from(height).context("image height does not fit u32")?;

        let colour = [Channel::Red, Channel::Green, Channel::Blue].map(|c| channels.contains(c));
        let has_alpha = channels.contains(Channel::Alpha);
        let premultiply = self.opts.premultiply && has_alpha;

        let mut data = vec![0u8; width * height * PACKED_CHANNELS];
        data.par_chunks_mut(width * PACKED_CHANNELS)
            .enumerate()
            .for_each(|(r, dst)| {
                let y = bounds.y2 - 1 - r as i32;
                let Some(src) = buffer.row_f(y) else {
                    return;
                };
                for (out, px) in dst
                    .chunks_exact_mut(PACKED_CHANNELS)
                    .zip(src.chunks_exact(PACKED_CHANNELS))
                {
                    let alpha = if has_alpha { px[3] } else { 1.0 };
                    let k = if premultiply { alpha } else { 1.0 };
                    for slot in 0..3 {
                        out[slot] = if colour[slot] {
                            self.lut.to_byte(px[slot] * k)
                        } else {
                            0
                        };
                    }
                    out[3] = quantize(alpha);
                }
            });

        image::RgbaImage::from_raw(w, h, data)
            .ok_or_else(|| anyhow::anyhow!("rgba buffer does not match {w}x{h}").into())
    }

    /// Quantise `buffer` and encode it as PNG at `path`.
    #[tracing::instrument(level = "debug", skip(self, path, buffer), fields(path = %path.display()))]
    pub fn write_png(
        &self,
        path: &Path,
        buffer: &PixelBuffer,
        channels: ChannelMask,
    ) -> BridgeResult<()> {
        let img = self.to_rgba8(buffer, channels)?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        tracing::debug!(width = img.width(), height = img.height(), "wrote png");
        Ok(())
    }

    /// [`ImageWriter::write_png`] over the pixels behind a clip image handle.
    pub fn write_image(&self, path: &Path, image: &ImageRef, channels: ChannelMask) -> BridgeResult<()> {
        self.write_png(path, &image.read(), channels)
    }
}

impl Default for ImageWriter {
    fn default() -> Self {
        Self::new(ExportOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/writer.rs"]
mod tests;
