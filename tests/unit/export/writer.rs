use super::*;
use crate::foundation::core::{RectD, RectI};
use crate::image::handle::ImageAccess;
use std::path::PathBuf;

fn two_rows() -> PixelBuffer {
    let mut buf = PixelBuffer::new(BitDepth::Float, RectD::new(0.0, 0.0, 2.0, 2.0));
    for x in 0..2 {
        *buf.pixel_f_mut(x, 0).unwrap() = [1.0, 0.0, 0.0, 1.0];
        *buf.pixel_f_mut(x, 1).unwrap() = [0.0, 0.0, 1.0, 0.5];
    }
    buf
}

fn linear() -> ImageWriter {
    ImageWriter::new(ExportOpts {
        transfer: Transfer::Linear,
        premultiply: false,
    })
}

#[test]
fn depth_channel_is_rejected() {
    let w = ImageWriter::default();
    assert!(w.check_channels(ChannelMask::RGBA).is_ok());
    assert!(w.check_channels(ChannelMask::RGB).is_ok());
    assert!(matches!(
        w.check_channels(ChannelMask::RGBA.with(Channel::Depth)),
        Err(BridgeError::Unsupported(_))
    ));
    assert!(matches!(
        w.check_channels(ChannelMask::NONE),
        Err(BridgeError::Unsupported(_))
    ));
}

#[test]
fn rows_are_flipped_top_down() {
    let img = linear().to_rgba8(&two_rows(), ChannelMask::RGBA).unwrap();
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 128]);
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
}

#[test]
fn missing_alpha_is_written_opaque() {
    let img = linear().to_rgba8(&two_rows(), ChannelMask::RGB).unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
}

#[test]
fn missing_colour_channels_are_zero() {
    let mask = ChannelMask::NONE.with(Channel::Red).with(Channel::Alpha);
    let img = linear().to_rgba8(&two_rows(), mask).unwrap();
    assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 128]);
}

#[test]
fn premultiply_scales_colour_by_alpha() {
    let w = ImageWriter::new(ExportOpts {
        transfer: Transfer::Linear,
        premultiply: true,
    });
    let img = w.to_rgba8(&two_rows(), ChannelMask::RGBA).unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 128, 128]);

    let opaque = w.to_rgba8(&two_rows(), ChannelMask::RGB).unwrap();
    assert_eq!(opaque.get_pixel(0, 0).0, [0, 0, 255, 255]);
}

#[test]
fn non_float_and_placeholder_buffers_are_unsupported() {
    let bytes = PixelBuffer::new(BitDepth::Byte, RectD::new(0.0, 0.0, 2.0, 2.0));
    assert!(matches!(
        linear().to_rgba8(&bytes, ChannelMask::RGBA),
        Err(BridgeError::Unsupported(_))
    ));
    let empty = PixelBuffer::placeholder(BitDepth::Float, RectI::new(0, 0, 4, 4));
    assert!(matches!(
        linear().to_rgba8(&empty, ChannelMask::RGBA),
        Err(BridgeError::Unsupported(_))
    ));
}

#[test]
fn offset_bounds_export_at_their_own_size() {
    let mut buf = PixelBuffer::new(BitDepth::Float, RectD::new(10.0, -3.0, 13.0, -1.0));
    buf.fill_f([0.5, 0.5, 0.5, 1.0]);
    let img = linear().to_rgba8(&buf, ChannelMask::RGBA).unwrap();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(2, 1).0, [128, 128, 128, 255]);
}

#[test]
fn png_round_trips_through_disk() {
    let dir = PathBuf::from("target").join("unit_export");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("two_rows.png");
    let _ = std::fs::remove_file(&path);

    let handle = crate::image::handle::ImageRef::detached(two_rows(), ImageAccess::ReadOnly);
    linear()
        .write_image(&path, &handle, ChannelMask::RGBA)
        .unwrap();

    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.get_pixel(1, 0).0, [0, 0, 255, 128]);
}
