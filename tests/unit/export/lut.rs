use super::*;

#[test]
fn endpoints_map_to_byte_extremes() {
    for lut in [ColorLut::linear(), ColorLut::srgb()] {
        assert_eq!(lut.to_byte(0.0), 0);
        assert_eq!(lut.to_byte(1.0), 255);
    }
}

#[test]
fn out_of_range_values_are_clamped() {
    let lut = ColorLut::srgb();
    assert_eq!(lut.to_byte(-3.0), 0);
    assert_eq!(lut.to_byte(7.5), 255);
    assert_eq!(lut.to_byte(f32::NAN), 0);
}

#[test]
fn linear_is_proportional() {
    let lut = ColorLut::linear();
    assert_eq!(lut.to_byte(0.5), 128);
    assert_eq!(lut.to_byte(0.25), 64);
}

#[test]
fn srgb_lifts_mid_greys() {
    let lut = ColorLut::srgb();
    let mid = lut.to_byte(0.5);
    assert!((186..=189).contains(&mid), "got {mid}");
    assert!(lut.to_byte(0.18) > ColorLut::linear().to_byte(0.18));
}

#[test]
fn srgb_table_is_monotonic() {
    let lut = ColorLut::srgb();
    let mut prev = 0;
    for i in 0..=100 {
        let b = lut.to_byte(i as f32 / 100.0);
        assert!(b >= prev);
        prev = b;
    }
}

#[test]
fn default_is_srgb() {
    assert_eq!(ColorLut::default().transfer(), Transfer::Srgb);
    assert_eq!(quantize(1.0), 255);
    assert_eq!(quantize(0.0), 0);
}
