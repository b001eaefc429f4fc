use super::*;
use crate::foundation::core::RectD;
use crate::image::buffer::BitDepth;

fn buffer(w: f64, h: f64) -> PixelBuffer {
    PixelBuffer::new(BitDepth::Float, RectD::new(0.0, 0.0, w, h))
}

#[test]
fn acquire_clone_and_drop_track_holders() {
    let slot = ImageSlot::new(buffer(4.0, 4.0));
    let a = slot.acquire(ImageAccess::ReadWrite);
    assert_eq!(a.ref_count(), 1);
    let b = slot.acquire(ImageAccess::ReadWrite);
    assert_eq!(a.ref_count(), 2);
    let c = b.clone();
    assert_eq!(a.ref_count(), 3);
    assert!(a.same_image(&c));
    drop(b);
    c.release();
    assert_eq!(a.ref_count(), 1);
}

#[test]
fn pixels_outlive_the_slot_while_held() {
    let slot = ImageSlot::new(buffer(2.0, 2.0));
    let held = slot.acquire(ImageAccess::ReadOnly);
    let weak = held.downgrade();
    drop(slot);
    assert!(weak.is_alive());
    assert_eq!(held.read().bounds().area(), 4);
    drop(held);
    assert!(!weak.is_alive());
}

#[test]
fn read_only_handles_refuse_writes() {
    let rw = ImageRef::detached(buffer(1.0, 1.0), ImageAccess::ReadWrite);
    rw.write().unwrap().fill_f([1.0; 4]);

    let ro = rw.clone().into_read_only();
    assert_eq!(ro.access(), ImageAccess::ReadOnly);
    assert!(matches!(ro.write(), Err(BridgeError::ReadOnly(_))));
    assert_eq!(ro.read().pixel_f(0, 0), Some(&[1.0; 4]));
    assert_eq!(rw.ref_count(), 2);
}

#[test]
fn ids_are_unique_per_allocation() {
    let a = ImageSlot::new(buffer(1.0, 1.0));
    let b = ImageSlot::new(buffer(1.0, 1.0));
    assert_ne!(a.id(), b.id());
    assert_eq!(a.acquire(ImageAccess::ReadOnly).id(), a.id());
}
