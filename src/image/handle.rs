use crate::foundation::core::RectI;
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::image::buffer::PixelBuffer;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one allocated image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a holder may do with the pixels behind an [`ImageRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAccess {
    /// Pixels may only be read.
    ReadOnly,
    /// Pixels may be read and written.
    ReadWrite,
}

struct SharedImage {
    id: ImageId,
    bounds: RectI,
    rod: RectI,
    holders: AtomicUsize,
    pixels: RwLock<PixelBuffer>,
}

/// Owning slot for an image that is not itself counted as a holder (e.g. an output clip cache).
pub(crate) struct ImageSlot {
    shared: Arc<SharedImage>,
}

impl ImageSlot {
    pub(crate) fn new(buffer: PixelBuffer) -> Self {
        Self {
            shared: Arc::new(SharedImage {
                id: ImageId::next(),
                bounds: buffer.bounds(),
                rod: buffer.rod(),
                holders: AtomicUsize::new(0),
                pixels: RwLock::new(buffer),
            }),
        }
    }

    pub(crate) fn id(&self) -> ImageId {
        self.shared.id
    }

    pub(crate) fn bounds(&self) -> RectI {
        self.shared.bounds
    }

    /// Hand out a new counted reference.
    pub(crate) fn acquire(&self, access: ImageAccess) -> ImageRef {
        self.shared.holders.fetch_add(1, Ordering::AcqRel);
        ImageRef {
            shared: Arc::clone(&self.shared),
            access,
        }
    }
}

/// Shared, reference-counted handle to an image produced by a clip bridge.
///
/// Every handle counts as one holder: obtaining it from [`crate::ClipBridge::get_image`] adds a
/// reference, dropping it (or calling [`ImageRef::release`]) removes it. Cloning adds a reference.
/// The pixels stay alive while any handle exists, even after the producing clip evicted them.
pub struct ImageRef {
    shared: Arc<SharedImage>,
    access: ImageAccess,
}

impl ImageRef {
    /// Wrap a freshly allocated buffer that is not cached anywhere.
    pub(crate) fn detached(buffer: PixelBuffer, access: ImageAccess) -> Self {
        ImageSlot::new(buffer).acquire(access)
    }

    /// Identity of the underlying image.
    pub fn id(&self) -> ImageId {
        self.shared.id
    }

    /// Access mode of this handle.
    pub fn access(&self) -> ImageAccess {
        self.access
    }

    /// Pixel rect backed by storage.
    pub fn bounds(&self) -> RectI {
        self.shared.bounds
    }

    /// Region of definition reported to plugins.
    pub fn rod(&self) -> RectI {
        self.shared.rod
    }

    /// Return `true` for area-zero "no data" images.
    pub fn is_placeholder(&self) -> bool {
        self.shared.bounds.area() == 0
    }

    /// Number of live handles on the underlying image.
    pub fn ref_count(&self) -> usize {
        self.shared.holders.load(Ordering::Acquire)
    }

    /// Return `true` when both handles point at the same allocation.
    pub fn same_image(&self, other: &ImageRef) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Lock the pixels for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, PixelBuffer> {
        self.shared
            .pixels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the pixels for writing; fails on read-only handles.
    pub fn write(&self) -> BridgeResult<RwLockWriteGuard<'_, PixelBuffer>> {
        if self.access == ImageAccess::ReadOnly {
            return Err(BridgeError::ReadOnly(self.shared.id.0));
        }
        Ok(self
            .shared
            .pixels
            .write()
            .unwrap_or_else(PoisonError::into_inner))
    }

    /// Demote this handle to read-only.
    pub fn into_read_only(mut self) -> Self {
        self.access = ImageAccess::ReadOnly;
        self
    }

    /// Weak observer that does not keep the pixels alive.
    pub fn downgrade(&self) -> WeakImage {
        WeakImage {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Give up this reference (same as dropping the handle).
    pub fn release(self) {}
}

impl Clone for ImageRef {
    fn clone(&self) -> Self {
        self.shared.holders.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: Arc::clone(&self.shared),
            access: self.access,
        }
    }
}

impl Drop for ImageRef {
    fn drop(&mut self) {
        self.shared.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRef")
            .field("id", &self.shared.id)
            .field("bounds", &self.shared.bounds)
            .field("access", &self.access)
            .field("holders", &self.ref_count())
            .finish()
    }
}

/// Non-owning observer of an image allocation.
#[derive(Clone, Debug)]
pub struct WeakImage {
    shared: Weak<SharedImage>,
}

impl WeakImage {
    /// Return `true` while the pixels are still allocated.
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/handle.rs"]
mod tests;
