/// Index of a temporary image within the frame that declared it. Only valid during that frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemporaryImageId {
    index: u32,
    frame_index: u64,
}

impl TemporaryImageId {
    pub(crate) fn new(
        index: u32,
        frame_index: u64,
    ) -> Self {
        TemporaryImageId { index, frame_index }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn frame_index(self) -> u64 {
        self.frame_index
    }
}

/// An image as seen by pass declarations. Persistent images live until destroyed, temporary
/// images only for the frame they were created in and may share memory with other temporaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageHandle {
    Persistent(u32),
    Temporary(TemporaryImageId),
}

impl ImageHandle {
    pub fn is_temporary(self) -> bool {
        matches!(self, ImageHandle::Temporary(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u32);

impl BufferHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerHandle(pub(crate) u32);

impl SamplerHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Stable identity of an image in the temporary pool. Unlike the pool's vector index it survives
/// eviction of other pooled images.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PooledImageId(pub(crate) u64);

/// A real GPU image. Temporary handles resolve to a pooled image once temporaries are resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PhysicalImageId {
    Persistent(u32),
    Pooled(PooledImageId),
}
