use super::{BufferHandle, PhysicalImageId};
use fnv::FnvHashMap;
use ravel_api::{RavelAccessFlags, RavelImageLayout};

/// Layout of every mip of an image, the access of the last pass that touched it, and whether that
/// pass wrote to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRuntimeState {
    mip_layouts: Vec<RavelImageLayout>,
    access: RavelAccessFlags,
    currently_writing: bool,
}

impl ImageRuntimeState {
    fn new(mip_count: u32) -> Self {
        ImageRuntimeState {
            mip_layouts: vec![RavelImageLayout::Undefined; mip_count as usize],
            access: RavelAccessFlags::NONE,
            currently_writing: false,
        }
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_layouts.len() as u32
    }

    pub fn mip_layout(
        &self,
        mip_level: u32,
    ) -> RavelImageLayout {
        self.mip_layouts[mip_level as usize]
    }

    pub fn mip_layouts(&self) -> &[RavelImageLayout] {
        &self.mip_layouts
    }

    pub fn access(&self) -> RavelAccessFlags {
        self.access
    }

    pub fn currently_writing(&self) -> bool {
        self.currently_writing
    }

    pub(crate) fn set_mip_layout(
        &mut self,
        mip_level: u32,
        layout: RavelImageLayout,
    ) {
        self.mip_layouts[mip_level as usize] = layout;
    }

    pub(crate) fn set_access(
        &mut self,
        access: RavelAccessFlags,
    ) {
        self.access = access;
    }

    pub(crate) fn set_currently_writing(
        &mut self,
        currently_writing: bool,
    ) {
        self.currently_writing = currently_writing;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferRuntimeState {
    is_being_written: bool,
}

impl BufferRuntimeState {
    pub fn is_being_written(&self) -> bool {
        self.is_being_written
    }
}

/// Live GPU-side state of every image and buffer. The barrier synthesizer is the only code that
/// changes an entry after it is registered; everything else reads it.
///
/// Looking up something that was never registered (or was already removed) is a programming error
/// and panics.
#[derive(Default)]
pub struct ResourceStateTable {
    images: FnvHashMap<PhysicalImageId, ImageRuntimeState>,
    buffers: FnvHashMap<BufferHandle, BufferRuntimeState>,
}

impl ResourceStateTable {
    pub fn image_state(
        &self,
        image: PhysicalImageId,
    ) -> &ImageRuntimeState {
        self.images
            .get(&image)
            .unwrap_or_else(|| panic!("image {:?} is not in the resource state table", image))
    }

    pub fn buffer_state(
        &self,
        buffer: BufferHandle,
    ) -> BufferRuntimeState {
        *self
            .buffers
            .get(&buffer)
            .unwrap_or_else(|| panic!("buffer {:?} is not in the resource state table", buffer))
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub(crate) fn image_state_mut(
        &mut self,
        image: PhysicalImageId,
    ) -> &mut ImageRuntimeState {
        self.images
            .get_mut(&image)
            .unwrap_or_else(|| panic!("image {:?} is not in the resource state table", image))
    }

    pub(crate) fn set_buffer_state(
        &mut self,
        buffer: BufferHandle,
        state: BufferRuntimeState,
    ) {
        *self
            .buffers
            .get_mut(&buffer)
            .unwrap_or_else(|| panic!("buffer {:?} is not in the resource state table", buffer)) =
            state;
    }

    pub(crate) fn set_buffer_being_written(
        &mut self,
        buffer: BufferHandle,
        is_being_written: bool,
    ) {
        self.set_buffer_state(buffer, BufferRuntimeState { is_being_written });
    }

    /// New images start with every mip in the undefined layout
    pub(crate) fn register_image(
        &mut self,
        image: PhysicalImageId,
        mip_count: u32,
    ) {
        let old = self.images.insert(image, ImageRuntimeState::new(mip_count));
        assert!(old.is_none(), "image {:?} registered twice", image);
    }

    pub(crate) fn remove_image(
        &mut self,
        image: PhysicalImageId,
    ) {
        let removed = self.images.remove(&image);
        assert!(removed.is_some(), "image {:?} is not in the resource state table", image);
    }

    pub(crate) fn register_buffer(
        &mut self,
        buffer: BufferHandle,
    ) {
        let old = self.buffers.insert(buffer, BufferRuntimeState::default());
        assert!(old.is_none(), "buffer {:?} registered twice", buffer);
    }

    pub(crate) fn remove_buffer(
        &mut self,
        buffer: BufferHandle,
    ) {
        let removed = self.buffers.remove(&buffer);
        assert!(removed.is_some(), "buffer {:?} is not in the resource state table", buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_image_starts_undefined() {
        let mut table = ResourceStateTable::default();
        let image = PhysicalImageId::Persistent(3);
        table.register_image(image, 4);

        let state = table.image_state(image);
        assert_eq!(state.mip_count(), 4);
        assert!(state
            .mip_layouts()
            .iter()
            .all(|x| *x == RavelImageLayout::Undefined));
        assert!(!state.currently_writing());
        assert_eq!(state.access(), RavelAccessFlags::NONE);
    }

    #[test]
    fn test_buffer_state() {
        let mut table = ResourceStateTable::default();
        let buffer = BufferHandle(0);
        table.register_buffer(buffer);
        assert!(!table.buffer_state(buffer).is_being_written());

        table.set_buffer_being_written(buffer, true);
        assert!(table.buffer_state(buffer).is_being_written());
    }

    #[test]
    #[should_panic(expected = "is not in the resource state table")]
    fn test_unknown_image_panics() {
        let table = ResourceStateTable::default();
        table.image_state(PhysicalImageId::Persistent(0));
    }

    #[test]
    #[should_panic(expected = "is not in the resource state table")]
    fn test_removed_buffer_panics() {
        let mut table = ResourceStateTable::default();
        table.register_buffer(BufferHandle(1));
        table.remove_buffer(BufferHandle(1));
        table.buffer_state(BufferHandle(1));
    }
}
