use super::{BufferHandle, ImageDescription, SamplerHandle};
use ravel_api::{
    RavelBuffer, RavelBufferDef, RavelDeviceContext, RavelMemoryUsage, RavelResult, RavelSampler,
    RavelSamplerDef, RavelTexture, MAX_FRAMES_IN_FLIGHT,
};

pub(crate) struct PersistentImage {
    pub(crate) description: ImageDescription,
    pub(crate) texture: RavelTexture,
}

/// Host-writable buffers get one copy per frame slot so that a write for the next frame never
/// lands in memory the previous frame is still reading. GPU-only buffers have a single copy.
pub(crate) struct PersistentBuffer {
    pub(crate) buffer_def: RavelBufferDef,
    pub(crate) copies: Vec<RavelBuffer>,
}

impl PersistentBuffer {
    pub(crate) fn is_host_writable(&self) -> bool {
        self.buffer_def.memory_usage == RavelMemoryUsage::CpuToGpu
    }

    pub(crate) fn copy_for_slot(
        &self,
        slot_index: usize,
    ) -> &RavelBuffer {
        &self.copies[slot_index % self.copies.len()]
    }
}

/// GPU objects released by destroying a persistent handle
pub(crate) enum RetiredPersistentResource {
    Texture(RavelTexture),
    Buffers(Vec<RavelBuffer>),
}

/// Storage for resources that outlive a frame. Indices are never reused, so a handle to a
/// destroyed resource can be detected.
#[derive(Default)]
pub(crate) struct PersistentResources {
    images: Vec<Option<PersistentImage>>,
    buffers: Vec<Option<PersistentBuffer>>,
    samplers: Vec<Option<RavelSampler>>,
}

impl PersistentResources {
    pub(crate) fn add_image(
        &mut self,
        description: ImageDescription,
        texture: RavelTexture,
    ) -> u32 {
        let index = self.images.len() as u32;
        self.images.push(Some(PersistentImage {
            description,
            texture,
        }));
        index
    }

    pub(crate) fn image(
        &self,
        index: u32,
    ) -> &PersistentImage {
        match self.images.get(index as usize) {
            Some(Some(image)) => image,
            Some(None) => panic!("persistent image {} was destroyed", index),
            None => panic!("persistent image {} does not exist", index),
        }
    }

    pub(crate) fn remove_image(
        &mut self,
        index: u32,
    ) -> PersistentImage {
        // Panics with a useful message if the handle is bad
        self.image(index);
        self.images[index as usize].take().unwrap()
    }

    pub(crate) fn create_buffer(
        &mut self,
        device_context: &RavelDeviceContext,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<BufferHandle> {
        let copy_count = if buffer_def.memory_usage == RavelMemoryUsage::CpuToGpu {
            MAX_FRAMES_IN_FLIGHT
        } else {
            1
        };

        let mut copies = Vec::with_capacity(copy_count);
        for _ in 0..copy_count {
            copies.push(device_context.create_buffer(buffer_def)?);
        }

        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(Some(PersistentBuffer {
            buffer_def: buffer_def.clone(),
            copies,
        }));
        Ok(handle)
    }

    pub(crate) fn buffer(
        &self,
        handle: BufferHandle,
    ) -> &PersistentBuffer {
        match self.buffers.get(handle.0 as usize) {
            Some(Some(buffer)) => buffer,
            Some(None) => panic!("buffer {:?} was destroyed", handle),
            None => panic!("buffer {:?} does not exist", handle),
        }
    }

    /// None if the buffer was destroyed since the handle was issued
    pub(crate) fn try_buffer(
        &self,
        handle: BufferHandle,
    ) -> Option<&PersistentBuffer> {
        self.buffers
            .get(handle.0 as usize)
            .and_then(|x| x.as_ref())
    }

    pub(crate) fn remove_buffer(
        &mut self,
        handle: BufferHandle,
    ) -> PersistentBuffer {
        self.buffer(handle);
        self.buffers[handle.0 as usize].take().unwrap()
    }

    pub(crate) fn create_sampler(
        &mut self,
        device_context: &RavelDeviceContext,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<SamplerHandle> {
        let sampler = device_context.create_sampler(sampler_def)?;
        let handle = SamplerHandle(self.samplers.len() as u32);
        self.samplers.push(Some(sampler));
        Ok(handle)
    }

    pub(crate) fn sampler(
        &self,
        handle: SamplerHandle,
    ) -> &RavelSampler {
        match self.samplers.get(handle.0 as usize) {
            Some(Some(sampler)) => sampler,
            Some(None) => panic!("sampler {:?} was destroyed", handle),
            None => panic!("sampler {:?} does not exist", handle),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.images.clear();
        self.buffers.clear();
        self.samplers.clear();
    }
}
