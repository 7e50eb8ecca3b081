use super::*;
use crate::backends::empty::device_context::EmptyQueryResults;
use crate::*;
use std::sync::{Arc, Mutex};

fn texture_size_in_bytes(texture_def: &RavelTextureDef) -> u64 {
    let mut bytes = 0;
    for mip_level in 0..texture_def.mip_count {
        let extents = texture_def.extents.mip_extents(mip_level);
        bytes += extents.width as u64
            * extents.height as u64
            * extents.depth as u64
            * texture_def.format.block_size_in_bytes() as u64;
    }

    bytes * texture_def.array_length() as u64
}

struct RavelTextureEmptyInner {
    device_context: RavelDeviceContextEmpty,
    texture_id: u64,
    texture_def: RavelTextureDef,
    size_in_bytes: u64,
}

impl Drop for RavelTextureEmptyInner {
    fn drop(&mut self) {
        self.device_context
            .release_texture_memory(self.size_in_bytes);
        self.device_context
            .push_event(RavelEmptyEvent::TextureDestroyed {
                texture_id: self.texture_id,
            });
    }
}

#[derive(Clone)]
pub struct RavelTextureEmpty {
    inner: Arc<RavelTextureEmptyInner>,
}

impl std::fmt::Debug for RavelTextureEmpty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelTextureEmpty")
            .field("texture_id", &self.inner.texture_id)
            .field("texture_def", &self.inner.texture_def)
            .finish()
    }
}

impl RavelTextureEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        texture_def: &RavelTextureDef,
    ) -> RavelResult<Self> {
        texture_def.validate()?;

        let size_in_bytes = texture_size_in_bytes(texture_def);
        device_context.reserve_texture_memory(size_in_bytes)?;

        let texture_id = device_context.allocate_object_id();
        device_context.push_event(RavelEmptyEvent::TextureCreated { texture_id });

        Ok(RavelTextureEmpty {
            inner: Arc::new(RavelTextureEmptyInner {
                device_context: device_context.clone(),
                texture_id,
                texture_def: texture_def.clone(),
                size_in_bytes,
            }),
        })
    }

    pub fn texture_id(&self) -> u64 {
        self.inner.texture_id
    }

    pub fn texture_def(&self) -> &RavelTextureDef {
        &self.inner.texture_def
    }
}

struct RavelBufferEmptyInner {
    device_context: RavelDeviceContextEmpty,
    buffer_id: u64,
    buffer_def: RavelBufferDef,
    contents: Mutex<Vec<u8>>,
}

impl Drop for RavelBufferEmptyInner {
    fn drop(&mut self) {
        self.device_context
            .push_event(RavelEmptyEvent::BufferDestroyed {
                buffer_id: self.buffer_id,
            });
    }
}

#[derive(Clone)]
pub struct RavelBufferEmpty {
    inner: Arc<RavelBufferEmptyInner>,
}

impl std::fmt::Debug for RavelBufferEmpty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelBufferEmpty")
            .field("buffer_id", &self.inner.buffer_id)
            .field("buffer_def", &self.inner.buffer_def)
            .finish()
    }
}

impl RavelBufferEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<Self> {
        buffer_def.validate()?;

        let buffer_id = device_context.allocate_object_id();
        device_context.push_event(RavelEmptyEvent::BufferCreated { buffer_id });

        Ok(RavelBufferEmpty {
            inner: Arc::new(RavelBufferEmptyInner {
                device_context: device_context.clone(),
                buffer_id,
                buffer_def: buffer_def.clone(),
                contents: Mutex::new(vec![0; buffer_def.size as usize]),
            }),
        })
    }

    pub fn buffer_id(&self) -> u64 {
        self.inner.buffer_id
    }

    pub fn buffer_def(&self) -> &RavelBufferDef {
        &self.inner.buffer_def
    }

    /// Current contents of the simulated buffer memory
    pub fn contents(&self) -> Vec<u8> {
        self.inner.contents.lock().unwrap().clone()
    }

    pub fn copy_to_host_visible_buffer_with_offset(
        &self,
        data: &[u8],
        buffer_byte_offset: u64,
    ) -> RavelResult<()> {
        if self.inner.buffer_def.memory_usage != RavelMemoryUsage::CpuToGpu {
            return Err(RavelError::ValidationFailure(format!(
                "buffer {} is not host visible",
                self.inner.buffer_id
            )));
        }

        let offset = buffer_byte_offset as usize;
        let mut contents = self.inner.contents.lock().unwrap();
        if offset + data.len() > contents.len() {
            return Err(RavelError::ValidationFailure(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                offset,
                contents.len()
            )));
        }

        contents[offset..offset + data.len()].copy_from_slice(data);
        drop(contents);

        self.inner
            .device_context
            .push_event(RavelEmptyEvent::BufferWritten {
                buffer_id: self.inner.buffer_id,
                offset: buffer_byte_offset,
                data: data.to_vec(),
            });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RavelSamplerEmpty {
    sampler_id: u64,
    sampler_def: RavelSamplerDef,
}

impl RavelSamplerEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        sampler_def: &RavelSamplerDef,
    ) -> Self {
        RavelSamplerEmpty {
            sampler_id: device_context.allocate_object_id(),
            sampler_def: sampler_def.clone(),
        }
    }

    pub fn sampler_id(&self) -> u64 {
        self.sampler_id
    }

    pub fn sampler_def(&self) -> &RavelSamplerDef {
        &self.sampler_def
    }
}

#[derive(Clone, Debug)]
pub struct RavelDescriptorSetLayoutEmpty {
    descriptor_set_layout_id: u64,
    descriptor_set_layout_def: Arc<RavelDescriptorSetLayoutDef>,
}

impl RavelDescriptorSetLayoutEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        descriptor_set_layout_def: &RavelDescriptorSetLayoutDef,
    ) -> Self {
        RavelDescriptorSetLayoutEmpty {
            descriptor_set_layout_id: device_context.allocate_object_id(),
            descriptor_set_layout_def: Arc::new(descriptor_set_layout_def.clone()),
        }
    }

    pub fn descriptor_set_layout_id(&self) -> u64 {
        self.descriptor_set_layout_id
    }

    pub fn descriptor_set_layout_def(&self) -> &RavelDescriptorSetLayoutDef {
        &self.descriptor_set_layout_def
    }
}

struct EmptyDescriptorPoolState {
    remaining_sets: u32,
    remaining_descriptors: RavelDescriptorCounts,
}

pub struct RavelDescriptorPoolEmpty {
    device_context: RavelDeviceContextEmpty,
    descriptor_pool_id: u64,
    descriptor_pool_def: RavelDescriptorPoolDef,
    state: Mutex<EmptyDescriptorPoolState>,
}

impl RavelDescriptorPoolEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        descriptor_pool_def: &RavelDescriptorPoolDef,
    ) -> Self {
        let descriptor_pool_id = device_context.allocate_object_id();
        device_context.push_event(RavelEmptyEvent::DescriptorPoolCreated { descriptor_pool_id });

        RavelDescriptorPoolEmpty {
            device_context: device_context.clone(),
            descriptor_pool_id,
            descriptor_pool_def: *descriptor_pool_def,
            state: Mutex::new(EmptyDescriptorPoolState {
                remaining_sets: descriptor_pool_def.max_sets,
                remaining_descriptors: descriptor_pool_def.descriptor_counts,
            }),
        }
    }

    pub fn descriptor_pool_id(&self) -> u64 {
        self.descriptor_pool_id
    }

    pub fn allocate_descriptor_set(
        &self,
        descriptor_set_layout: &RavelDescriptorSetLayoutEmpty,
    ) -> RavelResult<RavelDescriptorSetEmpty> {
        let required = descriptor_set_layout
            .descriptor_set_layout_def()
            .descriptor_counts();

        let mut state = self.state.lock().unwrap();
        if state.remaining_sets == 0 || !required.fits_within(&state.remaining_descriptors) {
            return Err(RavelError::AllocationFailure(format!(
                "descriptor pool {} is exhausted",
                self.descriptor_pool_id
            )));
        }

        state.remaining_sets -= 1;
        state.remaining_descriptors.consume(&required);

        Ok(RavelDescriptorSetEmpty {
            descriptor_set_id: self.device_context.allocate_object_id(),
            layout: descriptor_set_layout.clone(),
            writes: Default::default(),
        })
    }

    /// Returns every set allocated from the pool to it
    pub fn reset_descriptor_pool(&self) -> RavelResult<()> {
        let mut state = self.state.lock().unwrap();
        state.remaining_sets = self.descriptor_pool_def.max_sets;
        state.remaining_descriptors = self.descriptor_pool_def.descriptor_counts;

        self.device_context
            .push_event(RavelEmptyEvent::DescriptorPoolReset {
                descriptor_pool_id: self.descriptor_pool_id,
            });
        Ok(())
    }
}

/// A binding written into an empty descriptor set
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RavelEmptyDescriptorWrite {
    pub binding: u32,
    pub descriptor_type: RavelDescriptorType,
    pub resource_id: u64,
    pub mip_slice: Option<u32>,
    /// Layout images are bound with, None for buffers and samplers
    pub image_layout: Option<RavelImageLayout>,
}

pub struct RavelDescriptorSetEmpty {
    descriptor_set_id: u64,
    layout: RavelDescriptorSetLayoutEmpty,
    writes: Mutex<Vec<RavelEmptyDescriptorWrite>>,
}

impl std::fmt::Debug for RavelDescriptorSetEmpty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelDescriptorSetEmpty")
            .field("descriptor_set_id", &self.descriptor_set_id)
            .finish()
    }
}

impl RavelDescriptorSetEmpty {
    pub fn descriptor_set_id(&self) -> u64 {
        self.descriptor_set_id
    }

    /// Latest write for each binding, sorted by binding
    pub fn written_bindings(&self) -> Vec<RavelEmptyDescriptorWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn update_descriptor_set(
        &self,
        descriptor_writes: &[RavelDescriptorWrite],
    ) -> RavelResult<()> {
        let mut writes = self.writes.lock().unwrap();
        for descriptor_write in descriptor_writes {
            let descriptor_type = descriptor_write.resource.descriptor_type();
            let declared = self
                .layout
                .descriptor_set_layout_def()
                .bindings
                .iter()
                .find(|x| x.binding == descriptor_write.binding);

            match declared {
                Some(declared) if declared.descriptor_type == descriptor_type => {}
                Some(declared) => {
                    return Err(RavelError::ValidationFailure(format!(
                        "binding {} is declared as {:?} but written as {:?}",
                        descriptor_write.binding, declared.descriptor_type, descriptor_type
                    )));
                }
                None => {
                    return Err(RavelError::ValidationFailure(format!(
                        "binding {} is not declared in the descriptor set layout",
                        descriptor_write.binding
                    )));
                }
            }

            let (resource_id, mip_slice, image_layout) = match descriptor_write.resource {
                RavelDescriptorResource::SampledImage {
                    texture,
                    mip_slice,
                    layout,
                } => (
                    texture.empty_texture().unwrap().texture_id(),
                    mip_slice,
                    Some(layout),
                ),
                RavelDescriptorResource::StorageImage { texture, mip_slice } => (
                    texture.empty_texture().unwrap().texture_id(),
                    Some(mip_slice),
                    Some(RavelImageLayout::General),
                ),
                RavelDescriptorResource::UniformBuffer(buffer)
                | RavelDescriptorResource::StorageBuffer(buffer) => {
                    (buffer.empty_buffer().unwrap().buffer_id(), None, None)
                }
                RavelDescriptorResource::Sampler(sampler) => {
                    (sampler.empty_sampler().unwrap().sampler_id(), None, None)
                }
            };

            writes.retain(|x| x.binding != descriptor_write.binding);
            writes.push(RavelEmptyDescriptorWrite {
                binding: descriptor_write.binding,
                descriptor_type,
                resource_id,
                mip_slice,
                image_layout,
            });
        }

        writes.sort_by_key(|x| x.binding);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RavelPipelineEmpty {
    pipeline_id: u64,
    pipeline_type: RavelPipelineType,
}

impl RavelPipelineEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        pipeline_type: RavelPipelineType,
    ) -> Self {
        RavelPipelineEmpty {
            pipeline_id: device_context.allocate_object_id(),
            pipeline_type,
        }
    }

    pub fn pipeline_id(&self) -> u64 {
        self.pipeline_id
    }

    pub fn pipeline_type(&self) -> RavelPipelineType {
        self.pipeline_type
    }
}

pub struct RavelQueryPoolEmpty {
    query_pool_id: u64,
    results: EmptyQueryResults,
}

impl RavelQueryPoolEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        query_pool_def: &RavelQueryPoolDef,
    ) -> Self {
        let query_pool_id = device_context.allocate_object_id();
        let results = Arc::new(Mutex::new(vec![None; query_pool_def.query_count as usize]));
        device_context.register_query_pool(query_pool_id, &results);

        RavelQueryPoolEmpty {
            query_pool_id,
            results,
        }
    }

    pub fn query_pool_id(&self) -> u64 {
        self.query_pool_id
    }

    pub fn query_count(&self) -> u32 {
        self.results.lock().unwrap().len() as u32
    }

    /// Timestamps in ticks, None for queries that were reset and not written since
    pub fn get_results(
        &self,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<Vec<Option<u64>>> {
        let results = self.results.lock().unwrap();
        let first = first_query as usize;
        let end = first + query_count as usize;
        if end > results.len() {
            return Err(RavelError::ValidationFailure(format!(
                "queries {}..{} are out of range of a pool with {} queries",
                first,
                end,
                results.len()
            )));
        }

        Ok(results[first..end].to_vec())
    }
}
