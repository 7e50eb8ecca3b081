use super::*;
use crate::*;
use fnv::FnvHashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub(crate) type EmptyQueryResults = Arc<Mutex<Vec<Option<u64>>>>;

/// Limits applied by the simulated device. Exceeding them produces the same errors a real device
/// reports when it runs out of memory.
#[derive(Clone, Debug, Default)]
pub struct RavelApiDefEmpty {
    /// Total bytes of texture memory that may be live at once
    pub texture_memory_budget: Option<u64>,
}

pub(crate) struct EmptyDeviceState {
    pub(crate) events: Vec<RavelEmptyEvent>,
    pub(crate) next_object_id: u64,
    pub(crate) clock_ns: u64,
    pub(crate) live_texture_bytes: u64,
    pub(crate) live_texture_count: usize,
    pub(crate) query_pools: FnvHashMap<u64, Weak<Mutex<Vec<Option<u64>>>>>,
}

pub(crate) struct RavelDeviceContextEmptyInner {
    device_info: RavelDeviceInfo,
    api_def: RavelApiDefEmpty,
    state: Mutex<EmptyDeviceState>,
}

#[derive(Clone)]
pub struct RavelDeviceContextEmpty {
    inner: Arc<RavelDeviceContextEmptyInner>,
}

impl std::fmt::Debug for RavelDeviceContextEmpty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelDeviceContextEmpty")
            .field("api_def", &self.inner.api_def)
            .finish()
    }
}

impl RavelDeviceContextEmpty {
    pub fn new(api_def: &RavelApiDefEmpty) -> Self {
        let device_info = RavelDeviceInfo {
            timestamp_period_ns: 1.0,
            supports_timestamps: true,
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 64,
        };

        RavelDeviceContextEmpty {
            inner: Arc::new(RavelDeviceContextEmptyInner {
                device_info,
                api_def: api_def.clone(),
                state: Mutex::new(EmptyDeviceState {
                    events: Default::default(),
                    next_object_id: 1,
                    clock_ns: 0,
                    live_texture_bytes: 0,
                    live_texture_count: 0,
                    query_pools: Default::default(),
                }),
            }),
        }
    }

    pub fn device_info(&self) -> &RavelDeviceInfo {
        &self.inner.device_info
    }

    pub(crate) fn state(&self) -> MutexGuard<EmptyDeviceState> {
        self.inner.state.lock().unwrap()
    }

    pub(crate) fn allocate_object_id(&self) -> u64 {
        let mut state = self.state();
        let id = state.next_object_id;
        state.next_object_id += 1;
        id
    }

    pub(crate) fn push_event(
        &self,
        event: RavelEmptyEvent,
    ) {
        self.state().events.push(event);
    }

    /// Every event logged so far, in order
    pub fn events(&self) -> Vec<RavelEmptyEvent> {
        self.state().events.clone()
    }

    /// Returns and clears the event log
    pub fn take_events(&self) -> Vec<RavelEmptyEvent> {
        std::mem::take(&mut self.state().events)
    }

    pub fn live_texture_count(&self) -> usize {
        self.state().live_texture_count
    }

    pub fn live_texture_bytes(&self) -> u64 {
        self.state().live_texture_bytes
    }

    pub(crate) fn reserve_texture_memory(
        &self,
        bytes: u64,
    ) -> RavelResult<()> {
        let mut state = self.state();
        if let Some(budget) = self.inner.api_def.texture_memory_budget {
            if state.live_texture_bytes + bytes > budget {
                return Err(RavelError::AllocationFailure(format!(
                    "texture of {} bytes exceeds the remaining budget ({} of {} bytes in use)",
                    bytes, state.live_texture_bytes, budget
                )));
            }
        }

        state.live_texture_bytes += bytes;
        state.live_texture_count += 1;
        Ok(())
    }

    pub(crate) fn release_texture_memory(
        &self,
        bytes: u64,
    ) {
        let mut state = self.state();
        state.live_texture_bytes -= bytes;
        state.live_texture_count -= 1;
    }

    pub(crate) fn register_query_pool(
        &self,
        query_pool_id: u64,
        results: &EmptyQueryResults,
    ) {
        let mut state = self.state();
        state.query_pools.retain(|_, x| x.strong_count() > 0);
        state
            .query_pools
            .insert(query_pool_id, Arc::downgrade(results));
    }

    pub(crate) fn query_pool_results(
        &self,
        query_pool_id: u64,
    ) -> Option<EmptyQueryResults> {
        self.state()
            .query_pools
            .get(&query_pool_id)
            .and_then(|x| x.upgrade())
    }

    /// Advance the simulated GPU clock and return the new time
    pub(crate) fn advance_clock(
        &self,
        duration_ns: u64,
    ) -> u64 {
        let mut state = self.state();
        state.clock_ns += duration_ns;
        state.clock_ns
    }

    pub fn create_queue(
        &self,
        queue_type: RavelQueueType,
    ) -> RavelResult<RavelQueueEmpty> {
        Ok(RavelQueueEmpty::new(self, queue_type))
    }

    pub fn create_fence(&self) -> RavelResult<RavelFenceEmpty> {
        Ok(RavelFenceEmpty::new(self))
    }

    pub fn create_semaphore(&self) -> RavelResult<RavelSemaphoreEmpty> {
        Ok(RavelSemaphoreEmpty::new(self))
    }

    pub fn create_texture(
        &self,
        texture_def: &RavelTextureDef,
    ) -> RavelResult<RavelTextureEmpty> {
        RavelTextureEmpty::new(self, texture_def)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<RavelBufferEmpty> {
        RavelBufferEmpty::new(self, buffer_def)
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<RavelSamplerEmpty> {
        Ok(RavelSamplerEmpty::new(self, sampler_def))
    }

    pub fn create_descriptor_set_layout(
        &self,
        descriptor_set_layout_def: &RavelDescriptorSetLayoutDef,
    ) -> RavelResult<RavelDescriptorSetLayoutEmpty> {
        descriptor_set_layout_def.validate()?;
        Ok(RavelDescriptorSetLayoutEmpty::new(
            self,
            descriptor_set_layout_def,
        ))
    }

    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RavelDescriptorPoolDef,
    ) -> RavelResult<RavelDescriptorPoolEmpty> {
        Ok(RavelDescriptorPoolEmpty::new(self, descriptor_pool_def))
    }

    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RavelComputePipelineDef,
    ) -> RavelResult<RavelPipelineEmpty> {
        if compute_pipeline_def.shader.bytecode.is_empty() {
            return Err(RavelError::ValidationFailure(
                "compute shader bytecode is empty".to_string(),
            ));
        }

        Ok(RavelPipelineEmpty::new(self, RavelPipelineType::Compute))
    }

    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RavelGraphicsPipelineDef,
    ) -> RavelResult<RavelPipelineEmpty> {
        if graphics_pipeline_def.vertex_shader.bytecode.is_empty()
            || graphics_pipeline_def.fragment_shader.bytecode.is_empty()
        {
            return Err(RavelError::ValidationFailure(
                "graphics shader bytecode is empty".to_string(),
            ));
        }

        Ok(RavelPipelineEmpty::new(self, RavelPipelineType::Graphics))
    }

    pub fn create_query_pool(
        &self,
        query_pool_def: &RavelQueryPoolDef,
    ) -> RavelResult<RavelQueryPoolEmpty> {
        Ok(RavelQueryPoolEmpty::new(self, query_pool_def))
    }

    pub fn wait_for_fences(
        &self,
        fences: &[&RavelFenceEmpty],
    ) -> RavelResult<()> {
        for fence in fences {
            fence.wait()?;
        }

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RavelResult<()> {
        self.push_event(RavelEmptyEvent::DeviceWaitIdle);
        Ok(())
    }
}
