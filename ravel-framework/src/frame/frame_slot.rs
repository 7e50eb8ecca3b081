use crate::{BufferHandle, DescriptorPoolAllocator, RenderBackendConfig};
use ravel_api::{
    RavelCommandBuffer, RavelCommandBufferDef, RavelCommandPool, RavelCommandPoolDef,
    RavelDescriptorSet, RavelDeviceContext, RavelFence, RavelQueryPool, RavelQueryPoolDef,
    RavelQueue, RavelResult, RavelSemaphore,
};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameSlotState {
    Idle,
    Recording,
    Submitted,
}

pub(crate) struct PendingBufferWrite {
    pub(crate) buffer: BufferHandle,
    pub(crate) data: Arc<[u8]>,
}

/// Everything one in-flight frame records into or reads from. The GPU may still be using a slot's
/// contents until its fence is observed signaled.
pub(crate) struct FrameSlot {
    pub(crate) fence: RavelFence,
    pub(crate) render_finished_semaphore: RavelSemaphore,
    pub(crate) command_pool: RavelCommandPool,
    pub(crate) command_buffer: RavelCommandBuffer,
    pub(crate) worker_command_pools: Vec<RavelCommandPool>,
    // worker_command_buffers[worker][n] records the nth parallel pass of the frame
    pub(crate) worker_command_buffers: Vec<Vec<RavelCommandBuffer>>,
    pub(crate) parallel_pass_count: usize,
    pub(crate) descriptor_allocator: DescriptorPoolAllocator,
    pub(crate) descriptor_sets: Vec<RavelDescriptorSet>,
    pub(crate) query_pool: Option<RavelQueryPool>,
    pub(crate) timed_passes: Vec<String>,
    pub(crate) pending_writes: VecDeque<PendingBufferWrite>,
    pub(crate) state: FrameSlotState,
}

impl FrameSlot {
    pub(crate) fn new(
        device_context: &RavelDeviceContext,
        queue: &RavelQueue,
        config: &RenderBackendConfig,
        worker_count: usize,
    ) -> RavelResult<Self> {
        let command_pool_def = RavelCommandPoolDef { transient: true };
        let command_pool = queue.create_command_pool(&command_pool_def)?;
        let command_buffer = command_pool.create_command_buffer(&RavelCommandBufferDef {
            is_secondary: false,
        })?;

        let mut worker_command_pools = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            worker_command_pools.push(queue.create_command_pool(&command_pool_def)?);
        }

        let query_pool = if config.enable_pass_timestamps
            && config.max_timestamped_passes > 0
            && device_context.device_info().supports_timestamps
        {
            Some(device_context.create_query_pool(&RavelQueryPoolDef {
                query_count: config.max_timestamped_passes * 2,
            })?)
        } else {
            None
        };

        Ok(FrameSlot {
            fence: device_context.create_fence()?,
            render_finished_semaphore: device_context.create_semaphore()?,
            command_pool,
            command_buffer,
            worker_command_pools,
            worker_command_buffers: (0..worker_count).map(|_| Vec::default()).collect(),
            parallel_pass_count: 0,
            descriptor_allocator: DescriptorPoolAllocator::new(
                device_context,
                config.descriptor_pool_capacity,
                config.descriptor_sets_per_chunk,
            ),
            descriptor_sets: Default::default(),
            query_pool,
            timed_passes: Default::default(),
            pending_writes: Default::default(),
            state: FrameSlotState::Idle,
        })
    }

    /// Makes everything recorded last time this slot was used available again. The slot's fence
    /// must have been observed first.
    pub(crate) fn reset(&mut self) -> RavelResult<()> {
        self.command_pool.reset_command_pool()?;
        for command_pool in &self.worker_command_pools {
            command_pool.reset_command_pool()?;
        }
        self.parallel_pass_count = 0;

        // Sets must go before the pools they came from are reset
        self.descriptor_sets.clear();
        self.descriptor_allocator.reset()?;
        self.timed_passes.clear();
        Ok(())
    }

    /// Secondary command buffers for the next parallel pass, one per worker
    pub(crate) fn next_worker_command_buffers(&mut self) -> RavelResult<usize> {
        let pass_index = self.parallel_pass_count;
        for (command_pool, command_buffers) in self
            .worker_command_pools
            .iter()
            .zip(&mut self.worker_command_buffers)
        {
            if command_buffers.len() <= pass_index {
                command_buffers.push(command_pool.create_command_buffer(
                    &RavelCommandBufferDef { is_secondary: true },
                )?);
            }
        }

        self.parallel_pass_count += 1;
        Ok(pass_index)
    }

    /// Timestamps for the passes timed last time this slot was submitted, in milliseconds
    pub(crate) fn read_pass_timings(
        &self,
        timestamp_period_ns: f32,
    ) -> RavelResult<Vec<PassTiming>> {
        let query_pool = match &self.query_pool {
            Some(query_pool) if !self.timed_passes.is_empty() => query_pool,
            _ => return Ok(Vec::default()),
        };

        let results = query_pool.get_results(0, self.timed_passes.len() as u32 * 2)?;
        let mut timings = Vec::with_capacity(self.timed_passes.len());
        for (name, pair) in self.timed_passes.iter().zip(results.chunks(2)) {
            match (pair[0], pair[1]) {
                (Some(begin), Some(end)) => timings.push(PassTiming {
                    name: name.clone(),
                    duration_ms: end.saturating_sub(begin) as f64 * timestamp_period_ns as f64
                        / 1_000_000.0,
                }),
                _ => log::trace!("No timestamps available for pass {}", name),
            }
        }

        Ok(timings)
    }
}

/// GPU time spent in one pass
#[derive(Clone, Debug, PartialEq)]
pub struct PassTiming {
    pub name: String,
    pub duration_ms: f64,
}
