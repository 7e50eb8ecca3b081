use crate::empty::RavelCommandBufferEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelCommandBufferVulkan;
use crate::*;

/// A list of commands recorded by the CPU and submitted to the GPU.
///
/// Secondary command buffers are recorded on worker threads and executed from a primary command
/// buffer inside a rendering scope.
#[derive(Debug)]
pub enum RavelCommandBuffer {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelCommandBufferVulkan),
    Empty(RavelCommandBufferEmpty),
}

impl RavelCommandBuffer {
    /// Begins writing a primary command buffer. Previously recorded commands are discarded.
    pub fn begin(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.begin(),
            RavelCommandBuffer::Empty(inner) => inner.begin(),
        }
    }

    /// Begins writing a secondary command buffer that will be executed inside a rendering scope
    /// with the given attachment formats
    pub fn begin_secondary(
        &self,
        inheritance: &RavelRenderingInheritanceDef,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.begin_secondary(inheritance),
            RavelCommandBuffer::Empty(inner) => inner.begin_secondary(inheritance),
        }
    }

    /// End writing the command buffer. This must be called before submitting the command buffer
    pub fn end(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.end(),
            RavelCommandBuffer::Empty(inner) => inner.end(),
        }
    }

    /// Add barriers to the command buffer. Barriers order all prior commands against all later
    /// commands, and transition textures between layouts.
    pub fn cmd_resource_barrier(
        &self,
        buffer_barriers: &[RavelBufferBarrier],
        texture_barriers: &[RavelTextureBarrier],
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => {
                inner.cmd_resource_barrier(buffer_barriers, texture_barriers)
            }
            RavelCommandBuffer::Empty(inner) => {
                inner.cmd_resource_barrier(buffer_barriers, texture_barriers)
            }
        }
    }

    pub fn cmd_begin_rendering(
        &self,
        rendering_def: &RavelRenderingDef,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_begin_rendering(rendering_def),
            RavelCommandBuffer::Empty(inner) => inner.cmd_begin_rendering(rendering_def),
        }
    }

    pub fn cmd_end_rendering(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_end_rendering(),
            RavelCommandBuffer::Empty(inner) => inner.cmd_end_rendering(),
        }
    }

    /// Sets a viewport and scissor covering the whole render area
    pub fn cmd_set_viewport_and_scissor(
        &self,
        extents: RavelExtents2D,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_set_viewport_and_scissor(extents),
            RavelCommandBuffer::Empty(inner) => inner.cmd_set_viewport_and_scissor(extents),
        }
    }

    pub fn cmd_bind_pipeline(
        &self,
        pipeline: &RavelPipeline,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => {
                inner.cmd_bind_pipeline(pipeline.vk_pipeline().unwrap())
            }
            RavelCommandBuffer::Empty(inner) => {
                inner.cmd_bind_pipeline(pipeline.empty_pipeline().unwrap())
            }
        }
    }

    /// Binds a descriptor set at set index 0 of the pipeline's layout
    pub fn cmd_bind_descriptor_set(
        &self,
        pipeline: &RavelPipeline,
        descriptor_set: &RavelDescriptorSet,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_bind_descriptor_set(
                pipeline.vk_pipeline().unwrap(),
                descriptor_set.vk_descriptor_set().unwrap(),
            ),
            RavelCommandBuffer::Empty(inner) => inner.cmd_bind_descriptor_set(
                pipeline.empty_pipeline().unwrap(),
                descriptor_set.empty_descriptor_set().unwrap(),
            ),
        }
    }

    pub fn cmd_dispatch(
        &self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => {
                inner.cmd_dispatch(group_count_x, group_count_y, group_count_z)
            }
            RavelCommandBuffer::Empty(inner) => {
                inner.cmd_dispatch(group_count_x, group_count_y, group_count_z)
            }
        }
    }

    pub fn cmd_draw(
        &self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_draw(vertex_count, first_vertex),
            RavelCommandBuffer::Empty(inner) => inner.cmd_draw(vertex_count, first_vertex),
        }
    }

    /// Executes secondary command buffers, in order, from this primary command buffer
    pub fn cmd_execute_secondary(
        &self,
        command_buffers: &[&RavelCommandBuffer],
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => {
                let command_buffers: Vec<_> = command_buffers
                    .iter()
                    .map(|x| x.vk_command_buffer().unwrap())
                    .collect();
                inner.cmd_execute_secondary(&command_buffers)
            }
            RavelCommandBuffer::Empty(inner) => {
                let command_buffers: Vec<_> = command_buffers
                    .iter()
                    .map(|x| x.empty_command_buffer().unwrap())
                    .collect();
                inner.cmd_execute_secondary(&command_buffers)
            }
        }
    }

    pub fn cmd_reset_query_pool(
        &self,
        query_pool: &RavelQueryPool,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => inner.cmd_reset_query_pool(
                query_pool.vk_query_pool().unwrap(),
                first_query,
                query_count,
            ),
            RavelCommandBuffer::Empty(inner) => inner.cmd_reset_query_pool(
                query_pool.empty_query_pool().unwrap(),
                first_query,
                query_count,
            ),
        }
    }

    /// Writes a timestamp once all prior commands complete
    pub fn cmd_write_timestamp(
        &self,
        query_pool: &RavelQueryPool,
        query_index: u32,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(inner) => {
                inner.cmd_write_timestamp(query_pool.vk_query_pool().unwrap(), query_index)
            }
            RavelCommandBuffer::Empty(inner) => {
                inner.cmd_write_timestamp(query_pool.empty_query_pool().unwrap(), query_index)
            }
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_command_buffer(&self) -> Option<&RavelCommandBufferVulkan> {
        match self {
            RavelCommandBuffer::Vk(inner) => Some(inner),
            RavelCommandBuffer::Empty(_) => None,
        }
    }

    pub fn empty_command_buffer(&self) -> Option<&RavelCommandBufferEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandBuffer::Vk(_) => None,
            RavelCommandBuffer::Empty(inner) => Some(inner),
        }
    }
}
