use crate::empty::{RavelApiDefEmpty, RavelDeviceContextEmpty};
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelDeviceContextVulkan;
use crate::*;

/// A cloneable, thread-safe handle used to create graphics resources.
///
/// All device contexts (and resources created from them) must be dropped before the underlying
/// device is destroyed.
#[derive(Clone, Debug)]
pub enum RavelDeviceContext {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelDeviceContextVulkan),
    Empty(RavelDeviceContextEmpty),
}

impl RavelDeviceContext {
    /// Creates a headless device. Nothing runs on a GPU, but every operation is tracked, which
    /// makes this useful for tests and tools.
    pub fn new_empty(api_def: &RavelApiDefEmpty) -> Self {
        RavelDeviceContext::Empty(RavelDeviceContextEmpty::new(api_def))
    }

    pub fn device_info(&self) -> &RavelDeviceInfo {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => inner.device_info(),
            RavelDeviceContext::Empty(inner) => inner.device_info(),
        }
    }

    /// Create a queue. The frame core submits all of its work to a single graphics queue.
    pub fn create_queue(
        &self,
        queue_type: RavelQueueType,
    ) -> RavelResult<RavelQueue> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelQueue::Vk(inner.create_queue(queue_type)?),
            RavelDeviceContext::Empty(inner) => {
                RavelQueue::Empty(inner.create_queue(queue_type)?)
            }
        })
    }

    /// Create a fence. Fences are used by the CPU to learn when the GPU finished a submission.
    pub fn create_fence(&self) -> RavelResult<RavelFence> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelFence::Vk(inner.create_fence()?),
            RavelDeviceContext::Empty(inner) => RavelFence::Empty(inner.create_fence()?),
        })
    }

    /// Create a semaphore. Semaphores order GPU work, for example presenting after rendering.
    pub fn create_semaphore(&self) -> RavelResult<RavelSemaphore> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelSemaphore::Vk(inner.create_semaphore()?),
            RavelDeviceContext::Empty(inner) => RavelSemaphore::Empty(inner.create_semaphore()?),
        })
    }

    pub fn create_texture(
        &self,
        texture_def: &RavelTextureDef,
    ) -> RavelResult<RavelTexture> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelTexture::Vk(inner.create_texture(texture_def)?),
            RavelDeviceContext::Empty(inner) => {
                RavelTexture::Empty(inner.create_texture(texture_def)?)
            }
        })
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<RavelBuffer> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelBuffer::Vk(inner.create_buffer(buffer_def)?),
            RavelDeviceContext::Empty(inner) => {
                RavelBuffer::Empty(inner.create_buffer(buffer_def)?)
            }
        })
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<RavelSampler> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelSampler::Vk(inner.create_sampler(sampler_def)?),
            RavelDeviceContext::Empty(inner) => {
                RavelSampler::Empty(inner.create_sampler(sampler_def)?)
            }
        })
    }

    pub fn create_descriptor_set_layout(
        &self,
        descriptor_set_layout_def: &RavelDescriptorSetLayoutDef,
    ) -> RavelResult<RavelDescriptorSetLayout> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => RavelDescriptorSetLayout::Vk(
                inner.create_descriptor_set_layout(descriptor_set_layout_def)?,
            ),
            RavelDeviceContext::Empty(inner) => RavelDescriptorSetLayout::Empty(
                inner.create_descriptor_set_layout(descriptor_set_layout_def)?,
            ),
        })
    }

    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RavelDescriptorPoolDef,
    ) -> RavelResult<RavelDescriptorPool> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => {
                RavelDescriptorPool::Vk(inner.create_descriptor_pool(descriptor_pool_def)?)
            }
            RavelDeviceContext::Empty(inner) => {
                RavelDescriptorPool::Empty(inner.create_descriptor_pool(descriptor_pool_def)?)
            }
        })
    }

    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RavelComputePipelineDef,
    ) -> RavelResult<RavelPipeline> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => {
                RavelPipeline::Vk(inner.create_compute_pipeline(compute_pipeline_def)?)
            }
            RavelDeviceContext::Empty(inner) => {
                RavelPipeline::Empty(inner.create_compute_pipeline(compute_pipeline_def)?)
            }
        })
    }

    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RavelGraphicsPipelineDef,
    ) -> RavelResult<RavelPipeline> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => {
                RavelPipeline::Vk(inner.create_graphics_pipeline(graphics_pipeline_def)?)
            }
            RavelDeviceContext::Empty(inner) => {
                RavelPipeline::Empty(inner.create_graphics_pipeline(graphics_pipeline_def)?)
            }
        })
    }

    pub fn create_query_pool(
        &self,
        query_pool_def: &RavelQueryPoolDef,
    ) -> RavelResult<RavelQueryPool> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => {
                RavelQueryPool::Vk(inner.create_query_pool(query_pool_def)?)
            }
            RavelDeviceContext::Empty(inner) => {
                RavelQueryPool::Empty(inner.create_query_pool(query_pool_def)?)
            }
        })
    }

    /// Blocks until every submitted fence in the list is signaled. Unsubmitted fences are
    /// skipped.
    pub fn wait_for_fences(
        &self,
        fences: &[&RavelFence],
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => {
                let fences: Vec<_> = fences.iter().map(|x| x.vk_fence().unwrap()).collect();
                inner.wait_for_fences(&fences)
            }
            RavelDeviceContext::Empty(inner) => {
                let fences: Vec<_> = fences.iter().map(|x| x.empty_fence().unwrap()).collect();
                inner.wait_for_fences(&fences)
            }
        }
    }

    pub fn wait_for_device_idle(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(inner) => inner.wait_for_device_idle(),
            RavelDeviceContext::Empty(inner) => inner.wait_for_device_idle(),
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_device_context(&self) -> Option<&RavelDeviceContextVulkan> {
        match self {
            RavelDeviceContext::Vk(inner) => Some(inner),
            RavelDeviceContext::Empty(_) => None,
        }
    }

    /// Get the underlying empty API object, which exposes the event log
    pub fn empty_device_context(&self) -> Option<&RavelDeviceContextEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDeviceContext::Vk(_) => None,
            RavelDeviceContext::Empty(inner) => Some(inner),
        }
    }
}
