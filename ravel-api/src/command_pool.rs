use crate::empty::RavelCommandPoolEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelCommandPoolVulkan;
use crate::*;

/// A pool of command buffers. Command buffers are reset together by resetting the pool, which
/// must only happen once the GPU finished executing them.
///
/// Command pools are not thread safe. Use one per thread that records.
pub enum RavelCommandPool {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelCommandPoolVulkan),
    Empty(RavelCommandPoolEmpty),
}

impl RavelCommandPool {
    pub fn create_command_buffer(
        &self,
        command_buffer_def: &RavelCommandBufferDef,
    ) -> RavelResult<RavelCommandBuffer> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandPool::Vk(inner) => {
                RavelCommandBuffer::Vk(inner.create_command_buffer(command_buffer_def)?)
            }
            RavelCommandPool::Empty(inner) => {
                RavelCommandBuffer::Empty(inner.create_command_buffer(command_buffer_def)?)
            }
        })
    }

    /// Resets every command buffer allocated from this pool
    pub fn reset_command_pool(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandPool::Vk(inner) => inner.reset_command_pool(),
            RavelCommandPool::Empty(inner) => inner.reset_command_pool(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_command_pool(&self) -> Option<&RavelCommandPoolVulkan> {
        match self {
            RavelCommandPool::Vk(inner) => Some(inner),
            RavelCommandPool::Empty(_) => None,
        }
    }

    pub fn empty_command_pool(&self) -> Option<&RavelCommandPoolEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelCommandPool::Vk(_) => None,
            RavelCommandPool::Empty(inner) => Some(inner),
        }
    }
}
