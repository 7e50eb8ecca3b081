use crate::empty::RavelSemaphoreEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelSemaphoreVulkan;

/// A GPU -> GPU synchronization mechanism. A semaphore is signaled by one submission and waited
/// on by a later submission or by presentation.
///
/// Semaphores must not be dropped if they are in use by the GPU.
#[derive(Debug)]
pub enum RavelSemaphore {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelSemaphoreVulkan),
    Empty(RavelSemaphoreEmpty),
}

impl RavelSemaphore {
    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_semaphore(&self) -> Option<&RavelSemaphoreVulkan> {
        match self {
            RavelSemaphore::Vk(inner) => Some(inner),
            RavelSemaphore::Empty(_) => None,
        }
    }

    pub fn empty_semaphore(&self) -> Option<&RavelSemaphoreEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelSemaphore::Vk(_) => None,
            RavelSemaphore::Empty(inner) => Some(inner),
        }
    }
}
