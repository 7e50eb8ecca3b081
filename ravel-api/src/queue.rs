use crate::empty::RavelQueueEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelQueueVulkan;
use crate::*;

/// A queue allows work to be submitted to the GPU
///
/// Work submitted to the same queue executes in submission order with respect to barriers and
/// semaphores. A mutex inside the backend protects against multiple threads submitting at the
/// same time.
#[derive(Clone, Debug)]
pub enum RavelQueue {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelQueueVulkan),
    Empty(RavelQueueEmpty),
}

impl RavelQueue {
    pub fn device_context(&self) -> RavelDeviceContext {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(inner) => RavelDeviceContext::Vk(inner.device_context().clone()),
            RavelQueue::Empty(inner) => RavelDeviceContext::Empty(inner.device_context().clone()),
        }
    }

    pub fn queue_type(&self) -> RavelQueueType {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(inner) => inner.queue_type(),
            RavelQueue::Empty(inner) => inner.queue_type(),
        }
    }

    /// Create a command pool for use with this queue
    pub fn create_command_pool(
        &self,
        command_pool_def: &RavelCommandPoolDef,
    ) -> RavelResult<RavelCommandPool> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(inner) => {
                RavelCommandPool::Vk(inner.create_command_pool(command_pool_def)?)
            }
            RavelQueue::Empty(inner) => {
                RavelCommandPool::Empty(inner.create_command_pool(command_pool_def)?)
            }
        })
    }

    /// Submit command buffers for processing by the GPU.
    ///
    /// Execution will not begin until all wait semaphores are signaled.
    ///
    /// Once complete, the signal semaphores and signal fence will be signaled.
    pub fn submit(
        &self,
        command_buffers: &[&RavelCommandBuffer],
        wait_semaphores: &[&RavelSemaphore],
        signal_semaphores: &[&RavelSemaphore],
        signal_fence: Option<&RavelFence>,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(inner) => {
                let command_buffers: Vec<_> = command_buffers
                    .iter()
                    .map(|x| x.vk_command_buffer().unwrap())
                    .collect();
                let wait_semaphores: Vec<_> = wait_semaphores
                    .iter()
                    .map(|x| x.vk_semaphore().unwrap())
                    .collect();
                let signal_semaphores: Vec<_> = signal_semaphores
                    .iter()
                    .map(|x| x.vk_semaphore().unwrap())
                    .collect();
                inner.submit(
                    &command_buffers,
                    &wait_semaphores,
                    &signal_semaphores,
                    signal_fence.map(|x| x.vk_fence().unwrap()),
                )
            }
            RavelQueue::Empty(inner) => {
                let command_buffers: Vec<_> = command_buffers
                    .iter()
                    .map(|x| x.empty_command_buffer().unwrap())
                    .collect();
                let wait_semaphores: Vec<_> = wait_semaphores
                    .iter()
                    .map(|x| x.empty_semaphore().unwrap())
                    .collect();
                let signal_semaphores: Vec<_> = signal_semaphores
                    .iter()
                    .map(|x| x.empty_semaphore().unwrap())
                    .collect();
                inner.submit(
                    &command_buffers,
                    &wait_semaphores,
                    &signal_semaphores,
                    signal_fence.map(|x| x.empty_fence().unwrap()),
                )
            }
        }
    }

    /// Wait until all work submitted to this queue completes
    pub fn wait_for_queue_idle(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(inner) => inner.wait_for_queue_idle(),
            RavelQueue::Empty(inner) => inner.wait_for_queue_idle(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_queue(&self) -> Option<&RavelQueueVulkan> {
        match self {
            RavelQueue::Vk(inner) => Some(inner),
            RavelQueue::Empty(_) => None,
        }
    }

    pub fn empty_queue(&self) -> Option<&RavelQueueEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueue::Vk(_) => None,
            RavelQueue::Empty(inner) => Some(inner),
        }
    }
}
