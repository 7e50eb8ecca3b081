use super::*;
use crate::*;
use ash::vk;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct RavelFenceVulkan {
    device_context: RavelDeviceContextVulkan,
    vk_fence: vk::Fence,
    // Set to true when an operation is scheduled to signal this fence
    // Cleared when an operation is scheduled to consume this fence
    submitted: AtomicBool,
}

impl std::fmt::Debug for RavelFenceVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelFenceVulkan")
            .field("vk_fence", &self.vk_fence)
            .field("submitted", &self.submitted())
            .finish()
    }
}

impl Drop for RavelFenceVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_fence(self.vk_fence, None)
        }
    }
}

impl RavelFenceVulkan {
    pub fn new(device_context: &RavelDeviceContextVulkan) -> RavelResult<RavelFenceVulkan> {
        let create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::empty());

        let vk_fence = unsafe { device_context.device().create_fence(&create_info, None)? };

        Ok(RavelFenceVulkan {
            device_context: device_context.clone(),
            vk_fence,
            submitted: AtomicBool::new(false),
        })
    }

    pub fn vk_fence(&self) -> vk::Fence {
        self.vk_fence
    }

    pub(crate) fn submitted(&self) -> bool {
        self.submitted.load(Ordering::Relaxed)
    }

    pub(crate) fn set_submitted(
        &self,
        submitted: bool,
    ) {
        self.submitted.store(submitted, Ordering::Relaxed);
    }

    pub fn wait(&self) -> RavelResult<()> {
        Self::wait_for_fences(&self.device_context, &[self])
    }

    pub fn wait_for_fences(
        device_context: &RavelDeviceContextVulkan,
        fences: &[&RavelFenceVulkan],
    ) -> RavelResult<()> {
        let mut fence_list = Vec::with_capacity(fences.len());
        for fence in fences {
            if fence.submitted() {
                fence_list.push(fence.vk_fence());
            }
        }

        if !fence_list.is_empty() {
            let device = device_context.device();
            unsafe {
                device
                    .wait_for_fences(&fence_list, true, u64::MAX)
                    .map_err(|e| {
                        RavelError::SynchronizationFailure(format!("wait_for_fences: {:?}", e))
                    })?;
                device.reset_fences(&fence_list)?;
            }
        }

        for fence in fences {
            fence.set_submitted(false);
        }

        Ok(())
    }

    pub fn get_fence_status(&self) -> RavelResult<RavelFenceStatus> {
        if !self.submitted() {
            Ok(RavelFenceStatus::Unsubmitted)
        } else {
            let device = self.device_context.device();
            unsafe {
                let is_ready = device.get_fence_status(self.vk_fence)?;
                if is_ready {
                    device.reset_fences(&[self.vk_fence])?;
                    self.set_submitted(false);
                    Ok(RavelFenceStatus::Complete)
                } else {
                    Ok(RavelFenceStatus::Incomplete)
                }
            }
        }
    }
}

pub struct RavelSemaphoreVulkan {
    device_context: RavelDeviceContextVulkan,
    vk_semaphore: vk::Semaphore,
    // Set to true when an operation is scheduled to signal this semaphore
    // Cleared when an operation is scheduled to consume this semaphore
    signal_available: AtomicBool,
}

impl std::fmt::Debug for RavelSemaphoreVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelSemaphoreVulkan")
            .field("vk_semaphore", &self.vk_semaphore)
            .finish()
    }
}

impl Drop for RavelSemaphoreVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_semaphore(self.vk_semaphore, None)
        }
    }
}

impl RavelSemaphoreVulkan {
    pub fn new(device_context: &RavelDeviceContextVulkan) -> RavelResult<RavelSemaphoreVulkan> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let vk_semaphore = unsafe {
            device_context
                .device()
                .create_semaphore(&create_info, None)?
        };

        Ok(RavelSemaphoreVulkan {
            device_context: device_context.clone(),
            vk_semaphore,
            signal_available: AtomicBool::new(false),
        })
    }

    pub fn vk_semaphore(&self) -> vk::Semaphore {
        self.vk_semaphore
    }

    pub fn signal_available(&self) -> bool {
        self.signal_available.load(Ordering::Relaxed)
    }

    pub fn set_signal_available(
        &self,
        available: bool,
    ) {
        self.signal_available.store(available, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug)]
pub struct RavelQueueVulkan {
    device_context: RavelDeviceContextVulkan,
    queue_type: RavelQueueType,
}

impl RavelQueueVulkan {
    pub(crate) fn new(
        device_context: &RavelDeviceContextVulkan,
        queue_type: RavelQueueType,
    ) -> Self {
        RavelQueueVulkan {
            device_context: device_context.clone(),
            queue_type,
        }
    }

    pub fn device_context(&self) -> &RavelDeviceContextVulkan {
        &self.device_context
    }

    pub fn queue_type(&self) -> RavelQueueType {
        self.queue_type
    }

    /// Locks the queue. Hold the guard while calling vulkan functions that use it (for example
    /// `vkQueuePresentKHR` from a present target).
    pub fn vk_queue(&self) -> std::sync::MutexGuard<vk::Queue> {
        self.device_context.vk_queue()
    }

    pub fn create_command_pool(
        &self,
        command_pool_def: &RavelCommandPoolDef,
    ) -> RavelResult<RavelCommandPoolVulkan> {
        RavelCommandPoolVulkan::new(&self.device_context, command_pool_def)
    }

    pub fn wait_for_queue_idle(&self) -> RavelResult<()> {
        let queue = self.device_context.vk_queue();
        unsafe {
            self.device_context
                .device()
                .queue_wait_idle(*queue)
                .map_err(|e| {
                    RavelError::SynchronizationFailure(format!("queue_wait_idle: {:?}", e))
                })?;
        }

        Ok(())
    }

    pub fn submit(
        &self,
        command_buffers: &[&RavelCommandBufferVulkan],
        wait_semaphores: &[&RavelSemaphoreVulkan],
        signal_semaphores: &[&RavelSemaphoreVulkan],
        signal_fence: Option<&RavelFenceVulkan>,
    ) -> RavelResult<()> {
        let mut command_buffer_list = Vec::with_capacity(command_buffers.len());
        for command_buffer in command_buffers {
            command_buffer_list.push(command_buffer.vk_command_buffer());
        }

        let mut wait_semaphore_list = Vec::with_capacity(wait_semaphores.len());
        let mut wait_dst_stage_mask = Vec::with_capacity(wait_semaphores.len());
        for wait_semaphore in wait_semaphores {
            // Don't wait on a semaphore that will never signal
            if wait_semaphore.signal_available() {
                wait_semaphore_list.push(wait_semaphore.vk_semaphore());
                wait_dst_stage_mask.push(vk::PipelineStageFlags::ALL_COMMANDS);

                wait_semaphore.set_signal_available(false);
            }
        }

        let mut signal_semaphore_list = Vec::with_capacity(signal_semaphores.len());
        for signal_semaphore in signal_semaphores {
            // Don't signal a semaphore if something is already going to signal it
            if !signal_semaphore.signal_available() {
                signal_semaphore_list.push(signal_semaphore.vk_semaphore());
                signal_semaphore.set_signal_available(true);
            }
        }

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphore_list)
            .wait_dst_stage_mask(&wait_dst_stage_mask)
            .signal_semaphores(&signal_semaphore_list)
            .command_buffers(&command_buffer_list);

        let fence = signal_fence
            .map(|x| x.vk_fence())
            .unwrap_or(vk::Fence::null());
        unsafe {
            let queue = self.device_context.vk_queue();
            log::trace!(
                "submit {} command buffers to queue {:?}",
                command_buffer_list.len(),
                *queue
            );
            self.device_context
                .device()
                .queue_submit(*queue, &[submit_info], fence)
                .map_err(|e| RavelError::SynchronizationFailure(format!("queue_submit: {:?}", e)))?;
        }

        if let Some(signal_fence) = signal_fence {
            signal_fence.set_submitted(true);
        }

        Ok(())
    }
}
