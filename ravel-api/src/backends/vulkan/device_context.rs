use super::*;
use crate::*;
use ash::vk;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handles to a device the application already created. The device must be Vulkan 1.3 with
/// `synchronization2` and `dynamicRendering` enabled. The application destroys the device, after
/// every object created through the context has been dropped.
#[derive(Clone)]
pub struct RavelApiDefVulkan {
    pub instance: ash::Instance,
    pub device: ash::Device,
    pub physical_device: vk::PhysicalDevice,
    pub queue_family_index: u32,
    pub queue_index: u32,
}

pub struct RavelDeviceContextVulkanInner {
    device_info: RavelDeviceInfo,
    // Declared before device so it is dropped while the device is still alive
    allocator: vk_mem::Allocator,
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    queue_family_index: u32,
    queue: Mutex<vk::Queue>,
}

#[derive(Clone)]
pub struct RavelDeviceContextVulkan {
    inner: Arc<RavelDeviceContextVulkanInner>,
}

impl std::fmt::Debug for RavelDeviceContextVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelDeviceContextVulkan")
            .field("physical_device", &self.inner.physical_device)
            .field("queue_family_index", &self.inner.queue_family_index)
            .finish()
    }
}

impl RavelDeviceContextVulkan {
    pub fn new(api_def: &RavelApiDefVulkan) -> RavelResult<Self> {
        let properties = unsafe {
            api_def
                .instance
                .get_physical_device_properties(api_def.physical_device)
        };

        let queue_family_properties = unsafe {
            api_def
                .instance
                .get_physical_device_queue_family_properties(api_def.physical_device)
        };

        let supports_timestamps = queue_family_properties
            .get(api_def.queue_family_index as usize)
            .map(|x| x.timestamp_valid_bits > 0)
            .unwrap_or(false);

        let device_info = RavelDeviceInfo {
            timestamp_period_ns: properties.limits.timestamp_period,
            supports_timestamps,
            min_uniform_buffer_offset_alignment: properties
                .limits
                .min_uniform_buffer_offset_alignment
                as u32,
            min_storage_buffer_offset_alignment: properties
                .limits
                .min_storage_buffer_offset_alignment
                as u32,
        };

        let mut allocator_create_info = vk_mem::AllocatorCreateInfo::new(
            &api_def.instance,
            &api_def.device,
            api_def.physical_device,
        );
        allocator_create_info.vulkan_api_version = vk::API_VERSION_1_3;
        let allocator = unsafe { vk_mem::Allocator::new(allocator_create_info)? };

        let queue = unsafe {
            api_def
                .device
                .get_device_queue(api_def.queue_family_index, api_def.queue_index)
        };

        log::debug!(
            "Created vulkan device context on queue family {} (timestamps supported: {})",
            api_def.queue_family_index,
            supports_timestamps
        );

        Ok(RavelDeviceContextVulkan {
            inner: Arc::new(RavelDeviceContextVulkanInner {
                device_info,
                allocator,
                device: api_def.device.clone(),
                physical_device: api_def.physical_device,
                queue_family_index: api_def.queue_family_index,
                queue: Mutex::new(queue),
            }),
        })
    }

    pub fn device_info(&self) -> &RavelDeviceInfo {
        &self.inner.device_info
    }

    pub fn device(&self) -> &ash::Device {
        &self.inner.device
    }

    pub fn allocator(&self) -> &vk_mem::Allocator {
        &self.inner.allocator
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.inner.physical_device
    }

    pub fn queue_family_index(&self) -> u32 {
        self.inner.queue_family_index
    }

    pub(crate) fn vk_queue(&self) -> MutexGuard<vk::Queue> {
        self.inner.queue.lock().unwrap()
    }

    pub fn create_queue(
        &self,
        queue_type: RavelQueueType,
    ) -> RavelResult<RavelQueueVulkan> {
        Ok(RavelQueueVulkan::new(self, queue_type))
    }

    pub fn create_fence(&self) -> RavelResult<RavelFenceVulkan> {
        RavelFenceVulkan::new(self)
    }

    pub fn create_semaphore(&self) -> RavelResult<RavelSemaphoreVulkan> {
        RavelSemaphoreVulkan::new(self)
    }

    pub fn create_texture(
        &self,
        texture_def: &RavelTextureDef,
    ) -> RavelResult<RavelTextureVulkan> {
        RavelTextureVulkan::new(self, texture_def)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<RavelBufferVulkan> {
        RavelBufferVulkan::new(self, buffer_def)
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<RavelSamplerVulkan> {
        RavelSamplerVulkan::new(self, sampler_def)
    }

    pub fn create_descriptor_set_layout(
        &self,
        descriptor_set_layout_def: &RavelDescriptorSetLayoutDef,
    ) -> RavelResult<RavelDescriptorSetLayoutVulkan> {
        RavelDescriptorSetLayoutVulkan::new(self, descriptor_set_layout_def)
    }

    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RavelDescriptorPoolDef,
    ) -> RavelResult<RavelDescriptorPoolVulkan> {
        RavelDescriptorPoolVulkan::new(self, descriptor_pool_def)
    }

    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RavelComputePipelineDef,
    ) -> RavelResult<RavelPipelineVulkan> {
        RavelPipelineVulkan::new_compute_pipeline(self, compute_pipeline_def)
    }

    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RavelGraphicsPipelineDef,
    ) -> RavelResult<RavelPipelineVulkan> {
        RavelPipelineVulkan::new_graphics_pipeline(self, graphics_pipeline_def)
    }

    pub fn create_query_pool(
        &self,
        query_pool_def: &RavelQueryPoolDef,
    ) -> RavelResult<RavelQueryPoolVulkan> {
        RavelQueryPoolVulkan::new(self, query_pool_def)
    }

    pub fn wait_for_fences(
        &self,
        fences: &[&RavelFenceVulkan],
    ) -> RavelResult<()> {
        RavelFenceVulkan::wait_for_fences(self, fences)
    }

    pub fn wait_for_device_idle(&self) -> RavelResult<()> {
        unsafe {
            self.inner.device.device_wait_idle()?;
        }

        Ok(())
    }
}
