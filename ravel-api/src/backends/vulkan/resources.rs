use super::util::*;
use super::*;
use crate::*;
use ash::vk;
use std::sync::Arc;
use vk_mem::Alloc;

struct RavelTextureVulkanInner {
    device_context: RavelDeviceContextVulkan,
    texture_def: RavelTextureDef,
    image: vk::Image,
    allocation: vk_mem::Allocation,
    // View of all mips, used for sampling
    srv_view: vk::ImageView,
    // One view per mip level, used for storage writes and attachments
    mip_views: Vec<vk::ImageView>,
}

impl Drop for RavelTextureVulkanInner {
    fn drop(&mut self) {
        let device = self.device_context.device();
        unsafe {
            for view in self.mip_views.drain(..) {
                device.destroy_image_view(view, None);
            }

            if self.srv_view != vk::ImageView::null() {
                device.destroy_image_view(self.srv_view, None);
            }

            self.device_context
                .allocator()
                .destroy_image(self.image, &mut self.allocation);
        }
    }
}

#[derive(Clone)]
pub struct RavelTextureVulkan {
    inner: Arc<RavelTextureVulkanInner>,
}

impl std::fmt::Debug for RavelTextureVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelTextureVulkan")
            .field("image", &self.inner.image)
            .field("texture_def", &self.inner.texture_def)
            .finish()
    }
}

// The allocation is only touched through the allocator, which is internally synchronized
unsafe impl Send for RavelTextureVulkanInner {}
unsafe impl Sync for RavelTextureVulkanInner {}

impl RavelTextureVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        texture_def: &RavelTextureDef,
    ) -> RavelResult<RavelTextureVulkan> {
        texture_def.validate()?;

        let (image_type, view_type, mip_view_type) = match texture_def.dimensions {
            RavelTextureDimensions::Dim1D => (
                vk::ImageType::TYPE_1D,
                vk::ImageViewType::TYPE_1D,
                vk::ImageViewType::TYPE_1D,
            ),
            RavelTextureDimensions::Dim2D => (
                vk::ImageType::TYPE_2D,
                vk::ImageViewType::TYPE_2D,
                vk::ImageViewType::TYPE_2D,
            ),
            RavelTextureDimensions::Dim3D => (
                vk::ImageType::TYPE_3D,
                vk::ImageViewType::TYPE_3D,
                vk::ImageViewType::TYPE_3D,
            ),
            RavelTextureDimensions::Cube => (
                vk::ImageType::TYPE_2D,
                vk::ImageViewType::CUBE,
                vk::ImageViewType::TYPE_2D_ARRAY,
            ),
        };

        let flags = if texture_def.dimensions == RavelTextureDimensions::Cube {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let format = format_to_vk(texture_def.format);
        let image_create_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(image_type)
            .format(format)
            .extent(vk::Extent3D {
                width: texture_def.extents.width,
                height: texture_def.extents.height,
                depth: texture_def.extents.depth,
            })
            .mip_levels(texture_def.mip_count)
            .array_layers(texture_def.array_length())
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(texture_usage_to_vk(texture_def.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let allocation_create_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };

        let (image, allocation) = unsafe {
            device_context
                .allocator()
                .create_image(&image_create_info, &allocation_create_info)?
        };

        // From here on, dropping inner cleans up whatever was created
        let mut inner = RavelTextureVulkanInner {
            device_context: device_context.clone(),
            texture_def: texture_def.clone(),
            image,
            allocation,
            srv_view: vk::ImageView::null(),
            mip_views: Vec::with_capacity(texture_def.mip_count as usize),
        };

        let aspect_mask = view_aspect_mask(texture_def.format);
        let create_view = |view_type: vk::ImageViewType,
                           base_mip_level: u32,
                           level_count: u32|
         -> RavelResult<vk::ImageView> {
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level,
                    level_count,
                    base_array_layer: 0,
                    layer_count: texture_def.array_length(),
                });

            Ok(unsafe {
                device_context
                    .device()
                    .create_image_view(&view_create_info, None)?
            })
        };

        inner.srv_view = create_view(view_type, 0, texture_def.mip_count)?;
        for mip_level in 0..texture_def.mip_count {
            let view = create_view(mip_view_type, mip_level, 1)?;
            inner.mip_views.push(view);
        }

        Ok(RavelTextureVulkan {
            inner: Arc::new(inner),
        })
    }

    pub fn texture_def(&self) -> &RavelTextureDef {
        &self.inner.texture_def
    }

    pub fn vk_image(&self) -> vk::Image {
        self.inner.image
    }

    pub fn vk_srv_view(&self) -> vk::ImageView {
        self.inner.srv_view
    }

    pub fn vk_mip_view(
        &self,
        mip_level: u32,
    ) -> vk::ImageView {
        self.inner.mip_views[mip_level as usize]
    }
}

struct RavelBufferVulkanInner {
    device_context: RavelDeviceContextVulkan,
    buffer_def: RavelBufferDef,
    buffer: vk::Buffer,
    allocation: vk_mem::Allocation,
    mapped_memory: Option<*mut u8>,
}

// The mapped pointer is only written through copy_to_host_visible_buffer, and callers must not
// write a buffer the GPU is reading
unsafe impl Send for RavelBufferVulkanInner {}
unsafe impl Sync for RavelBufferVulkanInner {}

impl Drop for RavelBufferVulkanInner {
    fn drop(&mut self) {
        let allocator = self.device_context.allocator();
        unsafe {
            if self.mapped_memory.is_some() {
                allocator.unmap_memory(&mut self.allocation);
            }

            allocator.destroy_buffer(self.buffer, &mut self.allocation);
        }
    }
}

#[derive(Clone)]
pub struct RavelBufferVulkan {
    inner: Arc<RavelBufferVulkanInner>,
}

impl std::fmt::Debug for RavelBufferVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelBufferVulkan")
            .field("buffer", &self.inner.buffer)
            .field("buffer_def", &self.inner.buffer_def)
            .finish()
    }
}

impl RavelBufferVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<RavelBufferVulkan> {
        buffer_def.validate()?;

        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(buffer_def.size)
            .usage(buffer_usage_to_vk(buffer_def.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let allocation_create_info = match buffer_def.memory_usage {
            RavelMemoryUsage::GpuOnly => vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferDevice,
                ..Default::default()
            },
            RavelMemoryUsage::CpuToGpu => vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::Auto,
                flags: vk_mem::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE,
                ..Default::default()
            },
        };

        let allocator = device_context.allocator();
        let (buffer, allocation) =
            unsafe { allocator.create_buffer(&buffer_create_info, &allocation_create_info)? };

        let mut inner = RavelBufferVulkanInner {
            device_context: device_context.clone(),
            buffer_def: buffer_def.clone(),
            buffer,
            allocation,
            mapped_memory: None,
        };

        if buffer_def.memory_usage == RavelMemoryUsage::CpuToGpu {
            let mapped = unsafe { allocator.map_memory(&mut inner.allocation)? };
            inner.mapped_memory = Some(mapped);
        }

        Ok(RavelBufferVulkan {
            inner: Arc::new(inner),
        })
    }

    pub fn buffer_def(&self) -> &RavelBufferDef {
        &self.inner.buffer_def
    }

    pub fn vk_buffer(&self) -> vk::Buffer {
        self.inner.buffer
    }

    pub fn copy_to_host_visible_buffer_with_offset(
        &self,
        data: &[u8],
        buffer_byte_offset: u64,
    ) -> RavelResult<()> {
        let mapped_memory = self.inner.mapped_memory.ok_or_else(|| {
            RavelError::ValidationFailure("buffer is not host visible".to_string())
        })?;

        let end = buffer_byte_offset + data.len() as u64;
        if end > self.inner.buffer_def.size {
            return Err(RavelError::ValidationFailure(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                buffer_byte_offset,
                self.inner.buffer_def.size
            )));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_memory.add(buffer_byte_offset as usize),
                data.len(),
            );

            self.inner.device_context.allocator().flush_allocation(
                &self.inner.allocation,
                buffer_byte_offset,
                data.len() as vk::DeviceSize,
            )?;
        }

        Ok(())
    }
}

struct RavelSamplerVulkanInner {
    device_context: RavelDeviceContextVulkan,
    sampler: vk::Sampler,
}

impl Drop for RavelSamplerVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_sampler(self.sampler, None);
        }
    }
}

#[derive(Clone)]
pub struct RavelSamplerVulkan {
    inner: Arc<RavelSamplerVulkanInner>,
}

impl std::fmt::Debug for RavelSamplerVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelSamplerVulkan")
            .field("sampler", &self.inner.sampler)
            .finish()
    }
}

impl RavelSamplerVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<RavelSamplerVulkan> {
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(sampler_def.mag_filter))
            .min_filter(filter_to_vk(sampler_def.min_filter))
            .mipmap_mode(mip_filter_to_vk(sampler_def.mip_filter))
            .address_mode_u(address_mode_to_vk(sampler_def.address_mode_u))
            .address_mode_v(address_mode_to_vk(sampler_def.address_mode_v))
            .address_mode_w(address_mode_to_vk(sampler_def.address_mode_w))
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        let sampler = unsafe {
            device_context
                .device()
                .create_sampler(&create_info, None)?
        };

        Ok(RavelSamplerVulkan {
            inner: Arc::new(RavelSamplerVulkanInner {
                device_context: device_context.clone(),
                sampler,
            }),
        })
    }

    pub fn vk_sampler(&self) -> vk::Sampler {
        self.inner.sampler
    }
}
