use super::util::*;
use super::*;
use crate::*;
use ash::vk;
use std::sync::Arc;

struct RavelDescriptorSetLayoutVulkanInner {
    device_context: RavelDeviceContextVulkan,
    descriptor_set_layout_def: RavelDescriptorSetLayoutDef,
    descriptor_set_layout: vk::DescriptorSetLayout,
}

impl Drop for RavelDescriptorSetLayoutVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}

#[derive(Clone)]
pub struct RavelDescriptorSetLayoutVulkan {
    inner: Arc<RavelDescriptorSetLayoutVulkanInner>,
}

impl std::fmt::Debug for RavelDescriptorSetLayoutVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelDescriptorSetLayoutVulkan")
            .field("descriptor_set_layout", &self.inner.descriptor_set_layout)
            .field(
                "descriptor_set_layout_def",
                &self.inner.descriptor_set_layout_def,
            )
            .finish()
    }
}

impl RavelDescriptorSetLayoutVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        descriptor_set_layout_def: &RavelDescriptorSetLayoutDef,
    ) -> RavelResult<Self> {
        descriptor_set_layout_def.validate()?;

        let bindings: Vec<_> = descriptor_set_layout_def
            .bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding)
                    .descriptor_type(descriptor_type_to_vk(binding.descriptor_type))
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::ALL)
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let descriptor_set_layout = unsafe {
            device_context
                .device()
                .create_descriptor_set_layout(&create_info, None)?
        };

        Ok(RavelDescriptorSetLayoutVulkan {
            inner: Arc::new(RavelDescriptorSetLayoutVulkanInner {
                device_context: device_context.clone(),
                descriptor_set_layout_def: descriptor_set_layout_def.clone(),
                descriptor_set_layout,
            }),
        })
    }

    pub fn descriptor_set_layout_def(&self) -> &RavelDescriptorSetLayoutDef {
        &self.inner.descriptor_set_layout_def
    }

    pub fn vk_descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.inner.descriptor_set_layout
    }
}

pub struct RavelDescriptorPoolVulkan {
    device_context: RavelDeviceContextVulkan,
    descriptor_pool: vk::DescriptorPool,
}

impl Drop for RavelDescriptorPoolVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_descriptor_pool(self.descriptor_pool, None);
        }
    }
}

impl RavelDescriptorPoolVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        descriptor_pool_def: &RavelDescriptorPoolDef,
    ) -> RavelResult<Self> {
        // Vulkan rejects pool sizes with a zero count
        let pool_sizes: Vec<_> = descriptor_pool_def
            .descriptor_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(descriptor_type, count)| vk::DescriptorPoolSize {
                ty: descriptor_type_to_vk(descriptor_type),
                descriptor_count: count,
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(descriptor_pool_def.max_sets)
            .pool_sizes(&pool_sizes);

        let descriptor_pool = unsafe {
            device_context
                .device()
                .create_descriptor_pool(&create_info, None)?
        };

        Ok(RavelDescriptorPoolVulkan {
            device_context: device_context.clone(),
            descriptor_pool,
        })
    }

    pub fn vk_descriptor_pool(&self) -> vk::DescriptorPool {
        self.descriptor_pool
    }

    pub fn allocate_descriptor_set(
        &self,
        descriptor_set_layout: &RavelDescriptorSetLayoutVulkan,
    ) -> RavelResult<RavelDescriptorSetVulkan> {
        let set_layouts = [descriptor_set_layout.vk_descriptor_set_layout()];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&set_layouts);

        let descriptor_sets = unsafe {
            self.device_context
                .device()
                .allocate_descriptor_sets(&allocate_info)?
        };

        Ok(RavelDescriptorSetVulkan {
            device_context: self.device_context.clone(),
            descriptor_set_layout: descriptor_set_layout.clone(),
            descriptor_set: descriptor_sets[0],
        })
    }

    pub fn reset_descriptor_pool(&self) -> RavelResult<()> {
        unsafe {
            self.device_context.device().reset_descriptor_pool(
                self.descriptor_pool,
                vk::DescriptorPoolResetFlags::empty(),
            )?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct RavelDescriptorSetVulkan {
    device_context: RavelDeviceContextVulkan,
    descriptor_set_layout: RavelDescriptorSetLayoutVulkan,
    descriptor_set: vk::DescriptorSet,
}

impl RavelDescriptorSetVulkan {
    pub fn vk_descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    pub fn update_descriptor_set(
        &self,
        descriptor_writes: &[RavelDescriptorWrite],
    ) -> RavelResult<()> {
        let layout_def = self.descriptor_set_layout.descriptor_set_layout_def();

        for write in descriptor_writes {
            let descriptor_type = write.resource.descriptor_type();
            let declared = layout_def
                .bindings
                .iter()
                .any(|b| b.binding == write.binding && b.descriptor_type == descriptor_type);
            if !declared {
                return Err(RavelError::ValidationFailure(format!(
                    "binding {} is not declared as {:?} in the descriptor set layout",
                    write.binding, descriptor_type
                )));
            }

            let mut image_infos = Vec::with_capacity(1);
            let mut buffer_infos = Vec::with_capacity(1);
            match write.resource {
                RavelDescriptorResource::SampledImage {
                    texture,
                    mip_slice,
                    layout,
                } => {
                    let texture = texture.vk_texture().unwrap();
                    let image_view = match mip_slice {
                        Some(mip_slice) => texture.vk_mip_view(mip_slice),
                        None => texture.vk_srv_view(),
                    };
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(image_view)
                            .image_layout(image_layout_to_vk(layout)),
                    );
                }
                RavelDescriptorResource::StorageImage { texture, mip_slice } => {
                    let texture = texture.vk_texture().unwrap();
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(texture.vk_mip_view(mip_slice))
                            .image_layout(vk::ImageLayout::GENERAL),
                    );
                }
                RavelDescriptorResource::Sampler(sampler) => {
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .sampler(sampler.vk_sampler().unwrap().vk_sampler()),
                    );
                }
                RavelDescriptorResource::UniformBuffer(buffer)
                | RavelDescriptorResource::StorageBuffer(buffer) => {
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(buffer.vk_buffer().unwrap().vk_buffer())
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    );
                }
            }

            let mut descriptor_write = vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_set)
                .dst_binding(write.binding)
                .dst_array_element(0)
                .descriptor_type(descriptor_type_to_vk(descriptor_type));

            if !image_infos.is_empty() {
                descriptor_write = descriptor_write.image_info(&image_infos);
            } else {
                descriptor_write = descriptor_write.buffer_info(&buffer_infos);
            }

            unsafe {
                self.device_context
                    .device()
                    .update_descriptor_sets(&[descriptor_write], &[]);
            }
        }

        Ok(())
    }
}
