use super::util::*;
use super::*;
use crate::*;
use ash::vk;

pub struct RavelCommandPoolVulkan {
    device_context: RavelDeviceContextVulkan,
    vk_command_pool: vk::CommandPool,
}

impl Drop for RavelCommandPoolVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_command_pool(self.vk_command_pool, None);
        }
    }
}

impl RavelCommandPoolVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        command_pool_def: &RavelCommandPoolDef,
    ) -> RavelResult<RavelCommandPoolVulkan> {
        let mut flags = vk::CommandPoolCreateFlags::empty();
        if command_pool_def.transient {
            flags |= vk::CommandPoolCreateFlags::TRANSIENT;
        }

        let create_info = vk::CommandPoolCreateInfo::default()
            .flags(flags)
            .queue_family_index(device_context.queue_family_index());

        let vk_command_pool = unsafe {
            device_context
                .device()
                .create_command_pool(&create_info, None)?
        };

        Ok(RavelCommandPoolVulkan {
            device_context: device_context.clone(),
            vk_command_pool,
        })
    }

    pub fn vk_command_pool(&self) -> vk::CommandPool {
        self.vk_command_pool
    }

    pub fn create_command_buffer(
        &self,
        command_buffer_def: &RavelCommandBufferDef,
    ) -> RavelResult<RavelCommandBufferVulkan> {
        RavelCommandBufferVulkan::new(self, command_buffer_def)
    }

    pub fn reset_command_pool(&self) -> RavelResult<()> {
        unsafe {
            self.device_context
                .device()
                .reset_command_pool(self.vk_command_pool, vk::CommandPoolResetFlags::empty())?;
        }
        Ok(())
    }
}

/// Freed along with the pool it was allocated from
pub struct RavelCommandBufferVulkan {
    device_context: RavelDeviceContextVulkan,
    vk_command_buffer: vk::CommandBuffer,
    is_secondary: bool,
}

impl std::fmt::Debug for RavelCommandBufferVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelCommandBufferVulkan")
            .field("vk_command_buffer", &self.vk_command_buffer)
            .field("is_secondary", &self.is_secondary)
            .finish()
    }
}

impl RavelCommandBufferVulkan {
    pub(crate) fn new(
        command_pool: &RavelCommandPoolVulkan,
        command_buffer_def: &RavelCommandBufferDef,
    ) -> RavelResult<RavelCommandBufferVulkan> {
        let level = if command_buffer_def.is_secondary {
            vk::CommandBufferLevel::SECONDARY
        } else {
            vk::CommandBufferLevel::PRIMARY
        };

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool.vk_command_pool())
            .level(level)
            .command_buffer_count(1);

        let command_buffers = unsafe {
            command_pool
                .device_context
                .device()
                .allocate_command_buffers(&allocate_info)?
        };

        Ok(RavelCommandBufferVulkan {
            device_context: command_pool.device_context.clone(),
            vk_command_buffer: command_buffers[0],
            is_secondary: command_buffer_def.is_secondary,
        })
    }

    pub fn vk_command_buffer(&self) -> vk::CommandBuffer {
        self.vk_command_buffer
    }

    pub fn begin(&self) -> RavelResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device_context
                .device()
                .begin_command_buffer(self.vk_command_buffer, &begin_info)?;
        }

        Ok(())
    }

    pub fn begin_secondary(
        &self,
        inheritance: &RavelRenderingInheritanceDef,
    ) -> RavelResult<()> {
        if !self.is_secondary {
            return Err(RavelError::ValidationFailure(
                "begin_secondary called on a primary command buffer".to_string(),
            ));
        }

        let color_formats: Vec<_> = inheritance
            .color_formats
            .iter()
            .map(|x| format_to_vk(*x))
            .collect();
        let depth_format = inheritance
            .depth_format
            .map(format_to_vk)
            .unwrap_or(vk::Format::UNDEFINED);
        let stencil_format = inheritance
            .depth_format
            .filter(|x| x.has_stencil())
            .map(format_to_vk)
            .unwrap_or(vk::Format::UNDEFINED);

        let mut rendering_inheritance = vk::CommandBufferInheritanceRenderingInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(depth_format)
            .stencil_attachment_format(stencil_format)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let inheritance_info =
            vk::CommandBufferInheritanceInfo::default().push_next(&mut rendering_inheritance);

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(
                vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT
                    | vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE,
            )
            .inheritance_info(&inheritance_info);

        unsafe {
            self.device_context
                .device()
                .begin_command_buffer(self.vk_command_buffer, &begin_info)?;
        }

        Ok(())
    }

    pub fn end(&self) -> RavelResult<()> {
        unsafe {
            self.device_context
                .device()
                .end_command_buffer(self.vk_command_buffer)?;
        }

        Ok(())
    }

    pub fn cmd_resource_barrier(
        &self,
        buffer_barriers: &[RavelBufferBarrier],
        texture_barriers: &[RavelTextureBarrier],
    ) -> RavelResult<()> {
        let mut vk_buffer_barriers = Vec::with_capacity(buffer_barriers.len());
        for barrier in buffer_barriers {
            let buffer = barrier.buffer.vk_buffer().unwrap();
            vk_buffer_barriers.push(
                vk::BufferMemoryBarrier2::default()
                    .src_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                    .dst_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                    .src_access_mask(access_flags_to_vk(barrier.src_access))
                    .dst_access_mask(access_flags_to_vk(barrier.dst_access))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(buffer.vk_buffer())
                    .offset(0)
                    .size(vk::WHOLE_SIZE),
            );
        }

        let mut vk_image_barriers = Vec::with_capacity(texture_barriers.len());
        for barrier in texture_barriers {
            let texture = barrier.texture.vk_texture().unwrap();
            let subresource_range = vk::ImageSubresourceRange {
                aspect_mask: barrier_aspect_mask(texture.texture_def().format),
                base_mip_level: barrier.base_mip_level,
                level_count: barrier.mip_level_count,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            };

            vk_image_barriers.push(
                vk::ImageMemoryBarrier2::default()
                    .src_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                    .dst_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
                    .src_access_mask(access_flags_to_vk(barrier.src_access))
                    .dst_access_mask(access_flags_to_vk(barrier.dst_access))
                    .old_layout(image_layout_to_vk(barrier.src_layout))
                    .new_layout(image_layout_to_vk(barrier.dst_layout))
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(texture.vk_image())
                    .subresource_range(subresource_range),
            );
        }

        let dependency_info = vk::DependencyInfo::default()
            .buffer_memory_barriers(&vk_buffer_barriers)
            .image_memory_barriers(&vk_image_barriers);

        unsafe {
            self.device_context
                .device()
                .cmd_pipeline_barrier2(self.vk_command_buffer, &dependency_info);
        }

        Ok(())
    }

    pub fn cmd_begin_rendering(
        &self,
        rendering_def: &RavelRenderingDef,
    ) -> RavelResult<()> {
        let color_attachments: Vec<_> = rendering_def
            .color_attachments
            .iter()
            .map(|attachment| {
                let texture = attachment.texture.vk_texture().unwrap();
                vk::RenderingAttachmentInfo::default()
                    .image_view(texture.vk_mip_view(attachment.mip_slice))
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(load_op_to_vk(attachment.load_op))
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .clear_value(vk::ClearValue {
                        color: vk::ClearColorValue {
                            float32: attachment.clear_value.0,
                        },
                    })
            })
            .collect();

        let depth_attachment = rendering_def.depth_attachment.as_ref().map(|attachment| {
            let texture = attachment.texture.vk_texture().unwrap();
            let info = vk::RenderingAttachmentInfo::default()
                .image_view(texture.vk_mip_view(0))
                .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .load_op(load_op_to_vk(attachment.load_op))
                .store_op(vk::AttachmentStoreOp::STORE)
                .clear_value(vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: attachment.clear_value.depth,
                        stencil: attachment.clear_value.stencil,
                    },
                });
            (info, texture.texture_def().format.has_stencil())
        });

        let flags = if rendering_def.secondary_contents {
            vk::RenderingFlags::CONTENTS_SECONDARY_COMMAND_BUFFERS
        } else {
            vk::RenderingFlags::empty()
        };

        let mut rendering_info = vk::RenderingInfo::default()
            .flags(flags)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: rendering_def.extents.width,
                    height: rendering_def.extents.height,
                },
            })
            .layer_count(1)
            .color_attachments(&color_attachments);

        if let Some((depth_attachment, has_stencil)) = depth_attachment.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth_attachment);
            if *has_stencil {
                rendering_info = rendering_info.stencil_attachment(depth_attachment);
            }
        }

        unsafe {
            self.device_context
                .device()
                .cmd_begin_rendering(self.vk_command_buffer, &rendering_info);
        }

        Ok(())
    }

    pub fn cmd_end_rendering(&self) -> RavelResult<()> {
        unsafe {
            self.device_context
                .device()
                .cmd_end_rendering(self.vk_command_buffer);
        }

        Ok(())
    }

    pub fn cmd_set_viewport_and_scissor(
        &self,
        extents: RavelExtents2D,
    ) -> RavelResult<()> {
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extents.width as f32,
            height: extents.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: extents.width,
                height: extents.height,
            },
        };

        unsafe {
            let device = self.device_context.device();
            device.cmd_set_viewport(self.vk_command_buffer, 0, &[viewport]);
            device.cmd_set_scissor(self.vk_command_buffer, 0, &[scissor]);
        }

        Ok(())
    }

    pub fn cmd_bind_pipeline(
        &self,
        pipeline: &RavelPipelineVulkan,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_bind_pipeline(
                self.vk_command_buffer,
                pipeline.vk_bind_point(),
                pipeline.vk_pipeline(),
            );
        }

        Ok(())
    }

    pub fn cmd_bind_descriptor_set(
        &self,
        pipeline: &RavelPipelineVulkan,
        descriptor_set: &RavelDescriptorSetVulkan,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_bind_descriptor_sets(
                self.vk_command_buffer,
                pipeline.vk_bind_point(),
                pipeline.vk_pipeline_layout(),
                0,
                &[descriptor_set.vk_descriptor_set()],
                &[],
            );
        }

        Ok(())
    }

    pub fn cmd_dispatch(
        &self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_dispatch(
                self.vk_command_buffer,
                group_count_x,
                group_count_y,
                group_count_z,
            );
        }

        Ok(())
    }

    pub fn cmd_draw(
        &self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_draw(
                self.vk_command_buffer,
                vertex_count,
                1,
                first_vertex,
                0,
            );
        }

        Ok(())
    }

    pub fn cmd_execute_secondary(
        &self,
        command_buffers: &[&RavelCommandBufferVulkan],
    ) -> RavelResult<()> {
        let vk_command_buffers: Vec<_> = command_buffers
            .iter()
            .map(|x| x.vk_command_buffer())
            .collect();

        unsafe {
            self.device_context
                .device()
                .cmd_execute_commands(self.vk_command_buffer, &vk_command_buffers);
        }

        Ok(())
    }

    pub fn cmd_reset_query_pool(
        &self,
        query_pool: &RavelQueryPoolVulkan,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_reset_query_pool(
                self.vk_command_buffer,
                query_pool.vk_query_pool(),
                first_query,
                query_count,
            );
        }

        Ok(())
    }

    pub fn cmd_write_timestamp(
        &self,
        query_pool: &RavelQueryPoolVulkan,
        query_index: u32,
    ) -> RavelResult<()> {
        unsafe {
            self.device_context.device().cmd_write_timestamp2(
                self.vk_command_buffer,
                vk::PipelineStageFlags2::ALL_COMMANDS,
                query_pool.vk_query_pool(),
                query_index,
            );
        }

        Ok(())
    }
}
