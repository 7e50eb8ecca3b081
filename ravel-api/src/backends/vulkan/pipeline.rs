use super::util::*;
use super::*;
use crate::*;
use ash::vk;
use std::ffi::CString;
use std::sync::Arc;

struct RavelPipelineVulkanInner {
    device_context: RavelDeviceContextVulkan,
    pipeline_type: RavelPipelineType,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

impl Drop for RavelPipelineVulkanInner {
    fn drop(&mut self) {
        let device = self.device_context.device();
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

#[derive(Clone)]
pub struct RavelPipelineVulkan {
    inner: Arc<RavelPipelineVulkanInner>,
}

impl std::fmt::Debug for RavelPipelineVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelPipelineVulkan")
            .field("pipeline_type", &self.inner.pipeline_type)
            .field("pipeline", &self.inner.pipeline)
            .finish()
    }
}

fn create_shader_module(
    device_context: &RavelDeviceContextVulkan,
    shader: &RavelShaderStageDef,
) -> RavelResult<vk::ShaderModule> {
    if shader.bytecode.is_empty() {
        return Err(RavelError::ValidationFailure(
            "shader bytecode is empty".to_string(),
        ));
    }

    let code = ash::util::read_spv(&mut std::io::Cursor::new(shader.bytecode))?;
    let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
    Ok(unsafe {
        device_context
            .device()
            .create_shader_module(&create_info, None)?
    })
}

fn create_pipeline_layout(
    device_context: &RavelDeviceContextVulkan,
    descriptor_set_layout: &RavelDescriptorSetLayout,
) -> RavelResult<vk::PipelineLayout> {
    let set_layouts = [descriptor_set_layout
        .vk_descriptor_set_layout()
        .unwrap()
        .vk_descriptor_set_layout()];
    let create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
    Ok(unsafe {
        device_context
            .device()
            .create_pipeline_layout(&create_info, None)?
    })
}

fn entry_point_name(shader: &RavelShaderStageDef) -> RavelResult<CString> {
    CString::new(shader.entry_point).map_err(|_| {
        RavelError::ValidationFailure(format!(
            "shader entry point {:?} contains a nul byte",
            shader.entry_point
        ))
    })
}

impl RavelPipelineVulkan {
    pub fn new_compute_pipeline(
        device_context: &RavelDeviceContextVulkan,
        pipeline_def: &RavelComputePipelineDef,
    ) -> RavelResult<Self> {
        let entry_point = entry_point_name(&pipeline_def.shader)?;
        let shader_module = create_shader_module(device_context, &pipeline_def.shader)?;
        let pipeline_layout =
            match create_pipeline_layout(device_context, pipeline_def.descriptor_set_layout) {
                Ok(pipeline_layout) => pipeline_layout,
                Err(e) => {
                    unsafe {
                        device_context
                            .device()
                            .destroy_shader_module(shader_module, None);
                    }
                    return Err(e);
                }
            };

        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader_module)
            .name(&entry_point);

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(pipeline_layout);

        let result = unsafe {
            device_context.device().create_compute_pipelines(
                vk::PipelineCache::null(),
                &[create_info],
                None,
            )
        };

        unsafe {
            device_context
                .device()
                .destroy_shader_module(shader_module, None);
        }

        let pipeline = match result {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe {
                    device_context
                        .device()
                        .destroy_pipeline_layout(pipeline_layout, None);
                }
                return Err(e.into());
            }
        };

        Ok(RavelPipelineVulkan {
            inner: Arc::new(RavelPipelineVulkanInner {
                device_context: device_context.clone(),
                pipeline_type: RavelPipelineType::Compute,
                pipeline_layout,
                pipeline,
            }),
        })
    }

    pub fn new_graphics_pipeline(
        device_context: &RavelDeviceContextVulkan,
        pipeline_def: &RavelGraphicsPipelineDef,
    ) -> RavelResult<Self> {
        let device = device_context.device();
        let vertex_entry_point = entry_point_name(&pipeline_def.vertex_shader)?;
        let fragment_entry_point = entry_point_name(&pipeline_def.fragment_shader)?;

        let vertex_module = create_shader_module(device_context, &pipeline_def.vertex_shader)?;
        let fragment_module =
            match create_shader_module(device_context, &pipeline_def.fragment_shader) {
                Ok(module) => module,
                Err(e) => {
                    unsafe {
                        device.destroy_shader_module(vertex_module, None);
                    }
                    return Err(e);
                }
            };

        let destroy_modules = || unsafe {
            device.destroy_shader_module(vertex_module, None);
            device.destroy_shader_module(fragment_module, None);
        };

        let pipeline_layout =
            match create_pipeline_layout(device_context, pipeline_def.descriptor_set_layout) {
                Ok(pipeline_layout) => pipeline_layout,
                Err(e) => {
                    destroy_modules();
                    return Err(e);
                }
            };

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(&vertex_entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(&fragment_entry_point),
        ];

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(primitive_topology_to_vk(pipeline_def.primitive_topology));
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(pipeline_def.depth_test_enable)
            .depth_write_enable(pipeline_def.depth_write_enable)
            .depth_compare_op(vk::CompareOp::GREATER_OR_EQUAL);

        let color_blend_attachments: Vec<_> = pipeline_def
            .color_formats
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(false)
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
            })
            .collect();
        let color_blend_state =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let color_formats: Vec<_> = pipeline_def
            .color_formats
            .iter()
            .map(|format| format_to_vk(*format))
            .collect();
        let depth_format = pipeline_def
            .depth_format
            .map(format_to_vk)
            .unwrap_or(vk::Format::UNDEFINED);
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(depth_format);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .push_next(&mut rendering_info);

        let result = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        };

        destroy_modules();

        let pipeline = match result {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                }
                return Err(e.into());
            }
        };

        Ok(RavelPipelineVulkan {
            inner: Arc::new(RavelPipelineVulkanInner {
                device_context: device_context.clone(),
                pipeline_type: RavelPipelineType::Graphics,
                pipeline_layout,
                pipeline,
            }),
        })
    }

    pub fn pipeline_type(&self) -> RavelPipelineType {
        self.inner.pipeline_type
    }

    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.inner.pipeline
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.inner.pipeline_layout
    }

    pub fn vk_bind_point(&self) -> vk::PipelineBindPoint {
        match self.inner.pipeline_type {
            RavelPipelineType::Graphics => vk::PipelineBindPoint::GRAPHICS,
            RavelPipelineType::Compute => vk::PipelineBindPoint::COMPUTE,
        }
    }
}

pub struct RavelQueryPoolVulkan {
    device_context: RavelDeviceContextVulkan,
    query_pool: vk::QueryPool,
    query_count: u32,
}

impl Drop for RavelQueryPoolVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_query_pool(self.query_pool, None);
        }
    }
}

impl RavelQueryPoolVulkan {
    pub fn new(
        device_context: &RavelDeviceContextVulkan,
        query_pool_def: &RavelQueryPoolDef,
    ) -> RavelResult<Self> {
        let create_info = vk::QueryPoolCreateInfo::default()
            .query_type(vk::QueryType::TIMESTAMP)
            .query_count(query_pool_def.query_count);

        let query_pool = unsafe {
            device_context
                .device()
                .create_query_pool(&create_info, None)?
        };

        Ok(RavelQueryPoolVulkan {
            device_context: device_context.clone(),
            query_pool,
            query_count: query_pool_def.query_count,
        })
    }

    pub fn vk_query_pool(&self) -> vk::QueryPool {
        self.query_pool
    }

    pub fn query_count(&self) -> u32 {
        self.query_count
    }

    pub fn get_results(
        &self,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<Vec<Option<u64>>> {
        if first_query + query_count > self.query_count {
            return Err(RavelError::ValidationFailure(format!(
                "queries {}..{} are out of range for a pool of {}",
                first_query,
                first_query + query_count,
                self.query_count
            )));
        }

        if query_count == 0 {
            return Ok(Vec::default());
        }

        // Each result is the timestamp followed by its availability
        let mut results = vec![[0u64; 2]; query_count as usize];
        let result = unsafe {
            self.device_context.device().get_query_pool_results(
                self.query_pool,
                first_query,
                &mut results,
                vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WITH_AVAILABILITY,
            )
        };

        match result {
            Ok(()) | Err(vk::Result::NOT_READY) => {}
            Err(e) => return Err(e.into()),
        }

        Ok(results
            .iter()
            .map(|[value, available]| if *available != 0 { Some(*value) } else { None })
            .collect())
    }
}
