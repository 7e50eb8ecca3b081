use super::*;
use crate::*;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct EmptyCommandList {
    commands: Vec<RavelEmptyCommand>,
    recording: bool,
}

pub struct RavelCommandPoolEmpty {
    device_context: RavelDeviceContextEmpty,
    command_pool_id: u64,
    command_lists: Mutex<Vec<Arc<Mutex<EmptyCommandList>>>>,
}

impl RavelCommandPoolEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        _command_pool_def: &RavelCommandPoolDef,
    ) -> Self {
        RavelCommandPoolEmpty {
            device_context: device_context.clone(),
            command_pool_id: device_context.allocate_object_id(),
            command_lists: Default::default(),
        }
    }

    pub fn command_pool_id(&self) -> u64 {
        self.command_pool_id
    }

    pub fn create_command_buffer(
        &self,
        command_buffer_def: &RavelCommandBufferDef,
    ) -> RavelResult<RavelCommandBufferEmpty> {
        let command_list = Arc::new(Mutex::new(EmptyCommandList::default()));
        self.command_lists
            .lock()
            .unwrap()
            .push(command_list.clone());

        Ok(RavelCommandBufferEmpty {
            device_context: self.device_context.clone(),
            command_buffer_id: self.device_context.allocate_object_id(),
            is_secondary: command_buffer_def.is_secondary,
            command_list,
        })
    }

    /// Clears every command buffer allocated from this pool
    pub fn reset_command_pool(&self) -> RavelResult<()> {
        for command_list in &*self.command_lists.lock().unwrap() {
            let mut command_list = command_list.lock().unwrap();
            command_list.commands.clear();
            command_list.recording = false;
        }

        self.device_context
            .push_event(RavelEmptyEvent::CommandPoolReset {
                command_pool_id: self.command_pool_id,
            });
        Ok(())
    }
}

pub struct RavelCommandBufferEmpty {
    device_context: RavelDeviceContextEmpty,
    command_buffer_id: u64,
    is_secondary: bool,
    command_list: Arc<Mutex<EmptyCommandList>>,
}

impl std::fmt::Debug for RavelCommandBufferEmpty {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RavelCommandBufferEmpty")
            .field("command_buffer_id", &self.command_buffer_id)
            .field("is_secondary", &self.is_secondary)
            .finish()
    }
}

impl RavelCommandBufferEmpty {
    pub fn command_buffer_id(&self) -> u64 {
        self.command_buffer_id
    }

    pub fn is_secondary(&self) -> bool {
        self.is_secondary
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.command_list.lock().unwrap().recording
    }

    /// Commands recorded since the last `begin()`
    pub fn recorded_commands(&self) -> Vec<RavelEmptyCommand> {
        self.command_list.lock().unwrap().commands.clone()
    }

    fn record(
        &self,
        command: RavelEmptyCommand,
    ) -> RavelResult<()> {
        let mut command_list = self.command_list.lock().unwrap();
        if !command_list.recording {
            return Err(RavelError::ValidationFailure(format!(
                "command {:?} recorded into command buffer {} which is not recording",
                command, self.command_buffer_id
            )));
        }

        command_list.commands.push(command);
        Ok(())
    }

    pub fn begin(&self) -> RavelResult<()> {
        {
            let mut command_list = self.command_list.lock().unwrap();
            command_list.commands.clear();
            command_list.recording = true;
        }

        self.device_context
            .push_event(RavelEmptyEvent::CommandBufferBegun {
                command_buffer_id: self.command_buffer_id,
            });
        Ok(())
    }

    pub fn begin_secondary(
        &self,
        _inheritance: &RavelRenderingInheritanceDef,
    ) -> RavelResult<()> {
        if !self.is_secondary {
            return Err(RavelError::ValidationFailure(
                "begin_secondary called on a primary command buffer".to_string(),
            ));
        }

        self.begin()
    }

    pub fn end(&self) -> RavelResult<()> {
        self.command_list.lock().unwrap().recording = false;
        Ok(())
    }

    pub fn cmd_resource_barrier(
        &self,
        buffer_barriers: &[RavelBufferBarrier],
        texture_barriers: &[RavelTextureBarrier],
    ) -> RavelResult<()> {
        let texture_barriers = texture_barriers
            .iter()
            .map(|barrier| RavelEmptyTextureBarrier {
                texture_id: barrier.texture.empty_texture().unwrap().texture_id(),
                src_layout: barrier.src_layout,
                dst_layout: barrier.dst_layout,
                src_access: barrier.src_access,
                dst_access: barrier.dst_access,
                base_mip_level: barrier.base_mip_level,
                mip_level_count: barrier.mip_level_count,
            })
            .collect();

        let buffer_barriers = buffer_barriers
            .iter()
            .map(|barrier| RavelEmptyBufferBarrier {
                buffer_id: barrier.buffer.empty_buffer().unwrap().buffer_id(),
                src_access: barrier.src_access,
                dst_access: barrier.dst_access,
            })
            .collect();

        self.record(RavelEmptyCommand::Barrier {
            texture_barriers,
            buffer_barriers,
        })
    }

    pub fn cmd_begin_rendering(
        &self,
        rendering_def: &RavelRenderingDef,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::BeginRendering {
            color_texture_ids: rendering_def
                .color_attachments
                .iter()
                .map(|x| x.texture.empty_texture().unwrap().texture_id())
                .collect(),
            depth_texture_id: rendering_def
                .depth_attachment
                .as_ref()
                .map(|x| x.texture.empty_texture().unwrap().texture_id()),
            extents: rendering_def.extents,
        })
    }

    pub fn cmd_end_rendering(&self) -> RavelResult<()> {
        self.record(RavelEmptyCommand::EndRendering)
    }

    pub fn cmd_set_viewport_and_scissor(
        &self,
        extents: RavelExtents2D,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::SetViewportAndScissor { extents })
    }

    pub fn cmd_bind_pipeline(
        &self,
        pipeline: &RavelPipelineEmpty,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::BindPipeline {
            pipeline_id: pipeline.pipeline_id(),
        })
    }

    pub fn cmd_bind_descriptor_set(
        &self,
        _pipeline: &RavelPipelineEmpty,
        descriptor_set: &RavelDescriptorSetEmpty,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::BindDescriptorSet {
            descriptor_set_id: descriptor_set.descriptor_set_id(),
        })
    }

    pub fn cmd_dispatch(
        &self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::Dispatch {
            group_count: [group_count_x, group_count_y, group_count_z],
        })
    }

    pub fn cmd_draw(
        &self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::Draw {
            vertex_count,
            first_vertex,
        })
    }

    pub fn cmd_execute_secondary(
        &self,
        command_buffers: &[&RavelCommandBufferEmpty],
    ) -> RavelResult<()> {
        for command_buffer in command_buffers {
            if !command_buffer.is_secondary() {
                return Err(RavelError::ValidationFailure(
                    "only secondary command buffers can be executed from a primary".to_string(),
                ));
            }

            self.record(RavelEmptyCommand::ExecuteSecondary {
                command_buffer_id: command_buffer.command_buffer_id(),
                commands: command_buffer.recorded_commands(),
            })?;
        }

        Ok(())
    }

    pub fn cmd_reset_query_pool(
        &self,
        query_pool: &RavelQueryPoolEmpty,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::ResetQueryPool {
            query_pool_id: query_pool.query_pool_id(),
            first_query,
            query_count,
        })
    }

    pub fn cmd_write_timestamp(
        &self,
        query_pool: &RavelQueryPoolEmpty,
        query_index: u32,
    ) -> RavelResult<()> {
        self.record(RavelEmptyCommand::WriteTimestamp {
            query_pool_id: query_pool.query_pool_id(),
            query_index,
        })
    }
}
