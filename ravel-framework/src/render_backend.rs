use crate::{
    BarrierSet, BarrierSynthesizer, BufferHandle, ComputePipeline, DeferredDropQueue,
    DescriptorSetLayoutCache, FramePacer, GraphicRecorder, ImageDescription, ImageHandle,
    ImageRuntimeState, ImageUsageKind, MipSelection, PassDeclaration, PassKind, PassRecordContext,
    PassResourceUsage, PassTiming, PersistentResources, PhysicalImageId, ReflectedBindings,
    RecordingThreadPool, RenderBackendConfig, ResolvedBufferUsage, ResolvedImageUsage,
    ResourceStateTable, RetiredPersistentResource, SamplerHandle, TemporaryResourcePool,
};
use crate::{BufferUsageKind, ColorTarget, DepthTarget};
use ravel_api::{
    RavelBuffer, RavelBufferBarrier, RavelBufferDef, RavelBufferUsage, RavelColorAttachmentBinding,
    RavelCommandBuffer, RavelComputePipelineDef, RavelDepthAttachmentBinding, RavelDescriptorResource,
    RavelDescriptorSet, RavelDescriptorSetLayout, RavelDescriptorType, RavelDescriptorWrite,
    RavelDeviceContext, RavelError, RavelExtents2D, RavelPresentTarget, RavelQueue,
    RavelRenderingDef, RavelRenderingInheritanceDef, RavelResult, RavelSamplerDef,
    RavelShaderStageDef, RavelTexture, RavelTextureBarrier, RavelTextureUsage,
    MAX_FRAMES_IN_FLIGHT,
};

/// Where the render backend is in the current frame. Calls must follow
/// `begin_frame` -> declare -> `resolve_temporaries` -> `synthesize_and_record` -> `submit`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FramePhase {
    /// Between frames
    Idle,
    /// Temporaries, passes and buffer writes may be declared
    Declaring,
    Resolved,
    Recorded,
}

/// Put `image` on screen through `target` once the frame's work completes
#[derive(Clone, Copy)]
pub struct PresentRequest<'a> {
    pub image: ImageHandle,
    pub target: &'a dyn RavelPresentTarget,
}

/// Owns every resource the frame core manages and runs one frame of passes at a time.
///
/// Each frame, temporaries are bound to pooled images, barriers are synthesized pass by pass in
/// declaration order, the passes are recorded into the current frame slot's command buffer and
/// the result is submitted. Passes are never reordered.
pub struct RenderBackend {
    device_context: RavelDeviceContext,
    queue: RavelQueue,
    config: RenderBackendConfig,
    thread_pool: Box<dyn RecordingThreadPool>,
    phase: FramePhase,
    state_table: ResourceStateTable,
    persistent: PersistentResources,
    temporaries: TemporaryResourcePool,
    descriptor_set_layouts: DescriptorSetLayoutCache,
    frame_pacer: FramePacer,
    passes: Vec<PassDeclaration>,
    retired_resources: DeferredDropQueue<RetiredPersistentResource>,
}

impl RenderBackend {
    pub fn new(
        device_context: &RavelDeviceContext,
        queue: &RavelQueue,
        config: RenderBackendConfig,
        thread_pool: Box<dyn RecordingThreadPool>,
    ) -> RavelResult<Self> {
        let worker_count = thread_pool.worker_count();
        assert!(worker_count > 0, "the recording thread pool has no workers");
        log::debug!(
            "Creating render backend with {} recording workers, {:?}",
            worker_count,
            config
        );

        let frame_pacer = FramePacer::new(device_context, queue, &config, worker_count)?;
        let temporaries = TemporaryResourcePool::new(device_context, config.pooled_image_eviction);

        Ok(RenderBackend {
            device_context: device_context.clone(),
            queue: queue.clone(),
            config,
            thread_pool,
            phase: FramePhase::Idle,
            state_table: Default::default(),
            persistent: Default::default(),
            temporaries,
            descriptor_set_layouts: Default::default(),
            frame_pacer,
            passes: Default::default(),
            retired_resources: DeferredDropQueue::new(MAX_FRAMES_IN_FLIGHT as u64 + 1),
        })
    }

    pub fn device_context(&self) -> &RavelDeviceContext {
        &self.device_context
    }

    pub fn queue(&self) -> &RavelQueue {
        &self.queue
    }

    pub fn config(&self) -> &RenderBackendConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.thread_pool.worker_count()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Number of frames submitted so far
    pub fn frame_index(&self) -> u64 {
        self.frame_pacer.frame_index()
    }

    /// Slot the current frame records into. Panics between frames.
    pub fn current_slot_index(&self) -> usize {
        self.frame_pacer.current_slot_index()
    }

    pub fn last_pass_timings(&self) -> &[PassTiming] {
        self.frame_pacer.last_pass_timings()
    }

    pub fn state_table(&self) -> &ResourceStateTable {
        &self.state_table
    }

    pub fn pooled_image_count(&self) -> usize {
        self.temporaries.pooled_image_count()
    }

    /// Pooled images evicted but not destroyed yet
    pub fn pending_eviction_count(&self) -> usize {
        self.temporaries.pending_eviction_count()
    }

    /// Destroyed persistent resources waiting for the GPU to finish with them
    pub fn retired_resource_count(&self) -> usize {
        self.retired_resources.len()
    }

    pub fn descriptor_set_layout_count(&self) -> usize {
        self.descriptor_set_layouts.len()
    }

    fn expect_phase(
        &self,
        expected: FramePhase,
        operation: &str,
    ) {
        assert_eq!(
            self.phase, expected,
            "{} called in phase {:?}, expected {:?}",
            operation, self.phase, expected
        );
    }

    //
    // Persistent resources
    //

    pub fn create_image(
        &mut self,
        description: &ImageDescription,
    ) -> RavelResult<ImageHandle> {
        let texture = self
            .device_context
            .create_texture(&description.texture_def())
            .map_err(|e| {
                log::error!("Failed to create image {:?}: {}", description, e);
                e
            })?;

        let index = self.persistent.add_image(description.clone(), texture);
        self.state_table
            .register_image(PhysicalImageId::Persistent(index), description.mip_count());
        log::debug!("Created persistent image {} {:?}", index, description);
        Ok(ImageHandle::Persistent(index))
    }

    pub fn create_buffer(
        &mut self,
        buffer_def: &RavelBufferDef,
    ) -> RavelResult<BufferHandle> {
        let handle = self
            .persistent
            .create_buffer(&self.device_context, buffer_def)
            .map_err(|e| {
                log::error!("Failed to create buffer {:?}: {}", buffer_def, e);
                e
            })?;

        self.state_table.register_buffer(handle);
        log::debug!("Created buffer {:?} {:?}", handle, buffer_def);
        Ok(handle)
    }

    pub fn create_sampler(
        &mut self,
        sampler_def: &RavelSamplerDef,
    ) -> RavelResult<SamplerHandle> {
        self.persistent
            .create_sampler(&self.device_context, sampler_def)
    }

    /// The handle is invalid immediately. The GPU object is destroyed once no frame in flight can
    /// still be using it.
    pub fn destroy_image(
        &mut self,
        image: ImageHandle,
    ) {
        let index = match image {
            ImageHandle::Persistent(index) => index,
            ImageHandle::Temporary(_) => {
                panic!("temporary image {:?} can't be destroyed explicitly", image)
            }
        };

        let persistent_image = self.persistent.remove_image(index);
        self.state_table
            .remove_image(PhysicalImageId::Persistent(index));
        self.retired_resources
            .retire(RetiredPersistentResource::Texture(persistent_image.texture));
        log::debug!("Destroyed persistent image {}", index);
    }

    pub fn destroy_buffer(
        &mut self,
        buffer: BufferHandle,
    ) {
        let persistent_buffer = self.persistent.remove_buffer(buffer);
        self.state_table.remove_buffer(buffer);
        self.retired_resources
            .retire(RetiredPersistentResource::Buffers(persistent_buffer.copies));
        log::debug!("Destroyed buffer {:?}", buffer);
    }

    /// Descriptor set layout for a shader's reflected bindings. Equal binding sets share a layout.
    pub fn create_descriptor_set_layout(
        &mut self,
        bindings: &ReflectedBindings,
    ) -> RavelResult<RavelDescriptorSetLayout> {
        self.descriptor_set_layouts
            .get_or_create(&self.device_context, bindings)
    }

    /// Builds a compute pipeline from compiled shader bytecode and its reflected bindings
    pub fn create_compute_pipeline(
        &mut self,
        bytecode: &[u8],
        entry_point: &str,
        bindings: &ReflectedBindings,
    ) -> RavelResult<ComputePipeline> {
        let descriptor_set_layout = self.create_descriptor_set_layout(bindings)?;
        let pipeline = self
            .device_context
            .create_compute_pipeline(&RavelComputePipelineDef {
                shader: RavelShaderStageDef {
                    bytecode,
                    entry_point,
                },
                descriptor_set_layout: &descriptor_set_layout,
            })
            .map_err(|e| {
                log::error!("Failed to create compute pipeline: {}", e);
                e
            })?;

        Ok(ComputePipeline {
            pipeline,
            descriptor_set_layout,
        })
    }

    pub fn image_description(
        &self,
        image: ImageHandle,
    ) -> &ImageDescription {
        image_description(&self.persistent, &self.temporaries, image)
    }

    /// The GPU image behind a handle. Temporaries must be resolved first.
    pub fn physical_image(
        &self,
        image: ImageHandle,
    ) -> PhysicalImageId {
        physical_image_id(&self.temporaries, image)
    }

    pub fn texture(
        &self,
        image: ImageHandle,
    ) -> &RavelTexture {
        physical_texture(
            &self.persistent,
            &self.temporaries,
            self.physical_image(image),
        )
    }

    pub fn image_state(
        &self,
        image: ImageHandle,
    ) -> &ImageRuntimeState {
        self.state_table.image_state(self.physical_image(image))
    }

    /// The copy of a buffer that frames recorded in `slot_index` use. Host-writable buffers have
    /// one copy per frame slot.
    pub fn buffer_for_slot(
        &self,
        buffer: BufferHandle,
        slot_index: usize,
    ) -> &RavelBuffer {
        self.persistent.buffer(buffer).copy_for_slot(slot_index)
    }

    //
    // Frame
    //

    /// Waits for the GPU to finish with the next frame slot and starts a frame
    #[profiling::function]
    pub fn begin_frame(&mut self) -> RavelResult<()> {
        self.expect_phase(FramePhase::Idle, "begin_frame");

        self.frame_pacer.begin_frame()?;
        self.retired_resources.on_frame_complete();
        self.temporaries
            .collect_garbage(&self.queue, &mut self.state_table)?;
        self.passes.clear();

        self.phase = FramePhase::Declaring;
        Ok(())
    }

    /// An image that lives until the end of this frame. Backing memory is shared with other
    /// temporaries whose passes don't overlap.
    pub fn create_temporary_image(
        &mut self,
        description: &ImageDescription,
    ) -> ImageHandle {
        self.expect_phase(FramePhase::Declaring, "create_temporary_image");
        self.temporaries.declare_temporary(description)
    }

    /// Appends a pass to this frame. Returns the pass's index in the frame. A pass that can't be
    /// recorded (for example render targets of different sizes) is rejected with a
    /// `ValidationFailure` and not added.
    pub fn declare_pass(
        &mut self,
        pass: PassDeclaration,
    ) -> RavelResult<usize> {
        self.expect_phase(FramePhase::Declaring, "declare_pass");

        if let Err(e) = self.validate_pass(&pass) {
            log::error!("Rejected pass {:?}: {}", pass.name(), e);
            return Err(e);
        }

        log::trace!("Declare pass {} {:?}", self.passes.len(), pass.name());
        self.passes.push(pass);
        Ok(self.passes.len() - 1)
    }

    /// Writes `data` to the start of a host-writable buffer before this frame's work runs on the
    /// GPU. Later writes to the same buffer win.
    pub fn queue_buffer_write(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
    ) -> RavelResult<()> {
        self.expect_phase(FramePhase::Declaring, "queue_buffer_write");

        let persistent_buffer = self.persistent.buffer(buffer);
        if !persistent_buffer.is_host_writable() {
            let message = format!("buffer {:?} is not host writable", buffer);
            log::error!("{}", message);
            return Err(RavelError::ValidationFailure(message));
        }

        if data.len() as u64 > persistent_buffer.buffer_def.size {
            let message = format!(
                "write of {} bytes does not fit in buffer {:?} of {} bytes",
                data.len(),
                buffer,
                persistent_buffer.buffer_def.size
            );
            log::error!("{}", message);
            return Err(RavelError::ValidationFailure(message));
        }

        self.frame_pacer.queue_write(buffer, data);
        Ok(())
    }

    /// Binds this frame's temporaries to pooled images
    pub fn resolve_temporaries(&mut self) -> RavelResult<()> {
        self.expect_phase(FramePhase::Declaring, "resolve_temporaries");

        if self.passes.is_empty() {
            log::warn!("Frame {} declares no passes", self.frame_index());
        }

        let passes = &self.passes;
        self.temporaries.resolve_all(
            passes.iter().map(|x| x.referenced_images()),
            &mut self.state_table,
        )?;

        self.phase = FramePhase::Resolved;
        Ok(())
    }

    /// Synthesizes barriers for every pass in declaration order and records the passes into the
    /// current slot's command buffer
    #[profiling::function]
    pub fn synthesize_and_record(&mut self) -> RavelResult<()> {
        self.expect_phase(FramePhase::Resolved, "synthesize_and_record");

        let passes = std::mem::take(&mut self.passes);
        self.record_passes(passes)?;

        self.phase = FramePhase::Recorded;
        Ok(())
    }

    /// Ends recording, flushes queued buffer writes and submits the frame. If `present` is given,
    /// its image is moved to the present layout and handed to the target after the submission.
    #[profiling::function]
    pub fn submit(
        &mut self,
        present: Option<PresentRequest>,
    ) -> RavelResult<()> {
        self.expect_phase(FramePhase::Recorded, "submit");
        let slot_index = self.frame_pacer.current_slot_index();

        {
            let command_buffer = &self.frame_pacer.current_slot().command_buffer;
            if let Some(present) = &present {
                let image = physical_image_id(&self.temporaries, present.image);
                let barriers = BarrierSynthesizer::synthesize_present(image, &mut self.state_table);
                record_barriers(
                    command_buffer,
                    &barriers,
                    &self.persistent,
                    &self.temporaries,
                    slot_index,
                )?;
            }

            command_buffer.end()?;
        }

        self.frame_pacer.apply_pending_writes(&self.persistent)?;
        self.frame_pacer.submit(present.map(|x| x.target))?;

        self.phase = FramePhase::Idle;
        Ok(())
    }

    /// Blocks until the GPU has finished every submitted frame
    pub fn wait_for_idle(&mut self) -> RavelResult<()> {
        self.frame_pacer.wait_for_idle()
    }

    //
    // Internals
    //

    fn validate_pass(
        &self,
        pass: &PassDeclaration,
    ) -> RavelResult<()> {
        let fail = |message: String| -> RavelResult<()> {
            Err(RavelError::ValidationFailure(message))
        };

        // Bindings must match the descriptor set layout
        let mut bindings: Vec<(u32, RavelDescriptorType)> = Vec::default();
        bindings.extend(
            pass.sampled_images()
                .iter()
                .map(|x| (x.binding, RavelDescriptorType::SampledImage)),
        );
        bindings.extend(
            pass.storage_images()
                .iter()
                .map(|x| (x.binding, RavelDescriptorType::StorageImage)),
        );
        bindings.extend(pass.buffers().iter().map(|x| {
            let descriptor_type = match x.kind {
                BufferUsageKind::Uniform => RavelDescriptorType::UniformBuffer,
                BufferUsageKind::Storage { .. } => RavelDescriptorType::StorageBuffer,
            };
            (x.binding, descriptor_type)
        }));
        bindings.extend(
            pass.samplers()
                .iter()
                .map(|x| (x.binding, RavelDescriptorType::Sampler)),
        );

        if !bindings.is_empty() {
            let layout_def = match pass.pass_descriptor_set_layout() {
                Some(layout) => layout.descriptor_set_layout_def(),
                None => return fail("binds resources but has no descriptor set layout".to_string()),
            };

            for (i, (binding, descriptor_type)) in bindings.iter().enumerate() {
                if bindings[..i].iter().any(|(other, _)| other == binding) {
                    return fail(format!("binding {} is used more than once", binding));
                }

                let matches_layout = layout_def
                    .bindings
                    .iter()
                    .any(|x| x.binding == *binding && x.descriptor_type == *descriptor_type);
                if !matches_layout {
                    return fail(format!(
                        "binding {} as {:?} is not in the descriptor set layout",
                        binding, descriptor_type
                    ));
                }
            }
        }

        // Images must have the usage flags and mips they are used with
        let check_image = |image: ImageHandle,
                           required_usage: RavelTextureUsage,
                           mip_level: Option<u32>|
         -> RavelResult<()> {
            let description = self.image_description(image);
            if !description.usage.contains(required_usage) {
                return fail(format!(
                    "image {:?} is used as {:?} but was created with {:?}",
                    image, required_usage, description.usage
                ));
            }

            if let Some(mip_level) = mip_level {
                if mip_level >= description.mip_count() {
                    return fail(format!(
                        "mip {} of image {:?} is out of range ({} mips)",
                        mip_level,
                        image,
                        description.mip_count()
                    ));
                }
            }

            Ok(())
        };

        for usage in pass.sampled_images() {
            let mip_level = match usage.mips {
                MipSelection::All => None,
                MipSelection::Level(mip_level) => Some(mip_level),
            };
            check_image(usage.image, RavelTextureUsage::SAMPLED, mip_level)?;

            // A sampled view is bound with a single layout, so its mips are either all storage
            // bound in this pass or none are
            let mip_count = self.image_description(usage.image).mip_count();
            let mip_range = usage.mips.mip_range(mip_count);
            let storage_bound = pass.storage_bound_mip_count(usage, mip_count);
            if storage_bound != 0 && storage_bound != mip_range.end - mip_range.start {
                return fail(format!(
                    "sampled mips {}..{} of image {:?} are only partly bound as storage in the same pass",
                    mip_range.start, mip_range.end, usage.image
                ));
            }
        }

        for usage in pass.storage_images() {
            check_image(usage.image, RavelTextureUsage::STORAGE, Some(usage.mip_level))?;
        }

        for usage in pass.buffers() {
            let required_usage = match usage.kind {
                BufferUsageKind::Uniform => RavelBufferUsage::UNIFORM,
                BufferUsageKind::Storage { .. } => RavelBufferUsage::STORAGE,
            };
            let buffer_def = &self.persistent.buffer(usage.buffer).buffer_def;
            if !buffer_def.usage.contains(required_usage) {
                return fail(format!(
                    "buffer {:?} is used as {:?} but was created with {:?}",
                    usage.buffer, required_usage, buffer_def.usage
                ));
            }
        }

        for usage in pass.samplers() {
            // Panics on destroyed samplers
            self.persistent.sampler(usage.sampler);
        }

        // Render targets
        if let PassKind::Graphic {
            color_targets,
            depth_target,
            ..
        } = pass.kind()
        {
            if color_targets.is_empty() && depth_target.is_none() {
                return fail("graphic pass has no render targets".to_string());
            }

            let mut target_extents: Option<RavelExtents2D> = None;
            let mut check_extents = |image: ImageHandle, extents: RavelExtents2D| {
                match target_extents {
                    Some(expected) if expected != extents => fail(format!(
                        "render target {:?} is {}x{} but other targets are {}x{}",
                        image, extents.width, extents.height, expected.width, expected.height
                    )),
                    _ => {
                        target_extents = Some(extents);
                        Ok(())
                    }
                }
            };

            for color_target in color_targets {
                check_image(
                    color_target.image,
                    RavelTextureUsage::COLOR_ATTACHMENT,
                    Some(color_target.mip_level),
                )?;
                let description = self.image_description(color_target.image);
                if description.format.has_depth_or_stencil() {
                    return fail(format!(
                        "color target {:?} has depth format {:?}",
                        color_target.image, description.format
                    ));
                }
                check_extents(
                    color_target.image,
                    description
                        .extents
                        .mip_extents(color_target.mip_level)
                        .to_2d(),
                )?;
            }

            if let Some(depth_target) = depth_target {
                check_image(
                    depth_target.image,
                    RavelTextureUsage::DEPTH_STENCIL_ATTACHMENT,
                    None,
                )?;
                let description = self.image_description(depth_target.image);
                if !description.format.has_depth_or_stencil() {
                    return fail(format!(
                        "depth target {:?} has non-depth format {:?}",
                        depth_target.image, description.format
                    ));
                }
                check_extents(depth_target.image, description.extents.to_2d())?;
            }

            let targets = color_targets
                .iter()
                .map(|x| x.image)
                .chain(depth_target.iter().map(|x| x.image));
            for target in targets {
                let also_bound = pass.sampled_images().iter().any(|x| x.image == target)
                    || pass.storage_images().iter().any(|x| x.image == target);
                if also_bound {
                    return fail(format!(
                        "render target {:?} is also bound as a shader resource",
                        target
                    ));
                }
            }
        }

        Ok(())
    }

    fn resolve_pass_usage(
        &self,
        pass: &PassDeclaration,
    ) -> PassResourceUsage {
        let mut usage = PassResourceUsage::default();

        for sampled in pass.sampled_images() {
            let mip_range = sampled
                .mips
                .mip_range(self.image_description(sampled.image).mip_count());
            usage.images.push(ResolvedImageUsage {
                image: self.physical_image(sampled.image),
                kind: ImageUsageKind::Sampled,
                base_mip_level: mip_range.start,
                mip_level_count: mip_range.end - mip_range.start,
            });
        }

        for storage in pass.storage_images() {
            usage.images.push(ResolvedImageUsage {
                image: self.physical_image(storage.image),
                kind: ImageUsageKind::Storage,
                base_mip_level: storage.mip_level,
                mip_level_count: 1,
            });
        }

        for color_target in pass.color_targets() {
            usage.images.push(ResolvedImageUsage {
                image: self.physical_image(color_target.image),
                kind: ImageUsageKind::ColorAttachment,
                base_mip_level: color_target.mip_level,
                mip_level_count: 1,
            });
        }

        if let Some(depth_target) = pass.depth_target_image() {
            usage.images.push(ResolvedImageUsage {
                image: self.physical_image(depth_target.image),
                kind: ImageUsageKind::DepthAttachment,
                base_mip_level: 0,
                mip_level_count: 1,
            });
        }

        for buffer in pass.buffers() {
            usage.buffers.push(ResolvedBufferUsage {
                buffer: buffer.buffer,
                kind: buffer.kind,
            });
        }

        usage
    }

    // Returns the index of the set in the current slot's descriptor sets
    fn write_pass_descriptor_set(
        &mut self,
        pass: &PassDeclaration,
        slot_index: usize,
    ) -> RavelResult<Option<usize>> {
        let descriptor_set_layout = match pass.pass_descriptor_set_layout() {
            Some(layout) if pass.has_bindings() => layout,
            _ => return Ok(None),
        };

        let persistent = &self.persistent;
        let temporaries = &self.temporaries;
        let texture = |image: ImageHandle| {
            physical_texture(
                persistent,
                temporaries,
                physical_image_id(temporaries, image),
            )
        };

        let mut writes = Vec::default();
        for sampled in pass.sampled_images() {
            let mip_count = image_description(persistent, temporaries, sampled.image).mip_count();
            let layout = if pass.storage_bound_mip_count(sampled, mip_count) > 0 {
                ImageUsageKind::Storage.required_layout()
            } else {
                ImageUsageKind::Sampled.required_layout()
            };
            writes.push(RavelDescriptorWrite {
                binding: sampled.binding,
                resource: RavelDescriptorResource::SampledImage {
                    texture: texture(sampled.image),
                    mip_slice: match sampled.mips {
                        MipSelection::All => None,
                        MipSelection::Level(mip_level) => Some(mip_level),
                    },
                    layout,
                },
            });
        }

        for storage in pass.storage_images() {
            writes.push(RavelDescriptorWrite {
                binding: storage.binding,
                resource: RavelDescriptorResource::StorageImage {
                    texture: texture(storage.image),
                    mip_slice: storage.mip_level,
                },
            });
        }

        for buffer in pass.buffers() {
            let copy = persistent.buffer(buffer.buffer).copy_for_slot(slot_index);
            let resource = match buffer.kind {
                BufferUsageKind::Uniform => RavelDescriptorResource::UniformBuffer(copy),
                BufferUsageKind::Storage { .. } => RavelDescriptorResource::StorageBuffer(copy),
            };
            writes.push(RavelDescriptorWrite {
                binding: buffer.binding,
                resource,
            });
        }

        for sampler in pass.samplers() {
            writes.push(RavelDescriptorWrite {
                binding: sampler.binding,
                resource: RavelDescriptorResource::Sampler(persistent.sampler(sampler.sampler)),
            });
        }

        let slot = self.frame_pacer.current_slot_mut();
        let descriptor_set = slot
            .descriptor_allocator
            .allocate_descriptor_set(descriptor_set_layout)?;
        descriptor_set.update_descriptor_set(&writes)?;
        slot.descriptor_sets.push(descriptor_set);
        Ok(Some(slot.descriptor_sets.len() - 1))
    }

    fn record_passes(
        &mut self,
        passes: Vec<PassDeclaration>,
    ) -> RavelResult<()> {
        let slot_index = self.frame_pacer.current_slot_index();
        log::trace!(
            "Record {} passes for frame {} into slot {}",
            passes.len(),
            self.frame_index(),
            slot_index
        );

        // Everything that needs the slot mutably happens before recording starts
        let mut descriptor_set_indices = Vec::with_capacity(passes.len());
        for pass in &passes {
            descriptor_set_indices.push(self.write_pass_descriptor_set(pass, slot_index)?);
        }

        let max_timestamped_passes = self.config.max_timestamped_passes as usize;
        let mut worker_buffer_indices = Vec::with_capacity(passes.len());
        let timed_pass_count = {
            let slot = self.frame_pacer.current_slot_mut();
            for pass in &passes {
                let is_parallel = matches!(
                    pass.kind(),
                    PassKind::Graphic {
                        recorder: GraphicRecorder::Parallel(_),
                        ..
                    }
                );
                worker_buffer_indices.push(if is_parallel {
                    Some(slot.next_worker_command_buffers()?)
                } else {
                    None
                });
            }

            let timed_pass_count = if slot.query_pool.is_some() {
                passes.len().min(max_timestamped_passes)
            } else {
                0
            };
            slot.timed_passes = passes
                .iter()
                .take(timed_pass_count)
                .map(|x| x.name().to_string())
                .collect();
            timed_pass_count
        };

        let slot = self.frame_pacer.current_slot();
        let command_buffer = &slot.command_buffer;
        command_buffer.begin()?;

        let query_pool = slot.query_pool.as_ref().filter(|_| timed_pass_count > 0);
        if let Some(query_pool) = query_pool {
            command_buffer.cmd_reset_query_pool(query_pool, 0, timed_pass_count as u32 * 2)?;
        }

        for (pass_index, pass) in passes.into_iter().enumerate() {
            profiling::scope!("Record pass");
            log::trace!("Pass {} {:?}", pass_index, pass.name());

            let usage = self.resolve_pass_usage(&pass);
            let barriers = BarrierSynthesizer::synthesize(&usage, &mut self.state_table);
            record_barriers(
                command_buffer,
                &barriers,
                &self.persistent,
                &self.temporaries,
                slot_index,
            )?;

            let query_pool = query_pool.filter(|_| pass_index < timed_pass_count);
            if let Some(query_pool) = query_pool {
                command_buffer.cmd_write_timestamp(query_pool, pass_index as u32 * 2)?;
            }

            let descriptor_set = descriptor_set_indices[pass_index].map(|i| &slot.descriptor_sets[i]);
            match pass.kind {
                PassKind::Compute {
                    pipeline,
                    group_count,
                } => {
                    command_buffer.cmd_bind_pipeline(&pipeline.pipeline)?;
                    if let Some(descriptor_set) = descriptor_set {
                        command_buffer.cmd_bind_descriptor_set(&pipeline.pipeline, descriptor_set)?;
                    }
                    command_buffer.cmd_dispatch(group_count[0], group_count[1], group_count[2])?;
                }
                PassKind::Graphic {
                    color_targets,
                    depth_target,
                    recorder,
                    ..
                } => {
                    self.record_graphic_pass(
                        command_buffer,
                        &slot.worker_command_buffers,
                        worker_buffer_indices[pass_index],
                        descriptor_set,
                        &color_targets,
                        depth_target.as_ref(),
                        recorder,
                    )?;
                }
            }

            if let Some(query_pool) = query_pool {
                command_buffer.cmd_write_timestamp(query_pool, pass_index as u32 * 2 + 1)?;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn record_graphic_pass(
        &self,
        command_buffer: &RavelCommandBuffer,
        worker_command_buffers: &[Vec<RavelCommandBuffer>],
        worker_buffer_index: Option<usize>,
        descriptor_set: Option<&RavelDescriptorSet>,
        color_targets: &[ColorTarget],
        depth_target: Option<&DepthTarget>,
        recorder: GraphicRecorder,
    ) -> RavelResult<()> {
        let color_attachments: Vec<_> = color_targets
            .iter()
            .map(|x| RavelColorAttachmentBinding {
                texture: self.texture(x.image),
                mip_slice: x.mip_level,
                load_op: x.load_op,
                clear_value: x.clear_value,
            })
            .collect();
        let depth_attachment = depth_target.map(|x| RavelDepthAttachmentBinding {
            texture: self.texture(x.image),
            load_op: x.load_op,
            clear_value: x.clear_value,
        });

        // Targets were checked to be the same size when the pass was declared
        let extents = match (color_attachments.first(), &depth_attachment) {
            (Some(color), _) => color
                .texture
                .texture_def()
                .extents
                .mip_extents(color.mip_slice)
                .to_2d(),
            (None, Some(depth)) => depth.texture.texture_def().extents.to_2d(),
            (None, None) => RavelExtents2D::default(),
        };

        let secondary_contents = matches!(recorder, GraphicRecorder::Parallel(_));
        command_buffer.cmd_begin_rendering(&RavelRenderingDef {
            color_attachments: &color_attachments,
            depth_attachment,
            extents,
            secondary_contents,
        })?;

        match (recorder, worker_buffer_index) {
            (GraphicRecorder::None, _) => {}
            (GraphicRecorder::Inline(recorder), _) => {
                command_buffer.cmd_set_viewport_and_scissor(extents)?;
                recorder(&PassRecordContext {
                    command_buffer,
                    descriptor_set,
                    extents,
                    worker_index: 0,
                    worker_count: 1,
                })?;
            }
            (GraphicRecorder::Parallel(recorder), Some(buffer_index)) => {
                profiling::scope!("Parallel recording");
                let inheritance = RavelRenderingInheritanceDef {
                    color_formats: color_attachments
                        .iter()
                        .map(|x| x.texture.texture_def().format)
                        .collect(),
                    depth_format: depth_attachment.map(|x| x.texture.texture_def().format),
                };
                let worker_count = worker_command_buffers.len();

                self.thread_pool.run_workers(&|worker_index: usize| -> RavelResult<()> {
                    let command_buffer = &worker_command_buffers[worker_index][buffer_index];
                    command_buffer.begin_secondary(&inheritance)?;
                    command_buffer.cmd_set_viewport_and_scissor(extents)?;
                    recorder(&PassRecordContext {
                        command_buffer,
                        descriptor_set,
                        extents,
                        worker_index,
                        worker_count,
                    })?;
                    command_buffer.end()
                })?;

                let secondaries: Vec<&RavelCommandBuffer> = worker_command_buffers
                    .iter()
                    .map(|x| &x[buffer_index])
                    .collect();
                command_buffer.cmd_execute_secondary(&secondaries)?;
            }
            (GraphicRecorder::Parallel(_), None) => {
                unreachable!("parallel pass recorded without worker command buffers")
            }
        }

        command_buffer.cmd_end_rendering()
    }
}

impl Drop for RenderBackend {
    fn drop(&mut self) {
        if let Err(e) = self.frame_pacer.wait_for_idle() {
            log::error!("Failed to wait for the GPU before destroying resources: {}", e);
        }

        log::debug!(
            "Destroying render backend ({} pooled images, {} retired resources)",
            self.temporaries.pooled_image_count(),
            self.retired_resources.len()
        );
        self.passes.clear();
        self.temporaries.clear(&mut self.state_table);
        self.retired_resources.drain_all();
        self.persistent.clear();
        self.descriptor_set_layouts.clear();
    }
}

fn image_description<'a>(
    persistent: &'a PersistentResources,
    temporaries: &'a TemporaryResourcePool,
    image: ImageHandle,
) -> &'a ImageDescription {
    match image {
        ImageHandle::Persistent(index) => &persistent.image(index).description,
        ImageHandle::Temporary(temporary) => temporaries.description(temporary),
    }
}

fn physical_image_id(
    temporaries: &TemporaryResourcePool,
    image: ImageHandle,
) -> PhysicalImageId {
    match image {
        ImageHandle::Persistent(index) => PhysicalImageId::Persistent(index),
        ImageHandle::Temporary(temporary) => {
            PhysicalImageId::Pooled(temporaries.physical_image(temporary))
        }
    }
}

fn physical_texture<'a>(
    persistent: &'a PersistentResources,
    temporaries: &'a TemporaryResourcePool,
    image: PhysicalImageId,
) -> &'a RavelTexture {
    match image {
        PhysicalImageId::Persistent(index) => &persistent.image(index).texture,
        PhysicalImageId::Pooled(id) => temporaries.texture(id),
    }
}

fn record_barriers(
    command_buffer: &RavelCommandBuffer,
    barriers: &BarrierSet,
    persistent: &PersistentResources,
    temporaries: &TemporaryResourcePool,
    slot_index: usize,
) -> RavelResult<()> {
    if barriers.is_empty() {
        return Ok(());
    }

    let texture_barriers: Vec<_> = barriers
        .image_barriers
        .iter()
        .map(|x| RavelTextureBarrier {
            texture: physical_texture(persistent, temporaries, x.image),
            src_layout: x.src_layout,
            dst_layout: x.dst_layout,
            src_access: x.src_access,
            dst_access: x.dst_access,
            base_mip_level: x.base_mip_level,
            mip_level_count: x.mip_level_count,
        })
        .collect();

    let buffer_barriers: Vec<_> = barriers
        .buffer_barriers
        .iter()
        .map(|x| RavelBufferBarrier {
            buffer: persistent.buffer(x.buffer).copy_for_slot(slot_index),
            src_access: x.src_access,
            dst_access: x.dst_access,
        })
        .collect();

    command_buffer.cmd_resource_barrier(&buffer_barriers, &texture_barriers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingThreadPoolNone;
    use ravel_api::{RavelFormat, RavelLoadOp, RavelQueueType};

    fn setup() -> RenderBackend {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let queue = device_context
            .create_queue(RavelQueueType::Graphics)
            .unwrap();
        RenderBackend::new(
            &device_context,
            &queue,
            Default::default(),
            Box::new(RecordingThreadPoolNone::new()),
        )
        .unwrap()
    }

    fn color_description(
        width: u32,
        height: u32,
    ) -> ImageDescription {
        ImageDescription::new_2d(
            RavelFormat::R8G8B8A8_UNORM,
            width,
            height,
            RavelTextureUsage::SAMPLED | RavelTextureUsage::COLOR_ATTACHMENT,
        )
    }

    fn run_empty_frame(backend: &mut RenderBackend) {
        backend.begin_frame().unwrap();
        backend.resolve_temporaries().unwrap();
        backend.synthesize_and_record().unwrap();
        backend.submit(None).unwrap();
    }

    #[test]
    fn test_phases_advance_through_a_frame() {
        let mut backend = setup();
        assert_eq!(backend.phase(), FramePhase::Idle);
        backend.begin_frame().unwrap();
        assert_eq!(backend.phase(), FramePhase::Declaring);
        backend.resolve_temporaries().unwrap();
        assert_eq!(backend.phase(), FramePhase::Resolved);
        backend.synthesize_and_record().unwrap();
        assert_eq!(backend.phase(), FramePhase::Recorded);
        backend.submit(None).unwrap();
        assert_eq!(backend.phase(), FramePhase::Idle);
        assert_eq!(backend.frame_index(), 1);
    }

    #[test]
    #[should_panic(expected = "declare_pass called in phase Idle")]
    fn test_declare_pass_outside_frame_panics() {
        let mut backend = setup();
        let image = backend.create_image(&color_description(4, 4)).unwrap();
        let _ = backend.declare_pass(PassDeclaration::graphic("clear").color_target(
            image,
            0,
            RavelLoadOp::Clear,
            Default::default(),
        ));
    }

    #[test]
    #[should_panic(expected = "submit called in phase Declaring")]
    fn test_submit_before_recording_panics() {
        let mut backend = setup();
        backend.begin_frame().unwrap();
        let _ = backend.submit(None);
    }

    #[test]
    #[should_panic(expected = "queue_buffer_write called in phase Idle")]
    fn test_buffer_write_outside_frame_panics() {
        let mut backend = setup();
        let buffer = backend
            .create_buffer(&RavelBufferDef {
                size: 16,
                ..Default::default()
            })
            .unwrap();
        let _ = backend.queue_buffer_write(buffer, &[0; 16]);
    }

    #[test]
    #[should_panic(expected = "queue_buffer_write called in phase Resolved")]
    fn test_buffer_write_after_resolve_panics() {
        let mut backend = setup();
        let buffer = backend
            .create_buffer(&RavelBufferDef {
                size: 16,
                ..Default::default()
            })
            .unwrap();
        backend.begin_frame().unwrap();
        backend.resolve_temporaries().unwrap();
        let _ = backend.queue_buffer_write(buffer, &[0; 16]);
    }

    #[test]
    fn test_mismatched_render_target_extents_are_rejected() {
        let mut backend = setup();
        let a = backend.create_image(&color_description(64, 64)).unwrap();
        let b = backend.create_image(&color_description(32, 32)).unwrap();

        backend.begin_frame().unwrap();
        let result = backend.declare_pass(
            PassDeclaration::graphic("mismatched")
                .color_target(a, 0, RavelLoadOp::Clear, Default::default())
                .color_target(b, 0, RavelLoadOp::Clear, Default::default()),
        );
        assert!(matches!(result, Err(RavelError::ValidationFailure(_))));

        // A mip of the larger image matches
        let a_mips = backend
            .create_image(&color_description(64, 64).with_mip_policy(crate::MipPolicy::FullChain))
            .unwrap();
        let result = backend.declare_pass(
            PassDeclaration::graphic("mip")
                .color_target(a_mips, 1, RavelLoadOp::Clear, Default::default())
                .color_target(b, 0, RavelLoadOp::Clear, Default::default()),
        );
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_bindings_must_match_layout() {
        let mut backend = setup();
        let target = backend.create_image(&color_description(8, 8)).unwrap();
        let source = backend.create_image(&color_description(8, 8)).unwrap();
        let layout = backend
            .create_descriptor_set_layout(&ReflectedBindings {
                sampled_images: vec![0],
                ..Default::default()
            })
            .unwrap();

        backend.begin_frame().unwrap();

        // No layout at all
        let result = backend.declare_pass(
            PassDeclaration::graphic("no layout")
                .color_target(target, 0, RavelLoadOp::Clear, Default::default())
                .sampled_image(0, source, MipSelection::All),
        );
        assert!(result.is_err());

        // Binding 1 isn't in the layout
        let result = backend.declare_pass(
            PassDeclaration::graphic("wrong binding")
                .color_target(target, 0, RavelLoadOp::Clear, Default::default())
                .descriptor_set_layout(&layout)
                .sampled_image(1, source, MipSelection::All),
        );
        assert!(result.is_err());

        // Render target can't also be sampled
        let result = backend.declare_pass(
            PassDeclaration::graphic("feedback")
                .color_target(target, 0, RavelLoadOp::Clear, Default::default())
                .descriptor_set_layout(&layout)
                .sampled_image(0, target, MipSelection::All),
        );
        assert!(result.is_err());

        let result = backend.declare_pass(
            PassDeclaration::graphic("ok")
                .color_target(target, 0, RavelLoadOp::Clear, Default::default())
                .descriptor_set_layout(&layout)
                .sampled_image(0, source, MipSelection::All),
        );
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_usage_flags_are_checked() {
        let mut backend = setup();
        let sampled_only = backend
            .create_image(&ImageDescription::new_2d(
                RavelFormat::R8G8B8A8_UNORM,
                8,
                8,
                RavelTextureUsage::SAMPLED,
            ))
            .unwrap();

        backend.begin_frame().unwrap();
        let result = backend.declare_pass(PassDeclaration::graphic("not a target").color_target(
            sampled_only,
            0,
            RavelLoadOp::Clear,
            Default::default(),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_destroyed_image_outlives_frames_in_flight() {
        let mut backend = setup();
        let image = backend.create_image(&color_description(4, 4)).unwrap();
        backend.destroy_image(image);
        assert_eq!(backend.retired_resource_count(), 1);

        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            run_empty_frame(&mut backend);
            assert_eq!(backend.retired_resource_count(), 1);
        }

        backend.begin_frame().unwrap();
        assert_eq!(backend.retired_resource_count(), 0);
    }

    #[test]
    #[should_panic(expected = "was destroyed")]
    fn test_destroyed_image_handle_panics() {
        let mut backend = setup();
        let image = backend.create_image(&color_description(4, 4)).unwrap();
        backend.destroy_image(image);
        backend.image_description(image);
    }

    #[test]
    fn test_compute_pipelines_share_cached_layouts() {
        let mut backend = setup();
        let bindings = ReflectedBindings {
            storage_images: vec![0],
            ..Default::default()
        };
        backend
            .create_compute_pipeline(&[1, 2, 3, 4], "main", &bindings)
            .unwrap();
        backend
            .create_compute_pipeline(&[5, 6, 7, 8], "main", &bindings)
            .unwrap();
        assert_eq!(backend.descriptor_set_layout_count(), 1);
    }
}
