use ravel_framework::api::empty::{
    RavelEmptyCommand, RavelEmptyDescriptorWrite, RavelEmptyEvent, RavelPresentTargetEmpty,
};
use ravel_framework::api::{
    RavelAccessFlags, RavelBufferDef, RavelBufferUsage, RavelDeviceContext, RavelFormat,
    RavelImageLayout, RavelLoadOp, RavelMemoryUsage, RavelQueue, RavelQueueType,
    RavelTextureUsage,
};
use ravel_framework::*;
use std::sync::{Arc, Mutex};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(config: RenderBackendConfig) -> (RavelDeviceContext, RavelQueue, RenderBackend) {
    init_logging();
    let device_context = RavelDeviceContext::new_empty(&Default::default());
    let queue = device_context
        .create_queue(RavelQueueType::Graphics)
        .unwrap();
    let backend = RenderBackend::new(
        &device_context,
        &queue,
        config,
        Box::new(RecordingThreadPoolNone::new()),
    )
    .unwrap();
    (device_context, queue, backend)
}

fn take_events(device_context: &RavelDeviceContext) -> Vec<RavelEmptyEvent> {
    device_context.empty_device_context().unwrap().take_events()
}

fn submitted_commands(events: &[RavelEmptyEvent]) -> Vec<Vec<RavelEmptyCommand>> {
    events
        .iter()
        .filter_map(|x| match x {
            RavelEmptyEvent::Submitted { commands, .. } => Some(commands.clone()),
            _ => None,
        })
        .collect()
}

fn barriers(commands: &[RavelEmptyCommand]) -> Vec<RavelEmptyCommand> {
    commands
        .iter()
        .filter(|x| matches!(x, RavelEmptyCommand::Barrier { .. }))
        .cloned()
        .collect()
}

fn rendered_color_texture_ids(commands: &[RavelEmptyCommand]) -> Vec<u64> {
    commands
        .iter()
        .filter_map(|x| match x {
            RavelEmptyCommand::BeginRendering {
                color_texture_ids, ..
            } => color_texture_ids.first().copied(),
            _ => None,
        })
        .collect()
}

fn texture_id(
    backend: &RenderBackend,
    image: ImageHandle,
) -> u64 {
    backend.texture(image).empty_texture().unwrap().texture_id()
}

fn color_description(size: u32) -> ImageDescription {
    ImageDescription::new_2d(
        RavelFormat::R8G8B8A8_UNORM,
        size,
        size,
        RavelTextureUsage::SAMPLED | RavelTextureUsage::COLOR_ATTACHMENT,
    )
}

fn storage_description(size: u32) -> ImageDescription {
    ImageDescription::new_2d(
        RavelFormat::R16G16B16A16_SFLOAT,
        size,
        size,
        RavelTextureUsage::SAMPLED | RavelTextureUsage::STORAGE,
    )
}

fn clear_pass(
    name: &str,
    target: ImageHandle,
) -> PassDeclaration {
    PassDeclaration::graphic(name).color_target(target, 0, RavelLoadOp::Clear, Default::default())
}

// Draws into `target` while sampling `source`
fn blit_pass(
    name: &str,
    layout: &ravel_framework::api::RavelDescriptorSetLayout,
    source: ImageHandle,
    target: ImageHandle,
) -> PassDeclaration {
    PassDeclaration::graphic(name)
        .color_target(target, 0, RavelLoadOp::DontCare, Default::default())
        .descriptor_set_layout(layout)
        .sampled_image(0, source, MipSelection::All)
        .record_inline(|context| context.command_buffer.cmd_draw(3, 0))
}

fn sampling_layout(backend: &mut RenderBackend) -> ravel_framework::api::RavelDescriptorSetLayout {
    backend
        .create_descriptor_set_layout(&ReflectedBindings {
            sampled_images: vec![0],
            ..Default::default()
        })
        .unwrap()
}

fn finish_frame(backend: &mut RenderBackend) {
    backend.resolve_temporaries().unwrap();
    backend.synthesize_and_record().unwrap();
    backend.submit(None).unwrap();
}

#[test]
fn test_write_then_read_emits_one_transition() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let image = backend.create_image(&storage_description(16)).unwrap();
    let write = backend
        .create_compute_pipeline(
            &[0; 4],
            "main",
            &ReflectedBindings {
                storage_images: vec![0],
                ..Default::default()
            },
        )
        .unwrap();
    let read = backend
        .create_compute_pipeline(
            &[0; 4],
            "main",
            &ReflectedBindings {
                sampled_images: vec![0],
                ..Default::default()
            },
        )
        .unwrap();

    backend.begin_frame().unwrap();
    backend
        .declare_pass(PassDeclaration::compute("write", &write, [4, 4, 1]).storage_image(0, image, 0))
        .unwrap();
    backend
        .declare_pass(
            PassDeclaration::compute("read", &read, [4, 4, 1]).sampled_image(
                0,
                image,
                MipSelection::All,
            ),
        )
        .unwrap();
    take_events(&device_context);
    finish_frame(&mut backend);

    let events = take_events(&device_context);
    let commands = &submitted_commands(&events)[0];
    let barriers = barriers(commands);
    assert_eq!(barriers.len(), 2);

    // The first barrier only moves the image out of its initial layout
    let between_passes = match &barriers[1] {
        RavelEmptyCommand::Barrier {
            texture_barriers, ..
        } => texture_barriers.clone(),
        _ => unreachable!(),
    };
    assert_eq!(between_passes.len(), 1);
    assert_eq!(between_passes[0].texture_id, texture_id(&backend, image));
    assert_eq!(between_passes[0].src_layout, RavelImageLayout::General);
    assert_eq!(between_passes[0].dst_layout, RavelImageLayout::ShaderReadOnly);
    assert!(between_passes[0]
        .src_access
        .contains(RavelAccessFlags::SHADER_WRITE));

    let dispatches = commands
        .iter()
        .filter(|x| matches!(x, RavelEmptyCommand::Dispatch { group_count: [4, 4, 1] }))
        .count();
    assert_eq!(dispatches, 2);

    let state = backend.image_state(image);
    assert_eq!(state.mip_layout(0), RavelImageLayout::ShaderReadOnly);
    assert!(!state.currently_writing());
}

#[test]
fn test_downsample_pass_reads_previous_write() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let chain = backend
        .create_image(&storage_description(16).with_mip_policy(MipPolicy::FullChain))
        .unwrap();
    let target = backend.create_image(&color_description(8)).unwrap();
    let fill = backend
        .create_compute_pipeline(
            &[0; 4],
            "main",
            &ReflectedBindings {
                storage_images: vec![0],
                ..Default::default()
            },
        )
        .unwrap();
    let downsample_layout = backend
        .create_descriptor_set_layout(&ReflectedBindings {
            sampled_images: vec![0],
            storage_images: vec![1],
            ..Default::default()
        })
        .unwrap();

    let bound: Arc<Mutex<Vec<RavelEmptyDescriptorWrite>>> = Default::default();
    let bound_in_recorder = bound.clone();

    backend.begin_frame().unwrap();
    backend
        .declare_pass(PassDeclaration::compute("fill", &fill, [2, 2, 1]).storage_image(0, chain, 0))
        .unwrap();
    backend
        .declare_pass(
            PassDeclaration::graphic("downsample")
                .color_target(target, 0, RavelLoadOp::DontCare, Default::default())
                .descriptor_set_layout(&downsample_layout)
                .sampled_image(0, chain, MipSelection::Level(0))
                .storage_image(1, chain, 1)
                .record_inline(move |context| {
                    let descriptor_set = context.descriptor_set.unwrap();
                    *bound_in_recorder.lock().unwrap() = descriptor_set
                        .empty_descriptor_set()
                        .unwrap()
                        .written_bindings();
                    context.command_buffer.cmd_draw(3, 0)
                }),
        )
        .unwrap();
    take_events(&device_context);
    finish_frame(&mut backend);

    // Mip 0 moves from the fill's storage write to the sampled layout before the downsample
    let chain_id = texture_id(&backend, chain);
    let events = take_events(&device_context);
    let read_barriers: Vec<_> = barriers(&submitted_commands(&events)[0])
        .into_iter()
        .flat_map(|x| match x {
            RavelEmptyCommand::Barrier {
                texture_barriers, ..
            } => texture_barriers,
            _ => unreachable!(),
        })
        .filter(|x| x.texture_id == chain_id && x.base_mip_level == 0)
        .collect();
    assert_eq!(read_barriers.len(), 2);
    assert_eq!(read_barriers[1].src_layout, RavelImageLayout::General);
    assert_eq!(read_barriers[1].dst_layout, RavelImageLayout::ShaderReadOnly);
    assert!(read_barriers[1]
        .src_access
        .contains(RavelAccessFlags::SHADER_WRITE));

    let state = backend.image_state(chain);
    assert_eq!(state.mip_layout(0), RavelImageLayout::ShaderReadOnly);
    assert_eq!(state.mip_layout(1), RavelImageLayout::General);

    // Descriptors are written with the layouts the mips are in during the pass
    let bound = bound.lock().unwrap();
    assert_eq!(bound[0].mip_slice, Some(0));
    assert_eq!(bound[0].image_layout, Some(RavelImageLayout::ShaderReadOnly));
    assert_eq!(bound[1].mip_slice, Some(1));
    assert_eq!(bound[1].image_layout, Some(RavelImageLayout::General));
}

#[test]
fn test_sampled_view_partly_bound_as_storage_is_rejected() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    let chain = backend
        .create_image(&storage_description(16).with_mip_policy(MipPolicy::FullChain))
        .unwrap();
    let pipeline = backend
        .create_compute_pipeline(
            &[0; 4],
            "main",
            &ReflectedBindings {
                sampled_images: vec![0],
                storage_images: vec![1],
                ..Default::default()
            },
        )
        .unwrap();

    backend.begin_frame().unwrap();
    let result = backend.declare_pass(
        PassDeclaration::compute("partial", &pipeline, [1, 1, 1])
            .sampled_image(0, chain, MipSelection::All)
            .storage_image(1, chain, 1),
    );
    assert!(matches!(
        result,
        Err(ravel_framework::RavelError::ValidationFailure(_))
    ));

    // Sampling and storing the same single mip is allowed
    let result = backend.declare_pass(
        PassDeclaration::compute("in place", &pipeline, [1, 1, 1])
            .sampled_image(0, chain, MipSelection::Level(1))
            .storage_image(1, chain, 1),
    );
    assert_eq!(result.unwrap(), 0);
}

#[test]
fn test_repeated_reads_need_no_barrier_next_frame() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let layout = sampling_layout(&mut backend);
    let source = backend.create_image(&color_description(8)).unwrap();
    let target = backend.create_image(&color_description(8)).unwrap();

    for _ in 0..2 {
        backend.begin_frame().unwrap();
        backend.declare_pass(clear_pass("fill", source)).unwrap();
        backend
            .declare_pass(blit_pass("blit", &layout, source, target))
            .unwrap();
        finish_frame(&mut backend);
    }

    // Frame with only reads of a resource that was left in the read layout
    take_events(&device_context);
    let other_target = backend.create_image(&color_description(8)).unwrap();
    backend.begin_frame().unwrap();
    backend
        .declare_pass(blit_pass("blit a", &layout, source, target))
        .unwrap();
    backend
        .declare_pass(blit_pass("blit b", &layout, source, other_target))
        .unwrap();
    finish_frame(&mut backend);

    let events = take_events(&device_context);
    let commands = &submitted_commands(&events)[0];
    let source_id = texture_id(&backend, source);
    for barrier in barriers(commands) {
        if let RavelEmptyCommand::Barrier {
            texture_barriers, ..
        } = barrier
        {
            assert!(texture_barriers.iter().all(|x| x.texture_id != source_id));
        }
    }
}

#[test]
fn test_disjoint_temporaries_share_a_pooled_image() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let layout = sampling_layout(&mut backend);
    let output = backend.create_image(&color_description(32)).unwrap();

    backend.begin_frame().unwrap();
    let t1 = backend.create_temporary_image(&color_description(32));
    let t2 = backend.create_temporary_image(&color_description(32));
    backend.declare_pass(clear_pass("t1", t1)).unwrap();
    backend
        .declare_pass(blit_pass("use t1", &layout, t1, output))
        .unwrap();
    backend.declare_pass(clear_pass("t2", t2)).unwrap();
    backend
        .declare_pass(blit_pass("use t2", &layout, t2, output))
        .unwrap();

    backend.resolve_temporaries().unwrap();
    assert_eq!(backend.physical_image(t1), backend.physical_image(t2));
    assert_eq!(backend.pooled_image_count(), 1);

    take_events(&device_context);
    backend.synthesize_and_record().unwrap();
    backend.submit(None).unwrap();

    let events = take_events(&device_context);
    let rendered = rendered_color_texture_ids(&submitted_commands(&events)[0]);
    assert_eq!(rendered[0], rendered[2]);
}

#[test]
fn test_overlapping_temporaries_get_different_images() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    let layout = sampling_layout(&mut backend);

    backend.begin_frame().unwrap();
    let t1 = backend.create_temporary_image(&color_description(32));
    let t2 = backend.create_temporary_image(&color_description(32));
    let output = backend.create_temporary_image(&color_description(32));
    backend.declare_pass(clear_pass("t1", t1)).unwrap();
    backend.declare_pass(clear_pass("t2", t2)).unwrap();
    backend
        .declare_pass(blit_pass("use t2", &layout, t2, output))
        .unwrap();
    backend
        .declare_pass(blit_pass("use t1", &layout, t1, output))
        .unwrap();
    backend.resolve_temporaries().unwrap();

    assert_ne!(backend.physical_image(t1), backend.physical_image(t2));
    assert_ne!(backend.physical_image(t1), backend.physical_image(output));
    assert_ne!(backend.physical_image(t2), backend.physical_image(output));
    assert_eq!(backend.pooled_image_count(), 3);

    backend.synthesize_and_record().unwrap();
    backend.submit(None).unwrap();
}

#[test]
fn test_pool_size_is_stable_across_identical_frames() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let layout = sampling_layout(&mut backend);
    let output = backend.create_image(&color_description(16)).unwrap();

    let mut pool_sizes = Vec::default();
    for _ in 0..4 {
        backend.begin_frame().unwrap();
        let t1 = backend.create_temporary_image(&color_description(16));
        let t2 = backend.create_temporary_image(&color_description(16));
        backend.declare_pass(clear_pass("t1", t1)).unwrap();
        backend.declare_pass(clear_pass("t2", t2)).unwrap();
        backend
            .declare_pass(blit_pass("use t1", &layout, t1, output))
            .unwrap();
        backend
            .declare_pass(blit_pass("use t2", &layout, t2, output))
            .unwrap();
        finish_frame(&mut backend);
        pool_sizes.push(backend.pooled_image_count());
    }

    assert_eq!(pool_sizes, vec![2, 2, 2, 2]);
    let destroyed = take_events(&device_context)
        .iter()
        .filter(|x| matches!(x, RavelEmptyEvent::TextureDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 0);
}

// Frame 0 uses two temporaries, every later frame uses one
fn run_shrinking_frames(
    backend: &mut RenderBackend,
    frame_count: usize,
    mut after_begin: impl FnMut(usize, &RenderBackend),
) {
    let layout = sampling_layout(backend);
    let output = backend.create_image(&color_description(16)).unwrap();

    for frame in 0..frame_count {
        backend.begin_frame().unwrap();
        after_begin(frame, backend);

        let t1 = backend.create_temporary_image(&color_description(16));
        backend.declare_pass(clear_pass("t1", t1)).unwrap();
        if frame == 0 {
            let t2 = backend.create_temporary_image(&color_description(16));
            backend.declare_pass(clear_pass("t2", t2)).unwrap();
            backend
                .declare_pass(blit_pass("use t2", &layout, t2, output))
                .unwrap();
        }
        backend
            .declare_pass(blit_pass("use t1", &layout, t1, output))
            .unwrap();
        finish_frame(backend);
    }
}

#[test]
fn test_unused_pooled_image_is_evicted_after_queue_idle() {
    let (device_context, _queue, mut backend) = setup(RenderBackendConfig {
        pooled_image_eviction: PooledImageEvictionPolicy::WaitForQueueIdle,
        ..Default::default()
    });

    let mut eviction_events = Vec::default();
    run_shrinking_frames(&mut backend, 3, |frame, backend| {
        let events = take_events(&device_context);
        if frame == 2 {
            eviction_events = events;
            assert_eq!(backend.pooled_image_count(), 1);
            assert_eq!(backend.pending_eviction_count(), 0);
        } else {
            assert_eq!(backend.pooled_image_count(), if frame == 0 { 0 } else { 2 });
        }
    });

    // The image is destroyed right after the queue goes idle
    let idle = eviction_events
        .iter()
        .position(|x| *x == RavelEmptyEvent::QueueWaitIdle)
        .unwrap();
    let destroyed = eviction_events
        .iter()
        .position(|x| matches!(x, RavelEmptyEvent::TextureDestroyed { .. }))
        .unwrap();
    assert!(idle < destroyed);
}

#[test]
fn test_unused_pooled_image_is_evicted_after_frames_complete() {
    let (device_context, _queue, mut backend) = setup(RenderBackendConfig {
        pooled_image_eviction: PooledImageEvictionPolicy::DeferUntilFramesComplete,
        ..Default::default()
    });
    let live_textures = |device_context: &RavelDeviceContext| {
        device_context
            .empty_device_context()
            .unwrap()
            .live_texture_count()
    };

    let mut live_after_eviction = 0;
    let mut pending = Vec::default();
    run_shrinking_frames(&mut backend, 6, |frame, backend| {
        pending.push(backend.pending_eviction_count());
        if frame == 2 {
            live_after_eviction = live_textures(&device_context);
        }
    });

    // Evicted when frame 2 begins, destroyed once MAX_FRAMES_IN_FLIGHT + 1 more frames began
    assert_eq!(pending, vec![0, 0, 1, 1, 1, 0]);
    assert_eq!(backend.pooled_image_count(), 1);
    assert_eq!(live_textures(&device_context), live_after_eviction - 1);
    assert!(!take_events(&device_context).contains(&RavelEmptyEvent::QueueWaitIdle));
}

#[test]
fn test_slot_reuse_waits_for_fence() {
    let (device_context, _queue, mut backend) = setup(Default::default());

    for _ in 0..4 {
        backend.begin_frame().unwrap();
        finish_frame(&mut backend);
    }

    let events = take_events(&device_context);
    let submissions: Vec<(usize, u64, u64)> = events
        .iter()
        .enumerate()
        .filter_map(|(i, x)| match x {
            RavelEmptyEvent::Submitted {
                command_buffer_ids,
                signal_fence_id,
                ..
            } => Some((i, command_buffer_ids[0], signal_fence_id.unwrap())),
            _ => None,
        })
        .collect();
    assert_eq!(submissions.len(), 4);

    // Frames 2 and 3 reuse the slots of frames 0 and 1
    for reuse in 2..4 {
        let (previous_submit, command_buffer_id, fence_id) = submissions[reuse - 2];
        assert_eq!(submissions[reuse].1, command_buffer_id);
        assert_eq!(submissions[reuse].2, fence_id);

        let begun = events
            .iter()
            .enumerate()
            .skip(previous_submit)
            .find(|(_, x)| **x == RavelEmptyEvent::CommandBufferBegun { command_buffer_id })
            .map(|(i, _)| i)
            .unwrap();
        let observed = events
            .iter()
            .enumerate()
            .skip(previous_submit)
            .find(|(_, x)| **x == RavelEmptyEvent::FenceObserved { fence_id })
            .map(|(i, _)| i)
            .unwrap();
        assert!(observed < begun);
    }
}

#[test]
fn test_queued_writes_last_write_wins() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    let buffer = backend
        .create_buffer(&RavelBufferDef {
            size: 4,
            usage: RavelBufferUsage::UNIFORM,
            memory_usage: RavelMemoryUsage::CpuToGpu,
        })
        .unwrap();
    let contents = |backend: &RenderBackend, slot_index: usize| {
        backend
            .buffer_for_slot(buffer, slot_index)
            .empty_buffer()
            .unwrap()
            .contents()
    };

    backend.begin_frame().unwrap();
    backend.queue_buffer_write(buffer, &[1, 1, 1, 1]).unwrap();
    backend.queue_buffer_write(buffer, &[2, 2, 2, 2]).unwrap();
    let slot = backend.current_slot_index();
    finish_frame(&mut backend);
    assert_eq!(contents(&backend, slot), vec![2, 2, 2, 2]);
    assert_eq!(contents(&backend, 1 - slot), vec![0, 0, 0, 0]);

    // The other copy catches up when its slot submits
    backend.begin_frame().unwrap();
    finish_frame(&mut backend);
    assert_eq!(contents(&backend, 1 - slot), vec![2, 2, 2, 2]);

    // Too large, and GPU-only buffers can't be written
    backend.begin_frame().unwrap();
    assert!(backend.queue_buffer_write(buffer, &[0; 8]).is_err());
    let gpu_only = backend
        .create_buffer(&RavelBufferDef {
            size: 4,
            usage: RavelBufferUsage::STORAGE,
            memory_usage: RavelMemoryUsage::GpuOnly,
        })
        .unwrap();
    assert!(backend.queue_buffer_write(gpu_only, &[0; 4]).is_err());
    finish_frame(&mut backend);
}

#[test]
fn test_storage_buffer_written_then_read() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let buffer = backend
        .create_buffer(&RavelBufferDef {
            size: 256,
            usage: RavelBufferUsage::STORAGE,
            memory_usage: RavelMemoryUsage::GpuOnly,
        })
        .unwrap();
    let pipeline = backend
        .create_compute_pipeline(
            &[0; 4],
            "main",
            &ReflectedBindings {
                storage_buffers: vec![0],
                ..Default::default()
            },
        )
        .unwrap();

    backend.begin_frame().unwrap();
    backend
        .declare_pass(PassDeclaration::compute("produce", &pipeline, [1, 1, 1]).storage_buffer(0, buffer, false))
        .unwrap();
    backend
        .declare_pass(PassDeclaration::compute("consume a", &pipeline, [1, 1, 1]).storage_buffer(0, buffer, true))
        .unwrap();
    backend
        .declare_pass(PassDeclaration::compute("consume b", &pipeline, [1, 1, 1]).storage_buffer(0, buffer, true))
        .unwrap();
    take_events(&device_context);
    finish_frame(&mut backend);

    let events = take_events(&device_context);
    let buffer_barriers: Vec<_> = barriers(&submitted_commands(&events)[0])
        .into_iter()
        .filter_map(|x| match x {
            RavelEmptyCommand::Barrier {
                buffer_barriers, ..
            } if !buffer_barriers.is_empty() => Some(buffer_barriers),
            _ => None,
        })
        .collect();
    assert_eq!(buffer_barriers.len(), 1);
    assert_eq!(buffer_barriers[0].len(), 1);
    assert!(!backend.state_table().buffer_state(buffer).is_being_written());
}

#[test]
fn test_pass_timings_are_read_when_slot_is_reused() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    let pipeline = backend
        .create_compute_pipeline(&[0; 4], "main", &Default::default())
        .unwrap();

    for _ in 0..MAX_FRAMES_IN_FLIGHT {
        backend.begin_frame().unwrap();
        backend
            .declare_pass(PassDeclaration::compute("first", &pipeline, [1, 1, 1]))
            .unwrap();
        backend
            .declare_pass(PassDeclaration::compute("second", &pipeline, [1, 1, 1]))
            .unwrap();
        finish_frame(&mut backend);
    }
    assert!(backend.last_pass_timings().is_empty());

    backend.begin_frame().unwrap();
    let timings = backend.last_pass_timings();
    assert_eq!(timings.len(), 2);
    assert_eq!(timings[0].name, "first");
    assert_eq!(timings[1].name, "second");
    assert!(timings.iter().all(|x| x.duration_ms > 0.0));
}

#[test]
fn test_timestamps_limited_to_configured_pass_count() {
    let (device_context, _queue, mut backend) = setup(RenderBackendConfig {
        max_timestamped_passes: 1,
        ..Default::default()
    });
    let pipeline = backend
        .create_compute_pipeline(&[0; 4], "main", &Default::default())
        .unwrap();

    backend.begin_frame().unwrap();
    for name in ["a", "b", "c"] {
        backend
            .declare_pass(PassDeclaration::compute(name, &pipeline, [1, 1, 1]))
            .unwrap();
    }
    take_events(&device_context);
    finish_frame(&mut backend);

    let events = take_events(&device_context);
    let commands = &submitted_commands(&events)[0];
    let timestamps = commands
        .iter()
        .filter(|x| matches!(x, RavelEmptyCommand::WriteTimestamp { .. }))
        .count();
    let dispatches = commands
        .iter()
        .filter(|x| matches!(x, RavelEmptyCommand::Dispatch { .. }))
        .count();
    assert_eq!(timestamps, 2);
    assert_eq!(dispatches, 3);
}

#[test]
fn test_present_transitions_and_signals() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    let present_target = RavelPresentTargetEmpty::default();
    let image = backend.create_image(&color_description(16)).unwrap();

    backend.begin_frame().unwrap();
    backend.declare_pass(clear_pass("draw", image)).unwrap();
    backend.resolve_temporaries().unwrap();
    backend.synthesize_and_record().unwrap();
    take_events(&device_context);
    backend
        .submit(Some(PresentRequest {
            image,
            target: &present_target,
        }))
        .unwrap();

    assert_eq!(present_target.present_count(), 1);
    assert_eq!(
        backend.image_state(image).mip_layout(0),
        RavelImageLayout::Present
    );

    let events = take_events(&device_context);
    let (commands, signals) = events
        .iter()
        .find_map(|x| match x {
            RavelEmptyEvent::Submitted {
                commands,
                signal_semaphore_ids,
                ..
            } => Some((commands.clone(), signal_semaphore_ids.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(signals.len(), 1);

    match barriers(&commands).last().unwrap() {
        RavelEmptyCommand::Barrier {
            texture_barriers, ..
        } => {
            assert_eq!(texture_barriers[0].src_layout, RavelImageLayout::ColorAttachment);
            assert_eq!(texture_barriers[0].dst_layout, RavelImageLayout::Present);
        }
        _ => unreachable!(),
    }

    let presented = events
        .iter()
        .find_map(|x| match x {
            RavelEmptyEvent::Presented { wait_semaphore_ids } => Some(wait_semaphore_ids.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(presented, signals);
}

#[test]
#[should_panic(expected = "synthesize_and_record called in phase Declaring")]
fn test_record_before_resolve_panics() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    backend.begin_frame().unwrap();
    let _ = backend.synthesize_and_record();
}

#[test]
#[should_panic(expected = "begin_frame called in phase Declaring")]
fn test_begin_frame_twice_panics() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    backend.begin_frame().unwrap();
    let _ = backend.begin_frame();
}

#[test]
#[should_panic(expected = "was created in frame")]
fn test_temporary_from_previous_frame_panics() {
    let (_device_context, _queue, mut backend) = setup(Default::default());
    backend.begin_frame().unwrap();
    let temporary = backend.create_temporary_image(&color_description(8));
    backend.declare_pass(clear_pass("t", temporary)).unwrap();
    finish_frame(&mut backend);

    backend.begin_frame().unwrap();
    let _ = backend.declare_pass(clear_pass("stale", temporary));
}

#[test]
fn test_wait_for_idle_observes_submitted_fences() {
    let (device_context, _queue, mut backend) = setup(Default::default());
    for _ in 0..2 {
        backend.begin_frame().unwrap();
        finish_frame(&mut backend);
    }
    take_events(&device_context);

    backend.wait_for_idle().unwrap();
    let events = take_events(&device_context);
    let observed = events
        .iter()
        .filter(|x| matches!(x, RavelEmptyEvent::FenceObserved { .. }))
        .count();
    assert_eq!(observed, MAX_FRAMES_IN_FLIGHT);
    assert_eq!(events.last(), Some(&RavelEmptyEvent::QueueWaitIdle));
}
