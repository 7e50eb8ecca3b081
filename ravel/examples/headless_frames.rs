use log::LevelFilter;

use ravel::api::empty::{RavelApiDefEmpty, RavelEmptyEvent, RavelPresentTargetEmpty};
use ravel::api::*;
use ravel::framework::*;

const FRAME_COUNT: usize = 6;
const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_nanos()
        .filter_level(LevelFilter::Debug)
        .init();

    run().unwrap();
}

fn run() -> RavelResult<()> {
    //
    // A headless device. Everything the frame core does is recorded in the device's event log.
    //
    let device_context = RavelDeviceContext::new_empty(&RavelApiDefEmpty {
        texture_memory_budget: Some(256 * 1024 * 1024),
    });
    let queue = device_context.create_queue(RavelQueueType::Graphics)?;
    let present_target = RavelPresentTargetEmpty::default();

    // Wrap all of this so that it gets dropped before the device context
    {
        let mut backend = RenderBackend::new(
            &device_context,
            &queue,
            RenderBackendConfig::default(),
            Box::new(RecordingThreadPoolScoped::new(4)),
        )?;

        //
        // Persistent resources
        //
        let swapchain_image = backend.create_image(&ImageDescription::new_2d(
            RavelFormat::B8G8R8A8_UNORM,
            WIDTH,
            HEIGHT,
            RavelTextureUsage::COLOR_ATTACHMENT,
        ))?;
        let depth_image = backend.create_image(&ImageDescription::new_2d(
            RavelFormat::D32_SFLOAT,
            WIDTH,
            HEIGHT,
            RavelTextureUsage::DEPTH_STENCIL_ATTACHMENT,
        ))?;
        let frame_constants = backend.create_buffer(&RavelBufferDef {
            size: 16,
            usage: RavelBufferUsage::UNIFORM,
            memory_usage: RavelMemoryUsage::CpuToGpu,
        })?;
        let sampler = backend.create_sampler(&RavelSamplerDef::default())?;

        //
        // Shaders come from an external compiler. The empty device accepts any non-empty
        // bytecode.
        //
        let bloom_pipeline = backend.create_compute_pipeline(
            &[0x03, 0x02, 0x23, 0x07],
            "main",
            &ReflectedBindings {
                sampled_images: vec![0],
                storage_images: vec![1],
                samplers: vec![2],
                ..Default::default()
            },
        )?;
        let composite_layout = backend.create_descriptor_set_layout(&ReflectedBindings {
            sampled_images: vec![0, 1],
            uniform_buffers: vec![2],
            samplers: vec![3],
            ..Default::default()
        })?;

        let hdr_description = ImageDescription::new_2d(
            RavelFormat::R16G16B16A16_SFLOAT,
            WIDTH,
            HEIGHT,
            RavelTextureUsage::COLOR_ATTACHMENT | RavelTextureUsage::SAMPLED,
        );
        let bloom_description = ImageDescription::new_2d(
            RavelFormat::R16G16B16A16_SFLOAT,
            WIDTH,
            HEIGHT,
            RavelTextureUsage::STORAGE | RavelTextureUsage::SAMPLED,
        );

        for frame in 0..FRAME_COUNT {
            profiling::scope!("Frame");
            backend.begin_frame()?;

            let time = frame as f32 / 60.0;
            let constants: Vec<u8> = [time, WIDTH as f32, HEIGHT as f32, 0.0]
                .iter()
                .flat_map(|x| x.to_ne_bytes())
                .collect();
            backend.queue_buffer_write(frame_constants, &constants)?;

            let hdr = backend.create_temporary_image(&hdr_description);
            let bloom = backend.create_temporary_image(&bloom_description);

            backend.declare_pass(
                PassDeclaration::graphic("opaque")
                    .color_target(hdr, 0, RavelLoadOp::Clear, RavelColorClearValue([0.0; 4]))
                    .depth_target(depth_image, RavelLoadOp::Clear, Default::default())
                    .record_parallel(|context| {
                        // Each worker draws its share of a grid of quads
                        for i in 0..16 {
                            let quad = context.worker_index + i * context.worker_count;
                            context.command_buffer.cmd_draw(6, quad as u32 * 6)?;
                        }
                        Ok(())
                    }),
            )?;

            backend.declare_pass(
                PassDeclaration::compute("bloom", &bloom_pipeline, [WIDTH / 8, HEIGHT / 8, 1])
                    .sampled_image(0, hdr, MipSelection::All)
                    .storage_image(1, bloom, 0)
                    .sampler(2, sampler),
            )?;

            backend.declare_pass(
                PassDeclaration::graphic("composite")
                    .color_target(swapchain_image, 0, RavelLoadOp::DontCare, Default::default())
                    .descriptor_set_layout(&composite_layout)
                    .sampled_image(0, hdr, MipSelection::All)
                    .sampled_image(1, bloom, MipSelection::All)
                    .uniform_buffer(2, frame_constants)
                    .sampler(3, sampler)
                    .record_inline(|context| context.command_buffer.cmd_draw(3, 0)),
            )?;

            backend.resolve_temporaries()?;
            backend.synthesize_and_record()?;
            backend.submit(Some(PresentRequest {
                image: swapchain_image,
                target: &present_target,
            }))?;

            log::info!(
                "Frame {} submitted, {} pooled images",
                frame,
                backend.pooled_image_count()
            );
            for timing in backend.last_pass_timings() {
                log::info!("  {}: {:.4} ms", timing.name, timing.duration_ms);
            }
        }

        backend.wait_for_idle()?;
    }

    let events = device_context
        .empty_device_context()
        .map(|x| x.take_events())
        .unwrap_or_default();
    let submissions = events
        .iter()
        .filter(|x| matches!(x, RavelEmptyEvent::Submitted { .. }))
        .count();
    let fence_waits = events
        .iter()
        .filter(|x| matches!(x, RavelEmptyEvent::FenceObserved { .. }))
        .count();
    log::info!(
        "{} submissions, {} fence waits, {} presents",
        submissions,
        fence_waits,
        present_target.present_count()
    );

    Ok(())
}
