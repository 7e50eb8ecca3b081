use super::{FrameSlot, FrameSlotState, PassTiming, PendingBufferWrite};
use crate::{BufferHandle, PersistentResources, RenderBackendConfig};
use ravel_api::{
    RavelDeviceContext, RavelPresentTarget, RavelQueue, RavelResult, RavelSemaphore,
    MAX_FRAMES_IN_FLIGHT,
};
use std::sync::Arc;

/// Rotates between `MAX_FRAMES_IN_FLIGHT` frame slots so the CPU can record a frame while the
/// GPU works on the previous one. A slot is only reused once the fence of the frame that last
/// used it is observed signaled.
pub struct FramePacer {
    queue: RavelQueue,
    slots: Vec<FrameSlot>,
    // Frames submitted so far. The next frame uses slot frame_index % MAX_FRAMES_IN_FLIGHT.
    frame_index: u64,
    current_slot: Option<usize>,
    timestamp_period_ns: f32,
    last_pass_timings: Vec<PassTiming>,
}

impl FramePacer {
    pub fn new(
        device_context: &RavelDeviceContext,
        queue: &RavelQueue,
        config: &RenderBackendConfig,
        worker_count: usize,
    ) -> RavelResult<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            slots.push(FrameSlot::new(device_context, queue, config, worker_count)?);
        }

        Ok(FramePacer {
            queue: queue.clone(),
            slots,
            frame_index: 0,
            current_slot: None,
            timestamp_period_ns: device_context.device_info().timestamp_period_ns,
            last_pass_timings: Default::default(),
        })
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn is_in_frame(&self) -> bool {
        self.current_slot.is_some()
    }

    pub fn slot_state(
        &self,
        slot_index: usize,
    ) -> FrameSlotState {
        self.slots[slot_index].state
    }

    /// Per-pass GPU times of the most recent frame whose results have been read back
    pub fn last_pass_timings(&self) -> &[PassTiming] {
        &self.last_pass_timings
    }

    pub fn current_slot_index(&self) -> usize {
        self.current_slot
            .unwrap_or_else(|| panic!("no frame is in progress on the frame pacer"))
    }

    pub(crate) fn current_slot(&self) -> &FrameSlot {
        &self.slots[self.current_slot_index()]
    }

    pub(crate) fn current_slot_mut(&mut self) -> &mut FrameSlot {
        let slot_index = self.current_slot_index();
        &mut self.slots[slot_index]
    }

    /// Selects the next slot, blocking until the GPU is done with it. Returns the slot index.
    #[profiling::function]
    pub fn begin_frame(&mut self) -> RavelResult<usize> {
        assert!(
            self.current_slot.is_none(),
            "begin_frame called while frame {} is still being recorded",
            self.frame_index
        );

        let slot_index = (self.frame_index % MAX_FRAMES_IN_FLIGHT as u64) as usize;
        let slot = &mut self.slots[slot_index];
        log::trace!("Begin frame {} on slot {}", self.frame_index, slot_index);

        if slot.state == FrameSlotState::Submitted {
            profiling::scope!("Wait for frame slot fence");
            slot.fence.wait()?;
            slot.state = FrameSlotState::Idle;
        }

        let timings = slot.read_pass_timings(self.timestamp_period_ns)?;
        if !timings.is_empty() {
            self.last_pass_timings = timings;
        }

        slot.reset()?;
        slot.state = FrameSlotState::Recording;
        self.current_slot = Some(slot_index);
        Ok(slot_index)
    }

    /// Queues a write to a host-writable buffer. Each slot has its own copy of the buffer, so the
    /// write is queued on every slot and lands in a copy once that copy's slot is safe to touch.
    /// Writes to the same buffer apply in call order.
    pub fn queue_write(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
    ) {
        let data: Arc<[u8]> = Arc::from(data);
        for slot in &mut self.slots {
            slot.pending_writes.push_back(PendingBufferWrite {
                buffer,
                data: data.clone(),
            });
        }
    }

    /// Flushes the current slot's queued writes to its buffer copies in FIFO order. The slot's
    /// fence was waited on in `begin_frame`, so nothing the GPU reads is overwritten.
    #[profiling::function]
    pub(crate) fn apply_pending_writes(
        &mut self,
        resources: &PersistentResources,
    ) -> RavelResult<()> {
        let slot_index = self.current_slot_index();
        let slot = &mut self.slots[slot_index];
        while let Some(write) = slot.pending_writes.pop_front() {
            let buffer = match resources.try_buffer(write.buffer) {
                Some(buffer) => buffer,
                None => {
                    log::trace!(
                        "Dropping queued write to destroyed buffer {:?}",
                        write.buffer
                    );
                    continue;
                }
            };

            log::trace!(
                "Write {} bytes to buffer {:?} (slot {})",
                write.data.len(),
                write.buffer,
                slot_index
            );
            buffer
                .copy_for_slot(slot_index)
                .copy_to_host_visible_buffer(&write.data)?;
        }

        Ok(())
    }

    /// Submits the current slot's command buffer, which must already be ended. If a present
    /// target is given, presentation waits on the submission through the slot's render-finished
    /// semaphore.
    #[profiling::function]
    pub fn submit(
        &mut self,
        present_target: Option<&dyn RavelPresentTarget>,
    ) -> RavelResult<()> {
        let slot_index = self.current_slot_index();
        let slot = &mut self.slots[slot_index];

        let wait_semaphores: Vec<&RavelSemaphore> = present_target
            .and_then(|x| x.image_available_semaphore())
            .into_iter()
            .collect();
        let signal_semaphores: Vec<&RavelSemaphore> = if present_target.is_some() {
            vec![&slot.render_finished_semaphore]
        } else {
            vec![]
        };

        self.queue.submit(
            &[&slot.command_buffer],
            &wait_semaphores,
            &signal_semaphores,
            Some(&slot.fence),
        )?;
        slot.state = FrameSlotState::Submitted;
        self.current_slot = None;
        self.frame_index += 1;

        if let Some(present_target) = present_target {
            present_target.present(&self.queue, &[&slot.render_finished_semaphore])?;
        }

        Ok(())
    }

    /// Blocks until every submitted frame has completed
    pub fn wait_for_idle(&mut self) -> RavelResult<()> {
        for slot in &mut self.slots {
            if slot.state == FrameSlotState::Submitted {
                slot.fence.wait()?;
                slot.state = FrameSlotState::Idle;
            }
        }

        self.queue.wait_for_queue_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_api::empty::{RavelEmptyEvent, RavelPresentTargetEmpty};
    use ravel_api::{RavelBufferDef, RavelBufferUsage, RavelMemoryUsage, RavelQueueType};

    fn setup() -> (RavelDeviceContext, RavelQueue, FramePacer) {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let queue = device_context
            .create_queue(RavelQueueType::Graphics)
            .unwrap();
        let pacer = FramePacer::new(&device_context, &queue, &Default::default(), 1).unwrap();
        (device_context, queue, pacer)
    }

    fn record_empty_frame(pacer: &mut FramePacer) {
        let command_buffer = &pacer.current_slot().command_buffer;
        command_buffer.begin().unwrap();
        command_buffer.end().unwrap();
    }

    #[test]
    fn test_slots_alternate() {
        let (_device_context, _queue, mut pacer) = setup();
        for frame in 0..5 {
            let slot_index = pacer.begin_frame().unwrap();
            assert_eq!(slot_index, frame % MAX_FRAMES_IN_FLIGHT);
            record_empty_frame(&mut pacer);
            pacer.submit(None).unwrap();
            assert_eq!(pacer.slot_state(slot_index), FrameSlotState::Submitted);
        }
        assert_eq!(pacer.frame_index(), 5);
    }

    #[test]
    fn test_slot_reuse_waits_for_its_fence() {
        let (device_context, _queue, mut pacer) = setup();
        let empty_device_context = device_context.empty_device_context().unwrap().clone();
        let fence_ids: Vec<u64> = pacer
            .slots
            .iter()
            .map(|x| x.fence.empty_fence().unwrap().fence_id())
            .collect();

        for _ in 0..4 {
            pacer.begin_frame().unwrap();
            record_empty_frame(&mut pacer);
            pacer.submit(None).unwrap();
        }

        let observed: Vec<u64> = empty_device_context
            .events()
            .into_iter()
            .filter_map(|x| match x {
                RavelEmptyEvent::FenceObserved { fence_id } => Some(fence_id),
                _ => None,
            })
            .collect();

        // Frames 2 and 3 reuse slots 0 and 1
        assert_eq!(observed, vec![fence_ids[0], fence_ids[1]]);
    }

    #[test]
    #[should_panic(expected = "is still being recorded")]
    fn test_begin_frame_twice() {
        let (_device_context, _queue, mut pacer) = setup();
        pacer.begin_frame().unwrap();
        pacer.begin_frame().unwrap();
    }

    #[test]
    fn test_queued_writes_apply_in_order() {
        let (device_context, _queue, mut pacer) = setup();
        let mut resources = PersistentResources::default();
        let buffer = resources
            .create_buffer(
                &device_context,
                &RavelBufferDef {
                    size: 4,
                    usage: RavelBufferUsage::UNIFORM,
                    memory_usage: RavelMemoryUsage::CpuToGpu,
                },
            )
            .unwrap();

        let slot_index = pacer.begin_frame().unwrap();
        pacer.queue_write(buffer, &[1, 1, 1, 1]);
        pacer.queue_write(buffer, &[2, 2, 2, 2]);
        pacer.apply_pending_writes(&resources).unwrap();

        let contents = resources
            .buffer(buffer)
            .copy_for_slot(slot_index)
            .empty_buffer()
            .unwrap()
            .contents();
        assert_eq!(contents, vec![2, 2, 2, 2]);
        assert!(pacer.current_slot().pending_writes.is_empty());

        // The other slot's copy catches up when that slot is next used
        record_empty_frame(&mut pacer);
        pacer.submit(None).unwrap();
        let next_slot_index = pacer.begin_frame().unwrap();
        assert_ne!(next_slot_index, slot_index);
        assert_eq!(pacer.current_slot().pending_writes.len(), 2);
        pacer.apply_pending_writes(&resources).unwrap();
        let contents = resources
            .buffer(buffer)
            .copy_for_slot(next_slot_index)
            .empty_buffer()
            .unwrap()
            .contents();
        assert_eq!(contents, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_present_waits_on_render_finished() {
        let (device_context, _queue, mut pacer) = setup();
        let empty_device_context = device_context.empty_device_context().unwrap().clone();
        let target = RavelPresentTargetEmpty::default();

        pacer.begin_frame().unwrap();
        let semaphore_id = pacer
            .current_slot()
            .render_finished_semaphore
            .empty_semaphore()
            .unwrap()
            .semaphore_id();
        record_empty_frame(&mut pacer);
        pacer.submit(Some(&target)).unwrap();

        assert_eq!(target.present_count(), 1);
        let presented = empty_device_context
            .events()
            .into_iter()
            .find_map(|x| match x {
                RavelEmptyEvent::Presented { wait_semaphore_ids } => Some(wait_semaphore_ids),
                _ => None,
            })
            .unwrap();
        assert_eq!(presented, vec![semaphore_id]);
    }
}
