use super::*;
use crate::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct RavelFenceEmpty {
    device_context: RavelDeviceContextEmpty,
    fence_id: u64,
    // Set when a submission will signal this fence, cleared when the CPU observes the signal
    submitted: AtomicBool,
}

impl RavelFenceEmpty {
    pub(crate) fn new(device_context: &RavelDeviceContextEmpty) -> Self {
        RavelFenceEmpty {
            device_context: device_context.clone(),
            fence_id: device_context.allocate_object_id(),
            submitted: AtomicBool::new(false),
        }
    }

    pub fn fence_id(&self) -> u64 {
        self.fence_id
    }

    pub(crate) fn submitted(&self) -> bool {
        self.submitted.load(Ordering::Relaxed)
    }

    pub(crate) fn set_submitted(
        &self,
        submitted: bool,
    ) {
        self.submitted.store(submitted, Ordering::Relaxed);
    }

    /// Simulated work finishes as soon as it is submitted, so waiting never blocks
    pub fn wait(&self) -> RavelResult<()> {
        if self.submitted() {
            self.device_context
                .push_event(RavelEmptyEvent::FenceObserved {
                    fence_id: self.fence_id,
                });
            self.set_submitted(false);
        }

        Ok(())
    }

    pub fn get_fence_status(&self) -> RavelResult<RavelFenceStatus> {
        if self.submitted() {
            self.wait()?;
            Ok(RavelFenceStatus::Complete)
        } else {
            Ok(RavelFenceStatus::Unsubmitted)
        }
    }
}

#[derive(Debug)]
pub struct RavelSemaphoreEmpty {
    semaphore_id: u64,
    // Set when a submission will signal this semaphore, cleared when a submission waits on it
    signal_available: AtomicBool,
}

impl RavelSemaphoreEmpty {
    pub(crate) fn new(device_context: &RavelDeviceContextEmpty) -> Self {
        RavelSemaphoreEmpty {
            semaphore_id: device_context.allocate_object_id(),
            signal_available: AtomicBool::new(false),
        }
    }

    pub fn semaphore_id(&self) -> u64 {
        self.semaphore_id
    }

    pub(crate) fn signal_available(&self) -> bool {
        self.signal_available.load(Ordering::Relaxed)
    }

    pub(crate) fn set_signal_available(
        &self,
        available: bool,
    ) {
        self.signal_available.store(available, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug)]
pub struct RavelQueueEmpty {
    device_context: RavelDeviceContextEmpty,
    queue_type: RavelQueueType,
}

impl RavelQueueEmpty {
    pub(crate) fn new(
        device_context: &RavelDeviceContextEmpty,
        queue_type: RavelQueueType,
    ) -> Self {
        RavelQueueEmpty {
            device_context: device_context.clone(),
            queue_type,
        }
    }

    pub fn device_context(&self) -> &RavelDeviceContextEmpty {
        &self.device_context
    }

    pub fn queue_type(&self) -> RavelQueueType {
        self.queue_type
    }

    pub fn create_command_pool(
        &self,
        command_pool_def: &RavelCommandPoolDef,
    ) -> RavelResult<RavelCommandPoolEmpty> {
        Ok(RavelCommandPoolEmpty::new(
            &self.device_context,
            command_pool_def,
        ))
    }

    pub fn submit(
        &self,
        command_buffers: &[&RavelCommandBufferEmpty],
        wait_semaphores: &[&RavelSemaphoreEmpty],
        signal_semaphores: &[&RavelSemaphoreEmpty],
        signal_fence: Option<&RavelFenceEmpty>,
    ) -> RavelResult<()> {
        if let Some(fence) = signal_fence {
            if fence.submitted() {
                return Err(RavelError::SynchronizationFailure(format!(
                    "fence {} was submitted again before its previous signal was observed",
                    fence.fence_id()
                )));
            }
        }

        let mut command_buffer_ids = Vec::with_capacity(command_buffers.len());
        let mut commands = Vec::default();
        for command_buffer in command_buffers {
            if command_buffer.is_secondary() {
                return Err(RavelError::ValidationFailure(
                    "secondary command buffers can't be submitted directly".to_string(),
                ));
            }

            if command_buffer.is_recording() {
                return Err(RavelError::ValidationFailure(format!(
                    "command buffer {} is still recording",
                    command_buffer.command_buffer_id()
                )));
            }

            command_buffer_ids.push(command_buffer.command_buffer_id());
            commands.extend(command_buffer.recorded_commands());
        }

        // Only wait on semaphores that something will signal
        let mut wait_semaphore_ids = Vec::with_capacity(wait_semaphores.len());
        for wait_semaphore in wait_semaphores {
            if wait_semaphore.signal_available() {
                wait_semaphore_ids.push(wait_semaphore.semaphore_id());
                wait_semaphore.set_signal_available(false);
            }
        }

        let mut signal_semaphore_ids = Vec::with_capacity(signal_semaphores.len());
        for signal_semaphore in signal_semaphores {
            if !signal_semaphore.signal_available() {
                signal_semaphore_ids.push(signal_semaphore.semaphore_id());
                signal_semaphore.set_signal_available(true);
            }
        }

        log::trace!(
            "submit {} command buffers to empty queue {:?}",
            command_buffer_ids.len(),
            self.queue_type
        );

        execute_commands(&self.device_context, &commands);

        self.device_context
            .push_event(RavelEmptyEvent::Submitted {
                command_buffer_ids,
                commands,
                wait_semaphore_ids,
                signal_semaphore_ids,
                signal_fence_id: signal_fence.map(|x| x.fence_id()),
            });

        if let Some(signal_fence) = signal_fence {
            signal_fence.set_submitted(true);
        }

        Ok(())
    }

    pub fn wait_for_queue_idle(&self) -> RavelResult<()> {
        self.device_context
            .push_event(RavelEmptyEvent::QueueWaitIdle);
        Ok(())
    }
}

// Runs the parts of a submission that have host-visible effects. Timestamps are taken from the
// simulated clock, which advances as commands "execute".
fn execute_commands(
    device_context: &RavelDeviceContextEmpty,
    commands: &[RavelEmptyCommand],
) {
    for command in commands {
        match command {
            RavelEmptyCommand::Dispatch { .. } | RavelEmptyCommand::Draw { .. } => {
                device_context.advance_clock(EMPTY_WORK_DURATION_NS);
            }
            RavelEmptyCommand::ExecuteSecondary { commands, .. } => {
                execute_commands(device_context, commands);
            }
            RavelEmptyCommand::ResetQueryPool {
                query_pool_id,
                first_query,
                query_count,
            } => {
                device_context.advance_clock(EMPTY_COMMAND_DURATION_NS);
                if let Some(results) = device_context.query_pool_results(*query_pool_id) {
                    let mut results = results.lock().unwrap();
                    let first = *first_query as usize;
                    let end = (first + *query_count as usize).min(results.len());
                    for result in &mut results[first..end] {
                        *result = None;
                    }
                }
            }
            RavelEmptyCommand::WriteTimestamp {
                query_pool_id,
                query_index,
            } => {
                let now = device_context.advance_clock(EMPTY_COMMAND_DURATION_NS);
                if let Some(results) = device_context.query_pool_results(*query_pool_id) {
                    let mut results = results.lock().unwrap();
                    if let Some(result) = results.get_mut(*query_index as usize) {
                        *result = Some(now);
                    }
                }
            }
            _ => {
                device_context.advance_clock(EMPTY_COMMAND_DURATION_NS);
            }
        }
    }
}

/// Present target for headless runs. Records a `Presented` event and consumes the wait
/// semaphores' signals.
#[derive(Default)]
pub struct RavelPresentTargetEmpty {
    present_count: std::sync::atomic::AtomicU64,
}

impl RavelPresentTargetEmpty {
    pub fn present_count(&self) -> u64 {
        self.present_count.load(Ordering::Relaxed)
    }
}

impl RavelPresentTarget for RavelPresentTargetEmpty {
    fn present(
        &self,
        queue: &RavelQueue,
        wait_semaphores: &[&RavelSemaphore],
    ) -> RavelResult<()> {
        let queue = queue
            .empty_queue()
            .ok_or("RavelPresentTargetEmpty can only present from an empty queue")?;

        let mut wait_semaphore_ids = Vec::with_capacity(wait_semaphores.len());
        for wait_semaphore in wait_semaphores {
            let wait_semaphore = wait_semaphore
                .empty_semaphore()
                .ok_or("RavelPresentTargetEmpty can only wait on empty semaphores")?;
            if wait_semaphore.signal_available() {
                wait_semaphore_ids.push(wait_semaphore.semaphore_id());
                wait_semaphore.set_signal_available(false);
            }
        }

        queue
            .device_context()
            .push_event(RavelEmptyEvent::Presented { wait_semaphore_ids });
        self.present_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
