use std::collections::VecDeque;

struct RetiredResource<T> {
    // Held only so that it drops later
    _resource: T,
    drop_on_frame: u64,
}

/// Holds resources the GPU may still be using until enough frames have completed, then drops
/// them. Everything retired in the same frame drops together, in retirement order.
pub struct DeferredDropQueue<T> {
    // Retired in frame order, so entries that drop first are at the front
    retired: VecDeque<RetiredResource<T>>,
    frames_to_keep: u64,
    frame_index: u64,
}

impl<T> DeferredDropQueue<T> {
    /// A resource retired now drops once `on_frame_complete` has been called `frames_to_keep`
    /// times
    pub fn new(frames_to_keep: u64) -> Self {
        DeferredDropQueue {
            retired: Default::default(),
            frames_to_keep,
            frame_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retired.is_empty()
    }

    pub fn retire(
        &mut self,
        resource: T,
    ) {
        self.retired.push_back(RetiredResource {
            _resource: resource,
            drop_on_frame: self.frame_index + self.frames_to_keep,
        });
    }

    pub fn on_frame_complete(&mut self) {
        self.frame_index += 1;

        let expired = self
            .retired
            .iter()
            .take_while(|x| x.drop_on_frame <= self.frame_index)
            .count();

        if expired > 0 {
            log::trace!("Dropping {} retired resources", expired);
            self.retired.drain(0..expired);
        }
    }

    /// Drops everything now. Only call this once the GPU is idle.
    pub fn drain_all(&mut self) {
        self.retired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_drops_after_frames_to_keep() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDropQueue::new(3);

        queue.retire(DropCounter(dropped.clone()));
        queue.on_frame_complete();
        queue.retire(DropCounter(dropped.clone()));
        queue.on_frame_complete();
        assert_eq!(dropped.load(Ordering::SeqCst), 0);

        queue.on_frame_complete();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);

        queue.on_frame_complete();
        assert_eq!(dropped.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_all() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut queue = DeferredDropQueue::new(3);
        queue.retire(DropCounter(dropped.clone()));
        queue.retire(DropCounter(dropped.clone()));

        queue.drain_all();
        assert_eq!(dropped.load(Ordering::SeqCst), 2);
    }
}
