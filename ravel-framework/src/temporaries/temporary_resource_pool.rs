use super::{assign_allocations, compute_usage_intervals, PoolSlotUsage};
use crate::{
    DeferredDropQueue, ImageDescription, ImageHandle, PhysicalImageId, PooledImageEvictionPolicy,
    PooledImageId, ResourceStateTable, TemporaryImageId,
};
use ravel_api::{RavelDeviceContext, RavelQueue, RavelResult, RavelTexture, MAX_FRAMES_IN_FLIGHT};

struct TemporaryImageRecord {
    description: ImageDescription,
    // Index into the pool, set when temporaries are resolved
    allocation: Option<usize>,
}

struct PooledPhysicalImage {
    id: PooledImageId,
    texture: RavelTexture,
}

/// Backs the temporary images declared each frame with pooled images. Temporaries whose pass
/// intervals don't overlap share a pooled image. Pooled images that a whole frame goes without
/// using are evicted.
pub struct TemporaryResourcePool {
    device_context: RavelDeviceContext,
    eviction_policy: PooledImageEvictionPolicy,
    frame_index: u64,
    temporaries: Vec<TemporaryImageRecord>,
    // slots[i] and physical_images[i] describe the same pooled image
    slots: Vec<PoolSlotUsage>,
    physical_images: Vec<PooledPhysicalImage>,
    next_pooled_image_id: u64,
    deferred_evictions: DeferredDropQueue<RavelTexture>,
}

impl TemporaryResourcePool {
    pub fn new(
        device_context: &RavelDeviceContext,
        eviction_policy: PooledImageEvictionPolicy,
    ) -> Self {
        TemporaryResourcePool {
            device_context: device_context.clone(),
            eviction_policy,
            frame_index: 0,
            temporaries: Default::default(),
            slots: Default::default(),
            physical_images: Default::default(),
            next_pooled_image_id: 0,
            deferred_evictions: DeferredDropQueue::new(MAX_FRAMES_IN_FLIGHT as u64 + 1),
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pooled_image_count(&self) -> usize {
        self.physical_images.len()
    }

    /// Evicted images that have not been destroyed yet
    pub fn pending_eviction_count(&self) -> usize {
        self.deferred_evictions.len()
    }

    pub fn declare_temporary(
        &mut self,
        description: &ImageDescription,
    ) -> ImageHandle {
        let index = self.temporaries.len() as u32;
        self.temporaries.push(TemporaryImageRecord {
            description: description.clone(),
            allocation: None,
        });

        ImageHandle::Temporary(TemporaryImageId::new(index, self.frame_index))
    }

    fn record(
        &self,
        temporary: TemporaryImageId,
    ) -> &TemporaryImageRecord {
        assert_eq!(
            temporary.frame_index(),
            self.frame_index,
            "temporary image {:?} was created in frame {} but used in frame {}",
            temporary,
            temporary.frame_index(),
            self.frame_index
        );

        self.temporaries
            .get(temporary.index() as usize)
            .unwrap_or_else(|| panic!("temporary image {:?} does not exist", temporary))
    }

    pub fn description(
        &self,
        temporary: TemporaryImageId,
    ) -> &ImageDescription {
        &self.record(temporary).description
    }

    /// Binds every temporary referenced by `passes` to a pooled image, creating pooled images as
    /// needed. `passes` yields the images each pass references, in declaration order.
    #[profiling::function]
    pub fn resolve_all<P, I>(
        &mut self,
        passes: P,
        state_table: &mut ResourceStateTable,
    ) -> RavelResult<()>
    where
        P: IntoIterator<Item = I>,
        I: IntoIterator<Item = ImageHandle>,
    {
        log::trace!("Resolve temporary images for frame {}", self.frame_index);
        let intervals = compute_usage_intervals(passes);
        for (temporary, _) in &intervals {
            // Panics on stale handles
            self.record(*temporary);
        }

        let descriptions: Vec<_> = self
            .temporaries
            .iter()
            .map(|x| x.description.clone())
            .collect();
        let assignments = assign_allocations(&intervals, &descriptions, &mut self.slots);

        // New slots get their image here
        for slot_index in self.physical_images.len()..self.slots.len() {
            let description = &self.slots[slot_index].description;
            let texture = match self
                .device_context
                .create_texture(&description.texture_def())
            {
                Ok(texture) => texture,
                Err(e) => {
                    log::error!(
                        "Failed to create pooled image for {:?}: {}",
                        description,
                        e
                    );
                    self.slots.truncate(self.physical_images.len());
                    return Err(e);
                }
            };

            let id = PooledImageId(self.next_pooled_image_id);
            self.next_pooled_image_id += 1;
            log::debug!("Created pooled image {:?} for {:?}", id, description);

            state_table.register_image(PhysicalImageId::Pooled(id), description.mip_count());
            self.physical_images
                .push(PooledPhysicalImage { id, texture });
        }

        for ((temporary, _), slot_index) in intervals.iter().zip(assignments) {
            self.temporaries[temporary.index() as usize].allocation = Some(slot_index);
        }

        Ok(())
    }

    /// The pooled image backing a resolved temporary
    pub fn physical_image(
        &self,
        temporary: TemporaryImageId,
    ) -> PooledImageId {
        match self.record(temporary).allocation {
            Some(slot_index) => self.physical_images[slot_index].id,
            None => panic!(
                "temporary image {:?} is not resolved (it must be used by a pass)",
                temporary
            ),
        }
    }

    pub fn texture(
        &self,
        id: PooledImageId,
    ) -> &RavelTexture {
        self.physical_images
            .iter()
            .find(|x| x.id == id)
            .map(|x| &x.texture)
            .unwrap_or_else(|| panic!("pooled image {:?} does not exist", id))
    }

    /// Starts a new frame: discards last frame's temporaries and evicts pooled images nothing
    /// used last frame.
    #[profiling::function]
    pub fn collect_garbage(
        &mut self,
        queue: &RavelQueue,
        state_table: &mut ResourceStateTable,
    ) -> RavelResult<()> {
        self.deferred_evictions.on_frame_complete();
        self.temporaries.clear();
        self.frame_index += 1;

        let slots = std::mem::take(&mut self.slots);
        let physical_images = std::mem::take(&mut self.physical_images);
        let mut stale = Vec::default();

        for (mut slot, physical_image) in slots.into_iter().zip(physical_images) {
            if slot.used_this_frame {
                slot.used_this_frame = false;
                slot.last_used_pass_index = None;
                self.slots.push(slot);
                self.physical_images.push(physical_image);
            } else {
                state_table.remove_image(PhysicalImageId::Pooled(physical_image.id));
                stale.push(physical_image);
            }
        }

        self.destroy_stale_pooled_images(queue, stale)
    }

    // All eviction goes through here. One queue idle wait covers every image evicted this frame.
    fn destroy_stale_pooled_images(
        &mut self,
        queue: &RavelQueue,
        stale: Vec<PooledPhysicalImage>,
    ) -> RavelResult<()> {
        if stale.is_empty() {
            return Ok(());
        }

        log::debug!(
            "Evicting {} pooled images ({:?})",
            stale.len(),
            self.eviction_policy
        );

        match self.eviction_policy {
            PooledImageEvictionPolicy::WaitForQueueIdle => {
                queue.wait_for_queue_idle()?;
                for physical_image in stale {
                    log::trace!("Destroying pooled image {:?}", physical_image.id);
                    std::mem::drop(physical_image);
                }
            }
            PooledImageEvictionPolicy::DeferUntilFramesComplete => {
                for physical_image in stale {
                    log::trace!("Retiring pooled image {:?}", physical_image.id);
                    self.deferred_evictions.retire(physical_image.texture);
                }
            }
        }

        Ok(())
    }

    /// Destroys every pooled image. Only call once the GPU is idle.
    pub fn clear(
        &mut self,
        state_table: &mut ResourceStateTable,
    ) {
        for physical_image in self.physical_images.drain(..) {
            state_table.remove_image(PhysicalImageId::Pooled(physical_image.id));
        }

        self.slots.clear();
        self.temporaries.clear();
        self.deferred_evictions.drain_all();
    }
}
