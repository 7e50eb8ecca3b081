use ravel_api::{
    RavelDescriptorCounts, RavelDescriptorPool, RavelDescriptorPoolDef, RavelDescriptorSet,
    RavelDescriptorSetLayout, RavelDeviceContext, RavelError, RavelResult,
};

struct DescriptorPoolChunk {
    pool: RavelDescriptorPool,
    remaining_sets: u32,
    remaining_descriptors: RavelDescriptorCounts,
}

/// Bump allocator for descriptor sets. Sets are carved out of fixed-size pools ("chunks"); when no
/// chunk has room a new one is created. Nothing is freed individually, `reset` returns all chunks
/// to full capacity at once.
pub struct DescriptorPoolAllocator {
    device_context: RavelDeviceContext,
    chunk_capacity: RavelDescriptorCounts,
    sets_per_chunk: u32,
    chunks: Vec<DescriptorPoolChunk>,
}

impl DescriptorPoolAllocator {
    pub fn new(
        device_context: &RavelDeviceContext,
        chunk_capacity: RavelDescriptorCounts,
        sets_per_chunk: u32,
    ) -> Self {
        DescriptorPoolAllocator {
            device_context: device_context.clone(),
            chunk_capacity,
            sets_per_chunk,
            chunks: Default::default(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Reserves room for one set needing `required` descriptors and returns the pool to allocate
    /// it from. The first chunk with enough room is used, a new chunk is created if none has any.
    pub fn allocate(
        &mut self,
        required: &RavelDescriptorCounts,
    ) -> RavelResult<&RavelDescriptorPool> {
        if self.sets_per_chunk == 0 || !required.fits_within(&self.chunk_capacity) {
            return Err(RavelError::AllocationFailure(format!(
                "descriptor set needing {:?} can never fit in a chunk of {:?} ({} sets)",
                required, self.chunk_capacity, self.sets_per_chunk
            )));
        }

        let existing = self.chunks.iter().position(|chunk| {
            chunk.remaining_sets > 0 && required.fits_within(&chunk.remaining_descriptors)
        });

        let chunk_index = match existing {
            Some(chunk_index) => chunk_index,
            None => {
                log::debug!(
                    "Creating descriptor pool chunk {} (capacity {:?}, {} sets)",
                    self.chunks.len(),
                    self.chunk_capacity,
                    self.sets_per_chunk
                );
                let pool = self
                    .device_context
                    .create_descriptor_pool(&RavelDescriptorPoolDef {
                        max_sets: self.sets_per_chunk,
                        descriptor_counts: self.chunk_capacity,
                    })?;
                self.chunks.push(DescriptorPoolChunk {
                    pool,
                    remaining_sets: self.sets_per_chunk,
                    remaining_descriptors: self.chunk_capacity,
                });
                self.chunks.len() - 1
            }
        };

        let chunk = &mut self.chunks[chunk_index];
        chunk.remaining_sets -= 1;
        chunk.remaining_descriptors.consume(required);
        Ok(&chunk.pool)
    }

    pub fn allocate_descriptor_set(
        &mut self,
        descriptor_set_layout: &RavelDescriptorSetLayout,
    ) -> RavelResult<RavelDescriptorSet> {
        let required = descriptor_set_layout
            .descriptor_set_layout_def()
            .descriptor_counts();
        let pool = self.allocate(&required)?;
        pool.allocate_descriptor_set(descriptor_set_layout)
    }

    /// Invalidates every set allocated so far. Only call once the GPU is done with them.
    pub fn reset(&mut self) -> RavelResult<()> {
        for chunk in &mut self.chunks {
            chunk.pool.reset_descriptor_pool()?;
            chunk.remaining_sets = self.sets_per_chunk;
            chunk.remaining_descriptors = self.chunk_capacity;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_api::{RavelDescriptorBinding, RavelDescriptorSetLayoutDef, RavelDescriptorType};

    fn storage_image_layout(
        device_context: &RavelDeviceContext,
        count: u32,
    ) -> RavelDescriptorSetLayout {
        let bindings = (0..count)
            .map(|binding| RavelDescriptorBinding {
                binding,
                descriptor_type: RavelDescriptorType::StorageImage,
            })
            .collect();
        device_context
            .create_descriptor_set_layout(&RavelDescriptorSetLayoutDef { bindings })
            .unwrap()
    }

    #[test]
    fn test_grows_when_chunk_is_full() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let layout = storage_image_layout(&device_context, 3);
        let mut allocator =
            DescriptorPoolAllocator::new(&device_context, RavelDescriptorCounts::splat(8), 128);

        allocator.allocate_descriptor_set(&layout).unwrap();
        allocator.allocate_descriptor_set(&layout).unwrap();
        assert_eq!(allocator.chunk_count(), 1);

        // 6 of 8 storage images used, 3 more don't fit
        allocator.allocate_descriptor_set(&layout).unwrap();
        assert_eq!(allocator.chunk_count(), 2);
    }

    #[test]
    fn test_first_fit_uses_remaining_room() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let large = storage_image_layout(&device_context, 3);
        let small = storage_image_layout(&device_context, 1);
        let mut allocator =
            DescriptorPoolAllocator::new(&device_context, RavelDescriptorCounts::splat(4), 128);

        allocator.allocate_descriptor_set(&large).unwrap();
        allocator.allocate_descriptor_set(&large).unwrap();
        assert_eq!(allocator.chunk_count(), 2);

        // Fits in the first chunk's leftover slot
        allocator.allocate_descriptor_set(&small).unwrap();
        assert_eq!(allocator.chunk_count(), 2);
        allocator.allocate_descriptor_set(&small).unwrap();
        assert_eq!(allocator.chunk_count(), 2);
        allocator.allocate_descriptor_set(&small).unwrap();
        assert_eq!(allocator.chunk_count(), 3);
    }

    #[test]
    fn test_set_count_limit() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let layout = storage_image_layout(&device_context, 1);
        let mut allocator =
            DescriptorPoolAllocator::new(&device_context, RavelDescriptorCounts::splat(128), 2);

        for _ in 0..5 {
            allocator.allocate_descriptor_set(&layout).unwrap();
        }
        assert_eq!(allocator.chunk_count(), 3);
    }

    #[test]
    fn test_reset_restores_capacity() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let layout = storage_image_layout(&device_context, 4);
        let mut allocator =
            DescriptorPoolAllocator::new(&device_context, RavelDescriptorCounts::splat(4), 128);

        allocator.allocate_descriptor_set(&layout).unwrap();
        allocator.reset().unwrap();
        allocator.allocate_descriptor_set(&layout).unwrap();
        assert_eq!(allocator.chunk_count(), 1);
    }

    #[test]
    fn test_oversized_request_fails() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let layout = storage_image_layout(&device_context, 5);
        let mut allocator =
            DescriptorPoolAllocator::new(&device_context, RavelDescriptorCounts::splat(4), 128);

        assert!(matches!(
            allocator.allocate_descriptor_set(&layout),
            Err(RavelError::AllocationFailure(_))
        ));
        assert_eq!(allocator.chunk_count(), 0);
    }
}
