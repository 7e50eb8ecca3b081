use crate::{BufferHandle, ImageRuntimeState, PhysicalImageId, ResourceStateTable};
use fnv::FnvHashSet;
use ravel_api::{RavelAccessFlags, RavelImageLayout};

/// How a pass touches an image
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageUsageKind {
    Sampled,
    Storage,
    ColorAttachment,
    DepthAttachment,
}

impl ImageUsageKind {
    pub fn required_layout(self) -> RavelImageLayout {
        match self {
            ImageUsageKind::Sampled => RavelImageLayout::ShaderReadOnly,
            ImageUsageKind::Storage => RavelImageLayout::General,
            ImageUsageKind::ColorAttachment => RavelImageLayout::ColorAttachment,
            ImageUsageKind::DepthAttachment => RavelImageLayout::DepthStencilAttachment,
        }
    }

    pub fn required_access(self) -> RavelAccessFlags {
        match self {
            ImageUsageKind::Sampled => RavelAccessFlags::SHADER_READ,
            ImageUsageKind::Storage => RavelAccessFlags::SHADER_READ | RavelAccessFlags::SHADER_WRITE,
            ImageUsageKind::ColorAttachment => {
                RavelAccessFlags::COLOR_ATTACHMENT_READ | RavelAccessFlags::COLOR_ATTACHMENT_WRITE
            }
            ImageUsageKind::DepthAttachment => {
                RavelAccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | RavelAccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
            }
        }
    }

    pub fn is_write(self) -> bool {
        !matches!(self, ImageUsageKind::Sampled)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedImageUsage {
    pub image: PhysicalImageId,
    pub kind: ImageUsageKind,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferUsageKind {
    Uniform,
    Storage { read_only: bool },
}

impl BufferUsageKind {
    pub fn is_read_only(self) -> bool {
        match self {
            BufferUsageKind::Uniform => true,
            BufferUsageKind::Storage { read_only } => read_only,
        }
    }

    pub fn required_access(self) -> RavelAccessFlags {
        match self {
            BufferUsageKind::Uniform => RavelAccessFlags::UNIFORM_READ,
            BufferUsageKind::Storage { read_only: true } => RavelAccessFlags::SHADER_READ,
            BufferUsageKind::Storage { read_only: false } => {
                RavelAccessFlags::SHADER_READ | RavelAccessFlags::SHADER_WRITE
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedBufferUsage {
    pub buffer: BufferHandle,
    pub kind: BufferUsageKind,
}

/// Everything one pass touches, with temporaries already resolved to physical images
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassResourceUsage {
    pub images: Vec<ResolvedImageUsage>,
    pub buffers: Vec<ResolvedBufferUsage>,
}

/// Layout transition and memory dependency on a contiguous range of mips
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: PhysicalImageId,
    pub src_layout: RavelImageLayout,
    pub dst_layout: RavelImageLayout,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
}

impl ImageBarrier {
    fn covers(
        &self,
        mip_level: u32,
    ) -> bool {
        mip_level >= self.base_mip_level && mip_level < self.base_mip_level + self.mip_level_count
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferBarrier {
    pub buffer: BufferHandle,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
}

/// Barriers to issue before a pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BarrierSet {
    pub image_barriers: Vec<ImageBarrier>,
    pub buffer_barriers: Vec<BufferBarrier>,
}

impl BarrierSet {
    pub fn is_empty(&self) -> bool {
        self.image_barriers.is_empty() && self.buffer_barriers.is_empty()
    }
}

fn needs_transition(
    state: &ImageRuntimeState,
    base_mip_level: u32,
    mip_level_count: u32,
    dst_layout: RavelImageLayout,
) -> bool {
    state.currently_writing()
        || (base_mip_level..base_mip_level + mip_level_count)
            .any(|mip_level| state.mip_layout(mip_level) != dst_layout)
}

// Adds barriers for the mip range. A mip joins the barrier that ends right before it if both
// come from the same layout, otherwise it starts a new one. Mips another usage in this pass
// already barriered are skipped.
fn push_coalesced_barriers(
    barriers: &mut Vec<ImageBarrier>,
    image: PhysicalImageId,
    state: &ImageRuntimeState,
    base_mip_level: u32,
    mip_level_count: u32,
    dst_layout: RavelImageLayout,
    dst_access: RavelAccessFlags,
) {
    for mip_level in base_mip_level..base_mip_level + mip_level_count {
        if barriers
            .iter()
            .any(|b| b.image == image && b.covers(mip_level))
        {
            continue;
        }

        let src_layout = state.mip_layout(mip_level);
        let open_barrier = barriers.iter_mut().find(|b| {
            b.image == image
                && b.src_layout == src_layout
                && b.dst_layout == dst_layout
                && b.base_mip_level + b.mip_level_count == mip_level
        });

        match open_barrier {
            Some(barrier) => barrier.mip_level_count += 1,
            None => barriers.push(ImageBarrier {
                image,
                src_layout,
                dst_layout,
                src_access: state.access(),
                dst_access,
                base_mip_level: mip_level,
                mip_level_count: 1,
            }),
        }
    }
}

/// Turns the resources a pass uses into the barriers needed before it runs, and records the
/// pass's effects in the state table. Passes must go through in declaration order since each
/// pass is checked against the state the previous passes left behind.
pub struct BarrierSynthesizer;

impl BarrierSynthesizer {
    pub fn synthesize(
        usage: &PassResourceUsage,
        state_table: &mut ResourceStateTable,
    ) -> BarrierSet {
        let mut barriers = BarrierSet::default();

        // Mips bound as storage stay in the storage layout for the whole pass, so sampled usages
        // only cover the mips outside of them
        let storage_mips: FnvHashSet<(PhysicalImageId, u32)> = usage
            .images
            .iter()
            .filter(|x| x.kind == ImageUsageKind::Storage)
            .flat_map(|x| {
                (x.base_mip_level..x.base_mip_level + x.mip_level_count)
                    .map(move |mip_level| (x.image, mip_level))
            })
            .collect();

        let mut image_usages: Vec<ResolvedImageUsage> = Vec::with_capacity(usage.images.len());
        for image_usage in &usage.images {
            if image_usage.kind != ImageUsageKind::Sampled {
                image_usages.push(*image_usage);
                continue;
            }

            let mut run: Option<ResolvedImageUsage> = None;
            for mip_level in
                image_usage.base_mip_level..image_usage.base_mip_level + image_usage.mip_level_count
            {
                if storage_mips.contains(&(image_usage.image, mip_level)) {
                    image_usages.extend(run.take());
                    continue;
                }

                match run.as_mut() {
                    Some(open) => open.mip_level_count += 1,
                    None => {
                        run = Some(ResolvedImageUsage {
                            base_mip_level: mip_level,
                            mip_level_count: 1,
                            ..*image_usage
                        })
                    }
                }
            }
            image_usages.extend(run);
        }

        // Every usage is checked against the state from before this pass
        let mut fully_read_images = FnvHashSet::<PhysicalImageId>::default();
        for image_usage in &image_usages {
            let state = state_table.image_state(image_usage.image);
            assert!(
                image_usage.base_mip_level + image_usage.mip_level_count <= state.mip_count(),
                "mips {}..{} of image {:?} are out of range ({} mips)",
                image_usage.base_mip_level,
                image_usage.base_mip_level + image_usage.mip_level_count,
                image_usage.image,
                state.mip_count()
            );

            let dst_layout = image_usage.kind.required_layout();
            if image_usage.kind == ImageUsageKind::Sampled
                && image_usage.base_mip_level == 0
                && image_usage.mip_level_count == state.mip_count()
            {
                fully_read_images.insert(image_usage.image);
            }

            if !needs_transition(
                state,
                image_usage.base_mip_level,
                image_usage.mip_level_count,
                dst_layout,
            ) {
                continue;
            }

            push_coalesced_barriers(
                &mut barriers.image_barriers,
                image_usage.image,
                state,
                image_usage.base_mip_level,
                image_usage.mip_level_count,
                dst_layout,
                image_usage.kind.required_access(),
            );
        }

        // Buffers: one barrier per buffer, only if an earlier pass left it being written
        let mut buffer_order: Vec<BufferHandle> = Vec::default();
        let mut buffer_access: Vec<RavelAccessFlags> = Vec::default();
        let mut written_buffers = FnvHashSet::<BufferHandle>::default();
        for buffer_usage in &usage.buffers {
            match buffer_order.iter().position(|x| *x == buffer_usage.buffer) {
                Some(i) => buffer_access[i] |= buffer_usage.kind.required_access(),
                None => {
                    buffer_order.push(buffer_usage.buffer);
                    buffer_access.push(buffer_usage.kind.required_access());
                }
            }

            if !buffer_usage.kind.is_read_only() {
                written_buffers.insert(buffer_usage.buffer);
            }
        }

        for (&buffer, &dst_access) in buffer_order.iter().zip(&buffer_access) {
            if state_table.buffer_state(buffer).is_being_written() {
                barriers.buffer_barriers.push(BufferBarrier {
                    buffer,
                    src_access: RavelAccessFlags::SHADER_WRITE,
                    dst_access,
                });
            }
        }

        // Record the pass's effects for the next pass
        let mut written_images = FnvHashSet::<PhysicalImageId>::default();
        for image_usage in &image_usages {
            let state = state_table.image_state_mut(image_usage.image);
            for mip_level in
                image_usage.base_mip_level..image_usage.base_mip_level + image_usage.mip_level_count
            {
                state.set_mip_layout(mip_level, image_usage.kind.required_layout());
            }
            state.set_access(image_usage.kind.required_access());

            if image_usage.kind.is_write() {
                written_images.insert(image_usage.image);
            }
        }

        for image in &written_images {
            state_table
                .image_state_mut(*image)
                .set_currently_writing(true);
        }

        for image in fully_read_images.difference(&written_images) {
            state_table
                .image_state_mut(*image)
                .set_currently_writing(false);
        }

        for buffer in buffer_order {
            state_table.set_buffer_being_written(buffer, written_buffers.contains(&buffer));
        }

        if !barriers.is_empty() {
            log::trace!(
                "  {} image barriers, {} buffer barriers",
                barriers.image_barriers.len(),
                barriers.buffer_barriers.len()
            );
        }

        barriers
    }

    /// Moves every mip of the image into the present layout
    pub fn synthesize_present(
        image: PhysicalImageId,
        state_table: &mut ResourceStateTable,
    ) -> BarrierSet {
        let mut barriers = BarrierSet::default();
        let state = state_table.image_state(image);
        let mip_count = state.mip_count();

        if needs_transition(state, 0, mip_count, RavelImageLayout::Present) {
            push_coalesced_barriers(
                &mut barriers.image_barriers,
                image,
                state,
                0,
                mip_count,
                RavelImageLayout::Present,
                RavelAccessFlags::NONE,
            );
        }

        let state = state_table.image_state_mut(image);
        for mip_level in 0..mip_count {
            state.set_mip_layout(mip_level, RavelImageLayout::Present);
        }
        state.set_access(RavelAccessFlags::NONE);
        state.set_currently_writing(false);

        barriers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: PhysicalImageId = PhysicalImageId::Persistent(0);
    const Y: PhysicalImageId = PhysicalImageId::Persistent(1);
    const B: BufferHandle = BufferHandle(0);

    fn table_with_image(
        image: PhysicalImageId,
        mip_count: u32,
    ) -> ResourceStateTable {
        let mut table = ResourceStateTable::default();
        table.register_image(image, mip_count);
        table
    }

    fn image_usage(
        image: PhysicalImageId,
        kind: ImageUsageKind,
        base_mip_level: u32,
        mip_level_count: u32,
    ) -> PassResourceUsage {
        PassResourceUsage {
            images: vec![ResolvedImageUsage {
                image,
                kind,
                base_mip_level,
                mip_level_count,
            }],
            buffers: vec![],
        }
    }

    fn buffer_usage(read_only: bool) -> PassResourceUsage {
        PassResourceUsage {
            images: vec![],
            buffers: vec![ResolvedBufferUsage {
                buffer: B,
                kind: BufferUsageKind::Storage { read_only },
            }],
        }
    }

    #[test]
    fn test_write_then_read_emits_one_transition() {
        let mut table = table_with_image(X, 1);

        let write = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Storage, 0, 1),
            &mut table,
        );
        assert_eq!(write.image_barriers.len(), 1);
        assert_eq!(write.image_barriers[0].src_layout, RavelImageLayout::Undefined);
        assert!(table.image_state(X).currently_writing());

        let read = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Sampled, 0, 1),
            &mut table,
        );
        assert_eq!(
            read.image_barriers,
            vec![ImageBarrier {
                image: X,
                src_layout: RavelImageLayout::General,
                dst_layout: RavelImageLayout::ShaderReadOnly,
                src_access: RavelAccessFlags::SHADER_READ | RavelAccessFlags::SHADER_WRITE,
                dst_access: RavelAccessFlags::SHADER_READ,
                base_mip_level: 0,
                mip_level_count: 1,
            }]
        );
        assert!(!table.image_state(X).currently_writing());

        // Reading again needs nothing
        let read_again = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Sampled, 0, 1),
            &mut table,
        );
        assert!(read_again.is_empty());
    }

    #[test]
    fn test_storage_to_storage_barriers_on_write_flag() {
        let mut table = table_with_image(X, 1);
        BarrierSynthesizer::synthesize(&image_usage(X, ImageUsageKind::Storage, 0, 1), &mut table);

        let second = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Storage, 0, 1),
            &mut table,
        );
        assert_eq!(second.image_barriers.len(), 1);
        assert_eq!(second.image_barriers[0].src_layout, RavelImageLayout::General);
        assert_eq!(second.image_barriers[0].dst_layout, RavelImageLayout::General);
    }

    #[test]
    fn test_uniform_prior_layout_coalesces() {
        let mut table = table_with_image(X, 6);
        let barriers = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Storage, 0, 6),
            &mut table,
        );

        assert_eq!(barriers.image_barriers.len(), 1);
        assert_eq!(barriers.image_barriers[0].base_mip_level, 0);
        assert_eq!(barriers.image_barriers[0].mip_level_count, 6);
    }

    #[test]
    fn test_differing_prior_layout_splits() {
        let mut table = table_with_image(X, 6);
        table
            .image_state_mut(X)
            .set_mip_layout(3, RavelImageLayout::ShaderReadOnly);

        let barriers = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Storage, 0, 6),
            &mut table,
        );

        let ranges: Vec<_> = barriers
            .image_barriers
            .iter()
            .map(|b| (b.src_layout, b.base_mip_level, b.mip_level_count))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (RavelImageLayout::Undefined, 0, 3),
                (RavelImageLayout::ShaderReadOnly, 3, 1),
                (RavelImageLayout::Undefined, 4, 2),
            ]
        );
        assert!(table
            .image_state(X)
            .mip_layouts()
            .iter()
            .all(|x| *x == RavelImageLayout::General));
    }

    #[test]
    fn test_two_mip_ranges_of_one_image_extend() {
        let mut table = table_with_image(X, 4);
        let usage = PassResourceUsage {
            images: vec![
                ResolvedImageUsage {
                    image: X,
                    kind: ImageUsageKind::Storage,
                    base_mip_level: 0,
                    mip_level_count: 2,
                },
                ResolvedImageUsage {
                    image: X,
                    kind: ImageUsageKind::Storage,
                    base_mip_level: 1,
                    mip_level_count: 3,
                },
            ],
            buffers: vec![],
        };

        let barriers = BarrierSynthesizer::synthesize(&usage, &mut table);
        assert_eq!(barriers.image_barriers.len(), 1);
        assert_eq!(barriers.image_barriers[0].mip_level_count, 4);
    }

    fn sampled_and_storage(
        image: PhysicalImageId,
        sampled: (u32, u32),
        storage_mip_level: u32,
    ) -> PassResourceUsage {
        PassResourceUsage {
            images: vec![
                ResolvedImageUsage {
                    image,
                    kind: ImageUsageKind::Sampled,
                    base_mip_level: sampled.0,
                    mip_level_count: sampled.1,
                },
                ResolvedImageUsage {
                    image,
                    kind: ImageUsageKind::Storage,
                    base_mip_level: storage_mip_level,
                    mip_level_count: 1,
                },
            ],
            buffers: vec![],
        }
    }

    #[test]
    fn test_sampled_and_storage_in_one_pass() {
        let mut table = table_with_image(X, 2);
        let barriers = BarrierSynthesizer::synthesize(&sampled_and_storage(X, (0, 1), 1), &mut table);

        let ranges: Vec<_> = barriers
            .image_barriers
            .iter()
            .map(|b| (b.src_layout, b.dst_layout, b.base_mip_level, b.mip_level_count))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (RavelImageLayout::Undefined, RavelImageLayout::ShaderReadOnly, 0, 1),
                (RavelImageLayout::Undefined, RavelImageLayout::General, 1, 1),
            ]
        );
        assert_eq!(
            table.image_state(X).mip_layouts(),
            &[RavelImageLayout::ShaderReadOnly, RavelImageLayout::General]
        );
    }

    #[test]
    fn test_downsample_reads_mip_written_by_previous_pass() {
        let mut table = table_with_image(X, 3);

        // Pass 0 writes mip 0, then each pass reads mip k - 1 and writes mip k
        BarrierSynthesizer::synthesize(&image_usage(X, ImageUsageKind::Storage, 0, 1), &mut table);
        for mip_level in 1..3 {
            let barriers = BarrierSynthesizer::synthesize(
                &sampled_and_storage(X, (mip_level - 1, 1), mip_level),
                &mut table,
            );

            let read = barriers
                .image_barriers
                .iter()
                .find(|b| b.base_mip_level == mip_level - 1)
                .unwrap();
            assert_eq!(read.mip_level_count, 1);
            assert_eq!(read.src_layout, RavelImageLayout::General);
            assert_eq!(read.dst_layout, RavelImageLayout::ShaderReadOnly);
            assert!(read.src_access.contains(RavelAccessFlags::SHADER_WRITE));
            assert_eq!(
                table.image_state(X).mip_layout(mip_level - 1),
                RavelImageLayout::ShaderReadOnly
            );
            assert_eq!(
                table.image_state(X).mip_layout(mip_level),
                RavelImageLayout::General
            );
        }
    }

    #[test]
    fn test_sampled_mip_also_bound_as_storage_stays_general() {
        let mut table = table_with_image(X, 2);
        let barriers = BarrierSynthesizer::synthesize(&sampled_and_storage(X, (0, 2), 1), &mut table);

        // Mip 0 is only sampled, mip 1 is storage and sampled
        let ranges: Vec<_> = barriers
            .image_barriers
            .iter()
            .map(|b| (b.dst_layout, b.base_mip_level, b.mip_level_count))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (RavelImageLayout::ShaderReadOnly, 0, 1),
                (RavelImageLayout::General, 1, 1),
            ]
        );
        assert!(table.image_state(X).currently_writing());
    }

    #[test]
    fn test_partial_read_keeps_write_flag() {
        let mut table = table_with_image(X, 2);
        BarrierSynthesizer::synthesize(&image_usage(X, ImageUsageKind::Storage, 0, 2), &mut table);

        BarrierSynthesizer::synthesize(&image_usage(X, ImageUsageKind::Sampled, 0, 1), &mut table);
        assert!(table.image_state(X).currently_writing());

        // Mip 1 is still in the storage layout so it gets its own transition
        let rest = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Sampled, 1, 1),
            &mut table,
        );
        assert_eq!(rest.image_barriers.len(), 1);
        assert_eq!(rest.image_barriers[0].base_mip_level, 1);
    }

    #[test]
    fn test_render_targets() {
        let mut table = ResourceStateTable::default();
        table.register_image(X, 1);
        table.register_image(Y, 1);

        let usage = PassResourceUsage {
            images: vec![
                ResolvedImageUsage {
                    image: X,
                    kind: ImageUsageKind::ColorAttachment,
                    base_mip_level: 0,
                    mip_level_count: 1,
                },
                ResolvedImageUsage {
                    image: Y,
                    kind: ImageUsageKind::DepthAttachment,
                    base_mip_level: 0,
                    mip_level_count: 1,
                },
            ],
            buffers: vec![],
        };

        let barriers = BarrierSynthesizer::synthesize(&usage, &mut table);
        assert_eq!(barriers.image_barriers.len(), 2);
        assert_eq!(
            table.image_state(X).mip_layout(0),
            RavelImageLayout::ColorAttachment
        );
        assert_eq!(
            table.image_state(Y).mip_layout(0),
            RavelImageLayout::DepthStencilAttachment
        );
        assert!(table.image_state(X).currently_writing());
        assert!(table.image_state(Y).currently_writing());

        // Drawing again into the same targets still needs a barrier since they were written
        let again = BarrierSynthesizer::synthesize(&usage, &mut table);
        assert_eq!(again.image_barriers.len(), 2);
    }

    #[test]
    fn test_disjoint_resources_get_no_barriers() {
        let mut table = ResourceStateTable::default();
        table.register_image(X, 1);
        table.register_image(Y, 1);

        BarrierSynthesizer::synthesize(&image_usage(X, ImageUsageKind::Sampled, 0, 1), &mut table);
        BarrierSynthesizer::synthesize(&image_usage(Y, ImageUsageKind::Sampled, 0, 1), &mut table);

        let x_again = BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::Sampled, 0, 1),
            &mut table,
        );
        assert!(x_again.is_empty());
    }

    #[test]
    fn test_buffer_write_then_reads() {
        let mut table = ResourceStateTable::default();
        table.register_buffer(B);

        let write = BarrierSynthesizer::synthesize(&buffer_usage(false), &mut table);
        assert!(write.buffer_barriers.is_empty());

        let read = BarrierSynthesizer::synthesize(&buffer_usage(true), &mut table);
        assert_eq!(
            read.buffer_barriers,
            vec![BufferBarrier {
                buffer: B,
                src_access: RavelAccessFlags::SHADER_WRITE,
                dst_access: RavelAccessFlags::SHADER_READ,
            }]
        );

        let read_again = BarrierSynthesizer::synthesize(&buffer_usage(true), &mut table);
        assert!(read_again.is_empty());
    }

    #[test]
    fn test_buffer_write_and_read_in_one_pass() {
        let mut table = ResourceStateTable::default();
        table.register_buffer(B);

        let mut usage = buffer_usage(false);
        usage.buffers.push(ResolvedBufferUsage {
            buffer: B,
            kind: BufferUsageKind::Uniform,
        });

        // Nothing wrote it before this pass
        assert!(BarrierSynthesizer::synthesize(&usage, &mut table).is_empty());
        assert!(table.buffer_state(B).is_being_written());

        let next = BarrierSynthesizer::synthesize(&usage, &mut table);
        assert_eq!(next.buffer_barriers.len(), 1);
        assert_eq!(
            next.buffer_barriers[0].dst_access,
            RavelAccessFlags::SHADER_READ
                | RavelAccessFlags::SHADER_WRITE
                | RavelAccessFlags::UNIFORM_READ
        );
    }

    #[test]
    fn test_present_transition() {
        let mut table = table_with_image(X, 1);
        BarrierSynthesizer::synthesize(
            &image_usage(X, ImageUsageKind::ColorAttachment, 0, 1),
            &mut table,
        );

        let present = BarrierSynthesizer::synthesize_present(X, &mut table);
        assert_eq!(present.image_barriers.len(), 1);
        assert_eq!(
            present.image_barriers[0].src_layout,
            RavelImageLayout::ColorAttachment
        );
        assert_eq!(
            present.image_barriers[0].dst_layout,
            RavelImageLayout::Present
        );
        assert!(!table.image_state(X).currently_writing());
        assert!(BarrierSynthesizer::synthesize_present(X, &mut table).is_empty());
    }
}
