use crate::{BufferHandle, BufferUsageKind, ImageHandle, SamplerHandle};
use ravel_api::{
    RavelColorClearValue, RavelCommandBuffer, RavelDepthStencilClearValue, RavelDescriptorSet,
    RavelDescriptorSetLayout, RavelExtents2D, RavelLoadOp, RavelPipeline, RavelResult,
};
use std::sync::Arc;

/// Which mips of an image a sampled binding sees
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MipSelection {
    All,
    Level(u32),
}

impl MipSelection {
    pub fn mip_range(
        self,
        mip_count: u32,
    ) -> std::ops::Range<u32> {
        match self {
            MipSelection::All => 0..mip_count,
            MipSelection::Level(mip_level) => mip_level..mip_level + 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampledImageUsage {
    pub binding: u32,
    pub image: ImageHandle,
    pub mips: MipSelection,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StorageImageUsage {
    pub binding: u32,
    pub image: ImageHandle,
    pub mip_level: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferUsage {
    pub binding: u32,
    pub buffer: BufferHandle,
    pub kind: BufferUsageKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SamplerUsage {
    pub binding: u32,
    pub sampler: SamplerHandle,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorTarget {
    pub image: ImageHandle,
    pub mip_level: u32,
    pub load_op: RavelLoadOp,
    pub clear_value: RavelColorClearValue,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DepthTarget {
    pub image: ImageHandle,
    pub load_op: RavelLoadOp,
    pub clear_value: RavelDepthStencilClearValue,
}

/// A compute pipeline together with the layout its descriptor sets are allocated with
#[derive(Clone, Debug)]
pub struct ComputePipeline {
    pub pipeline: RavelPipeline,
    pub descriptor_set_layout: RavelDescriptorSetLayout,
}

/// Handed to drawcall recorders. `command_buffer` is the frame's primary command buffer for inline
/// recorders and the worker's secondary command buffer for parallel recorders. Rendering has
/// already begun on the pass's targets and the viewport covers them.
pub struct PassRecordContext<'a> {
    pub command_buffer: &'a RavelCommandBuffer,
    /// Set 0 with the pass's declared resources written to it. The recorder binds it together with
    /// its pipeline.
    pub descriptor_set: Option<&'a RavelDescriptorSet>,
    pub extents: RavelExtents2D,
    pub worker_index: usize,
    pub worker_count: usize,
}

pub type InlineRecorder = Box<dyn FnOnce(&PassRecordContext) -> RavelResult<()>>;
pub type ParallelRecorder = Arc<dyn Fn(&PassRecordContext) -> RavelResult<()> + Send + Sync>;

pub enum GraphicRecorder {
    /// Rendering begins and ends with nothing drawn (clears only)
    None,
    Inline(InlineRecorder),
    /// Called once per worker, each with its own secondary command buffer
    Parallel(ParallelRecorder),
}

pub enum PassKind {
    Compute {
        pipeline: ComputePipeline,
        group_count: [u32; 3],
    },
    Graphic {
        color_targets: Vec<ColorTarget>,
        depth_target: Option<DepthTarget>,
        descriptor_set_layout: Option<RavelDescriptorSetLayout>,
        recorder: GraphicRecorder,
    },
}

/// One pass of a frame. Passes run in the order they are declared.
pub struct PassDeclaration {
    pub(crate) name: String,
    pub(crate) kind: PassKind,
    pub(crate) sampled_images: Vec<SampledImageUsage>,
    pub(crate) storage_images: Vec<StorageImageUsage>,
    pub(crate) buffers: Vec<BufferUsage>,
    pub(crate) samplers: Vec<SamplerUsage>,
}

impl PassDeclaration {
    fn new(
        name: &str,
        kind: PassKind,
    ) -> Self {
        PassDeclaration {
            name: name.to_string(),
            kind,
            sampled_images: Default::default(),
            storage_images: Default::default(),
            buffers: Default::default(),
            samplers: Default::default(),
        }
    }

    pub fn compute(
        name: &str,
        pipeline: &ComputePipeline,
        group_count: [u32; 3],
    ) -> Self {
        Self::new(
            name,
            PassKind::Compute {
                pipeline: pipeline.clone(),
                group_count,
            },
        )
    }

    pub fn graphic(name: &str) -> Self {
        Self::new(
            name,
            PassKind::Graphic {
                color_targets: Default::default(),
                depth_target: None,
                descriptor_set_layout: None,
                recorder: GraphicRecorder::None,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PassKind {
        &self.kind
    }

    pub fn is_compute(&self) -> bool {
        matches!(self.kind, PassKind::Compute { .. })
    }

    fn graphic_kind_mut(
        &mut self,
        what: &str,
    ) -> (
        &mut Vec<ColorTarget>,
        &mut Option<DepthTarget>,
        &mut Option<RavelDescriptorSetLayout>,
        &mut GraphicRecorder,
    ) {
        match &mut self.kind {
            PassKind::Graphic {
                color_targets,
                depth_target,
                descriptor_set_layout,
                recorder,
            } => (color_targets, depth_target, descriptor_set_layout, recorder),
            PassKind::Compute { .. } => {
                panic!("{} can't be set on compute pass {:?}", what, self.name)
            }
        }
    }

    pub fn color_target(
        mut self,
        image: ImageHandle,
        mip_level: u32,
        load_op: RavelLoadOp,
        clear_value: RavelColorClearValue,
    ) -> Self {
        self.graphic_kind_mut("a color target").0.push(ColorTarget {
            image,
            mip_level,
            load_op,
            clear_value,
        });
        self
    }

    pub fn depth_target(
        mut self,
        image: ImageHandle,
        load_op: RavelLoadOp,
        clear_value: RavelDepthStencilClearValue,
    ) -> Self {
        *self.graphic_kind_mut("a depth target").1 = Some(DepthTarget {
            image,
            load_op,
            clear_value,
        });
        self
    }

    /// Layout of the descriptor set built from this pass's bindings. Required if the pass binds
    /// anything.
    pub fn descriptor_set_layout(
        mut self,
        descriptor_set_layout: &RavelDescriptorSetLayout,
    ) -> Self {
        *self.graphic_kind_mut("a descriptor set layout").2 = Some(descriptor_set_layout.clone());
        self
    }

    pub fn record_inline<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: FnOnce(&PassRecordContext) -> RavelResult<()> + 'static,
    {
        *self.graphic_kind_mut("a recorder").3 = GraphicRecorder::Inline(Box::new(f));
        self
    }

    pub fn record_parallel<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: Fn(&PassRecordContext) -> RavelResult<()> + Send + Sync + 'static,
    {
        *self.graphic_kind_mut("a recorder").3 = GraphicRecorder::Parallel(Arc::new(f));
        self
    }

    pub fn sampled_image(
        mut self,
        binding: u32,
        image: ImageHandle,
        mips: MipSelection,
    ) -> Self {
        self.sampled_images.push(SampledImageUsage {
            binding,
            image,
            mips,
        });
        self
    }

    pub fn storage_image(
        mut self,
        binding: u32,
        image: ImageHandle,
        mip_level: u32,
    ) -> Self {
        self.storage_images.push(StorageImageUsage {
            binding,
            image,
            mip_level,
        });
        self
    }

    pub fn storage_buffer(
        mut self,
        binding: u32,
        buffer: BufferHandle,
        read_only: bool,
    ) -> Self {
        self.buffers.push(BufferUsage {
            binding,
            buffer,
            kind: BufferUsageKind::Storage { read_only },
        });
        self
    }

    pub fn uniform_buffer(
        mut self,
        binding: u32,
        buffer: BufferHandle,
    ) -> Self {
        self.buffers.push(BufferUsage {
            binding,
            buffer,
            kind: BufferUsageKind::Uniform,
        });
        self
    }

    pub fn sampler(
        mut self,
        binding: u32,
        sampler: SamplerHandle,
    ) -> Self {
        self.samplers.push(SamplerUsage { binding, sampler });
        self
    }

    pub fn sampled_images(&self) -> &[SampledImageUsage] {
        &self.sampled_images
    }

    pub fn storage_images(&self) -> &[StorageImageUsage] {
        &self.storage_images
    }

    pub fn buffers(&self) -> &[BufferUsage] {
        &self.buffers
    }

    pub fn samplers(&self) -> &[SamplerUsage] {
        &self.samplers
    }

    pub fn color_targets(&self) -> &[ColorTarget] {
        match &self.kind {
            PassKind::Graphic { color_targets, .. } => color_targets,
            PassKind::Compute { .. } => &[],
        }
    }

    pub fn depth_target_image(&self) -> Option<&DepthTarget> {
        match &self.kind {
            PassKind::Graphic { depth_target, .. } => depth_target.as_ref(),
            PassKind::Compute { .. } => None,
        }
    }

    /// Layout used for this pass's descriptor set, if it has one
    pub fn pass_descriptor_set_layout(&self) -> Option<&RavelDescriptorSetLayout> {
        match &self.kind {
            PassKind::Compute { pipeline, .. } => Some(&pipeline.descriptor_set_layout),
            PassKind::Graphic {
                descriptor_set_layout,
                ..
            } => descriptor_set_layout.as_ref(),
        }
    }

    /// How many mips of a sampled usage this pass also binds as storage. Those mips stay in the
    /// storage layout for the whole pass.
    pub fn storage_bound_mip_count(
        &self,
        sampled: &SampledImageUsage,
        mip_count: u32,
    ) -> u32 {
        sampled
            .mips
            .mip_range(mip_count)
            .filter(|&mip_level| {
                self.storage_images
                    .iter()
                    .any(|x| x.image == sampled.image && x.mip_level == mip_level)
            })
            .count() as u32
    }

    pub fn has_bindings(&self) -> bool {
        !self.sampled_images.is_empty()
            || !self.storage_images.is_empty()
            || !self.buffers.is_empty()
            || !self.samplers.is_empty()
    }

    /// Every image the pass touches, render targets included
    pub fn referenced_images(&self) -> impl Iterator<Item = ImageHandle> + '_ {
        self.sampled_images
            .iter()
            .map(|x| x.image)
            .chain(self.storage_images.iter().map(|x| x.image))
            .chain(self.color_targets().iter().map(|x| x.image))
            .chain(self.depth_target_image().map(|x| x.image))
    }
}

impl std::fmt::Debug for PassDeclaration {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("PassDeclaration")
            .field("name", &self.name)
            .field("is_compute", &self.is_compute())
            .field("sampled_images", &self.sampled_images)
            .field("storage_images", &self.storage_images)
            .field("buffers", &self.buffers)
            .field("samplers", &self.samplers)
            .finish()
    }
}
