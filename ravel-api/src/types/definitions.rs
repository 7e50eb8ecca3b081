#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::{
    RavelAccessFlags, RavelAddressMode, RavelBuffer, RavelBufferUsage, RavelColorClearValue,
    RavelDepthStencilClearValue, RavelDescriptorSetLayout, RavelError, RavelExtents2D,
    RavelExtents3D, RavelFilterType, RavelFormat, RavelImageLayout, RavelLoadOp,
    RavelMemoryUsage, RavelPrimitiveTopology, RavelResult, RavelSampler, RavelTexture,
    RavelTextureUsage,
};

/// Dimensionality of a texture. Cube textures have six array layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelTextureDimensions {
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
}

impl Default for RavelTextureDimensions {
    fn default() -> Self {
        RavelTextureDimensions::Dim2D
    }
}

/// Used to create a `RavelTexture`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelTextureDef {
    pub extents: RavelExtents3D,
    pub mip_count: u32,
    pub format: RavelFormat,
    pub usage: RavelTextureUsage,
    pub dimensions: RavelTextureDimensions,
}

impl Default for RavelTextureDef {
    fn default() -> Self {
        RavelTextureDef {
            extents: RavelExtents3D {
                width: 0,
                height: 0,
                depth: 0,
            },
            mip_count: 1,
            format: RavelFormat::UNDEFINED,
            usage: RavelTextureUsage::SAMPLED,
            dimensions: RavelTextureDimensions::Dim2D,
        }
    }
}

impl RavelTextureDef {
    pub fn array_length(&self) -> u32 {
        match self.dimensions {
            RavelTextureDimensions::Cube => 6,
            _ => 1,
        }
    }

    pub fn validate(&self) -> RavelResult<()> {
        let fail = |message: String| Err(RavelError::ValidationFailure(message));

        if self.extents.width == 0 || self.extents.height == 0 || self.extents.depth == 0 {
            return fail(format!("texture extents must be non-zero: {:?}", self.extents));
        }

        if self.format == RavelFormat::UNDEFINED {
            return fail("texture format is UNDEFINED".to_string());
        }

        if self.usage.is_empty() {
            return fail("texture has no usage flags".to_string());
        }

        if self.mip_count == 0 || self.mip_count > self.extents.full_mip_count() {
            return fail(format!(
                "mip count {} is out of range for extents {:?}",
                self.mip_count, self.extents
            ));
        }

        match self.dimensions {
            RavelTextureDimensions::Dim1D => {
                if self.extents.height != 1 || self.extents.depth != 1 {
                    return fail(format!("1D texture with extents {:?}", self.extents));
                }
            }
            RavelTextureDimensions::Dim2D => {
                if self.extents.depth != 1 {
                    return fail(format!("2D texture with extents {:?}", self.extents));
                }
            }
            RavelTextureDimensions::Cube => {
                if self.extents.depth != 1 || self.extents.width != self.extents.height {
                    return fail(format!(
                        "cube texture faces must be square with depth 1: {:?}",
                        self.extents
                    ));
                }
            }
            RavelTextureDimensions::Dim3D => {}
        }

        if self.format.has_depth_or_stencil() {
            if self.usage.intersects(
                RavelTextureUsage::STORAGE | RavelTextureUsage::COLOR_ATTACHMENT,
            ) {
                return fail(format!(
                    "depth format {:?} can't be used as a storage image or color attachment",
                    self.format
                ));
            }
        } else if self
            .usage
            .contains(RavelTextureUsage::DEPTH_STENCIL_ATTACHMENT)
        {
            return fail(format!(
                "color format {:?} can't be used as a depth attachment",
                self.format
            ));
        }

        Ok(())
    }
}

/// Used to create a `RavelBuffer`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelBufferDef {
    pub size: u64,
    pub usage: RavelBufferUsage,
    pub memory_usage: RavelMemoryUsage,
}

impl Default for RavelBufferDef {
    fn default() -> Self {
        RavelBufferDef {
            size: 0,
            usage: RavelBufferUsage::UNIFORM,
            memory_usage: RavelMemoryUsage::CpuToGpu,
        }
    }
}

impl RavelBufferDef {
    pub fn validate(&self) -> RavelResult<()> {
        if self.size == 0 {
            return Err(RavelError::ValidationFailure(
                "buffer size must be non-zero".to_string(),
            ));
        }

        if self.usage.is_empty() {
            return Err(RavelError::ValidationFailure(
                "buffer has no usage flags".to_string(),
            ));
        }

        Ok(())
    }
}

/// Used to create a `RavelSampler`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelSamplerDef {
    pub min_filter: RavelFilterType,
    pub mag_filter: RavelFilterType,
    pub mip_filter: RavelFilterType,
    pub address_mode_u: RavelAddressMode,
    pub address_mode_v: RavelAddressMode,
    pub address_mode_w: RavelAddressMode,
}

/// Kind of resource bound at a descriptor binding
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelDescriptorType {
    Sampler,
    SampledImage,
    StorageImage,
    UniformBuffer,
    StorageBuffer,
}

/// Number of descriptors of each kind. Used both as a requirement (what a set layout needs) and
/// as a capacity (what a pool can still hand out).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelDescriptorCounts {
    pub samplers: u32,
    pub sampled_images: u32,
    pub storage_images: u32,
    pub uniform_buffers: u32,
    pub storage_buffers: u32,
}

impl RavelDescriptorCounts {
    pub fn splat(count: u32) -> Self {
        RavelDescriptorCounts {
            samplers: count,
            sampled_images: count,
            storage_images: count,
            uniform_buffers: count,
            storage_buffers: count,
        }
    }

    pub fn get(
        &self,
        descriptor_type: RavelDescriptorType,
    ) -> u32 {
        match descriptor_type {
            RavelDescriptorType::Sampler => self.samplers,
            RavelDescriptorType::SampledImage => self.sampled_images,
            RavelDescriptorType::StorageImage => self.storage_images,
            RavelDescriptorType::UniformBuffer => self.uniform_buffers,
            RavelDescriptorType::StorageBuffer => self.storage_buffers,
        }
    }

    pub fn add(
        &mut self,
        descriptor_type: RavelDescriptorType,
        count: u32,
    ) {
        match descriptor_type {
            RavelDescriptorType::Sampler => self.samplers += count,
            RavelDescriptorType::SampledImage => self.sampled_images += count,
            RavelDescriptorType::StorageImage => self.storage_images += count,
            RavelDescriptorType::UniformBuffer => self.uniform_buffers += count,
            RavelDescriptorType::StorageBuffer => self.storage_buffers += count,
        }
    }

    /// True if every count in `self` is <= the matching count in `capacity`
    pub fn fits_within(
        &self,
        capacity: &RavelDescriptorCounts,
    ) -> bool {
        self.samplers <= capacity.samplers
            && self.sampled_images <= capacity.sampled_images
            && self.storage_images <= capacity.storage_images
            && self.uniform_buffers <= capacity.uniform_buffers
            && self.storage_buffers <= capacity.storage_buffers
    }

    /// Subtract `required` from these counts. Caller must check `fits_within` first.
    pub fn consume(
        &mut self,
        required: &RavelDescriptorCounts,
    ) {
        assert!(required.fits_within(self));
        self.samplers -= required.samplers;
        self.sampled_images -= required.sampled_images;
        self.storage_images -= required.storage_images;
        self.uniform_buffers -= required.uniform_buffers;
        self.storage_buffers -= required.storage_buffers;
    }

    pub fn iter(&self) -> impl Iterator<Item = (RavelDescriptorType, u32)> + '_ {
        [
            RavelDescriptorType::Sampler,
            RavelDescriptorType::SampledImage,
            RavelDescriptorType::StorageImage,
            RavelDescriptorType::UniformBuffer,
            RavelDescriptorType::StorageBuffer,
        ]
        .into_iter()
        .map(move |descriptor_type| (descriptor_type, self.get(descriptor_type)))
    }
}

/// One binding slot in a descriptor set layout
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelDescriptorBinding {
    pub binding: u32,
    pub descriptor_type: RavelDescriptorType,
}

/// Used to create a `RavelDescriptorSetLayout`. Bindings are visible to all shader stages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelDescriptorSetLayoutDef {
    pub bindings: Vec<RavelDescriptorBinding>,
}

impl RavelDescriptorSetLayoutDef {
    pub fn descriptor_counts(&self) -> RavelDescriptorCounts {
        let mut counts = RavelDescriptorCounts::default();
        for binding in &self.bindings {
            counts.add(binding.descriptor_type, 1);
        }
        counts
    }

    pub fn validate(&self) -> RavelResult<()> {
        for (i, a) in self.bindings.iter().enumerate() {
            for b in &self.bindings[i + 1..] {
                if a.binding == b.binding {
                    return Err(RavelError::ValidationFailure(format!(
                        "binding {} is declared more than once ({:?} and {:?})",
                        a.binding, a.descriptor_type, b.descriptor_type
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Used to create a `RavelDescriptorPool`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelDescriptorPoolDef {
    pub max_sets: u32,
    pub descriptor_counts: RavelDescriptorCounts,
}

/// Resource referenced by a descriptor write
#[derive(Copy, Clone)]
pub enum RavelDescriptorResource<'a> {
    /// Binds all mips if `mip_slice` is None. `layout` is the layout the mips are in while the
    /// set is used.
    SampledImage {
        texture: &'a RavelTexture,
        mip_slice: Option<u32>,
        layout: RavelImageLayout,
    },
    StorageImage {
        texture: &'a RavelTexture,
        mip_slice: u32,
    },
    UniformBuffer(&'a RavelBuffer),
    StorageBuffer(&'a RavelBuffer),
    Sampler(&'a RavelSampler),
}

impl<'a> RavelDescriptorResource<'a> {
    pub fn descriptor_type(&self) -> RavelDescriptorType {
        match self {
            RavelDescriptorResource::SampledImage { .. } => RavelDescriptorType::SampledImage,
            RavelDescriptorResource::StorageImage { .. } => RavelDescriptorType::StorageImage,
            RavelDescriptorResource::UniformBuffer(_) => RavelDescriptorType::UniformBuffer,
            RavelDescriptorResource::StorageBuffer(_) => RavelDescriptorType::StorageBuffer,
            RavelDescriptorResource::Sampler(_) => RavelDescriptorType::Sampler,
        }
    }
}

#[derive(Copy, Clone)]
pub struct RavelDescriptorWrite<'a> {
    pub binding: u32,
    pub resource: RavelDescriptorResource<'a>,
}

/// Opaque compiled shader bytecode and the entry point to use
#[derive(Copy, Clone, Debug)]
pub struct RavelShaderStageDef<'a> {
    pub bytecode: &'a [u8],
    pub entry_point: &'a str,
}

pub struct RavelComputePipelineDef<'a> {
    pub shader: RavelShaderStageDef<'a>,
    pub descriptor_set_layout: &'a RavelDescriptorSetLayout,
}

/// Graphics pipelines take no vertex input (vertices are pulled from buffers in the shader) and
/// use dynamic viewport/scissor state.
pub struct RavelGraphicsPipelineDef<'a> {
    pub vertex_shader: RavelShaderStageDef<'a>,
    pub fragment_shader: RavelShaderStageDef<'a>,
    pub descriptor_set_layout: &'a RavelDescriptorSetLayout,
    pub color_formats: &'a [RavelFormat],
    pub depth_format: Option<RavelFormat>,
    pub primitive_topology: RavelPrimitiveTopology,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RavelQueryPoolDef {
    pub query_count: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RavelCommandPoolDef {
    /// Hint that command buffers are short-lived and reset together with the pool
    pub transient: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RavelCommandBufferDef {
    pub is_secondary: bool,
}

/// A layout transition and/or memory dependency on a range of mips of a texture. Stage scope is
/// always "all commands".
#[derive(Copy, Clone)]
pub struct RavelTextureBarrier<'a> {
    pub texture: &'a RavelTexture,
    pub src_layout: RavelImageLayout,
    pub dst_layout: RavelImageLayout,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
}

/// A memory dependency on a whole buffer. Stage scope is always "all commands".
#[derive(Copy, Clone)]
pub struct RavelBufferBarrier<'a> {
    pub buffer: &'a RavelBuffer,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
}

#[derive(Copy, Clone)]
pub struct RavelColorAttachmentBinding<'a> {
    pub texture: &'a RavelTexture,
    pub mip_slice: u32,
    pub load_op: RavelLoadOp,
    pub clear_value: RavelColorClearValue,
}

#[derive(Copy, Clone)]
pub struct RavelDepthAttachmentBinding<'a> {
    pub texture: &'a RavelTexture,
    pub load_op: RavelLoadOp,
    pub clear_value: RavelDepthStencilClearValue,
}

/// Attachments for `cmd_begin_rendering`. Attachments must already be in the attachment layout.
pub struct RavelRenderingDef<'a> {
    pub color_attachments: &'a [RavelColorAttachmentBinding<'a>],
    pub depth_attachment: Option<RavelDepthAttachmentBinding<'a>>,
    pub extents: RavelExtents2D,
    /// If true, the draws are recorded into secondary command buffers and executed with
    /// `cmd_execute_secondary`
    pub secondary_contents: bool,
}

/// Formats of the attachments a secondary command buffer will draw into
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RavelRenderingInheritanceDef {
    pub color_formats: Vec<RavelFormat>,
    pub depth_format: Option<RavelFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_def() -> RavelTextureDef {
        RavelTextureDef {
            extents: RavelExtents3D {
                width: 64,
                height: 64,
                depth: 1,
            },
            mip_count: 1,
            format: RavelFormat::R16G16B16A16_SFLOAT,
            usage: RavelTextureUsage::SAMPLED | RavelTextureUsage::COLOR_ATTACHMENT,
            dimensions: RavelTextureDimensions::Dim2D,
        }
    }

    #[test]
    fn test_texture_def_validation() {
        assert!(color_def().validate().is_ok());

        let mut def = color_def();
        def.mip_count = 8;
        assert!(def.validate().is_err());

        let mut def = color_def();
        def.format = RavelFormat::D32_SFLOAT;
        assert!(def.validate().is_err());

        let mut def = color_def();
        def.extents.width = 0;
        assert!(def.validate().is_err());

        let mut def = color_def();
        def.dimensions = RavelTextureDimensions::Cube;
        assert!(def.validate().is_ok());
        assert_eq!(def.array_length(), 6);
    }

    #[test]
    fn test_descriptor_counts() {
        let layout = RavelDescriptorSetLayoutDef {
            bindings: vec![
                RavelDescriptorBinding {
                    binding: 0,
                    descriptor_type: RavelDescriptorType::StorageImage,
                },
                RavelDescriptorBinding {
                    binding: 1,
                    descriptor_type: RavelDescriptorType::StorageImage,
                },
                RavelDescriptorBinding {
                    binding: 2,
                    descriptor_type: RavelDescriptorType::UniformBuffer,
                },
            ],
        };

        let required = layout.descriptor_counts();
        assert_eq!(required.storage_images, 2);
        assert_eq!(required.uniform_buffers, 1);

        let mut capacity = RavelDescriptorCounts::splat(2);
        assert!(required.fits_within(&capacity));
        capacity.consume(&required);
        assert_eq!(capacity.storage_images, 0);
        assert!(!required.fits_within(&capacity));
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let layout = RavelDescriptorSetLayoutDef {
            bindings: vec![
                RavelDescriptorBinding {
                    binding: 3,
                    descriptor_type: RavelDescriptorType::Sampler,
                },
                RavelDescriptorBinding {
                    binding: 3,
                    descriptor_type: RavelDescriptorType::SampledImage,
                },
            ],
        };
        assert!(layout.validate().is_err());
    }
}
