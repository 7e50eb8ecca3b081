use crate::empty::{RavelDescriptorPoolEmpty, RavelDescriptorSetEmpty, RavelDescriptorSetLayoutEmpty};
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::{
    RavelDescriptorPoolVulkan, RavelDescriptorSetLayoutVulkan, RavelDescriptorSetVulkan,
};
use crate::*;

/// Describes the bindings of a descriptor set. Created from the binding indices a shader
/// reflection step reports for each kind of resource.
#[derive(Clone, Debug)]
pub enum RavelDescriptorSetLayout {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelDescriptorSetLayoutVulkan),
    Empty(RavelDescriptorSetLayoutEmpty),
}

impl RavelDescriptorSetLayout {
    pub fn descriptor_set_layout_def(&self) -> &RavelDescriptorSetLayoutDef {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorSetLayout::Vk(inner) => inner.descriptor_set_layout_def(),
            RavelDescriptorSetLayout::Empty(inner) => inner.descriptor_set_layout_def(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_descriptor_set_layout(&self) -> Option<&RavelDescriptorSetLayoutVulkan> {
        match self {
            RavelDescriptorSetLayout::Vk(inner) => Some(inner),
            RavelDescriptorSetLayout::Empty(_) => None,
        }
    }

    pub fn empty_descriptor_set_layout(&self) -> Option<&RavelDescriptorSetLayoutEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorSetLayout::Vk(_) => None,
            RavelDescriptorSetLayout::Empty(inner) => Some(inner),
        }
    }
}

/// A fixed-capacity pool descriptor sets are allocated from. Sets are never freed individually,
/// the whole pool is reset at once.
pub enum RavelDescriptorPool {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelDescriptorPoolVulkan),
    Empty(RavelDescriptorPoolEmpty),
}

impl RavelDescriptorPool {
    /// Returns `RavelError::AllocationFailure` if the pool can't hold another set of this layout
    pub fn allocate_descriptor_set(
        &self,
        descriptor_set_layout: &RavelDescriptorSetLayout,
    ) -> RavelResult<RavelDescriptorSet> {
        Ok(match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorPool::Vk(inner) => {
                RavelDescriptorSet::Vk(inner.allocate_descriptor_set(
                    descriptor_set_layout.vk_descriptor_set_layout().unwrap(),
                )?)
            }
            RavelDescriptorPool::Empty(inner) => {
                RavelDescriptorSet::Empty(inner.allocate_descriptor_set(
                    descriptor_set_layout.empty_descriptor_set_layout().unwrap(),
                )?)
            }
        })
    }

    /// Every set allocated from the pool becomes invalid. Only call this once the GPU finished
    /// using them.
    pub fn reset_descriptor_pool(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorPool::Vk(inner) => inner.reset_descriptor_pool(),
            RavelDescriptorPool::Empty(inner) => inner.reset_descriptor_pool(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_descriptor_pool(&self) -> Option<&RavelDescriptorPoolVulkan> {
        match self {
            RavelDescriptorPool::Vk(inner) => Some(inner),
            RavelDescriptorPool::Empty(_) => None,
        }
    }

    pub fn empty_descriptor_pool(&self) -> Option<&RavelDescriptorPoolEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorPool::Vk(_) => None,
            RavelDescriptorPool::Empty(inner) => Some(inner),
        }
    }
}

/// A set of resource bindings read by shaders. Written with `update_descriptor_set` before the
/// command buffer that binds it is submitted.
#[derive(Debug)]
pub enum RavelDescriptorSet {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelDescriptorSetVulkan),
    Empty(RavelDescriptorSetEmpty),
}

impl RavelDescriptorSet {
    pub fn update_descriptor_set(
        &self,
        descriptor_writes: &[RavelDescriptorWrite],
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorSet::Vk(inner) => inner.update_descriptor_set(descriptor_writes),
            RavelDescriptorSet::Empty(inner) => inner.update_descriptor_set(descriptor_writes),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_descriptor_set(&self) -> Option<&RavelDescriptorSetVulkan> {
        match self {
            RavelDescriptorSet::Vk(inner) => Some(inner),
            RavelDescriptorSet::Empty(_) => None,
        }
    }

    pub fn empty_descriptor_set(&self) -> Option<&RavelDescriptorSetEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelDescriptorSet::Vk(_) => None,
            RavelDescriptorSet::Empty(inner) => Some(inner),
        }
    }
}
