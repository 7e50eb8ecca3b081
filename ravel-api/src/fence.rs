use crate::empty::RavelFenceEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelFenceVulkan;
use crate::{RavelFenceStatus, RavelResult};

/// A GPU -> CPU synchronization mechanism.
///
/// A fence can be in the following states:
///  * Unsubmitted - Initial state when created
///  * Incomplete - Once a command buffer is submitted, the fence is marked as incomplete
///  * Complete - The GPU can mark a fence as complete to signal completion of work.
///
/// The status of the fence returns to Unsubmitted when get_fence_status() is called while in a
/// completed state, or when it is waited on. In other words, the Complete status can only be
/// observed one time unless the fence is submitted again.
///
/// Fences must not be dropped if they are in use by the GPU.
#[derive(Debug)]
pub enum RavelFence {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelFenceVulkan),
    Empty(RavelFenceEmpty),
}

impl RavelFence {
    /// Get the status of the fence. See `RavelFenceStatus`
    pub fn get_fence_status(&self) -> RavelResult<RavelFenceStatus> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelFence::Vk(inner) => inner.get_fence_status(),
            RavelFence::Empty(inner) => inner.get_fence_status(),
        }
    }

    /// Wait for the fence to be signaled as complete by the GPU. Returns immediately if the fence
    /// was never submitted.
    pub fn wait(&self) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelFence::Vk(inner) => inner.wait(),
            RavelFence::Empty(inner) => inner.wait(),
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_fence(&self) -> Option<&RavelFenceVulkan> {
        match self {
            RavelFence::Vk(inner) => Some(inner),
            RavelFence::Empty(_) => None,
        }
    }

    pub fn empty_fence(&self) -> Option<&RavelFenceEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelFence::Vk(_) => None,
            RavelFence::Empty(inner) => Some(inner),
        }
    }
}
