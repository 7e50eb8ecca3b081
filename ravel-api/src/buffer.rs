use crate::empty::RavelBufferEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelBufferVulkan;
use crate::{RavelBufferDef, RavelResult};

/// A buffer of GPU memory. `CpuToGpu` buffers stay mapped for their whole lifetime and can be
/// written from the host.
///
/// Buffers must not be dropped (or written from the host) while in use by the GPU.
#[derive(Clone, Debug)]
pub enum RavelBuffer {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelBufferVulkan),
    Empty(RavelBufferEmpty),
}

impl RavelBuffer {
    pub fn buffer_def(&self) -> &RavelBufferDef {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelBuffer::Vk(inner) => inner.buffer_def(),
            RavelBuffer::Empty(inner) => inner.buffer_def(),
        }
    }

    /// Copy bytes to the start of a host-visible buffer
    pub fn copy_to_host_visible_buffer(
        &self,
        data: &[u8],
    ) -> RavelResult<()> {
        self.copy_to_host_visible_buffer_with_offset(data, 0)
    }

    pub fn copy_to_host_visible_buffer_with_offset(
        &self,
        data: &[u8],
        buffer_byte_offset: u64,
    ) -> RavelResult<()> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelBuffer::Vk(inner) => {
                inner.copy_to_host_visible_buffer_with_offset(data, buffer_byte_offset)
            }
            RavelBuffer::Empty(inner) => {
                inner.copy_to_host_visible_buffer_with_offset(data, buffer_byte_offset)
            }
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_buffer(&self) -> Option<&RavelBufferVulkan> {
        match self {
            RavelBuffer::Vk(inner) => Some(inner),
            RavelBuffer::Empty(_) => None,
        }
    }

    pub fn empty_buffer(&self) -> Option<&RavelBufferEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelBuffer::Vk(_) => None,
            RavelBuffer::Empty(inner) => Some(inner),
        }
    }
}
