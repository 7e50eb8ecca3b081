use crate::empty::RavelTextureEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelTextureVulkan;
use crate::RavelTextureDef;

/// An image that can be sampled, written as a storage image or rendered to, depending on its
/// usage flags.
///
/// A view of the whole mip chain and a view of each individual mip level are created along with
/// the texture.
///
/// Textures must not be dropped if they are in use by the GPU.
#[derive(Clone, Debug)]
pub enum RavelTexture {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelTextureVulkan),
    Empty(RavelTextureEmpty),
}

impl RavelTexture {
    pub fn texture_def(&self) -> &RavelTextureDef {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelTexture::Vk(inner) => inner.texture_def(),
            RavelTexture::Empty(inner) => inner.texture_def(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_texture(&self) -> Option<&RavelTextureVulkan> {
        match self {
            RavelTexture::Vk(inner) => Some(inner),
            RavelTexture::Empty(_) => None,
        }
    }

    pub fn empty_texture(&self) -> Option<&RavelTextureEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelTexture::Vk(_) => None,
            RavelTexture::Empty(inner) => Some(inner),
        }
    }
}
