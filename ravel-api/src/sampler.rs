use crate::empty::RavelSamplerEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelSamplerVulkan;

/// Configures how images are filtered and addressed when sampled
#[derive(Clone, Debug)]
pub enum RavelSampler {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelSamplerVulkan),
    Empty(RavelSamplerEmpty),
}

impl RavelSampler {
    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_sampler(&self) -> Option<&RavelSamplerVulkan> {
        match self {
            RavelSampler::Vk(inner) => Some(inner),
            RavelSampler::Empty(_) => None,
        }
    }

    pub fn empty_sampler(&self) -> Option<&RavelSamplerEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelSampler::Vk(_) => None,
            RavelSampler::Empty(inner) => Some(inner),
        }
    }
}
