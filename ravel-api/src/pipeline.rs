use crate::empty::RavelPipelineEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelPipelineVulkan;
use crate::RavelPipelineType;

/// A compute or graphics pipeline with a single descriptor set layout
#[derive(Clone, Debug)]
pub enum RavelPipeline {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelPipelineVulkan),
    Empty(RavelPipelineEmpty),
}

impl RavelPipeline {
    pub fn pipeline_type(&self) -> RavelPipelineType {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelPipeline::Vk(inner) => inner.pipeline_type(),
            RavelPipeline::Empty(inner) => inner.pipeline_type(),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_pipeline(&self) -> Option<&RavelPipelineVulkan> {
        match self {
            RavelPipeline::Vk(inner) => Some(inner),
            RavelPipeline::Empty(_) => None,
        }
    }

    pub fn empty_pipeline(&self) -> Option<&RavelPipelineEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelPipeline::Vk(_) => None,
            RavelPipeline::Empty(inner) => Some(inner),
        }
    }
}
