use crate::empty::RavelQueryPoolEmpty;
#[cfg(feature = "ravel-vulkan")]
use crate::vulkan::RavelQueryPoolVulkan;
use crate::RavelResult;

/// A pool of timestamp queries. Queries must be reset (with `cmd_reset_query_pool`) before they
/// are written.
pub enum RavelQueryPool {
    #[cfg(feature = "ravel-vulkan")]
    Vk(RavelQueryPoolVulkan),
    Empty(RavelQueryPoolEmpty),
}

impl RavelQueryPool {
    /// Read back timestamps. Only call this after the submission that wrote them completed.
    /// Queries that have not been written since their last reset return None.
    pub fn get_results(
        &self,
        first_query: u32,
        query_count: u32,
    ) -> RavelResult<Vec<Option<u64>>> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueryPool::Vk(inner) => inner.get_results(first_query, query_count),
            RavelQueryPool::Empty(inner) => inner.get_results(first_query, query_count),
        }
    }

    #[cfg(feature = "ravel-vulkan")]
    pub fn vk_query_pool(&self) -> Option<&RavelQueryPoolVulkan> {
        match self {
            RavelQueryPool::Vk(inner) => Some(inner),
            RavelQueryPool::Empty(_) => None,
        }
    }

    pub fn empty_query_pool(&self) -> Option<&RavelQueryPoolEmpty> {
        match self {
            #[cfg(feature = "ravel-vulkan")]
            RavelQueryPool::Vk(_) => None,
            RavelQueryPool::Empty(inner) => Some(inner),
        }
    }
}
