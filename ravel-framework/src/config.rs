#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use ravel_api::RavelDescriptorCounts;

/// What happens to a pooled temporary image that went a whole frame without being used
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum PooledImageEvictionPolicy {
    /// Wait for the queue to go idle, then destroy the image immediately
    WaitForQueueIdle,
    /// Hold on to the image until enough frames complete that the GPU can't be using it
    DeferUntilFramesComplete,
}

impl Default for PooledImageEvictionPolicy {
    fn default() -> Self {
        PooledImageEvictionPolicy::WaitForQueueIdle
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RenderBackendConfig {
    /// Descriptors of each kind in one descriptor pool chunk
    pub descriptor_pool_capacity: RavelDescriptorCounts,
    pub descriptor_sets_per_chunk: u32,
    /// Passes after this many in a frame still run but are not timed
    pub max_timestamped_passes: u32,
    pub enable_pass_timestamps: bool,
    pub pooled_image_eviction: PooledImageEvictionPolicy,
}

impl Default for RenderBackendConfig {
    fn default() -> Self {
        RenderBackendConfig {
            descriptor_pool_capacity: RavelDescriptorCounts::splat(128),
            descriptor_sets_per_chunk: 128,
            max_timestamped_passes: 64,
            enable_pass_timestamps: true,
            pooled_image_eviction: PooledImageEvictionPolicy::WaitForQueueIdle,
        }
    }
}
