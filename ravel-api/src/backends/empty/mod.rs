//! Headless backend. Nothing is sent to a GPU: submissions complete immediately, buffers are
//! backed by host memory and timestamps come from a simulated clock. Every call that matters for
//! synchronization is appended to an event log on the device context so that tests can check the
//! order in which things happened.

mod command;
mod device_context;
mod resources;
mod sync;

pub use command::*;
pub use device_context::*;
pub use resources::*;
pub use sync::*;

use crate::{RavelAccessFlags, RavelExtents2D, RavelImageLayout};

/// Simulated GPU time spent on a dispatch or draw
pub const EMPTY_WORK_DURATION_NS: u64 = 10_000;
/// Simulated GPU time spent on any other command
pub const EMPTY_COMMAND_DURATION_NS: u64 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct RavelEmptyTextureBarrier {
    pub texture_id: u64,
    pub src_layout: RavelImageLayout,
    pub dst_layout: RavelImageLayout,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RavelEmptyBufferBarrier {
    pub buffer_id: u64,
    pub src_access: RavelAccessFlags,
    pub dst_access: RavelAccessFlags,
}

/// A command recorded into an empty command buffer
#[derive(Clone, Debug, PartialEq)]
pub enum RavelEmptyCommand {
    Barrier {
        texture_barriers: Vec<RavelEmptyTextureBarrier>,
        buffer_barriers: Vec<RavelEmptyBufferBarrier>,
    },
    BeginRendering {
        color_texture_ids: Vec<u64>,
        depth_texture_id: Option<u64>,
        extents: RavelExtents2D,
    },
    EndRendering,
    SetViewportAndScissor {
        extents: RavelExtents2D,
    },
    BindPipeline {
        pipeline_id: u64,
    },
    BindDescriptorSet {
        descriptor_set_id: u64,
    },
    Dispatch {
        group_count: [u32; 3],
    },
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    ExecuteSecondary {
        command_buffer_id: u64,
        commands: Vec<RavelEmptyCommand>,
    },
    ResetQueryPool {
        query_pool_id: u64,
        first_query: u32,
        query_count: u32,
    },
    WriteTimestamp {
        query_pool_id: u64,
        query_index: u32,
    },
}

/// Something that happened on an empty device, in call order
#[derive(Clone, Debug, PartialEq)]
pub enum RavelEmptyEvent {
    TextureCreated {
        texture_id: u64,
    },
    TextureDestroyed {
        texture_id: u64,
    },
    BufferCreated {
        buffer_id: u64,
    },
    BufferDestroyed {
        buffer_id: u64,
    },
    BufferWritten {
        buffer_id: u64,
        offset: u64,
        data: Vec<u8>,
    },
    CommandPoolReset {
        command_pool_id: u64,
    },
    CommandBufferBegun {
        command_buffer_id: u64,
    },
    DescriptorPoolCreated {
        descriptor_pool_id: u64,
    },
    DescriptorPoolReset {
        descriptor_pool_id: u64,
    },
    Submitted {
        command_buffer_ids: Vec<u64>,
        commands: Vec<RavelEmptyCommand>,
        wait_semaphore_ids: Vec<u64>,
        signal_semaphore_ids: Vec<u64>,
        signal_fence_id: Option<u64>,
    },
    /// The CPU observed that a submitted fence completed (by waiting on it or polling it)
    FenceObserved {
        fence_id: u64,
    },
    QueueWaitIdle,
    DeviceWaitIdle,
    Presented {
        wait_semaphore_ids: Vec<u64>,
    },
}
