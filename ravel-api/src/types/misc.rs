#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Information about the device that the frame core needs to know about
#[derive(Clone, Debug)]
pub struct RavelDeviceInfo {
    /// Nanoseconds per timestamp tick
    pub timestamp_period_ns: f32,
    pub supports_timestamps: bool,
    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
}

/// Used to indicate which type of queue to use. The frame core submits everything to a single
/// graphics queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelQueueType {
    /// Graphics queues generally supports all operations and are a safe default choice
    Graphics,

    /// Compute queues can be used for compute-based work.
    Compute,
}

/// A 2d size for render areas, viewports, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelExtents2D {
    pub width: u32,
    pub height: u32,
}

/// A 3d size for textures
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelExtents3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl RavelExtents3D {
    pub fn to_2d(self) -> RavelExtents2D {
        RavelExtents2D {
            width: self.width,
            height: self.height,
        }
    }

    /// Size of the given mip level, never smaller than 1 in any dimension
    pub fn mip_extents(
        self,
        mip_level: u32,
    ) -> RavelExtents3D {
        RavelExtents3D {
            width: (self.width >> mip_level).max(1),
            height: (self.height >> mip_level).max(1),
            depth: (self.depth >> mip_level).max(1),
        }
    }

    /// Number of mip levels in a full chain down to 1x1x1
    pub fn full_mip_count(self) -> u32 {
        let max_dimension = self.width.max(self.height).max(self.depth).max(1);
        32 - max_dimension.leading_zeros()
    }
}

/// The layout an image (or a mip level of an image) is in. Operations require a particular layout
/// and images move between layouts using barriers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelImageLayout {
    /// Contents are undefined. Only valid as the source of a transition.
    Undefined,
    /// Read/write access from shaders (storage images)
    General,
    ColorAttachment,
    DepthStencilAttachment,
    /// Sampled from shaders
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    /// Ready to be handed to the presentation engine
    Present,
}

impl Default for RavelImageLayout {
    fn default() -> Self {
        RavelImageLayout::Undefined
    }
}

bitflags::bitflags! {
    /// Memory access performed by a pass on a resource. Barriers order one access against the
    /// next.
    #[derive(Default)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RavelAccessFlags: u32 {
        const NONE = 0;
        const SHADER_READ = 0x1;
        const SHADER_WRITE = 0x2;
        const UNIFORM_READ = 0x4;
        const COLOR_ATTACHMENT_READ = 0x8;
        const COLOR_ATTACHMENT_WRITE = 0x10;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x20;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x40;
        const TRANSFER_READ = 0x80;
        const TRANSFER_WRITE = 0x100;
        const HOST_WRITE = 0x200;
        const MEMORY_READ = 0x400;
        const MEMORY_WRITE = 0x800;
    }
}

impl RavelAccessFlags {
    pub fn is_write(self) -> bool {
        self.intersects(
            RavelAccessFlags::SHADER_WRITE
                | RavelAccessFlags::COLOR_ATTACHMENT_WRITE
                | RavelAccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
                | RavelAccessFlags::TRANSFER_WRITE
                | RavelAccessFlags::HOST_WRITE
                | RavelAccessFlags::MEMORY_WRITE,
        )
    }
}

bitflags::bitflags! {
    /// How a texture may be used. Part of the texture's identity when matching pooled images.
    #[derive(Default)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RavelTextureUsage: u32 {
        const SAMPLED = 0x1;
        const STORAGE = 0x2;
        const COLOR_ATTACHMENT = 0x4;
        const DEPTH_STENCIL_ATTACHMENT = 0x8;
        const TRANSFER_SRC = 0x10;
        const TRANSFER_DST = 0x20;
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RavelBufferUsage: u32 {
        const UNIFORM = 0x1;
        const STORAGE = 0x2;
        const VERTEX = 0x4;
        const INDEX = 0x8;
        const TRANSFER_SRC = 0x10;
        const TRANSFER_DST = 0x20;
    }
}

/// Where a buffer lives. Only `CpuToGpu` buffers can be written from the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelMemoryUsage {
    GpuOnly,
    CpuToGpu,
}

impl Default for RavelMemoryUsage {
    fn default() -> Self {
        RavelMemoryUsage::GpuOnly
    }
}

/// Status of a fence. See `RavelFence::get_fence_status`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RavelFenceStatus {
    /// The fence was submitted to the command buffer and signaled as completed by the GPU
    Complete,
    /// The fence will be signaled as complete later by the GPU
    Incomplete,
    /// The fence was never submitted, or was submitted and already returned complete once, putting
    /// it back into the unsubmitted state
    Unsubmitted,
}

/// Determines what happens to the contents of an attachment when rendering begins
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelLoadOp {
    DontCare,
    Load,
    Clear,
}

impl Default for RavelLoadOp {
    fn default() -> Self {
        RavelLoadOp::DontCare
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelColorClearValue(pub [f32; 4]);

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RavelDepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

impl Default for RavelDepthStencilClearValue {
    fn default() -> Self {
        RavelDepthStencilClearValue {
            depth: 0.0,
            stencil: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelFilterType {
    Nearest,
    Linear,
}

impl Default for RavelFilterType {
    fn default() -> Self {
        RavelFilterType::Linear
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelAddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl Default for RavelAddressMode {
    fn default() -> Self {
        RavelAddressMode::Repeat
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelPipelineType {
    Graphics,
    Compute,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelPrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

impl Default for RavelPrimitiveTopology {
    fn default() -> Self {
        RavelPrimitiveTopology::TriangleList
    }
}
