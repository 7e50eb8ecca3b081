//! GPU object abstraction used by the ravel frame core.
//!
//! Every object is an enum over the compiled backends. The `empty` backend is always available:
//! it runs headless, completes submissions immediately and records an event log, which makes it
//! the backend used by tests. The `vulkan` backend (feature `ravel-vulkan`) wraps an externally
//! created `ash` device and allocates memory with `vk-mem`.
//!
//! Device creation, windowing and swapchains are not part of this crate. A vulkan device context
//! is created from handles the application already owns, and presentation goes through the
//! `RavelPresentTarget` trait.

#[cfg(feature = "ravel-vulkan")]
pub use ash;
#[cfg(feature = "ravel-vulkan")]
pub use vk_mem;

pub use buffer::*;
pub use command_buffer::*;
pub use command_pool::*;
pub use descriptor_set::*;
pub use device_context::*;
pub use error::*;
pub use fence::*;
pub use pipeline::*;
pub use present::*;
pub use query_pool::*;
pub use queue::*;
pub use sampler::*;
pub use semaphore::*;
pub use texture::*;
pub use types::*;

pub use backends::empty;
#[cfg(feature = "ravel-vulkan")]
pub use backends::vulkan;

mod backends;
mod types;

mod buffer;
mod command_buffer;
mod command_pool;
mod descriptor_set;
mod device_context;
mod error;
mod fence;
mod pipeline;
mod present;
mod query_pool;
mod queue;
mod sampler;
mod semaphore;
mod texture;

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
