//! Vulkan backend. Requires a Vulkan 1.3 device created with the `synchronization2` and
//! `dynamicRendering` features enabled. Barriers are issued with `vkCmdPipelineBarrier2` using
//! "all commands" stage scopes on both sides.

mod command;
mod descriptor;
mod device_context;
mod pipeline;
mod resources;
mod sync;
mod util;

pub use command::*;
pub use descriptor::*;
pub use device_context::*;
pub use pipeline::*;
pub use resources::*;
pub use sync::*;
