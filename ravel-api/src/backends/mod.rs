pub mod empty;

#[cfg(feature = "ravel-vulkan")]
pub mod vulkan;
