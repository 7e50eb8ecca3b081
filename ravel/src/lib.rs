//! Resource and synchronization core for a pass-based real-time renderer.
//!
//! `api` is the GPU object abstraction. `framework` (feature `framework`, on by default) is the
//! frame core built on top of it: temporary image aliasing, barrier synthesis, descriptor pools
//! and frame pacing, composed by `framework::RenderBackend`.

pub use ravel_api as api;

#[cfg(feature = "framework")]
pub use ravel_framework as framework;
