//! The resource and synchronization core of a pass-based renderer.
//!
//! A frame is a list of passes declared in order. For each frame the `RenderBackend`:
//! - binds temporary images to pooled GPU images, sharing memory between temporaries whose
//!   lifetimes don't overlap (`TemporaryResourcePool`)
//! - walks the passes in declaration order, emitting the layout transitions and memory barriers
//!   each one needs (`BarrierSynthesizer` over the `ResourceStateTable`)
//! - records the passes into a command buffer owned by the frame's slot, optionally spreading a
//!   pass's draw calls across worker threads (`RecordingThreadPool`)
//! - submits, flushing queued buffer writes first, and rotates to the next slot (`FramePacer`)
//!
//! Everything runs on `ravel-api`, so the whole frame core can be exercised headless on the empty
//! backend.

mod config;
pub use config::*;

mod resources;
pub use resources::*;

mod temporaries;
pub use temporaries::*;

mod barrier_synthesizer;
pub use barrier_synthesizer::*;

mod pass;
pub use pass::*;

mod thread_pool;
pub use thread_pool::*;

mod frame;
pub use frame::*;

mod render_backend;
pub use render_backend::*;

pub use ravel_api as api;
pub use ravel_api::{RavelError, RavelResult, MAX_FRAMES_IN_FLIGHT};
