mod frame_pacer;
mod frame_slot;

pub use frame_pacer::FramePacer;
pub(crate) use frame_slot::{FrameSlot, PendingBufferWrite};
pub use frame_slot::{FrameSlotState, PassTiming};
