use crate::{RavelQueue, RavelResult, RavelSemaphore};

/// Something that can put a rendered image on screen. Swapchain management and windowing live
/// outside this crate; they plug in through this trait.
///
/// The frame core signals a semaphore when the frame's submission completes and passes it to
/// `present()`. The implementation must make presentation wait on it.
pub trait RavelPresentTarget {
    /// Semaphore the frame's submission must wait on before writing the presented image (for
    /// example a swapchain image-acquired semaphore). None if no wait is needed.
    fn image_available_semaphore(&self) -> Option<&RavelSemaphore> {
        None
    }

    fn present(
        &self,
        queue: &RavelQueue,
        wait_semaphores: &[&RavelSemaphore],
    ) -> RavelResult<()>;
}
