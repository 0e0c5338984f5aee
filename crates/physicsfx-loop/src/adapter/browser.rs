use web_sys::wasm_bindgen::JsCast;
use web_sys::wasm_bindgen::closure::Closure;

use super::callback_chain::{FrameRequest, FrameScheduler};

/// `requestAnimationFrame` on the page's window.
#[derive(Clone, Debug)]
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
}

impl AnimationFrameScheduler {
    /// `None` outside a window context (workers).
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameRequest> {
        let closure = Closure::once_into_js(move || callback());

        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(id) => Some(FrameRequest(id as u32 as u64)),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {e:?}");
                None
            }
        }
    }

    fn cancel_frame(&self, request: FrameRequest) {
        if let Err(e) = self.window.cancel_animation_frame(request.0 as u32 as i32) {
            log::warn!("cancelAnimationFrame failed: {e:?}");
        }
    }
}
