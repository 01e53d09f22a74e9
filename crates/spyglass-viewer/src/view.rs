use std::sync::Mutex;

use spyglass_protocol::mapper::{Dims, WindowRect};

#[derive(Debug, Default, Clone, Copy)]
struct ViewState {
    window: WindowRect,
    frame: Dims,
}

/// Geometry shared between the UI thread, the video task, and input
/// emission.
///
/// The UI writes the window rectangle whenever the widget moves or resizes;
/// the video task writes the frame dimensions of the latest decoded image;
/// input emission reads both. Each access copies a handful of integers
/// under a mutex.
#[derive(Debug, Default)]
pub struct SharedView {
    state: Mutex<ViewState>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the UI when the video widget moves or resizes.
    pub fn set_window_rect(&self, x: i32, y: i32, w: u32, h: u32) {
        let mut state = self.state.lock().unwrap();
        state.window = WindowRect { x, y, w, h };
    }

    /// Called by the video task for every decoded frame.
    pub fn set_frame_dims(&self, w: u32, h: u32) {
        let mut state = self.state.lock().unwrap();
        state.frame = Dims::new(w, h);
    }

    pub fn window_rect(&self) -> WindowRect {
        self.state.lock().unwrap().window
    }

    pub fn frame_dims(&self) -> Dims {
        self.state.lock().unwrap().frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_degenerate_until_told_otherwise() {
        let view = SharedView::new();
        assert_eq!(view.frame_dims(), Dims::new(0, 0));
        assert_eq!(view.window_rect().w, 0);
    }

    #[test]
    fn updates_are_visible_across_reads() {
        let view = SharedView::new();
        view.set_window_rect(10, 20, 800, 600);
        view.set_frame_dims(1536, 864);

        assert_eq!(view.window_rect(), WindowRect { x: 10, y: 20, w: 800, h: 600 });
        assert_eq!(view.frame_dims(), Dims::new(1536, 864));
    }
}
