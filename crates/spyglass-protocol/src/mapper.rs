//! Pointer coordinate translation between the viewer window and the host
//! screen.
//!
//! The viewer maps desktop coordinates into frame pixels before sending;
//! the host maps frame pixels to its native screen before injecting. Events
//! that land outside the video rectangle, or that hit a degenerate (zero)
//! dimension anywhere, are dropped rather than clamped.

/// The viewer's video widget in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A width/height pair: transmitted frame size or native screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dims {
    pub w: u32,
    pub h: u32,
}

impl Dims {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Map a pointer position in viewer-desktop coordinates to frame pixels.
///
/// Returns `None` when the pointer is outside the window rectangle or any
/// dimension is zero.
pub fn viewer_to_frame(px: i32, py: i32, window: WindowRect, frame: Dims) -> Option<(i32, i32)> {
    if window.w == 0 || window.h == 0 || frame.w == 0 || frame.h == 0 {
        return None;
    }

    let rx = px - window.x;
    let ry = py - window.y;
    if rx < 0 || ry < 0 || rx >= window.w as i32 || ry >= window.h as i32 {
        return None;
    }

    let fx = (rx as f64 * frame.w as f64 / window.w as f64).round() as i32;
    let fy = (ry as f64 * frame.h as f64 / window.h as f64).round() as i32;
    Some((fx, fy))
}

/// Map frame pixels to native host-screen pixels.
pub fn frame_to_screen(vx: i32, vy: i32, frame: Dims, screen: Dims) -> Option<(i32, i32)> {
    if frame.w == 0 || frame.h == 0 {
        return None;
    }

    let sx = (vx as f64 * screen.w as f64 / frame.w as f64).round() as i32;
    let sy = (vy as f64 * screen.h as f64 / frame.h as f64).round() as i32;
    Some((sx, sy))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: WindowRect = WindowRect { x: 0, y: 0, w: 800, h: 600 };
    const FRAME: Dims = Dims { w: 1536, h: 864 };
    const SCREEN: Dims = Dims { w: 1920, h: 1080 };

    #[test]
    fn maps_through_both_stages() {
        // 1920x1080 screen streamed at scale 0.8 into an 800x600 window:
        // (100, 50) must land on screen pixel (240, 90)
        let (fx, fy) = viewer_to_frame(100, 50, WINDOW, FRAME).unwrap();
        assert_eq!((fx, fy), (192, 72));

        let (sx, sy) = frame_to_screen(fx, fy, FRAME, SCREEN).unwrap();
        assert_eq!((sx, sy), (240, 90));
    }

    #[test]
    fn window_offset_is_subtracted() {
        let window = WindowRect { x: 40, y: 25, w: 800, h: 600 };
        let direct = viewer_to_frame(100, 50, WINDOW, FRAME).unwrap();
        let offset = viewer_to_frame(140, 75, window, FRAME).unwrap();
        assert_eq!(direct, offset);
    }

    #[test]
    fn outside_window_is_dropped() {
        assert!(viewer_to_frame(-1, 50, WINDOW, FRAME).is_none());
        assert!(viewer_to_frame(100, -1, WINDOW, FRAME).is_none());
        assert!(viewer_to_frame(800, 50, WINDOW, FRAME).is_none());
        assert!(viewer_to_frame(100, 600, WINDOW, FRAME).is_none());
    }

    #[test]
    fn edge_pixels_are_inside() {
        assert!(viewer_to_frame(0, 0, WINDOW, FRAME).is_some());
        assert!(viewer_to_frame(799, 599, WINDOW, FRAME).is_some());
    }

    #[test]
    fn degenerate_dims_drop_the_event() {
        let flat = WindowRect { x: 0, y: 0, w: 0, h: 600 };
        assert!(viewer_to_frame(10, 10, flat, FRAME).is_none());
        assert!(viewer_to_frame(10, 10, WINDOW, Dims::new(0, 864)).is_none());
        assert!(frame_to_screen(10, 10, Dims::new(1536, 0), SCREEN).is_none());
    }

    #[test]
    fn forward_then_inverse_lands_within_one_pixel() {
        // The composition viewer -> frame -> screen must stay within 1px of
        // the exact real-valued mapping for every point in the window.
        for px in (0..800).step_by(37) {
            for py in (0..600).step_by(29) {
                let (fx, fy) = viewer_to_frame(px, py, WINDOW, FRAME).unwrap();
                let (sx, sy) = frame_to_screen(fx, fy, FRAME, SCREEN).unwrap();

                let exact_x = px as f64 * SCREEN.w as f64 / WINDOW.w as f64;
                let exact_y = py as f64 * SCREEN.h as f64 / WINDOW.h as f64;

                assert!(
                    (sx as f64 - exact_x).abs() <= 1.0,
                    "x drifted: ({px},{py}) -> ({sx}, exact {exact_x})"
                );
                assert!(
                    (sy as f64 - exact_y).abs() <= 1.0,
                    "y drifted: ({px},{py}) -> ({sy}, exact {exact_y})"
                );
            }
        }
    }
}
