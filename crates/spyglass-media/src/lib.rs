//! Spyglass media layer: screen capture and JPEG framing.
//!
//! The host grabs its primary monitor, downscales, and JPEG-encodes each
//! frame; the viewer decodes the payloads back into RGB buffers for the UI.
//! Codec failures never propagate: a frame that will not encode or decode
//! is simply skipped and the stream carries on.

pub mod capture;
pub mod encoder;

pub use capture::ScreenCapturer;
pub use encoder::{decode_jpeg, DecodedFrame, FrameEncoder};

/// Anything the pacer can pull encoded frames from.
///
/// The production implementation grabs the primary monitor; tests substitute
/// a canned source.
pub trait FrameSource: Send + 'static {
    /// Native dimensions of the captured surface.
    fn native_dims(&self) -> (u32, u32);

    /// Dimensions of the frames [`next_jpeg`](Self::next_jpeg) produces.
    fn frame_dims(&self) -> (u32, u32);

    /// Grab, downscale, and encode one frame. `None` skips this tick.
    fn next_jpeg(&mut self) -> Option<Vec<u8>>;
}

/// The primary monitor captured through [`ScreenCapturer`] and encoded with
/// [`FrameEncoder`].
pub struct PrimaryScreenSource {
    capturer: ScreenCapturer,
    encoder: FrameEncoder,
}

impl PrimaryScreenSource {
    pub fn new(capturer: ScreenCapturer, encoder: FrameEncoder) -> Self {
        Self { capturer, encoder }
    }
}

impl FrameSource for PrimaryScreenSource {
    fn native_dims(&self) -> (u32, u32) {
        self.capturer.dims()
    }

    fn frame_dims(&self) -> (u32, u32) {
        self.encoder.target_dims(self.capturer.dims())
    }

    fn next_jpeg(&mut self) -> Option<Vec<u8>> {
        let frame = match self.capturer.grab() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("capture failed, skipping tick: {e}");
                return None;
            }
        };
        self.encoder.encode(frame)
    }
}
