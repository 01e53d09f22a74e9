use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;

/// Downscale-and-JPEG stage of the host pipeline.
///
/// `scale` multiplies both dimensions (1.0 keeps native size), `quality`
/// is the JPEG quality in 1..=100. Validation of those ranges happens in
/// the host configuration; the encoder trusts its inputs.
pub struct FrameEncoder {
    scale: f32,
    quality: u8,
}

/// A decoded video payload ready for display: tightly packed RGB rows.
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl FrameEncoder {
    pub fn new(scale: f32, quality: u8) -> Self {
        Self { scale, quality }
    }

    /// Output dimensions for a native input size, rounded to integers and
    /// never below 1x1.
    pub fn target_dims(&self, (w, h): (u32, u32)) -> (u32, u32) {
        let tw = (w as f32 * self.scale).round().max(1.0) as u32;
        let th = (h as f32 * self.scale).round().max(1.0) as u32;
        (tw, th)
    }

    /// Convert, downscale, and encode one captured frame.
    ///
    /// Returns `None` on any failure; the pacer skips the tick.
    pub fn encode(&self, frame: RgbaImage) -> Option<Vec<u8>> {
        let native = frame.dimensions();
        let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();

        let rgb = if self.scale != 1.0 {
            let (tw, th) = self.target_dims(native);
            imageops::resize(&rgb, tw, th, FilterType::Triangle)
        } else {
            rgb
        };

        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, self.quality);
        match rgb.write_with_encoder(encoder) {
            Ok(()) => Some(out),
            Err(e) => {
                debug!("jpeg encode failed, skipping frame: {e}");
                None
            }
        }
    }
}

/// Decode one video payload. `None` skips the frame.
pub fn decode_jpeg(bytes: &[u8]) -> Option<DecodedFrame> {
    match image::load_from_memory_with_format(bytes, ImageFormat::Jpeg) {
        Ok(img) => {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            Some(DecodedFrame {
                width,
                height,
                rgb: rgb.into_raw(),
            })
        }
        Err(e) => {
            debug!("jpeg decode failed, skipping frame: {e}");
            None
        }
    }
}
