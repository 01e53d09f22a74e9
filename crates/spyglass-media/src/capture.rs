use anyhow::{anyhow, Result};
use image::RgbaImage;
use xcap::Monitor;

/// Handle on the primary monitor's framebuffer.
pub struct ScreenCapturer {
    monitor: Monitor,
    width: u32,
    height: u32,
}

impl ScreenCapturer {
    /// Open the primary monitor, falling back to the first one listed.
    pub fn primary() -> Result<Self> {
        let mut monitors = Monitor::all().map_err(|e| anyhow!("failed to list monitors: {e}"))?;
        if monitors.is_empty() {
            return Err(anyhow!("no monitors found"));
        }

        let idx = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        let monitor = monitors.swap_remove(idx);

        let (width, height) = (monitor.width(), monitor.height());
        Ok(Self { monitor, width, height })
    }

    /// Native monitor dimensions, fixed for the life of this handle.
    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Grab the current framebuffer.
    pub fn grab(&self) -> Result<RgbaImage> {
        self.monitor
            .capture_image()
            .map_err(|e| anyhow!("screen capture failed: {e}"))
    }
}
