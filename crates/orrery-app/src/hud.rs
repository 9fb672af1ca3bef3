//! Frame-rate readout, shown in the window title.

/// Counts frames over one-second windows.
///
/// Until the first window completes the counter reports 1 FPS.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    elapsed: f64,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            frames: 0,
            fps: 1,
        }
    }

    /// Count one frame that took `dt` seconds. Returns the new rate when a
    /// one-second window closes.
    pub fn record(&mut self, dt: f64) -> Option<u32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < 1.0 {
            return None;
        }
        self.fps = self.frames;
        self.frames = 0;
        // A stall longer than a second closes only one window.
        self.elapsed = (self.elapsed - 1.0).min(1.0);
        Some(self.fps)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_time_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps.max(1))
    }

    pub fn label(&self) -> String {
        format!("{} FPS, {:.3} ms/frame", self.fps, self.frame_time_ms())
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Window title with the rate appended.
pub fn title_with_fps(title: &str, counter: &FpsCounter) -> String {
    format!("{title} | {}", counter.label())
}
