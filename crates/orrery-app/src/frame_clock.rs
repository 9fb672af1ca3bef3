//! Variable-timestep frame clock.
//!
//! The orbit animation is driven directly by wall-clock frame time. There is
//! no fixed step and no clamp: a long stall moves every body by the whole
//! stall.

use std::time::Instant;

pub struct FrameClock {
    previous: Instant,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            previous: start,
            frame_count: 0,
        }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) with an explicit "now". Earlier instants count
    /// as zero elapsed time.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.previous).as_secs_f32();
        self.previous = now;
        self.frame_count += 1;
        dt
    }

    /// Forget the time spent away, e.g. while the window was minimised.
    pub fn reset(&mut self) {
        self.previous = Instant::now();
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
