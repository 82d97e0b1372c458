use web_time::{Duration, Instant};

/// Longest step handed to the camera, so a stall does not fling it.
const MAX_DT: f32 = 0.1;

/// Frame pacing with a smoothed FPS readout and an optional frame cap.
pub struct FrameTiming {
    /// Zero means unlimited.
    min_frame_duration: Duration,
    last_frame: Instant,
    smoothed_fps: f32,
    /// Weight of the newest sample in the moving average.
    smoothing: f32,
}

impl FrameTiming {
    /// Create a frame timer with the given FPS cap (0 = unlimited).
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let min_frame_duration = if target_fps > 0 {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        } else {
            Duration::ZERO
        };

        Self {
            min_frame_duration,
            last_frame: Instant::now(),
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Whether enough time has passed since the last frame to draw again.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.last_frame.elapsed() >= self.min_frame_duration
    }

    /// Mark a frame and return the seconds since the previous one,
    /// clamped for integration.
    pub fn end_frame(&mut self) -> f32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if frame_time > 0.0 {
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + frame_time.recip() * self.smoothing;
        }
        frame_time.min(MAX_DT)
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_always_renders() {
        assert!(FrameTiming::new(0).should_render());
    }

    #[test]
    fn dt_is_clamped() {
        let mut timing = FrameTiming::new(0);
        timing.last_frame = Instant::now() - Duration::from_secs(2);
        let dt = timing.end_frame();
        assert!(dt <= MAX_DT);
        assert!(timing.fps() < 60.0);
    }
}
