use std::time::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Seconds since the clock was created or last reset.
    pub elapsed: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Per-window frame clock.
///
/// `dt` is clamped so a stalled or minimized window does not produce a huge
/// step when it resumes.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts `elapsed` and the `dt` baseline.
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.last = self.start;
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last).clamp(self.dt_min, self.dt_max);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped_and_frames_count_up() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let base = clock.last;

        let first = clock.tick_at(base);
        assert_eq!(first.frame_index, 0);
        assert!((first.dt - 0.001).abs() < 1e-6);

        let second = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(second.frame_index, 1);
        assert!((second.dt - 0.1).abs() < 1e-6);
        assert!((second.elapsed - 5.0).abs() < 1e-3);
    }
}
