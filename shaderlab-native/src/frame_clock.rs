/// Simulation clock driven by host timestamps, with a once-per-second FPS average.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    start_seconds: f64,
    time_seconds: f64,
    average_window_start: f64,
    fps_accum: f64,
    fps_samples: u32,
    started: bool,

    pub elapsed_seconds: f64,
    pub delta_seconds: f64,
    pub average_fps: f64,
    pub elapsed_frames: u32,
}

impl FrameClock {
    /// Advance to `time_seconds`. A time earlier than the last tick means the
    /// host rewound; the clock restarts from it.
    pub fn tick(&mut self, time_seconds: f64) {
        if self.started && time_seconds < self.time_seconds {
            log::debug!("frame clock rewound from {:.3}s to {time_seconds:.3}s", self.time_seconds);
            self.restart();
        }
        if !self.started {
            self.start_seconds = time_seconds;
            self.time_seconds = time_seconds;
            self.average_window_start = time_seconds;
            self.started = true;
        } else {
            self.elapsed_frames += 1;
        }

        self.delta_seconds = time_seconds - self.time_seconds;
        self.elapsed_seconds = time_seconds - self.start_seconds;
        self.time_seconds = time_seconds;

        // Paused or rewound frames report a non-positive delta.
        if self.delta_seconds > 0.0 {
            self.fps_accum += 1.0 / self.delta_seconds;
            self.fps_samples += 1;
        }

        if time_seconds - self.average_window_start > 1.0 {
            if self.fps_samples > 0 {
                self.average_fps = self.fps_accum / f64::from(self.fps_samples);
            }
            self.fps_accum = 0.0;
            self.fps_samples = 0;
            self.average_window_start = time_seconds;
        }
    }

    /// Forget the start time; the next tick begins a new run.
    pub fn restart(&mut self) {
        *self = Self {
            average_fps: self.average_fps,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_has_zero_delta() {
        let mut clock = FrameClock::default();
        clock.tick(12.5);
        assert_eq!(clock.delta_seconds, 0.0);
        assert_eq!(clock.elapsed_seconds, 0.0);
        assert_eq!(clock.elapsed_frames, 0);
    }

    #[test]
    fn test_average_fps_published_after_one_second() {
        let mut clock = FrameClock::default();
        for i in 0..=61 {
            clock.tick(f64::from(i) / 60.0);
        }
        assert!((clock.average_fps - 60.0).abs() < 0.01, "fps = {}", clock.average_fps);
        assert_eq!(clock.elapsed_frames, 61);
    }

    #[test]
    fn test_paused_frames_do_not_poison_average() {
        let mut clock = FrameClock::default();
        for _ in 0..10 {
            clock.tick(0.5);
        }
        clock.tick(1.6);
        assert!(clock.average_fps.is_finite());
    }

    #[test]
    fn test_backwards_time_restarts_run() {
        let mut clock = FrameClock::default();
        for i in 0..=300 {
            clock.tick(f64::from(i) / 60.0);
        }
        clock.tick(0.0);
        assert_eq!(clock.elapsed_seconds, 0.0);
        assert_eq!(clock.delta_seconds, 0.0);
        assert_eq!(clock.elapsed_frames, 0);

        // The averaging window follows the new run instead of the old end time.
        for i in 1..=31 {
            clock.tick(f64::from(i) / 30.0);
        }
        assert!((clock.average_fps - 30.0).abs() < 0.01, "fps = {}", clock.average_fps);
    }

    #[test]
    fn test_restart_resets_elapsed() {
        let mut clock = FrameClock::default();
        clock.tick(1.0);
        clock.tick(2.0);
        clock.restart();
        clock.tick(0.0);
        assert_eq!(clock.elapsed_seconds, 0.0);
        assert_eq!(clock.elapsed_frames, 0);
    }
}
