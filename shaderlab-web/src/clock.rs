/// Host-side simulation time, driven by animation-frame timestamps.
///
/// The first frame after start or rewind has a zero delta. Simulation time
/// only advances while not paused; the frame delta is still reported so the
/// camera keeps moving.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    prev_timestamp_ms: Option<f64>,
    time_ms: f64,
    paused: bool,
}

impl PlaybackClock {
    pub fn new(paused: bool) -> Self {
        Self {
            paused,
            ..Self::default()
        }
    }

    /// Advance to `timestamp_ms` and return the frame delta in seconds.
    pub fn tick(&mut self, timestamp_ms: f64) -> f64 {
        let delta_ms = self
            .prev_timestamp_ms
            .map_or(0.0, |prev| (timestamp_ms - prev).max(0.0));
        self.prev_timestamp_ms = Some(timestamp_ms);
        if !self.paused {
            self.time_ms += delta_ms;
        }
        delta_ms / 1000.0
    }

    pub fn time_seconds(&self) -> f64 {
        self.time_ms / 1000.0
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn rewind(&mut self) {
        self.prev_timestamp_ms = None;
        self.time_ms = 0.0;
    }
}
