//! Frame pacing and the FPS readout.

use std::time::{Duration, Instant};

use crate::color::Color;

/// Hands out tick deadlines at a fixed rate.
///
/// A late tick is not caught up with a burst of frames: the schedule restarts
/// from the late tick.
#[derive(Clone, Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FramePacer {
    /// `target_fps == 0` disables pacing.
    pub fn new(target_fps: u32) -> Self {
        let interval = (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64));
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// When the next tick should run. Never earlier than `now`.
    pub fn next_deadline(&mut self, now: Instant) -> Option<Instant> {
        let interval = self.interval?;
        let deadline = match self.last {
            Some(last) if last + interval > now => last + interval,
            _ => now,
        };
        self.last = Some(deadline);
        Some(deadline)
    }
}

/// Frames-per-second averaged over a short rolling window.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames: 0,
            fps: 0,
        }
    }

    /// Record a frame presented at `now` and return the current readout.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return self.fps;
        };
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.window {
            self.fps = (self.frames as f64 / elapsed.as_secs_f64()).round() as u32;
            self.frames = 0;
            self.window_start = Some(now);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Readout colour: lime when smooth, orange below 30, red below 15.
pub fn readout_color(fps: u32) -> Color {
    match fps {
        0..15 => Color::RED,
        15..30 => Color::ORANGE,
        _ => Color::LIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_fps_interval() {
        let pacer = FramePacer::new(60);
        let ms = pacer.interval().unwrap().as_secs_f64() * 1000.0;
        assert!((ms - 16.666).abs() < 0.01);
        assert!(FramePacer::new(0).interval().is_none());
    }

    #[test]
    fn deadlines_advance_by_interval() {
        let mut pacer = FramePacer::new(50);
        let t0 = Instant::now();
        assert_eq!(pacer.next_deadline(t0), Some(t0));
        let d1 = pacer.next_deadline(t0 + Duration::from_millis(3)).unwrap();
        assert_eq!(d1, t0 + Duration::from_millis(20));
        let d2 = pacer.next_deadline(t0 + Duration::from_millis(21)).unwrap();
        assert_eq!(d2, t0 + Duration::from_millis(40));
    }

    #[test]
    fn late_tick_resyncs_instead_of_bursting() {
        let mut pacer = FramePacer::new(50);
        let t0 = Instant::now();
        pacer.next_deadline(t0);
        let late = t0 + Duration::from_millis(200);
        assert_eq!(pacer.next_deadline(late), Some(late));
        let after = pacer.next_deadline(late + Duration::from_millis(1)).unwrap();
        assert_eq!(after, late + Duration::from_millis(20));
    }

    #[test]
    fn unpaced_has_no_deadline() {
        let mut pacer = FramePacer::new(0);
        assert!(pacer.next_deadline(Instant::now()).is_none());
    }

    #[test]
    fn fps_counter_averages_over_window() {
        let mut fps = FpsCounter::default();
        let t0 = Instant::now();
        let frame = Duration::from_micros(16_667);
        assert_eq!(fps.tick(t0), 0);
        let mut now = t0;
        for _ in 0..60 {
            now += frame;
            fps.tick(now);
        }
        assert!((59..=61).contains(&fps.fps()), "got {}", fps.fps());
    }

    #[test]
    fn fps_counter_holds_value_inside_window() {
        let mut fps = FpsCounter::new(Duration::from_secs(1));
        let t0 = Instant::now();
        fps.tick(t0);
        assert_eq!(fps.tick(t0 + Duration::from_millis(100)), 0);
    }

    #[test]
    fn readout_thresholds() {
        assert_eq!(readout_color(60), Color::LIME);
        assert_eq!(readout_color(30), Color::LIME);
        assert_eq!(readout_color(29), Color::ORANGE);
        assert_eq!(readout_color(15), Color::ORANGE);
        assert_eq!(readout_color(14), Color::RED);
        assert_eq!(readout_color(0), Color::RED);
    }
}
