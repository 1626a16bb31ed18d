use crate::surface::{StatDisplay, StatKind};
use std::time::{Duration, Instant};

/// Length of a counter animation.
pub const ANIMATION_WINDOW: Duration = Duration::from_secs(1);

/// Monotonic time source for animations and notice expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: std::sync::Arc<std::sync::Mutex<Instant>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

/// Interpolates one counter from its displayed value to a target.
#[derive(Debug, Clone, Copy)]
struct CounterAnimation {
    from: u32,
    to: u32,
    started: Instant,
}

impl CounterAnimation {
    fn progress(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / ANIMATION_WINDOW.as_secs_f64()).min(1.0)
    }

    fn value_at(&self, now: Instant) -> u32 {
        let from = self.from as f64;
        let to = self.to as f64;
        (from + (to - from) * self.progress(now)).round() as u32
    }

    fn finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// The four stat counters and their running animations.
#[derive(Debug, Clone, Default)]
pub struct StatBoard {
    displayed: [u32; 4],
    animations: [Option<CounterAnimation>; 4],
}

impl StatBoard {
    pub fn displayed(&self, stat: StatKind) -> u32 {
        self.displayed[stat.index()]
    }

    pub fn is_animating(&self) -> bool {
        self.animations.iter().any(Option::is_some)
    }

    /// Starts animating `stat` from its current displayed value.
    pub fn animate_to(&mut self, stat: StatKind, target: u32, now: Instant) {
        let index = stat.index();
        self.animations[index] = Some(CounterAnimation {
            from: self.displayed[index],
            to: target,
            started: now,
        });
    }

    /// Samples every running animation and pushes the values to `display`.
    pub fn tick<S: StatDisplay>(&mut self, now: Instant, display: &mut S) {
        for stat in StatKind::ALL {
            let index = stat.index();
            if let Some(animation) = self.animations[index] {
                let value = animation.value_at(now);
                self.displayed[index] = value;
                display.show(stat, value);
                if animation.finished(now) {
                    self.animations[index] = None;
                }
            }
        }
    }

    /// Cancels animations and shows zero everywhere.
    pub fn reset<S: StatDisplay>(&mut self, display: &mut S) {
        self.animations = [None; 4];
        self.displayed = [0; 4];
        for stat in StatKind::ALL {
            display.show(stat, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::StatPanel;

    #[test]
    fn counter_reaches_target_after_the_window() {
        let clock = ManualClock::new();
        let mut board = StatBoard::default();
        let mut panel = StatPanel::default();

        board.animate_to(StatKind::TotalSites, 10, clock.now());
        clock.advance(Duration::from_millis(500));
        board.tick(clock.now(), &mut panel);
        assert_eq!(panel.value(StatKind::TotalSites), 5);
        assert!(board.is_animating());

        clock.advance(Duration::from_millis(600));
        board.tick(clock.now(), &mut panel);
        assert_eq!(panel.value(StatKind::TotalSites), 10);
        assert!(!board.is_animating());
    }

    #[test]
    fn counter_animates_down_from_the_displayed_value() {
        let clock = ManualClock::new();
        let mut board = StatBoard::default();
        let mut panel = StatPanel::default();

        board.animate_to(StatKind::HighRisk, 8, clock.now());
        clock.advance(ANIMATION_WINDOW);
        board.tick(clock.now(), &mut panel);

        board.animate_to(StatKind::HighRisk, 4, clock.now());
        clock.advance(Duration::from_millis(250));
        board.tick(clock.now(), &mut panel);
        assert_eq!(panel.value(StatKind::HighRisk), 7);
    }

    #[test]
    fn reset_zeroes_every_counter() {
        let clock = ManualClock::new();
        let mut board = StatBoard::default();
        let mut panel = StatPanel::default();
        board.animate_to(StatKind::LowRisk, 3, clock.now());
        board.reset(&mut panel);
        assert!(!board.is_animating());
        for stat in StatKind::ALL {
            assert_eq!(panel.value(stat), 0);
            assert_eq!(board.displayed(stat), 0);
        }
    }
}
