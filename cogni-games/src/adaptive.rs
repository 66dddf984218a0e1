/// Difficulty change produced by a [`StreakPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Up,
    Down,
}

/// Staircase rule: `threshold` consecutive successes raise the level by one,
/// `threshold` consecutive failures lower it by one. Both streaks reset
/// whenever the rule fires, including when the level is already at a bound.
#[derive(Debug, Clone)]
pub struct StreakPolicy {
    level: usize,
    min: usize,
    max: usize,
    threshold: u32,
    success_streak: u32,
    failure_streak: u32,
    fired_up: u32,
    fired_down: u32,
}

impl StreakPolicy {
    pub fn new(initial: usize, min: usize, max: usize, threshold: u32) -> Self {
        let max = max.max(min);
        Self {
            level: initial.clamp(min, max),
            min,
            max,
            threshold: threshold.max(1),
            success_streak: 0,
            failure_streak: 0,
            fired_up: 0,
            fired_down: 0,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Feeds one closed trial or round. Returns the adjustment if the level moved.
    pub fn record(&mut self, success: bool) -> Option<Adjustment> {
        if success {
            self.success_streak += 1;
            self.failure_streak = 0;
            if self.success_streak >= self.threshold {
                self.success_streak = 0;
                self.fired_up += 1;
                if self.level < self.max {
                    self.level += 1;
                    return Some(Adjustment::Up);
                }
            }
        } else {
            self.failure_streak += 1;
            self.success_streak = 0;
            if self.failure_streak >= self.threshold {
                self.failure_streak = 0;
                self.fired_down += 1;
                if self.level > self.min {
                    self.level -= 1;
                    return Some(Adjustment::Down);
                }
            }
        }
        None
    }

    /// Share of firings that went upward, as a percentage. `None` before
    /// the rule ever fired.
    pub fn hit_rate(&self) -> Option<f64> {
        let fired = self.fired_up + self.fired_down;
        if fired == 0 {
            return None;
        }
        Some(self.fired_up as f64 / fired as f64 * 100.0)
    }

    pub fn firings(&self) -> (u32, u32) {
        (self.fired_up, self.fired_down)
    }
}
