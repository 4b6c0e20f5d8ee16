//! Multi-click classification

use sys7_core::{Point, Ticks};

/// Longest click sequence reported (triple click).
pub const MAX_CLICK_COUNT: u8 = 3;

/// Click history used to number successive button-down transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickClassifier {
    last_pos: Point,
    last_time: Ticks,
    count: u8,
    threshold: u32,
    slop: u16,
}

impl ClickClassifier {
    pub const fn new(threshold: u32, slop: u16) -> Self {
        Self {
            last_pos: Point::ORIGIN,
            last_time: Ticks::ZERO,
            count: 1,
            threshold,
            slop,
        }
    }

    /// Numbers a button-down at `pos`, `now`. Returns 1 for a fresh click,
    /// 2 for a double click, 3 for a triple click or longer.
    pub fn classify(&mut self, pos: Point, now: Ticks) -> u8 {
        if self.last_time.is_zero() {
            self.count = 1;
        } else {
            let dt = now.elapsed_since(self.last_time);
            let (dx, dy) = pos.distance(self.last_pos);
            if dt <= self.threshold && dx <= self.slop && dy <= self.slop {
                self.count = (self.count + 1).min(MAX_CLICK_COUNT);
            } else {
                self.count = 1;
            }
        }
        self.last_pos = pos;
        self.last_time = now;
        self.count
    }

    /// `ResetClickSequence`: the next down starts a new sequence.
    pub fn reset(&mut self) {
        self.last_pos = Point::ORIGIN;
        self.last_time = Ticks::ZERO;
        self.count = 1;
    }

    /// Count assigned to the most recent down.
    pub const fn count(&self) -> u8 {
        self.count
    }

    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, ticks: u32) {
        self.threshold = ticks;
    }

    pub const fn slop(&self) -> u16 {
        self.slop
    }

    pub fn set_slop(&mut self, slop: u16) {
        self.slop = slop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_click_is_single() {
        let mut clicks = ClickClassifier::new(30, 5);
        assert_eq!(clicks.classify(Point::new(10, 10), Ticks::new(100)), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut clicks = ClickClassifier::new(30, 5);
        clicks.classify(Point::new(10, 10), Ticks::new(100));
        assert_eq!(clicks.classify(Point::new(10, 10), Ticks::new(130)), 2);

        let mut clicks = ClickClassifier::new(30, 5);
        clicks.classify(Point::new(10, 10), Ticks::new(100));
        assert_eq!(clicks.classify(Point::new(10, 10), Ticks::new(131)), 1);
    }

    #[test]
    fn slop_is_per_axis_and_inclusive() {
        let mut clicks = ClickClassifier::new(30, 5);
        clicks.classify(Point::new(10, 10), Ticks::new(100));
        assert_eq!(clicks.classify(Point::new(15, 15), Ticks::new(101)), 2);
        assert_eq!(clicks.classify(Point::new(21, 15), Ticks::new(102)), 1);
    }

    #[test]
    fn count_saturates_and_reset_starts_over() {
        let mut clicks = ClickClassifier::new(30, 5);
        for (i, expected) in [1, 2, 3, 3, 3].into_iter().enumerate() {
            let now = Ticks::new(100 + i as u32);
            assert_eq!(clicks.classify(Point::new(0, 0), now), expected);
        }
        clicks.reset();
        assert_eq!(clicks.classify(Point::new(0, 0), Ticks::new(106)), 1);
    }
}
