//! Monotonic frame counter. Generators read the frame index, never the
//! wall clock.

use tabletop_texture::FRAME_PERIOD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    frame: u32,
    period: u32,
    present_every: u32,
    ticks: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_PERIOD, 1)
    }
}

impl FrameClock {
    /// A clock wrapping at `period` and presenting every `present_every`
    /// ticks. Zero values are raised to 1.
    pub fn new(period: u32, present_every: u32) -> Self {
        Self {
            frame: 0,
            period: period.max(1),
            present_every: present_every.max(1),
            ticks: 0,
        }
    }

    /// Current animation frame, in `[0, period)`.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Total ticks since creation.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether the current tick should be drawn.
    #[inline]
    pub fn presents(&self) -> bool {
        self.ticks % self.present_every as u64 == 0
    }

    /// Finish the current tick and move to the next. Returns whether the
    /// finished tick was a presenting one.
    pub fn advance(&mut self) -> bool {
        let presented = self.presents();
        self.ticks += 1;
        self.frame = (self.frame + 1) % self.period;
        presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_period() {
        let mut c = FrameClock::new(4, 1);
        for _ in 0..6 {
            c.advance();
        }
        assert_eq!(c.frame(), 2);
        assert_eq!(c.ticks(), 6);
    }

    #[test]
    fn presents_every_other_tick() {
        let mut c = FrameClock::new(240, 2);
        let mut shown = 0;
        for _ in 0..10 {
            if c.advance() {
                shown += 1;
            }
        }
        assert_eq!(shown, 5);
    }
}
