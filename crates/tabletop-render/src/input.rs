//! Hand-off of player positions from the webcam task to the render loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tabletop_core::Point;

const EMPTY: u64 = u64::MAX;

// ---------------------------------------------------------------------------
// PositionSlot
// ---------------------------------------------------------------------------

/// A latest-value slot shared between threads. Writers overwrite whatever
/// was there; the reader takes the most recent position at a frame
/// boundary. Clones share the slot.
#[derive(Clone, Debug)]
pub struct PositionSlot {
    value: Arc<AtomicU64>,
}

impl PositionSlot {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(EMPTY)),
        }
    }

    /// Store `p`, replacing any position not yet taken. Negative
    /// coordinates are ignored.
    #[inline]
    pub fn publish(&self, p: Point) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        self.value.store(pack(p), Ordering::Release);
    }

    /// Take the latest position, leaving the slot empty.
    #[inline]
    pub fn take(&self) -> Option<Point> {
        let v = self.value.swap(EMPTY, Ordering::Acquire);
        (v != EMPTY).then(|| unpack(v))
    }
}

impl Default for PositionSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pack(p: Point) -> u64 {
    ((p.x as u32 as u64) << 32) | p.y as u32 as u64
}

#[inline]
fn unpack(v: u64) -> Point {
    Point::new((v >> 32) as u32 as i32, v as u32 as i32)
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn latest_position_wins() {
        let slot = PositionSlot::new();
        assert_eq!(slot.take(), None);
        slot.publish(Point::new(1, 2));
        slot.publish(Point::new(30, 40));
        assert_eq!(slot.take(), Some(Point::new(30, 40)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn negative_positions_are_dropped() {
        let slot = PositionSlot::new();
        slot.publish(Point::new(-1, 3));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn shared_across_threads() {
        let slot = PositionSlot::new();
        let writer = slot.clone();
        thread::spawn(move || {
            for i in 0..100 {
                writer.publish(Point::new(i, i * 2));
            }
        })
        .join()
        .unwrap();
        assert_eq!(slot.take(), Some(Point::new(99, 198)));
    }
}
