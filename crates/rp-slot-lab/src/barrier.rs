//! Countdown barrier over reel indexes

/// Tracks which reels have stopped.
///
/// Completes once every index in `0..reel_count` has arrived exactly once;
/// repeated or out-of-range arrivals do not count.
#[derive(Debug, Clone)]
pub struct RevealBarrier {
    arrived: Vec<bool>,
    remaining: usize,
}

impl RevealBarrier {
    pub fn new(reel_count: usize) -> Self {
        Self {
            arrived: vec![false; reel_count],
            remaining: reel_count,
        }
    }

    /// Record a stopped reel. Returns true when this arrival completes the
    /// barrier.
    pub fn arrive(&mut self, reel_index: usize) -> bool {
        match self.arrived.get_mut(reel_index) {
            Some(seen) if !*seen => {
                *seen = true;
                self.remaining -= 1;
                self.remaining == 0
            }
            Some(_) => {
                log::warn!("[RevealBarrier] Reel {} arrived twice", reel_index);
                false
            }
            None => {
                log::warn!("[RevealBarrier] Unknown reel {}", reel_index);
                false
            }
        }
    }

    pub fn has_arrived(&self, reel_index: usize) -> bool {
        self.arrived.get(reel_index).copied().unwrap_or(false)
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}
