//! Page replacement policies for the buffer pool.

use crate::frame::FrameId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for page replacement algorithms.
///
/// The pool supplies an eviction predicate so the policy never has to
/// track pin state itself; a frame is a candidate only while the
/// predicate holds.
pub trait Replacer: Send + Sync {
    /// Records that the given frame was accessed.
    fn record_access(&self, frame_id: FrameId);

    /// Selects a victim frame among those for which `can_evict` is true.
    ///
    /// Returns None if no candidate frame exists.
    fn evict(&self, can_evict: &dyn Fn(FrameId) -> bool) -> Option<FrameId>;

    /// Forgets any access history for a frame.
    fn remove(&self, frame_id: FrameId);
}

/// Clock (second-chance) replacement.
///
/// Reference bits are atomics so access recording is lock-free; only the
/// clock hand is behind a mutex.
pub struct ClockReplacer {
    /// Number of frames.
    num_frames: usize,
    /// Reference bits, one per frame.
    reference_bits: Vec<AtomicBool>,
    /// Current clock hand position.
    hand: Mutex<usize>,
}

impl ClockReplacer {
    /// Creates a new clock replacer over `num_frames` frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            reference_bits: (0..num_frames).map(|_| AtomicBool::new(false)).collect(),
            hand: Mutex::new(0),
        }
    }

    /// Returns the total capacity.
    pub fn capacity(&self) -> usize {
        self.num_frames
    }
}

impl Replacer for ClockReplacer {
    #[inline]
    fn record_access(&self, frame_id: FrameId) {
        if let Some(bit) = self.reference_bits.get(frame_id.0 as usize) {
            bit.store(true, Ordering::Relaxed);
        }
    }

    fn evict(&self, can_evict: &dyn Fn(FrameId) -> bool) -> Option<FrameId> {
        if self.num_frames == 0 {
            return None;
        }

        let mut hand = self.hand.lock();

        // Two full sweeps: the first clears reference bits, so the second
        // is guaranteed to find any candidate frame.
        for _ in 0..(2 * self.num_frames) {
            let pos = *hand;
            *hand = (pos + 1) % self.num_frames;

            let frame_id = FrameId(pos as u32);
            if !can_evict(frame_id) {
                continue;
            }

            if self.reference_bits[pos].swap(false, Ordering::Relaxed) {
                // Referenced since the last sweep: second chance.
                continue;
            }

            return Some(frame_id);
        }

        None
    }

    fn remove(&self, frame_id: FrameId) {
        if let Some(bit) = self.reference_bits.get(frame_id.0 as usize) {
            bit.store(false, Ordering::Relaxed);
        }
    }
}
