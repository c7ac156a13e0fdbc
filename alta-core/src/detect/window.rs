//! Bounded FIFO of recent temperatures

use heapless::Deque;

/// Largest supported window
pub const MAX_WINDOW: usize = 32;

/// Sliding window of the last `len` samples
///
/// The length is chosen at runtime but never exceeds [`MAX_WINDOW`].
#[derive(Debug, Clone)]
pub struct DetectionWindow {
    samples: Deque<f32, MAX_WINDOW>,
    len: usize,
}

impl DetectionWindow {
    /// Create an empty window, clamping `len` to `1..=MAX_WINDOW`
    pub fn new(len: usize) -> Self {
        Self {
            samples: Deque::new(),
            len: len.clamp(1, MAX_WINDOW),
        }
    }

    /// Insert a sample, evicting the oldest once full
    pub fn push(&mut self, sample: f32) {
        if self.samples.len() >= self.len {
            self.samples.pop_front();
        }
        // Cannot fail: len <= MAX_WINDOW and a slot was freed above
        let _ = self.samples.push_back(sample);
    }

    /// Oldest sample still in the window
    pub fn oldest(&self) -> Option<f32> {
        self.samples.front().copied()
    }

    /// Newest sample
    pub fn newest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Configured window length
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Check if the window holds `capacity()` samples
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.len
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
