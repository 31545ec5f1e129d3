use std::collections::VecDeque;

use crate::pose::geometry::FrameFeatures;

/// Fixed-capacity sliding window over the most recent frame features.
///
/// Storage is allocated once; pushing into a full window evicts the oldest
/// entry, so memory stays bounded for arbitrarily long captures.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    buf: VecDeque<FrameFeatures>,
    capacity: usize,
}

impl FeatureWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, features: FrameFeatures) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(features);
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Oldest-first view of the window.
    pub fn as_slice(&mut self) -> &[FrameFeatures] {
        self.buf.make_contiguous()
    }
}
