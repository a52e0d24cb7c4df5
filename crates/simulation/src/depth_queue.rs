//! Bucket-indexed priority queue over small integer depths.
//!
//! Depths are tiny bounded integers (`0..=MAX_DEPTH`), so a vector of FIFO
//! buckets plus a lower-bound cursor gives O(1) amortized push/pop while
//! preserving insertion order among equal depths, which a comparison heap
//! would not.

use std::collections::VecDeque;

/// Min-priority queue keyed by depth, FIFO among equal depths.
#[derive(Debug)]
pub struct DepthBucketQueue<T> {
    buckets: Vec<VecDeque<T>>,
    len: usize,
    /// Lowest bucket that may hold an item; `None` when the queue is empty,
    /// so the next push re-establishes the bound.
    cursor: Option<usize>,
}

impl<T> Default for DepthBucketQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DepthBucketQueue<T> {
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            len: 0,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// O(1) amortized; buckets grow on demand for unseen depths.
    pub fn push(&mut self, depth: u8, item: T) {
        let d = depth as usize;
        if d >= self.buckets.len() {
            self.buckets.resize_with(d + 1, VecDeque::new);
        }
        self.buckets[d].push_back(item);
        self.len += 1;
        match self.cursor {
            Some(c) if c <= d => {}
            _ => self.cursor = Some(d),
        }
    }

    /// Remove and return the item with the lowest depth, FIFO among ties.
    /// Returns `None` on an empty queue.
    pub fn pop(&mut self) -> Option<(u8, T)> {
        let start = self.cursor?;
        for d in start..self.buckets.len() {
            if let Some(item) = self.buckets[d].pop_front() {
                self.len -= 1;
                self.cursor = if self.len == 0 { None } else { Some(d) };
                return Some((d as u8, item));
            }
        }
        None
    }
}
