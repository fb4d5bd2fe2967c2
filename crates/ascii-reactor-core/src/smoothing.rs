//! Short moving windows that keep per-frame jitter away from the renderer.

use std::collections::VecDeque;

use crate::mapping::Color;

pub const DEFAULT_CAPACITY: usize = 3;

/// How a window of values collapses to one
pub trait Aggregate: Sized + Copy {
    fn aggregate(window: &VecDeque<Self>) -> Option<Self>;
}

/// Numeric series: arithmetic mean
impl Aggregate for f32 {
    fn aggregate(window: &VecDeque<Self>) -> Option<Self> {
        if window.is_empty() {
            return None;
        }
        Some(window.iter().sum::<f32>() / window.len() as f32)
    }
}

/// Color series: the element in the middle of insertion order (not sorted)
impl Aggregate for Color {
    fn aggregate(window: &VecDeque<Self>) -> Option<Self> {
        window.get(window.len() / 2).copied()
    }
}

/// Fixed-capacity FIFO window
#[derive(Clone, Debug)]
pub struct SmoothingBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Aggregate> SmoothingBuffer<T> {
    /// A capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest values past capacity
    pub fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Aggregate of the current window, `None` while empty
    pub fn read(&self) -> Option<T> {
        T::aggregate(&self.values)
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T: Aggregate> Default for SmoothingBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_mean_of_last_window() {
        let mut buffer = SmoothingBuffer::<f32>::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            buffer.push(v);
        }
        assert_eq!(buffer.len(), 3);
        assert!((buffer.read().unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn colors_use_middle_position() {
        let mut buffer = SmoothingBuffer::<Color>::new(3);
        for c in ["#000000", "#ffffff", "#ff0000"] {
            buffer.push(c.parse().unwrap());
        }
        assert_eq!(buffer.read().unwrap().to_string(), "#ffffff");
    }

    #[test]
    fn middle_of_even_window_leans_late() {
        let mut buffer = SmoothingBuffer::<Color>::new(4);
        for c in ["#000000", "#111111", "#222222", "#333333"] {
            buffer.push(c.parse().unwrap());
        }
        assert_eq!(buffer.read().unwrap().to_string(), "#222222");
    }

    #[test]
    fn empty_reads_none() {
        assert_eq!(SmoothingBuffer::<f32>::default().read(), None);
        assert_eq!(SmoothingBuffer::<Color>::default().read(), None);
    }

    #[test]
    fn zero_capacity_is_one() {
        let mut buffer = SmoothingBuffer::<f32>::new(0);
        buffer.push(1.0);
        buffer.push(5.0);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.read(), Some(5.0));
    }

    #[test]
    fn shrinking_evicts_oldest() {
        let mut buffer = SmoothingBuffer::<f32>::new(5);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(v);
        }
        buffer.set_capacity(2);
        assert_eq!(buffer.read(), Some(4.5));
    }
}
