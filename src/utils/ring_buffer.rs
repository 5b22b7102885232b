use num_traits::Float;

use crate::helper::{mean, stddev};

/// A fixed-capacity circular buffer holding the trailing observations of a rolling window.
///
/// Once full, each push overwrites the oldest element and hands it back to the caller.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Backing storage, allocated once
    data: Box<[T]>,
    /// Position of the oldest element
    head: usize,
    /// Number of stored elements, never above `data.len()`
    len: usize,
    /// Scratch space for the logical (oldest to newest) ordering
    scratch: Vec<T>,
}

impl<T: Default + Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let mut data = Vec::with_capacity(capacity);
        data.resize_with(capacity, T::default);
        Self {
            data: data.into_boxed_slice(),
            head: 0,
            len: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Pushes a value and returns the evicted one once the buffer is full
    pub fn push(&mut self, value: T) -> Option<T> {
        let cap = self.capacity();
        if cap == 0 {
            return Some(value);
        }

        if self.is_full() {
            let evicted = core::mem::replace(&mut self.data[self.head], value);
            self.head = (self.head + 1) % cap;
            Some(evicted)
        } else {
            let at = (self.head + self.len) % cap;
            self.data[at] = value;
            self.len += 1;
            None
        }
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.data.fill(T::default());
        self.scratch.clear();
    }

    /// Returns the elements in logical order as one contiguous slice
    pub fn make_contiguous(&mut self) -> &[T] {
        self.scratch.clear();
        let cap = self.capacity();
        for i in 0..self.len {
            self.scratch.push(self.data[(self.head + i) % cap]);
        }
        &self.scratch
    }
}

impl<T: Float + Default> RingBuffer<T> {
    /// Returns the mean and standard deviation of the stored values
    ///
    /// Both are recomputed from the stored values rather than from running sums, so a
    /// window of identical values reports a dispersion of exactly zero.
    pub fn mean_stddev(&mut self, ddof: bool) -> Option<(T, T)> {
        let values = self.make_contiguous();
        if values.is_empty() {
            return None;
        }
        let m = mean(values);
        stddev(values, m, ddof).map(|s| (m, s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::RingBuffer;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_evicts_oldest_once_full() {
        let mut buf = RingBuffer::new(3);
        assert_eq!(buf.push(0.5), None);
        assert_eq!(buf.push(1.5), None);
        assert_eq!(buf.push(2.5), None);
        assert!(buf.is_full());

        assert_eq!(buf.push(3.5), Some(0.5));
        assert_eq!(buf.push(4.5), Some(1.5));
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.make_contiguous(), &[2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_contiguous_follows_logical_order() {
        let mut buf = RingBuffer::new(2);
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);
        assert_eq!(buf.make_contiguous(), &[2.0, 3.0]);
    }

    #[test]
    fn test_mean_stddev_of_window() {
        let mut buf = RingBuffer::<f64>::new(4);
        for v in [10.0, 1.0, 2.0, 3.0, 4.0] {
            buf.push(v);
        }
        let (m, s) = buf.mean_stddev(true).unwrap();
        assert_approx_eq!(m, 2.5);
        assert_approx_eq!(s, 1.2909944487358056);

        let (_, s) = buf.mean_stddev(false).unwrap();
        assert_approx_eq!(s, 1.118033988749895);
    }

    #[test]
    fn test_constant_window_has_zero_dispersion() {
        let mut buf = RingBuffer::new(5);
        for _ in 0..8 {
            buf.push(7.25);
        }
        let (m, s) = buf.mean_stddev(true).unwrap();
        assert_eq!(m, 7.25);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_reset() {
        let mut buf = RingBuffer::new(2);
        buf.push(1.0);
        buf.push(2.0);
        buf.reset();
        assert_eq!(buf.len(), 0);
        assert!(buf.mean_stddev(false).is_none());
    }
}
