//! Fixed-capacity circular buffers.
//!
//! Cursors are plain `usize` positions owned by whoever drives the buffer.  The buffer only knows how to wrap them,
//! which lets one buffer be read and written from as many independent cursors as an algorithm needs (the phase
//! vocoder uses one read and one write cursor per buffer, the interaural delay uses one write and two read cursors
//! across a pair of buffers).
use std::num::NonZeroUsize;

#[derive(Clone, Debug)]
pub struct CircularBuffer<T> {
    data: Vec<T>,
}

impl<T: Copy + Default> CircularBuffer<T> {
    /// Create a buffer of `length` default-valued elements.
    ///
    /// This allocates, and should only be called when preparing to process.
    pub fn new(length: NonZeroUsize) -> Self {
        Self {
            data: vec![T::default(); length.get()],
        }
    }

    #[allow(clippy::len_without_is_empty)] // Never empty.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Reset every element to the default.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
    }

    /// Wrap any position into the buffer.
    #[inline(always)]
    pub fn wrap(&self, position: usize) -> usize {
        position % self.data.len()
    }

    /// Move `position` forward by `by`, wrapping.
    #[inline(always)]
    pub fn advance(&self, position: usize, by: usize) -> usize {
        (position % self.data.len() + by % self.data.len()) % self.data.len()
    }

    /// The position `delay` elements behind `position`.
    ///
    /// Delays longer than the buffer wrap.
    #[inline(always)]
    pub fn behind(&self, position: usize, delay: usize) -> usize {
        let len = self.data.len();
        // `delay % len < len`, so adding an extra length avoids underflow.
        (len + position % len - delay % len) % len
    }

    #[inline(always)]
    pub fn read(&self, position: usize) -> T {
        self.data[self.wrap(position)]
    }

    #[inline(always)]
    pub fn write(&mut self, position: usize, value: T) {
        let index = self.wrap(position);
        self.data[index] = value;
    }

    /// Read the value at `position` and leave a default in its place.
    #[inline(always)]
    pub fn take(&mut self, position: usize) -> T {
        let index = self.wrap(position);
        std::mem::take(&mut self.data[index])
    }
}

impl<T: Copy + Default + std::ops::AddAssign> CircularBuffer<T> {
    /// Add each of `values` into the buffer starting at `start`, wrapping around the end of the buffer.
    pub fn accumulate(&mut self, start: usize, values: impl IntoIterator<Item = T>) {
        let mut index = self.wrap(start);
        for v in values {
            self.data[index] += v;
            index += 1;
            if index == self.data.len() {
                index = 0;
            }
        }
    }
}
