//! Fixed-extent ring buffer with a runtime logical capacity.
//!
//! Storage is allocated once, at construction, for `extent` elements. The logical
//! capacity can later be changed to anything in `1..=extent` without reallocating.

use std::iter::FusedIterator;

use crate::error::{Result, ShaperError};

/// A FIFO ring over a preallocated arena.
///
/// Pushing into a full buffer evicts the oldest element. Relative accessors
/// ([`oldest`](RingBuffer::oldest), [`newest`](RingBuffer::newest)) are bounds
/// checked against the number of occupied slots.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Box<[T]>,
    capacity: usize,
    len: usize,
    /// Arena index of the oldest element
    head: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Creates an empty buffer of `extent` slots, each initialised to `value`.
    ///
    /// # Arguments
    ///
    /// * `value` - Placeholder stored in unused slots
    /// * `extent` - Arena size, which is also the initial logical capacity
    pub fn from_elem(value: T, extent: usize) -> Result<Self> {
        if extent == 0 {
            return Err(ShaperError::InvalidWindowSize(extent));
        }
        Ok(Self {
            data: vec![value; extent].into_boxed_slice(),
            capacity: extent,
            len: 0,
            head: 0,
        })
    }

    /// Sets every logical slot to `value` and marks the buffer full.
    pub fn fill(&mut self, value: T) {
        for slot in self.data[..self.capacity].iter_mut() {
            *slot = value.clone();
        }
        self.head = 0;
        self.len = self.capacity;
    }
}

impl<T: Clone + Default> RingBuffer<T> {
    /// Creates an empty buffer with `extent` default-initialised slots.
    pub fn new(extent: usize) -> Result<Self> {
        Self::from_elem(T::default(), extent)
    }
}

impl<T> RingBuffer<T> {
    /// Size of the preallocated arena
    pub fn extent(&self) -> usize {
        self.data.len()
    }

    /// Current logical capacity (`1..=extent`)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    #[inline]
    fn slot(&self, offset: usize) -> usize {
        let i = self.head + offset;
        if i >= self.capacity {
            i - self.capacity
        } else {
            i
        }
    }

    /// Appends `value` as the newest element.
    ///
    /// # Returns
    ///
    /// The evicted oldest element when the buffer was already full, `None` otherwise
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.len == self.capacity {
            let evicted = std::mem::replace(&mut self.data[self.head], value);
            self.head = self.slot(1);
            Some(evicted)
        } else {
            let tail = self.slot(self.len);
            self.data[tail] = value;
            self.len += 1;
            None
        }
    }

    /// Removes the oldest element.
    pub fn pop(&mut self) -> Result<&T> {
        if self.len == 0 {
            return Err(ShaperError::Empty);
        }
        let index = self.head;
        self.head = self.slot(1);
        self.len -= 1;
        Ok(&self.data[index])
    }

    /// Marks the buffer empty without touching the stored values.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Changes the logical capacity. The buffer is left empty.
    ///
    /// # Arguments
    ///
    /// * `capacity` - New logical capacity, must lie in `1..=extent`
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(ShaperError::InvalidWindowSize(capacity));
        }
        if capacity > self.extent() {
            return Err(ShaperError::CapacityExceeded {
                window: capacity,
                extent: self.extent(),
            });
        }
        self.capacity = capacity;
        self.reset();
        Ok(())
    }

    /// `k`-th least recently pushed element (0 = oldest)
    pub fn oldest(&self, k: usize) -> Result<&T> {
        if k >= self.len {
            return Err(ShaperError::IndexOutOfRange {
                index: k,
                len: self.len,
            });
        }
        Ok(&self.data[self.slot(k)])
    }

    /// `k`-th most recently pushed element (0 = newest)
    pub fn newest(&self, k: usize) -> Result<&T> {
        if k >= self.len {
            return Err(ShaperError::IndexOutOfRange {
                index: k,
                len: self.len,
            });
        }
        Ok(&self.data[self.slot(self.len - 1 - k)])
    }

    /// Iterates from oldest to newest; `.rev()` walks newest to oldest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            front: 0,
            back: self.len,
        }
    }
}

/// Double-ended iterator over the occupied slots of a [`RingBuffer`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    buffer: &'a RingBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = &self.buffer.data[self.buffer.slot(self.front)];
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.buffer.data[self.buffer.slot(self.back)])
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
