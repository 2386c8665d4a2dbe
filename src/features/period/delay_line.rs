//! Fixed-capacity circular history over hops
//!
//! A delay line of `N` slots. Lookups are expressed as a delay from now:
//! delay 0 is the value pushed most recently, delay `N - 1` the oldest one
//! still held. Slots never written since construction or the last
//! [`CircularHistory::clear`] read back as `T::default()`.
//!
//! # Example
//!
//! ```
//! use rhythm_coach::features::period::delay_line::CircularHistory;
//!
//! let mut history = CircularHistory::<u8, 4>::new();
//! for value in [1, 0, 1, 0] {
//!     history.push(value);
//! }
//! assert_eq!(history.at(0), 0);
//! assert_eq!(history.at(1), 1);
//! assert_eq!(history.at(4), 0); // out of range reads as empty
//! ```

/// Ring buffer of the last `N` pushed values
#[derive(Debug, Clone)]
pub struct CircularHistory<T, const N: usize> {
    items: [T; N],
    /// Slot the next push writes to
    cursor: usize,
}

impl<T: Copy + Default, const N: usize> Default for CircularHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> CircularHistory<T, N> {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            cursor: 0,
        }
    }

    /// Number of delays this history can answer
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Overwrite the oldest slot with `value`
    pub fn push(&mut self, value: T) {
        if N == 0 {
            return;
        }
        self.items[self.cursor] = value;
        self.cursor += 1;
        if self.cursor >= N {
            self.cursor -= N;
        }
    }

    /// Value pushed `delay + 1` pushes ago
    ///
    /// Returns `T::default()` for `delay >= N`.
    pub fn at(&self, delay: usize) -> T {
        if delay >= N {
            return T::default();
        }
        self.items[self.slot(delay)]
    }

    /// Reset every slot to empty and rewind the cursor
    pub fn clear(&mut self) {
        self.items = [T::default(); N];
        self.cursor = 0;
    }

    /// Storage slot holding `delay`, for `delay < N`
    ///
    /// `cursor - delay - 1` wrapped into `[0, N)`. When the subtraction
    /// would go negative (`delay >= cursor`) one `N` is added first; since
    /// `delay <= N - 1` a single wrap always lands in range.
    fn slot(&self, delay: usize) -> usize {
        debug_assert!(delay < N);
        if delay < self.cursor {
            self.cursor - delay - 1
        } else {
            self.cursor + N - delay - 1
        }
    }
}
