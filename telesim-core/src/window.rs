//! Fixed-Capacity Sample Window for Per-Variable History
//!
//! ## Overview
//!
//! Each sensor variable keeps a bounded FIFO of its most recent raw values,
//! which the outlier filter scores against. The window is a ring buffer with
//! a capacity fixed at compile time through const generics: when full, a push
//! silently evicts the oldest value rather than failing. Recent data is more
//! valuable than old data for outlier scoring, so overwrite-on-full is the
//! behavior we want, not an error.
//!
//! ## Invariants
//!
//! - `len() <= N` at all times
//! - values iterate oldest to newest, in arrival order, never reordered
//! - pushing is O(1); iteration is O(n); no heap allocation
//!
//! ## Usage
//!
//! ```rust
//! use telesim_core::window::SampleWindow;
//!
//! let mut window: SampleWindow<3> = SampleWindow::new();
//! window.push(25.0);
//! window.push(25.1);
//! window.push(24.9);
//! window.push(60.0); // evicts 25.0
//!
//! assert_eq!(window.len(), 3);
//! assert_eq!(window.latest(), Some(60.0));
//! let values: Vec<f64> = window.iter().collect();
//! assert_eq!(values, vec![25.1, 24.9, 60.0]);
//! ```

/// Default number of raw samples retained per variable.
pub const WINDOW_CAPACITY: usize = 100;

/// Ring buffer of the last `N` raw sample values for one variable.
///
/// Not thread-safe; the processing loop is the only writer by design.
#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize> {
    /// Storage slots; `None` until first written
    values: [Option<f64>; N],

    /// Index of the next write, wraps at N
    write_pos: usize,

    /// Number of occupied slots, saturates at N
    len: usize,
}

impl<const N: usize> SampleWindow<N> {
    /// Creates an empty window.
    pub const fn new() -> Self {
        Self {
            values: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Appends a value, evicting the oldest when the window is full.
    pub fn push(&mut self, value: f64) {
        self.values[self.write_pos] = Some(value);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the window holds `N` values.
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// The most recently pushed value.
    pub fn latest(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        self.values[idx]
    }

    /// Iterates values oldest to newest.
    pub fn iter(&self) -> SampleWindowIter<'_, N> {
        SampleWindowIter {
            window: self,
            count: 0,
        }
    }

    /// Maps a logical index (0 = oldest) to its stored value.
    ///
    /// While filling, logical and physical indices coincide; once full the
    /// oldest value sits at `write_pos` and the view is rotated.
    fn get(&self, index: usize) -> Option<f64> {
        if index >= self.len {
            return None;
        }

        let actual = if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        };

        self.values[actual]
    }
}

/// Iterator over window contents, oldest first.
pub struct SampleWindowIter<'a, const N: usize> {
    window: &'a SampleWindow<N>,
    count: usize,
}

impl<const N: usize> Iterator for SampleWindowIter<'_, N> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.window.len() {
            return None;
        }

        let value = self.window.get(self.count)?;
        self.count += 1;
        Some(value)
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_window() {
        let window: SampleWindow<5> = SampleWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert!(window.latest().is_none());
    }

    #[test]
    fn push_and_latest() {
        let mut window = SampleWindow::<5>::new();

        window.push(25.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest(), Some(25.0));

        window.push(26.5);
        assert_eq!(window.latest(), Some(26.5));
    }

    #[test]
    fn eviction_keeps_newest() {
        let mut window = SampleWindow::<3>::new();

        for i in 0..5 {
            window.push(i as f64);
        }

        assert_eq!(window.len(), 3);
        assert!(window.is_full());

        // 0.0 and 1.0 were evicted
        let values: Vec<f64> = window.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn iterator_preserves_arrival_order() {
        let mut window = SampleWindow::<4>::new();

        for v in [10.0, 20.0, 30.0] {
            window.push(v);
        }

        let values: Vec<f64> = window.iter().collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    proptest! {
        /// After N+k insertions the window holds exactly N values and the
        /// oldest k are gone.
        #[test]
        fn capacity_never_exceeded(extra in 1usize..50) {
            let mut window = SampleWindow::<10>::new();
            let total = 10 + extra;

            for i in 0..total {
                window.push(i as f64);
            }

            prop_assert_eq!(window.len(), 10);
            let values: Vec<f64> = window.iter().collect();
            let expected: Vec<f64> = (extra..total).map(|i| i as f64).collect();
            prop_assert_eq!(values, expected);
        }

        /// Arrival order survives any input sequence shorter than capacity.
        #[test]
        fn order_preserved(values in proptest::collection::vec(-1e6f64..1e6, 0..10)) {
            let mut window = SampleWindow::<10>::new();
            for &v in &values {
                window.push(v);
            }

            let stored: Vec<f64> = window.iter().collect();
            prop_assert_eq!(stored, values);
        }
    }
}
