//! Strictly-upper-triangular storage for a symmetric matrix with zero diagonal.
//!
//! For `n` points only the `n * (n - 1) / 2` distinct off-diagonal values are
//! kept, laid out row by row:
//!
//! ```text
//!        j=1   j=2   j=3
//! i=0  [  0 ][  1 ][  2 ]
//! i=1        [  3 ][  4 ]
//! i=2              [  5 ]
//! ```
//!
//! Entry `(i, j)` with `i < j` lives at `n*i - i*(i+1)/2 + (j - i - 1)`, and
//! `(j, i)` resolves to the same slot. Every row `i` is therefore a contiguous
//! slice of length `n - 1 - i`, which is what the parallel fill relies on.

use super::util;
use crate::error::{Error, Result};

/// Dense storage for the upper triangle of an `n x n` symmetric matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleStore {
    n: usize,
    elements: Vec<f64>,
    /// Cursor for [`TriangleStore::add_element`].
    next: usize,
}

/// Number of stored elements for `n` points, or `None` on overflow.
pub(crate) fn element_count(n: usize) -> Option<usize> {
    if n < 2 {
        return Some(0);
    }
    n.checked_mul(n - 1).map(|v| v / 2)
}

impl TriangleStore {
    /// Allocate zeroed storage for `n` points.
    pub fn new(n: usize) -> Result<Self> {
        let mut store = Self::default();
        store.setup(n)?;
        Ok(store)
    }

    /// Re-allocate for `n` points, discarding prior contents.
    ///
    /// On failure the store is left untouched.
    pub fn setup(&mut self, n: usize) -> Result<()> {
        let count = element_count(n)
            .ok_or_else(|| Error::setup("n", format!("{n} points overflow the element count")))?;

        let elements = util::try_filled(count, 0.0, "n")?;

        self.n = n;
        self.elements = elements;
        self.next = 0;
        Ok(())
    }

    /// Build a store directly from values already in canonical order.
    pub(crate) fn from_elements(n: usize, elements: Vec<f64>) -> Self {
        debug_assert_eq!(element_count(n), Some(elements.len()));
        let next = elements.len();
        Self { n, elements, next }
    }

    /// Number of addressable points.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of distinct stored values, `n * (n - 1) / 2`.
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Stored values in canonical linear order.
    pub fn elements(&self) -> &[f64] {
        &self.elements
    }

    /// Linear offset of an unordered pair, checked.
    pub fn offset(&self, i: usize, j: usize) -> Result<usize> {
        if i == j || i >= self.n || j >= self.n {
            return Err(Error::Index {
                row: i,
                col: j,
                size: self.n,
            });
        }
        Ok(self.offset_unchecked(i.min(j), i.max(j)))
    }

    /// Linear offset for `i < j < n`.
    #[inline]
    pub(crate) fn offset_unchecked(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.n);
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    /// Value stored for the pair `(i, j)`; symmetric in its arguments.
    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        let k = self.offset(i, j)?;
        Ok(self.elements[k])
    }

    /// Store `value` for the pair `(i, j)` (and therefore `(j, i)`).
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        let k = self.offset(i, j)?;
        self.elements[k] = value;
        Ok(())
    }

    /// Write the next value in canonical order.
    ///
    /// The cursor starts at zero after setup and is independent of
    /// [`TriangleStore::set`].
    pub fn add_element(&mut self, value: f64) -> Result<()> {
        let capacity = self.elements.len();
        let slot = self
            .elements
            .get_mut(self.next)
            .ok_or(Error::StoreFull { capacity })?;
        *slot = value;
        self.next += 1;
        Ok(())
    }

    /// Entries `(i, i+1..n)` as a slice.
    #[inline]
    pub(crate) fn row(&self, i: usize) -> &[f64] {
        let start = self.offset_unchecked(i, i + 1);
        &self.elements[start..start + (self.n - 1 - i)]
    }

    /// Split storage into disjoint mutable rows `(i, entries (i, i+1..n))`.
    pub(crate) fn rows_mut(&mut self) -> Vec<(usize, &mut [f64])> {
        let n = self.n;
        let n_rows = n.saturating_sub(1);
        let mut rows = Vec::with_capacity(n_rows);
        let mut rest: &mut [f64] = &mut self.elements;
        for i in 0..n_rows {
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(n - 1 - i);
            rows.push((i, row));
            rest = tail;
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count() {
        for n in 0..10 {
            let store = TriangleStore::new(n).unwrap();
            assert_eq!(store.n_elements(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_offsets_cover_range_once() {
        let n = 7;
        let store = TriangleStore::new(n).unwrap();
        let mut seen = vec![false; store.n_elements()];
        let mut expected = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let k = store.offset(i, j).unwrap();
                // Row-major order: offsets increase by one along each row.
                assert_eq!(k, expected);
                assert!(!seen[k]);
                seen[k] = true;
                expected += 1;
            }
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_symmetric_access() {
        let mut store = TriangleStore::new(4).unwrap();
        store.set(3, 1, 2.5).unwrap();
        assert_eq!(store.get(1, 3).unwrap(), 2.5);
        assert_eq!(store.get(3, 1).unwrap(), 2.5);
        assert_eq!(store.get(0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_diagonal_and_out_of_range() {
        let mut store = TriangleStore::new(4).unwrap();
        assert!(matches!(store.get(2, 2), Err(Error::Index { .. })));
        assert!(matches!(store.get(0, 4), Err(Error::Index { .. })));
        assert!(matches!(store.set(5, 1, 1.0), Err(Error::Index { .. })));
    }

    #[test]
    fn test_setup_discards_contents() {
        let mut store = TriangleStore::new(3).unwrap();
        store.set(0, 2, 9.0).unwrap();
        store.setup(5).unwrap();
        assert_eq!(store.n_elements(), 10);
        assert!(store.elements().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_setup_overflow_keeps_prior_state() {
        let mut store = TriangleStore::new(3).unwrap();
        store.set(0, 1, 1.5).unwrap();
        assert!(matches!(store.setup(usize::MAX), Err(Error::Setup { .. })));
        assert_eq!(store.size(), 3);
        assert_eq!(store.get(0, 1).unwrap(), 1.5);
    }

    #[test]
    fn test_add_element_fills_in_order() {
        let mut store = TriangleStore::new(3).unwrap();
        for v in [1.0, 2.0, 3.0] {
            store.add_element(v).unwrap();
        }
        assert_eq!(store.get(0, 1).unwrap(), 1.0);
        assert_eq!(store.get(0, 2).unwrap(), 2.0);
        assert_eq!(store.get(1, 2).unwrap(), 3.0);
        assert!(matches!(
            store.add_element(4.0),
            Err(Error::StoreFull { capacity: 3 })
        ));
    }

    #[test]
    fn test_rows_are_disjoint_and_aligned() {
        let mut store = TriangleStore::new(5).unwrap();
        for (i, row) in store.rows_mut() {
            assert_eq!(row.len(), 4 - i);
            for (k, cell) in row.iter_mut().enumerate() {
                *cell = (i * 10 + i + 1 + k) as f64;
            }
        }
        assert_eq!(store.get(0, 1).unwrap(), 1.0);
        assert_eq!(store.get(2, 4).unwrap(), 24.0);
        assert_eq!(store.row(3), &[34.0]);
    }
}
