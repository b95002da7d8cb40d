//! Sieved pairwise distance matrix with per-frame exclusion.

use std::io::Write;

use super::sieve::{Sieve, SieveParams, SieveRule};
use super::triangle::TriangleStore;
use super::util;
use crate::error::{Error, Result};

/// Smallest stored distance between two non-excluded points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinPair {
    /// The distance.
    pub value: f64,
    /// Reduced index of the first point (`row < col`).
    pub row: usize,
    /// Reduced index of the second point.
    pub col: usize,
}

/// Pairwise distances between the sieved frames of an ensemble.
///
/// Two index spaces are in play:
/// - *frame* (original) indices in `[0, n_frames)`, used for exclusion and by
///   callers reasoning about the whole ensemble;
/// - *reduced* indices in `[0, n_reduced)`, the positions of the selected
///   frames, used by the storage and by the minimum search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceMatrix {
    pub(super) sieve: Sieve,
    pub(super) store: TriangleStore,
    /// One flag per original frame, independent of sieving.
    pub(super) ignore: Vec<bool>,
}

impl DistanceMatrix {
    /// Matrix over all `n_frames` frames (no sieving).
    pub fn new(n_frames: usize) -> Result<Self> {
        Self::with_sieve(n_frames, SieveParams::default())
    }

    /// Matrix over the frames selected by `params` out of `n_frames`.
    pub fn with_sieve(n_frames: usize, params: SieveParams) -> Result<Self> {
        if n_frames <= 1 {
            return Err(Error::setup("n_frames", format!("need at least 2 frames, got {n_frames}")));
        }

        let sieve = Sieve::new(n_frames, params)?;
        let store = TriangleStore::new(sieve.len())?;
        let ignore = util::try_filled(n_frames, false, "n_frames")?;

        tracing::debug!(
            n_frames,
            sieve = params.sieve,
            n_reduced = sieve.len(),
            n_elements = store.n_elements(),
            "distance matrix allocated"
        );

        Ok(Self {
            sieve,
            store,
            ignore,
        })
    }

    /// Re-initialize in place without sieving.
    pub fn setup(&mut self, n_frames: usize) -> Result<()> {
        self.setup_with_sieve(n_frames, SieveParams::default())
    }

    /// Re-initialize in place. On failure `self` is left as it was.
    pub fn setup_with_sieve(&mut self, n_frames: usize, params: SieveParams) -> Result<()> {
        *self = Self::with_sieve(n_frames, params)?;
        Ok(())
    }

    /// Number of original frames.
    pub fn n_frames(&self) -> usize {
        self.ignore.len()
    }

    /// Number of frames kept by the sieve.
    pub fn n_reduced(&self) -> usize {
        self.sieve.len()
    }

    /// Number of stored distances.
    pub fn n_elements(&self) -> usize {
        self.store.n_elements()
    }

    /// Sieve value used at setup.
    pub fn sieve_value(&self) -> usize {
        self.sieve.params().sieve
    }

    /// Sieve rule used at setup.
    pub fn sieve_rule(&self) -> SieveRule {
        self.sieve.params().rule
    }

    /// The sieve mapping frames to reduced indices.
    pub fn sieve(&self) -> &Sieve {
        &self.sieve
    }

    /// Original frame numbers of the reduced points, ascending.
    pub fn selected_frames(&self) -> &[usize] {
        self.sieve.selected()
    }

    /// Distance between two original frames.
    ///
    /// Both frames must have been selected by the sieve.
    pub fn get_by_original(&self, frame_i: usize, frame_j: usize) -> Result<f64> {
        let i = self.sieve.to_reduced(frame_i)?;
        let j = self.sieve.to_reduced(frame_j)?;
        self.store.get(i, j)
    }

    /// Set the distance between two original frames.
    pub fn set_by_original(&mut self, frame_i: usize, frame_j: usize, value: f64) -> Result<()> {
        let i = self.sieve.to_reduced(frame_i)?;
        let j = self.sieve.to_reduced(frame_j)?;
        self.store.set(i, j, value)
    }

    /// Distance between two reduced points.
    #[inline]
    pub fn get_by_reduced(&self, i: usize, j: usize) -> Result<f64> {
        self.store.get(i, j)
    }

    /// Set the distance between two reduced points.
    #[inline]
    pub fn set_by_reduced(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.store.set(i, j, value)
    }

    /// Write the next distance in storage order (`(0,1), (0,2), .., (1,2), ..`).
    pub fn add_element(&mut self, value: f64) -> Result<()> {
        self.store.add_element(value)
    }

    /// Retire an original frame from further minimum searches.
    ///
    /// # Panics
    ///
    /// Panics if `frame >= n_frames()`.
    pub fn exclude(&mut self, frame: usize) {
        self.ignore[frame] = true;
    }

    /// Whether an original frame has been excluded.
    ///
    /// # Panics
    ///
    /// Panics if `frame >= n_frames()`.
    pub fn is_excluded(&self, frame: usize) -> bool {
        self.ignore[frame]
    }

    /// Find the smallest distance whose endpoints are both still active.
    ///
    /// Returns `None` when fewer than two non-excluded points remain. NaN
    /// distances never win; if every candidate is NaN the result is `None`.
    /// Ties resolve to the first pair in storage order.
    ///
    /// # Complexity
    ///
    /// O(M^2) per call for `M = n_reduced()`, hence O(M^3) over a full
    /// agglomerative run of M merges. This scan is the dominant cost of
    /// clustering on top of this matrix.
    pub fn find_min(&self) -> Option<MinPair> {
        let active: Vec<usize> = (0..self.sieve.len())
            .filter(|&r| !self.ignore[self.sieve.frame(r)])
            .collect();
        if active.len() < 2 {
            return None;
        }

        let mut best: Option<MinPair> = None;
        for (a, &i) in active.iter().enumerate().take(active.len() - 1) {
            let row = self.store.row(i);
            for &j in &active[a + 1..] {
                let value = row[j - i - 1];
                if value.is_nan() {
                    continue;
                }
                if best.map_or(true, |b| value < b.value) {
                    best = Some(MinPair { value, row: i, col: j });
                }
            }
        }
        best
    }

    /// Fill every stored pair with `dist(frame_i, frame_j)` (original indices).
    pub fn populate<F>(&mut self, mut dist: F)
    where
        F: FnMut(usize, usize) -> f64,
    {
        let frames = self.sieve.selected();
        for (i, row) in self.store.rows_mut() {
            for (k, cell) in row.iter_mut().enumerate() {
                *cell = dist(frames[i], frames[i + 1 + k]);
            }
        }
    }

    /// Parallel [`DistanceMatrix::populate`].
    ///
    /// Each rayon task owns one row of the store, so no two tasks write the
    /// same cell. Returns once every row is written.
    #[cfg(feature = "parallel")]
    pub fn par_populate<F>(&mut self, dist: F)
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        use rayon::prelude::*;

        let frames = self.sieve.selected();
        self.store.rows_mut().into_par_iter().for_each(|(i, row)| {
            for (k, cell) in row.iter_mut().enumerate() {
                *cell = dist(frames[i], frames[i + 1 + k]);
            }
        });
    }

    /// Dump `frame_i frame_j value` for every pair with both ends active.
    pub fn write_elements<W: Write>(&self, mut w: W) -> Result<()> {
        for i in 0..self.sieve.len() {
            let fi = self.sieve.frame(i);
            if self.ignore[fi] {
                continue;
            }
            for j in (i + 1)..self.sieve.len() {
                let fj = self.sieve.frame(j);
                if self.ignore[fj] {
                    continue;
                }
                let value = self.store.row(i)[j - i - 1];
                writeln!(w, "{fi} {fj} {value:8.3}")?;
            }
        }
        Ok(())
    }
}
