//! Deterministic sub-sampling ("sieving") of frame indices.
//!
//! A sieve maps the full frame domain `[0, n_full)` to an ascending subset of
//! `M` selected frames. Position within that subset is the *reduced index*.
//! Selection is a pure function of `(n_full, sieve, rule)`, so a sieve rebuilt
//! from the parameters stored in a matrix file reproduces the mapping used when
//! the file was written; the mapping itself is never persisted.
//!
//! Random selection uses `ChaCha8Rng`, whose output stream is fixed for a
//! given seed across releases and platforms, and its own shuffle on top of
//! `next_u64`, so files written by one build reload identically in another.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::util;
use crate::error::{Error, Result};

/// Reverse-map entry for frames the sieve did not select.
const NOT_SELECTED: usize = usize::MAX;

/// How a sieve picks frames when `sieve > 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SieveRule {
    /// Every `sieve`-th frame, starting at frame 0.
    #[default]
    Stride,
    /// `n_full / sieve` frames drawn without replacement, then sorted.
    Random {
        /// Seed for the sampling RNG.
        seed: u64,
    },
}

/// Sieve parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SieveParams {
    /// Sieve value; `1` keeps every frame.
    pub sieve: usize,
    /// Selection rule used when `sieve > 1`.
    pub rule: SieveRule,
}

impl Default for SieveParams {
    fn default() -> Self {
        Self {
            sieve: 1,
            rule: SieveRule::Stride,
        }
    }
}

impl SieveParams {
    /// Stride sieve keeping every `sieve`-th frame.
    pub fn new(sieve: usize) -> Self {
        Self {
            sieve,
            ..Default::default()
        }
    }

    /// Set the sieve value.
    pub fn with_sieve(mut self, sieve: usize) -> Self {
        self.sieve = sieve;
        self
    }

    /// Switch to random selection with the given seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rule = SieveRule::Random { seed };
        self
    }

    /// Number of frames these parameters select out of `n_full`.
    ///
    /// Computed without building the sieve, so file headers can be checked
    /// before anything is allocated.
    pub fn selected_count(&self, n_full: usize) -> usize {
        match self.rule {
            _ if self.sieve <= 1 => n_full,
            SieveRule::Stride => n_full.div_ceil(self.sieve),
            SieveRule::Random { .. } => (n_full / self.sieve).max(1).min(n_full),
        }
    }
}

/// Selected frames and the frame -> reduced index map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sieve {
    n_full: usize,
    params: SieveParams,
    selected: Vec<usize>,
    frame_to_idx: Vec<usize>,
}

impl Sieve {
    /// Build the sieve for `n_full` frames.
    pub fn new(n_full: usize, params: SieveParams) -> Result<Self> {
        if params.sieve == 0 {
            return Err(Error::setup("sieve", "must be at least 1"));
        }

        let amount = params.selected_count(n_full);
        let mut selected = util::try_with_capacity(amount, "n_frames")?;
        match params.rule {
            _ if params.sieve == 1 => selected.extend(0..n_full),
            SieveRule::Stride => selected.extend((0..n_full).step_by(params.sieve)),
            SieveRule::Random { seed } => {
                let mut pool = util::try_with_capacity(n_full, "n_frames")?;
                pool.extend(0..n_full);
                // Partial Fisher-Yates driven by raw `next_u64` draws so the
                // selection depends only on the ChaCha8 stream.
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                for i in 0..amount {
                    let span = (n_full - i) as u64;
                    let j = i + (rng.next_u64() % span) as usize;
                    pool.swap(i, j);
                }
                selected.extend_from_slice(&pool[..amount]);
                selected.sort_unstable();
            }
        }
        debug_assert_eq!(selected.len(), amount);

        let mut frame_to_idx = util::try_filled(n_full, NOT_SELECTED, "n_frames")?;
        for (idx, &frame) in selected.iter().enumerate() {
            frame_to_idx[frame] = idx;
        }

        Ok(Self {
            n_full,
            params,
            selected,
            frame_to_idx,
        })
    }

    /// Size of the original frame domain.
    pub fn n_full(&self) -> usize {
        self.n_full
    }

    /// Number of selected frames (`M`).
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True if no frame was selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Parameters this sieve was built from.
    pub fn params(&self) -> SieveParams {
        self.params
    }

    /// Selected original frame indices, ascending.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// Iterate over the selected frames.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Whether `frame` survived the sieve.
    pub fn is_selected(&self, frame: usize) -> bool {
        self.frame_to_idx
            .get(frame)
            .is_some_and(|&idx| idx != NOT_SELECTED)
    }

    /// Reduced index of a selected frame.
    ///
    /// Frames that were filtered out (or lie outside `[0, n_full)`) are
    /// reported as [`Error::SieveContract`] rather than mapped to a neighbour.
    pub fn to_reduced(&self, frame: usize) -> Result<usize> {
        match self.frame_to_idx.get(frame) {
            Some(&idx) if idx != NOT_SELECTED => Ok(idx),
            _ => Err(Error::SieveContract {
                frame,
                sieve: self.params.sieve,
            }),
        }
    }

    /// Original frame of a reduced index.
    #[inline]
    pub fn frame(&self, reduced: usize) -> usize {
        self.selected[reduced]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_without_sieving() {
        let sieve = Sieve::new(5, SieveParams::default()).unwrap();
        assert_eq!(sieve.selected(), &[0, 1, 2, 3, 4]);
        for f in 0..5 {
            assert_eq!(sieve.to_reduced(f).unwrap(), f);
        }
    }

    #[test]
    fn test_identity_ignores_rule_when_sieve_is_one() {
        let sieve = Sieve::new(4, SieveParams::new(1).with_seed(99)).unwrap();
        assert_eq!(sieve.selected(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_stride() {
        let sieve = Sieve::new(6, SieveParams::new(2)).unwrap();
        assert_eq!(sieve.selected(), &[0, 2, 4]);
        assert_eq!(sieve.to_reduced(0).unwrap(), 0);
        assert_eq!(sieve.to_reduced(2).unwrap(), 1);
        assert_eq!(sieve.to_reduced(4).unwrap(), 2);

        let sieve = Sieve::new(7, SieveParams::new(3)).unwrap();
        assert_eq!(sieve.selected(), &[0, 3, 6]);
    }

    #[test]
    fn test_unselected_frame_is_reported() {
        let sieve = Sieve::new(6, SieveParams::new(2)).unwrap();
        assert!(!sieve.is_selected(3));
        assert!(matches!(
            sieve.to_reduced(3),
            Err(Error::SieveContract { frame: 3, sieve: 2 })
        ));
        assert!(matches!(
            sieve.to_reduced(100),
            Err(Error::SieveContract { .. })
        ));
    }

    #[test]
    fn test_random_is_sorted_and_deterministic() {
        let params = SieveParams::new(3).with_seed(7);
        let a = Sieve::new(30, params).unwrap();
        let b = Sieve::new(30, params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.selected().windows(2).all(|w| w[0] < w[1]));
        for (idx, frame) in a.iter().enumerate() {
            assert_eq!(a.to_reduced(frame).unwrap(), idx);
            assert_eq!(a.frame(idx), frame);
        }
    }

    #[test]
    fn test_random_selection_is_pinned() {
        // Any change here silently re-pairs distances in existing files.
        let sieve = Sieve::new(20, SieveParams::new(4).with_seed(11)).unwrap();
        assert_eq!(sieve.selected(), &[4, 5, 13, 16, 19]);

        let sieve = Sieve::new(30, SieveParams::new(3).with_seed(7)).unwrap();
        assert_eq!(sieve.selected(), &[0, 10, 13, 14, 15, 18, 24, 25, 27, 29]);
    }

    #[test]
    fn test_huge_domain_is_setup_error() {
        assert!(matches!(
            Sieve::new(usize::MAX, SieveParams::new(usize::MAX / 2)),
            Err(Error::Setup { name: "n_frames", .. })
        ));
        assert!(matches!(
            Sieve::new(usize::MAX, SieveParams::default()),
            Err(Error::Setup { name: "n_frames", .. })
        ));
    }

    #[test]
    fn test_random_keeps_at_least_one_frame() {
        let sieve = Sieve::new(3, SieveParams::new(10).with_seed(1)).unwrap();
        assert_eq!(sieve.len(), 1);
    }

    #[test]
    fn test_selected_count_matches_built_sieve() {
        for n in 0..20 {
            for s in 1..6 {
                for params in [SieveParams::new(s), SieveParams::new(s).with_seed(3)] {
                    let sieve = Sieve::new(n, params).unwrap();
                    assert_eq!(sieve.len(), params.selected_count(n));
                }
            }
        }
    }

    #[test]
    fn test_zero_sieve_rejected() {
        assert!(matches!(
            Sieve::new(4, SieveParams::new(0)),
            Err(Error::Setup { name: "sieve", .. })
        ));
    }
}
