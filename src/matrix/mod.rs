//! Pairwise distance storage for agglomerative clustering.
//!
//! Agglomerative clustering of `N` sampled states repeatedly merges the two
//! closest points, which needs all `N * (N - 1) / 2` pairwise distances up
//! front. This module keeps that cost bounded:
//!
//! - [`TriangleStore`] holds only the strictly-upper triangle of the
//!   symmetric, zero-diagonal matrix.
//! - [`Sieve`] deterministically reduces the `N` frames to `M` before
//!   anything is allocated, either by stride or by seeded random sampling.
//! - [`DistanceMatrix`] ties the two together with a per-frame exclusion
//!   mask, offers the minimum-search primitive a merge loop needs, and
//!   persists everything to a small binary file so distances do not have to
//!   be recomputed.
//!
//! ## Index spaces
//!
//! Frames (original indices) range over `[0, N)`. Reduced indices range over
//! `[0, M)` and are positions in [`Sieve::selected`]. Exclusion is always by
//! frame; storage access is by reduced index, or by frame through the sieve.
//!
//! ## Cost
//!
//! | Operation | Time | Memory |
//! |-----------|------|--------|
//! | setup | O(M^2) | `8 * M * (M - 1) / 2` bytes + O(N) |
//! | get / set | O(1) | - |
//! | [`DistanceMatrix::find_min`] | O(M^2) | O(M) |
//! | full merge run (M merges) | O(M^3) | - |
//!
//! The minimum search rescans every active pair on each call; a merge loop
//! spends nearly all of its time there.
//!
//! ## Concurrency
//!
//! Nothing here locks. Population may be parallel as long as each worker owns
//! disjoint cells ([`DistanceMatrix::par_populate`] splits by row); the merge
//! loop is inherently sequential because every `exclude` changes what the next
//! `find_min` must skip.
//!
//! ## Usage
//!
//! ```rust
//! use trimatrix::matrix::{DistanceMatrix, SieveParams};
//!
//! // Six frames, keep every second one: frames 0, 2 and 4.
//! let mut m = DistanceMatrix::with_sieve(6, SieveParams::new(2)).unwrap();
//! assert_eq!(m.selected_frames(), &[0, 2, 4]);
//!
//! m.set_by_reduced(0, 1, 5.0).unwrap();
//! m.set_by_reduced(0, 2, 3.0).unwrap();
//! m.set_by_reduced(1, 2, 7.0).unwrap();
//!
//! let closest = m.find_min().unwrap();
//! assert_eq!((closest.value, closest.row, closest.col), (3.0, 0, 2));
//! assert_eq!(m.get_by_original(0, 4).unwrap(), 3.0);
//!
//! // Retire frame 4 (reduced index 2) after merging it.
//! m.exclude(4);
//! assert_eq!(m.find_min().unwrap().value, 5.0);
//! ```

mod distance;
mod io;
mod sieve;
mod triangle;
mod util;

pub use distance::{DistanceMatrix, MinPair};
pub use io::{HEADER_LEN, MATRIX_MAGIC};
pub use sieve::{Sieve, SieveParams, SieveRule};
pub use triangle::TriangleStore;
