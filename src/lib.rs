//! Compact pairwise distance matrices for hierarchical clustering.
//!
//! `trimatrix` stores the distances between sampled states (e.g. simulation
//! snapshots) as the upper triangle of a symmetric matrix, optionally over a
//! sieved subset of the states, and exposes what an agglomerative merge loop
//! needs: distance lookup, per-state exclusion, minimum search and binary
//! persistence.
//!
//! The primary public API is under [`matrix`].

#![forbid(unsafe_code)]

pub mod error;
pub mod matrix;

pub use error::{Error, Result};
pub use matrix::{DistanceMatrix, MinPair, Sieve, SieveParams, SieveRule, TriangleStore};
