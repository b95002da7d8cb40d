//! Naive single-linkage clustering driven by `find_min` + `exclude`.
//!
//! Points on a line form three groups; every merge retires the second frame
//! of the closest pair and folds its distances into the first, until the
//! requested number of clusters is left. The matrix is saved after
//! population and reloaded to show that distances need not be recomputed.

use std::collections::BTreeMap;

use trimatrix::{DistanceMatrix, SieveParams};

fn main() -> trimatrix::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let positions: Vec<f64> = vec![
        0.0, 0.2, 0.1, 0.3, // group A
        5.0, 5.2, 4.9, 5.1, // group B
        10.0, 10.3, 9.8, 10.1, // group C
    ];
    let n = positions.len();

    let mut matrix = DistanceMatrix::with_sieve(n, SieveParams::new(1))?;
    matrix.populate(|a, b| (positions[a] - positions[b]).abs());

    let path = std::env::temp_dir().join("trimatrix-demo.mat");
    matrix.save(&path)?;
    let mut matrix = DistanceMatrix::load(&path, 2)?;

    // Cluster membership keyed by the representative's reduced index.
    let mut members: BTreeMap<usize, Vec<usize>> = matrix
        .selected_frames()
        .iter()
        .enumerate()
        .map(|(idx, &frame)| (idx, vec![frame]))
        .collect();

    let target = 3;
    while members.len() > target {
        let Some(pair) = matrix.find_min() else { break };
        println!(
            "merge {} <- {} at {:.3}",
            matrix.selected_frames()[pair.row],
            matrix.selected_frames()[pair.col],
            pair.value
        );

        // Single linkage: keep the smaller distance to every other point.
        for other in 0..matrix.n_reduced() {
            if other == pair.row || other == pair.col {
                continue;
            }
            let d = matrix
                .get_by_reduced(pair.row, other)?
                .min(matrix.get_by_reduced(pair.col, other)?);
            matrix.set_by_reduced(pair.row, other, d)?;
        }
        let retired = matrix.selected_frames()[pair.col];
        matrix.exclude(retired);

        let absorbed = members.remove(&pair.col).unwrap_or_default();
        members.entry(pair.row).or_default().extend(absorbed);
    }

    for (i, frames) in members.values().enumerate() {
        println!("cluster {i}: frames {frames:?}");
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
