//! Inhibition turns per-column (boosted) overlaps into a sparse set of active columns.
//!
//! - Global inhibition ignores topology: the `density * num_columns` columns with the highest
//!   overlaps win. Columns are stable-sorted by overlap ascending and taken from the top, so among
//!   equal overlaps the lower index is excluded first.
//! - Local inhibition is a sequential competition. Columns are visited in ascending index order and
//!   each one wins if fewer than `round(density * (neighbors + 1))` of its neighbors have a strictly
//!   larger overlap. A winner's overlap is nudged up by `max(overlaps) / 1000`, so it beats any
//!   neighbor with the same overlap that is decided later. The visiting order is part of the result.
//!
//! Both return the winning column indices in ascending order.

use super::topology::Topology;

/// Selects the `density * overlaps.len()` columns with the largest overlap.
pub fn inhibit_columns_global(overlaps: &[f32], density: f32) -> Vec<usize> {
    let num_active = ((density * overlaps.len() as f32) as usize).min(overlaps.len());
    if num_active == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (0..overlaps.len()).collect();
    candidates.sort_by(|&a, &b| overlaps[a].total_cmp(&overlaps[b]));

    let mut winners = candidates.split_off(overlaps.len() - num_active);
    winners.sort_unstable();
    winners
}

/// Runs the sequential local competition over the non-wrapping neighborhoods of `radius`
/// in the column space described by `topology`.
pub fn inhibit_columns_local(
    overlaps: &[f32],
    density: f32,
    topology: &Topology,
    radius: usize,
) -> Vec<usize> {
    let mut overlaps = overlaps.to_vec();
    let add_to_winners = overlaps.iter().fold(0.0_f32, |acc, &x| acc.max(x)) / 1000.0;
    let mut winners = Vec::new();

    for column in 0..overlaps.len() {
        let neighbors = topology.neighbors(column, radius, false);
        let num_active = (0.5 + density * (neighbors.len() + 1) as f32) as usize;
        let num_bigger = neighbors
            .iter()
            .filter(|&&n| overlaps[n] > overlaps[column])
            .count();

        if num_bigger < num_active {
            winners.push(column);
            overlaps[column] += add_to_winners;
        }
    }

    winners
}
