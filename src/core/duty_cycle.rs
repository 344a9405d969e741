//! Duty cycles are rolling metrics that measure how often a unit meets some activity criterion over time.
//!
//! Columns track two of them with a fixed-window moving average:
//! - The overlap duty cycle measures how often a column has a non-zero overlap with the input.
//! - The active duty cycle measures how often a column is chosen as a winner after inhibition.
//!
//! Each column also carries minimum targets for both, a fraction of the best duty cycle around it.
//! Columns below their targets get boosted (active) or have their permanences bumped (overlap).
//!
//! Segments track how often they provided a good prediction. For a short history that is a plain
//! ratio. Past the first tier it becomes an exponential moving average whose rate drops as the
//! learning iteration crosses each tier in [`DUTY_CYCLE_TIERS`]. The average is only updated on
//! request, and the decay applied for the elapsed iterations uses the rate of the current tier. It
//! MUST therefore be requested on every segment on the last iteration each rate governs (see
//! [`is_tier_boundary`]), so that no single request spans two tiers.

use serde::{Deserialize, Serialize};

/// Learning iterations at which a segment's duty cycle switches to the next averaging rate.
pub const DUTY_CYCLE_TIERS: [u32; 9] = [0, 100, 320, 1000, 3200, 10000, 32000, 100000, 320000];

/// Averaging rate in effect from the matching entry of [`DUTY_CYCLE_TIERS`] onwards.
pub const DUTY_CYCLE_ALPHAS: [f64; 9] = [
    0.0, 0.0032, 0.0010, 0.00032, 0.00010, 0.000032, 0.00001, 0.0000032, 0.0000010,
];

/// Returns the averaging rate of the largest tier threshold that is ≤ `iteration`.
#[inline]
pub fn tier_alpha(iteration: u32) -> f64 {
    DUTY_CYCLE_TIERS
        .iter()
        .zip(DUTY_CYCLE_ALPHAS.iter())
        .rev()
        .find(|(&tier, _)| tier <= iteration)
        .map_or(0.0, |(_, &alpha)| alpha)
}

/// True on the last iteration governed by an outgoing rate: the end of the plain ratio at the
/// first tier, then the iteration just before every later tier threshold.
#[inline]
pub fn is_tier_boundary(iteration: u32) -> bool {
    iteration == DUTY_CYCLE_TIERS[1]
        || DUTY_CYCLE_TIERS[2..]
            .iter()
            .any(|&tier| tier - 1 == iteration)
}

/// Computes a segment's positive-activation duty cycle at learning iteration `iteration`.
///
/// - Up to the first tier: `positive_activations / iteration`.
/// - Afterwards: `(1 - alpha)^age * cached + (active ? alpha : 0)` with `age = iteration - cached_iteration`.
///   An up-to-date cache is returned unchanged when the segment was not active.
pub fn tiered_duty_cycle(
    iteration: u32,
    positive_activations: u32,
    cached: f64,
    cached_iteration: u32,
    active: bool,
) -> f64 {
    if iteration <= DUTY_CYCLE_TIERS[1] {
        return f64::from(positive_activations) / f64::from(iteration.max(1));
    }

    let age = iteration.saturating_sub(cached_iteration);
    if age == 0 && !active {
        return cached;
    }

    let alpha = tier_alpha(iteration);
    let mut duty_cycle = (1.0 - alpha).powf(f64::from(age)) * cached;
    if active {
        duty_cycle += alpha;
    }
    duty_cycle
}

/// Updates duty cycles with a fixed-window moving average:
/// `((period - 1) * current + new_value) / period`.
///
/// A `period` of 0 is treated as 1.
pub fn update_duty_cycles_helper(duty_cycles: &[f32], new_values: &[u32], period: u32) -> Vec<f32> {
    let period = period.max(1) as f32;
    duty_cycles
        .iter()
        .zip(new_values)
        .map(|(&duty, &value)| (duty * (period - 1.0) + value as f32) / period)
        .collect()
}

/// Per-column overlap and active duty cycles, along with their minimum targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyCycles {
    /// Rolling average of how often each column has an overlap > 0.
    pub overlap: Vec<f32>,

    /// Rolling average of how often each column is chosen as a winner.
    pub active: Vec<f32>,

    /// Target overlap duty cycle, columns below it get their permanences bumped.
    pub min_overlap: Vec<f32>,

    /// Target active duty cycle, columns below it get their overlap boosted.
    pub min_active: Vec<f32>,
}

impl DutyCycles {
    /// Zeroed duty cycles and targets for `num_columns` columns.
    pub fn new(num_columns: usize) -> Self {
        Self {
            overlap: vec![0.0; num_columns],
            active: vec![0.0; num_columns],
            min_overlap: vec![0.0; num_columns],
            min_active: vec![0.0; num_columns],
        }
    }

    /// Folds one step into both duty cycles.
    ///
    /// The overlap stream is `overlaps[c] > 0`, the active stream is `c ∈ active_columns`.
    pub fn update(&mut self, overlaps: &[u32], active_columns: &[usize], period: u32) {
        let overlap_values: Vec<u32> = overlaps.iter().map(|&o| u32::from(o > 0)).collect();
        let mut active_values = vec![0u32; self.active.len()];
        for &col in active_columns {
            active_values[col] = 1;
        }

        self.overlap = update_duty_cycles_helper(&self.overlap, &overlap_values, period);
        self.active = update_duty_cycles_helper(&self.active, &active_values, period);
    }

    /// Sets every column's targets to a fraction of the largest duty cycles across all columns.
    pub fn update_min_global(&mut self, min_pct_overlap: f32, min_pct_active: f32) {
        let max_overlap = self.overlap.iter().fold(0.0_f32, |acc, &x| acc.max(x));
        let max_active = self.active.iter().fold(0.0_f32, |acc, &x| acc.max(x));
        self.min_overlap.fill(min_pct_overlap * max_overlap);
        self.min_active.fill(min_pct_active * max_active);
    }

    /// Sets each column's targets to a fraction of the largest duty cycles within its neighborhood.
    ///
    /// `neighborhood(column)` must return the indices considered, the column itself included.
    pub fn update_min_local<F>(
        &mut self,
        min_pct_overlap: f32,
        min_pct_active: f32,
        neighborhood: F,
    ) where
        F: Fn(usize) -> Vec<usize>,
    {
        for column in 0..self.overlap.len() {
            let mask = neighborhood(column);
            let max_overlap = mask
                .iter()
                .map(|&n| self.overlap[n])
                .fold(0.0_f32, f32::max);
            let max_active = mask
                .iter()
                .map(|&n| self.active[n])
                .fold(0.0_f32, f32::max);
            self.min_overlap[column] = min_pct_overlap * max_overlap;
            self.min_active[column] = min_pct_active * max_active;
        }
    }

    /// Drops the columns that have never been active from `active_columns`.
    pub fn strip_never_learned(&self, active_columns: &[usize]) -> Vec<usize> {
        active_columns
            .iter()
            .copied()
            .filter(|&col| self.active[col] > 0.0)
            .collect()
    }

    /// Columns whose overlap duty cycle is below its target.
    pub fn weak_columns(&self) -> Vec<usize> {
        self.overlap
            .iter()
            .zip(&self.min_overlap)
            .enumerate()
            .filter(|(_, (&duty, &min))| duty < min)
            .map(|(col, _)| col)
            .collect()
    }
}
