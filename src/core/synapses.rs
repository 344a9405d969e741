//! A `Synapse` models a single potential connection between a column and an input bit.
//! Every synapse belongs to exactly one column and points at exactly one input bit.
//!
//! If the permanence is at or above the connection threshold, the synapse is considered "connected".
//! During learning, permanence is increased or decreased depending on whether the corresponding
//! input bit was active. Only connected synapses contribute to a column's overlap.
//!
//! The centralized `Synapses` struct is the permanence store: a pool that stores the potential
//! synapses of all columns in a single contiguous vec. Each column's synapses occupy a contiguous
//! subrange within this array, sized by the column's potential pool. Inputs outside the pool have
//! an implicit permanence of 0 and can never become connected.
//!
//! After every permanence update the column's subrange is reordered so that connected synapses
//! come first. The connected prefix is the column's connected-synapse projection used for overlaps,
//! and its length is the column's connected count.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A potential connection from a column to one input bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    /// The input bit.
    pub index: usize,

    /// Connection strength, connected once it reaches the connection threshold.
    pub permanence: f32,
}

/// Learning rates and bounds for spatial pooler permanences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermanenceOptions {
    pub inactive_decrement: f32,
    pub active_increment: f32,
    pub connected: f32,
    pub below_stimulus_increment: f32,
    pub min: f32,
    pub max: f32,
    pub trim_threshold: f32,
}

impl PermanenceOptions {
    /// Samples a permanence in `[connected, connected + active_increment / 4]`.
    #[inline]
    pub fn sample_connected<R: Rng>(&self, rng: &mut R) -> f32 {
        self.connected + rng.random::<f32>() * self.active_increment / 4.0
    }

    /// Samples a permanence in `[active_increment / 2, connected)`.
    ///
    /// Falls back to `[0, connected)` when half an increment already reaches the threshold.
    #[inline]
    pub fn sample_unconnected<R: Rng>(&self, rng: &mut R) -> f32 {
        let low = self.active_increment / 2.0;
        if low < self.connected {
            let value = low + rng.random::<f32>() * (self.connected - low);
            if value < self.connected {
                value
            } else {
                low
            }
        } else {
            self.connected * rng.random::<f32>()
        }
    }

    /// Builds a dense permanence row for the inputs flagged in `mask`.
    ///
    /// Every masked input is independently connected with probability `connected_pct`.
    /// Inputs outside the mask get a permanence of 0.
    pub fn init_permanence<R: Rng>(
        &self,
        mask: &[bool],
        connected_pct: f32,
        rng: &mut R,
    ) -> Vec<f32> {
        mask.iter()
            .map(|&in_pool| {
                if !in_pool {
                    0.0
                } else if rng.random::<f32>() < connected_pct {
                    self.sample_connected(rng)
                } else {
                    self.sample_unconnected(rng)
                }
            })
            .collect()
    }

    /// Upper bound on the number of uniform raises needed to lift any permanence from `min` to `max`.
    #[inline]
    fn raise_rounds(&self) -> usize {
        if self.below_stimulus_increment <= 0.0 {
            return 0;
        }
        ((self.max - self.min) / self.below_stimulus_increment).ceil() as usize + 1
    }
}

/// Potential pools of every column, stored back to back.
/// Column `c` owns the slots starting at `c * max_synapses_per_column`.
#[derive(Debug, Clone)]
pub struct Synapses {
    /// Backing storage, `num_columns * max_synapses_per_column` slots.
    synapses: Vec<Synapse>,

    /// The number of synapses stored for each column (its potential pool size).
    synapse_count_per_column: Vec<usize>,

    /// Length of each column's connected prefix.
    connected_synapse_count_per_column: Vec<usize>,

    /// Slots reserved per column, the largest potential pool any column can have.
    max_synapses_per_column: usize,

    /// Width of the dense views.
    num_inputs: usize,
}

impl Synapses {
    /// Creates a new synapse pool for `num_columns` columns over an input space of `num_inputs` bits,
    /// reserving room for `max_potential` synapses per column.
    pub fn new(num_columns: usize, num_inputs: usize, max_potential: usize) -> Self {
        let max_potential = max_potential.min(num_inputs);
        Self {
            synapses: vec![Synapse::default(); num_columns * max_potential],
            synapse_count_per_column: vec![0; num_columns],
            connected_synapse_count_per_column: vec![0; num_columns],
            max_synapses_per_column: max_potential,
            num_inputs,
        }
    }

    /// Initializes the potential pool of a column from the given candidate input indices
    /// (ascending), with permanences drawn by `PermanenceOptions::init_permanence`.
    pub fn init_column<R: Rng>(
        &mut self,
        column: usize,
        potential: &[usize],
        init_connected_percentage: f32,
        options: &PermanenceOptions,
        rng: &mut R,
    ) {
        let mut mask = vec![false; self.num_inputs];
        for &input_index in potential {
            mask[input_index] = true;
        }
        let dense = options.init_permanence(&mask, init_connected_percentage, rng);

        let synapses: Vec<Synapse> = potential
            .iter()
            .map(|&index| Synapse {
                index,
                permanence: dense[index],
            })
            .collect();

        self.set_column(column, &synapses, options.connected);
    }

    /// Replaces the potential pool of a column with the given synapses and recomputes its connected prefix.
    /// Permanences are stored as given, without clipping or trimming.
    pub fn set_column(&mut self, column: usize, synapses: &[Synapse], connected_threshold: f32) {
        assert!(
            synapses.len() <= self.max_synapses_per_column,
            "Attempting to insert more synapses than allowed for column {}",
            column
        );
        let column_start = column * self.max_synapses_per_column;
        self.synapses[column_start..column_start + synapses.len()].copy_from_slice(synapses);
        self.synapse_count_per_column[column] = synapses.len();
        self.sort_column(column, connected_threshold);
    }

    /// Moves the column's synapses at or above `connected_threshold` to the front and records their count.
    pub fn sort_column(&mut self, column: usize, connected_threshold: f32) {
        let range = self.col_range(column);
        let slice = &mut self.synapses[range];

        let mut pivot = 0;

        for i in 0..slice.len() {
            if slice[i].permanence >= connected_threshold {
                slice.swap(i, pivot);
                pivot += 1;
            }
        }

        self.connected_synapse_count_per_column[column] = pivot;
    }

    /// Updates permanence values in a column:
    /// - if `raise_permanences` is true, first raise values until `stimulus_threshold` synapses are connected,
    /// - then snap values at or below the trim threshold to 0 and clamp the rest to [options.min, options.max],
    /// - finally, sort the column synapses by permanence, so that connected synapses come first.
    pub fn update_column_permanences(
        &mut self,
        column: usize,
        raise_permanences: bool,
        stimulus_threshold: usize,
        options: &PermanenceOptions,
    ) {
        if raise_permanences {
            self.raise_column_permanences(column, stimulus_threshold, options);
        }

        for syn in self.column_mut(column) {
            if syn.permanence <= options.trim_threshold {
                syn.permanence = 0.0;
            } else {
                syn.permanence = syn.permanence.clamp(options.min, options.max);
            }
        }

        self.sort_column(column, options.connected);
    }

    /// Raises every potential synapse of a column by `below_stimulus_increment` until at least
    /// `stimulus_threshold` of them are ≥ `options.connected`.
    ///
    /// Permanences are clipped to [options.min, options.max] before counting. The loop stops after
    /// enough rounds to lift a synapse from `min` to `max`, so a pool smaller than the threshold terminates.
    pub fn raise_column_permanences(
        &mut self,
        column: usize,
        stimulus_threshold: usize,
        options: &PermanenceOptions,
    ) {
        let rounds = options.raise_rounds();
        let slice = self.column_mut(column);

        for syn in slice.iter_mut() {
            syn.permanence = syn.permanence.clamp(options.min, options.max);
        }

        for _ in 0..rounds {
            let connected = slice
                .iter()
                .filter(|syn| syn.permanence >= options.connected)
                .count();
            if connected >= stimulus_threshold {
                break;
            }
            for syn in slice.iter_mut() {
                syn.permanence += options.below_stimulus_increment;
            }
        }
    }

    /// Slots holding the column's potential pool.
    fn col_range(&self, column: usize) -> Range<usize> {
        let start = column * self.max_synapses_per_column;
        let end = start + self.synapse_count_per_column[column];
        start..end
    }

    /// The first `size` slots of a column.
    fn col_range_sized(&self, column: usize, size: usize) -> Range<usize> {
        let start = column * self.max_synapses_per_column;
        let end = start + size;
        start..end
    }

    /// The column's potential pool, connected synapses first.
    pub fn column(&self, col: usize) -> &[Synapse] {
        &self.synapses[self.col_range(col)]
    }

    /// Mutable view of the column's potential pool.
    ///
    /// Callers must run `update_column_permanences` or `sort_column` afterwards to refresh the connected prefix.
    pub fn column_mut(&mut self, column: usize) -> &mut [Synapse] {
        let r = self.col_range(column);
        &mut self.synapses[r]
    }

    /// The column's connected synapses.
    pub fn connected(&self, column: usize) -> &[Synapse] {
        &self.synapses
            [self.col_range_sized(column, self.connected_synapse_count_per_column[column])]
    }

    /// Total number of synapse slots reserved across all columns.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.synapses.len()
    }

    /// Number of connected synapses of the given column.
    #[inline]
    pub fn connected_count(&self, column: usize) -> usize {
        self.connected_synapse_count_per_column[column]
    }

    /// Input indices of the column's potential pool, ascending.
    pub fn potential_pool(&self, column: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = self.column(column).iter().map(|syn| syn.index).collect();
        pool.sort_unstable();
        pool
    }

    /// Dense permanence row of a column, one value per input (0 outside the potential pool).
    pub fn dense_permanences(&self, column: usize) -> Vec<f32> {
        let mut dense = vec![0.0; self.num_inputs];
        for syn in self.column(column) {
            dense[syn.index] = syn.permanence;
        }
        dense
    }

    /// Dense connected bitmap of a column, one flag per input.
    pub fn dense_connected(&self, column: usize) -> Vec<bool> {
        let mut dense = vec![false; self.num_inputs];
        for syn in self.connected(column) {
            dense[syn.index] = true;
        }
        dense
    }
}
