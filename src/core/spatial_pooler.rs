//! The `SpatialPooler` maps a binary input vector onto a sparse set of active columns:
//! - Every column owns a potential pool, a random sample of the inputs around its center.
//! - A column's overlap is the number of its connected synapses whose input bit is set.
//! - Inhibition lets only the best columns (globally or per neighborhood) become active.
//! - Learning reinforces the synapses of active columns toward the inputs they saw.
//!
//! Over time similar inputs end up on similar column sets, i.e. the output is an SDR of the input.
//!
//! Boosting keeps every column in play:
//! - A column whose active duty cycle falls below its target gets its overlap multiplied by a boost factor,
//!   growing linearly from 1 (at the target) to `max_boost` (never active).
//! - A column whose overlap duty cycle falls below its target gets all of its potential permanences bumped,
//!   since it rarely wins and therefore rarely receives input-dependent reinforcement.

use super::{
    duty_cycle::DutyCycles,
    inhibition::{inhibit_columns_global, inhibit_columns_local},
    synapses::{PermanenceOptions, Synapses},
    topology::Topology,
};
use crate::error::{HtmError, Result};
use rand::{rngs::StdRng, seq::IteratorRandom, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration of a [`SpatialPooler`], validated by [`SpatialPooler::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoolerParams {
    /// The shape (dimensions) of the input space.
    pub input_dimensions: Vec<usize>,

    /// The shape (dimensions) of the column grid. Must have as many axes as the input space.
    pub column_dimensions: Vec<usize>,

    /// Radius (in input space) around a column's center from which potential synapses are drawn.
    pub potential_radius: usize,

    /// Fraction of the inputs within `potential_radius` that become potential synapses.
    pub potential_pct: f32,

    /// If true, the winners are picked across all columns, ignoring topology.
    pub global_inhibition: bool,

    /// Target fraction of active columns within an inhibition area. Values ≤ 0 select
    /// `num_active_columns_per_inh_area` instead.
    pub local_area_density: f32,

    /// Target number of active columns within an inhibition area, used when `local_area_density` ≤ 0.
    pub num_active_columns_per_inh_area: usize,

    /// Minimum number of connected synapses a column keeps (enforced by raising its permanences).
    pub stimulus_threshold: usize,

    pub syn_perm_inactive_dec: f32,
    pub syn_perm_active_inc: f32,
    pub syn_perm_connected: f32,
    pub syn_perm_below_stimulus_inc: f32,
    pub syn_perm_trim_threshold: f32,
    pub syn_perm_min: f32,
    pub syn_perm_max: f32,

    /// Probability of a potential synapse starting out connected.
    pub init_connected_pct: f32,

    /// Fraction of the best overlap duty cycle a column must reach before its permanences get bumped.
    pub min_pct_overlap_duty_cycles: f32,

    /// Fraction of the best active duty cycle a column must reach before it gets boosted.
    pub min_pct_active_duty_cycles: f32,

    /// The time window over which overlap and active duty cycles are averaged.
    pub duty_cycle_period: u32,

    /// The boost factor applied to a column that is never active.
    pub max_boost: f32,

    /// How often (in iterations) the inhibition radius, minimum duty cycles and boost factors are recomputed.
    pub update_period: u32,

    /// If true, potential pools "wrap around" the edges of the input space.
    pub wrap_around: bool,

    /// Seed for the pseudo-random number generator used at initialization.
    pub seed: u64,

    /// Logging verbosity, 0 is silent.
    pub verbosity: u8,
}

impl Default for SpatialPoolerParams {
    fn default() -> Self {
        Self {
            input_dimensions: vec![32, 32],
            column_dimensions: vec![64, 64],
            potential_radius: 16,
            potential_pct: 0.5,
            global_inhibition: true,
            local_area_density: 0.02,
            num_active_columns_per_inh_area: 10,
            stimulus_threshold: 0,
            syn_perm_inactive_dec: 0.008,
            syn_perm_active_inc: 0.05,
            syn_perm_connected: 0.10,
            syn_perm_below_stimulus_inc: 0.10 / 10.0,
            syn_perm_trim_threshold: 0.05 / 2.0,
            syn_perm_min: 0.0,
            syn_perm_max: 1.0,
            init_connected_pct: 0.5,
            min_pct_overlap_duty_cycles: 0.001,
            min_pct_active_duty_cycles: 0.001,
            duty_cycle_period: 1000,
            max_boost: 10.0,
            update_period: 50,
            wrap_around: true,
            seed: 42,
            verbosity: 0,
        }
    }
}

fn invalid(name: &'static str, message: impl Into<String>) -> HtmError {
    HtmError::InvalidParameter {
        name,
        message: message.into(),
    }
}

fn check_fraction(name: &'static str, value: f32, allow_zero: bool) -> Result<()> {
    let low_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if low_ok && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("{value} is not a fraction")))
    }
}

impl SpatialPoolerParams {
    /// Checks every parameter, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.input_dimensions.is_empty() || self.column_dimensions.is_empty() {
            return Err(HtmError::InvalidDimensions(
                "input and column dimensions must not be empty".into(),
            ));
        }
        if self.input_dimensions.len() != self.column_dimensions.len() {
            return Err(HtmError::InvalidDimensions(format!(
                "input dimensions {:?} and column dimensions {:?} differ in length",
                self.input_dimensions, self.column_dimensions
            )));
        }
        if self.input_dimensions.contains(&0) || self.column_dimensions.contains(&0) {
            return Err(HtmError::InvalidDimensions(format!(
                "zero-sized axis in {:?} / {:?}",
                self.input_dimensions, self.column_dimensions
            )));
        }
        if self.potential_radius == 0 {
            return Err(invalid("potential_radius", "must be positive"));
        }
        check_fraction("potential_pct", self.potential_pct, false)?;
        if self.local_area_density > 0.0 {
            check_fraction("local_area_density", self.local_area_density, false)?;
        } else if self.num_active_columns_per_inh_area == 0 {
            return Err(invalid(
                "num_active_columns_per_inh_area",
                "must be positive when local_area_density is not set",
            ));
        }
        if self.syn_perm_min >= self.syn_perm_max {
            return Err(invalid("syn_perm_min", "must be below syn_perm_max"));
        }
        if self.syn_perm_connected < self.syn_perm_min
            || self.syn_perm_connected > self.syn_perm_max
        {
            return Err(invalid(
                "syn_perm_connected",
                "must lie within [syn_perm_min, syn_perm_max]",
            ));
        }
        for (name, value) in [
            ("syn_perm_inactive_dec", self.syn_perm_inactive_dec),
            ("syn_perm_active_inc", self.syn_perm_active_inc),
            ("syn_perm_below_stimulus_inc", self.syn_perm_below_stimulus_inc),
            ("syn_perm_trim_threshold", self.syn_perm_trim_threshold),
        ] {
            if value < 0.0 {
                return Err(invalid(name, format!("{value} is negative")));
            }
        }
        check_fraction("init_connected_pct", self.init_connected_pct, true)?;
        check_fraction("min_pct_overlap_duty_cycles", self.min_pct_overlap_duty_cycles, true)?;
        check_fraction("min_pct_active_duty_cycles", self.min_pct_active_duty_cycles, true)?;
        if self.duty_cycle_period == 0 {
            return Err(invalid("duty_cycle_period", "must be positive"));
        }
        if self.update_period == 0 {
            return Err(invalid("update_period", "must be positive"));
        }
        if self.max_boost < 1.0 {
            return Err(invalid("max_boost", "must be at least 1"));
        }
        Ok(())
    }

    /// The permanence-related subset of the parameters.
    pub fn permanence_options(&self) -> PermanenceOptions {
        PermanenceOptions {
            inactive_decrement: self.syn_perm_inactive_dec,
            active_increment: self.syn_perm_active_inc,
            connected: self.syn_perm_connected,
            below_stimulus_increment: self.syn_perm_below_stimulus_inc,
            min: self.syn_perm_min,
            max: self.syn_perm_max,
            trim_threshold: self.syn_perm_trim_threshold,
        }
    }

    /// Potential pool size for a neighborhood of `input_size` inputs, rounded to nearest.
    #[inline]
    pub fn potential_synapses(&self, input_size: usize) -> usize {
        ((input_size as f32 * self.potential_pct) + 0.5) as usize
    }
}

/// Boost factor of a column: 1 at or above its target active duty cycle (or without a target),
/// `max_boost` when it was never active, linear in between.
#[inline]
pub fn boost_factor(active_duty_cycle: f32, min_active_duty_cycle: f32, max_boost: f32) -> f32 {
    if min_active_duty_cycle <= 0.0 || active_duty_cycle >= min_active_duty_cycle {
        1.0
    } else {
        ((1.0 - max_boost) / min_active_duty_cycle) * active_duty_cycle + max_boost
    }
}

/// Average ratio of column-lattice size to input-lattice size per axis.
/// The shorter dimension vector is padded with 1s.
pub fn avg_columns_per_input(column_dimensions: &[usize], input_dimensions: &[usize]) -> f32 {
    let num_dims = column_dimensions.len().max(input_dimensions.len());
    if num_dims == 0 {
        return 0.0;
    }
    let ratios: f32 = (0..num_dims)
        .map(|dim| {
            let columns = column_dimensions.get(dim).copied().unwrap_or(1) as f32;
            let inputs = input_dimensions.get(dim).copied().unwrap_or(1) as f32;
            columns / inputs
        })
        .sum();
    ratios / num_dims as f32
}

/// Columns, their permanences and duty cycles, and the state of the last `compute`.
pub struct SpatialPooler {
    /// Seeded from `params.seed`, used to sample potential pools and initial permanences.
    pub rand: StdRng,

    /// Calls to `compute`, learning or not.
    pub iteration_num: u32,

    /// Calls to `compute` with learning.
    pub iteration_learn_num: u32,

    params: SpatialPoolerParams,

    /// Permanence view of `params`.
    pub synapse_permanence_options: PermanenceOptions,

    /// Product of the input dimensions.
    pub num_inputs: usize,

    /// Product of the column dimensions.
    pub num_columns: usize,

    /// Maps 1D column indices to the nD column space.
    pub column_topology: Topology,

    /// Maps 1D input indices to the nD input space.
    pub input_topology: Topology,

    /// The permanence store. Stores a contiguous block of potential synapses for every column in one big array.
    pub synapses: Synapses,

    /// Overlap and active duty cycles plus their per-column targets.
    pub duty_cycles: DutyCycles,

    /// A multiplier applied to a column's overlap if it is underactive.
    pub boost_factors: Vec<f32>,

    /// How many connected synapses map to active input bits for each column, this iteration.
    pub overlaps: Vec<u32>,

    /// Overlaps after boosting, the scores inhibition competes on.
    pub boosted_overlaps: Vec<f32>,

    /// Neighborhood radius (in column space) used by local inhibition.
    pub inhibition_radius: usize,

    /// The indices of columns that won the inhibition process this iteration, ascending.
    pub active_columns: Vec<usize>,
}

impl SpatialPooler {
    /// Creates a new `SpatialPooler`:
    /// - Validates the parameters.
    /// - Samples each column's potential pool and initial permanences.
    /// - Computes the initial inhibition radius.
    pub fn new(params: SpatialPoolerParams) -> Result<Self> {
        params.validate()?;

        let num_columns = params.column_dimensions.iter().product();
        let num_inputs = params.input_dimensions.iter().product();
        let column_topology = Topology::new(&params.column_dimensions);
        let input_topology = Topology::new(&params.input_dimensions);
        let max_potential = params
            .potential_synapses(input_topology.max_neighborhood_size(params.potential_radius));

        let mut sp = Self {
            rand: StdRng::seed_from_u64(params.seed),
            iteration_num: 0,
            iteration_learn_num: 0,
            synapse_permanence_options: params.permanence_options(),
            num_inputs,
            num_columns,
            column_topology,
            input_topology,
            synapses: Synapses::new(num_columns, num_inputs, max_potential),
            duty_cycles: DutyCycles::new(num_columns),
            boost_factors: vec![1.0; num_columns],
            overlaps: vec![0; num_columns],
            boosted_overlaps: vec![0.0; num_columns],
            inhibition_radius: 0,
            active_columns: Vec::with_capacity(num_columns),
            params,
        };

        sp.connect_and_configure_inputs();
        sp.update_inhibition_radius();

        if sp.params.verbosity >= 1 {
            log::debug!(
                "[SP] {} columns over {} inputs, {} inhibition, radius {}",
                sp.num_columns,
                sp.num_inputs,
                if sp.params.global_inhibition { "global" } else { "local" },
                sp.inhibition_radius
            );
        }

        Ok(sp)
    }

    /// The validated parameters this pooler was built from.
    #[inline]
    pub fn params(&self) -> &SpatialPoolerParams {
        &self.params
    }

    /// Processes the current `input`:
    /// - Updates iteration counters.
    /// - Calculates overlaps between columns and the input.
    /// - Applies boosting if learning is enabled.
    /// - Performs inhibition to pick the active columns.
    ///
    /// If learning is enabled:
    /// - Adapts synapse permanences of the active columns.
    /// - Bumps up weak columns.
    /// - Updates duty cycles.
    /// - On update rounds, recomputes the inhibition radius, minimum duty cycles and boost factors.
    ///
    /// Without learning, columns that have never been active are stripped from the result.
    pub fn compute(&mut self, input: &[bool], learn: bool) -> Result<&[usize]> {
        if input.len() != self.num_inputs {
            return Err(HtmError::InputSizeMismatch {
                expected: self.num_inputs,
                actual: input.len(),
            });
        }

        self.update_iteration_number(learn);
        self.overlaps = self.calculate_overlap(input);
        self.boost(learn);
        let mut active = self.inhibit_columns(&self.boosted_overlaps);

        if learn {
            self.adapt_synapses(input, &active);
            self.bump_up_weak_columns();
            self.update_duty_cycles(&active);
            if self.is_update_round() {
                self.update_inhibition_radius();
                self.update_min_duty_cycles();
                self.update_boost_factors();
            }
        } else {
            active = self.duty_cycles.strip_never_learned(&active);
        }

        self.active_columns = active;
        Ok(&self.active_columns)
    }

    /// Counts one more iteration, and one more learning iteration if `learn`.
    #[inline]
    pub fn update_iteration_number(&mut self, learn: bool) {
        self.iteration_num += 1;
        if learn {
            self.iteration_learn_num += 1;
        }
    }

    /// True on iterations where the periodic recomputations run.
    #[inline]
    pub fn is_update_round(&self) -> bool {
        self.iteration_num % self.params.update_period == 0
    }

    /// Calculates the raw overlap for each column with the given input:
    /// the number of connected synapses whose input bit is set.
    pub fn calculate_overlap(&self, input: &[bool]) -> Vec<u32> {
        (0..self.num_columns)
            .map(|col| {
                self.synapses
                    .connected(col)
                    .iter()
                    .filter(|syn| input[syn.index])
                    .count() as u32
            })
            .collect()
    }

    /// Overlap of each column as a fraction of its connected synapses (0 without connected synapses).
    pub fn calculate_overlap_pct(&self, overlaps: &[u32]) -> Vec<f32> {
        overlaps
            .iter()
            .enumerate()
            .map(|(col, &overlap)| match self.synapses.connected_count(col) {
                0 => 0.0,
                connected => overlap as f32 / connected as f32,
            })
            .collect()
    }

    /// Multiplies each column's overlap by its boost factor (only when learning) into `boosted_overlaps`.
    pub fn boost(&mut self, learn: bool) {
        for ((boosted, &overlap), &boost) in self
            .boosted_overlaps
            .iter_mut()
            .zip(&self.overlaps)
            .zip(&self.boost_factors)
        {
            *boosted = if learn {
                overlap as f32 * boost
            } else {
                overlap as f32
            };
        }
    }

    /// Target density of active columns within an inhibition area.
    pub fn inhibition_density(&self) -> f32 {
        if self.params.local_area_density > 0.0 {
            return self.params.local_area_density;
        }
        let diameter = 2 * self.inhibition_radius + 1;
        let area = (0..self.column_topology.dimensions().len())
            .fold(1usize, |acc, _| acc.saturating_mul(diameter))
            .min(self.num_columns);
        (self.params.num_active_columns_per_inh_area as f32 / area as f32).min(0.5)
    }

    /// Selects the active columns from the given overlaps, globally or within local neighborhoods.
    pub fn inhibit_columns(&self, overlaps: &[f32]) -> Vec<usize> {
        let density = self.inhibition_density();
        if self.uses_global_inhibition() {
            inhibit_columns_global(overlaps, density)
        } else {
            inhibit_columns_local(overlaps, density, &self.column_topology, self.inhibition_radius)
        }
    }

    fn uses_global_inhibition(&self) -> bool {
        let max_dim = self
            .column_topology
            .dimensions()
            .iter()
            .copied()
            .max()
            .unwrap_or(0);
        self.params.global_inhibition || self.inhibition_radius > max_dim
    }

    /// Adjusts the potential synapses of each active column after an input is processed:
    /// - Increments permanence of synapses whose input bit was active.
    /// - Decrements permanence of synapses whose input bit was inactive.
    /// - Raises, trims and clips the column's permanences and refreshes its connected synapses.
    pub fn adapt_synapses(&mut self, input: &[bool], active_columns: &[usize]) {
        for &col in active_columns {
            for syn in self.synapses.column_mut(col) {
                if input[syn.index] {
                    syn.permanence += self.synapse_permanence_options.active_increment;
                } else {
                    syn.permanence -= self.synapse_permanence_options.inactive_decrement;
                }
            }
            self.synapses.update_column_permanences(
                col,
                true,
                self.params.stimulus_threshold,
                &self.synapse_permanence_options,
            );
        }
    }

    /// Increases permanence on "weak" columns whose overlap duty cycle is below its target:
    /// every potential synapse of such a column gets `below_stimulus_increment`.
    pub fn bump_up_weak_columns(&mut self) {
        for col in self.duty_cycles.weak_columns() {
            for syn in self.synapses.column_mut(col) {
                syn.permanence += self.synapse_permanence_options.below_stimulus_increment;
            }
            self.synapses.update_column_permanences(
                col,
                false,
                self.params.stimulus_threshold,
                &self.synapse_permanence_options,
            );
        }
    }

    /// Folds this iteration's overlaps and active columns into the duty cycles.
    pub fn update_duty_cycles(&mut self, active_columns: &[usize]) {
        let period = self.iteration_num.min(self.params.duty_cycle_period);
        self.duty_cycles.update(&self.overlaps, active_columns, period);
    }

    /// Recalculates each column's boost factor from its active duty cycle and target.
    pub fn update_boost_factors(&mut self) {
        let max_boost = self.params.max_boost;
        for ((boost, &active), &min) in self
            .boost_factors
            .iter_mut()
            .zip(&self.duty_cycles.active)
            .zip(&self.duty_cycles.min_active)
        {
            *boost = boost_factor(active, min, max_boost);
        }
    }

    /// Updates the minimum duty cycles, globally or per inhibition neighborhood.
    pub fn update_min_duty_cycles(&mut self) {
        let min_pct_overlap = self.params.min_pct_overlap_duty_cycles;
        let min_pct_active = self.params.min_pct_active_duty_cycles;

        if self.uses_global_inhibition() {
            self.duty_cycles
                .update_min_global(min_pct_overlap, min_pct_active);
        } else {
            let topology = &self.column_topology;
            let radius = self.inhibition_radius;
            self.duty_cycles
                .update_min_local(min_pct_overlap, min_pct_active, |col| {
                    let mut neighborhood = topology.neighbors(col, radius, false);
                    neighborhood.push(col);
                    neighborhood
                });
        }

        if self.params.verbosity >= 1 {
            log::debug!(
                "[SP] iteration {}: min duty cycles updated (max active {:.5})",
                self.iteration_num,
                self.duty_cycles.active.iter().fold(0.0_f32, |acc, &x| acc.max(x))
            );
        }
    }

    /// Updates the inhibition radius from the average connected span of the columns.
    ///
    /// With global inhibition the radius covers the largest column dimension.
    pub fn update_inhibition_radius(&mut self) {
        if self.params.global_inhibition {
            self.inhibition_radius = self
                .column_topology
                .dimensions()
                .iter()
                .copied()
                .max()
                .unwrap_or(0);
            return;
        }

        let avg_span = (0..self.num_columns)
            .map(|col| self.avg_connected_span_for_column_nd(col))
            .sum::<f32>()
            / self.num_columns as f32;
        let diameter = avg_span * self.avg_columns_per_input();
        let radius = ((diameter - 1.0) / 2.0).max(1.0);
        let radius = radius.round() as usize;

        if self.params.verbosity >= 1 && radius != self.inhibition_radius {
            log::debug!(
                "[SP] iteration {}: inhibition radius {} -> {}",
                self.iteration_num,
                self.inhibition_radius,
                radius
            );
        }
        self.inhibition_radius = radius;
    }

    /// Average, over the input axes, of the extent covered by a column's connected synapses.
    /// A column without connected synapses has a span of 0.
    pub fn avg_connected_span_for_column_nd(&self, column: usize) -> f32 {
        let connected = self.synapses.connected(column);
        if connected.is_empty() {
            return 0.0;
        }

        let num_dims = self.input_topology.dimensions().len();
        let mut min_coord = vec![usize::MAX; num_dims];
        let mut max_coord = vec![0usize; num_dims];

        for syn in connected {
            for (dim, coord) in self.input_topology.coordinates(syn.index).into_iter().enumerate() {
                min_coord[dim] = min_coord[dim].min(coord);
                max_coord[dim] = max_coord[dim].max(coord);
            }
        }

        let total: usize = max_coord
            .iter()
            .zip(&min_coord)
            .map(|(&max, &min)| max - min + 1)
            .sum();
        total as f32 / num_dims as f32
    }

    /// Average ratio of columns to inputs per axis.
    #[inline]
    pub fn avg_columns_per_input(&self) -> f32 {
        avg_columns_per_input(
            self.column_topology.dimensions(),
            self.input_topology.dimensions(),
        )
    }

    /// Establishes each column's potential pool and initial permanences, then raises every column
    /// to the stimulus threshold and refreshes its connected synapses.
    fn connect_and_configure_inputs(&mut self) {
        for column in 0..self.num_columns {
            let potential = self.map_potential(column);
            self.synapses.init_column(
                column,
                &potential,
                self.params.init_connected_pct,
                &self.synapse_permanence_options,
                &mut self.rand,
            );
            self.synapses.update_column_permanences(
                column,
                true,
                self.params.stimulus_threshold,
                &self.synapse_permanence_options,
            );
        }
    }

    /// Samples which input bits fall within a column's potential radius:
    /// - Finds the column's center input with `map_column()`.
    /// - Gathers all input indices within the potential radius from that center (center included).
    /// - Randomly selects `potential_pct` of them as potential synapses.
    pub fn map_potential(&mut self, column: usize) -> Vec<usize> {
        let center = self.map_column(column);
        let neighborhood = self.input_topology.neighborhood(
            center,
            self.params.potential_radius,
            self.params.wrap_around,
        );
        let size = self.potential_synapses(neighborhood.len());
        let mut sample = neighborhood
            .into_iter()
            .choose_multiple(&mut self.rand, size);
        sample.sort_unstable();
        sample
    }

    /// Potential pool size for a neighborhood of `input_size` inputs, rounded to nearest.
    #[inline]
    pub fn potential_synapses(&self, input_size: usize) -> usize {
        self.params.potential_synapses(input_size)
    }

    /// The input a column is centered on: each column coordinate is scaled onto the input
    /// axis, shifted by half an input cell and clamped to the axis.
    pub fn map_column(&self, column: usize) -> usize {
        let coords: Vec<usize> = self
            .column_topology
            .coordinates(column)
            .into_iter()
            .zip(self.column_topology.dimensions())
            .zip(self.input_topology.dimensions())
            .map(|((index, &col_dim), &in_dim)| {
                let new_index = ((index as f32 / col_dim as f32) * in_dim as f32
                    + (in_dim as f32 / col_dim as f32) * 0.5) as usize;
                new_index.min(in_dim - 1)
            })
            .collect();
        self.input_topology.index_from_coordinates(&coords)
    }

    /// Dense permanence row of a column, one value per input.
    pub fn permanences(&self, column: usize) -> Vec<f32> {
        self.synapses.dense_permanences(column)
    }

    /// Input indices of a column's potential pool, ascending.
    pub fn potential_pool(&self, column: usize) -> Vec<usize> {
        self.synapses.potential_pool(column)
    }

    /// Number of connected synapses of every column.
    pub fn connected_counts(&self) -> Vec<usize> {
        (0..self.num_columns)
            .map(|col| self.synapses.connected_count(col))
            .collect()
    }
}
