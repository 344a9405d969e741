//! A `Segment` is a dendritic segment of a temporal-layer cell: an ordered list of
//! permanence-weighted synapses from other cells, plus the bookkeeping that tells the
//! temporal layer how useful the segment has been.
//!
//! The temporal state machine that creates, activates and destroys segments lives outside
//! this crate. It owns a [`SegmentContext`] (learning-iteration counter, segment id allocator,
//! parameters) and hands it by reference to every segment operation that needs it.
//!
//! Learning on a segment happens in two steps:
//! - [`SegmentContext::get_segment_active_synapses`] inspects a segment against the current
//!   cell activity and produces a [`SegmentUpdate`] proposal, optionally extended with new
//!   synapses picked by a [`CellSelector`].
//! - The caller later commits (or drops) the proposal through [`Segment::update_synapses`],
//!   [`Segment::add_synapse`] and [`Segment::free_n_synapses`].

use super::duty_cycle::{self, tiered_duty_cycle};
use crate::error::{HtmError, Result};
use fxhash::FxHashSet;
use rand::{rngs::StdRng, seq::IteratorRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a cell by its column and its index within that column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub column: usize,
    pub cell: usize,
}

impl CellAddress {
    #[inline]
    pub fn new(column: usize, cell: usize) -> Self {
        Self { column, cell }
    }
}

/// A synapse on a segment, originating from the cell `source`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSynapse {
    pub source: CellAddress,

    /// Connection strength in `[0, permanence_max]`.
    pub permanence: f64,
}

/// Configuration of the segment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Upper bound for synapse permanences.
    pub permanence_max: f64,

    /// Number of active synapses a learning segment aims for.
    pub new_synapse_count: usize,

    /// Logging verbosity, 0 is silent.
    pub verbosity: u8,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            permanence_max: 1.0,
            new_synapse_count: 15,
            verbosity: 0,
        }
    }
}

/// Temporal state shared by all segments of a temporal layer.
///
/// Owned by the temporal layer, segments only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentContext {
    /// Number of learning iterations performed by the temporal layer.
    pub learning_iteration: u32,

    next_segment_id: u64,

    pub params: SegmentParams,
}

impl SegmentContext {
    pub fn new(params: SegmentParams) -> Self {
        Self {
            learning_iteration: 0,
            next_segment_id: 0,
            params,
        }
    }

    /// Hands out a process-unique segment id.
    #[inline]
    pub fn allocate_segment_id(&mut self) -> u64 {
        let id = self.next_segment_id;
        self.next_segment_id += 1;
        id
    }

    #[inline]
    pub fn advance_learning_iteration(&mut self) {
        self.learning_iteration += 1;
    }

    /// True on the last learning iteration an averaging rate governs (100, 319, 999, ...).
    /// Every segment's duty cycle must be refreshed on such iterations.
    #[inline]
    pub fn is_tier_boundary(&self) -> bool {
        duty_cycle::is_tier_boundary(self.learning_iteration)
    }

    /// Builds the update proposal for the segment `segment` of cell `cell` in column `column`:
    /// - Collects the synapses of the segment whose source cell is active in `active_state`.
    ///   A missing segment has no synapses.
    /// - With `new_synapses`, asks `selector` for `new_synapse_count - active` more source cells
    ///   and appends them as new synapses.
    ///
    /// The segment itself is left untouched.
    pub fn get_segment_active_synapses<A, S>(
        &self,
        column: usize,
        cell: usize,
        segment: Option<&Segment>,
        active_state: &A,
        new_synapses: bool,
        selector: &mut S,
    ) -> SegmentUpdate
    where
        A: ActiveState,
        S: CellSelector + ?Sized,
    {
        if self.params.verbosity >= 5 {
            log::trace!(
                "[Segment] active synapses for ({column}, {cell}) in {:?}, new: {new_synapses}",
                segment.map(Segment::id)
            );
        }

        let mut active_synapses: Vec<ActiveSynapse> = segment
            .map(|seg| {
                seg.synapses
                    .iter()
                    .enumerate()
                    .filter(|(_, syn)| active_state.is_active(syn.source.column, syn.source.cell))
                    .map(|(index, _)| ActiveSynapse::Existing { index })
                    .collect()
            })
            .unwrap_or_default();

        if new_synapses {
            let count = self
                .params
                .new_synapse_count
                .saturating_sub(active_synapses.len());
            if count > 0 {
                active_synapses.extend(
                    selector
                        .choose_cells_to_learn_from(segment, count, active_state)
                        .into_iter()
                        .map(|source| ActiveSynapse::New { source }),
                );
            }
        }

        SegmentUpdate {
            column_idx: column,
            cell_idx: cell,
            segment: segment.map(Segment::id),
            active_synapses,
        }
    }
}

/// An entry of a [`SegmentUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveSynapse {
    /// An existing synapse of the segment, by position.
    Existing { index: usize },

    /// A synapse to create from `source`.
    New { source: CellAddress },
}

impl ActiveSynapse {
    #[inline]
    pub fn is_new(&self) -> bool {
        matches!(self, ActiveSynapse::New { .. })
    }
}

/// A proposed change to a segment, produced fresh by [`SegmentContext::get_segment_active_synapses`].
/// Nothing is applied until the caller commits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentUpdate {
    pub column_idx: usize,
    pub cell_idx: usize,

    /// Id of the segment the proposal targets, `None` for a segment yet to be created.
    pub segment: Option<u64>,

    pub active_synapses: Vec<ActiveSynapse>,
}

/// Lookup of whether a cell is currently active.
pub trait ActiveState {
    fn is_active(&self, column: usize, cell: usize) -> bool;
}

/// Dense activity bitmap over `num_columns * cells_per_column` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellActivity {
    cells_per_column: usize,
    bits: Vec<bool>,
}

impl CellActivity {
    pub fn new(num_columns: usize, cells_per_column: usize) -> Self {
        Self {
            cells_per_column,
            bits: vec![false; num_columns * cells_per_column],
        }
    }

    /// Sets a cell's state. Cells outside the bitmap are ignored.
    pub fn set(&mut self, column: usize, cell: usize, active: bool) {
        if cell >= self.cells_per_column {
            return;
        }
        if let Some(bit) = self.bits.get_mut(column * self.cells_per_column + cell) {
            *bit = active;
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Active cells in ascending (column, cell) order.
    pub fn active_cells(&self) -> Vec<CellAddress> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit)
            .map(|(i, _)| CellAddress::new(i / self.cells_per_column, i % self.cells_per_column))
            .collect()
    }
}

impl ActiveState for CellActivity {
    #[inline]
    fn is_active(&self, column: usize, cell: usize) -> bool {
        cell < self.cells_per_column
            && self
                .bits
                .get(column * self.cells_per_column + cell)
                .copied()
                .unwrap_or(false)
    }
}

impl ActiveState for FxHashSet<CellAddress> {
    #[inline]
    fn is_active(&self, column: usize, cell: usize) -> bool {
        self.contains(&CellAddress::new(column, cell))
    }
}

/// Policy that picks the source cells of new synapses.
pub trait CellSelector {
    /// Returns up to `count` source cells for new synapses on `segment`.
    fn choose_cells_to_learn_from(
        &mut self,
        segment: Option<&Segment>,
        count: usize,
        active_state: &dyn ActiveState,
    ) -> Vec<CellAddress>;
}

/// Samples new synapse sources uniformly from the current learning cells,
/// skipping cells the segment is already connected to.
pub struct RandomLearningCells {
    rng: StdRng,
    learning_cells: Vec<CellAddress>,
}

impl RandomLearningCells {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            learning_cells: Vec::new(),
        }
    }

    /// Replaces the set of cells new synapses may be grown from.
    pub fn set_learning_cells<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = CellAddress>,
    {
        self.learning_cells = cells.into_iter().collect();
        self.learning_cells.sort_unstable();
        self.learning_cells.dedup();
    }

    pub fn learning_cells(&self) -> &[CellAddress] {
        &self.learning_cells
    }
}

impl CellSelector for RandomLearningCells {
    fn choose_cells_to_learn_from(
        &mut self,
        segment: Option<&Segment>,
        count: usize,
        _active_state: &dyn ActiveState,
    ) -> Vec<CellAddress> {
        let existing: FxHashSet<CellAddress> = segment
            .map(|seg| seg.synapses.iter().map(|syn| syn.source).collect())
            .unwrap_or_default();

        let mut chosen = self
            .learning_cells
            .iter()
            .copied()
            .filter(|cell| !existing.contains(cell))
            .choose_multiple(&mut self.rng, count);
        chosen.sort_unstable();
        chosen
    }
}

/// A segment and its synapses. See the module docs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    id: u64,
    is_sequence_segment: bool,
    last_active_iteration: u32,
    positive_activations: u32,
    total_activations: u32,
    last_pos_duty_cycle: f64,
    last_pos_duty_cycle_iteration: u32,
    synapses: Vec<CellSynapse>,
}

impl Segment {
    /// Creates an empty segment born active at the context's learning iteration.
    pub fn new(ctx: &mut SegmentContext, is_sequence_segment: bool) -> Self {
        let iteration = ctx.learning_iteration;
        Self {
            id: ctx.allocate_segment_id(),
            is_sequence_segment,
            last_active_iteration: iteration,
            positive_activations: 1,
            total_activations: 1,
            last_pos_duty_cycle: 1.0 / f64::from(iteration.max(1)),
            last_pos_duty_cycle_iteration: iteration,
            synapses: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn is_sequence_segment(&self) -> bool {
        self.is_sequence_segment
    }

    #[inline]
    pub fn last_active_iteration(&self) -> u32 {
        self.last_active_iteration
    }

    #[inline]
    pub fn positive_activations(&self) -> u32 {
        self.positive_activations
    }

    #[inline]
    pub fn total_activations(&self) -> u32 {
        self.total_activations
    }

    #[inline]
    pub fn synapses(&self) -> &[CellSynapse] {
        &self.synapses
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.synapses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.synapses.is_empty()
    }

    /// Iterations since the segment was last active.
    #[inline]
    pub fn age(&self, ctx: &SegmentContext) -> u32 {
        ctx.learning_iteration.saturating_sub(self.last_active_iteration)
    }

    /// Appends a synapse. Callers must not add a second synapse from the same cell.
    pub fn add_synapse(&mut self, column: usize, cell: usize, permanence: f64) {
        self.synapses.push(CellSynapse {
            source: CellAddress::new(column, cell),
            permanence,
        });
    }

    /// Adds `delta` to the permanence of every synapse listed in `indices`.
    ///
    /// - Positive deltas cap permanences at `permanence_max`.
    /// - Other deltas floor permanences at 0; the result is true if any synapse reached 0.
    ///
    /// All indices are checked before anything changes.
    pub fn update_synapses(
        &mut self,
        ctx: &SegmentContext,
        indices: &[usize],
        delta: f64,
    ) -> Result<bool> {
        self.check_indices(indices)?;

        let mut hit_zero = false;
        for &index in indices {
            let syn = &mut self.synapses[index];
            syn.permanence += delta;
            if delta > 0.0 {
                if syn.permanence > ctx.params.permanence_max {
                    syn.permanence = ctx.params.permanence_max;
                }
            } else if syn.permanence <= 0.0 {
                syn.permanence = 0.0;
                hit_zero = true;
            }
        }

        Ok(hit_zero)
    }

    /// Frees exactly `num_to_free` synapses to make room for new ones.
    ///
    /// Synapses listed in `inactive_indices` go first, lowest permanence first. If there are
    /// not enough of them, the remaining (active) synapses are freed the same way.
    /// Equal permanences are freed in index order. Survivors keep their relative order.
    pub fn free_n_synapses(
        &mut self,
        ctx: &SegmentContext,
        num_to_free: usize,
        inactive_indices: &[usize],
    ) -> Result<()> {
        if num_to_free > self.synapses.len() {
            return Err(HtmError::TooManySynapsesToFree {
                requested: num_to_free,
                available: self.synapses.len(),
            });
        }
        self.check_indices(inactive_indices)?;

        if ctx.params.verbosity >= 5 {
            log::trace!(
                "[Segment] free_n_synapses num_to_free={num_to_free} inactive={inactive_indices:?}"
            );
        }

        let mut is_inactive = vec![false; self.synapses.len()];
        for &index in inactive_indices {
            is_inactive[index] = true;
        }

        let mut inactive: Vec<usize> = (0..self.synapses.len())
            .filter(|&i| is_inactive[i])
            .collect();
        self.sort_by_permanence(&mut inactive);
        inactive.truncate(num_to_free);
        let mut candidates = inactive;

        if candidates.len() < num_to_free {
            let mut active: Vec<usize> = (0..self.synapses.len())
                .filter(|&i| !is_inactive[i])
                .collect();
            self.sort_by_permanence(&mut active);
            candidates.extend(active.into_iter().take(num_to_free - candidates.len()));
        }

        if ctx.params.verbosity >= 4 {
            log::debug!(
                "[Segment] deleting {} synapses to make room: {candidates:?}",
                candidates.len()
            );
            log::debug!("[Segment] before: {}", self.display(ctx));
        }

        let mut freed = vec![false; self.synapses.len()];
        for &index in &candidates {
            freed[index] = true;
        }
        let mut position = 0;
        self.synapses.retain(|_| {
            let keep = !freed[position];
            position += 1;
            keep
        });

        if ctx.params.verbosity >= 4 {
            log::debug!("[Segment] after: {}", self.display(ctx));
        }

        Ok(())
    }

    /// Returns the positive-activation duty cycle at the context's learning iteration.
    ///
    /// `active` marks that the segment just made a good prediction. With `read_only`, the cached
    /// value is left alone. Must be called on every segment at every duty-cycle tier boundary,
    /// see [`Segment::update_duty_cycle_on_tier`].
    pub fn duty_cycle(&mut self, ctx: &SegmentContext, active: bool, read_only: bool) -> f64 {
        let duty_cycle = self.peek_duty_cycle(ctx, active);
        if !read_only {
            self.last_pos_duty_cycle = duty_cycle;
            self.last_pos_duty_cycle_iteration = ctx.learning_iteration;
        }
        duty_cycle
    }

    /// The duty cycle `duty_cycle(ctx, active, true)` would return, without a mutable borrow.
    pub fn peek_duty_cycle(&self, ctx: &SegmentContext, active: bool) -> f64 {
        tiered_duty_cycle(
            ctx.learning_iteration,
            self.positive_activations,
            self.last_pos_duty_cycle,
            self.last_pos_duty_cycle_iteration,
            active,
        )
    }

    /// Records an activation of the segment. `positive` marks a correct prediction.
    pub fn record_activation(&mut self, ctx: &SegmentContext, positive: bool) -> f64 {
        self.total_activations += 1;
        if positive {
            self.positive_activations += 1;
        }
        self.last_active_iteration = ctx.learning_iteration;
        self.duty_cycle(ctx, positive, false)
    }

    /// Refreshes the cached duty cycle when the context sits on the last iteration of a tier,
    /// so that later reads never decay across two averaging rates.
    pub fn update_duty_cycle_on_tier(&mut self, ctx: &SegmentContext) -> Option<f64> {
        ctx.is_tier_boundary()
            .then(|| self.duty_cycle(ctx, false, false))
    }

    /// Renders the segment in its debug format, e.g.
    /// `ID:54413 true 0.64801 (24/36) 101 [9,1]0.75 [10,1]0.75`:
    /// id, sequence flag, duty cycle, positive/total activations, age, then every synapse as
    /// `[column,cell]permanence`. The duty cycle is read without touching the cache.
    pub fn display<'a>(&'a self, ctx: &'a SegmentContext) -> SegmentDisplay<'a> {
        SegmentDisplay { segment: self, ctx }
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&index| index >= self.synapses.len()) {
            Some(&index) => Err(HtmError::SynapseOutOfRange {
                index,
                len: self.synapses.len(),
            }),
            None => Ok(()),
        }
    }

    /// Stable sort of synapse positions by ascending permanence.
    fn sort_by_permanence(&self, indices: &mut [usize]) {
        indices.sort_by(|&a, &b| {
            self.synapses[a]
                .permanence
                .total_cmp(&self.synapses[b].permanence)
        });
    }
}

/// Debug rendering of a [`Segment`], see [`Segment::display`].
pub struct SegmentDisplay<'a> {
    segment: &'a Segment,
    ctx: &'a SegmentContext,
}

impl fmt::Display for SegmentDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seg = self.segment;
        write!(
            f,
            "ID:{} {} {} ({}/{}) {}",
            seg.id,
            seg.is_sequence_segment,
            format_float(seg.peek_duty_cycle(self.ctx, false)),
            seg.positive_activations,
            seg.total_activations,
            seg.age(self.ctx)
        )?;
        for syn in &seg.synapses {
            write!(
                f,
                " [{},{}]{}",
                syn.source.column,
                syn.source.cell,
                format_float(syn.permanence)
            )?;
        }
        writeln!(f)
    }
}

/// Shortest round-trip rendering of a float, switching to `d.ddde±XX` for decimal
/// exponents below -4 or from 6 on.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if value != 0.0 && (exponent < -4 || exponent >= 6) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(learning_iteration: u32) -> SegmentContext {
        let mut ctx = SegmentContext::new(SegmentParams::default());
        ctx.learning_iteration = learning_iteration;
        ctx
    }

    fn segment_with(ctx: &mut SegmentContext, perms: &[f64]) -> Segment {
        let mut seg = Segment::new(ctx, false);
        for (i, &perm) in perms.iter().enumerate() {
            seg.add_synapse(i, 0, perm);
        }
        seg
    }

    fn perms(seg: &Segment) -> Vec<f64> {
        seg.synapses().iter().map(|syn| syn.permanence).collect()
    }

    /// A selector that hands out fixed cells.
    struct Fixed(Vec<CellAddress>);

    impl CellSelector for Fixed {
        fn choose_cells_to_learn_from(
            &mut self,
            _segment: Option<&Segment>,
            count: usize,
            _active_state: &dyn ActiveState,
        ) -> Vec<CellAddress> {
            self.0.iter().copied().take(count).collect()
        }
    }

    #[test]
    fn test_new_segment() {
        let mut ctx = context(0);
        let first = Segment::new(&mut ctx, true);
        assert_eq!(first.id(), 0);
        assert!(first.is_sequence_segment());
        assert_eq!(first.positive_activations(), 1);
        assert_eq!(first.total_activations(), 1);
        assert_eq!(first.peek_duty_cycle(&ctx, false), 1.0);
        assert!(first.is_empty());

        ctx.learning_iteration = 40;
        let second = Segment::new(&mut ctx, false);
        assert_eq!(second.id(), 1);
        assert_eq!(second.last_active_iteration(), 40);
        assert_eq!(second.last_pos_duty_cycle, 1.0 / 40.0);
        assert_ne!(first, second);
    }

    #[test]
    fn test_update_synapses() -> anyhow::Result<()> {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.5, 0.95, 0.05, 0.3]);

        assert!(!seg.update_synapses(&ctx, &[0, 1], 0.1)?);
        assert_eq!(perms(&seg), vec![0.6, 1.0, 0.05, 0.3]);

        assert!(seg.update_synapses(&ctx, &[2, 3], -0.05)?);
        assert_eq!(seg.synapses()[2].permanence, 0.0);
        assert!((seg.synapses()[3].permanence - 0.25).abs() < 1e-12);

        assert!(!seg.update_synapses(&ctx, &[3], -0.1)?);
        assert!(!seg.update_synapses(&ctx, &[], -1.0)?);
        Ok(())
    }

    #[test]
    fn test_update_synapses_out_of_range() {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.5, 0.4]);
        let result = seg.update_synapses(&ctx, &[0, 2], 0.1);
        assert_eq!(result, Err(HtmError::SynapseOutOfRange { index: 2, len: 2 }));
        assert_eq!(perms(&seg), vec![0.5, 0.4]);
    }

    #[test]
    fn test_free_inactive_synapses_first() -> anyhow::Result<()> {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.5, 0.1, 0.3, 0.2, 0.4]);

        seg.free_n_synapses(&ctx, 2, &[0, 2, 3])?;
        assert_eq!(perms(&seg), vec![0.5, 0.1, 0.4]);
        let sources: Vec<usize> = seg.synapses().iter().map(|syn| syn.source.column).collect();
        assert_eq!(sources, vec![0, 1, 4]);
        Ok(())
    }

    #[test]
    fn test_free_falls_back_to_active_synapses() -> anyhow::Result<()> {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.5, 0.1, 0.3, 0.2, 0.4]);

        seg.free_n_synapses(&ctx, 4, &[3, 1])?;
        assert_eq!(perms(&seg), vec![0.5]);

        let mut seg = segment_with(&mut ctx, &[0.5, 0.1, 0.3, 0.2, 0.4]);
        // Duplicates count once.
        seg.free_n_synapses(&ctx, 2, &[1, 1, 1])?;
        assert_eq!(perms(&seg), vec![0.5, 0.3, 0.4]);

        let mut seg = segment_with(&mut ctx, &[0.5, 0.1]);
        seg.free_n_synapses(&ctx, 2, &[])?;
        assert!(seg.is_empty());
        Ok(())
    }

    #[test]
    fn test_free_ties_in_index_order() -> anyhow::Result<()> {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.2, 0.2, 0.2, 0.2]);
        seg.free_n_synapses(&ctx, 2, &[3, 2, 1, 0])?;
        let sources: Vec<usize> = seg.synapses().iter().map(|syn| syn.source.column).collect();
        assert_eq!(sources, vec![2, 3]);
        Ok(())
    }

    #[test]
    fn test_free_too_many() {
        let mut ctx = context(1);
        let mut seg = segment_with(&mut ctx, &[0.5, 0.1]);
        assert_eq!(
            seg.free_n_synapses(&ctx, 3, &[0]),
            Err(HtmError::TooManySynapsesToFree {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(
            seg.free_n_synapses(&ctx, 1, &[5]),
            Err(HtmError::SynapseOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(seg.len(), 2);
    }

    #[test]
    fn test_duty_cycle_first_tier() {
        let mut ctx = context(1);
        let mut seg = Segment::new(&mut ctx, false);
        seg.positive_activations = 10;

        ctx.learning_iteration = 50;
        assert_eq!(seg.duty_cycle(&ctx, false, true), 0.2);
        assert_eq!(seg.last_pos_duty_cycle_iteration, 1);

        assert_eq!(seg.duty_cycle(&ctx, false, false), 0.2);
        assert_eq!(seg.last_pos_duty_cycle_iteration, 50);
        assert_eq!(seg.last_pos_duty_cycle, 0.2);
    }

    #[test]
    fn test_duty_cycle_moving_average() {
        let mut ctx = context(1);
        let mut seg = Segment::new(&mut ctx, false);

        ctx.learning_iteration = 100;
        seg.positive_activations = 50;
        assert_eq!(seg.duty_cycle(&ctx, false, false), 0.5);

        ctx.learning_iteration = 110;
        let alpha: f64 = 0.0032;
        let expected = (1.0 - alpha).powf(10.0) * 0.5 + alpha;
        assert_eq!(seg.duty_cycle(&ctx, true, true), expected);
        assert_eq!(seg.last_pos_duty_cycle, 0.5);

        let expected = (1.0 - alpha).powf(10.0) * 0.5;
        assert_eq!(seg.duty_cycle(&ctx, false, false), expected);
        // Up to date, returned as cached.
        assert_eq!(seg.duty_cycle(&ctx, false, false), expected);
    }

    #[test]
    fn test_record_activation() {
        let mut ctx = context(5);
        let mut seg = Segment::new(&mut ctx, true);

        ctx.learning_iteration = 10;
        assert_eq!(seg.record_activation(&ctx, true), 0.2);
        seg.record_activation(&ctx, false);
        assert_eq!(seg.positive_activations(), 2);
        assert_eq!(seg.total_activations(), 3);
        assert_eq!(seg.last_active_iteration(), 10);
        assert!(seg.positive_activations() <= seg.total_activations());
    }

    #[test]
    fn test_update_duty_cycle_on_tier() {
        let mut ctx = context(1);
        let mut seg = Segment::new(&mut ctx, false);

        ctx.learning_iteration = 99;
        assert_eq!(seg.update_duty_cycle_on_tier(&ctx), None);

        ctx.advance_learning_iteration();
        assert!(ctx.is_tier_boundary());
        assert_eq!(seg.update_duty_cycle_on_tier(&ctx), Some(0.01));
        assert_eq!(seg.last_pos_duty_cycle_iteration, 100);
    }

    #[test]
    fn test_tier_refresh_matches_every_iteration_refresh() {
        let mut ctx = context(1);
        let mut every = Segment::new(&mut ctx, false);
        let mut on_tier = every.clone();

        while ctx.learning_iteration < 1_200 {
            ctx.advance_learning_iteration();
            if ctx.learning_iteration % 7 == 0 {
                every.record_activation(&ctx, true);
                on_tier.record_activation(&ctx, true);
            }
            every.duty_cycle(&ctx, false, false);
            on_tier.update_duty_cycle_on_tier(&ctx);

            let expected = every.peek_duty_cycle(&ctx, false);
            let actual = on_tier.peek_duty_cycle(&ctx, false);
            assert!(
                (expected - actual).abs() <= 1e-12 * expected.max(1.0),
                "iteration {}: {expected} != {actual}",
                ctx.learning_iteration
            );
        }
        assert_eq!(on_tier.last_pos_duty_cycle_iteration, 1_197);
    }

    #[test]
    fn test_display() {
        let mut ctx = context(10);
        let mut seg = Segment::new(&mut ctx, true);
        seg.add_synapse(9, 1, 0.75);
        seg.add_synapse(10, 1, 0.75);
        seg.add_synapse(11, 2, 0.00001);

        ctx.learning_iteration = 20;
        assert_eq!(
            seg.display(&ctx).to_string(),
            "ID:0 true 0.05 (1/1) 10 [9,1]0.75 [10,1]0.75 [11,2]1e-05\n"
        );
        assert_eq!(seg.last_pos_duty_cycle, 0.1);

        let empty = Segment::new(&mut ctx, false);
        assert_eq!(empty.display(&ctx).to_string(), "ID:1 false 0.05 (1/1) 0\n");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.64801), "0.64801");
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(0.000025), "2.5e-05");
        assert_eq!(format_float(123456.0), "123456");
        assert_eq!(format_float(1234567.0), "1.234567e+06");
        assert_eq!(format_float(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_float(f64::NAN), "NaN");
        assert_eq!(format_float(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_get_segment_active_synapses() {
        let mut ctx = context(1);
        ctx.params.new_synapse_count = 4;
        let mut seg = Segment::new(&mut ctx, false);
        seg.add_synapse(0, 1, 0.5);
        seg.add_synapse(3, 0, 0.5);
        seg.add_synapse(7, 2, 0.5);

        let mut activity = CellActivity::new(10, 3);
        activity.set(0, 1, true);
        activity.set(7, 2, true);

        let mut selector = Fixed(vec![
            CellAddress::new(4, 0),
            CellAddress::new(5, 1),
            CellAddress::new(6, 2),
        ]);

        let update =
            ctx.get_segment_active_synapses(2, 1, Some(&seg), &activity, false, &mut selector);
        assert_eq!(update.column_idx, 2);
        assert_eq!(update.cell_idx, 1);
        assert_eq!(update.segment, Some(seg.id()));
        assert_eq!(
            update.active_synapses,
            vec![ActiveSynapse::Existing { index: 0 }, ActiveSynapse::Existing { index: 2 }]
        );

        let update =
            ctx.get_segment_active_synapses(2, 1, Some(&seg), &activity, true, &mut selector);
        assert_eq!(
            update.active_synapses,
            vec![
                ActiveSynapse::Existing { index: 0 },
                ActiveSynapse::Existing { index: 2 },
                ActiveSynapse::New { source: CellAddress::new(4, 0) },
                ActiveSynapse::New { source: CellAddress::new(5, 1) },
            ]
        );
        assert_eq!(update.active_synapses.iter().filter(|s| s.is_new()).count(), 2);

        // Proposals never touch the segment.
        assert_eq!(seg.len(), 3);
    }

    #[test]
    fn test_get_segment_active_synapses_without_segment() {
        let ctx = context(1);
        let active: FxHashSet<CellAddress> = [CellAddress::new(1, 1)].into_iter().collect();
        let mut selector = Fixed(vec![CellAddress::new(1, 1)]);

        let update = ctx.get_segment_active_synapses(0, 0, None, &active, false, &mut selector);
        assert_eq!(update.segment, None);
        assert!(update.active_synapses.is_empty());

        let update = ctx.get_segment_active_synapses(0, 0, None, &active, true, &mut selector);
        assert_eq!(
            update.active_synapses,
            vec![ActiveSynapse::New { source: CellAddress::new(1, 1) }]
        );
    }

    #[test]
    fn test_cell_activity() {
        let mut activity = CellActivity::new(4, 2);
        activity.set(3, 1, true);
        activity.set(1, 0, true);
        activity.set(9, 0, true);
        activity.set(0, 5, true);

        assert!(activity.is_active(3, 1));
        assert!(!activity.is_active(3, 0));
        assert!(!activity.is_active(9, 0));
        assert!(!activity.is_active(0, 5));
        assert_eq!(
            activity.active_cells(),
            vec![CellAddress::new(1, 0), CellAddress::new(3, 1)]
        );

        activity.clear();
        assert!(activity.active_cells().is_empty());
    }

    #[test]
    fn test_random_learning_cells() {
        let mut ctx = context(1);
        let mut seg = Segment::new(&mut ctx, false);
        seg.add_synapse(0, 0, 0.5);
        seg.add_synapse(1, 1, 0.5);

        let mut selector = RandomLearningCells::new(7);
        selector.set_learning_cells(
            (0..4).flat_map(|col| (0..2).map(move |cell| CellAddress::new(col, cell))),
        );
        assert_eq!(selector.learning_cells().len(), 8);

        let activity = CellActivity::new(4, 2);
        let chosen = selector.choose_cells_to_learn_from(Some(&seg), 3, &activity);
        assert_eq!(chosen.len(), 3);
        assert!(chosen.windows(2).all(|w| w[0] < w[1]));
        assert!(!chosen.contains(&CellAddress::new(0, 0)));
        assert!(!chosen.contains(&CellAddress::new(1, 1)));

        let all = selector.choose_cells_to_learn_from(Some(&seg), 100, &activity);
        assert_eq!(all.len(), 6);
        let fresh = selector.choose_cells_to_learn_from(None, 100, &activity);
        assert_eq!(fresh.len(), 8);
    }
}
