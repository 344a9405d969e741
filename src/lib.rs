//! Learning core of a Hierarchical Temporal Memory (HTM) engine.
//!
//! Two subsystems share one mechanism, graded connection strengths (permanences)
//! that are reinforced or decayed based on activity:
//!
//! - The [`SpatialPooler`](core::spatial_pooler::SpatialPooler) turns a binary input vector
//!   into a sparse set of active columns (overlap, boosting, inhibition, learning).
//! - The [`Segment`](core::segment::Segment) engine manages the permanence-weighted synapses
//!   of a temporal-layer segment, its duty cycle and the synapse update proposals
//!   the temporal layer commits later.
//!
//! ```
//! use htm_pooling::core::spatial_pooler::{SpatialPooler, SpatialPoolerParams};
//!
//! let mut sp = SpatialPooler::new(SpatialPoolerParams {
//!     input_dimensions: vec![64],
//!     column_dimensions: vec![128],
//!     potential_radius: 64,
//!     local_area_density: 0.05,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut input = vec![false; 64];
//! input[3..12].iter_mut().for_each(|bit| *bit = true);
//!
//! let active = sp.compute(&input, true).unwrap();
//! assert!(active.len() <= 6);
//! ```

pub mod core;
pub mod error;

pub use error::{HtmError, Result};
