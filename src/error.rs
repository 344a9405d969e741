//! Error types shared by the spatial pooler and the segment engine.
//!
//! Configuration problems are reported when a pooler is constructed. Contract
//! violations of the segment engine (freeing more synapses than exist, addressing
//! a synapse that does not exist) are reported to the caller instead of aborting.

use thiserror::Error;

/// Main error type for HTM pooling operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HtmError {
    /// A configuration parameter is out of its valid range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        name: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// Input or column dimensions are empty, zero-sized or do not match each other.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// An input vector does not have one bit per input.
    #[error("Input has {actual} bits, expected {expected}")]
    InputSizeMismatch {
        /// Number of inputs the pooler was built for.
        expected: usize,
        /// Length of the vector that was passed in.
        actual: usize,
    },

    /// A segment was asked to free more synapses than it owns.
    #[error("Cannot free {requested} synapses, segment only has {available}")]
    TooManySynapsesToFree {
        /// Number of synapses requested to be freed.
        requested: usize,
        /// Number of synapses on the segment.
        available: usize,
    },

    /// A synapse index does not address a synapse of the segment.
    #[error("Synapse index {index} out of range (segment has {len} synapses)")]
    SynapseOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of synapses on the segment.
        len: usize,
    },
}

/// Result type alias using [`HtmError`].
pub type Result<T> = std::result::Result<T, HtmError>;
