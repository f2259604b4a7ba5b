//! Error types for the sampling runtime.

use thiserror::Error;

/// Errors surfaced by clip construction and by [`SamplingJob::run`].
///
/// The taxonomy is deliberately small: a job either has everything it needs
/// (references present, buffers large enough) or it fails before touching the
/// output. Malformed compressed data is rejected once, when the clip is built;
/// the sampling hot path itself only carries debug assertions.
///
/// [`SamplingJob::run`]: crate::SamplingJob::run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SamplingError {
    /// The job was run without an animation clip.
    #[error("sampling job has no animation")]
    MissingAnimation,

    /// The job was run without a sampling context.
    #[error("sampling job has no context")]
    MissingContext,

    /// The output buffer cannot hold one transform per track group.
    #[error("output buffer holds {actual} soa transforms, clip needs {required}")]
    OutputTooSmall { required: usize, actual: usize },

    /// The context was sized for fewer track groups than the clip carries.
    #[error("context sized for {actual} soa tracks, clip needs {required}")]
    ContextTooSmall { required: usize, actual: usize },

    /// The compressed key streams violate the clip format invariants.
    #[error("invalid animation '{name}': {reason}")]
    InvalidAnimation { name: String, reason: String },
}
