//! Sampling context configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for [`SamplingContext`].
///
/// [`SamplingContext`]: crate::SamplingContext
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Rewind-vs-restart threshold, expressed as a fraction of the clip.
    ///
    /// When a new ratio is behind the previous one by more than the previous
    /// ratio itself, walking the cursors backward would touch most of the key
    /// stream, so the cursors are reset and re-seeded instead. Rewinds while
    /// the previous ratio is still below this threshold always take the
    /// backward walk, which keeps the cached keyframes warm.
    pub restart_overhead: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        // Restart is worth ~5% of seek time. Tuned, not derived.
        Self {
            restart_overhead: 0.05,
        }
    }
}
