//! Kestrel animation core: runtime sampling of compressed keyframe clips.
//!
//! The crate evaluates quantized, time-sorted keyframe streams into per-joint
//! local transforms at a normalized ratio. Tracks are processed four at a
//! time in SoA form, and a per-caller [`SamplingContext`] keeps the two
//! bracketing keys of every track warm so playback, scrubbing and small
//! rewinds touch only the keys actually crossed instead of re-scanning the
//! stream.
//!
//! Entry point: fill a [`SamplingJob`] and call [`SamplingJob::run`].

pub mod animation;
pub mod config;
pub mod context;
pub mod error;
pub mod math;
pub mod sampling;

mod cursor;
mod decompress;

// Re-exports for consumers.
pub use animation::{Animation, AnimationDesc, AnimationId, Float3Key, QuaternionKey};
pub use config::SamplingConfig;
pub use context::{InterpSoaFloat3, InterpSoaQuaternion, SamplingContext};
pub use error::SamplingError;
pub use math::{SoaQuat, SoaTransform, SoaVec3};
pub use sampling::SamplingJob;
