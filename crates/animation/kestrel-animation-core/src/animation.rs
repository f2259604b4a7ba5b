//! Compressed animation clip: quantized key streams and their invariants.
//!
//! A clip stores, per channel (translation, rotation, scale), a single merged
//! key stream covering every track. Tracks are consumed four at a time ("soa
//! tracks"), so the track count is padded up to a multiple of four with
//! neutral tracks when the clip is built.
//!
//! Stream layout, enforced by [`Animation::new`]:
//! - the first `aligned_tracks` entries are each track's key at ratio 0, in
//!   track order; the next `aligned_tracks` entries are each track's second
//!   key. This fixed region lets a sampling context seed its bracket cache
//!   without searching.
//! - every later entry stores a back-distance (`previous`) to the previous
//!   key of the same track; the stream is ordered by ascending "required
//!   ratio", the ratio of that predecessor. A key therefore appears in the
//!   stream exactly when the key it replaces stops being the upper bracket.
//! - within a track, ratios are strictly increasing, the first key sits at
//!   ratio 0 and the last at ratio 1.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::SamplingError;

/// Scale applied to quantized quaternion components. The three smallest
/// components of a unit quaternion lie in `[-1/sqrt(2), 1/sqrt(2)]`, which
/// maps them onto the full signed 16 bit range.
pub const QUAT_INT_TO_FLOAT: f32 = 1.0 / (32767.0 * std::f32::consts::SQRT_2);

/// Stable identity of a loaded clip, used to bind a sampling context to the
/// clip it was last stepped against. Allocated from a process-wide counter so
/// it survives moves and never aliases across clips.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AnimationId(u32);

static NEXT_ANIMATION_ID: AtomicU32 = AtomicU32::new(0);

impl AnimationId {
    fn next() -> Self {
        Self(NEXT_ANIMATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Quantized translation/scale key: three half-precision components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Float3Key {
    /// Normalized time of this key in [0, 1].
    pub ratio: f32,
    /// Back-distance to the previous key of the same track, in stream
    /// entries. 0 for the keys of the leading seed region's first half.
    pub previous: u16,
    /// IEEE half-float bit patterns for x, y, z.
    pub value: [u16; 3],
}

/// Quantized rotation key: smallest-three unit quaternion encoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuaternionKey {
    /// Normalized time of this key in [0, 1].
    pub ratio: f32,
    /// Back-distance to the previous key of the same track.
    pub previous: u16,
    /// Which of the four components was dropped (0..=3).
    pub largest: u8,
    /// True when the dropped component is negative.
    pub sign: bool,
    /// The three remaining components, scaled by [`QUAT_INT_TO_FLOAT`].
    pub value: [i16; 3],
}

/// Shared view of a quantized key used by the cursor walk: every key knows
/// its time and how far back its track predecessor sits.
pub(crate) trait CompressedKey {
    fn ratio(&self) -> f32;
    fn previous(&self) -> u16;
}

impl CompressedKey for Float3Key {
    #[inline]
    fn ratio(&self) -> f32 {
        self.ratio
    }
    #[inline]
    fn previous(&self) -> u16 {
        self.previous
    }
}

impl CompressedKey for QuaternionKey {
    #[inline]
    fn ratio(&self) -> f32 {
        self.ratio
    }
    #[inline]
    fn previous(&self) -> u16 {
        self.previous
    }
}

/// Raw material for [`Animation::new`]: the already-compressed streams as an
/// offline build step emits them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimationDesc {
    pub name: String,
    /// Clip duration in seconds; sampling itself works in normalized ratios.
    pub duration: f32,
    /// Real (unpadded) track count.
    pub num_tracks: usize,
    pub translations: Vec<Float3Key>,
    pub rotations: Vec<QuaternionKey>,
    pub scales: Vec<Float3Key>,
}

/// An immutable, validated compressed clip. Read-only to the sampler and safe
/// to share across concurrently sampling callers.
#[derive(Debug)]
pub struct Animation {
    id: AnimationId,
    name: String,
    duration: f32,
    num_tracks: usize,
    translations: Vec<Float3Key>,
    rotations: Vec<QuaternionKey>,
    scales: Vec<Float3Key>,
}

impl Animation {
    /// Validate the stream invariants and take ownership of the key data.
    ///
    /// Validation runs once here so the sampling hot path can stay
    /// assertion-only: a clip that passes cannot drive the cursor walk out of
    /// its invariants.
    pub fn new(desc: AnimationDesc) -> Result<Self, SamplingError> {
        let aligned = align_tracks(desc.num_tracks);
        validate_channel(&desc.translations, aligned, &desc.name, "translation")?;
        validate_channel(&desc.rotations, aligned, &desc.name, "rotation")?;
        validate_channel(&desc.scales, aligned, &desc.name, "scale")?;
        for (i, key) in desc.rotations.iter().enumerate() {
            if key.largest > 3 {
                return Err(invalid(
                    &desc.name,
                    format!("rotation key {i} drops component {} (must be 0..=3)", key.largest),
                ));
            }
        }

        Ok(Self {
            id: AnimationId::next(),
            name: desc.name,
            duration: desc.duration,
            num_tracks: desc.num_tracks,
            translations: desc.translations,
            rotations: desc.rotations,
            scales: desc.scales,
        })
    }

    #[inline]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Real track count, before padding.
    #[inline]
    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    /// Track count padded up to a multiple of four.
    #[inline]
    pub fn num_aligned_tracks(&self) -> usize {
        align_tracks(self.num_tracks)
    }

    /// Number of track groups, shared by all three channels.
    #[inline]
    pub fn num_soa_tracks(&self) -> usize {
        (self.num_tracks + 3) / 4
    }

    #[inline]
    pub fn translations(&self) -> &[Float3Key] {
        &self.translations
    }

    #[inline]
    pub fn rotations(&self) -> &[QuaternionKey] {
        &self.rotations
    }

    #[inline]
    pub fn scales(&self) -> &[Float3Key] {
        &self.scales
    }
}

#[inline]
fn align_tracks(num_tracks: usize) -> usize {
    (num_tracks + 3) & !3
}

fn invalid(name: &str, reason: String) -> SamplingError {
    SamplingError::InvalidAnimation {
        name: name.to_string(),
        reason,
    }
}

/// Walk one channel's stream and check every format invariant the sampler
/// relies on. The walk mirrors the cursor algorithm: it maintains the
/// "latest key per track" map and replays each entry against it.
fn validate_channel<K: CompressedKey>(
    keys: &[K],
    aligned_tracks: usize,
    name: &str,
    channel: &str,
) -> Result<(), SamplingError> {
    if aligned_tracks == 0 {
        return if keys.is_empty() {
            Ok(())
        } else {
            Err(invalid(
                name,
                format!("{channel} stream has keys but the clip has no tracks"),
            ))
        };
    }

    let seed_len = aligned_tracks * 2;
    if keys.len() < seed_len {
        return Err(invalid(
            name,
            format!(
                "{channel} stream holds {} keys, seed region needs {seed_len}",
                keys.len()
            ),
        ));
    }

    for (i, key) in keys.iter().enumerate() {
        let r = key.ratio();
        if !r.is_finite() || !(0.0..=1.0).contains(&r) {
            return Err(invalid(
                name,
                format!("{channel} key {i} ratio {r} is outside [0, 1]"),
            ));
        }
    }

    // Seed region: first keys at ratio 0 with no predecessor, second keys
    // pointing exactly one track-count back.
    for (i, key) in keys[..aligned_tracks].iter().enumerate() {
        if key.ratio() != 0.0 || key.previous() != 0 {
            return Err(invalid(
                name,
                format!("{channel} key {i} must open track {i} at ratio 0"),
            ));
        }
    }
    for (i, key) in keys[aligned_tracks..seed_len].iter().enumerate() {
        if key.previous() as usize != aligned_tracks {
            return Err(invalid(
                name,
                format!(
                    "{channel} key {}: second key of track {i} must point back {aligned_tracks} entries",
                    i + aligned_tracks
                ),
            ));
        }
        if key.ratio() <= 0.0 {
            return Err(invalid(
                name,
                format!("{channel} track {i} ratios must be strictly increasing"),
            ));
        }
    }

    // Replay the rest of the stream against the latest-key-per-track map.
    let mut latest: Vec<usize> = (aligned_tracks..seed_len).collect();
    let mut required = 0.0f32;
    for pos in seed_len..keys.len() {
        let previous = keys[pos].previous() as usize;
        if previous == 0 || previous > pos {
            return Err(invalid(
                name,
                format!("{channel} key {pos} back-distance {previous} is out of range"),
            ));
        }
        let target = pos - previous;
        let Some(track) = latest.iter().position(|&p| p == target) else {
            return Err(invalid(
                name,
                format!("{channel} key {pos} does not continue any track's latest key"),
            ));
        };
        let target_ratio = keys[target].ratio();
        if target_ratio < required {
            return Err(invalid(
                name,
                format!("{channel} key {pos} breaks the required-ratio ordering"),
            ));
        }
        if keys[pos].ratio() <= target_ratio {
            return Err(invalid(
                name,
                format!("{channel} track {track} ratios must be strictly increasing"),
            ));
        }
        latest[track] = pos;
        required = target_ratio;
    }

    // Every track must close at ratio 1 so any query ratio stays bracketed.
    for (track, &pos) in latest.iter().enumerate() {
        if keys[pos].ratio() != 1.0 {
            return Err(invalid(
                name,
                format!("{channel} track {track} must end with a key at ratio 1"),
            ));
        }
    }

    Ok(())
}
