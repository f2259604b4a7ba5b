//! Per-caller decode cache: cursors, bracket arrays, outdated sets and
//! decompressed interpolation operands.
//!
//! A context is the unit of exclusivity: one sampling call mutates it in
//! place, so concurrent callers each need their own instance (the clip itself
//! is read-only and freely shared). It is a pure in-memory performance
//! structure, never serialized.

use glam::Vec4;

use crate::animation::Animation;
use crate::config::SamplingConfig;
use crate::math::{SoaQuat, SoaVec3};

/// Decompressed bracket operands for one track group of a vector channel:
/// lane ratios and values for the penultimate (0) and last (1) key.
#[derive(Clone, Copy, Debug)]
pub struct InterpSoaFloat3 {
    pub ratio: [Vec4; 2],
    pub value: [SoaVec3; 2],
}

impl Default for InterpSoaFloat3 {
    fn default() -> Self {
        Self {
            ratio: [Vec4::ZERO; 2],
            value: [SoaVec3::ZERO; 2],
        }
    }
}

/// Decompressed bracket operands for one track group of the rotation channel.
#[derive(Clone, Copy, Debug)]
pub struct InterpSoaQuaternion {
    pub ratio: [Vec4; 2],
    pub value: [SoaQuat; 2],
}

impl Default for InterpSoaQuaternion {
    fn default() -> Self {
        Self {
            ratio: [Vec4::ZERO; 2],
            value: [SoaQuat::IDENTITY; 2],
        }
    }
}

/// Set of track groups whose brackets changed since the last decompression.
/// Backed by a byte bitset; the contract is only "every marked group is
/// decoded exactly once before the next interpolation, unmarked groups are
/// skipped".
#[derive(Debug, Default)]
pub(crate) struct OutdatedGroups {
    bits: Vec<u8>,
}

impl OutdatedGroups {
    pub(crate) fn new(max_soa_tracks: usize) -> Self {
        Self {
            bits: vec![0; max_soa_tracks.div_ceil(8)],
        }
    }

    pub(crate) fn resize(&mut self, max_soa_tracks: usize) {
        self.bits.clear();
        self.bits.resize(max_soa_tracks.div_ceil(8), 0);
    }

    #[inline]
    pub(crate) fn mark(&mut self, group: usize) {
        self.bits[group / 8] |= 1 << (group & 7);
    }

    /// Mark the first `num_groups` groups; trailing capacity stays clear so
    /// drains never visit groups the clip does not have.
    pub(crate) fn mark_all(&mut self, num_groups: usize) {
        let full = num_groups / 8;
        for byte in &mut self.bits[..full] {
            *byte = 0xff;
        }
        let tail = num_groups & 7;
        if tail != 0 {
            self.bits[full] = 0xff >> (8 - tail);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Visit and unmark every marked group.
    pub(crate) fn drain(&mut self, mut f: impl FnMut(usize)) {
        for (byte_index, byte) in self.bits.iter_mut().enumerate() {
            let mut pending = *byte;
            *byte = 0;
            let mut group = byte_index * 8;
            while pending != 0 {
                if pending & 1 != 0 {
                    f(group);
                }
                pending >>= 1;
                group += 1;
            }
        }
    }
}

/// Reusable per-caller sampling state.
///
/// Holds, for each channel, a cursor into the clip's merged key stream, the
/// bracket cache (two stream positions per track) and the decompressed
/// operands of the bracketing keys. Construct it empty or sized, reuse it
/// across calls; resizing or switching clips discards all cached progress.
#[derive(Debug)]
pub struct SamplingContext {
    max_soa_tracks: usize,
    restart_overhead: f32,

    /// Clip the cache was last stepped against; brackets are only meaningful
    /// for this clip.
    animation: Option<crate::animation::AnimationId>,
    ratio: f32,

    pub(crate) translation_cursor: usize,
    pub(crate) rotation_cursor: usize,
    pub(crate) scale_cursor: usize,

    pub(crate) translation_entries: Vec<u32>,
    pub(crate) rotation_entries: Vec<u32>,
    pub(crate) scale_entries: Vec<u32>,

    pub(crate) outdated_translations: OutdatedGroups,
    pub(crate) outdated_rotations: OutdatedGroups,
    pub(crate) outdated_scales: OutdatedGroups,

    pub(crate) soa_translations: Vec<InterpSoaFloat3>,
    pub(crate) soa_rotations: Vec<InterpSoaQuaternion>,
    pub(crate) soa_scales: Vec<InterpSoaFloat3>,
}

impl SamplingContext {
    /// An empty context; resize it before use.
    pub fn new() -> Self {
        Self {
            max_soa_tracks: 0,
            restart_overhead: SamplingConfig::default().restart_overhead,
            animation: None,
            ratio: 0.0,
            translation_cursor: 0,
            rotation_cursor: 0,
            scale_cursor: 0,
            translation_entries: Vec::new(),
            rotation_entries: Vec::new(),
            scale_entries: Vec::new(),
            outdated_translations: OutdatedGroups::default(),
            outdated_rotations: OutdatedGroups::default(),
            outdated_scales: OutdatedGroups::default(),
            soa_translations: Vec::new(),
            soa_rotations: Vec::new(),
            soa_scales: Vec::new(),
        }
    }

    /// A context able to sample clips of up to `max_tracks` tracks.
    pub fn with_capacity(max_tracks: usize) -> Self {
        Self::with_config(max_tracks, SamplingConfig::default())
    }

    /// A sized context with explicit tuning.
    pub fn with_config(max_tracks: usize, config: SamplingConfig) -> Self {
        let mut context = Self::new();
        context.restart_overhead = config.restart_overhead;
        context.resize(max_tracks);
        context
    }

    /// Maximum number of track groups this context can sample.
    #[inline]
    pub fn max_soa_tracks(&self) -> usize {
        self.max_soa_tracks
    }

    /// Maximum number of tracks this context can sample.
    #[inline]
    pub fn max_tracks(&self) -> usize {
        self.max_soa_tracks * 4
    }

    /// Resize for clips of up to `max_tracks` tracks. Discards all cached
    /// state: every buffer is reallocated and the next step re-seeds.
    pub fn resize(&mut self, max_tracks: usize) {
        self.invalidate();
        self.max_soa_tracks = max_tracks.div_ceil(4);
        let max_tracks = self.max_soa_tracks * 4;

        log::debug!(
            "sampling context resized for {} soa tracks",
            self.max_soa_tracks
        );

        self.translation_entries = vec![0; max_tracks * 2];
        self.rotation_entries = vec![0; max_tracks * 2];
        self.scale_entries = vec![0; max_tracks * 2];

        self.outdated_translations.resize(self.max_soa_tracks);
        self.outdated_rotations.resize(self.max_soa_tracks);
        self.outdated_scales.resize(self.max_soa_tracks);

        self.soa_translations = vec![InterpSoaFloat3::default(); self.max_soa_tracks];
        self.soa_rotations = vec![InterpSoaQuaternion::default(); self.max_soa_tracks];
        self.soa_scales = vec![InterpSoaFloat3::default(); self.max_soa_tracks];
    }

    /// Forget the clip binding and all cursor progress. The next step seeds
    /// from scratch, as if the context were freshly built.
    pub fn invalidate(&mut self) {
        self.animation = None;
        self.ratio = 0.0;
        self.translation_cursor = 0;
        self.rotation_cursor = 0;
        self.scale_cursor = 0;
        self.outdated_translations.clear();
        self.outdated_rotations.clear();
        self.outdated_scales.clear();
    }

    /// Bind the context to `(animation, ratio)` for the coming sample.
    ///
    /// Resets every channel cursor when the clip changed, or when the new
    /// ratio is far enough behind the previous one that re-seeding beats
    /// walking backward (see [`SamplingConfig::restart_overhead`]). Small
    /// rewinds keep the cursors and take the backward walk instead.
    pub fn step(&mut self, animation: &Animation, ratio: f32) {
        debug_assert!(self.max_soa_tracks >= animation.num_soa_tracks());
        let changed = self.animation != Some(animation.id());
        let restart = self.ratio > self.restart_overhead && self.ratio - ratio > ratio;
        if changed || restart {
            log::trace!(
                "sampling context reset for '{}' at ratio {ratio} ({})",
                animation.name(),
                if changed { "clip switch" } else { "big rewind" }
            );
            self.animation = Some(animation.id());
            self.translation_cursor = 0;
            self.rotation_cursor = 0;
            self.scale_cursor = 0;
        }
        self.ratio = ratio;
    }
}

impl Default for SamplingContext {
    fn default() -> Self {
        Self::new()
    }
}
