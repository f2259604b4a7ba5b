//! Sampling job: validation, channel orchestration and the final
//! interpolation pass.

use glam::Vec4;

use crate::animation::Animation;
use crate::context::{InterpSoaFloat3, InterpSoaQuaternion, SamplingContext};
use crate::cursor::update_cache_cursor;
use crate::decompress::{update_interp_float3, update_interp_quaternion};
use crate::error::SamplingError;
use crate::math::{SoaQuat, SoaTransform, SoaVec3};

/// Samples a compressed clip at a normalized ratio, writing one local
/// transform per track group into a caller-owned buffer.
///
/// The job borrows everything it works on: the clip read-only, the context
/// and output exclusively. Give each concurrent caller its own context; the
/// clip may be shared freely.
///
/// ```
/// use kestrel_animation_core::{SamplingContext, SamplingJob, SoaTransform};
/// # fn sample(animation: &kestrel_animation_core::Animation) {
/// let mut context = SamplingContext::with_capacity(animation.num_tracks());
/// let mut output = vec![SoaTransform::IDENTITY; animation.num_soa_tracks()];
/// let mut job = SamplingJob {
///     animation: Some(animation),
///     context: Some(&mut context),
///     ratio: 0.5,
///     output: &mut output,
/// };
/// job.run().unwrap();
/// # }
/// ```
pub struct SamplingJob<'a> {
    /// Clip to sample.
    pub animation: Option<&'a Animation>,
    /// Decode cache, stepped and mutated by every run.
    pub context: Option<&'a mut SamplingContext>,
    /// Normalized query time; clamped to [0, 1] by `run`.
    pub ratio: f32,
    /// Receives one transform per track group; only the first
    /// `num_soa_tracks` slots are written.
    pub output: &'a mut [SoaTransform],
}

impl SamplingJob<'_> {
    /// True iff `run` would get past its precondition checks.
    pub fn validate(&self) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let Some(context) = self.context.as_deref() else {
            return false;
        };
        let num_soa_tracks = animation.num_soa_tracks();
        self.output.len() >= num_soa_tracks && context.max_soa_tracks() >= num_soa_tracks
    }

    /// Sample the clip at the (clamped) ratio.
    ///
    /// Fails without side effects when a reference is missing or a buffer is
    /// undersized; once the checks pass the sampling itself is total for
    /// valid clip data.
    pub fn run(&mut self) -> Result<(), SamplingError> {
        let animation = self.animation.ok_or(SamplingError::MissingAnimation)?;
        let context = self
            .context
            .as_deref_mut()
            .ok_or(SamplingError::MissingContext)?;

        let num_soa_tracks = animation.num_soa_tracks();
        if self.output.len() < num_soa_tracks {
            return Err(SamplingError::OutputTooSmall {
                required: num_soa_tracks,
                actual: self.output.len(),
            });
        }
        if context.max_soa_tracks() < num_soa_tracks {
            return Err(SamplingError::ContextTooSmall {
                required: num_soa_tracks,
                actual: context.max_soa_tracks(),
            });
        }
        if num_soa_tracks == 0 {
            return Ok(());
        }

        let ratio = self.ratio.clamp(0.0, 1.0);
        context.step(animation, ratio);

        // Per channel: move the bracket cache to the ratio, then decode
        // whatever it touched.
        update_cache_cursor(
            ratio,
            num_soa_tracks,
            animation.translations(),
            &mut context.translation_cursor,
            &mut context.translation_entries,
            &mut context.outdated_translations,
        );
        update_interp_float3(
            num_soa_tracks,
            animation.translations(),
            &context.translation_entries,
            &mut context.outdated_translations,
            &mut context.soa_translations,
        );

        update_cache_cursor(
            ratio,
            num_soa_tracks,
            animation.rotations(),
            &mut context.rotation_cursor,
            &mut context.rotation_entries,
            &mut context.outdated_rotations,
        );
        update_interp_quaternion(
            num_soa_tracks,
            animation.rotations(),
            &context.rotation_entries,
            &mut context.outdated_rotations,
            &mut context.soa_rotations,
        );

        update_cache_cursor(
            ratio,
            num_soa_tracks,
            animation.scales(),
            &mut context.scale_cursor,
            &mut context.scale_entries,
            &mut context.outdated_scales,
        );
        update_interp_float3(
            num_soa_tracks,
            animation.scales(),
            &context.scale_entries,
            &mut context.outdated_scales,
            &mut context.soa_scales,
        );

        interpolate(
            ratio,
            num_soa_tracks,
            &context.soa_translations,
            &context.soa_rotations,
            &context.soa_scales,
            self.output,
        );
        Ok(())
    }
}

/// Blend every group's bracket operands at the query ratio.
///
/// The per-lane factor is `(ratio - before) / (after - before)`; brackets are
/// never zero-width for a valid clip, so the division needs no runtime guard.
fn interpolate(
    ratio: f32,
    num_soa_tracks: usize,
    translations: &[InterpSoaFloat3],
    rotations: &[InterpSoaQuaternion],
    scales: &[InterpSoaFloat3],
    output: &mut [SoaTransform],
) {
    let anim_ratio = Vec4::splat(ratio);
    for i in 0..num_soa_tracks {
        let t = &translations[i];
        let r = &rotations[i];
        let s = &scales[i];
        let interp_t = (anim_ratio - t.ratio[0]) * (t.ratio[1] - t.ratio[0]).recip();
        let interp_r = (anim_ratio - r.ratio[0]) * (r.ratio[1] - r.ratio[0]).recip();
        let interp_s = (anim_ratio - s.ratio[0]) * (s.ratio[1] - s.ratio[0]).recip();

        // Rotation stays on the shortest path because opposed neighbor keys
        // were negated when the clip was compressed.
        output[i] = SoaTransform {
            translation: SoaVec3::lerp(&t.value[0], &t.value[1], interp_t),
            rotation: SoaQuat::nlerp_est(&r.value[0], &r.value[1], interp_r),
            scale: SoaVec3::lerp(&s.value[0], &s.value[1], interp_s),
        };
    }
}
