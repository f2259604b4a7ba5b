//! Wide (grouped-by-4, SoA) value types and blends.
//!
//! Each structure holds one component per field, four tracks per lane, so a
//! whole track group is processed with `glam::Vec4` arithmetic. Blends are the
//! only operations the sampler needs; everything else lives in `glam`.

use glam::Vec4;

/// Four 3d vectors in structure-of-arrays form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoaVec3 {
    pub x: Vec4,
    pub y: Vec4,
    pub z: Vec4,
}

impl SoaVec3 {
    pub const ZERO: Self = Self {
        x: Vec4::ZERO,
        y: Vec4::ZERO,
        z: Vec4::ZERO,
    };

    pub const ONE: Self = Self {
        x: Vec4::ONE,
        y: Vec4::ONE,
        z: Vec4::ONE,
    };

    /// Component-wise linear blend with a per-lane factor.
    #[inline]
    pub fn lerp(a: &Self, b: &Self, t: Vec4) -> Self {
        Self {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            z: a.z + (b.z - a.z) * t,
        }
    }
}

/// Four quaternions in structure-of-arrays form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoaQuat {
    pub x: Vec4,
    pub y: Vec4,
    pub z: Vec4,
    pub w: Vec4,
}

impl SoaQuat {
    pub const IDENTITY: Self = Self {
        x: Vec4::ZERO,
        y: Vec4::ZERO,
        z: Vec4::ZERO,
        w: Vec4::ONE,
    };

    /// Normalized linear blend with a per-lane factor.
    ///
    /// Does NOT take the shortest arc: adjacent compressed keys are already
    /// negated onto the same hemisphere when the clip is built, so the dot
    /// check would be wasted work here.
    #[inline]
    pub fn nlerp_est(a: &Self, b: &Self, t: Vec4) -> Self {
        let x = a.x + (b.x - a.x) * t;
        let y = a.y + (b.y - a.y) * t;
        let z = a.z + (b.z - a.z) * t;
        let w = a.w + (b.w - a.w) * t;
        let len2 = x * x + y * y + z * z + w * w;
        let inv_len = sqrt4(len2).recip();
        Self {
            x: x * inv_len,
            y: y * inv_len,
            z: z * inv_len,
            w: w * inv_len,
        }
    }
}

/// Local transform for one track group: four translation/rotation/scale lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoaTransform {
    pub translation: SoaVec3,
    pub rotation: SoaQuat,
    pub scale: SoaVec3,
}

impl SoaTransform {
    pub const IDENTITY: Self = Self {
        translation: SoaVec3::ZERO,
        rotation: SoaQuat::IDENTITY,
        scale: SoaVec3::ONE,
    };
}

impl Default for SoaTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-lane square root.
#[inline]
pub(crate) fn sqrt4(v: Vec4) -> Vec4 {
    Vec4::from_array(v.to_array().map(f32::sqrt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nlerp_yields_unit_lanes() {
        let a = SoaQuat::IDENTITY;
        // 90 degree rotations about x in every lane.
        let s = (0.5f32).sqrt();
        let b = SoaQuat {
            x: Vec4::splat(s),
            y: Vec4::ZERO,
            z: Vec4::ZERO,
            w: Vec4::splat(s),
        };
        let q = SoaQuat::nlerp_est(&a, &b, Vec4::splat(0.25));
        let len2 = q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w;
        for len2 in len2.to_array() {
            assert!((len2 - 1.0).abs() < 1e-5, "len2={len2}");
        }
    }
}
