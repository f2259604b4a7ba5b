//! Quantized keyframe decoding into wide interpolation operands.
//!
//! Runs only over track groups the cursor walk marked outdated, decoding the
//! two bracketing keys of each of the group's four tracks into SoA form.

use glam::{BVec4A, Vec4};
use half::f16;

use crate::animation::{Float3Key, QuaternionKey, QUAT_INT_TO_FLOAT};
use crate::context::{InterpSoaFloat3, InterpSoaQuaternion, OutdatedGroups};
use crate::math::{sqrt4, SoaQuat, SoaVec3};

/// Decode the bracket keys of every outdated group of a vector channel,
/// clearing the outdated set as it goes.
pub(crate) fn update_interp_float3(
    num_soa_tracks: usize,
    keys: &[Float3Key],
    entries: &[u32],
    outdated: &mut OutdatedGroups,
    interp: &mut [InterpSoaFloat3],
) {
    let num_tracks = num_soa_tracks * 4;
    outdated.drain(|group| {
        let penultimates = group * 4;
        let k00 = &keys[entries[penultimates] as usize];
        let k10 = &keys[entries[penultimates + 1] as usize];
        let k20 = &keys[entries[penultimates + 2] as usize];
        let k30 = &keys[entries[penultimates + 3] as usize];
        interp[group].ratio[0] = Vec4::new(k00.ratio, k10.ratio, k20.ratio, k30.ratio);
        interp[group].value[0] = decompress_float3(k00, k10, k20, k30);

        let lasts = num_tracks + group * 4;
        let k01 = &keys[entries[lasts] as usize];
        let k11 = &keys[entries[lasts + 1] as usize];
        let k21 = &keys[entries[lasts + 2] as usize];
        let k31 = &keys[entries[lasts + 3] as usize];
        interp[group].ratio[1] = Vec4::new(k01.ratio, k11.ratio, k21.ratio, k31.ratio);
        interp[group].value[1] = decompress_float3(k01, k11, k21, k31);
    });
}

/// Rotation-channel counterpart of [`update_interp_float3`].
pub(crate) fn update_interp_quaternion(
    num_soa_tracks: usize,
    keys: &[QuaternionKey],
    entries: &[u32],
    outdated: &mut OutdatedGroups,
    interp: &mut [InterpSoaQuaternion],
) {
    let num_tracks = num_soa_tracks * 4;
    outdated.drain(|group| {
        let penultimates = group * 4;
        let k00 = &keys[entries[penultimates] as usize];
        let k10 = &keys[entries[penultimates + 1] as usize];
        let k20 = &keys[entries[penultimates + 2] as usize];
        let k30 = &keys[entries[penultimates + 3] as usize];
        interp[group].ratio[0] = Vec4::new(k00.ratio, k10.ratio, k20.ratio, k30.ratio);
        interp[group].value[0] = decompress_quaternion(k00, k10, k20, k30);

        let lasts = num_tracks + group * 4;
        let k01 = &keys[entries[lasts] as usize];
        let k11 = &keys[entries[lasts + 1] as usize];
        let k21 = &keys[entries[lasts + 2] as usize];
        let k31 = &keys[entries[lasts + 3] as usize];
        interp[group].ratio[1] = Vec4::new(k01.ratio, k11.ratio, k21.ratio, k31.ratio);
        interp[group].value[1] = decompress_quaternion(k01, k11, k21, k31);
    });
}

#[inline]
fn half_to_float(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

/// Widen four half-float triples into one SoA vector.
pub(crate) fn decompress_float3(
    k0: &Float3Key,
    k1: &Float3Key,
    k2: &Float3Key,
    k3: &Float3Key,
) -> SoaVec3 {
    SoaVec3 {
        x: Vec4::new(
            half_to_float(k0.value[0]),
            half_to_float(k1.value[0]),
            half_to_float(k2.value[0]),
            half_to_float(k3.value[0]),
        ),
        y: Vec4::new(
            half_to_float(k0.value[1]),
            half_to_float(k1.value[1]),
            half_to_float(k2.value[1]),
            half_to_float(k3.value[1]),
        ),
        z: Vec4::new(
            half_to_float(k0.value[2]),
            half_to_float(k1.value[2]),
            half_to_float(k2.value[2]),
            half_to_float(k3.value[2]),
        ),
    }
}

/// Routes each key's three stored components into the component slots around
/// its dropped one. Row = largest index, column = output component slot.
const CPNT_MAPPING: [[usize; 4]; 4] = [[0, 0, 1, 2], [0, 0, 1, 2], [0, 1, 0, 2], [0, 1, 2, 0]];

/// Rebuild four unit quaternions from their smallest-three encodings.
///
/// Every key may drop a different component, so the reconstructed value is
/// merged back per lane with a masked select rather than a branch per key.
pub(crate) fn decompress_quaternion(
    k0: &QuaternionKey,
    k1: &QuaternionKey,
    k2: &QuaternionKey,
    k3: &QuaternionKey,
) -> SoaQuat {
    debug_assert!(k0.largest <= 3 && k1.largest <= 3 && k2.largest <= 3 && k3.largest <= 3);

    let m0 = &CPNT_MAPPING[k0.largest as usize];
    let m1 = &CPNT_MAPPING[k1.largest as usize];
    let m2 = &CPNT_MAPPING[k2.largest as usize];
    let m3 = &CPNT_MAPPING[k3.largest as usize];

    // Stored triples routed into component/lane order. The largest slot of
    // each lane gets a duplicated neighbor value here; it is zeroed below so
    // the length reconstruction only sees the three real components.
    let mut cmp_keys = [
        [
            k0.value[m0[0]],
            k1.value[m1[0]],
            k2.value[m2[0]],
            k3.value[m3[0]],
        ],
        [
            k0.value[m0[1]],
            k1.value[m1[1]],
            k2.value[m2[1]],
            k3.value[m3[1]],
        ],
        [
            k0.value[m0[2]],
            k1.value[m1[2]],
            k2.value[m2[2]],
            k3.value[m3[2]],
        ],
        [
            k0.value[m0[3]],
            k1.value[m1[3]],
            k2.value[m2[3]],
            k3.value[m3[3]],
        ],
    ];
    cmp_keys[k0.largest as usize][0] = 0;
    cmp_keys[k1.largest as usize][1] = 0;
    cmp_keys[k2.largest as usize][2] = 0;
    cmp_keys[k3.largest as usize][3] = 0;

    let scale = Vec4::splat(QUAT_INT_TO_FLOAT);
    let mut cpnt = cmp_keys.map(|lanes| {
        scale
            * Vec4::new(
                lanes[0] as f32,
                lanes[1] as f32,
                lanes[2] as f32,
                lanes[3] as f32,
            )
    });

    // Remaining length of the dropped component per lane. It cannot reach
    // zero: the dropped component is the largest, so its square is >= 1/4.
    let dot =
        cpnt[0] * cpnt[0] + cpnt[1] * cpnt[1] + cpnt[2] * cpnt[2] + cpnt[3] * cpnt[3];
    let ww0 = (Vec4::ONE - dot).max(Vec4::splat(1e-16));
    let w0 = sqrt4(ww0);
    let signs = BVec4A::new(k0.sign, k1.sign, k2.sign, k3.sign);
    let restored = Vec4::select(signs, -w0, w0);

    // Merge the reconstructed component back into each lane's largest slot.
    cpnt[0] = Vec4::select(largest_mask(k0, k1, k2, k3, 0), restored, cpnt[0]);
    cpnt[1] = Vec4::select(largest_mask(k0, k1, k2, k3, 1), restored, cpnt[1]);
    cpnt[2] = Vec4::select(largest_mask(k0, k1, k2, k3, 2), restored, cpnt[2]);
    cpnt[3] = Vec4::select(largest_mask(k0, k1, k2, k3, 3), restored, cpnt[3]);

    SoaQuat {
        x: cpnt[0],
        y: cpnt[1],
        z: cpnt[2],
        w: cpnt[3],
    }
}

#[inline]
fn largest_mask(
    k0: &QuaternionKey,
    k1: &QuaternionKey,
    k2: &QuaternionKey,
    k3: &QuaternionKey,
    component: u8,
) -> BVec4A {
    BVec4A::new(
        k0.largest == component,
        k1.largest == component,
        k2.largest == component,
        k3.largest == component,
    )
}
