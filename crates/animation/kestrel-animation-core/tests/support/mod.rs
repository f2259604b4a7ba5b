#![allow(dead_code)]
//! Test-side clip construction: emulates the output of an offline compressor
//! (seed region, required-ratio ordering, back-distances, quantization) so
//! suites can build valid clips from per-track keyframe lists.

use half::f16;
use kestrel_animation_core::animation::QUAT_INT_TO_FLOAT;
use kestrel_animation_core::{Animation, AnimationDesc, Float3Key, QuaternionKey};

pub const NEUTRAL_TRANSLATION: [f32; 3] = [0.0, 0.0, 0.0];
pub const NEUTRAL_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const NEUTRAL_SCALE: [f32; 3] = [1.0, 1.0, 1.0];

/// A track that holds `value` over the whole clip.
pub fn constant_track<T: Copy>(value: T) -> Vec<(f32, T)> {
    vec![(0.0, value), (1.0, value)]
}

pub fn quantize_float3(v: [f32; 3]) -> [u16; 3] {
    v.map(|c| f16::from_f32(c).to_bits())
}

/// Round-trip a float through half precision, for expected-value math.
pub fn half_round_trip(v: f32) -> f32 {
    f16::from_f32(v).to_f32()
}

/// Smallest-three quantization of a unit quaternion.
pub fn quantize_quat(q: [f32; 4]) -> (u8, bool, [i16; 3]) {
    let largest = (0..4)
        .max_by(|&a, &b| q[a].abs().partial_cmp(&q[b].abs()).unwrap())
        .unwrap();
    let mut value = [0i16; 3];
    for (slot, component) in (0..4).filter(|&c| c != largest).enumerate() {
        value[slot] = (q[component] / QUAT_INT_TO_FLOAT).round() as i16;
    }
    (largest as u8, q[largest] < 0.0, value)
}

/// Merge per-track key lists into one compressed stream: the first two keys
/// of every track form the fixed seed region, later keys are ordered by the
/// ratio of their predecessor, and each key stores its back-distance.
fn build_channel<T: Copy, K>(
    tracks: &[Vec<(f32, T)>],
    mut make: impl FnMut(f32, u16, T) -> K,
) -> Vec<K> {
    let num_tracks = tracks.len();
    assert!(num_tracks % 4 == 0);
    for track in tracks {
        assert!(track.len() >= 2, "tracks need keys at ratio 0 and 1");
        assert_eq!(track[0].0, 0.0);
        assert_eq!(track[track.len() - 1].0, 1.0);
        assert!(track.windows(2).all(|w| w[0].0 < w[1].0));
    }

    // (track, key index) in stream order.
    let mut order: Vec<(usize, usize)> = Vec::new();
    order.extend((0..num_tracks).map(|t| (t, 0)));
    order.extend((0..num_tracks).map(|t| (t, 1)));
    let mut rest: Vec<(usize, usize)> = tracks
        .iter()
        .enumerate()
        .flat_map(|(t, keys)| (2..keys.len()).map(move |i| (t, i)))
        .collect();
    rest.sort_by(|&(ta, ia), &(tb, ib)| {
        let required_a = tracks[ta][ia - 1].0;
        let required_b = tracks[tb][ib - 1].0;
        required_a
            .partial_cmp(&required_b)
            .unwrap()
            .then(ta.cmp(&tb))
            .then(ia.cmp(&ib))
    });
    order.extend(rest);

    let mut last_pos = vec![0usize; num_tracks];
    let mut stream = Vec::with_capacity(order.len());
    for (pos, &(track, index)) in order.iter().enumerate() {
        let (ratio, value) = tracks[track][index];
        let previous = if index == 0 {
            0
        } else {
            u16::try_from(pos - last_pos[track]).expect("back-distance overflows u16")
        };
        last_pos[track] = pos;
        stream.push(make(ratio, previous, value));
    }
    stream
}

fn pad_tracks<T: Copy>(
    mut tracks: Vec<Vec<(f32, T)>>,
    aligned: usize,
    neutral: T,
) -> Vec<Vec<(f32, T)>> {
    while tracks.len() < aligned {
        tracks.push(constant_track(neutral));
    }
    tracks
}

/// Build a validated clip from per-track raw keyframes. Channels shorter than
/// the aligned track count are padded with neutral tracks.
pub fn make_animation(
    name: &str,
    num_tracks: usize,
    translations: Vec<Vec<(f32, [f32; 3])>>,
    rotations: Vec<Vec<(f32, [f32; 4])>>,
    scales: Vec<Vec<(f32, [f32; 3])>>,
) -> Animation {
    let aligned = (num_tracks + 3) & !3;
    let (translations, rotations, scales) = if num_tracks == 0 {
        (Vec::new(), Vec::new(), Vec::new())
    } else {
        let translations = pad_tracks(translations, aligned, NEUTRAL_TRANSLATION);
        let rotations = pad_tracks(rotations, aligned, NEUTRAL_ROTATION);
        let scales = pad_tracks(scales, aligned, NEUTRAL_SCALE);
        (
            build_channel(&translations, |ratio, previous, v| Float3Key {
                ratio,
                previous,
                value: quantize_float3(v),
            }),
            build_channel(&rotations, |ratio, previous, q| {
                let (largest, sign, value) = quantize_quat(q);
                QuaternionKey {
                    ratio,
                    previous,
                    largest,
                    sign,
                    value,
                }
            }),
            build_channel(&scales, |ratio, previous, v| Float3Key {
                ratio,
                previous,
                value: quantize_float3(v),
            }),
        )
    };
    Animation::new(AnimationDesc {
        name: name.to_string(),
        duration: 1.0,
        num_tracks,
        translations,
        rotations,
        scales,
    })
    .expect("support builder must emit valid streams")
}

/// A clip where only the translation channel varies: `tracks[i]` animates
/// track i, rotations stay identity and scales stay one.
pub fn translation_clip(name: &str, tracks: Vec<Vec<(f32, [f32; 3])>>) -> Animation {
    let num_tracks = tracks.len();
    make_animation(name, num_tracks, tracks, Vec::new(), Vec::new())
}

/// Read back one lane of a wide transform buffer.
pub fn lane_translation(
    output: &[kestrel_animation_core::SoaTransform],
    track: usize,
) -> [f32; 3] {
    let group = &output[track / 4].translation;
    let lane = track % 4;
    [
        group.x.to_array()[lane],
        group.y.to_array()[lane],
        group.z.to_array()[lane],
    ]
}

pub fn lane_rotation(output: &[kestrel_animation_core::SoaTransform], track: usize) -> [f32; 4] {
    let group = &output[track / 4].rotation;
    let lane = track % 4;
    [
        group.x.to_array()[lane],
        group.y.to_array()[lane],
        group.z.to_array()[lane],
        group.w.to_array()[lane],
    ]
}

pub fn lane_scale(output: &[kestrel_animation_core::SoaTransform], track: usize) -> [f32; 3] {
    let group = &output[track / 4].scale;
    let lane = track % 4;
    [
        group.x.to_array()[lane],
        group.y.to_array()[lane],
        group.z.to_array()[lane],
    ]
}
