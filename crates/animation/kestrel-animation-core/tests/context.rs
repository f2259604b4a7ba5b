mod support;

use kestrel_animation_core::{
    Animation, SamplingConfig, SamplingContext, SamplingJob, SoaTransform,
};
use support::*;

fn clip(name: &str) -> Animation {
    // Two groups, uneven key distribution so cursors actually move.
    let tracks: Vec<Vec<(f32, [f32; 3])>> = (0..7)
        .map(|t| {
            let t = t as f32;
            vec![
                (0.0, [0.0, t, 0.0]),
                (0.1 + t * 0.02, [1.0, t, 0.0]),
                (0.5, [2.0, t, 1.0]),
                (0.8 + t * 0.01, [3.0, t, 2.0]),
                (1.0, [4.0, t, 3.0]),
            ]
        })
        .collect();
    translation_clip(name, tracks)
}

fn run_with(
    animation: &Animation,
    context: &mut SamplingContext,
    ratio: f32,
) -> Vec<SoaTransform> {
    let mut output = vec![SoaTransform::IDENTITY; animation.num_soa_tracks()];
    let mut job = SamplingJob {
        animation: Some(animation),
        context: Some(context),
        ratio,
        output: &mut output,
    };
    job.run().unwrap();
    output
}

fn fresh_sample(animation: &Animation, ratio: f32) -> Vec<SoaTransform> {
    let mut context = SamplingContext::with_capacity(animation.num_tracks());
    run_with(animation, &mut context, ratio)
}

/// it should produce bit-identical output after a small rewind (backward walk)
#[test]
fn small_rewind_matches_fresh() {
    let animation = clip("small-rewind");
    let mut context = SamplingContext::with_capacity(animation.num_tracks());

    run_with(&animation, &mut context, 0.6);
    let rewound = run_with(&animation, &mut context, 0.5);
    assert_eq!(rewound, fresh_sample(&animation, 0.5));
}

/// it should produce bit-identical output after a big rewind (cursor reset)
#[test]
fn big_rewind_matches_fresh() {
    let animation = clip("big-rewind");
    let mut context = SamplingContext::with_capacity(animation.num_tracks());

    run_with(&animation, &mut context, 0.9);
    let rewound = run_with(&animation, &mut context, 0.1);
    assert_eq!(rewound, fresh_sample(&animation, 0.1));
}

/// it should stay correct on both sides of the restart threshold
#[test]
fn rewind_across_restart_threshold() {
    let animation = clip("threshold");

    // Previous ratio below the threshold: rewind branch.
    let mut context = SamplingContext::with_capacity(animation.num_tracks());
    run_with(&animation, &mut context, 0.04);
    let low = run_with(&animation, &mut context, 0.001);
    assert_eq!(low, fresh_sample(&animation, 0.001));

    // Previous ratio above the threshold and far ahead: restart branch.
    let mut context = SamplingContext::with_capacity(animation.num_tracks());
    run_with(&animation, &mut context, 0.06);
    let high = run_with(&animation, &mut context, 0.001);
    assert_eq!(high, fresh_sample(&animation, 0.001));
}

/// it should honor a custom restart threshold
#[test]
fn configured_restart_threshold() {
    let animation = clip("configured");
    let config = SamplingConfig {
        restart_overhead: 0.5,
    };
    let mut context = SamplingContext::with_config(animation.num_tracks(), config);

    // 0.45 is below the configured threshold, so this large rewind takes the
    // backward walk; output must still be exact.
    run_with(&animation, &mut context, 0.45);
    let rewound = run_with(&animation, &mut context, 0.01);
    assert_eq!(rewound, fresh_sample(&animation, 0.01));
}

/// it should match fresh sampling across a forward sweep then a reverse sweep
#[test]
fn sweep_forward_then_backward() {
    let animation = clip("sweep");
    let mut context = SamplingContext::with_capacity(animation.num_tracks());

    let steps = 40;
    let mut forward = Vec::new();
    for step in 0..=steps {
        let ratio = step as f32 / steps as f32;
        forward.push(run_with(&animation, &mut context, ratio));
    }
    for step in (0..=steps).rev() {
        let ratio = step as f32 / steps as f32;
        let back = run_with(&animation, &mut context, ratio);
        assert_eq!(back, forward[step], "ratio {ratio}");
    }
}

/// it should re-seed cleanly when the same context samples a different clip
#[test]
fn reuse_across_clips() {
    let first = clip("first");
    let second = {
        let tracks: Vec<Vec<(f32, [f32; 3])>> = (0..7)
            .map(|t| {
                let t = t as f32;
                vec![
                    (0.0, [-1.0, -t, 0.0]),
                    (0.3, [5.0, t, t]),
                    (1.0, [-4.0, 0.0, t]),
                ]
            })
            .collect();
        translation_clip("second", tracks)
    };
    assert_eq!(first.num_soa_tracks(), second.num_soa_tracks());

    let mut context = SamplingContext::with_capacity(first.num_tracks());
    run_with(&first, &mut context, 0.5);

    // Same ratio on the other clip: no stale brackets may leak through.
    let switched = run_with(&second, &mut context, 0.5);
    assert_eq!(switched, fresh_sample(&second, 0.5));
}

/// it should discard cached progress on resize and on invalidate
#[test]
fn resize_and_invalidate_reset_state() {
    let animation = clip("reset");
    let mut context = SamplingContext::with_capacity(animation.num_tracks());

    run_with(&animation, &mut context, 0.7);
    context.invalidate();
    assert_eq!(
        run_with(&animation, &mut context, 0.2),
        fresh_sample(&animation, 0.2)
    );

    run_with(&animation, &mut context, 0.7);
    context.resize(animation.num_tracks());
    assert_eq!(
        run_with(&animation, &mut context, 0.2),
        fresh_sample(&animation, 0.2)
    );
}

/// it should keep sampling correctly when the ratio never moves
#[test]
fn repeated_same_ratio() {
    let animation = clip("steady");
    let mut context = SamplingContext::with_capacity(animation.num_tracks());

    let first = run_with(&animation, &mut context, 0.33);
    for _ in 0..3 {
        assert_eq!(run_with(&animation, &mut context, 0.33), first);
    }
}
