use crate::runtime::{AnimationTrack, Playback, ProceduralPlayback};
use crate::test_support::{chain_skeleton, clock_track, local_x, tx};
use crate::{ProceduralData, TrackData, TrackKind};

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-6,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn procedural(track: &AnimationTrack) -> &ProceduralPlayback {
    match track.playback() {
        Playback::Procedural(p) => p,
        other => panic!("expected procedural playback, got {other:?}"),
    }
}

#[test]
fn evaluator_sees_the_track_clock() {
    let mut skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(clock_track("bob", "root", None), &skeleton).unwrap();
    track.start();

    track.tick(0.5);
    track.update_transforms(&mut skeleton);
    assert_approx(local_x(&skeleton, "root"), 0.5);

    track.tick(0.25);
    track.update_transforms(&mut skeleton);
    assert_approx(local_x(&skeleton, "root"), 0.75);
}

#[test]
fn unbounded_tracks_never_complete() {
    let skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(clock_track("bob", "root", None), &skeleton).unwrap();
    track.start();
    for _ in 0..100 {
        assert!(!track.tick(1.0));
    }
    assert_eq!(procedural(&track).duration(), None);
    assert!(track.is_playing());
}

#[test]
fn bounded_track_completes_at_its_duration() {
    let skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(clock_track("bob", "root", Some(1.0)), &skeleton).unwrap();
    track.start();
    assert!(!track.tick(0.6));
    assert!(track.tick(0.6));
    assert_eq!(procedural(&track).time(), 1.0);
}

#[test]
fn looped_track_wraps_its_clock() {
    let skeleton = chain_skeleton(&["root"]);
    let mut data = clock_track("bob", "root", Some(1.0));
    data.looped = true;
    let mut track = AnimationTrack::new(data, &skeleton).unwrap();
    track.start();
    assert!(!track.tick(0.75));
    assert!(!track.tick(0.75));
    assert_approx(procedural(&track).time(), 0.5);
}

#[test]
fn offset_starts_inside_the_duration() {
    let skeleton = chain_skeleton(&["root"]);
    let mut data = clock_track("bob", "root", Some(2.0));
    if let TrackKind::Procedural(p) = &mut data.kind {
        p.offset = 3.0;
    }
    let mut track = AnimationTrack::new(data, &skeleton).unwrap();
    track.start();
    assert_approx(procedural(&track).time(), 1.0);
}

#[test]
fn evaluator_may_leave_targets_alone() {
    let mut skeleton = chain_skeleton(&["a", "b"]);
    skeleton.nodes[1].local = tx(9.0);
    let data = ProceduralData::new(vec!["a".to_string(), "b".to_string()], |s| {
        (s.target == 0).then(|| tx(1.0))
    });
    let mut track =
        AnimationTrack::new(TrackData::new("half", TrackKind::Procedural(data)), &skeleton)
            .unwrap();
    track.start();
    track.tick(0.1);
    track.update_transforms(&mut skeleton);

    assert_eq!(local_x(&skeleton, "a"), 1.0);
    assert_eq!(local_x(&skeleton, "b"), 9.0);
}

#[test]
fn samples_use_target_slots() {
    let mut skeleton = chain_skeleton(&["a"]);
    let data = ProceduralData::new(vec!["missing".to_string(), "a".to_string()], |s| {
        Some(tx(s.target as f32 * 10.0))
    });
    let mut track =
        AnimationTrack::new(TrackData::new("slots", TrackKind::Procedural(data)), &skeleton)
            .unwrap();
    track.start();
    track.tick(0.1);
    track.update_transforms(&mut skeleton);
    assert_eq!(local_x(&skeleton, "a"), 10.0);
}

#[test]
fn negative_drift_clamps_the_clock() {
    let skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(clock_track("bob", "root", None), &skeleton).unwrap();
    track.start();
    track.set_speed(-2.0);
    assert!(!track.tick(0.5));
    assert_eq!(procedural(&track).time(), 0.0);
}
