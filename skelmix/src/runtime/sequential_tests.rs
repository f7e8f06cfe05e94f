use crate::runtime::{AnimationTrack, Playback, SequentialPlayback};
use crate::test_support::{chain_skeleton, clock_track, constant_track, local_x};
use crate::{Error, TrackData, TrackKind};

fn sequential(track: &AnimationTrack) -> &SequentialPlayback {
    match track.playback() {
        Playback::Sequential(s) => s,
        other => panic!("expected sequential playback, got {other:?}"),
    }
}

fn timed(name: &str, x: f32, duration: f32) -> TrackData {
    let mut data = constant_track(name, "root", x);
    if let TrackKind::Procedural(p) = &mut data.kind {
        p.duration = Some(duration);
    }
    data
}

fn combo(looped: bool) -> TrackData {
    let mut data = TrackData::new(
        "combo",
        TrackKind::Sequential(vec![timed("a", 1.0, 2.0), timed("b", 2.0, 1.0)]),
    );
    data.looped = looped;
    data
}

#[test]
fn children_play_in_order_and_the_sequence_completes_after_the_last() {
    let mut skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(combo(false), &skeleton).unwrap();
    track.start();
    assert_eq!(sequential(&track).active_index(), 0);

    assert!(!track.tick(1.0));
    track.update_transforms(&mut skeleton);
    assert_eq!(local_x(&skeleton, "root"), 1.0);

    assert!(!track.tick(1.0));
    assert_eq!(sequential(&track).active_index(), 1);
    assert_eq!(sequential(&track).active().unwrap().name(), "b");
    track.update_transforms(&mut skeleton);
    assert_eq!(local_x(&skeleton, "root"), 2.0);

    assert!(!track.tick(0.5));
    assert!(track.tick(0.5));
    assert!(track.is_completed());
}

#[test]
fn looped_sequence_restarts_from_the_first_child() {
    let skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(combo(true), &skeleton).unwrap();
    track.start();

    assert!(!track.tick(2.0));
    assert!(!track.tick(1.0));
    let playback = sequential(&track);
    assert_eq!(playback.active_index(), 0);
    assert!(playback.children()[0].is_playing());
    assert!(track.is_playing());
}

#[test]
fn restarting_rewinds_to_the_first_child() {
    let skeleton = chain_skeleton(&["root"]);
    let mut track = AnimationTrack::new(combo(false), &skeleton).unwrap();
    track.start();
    track.tick(2.0);
    assert_eq!(sequential(&track).active_index(), 1);

    track.start();
    assert_eq!(sequential(&track).active_index(), 0);
}

#[test]
fn effective_weight_includes_the_active_child() {
    let skeleton = chain_skeleton(&["root"]);
    let mut child = clock_track("half", "root", None);
    child.weight = 0.5;
    let mut data = TrackData::new("combo", TrackKind::Sequential(vec![child]));
    data.weight = 0.8;
    let mut track = AnimationTrack::new(data, &skeleton).unwrap();
    track.start();
    assert!((track.effective_weight() - 0.4).abs() < 1.0e-6);
}

#[test]
fn sequences_have_no_blend_out_countdown() {
    let skeleton = chain_skeleton(&["root"]);
    let mut data = combo(false);
    data.blend_out = 0.5;
    let mut track = AnimationTrack::new(data, &skeleton).unwrap();
    track.start();
    assert_eq!(track.blend_out_countdown(), None);
}

#[test]
fn empty_sequences_are_rejected() {
    let skeleton = chain_skeleton(&["root"]);
    let err =
        AnimationTrack::new(TrackData::new("combo", TrackKind::Sequential(Vec::new())), &skeleton)
            .unwrap_err();
    assert!(matches!(err, Error::InvalidTrack { track, .. } if track == "combo"));
}
