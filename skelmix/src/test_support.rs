use crate::{
    KeyframedData, NodeData, ProceduralData, Skeleton, SkeletonData, TrackData, TrackKind,
    Transform,
};
use glam::Vec3;
use std::sync::Arc;

/// `names[0]` is the root; every following node is parented to the one before it.
pub(crate) fn chain_data(names: &[&str]) -> Arc<SkeletonData> {
    let nodes = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let parent = i.checked_sub(1).map(|p| names[p]);
            NodeData::new(*name, parent, Transform::IDENTITY)
        })
        .collect();
    Arc::new(SkeletonData { nodes })
}

pub(crate) fn chain_skeleton(names: &[&str]) -> Skeleton {
    Skeleton::new(chain_data(names)).expect("chain skeleton")
}

pub(crate) fn tx(x: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, 0.0, 0.0))
}

/// One target moving along x, one frame per entry of `xs`.
pub(crate) fn keyframed(target: &str, frame_rate: f32, xs: &[f32]) -> KeyframedData {
    KeyframedData::new(
        frame_rate,
        vec![target.to_string()],
        xs.iter().map(|&x| vec![tx(x)]).collect(),
    )
}

pub(crate) fn keyframed_track(name: &str, target: &str, frame_rate: f32, xs: &[f32]) -> TrackData {
    TrackData::new(name, TrackKind::Keyframed(keyframed(target, frame_rate, xs)))
}

/// Holds `target` at `x` forever.
pub(crate) fn constant_track(name: &str, target: &str, x: f32) -> TrackData {
    let data = ProceduralData::new(vec![target.to_string()], move |_| Some(tx(x)));
    TrackData::new(name, TrackKind::Procedural(data))
}

/// Moves `target` along x at one unit per second of track time.
pub(crate) fn clock_track(name: &str, target: &str, duration: Option<f32>) -> TrackData {
    let mut data = ProceduralData::new(vec![target.to_string()], |s| Some(tx(s.time)));
    data.duration = duration;
    TrackData::new(name, TrackKind::Procedural(data))
}

pub(crate) fn local_x(skeleton: &Skeleton, name: &str) -> f32 {
    skeleton
        .node_by_name(name)
        .expect("node")
        .local
        .translation
        .x
}
