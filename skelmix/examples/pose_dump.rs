use glam::{Quat, Vec3};
use serde_json::json;
use skelmix::json::{ActionRegistry, Rig};
use skelmix::{BlendCoordinator, TrackEvent, TrackSnapshot, Transform};
use std::path::PathBuf;

fn registry() -> ActionRegistry {
    ActionRegistry::new()
        .with_action("log", |ctx| {
            eprintln!(
                "action '{}' on '{}' at frame {:.2} (loop {})",
                ctx.action, ctx.track, ctx.position, ctx.loop_count
            );
        })
        .with_evaluator("sway", |s| {
            let angle = (s.time * std::f32::consts::TAU * 0.5).sin() * 0.2;
            Some(Transform::from_rotation(Quat::from_rotation_z(angle)))
        })
        .with_evaluator("raise", |s| {
            let angle = (s.time / 0.5).min(1.0) * std::f32::consts::FRAC_PI_2;
            Some(Transform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::from_rotation_z(angle),
                Vec3::ONE,
            ))
        })
        .with_evaluator("hold", |_| {
            Some(Transform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::ONE,
            ))
        })
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut step = 1.0 / 60.0;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--step" => {
                step = args
                    .get(i + 1)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(step);
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let rig_path = positional
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/arm.json")));
    let tracks = positional
        .get(1)
        .cloned()
        .unwrap_or_else(|| "wave,sway".to_string());
    let time: f32 = positional
        .get(2)
        .cloned()
        .unwrap_or_else(|| "1.0".to_string())
        .parse()
        .unwrap_or(1.0);

    let json = std::fs::read_to_string(&rig_path).expect("read rig json");
    let rig = Rig::from_json_str(&json, &registry()).expect("parse rig");

    let mut coordinator = BlendCoordinator::from_data(rig.skeleton).expect("build skeleton");
    coordinator.set_listener(|track: &TrackSnapshot, event: &TrackEvent| {
        eprintln!("{}: {event:?}", track.name);
    });
    for track in rig.tracks {
        coordinator.add_track(track).expect("add track");
    }
    for name in tracks.split(',').filter(|s| !s.is_empty()) {
        coordinator.play(name).expect("play track");
    }

    let step = step.max(1.0e-4);
    let mut elapsed = 0.0f32;
    while elapsed < time {
        let delta = step.min(time - elapsed);
        coordinator.tick(delta);
        elapsed += delta;
    }

    let skeleton = coordinator.skeleton();
    let nodes: Vec<_> = skeleton
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let world = node.world.w_axis;
            let local = node.local;
            json!({
                "i": i,
                "name": node.name(),
                "parent": node.parent_index(),
                "world": {"x": world.x, "y": world.y, "z": world.z},
                "local": {
                    "translation": local.translation.to_array(),
                    "rotation": local.rotation.to_array(),
                    "scale": local.scale.to_array(),
                },
            })
        })
        .collect();

    let playing: Vec<_> = coordinator
        .playing_tracks()
        .map(|t| json!({"name": t.name(), "priority": t.priority(), "weight": t.effective_weight()}))
        .collect();

    let out = json!({
        "time": elapsed,
        "nodes": nodes,
        "playing": playing,
    });
    println!("{}", serde_json::to_string_pretty(&out).expect("serialize"));
}
