//! Loading of node hierarchies and track definitions from JSON.
//!
//! Callbacks cannot be serialized, so frame actions and procedural evaluators are referenced
//! by name and resolved through an [`ActionRegistry`].

use crate::{
    Error, Evaluator, FrameAction, FrameActionContext, FrameCallback, KeyframedData, NodeData,
    ProceduralData, ProceduralSample, SkeletonData, TrackData, TrackKind, Transform,
};
use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RigDef {
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    tracks: Vec<TrackDef>,
}

#[derive(Debug, Deserialize)]
struct SkeletonDef {
    #[serde(default)]
    nodes: Vec<NodeDef>,
}

fn default_one() -> f32 {
    1.0
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct TransformDef {
    #[serde(default)]
    translation: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    #[serde(default = "default_rotation")]
    rotation: [f32; 4],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
}

impl TransformDef {
    fn to_transform(self) -> Transform {
        let rotation = Quat::from_array(self.rotation);
        Transform {
            translation: Vec3::from_array(self.translation),
            rotation: if rotation.length_squared() > 0.0 {
                rotation.normalize()
            } else {
                Quat::IDENTITY
            },
            scale: Vec3::from_array(self.scale),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NodeDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(flatten)]
    transform: TransformDef,
    /// Column-major inverse reference matrix.
    #[serde(default)]
    bind: Option<[f32; 16]>,
}

#[derive(Debug, Deserialize)]
struct TrackDef {
    name: String,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_one")]
    weight: f32,
    #[serde(default, rename = "blendIn")]
    blend_in: f32,
    #[serde(default, rename = "blendOut")]
    blend_out: f32,
    #[serde(default, rename = "loop")]
    looped: bool,
    #[serde(default)]
    exclusive: bool,
    #[serde(default)]
    keyframed: Option<KeyframedDef>,
    #[serde(default)]
    procedural: Option<ProceduralDef>,
    #[serde(default)]
    sequential: Option<Vec<TrackDef>>,
}

#[derive(Debug, Deserialize)]
struct KeyframedDef {
    #[serde(rename = "frameRate")]
    frame_rate: f32,
    #[serde(default)]
    transition: f32,
    #[serde(default)]
    offset: f32,
    targets: Vec<String>,
    frames: Vec<Vec<TransformDef>>,
    #[serde(default)]
    actions: Vec<ActionKey>,
}

#[derive(Debug, Deserialize)]
struct ActionKey {
    frame: f32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProceduralDef {
    targets: Vec<String>,
    evaluator: String,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    offset: f32,
}

/// Named callbacks that JSON track definitions refer to.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, FrameCallback>,
    evaluators: HashMap<String, Evaluator>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("evaluators", &self.evaluators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_action(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&FrameActionContext<'_>) + Send + Sync + 'static,
    ) {
        self.actions.insert(name.into(), Arc::new(callback));
    }

    pub fn register_evaluator(
        &mut self,
        name: impl Into<String>,
        evaluator: impl Fn(&ProceduralSample) -> Option<Transform> + Send + Sync + 'static,
    ) {
        self.evaluators.insert(name.into(), Arc::new(evaluator));
    }

    pub fn with_action(
        mut self,
        name: impl Into<String>,
        callback: impl Fn(&FrameActionContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.register_action(name, callback);
        self
    }

    pub fn with_evaluator(
        mut self,
        name: impl Into<String>,
        evaluator: impl Fn(&ProceduralSample) -> Option<Transform> + Send + Sync + 'static,
    ) -> Self {
        self.register_evaluator(name, evaluator);
        self
    }
}

/// A hierarchy together with the tracks authored for it.
#[derive(Clone, Debug)]
pub struct Rig {
    pub skeleton: Arc<SkeletonData>,
    pub tracks: Vec<TrackData>,
}

impl Rig {
    pub fn from_json_str(input: &str, registry: &ActionRegistry) -> Result<Self, Error> {
        let root: RigDef = parse(input)?;
        let skeleton = Arc::new(convert_nodes(root.nodes));
        let tracks = root
            .tracks
            .into_iter()
            .map(|t| convert_track(t, registry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { skeleton, tracks })
    }
}

impl SkeletonData {
    /// Reads the `nodes` array of a rig document; any other key is ignored.
    pub fn from_json_str(input: &str) -> Result<Arc<Self>, Error> {
        let root: SkeletonDef = parse(input)?;
        Ok(Arc::new(convert_nodes(root.nodes)))
    }
}

impl TrackData {
    /// Reads a single track object.
    pub fn from_json_str(input: &str, registry: &ActionRegistry) -> Result<Self, Error> {
        let def: TrackDef = parse(input)?;
        convert_track(def, registry)
    }
}

fn parse<'de, T: Deserialize<'de>>(input: &'de str) -> Result<T, Error> {
    serde_json::from_str(input).map_err(|e| Error::JsonParse {
        message: e.to_string(),
    })
}

fn convert_nodes(nodes: Vec<NodeDef>) -> SkeletonData {
    SkeletonData {
        nodes: nodes
            .into_iter()
            .map(|n| NodeData {
                name: n.name,
                parent: n.parent,
                transform: n.transform.to_transform(),
                bind: n.bind.map(|m| Mat4::from_cols_array(&m)),
            })
            .collect(),
    }
}

fn convert_track(def: TrackDef, registry: &ActionRegistry) -> Result<TrackData, Error> {
    let kinds = usize::from(def.keyframed.is_some())
        + usize::from(def.procedural.is_some())
        + usize::from(def.sequential.is_some());
    if kinds != 1 {
        return Err(Error::JsonAmbiguousTrackKind { track: def.name });
    }

    let kind = if let Some(k) = def.keyframed {
        let actions = k
            .actions
            .into_iter()
            .map(|key| {
                let callback = registry.actions.get(&key.name).cloned().ok_or_else(|| {
                    Error::JsonUnknownFrameAction {
                        track: def.name.clone(),
                        action: key.name.clone(),
                    }
                })?;
                Ok(FrameAction {
                    frame: key.frame,
                    name: key.name,
                    callback,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        TrackKind::Keyframed(KeyframedData {
            frame_rate: k.frame_rate,
            transition: k.transition,
            offset: k.offset,
            targets: k.targets,
            frames: k
                .frames
                .into_iter()
                .map(|frame| frame.into_iter().map(TransformDef::to_transform).collect())
                .collect(),
            actions,
        })
    } else if let Some(p) = def.procedural {
        let evaluator = registry.evaluators.get(&p.evaluator).cloned().ok_or_else(|| {
            Error::JsonUnknownEvaluator {
                track: def.name.clone(),
                evaluator: p.evaluator.clone(),
            }
        })?;
        TrackKind::Procedural(ProceduralData {
            targets: p.targets,
            evaluator,
            duration: p.duration,
            offset: p.offset,
        })
    } else {
        let children = def
            .sequential
            .unwrap_or_default()
            .into_iter()
            .map(|child| convert_track(child, registry))
            .collect::<Result<Vec<_>, _>>()?;
        TrackKind::Sequential(children)
    };

    let data = TrackData {
        name: def.name,
        priority: def.priority,
        weight: def.weight,
        blend_in: def.blend_in,
        blend_out: def.blend_out,
        looped: def.looped,
        exclusive: def.exclusive,
        kind,
    };
    data.validate()?;
    Ok(data)
}
