use crate::{Error, Transform};
use glam::Mat4;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NodeData {
    pub name: String,
    pub parent: Option<String>,
    /// Setup (rest) local transform.
    pub transform: Transform,
    /// Inverse reference transform used for skinning.
    pub bind: Option<Mat4>,
}

impl NodeData {
    pub fn new(name: impl Into<String>, parent: Option<&str>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            transform,
            bind: None,
        }
    }
}

/// Immutable node topology. Nodes may be listed in any order; the runtime skeleton stores them
/// in preorder.
#[derive(Clone, Debug, Default)]
pub struct SkeletonData {
    pub nodes: Vec<NodeData>,
}

/// Information handed to a frame action when playback crosses its threshold.
#[derive(Clone, Copy, Debug)]
pub struct FrameActionContext<'a> {
    pub track: &'a str,
    pub action: &'a str,
    pub frame: f32,
    pub position: f32,
    pub loop_count: u32,
}

pub type FrameCallback = Arc<dyn Fn(&FrameActionContext<'_>) + Send + Sync>;

#[derive(Clone)]
pub struct FrameAction {
    pub frame: f32,
    pub name: String,
    pub callback: FrameCallback,
}

impl FrameAction {
    pub fn new(
        frame: f32,
        name: impl Into<String>,
        callback: impl Fn(&FrameActionContext<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            frame,
            name: name.into(),
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for FrameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAction")
            .field("frame", &self.frame)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProceduralSample {
    /// Track clock in seconds.
    pub time: f32,
    /// Index into [`ProceduralData::targets`].
    pub target: usize,
}

pub type Evaluator = Arc<dyn Fn(&ProceduralSample) -> Option<Transform> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct KeyframedData {
    pub frame_rate: f32,
    /// Cross-fade time from the current pose into the start frame.
    pub transition: f32,
    /// Start offset in seconds.
    pub offset: f32,
    pub targets: Vec<String>,
    /// `frames[frame][target]`.
    pub frames: Vec<Vec<Transform>>,
    pub actions: Vec<FrameAction>,
}

impl KeyframedData {
    pub fn new(frame_rate: f32, targets: Vec<String>, frames: Vec<Vec<Transform>>) -> Self {
        Self {
            frame_rate,
            transition: 0.0,
            offset: 0.0,
            targets,
            frames,
            actions: Vec::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Clone)]
pub struct ProceduralData {
    pub targets: Vec<String>,
    pub evaluator: Evaluator,
    /// `None` plays forever.
    pub duration: Option<f32>,
    pub offset: f32,
}

impl ProceduralData {
    pub fn new(
        targets: Vec<String>,
        evaluator: impl Fn(&ProceduralSample) -> Option<Transform> + Send + Sync + 'static,
    ) -> Self {
        Self {
            targets,
            evaluator: Arc::new(evaluator),
            duration: None,
            offset: 0.0,
        }
    }
}

impl fmt::Debug for ProceduralData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProceduralData")
            .field("targets", &self.targets)
            .field("duration", &self.duration)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum TrackKind {
    Keyframed(KeyframedData),
    Procedural(ProceduralData),
    Sequential(Vec<TrackData>),
}

#[derive(Clone, Debug)]
pub struct TrackData {
    pub name: String,
    pub priority: i32,
    /// Weight the track ramps to when started.
    pub weight: f32,
    pub blend_in: f32,
    pub blend_out: f32,
    pub looped: bool,
    /// Blends out every other track of the same priority when started at full weight.
    pub exclusive: bool,
    pub kind: TrackKind,
}

impl TrackData {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            weight: 1.0,
            blend_in: 0.0,
            blend_out: 0.0,
            looped: false,
            exclusive: false,
            kind,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: &str| Error::InvalidTrack {
            track: self.name.clone(),
            message: message.to_string(),
        };

        if !self.weight.is_finite() || !(0.0..=1.0).contains(&self.weight) {
            return Err(invalid("weight must be within [0, 1]"));
        }
        if !is_interval(self.blend_in) || !is_interval(self.blend_out) {
            return Err(invalid("blend intervals must be finite and >= 0"));
        }

        match &self.kind {
            TrackKind::Keyframed(data) => {
                if !data.frame_rate.is_finite() || data.frame_rate <= 0.0 {
                    return Err(invalid("frame rate must be finite and > 0"));
                }
                if !is_interval(data.transition) || !is_interval(data.offset) {
                    return Err(invalid("transition and offset must be finite and >= 0"));
                }
                if data.frames.is_empty() {
                    return Err(invalid("keyframed track has no frames"));
                }
                if data.frames.iter().any(|f| f.len() != data.targets.len()) {
                    return Err(invalid("every frame must hold one transform per target"));
                }
                if data.frames.iter().flatten().any(|t| !t.is_finite()) {
                    return Err(invalid("keyframe transforms must be finite"));
                }
                if data.actions.iter().any(|a| !a.frame.is_finite()) {
                    return Err(invalid("frame action thresholds must be finite"));
                }
            }
            TrackKind::Procedural(data) => {
                if let Some(duration) = data.duration {
                    if !duration.is_finite() || duration <= 0.0 {
                        return Err(invalid("procedural duration must be finite and > 0"));
                    }
                }
                if !is_interval(data.offset) {
                    return Err(invalid("offset must be finite and >= 0"));
                }
            }
            TrackKind::Sequential(children) => {
                if children.is_empty() {
                    return Err(invalid("sequential track has no children"));
                }
                for child in children {
                    child.validate()?;
                }
            }
        }
        Ok(())
    }
}

fn is_interval(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
