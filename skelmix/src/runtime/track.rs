use super::keyframed::KeyframedPlayback;
use super::procedural::ProceduralPlayback;
use super::sequential::SequentialPlayback;
use crate::{Error, Node, Skeleton, TickId, TrackData, TrackKind, Transform};
use std::sync::Arc;

/// Playback strategy of a track, selected once from the track's [`TrackKind`].
#[derive(Clone, Debug)]
pub enum Playback {
    Keyframed(KeyframedPlayback),
    Procedural(ProceduralPlayback),
    Sequential(SequentialPlayback),
}

impl Playback {
    pub fn new(data: &TrackData, skeleton: &Skeleton) -> Result<Self, Error> {
        Ok(match &data.kind {
            TrackKind::Keyframed(k) => {
                Self::Keyframed(KeyframedPlayback::new(&data.name, k, data.looped, skeleton))
            }
            TrackKind::Procedural(p) => {
                Self::Procedural(ProceduralPlayback::new(&data.name, p, data.looped, skeleton))
            }
            TrackKind::Sequential(children) => {
                Self::Sequential(SequentialPlayback::new(children, data.looped, skeleton)?)
            }
        })
    }

    fn start(&mut self) {
        match self {
            Self::Keyframed(k) => k.start(),
            Self::Procedural(p) => p.start(),
            Self::Sequential(s) => s.start(),
        }
    }

    fn tick(&mut self, delta: f32, track: &str) -> bool {
        match self {
            Self::Keyframed(k) => k.tick(delta, track),
            Self::Procedural(p) => p.tick(delta, track),
            Self::Sequential(s) => s.tick(delta, track),
        }
    }

    fn remaining_time(&self) -> Option<f32> {
        match self {
            Self::Keyframed(k) => Some(k.remaining_time()),
            Self::Procedural(p) => p.remaining_time(),
            Self::Sequential(_) => None,
        }
    }

    fn inner_weight(&self) -> f32 {
        match self {
            Self::Sequential(s) => s.active_weight(),
            Self::Keyframed(_) | Self::Procedural(_) => 1.0,
        }
    }

    fn capture_transition(&mut self, skeleton: &Skeleton) {
        match self {
            Self::Keyframed(k) => k.capture_transition(skeleton),
            Self::Sequential(s) => s.capture_transition(skeleton),
            Self::Procedural(_) => {}
        }
    }

    fn rebind(&mut self, track: &str, skeleton: &Skeleton) {
        match self {
            Self::Keyframed(k) => k.rebind(track, skeleton),
            Self::Procedural(p) => p.rebind(track, skeleton),
            Self::Sequential(s) => s.rebind(skeleton),
        }
    }

    /// Node indices this playback currently writes; `None` marks an unresolved target.
    pub fn targets(&self) -> &[Option<usize>] {
        match self {
            Self::Keyframed(k) => k.targets(),
            Self::Procedural(p) => p.targets(),
            Self::Sequential(s) => s.active().map_or(&[][..], |c| c.playback().targets()),
        }
    }

    pub(crate) fn write_pose(
        &mut self,
        skeleton: &mut Skeleton,
        write: &mut dyn FnMut(&mut Node, &Transform),
    ) {
        match self {
            Self::Keyframed(k) => k.write_pose(skeleton, write),
            Self::Procedural(p) => p.write_pose(skeleton, write),
            Self::Sequential(s) => s.write_pose(skeleton, write),
        }
    }
}

/// One playing instance of a track definition: a weight ramp on top of a [`Playback`].
///
/// There are no discrete states. A track is idle until [`start`](Self::start), blends in while
/// `weight < target_weight`, blends out once the target is 0, and stops when both reach 0.
/// Reaching the end of a non-looping playback is reported separately as completion.
#[derive(Clone, Debug)]
pub struct AnimationTrack {
    data: Arc<TrackData>,
    weight: f32,
    target_weight: f32,
    rate: f32,
    speed: f32,
    active: bool,
    completed: bool,
    blend_out_countdown: Option<f32>,
    playback: Playback,
}

impl AnimationTrack {
    pub fn new(data: TrackData, skeleton: &Skeleton) -> Result<Self, Error> {
        data.validate()?;
        let playback = Playback::new(&data, skeleton)?;
        Ok(Self {
            data: Arc::new(data),
            weight: 0.0,
            target_weight: 0.0,
            rate: 0.0,
            speed: 1.0,
            active: false,
            completed: false,
            blend_out_countdown: None,
            playback,
        })
    }

    pub fn data(&self) -> &TrackData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn priority(&self) -> i32 {
        self.data.priority
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn blend_out_countdown(&self) -> Option<f32> {
        self.blend_out_countdown
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub(crate) fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.active
    }

    /// True once playback reached the end of a non-looping pass. Cleared by `start`.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Weight used when blending: the track weight times the active child's weight for
    /// sequential tracks.
    pub fn effective_weight(&self) -> f32 {
        self.weight * self.playback.inner_weight()
    }

    /// Playback speed multiplier, applied to the frame rate and the procedural clock but not to
    /// weight ramps.
    pub fn set_speed(&mut self, multiplier: f32) {
        if multiplier.is_finite() {
            self.speed = multiplier;
        }
    }

    /// Ramps linearly from the current weight to `target` over `interval` seconds; snaps when
    /// the interval is 0. A target of 0 cancels a pending automatic blend-out.
    pub fn set_blend_target(&mut self, target: f32, interval: f32) {
        let target = if target.is_finite() {
            target.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.target_weight = target;
        if interval.is_finite() && interval > 0.0 {
            self.rate = (target - self.weight) / interval;
        } else {
            self.weight = target;
            self.rate = 0.0;
        }
        if target == 0.0 {
            self.blend_out_countdown = None;
        }
    }

    /// Starts (or restarts) playback and blends in toward the configured weight.
    ///
    /// Returns the interval over which the owner should blend out the other tracks of the same
    /// priority when this track is exclusive at full weight.
    pub fn start(&mut self) -> Option<f32> {
        self.active = true;
        self.completed = false;
        self.playback.start();
        self.set_blend_target(self.data.weight, self.data.blend_in);

        self.blend_out_countdown = None;
        if !self.data.looped && self.data.blend_out > 0.0 {
            if let Some(remaining) = self.playback.remaining_time() {
                self.blend_out_countdown = Some((remaining - self.data.blend_out).max(0.0));
            }
        }

        log::debug!(
            "track '{}' started (priority {}, weight {} over {}s)",
            self.data.name,
            self.data.priority,
            self.data.weight,
            self.data.blend_in
        );

        (self.data.exclusive && self.data.weight >= 1.0).then_some(self.data.blend_in)
    }

    /// Blends out over the configured blend-out interval.
    pub fn stop(&mut self) {
        self.stop_with(self.data.blend_out);
    }

    pub fn stop_with(&mut self, interval: f32) {
        if !self.active {
            return;
        }
        log::debug!("track '{}' blending out over {interval}s", self.data.name);
        self.set_blend_target(0.0, interval);
    }

    /// Advances the weight ramp and the playback clock. Returns true only on the tick playback
    /// reaches the end of a non-looping pass; blending out to zero weight merely clears
    /// [`is_playing`](Self::is_playing).
    pub fn tick(&mut self, elapsed: f32) -> bool {
        if !self.active {
            return false;
        }

        let delta = elapsed * self.speed;
        if let Some(countdown) = self.blend_out_countdown.as_mut() {
            *countdown -= delta;
            if *countdown <= 0.0 {
                self.blend_out_countdown = None;
                self.stop();
            }
        }

        self.advance_weight(elapsed);
        if self.weight <= 0.0 && self.target_weight <= 0.0 {
            log::debug!("track '{}' stopped", self.data.name);
            self.active = false;
            return false;
        }

        if self.playback.tick(delta, &self.data.name) {
            log::debug!("track '{}' completed", self.data.name);
            self.active = false;
            self.completed = true;
            return true;
        }
        false
    }

    fn advance_weight(&mut self, elapsed: f32) {
        if self.weight == self.target_weight {
            self.rate = 0.0;
            return;
        }
        if self.rate == 0.0 {
            self.weight = self.target_weight;
            return;
        }

        self.weight += self.rate * elapsed;
        let reached = if self.rate > 0.0 {
            self.weight >= self.target_weight
        } else {
            self.weight <= self.target_weight
        };
        if reached {
            self.weight = self.target_weight;
            self.rate = 0.0;
        }
        self.weight = self.weight.clamp(0.0, 1.0);
    }

    /// Snapshots the current pose of the targets for a keyframed transition. Playback captures
    /// lazily on its first pose pass when this was not called.
    pub fn capture_transition(&mut self, skeleton: &Skeleton) {
        self.playback.capture_transition(skeleton);
    }

    /// Re-resolves target names after the skeleton was rebuilt.
    pub fn rebind(&mut self, skeleton: &Skeleton) {
        self.playback.rebind(&self.data.name, skeleton);
    }

    /// Single-track fast path: writes the pose into the targets' local transforms.
    pub fn update_transforms(&mut self, skeleton: &mut Skeleton) {
        self.playback
            .write_pose(skeleton, &mut |node, pose| node.local = *pose);
    }

    /// Weighted path: folds the pose into the targets for the blend pass `tick`.
    pub fn blend_transforms(&mut self, skeleton: &mut Skeleton, tick: TickId) {
        let weight = self.effective_weight();
        self.playback.write_pose(skeleton, &mut |node, pose| {
            node.blend(pose, weight, tick);
        });
    }
}
