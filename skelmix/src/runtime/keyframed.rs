use super::frame_actions::FrameActionScheduler;
use crate::{KeyframedData, Node, Skeleton, Transform};
use std::sync::Arc;

const FRAME_EPSILON: f32 = 1e-5;

/// Frame-array playback: integer frame index plus a sub-frame accumulator in [0, 1).
#[derive(Clone, Debug)]
pub struct KeyframedPlayback {
    data: Arc<KeyframedData>,
    targets: Vec<Option<usize>>,
    actions: FrameActionScheduler,
    looped: bool,

    frame: usize,
    sub_frame: f32,
    loop_count: u32,
    completed: bool,

    transitioning: bool,
    transition_alpha: f32,
    snapshot: Option<Vec<Option<Transform>>>,
}

impl KeyframedPlayback {
    pub(crate) fn new(track: &str, data: &KeyframedData, looped: bool, skeleton: &Skeleton) -> Self {
        Self {
            targets: skeleton.bind_targets(track, &data.targets),
            actions: FrameActionScheduler::new(&data.actions),
            data: Arc::new(data.clone()),
            looped,
            frame: 0,
            sub_frame: 0.0,
            loop_count: 0,
            completed: false,
            transitioning: false,
            transition_alpha: 0.0,
            snapshot: None,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn sub_frame(&self) -> f32 {
        self.sub_frame
    }

    /// Fractional playback position in frames.
    pub fn position(&self) -> f32 {
        self.frame as f32 + self.sub_frame
    }

    pub fn frame_count(&self) -> usize {
        self.data.frames.len()
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn action_cursor(&self) -> usize {
        self.actions.cursor()
    }

    pub(crate) fn targets(&self) -> &[Option<usize>] {
        &self.targets
    }

    pub(crate) fn rebind(&mut self, track: &str, skeleton: &Skeleton) {
        self.targets = skeleton.bind_targets(track, &self.data.targets);
        self.snapshot = None;
    }

    pub(crate) fn start(&mut self) {
        let count = self.frame_count();
        let offset_frames = (self.data.offset * self.data.frame_rate + FRAME_EPSILON).floor();
        let start = (offset_frames.max(0.0) as usize) % count.max(1);

        self.frame = start;
        self.sub_frame = 0.0;
        self.loop_count = 0;
        self.completed = false;
        self.actions.skip_to(start as f32);

        self.transitioning = self.data.transition > 0.0;
        self.transition_alpha = 0.0;
        self.snapshot = None;
    }

    /// Records the current local transform of every target as the transition start pose.
    pub(crate) fn capture_transition(&mut self, skeleton: &Skeleton) {
        if !self.transitioning {
            return;
        }
        self.snapshot = Some(
            self.targets
                .iter()
                .map(|t| t.and_then(|i| skeleton.node(i)).map(|n| n.local))
                .collect(),
        );
    }

    /// Playback seconds left until the end of a non-looping pass, transition included.
    pub(crate) fn remaining_time(&self) -> f32 {
        let frames_left = self.frame_count() as f32 - self.position();
        let mut remaining = frames_left.max(0.0) / self.data.frame_rate;
        if self.transitioning {
            remaining += self.data.transition * (1.0 - self.transition_alpha);
        }
        remaining
    }

    pub(crate) fn tick(&mut self, delta: f32, track: &str) -> bool {
        if self.completed {
            return false;
        }

        if self.transitioning {
            self.transition_alpha += delta / self.data.transition;
            if self.transition_alpha >= 1.0 {
                self.transitioning = false;
                self.transition_alpha = 1.0;
                self.snapshot = None;
            } else if self.transition_alpha < 0.0 {
                self.transition_alpha = 0.0;
            }
            return false;
        }

        let count = self.frame_count();
        let mut position = self.position() + delta * self.data.frame_rate;
        if position < 0.0 {
            log::warn!("track '{track}' frame position drifted below zero ({position}); clamping");
            position = 0.0;
            self.actions.reset();
        }

        let length = count as f32;
        if (position + FRAME_EPSILON).floor() >= length {
            self.actions.advance(length, track, self.loop_count);
            if !self.looped {
                self.frame = count - 1;
                self.sub_frame = 0.0;
                self.completed = true;
                return true;
            }

            // Whole passes in one step. Passes skipped entirely fire their actions once.
            let passes = ((position + FRAME_EPSILON) / length).floor().max(1.0) as u32;
            self.loop_count = self.loop_count.wrapping_add(1);
            self.actions.reset();
            if passes > 1 {
                self.actions.advance(length, track, self.loop_count);
                self.actions.reset();
                self.loop_count = self.loop_count.wrapping_add(passes - 1);
            }

            position = if position.is_finite() {
                position.rem_euclid(length)
            } else {
                0.0
            };
            if position + FRAME_EPSILON >= length {
                position = 0.0;
            }
        }

        let whole = (position + FRAME_EPSILON).floor();
        self.frame = (whole as usize).min(count - 1);
        self.sub_frame = (position - whole).max(0.0);
        self.actions.advance(position, track, self.loop_count);
        false
    }

    fn sample(&self, slot: usize) -> Option<Transform> {
        let frames = &self.data.frames;
        let current = *frames.get(self.frame)?.get(slot)?;

        if self.transitioning {
            let from = self
                .snapshot
                .as_ref()
                .and_then(|s| s.get(slot).copied().flatten())
                .unwrap_or(current);
            return Some(from.lerp(&current, self.transition_alpha));
        }

        let next_frame = if self.frame + 1 < frames.len() {
            self.frame + 1
        } else if self.looped {
            0
        } else {
            self.frame
        };
        let next = *frames.get(next_frame)?.get(slot)?;
        Some(current.lerp(&next, self.sub_frame))
    }

    pub(crate) fn write_pose(
        &mut self,
        skeleton: &mut Skeleton,
        write: &mut dyn FnMut(&mut Node, &Transform),
    ) {
        if self.transitioning && self.snapshot.is_none() {
            self.capture_transition(skeleton);
        }
        for slot in 0..self.targets.len() {
            let Some(index) = self.targets[slot] else {
                continue;
            };
            let Some(pose) = self.sample(slot) else {
                continue;
            };
            if let Some(node) = skeleton.node_mut(index) {
                write(node, &pose);
            }
        }
    }
}
