use super::track::AnimationTrack;
use crate::{Error, Node, Skeleton, TrackData, Transform};

/// A playlist of child tracks played one after another. It has no blending of its own: the pose
/// is the active child's pose.
#[derive(Clone, Debug)]
pub struct SequentialPlayback {
    children: Vec<AnimationTrack>,
    index: usize,
    looped: bool,
    completed: bool,
}

impl SequentialPlayback {
    pub(crate) fn new(children: &[TrackData], looped: bool, skeleton: &Skeleton) -> Result<Self, Error> {
        let children = children
            .iter()
            .map(|child| AnimationTrack::new(child.clone(), skeleton))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            children,
            index: 0,
            looped,
            completed: false,
        })
    }

    pub fn children(&self) -> &[AnimationTrack] {
        &self.children
    }

    pub fn active_index(&self) -> usize {
        self.index
    }

    pub fn active(&self) -> Option<&AnimationTrack> {
        self.children.get(self.index)
    }

    pub(crate) fn active_weight(&self) -> f32 {
        self.active().map_or(0.0, AnimationTrack::effective_weight)
    }

    pub(crate) fn rebind(&mut self, skeleton: &Skeleton) {
        for child in &mut self.children {
            child.rebind(skeleton);
        }
    }

    pub(crate) fn start(&mut self) {
        self.index = 0;
        self.completed = false;
        if let Some(first) = self.children.first_mut() {
            first.start();
        }
    }

    pub(crate) fn capture_transition(&mut self, skeleton: &Skeleton) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.capture_transition(skeleton);
        }
    }

    pub(crate) fn tick(&mut self, delta: f32, track: &str) -> bool {
        if self.completed {
            return false;
        }
        let Some(child) = self.children.get_mut(self.index) else {
            return false;
        };

        let child_completed = child.tick(delta);
        if !child_completed && child.is_playing() {
            return false;
        }

        if self.index + 1 < self.children.len() {
            self.index += 1;
        } else if self.looped {
            self.index = 0;
        } else {
            log::debug!("sequence '{track}' finished its last child");
            self.completed = true;
            return true;
        }

        log::trace!(
            "sequence '{track}' advances to child '{}'",
            self.children[self.index].name()
        );
        self.children[self.index].start();
        false
    }

    pub(crate) fn write_pose(
        &mut self,
        skeleton: &mut Skeleton,
        write: &mut dyn FnMut(&mut Node, &Transform),
    ) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.playback_mut().write_pose(skeleton, write);
        }
    }
}
