use crate::{Node, ProceduralData, ProceduralSample, Skeleton, Transform};

/// Time-driven playback: an external evaluator maps the track clock to a pose per target.
#[derive(Clone, Debug)]
pub struct ProceduralPlayback {
    data: ProceduralData,
    targets: Vec<Option<usize>>,
    looped: bool,
    time: f32,
    completed: bool,
}

impl ProceduralPlayback {
    pub(crate) fn new(track: &str, data: &ProceduralData, looped: bool, skeleton: &Skeleton) -> Self {
        Self {
            targets: skeleton.bind_targets(track, &data.targets),
            data: data.clone(),
            looped,
            time: 0.0,
            completed: false,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> Option<f32> {
        self.data.duration
    }

    pub(crate) fn targets(&self) -> &[Option<usize>] {
        &self.targets
    }

    pub(crate) fn rebind(&mut self, track: &str, skeleton: &Skeleton) {
        self.targets = skeleton.bind_targets(track, &self.data.targets);
    }

    pub(crate) fn start(&mut self) {
        self.time = match self.data.duration {
            Some(duration) => self.data.offset % duration,
            None => self.data.offset,
        };
        self.completed = false;
    }

    pub(crate) fn remaining_time(&self) -> Option<f32> {
        self.data.duration.map(|d| (d - self.time).max(0.0))
    }

    pub(crate) fn tick(&mut self, delta: f32, track: &str) -> bool {
        if self.completed {
            return false;
        }

        self.time += delta;
        if self.time < 0.0 {
            log::warn!("track '{track}' clock drifted below zero ({}); clamping", self.time);
            self.time = 0.0;
        }

        let Some(duration) = self.data.duration else {
            return false;
        };
        if self.time < duration {
            return false;
        }
        if self.looped {
            self.time %= duration;
            return false;
        }
        self.time = duration;
        self.completed = true;
        true
    }

    pub(crate) fn write_pose(
        &mut self,
        skeleton: &mut Skeleton,
        write: &mut dyn FnMut(&mut Node, &Transform),
    ) {
        for (slot, target) in self.targets.iter().enumerate() {
            let Some(index) = *target else {
                continue;
            };
            let sample = ProceduralSample {
                time: self.time,
                target: slot,
            };
            let Some(pose) = (self.data.evaluator)(&sample) else {
                continue;
            };
            if let Some(node) = skeleton.node_mut(index) {
                write(node, &pose);
            }
        }
    }
}
