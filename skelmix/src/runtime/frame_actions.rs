use crate::{FrameAction, FrameActionContext};
use std::sync::Arc;

/// Frame-threshold callbacks of one keyframed track plus the cursor recording how far playback
/// has fired them.
#[derive(Clone, Debug)]
pub struct FrameActionScheduler {
    actions: Arc<[FrameAction]>,
    cursor: usize,
}

impl FrameActionScheduler {
    pub fn new(actions: &[FrameAction]) -> Self {
        let mut sorted = actions.to_vec();
        sorted.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        Self {
            actions: sorted.into(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewinds for the next loop traversal.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor past every action below `position` without firing anything.
    pub fn skip_to(&mut self, position: f32) {
        self.cursor = self.actions.partition_point(|a| a.frame < position);
    }

    /// Fires, in threshold order, every pending action whose threshold lies below `position`.
    /// Returns how many fired.
    pub fn advance(&mut self, position: f32, track: &str, loop_count: u32) -> usize {
        let start = self.cursor;
        while let Some(action) = self.actions.get(self.cursor) {
            if action.frame >= position {
                break;
            }
            log::trace!(
                "track '{track}' fires frame action '{}' at {position}",
                action.name
            );
            (action.callback)(&FrameActionContext {
                track,
                action: &action.name,
                frame: action.frame,
                position,
                loop_count,
            });
            self.cursor += 1;
        }
        self.cursor - start
    }
}
