use super::skeleton::{Skeleton, TickId};
use super::track::AnimationTrack;
use crate::{Error, SkeletonData, TrackData};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EntryId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct EntrySlot {
    generation: u32,
    track: Option<AnimationTrack>,
}

/// Generation-checked reference to a track registered with a [`BlendCoordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackHandle {
    id: EntryId,
}

impl TrackHandle {
    pub fn start(&self, coordinator: &mut BlendCoordinator) -> Result<(), Error> {
        coordinator.start(*self)
    }

    pub fn stop(&self, coordinator: &mut BlendCoordinator) {
        coordinator.stop(*self);
    }

    pub fn stop_with(&self, coordinator: &mut BlendCoordinator, interval: f32) {
        coordinator.stop_with(*self, interval);
    }

    pub fn set_speed(&self, coordinator: &mut BlendCoordinator, multiplier: f32) {
        if let Some(track) = coordinator.track_mut(*self) {
            track.set_speed(multiplier);
        }
    }

    pub fn is_playing(&self, coordinator: &BlendCoordinator) -> bool {
        coordinator.is_playing(*self)
    }
}

#[derive(Clone, Debug)]
pub struct TrackSnapshot {
    pub name: String,
    pub priority: i32,
    pub weight: f32,
}

impl TrackSnapshot {
    fn of(track: &AnimationTrack) -> Self {
        Self {
            name: track.name().to_string(),
            priority: track.priority(),
            weight: track.weight(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrackEvent {
    /// The track started. `override_blend_out` is set when it blended out its priority peers.
    Started { override_blend_out: Option<f32> },
    /// The track left the playing list: `completed` when playback reached its end, otherwise it
    /// blended out to zero weight or was removed.
    Stopped { completed: bool },
}

pub trait BlendListener {
    fn on_event(&mut self, track: &TrackSnapshot, event: &TrackEvent);
}

impl<F: FnMut(&TrackSnapshot, &TrackEvent)> BlendListener for F {
    fn on_event(&mut self, track: &TrackSnapshot, event: &TrackEvent) {
        self(track, event);
    }
}

#[derive(Clone, Debug)]
struct QueuedEvent {
    track: TrackSnapshot,
    event: TrackEvent,
}

/// Owns a skeleton and every track configured against it, and merges the playing tracks into
/// one pose per tick.
///
/// The playing list is kept sorted by descending priority, ties in start order. With one
/// playing track its pose is written directly; with more, each tick runs a single weighted
/// blend pass stamped with a fresh [`TickId`].
pub struct BlendCoordinator {
    skeleton: Skeleton,
    entries: Vec<EntrySlot>,
    free_list: Vec<usize>,
    names: HashMap<String, EntryId>,
    playing: Vec<EntryId>,
    tick_id: TickId,
    event_queue: VecDeque<QueuedEvent>,
    listener: Option<Box<dyn BlendListener>>,
}

impl BlendCoordinator {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            entries: Vec::new(),
            free_list: Vec::new(),
            names: HashMap::new(),
            playing: Vec::new(),
            tick_id: TickId::NONE,
            event_queue: VecDeque::new(),
            listener: None,
        }
    }

    pub fn from_data(data: Arc<SkeletonData>) -> Result<Self, Error> {
        Ok(Self::new(Skeleton::new(data)?))
    }

    pub fn set_listener<L: BlendListener + 'static>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Direct access to node transforms between ticks.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Stamp of the most recent weighted blend pass.
    pub fn tick_id(&self) -> TickId {
        self.tick_id
    }

    /// True when no track is playing, i.e. every started animation finished or blended out.
    pub fn is_idle(&self) -> bool {
        self.playing.is_empty()
    }

    /// Registers a track definition, binding its targets against the current skeleton. A track
    /// with the same name is disposed first.
    pub fn add_track(&mut self, data: TrackData) -> Result<TrackHandle, Error> {
        let track = AnimationTrack::new(data, &self.skeleton)?;
        if let Some(previous) = self.find_track(track.name()) {
            log::debug!("track '{}' superseded by a new definition", track.name());
            self.remove_track(previous)?;
        }
        let name = track.name().to_string();
        let id = self.alloc_entry(track);
        self.names.insert(name, id);
        Ok(TrackHandle { id })
    }

    pub fn remove_track(&mut self, handle: TrackHandle) -> Result<(), Error> {
        let id = handle.id;
        let Some(track) = self.entry(id) else {
            return Err(Error::InvalidTrackHandle);
        };
        let snapshot = TrackSnapshot::of(track);
        if let Some(position) = self.playing.iter().position(|p| *p == id) {
            self.playing.remove(position);
            self.event_queue.push_back(QueuedEvent {
                track: snapshot.clone(),
                event: TrackEvent::Stopped { completed: false },
            });
        }
        if self.names.get(&snapshot.name) == Some(&id) {
            self.names.remove(&snapshot.name);
        }
        self.free_entry(id);
        self.drain_event_queue();
        Ok(())
    }

    pub fn find_track(&self, name: &str) -> Option<TrackHandle> {
        self.names.get(name).map(|&id| TrackHandle { id })
    }

    pub fn track(&self, handle: TrackHandle) -> Option<&AnimationTrack> {
        self.entry(handle.id)
    }

    pub fn track_mut(&mut self, handle: TrackHandle) -> Option<&mut AnimationTrack> {
        self.entry_mut(handle.id)
    }

    /// Playing tracks in blend order.
    pub fn playing_tracks(&self) -> impl Iterator<Item = &AnimationTrack> + '_ {
        self.playing.iter().filter_map(|&id| self.entry(id))
    }

    pub fn is_playing(&self, handle: TrackHandle) -> bool {
        self.playing.contains(&handle.id)
    }

    pub fn play(&mut self, name: &str) -> Result<TrackHandle, Error> {
        let handle = self.find_track(name).ok_or_else(|| Error::UnknownTrack {
            name: name.to_string(),
        })?;
        self.start(handle)?;
        Ok(handle)
    }

    /// Starts (or restarts) a track and inserts it into the playing list after every track of
    /// higher or equal priority. An exclusive track first blends out its priority peers over its
    /// own blend-in interval.
    pub fn start(&mut self, handle: TrackHandle) -> Result<(), Error> {
        let id = handle.id;
        let Some(track) = slot_mut(&mut self.entries, id) else {
            return Err(Error::InvalidTrackHandle);
        };
        let override_blend_out = track.start();
        track.capture_transition(&self.skeleton);
        let priority = track.priority();
        let snapshot = TrackSnapshot::of(track);

        if let Some(interval) = override_blend_out {
            for &other in &self.playing {
                if other == id {
                    continue;
                }
                if let Some(peer) = slot_mut(&mut self.entries, other) {
                    if peer.priority() == priority {
                        log::debug!(
                            "track '{}' overrides '{}' at priority {priority}",
                            snapshot.name,
                            peer.name()
                        );
                        peer.stop_with(interval);
                    }
                }
            }
        }

        if !self.playing.contains(&id) {
            let position = self
                .playing
                .iter()
                .position(|&p| self.entry(p).is_some_and(|t| t.priority() < priority))
                .unwrap_or(self.playing.len());
            self.playing.insert(position, id);
        }

        self.event_queue.push_back(QueuedEvent {
            track: snapshot,
            event: TrackEvent::Started { override_blend_out },
        });
        self.drain_event_queue();
        Ok(())
    }

    pub fn stop(&mut self, handle: TrackHandle) {
        if let Some(track) = self.entry_mut(handle.id) {
            track.stop();
        }
    }

    pub fn stop_with(&mut self, handle: TrackHandle, interval: f32) {
        if let Some(track) = self.entry_mut(handle.id) {
            track.stop_with(interval);
        }
    }

    /// Blends out every playing track, over `interval` or each track's own blend-out.
    pub fn stop_all(&mut self, interval: Option<f32>) {
        for &id in &self.playing {
            if let Some(track) = slot_mut(&mut self.entries, id) {
                match interval {
                    Some(interval) => track.stop_with(interval),
                    None => track.stop(),
                }
            }
        }
    }

    /// Replaces the hierarchy between ticks and rebinds every registered track.
    pub fn rebuild_skeleton(&mut self, data: Arc<SkeletonData>) -> Result<(), Error> {
        self.skeleton = Skeleton::new(data)?;
        for slot in &mut self.entries {
            if let Some(track) = slot.track.as_mut() {
                track.rebind(&self.skeleton);
            }
        }
        Ok(())
    }

    /// Advances every playing track by `delta` seconds and recomputes the pose.
    ///
    /// Tracks that blended out to zero weight leave before the pose pass. Tracks that completed
    /// this tick still contribute to it and leave right after.
    pub fn tick(&mut self, delta: f32) {
        if !delta.is_finite() || delta < 0.0 {
            return;
        }

        let mut pending = VecDeque::new();
        let mut completed = Vec::new();

        let playing = std::mem::take(&mut self.playing);
        let mut remaining = Vec::with_capacity(playing.len());
        for id in playing {
            let Some(track) = slot_mut(&mut self.entries, id) else {
                continue;
            };
            if track.tick(delta) {
                completed.push(id);
                remaining.push(id);
            } else if track.is_playing() {
                remaining.push(id);
            } else {
                pending.push_back(QueuedEvent {
                    track: TrackSnapshot::of(track),
                    event: TrackEvent::Stopped { completed: false },
                });
            }
        }
        self.playing = remaining;

        if self.playing.len() == 1 {
            if let Some(track) = slot_mut(&mut self.entries, self.playing[0]) {
                track.update_transforms(&mut self.skeleton);
            }
        } else if self.playing.len() > 1 {
            self.tick_id = self.tick_id.next();
            log::trace!(
                "blend pass {} over {} tracks",
                self.tick_id.get(),
                self.playing.len()
            );
            for &id in &self.playing {
                if let Some(track) = slot_mut(&mut self.entries, id) {
                    track.blend_transforms(&mut self.skeleton, self.tick_id);
                }
            }
        }

        if !completed.is_empty() {
            self.playing.retain(|id| !completed.contains(id));
            for id in completed {
                if let Some(track) = self.entry(id) {
                    pending.push_back(QueuedEvent {
                        track: TrackSnapshot::of(track),
                        event: TrackEvent::Stopped { completed: true },
                    });
                }
            }
        }

        self.skeleton.update_world_transforms();

        self.event_queue.append(&mut pending);
        self.drain_event_queue();
    }

    fn alloc_entry(&mut self, track: AnimationTrack) -> EntryId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.entries[index];
            slot.track = Some(track);
            EntryId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.entries.len();
            self.entries.push(EntrySlot {
                generation: 0,
                track: Some(track),
            });
            EntryId {
                index,
                generation: 0,
            }
        }
    }

    fn entry(&self, id: EntryId) -> Option<&AnimationTrack> {
        let slot = self.entries.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.track.as_ref()
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut AnimationTrack> {
        slot_mut(&mut self.entries, id)
    }

    fn free_entry(&mut self, id: EntryId) {
        let Some(slot) = self.entries.get_mut(id.index) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        slot.track = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
    }

    fn drain_event_queue(&mut self) {
        let mut listener = self.listener.take();
        while let Some(queued) = self.event_queue.pop_front() {
            if let Some(listener) = listener.as_mut() {
                listener.on_event(&queued.track, &queued.event);
            }
        }
        if self.listener.is_none() {
            self.listener = listener;
        }
    }
}

fn slot_mut(entries: &mut [EntrySlot], id: EntryId) -> Option<&mut AnimationTrack> {
    let slot = entries.get_mut(id.index)?;
    if slot.generation != id.generation {
        return None;
    }
    slot.track.as_mut()
}
