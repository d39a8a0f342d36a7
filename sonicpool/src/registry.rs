//! Persistent state of sounds that outlive their channel.
//!
//! Looping and streaming sounds are tracked here from creation until they are
//! stopped. Each entry has exactly one [`Lifecycle`] state, so an entry can
//! never be parked and bound at the same time.

use crate::backend::{AudioBackend, ChannelId};
use crate::config::SoundDescription;
use crate::environment::SampleEnvironment;
use crate::handle::{Handle, SoundKind};
use crate::math::Vec3;
use crate::resource::SoundBuffer;
use crate::stream::StreamSource;
use std::sync::Arc;
use std::time::Duration;

/// Where a tracked sound currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Holds a channel. `started` is false until the sound is first played.
    Bound { channel: ChannelId, started: bool },
    /// Parked before it was ever played
    Inactive,
    /// Parked after losing its channel. `since` is `None` when the sound may
    /// be revived without waiting.
    Culled { since: Option<Duration> },
}

impl Lifecycle {
    pub fn channel(self) -> Option<ChannelId> {
        match self {
            Self::Bound { channel, .. } => Some(channel),
            _ => None,
        }
    }

    pub fn is_parked(self) -> bool {
        !matches!(self, Self::Bound { .. })
    }

    /// Parked long enough to be rescored.
    pub fn dwell_elapsed(self, now: Duration, period: Duration) -> bool {
        match self {
            Self::Bound { .. } => false,
            Self::Inactive | Self::Culled { since: None } => true,
            Self::Culled { since: Some(at) } => now.saturating_sub(at) >= period,
        }
    }
}

/// The state shared by looping and streaming sounds.
#[derive(Debug, Clone)]
pub(crate) struct SoundState {
    pub handle: Handle,
    pub desc: SoundDescription,
    pub position: Vec3,
    pub direction: Vec3,
    pub pitch: f32,
    pub score: f32,
    pub environment: Option<SampleEnvironment>,
    pub lifecycle: Lifecycle,
}

impl SoundState {
    pub fn new(handle: Handle, desc: SoundDescription, score: f32) -> Self {
        Self {
            handle,
            direction: desc.cone_vector,
            desc,
            position: Vec3::ZERO,
            pitch: 1.0,
            score,
            environment: None,
            lifecycle: Lifecycle::Inactive,
        }
    }

    /// The handle with lifecycle flags reflecting the current state.
    pub fn flagged_handle(&self) -> Handle {
        let parked = !matches!(self.lifecycle, Lifecycle::Bound { started: true, .. });
        self.handle.with_parked(parked)
    }
}

/// What a registry entry owns besides its [`SoundState`].
pub(crate) trait Payload {
    /// Prepares `channel` to play this sound. Returns false on failure.
    fn attach(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) -> bool;

    /// Called when the sound loses its channel.
    fn detach(&mut self) {}

    /// Called once when the entry is removed.
    fn release(&mut self);

    /// Whether the sound's data still exists.
    fn is_available(&self) -> bool;

    /// Buffer a channel should hold a reference to while bound.
    fn buffer(&self) -> Option<Arc<SoundBuffer>> {
        None
    }

    /// Per-tick upkeep while bound.
    fn update(&mut self, _backend: &mut dyn AudioBackend, _channel: ChannelId) {}

    fn stream(&self) -> Option<&dyn StreamSource> {
        None
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoopingSound {
    buffer: Option<Arc<SoundBuffer>>,
}

impl LoopingSound {
    pub fn new(buffer: Arc<SoundBuffer>) -> Self {
        Self {
            buffer: Some(buffer),
        }
    }
}

impl Payload for LoopingSound {
    fn attach(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) -> bool {
        match &self.buffer {
            Some(buffer) => {
                backend.bind_buffer(channel, Some(buffer.clone()));
                backend.set_looping(channel, true);
                true
            }
            None => false,
        }
    }

    fn release(&mut self) {
        self.buffer = None;
    }

    fn is_available(&self) -> bool {
        self.buffer.as_ref().is_some_and(|b| b.is_resident())
    }

    fn buffer(&self) -> Option<Arc<SoundBuffer>> {
        self.buffer.clone()
    }
}

pub(crate) struct StreamingSound {
    stream: Box<dyn StreamSource>,
}

impl StreamingSound {
    pub fn new(stream: Box<dyn StreamSource>) -> Self {
        Self { stream }
    }
}

impl std::fmt::Debug for StreamingSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingSound")
            .field("elapsed", &self.stream.elapsed_time())
            .field("total", &self.stream.total_time())
            .finish()
    }
}

impl Payload for StreamingSound {
    fn attach(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) -> bool {
        self.stream.init_stream(backend, channel)
    }

    fn detach(&mut self) {
        self.stream.free_stream();
    }

    fn release(&mut self) {
        self.stream.free_stream();
    }

    fn is_available(&self) -> bool {
        self.stream.is_valid()
    }

    fn update(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) {
        self.stream.update_buffers(backend, channel);
    }

    fn stream(&self) -> Option<&dyn StreamSource> {
        Some(self.stream.as_ref())
    }
}

#[derive(Debug)]
pub(crate) struct Entry<P> {
    pub state: SoundState,
    pub payload: P,
}

/// Mutable view of an entry of either registry.
pub(crate) struct EntryMut<'a> {
    pub state: &'a mut SoundState,
    pub payload: &'a mut dyn Payload,
}

/// All tracked sounds of one kind.
#[derive(Debug)]
pub(crate) struct Registry<P> {
    entries: Vec<Box<Entry<P>>>,
    pool: Vec<Box<Entry<P>>>,
    recycle: bool,
}

impl<P: Payload> Registry<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pool: Vec::new(),
            recycle: false,
        }
    }

    /// A registry that keeps removed entries for reuse.
    pub fn pooled() -> Self {
        Self {
            recycle: true,
            ..Self::new()
        }
    }

    pub fn insert(&mut self, state: SoundState, payload: P) {
        debug_assert!(
            self.find(state.handle).is_none(),
            "{} is already registered",
            state.handle
        );
        let entry = match self.pool.pop() {
            Some(mut recycled) => {
                recycled.state = state;
                recycled.payload = payload;
                recycled
            }
            None => Box::new(Entry { state, payload }),
        };
        self.entries.push(entry);
    }

    pub fn find(&self, handle: Handle) -> Option<&Entry<P>> {
        self.entries
            .iter()
            .find(|e| e.state.handle == handle)
            .map(|e| e.as_ref())
    }

    pub fn find_mut(&mut self, handle: Handle) -> Option<&mut Entry<P>> {
        self.entries
            .iter_mut()
            .find(|e| e.state.handle == handle)
            .map(|e| e.as_mut())
    }

    /// Removes an entry, releasing its payload. Returns false if unknown.
    pub fn remove(&mut self, handle: Handle) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.state.handle == handle) else {
            return false;
        };
        let mut entry = self.entries.swap_remove(index);
        entry.payload.release();
        if self.recycle {
            self.pool.push(entry);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<P>> {
        self.entries.iter().map(|e| e.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry<P>> {
        self.entries.iter_mut().map(|e| e.as_mut())
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.entries.iter().map(|e| e.state.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count_inactive(&self) -> usize {
        self.iter()
            .filter(|e| e.state.lifecycle == Lifecycle::Inactive)
            .count()
    }

    pub fn count_culled(&self) -> usize {
        self.iter()
            .filter(|e| matches!(e.state.lifecycle, Lifecycle::Culled { .. }))
            .count()
    }

    pub fn pooled_len(&self) -> usize {
        self.pool.len()
    }

    pub fn drain_pool(&mut self) {
        self.pool.clear();
    }

    /// Culled entries that may be revived now, loudest first.
    pub fn revival_candidates(
        &self,
        now: Duration,
        period: Duration,
        min_gain: f32,
    ) -> Vec<(Handle, f32)> {
        let mut candidates: Vec<(Handle, f32)> = self
            .iter()
            .filter(|e| matches!(e.state.lifecycle, Lifecycle::Culled { .. }))
            .filter(|e| e.state.score > min_gain)
            .filter(|e| e.state.lifecycle.dwell_elapsed(now, period))
            .map(|e| (e.state.handle, e.state.score))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates
    }
}

/// The looping and streaming registries, addressed by handle kind.
#[derive(Debug)]
pub(crate) struct Registries {
    pub looping: Registry<LoopingSound>,
    pub streaming: Registry<StreamingSound>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            looping: Registry::pooled(),
            streaming: Registry::new(),
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&SoundState> {
        match handle.kind() {
            SoundKind::Looping => self.looping.find(handle).map(|e| &e.state),
            SoundKind::Streaming => self.streaming.find(handle).map(|e| &e.state),
            SoundKind::OneShot => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<EntryMut<'_>> {
        match handle.kind() {
            SoundKind::Looping => self.looping.find_mut(handle).map(|e| EntryMut {
                state: &mut e.state,
                payload: &mut e.payload,
            }),
            SoundKind::Streaming => self.streaming.find_mut(handle).map(|e| EntryMut {
                state: &mut e.state,
                payload: &mut e.payload,
            }),
            SoundKind::OneShot => None,
        }
    }

    pub fn stream(&self, handle: Handle) -> Option<&dyn StreamSource> {
        self.streaming
            .find(handle)
            .and_then(|e| e.payload.stream())
    }

    pub fn remove(&mut self, handle: Handle) -> bool {
        match handle.kind() {
            SoundKind::Looping => self.looping.remove(handle),
            SoundKind::Streaming => self.streaming.remove(handle),
            SoundKind::OneShot => false,
        }
    }

    pub fn states_mut(&mut self) -> impl Iterator<Item = &mut SoundState> {
        self.looping
            .iter_mut()
            .map(|e| &mut e.state)
            .chain(self.streaming.iter_mut().map(|e| &mut e.state))
    }

    pub fn len(&self) -> usize {
        self.looping.len() + self.streaming.len()
    }
}
