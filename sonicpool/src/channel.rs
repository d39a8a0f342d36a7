//! The fixed table of physical channels and what is bound to each.

use crate::backend::ChannelId;
use crate::environment::SampleEnvironment;
use crate::handle::Handle;
use crate::resource::SoundBuffer;
use std::sync::Arc;

/// Per-channel cache of the bound sound's play parameters.
///
/// The bound handle carries the `parked` flag while the channel is configured
/// but not yet started, and the `loading` flag while a stream is still being
/// prepared.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelSlot {
    pub handle: Option<Handle>,
    /// Unattenuated volume of the bound sound
    pub source_volume: f32,
    pub category: usize,
    pub score: f32,
    pub buffer: Option<Arc<SoundBuffer>>,
    pub environment: Option<SampleEnvironment>,
    pub environment_level: f32,
}

impl ChannelSlot {
    pub fn is_free(&self) -> bool {
        self.handle.is_none()
    }

    /// Bound and already told to play
    pub fn is_started(&self) -> bool {
        self.handle.is_some_and(|h| !h.is_parked())
    }
}

#[derive(Debug)]
pub(crate) struct ChannelTable {
    slots: Vec<ChannelSlot>,
}

impl ChannelTable {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![ChannelSlot::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn find_free(&self) -> Option<ChannelId> {
        self.slots.iter().position(ChannelSlot::is_free)
    }

    pub fn find_index(&self, handle: Handle) -> Option<ChannelId> {
        self.slots.iter().position(|slot| slot.handle == Some(handle))
    }

    /// Bound channel with the lowest score strictly below `volume`.
    pub fn lowest_below(&self, volume: f32) -> Option<ChannelId> {
        let mut best = None;
        let mut min = volume;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.handle.is_some() && slot.score < min {
                min = slot.score;
                best = Some(index);
            }
        }
        best
    }

    pub fn get(&self, index: ChannelId) -> Option<&ChannelSlot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: ChannelId) -> Option<&mut ChannelSlot> {
        self.slots.get_mut(index)
    }

    pub fn bind(&mut self, index: ChannelId, slot: ChannelSlot) {
        debug_assert!(slot.handle.is_some(), "binding a channel without a handle");
        debug_assert!(
            slot.handle.is_none_or(|h| self.find_index(h).is_none()),
            "handle already bound to another channel"
        );
        if let Some(target) = self.slots.get_mut(index) {
            debug_assert!(target.is_free(), "channel {} is already bound", index);
            *target = slot;
        }
    }

    /// Frees a channel and returns the handle that was bound to it.
    pub fn clear(&mut self, index: ChannelId) -> Option<Handle> {
        let slot = self.slots.get_mut(index)?;
        let handle = slot.handle.take();
        if let Some(buffer) = slot.buffer.take() {
            log::trace!("Channel {} released '{}'", index, buffer.name());
        }
        slot.environment = None;
        slot.score = 0.0;
        handle
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelSlot)> {
        self.slots.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChannelId, &mut ChannelSlot)> {
        self.slots.iter_mut().enumerate()
    }

    pub fn bound(&self) -> impl Iterator<Item = (ChannelId, Handle)> + '_ {
        self.iter()
            .filter_map(|(index, slot)| slot.handle.map(|h| (index, h)))
    }
}
