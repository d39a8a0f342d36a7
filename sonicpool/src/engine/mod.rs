mod admission;
mod metrics;
mod params;
mod playback;
mod update;

#[cfg(test)]
mod tests;

pub use metrics::EngineMetrics;
pub use params::MAX_PITCH;

use crate::backend::{AudioBackend, ChannelState};
use crate::channel::ChannelTable;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineDesc;
use crate::environment::AudioEnvironment;
use crate::error::{AudioError, Result};
use crate::events::AudioEvent;
use crate::gain;
use crate::handle::{Handle, HandleAllocator};
use crate::math::Pose;
use crate::registry::Registries;
use crate::resource::BufferResolver;
use crate::scoring;
use crate::stream::{NoStreams, StreamSourceFactory};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::time::Duration;

/// Voice allocator that maps logical sounds onto a fixed pool of device
/// channels.
///
/// `AudioEngine` owns every channel binding and every parked sound. Callers
/// create sounds, get back a [`Handle`], and drive the engine by calling
/// [`AudioEngine::update`] once per frame. When more sounds want to play than
/// there are channels, the quietest ones are culled; looping and streaming
/// sounds are parked and revived once a channel frees up.
///
/// # Threading
///
/// The engine is single-threaded. All methods, including `update`, must be
/// called from the same logical thread or otherwise serialized.
pub struct AudioEngine<B: AudioBackend> {
    desc: EngineDesc,
    backend: B,
    channels: ChannelTable,
    registries: Registries,
    handles: HandleAllocator,
    resolver: Box<dyn BufferResolver>,
    streams: Box<dyn StreamSourceFactory>,
    clock: Box<dyn Clock>,
    category_gains: Vec<f32>,
    master_gain: f32,
    environment_enabled: bool,
    environment: Option<AudioEnvironment>,
    event_sender: Sender<AudioEvent>,
    event_receiver: Receiver<AudioEvent>,
    shut_down: bool,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Creates an engine and acquires mixing channels from `backend`.
    ///
    /// The engine runs with however many channels the device grants, up to
    /// `desc.max_sources`.
    ///
    /// # Errors
    ///
    /// Returns an error if the description is invalid, if the device fails to
    /// hand out channels, or if it grants none.
    pub fn new(
        desc: EngineDesc,
        mut backend: B,
        resolver: impl BufferResolver + 'static,
    ) -> Result<Self> {
        desc.validate()?;

        let granted = backend.acquire_channels(desc.max_sources)?;
        if granted == 0 {
            return Err(AudioError::NoChannels);
        }
        if granted < desc.max_sources {
            log::warn!(
                "Device granted {} of {} requested channels",
                granted,
                desc.max_sources
            );
        }
        log::info!("Audio engine initialized with {} channels", granted);

        let (event_sender, event_receiver) = unbounded();
        Ok(Self {
            category_gains: vec![1.0; desc.category_count],
            desc,
            backend,
            channels: ChannelTable::new(granted),
            registries: Registries::new(),
            handles: HandleAllocator::new(),
            resolver: Box::new(resolver),
            streams: Box::new(NoStreams),
            clock: Box::new(SystemClock::new()),
            master_gain: 1.0,
            environment_enabled: false,
            environment: None,
            event_sender,
            event_receiver,
            shut_down: false,
        })
    }

    /// Uses `factory` to open streaming sounds.
    pub fn with_stream_factory(mut self, factory: impl StreamSourceFactory + 'static) -> Self {
        self.streams = Box::new(factory);
        self
    }

    /// Uses `clock` for cull dwell timing.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn desc(&self) -> &EngineDesc {
        &self.desc
    }

    /// Number of channels granted by the device
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Drains all events queued since the last call.
    pub fn poll_events(&self) -> Vec<AudioEvent> {
        self.event_receiver.try_iter().collect()
    }

    pub(crate) fn emit(&self, event: AudioEvent) {
        if let Err(e) = self.event_sender.send(event) {
            log::error!("Failed to queue audio event: {}", e);
        }
    }

    pub(crate) fn now(&self) -> Duration {
        self.clock.now()
    }

    pub(crate) fn category_gain_of(&self, category: usize) -> f32 {
        self.category_gains.get(category).copied().unwrap_or(0.0)
    }

    /// Returns true if `handle` names a sound that still exists.
    ///
    /// A sound bound to a channel is valid until it is started and then for as
    /// long as the device reports it playing. Parked looping and streaming
    /// sounds are always valid.
    pub fn is_valid(&self, handle: Handle) -> bool {
        if let Some(index) = self.channels.find_index(handle) {
            let started = self.channels.get(index).is_some_and(|s| s.is_started());
            return !started || self.backend.state(index) == ChannelState::Playing;
        }
        self.registries.get(handle).is_some()
    }

    /// Returns true if `handle` is bound to a channel that is playing.
    pub fn is_playing(&self, handle: Handle) -> bool {
        self.channels
            .find_index(handle)
            .is_some_and(|index| self.backend.state(index) == ChannelState::Playing)
    }

    /// Sets the gain of a sound category and rescales playing channels in it.
    ///
    /// # Arguments
    ///
    /// * `category` - Category index, below `EngineDesc::category_count`
    /// * `value` - Linear gain, clamped to `[0, 1]`
    ///
    /// # Returns
    ///
    /// `false` if the category is out of range
    pub fn set_category_gain(&mut self, category: usize, value: f32) -> bool {
        let Some(slot) = self.category_gains.get_mut(category) else {
            return false;
        };
        *slot = value.clamp(0.0, 1.0);
        log::debug!("Category {} gain set to {}", category, *slot);
        self.refresh_channel_gains(|slot_category| slot_category == category);
        true
    }

    pub fn category_gain(&self, category: usize) -> Option<f32> {
        self.category_gains.get(category).copied()
    }

    /// Sets the master gain (linear, clamped to `[0, 1]`).
    ///
    /// Master gain scales what every channel outputs but never affects which
    /// sounds get culled.
    pub fn set_master_gain(&mut self, value: f32) {
        self.master_gain = value.clamp(0.0, 1.0);
        self.refresh_channel_gains(|_| true);
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Sets the master gain on the perceptual scale.
    pub fn set_master_gain_log(&mut self, value: f32) {
        self.set_master_gain(gain::log_to_linear(value));
    }

    pub fn master_gain_log(&self) -> f32 {
        gain::linear_to_log(self.master_gain)
    }

    fn refresh_channel_gains(&mut self, matches: impl Fn(usize) -> bool) {
        for (index, slot) in self.channels.iter() {
            if slot.is_free() || !matches(slot.category) {
                continue;
            }
            if self.backend.state(index) != ChannelState::Playing {
                continue;
            }
            let value = scoring::channel_gain(
                slot.source_volume,
                self.category_gain_of(slot.category),
                self.master_gain,
            );
            self.backend.set_gain(index, value);
        }
    }

    pub fn set_listener(&mut self, pose: Pose) {
        self.backend.set_listener(pose);
    }

    pub fn listener(&self) -> Pose {
        self.backend.listener()
    }

    /// Enables or disables per-sound environmental effects on positional
    /// channels.
    pub fn enable_environment(&mut self, enable: bool) {
        if self.environment_enabled == enable {
            return;
        }
        for (index, slot) in self.channels.iter() {
            if slot.is_free() || self.backend.is_relative(index) {
                continue;
            }
            if enable {
                self.backend.apply_sample_environment(
                    index,
                    slot.environment_level,
                    slot.environment.as_ref(),
                );
            } else {
                self.backend.apply_sample_environment(index, 0.0, None);
            }
        }
        self.environment_enabled = enable;
    }

    pub fn is_environment_enabled(&self) -> bool {
        self.environment_enabled
    }

    /// Sets the global room environment. `None` restores the generic room.
    pub fn set_environment(&mut self, environment: Option<AudioEnvironment>) {
        self.backend.set_environment(environment.as_ref());
        self.environment = environment;
    }

    pub fn environment(&self) -> Option<&AudioEnvironment> {
        self.environment.as_ref()
    }

    /// Elapsed time of a streaming sound.
    pub fn stream_position(&self, handle: Handle) -> Option<Duration> {
        self.registries.stream(handle).map(|s| s.elapsed_time())
    }

    /// Total length of a streaming sound.
    pub fn stream_duration(&self, handle: Handle) -> Option<Duration> {
        self.registries.stream(handle).map(|s| s.total_time())
    }

    /// Stops every sound and gives the channels back to the device.
    ///
    /// Called automatically on drop. The engine rejects new sounds afterwards.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.stop_all();
        self.registries.looping.drain_pool();
        self.backend.release_channels();
        self.channels = ChannelTable::new(0);
        self.shut_down = true;
        log::info!("Audio engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<B: AudioBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
