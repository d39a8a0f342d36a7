use super::{AudioBackend, ChannelId, ChannelState, Distances};
use crate::config::Cone;
use crate::environment::{AudioEnvironment, SampleEnvironment};
use crate::error::{AudioError, Result};
use crate::math::{Pose, Vec3};
use crate::resource::SoundBuffer;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct VirtualChannel {
    buffer: Option<Arc<SoundBuffer>>,
    queue: VecDeque<Arc<SoundBuffer>>,
    processed: usize,
    cursor: Duration,
    state: ChannelState,
    gain: f32,
    pitch: f32,
    looping: bool,
    relative: bool,
    position: Vec3,
    direction: Vec3,
    velocity: Vec3,
    cone: Cone,
    distances: Distances,
    environment_level: f32,
    sample_environment: Option<SampleEnvironment>,
}

impl Default for VirtualChannel {
    fn default() -> Self {
        Self {
            buffer: None,
            queue: VecDeque::new(),
            processed: 0,
            cursor: Duration::ZERO,
            state: ChannelState::Initial,
            gain: 1.0,
            pitch: 1.0,
            looping: false,
            relative: false,
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            velocity: Vec3::ZERO,
            cone: Cone::default(),
            distances: Distances::default(),
            environment_level: 0.0,
            sample_environment: None,
        }
    }
}

impl VirtualChannel {
    fn rewind(&mut self) {
        self.cursor = Duration::ZERO;
    }

    /// Moves the playhead by `dt` of device time.
    fn advance(&mut self, dt: Duration) {
        if self.state != ChannelState::Playing {
            return;
        }
        let rate = if self.pitch.is_finite() { self.pitch.max(0.0) } else { 0.0 };
        let step = Duration::try_from_secs_f32(dt.as_secs_f32() * rate).unwrap_or(Duration::MAX);
        self.cursor = self.cursor.saturating_add(step);

        if !self.queue.is_empty() {
            while let Some(front) = self.queue.front() {
                if self.cursor < front.duration() {
                    break;
                }
                self.cursor -= front.duration();
                self.queue.pop_front();
                self.processed += 1;
            }
            if self.queue.is_empty() {
                self.state = ChannelState::Stopped;
                self.rewind();
            }
            return;
        }

        match &self.buffer {
            Some(buffer) if buffer.duration().is_zero() => {
                self.state = ChannelState::Stopped;
                self.rewind();
            }
            Some(buffer) if self.looping => {
                let length = buffer.duration().as_nanos();
                self.cursor = Duration::from_nanos((self.cursor.as_nanos() % length) as u64);
            }
            Some(buffer) => {
                if self.cursor >= buffer.duration() {
                    self.state = ChannelState::Stopped;
                    self.rewind();
                }
            }
            None => {
                self.state = ChannelState::Stopped;
                self.rewind();
            }
        }
    }
}

/// A software mixing device that tracks channel state without producing
/// sound.
///
/// Playback time only moves when [`VirtualDevice::advance`] is called, so the
/// device is fully deterministic. Useful for headless runs and for tests.
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    capacity: usize,
    channels: Vec<VirtualChannel>,
    listener: Pose,
    environment: Option<AudioEnvironment>,
}

impl VirtualDevice {
    /// Creates a device that can grant at most `capacity` channels.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Vec::new(),
            listener: Pose::identity(),
            environment: None,
        }
    }

    /// Advances simulated playback on every channel.
    pub fn advance(&mut self, dt: Duration) {
        for channel in &mut self.channels {
            channel.advance(dt);
        }
    }

    /// Stops a channel behind the engine's back, as a misbehaving driver would.
    pub fn drop_channel(&mut self, channel: ChannelId) {
        if let Some(slot) = self.channels.get_mut(channel) {
            log::debug!("Device dropping channel {}", channel);
            slot.state = ChannelState::Stopped;
            slot.rewind();
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of channels currently in the playing state
    pub fn playing_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.state == ChannelState::Playing)
            .count()
    }

    pub fn bound_buffer(&self, channel: ChannelId) -> Option<&Arc<SoundBuffer>> {
        self.channels.get(channel).and_then(|c| c.buffer.as_ref())
    }

    pub fn queued_buffers(&self, channel: ChannelId) -> usize {
        self.channels.get(channel).map_or(0, |c| c.queue.len())
    }

    pub fn playback_position(&self, channel: ChannelId) -> Duration {
        self.channels
            .get(channel)
            .map_or(Duration::ZERO, |c| c.cursor)
    }

    pub fn environment_level(&self, channel: ChannelId) -> f32 {
        self.channels
            .get(channel)
            .map_or(0.0, |c| c.environment_level)
    }

    pub fn sample_environment(&self, channel: ChannelId) -> Option<&SampleEnvironment> {
        self.channels
            .get(channel)
            .and_then(|c| c.sample_environment.as_ref())
    }

    pub fn environment(&self) -> Option<&AudioEnvironment> {
        self.environment.as_ref()
    }

    fn slot(&self, channel: ChannelId) -> Option<&VirtualChannel> {
        self.channels.get(channel)
    }

    fn with_slot(&mut self, channel: ChannelId, f: impl FnOnce(&mut VirtualChannel)) {
        if let Some(slot) = self.channels.get_mut(channel) {
            f(slot);
        }
    }
}

impl AudioBackend for VirtualDevice {
    fn acquire_channels(&mut self, requested: usize) -> Result<usize> {
        if !self.channels.is_empty() {
            return Err(AudioError::AudioDevice(
                "channels already acquired".to_string(),
            ));
        }
        let granted = requested.min(self.capacity);
        self.channels = vec![VirtualChannel::default(); granted];
        log::debug!(
            "VirtualDevice granted {} of {} requested channels",
            granted,
            requested
        );
        Ok(granted)
    }

    fn release_channels(&mut self) {
        self.channels.clear();
    }

    fn bind_buffer(&mut self, channel: ChannelId, buffer: Option<Arc<SoundBuffer>>) {
        self.with_slot(channel, |slot| {
            slot.buffer = buffer;
            slot.queue.clear();
            slot.processed = 0;
            slot.state = ChannelState::Initial;
            slot.rewind();
        });
    }

    fn queue_buffer(&mut self, channel: ChannelId, buffer: Arc<SoundBuffer>) {
        self.with_slot(channel, |slot| slot.queue.push_back(buffer));
    }

    fn unqueue_processed(&mut self, channel: ChannelId) -> usize {
        match self.channels.get_mut(channel) {
            Some(slot) => std::mem::take(&mut slot.processed),
            None => 0,
        }
    }

    fn set_gain(&mut self, channel: ChannelId, gain: f32) {
        self.with_slot(channel, |slot| slot.gain = gain);
    }

    fn gain(&self, channel: ChannelId) -> f32 {
        self.slot(channel).map_or(0.0, |c| c.gain)
    }

    fn set_pitch(&mut self, channel: ChannelId, pitch: f32) {
        self.with_slot(channel, |slot| slot.pitch = pitch);
    }

    fn pitch(&self, channel: ChannelId) -> f32 {
        self.slot(channel).map_or(1.0, |c| c.pitch)
    }

    fn set_looping(&mut self, channel: ChannelId, looping: bool) {
        self.with_slot(channel, |slot| slot.looping = looping);
    }

    fn is_looping(&self, channel: ChannelId) -> bool {
        self.slot(channel).is_some_and(|c| c.looping)
    }

    fn set_relative(&mut self, channel: ChannelId, relative: bool) {
        self.with_slot(channel, |slot| slot.relative = relative);
    }

    fn is_relative(&self, channel: ChannelId) -> bool {
        self.slot(channel).is_some_and(|c| c.relative)
    }

    fn set_position(&mut self, channel: ChannelId, position: Vec3) {
        self.with_slot(channel, |slot| slot.position = position);
    }

    fn position(&self, channel: ChannelId) -> Vec3 {
        self.slot(channel).map_or(Vec3::ZERO, |c| c.position)
    }

    fn set_direction(&mut self, channel: ChannelId, direction: Vec3) {
        self.with_slot(channel, |slot| slot.direction = direction);
    }

    fn direction(&self, channel: ChannelId) -> Vec3 {
        self.slot(channel).map_or(Vec3::ZERO, |c| c.direction)
    }

    fn set_velocity(&mut self, channel: ChannelId, velocity: Vec3) {
        self.with_slot(channel, |slot| slot.velocity = velocity);
    }

    fn velocity(&self, channel: ChannelId) -> Vec3 {
        self.slot(channel).map_or(Vec3::ZERO, |c| c.velocity)
    }

    fn set_cone(&mut self, channel: ChannelId, cone: Cone) {
        self.with_slot(channel, |slot| slot.cone = cone);
    }

    fn cone(&self, channel: ChannelId) -> Cone {
        self.slot(channel).map_or_else(Cone::default, |c| c.cone)
    }

    fn set_distances(&mut self, channel: ChannelId, distances: Distances) {
        self.with_slot(channel, |slot| slot.distances = distances);
    }

    fn distances(&self, channel: ChannelId) -> Distances {
        self.slot(channel)
            .map_or_else(Distances::default, |c| c.distances)
    }

    fn play(&mut self, channel: ChannelId) {
        self.with_slot(channel, |slot| {
            if slot.state == ChannelState::Stopped {
                slot.rewind();
            }
            slot.state = ChannelState::Playing;
        });
    }

    fn stop(&mut self, channel: ChannelId) {
        self.with_slot(channel, |slot| {
            slot.state = ChannelState::Stopped;
            slot.rewind();
        });
    }

    fn state(&self, channel: ChannelId) -> ChannelState {
        self.slot(channel)
            .map_or(ChannelState::Stopped, |c| c.state)
    }

    fn set_listener(&mut self, pose: Pose) {
        self.listener = pose;
    }

    fn listener(&self) -> Pose {
        self.listener
    }

    fn apply_sample_environment(
        &mut self,
        channel: ChannelId,
        level: f32,
        environment: Option<&SampleEnvironment>,
    ) {
        self.with_slot(channel, |slot| {
            slot.environment_level = level;
            slot.sample_environment = environment.cloned();
        });
    }

    fn set_environment(&mut self, environment: Option<&AudioEnvironment>) {
        self.environment = environment.cloned();
    }
}
