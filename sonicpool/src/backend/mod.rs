//! The device/mixing backend the engine drives.
//!
//! The engine never talks to hardware directly. Everything it needs from a
//! mixer goes through [`AudioBackend`]: a fixed set of channels addressed by
//! index, each with the usual per-source parameters and transport controls,
//! plus a single listener.

mod virtual_device;

pub use virtual_device::VirtualDevice;

use crate::config::Cone;
use crate::environment::{AudioEnvironment, SampleEnvironment};
use crate::error::Result;
use crate::math::{Pose, Vec3};
use crate::resource::SoundBuffer;
use std::sync::Arc;

/// Index of a physical mixing channel, `0..channel_count`.
pub type ChannelId = usize;

/// Transport state of a channel as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Configured but never started
    #[default]
    Initial,
    Playing,
    Stopped,
}

/// Distance falloff parameters of a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distances {
    /// Within this distance the channel plays at full volume
    pub reference: f32,
    /// Beyond this distance the channel is silent
    pub max: f32,
}

impl Default for Distances {
    fn default() -> Self {
        Self {
            reference: 1.0,
            max: 100.0,
        }
    }
}

/// A mixing device with a fixed pool of channels.
///
/// Gains passed to the backend are linear and already include category and
/// master scaling. Calls with an out-of-range channel index are ignored by
/// well-behaved implementations.
pub trait AudioBackend {
    /// Reserves up to `requested` channels and returns how many were granted.
    fn acquire_channels(&mut self, requested: usize) -> Result<usize>;

    /// Gives every channel back to the device.
    fn release_channels(&mut self);

    /// Binds a buffer to a channel, or unbinds it with `None`. Clears any
    /// queued stream buffers.
    fn bind_buffer(&mut self, channel: ChannelId, buffer: Option<Arc<SoundBuffer>>);

    /// Appends a buffer to a channel's stream queue.
    fn queue_buffer(&mut self, channel: ChannelId, buffer: Arc<SoundBuffer>);

    /// Removes finished buffers from a channel's stream queue and returns how
    /// many there were.
    fn unqueue_processed(&mut self, channel: ChannelId) -> usize;

    fn set_gain(&mut self, channel: ChannelId, gain: f32);
    fn gain(&self, channel: ChannelId) -> f32;

    fn set_pitch(&mut self, channel: ChannelId, pitch: f32);
    fn pitch(&self, channel: ChannelId) -> f32;

    fn set_looping(&mut self, channel: ChannelId, looping: bool);
    fn is_looping(&self, channel: ChannelId) -> bool;

    /// Relative channels are positioned relative to the listener and are not
    /// attenuated by distance.
    fn set_relative(&mut self, channel: ChannelId, relative: bool);
    fn is_relative(&self, channel: ChannelId) -> bool;

    fn set_position(&mut self, channel: ChannelId, position: Vec3);
    fn position(&self, channel: ChannelId) -> Vec3;

    fn set_direction(&mut self, channel: ChannelId, direction: Vec3);
    fn direction(&self, channel: ChannelId) -> Vec3;

    fn set_velocity(&mut self, channel: ChannelId, velocity: Vec3);
    fn velocity(&self, channel: ChannelId) -> Vec3;

    fn set_cone(&mut self, channel: ChannelId, cone: Cone);
    fn cone(&self, channel: ChannelId) -> Cone;

    fn set_distances(&mut self, channel: ChannelId, distances: Distances);
    fn distances(&self, channel: ChannelId) -> Distances;

    fn play(&mut self, channel: ChannelId);
    fn stop(&mut self, channel: ChannelId);
    fn state(&self, channel: ChannelId) -> ChannelState;

    fn set_listener(&mut self, pose: Pose);
    fn listener(&self) -> Pose;

    /// Applies per-sound environmental settings to a channel. `None` resets
    /// the channel to a dry mix.
    fn apply_sample_environment(
        &mut self,
        _channel: ChannelId,
        _level: f32,
        _environment: Option<&SampleEnvironment>,
    ) {
    }

    /// Sets the global room environment. `None` restores the generic room.
    fn set_environment(&mut self, _environment: Option<&AudioEnvironment>) {}
}
