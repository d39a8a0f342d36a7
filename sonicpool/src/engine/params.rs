//! Per-sound parameter access.
//!
//! Setters write to the bound channel and to the parked state, so a value
//! survives the sound being culled and revived. Getters read the channel when
//! the sound has one and fall back to the parked state otherwise.

use super::AudioEngine;
use crate::backend::{AudioBackend, ChannelId, Distances};
use crate::channel::ChannelSlot;
use crate::config::Cone;
use crate::gain;
use crate::handle::Handle;
use crate::math::{Pose, Vec3};
use crate::registry::SoundState;
use crate::scoring;

/// Highest pitch multiplier a sound may be given
pub const MAX_PITCH: f32 = 4.0;

/// Limits a pitch multiplier to `[0, MAX_PITCH]`. NaN falls back to normal
/// speed.
fn clamp_pitch(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(0.0, MAX_PITCH)
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    fn write_through(
        &mut self,
        handle: Handle,
        on_channel: impl FnOnce(&mut B, ChannelId, &mut ChannelSlot),
        on_state: impl FnOnce(&mut SoundState),
    ) -> bool {
        let mut found = false;
        if let Some(index) = self.channels.find_index(handle) {
            if let Some(slot) = self.channels.get_mut(index) {
                on_channel(&mut self.backend, index, slot);
                found = true;
            }
        }
        if let Some(entry) = self.registries.get_mut(handle) {
            on_state(entry.state);
            found = true;
        }
        found
    }

    fn read<T>(
        &self,
        handle: Handle,
        on_channel: impl FnOnce(&B, ChannelId, &ChannelSlot) -> T,
        on_state: impl FnOnce(&SoundState) -> T,
    ) -> Option<T> {
        if let Some(index) = self.channels.find_index(handle) {
            if let Some(slot) = self.channels.get(index) {
                return Some(on_channel(&self.backend, index, slot));
            }
        }
        self.registries.get(handle).map(on_state)
    }

    /// Sets a sound's unattenuated volume (linear, clamped to `[0, 1]`).
    ///
    /// The channel is driven at the volume scaled by category and master
    /// gain.
    pub fn set_gain(&mut self, handle: Handle, value: f32) -> bool {
        let value = value.clamp(0.0, 1.0);
        let master = self.master_gain;
        let category_gain = self
            .channels
            .find_index(handle)
            .and_then(|index| self.channels.get(index))
            .map_or(0.0, |slot| self.category_gain_of(slot.category));
        self.write_through(
            handle,
            |backend, index, slot| {
                slot.source_volume = value;
                backend.set_gain(index, scoring::channel_gain(value, category_gain, master));
            },
            |state| state.desc.volume = value,
        )
    }

    /// A sound's unattenuated volume.
    pub fn gain(&self, handle: Handle) -> Option<f32> {
        self.read(
            handle,
            |_, _, slot| slot.source_volume,
            |state| state.desc.volume,
        )
    }

    /// Sets a sound's volume on the perceptual scale.
    pub fn set_gain_log(&mut self, handle: Handle, value: f32) -> bool {
        self.set_gain(handle, gain::log_to_linear(value))
    }

    pub fn gain_log(&self, handle: Handle) -> Option<f32> {
        self.gain(handle).map(gain::linear_to_log)
    }

    /// Sets a sound's pitch multiplier, clamped to `[0, MAX_PITCH]`.
    pub fn set_pitch(&mut self, handle: Handle, value: f32) -> bool {
        let value = clamp_pitch(value);
        self.write_through(
            handle,
            |backend, index, _| backend.set_pitch(index, value),
            |state| state.pitch = value,
        )
    }

    pub fn pitch(&self, handle: Handle) -> Option<f32> {
        self.read(
            handle,
            |backend, index, _| backend.pitch(index),
            |state| state.pitch,
        )
    }

    pub fn set_position(&mut self, handle: Handle, value: Vec3) -> bool {
        self.write_through(
            handle,
            |backend, index, _| backend.set_position(index, value),
            |state| state.position = value,
        )
    }

    pub fn position(&self, handle: Handle) -> Option<Vec3> {
        self.read(
            handle,
            |backend, index, _| backend.position(index),
            |state| state.position,
        )
    }

    pub fn set_direction(&mut self, handle: Handle, value: Vec3) -> bool {
        self.write_through(
            handle,
            |backend, index, _| backend.set_direction(index, value),
            |state| state.direction = value,
        )
    }

    pub fn direction(&self, handle: Handle) -> Option<Vec3> {
        self.read(
            handle,
            |backend, index, _| backend.direction(index),
            |state| state.direction,
        )
    }

    /// Sets the velocity of a bound sound. Parked sounds keep no velocity.
    pub fn set_velocity(&mut self, handle: Handle, value: Vec3) -> bool {
        match self.channels.find_index(handle) {
            Some(index) => {
                self.backend.set_velocity(index, value);
                true
            }
            None => false,
        }
    }

    pub fn velocity(&self, handle: Handle) -> Option<Vec3> {
        self.channels
            .find_index(handle)
            .map(|index| self.backend.velocity(index))
    }

    /// Moves a sound to `pose`: its position and its forward direction.
    pub fn set_transform(&mut self, handle: Handle, pose: Pose) -> bool {
        let position = pose.position;
        let direction = pose.forward();
        self.write_through(
            handle,
            |backend, index, _| {
                backend.set_position(index, position);
                backend.set_direction(index, direction);
            },
            |state| {
                state.position = position;
                state.direction = direction;
            },
        )
    }

    pub fn set_cone(&mut self, handle: Handle, cone: Cone) -> bool {
        self.write_through(
            handle,
            |backend, index, _| backend.set_cone(index, cone),
            |state| state.desc.cone = cone,
        )
    }

    pub fn cone(&self, handle: Handle) -> Option<Cone> {
        self.read(
            handle,
            |backend, index, _| backend.cone(index),
            |state| state.desc.cone,
        )
    }

    pub fn set_reference_distance(&mut self, handle: Handle, value: f32) -> bool {
        self.write_through(
            handle,
            |backend, index, _| {
                let distances = backend.distances(index);
                backend.set_distances(
                    index,
                    Distances {
                        reference: value,
                        ..distances
                    },
                );
            },
            |state| state.desc.reference_distance = value,
        )
    }

    pub fn reference_distance(&self, handle: Handle) -> Option<f32> {
        self.read(
            handle,
            |backend, index, _| backend.distances(index).reference,
            |state| state.desc.reference_distance,
        )
    }

    pub fn set_max_distance(&mut self, handle: Handle, value: f32) -> bool {
        self.write_through(
            handle,
            |backend, index, _| {
                let distances = backend.distances(index);
                backend.set_distances(
                    index,
                    Distances {
                        max: value,
                        ..distances
                    },
                );
            },
            |state| state.desc.max_distance = value,
        )
    }

    pub fn max_distance(&self, handle: Handle) -> Option<f32> {
        self.read(
            handle,
            |backend, index, _| backend.distances(index).max,
            |state| state.desc.max_distance,
        )
    }
}
