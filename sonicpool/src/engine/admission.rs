//! Admission control: binding new requests to channels and evicting the
//! quietest occupant when none is free.

use super::AudioEngine;
use crate::backend::{AudioBackend, ChannelId, Distances};
use crate::channel::ChannelSlot;
use crate::config::SoundDescription;
use crate::environment::SampleEnvironment;
use crate::events::{AudioEvent, RejectReason};
use crate::handle::{Handle, SoundKind};
use crate::math::{Pose, Vec3};
use crate::registry::{Lifecycle, LoopingSound, Payload, SoundState, StreamingSound};
use crate::resource::SoundBuffer;
use crate::scoring;
use std::sync::Arc;

/// The resolved data behind a request.
enum Source {
    Buffer(Arc<SoundBuffer>),
    Looping(LoopingSound),
    Streaming(StreamingSound),
}

/// Writes a sound's play parameters to a channel.
///
/// `placement` is the world position and direction of a positional sound;
/// `None` plays the channel relative to the listener.
pub(super) fn configure_channel(
    backend: &mut dyn AudioBackend,
    channel: ChannelId,
    desc: &SoundDescription,
    gain: f32,
    pitch: f32,
    placement: Option<(Vec3, Vec3)>,
) {
    backend.set_gain(channel, gain);
    backend.set_pitch(channel, pitch);
    backend.set_cone(channel, desc.cone);
    match placement {
        Some((position, direction)) => {
            backend.set_relative(channel, false);
            backend.set_position(channel, position);
            backend.set_direction(channel, direction);
        }
        None => {
            backend.set_relative(channel, true);
            backend.set_position(channel, Vec3::new(0.0, 0.0, 1.0));
        }
    }
    backend.set_distances(
        channel,
        Distances {
            reference: desc.reference_distance,
            max: desc.max_distance,
        },
    );
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Creates a sound and binds it to a channel if one can be had.
    ///
    /// The channel is configured but not started; call
    /// [`AudioEngine::play`] to start it. Looping and streaming sounds that
    /// find no channel are parked and get one later from
    /// [`AudioEngine::update`].
    ///
    /// # Arguments
    ///
    /// * `desc` - Volume, category, falloff and lifetime of the sound
    /// * `source` - Buffer name, or stream name for streaming sounds
    /// * `pose` - World placement; required for positional sounds
    /// * `environment` - Environmental settings for positional sounds
    ///
    /// # Returns
    ///
    /// The sound's handle, or `None` if the request was rejected
    pub fn create_sound(
        &mut self,
        desc: &SoundDescription,
        source: &str,
        pose: Option<Pose>,
        environment: Option<&SampleEnvironment>,
    ) -> Option<Handle> {
        if self.shut_down {
            return None;
        }
        if source.is_empty() || desc.category >= self.category_gains.len() {
            return self.reject(RejectReason::InvalidRequest);
        }

        let kind = desc.kind();
        let category_gain = self.category_gain_of(desc.category);

        let source_volume = desc.volume.clamp(0.0, 1.0);
        let mut volume = source_volume;
        if let (true, Some(pose)) = (desc.is_3d, pose) {
            volume *= scoring::approximate_3d_volume(
                desc,
                pose.position,
                self.backend.listener().position,
            );
        }

        if !kind.is_persistent() && category_gain == 0.0 {
            return self.reject(RejectReason::MutedCategory);
        }
        volume *= category_gain;
        if !kind.is_persistent() && volume <= self.desc.min_gain {
            return self.reject(RejectReason::Inaudible);
        }

        let Some(source) = self.resolve_source(kind, source, desc.is_looping) else {
            return self.reject(RejectReason::UnresolvedSource);
        };
        // a stream that cannot start must not cost another sound its channel
        if matches!(&source, Source::Streaming(payload) if !payload.is_available()) {
            return self.reject(RejectReason::UnresolvedSource);
        }

        let mut channel = None;
        let mut evicted = false;
        if volume > self.desc.min_gain {
            channel = self.channels.find_free();
            if channel.is_none() {
                self.update_channel_scores();
                channel = self.evict(volume);
                evicted = channel.is_some();
            }
        }

        let handle = self.handles.allocate().with_kind(kind);
        let placement = pose.filter(|_| desc.is_3d);
        // without a pose a positional sound plays relative to the listener
        let mut stored = desc.clone();
        stored.volume = source_volume;
        stored.is_3d = placement.is_some();
        let mut state = SoundState::new(handle, stored, volume);
        if let Some(pose) = pose {
            state.position = pose.position;
            state.direction = pose.forward();
        }
        state.environment = environment.cloned();

        let Some(index) = channel else {
            return match source {
                Source::Looping(payload) => {
                    self.registries.looping.insert(state, payload);
                    self.defer(handle)
                }
                Source::Streaming(payload) => {
                    self.registries.streaming.insert(state, payload);
                    self.defer(handle)
                }
                Source::Buffer(_) => self.reject(RejectReason::NoChannel),
            };
        };

        let gain = scoring::channel_gain(source_volume, category_gain, self.master_gain);
        let bound = handle
            .with_parked(true)
            .with_loading(kind == SoundKind::Streaming);
        let mut slot = ChannelSlot {
            handle: Some(bound),
            source_volume,
            category: desc.category,
            score: volume,
            buffer: None,
            environment: state.environment.clone(),
            environment_level: desc.environment_level,
        };
        state.lifecycle = Lifecycle::Bound {
            channel: index,
            started: false,
        };

        match source {
            Source::Buffer(buffer) => {
                self.backend.bind_buffer(index, Some(buffer.clone()));
                self.backend.set_looping(index, false);
                slot.buffer = Some(buffer);
            }
            Source::Looping(mut payload) => {
                payload.attach(&mut self.backend, index);
                slot.buffer = payload.buffer();
                self.registries.looping.insert(state.clone(), payload);
            }
            Source::Streaming(mut payload) => {
                if !payload.attach(&mut self.backend, index) {
                    if evicted {
                        log::warn!(
                            "Channel {} was freed for {} but its stream failed to start",
                            index,
                            handle
                        );
                    }
                    payload.release();
                    return self.reject(RejectReason::UnresolvedSource);
                }
                self.registries.streaming.insert(state.clone(), payload);
            }
        }

        configure_channel(
            &mut self.backend,
            index,
            desc,
            gain,
            state.pitch,
            placement.map(|p| (p.position, p.forward())),
        );
        if self.environment_enabled && placement.is_some() {
            self.backend
                .apply_sample_environment(index, desc.environment_level, environment);
        }
        self.channels.bind(index, slot);

        log::debug!("Bound {} to channel {} (score {:.3})", handle, index, volume);
        Some(handle.masked())
    }

    fn resolve_source(&mut self, kind: SoundKind, name: &str, looping: bool) -> Option<Source> {
        match kind {
            SoundKind::OneShot => self.resolver.resolve(name).map(Source::Buffer),
            SoundKind::Looping => self
                .resolver
                .resolve(name)
                .map(|buffer| Source::Looping(LoopingSound::new(buffer))),
            SoundKind::Streaming => self
                .streams
                .create(name, looping)
                .map(|stream| Source::Streaming(StreamingSound::new(stream))),
        }
    }

    fn reject(&self, reason: RejectReason) -> Option<Handle> {
        log::debug!("Rejected sound request: {:?}", reason);
        self.emit(AudioEvent::Rejected { reason });
        None
    }

    fn defer(&self, handle: Handle) -> Option<Handle> {
        log::debug!("Deferred {}: no channel available", handle);
        self.emit(AudioEvent::Deferred { handle });
        Some(handle.masked())
    }

    /// Frees the channel with the lowest score strictly below `volume`.
    ///
    /// A tracked victim is parked: as inactive if it never started, as culled
    /// otherwise. Returns the freed channel.
    pub(super) fn evict(&mut self, volume: f32) -> Option<ChannelId> {
        let index = self.channels.lowest_below(volume)?;
        let handle = self.channels.get(index).and_then(|s| s.handle)?;
        let now = self.now();

        if let Some(entry) = self.registries.get_mut(handle) {
            debug_assert!(
                entry.state.lifecycle.channel() == Some(index),
                "{} is bound to channel {} but its entry disagrees",
                handle,
                index
            );
            entry.payload.detach();
            entry.state.lifecycle = if handle.is_parked() {
                Lifecycle::Inactive
            } else {
                Lifecycle::Culled { since: Some(now) }
            };
        }

        self.backend.stop(index);
        self.channels.clear(index);
        log::debug!("Culled {} from channel {} for volume {:.3}", handle, index, volume);
        self.emit(AudioEvent::Culled {
            handle: handle.masked(),
            channel: index,
        });
        Some(index)
    }
}
