//! The per-frame tick: gain refresh, channel reclamation, rescoring, stream
//! upkeep and revival of parked sounds.

use super::AudioEngine;
use super::admission::configure_channel;
use crate::backend::{AudioBackend, ChannelId, ChannelState};
use crate::channel::ChannelSlot;
use crate::events::AudioEvent;
use crate::handle::{Handle, SoundKind};
use crate::registry::{Lifecycle, Payload};
use crate::scoring;

/// What to do with a channel that is no longer playing.
enum Reclaim {
    /// Finished or never started; nothing else to do
    Drop,
    /// Park the tracked sound as never played
    Park,
    /// The device stopped a sound that should still be playing
    Cull,
    /// A non-looping stream played all of its data
    Complete,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Advances the engine by one frame.
    ///
    /// Runs, in order: the max-distance gain refresh, reclamation of channels
    /// that stopped, rescoring, revival of parked loopers, stream buffer
    /// upkeep, and revival of parked streams.
    pub fn update(&mut self) {
        if self.shut_down {
            return;
        }
        self.refresh_max_distance();
        self.close_handles();
        self.update_scores();
        self.revive(SoundKind::Looping);
        self.update_streams();
        self.revive(SoundKind::Streaming);
    }

    /// Silences positional channels beyond their max distance and restores
    /// the rest. Some mixers do not mute out-of-range sources on their own.
    fn refresh_max_distance(&mut self) {
        let listener = self.backend.listener().position;
        for (index, slot) in self.channels.iter() {
            if slot.is_free() || self.backend.is_relative(index) {
                continue;
            }
            let distance = self.backend.position(index).distance(listener);
            let value = if self.backend.distances(index).max - distance < 0.0 {
                0.0
            } else {
                scoring::channel_gain(
                    slot.source_volume,
                    self.category_gain_of(slot.category),
                    self.master_gain,
                )
            };
            self.backend.set_gain(index, value);
        }
    }

    /// Frees channels that are no longer playing.
    fn close_handles(&mut self) {
        let bound: Vec<(ChannelId, Handle)> = self.channels.bound().collect();
        for (index, handle) in bound {
            if handle.is_loading() || self.backend.state(index) == ChannelState::Playing {
                continue;
            }

            let reclaim = match (handle.kind(), handle.is_parked()) {
                (SoundKind::OneShot, _) => Reclaim::Drop,
                (_, true) => Reclaim::Park,
                (SoundKind::Looping, false) => Reclaim::Cull,
                (SoundKind::Streaming, false) => {
                    let looping = self
                        .registries
                        .get(handle)
                        .is_some_and(|state| state.desc.is_looping);
                    if !looping && self.stream_finished(handle, index) {
                        Reclaim::Complete
                    } else {
                        Reclaim::Cull
                    }
                }
            };

            self.channels.clear(index);
            let now = self.now();
            match reclaim {
                Reclaim::Drop => {}
                Reclaim::Park => {
                    if let Some(entry) = self.registries.get_mut(handle) {
                        entry.payload.detach();
                        entry.state.lifecycle = Lifecycle::Inactive;
                    }
                    log::debug!("Parked unstarted {} from channel {}", handle, index);
                }
                Reclaim::Cull => {
                    if let Some(entry) = self.registries.get_mut(handle) {
                        entry.payload.detach();
                        entry.state.lifecycle = Lifecycle::Culled { since: Some(now) };
                    }
                    log::warn!("Device stopped {} on channel {} unexpectedly", handle, index);
                    self.emit(AudioEvent::DeviceDropped {
                        handle: handle.masked(),
                        channel: index,
                    });
                }
                Reclaim::Complete => {
                    self.registries.remove(handle);
                    log::debug!("Stream {} finished", handle);
                    self.emit(AudioEvent::Completed {
                        handle: handle.masked(),
                    });
                }
            }
        }
    }

    /// Collects the buffers a stopped stream played and reports whether it
    /// got through all of its data. A stream that stopped short was dropped
    /// by the device or ran dry.
    fn stream_finished(&mut self, handle: Handle, index: ChannelId) -> bool {
        let Some(entry) = self.registries.get_mut(handle) else {
            return false;
        };
        entry.payload.update(&mut self.backend, index);
        entry
            .payload
            .stream()
            .is_some_and(|stream| stream.elapsed_time() >= stream.total_time())
    }

    /// Rescores bound channels from what the device reports.
    pub(super) fn update_channel_scores(&mut self) {
        let listener = self.backend.listener().position;
        let gains = &self.category_gains;
        let backend = &self.backend;
        for (index, slot) in self.channels.iter_mut() {
            if slot.is_free() {
                slot.score = 0.0;
                continue;
            }
            let category_gain = gains.get(slot.category).copied().unwrap_or(0.0);
            let falloff = (!backend.is_relative(index)).then(|| {
                let distances = backend.distances(index);
                (backend.position(index), distances.reference, distances.max)
            });
            slot.score = scoring::score(slot.source_volume, category_gain, falloff, listener);
        }
    }

    /// Rescores channels and every parked sound whose dwell time has passed.
    fn update_scores(&mut self) {
        self.update_channel_scores();

        let listener = self.backend.listener().position;
        let now = self.now();
        let period = self.desc.min_uncull_period;
        let gains = &self.category_gains;
        for state in self.registries.states_mut() {
            if !state.lifecycle.dwell_elapsed(now, period) {
                continue;
            }
            let category_gain = gains.get(state.desc.category).copied().unwrap_or(0.0);
            let falloff = state.desc.is_3d.then_some((
                state.position,
                state.desc.reference_distance,
                state.desc.max_distance,
            ));
            state.score = scoring::score(state.desc.volume, category_gain, falloff, listener);
        }
    }

    fn update_streams(&mut self) {
        for entry in self.registries.streaming.iter_mut() {
            if let Lifecycle::Bound { channel, .. } = entry.state.lifecycle {
                entry.payload.update(&mut self.backend, channel);
            }
        }
    }

    /// Gives channels back to culled sounds of one kind, loudest first.
    ///
    /// Stops at the first sound that can neither find a free channel nor
    /// evict a quieter one. Sounds whose data is gone are retired.
    pub(super) fn revive(&mut self, kind: SoundKind) {
        let now = self.now();
        let period = self.desc.min_uncull_period;
        let min_gain = self.desc.min_uncull_gain;
        let candidates = match kind {
            SoundKind::Looping => self.registries.looping.revival_candidates(now, period, min_gain),
            SoundKind::Streaming => {
                self.registries
                    .streaming
                    .revival_candidates(now, period, min_gain)
            }
            SoundKind::OneShot => return,
        };

        for (handle, score) in candidates {
            let available = self
                .registries
                .get_mut(handle)
                .is_some_and(|entry| entry.payload.is_available());
            if !available {
                self.retire(handle);
                continue;
            }

            let index = match self.channels.find_free() {
                Some(index) => index,
                None => match self.evict(score) {
                    Some(index) => index,
                    None => break,
                },
            };
            self.bind_parked(handle, index);
        }
    }

    fn retire(&mut self, handle: Handle) {
        self.registries.remove(handle);
        log::info!("Retired {}: its data is no longer available", handle);
        self.emit(AudioEvent::Retired {
            handle: handle.masked(),
        });
    }

    /// Restores a parked sound's state onto `index` and starts it.
    fn bind_parked(&mut self, handle: Handle, index: ChannelId) {
        let attached = match self.registries.get_mut(handle) {
            Some(entry) => entry.payload.attach(&mut self.backend, index),
            None => return,
        };
        if !attached {
            self.retire(handle);
            return;
        }

        let master_gain = self.master_gain;
        let environment_enabled = self.environment_enabled;
        let Self {
            backend,
            channels,
            registries,
            category_gains,
            ..
        } = self;
        let Some(entry) = registries.get_mut(handle) else {
            return;
        };
        let state = &mut *entry.state;

        let category_gain = category_gains
            .get(state.desc.category)
            .copied()
            .unwrap_or(0.0);
        let gain = scoring::channel_gain(state.desc.volume, category_gain, master_gain);
        let placement = state
            .desc
            .is_3d
            .then_some((state.position, state.direction));
        configure_channel(backend, index, &state.desc, gain, state.pitch, placement);
        if environment_enabled && placement.is_some() {
            backend.apply_sample_environment(
                index,
                state.desc.environment_level,
                state.environment.as_ref(),
            );
        }

        state.lifecycle = Lifecycle::Bound {
            channel: index,
            started: true,
        };
        channels.bind(
            index,
            ChannelSlot {
                handle: Some(state.flagged_handle()),
                source_volume: state.desc.volume,
                category: state.desc.category,
                score: state.score,
                buffer: entry.payload.buffer(),
                environment: state.environment.clone(),
                environment_level: state.desc.environment_level,
            },
        );
        backend.play(index);

        log::info!("Revived {} on channel {}", handle, index);
        self.emit(AudioEvent::Revived {
            handle: handle.masked(),
            channel: index,
        });
    }
}
