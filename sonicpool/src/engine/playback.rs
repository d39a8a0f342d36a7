use super::AudioEngine;
use crate::backend::AudioBackend;
use crate::config::AudioProfile;
use crate::events::AudioEvent;
use crate::handle::Handle;
use crate::math::Pose;
use crate::registry::Lifecycle;

impl<B: AudioBackend> AudioEngine<B> {
    /// Starts a sound.
    ///
    /// A sound bound to a channel starts immediately; playing it again is a
    /// no-op. A parked looping or streaming sound becomes eligible for revival
    /// right away and is given a channel if one can be freed.
    ///
    /// # Returns
    ///
    /// `false` if the handle is unknown
    pub fn play(&mut self, handle: Handle) -> bool {
        if let Some(index) = self.channels.find_index(handle) {
            let Some(slot) = self.channels.get_mut(index) else {
                return false;
            };
            let Some(bound) = slot.handle else {
                return false;
            };
            if !bound.is_parked() {
                return true;
            }
            slot.handle = Some(bound.with_parked(false).with_loading(false));
            if let Some(entry) = self.registries.get_mut(handle) {
                entry.state.lifecycle = Lifecycle::Bound {
                    channel: index,
                    started: true,
                };
            }
            self.backend.play(index);
            log::debug!("Started {} on channel {}", handle, index);
            self.emit(AudioEvent::Started {
                handle: handle.masked(),
                channel: index,
            });
            return true;
        }

        let Some(entry) = self.registries.get_mut(handle) else {
            return false;
        };
        debug_assert!(
            entry.state.lifecycle.is_parked(),
            "{} claims a channel it is not bound to",
            handle
        );
        match entry.state.lifecycle {
            Lifecycle::Inactive => {
                entry.payload.detach();
                entry.state.lifecycle = Lifecycle::Culled { since: None };
            }
            Lifecycle::Culled { .. } => {}
            Lifecycle::Bound { .. } => return false,
        }
        self.revive(handle.kind());
        true
    }

    /// Stops a sound and forgets it.
    ///
    /// Frees its channel, if any, and removes its parked state. Unknown
    /// handles are ignored.
    ///
    /// # Returns
    ///
    /// `true` if anything was stopped
    pub fn stop(&mut self, handle: Handle) -> bool {
        let mut found = false;
        if let Some(index) = self.channels.find_index(handle) {
            self.backend.stop(index);
            self.channels.clear(index);
            found = true;
        }
        if self.registries.remove(handle) {
            found = true;
        }
        if found {
            log::debug!("Stopped {}", handle);
        }
        found
    }

    /// Stops every bound and every parked sound.
    pub fn stop_all(&mut self) {
        let bound: Vec<Handle> = self.channels.bound().map(|(_, h)| h).collect();
        for handle in bound.into_iter().rev() {
            self.stop(handle);
        }
        for handle in self.registries.looping.handles() {
            self.stop(handle);
        }
        for handle in self.registries.streaming.handles() {
            self.stop(handle);
        }
        debug_assert_eq!(self.registries.len(), 0);
    }

    /// Creates a sound from a profile and starts it.
    ///
    /// # Returns
    ///
    /// The sound's handle, or `None` if the request was rejected
    pub fn play_profile(&mut self, profile: &AudioProfile, pose: Option<Pose>) -> Option<Handle> {
        let handle = self.create_sound(
            &profile.description,
            &profile.filename,
            pose,
            profile.environment.as_ref(),
        )?;
        self.play(handle);
        Some(handle)
    }

    /// Resolves the buffers of every profile marked for preloading.
    ///
    /// # Returns
    ///
    /// The number of profiles whose buffer was found
    pub fn preload(&mut self, profiles: &[AudioProfile]) -> usize {
        let mut loaded = 0;
        for profile in profiles {
            if !profile.preload || profile.description.is_streaming {
                continue;
            }
            if self.resolver.resolve(&profile.filename).is_some() {
                loaded += 1;
            } else {
                log::warn!("Failed to preload '{}'", profile.filename);
            }
        }
        loaded
    }
}
