use super::AudioEngine;
use crate::backend::{AudioBackend, ChannelState};
use crate::handle::SoundKind;

/// Snapshot of channel and registry occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Channels with a bound handle
    pub open_handles: usize,
    pub open_looping_handles: usize,
    pub open_streaming_handles: usize,

    /// Channels the device reports as playing
    pub active_channels: usize,
    /// Playing channels with no handle bound
    pub null_active_channels: usize,
    pub active_looping_channels: usize,
    pub active_streaming_channels: usize,

    pub looping_sounds: usize,
    pub inactive_looping_sounds: usize,
    pub culled_looping_sounds: usize,

    pub streaming_sounds: usize,
    pub inactive_streaming_sounds: usize,
    pub culled_streaming_sounds: usize,

    /// Looping records waiting for reuse
    pub pooled_looping_records: usize,
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn metrics(&self) -> EngineMetrics {
        let mut metrics = EngineMetrics::default();

        for (index, slot) in self.channels.iter() {
            let kind = slot.handle.map(|h| h.kind());
            if kind.is_some() {
                metrics.open_handles += 1;
            }
            match kind {
                Some(SoundKind::Looping) => metrics.open_looping_handles += 1,
                Some(SoundKind::Streaming) => metrics.open_streaming_handles += 1,
                _ => {}
            }

            if self.backend.state(index) != ChannelState::Playing {
                continue;
            }
            metrics.active_channels += 1;
            match kind {
                None => metrics.null_active_channels += 1,
                Some(SoundKind::Looping) => metrics.active_looping_channels += 1,
                Some(SoundKind::Streaming) => metrics.active_streaming_channels += 1,
                Some(SoundKind::OneShot) => {}
            }
        }

        let looping = &self.registries.looping;
        metrics.looping_sounds = looping.len();
        metrics.inactive_looping_sounds = looping.count_inactive();
        metrics.culled_looping_sounds = looping.count_culled();
        metrics.pooled_looping_records = looping.pooled_len();

        let streaming = &self.registries.streaming;
        metrics.streaming_sounds = streaming.len();
        metrics.inactive_streaming_sounds = streaming.count_inactive();
        metrics.culled_streaming_sounds = streaming.count_culled();

        metrics
    }
}
