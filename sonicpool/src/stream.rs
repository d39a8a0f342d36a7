//! Streaming sources: sounds fed to a channel a segment at a time.

use crate::backend::{AudioBackend, ChannelId};
use crate::resource::SoundBuffer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A decoder feeding one channel.
///
/// The engine calls `init_stream` whenever the stream gains a channel,
/// `update_buffers` every tick while it holds one, and `free_stream` when it
/// loses it. A stream that is re-initialised starts again from the beginning.
pub trait StreamSource {
    /// Prepares `channel` for playback. Returns false if the stream could not
    /// be started.
    fn init_stream(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) -> bool;

    /// Refills the channel's buffer queue.
    fn update_buffers(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId);

    /// Releases decoder state. Called before the stream is parked or dropped.
    fn free_stream(&mut self);

    fn elapsed_time(&self) -> Duration;

    fn total_time(&self) -> Duration;

    /// Returns false once the underlying data is gone for good.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Opens streams by name.
pub trait StreamSourceFactory {
    fn create(&mut self, name: &str, looping: bool) -> Option<Box<dyn StreamSource>>;
}

/// A factory that knows no streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStreams;

impl StreamSourceFactory for NoStreams {
    fn create(&mut self, _name: &str, _looping: bool) -> Option<Box<dyn StreamSource>> {
        None
    }
}

/// Number of segments kept queued ahead of the playhead
const QUEUE_DEPTH: u32 = 3;

/// A stream that plays a resident track in fixed-length segments.
#[derive(Debug)]
pub struct SegmentedStream {
    track: Arc<SoundBuffer>,
    segment: Duration,
    looping: bool,
    queued: Duration,
    played: Duration,
    active: bool,
}

impl SegmentedStream {
    pub fn new(track: Arc<SoundBuffer>, segment: Duration, looping: bool) -> Self {
        Self {
            track,
            segment,
            looping,
            queued: Duration::ZERO,
            played: Duration::ZERO,
            active: false,
        }
    }

    fn next_segment(&self) -> Option<Duration> {
        let total = self.track.duration();
        if total.is_zero() || self.segment.is_zero() {
            return None;
        }
        let offset = if self.looping {
            Duration::from_nanos((self.queued.as_nanos() % total.as_nanos()) as u64)
        } else if self.queued >= total {
            return None;
        } else {
            self.queued
        };
        Some(self.segment.min(total - offset))
    }

    fn fill(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) {
        let ahead = self.segment * QUEUE_DEPTH;
        while self.queued.saturating_sub(self.played) < ahead {
            let Some(length) = self.next_segment() else {
                break;
            };
            let piece = SoundBuffer::new(self.track.name(), self.track.id(), length);
            backend.queue_buffer(channel, Arc::new(piece));
            self.queued += length;
        }
    }
}

impl StreamSource for SegmentedStream {
    fn init_stream(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) -> bool {
        if !self.track.is_resident() {
            return false;
        }
        self.queued = Duration::ZERO;
        self.played = Duration::ZERO;
        backend.bind_buffer(channel, None);
        backend.set_looping(channel, false);
        self.fill(backend, channel);
        self.active = true;
        true
    }

    fn update_buffers(&mut self, backend: &mut dyn AudioBackend, channel: ChannelId) {
        if !self.active {
            return;
        }
        let processed = backend.unqueue_processed(channel) as u32;
        self.played = (self.played + self.segment * processed).min(self.queued);
        self.fill(backend, channel);
    }

    fn free_stream(&mut self) {
        self.active = false;
        self.queued = Duration::ZERO;
        self.played = Duration::ZERO;
    }

    fn elapsed_time(&self) -> Duration {
        let total = self.track.duration();
        if self.looping && !total.is_zero() {
            Duration::from_nanos((self.played.as_nanos() % total.as_nanos()) as u64)
        } else {
            self.played.min(total)
        }
    }

    fn total_time(&self) -> Duration {
        self.track.duration()
    }

    fn is_valid(&self) -> bool {
        self.track.is_resident()
    }
}

/// Named tracks served as [`SegmentedStream`]s.
#[derive(Debug)]
pub struct StreamCatalog {
    tracks: HashMap<String, Arc<SoundBuffer>>,
    segment: Duration,
    next_id: u32,
}

impl StreamCatalog {
    pub fn new(segment: Duration) -> Self {
        Self {
            tracks: HashMap::new(),
            segment,
            next_id: 0,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, duration: Duration) -> Arc<SoundBuffer> {
        let name = name.into();
        self.next_id += 1;
        let track = Arc::new(SoundBuffer::new(name.clone(), self.next_id, duration));
        if let Some(previous) = self.tracks.insert(name, track.clone()) {
            previous.purge();
        }
        track
    }

    /// Removes a track. Open streams of it become invalid.
    pub fn purge(&mut self, name: &str) -> bool {
        match self.tracks.remove(name) {
            Some(track) => {
                track.purge();
                true
            }
            None => false,
        }
    }
}

impl StreamSourceFactory for StreamCatalog {
    fn create(&mut self, name: &str, looping: bool) -> Option<Box<dyn StreamSource>> {
        let track = self.tracks.get(name)?.clone();
        Some(Box::new(SegmentedStream::new(track, self.segment, looping)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChannelState, VirtualDevice};

    fn device() -> VirtualDevice {
        let mut device = VirtualDevice::new(1);
        device.acquire_channels(1).unwrap();
        device
    }

    #[test]
    fn test_no_streams_declines() {
        assert!(NoStreams.create("music", false).is_none());
    }

    #[test]
    fn test_stream_plays_to_end() {
        let mut catalog = StreamCatalog::new(Duration::from_millis(100));
        catalog.insert("music", Duration::from_millis(450));
        let mut stream = catalog.create("music", false).unwrap();
        let mut device = device();

        assert!(stream.init_stream(&mut device, 0));
        assert_eq!(device.queued_buffers(0), 3);
        device.play(0);

        for _ in 0..5 {
            device.advance(Duration::from_millis(100));
            stream.update_buffers(&mut device, 0);
        }
        assert_eq!(stream.elapsed_time(), Duration::from_millis(450));
        assert_eq!(device.state(0), ChannelState::Stopped);
    }

    #[test]
    fn test_looping_stream_keeps_queue_full() {
        let mut catalog = StreamCatalog::new(Duration::from_millis(100));
        catalog.insert("ambience", Duration::from_millis(200));
        let mut stream = catalog.create("ambience", true).unwrap();
        let mut device = device();

        stream.init_stream(&mut device, 0);
        device.play(0);
        for _ in 0..10 {
            device.advance(Duration::from_millis(100));
            stream.update_buffers(&mut device, 0);
        }
        assert_eq!(device.state(0), ChannelState::Playing);
        assert_eq!(device.queued_buffers(0), 3);
        assert!(stream.elapsed_time() < Duration::from_millis(200));
    }

    #[test]
    fn test_purged_track_invalidates_stream() {
        let mut catalog = StreamCatalog::new(Duration::from_millis(100));
        catalog.insert("music", Duration::from_secs(1));
        let mut stream = catalog.create("music", false).unwrap();
        assert!(stream.is_valid());

        catalog.purge("music");
        assert!(!stream.is_valid());
        let mut device = device();
        assert!(!stream.init_stream(&mut device, 0));
        assert!(catalog.create("music", false).is_none());
    }

    #[test]
    fn test_free_stream_restarts_from_beginning() {
        let mut catalog = StreamCatalog::new(Duration::from_millis(100));
        catalog.insert("music", Duration::from_secs(1));
        let mut stream = catalog.create("music", false).unwrap();
        let mut device = device();

        stream.init_stream(&mut device, 0);
        device.play(0);
        device.advance(Duration::from_millis(200));
        stream.update_buffers(&mut device, 0);
        assert_eq!(stream.elapsed_time(), Duration::from_millis(200));

        stream.free_stream();
        assert_eq!(stream.elapsed_time(), Duration::ZERO);
        assert_eq!(stream.total_time(), Duration::from_secs(1));
    }
}
