//! Sound buffers and the resolver that maps names to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A decoded, device-resident audio buffer.
///
/// Shared by reference count: a channel playing the buffer and every parked
/// looper waiting to replay it hold a clone of the `Arc`. Purging marks the
/// buffer as gone; sounds still holding it are retired instead of revived.
#[derive(Debug)]
pub struct SoundBuffer {
    name: String,
    id: u32,
    duration: Duration,
    purged: AtomicBool,
}

impl SoundBuffer {
    pub fn new(name: impl Into<String>, id: u32, duration: Duration) -> Self {
        Self {
            name: name.into(),
            id,
            duration,
            purged: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device-side buffer identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_resident(&self) -> bool {
        !self.purged.load(Ordering::Relaxed)
    }

    pub fn purge(&self) {
        self.purged.store(true, Ordering::Relaxed);
    }
}

/// Trait for resolving a buffer name to a loaded buffer.
///
/// Implement this to plug in your own asset system. Returning `None` makes the
/// engine reject the sound request.
pub trait BufferResolver {
    fn resolve(&mut self, name: &str) -> Option<Arc<SoundBuffer>>;
}

/// In-memory buffer store keyed by name.
#[derive(Debug, Default)]
pub struct BufferCatalog {
    buffers: HashMap<String, Arc<SoundBuffer>>,
    next_id: u32,
}

impl BufferCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buffer under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, duration: Duration) -> Arc<SoundBuffer> {
        let name = name.into();
        self.next_id += 1;
        let buffer = Arc::new(SoundBuffer::new(name.clone(), self.next_id, duration));
        if let Some(previous) = self.buffers.insert(name, buffer.clone()) {
            previous.purge();
        }
        buffer
    }

    /// Removes and purges a buffer. Returns false if the name was unknown.
    pub fn purge(&mut self, name: &str) -> bool {
        match self.buffers.remove(name) {
            Some(buffer) => {
                log::debug!("Purging buffer '{}'", name);
                buffer.purge();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl BufferResolver for BufferCatalog {
    fn resolve(&mut self, name: &str) -> Option<Arc<SoundBuffer>> {
        self.buffers.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_shared_buffer() {
        let mut catalog = BufferCatalog::new();
        let inserted = catalog.insert("engine_hum", Duration::from_secs(2));
        let resolved = catalog.resolve("engine_hum").unwrap();
        assert!(Arc::ptr_eq(&inserted, &resolved));
        assert_eq!(resolved.name(), "engine_hum");
        assert!(catalog.resolve("missing").is_none());
    }

    #[test]
    fn test_purge_marks_outstanding_references() {
        let mut catalog = BufferCatalog::new();
        let held = catalog.insert("door", Duration::from_millis(300));
        assert!(held.is_resident());
        assert!(catalog.purge("door"));
        assert!(!held.is_resident());
        assert!(!catalog.purge("door"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_replacing_buffer_purges_previous() {
        let mut catalog = BufferCatalog::new();
        let first = catalog.insert("step", Duration::from_millis(100));
        let second = catalog.insert("step", Duration::from_millis(120));
        assert!(!first.is_resident());
        assert!(second.is_resident());
        assert_ne!(first.id(), second.id());
        assert_eq!(catalog.len(), 1);
    }
}
