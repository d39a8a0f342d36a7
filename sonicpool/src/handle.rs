//! Opaque sound handles and the allocator that issues them.
//!
//! A handle names a logical sound, not a channel. Its identity is the
//! sequence number plus the sound kind; the lifecycle flags (`parked`,
//! `loading`) ride along internally but never take part in comparisons, so a
//! sound keeps the same identity while it is parked and revived.

use std::hash::{Hash, Hasher};

/// What kind of logical sound a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// Fire-and-forget sound; lives only as long as its channel.
    OneShot,
    /// Repeats until stopped and survives losing its channel.
    Looping,
    /// Fed from a decoder and survives losing its channel.
    Streaming,
}

impl SoundKind {
    /// Returns true for kinds tracked by a registry.
    pub fn is_persistent(self) -> bool {
        !matches!(self, Self::OneShot)
    }
}

/// Lightweight, copyable identifier for a logical sound instance.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    sequence: u32,
    kind: SoundKind,
    parked: bool,
    loading: bool,
}

impl Handle {
    pub const LOOPING_BIT: u32 = 0x8000_0000;
    pub const STREAMING_BIT: u32 = 0x4000_0000;
    pub const INACTIVE_BIT: u32 = 0x2000_0000;
    pub const LOADING_BIT: u32 = 0x1000_0000;
    pub const SEQUENCE_MASK: u32 = 0x0FFF_FFFF;

    fn new(sequence: u32) -> Self {
        Self {
            sequence,
            kind: SoundKind::OneShot,
            parked: false,
            loading: false,
        }
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn kind(&self) -> SoundKind {
        self.kind
    }

    pub fn is_looping(&self) -> bool {
        self.kind == SoundKind::Looping
    }

    pub fn is_streaming(&self) -> bool {
        self.kind == SoundKind::Streaming
    }

    pub(crate) fn with_kind(mut self, kind: SoundKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn is_parked(&self) -> bool {
        self.parked
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn with_parked(mut self, parked: bool) -> Self {
        self.parked = parked;
        self
    }

    pub(crate) fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    /// The form handed to callers: identity and kind only.
    pub fn masked(self) -> Self {
        self.with_parked(false).with_loading(false)
    }

    /// Packs the handle into its 32-bit opaque representation.
    pub fn to_bits(self) -> u32 {
        let mut bits = self.sequence & Self::SEQUENCE_MASK;
        match self.kind {
            SoundKind::OneShot => {}
            SoundKind::Looping => bits |= Self::LOOPING_BIT,
            SoundKind::Streaming => bits |= Self::STREAMING_BIT,
        }
        if self.parked {
            bits |= Self::INACTIVE_BIT;
        }
        if self.loading {
            bits |= Self::LOADING_BIT;
        }
        bits
    }

    /// Unpacks a 32-bit handle. Returns `None` for the null handle and for
    /// bit patterns no allocator could have produced.
    pub fn from_bits(bits: u32) -> Option<Self> {
        let sequence = bits & Self::SEQUENCE_MASK;
        if sequence == 0 {
            return None;
        }
        let kind = match (bits & Self::LOOPING_BIT != 0, bits & Self::STREAMING_BIT != 0) {
            (false, false) => SoundKind::OneShot,
            (true, false) => SoundKind::Looping,
            (false, true) => SoundKind::Streaming,
            (true, true) => return None,
        };
        Some(Self {
            sequence,
            kind,
            parked: bits & Self::INACTIVE_BIT != 0,
            loading: bits & Self::LOADING_BIT != 0,
        })
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence && self.kind == other.kind
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
        self.kind.hash(state);
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({:#010x})", self.masked().to_bits())
    }
}

/// Issues handle sequence numbers, skipping the reserved null value.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    last: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh one-shot handle; callers add the kind they need.
    pub fn allocate(&mut self) -> Handle {
        self.last = self.last.wrapping_add(1) & Handle::SEQUENCE_MASK;
        if self.last == 0 {
            self.last = 1;
        }
        Handle::new(self.last)
    }
}
