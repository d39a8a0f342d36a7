//! Event types for sonicpool

use crate::handle::Handle;

/// Why a sound request produced no handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Empty source name or out-of-range category
    InvalidRequest,
    /// The buffer resolver or stream factory did not know the source
    UnresolvedSource,
    /// The category gain is zero
    MutedCategory,
    /// Approximate volume at or below the minimum audible gain
    Inaudible,
    /// No free channel and nothing quieter to evict
    NoChannel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Physical playback began on a channel
    Started { handle: Handle, channel: usize },
    /// A playing sound lost its channel to a louder request
    Culled { handle: Handle, channel: usize },
    /// A persistent sound was created without a channel
    Deferred { handle: Handle },
    /// A culled sound got a channel back
    Revived { handle: Handle, channel: usize },
    /// A parked sound's resource disappeared and it was dropped
    Retired { handle: Handle },
    /// The device stopped a sound that should still be playing
    DeviceDropped { handle: Handle, channel: usize },
    /// A non-looping stream played to its end
    Completed { handle: Handle },
    Rejected { reason: RejectReason },
}

impl AudioEvent {
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Self::Started { handle, .. }
            | Self::Culled { handle, .. }
            | Self::Deferred { handle }
            | Self::Revived { handle, .. }
            | Self::Retired { handle }
            | Self::DeviceDropped { handle, .. }
            | Self::Completed { handle } => Some(*handle),
            Self::Rejected { .. } => None,
        }
    }

    pub fn channel(&self) -> Option<usize> {
        match self {
            Self::Started { channel, .. }
            | Self::Culled { channel, .. }
            | Self::Revived { channel, .. }
            | Self::DeviceDropped { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// Returns true when the event removed the sound for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Retired { .. } | Self::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleAllocator;

    #[test]
    fn test_event_accessors() {
        let handle = HandleAllocator::new().allocate();

        let culled = AudioEvent::Culled { handle, channel: 3 };
        assert_eq!(culled.handle(), Some(handle));
        assert_eq!(culled.channel(), Some(3));
        assert!(!culled.is_terminal());

        let completed = AudioEvent::Completed { handle };
        assert_eq!(completed.channel(), None);
        assert!(completed.is_terminal());
        assert!(AudioEvent::Retired { handle }.is_terminal());

        let rejected = AudioEvent::Rejected {
            reason: RejectReason::NoChannel,
        };
        assert_eq!(rejected.handle(), None);
        assert!(!rejected.is_terminal());
    }
}
