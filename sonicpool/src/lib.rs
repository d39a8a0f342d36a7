//! # sonicpool
//!
//! Voice allocation and culling for a small, fixed pool of hardware mixing
//! channels.
//!
//! Games ask for far more sounds than a mixer has channels. sonicpool sits
//! between the two: every request gets a [`Handle`], and each frame the
//! engine decides which handles hold a channel. Quiet sounds are culled to
//! make room for loud ones. Looping and streaming sounds are never dropped
//! for lack of a channel; they are parked and revived later with their
//! volume, pitch and position intact.
//!
//! ## Quick Start
//!
//! ```
//! use sonicpool::*;
//! use std::time::Duration;
//!
//! let mut buffers = BufferCatalog::new();
//! buffers.insert("explosion", Duration::from_millis(800));
//! buffers.insert("engine_hum", Duration::from_secs(2));
//!
//! let mut engine = AudioEngine::new(EngineDesc::default(), VirtualDevice::new(16), buffers)?;
//!
//! // A fire-and-forget sound next to the listener
//! let boom = SoundDescription::one_shot(0.9).positional(2.0, 50.0);
//! let pose = Pose::from_position(Vec3::new(3.0, 0.0, 0.0));
//! if let Some(handle) = engine.create_sound(&boom, "explosion", Some(pose), None) {
//!     engine.play(handle);
//! }
//!
//! // A looping sound that survives being culled
//! let hum = engine.create_sound(&SoundDescription::looping(0.4), "engine_hum", None, None);
//! if let Some(hum) = hum {
//!     engine.play(hum);
//!     engine.set_pitch(hum, 1.2);
//! }
//!
//! // Once per frame
//! engine.update();
//! for event in engine.poll_events() {
//!     if let AudioEvent::Culled { handle, .. } = event {
//!         println!("{} lost its channel", handle);
//!     }
//! }
//! # Ok::<(), AudioError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`AudioEngine`]**: Owns the channel table and parked sounds, admits new requests
//! - **[`AudioBackend`]**: Trait for the mixing device; [`VirtualDevice`] is a software stand-in
//! - **[`BufferResolver`]**: Maps sound names to loaded buffers
//! - **[`StreamSourceFactory`]**: Opens streaming sounds
//! - **[`SoundDescription`]**: Volume, category, falloff and lifetime of a sound
//! - **[`AudioEvent`]**: Notifications about starts, culls and revivals
//!
//! ## Scoring
//!
//! Every bound channel and parked sound carries a score: its volume times its
//! category gain, attenuated linearly between the reference and max distance
//! for positional sounds. A new request may only evict a channel scoring
//! strictly below it. Master gain is left out of scores so that turning the
//! volume down never changes which sounds win.

pub mod backend;
pub mod clock;
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod events;
pub mod gain;
pub mod handle;
pub mod math;
pub mod resource;
pub mod scoring;
pub mod stream;

mod channel;
mod registry;

pub use backend::{AudioBackend, ChannelId, ChannelState, Distances, VirtualDevice};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AudioProfile, Cone, EngineDesc, SoundDescription};
pub use engine::{AudioEngine, EngineMetrics, MAX_PITCH};
pub use environment::{AudioEnvironment, SampleEnvironment};
pub use error::AudioError;
pub use events::{AudioEvent, RejectReason};
pub use handle::{Handle, HandleAllocator, SoundKind};
pub use math::{Pose, Quat, Vec3};
pub use resource::{BufferCatalog, BufferResolver, SoundBuffer};
pub use stream::{NoStreams, SegmentedStream, StreamCatalog, StreamSource, StreamSourceFactory};
