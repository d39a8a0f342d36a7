mod engine_desc;
mod sound_desc;

pub use engine_desc::EngineDesc;
pub use sound_desc::{AudioProfile, Cone, SoundDescription};
