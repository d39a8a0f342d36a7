//! Environmental (reverb) settings.
//!
//! The engine carries these values through to the backend hooks
//! [`AudioBackend::apply_sample_environment`](crate::backend::AudioBackend::apply_sample_environment)
//! and [`AudioBackend::set_environment`](crate::backend::AudioBackend::set_environment),
//! whose default implementations do nothing. No reverb is computed here.

/// Per-sound environmental parameters (obstruction, occlusion, room sends).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEnvironment {
    pub direct: i32,
    pub direct_hf: i32,
    pub room: i32,
    pub room_hf: i32,
    pub obstruction: f32,
    pub obstruction_lf_ratio: f32,
    pub occlusion: f32,
    pub occlusion_lf_ratio: f32,
    pub occlusion_room_ratio: f32,
    pub room_rolloff: f32,
    pub air_absorption: f32,
    pub outside_volume_hf: i32,
    pub flags: u32,
}

impl Default for SampleEnvironment {
    fn default() -> Self {
        Self {
            direct: 0,
            direct_hf: 0,
            room: 0,
            room_hf: 0,
            obstruction: 0.0,
            obstruction_lf_ratio: 0.0,
            occlusion: 0.0,
            occlusion_lf_ratio: 0.25,
            occlusion_room_ratio: 1.5,
            room_rolloff: 0.0,
            air_absorption: 1.0,
            outside_volume_hf: 0,
            flags: 0,
        }
    }
}

/// Global room settings applied to the listener's surroundings.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEnvironment {
    /// When set, `room` selects a preset and the remaining fields are ignored
    pub use_room: bool,
    pub room: i32,
    pub room_hf: i32,
    pub reflections: i32,
    pub reverb: i32,
    pub room_rolloff_factor: f32,
    pub decay_time: f32,
    pub decay_hf_ratio: f32,
    pub reflections_delay: f32,
    pub reverb_delay: f32,
    pub air_absorption: f32,
    pub diffusion: f32,
    pub room_volume: i32,
    pub effect_volume: f32,
    pub damping: f32,
    pub environment_size: f32,
    pub flags: u32,
}

impl Default for AudioEnvironment {
    fn default() -> Self {
        Self {
            use_room: true,
            room: 0,
            room_hf: 0,
            reflections: 0,
            reverb: 0,
            room_rolloff_factor: 0.1,
            decay_time: 0.1,
            decay_hf_ratio: 0.1,
            reflections_delay: 0.0,
            reverb_delay: 0.0,
            air_absorption: 0.0,
            diffusion: 1.0,
            room_volume: 0,
            effect_volume: 0.0,
            damping: 0.0,
            environment_size: 10.0,
            flags: 0,
        }
    }
}
