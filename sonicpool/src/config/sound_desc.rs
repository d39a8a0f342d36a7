use crate::environment::SampleEnvironment;
use crate::handle::SoundKind;
use crate::math::Vec3;

/// Directional emission cone of a sound.
///
/// Angles are full cone angles in degrees. Outside `outer_angle` the sound
/// plays at `outer_gain`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub inner_angle: f32,
    pub outer_angle: f32,
    pub outer_gain: f32,
}

impl Default for Cone {
    /// An omnidirectional cone.
    fn default() -> Self {
        Self {
            inner_angle: 360.0,
            outer_angle: 360.0,
            outer_gain: 1.0,
        }
    }
}

/// How a sound should be played: volume, category, falloff and lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDescription {
    /// Unattenuated volume (0.0 = silent, 1.0 = full volume)
    pub volume: f32,
    /// Category index; each category has its own gain
    pub category: usize,
    /// Positional sounds attenuate with distance from the listener
    pub is_3d: bool,
    /// Repeat until stopped
    pub is_looping: bool,
    /// Fed from a decoder instead of a resident buffer
    pub is_streaming: bool,
    /// Within this distance the sound plays at full volume
    pub reference_distance: f32,
    /// Beyond this distance the sound is silent
    pub max_distance: f32,
    pub cone: Cone,
    /// Direction of the cone when no transform says otherwise
    pub cone_vector: Vec3,
    /// Reverb send level for environmental effects
    pub environment_level: f32,
}

impl Default for SoundDescription {
    fn default() -> Self {
        Self {
            volume: 1.0,
            category: 0,
            is_3d: false,
            is_looping: false,
            is_streaming: false,
            reference_distance: 1.0,
            max_distance: 100.0,
            cone: Cone::default(),
            cone_vector: Vec3::new(0.0, 0.0, 1.0),
            environment_level: 0.0,
        }
    }
}

impl SoundDescription {
    /// A non-positional fire-and-forget sound
    pub fn one_shot(volume: f32) -> Self {
        Self {
            volume,
            ..Default::default()
        }
    }

    /// A non-positional sound that repeats until stopped
    pub fn looping(volume: f32) -> Self {
        Self {
            volume,
            is_looping: true,
            ..Default::default()
        }
    }

    /// A non-positional sound decoded incrementally
    pub fn streaming(volume: f32) -> Self {
        Self {
            volume,
            is_streaming: true,
            ..Default::default()
        }
    }

    /// Makes the sound positional with the given falloff distances
    pub fn positional(mut self, reference_distance: f32, max_distance: f32) -> Self {
        self.is_3d = true;
        self.reference_distance = reference_distance;
        self.max_distance = max_distance;
        self
    }

    pub fn in_category(mut self, category: usize) -> Self {
        self.category = category;
        self
    }

    pub fn with_cone(mut self, cone: Cone) -> Self {
        self.cone = cone;
        self
    }

    /// The handle kind this description produces.
    pub fn kind(&self) -> SoundKind {
        if self.is_streaming {
            SoundKind::Streaming
        } else if self.is_looping {
            SoundKind::Looping
        } else {
            SoundKind::OneShot
        }
    }
}

/// A named, reusable sound: source reference plus description.
#[derive(Debug, Clone)]
pub struct AudioProfile {
    /// Buffer name, or stream name for streaming descriptions
    pub filename: String,
    pub description: SoundDescription,
    pub environment: Option<SampleEnvironment>,
    /// Resolve the buffer up front when profiles are preloaded
    pub preload: bool,
}

impl AudioProfile {
    pub fn new(filename: impl Into<String>, description: SoundDescription) -> Self {
        Self {
            filename: filename.into(),
            description,
            environment: None,
            preload: false,
        }
    }

    pub fn preloaded(mut self) -> Self {
        self.preload = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_flags() {
        assert_eq!(SoundDescription::one_shot(1.0).kind(), SoundKind::OneShot);
        assert_eq!(SoundDescription::looping(1.0).kind(), SoundKind::Looping);
        assert_eq!(SoundDescription::streaming(1.0).kind(), SoundKind::Streaming);

        let mut looping_stream = SoundDescription::streaming(1.0);
        looping_stream.is_looping = true;
        assert_eq!(looping_stream.kind(), SoundKind::Streaming);
    }

    #[test]
    fn test_positional_builder() {
        let desc = SoundDescription::one_shot(0.5)
            .positional(2.0, 40.0)
            .in_category(3);
        assert!(desc.is_3d);
        assert_eq!(desc.reference_distance, 2.0);
        assert_eq!(desc.max_distance, 40.0);
        assert_eq!(desc.category, 3);
    }
}
