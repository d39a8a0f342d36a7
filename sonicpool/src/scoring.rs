//! Priority scoring for channels and parked sounds.
//!
//! A score is an unattenuated volume scaled by category gain and, for
//! positional sounds, by a linear distance falloff. Master volume never
//! enters a score.

use crate::config::SoundDescription;
use crate::math::Vec3;

/// Linear falloff between the reference and max distances.
///
/// Returns 1 within `reference` (inclusive), 0 at or beyond `max`.
pub fn distance_attenuation(distance: f32, reference: f32, max: f32) -> f32 {
    if distance >= max {
        0.0
    } else if distance > reference {
        (max - distance) / (max - reference)
    } else {
        1.0
    }
}

/// Estimated audible fraction of a positional sound at `position`, ignoring
/// cones. Used when admitting a new request.
pub fn approximate_3d_volume(desc: &SoundDescription, position: Vec3, listener: Vec3) -> f32 {
    let distance = (listener - position).length();
    if distance >= desc.max_distance {
        0.0
    } else if distance < desc.reference_distance {
        1.0
    } else {
        1.0 - (distance - desc.reference_distance)
            / (desc.max_distance - desc.reference_distance)
    }
}

/// Score of a sound from its source volume and category gain, optionally
/// attenuated by distance.
pub fn score(
    source_volume: f32,
    category_gain: f32,
    falloff: Option<(Vec3, f32, f32)>,
    listener: Vec3,
) -> f32 {
    let mut score = source_volume * category_gain;
    if let Some((position, reference, max)) = falloff {
        score *= distance_attenuation(position.distance(listener), reference, max);
    }
    score
}

/// Gain a channel should be driven at: volume scaled by category and master,
/// clamped to `[0, 1]`.
pub fn channel_gain(source_volume: f32, category_gain: f32, master_gain: f32) -> f32 {
    (source_volume * category_gain * master_gain).clamp(0.0, 1.0)
}
