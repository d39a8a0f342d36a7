use crate::error::{AudioError, Result};
use std::time::Duration;

/// Configuration descriptor for an [`AudioEngine`](crate::AudioEngine)
#[derive(Debug, Clone)]
pub struct EngineDesc {
    /// Number of mixing channels requested from the device. The engine runs
    /// with fewer if the device grants fewer.
    pub max_sources: usize,
    /// One-shots whose approximate volume is at or below this are never started
    pub min_gain: f32,
    /// How long a culled sound must wait before it is rescored and revived
    pub min_uncull_period: Duration,
    /// Minimum score a culled sound needs to be revived
    pub min_uncull_gain: f32,
    /// Number of sound categories, each with its own gain
    pub category_count: usize,
}

impl Default for EngineDesc {
    fn default() -> Self {
        Self {
            max_sources: 16,
            min_gain: 0.05,
            min_uncull_period: Duration::from_millis(500),
            min_uncull_gain: 0.1,
            category_count: 32,
        }
    }
}

impl EngineDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    pub fn min_gain(mut self, gain: f32) -> Self {
        self.min_gain = gain;
        self
    }

    pub fn min_uncull_period(mut self, period: Duration) -> Self {
        self.min_uncull_period = period;
        self
    }

    pub fn min_uncull_gain(mut self, gain: f32) -> Self {
        self.min_uncull_gain = gain;
        self
    }

    pub fn category_count(mut self, count: usize) -> Self {
        self.category_count = count;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_sources == 0 {
            return Err(AudioError::Configuration(
                "max_sources must be at least 1".into(),
            ));
        }
        if self.category_count == 0 {
            return Err(AudioError::Configuration(
                "category_count must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.min_gain) {
            return Err(AudioError::Configuration(format!(
                "min_gain {} is outside [0, 1)",
                self.min_gain
            )));
        }
        if !(0.0..1.0).contains(&self.min_uncull_gain) {
            return Err(AudioError::Configuration(format!(
                "min_uncull_gain {} is outside [0, 1)",
                self.min_uncull_gain
            )));
        }
        Ok(())
    }
}
