//! Numeric tunables for sight, rays, and AI awareness.
//!
//! Tunables are plain data loaded from TOML; they change numbers, never behaviour.
//! Missing keys fall back to the defaults below.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::fov::{RayTable, STANDARD_RAY_SAMPLES};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tunables {
    /// Angular samples in the ray table.
    pub ray_samples: usize,
    /// Stride through the ray table; higher is faster and less accurate.
    pub ray_step: usize,
    /// Sight and attack range in cells.
    pub sight_range: u32,
    /// Percent chance an idle AI notices the player, checked as `roll(0..100) <= chance`.
    pub notice_chance: u8,
}

impl Default for Tunables {
    fn default() -> Self {
        Self { ray_samples: STANDARD_RAY_SAMPLES, ray_step: 1, sight_range: 5, notice_chance: 92 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read tunables: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse tunables: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid tunables: {0}")]
    Invalid(String),
}

impl Tunables {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let tunables: Self = toml::from_str(text)?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ray_samples == 0 {
            return Err(ConfigError::Invalid("ray_samples must be positive".into()));
        }
        if self.ray_step == 0 || self.ray_step >= self.ray_samples {
            return Err(ConfigError::Invalid(format!(
                "ray_step must be in 1..{}, got {}",
                self.ray_samples, self.ray_step
            )));
        }
        if self.notice_chance > 100 {
            return Err(ConfigError::Invalid(format!(
                "notice_chance is a percentage, got {}",
                self.notice_chance
            )));
        }
        Ok(())
    }

    /// The shared table for the standard sample count, a dedicated one otherwise.
    pub fn ray_table(&self) -> Cow<'static, RayTable> {
        if self.ray_samples == STANDARD_RAY_SAMPLES {
            Cow::Borrowed(RayTable::standard())
        } else {
            Cow::Owned(RayTable::build(self.ray_samples))
        }
    }
}
