#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::ConfigError;

/// Default patch edge length in pixels.
pub const DEFAULT_PATCH_SIZE: u32 = 7;

/// Inpainting configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InpaintConfig {
    /// Edge length of the square patches that are compared and blended.
    pub patch_size: u32,
    /// Seed for the engine's random generator.
    pub seed: u64,
    /// Stop after this many iterations even if holes remain.
    pub max_iterations: Option<u32>,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            patch_size: DEFAULT_PATCH_SIZE,
            seed: 0,
            max_iterations: None,
        }
    }
}

#[cfg(feature = "serde")]
impl InpaintConfig {
    /// Parse a TOML config string. Missing keys take their default values.
    pub fn from_toml_str(toml_str: &str) -> Result<InpaintConfig, ConfigError> {
        let config: InpaintConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.patch_size == 0 {
            return Err(ConfigError::InvalidPatchSize);
        }
        Ok(config)
    }
}
