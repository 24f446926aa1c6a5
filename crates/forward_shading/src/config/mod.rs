//! Configuration system
//!
//! Pipeline variants (reflection model, blend policy, discard threshold,
//! compositor behavior) are plain data loaded from TOML or RON files and
//! validated before a pipeline is built from them.

pub use serde::{Deserialize, Serialize};

use crate::render::lighting::SpecularModel;
use crate::render::material::BlendPolicy;
use crate::render::postprocess::CompositorFlags;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A field holds a value the pipeline cannot run with
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pipeline variant selection
///
/// One config describes a complete variant: how specular highlights are
/// computed, how material layers blend, when fragments are discarded, and
/// how the compositor resolves the final image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Specular reflection model (Phong or the Blinn half-vector variant)
    pub specular_model: SpecularModel,
    /// Material layer blend policy
    pub blend_policy: BlendPolicy,
    /// Accumulated alpha below this discards the fragment (cutout test)
    pub discard_threshold: f32,
    /// Display gamma applied by the compositor
    pub gamma: f32,
    /// Convolve the resolved image with the edge-detection kernel
    pub edge_detection: bool,
    /// Average samples when resolving a multisampled target
    pub multisample: bool,
    /// Samples per pixel of the main color target
    pub samples: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            specular_model: SpecularModel::Phong,
            blend_policy: BlendPolicy::AlphaWeighted,
            discard_threshold: 0.1,
            gamma: 2.2,
            edge_detection: false,
            multisample: true,
            samples: 16,
        }
    }
}

impl Config for PipelineConfig {}

impl PipelineConfig {
    /// Variant for silhouette/outline detection
    ///
    /// Averages layer alphas so the combined alpha acts as a detection
    /// threshold, keeps nearly-transparent fragments, and runs the edge
    /// kernel over the resolved image.
    pub fn outline_detection() -> Self {
        Self {
            blend_policy: BlendPolicy::Average,
            discard_threshold: 0.01,
            edge_detection: true,
            ..Self::default()
        }
    }

    /// Shadow-aware variant using the Blinn half-vector specular model
    ///
    /// This variant also scales the spotlight's specular term by its cone
    /// intensity.
    pub fn shadow_aware() -> Self {
        Self {
            specular_model: SpecularModel::Blinn,
            ..Self::default()
        }
    }

    /// Check every field holds a value the pipeline can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.discard_threshold) {
            return Err(ConfigError::Invalid(format!(
                "discard_threshold must be in [0, 1], got {}",
                self.discard_threshold
            )));
        }
        if self.gamma <= 0.0 || !self.gamma.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        if self.samples == 0 {
            return Err(ConfigError::Invalid(
                "samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Compositor behavior switches encoded by this config
    pub fn compositor_flags(&self) -> CompositorFlags {
        let mut flags = CompositorFlags::empty();
        if self.edge_detection {
            flags |= CompositorFlags::EDGE_DETECTION;
        }
        if self.multisample {
            flags |= CompositorFlags::MULTISAMPLE;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::outline_detection().validate().is_ok());
        assert!(PipelineConfig::shadow_aware().validate().is_ok());
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let mut config = PipelineConfig {
            gamma: 0.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        config.gamma = 2.2;
        config.discard_threshold = 1.5;
        assert!(config.validate().is_err());

        config.discard_threshold = 0.1;
        config.samples = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_outline_preset_selects_average_policy() {
        let config = PipelineConfig::outline_detection();
        assert_eq!(config.blend_policy, BlendPolicy::Average);
        assert!(config.edge_detection);
        assert!(config.discard_threshold <= 0.01);
    }

    #[test]
    fn test_compositor_flags_reflect_booleans() {
        let config = PipelineConfig {
            edge_detection: true,
            multisample: false,
            ..PipelineConfig::default()
        };
        let flags = config.compositor_flags();
        assert!(flags.contains(CompositorFlags::EDGE_DETECTION));
        assert!(!flags.contains(CompositorFlags::MULTISAMPLE));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::shadow_aware();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.specular_model, config.specular_model);
        assert_eq!(parsed.samples, config.samples);
    }
}
