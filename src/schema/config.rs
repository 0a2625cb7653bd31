//! Configuration for locating and caching assets.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default manifest listing every timeline package.
fn default_manifest() -> String {
    "AnimationPacks.json".to_string()
}

/// Top-level asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directories searched in order; the first one holding a file wins.
    pub search_paths: Vec<PathBuf>,
    /// Manifest document naming the timeline packages.
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Eviction policy for decoded rasters.
    #[serde(default)]
    pub raster_cache: CachePolicy,
    /// Eviction policy for decoded timeline packages.
    #[serde(default)]
    pub timeline_cache: CachePolicy,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
            manifest: default_manifest(),
            raster_cache: CachePolicy::default(),
            timeline_cache: CachePolicy::default(),
        }
    }
}

/// How many decoded entries a cache keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep everything once decoded.
    #[default]
    Unbounded,
    /// Keep at most `capacity` entries, dropping the least recently used.
    Lru { capacity: usize },
}

impl CachePolicy {
    /// Maximum number of entries, if bounded.
    pub fn capacity(self) -> Option<usize> {
        match self {
            CachePolicy::Unbounded => None,
            CachePolicy::Lru { capacity } => Some(capacity),
        }
    }
}

impl AssetConfig {
    /// Configuration searching a single directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            search_paths: vec![root.into()],
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_paths.is_empty() {
            return Err(ConfigError::NoSearchPaths);
        }
        if self.manifest.trim().is_empty() {
            return Err(ConfigError::EmptyManifest);
        }
        for (cache, policy) in [
            ("raster", self.raster_cache),
            ("timeline", self.timeline_cache),
        ] {
            if policy.capacity() == Some(0) {
                return Err(ConfigError::ZeroCapacity { cache });
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one search path is required")]
    NoSearchPaths,
    #[error("Manifest name must not be empty")]
    EmptyManifest,
    #[error("The {cache} cache capacity must be non-zero")]
    ZeroCapacity { cache: &'static str },
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AssetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.manifest, "AnimationPacks.json");
        assert_eq!(config.raster_cache, CachePolicy::Unbounded);
    }

    #[test]
    fn test_from_json_defaults() {
        let config = AssetConfig::from_json(r#"{"search_paths": ["/tmp/a", "/tmp/b"]}"#).unwrap();
        assert_eq!(config.search_paths.len(), 2);
        assert_eq!(config.manifest, "AnimationPacks.json");
        assert_eq!(config.timeline_cache, CachePolicy::Unbounded);
    }

    #[test]
    fn test_from_json_policies() {
        let config = AssetConfig::from_json(
            r#"{
                "search_paths": ["assets"],
                "manifest": "Packs.json",
                "raster_cache": {"kind": "lru", "capacity": 16},
                "timeline_cache": {"kind": "unbounded"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.manifest, "Packs.json");
        assert_eq!(config.raster_cache, CachePolicy::Lru { capacity: 16 });
        assert_eq!(config.raster_cache.capacity(), Some(16));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AssetConfig::default();
        config.search_paths.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoSearchPaths)));

        let mut config = AssetConfig::default();
        config.manifest = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyManifest)));

        let mut config = AssetConfig::default();
        config.timeline_cache = CachePolicy::Lru { capacity: 0 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity { cache: "timeline" })
        ));

        assert!(matches!(
            AssetConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AssetConfig {
            raster_cache: CachePolicy::Lru { capacity: 4 },
            ..AssetConfig::with_root("/data")
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back = AssetConfig::from_json(&json).unwrap();
        assert_eq!(back.search_paths, vec![PathBuf::from("/data")]);
        assert_eq!(back.raster_cache, config.raster_cache);
    }
}
