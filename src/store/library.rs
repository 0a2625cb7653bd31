//! Lazy, shared access to every timeline and raster of an asset tree.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rayon::prelude::*;

use super::cache::Cache;
use super::index::TimelineIndex;
use super::opener::{DirectoryOpener, ResourceOpener};
use crate::animation::AnimationPlayer;
use crate::format::{FormatResult, RasterImage, Texture, Timeline, TimelinePackage};
use crate::schema::{AssetConfig, ConfigError};

/// Resource name of a timeline package.
pub fn timeline_resource(package: &str) -> String {
    format!("{}_Timeline.bin", package)
}

/// Resource name of a raster asset.
pub fn raster_resource(name: &str) -> String {
    format!("{}_0.z2raw", name)
}

/// Entry point for decoded assets.
///
/// The index is built on first use. Timeline packages are decoded whole
/// the first time any of their animations is requested, rasters the first
/// time they are named; both are then shared through their caches.
pub struct AssetLibrary {
    opener: Box<dyn ResourceOpener>,
    manifest: String,
    index: Mutex<Option<Arc<TimelineIndex>>>,
    timelines: Cache<TimelinePackage>,
    rasters: Cache<RasterImage>,
    /// Rasters with a replaced texture, kept alive past cache eviction.
    modified: Mutex<HashMap<String, Arc<RasterImage>>>,
}

impl AssetLibrary {
    pub fn new(opener: impl ResourceOpener + 'static, config: &AssetConfig) -> Self {
        Self {
            opener: Box::new(opener),
            manifest: config.manifest.clone(),
            index: Mutex::new(None),
            timelines: Cache::new(config.timeline_cache),
            rasters: Cache::new(config.raster_cache),
            modified: Mutex::new(HashMap::new()),
        }
    }

    /// Library reading from the configured search paths.
    pub fn from_config(config: &AssetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            DirectoryOpener::new(&config.search_paths),
            config,
        ))
    }

    pub fn opener(&self) -> &dyn ResourceOpener {
        self.opener.as_ref()
    }

    /// The name index, built from the manifest on first call.
    ///
    /// A failed build is not remembered; the next call tries again.
    pub fn index(&self) -> FormatResult<Arc<TimelineIndex>> {
        let mut index = self
            .index
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = index.as_ref() {
            return Ok(index.clone());
        }
        let built = Arc::new(TimelineIndex::build(self.opener.as_ref(), &self.manifest)?);
        *index = Some(built.clone());
        Ok(built)
    }

    /// Build the name index now instead of on first lookup.
    ///
    /// Reads only the manifests; no package or raster is decoded.
    pub fn load(&self) -> FormatResult<()> {
        let index = self.index()?;
        log::debug!("Indexed {} animations", index.len());
        Ok(())
    }

    /// Resolve an animation by name, ignoring case.
    ///
    /// Unknown names give `Ok(None)` without reading any package.
    pub fn timeline(&self, name: &str) -> FormatResult<Option<Arc<Timeline>>> {
        let index = self.index()?;
        let Some(package) = index.lookup(name) else {
            return Ok(None);
        };
        let package = self.package(package)?;
        let timeline = package.get(name).cloned();
        if timeline.is_none() {
            log::warn!("Package {} does not contain {}", package.name(), name);
        }
        Ok(timeline)
    }

    /// Decoded timeline package, decoding it on first request.
    pub fn package(&self, package: &str) -> FormatResult<Arc<TimelinePackage>> {
        self.timelines
            .get_or_try_insert_with(&package.to_lowercase(), || {
                let bytes = self.opener.open(&timeline_resource(package))?;
                TimelinePackage::decode(package, &bytes)
            })
    }

    /// Decoded raster by name, ignoring case.
    pub fn raster(&self, name: &str) -> FormatResult<Arc<RasterImage>> {
        let key = name.to_lowercase();
        if let Some(image) = self.lock_modified().get(&key) {
            return Ok(image.clone());
        }
        self.rasters.get_or_try_insert_with(&key, || {
            let bytes = self.opener.open(&raster_resource(name))?;
            RasterImage::decode(name, &bytes)
        })
    }

    /// Player for an animation over the raster named after its package.
    pub fn player(&self, name: &str) -> FormatResult<Option<AnimationPlayer>> {
        let Some(timeline) = self.timeline(name)? else {
            return Ok(None);
        };
        let raster = self.raster(timeline.package())?;
        Ok(Some(AnimationPlayer::new(timeline, raster)))
    }

    /// Every known animation name (lower-cased), sorted.
    pub fn animation_names(&self) -> FormatResult<Vec<String>> {
        Ok(self
            .index()?
            .names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Decode every package in parallel. Packages that fail are logged and
    /// skipped; returns how many decoded.
    pub fn preload_all(&self) -> FormatResult<usize> {
        let index = self.index()?;
        let start = Instant::now();
        let loaded = index
            .packages()
            .par_iter()
            .filter(|package| match self.package(package) {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("Skipping package {}: {} ({})", package, e, e.reason());
                    false
                }
            })
            .count();
        log::info!(
            "Preloaded {}/{} packages in {:?}",
            loaded,
            index.packages().len(),
            start.elapsed()
        );
        Ok(loaded)
    }

    /// Swap in a replacement texture. The image stays resident until
    /// restored.
    pub fn replace_texture(&self, name: &str, texture: Texture) -> FormatResult<Arc<RasterImage>> {
        let image = self.raster(name)?;
        image.replace_texture(texture);
        self.lock_modified()
            .insert(name.to_lowercase(), image.clone());
        Ok(image)
    }

    /// Go back to the decoded texture. Returns whether a replacement was set.
    pub fn restore_texture(&self, name: &str) -> bool {
        let Some(image) = self.lock_modified().remove(&name.to_lowercase()) else {
            return false;
        };
        image.restore_texture();
        true
    }

    /// Names (lower-cased) of rasters currently showing a replacement.
    pub fn modified_rasters(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_modified().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every decoded asset except replaced rasters.
    pub fn clear_caches(&self) {
        self.timelines.clear();
        self.rasters.clear();
    }

    fn lock_modified(&self) -> MutexGuard<'_, HashMap<String, Arc<RasterImage>>> {
        self.modified
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
