//! Animation name to package lookup.

use std::collections::HashMap;
use std::time::Instant;

use crate::format::FormatResult;
use crate::schema::{PackManifest, PackMetadata, read_json};
use crate::store::ResourceOpener;

/// Maps every animation name, lower-cased, to the package holding it.
///
/// Built once from the manifest documents; no timeline binary is read.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    packages: Vec<String>,
    by_name: HashMap<String, String>,
}

impl TimelineIndex {
    /// Read the manifest and every package's metadata document.
    pub fn build(opener: &dyn ResourceOpener, manifest: &str) -> FormatResult<Self> {
        let start = Instant::now();
        let manifest: PackManifest = read_json(opener, manifest)?;

        let mut index = Self::default();
        for package in manifest.animation_packs {
            let metadata: PackMetadata =
                read_json(opener, &PackMetadata::resource_name(&package))?;
            index.insert_package(&package, metadata.animation_names);
        }

        log::debug!(
            "Indexed {} animations across {} packages in {:?}",
            index.len(),
            index.packages.len(),
            start.elapsed()
        );
        Ok(index)
    }

    /// Register a package's animations. A name listed by several packages
    /// resolves to the last one registered.
    pub fn insert_package(&mut self, package: &str, names: impl IntoIterator<Item = String>) {
        for name in names {
            if let Some(previous) = self.by_name.insert(name.to_lowercase(), package.to_string())
                && previous != package
            {
                log::warn!("Animation {} moved from {} to {}", name, previous, package);
            }
        }
        if !self.packages.iter().any(|p| p == package) {
            self.packages.push(package.to_string());
        }
    }

    /// Package containing `name`, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Every indexed name (lower-cased), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Packages in manifest order.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
