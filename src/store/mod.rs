//! Locating, decoding and sharing assets.
//!
//! Resources are read through a [`ResourceOpener`]; decoded packages and
//! rasters live in [`Cache`]s owned by an [`AssetLibrary`].

mod cache;
mod index;
mod library;
mod opener;

pub use cache::Cache;
pub use index::TimelineIndex;
pub use library::{AssetLibrary, raster_resource, timeline_resource};
pub use opener::{DirectoryOpener, MemoryOpener, ResourceOpener};
