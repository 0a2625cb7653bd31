//! BN assets - Decoders for sprite rasters and vector timeline animations.
//!
//! This crate reads two binary asset families: paletted/RLE raster
//! textures and versioned timeline packages describing animations as
//! texture-mapped polygons. Decoded assets are cached and shared, and an
//! animation player composes one timeline with its raster, frame by frame.
//!
//! # Architecture
//!
//! The crate is split into four modules:
//!
//! - `format`: Binary decoders (rasters, timeline packages, frames)
//! - `schema`: Configuration and manifest document types
//! - `store`: Resource opening, the name index, caches and the library
//! - `animation`: Playback and drawing of decoded timelines
//!
//! # Example
//!
//! ```rust,no_run
//! use bn_assets::{
//!     animation::PixelCanvas,
//!     schema::AssetConfig,
//!     store::AssetLibrary,
//! };
//!
//! let config = AssetConfig::with_root("assets");
//! let library = AssetLibrary::from_config(&config).unwrap();
//!
//! if let Some(mut player) = library.player("walk").unwrap() {
//!     player.set_loop(true);
//!     let mut canvas = PixelCanvas::new(256, 256);
//!     player.draw(0, &mut canvas);
//!     println!("Covered pixels: {}", canvas.covered());
//! }
//! ```

pub mod animation;
pub mod format;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use animation::{AnimationPlayer, PixelCanvas, Surface};
pub use format::{FormatError, FormatResult, RasterImage, Timeline, TimelinePackage};
pub use schema::AssetConfig;
pub use store::{AssetLibrary, TimelineIndex};
