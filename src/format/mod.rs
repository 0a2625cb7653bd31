//! Binary asset formats: paletted/RLE rasters and versioned vector timelines.
//!
//! # Raster (`<name>_0.z2raw`)
//!
//! ```text
//! Header (16 bytes):
//!   Version: i32 (0 = raw, 1 = RLE)
//!   Width: i32
//!   Height: i32
//!   Bits per channel: i32 (4 or 8)
//!
//! Version 0 body:
//!   width * height pixels, row-major
//!
//! Version 1 body:
//!   Length: i32 (ignored)
//!   Palette size: i32 (1..=256)
//!   Palette: palette size pixels
//!   Runs: run byte c, length (c >> 1) + 1
//!         c & 1 == 0 -> one palette index byte per pixel
//!         c & 1 == 1 -> one palette index byte, repeated
//! ```
//!
//! # Timeline package (`<package>_Timeline.bin`)
//!
//! ```text
//! Header:
//!   Version: i16 (4, 6 or 8)
//!   Padding: u8
//!   Animation count: i16
//!   Padding: i16
//!
//! Animation record:
//!   Name: 256 bytes, NUL-terminated ASCII
//!   Padding: i16
//!   Vertex count: i16
//!   Point size: i16 (version 8 only; 0, 1 or 0x101)
//!   Vertices: pose x, pose y, [i16 pad on version 4], texture x, texture y,
//!             [0, 1 or 4 f32 alpha samples on version 8]
//!   Bounds: i16 x min, x max, y min, y max
//!   Frame count: i16
//!   Frames: point count i16, [u8 pad on version > 4], six i16 vertex
//!           indices per polygon
//!   Sequence (version > 4): count i16, padding i16, count * i16 frame index
//! ```
//!
//! All values are little-endian.

mod frame;
mod raster;
mod reader;
mod timeline;

#[cfg(test)]
pub(crate) mod testutil;

use std::io;

pub use frame::{Bounds, Frame, PolygonInstance, Rect, reconstruct_transform};
pub use raster::{BitDepth, RasterImage, TEXTURE_EXTENT, Texture};
pub use reader::LeReader;
pub use timeline::{ControlVertex, PointSize, Timeline, TimelinePackage, TimelineVersion};

/// Result alias for decoding operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Structural violation of one of the binary asset formats.
///
/// Every decode either produces a fully valid asset or fails with one of
/// these; callers treat any variant as "asset unavailable".
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Unrecognized raster version {0}")]
    UnrecognizedVersion(i32),

    #[error("Unsupported bit depth {0}")]
    UnsupportedBitDepth(i32),

    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("Invalid palette size {0}")]
    InvalidPaletteSize(i32),

    #[error("Unknown timeline version {0}")]
    UnknownVersion(i16),

    #[error("Unknown point size {0:#x}")]
    UnknownPointSize(i16),

    #[error("Unexpected frame size {0}")]
    UnexpectedFrameSize(i16),

    #[error("Unexpected frame arrangement {0:?}")]
    UnexpectedFrameArrangement([i16; 6]),

    #[error("Invalid sequence count {0}")]
    InvalidSequenceCount(i16),

    #[error("Bad transform: texture points are collinear")]
    BadTransform,

    #[error("Invalid array index {index} (length {len})")]
    InvalidArrayIndex { index: i64, len: usize },

    #[error("Unexpected end of stream")]
    UnexpectedEof(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormatError {
    /// Short machine-readable reason tag.
    pub fn reason(&self) -> &'static str {
        match self {
            FormatError::UnrecognizedVersion(_) => "unrecognized version",
            FormatError::UnsupportedBitDepth(_) => "unsupported bit depth",
            FormatError::InvalidDimensions { .. } => "invalid dimensions",
            FormatError::InvalidPaletteSize(_) => "invalid palette size",
            FormatError::UnknownVersion(_) => "unknown version",
            FormatError::UnknownPointSize(_) => "unknown point size",
            FormatError::UnexpectedFrameSize(_) => "unexpected frame size",
            FormatError::UnexpectedFrameArrangement(_) => "unexpected frame arrangement",
            FormatError::InvalidSequenceCount(_) => "invalid sequence count",
            FormatError::BadTransform => "bad transform",
            FormatError::InvalidArrayIndex { .. } => "invalid array index",
            FormatError::UnexpectedEof(_) => "unexpected end of stream",
            FormatError::Io(_) => "io error",
            FormatError::Json(_) => "json error",
        }
    }
}

/// Bounds-checked lookup that reports a [`FormatError::InvalidArrayIndex`]
/// instead of panicking.
pub(crate) fn checked_get<T>(items: &[T], index: i64) -> FormatResult<&T> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(FormatError::InvalidArrayIndex {
            index,
            len: items.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_get() {
        let items = [10, 20, 30];
        assert_eq!(*checked_get(&items, 2).unwrap(), 30);

        let err = checked_get(&items, 3).unwrap_err();
        assert_eq!(err.reason(), "invalid array index");

        let err = checked_get(&items, -1).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidArrayIndex { index: -1, len: 3 }
        ));
    }
}
