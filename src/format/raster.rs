//! Paletted/RLE raster decoding and the tileable texture it produces.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use glam::DVec2;

use super::{FormatError, FormatResult, LeReader, checked_get};

/// Side length of one texture tile in texture-space units.
///
/// Timeline texture coordinates address the bitmap as if it were stretched
/// over a `TEXTURE_EXTENT` square, repeated in both directions.
pub const TEXTURE_EXTENT: f64 = 0x8000 as f64;

/// Bits per colour channel of a stored pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// Two bytes per pixel, one nibble per channel.
    Four,
    /// Four bytes per pixel: red, green, blue, alpha.
    Eight,
}

impl BitDepth {
    pub fn from_i32(v: i32) -> FormatResult<Self> {
        match v {
            4 => Ok(BitDepth::Four),
            8 => Ok(BitDepth::Eight),
            _ => Err(FormatError::UnsupportedBitDepth(v)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
        }
    }

    /// Stored size of one pixel in bytes.
    pub fn pixel_size(self) -> usize {
        match self {
            BitDepth::Four => 2,
            BitDepth::Eight => 4,
        }
    }

    /// Read one pixel and pack it as `0xAARRGGBB`.
    fn read_pixel(self, r: &mut LeReader<'_>) -> FormatResult<u32> {
        let (a, red, g, b) = match self {
            BitDepth::Four => {
                let p = r.read_u8()? as u32;
                let a = (p & 0xf) * 0x11;
                let b = ((p >> 4) & 0xf) * 0x11;
                let p = r.read_u8()? as u32;
                let g = (p & 0xf) * 0x11;
                let red = ((p >> 4) & 0xf) * 0x11;
                (a, red, g, b)
            }
            BitDepth::Eight => {
                let red = r.read_u8()? as u32;
                let g = r.read_u8()? as u32;
                let b = r.read_u8()? as u32;
                let a = r.read_u8()? as u32;
                (a, red, g, b)
            }
        };
        Ok((a << 24) | (red << 16) | (g << 8) | b)
    }
}

/// Decoded ARGB pixels, sampled as an infinitely repeating tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Texture {
    /// Wrap a row-major `0xAARRGGBB` buffer.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> FormatResult<Self> {
        if pixels.len() as u64 != width as u64 * height as u64 {
            return Err(FormatError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel buffer as raw native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Sample at a texture-space point, repeating the tile.
    ///
    /// An empty texture samples as fully transparent.
    pub fn sample(&self, p: DVec2) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let w = self.width as f64;
        let h = self.height as f64;
        let x = ((p.x * w / TEXTURE_EXTENT).floor()).rem_euclid(w) as usize;
        let y = ((p.y * h / TEXTURE_EXTENT).floor()).rem_euclid(h) as usize;
        // rem_euclid can round up to exactly w for tiny negative inputs.
        let x = x.min(self.width as usize - 1);
        let y = y.min(self.height as usize - 1);
        self.pixels[y * self.width as usize + x]
    }
}

/// A decoded raster asset.
///
/// The decoded pixels are kept as the "original" texture. A replacement
/// texture may be swapped in and later cleared again; readers always see
/// one whole texture or the other.
#[derive(Debug)]
pub struct RasterImage {
    name: String,
    depth: BitDepth,
    original: Arc<Texture>,
    replacement: RwLock<Option<Arc<Texture>>>,
}

impl RasterImage {
    /// Decode a raster asset.
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> FormatResult<Self> {
        let name = name.into();
        let start = Instant::now();
        let mut r = LeReader::new(bytes);

        let version = r.read_i32()?;
        if !(0..=1).contains(&version) {
            return Err(FormatError::UnrecognizedVersion(version));
        }
        let width = r.read_i32()?;
        let height = r.read_i32()?;
        let depth = BitDepth::from_i32(r.read_i32()?)?;

        if width < 0 || height < 0 {
            return Err(FormatError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        let (width, height) = (width as u32, height as u32);

        let pixels = match version {
            0 => read_raw(&mut r, width, height, depth)?,
            _ => read_rle(&mut r, width, height, depth)?,
        };

        log::debug!(
            "Decoded raster {} ({}x{}, {}-bit, {}) in {:?}",
            name,
            width,
            height,
            depth.bits(),
            if version == 0 { "raw" } else { "rle" },
            start.elapsed()
        );

        Ok(Self::from_texture(name, depth, Texture::new(width, height, pixels)?))
    }

    /// Wrap an already decoded texture.
    pub fn from_texture(name: impl Into<String>, depth: BitDepth, texture: Texture) -> Self {
        Self {
            name: name.into(),
            depth,
            original: Arc::new(texture),
            replacement: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.original.width
    }

    pub fn height(&self) -> u32 {
        self.original.height
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// The texture currently in effect: the replacement if one is set,
    /// otherwise the decoded original.
    pub fn texture(&self) -> Arc<Texture> {
        self.replacement
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_else(|| self.original.clone())
    }

    /// The texture as decoded, regardless of any replacement.
    pub fn original_texture(&self) -> Arc<Texture> {
        self.original.clone()
    }

    /// Swap in a replacement texture.
    pub fn replace_texture(&self, texture: Texture) {
        *self
            .replacement
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(texture));
    }

    /// Drop any replacement and go back to the decoded pixels.
    pub fn restore_texture(&self) {
        *self
            .replacement
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn is_replaced(&self) -> bool {
        self.replacement
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

fn pixel_count(width: u32, height: u32) -> FormatResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(FormatError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        })
}

fn read_raw(
    r: &mut LeReader<'_>,
    width: u32,
    height: u32,
    depth: BitDepth,
) -> FormatResult<Vec<u32>> {
    let count = pixel_count(width, height)?;
    // A short stream fails below anyway; don't allocate for it first.
    if count.saturating_mul(depth.pixel_size()) > r.remaining() {
        return Err(FormatError::UnexpectedEof(std::io::ErrorKind::UnexpectedEof.into()));
    }
    (0..count).map(|_| depth.read_pixel(r)).collect()
}

fn read_rle(
    r: &mut LeReader<'_>,
    width: u32,
    height: u32,
    depth: BitDepth,
) -> FormatResult<Vec<u32>> {
    r.read_i32()?; // length

    let pal_size = r.read_i32()?;
    if !(1..=256).contains(&pal_size) {
        return Err(FormatError::InvalidPaletteSize(pal_size));
    }
    let palette = (0..pal_size)
        .map(|_| depth.read_pixel(r))
        .collect::<FormatResult<Vec<u32>>>()?;

    // Each two-byte repeat run covers at most 128 pixels.
    let count = pixel_count(width, height)?;
    if count > r.remaining().saturating_mul(64) {
        return Err(FormatError::UnexpectedEof(std::io::ErrorKind::UnexpectedEof.into()));
    }

    let mut out = RunWriter::new(count, width as usize);
    while out.y < height as usize {
        let c = r.read_u8()?;
        let num = (c >> 1) as usize + 1;
        if c & 1 == 0 {
            for _ in 0..num {
                let pix = *checked_get(&palette, r.read_u8()? as i64)?;
                out.put(pix)?;
            }
        } else {
            let pix = *checked_get(&palette, r.read_u8()? as i64)?;
            for _ in 0..num {
                out.put(pix)?;
            }
        }
    }

    Ok(out.pixels)
}

/// Row-major output cursor for run-length data.
struct RunWriter {
    pixels: Vec<u32>,
    width: usize,
    x: usize,
    y: usize,
}

impl RunWriter {
    fn new(len: usize, width: usize) -> Self {
        Self {
            pixels: vec![0u32; len],
            width,
            x: 0,
            y: 0,
        }
    }

    /// Write one pixel and advance, wrapping to the next row at `width`.
    /// Writing past the last row is an index error.
    fn put(&mut self, pix: u32) -> FormatResult<()> {
        let index = self.y * self.width + self.x;
        let len = self.pixels.len();
        let slot = if self.x < self.width {
            self.pixels.get_mut(index)
        } else {
            None
        };
        *slot.ok_or(FormatError::InvalidArrayIndex {
            index: index as i64,
            len,
        })? = pix;

        self.x += 1;
        if self.x >= self.width {
            self.x = 0;
            self.y += 1;
        }
        Ok(())
    }
}
