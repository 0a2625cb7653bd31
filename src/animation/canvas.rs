//! Drawing targets for posed frames.

use glam::{DAffine2, DVec2, IVec2};

use crate::format::Texture;

/// Something a frame can be drawn onto.
pub trait Surface {
    /// Fill the texture-space `quad`, mapped to drawing space by
    /// `transform`, with `texture`. `composite` scales the source alpha.
    fn fill_textured_quad(
        &mut self,
        quad: &[IVec2; 4],
        transform: DAffine2,
        texture: &Texture,
        composite: Option<f32>,
    );
}

/// Software ARGB surface with source-over blending.
///
/// Pixel `(x, y)` covers drawing space `origin + [x, x+1) × [y, y+1)` and
/// is sampled at its centre.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    origin: DVec2,
    pixels: Vec<u32>,
}

impl PixelCanvas {
    /// Transparent canvas whose top-left pixel sits at the drawing origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_origin(width, height, DVec2::ZERO)
    }

    pub fn with_origin(width: u32, height: u32, origin: DVec2) -> Self {
        Self {
            width,
            height,
            origin,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel buffer as raw native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Number of pixels with non-zero alpha.
    pub fn covered(&self) -> usize {
        self.pixels.iter().filter(|&&p| p >> 24 != 0).count()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

impl Surface for PixelCanvas {
    fn fill_textured_quad(
        &mut self,
        quad: &[IVec2; 4],
        transform: DAffine2,
        texture: &Texture,
        composite: Option<f32>,
    ) {
        let inverse = transform.inverse();
        if !inverse.is_finite() {
            return;
        }
        let corners = quad.map(|q| q.as_dvec2());

        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for c in corners {
            let p = transform.transform_point2(c) - self.origin;
            min = min.min(p);
            max = max.max(p);
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().min(self.width as f64)).max(0.0) as u32;
        let y1 = (max.y.ceil().min(self.height as f64)).max(0.0) as u32;

        let strength = composite.unwrap_or(1.0).clamp(0.0, 1.0);
        let [q0, q1, q2, q3] = corners;
        for y in y0..y1 {
            for x in x0..x1 {
                let center = self.origin + DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = inverse.transform_point2(center);
                if !(in_triangle(t, q0, q1, q2) || in_triangle(t, q0, q2, q3)) {
                    continue;
                }
                let index = y as usize * self.width as usize + x as usize;
                self.pixels[index] = blend(texture.sample(t), self.pixels[index], strength);
            }
        }
    }
}

/// Inclusive containment test for either winding.
fn in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(negative && positive)
}

/// Source-over of straight-alpha ARGB pixels.
fn blend(src: u32, dst: u32, strength: f32) -> u32 {
    let channel = |p: u32, shift: u32| ((p >> shift) & 0xff) as f32 / 255.0;
    let sa = channel(src, 24) * strength;
    if sa <= 0.0 {
        return dst;
    }
    let da = channel(dst, 24);
    let oa = sa + da * (1.0 - sa);

    let mix = |shift: u32| {
        let c = (channel(src, shift) * sa + channel(dst, shift) * da * (1.0 - sa)) / oa;
        ((c * 255.0).round() as u32).min(255) << shift
    };
    (((oa * 255.0).round() as u32).min(255) << 24) | mix(16) | mix(8) | mix(0)
}
