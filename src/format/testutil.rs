//! Encoders for synthetic assets used by the unit tests.

/// Pack channels as `0xAARRGGBB`.
pub fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Builds raster asset bytes.
pub struct RasterBuilder {
    version: i32,
    width: u32,
    height: u32,
    bits: i32,
    palette: Option<Vec<u32>>,
    body: Vec<u8>,
}

impl RasterBuilder {
    pub fn with_version(version: i32, width: u32, height: u32, bits: i32) -> Self {
        Self {
            version,
            width,
            height,
            bits,
            palette: None,
            body: Vec::new(),
        }
    }

    pub fn raw(width: u32, height: u32, bits: i32) -> Self {
        Self::with_version(0, width, height, bits)
    }

    pub fn rle(width: u32, height: u32, bits: i32) -> Self {
        Self::with_version(1, width, height, bits)
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn rgba8(self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.bytes(&[r, g, b, a])
    }

    pub fn palette(mut self, palette: &[u32]) -> Self {
        self.palette = Some(palette.to_vec());
        self
    }

    /// Literal run: one palette index per pixel (at most 128).
    pub fn literal(mut self, indices: &[u8]) -> Self {
        assert!((1..=128).contains(&indices.len()));
        self.body.push(((indices.len() - 1) << 1) as u8);
        self.body.extend_from_slice(indices);
        self
    }

    /// Repeat run: one palette index, `len` times (at most 128).
    pub fn repeat(mut self, index: u8, len: usize) -> Self {
        assert!((1..=128).contains(&len));
        self.body.push((((len - 1) << 1) | 1) as u8);
        self.body.push(index);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.width as i32).to_le_bytes());
        out.extend_from_slice(&(self.height as i32).to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());

        if let Some(palette) = &self.palette {
            let mut pal = Vec::new();
            for &pix in palette {
                encode_pixel(&mut pal, pix, self.bits);
            }
            let length = (8 + pal.len() + self.body.len()) as i32;
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(&(palette.len() as i32).to_le_bytes());
            out.extend_from_slice(&pal);
        }
        out.extend_from_slice(&self.body);
        out
    }
}

fn encode_pixel(out: &mut Vec<u8>, pix: u32, bits: i32) {
    let [b, g, r, a] = pix.to_le_bytes();
    if bits == 4 {
        out.push((a >> 4) | (b & 0xf0));
        out.push((g >> 4) | (r & 0xf0));
    } else {
        out.extend_from_slice(&[r, g, b, a]);
    }
}

/// One control vertex of a synthetic animation.
#[derive(Debug, Clone)]
pub struct VertexSpec {
    pub pose: [i16; 2],
    pub texture: [i16; 2],
    /// Alpha samples written on version 8; missing samples are written as 1.
    pub alpha: Vec<f32>,
}

pub fn vertex(pose: [i16; 2], texture: [i16; 2]) -> VertexSpec {
    VertexSpec {
        pose,
        texture,
        alpha: Vec::new(),
    }
}

/// One animation record of a synthetic package.
#[derive(Debug, Clone)]
pub struct AnimationSpec {
    pub name: String,
    pub point_size: i16,
    pub vertices: Vec<VertexSpec>,
    pub bounds: [i16; 4],
    pub frames: Vec<Vec<[i16; 6]>>,
    pub sequence: Option<Vec<i16>>,
    /// Written instead of `6 * polygons` as every frame's point count.
    pub frame_size: Option<i16>,
}

impl AnimationSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            point_size: 0,
            vertices: Vec::new(),
            bounds: [0, 0, 0, 0],
            frames: Vec::new(),
            sequence: None,
            frame_size: None,
        }
    }

    pub fn vertices(mut self, vertices: Vec<VertexSpec>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn frame(mut self, polygons: Vec<[i16; 6]>) -> Self {
        self.frames.push(polygons);
        self
    }

    pub fn sequence(mut self, sequence: Vec<i16>) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn point_size(mut self, point_size: i16) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn bounds(mut self, bounds: [i16; 4]) -> Self {
        self.bounds = bounds;
        self
    }
}

/// A square with pose (0,0)-(32,32) on texture (0,0)-(100,100), drawn as
/// one polygon.
pub fn quad_animation(name: &str) -> AnimationSpec {
    AnimationSpec::new(name)
        .vertices(vec![
            vertex([0, 0], [0, 0]),
            vertex([32, 0], [100, 0]),
            vertex([32, 32], [100, 100]),
            vertex([0, 32], [0, 100]),
        ])
        .bounds([0, 32, 0, 32])
        .frame(vec![[0, 1, 2, 0, 2, 3]])
}

fn float_count(point_size: i16) -> usize {
    match point_size {
        1 => 1,
        0x101 => 4,
        _ => 0,
    }
}

/// Encode a timeline package.
pub fn encode_package(version: i16, animations: &[AnimationSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let i16le = |out: &mut Vec<u8>, v: i16| out.extend_from_slice(&v.to_le_bytes());

    i16le(&mut out, version);
    out.push(0);
    i16le(&mut out, animations.len() as i16);
    i16le(&mut out, 0);

    for anim in animations {
        let mut name = anim.name.as_bytes().to_vec();
        name.resize(256, 0);
        out.extend_from_slice(&name);
        i16le(&mut out, 0);

        i16le(&mut out, anim.vertices.len() as i16);
        if version == 8 {
            i16le(&mut out, anim.point_size);
        }
        for v in &anim.vertices {
            i16le(&mut out, v.pose[0]);
            i16le(&mut out, v.pose[1]);
            if version == 4 {
                i16le(&mut out, 0);
            }
            i16le(&mut out, v.texture[0]);
            i16le(&mut out, v.texture[1]);
            if version == 8 {
                for i in 0..float_count(anim.point_size) {
                    let a = v.alpha.get(i).copied().unwrap_or(1.0);
                    out.extend_from_slice(&a.to_le_bytes());
                }
            }
        }

        for b in anim.bounds {
            i16le(&mut out, b);
        }

        i16le(&mut out, anim.frames.len() as i16);
        for frame in &anim.frames {
            i16le(
                &mut out,
                anim.frame_size.unwrap_or((frame.len() * 6) as i16),
            );
            if version > 4 {
                out.push(0);
            }
            for poly in frame {
                for &p in poly {
                    i16le(&mut out, p);
                }
            }
        }

        if version > 4 {
            let sequence = anim
                .sequence
                .clone()
                .unwrap_or_else(|| (0..anim.frames.len() as i16).collect());
            i16le(&mut out, sequence.len() as i16);
            i16le(&mut out, 0);
            for s in sequence {
                i16le(&mut out, s);
            }
        }
    }

    out
}
