//! Versioned timeline packages: control vertices, frames and sequences.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use glam::{DVec2, IVec2};

use super::frame::{Bounds, Frame, Rect};
use super::{FormatError, FormatResult, LeReader, checked_get};

/// Byte length of the fixed name field of an animation record.
const NAME_LEN: usize = 256;

/// Supported package layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineVersion {
    /// Native pose units, an alignment short in every vertex, no sequence.
    V4,
    /// Pose units of 1/32, frame padding and a sequence remap.
    V6,
    /// As `V6`, plus optional per-vertex alpha samples.
    V8,
}

impl TimelineVersion {
    pub fn from_i16(v: i16) -> FormatResult<Self> {
        match v {
            4 => Ok(TimelineVersion::V4),
            6 => Ok(TimelineVersion::V6),
            8 => Ok(TimelineVersion::V8),
            _ => Err(FormatError::UnknownVersion(v)),
        }
    }

    pub fn number(self) -> i16 {
        match self {
            TimelineVersion::V4 => 4,
            TimelineVersion::V6 => 6,
            TimelineVersion::V8 => 8,
        }
    }

    /// Pose units per drawing unit.
    pub fn scale(self) -> f64 {
        match self {
            TimelineVersion::V4 => 1.0,
            TimelineVersion::V6 | TimelineVersion::V8 => 1.0 / 32.0,
        }
    }

    pub(crate) fn has_frame_padding(self) -> bool {
        self != TimelineVersion::V4
    }

    fn has_sequence(self) -> bool {
        self != TimelineVersion::V4
    }

    fn read_vertices(self, r: &mut LeReader<'_>) -> FormatResult<Vec<ControlVertex>> {
        match self {
            TimelineVersion::V4 => read_vertices_v4(r),
            TimelineVersion::V6 => read_vertices_v6(r),
            TimelineVersion::V8 => read_vertices_v8(r),
        }
    }
}

/// Version 8 selector for the extra data stored with each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSize {
    Plain,
    Alpha,
    Color,
}

impl PointSize {
    pub fn from_i16(v: i16) -> FormatResult<Self> {
        match v {
            0 => Ok(PointSize::Plain),
            1 => Ok(PointSize::Alpha),
            0x101 => Ok(PointSize::Color),
            _ => Err(FormatError::UnknownPointSize(v)),
        }
    }

    /// Number of f32 samples following each vertex.
    pub fn float_count(self) -> usize {
        match self {
            PointSize::Plain => 0,
            PointSize::Alpha => 1,
            PointSize::Color => 4,
        }
    }
}

/// Parse-time vertex: where it sits in the current pose and where it
/// samples the texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlVertex {
    pub pose: IVec2,
    pub texture: IVec2,
    pub alpha: f32,
}

impl ControlVertex {
    pub fn new(pose: IVec2, texture: IVec2) -> Self {
        Self {
            pose,
            texture,
            alpha: 1.0,
        }
    }
}

fn read_count(r: &mut LeReader<'_>) -> FormatResult<usize> {
    let count = r.read_i16()?;
    usize::try_from(count).map_err(|_| FormatError::InvalidArrayIndex {
        index: count as i64,
        len: 0,
    })
}

fn read_vertices_v4(r: &mut LeReader<'_>) -> FormatResult<Vec<ControlVertex>> {
    let count = read_count(r)?;
    (0..count)
        .map(|_| {
            let pose = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            r.read_i16()?;
            let texture = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            Ok(ControlVertex::new(pose, texture))
        })
        .collect()
}

fn read_vertices_v6(r: &mut LeReader<'_>) -> FormatResult<Vec<ControlVertex>> {
    let count = read_count(r)?;
    (0..count)
        .map(|_| {
            let pose = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            let texture = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            Ok(ControlVertex::new(pose, texture))
        })
        .collect()
}

fn read_vertices_v8(r: &mut LeReader<'_>) -> FormatResult<Vec<ControlVertex>> {
    let count = read_count(r)?;
    let point_size = PointSize::from_i16(r.read_i16()?)?;
    (0..count)
        .map(|_| {
            let pose = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            let texture = IVec2::new(r.read_i16()? as i32, r.read_i16()? as i32);
            let mut vertex = ControlVertex::new(pose, texture);
            for _ in 0..point_size.float_count() {
                vertex.alpha = vertex.alpha.min(r.read_f32()?);
            }
            Ok(vertex)
        })
        .collect()
}

/// A decoded animation.
#[derive(Debug)]
pub struct Timeline {
    package: String,
    name: String,
    version: TimelineVersion,
    bounds: Bounds,
    frames: Vec<Arc<Frame>>,
}

impl Timeline {
    pub(crate) fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        version: TimelineVersion,
        bounds: Bounds,
        frames: Vec<Arc<Frame>>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            version,
            bounds,
            frames,
        }
    }

    /// Package this animation was decoded from; also the name of its raster.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Name as spelled in the binary record.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> TimelineVersion {
        self.version
    }

    pub fn scale(&self) -> f64 {
        self.version.scale()
    }

    /// Overall bounds in native pose units, as stored in the record.
    pub fn native_bounds(&self) -> Bounds {
        self.bounds
    }

    /// Overall bounds in drawing units.
    pub fn bounds(&self) -> Rect {
        self.bounds.to_rect(self.scale())
    }

    /// Bounds of one playable frame in drawing units.
    pub fn frame_bounds(&self, index: usize) -> Option<Rect> {
        let bounds = self.frames.get(index)?.bounds()?;
        Some(bounds.to_rect(self.scale()))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&Arc<Frame>> {
        self.frames.get(index)
    }

    /// Playable sequence; one frame may appear at several indices.
    pub fn frames(&self) -> &[Arc<Frame>] {
        &self.frames
    }

    pub fn width(&self) -> i32 {
        self.bounds.max.x - self.bounds.min.x
    }

    pub fn height(&self) -> i32 {
        self.bounds.max.y - self.bounds.min.y
    }

    /// Larger of width and height, in native units.
    pub fn size(&self) -> i32 {
        self.width().max(self.height())
    }

    /// Centre of the overall bounds in native units.
    pub fn center(&self) -> DVec2 {
        (self.bounds.min.as_dvec2() + self.bounds.max.as_dvec2()) * 0.5
    }

    /// Parse one animation record.
    fn read(
        r: &mut LeReader<'_>,
        package: &str,
        version: TimelineVersion,
    ) -> FormatResult<Self> {
        let name = r.read_c_string(NAME_LEN)?;
        r.read_i16()?;

        // Dropped once the frames below hold their own corners/transforms.
        let vertices = version.read_vertices(r)?;

        let x_min = r.read_i16()? as i32;
        let x_max = r.read_i16()? as i32;
        let y_min = r.read_i16()? as i32;
        let y_max = r.read_i16()? as i32;

        let num_frames = read_count(r)?;
        let raw_frames = (0..num_frames)
            .map(|_| Frame::read(r, version, &vertices).map(Arc::new))
            .collect::<FormatResult<Vec<_>>>()?;

        let frames = if version.has_sequence() {
            read_sequence(r, &raw_frames)?
        } else {
            raw_frames
        };

        Ok(Self::new(
            package,
            name,
            version,
            Bounds::new(x_min, x_max, y_min, y_max),
            frames,
        ))
    }
}

fn read_sequence(r: &mut LeReader<'_>, frames: &[Arc<Frame>]) -> FormatResult<Vec<Arc<Frame>>> {
    let count = r.read_i16()?;
    if count <= 0 {
        return Err(FormatError::InvalidSequenceCount(count));
    }
    r.read_i16()?;
    (0..count)
        .map(|_| Ok(checked_get(frames, r.read_i16()? as i64)?.clone()))
        .collect()
}

/// Every timeline decoded from one package, addressable by name.
#[derive(Debug)]
pub struct TimelinePackage {
    name: String,
    version: TimelineVersion,
    timelines: Vec<Arc<Timeline>>,
    by_name: HashMap<String, usize>,
}

impl TimelinePackage {
    /// Decode a whole package stream.
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> FormatResult<Self> {
        let name = name.into();
        let start = Instant::now();
        let mut r = LeReader::new(bytes);

        let version = TimelineVersion::from_i16(r.read_i16()?)?;
        r.read_u8()?;
        let count = read_count(&mut r)?;
        r.read_i16()?;

        let mut timelines = Vec::with_capacity(count);
        let mut by_name = HashMap::with_capacity(count);
        for _ in 0..count {
            let timeline = Timeline::read(&mut r, &name, version)?;
            // Later records shadow earlier ones of the same name.
            by_name.insert(timeline.name.to_lowercase(), timelines.len());
            timelines.push(Arc::new(timeline));
        }

        log::debug!(
            "Decoded package {} (v{}, {} timelines, {} bytes) in {:?}",
            name,
            version.number(),
            timelines.len(),
            r.position(),
            start.elapsed()
        );

        Ok(Self {
            name,
            version,
            timelines,
            by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> TimelineVersion {
        self.version
    }

    /// Look up a timeline by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Arc<Timeline>> {
        let index = *self.by_name.get(&name.to_lowercase())?;
        self.timelines.get(index)
    }

    /// Timelines in record order.
    pub fn timelines(&self) -> &[Arc<Timeline>] {
        &self.timelines
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}
