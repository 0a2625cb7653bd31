//! Frame records and the per-polygon affine reconstruction.
//!
//! The timeline format never stores a transform. Each polygon names three
//! control vertices, and each vertex carries both a pose-space and a
//! texture-space position; the transform is the unique affine map taking
//! the three texture points onto the three pose points.

use glam::{DAffine2, DVec2, IVec2};

use super::timeline::{ControlVertex, TimelineVersion};
use super::{FormatError, FormatResult, LeReader, checked_get};

/// Inclusive integer bounding box in native (unscaled) pose units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            min: IVec2::new(x_min, y_min),
            max: IVec2::new(x_max, y_max),
        }
    }

    /// Smallest box holding every point; `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = IVec2>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds { min: p, max: p },
                Some(b) => Bounds {
                    min: b.min.min(p),
                    max: b.max.max(p),
                },
            })
        })
    }

    /// Width counting both edges.
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    /// Height counting both edges.
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    /// Drawing-unit rectangle at the given uniform scale.
    pub fn to_rect(&self, scale: f64) -> Rect {
        Rect {
            x: self.min.x as f64 * scale,
            y: self.min.y as f64 * scale,
            width: self.width() as f64 * scale,
            height: self.height() as f64 * scale,
        }
    }
}

/// Axis-aligned rectangle in drawing units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn translate(self, offset: DVec2) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..self
        }
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One texture-mapped quadrilateral of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonInstance {
    /// Texture-space corners, in drawing order.
    pub quad: [IVec2; 4],
    /// Texture space to (scaled) pose space.
    pub transform: DAffine2,
}

/// One posed snapshot of a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    polygons: Vec<PolygonInstance>,
    composite: Option<Vec<f32>>,
    bounds: Option<Bounds>,
}

impl Frame {
    pub(crate) fn new(
        polygons: Vec<PolygonInstance>,
        composite: Option<Vec<f32>>,
        bounds: Option<Bounds>,
    ) -> Self {
        Self {
            polygons,
            composite,
            bounds,
        }
    }

    pub fn polygons(&self) -> &[PolygonInstance] {
        &self.polygons
    }

    /// Per-polygon alpha, or `None` when every polygon is fully opaque.
    pub fn composites(&self) -> Option<&[f32]> {
        self.composite.as_deref()
    }

    /// Alpha of one polygon; `None` when no compositing is needed.
    pub fn composite(&self, polygon: usize) -> Option<f32> {
        self.composite.as_ref()?.get(polygon).copied()
    }

    pub fn is_opaque(&self) -> bool {
        self.composite.is_none()
    }

    /// Pose-space bounds in native units; `None` for an empty frame.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Typical linear scale of the frame: the square root of the median
    /// absolute determinant of its polygon transforms.
    pub fn scale(&self) -> Option<f64> {
        let mut dets: Vec<f64> = self
            .polygons
            .iter()
            .map(|p| p.transform.matrix2.determinant().abs())
            .collect();
        if dets.is_empty() {
            return None;
        }
        dets.sort_by(f64::total_cmp);
        Some(dets[dets.len() / 2].sqrt())
    }

    /// Parse a frame record against the animation's control vertices.
    pub(crate) fn read(
        r: &mut LeReader<'_>,
        version: TimelineVersion,
        vertices: &[ControlVertex],
    ) -> FormatResult<Self> {
        let num_points = r.read_i16()?;
        if num_points < 0 || num_points % 6 != 0 {
            return Err(FormatError::UnexpectedFrameSize(num_points));
        }
        let num_polys = (num_points / 6) as usize;
        if version.has_frame_padding() {
            r.read_u8()?;
        }

        let scale = version.scale();
        let mut polygons = Vec::with_capacity(num_polys);
        let mut composite = Vec::with_capacity(num_polys);
        let mut corners = Vec::with_capacity(num_polys * 4);

        for _ in 0..num_polys {
            let mut p = [0i16; 6];
            for index in &mut p {
                *index = r.read_i16()?;
            }
            if p[3] != p[0] || p[4] != p[2] {
                return Err(FormatError::UnexpectedFrameArrangement(p));
            }

            let v0 = checked_get(vertices, p[0] as i64)?;
            let v1 = checked_get(vertices, p[1] as i64)?;
            let v2 = checked_get(vertices, p[2] as i64)?;
            let v3 = checked_get(vertices, p[5] as i64)?;

            composite.push(v0.alpha);
            corners.extend([v0.pose, v1.pose, v2.pose, v3.pose]);

            let transform = reconstruct_transform(
                [v0.pose, v1.pose, v2.pose],
                [v0.texture, v1.texture, v2.texture],
                scale,
            )?;
            polygons.push(PolygonInstance {
                quad: [v0.texture, v1.texture, v2.texture, v3.texture],
                transform,
            });
        }

        // Alpha is tracked per polygon but only dropped for a whole frame.
        let composite = if composite.iter().all(|&a| a == 1.0) {
            None
        } else {
            Some(composite)
        };

        Ok(Self::new(polygons, composite, Bounds::from_points(corners)))
    }
}

/// Affine frame with origin `points[0]` and axes `points[1] - points[0]`,
/// `points[2] - points[0]`.
fn basis(points: [IVec2; 3], scale: f64) -> DAffine2 {
    let [p0, p1, p2] = points.map(|p| p.as_dvec2() * scale);
    DAffine2::from_cols(p1 - p0, p2 - p0, p0)
}

/// Solve for the affine map taking each texture point to its pose point.
///
/// Pose coordinates are multiplied by `scale` first. Fails with
/// [`FormatError::BadTransform`] when the texture points are collinear.
pub fn reconstruct_transform(
    pose: [IVec2; 3],
    texture: [IVec2; 3],
    scale: f64,
) -> FormatResult<DAffine2> {
    let a = basis(pose, scale);
    let b = basis(texture, 1.0);

    let det = b.matrix2.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(FormatError::BadTransform);
    }

    let t = a * b.inverse();
    if !t.is_finite() {
        return Err(FormatError::BadTransform);
    }
    Ok(t)
}
