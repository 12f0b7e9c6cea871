//! Shape scoring for drawn paths.
//!
//! The user "draws" by running; afterwards the path is compared against a
//! set of geometric templates. Each template is placed on the drawing's
//! centroid, scaled to the drawing's mean radius, tried at several
//! rotations, and compared with the symmetric Average Minimum Distance.
//! The AMD is then mapped to a 0-100 score relative to the drawing size, so
//! a small neat circle and a large neat circle score the same.
//!
//! ## Example
//! ```rust
//! use runsketch::{GpsPoint, Path, ShapeConfig, ShapeKind, score_shape};
//! use runsketch::geo_utils::offset_point;
//!
//! let center = GpsPoint::new(46.52, 6.63);
//! let circle: Vec<GpsPoint> = (0..=72)
//!     .map(|i| {
//!         let a = (i as f64 * 5.0).to_radians();
//!         offset_point(&center, 300.0 * a.cos(), 300.0 * a.sin())
//!     })
//!     .collect();
//!
//! let score = score_shape(&Path::from_points(circle), ShapeKind::Circle, &ShapeConfig::default()).unwrap();
//! assert!(score.score > 95.0);
//! ```

use std::collections::HashMap;
use std::f64::consts::PI;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geo_utils::{compute_center, haversine_distance, offset_point};
use crate::matching::{amd_to_percentage, resample_path, symmetric_amd};
use crate::{GpsPoint, Path};

/// Template shapes a drawing can be scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Star,
    Heart,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Heart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
            ShapeKind::Heart => "heart",
        }
    }

}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown shape '{}'", s))
    }
}

/// Configuration for shape scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ShapeConfig {
    /// Number of points both drawing and template are resampled to.
    /// Default: 64
    pub resample_count: u32,

    /// AMD, as a fraction of the drawing radius, at or below which the
    /// score is 100.
    /// Default: 0.05
    pub perfect_ratio: f64,

    /// AMD, as a fraction of the drawing radius, at or above which the
    /// score is 0.
    /// Default: 0.5
    pub zero_ratio: f64,

    /// Number of evenly spaced rotations each template is tried at.
    /// 1 means templates are only tried upright. Default: 12 (every 30°)
    pub rotation_steps: u32,

    /// Douglas-Peucker tolerance (degrees) applied to the drawing before
    /// resampling, to drop GPS jitter. 0 disables it.
    /// Default: 0.00002 (~2 meters)
    pub simplification_tolerance: f64,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            resample_count: 64,
            perfect_ratio: 0.05,
            zero_ratio: 0.5,
            rotation_steps: 12,
            simplification_tolerance: 0.00002,
        }
    }
}

/// Result of scoring a drawing against one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ShapeScore {
    pub kind: ShapeKind,
    /// 0-100, higher is a closer match
    pub score: f64,
    /// Symmetric Average Minimum Distance in meters at the best rotation
    pub amd: f64,
    /// Rotation of the template that matched best, degrees anticlockwise
    pub rotation_degrees: f64,
    /// Mean distance of the drawing from its centroid in meters
    pub radius: f64,
}

// ============================================================================
// Templates
// ============================================================================

/// Unit outlines in a local east/north plane, centered on the origin and
/// scaled to a mean radius of 1.
static UNIT_OUTLINES: Lazy<HashMap<ShapeKind, Vec<(f64, f64)>>> = Lazy::new(|| {
    ShapeKind::ALL
        .into_iter()
        .map(|kind| (kind, normalize(outline(kind))))
        .collect()
});

fn outline(kind: ShapeKind) -> Vec<(f64, f64)> {
    match kind {
        ShapeKind::Circle => (0..=64)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / 64.0;
                (a.cos(), a.sin())
            })
            .collect(),
        ShapeKind::Square => densify(&[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]),
        ShapeKind::Triangle => {
            let vertices: Vec<(f64, f64)> = [90.0_f64, 210.0, 330.0]
                .iter()
                .map(|deg| (deg.to_radians().cos(), deg.to_radians().sin()))
                .collect();
            densify(&vertices)
        }
        ShapeKind::Star => {
            let vertices: Vec<(f64, f64)> = (0..10)
                .map(|i| {
                    let r = if i % 2 == 0 { 1.0 } else { 0.4 };
                    let a = (90.0 + 36.0 * i as f64).to_radians();
                    (r * a.cos(), r * a.sin())
                })
                .collect();
            densify(&vertices)
        }
        ShapeKind::Heart => (0..=64)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / 64.0;
                let x = 16.0 * t.sin().powi(3);
                let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos()
                    - (4.0 * t).cos();
                (x, y)
            })
            .collect(),
    }
}

/// Closed polygon through `vertices`, with points added along each edge.
fn densify(vertices: &[(f64, f64)]) -> Vec<(f64, f64)> {
    const PER_EDGE: usize = 16;
    let mut points = Vec::with_capacity(vertices.len() * PER_EDGE + 1);
    for (i, &(x0, y0)) in vertices.iter().enumerate() {
        let (x1, y1) = vertices[(i + 1) % vertices.len()];
        for step in 0..PER_EDGE {
            let t = step as f64 / PER_EDGE as f64;
            points.push((x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
        }
    }
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Center on the centroid and scale to a mean radius of 1.
fn normalize(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let n = points.len() as f64;
    let (cx, cy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (cx, cy) = (cx / n, cy / n);

    let mean_radius = points
        .iter()
        .map(|(x, y)| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    points
        .into_iter()
        .map(|(x, y)| ((x - cx) / mean_radius, (y - cy) / mean_radius))
        .collect()
}

/// Place a template on the map around `center`.
fn place_template(kind: ShapeKind, center: &GpsPoint, radius: f64, rotation: f64) -> Vec<GpsPoint> {
    let (sin, cos) = rotation.sin_cos();
    UNIT_OUTLINES
        .get(&kind)
        .map(|outline| {
            outline
                .iter()
                .map(|&(x, y)| {
                    let east = (x * cos - y * sin) * radius;
                    let north = (x * sin + y * cos) * radius;
                    offset_point(center, east, north)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Template points for `kind` as they would be laid over `path`, at the
/// upright rotation. Empty when the path cannot be scored. Used by the UI to
/// draw the target shape under the user's drawing.
pub fn template_for(path: &Path, kind: ShapeKind, config: &ShapeConfig) -> Vec<GpsPoint> {
    match prepare_drawing(path, config) {
        Some(drawing) => resample_path(
            &place_template(kind, &drawing.center, drawing.radius, 0.0),
            config.resample_count as usize,
        ),
        None => Vec::new(),
    }
}

// ============================================================================
// Scoring
// ============================================================================

struct PreparedDrawing {
    points: Vec<GpsPoint>,
    center: GpsPoint,
    radius: f64,
}

fn prepare_drawing(path: &Path, config: &ShapeConfig) -> Option<PreparedDrawing> {
    let cleaned = if config.simplification_tolerance > 0.0 {
        path.simplified(config.simplification_tolerance)
    } else {
        Path::from_points(path.valid_points())
    };
    if cleaned.len() < 3 {
        return None;
    }

    let points = resample_path(cleaned.points(), config.resample_count as usize);
    let center = compute_center(&points)?;
    let radius = points
        .iter()
        .map(|p| haversine_distance(&center, p))
        .sum::<f64>()
        / points.len() as f64;

    if !(radius.is_finite() && radius > 0.0) {
        return None;
    }

    Some(PreparedDrawing {
        points,
        center,
        radius,
    })
}

fn score_prepared(drawing: &PreparedDrawing, kind: ShapeKind, config: &ShapeConfig) -> ShapeScore {
    let steps = config.rotation_steps.max(1);
    let count = config.resample_count as usize;

    let (amd, rotation) = (0..steps)
        .map(|step| {
            let rotation = 2.0 * PI * step as f64 / steps as f64;
            let template = resample_path(
                &place_template(kind, &drawing.center, drawing.radius, rotation),
                count,
            );
            (symmetric_amd(&drawing.points, &template), rotation)
        })
        .fold((f64::INFINITY, 0.0), |best, candidate| {
            if candidate.0 < best.0 {
                candidate
            } else {
                best
            }
        });

    let score = amd_to_percentage(
        amd,
        config.perfect_ratio * drawing.radius,
        config.zero_ratio * drawing.radius,
    );

    ShapeScore {
        kind,
        score,
        amd,
        rotation_degrees: rotation.to_degrees(),
        radius: drawing.radius,
    }
}

/// Score a drawing against one template.
///
/// Returns `None` if the path has fewer than 3 valid points (after jitter
/// removal) or covers no area.
pub fn score_shape(path: &Path, kind: ShapeKind, config: &ShapeConfig) -> Option<ShapeScore> {
    let drawing = prepare_drawing(path, config)?;
    let result = score_prepared(&drawing, kind, config);
    log::debug!(
        "[Shape] {} scored {:.1} (amd {:.1}m, radius {:.0}m)",
        kind.as_str(),
        result.score,
        result.amd,
        result.radius
    );
    Some(result)
}

/// Score a drawing against every template.
///
/// Results are in [`ShapeKind::ALL`] order.
pub fn score_all_shapes(path: &Path, config: &ShapeConfig) -> Vec<ShapeScore> {
    let Some(drawing) = prepare_drawing(path, config) else {
        return Vec::new();
    };

    #[cfg(feature = "parallel")]
    {
        ShapeKind::ALL
            .par_iter()
            .map(|&kind| score_prepared(&drawing, kind, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        ShapeKind::ALL
            .iter()
            .map(|&kind| score_prepared(&drawing, kind, config))
            .collect()
    }
}

/// The template the drawing resembles most.
pub fn best_shape(path: &Path, config: &ShapeConfig) -> Option<ShapeScore> {
    let best = score_all_shapes(path, config)
        .into_iter()
        .fold(None::<ShapeScore>, |best, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        });

    if let Some(ref b) = best {
        log::info!("[Shape] Best match {} at {:.1}", b.kind.as_str(), b.score);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> GpsPoint {
        GpsPoint::new(46.52, 6.63)
    }

    fn circle_drawing(radius: f64) -> Path {
        let c = center();
        (0..=100)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / 100.0;
                offset_point(&c, radius * a.cos(), radius * a.sin())
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn square_drawing(half_side: f64) -> Path {
        let c = center();
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let mut points = Vec::new();
        for i in 0..4 {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            for step in 0..10 {
                let t = step as f64 / 10.0;
                points.push(offset_point(
                    &c,
                    (x0 + t * (x1 - x0)) * half_side,
                    (y0 + t * (y1 - y0)) * half_side,
                ));
            }
        }
        points.push(points[0]);
        points.into()
    }

    #[test]
    fn test_unit_outlines_normalized() {
        for kind in ShapeKind::ALL {
            let outline = &UNIT_OUTLINES[&kind];
            let mean: f64 = outline
                .iter()
                .map(|(x, y)| (x * x + y * y).sqrt())
                .sum::<f64>()
                / outline.len() as f64;
            assert!((mean - 1.0).abs() < 0.05, "{:?} mean radius {}", kind, mean);
        }
    }

    #[test]
    fn test_circle_prefers_circle() {
        let config = ShapeConfig::default();
        let path = circle_drawing(250.0);
        let circle = score_shape(&path, ShapeKind::Circle, &config).unwrap();
        let square = score_shape(&path, ShapeKind::Square, &config).unwrap();
        assert!(circle.score > square.score);
        assert!(circle.score > 95.0);
    }

    #[test]
    fn test_best_shape_square() {
        let best = best_shape(&square_drawing(200.0), &ShapeConfig::default()).unwrap();
        assert_eq!(best.kind, ShapeKind::Square);
    }

    #[test]
    fn test_score_independent_of_size() {
        let config = ShapeConfig {
            simplification_tolerance: 0.0,
            ..ShapeConfig::default()
        };
        let small = score_shape(&circle_drawing(100.0), ShapeKind::Square, &config).unwrap();
        let large = score_shape(&circle_drawing(1000.0), ShapeKind::Square, &config).unwrap();
        assert!((small.score - large.score).abs() < 2.0);
    }

    #[test]
    fn test_degenerate_paths_not_scored() {
        let config = ShapeConfig::default();
        assert!(score_shape(&Path::new(), ShapeKind::Circle, &config).is_none());

        let p = center();
        let stationary = Path::from_points(vec![p, p, p, p]);
        assert!(score_shape(&stationary, ShapeKind::Circle, &config).is_none());
        assert!(best_shape(&stationary, &config).is_none());
    }

    #[test]
    fn test_score_all_order() {
        let scores = score_all_shapes(&circle_drawing(300.0), &ShapeConfig::default());
        let kinds: Vec<ShapeKind> = scores.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ShapeKind::ALL.to_vec());
    }

    #[test]
    fn test_template_for() {
        let config = ShapeConfig::default();
        let template = template_for(&circle_drawing(300.0), ShapeKind::Star, &config);
        assert_eq!(template.len(), config.resample_count as usize);
        assert!(template_for(&Path::new(), ShapeKind::Star, &config).is_empty());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.as_str().parse::<ShapeKind>(), Ok(kind));
        }
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }
}
