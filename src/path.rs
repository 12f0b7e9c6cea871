//! Drawn paths.
//!
//! A [`Path`] is the ordered list of coordinates a user produced while
//! drawing. Points are only ever appended; distance is always derived from
//! the points.

use geo::{algorithm::simplify::Simplify, Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, polyline_length};
use crate::{Bounds, GpsPoint};

/// Ordered, append-only sequence of GPS coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    points: Vec<GpsPoint>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path from points in drawing order.
    pub fn from_points(points: Vec<GpsPoint>) -> Self {
        Self { points }
    }

    /// Create a path from a flat `[lat1, lng1, lat2, lng2, ...]` buffer.
    /// A trailing odd value is ignored.
    pub fn from_flat(flat_coords: &[f64]) -> Self {
        let points = flat_coords
            .chunks_exact(2)
            .map(|chunk| GpsPoint::new(chunk[0], chunk[1]))
            .collect();
        Self { points }
    }

    /// Append a point to the end of the path.
    pub fn push(&mut self, point: GpsPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&GpsPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GpsPoint> {
        self.points.last()
    }

    /// Total distance along the path in meters.
    pub fn total_distance(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Length of each consecutive segment in meters (`len() - 1` entries).
    pub fn segment_distances(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| haversine_distance(&w[0], &w[1]))
            .collect()
    }

    /// Bounding box, `None` for an empty path.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Points with invalid coordinates dropped.
    pub fn valid_points(&self) -> Vec<GpsPoint> {
        self.points.iter().copied().filter(GpsPoint::is_valid).collect()
    }

    /// Douglas-Peucker simplified copy of the path for map display.
    ///
    /// `tolerance` is in degrees (0.0001 is roughly 11 meters). Invalid
    /// points are dropped first; paths with fewer than 3 valid points are
    /// returned unchanged apart from that filtering.
    pub fn simplified(&self, tolerance: f64) -> Path {
        let valid = self.valid_points();
        if valid.len() < 3 {
            return Path::from_points(valid);
        }

        let line: LineString<f64> = valid
            .iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect();

        let simplified = line.simplify(&tolerance);
        Path::from_points(
            simplified
                .0
                .iter()
                .map(|c| GpsPoint::new(c.y, c.x))
                .collect(),
        )
    }
}

impl From<Vec<GpsPoint>> for Path {
    fn from(points: Vec<GpsPoint>) -> Self {
        Self::from_points(points)
    }
}
