//! Drawing comparison using Average Minimum Distance (AMD).
//!
//! This module provides the building blocks of shape scoring:
//! - Resampling a polyline to evenly spaced points
//! - AMD between two point sets, and its symmetric form
//! - Mapping an AMD to a 0-100 score

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Calculate Average Minimum Distance from `from` to `to`.
///
/// For each point in `from`, find the minimum distance to any point in `to`.
/// Return the average of these minimum distances. Point order does not
/// matter, so a shape drawn clockwise matches one drawn anticlockwise.
pub fn average_min_distance(from: &[GpsPoint], to: &[GpsPoint]) -> f64 {
    if from.is_empty() || to.is_empty() {
        return f64::INFINITY;
    }

    let total_min_dist: f64 = from
        .iter()
        .map(|p1| {
            to.iter()
                .map(|p2| haversine_distance(p1, p2))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    total_min_dist / from.len() as f64
}

/// AMD averaged over both directions.
///
/// One direction alone misses parts of a template the drawing never
/// visited (or stray parts of the drawing).
pub fn symmetric_amd(a: &[GpsPoint], b: &[GpsPoint]) -> f64 {
    (average_min_distance(a, b) + average_min_distance(b, a)) / 2.0
}

/// Map an AMD to a 0-100 score.
///
/// At or below `perfect_threshold` the score is 100, at or above
/// `zero_threshold` it is 0, and it falls linearly in between.
pub fn amd_to_percentage(amd: f64, perfect_threshold: f64, zero_threshold: f64) -> f64 {
    if zero_threshold <= perfect_threshold {
        return if amd <= perfect_threshold { 100.0 } else { 0.0 };
    }
    let t = (amd - perfect_threshold) / (zero_threshold - perfect_threshold);
    100.0 * (1.0 - t.clamp(0.0, 1.0))
}

/// Resample a polyline to `target_count` points evenly spaced by distance
/// along it. The result starts at the first point and ends at the last.
///
/// A path with no length collapses to `target_count` copies of its first
/// point.
pub fn resample_path(points: &[GpsPoint], target_count: usize) -> Vec<GpsPoint> {
    if points.len() < 2 || target_count < 2 {
        return points.to_vec();
    }

    // Distance from the start to each vertex
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(total);
    for pair in points.windows(2) {
        total += haversine_distance(&pair[0], &pair[1]);
        cumulative.push(total);
    }
    if total <= 0.0 {
        return vec![points[0]; target_count];
    }

    let last = points.len() - 1;
    let mut segment = 0;
    (0..target_count)
        .map(|i| {
            if i == target_count - 1 {
                return points[last];
            }
            let target = total * i as f64 / (target_count - 1) as f64;
            while segment + 1 < last && cumulative[segment + 1] < target {
                segment += 1;
            }
            let span = cumulative[segment + 1] - cumulative[segment];
            let t = if span > 0.0 {
                ((target - cumulative[segment]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (a, b) = (points[segment], points[segment + 1]);
            GpsPoint::new(
                a.latitude + t * (b.latitude - a.latitude),
                a.longitude + t * (b.longitude - a.longitude),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::polyline_length;

    /// Three legs heading north out of Oslo, unevenly sampled.
    fn uneven_line() -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(59.9100, 10.7500),
            GpsPoint::new(59.9101, 10.7500),
            GpsPoint::new(59.9130, 10.7500),
            GpsPoint::new(59.9190, 10.7500),
        ]
    }

    #[test]
    fn test_score_thresholds() {
        assert_eq!(amd_to_percentage(0.0, 5.0, 50.0), 100.0);
        assert_eq!(amd_to_percentage(5.0, 5.0, 50.0), 100.0);
        assert_eq!(amd_to_percentage(50.0, 5.0, 50.0), 0.0);
        assert_eq!(amd_to_percentage(f64::INFINITY, 5.0, 50.0), 0.0);
        assert!((amd_to_percentage(27.5, 5.0, 50.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_resample_evenly_spaced() {
        let points = uneven_line();
        let resampled = resample_path(&points, 10);
        assert_eq!(resampled.len(), 10);
        assert_eq!(resampled[0], points[0]);
        assert_eq!(resampled[9], points[3]);

        let gaps: Vec<f64> = resampled
            .windows(2)
            .map(|w| haversine_distance(&w[0], &w[1]))
            .collect();
        let expected = polyline_length(&points) / 9.0;
        for gap in gaps {
            assert!((gap - expected).abs() < 0.5, "gap {} vs {}", gap, expected);
        }
    }

    #[test]
    fn test_resample_stationary() {
        let p = GpsPoint::new(59.91, 10.75);
        assert_eq!(resample_path(&[p, p, p], 5), vec![p; 5]);
    }

    #[test]
    fn test_amd_ignores_direction() {
        let points = uneven_line();
        let reversed: Vec<GpsPoint> = points.iter().rev().copied().collect();
        assert_eq!(symmetric_amd(&points, &points), 0.0);
        assert_eq!(symmetric_amd(&points, &reversed), 0.0);
    }

    #[test]
    fn test_amd_one_sided() {
        // The short path lies on the long one, but not the other way round.
        let long = uneven_line();
        let short = &long[..2];
        assert_eq!(average_min_distance(short, &long), 0.0);
        assert!(average_min_distance(&long, short) > 100.0);
        assert!(average_min_distance(&[], &long).is_infinite());
    }
}
