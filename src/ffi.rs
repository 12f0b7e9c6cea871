//! FFI bindings for mobile platforms (iOS/Android).
//!
//! UniFFI exports the Kotlin and Swift UI call directly: run figures for the
//! run detail screen and shape scores for the drawing screen. Functions that
//! would clash with the internal API are prefixed with `ffi_`.

use crate::{
    init_logging, score_shape, GpsPoint, Path, Run, RunSummary, ShapeConfig, ShapeKind,
    ShapeScore, Split, SplitConfig,
};
use log::{debug, info, warn};

fn build_run(path: Path, start_time: i64, end_time: i64) -> Option<Run> {
    match Run::new(path, start_time, end_time) {
        Ok(run) => Some(run),
        Err(e) => {
            warn!("[RunSketchRust] Rejected run: {}", e);
            None
        }
    }
}

// ============================================================================
// Run Metrics
// ============================================================================

/// Summary of a run drawn through `points` between two epoch-second times.
/// Returns None when the run does not end after it starts.
#[uniffi::export]
pub fn run_summary(points: Vec<GpsPoint>, start_time: i64, end_time: i64) -> Option<RunSummary> {
    init_logging();
    debug!(
        "[RunSketchRust] run_summary called with {} points",
        points.len()
    );
    let run = build_run(Path::from_points(points), start_time, end_time)?;
    let summary = run.summary();
    info!(
        "[RunSketchRust] Run: {:.0}m in {}s ({:.2} m/s)",
        summary.distance, summary.duration, summary.average_speed
    );
    Some(summary)
}

/// Summary of a run with a timestamp for every point.
#[uniffi::export]
pub fn run_summary_with_times(points: Vec<GpsPoint>, point_times: Vec<i64>) -> Option<RunSummary> {
    init_logging();
    match Run::with_point_times(Path::from_points(points), point_times) {
        Ok(run) => Some(run.summary()),
        Err(e) => {
            warn!("[RunSketchRust] Rejected run: {}", e);
            None
        }
    }
}

/// Summary from a flat coordinate buffer `[lat1, lng1, lat2, lng2, ...]`.
#[uniffi::export]
pub fn run_summary_from_flat(coords: Vec<f64>, start_time: i64, end_time: i64) -> Option<RunSummary> {
    init_logging();
    let run = build_run(Path::from_flat(&coords), start_time, end_time)?;
    Some(run.summary())
}

/// One split per kilometer; the last one may be partial.
#[uniffi::export]
pub fn run_kilometer_splits(points: Vec<GpsPoint>, start_time: i64, end_time: i64) -> Vec<Split> {
    init_logging();
    build_run(Path::from_points(points), start_time, end_time)
        .map(|run| run.kilometer_splits())
        .unwrap_or_default()
}

/// Fixed-distance splits with a custom split length.
#[uniffi::export]
pub fn run_splits(
    points: Vec<GpsPoint>,
    start_time: i64,
    end_time: i64,
    config: SplitConfig,
) -> Vec<Split> {
    init_logging();
    build_run(Path::from_points(points), start_time, end_time)
        .map(|run| run.splits(&config))
        .unwrap_or_default()
}

/// Great-circle distance in meters.
#[uniffi::export]
pub fn ffi_haversine_distance(a: GpsPoint, b: GpsPoint) -> f64 {
    crate::geo_utils::haversine_distance(&a, &b)
}

#[uniffi::export]
pub fn default_split_config() -> SplitConfig {
    SplitConfig::default()
}

// ============================================================================
// Shape Scoring
// ============================================================================

/// Score a drawing against one shape template.
#[uniffi::export]
pub fn ffi_score_shape(
    points: Vec<GpsPoint>,
    kind: ShapeKind,
    config: ShapeConfig,
) -> Option<ShapeScore> {
    init_logging();
    let result = score_shape(&Path::from_points(points), kind, &config);
    if let Some(ref s) = result {
        info!(
            "[RunSketchRust] {} score {:.1} (amd {:.1}m)",
            s.kind.as_str(),
            s.score,
            s.amd
        );
    }
    result
}

/// The template the drawing matches best.
#[uniffi::export]
pub fn ffi_best_shape(points: Vec<GpsPoint>, config: ShapeConfig) -> Option<ShapeScore> {
    init_logging();
    info!(
        "[RunSketchRust] best_shape called with {} points",
        points.len()
    );
    let start = std::time::Instant::now();
    let result = crate::best_shape(&Path::from_points(points), &config);
    info!("[RunSketchRust] Scored all templates in {:?}", start.elapsed());
    result
}

/// Every template's score, in `ShapeKind::ALL` order.
#[uniffi::export]
pub fn ffi_score_all_shapes(points: Vec<GpsPoint>, config: ShapeConfig) -> Vec<ShapeScore> {
    init_logging();
    crate::shape::score_all_shapes(&Path::from_points(points), &config)
}

#[uniffi::export]
pub fn default_shape_config() -> ShapeConfig {
    init_logging();
    info!("[RunSketchRust] default_shape_config called - Rust is active!");
    ShapeConfig::default()
}
