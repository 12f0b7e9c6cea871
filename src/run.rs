//! Runs and their performance figures.
//!
//! A [`Run`] wraps one [`Path`] with its start and end time. Every derived
//! figure (duration, distance, speed, calories, time per kilometer) is
//! computed once at construction. While a drawing is in progress the app
//! keeps producing new runs with [`Run::extended`]; an existing run never
//! changes.
//!
//! ## Splits
//!
//! Splits are for display only (tables and graphs in the UI):
//! - [`Run::kilometer_splits`] cuts the path every kilometer
//! - [`Run::splits`] cuts every [`SplitConfig::split_distance`] meters
//! - [`Run::segment_splits`] reports each original point-to-point segment
//!
//! Time along the path comes from per-point timestamps when the run has
//! them, otherwise the run is assumed to have been covered at constant speed.

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, SketchError};
use crate::{GpsPoint, Path};

/// Placeholder energy cost of running one kilometer.
///
/// This is an approximation until the estimate takes body weight and pace
/// into account.
pub const CALORIES_PER_KM: f64 = 60.0;

/// Shortest split length [`Run::splits`] accepts, in meters.
pub const MIN_SPLIT_DISTANCE: f64 = 1.0;

/// Configuration for fixed-distance splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SplitConfig {
    /// Length of each split in meters, at least [`MIN_SPLIT_DISTANCE`].
    /// Default: 1000.0
    pub split_distance: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            split_distance: 1000.0,
        }
    }
}

/// One chunk of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Split {
    /// Position of this split (0-based)
    pub index: u32,
    /// Distance covered in meters
    pub distance: f64,
    /// Time taken in seconds
    pub duration: f64,
    /// Speed in m/s (0 when no time elapsed)
    pub speed: f64,
    /// Index of the point where the split starts (or the segment it starts in)
    pub start_index: u32,
    /// Index of the last point the split reaches
    pub end_index: u32,
}

impl Split {
    fn new(index: usize, distance: f64, duration: f64, start_index: usize, end_index: usize) -> Self {
        Self {
            index: index as u32,
            distance,
            duration,
            speed: if duration > 0.0 { distance / duration } else { 0.0 },
            start_index: start_index as u32,
            end_index: end_index as u32,
        }
    }
}

/// Flat summary of a run for list rows and FFI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RunSummary {
    pub start_time: i64,
    pub end_time: i64,
    /// Seconds
    pub duration: i64,
    /// Meters
    pub distance: f64,
    /// m/s
    pub average_speed: f64,
    pub calories: u32,
    /// Seconds needed for one kilometer at the average speed
    pub time_for_one_km: Option<f64>,
    pub point_count: u32,
}

/// Stored form of a run: only the inputs, never the derived figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunRecord {
    path: Path,
    start_time: i64,
    end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point_times: Option<Vec<i64>>,
}

/// A completed or in-progress drawing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RunRecord", into = "RunRecord")]
pub struct Run {
    path: Path,
    start_time: i64,
    end_time: i64,
    point_times: Option<Vec<i64>>,

    duration: i64,
    distance: f64,
    average_speed: f64,
    calories: u32,
    time_for_one_km: Option<f64>,
}

impl Run {
    /// Create a run from a path and its start/end time (epoch seconds).
    ///
    /// Fails with [`SketchError::InvalidDuration`] unless
    /// `end_time > start_time`.
    ///
    /// # Example
    /// ```
    /// use runsketch::{GpsPoint, Path, Run};
    ///
    /// let path = Path::from_points(vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 1.0)]);
    /// let run = Run::new(path, 0, 75).unwrap();
    /// assert_eq!(run.duration(), 75);
    /// assert!((run.average_speed() - run.distance() / 75.0).abs() < 1e-9);
    /// ```
    pub fn new(path: Path, start_time: i64, end_time: i64) -> Result<Self> {
        Self::build(path, start_time, end_time, None)
    }

    /// Create a run where every point carries its own timestamp.
    ///
    /// There must be exactly one non-decreasing timestamp per point; the
    /// run starts at the first and ends at the last.
    pub fn with_point_times(path: Path, point_times: Vec<i64>) -> Result<Self> {
        if point_times.len() != path.len() {
            return Err(SketchError::InvalidTimestamps {
                message: format!(
                    "{} timestamps for {} points",
                    point_times.len(),
                    path.len()
                ),
            });
        }
        if point_times.windows(2).any(|w| w[1] < w[0]) {
            return Err(SketchError::InvalidTimestamps {
                message: "timestamps must not decrease".to_string(),
            });
        }

        let start_time = *point_times
            .first()
            .ok_or_invalid_timestamps("a timed run needs at least one point")?;
        let end_time = *point_times
            .last()
            .ok_or_invalid_timestamps("a timed run needs at least one point")?;

        Self::build(path, start_time, end_time, Some(point_times))
    }

    fn build(
        path: Path,
        start_time: i64,
        end_time: i64,
        point_times: Option<Vec<i64>>,
    ) -> Result<Self> {
        if end_time <= start_time {
            return Err(SketchError::InvalidDuration {
                start_time,
                end_time,
            });
        }
        let duration = end_time
            .checked_sub(start_time)
            .ok_or_invalid_timestamps("run duration does not fit in 64 bits")?;

        let distance = path.total_distance();
        let average_speed = distance / duration as f64;
        let calories = (distance / 1000.0 * CALORIES_PER_KM) as u32;
        let time_for_one_km = if average_speed > 0.0 {
            Some(1000.0 / average_speed)
        } else {
            None
        };

        Ok(Self {
            path,
            start_time,
            end_time,
            point_times,
            duration,
            distance,
            average_speed,
            calories,
            time_for_one_km,
        })
    }

    /// New run with `point` appended, ending at `timestamp`.
    ///
    /// This is how an in-progress drawing grows: the receiver is left
    /// untouched. Timed runs also record `timestamp` for the new point,
    /// which must not be earlier than the previous one.
    pub fn extended(&self, point: GpsPoint, timestamp: i64) -> Result<Self> {
        let mut path = self.path.clone();
        path.push(point);

        match &self.point_times {
            Some(times) => {
                let mut times = times.clone();
                times.push(timestamp);
                Self::with_point_times(path, times)
            }
            None => Self::build(path, self.start_time, timestamp, None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn point_times(&self) -> Option<&[i64]> {
        self.point_times.as_deref()
    }

    /// Seconds between start and end.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Meters along the path.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Meters per second.
    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }

    /// Approximate energy spent, see [`CALORIES_PER_KM`].
    pub fn calories_burned(&self) -> u32 {
        self.calories
    }

    /// Seconds per kilometer at the average speed, `None` if the run
    /// covered no distance.
    pub fn time_for_one_kilometer(&self) -> Option<f64> {
        self.time_for_one_km
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            distance: self.distance,
            average_speed: self.average_speed,
            calories: self.calories,
            time_for_one_km: self.time_for_one_km,
            point_count: self.path.len() as u32,
        }
    }

    /// Summary as JSON for the UI layer.
    pub fn summary_json(&self) -> String {
        serde_json::to_string(&self.summary()).unwrap_or_else(|_| "{}".to_string())
    }

    // ========================================================================
    // Splits
    // ========================================================================

    /// Seconds since start at which each point was reached.
    fn elapsed_times(&self) -> Vec<f64> {
        let n = self.path.len();
        if let Some(times) = &self.point_times {
            return times
                .iter()
                .map(|&t| (t - self.start_time) as f64)
                .collect();
        }
        if n < 2 {
            return vec![0.0; n];
        }

        let duration = self.duration as f64;
        if self.distance <= 0.0 {
            // Nothing moved: spread time evenly over the points
            return (0..n)
                .map(|i| duration * i as f64 / (n - 1) as f64)
                .collect();
        }

        let mut elapsed = Vec::with_capacity(n);
        let mut covered = 0.0;
        elapsed.push(0.0);
        for d in self.path.segment_distances() {
            covered += d;
            elapsed.push(duration * covered / self.distance);
        }
        elapsed
    }

    /// One split per original segment between consecutive points.
    pub fn segment_splits(&self) -> Vec<Split> {
        let times = self.elapsed_times();
        self.path
            .segment_distances()
            .into_iter()
            .enumerate()
            .map(|(i, d)| Split::new(i, d, times[i + 1] - times[i], i, i + 1))
            .collect()
    }

    /// Splits of one kilometer each; the last one may be shorter.
    pub fn kilometer_splits(&self) -> Vec<Split> {
        self.splits(&SplitConfig::default())
    }

    /// Fixed-distance splits. Boundaries falling inside a segment are
    /// interpolated linearly in both distance and time.
    ///
    /// Empty when the split length is not finite or shorter than
    /// [`MIN_SPLIT_DISTANCE`].
    pub fn splits(&self, config: &SplitConfig) -> Vec<Split> {
        let split_distance = config.split_distance;
        if !(split_distance.is_finite() && split_distance >= MIN_SPLIT_DISTANCE) {
            log::warn!("[Run] Ignoring split distance {}", split_distance);
            return Vec::new();
        }

        let times = self.elapsed_times();
        let segments = self.path.segment_distances();

        let mut splits = Vec::new();
        let mut covered = 0.0;
        let mut next_boundary = split_distance;
        let mut split_start_distance = 0.0;
        let mut split_start_time = 0.0;
        let mut split_start_index = 0;

        for (i, &seg) in segments.iter().enumerate() {
            let (t0, t1) = (times[i], times[i + 1]);

            while seg > 0.0 && covered + seg >= next_boundary {
                let ratio = (next_boundary - covered) / seg;
                let boundary_time = t0 + ratio * (t1 - t0);
                splits.push(Split::new(
                    splits.len(),
                    next_boundary - split_start_distance,
                    boundary_time - split_start_time,
                    split_start_index,
                    i + 1,
                ));
                split_start_distance = next_boundary;
                split_start_time = boundary_time;
                split_start_index = i;
                next_boundary += split_distance;
            }

            covered += seg;
        }

        let remaining = covered - split_start_distance;
        if remaining > 1e-9 {
            let end_time = times.last().copied().unwrap_or(0.0);
            splits.push(Split::new(
                splits.len(),
                remaining,
                end_time - split_start_time,
                split_start_index,
                segments.len(),
            ));
        }

        splits
    }
}

impl TryFrom<RunRecord> for Run {
    type Error = SketchError;

    fn try_from(record: RunRecord) -> Result<Self> {
        match record.point_times {
            Some(times) => Self::with_point_times(record.path, times),
            None => Self::new(record.path, record.start_time, record.end_time),
        }
    }
}

impl From<Run> for RunRecord {
    fn from(run: Run) -> Self {
        RunRecord {
            path: run.path,
            start_time: run.start_time,
            end_time: run.end_time,
            point_times: run.point_times,
        }
    }
}
