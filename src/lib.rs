//! # runsketch
//!
//! Core logic for a GPS drawing app: users draw shapes by running, the
//! drawing is scored against geometric templates, runs are stored with
//! their performance figures, and users compete in tournaments where posts
//! are voted on.
//!
//! This library provides:
//! - Run metrics (haversine distance, duration, speed, calories, splits)
//! - Shape scoring of a drawn path against templates
//! - Tournaments, posts and a per-voter up/down vote ledger
//! - Feed partitioning for the tournament screens
//! - A document store abstraction with in-memory and SQLite backends
//!
//! ## Features
//!
//! - **`parallel`** - Score drawings against all templates with rayon
//! - **`persistence`** - SQLite-backed document store
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use runsketch::{GpsPoint, Path, Run, TournamentPost};
//!
//! let path = Path::from_points(vec![
//!     GpsPoint::new(40.7829, -73.9654),
//!     GpsPoint::new(40.7851, -73.9630),
//!     GpsPoint::new(40.7870, -73.9601),
//! ]);
//! let run = Run::new(path, 1_700_000_000, 1_700_000_300).unwrap();
//! println!("{:.0} m at {:.2} m/s", run.distance(), run.average_speed());
//!
//! let mut post = TournamentPost::new("post-1", "alice", run, 1_700_000_400);
//! post.upvote("bob");
//! assert_eq!(post.vote_count(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SketchError};

// Geographic utilities (distance, bounds, offsets)
pub mod geo_utils;

// Drawn paths and run metrics
pub mod path;
pub use path::Path;

pub mod run;
pub use run::{Run, RunSummary, Split, SplitConfig, CALORIES_PER_KM, MIN_SPLIT_DISTANCE};

// Drawing vs template comparison (AMD-based)
pub mod matching;

// Shape templates and scoring
pub mod shape;
pub use shape::{best_shape, score_shape, ShapeConfig, ShapeKind, ShapeScore};

// Posts and the vote ledger
pub mod post;
pub use post::{Ballot, TournamentPost};

// Tournaments
pub mod tournament;
pub use tournament::{Tournament, TournamentBuilder, TournamentStatus, Visibility};

// Feed partitioning for the tournament screens
pub mod feed;
pub use feed::{TournamentFeed, ViewerContext};

// Users, friends and chat
pub mod social;
pub use social::{befriend, conversation_id, unfriend, ChatMessage, Conversation, UserProfile};

// Document store abstraction
pub mod store;
pub use store::{Document, DocumentStore, MemoryStore};

#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteStore;

// Explicit application state (replaces global caches)
pub mod state;
pub use state::AppState;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RunSketchRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

/// Current wall-clock time in epoch seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// Core Types
// ============================================================================

/// One GPS fix, in decimal degrees.
///
/// ```
/// use runsketch::GpsPoint;
/// let eiffel_tower = GpsPoint::new(48.8584, 2.2945);
/// assert!(eiffel_tower.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within [-90, 90] x [-180, 180]. Receivers report NaN or
    /// zeroed fixes before they lock on, so paths filter with this.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Latitude/longitude box around a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Smallest box containing every point, `None` for no points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let start = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lng: first.longitude,
            max_lng: first.longitude,
        };
        Some(rest.iter().fold(start, |b, p| Self {
            min_lat: b.min_lat.min(p.latitude),
            max_lat: b.max_lat.max(p.latitude),
            min_lng: b.min_lng.min(p.longitude),
            max_lng: b.max_lng.max(p.longitude),
        }))
    }

    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            self.min_lat + (self.max_lat - self.min_lat) / 2.0,
            self.min_lng + (self.max_lng - self.min_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fixes() {
        assert!(GpsPoint::new(-33.8568, 151.2153).is_valid());
        assert!(GpsPoint::new(90.0, -180.0).is_valid());
        for bad in [(90.5, 0.0), (0.0, -180.5), (f64::NAN, 10.0), (10.0, f64::INFINITY)] {
            assert!(!GpsPoint::new(bad.0, bad.1).is_valid(), "{:?}", bad);
        }
    }

    #[test]
    fn test_bounds_center() {
        let bounds = Bounds::from_points(&[
            GpsPoint::new(10.0, 20.0),
            GpsPoint::new(12.0, 24.0),
            GpsPoint::new(11.0, 21.0),
        ])
        .unwrap();
        assert_eq!(bounds.min_lat, 10.0);
        assert_eq!(bounds.max_lng, 24.0);
        assert_eq!(bounds.center(), GpsPoint::new(11.0, 22.0));
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_now_is_recent() {
        // 2023-11-14
        assert!(now() > 1_700_000_000);
    }
}
