//! End-to-end tournament flow against the in-memory store.
//!
//! Two users share one store: one creates a tournament, the other joins,
//! runs a circle, posts it and both vote.

use std::f64::consts::PI;

use runsketch::geo_utils::offset_point;
use runsketch::store;
use runsketch::{
    best_shape, AppState, GpsPoint, MemoryStore, Path, Run, ShapeConfig, ShapeKind, Tournament,
    UserProfile,
};

const NOW: i64 = 1_700_000_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A 300 m radius circle run over 20 minutes, one point every 12 seconds.
fn circle_run(start: i64) -> Run {
    let center = GpsPoint::new(48.8566, 2.3522);
    let points: Vec<GpsPoint> = (0..=100)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / 100.0;
            offset_point(&center, 300.0 * a.cos(), 300.0 * a.sin())
        })
        .collect();
    let times: Vec<i64> = (0..=100).map(|i| start + i * 12).collect();
    Run::with_point_times(Path::from_points(points), times).unwrap()
}

fn seeded_store() -> MemoryStore {
    let mut db = MemoryStore::new();
    store::save(&mut db, &UserProfile::new("alice", "Alice")).unwrap();
    store::save(&mut db, &UserProfile::new("bob", "Bob")).unwrap();
    db
}

#[test]
fn test_create_join_post_vote() {
    init_logging();
    let mut db = seeded_store();

    let mut alice = AppState::new("alice");
    alice.refresh(&db).unwrap();
    let builder = alice
        .new_tournament("circles", "Circle Sunday", NOW - 3_600, NOW + 86_400)
        .description("Closest to a circle wins");
    alice.create_tournament(&mut db, builder).unwrap();
    assert_eq!(alice.feed(NOW).yours, vec!["circles"]);

    let mut bob = AppState::new("bob");
    bob.refresh(&db).unwrap();
    assert_eq!(bob.feed(NOW).discover, vec!["circles"]);

    bob.join(&mut db, "circles").unwrap();
    assert_eq!(bob.feed(NOW).yours, vec!["circles"]);
    assert!(bob.feed(NOW).discover.is_empty());

    let run = circle_run(NOW - 1_800);
    let shape = best_shape(run.path(), &ShapeConfig::default()).unwrap();
    assert_eq!(shape.kind, ShapeKind::Circle);
    assert!(run.distance() > 1_800.0 && run.distance() < 1_950.0);
    assert_eq!(run.duration(), 1_200);

    bob.submit_post(&mut db, "circles", "bob-1", run, NOW).unwrap();

    alice.refresh(&db).unwrap();
    assert_eq!(alice.upvote(&mut db, "circles", "bob-1").unwrap(), 1);
    assert_eq!(alice.upvote(&mut db, "circles", "bob-1").unwrap(), 0);
    bob.refresh(&db).unwrap();
    assert_eq!(bob.downvote(&mut db, "circles", "bob-1").unwrap(), -1);

    let stored: Tournament = store::load(&db, "circles").unwrap().unwrap();
    let post = stored.post("bob-1").unwrap();
    assert_eq!(post.vote_count(), 0);
    assert_eq!(post.ballot("alice"), 1);
    assert_eq!(post.ballot("bob"), -1);

    let posts = alice.visible_posts(Some("circles"));
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].user_id(), "bob");
}

#[test]
fn test_ended_tournament_leaves_feed() {
    init_logging();
    let mut db = seeded_store();
    let mut alice = AppState::new("alice");
    alice.refresh(&db).unwrap();

    let builder = alice.new_tournament("short", "Sprint", NOW, NOW + 60);
    alice.create_tournament(&mut db, builder).unwrap();

    assert_eq!(alice.feed(NOW).yours, vec!["short"]);
    assert_eq!(alice.feed(NOW + 59).yours, vec!["short"]);
    assert!(alice.feed(NOW + 60).is_empty());
}

#[test]
fn test_feed_json_shape() {
    init_logging();
    let db = seeded_store();
    let mut alice = AppState::new("alice");
    alice.refresh(&db).unwrap();

    let json: serde_json::Value = serde_json::from_str(&alice.feed_json(NOW)).unwrap();
    assert!(json["yours"].as_array().unwrap().is_empty());
    assert_eq!(json["computed_at"], NOW);
}
