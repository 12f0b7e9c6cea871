//! Tournaments: time-boxed events users join and post runs to.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, SketchError};
use crate::TournamentPost;

/// Who can find a tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Public,
    FriendsOnly,
}

/// Lifecycle of a tournament relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// `now < start_time`
    Upcoming,
    /// `start_time <= now < end_time`
    Active,
    /// `now >= end_time`
    Ended,
}

/// Stored form, validated on load.
#[derive(Debug, Clone, Deserialize)]
struct TournamentRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    creator_id: String,
    start_time: i64,
    end_time: i64,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    participants: Vec<String>,
    #[serde(default)]
    posts: Vec<TournamentPost>,
}

/// A time-boxed event with participants and their posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TournamentRecord")]
pub struct Tournament {
    id: String,
    name: String,
    description: String,
    creator_id: String,
    start_time: i64,
    end_time: i64,
    visibility: Visibility,
    participants: Vec<String>,
    posts: Vec<TournamentPost>,
}

impl Tournament {
    /// Start building a tournament. See [`TournamentBuilder`] for defaults.
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        creator_id: impl Into<String>,
        start_time: i64,
        end_time: i64,
    ) -> TournamentBuilder {
        TournamentBuilder::new(id, name, creator_id, start_time, end_time)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn posts(&self) -> &[TournamentPost] {
        &self.posts
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn status(&self, now: i64) -> TournamentStatus {
        if now < self.start_time {
            TournamentStatus::Upcoming
        } else if now < self.end_time {
            TournamentStatus::Active
        } else {
            TournamentStatus::Ended
        }
    }

    pub fn has_started(&self, now: i64) -> bool {
        now >= self.start_time
    }

    pub fn has_ended(&self, now: i64) -> bool {
        now >= self.end_time
    }

    // ========================================================================
    // Membership
    // ========================================================================

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Add `user_id` to the participants. Returns false if already a member.
    pub fn join(&mut self, user_id: &str) -> bool {
        if self.is_participant(user_id) {
            return false;
        }
        self.participants.push(user_id.to_string());
        true
    }

    /// Remove `user_id` from the participants. Returns false if not a member.
    pub fn leave(&mut self, user_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != user_id);
        self.participants.len() != before
    }

    /// Whether `viewer` may see this tournament.
    ///
    /// Public tournaments are visible to everyone. Friends-only tournaments
    /// are visible to their creator, their participants, and friends of the
    /// creator (`viewer_friends` is the viewer's friend list).
    pub fn is_visible_to(&self, viewer: &str, viewer_friends: &[String]) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::FriendsOnly => {
                self.creator_id == viewer
                    || self.is_participant(viewer)
                    || viewer_friends.iter().any(|f| *f == self.creator_id)
            }
        }
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Add a post. Only participants can post, and post ids are unique
    /// within a tournament.
    pub fn submit_post(&mut self, post: TournamentPost) -> Result<()> {
        if !self.is_participant(post.user_id()) {
            return Err(SketchError::NotParticipant {
                group_id: self.id.clone(),
                user_id: post.user_id().to_string(),
            });
        }
        if self.post(post.id()).is_some() {
            return Err(SketchError::InvalidTournament {
                message: format!("post '{}' already exists in '{}'", post.id(), self.id),
            });
        }
        self.posts.push(post);
        Ok(())
    }

    pub fn post(&self, post_id: &str) -> Option<&TournamentPost> {
        self.posts.iter().find(|p| p.id() == post_id)
    }

    pub fn post_mut(&mut self, post_id: &str) -> Option<&mut TournamentPost> {
        self.posts.iter_mut().find(|p| p.id() == post_id)
    }

    /// Upvote a post in this tournament; returns the tally change.
    pub fn upvote_post(&mut self, post_id: &str, voter: &str) -> Result<i64> {
        let post = self.post_mut(post_id).ok_or_not_found("posts", post_id)?;
        Ok(post.upvote(voter))
    }

    /// Downvote a post in this tournament; returns the tally change.
    pub fn downvote_post(&mut self, post_id: &str, voter: &str) -> Result<i64> {
        let post = self.post_mut(post_id).ok_or_not_found("posts", post_id)?;
        Ok(post.downvote(voter))
    }

    /// Posts ranked by tally, ties broken by earlier submission.
    pub fn leaderboard(&self) -> Vec<&TournamentPost> {
        let mut ranked: Vec<&TournamentPost> = self.posts.iter().collect();
        ranked.sort_by(|a, b| {
            b.vote_count()
                .cmp(&a.vote_count())
                .then(a.created_at().cmp(&b.created_at()))
        });
        ranked
    }
}

impl TryFrom<TournamentRecord> for Tournament {
    type Error = SketchError;

    fn try_from(record: TournamentRecord) -> Result<Self> {
        let mut builder = TournamentBuilder::new(
            record.id,
            record.name,
            record.creator_id,
            record.start_time,
            record.end_time,
        )
        .description(record.description)
        .visibility(record.visibility)
        .include_creator(false);
        for participant in record.participants {
            builder = builder.participant(participant);
        }
        let mut tournament = builder.build()?;

        // Authors who have since left keep their posts, so only ids are checked
        let mut seen = HashSet::new();
        if let Some(dup) = record.posts.iter().find(|p| !seen.insert(p.id())) {
            return Err(SketchError::InvalidTournament {
                message: format!("post '{}' appears twice in '{}'", dup.id(), tournament.id),
            });
        }
        tournament.posts = record.posts;
        Ok(tournament)
    }
}

/// Builder for [`Tournament`].
///
/// Required: id, name, creator, start and end time. Optional fields and
/// their defaults:
///
/// | field             | default    |
/// |-------------------|------------|
/// | `description`     | empty      |
/// | `visibility`      | `Public`   |
/// | `participants`    | none       |
/// | `include_creator` | `true`     |
///
/// With `include_creator` the creator is added as the first participant,
/// which is what the creation form does.
#[derive(Debug, Clone)]
pub struct TournamentBuilder {
    id: String,
    name: String,
    creator_id: String,
    start_time: i64,
    end_time: i64,
    description: String,
    visibility: Visibility,
    participants: Vec<String>,
    include_creator: bool,
}

impl TournamentBuilder {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        creator_id: impl Into<String>,
        start_time: i64,
        end_time: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creator_id: creator_id.into(),
            start_time,
            end_time,
            description: String::new(),
            visibility: Visibility::Public,
            participants: Vec::new(),
            include_creator: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn participant(mut self, user_id: impl Into<String>) -> Self {
        self.participants.push(user_id.into());
        self
    }

    pub fn include_creator(mut self, include: bool) -> Self {
        self.include_creator = include;
        self
    }

    /// Fails with [`SketchError::InvalidTournament`] unless
    /// `end_time > start_time` and the id is non-empty.
    pub fn build(self) -> Result<Tournament> {
        if self.id.is_empty() {
            return Err(SketchError::InvalidTournament {
                message: "id must not be empty".to_string(),
            });
        }
        if self.end_time <= self.start_time {
            return Err(SketchError::InvalidTournament {
                message: format!(
                    "'{}' ends at {} but starts at {}",
                    self.id, self.end_time, self.start_time
                ),
            });
        }

        let mut tournament = Tournament {
            id: self.id,
            name: self.name,
            description: self.description,
            creator_id: self.creator_id,
            start_time: self.start_time,
            end_time: self.end_time,
            visibility: self.visibility,
            participants: Vec::new(),
            posts: Vec::new(),
        };

        if self.include_creator {
            let creator = tournament.creator_id.clone();
            tournament.join(&creator);
        }
        for participant in &self.participants {
            tournament.join(participant);
        }

        Ok(tournament)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, Path, Run};

    fn sample_tournament() -> Tournament {
        Tournament::builder("t-1", "Sunday Circles", "alice", 1_000, 2_000)
            .description("Draw the roundest circle")
            .build()
            .unwrap()
    }

    fn post(id: &str, user: &str, at: i64) -> TournamentPost {
        let path = Path::from_points(vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 0.01)]);
        TournamentPost::new(id, user, Run::new(path, at - 600, at).unwrap(), at)
    }

    #[test]
    fn test_builder_defaults() {
        let t = sample_tournament();
        assert_eq!(t.visibility(), Visibility::Public);
        assert_eq!(t.participants(), &["alice".to_string()]);
        assert!(t.posts().is_empty());

        let t = Tournament::builder("t-2", "No creator", "alice", 0, 1)
            .include_creator(false)
            .participant("bob")
            .participant("bob")
            .build()
            .unwrap();
        assert_eq!(t.participants(), &["bob".to_string()]);
    }

    #[test]
    fn test_end_must_follow_start() {
        for (start, end) in [(10, 10), (10, 5)] {
            let result = Tournament::builder("t", "bad", "alice", start, end).build();
            assert!(matches!(result, Err(SketchError::InvalidTournament { .. })));
        }
    }

    #[test]
    fn test_status() {
        let t = sample_tournament();
        assert_eq!(t.status(999), TournamentStatus::Upcoming);
        assert_eq!(t.status(1_000), TournamentStatus::Active);
        assert_eq!(t.status(1_999), TournamentStatus::Active);
        assert_eq!(t.status(2_000), TournamentStatus::Ended);
    }

    #[test]
    fn test_join_leave() {
        let mut t = sample_tournament();
        assert!(t.join("bob"));
        assert!(!t.join("bob"));
        assert!(t.is_participant("bob"));
        assert!(t.leave("bob"));
        assert!(!t.leave("bob"));
        assert!(!t.is_participant("bob"));
    }

    #[test]
    fn test_friends_only_visibility() {
        let mut t = Tournament::builder("t-3", "Friends", "alice", 0, 10)
            .visibility(Visibility::FriendsOnly)
            .build()
            .unwrap();

        assert!(t.is_visible_to("alice", &[]));
        assert!(t.is_visible_to("bob", &["alice".to_string()]));
        assert!(!t.is_visible_to("carol", &["bob".to_string()]));

        t.join("carol");
        assert!(t.is_visible_to("carol", &[]));
    }

    #[test]
    fn test_submit_post_requires_membership() {
        let mut t = sample_tournament();
        let result = t.submit_post(post("p-1", "bob", 1_500));
        assert!(matches!(result, Err(SketchError::NotParticipant { .. })));

        t.join("bob");
        t.submit_post(post("p-1", "bob", 1_500)).unwrap();
        let duplicate = t.submit_post(post("p-1", "bob", 1_600));
        assert!(matches!(duplicate, Err(SketchError::InvalidTournament { .. })));
    }

    #[test]
    fn test_leaderboard_order() {
        let mut t = sample_tournament();
        t.join("bob");
        t.submit_post(post("p-1", "alice", 1_100)).unwrap();
        t.submit_post(post("p-2", "bob", 1_200)).unwrap();
        t.submit_post(post("p-3", "bob", 1_300)).unwrap();

        t.upvote_post("p-3", "carol").unwrap();
        t.upvote_post("p-3", "dave").unwrap();
        t.upvote_post("p-2", "carol").unwrap();
        t.downvote_post("p-1", "carol").unwrap();
        assert!(t.upvote_post("missing", "carol").is_err());

        let ids: Vec<&str> = t.leaderboard().into_iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["p-3", "p-2", "p-1"]);
    }

    #[test]
    fn test_decode_validates() {
        let t = sample_tournament();
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"PUBLIC\""));
        let decoded: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, t);

        let bad = r#"{"id":"t","name":"x","creator_id":"a","start_time":5,"end_time":5}"#;
        assert!(serde_json::from_str::<Tournament>(bad).is_err());
    }

    #[test]
    fn test_decode_rejects_duplicate_post_ids() {
        let mut t = sample_tournament();
        t.join("bob");
        t.submit_post(post("p-1", "bob", 1_500)).unwrap();

        let mut value = serde_json::to_value(&t).unwrap();
        let posts = value["posts"].as_array_mut().unwrap();
        let copy = posts[0].clone();
        posts.push(copy);
        let result = serde_json::from_value::<Tournament>(value);
        assert!(result.is_err());

        // A post outlives its author's membership
        t.leave("bob");
        let json = serde_json::to_string(&t).unwrap();
        let decoded: Tournament = serde_json::from_str(&json).unwrap();
        assert!(decoded.post("p-1").is_some());
        assert!(!decoded.is_participant("bob"));
    }
}
