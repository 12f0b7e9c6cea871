//! Tournament posts and the vote ledger.
//!
//! Every voter holds at most one ballot per post, either up (+1) or down
//! (−1); no entry means no vote. The post keeps an aggregate tally that
//! always equals the sum of the ballots. The tally is private and only
//! moves through [`TournamentPost::upvote`] and [`TournamentPost::downvote`].
//!
//! Per (post, voter) the ledger is a three state machine:
//!
//! | current  | upvote      | downvote    |
//! |----------|-------------|-------------|
//! | none (0) | +1 → up     | −1 → down   |
//! | up (+1)  | no-op       | −2 → down   |
//! | down (−1)| +2 → up     | no-op       |
//!
//! A ballot cannot be taken back to "none".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Run;

/// A voter's current ballot on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Ballot {
    Up,
    Down,
}

impl Ballot {
    /// Contribution of this ballot to the tally.
    pub fn value(self) -> i64 {
        match self {
            Ballot::Up => 1,
            Ballot::Down => -1,
        }
    }
}

impl From<Ballot> for i8 {
    fn from(ballot: Ballot) -> Self {
        ballot.value() as i8
    }
}

impl TryFrom<i8> for Ballot {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Ballot::Up),
            -1 => Ok(Ballot::Down),
            other => Err(format!("ballot must be 1 or -1, got {}", other)),
        }
    }
}

/// Stored form of a post. The tally is written for readers of the raw
/// document but is recomputed from the ballots when a post is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostRecord {
    id: String,
    user_id: String,
    run: Run,
    created_at: i64,
    #[serde(default)]
    vote_count: i64,
    #[serde(default)]
    votes: HashMap<String, Ballot>,
}

/// A user's run submitted to a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PostRecord", into = "PostRecord")]
pub struct TournamentPost {
    id: String,
    user_id: String,
    run: Run,
    created_at: i64,
    vote_count: i64,
    votes: HashMap<String, Ballot>,
}

impl TournamentPost {
    /// Create a post with no votes.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, run: Run, created_at: i64) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            run,
            created_at,
            vote_count: 0,
            votes: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Aggregate tally of all ballots.
    pub fn vote_count(&self) -> i64 {
        self.vote_count
    }

    /// Current ballot value for `voter`: 1, −1, or 0 when they have not voted.
    pub fn ballot(&self, voter: &str) -> i64 {
        self.votes.get(voter).map_or(0, |b| b.value())
    }

    /// All ballots by voter id.
    pub fn votes(&self) -> &HashMap<String, Ballot> {
        &self.votes
    }

    /// Cast or switch to an up vote. Returns the change applied to the tally
    /// (0 when the voter had already voted up).
    pub fn upvote(&mut self, voter: &str) -> i64 {
        self.cast(voter, Ballot::Up)
    }

    /// Cast or switch to a down vote. Returns the change applied to the
    /// tally (0 when the voter had already voted down).
    pub fn downvote(&mut self, voter: &str) -> i64 {
        self.cast(voter, Ballot::Down)
    }

    fn cast(&mut self, voter: &str, ballot: Ballot) -> i64 {
        let old = self.ballot(voter);
        if old == ballot.value() {
            return 0;
        }

        let delta = ballot.value() - old;
        self.vote_count += delta;
        self.votes.insert(voter.to_string(), ballot);
        log::debug!(
            "[Post] {} voted {:?} on {} ({:+}), tally {}",
            voter,
            ballot,
            self.id,
            delta,
            self.vote_count
        );
        delta
    }
}

impl From<PostRecord> for TournamentPost {
    fn from(record: PostRecord) -> Self {
        let tally: i64 = record.votes.values().map(|b| b.value()).sum();
        if tally != record.vote_count {
            log::warn!(
                "[Post] Stored tally {} for {} disagrees with ballots ({}), using ballots",
                record.vote_count,
                record.id,
                tally
            );
        }
        Self {
            id: record.id,
            user_id: record.user_id,
            run: record.run,
            created_at: record.created_at,
            vote_count: tally,
            votes: record.votes,
        }
    }
}

impl From<TournamentPost> for PostRecord {
    fn from(post: TournamentPost) -> Self {
        PostRecord {
            id: post.id,
            user_id: post.user_id,
            run: post.run,
            created_at: post.created_at,
            vote_count: post.vote_count,
            votes: post.votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, Path};

    fn sample_post() -> TournamentPost {
        let path = Path::from_points(vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 0.01)]);
        let run = Run::new(path, 0, 600).unwrap();
        TournamentPost::new("post-1", "carol", run, 700)
    }

    fn ballot_sum(post: &TournamentPost) -> i64 {
        post.votes().values().map(|b| b.value()).sum()
    }

    #[test]
    fn test_upvote_idempotent() {
        let mut post = sample_post();
        assert_eq!(post.upvote("alice"), 1);
        assert_eq!(post.upvote("alice"), 0);
        assert_eq!(post.vote_count(), 1);
    }

    #[test]
    fn test_downvote_idempotent() {
        let mut post = sample_post();
        assert_eq!(post.downvote("alice"), -1);
        assert_eq!(post.downvote("alice"), 0);
        assert_eq!(post.vote_count(), -1);
    }

    #[test]
    fn test_reversal_moves_by_two() {
        let mut post = sample_post();
        post.upvote("alice");
        let after_up = post.vote_count();
        assert_eq!(post.downvote("alice"), -2);
        assert_eq!(post.vote_count(), after_up - 2);
        assert_eq!(post.upvote("alice"), 2);
    }

    #[test]
    fn test_alice_bob_scenario() {
        let mut post = sample_post();
        assert_eq!(post.vote_count(), 0);
        assert!(post.votes().is_empty());

        post.upvote("alice");
        assert_eq!(post.vote_count(), 1);
        post.upvote("alice");
        assert_eq!(post.vote_count(), 1);
        post.downvote("alice");
        assert_eq!(post.vote_count(), -1);
        post.downvote("bob");
        assert_eq!(post.vote_count(), -2);

        assert_eq!(post.ballot("alice"), -1);
        assert_eq!(post.ballot("bob"), -1);
        assert_eq!(post.ballot("dave"), 0);
    }

    #[test]
    fn test_tally_matches_ballots_after_mixed_sequence() {
        let mut post = sample_post();
        let voters = ["a", "b", "c", "d", "e"];
        // Deterministic pseudo-random walk over voters and directions
        let mut state: u32 = 7;
        for _ in 0..200 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let voter = voters[(state >> 8) as usize % voters.len()];
            if (state >> 16) & 1 == 0 {
                post.upvote(voter);
            } else {
                post.downvote(voter);
            }
            assert_eq!(post.vote_count(), ballot_sum(&post));
        }
    }

    #[test]
    fn test_decode_recomputes_tally() {
        let mut post = sample_post();
        post.upvote("alice");
        post.upvote("bob");
        post.downvote("carol");

        let mut value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["vote_count"], 1);
        assert_eq!(value["votes"]["carol"], -1);

        value["vote_count"] = serde_json::json!(42);
        let decoded: TournamentPost = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.vote_count(), 1);
        assert_eq!(decoded, post);
    }

    #[test]
    fn test_invalid_ballot_rejected() {
        assert!(Ballot::try_from(0_i8).is_err());
        assert_eq!(Ballot::try_from(-1_i8), Ok(Ballot::Down));
    }
}
