//! Feed partitioning for the tournament screens.
//!
//! The tournament list is split into three disjoint groups for a viewer:
//!
//! - **yours**: tournaments the viewer participates in
//! - **starting soon**: not started yet, visible, not joined
//! - **discover**: already running, visible, not joined
//!
//! Tournaments that have ended never appear in any group. Posts shown in
//! the feed come from the viewer's tournaments, or from a single selected
//! tournament.

use serde::{Deserialize, Serialize};

use crate::{Tournament, TournamentPost};

/// Who is looking at the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerContext {
    pub user_id: String,
    /// The viewer's friend ids, used for friends-only visibility
    pub friends: Vec<String>,
}

impl ViewerContext {
    pub fn new(user_id: impl Into<String>, friends: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            friends,
        }
    }

    fn can_see(&self, tournament: &Tournament) -> bool {
        tournament.is_visible_to(&self.user_id, &self.friends)
    }
}

/// Tournament ids grouped for the list screens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentFeed {
    /// Joined and not ended, soonest ending first
    pub yours: Vec<String>,
    /// Not started, soonest starting first
    pub starting_soon: Vec<String>,
    /// Running, soonest ending first
    pub discover: Vec<String>,
    /// The time the feed was computed for
    pub computed_at: i64,
}

impl TournamentFeed {
    /// Partition `tournaments` for `viewer` at time `now`.
    pub fn build<'a, I>(viewer: &ViewerContext, tournaments: I, now: i64) -> Self
    where
        I: IntoIterator<Item = &'a Tournament>,
    {
        let mut yours: Vec<&Tournament> = Vec::new();
        let mut starting_soon: Vec<&Tournament> = Vec::new();
        let mut discover: Vec<&Tournament> = Vec::new();

        for t in tournaments {
            if t.has_ended(now) {
                continue;
            }
            if t.is_participant(&viewer.user_id) {
                yours.push(t);
            } else if !viewer.can_see(t) {
                continue;
            } else if t.has_started(now) {
                discover.push(t);
            } else {
                starting_soon.push(t);
            }
        }

        yours.sort_by(|a, b| a.end_time().cmp(&b.end_time()).then(a.id().cmp(b.id())));
        starting_soon.sort_by(|a, b| a.start_time().cmp(&b.start_time()).then(a.id().cmp(b.id())));
        discover.sort_by(|a, b| a.end_time().cmp(&b.end_time()).then(a.id().cmp(b.id())));

        let ids = |list: Vec<&Tournament>| -> Vec<String> {
            list.iter().map(|t| t.id().to_string()).collect()
        };

        Self {
            yours: ids(yours),
            starting_soon: ids(starting_soon),
            discover: ids(discover),
            computed_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.yours.is_empty() && self.starting_soon.is_empty() && self.discover.is_empty()
    }

    /// Feed as JSON for the UI layer.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Posts the viewer should see, newest first.
///
/// Without a filter this is every post of every tournament the viewer
/// participates in. With `tournament_filter` it is the posts of that one
/// tournament, provided the viewer can see it.
pub fn visible_posts<'a, I>(
    viewer: &ViewerContext,
    tournaments: I,
    tournament_filter: Option<&str>,
) -> Vec<&'a TournamentPost>
where
    I: IntoIterator<Item = &'a Tournament>,
{
    let mut posts: Vec<&TournamentPost> = tournaments
        .into_iter()
        .filter(|t| match tournament_filter {
            Some(id) => t.id() == id && viewer.can_see(t),
            None => t.is_participant(&viewer.user_id),
        })
        .flat_map(|t| t.posts().iter())
        .collect();

    posts.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then(a.id().cmp(b.id()))
    });
    posts
}
