//! # App State
//!
//! Everything the tournament screens need for the signed-in user, owned in
//! one place and passed explicitly to whoever needs it:
//!
//! - Cached user profiles and tournaments, reloaded with [`AppState::refresh`]
//! - The feed partitions, rebuilt lazily when marked dirty
//!
//! Mutations are write-through: the change is applied to a copy, written to
//! the [`DocumentStore`], and only then committed to the cache. A failed
//! write leaves the cache as it was.

use std::collections::{BTreeMap, HashMap};

use crate::error::{OptionExt, Result, SketchError};
use crate::feed::{self, TournamentFeed, ViewerContext};
use crate::store::{self, Document, DocumentStore};
use crate::{Run, Tournament, TournamentBuilder, TournamentPost, UserProfile};

/// Cached state for one signed-in user.
#[derive(Debug, Clone)]
pub struct AppState {
    user_id: String,

    // Cached documents
    profiles: HashMap<String, UserProfile>,
    tournaments: BTreeMap<String, Tournament>,

    // Derived
    feed: TournamentFeed,
    feed_dirty: bool,
}

impl AppState {
    /// Empty state for `user_id`. Call [`AppState::refresh`] to populate.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            profiles: HashMap::new(),
            tournaments: BTreeMap::new(),
            feed: TournamentFeed::default(),
            feed_dirty: true,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The signed-in user's profile, if loaded.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profiles.get(&self.user_id)
    }

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.profiles.get(user_id)
    }

    pub fn tournament(&self, tournament_id: &str) -> Option<&Tournament> {
        self.tournaments.get(tournament_id)
    }

    pub fn tournaments(&self) -> impl Iterator<Item = &Tournament> {
        self.tournaments.values()
    }

    /// The signed-in user as a feed viewer.
    pub fn viewer(&self) -> ViewerContext {
        let friends = self
            .profile()
            .map(|p| p.friends.clone())
            .unwrap_or_default();
        ViewerContext::new(self.user_id.clone(), friends)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the cache with the store's current profiles and tournaments.
    pub fn refresh(&mut self, store: &dyn DocumentStore) -> Result<()> {
        let profiles: Vec<UserProfile> = store::load_all(store)?;
        let tournaments: Vec<Tournament> = store::load_all(store)?;

        self.profiles = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
        self.tournaments = tournaments
            .into_iter()
            .map(|t| (t.id().to_string(), t))
            .collect();
        self.feed_dirty = true;

        log::info!(
            "[AppState] Refreshed: {} profiles, {} tournaments",
            self.profiles.len(),
            self.tournaments.len()
        );
        Ok(())
    }

    /// Mark the feed stale so the next [`AppState::feed`] rebuilds it.
    pub fn invalidate(&mut self) {
        self.feed_dirty = true;
    }

    // ========================================================================
    // Feed
    // ========================================================================

    /// Feed partitions at `now`, rebuilt if stale or computed for another time.
    pub fn feed(&mut self, now: i64) -> &TournamentFeed {
        if self.feed_dirty || self.feed.computed_at != now {
            let viewer = self.viewer();
            self.feed = TournamentFeed::build(&viewer, self.tournaments.values(), now);
            self.feed_dirty = false;
            log::debug!(
                "[AppState] Feed rebuilt: {} yours, {} starting soon, {} discover",
                self.feed.yours.len(),
                self.feed.starting_soon.len(),
                self.feed.discover.len()
            );
        }
        &self.feed
    }

    pub fn feed_json(&mut self, now: i64) -> String {
        self.feed(now).to_json()
    }

    /// Posts for the feed, newest first. See [`feed::visible_posts`].
    pub fn visible_posts(&self, tournament_filter: Option<&str>) -> Vec<&TournamentPost> {
        feed::visible_posts(&self.viewer(), self.tournaments.values(), tournament_filter)
    }

    // ========================================================================
    // Tournament mutations
    // ========================================================================

    /// Builder for a new tournament created by the signed-in user.
    pub fn new_tournament(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        start_time: i64,
        end_time: i64,
    ) -> TournamentBuilder {
        Tournament::builder(id, name, self.user_id.clone(), start_time, end_time)
    }

    /// Build, store and cache a tournament. Fails with
    /// [`SketchError::InvalidTournament`] if the id is already taken, in the
    /// cache or in the store.
    pub fn create_tournament(
        &mut self,
        store: &mut dyn DocumentStore,
        builder: TournamentBuilder,
    ) -> Result<&Tournament> {
        let tournament = builder.build()?;
        let taken = self.tournaments.contains_key(tournament.id())
            || store
                .read(Tournament::COLLECTION, tournament.id())?
                .is_some();
        if taken {
            log::warn!("[AppState] Tournament id {} already exists", tournament.id());
            return Err(SketchError::InvalidTournament {
                message: format!("tournament '{}' already exists", tournament.id()),
            });
        }
        store::save(store, &tournament)?;
        log::info!(
            "[AppState] Created tournament {} ({})",
            tournament.id(),
            tournament.name()
        );

        let id = tournament.id().to_string();
        self.tournaments.insert(id.clone(), tournament);
        self.feed_dirty = true;
        self.tournaments
            .get(&id)
            .ok_or_not_found(Tournament::COLLECTION, &id)
    }

    /// Join a tournament. Returns false if already a participant.
    pub fn join(&mut self, store: &mut dyn DocumentStore, tournament_id: &str) -> Result<bool> {
        let user_id = self.user_id.clone();
        self.update_tournament(store, tournament_id, |t| Ok(t.join(&user_id)))
    }

    /// Leave a tournament. Returns false if not a participant.
    pub fn leave(&mut self, store: &mut dyn DocumentStore, tournament_id: &str) -> Result<bool> {
        let user_id = self.user_id.clone();
        self.update_tournament(store, tournament_id, |t| Ok(t.leave(&user_id)))
    }

    /// Post a run to a tournament the signed-in user participates in.
    pub fn submit_post(
        &mut self,
        store: &mut dyn DocumentStore,
        tournament_id: &str,
        post_id: &str,
        run: Run,
        now: i64,
    ) -> Result<()> {
        let post = TournamentPost::new(post_id, self.user_id.clone(), run, now);
        self.update_tournament(store, tournament_id, |t| t.submit_post(post))
    }

    /// Upvote a post as the signed-in user. Returns the tally change.
    pub fn upvote(
        &mut self,
        store: &mut dyn DocumentStore,
        tournament_id: &str,
        post_id: &str,
    ) -> Result<i64> {
        let voter = self.user_id.clone();
        self.update_tournament(store, tournament_id, |t| t.upvote_post(post_id, &voter))
    }

    /// Downvote a post as the signed-in user. Returns the tally change.
    pub fn downvote(
        &mut self,
        store: &mut dyn DocumentStore,
        tournament_id: &str,
        post_id: &str,
    ) -> Result<i64> {
        let voter = self.user_id.clone();
        self.update_tournament(store, tournament_id, |t| t.downvote_post(post_id, &voter))
    }

    // ========================================================================
    // Friends
    // ========================================================================

    /// Befriend another loaded user, storing both profiles.
    pub fn add_friend(&mut self, store: &mut dyn DocumentStore, friend_id: &str) -> Result<bool> {
        let mut me = self
            .profile()
            .cloned()
            .ok_or_not_found(UserProfile::COLLECTION, &self.user_id)?;
        let mut friend = self
            .user(friend_id)
            .cloned()
            .ok_or_not_found(UserProfile::COLLECTION, friend_id)?;

        if !crate::befriend(&mut me, &mut friend) {
            return Ok(false);
        }
        store::save(store, &me)?;
        store::save(store, &friend)?;
        self.profiles.insert(me.id.clone(), me);
        self.profiles.insert(friend.id.clone(), friend);
        self.feed_dirty = true;
        Ok(true)
    }

    /// Apply `f` to a copy of a cached tournament, store it, then commit.
    fn update_tournament<T, F>(
        &mut self,
        store: &mut dyn DocumentStore,
        tournament_id: &str,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Tournament) -> Result<T>,
    {
        let mut tournament = self
            .tournaments
            .get(tournament_id)
            .cloned()
            .ok_or_not_found(Tournament::COLLECTION, tournament_id)?;

        let out = f(&mut tournament)?;
        store::save(store, &tournament)?;
        self.tournaments
            .insert(tournament_id.to_string(), tournament);
        self.feed_dirty = true;
        Ok(out)
    }
}
