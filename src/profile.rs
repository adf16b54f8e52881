//! The learner profile and its progression state machine.
//!
//! The profile is the single piece of durable mutable state. It is read once
//! at startup and owned in memory afterwards; every mutation rewrites the
//! whole record to storage before returning (write-through, no partial-field
//! writes). An empty name means no active session and gates every protected
//! operation.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::domain::{Difficulty, UserProfile};
use crate::storage::{KvStore, PROFILE_KEY};

#[derive(Clone)]
pub struct ProfileStore {
    current: Arc<RwLock<UserProfile>>,
    storage: KvStore,
}

impl ProfileStore {
    /// Load the persisted profile, silently degrading to defaults when the
    /// key is absent or unparsable.
    #[instrument(level = "info", skip_all)]
    pub async fn load(storage: KvStore) -> Self {
        let profile = match storage.get(PROFILE_KEY).await {
            Some(json) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(p) => {
                    info!(target: "sql_arena", name = %p.name, score = p.score, difficulty = %p.difficulty, "Loaded saved profile");
                    p
                }
                Err(e) => {
                    warn!(target: "sql_arena", error = %e, "Saved profile unreadable; starting fresh");
                    UserProfile::default()
                }
            },
            None => UserProfile::default(),
        };
        Self {
            current: Arc::new(RwLock::new(profile)),
            storage,
        }
    }

    pub async fn get(&self) -> UserProfile {
        self.current.read().await.clone()
    }

    /// Onboarding: set name and difficulty directly. Score and streak are
    /// kept so a returning learner re-entering their name keeps progress.
    #[instrument(level = "info", skip(self), fields(%name, %difficulty))]
    pub async fn set_identity(&self, name: String, difficulty: Difficulty) -> UserProfile {
        let mut current = self.current.write().await;
        current.name = name;
        current.difficulty = difficulty;
        let snapshot = current.clone();
        drop(current);
        self.write_through(&snapshot).await;
        snapshot
    }

    /// Applies a correct grading: score grows by `points`, streak by one.
    /// Difficulty is untouched.
    #[instrument(level = "info", skip(self), fields(points))]
    pub async fn record_correct_answer(&self, points: u32) -> UserProfile {
        let mut current = self.current.write().await;
        current.score += points;
        current.streak += 1;
        let snapshot = current.clone();
        drop(current);
        self.write_through(&snapshot).await;
        snapshot
    }

    /// Move one step up the ladder. A no-op at Expert.
    #[instrument(level = "info", skip(self))]
    pub async fn level_up(&self) -> UserProfile {
        let mut current = self.current.write().await;
        match current.difficulty.next() {
            Some(next) => {
                info!(target: "sql_arena", from = %current.difficulty, to = %next, "Difficulty level up");
                current.difficulty = next;
            }
            None => {
                info!(target: "sql_arena", "Already at Expert; level up ignored");
            }
        }
        let snapshot = current.clone();
        drop(current);
        self.write_through(&snapshot).await;
        snapshot
    }

    /// Back to the zero/default state; the persisted copy is removed.
    #[instrument(level = "info", skip(self))]
    pub async fn reset(&self) -> UserProfile {
        let mut current = self.current.write().await;
        *current = UserProfile::default();
        let snapshot = current.clone();
        drop(current);
        self.storage.remove(PROFILE_KEY).await;
        snapshot
    }

    async fn write_through(&self, profile: &UserProfile) {
        match serde_json::to_string(profile) {
            Ok(json) => self.storage.set(PROFILE_KEY, &json).await,
            Err(e) => warn!(target: "sql_arena", error = %e, "Failed to serialize profile"),
        }
    }
}
