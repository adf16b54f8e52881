//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic. Protected endpoints require an onboarded profile (non-empty name).

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  Json,
};
use tracing::{info, instrument, warn};

use crate::curriculum::{topic_by_id, TOPICS};
use crate::domain::{LeaderboardEntry, UserProfile};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorOut>);

fn unauthorized() -> ApiError {
  (
    StatusCode::UNAUTHORIZED,
    Json(ErrorOut { message: "No active session. Complete onboarding first.".into() }),
  )
}

fn not_found(message: &str) -> ApiError {
  (StatusCode::NOT_FOUND, Json(ErrorOut { message: message.into() }))
}

/// Gate for the protected views: quiz, theory, leaderboard.
async fn require_profile(state: &AppState) -> Result<UserProfile, ApiError> {
  let profile = state.profile.get().await;
  if profile.name.is_empty() {
    warn!(target: "sql_arena", "Rejected protected request: no active session");
    Err(unauthorized())
  } else {
    Ok(profile)
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info")]
pub async fn http_get_topics() -> Json<Vec<TopicOut>> {
  Json(TOPICS.iter().map(topic_out).collect())
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_profile(State(state): State<Arc<AppState>>) -> Json<ProfileOut> {
  Json(profile_out(&state.profile.get().await))
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name, difficulty = %body.difficulty))]
pub async fn http_post_profile(
  State(state): State<Arc<AppState>>,
  Json(body): Json<IdentityIn>,
) -> Json<ProfileOut> {
  let profile = state.profile.set_identity(body.name, body.difficulty).await;
  info!(target: "sql_arena", name = %profile.name, "Profile onboarded");
  Json(profile_out(&profile))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_level_up(State(state): State<Arc<AppState>>) -> Json<ProfileOut> {
  Json(profile_out(&state.profile.level_up().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reset(State(state): State<Arc<AppState>>) -> Json<ProfileOut> {
  let profile = state.profile.reset().await;
  info!(target: "sql_arena", "Profile reset");
  Json(profile_out(&profile))
}

#[instrument(level = "info", skip(state), fields(topic = %q.topic.clone().unwrap_or_else(|| "sql_general".into())))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<QuestionOut>, ApiError> {
  let profile = require_profile(&state).await?;
  let topic = q.topic.unwrap_or_else(|| "sql_general".into());
  let (question, generation, origin) = state.provide_question(&topic, profile.difficulty).await;
  info!(target: "quiz", %topic, id = %question.id, %origin, "HTTP question served");
  Ok(Json(question_out(&question, generation)))
}

#[instrument(level = "info", skip(state, body), fields(%body.question_id, query_len = body.query.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  require_profile(&state).await?;
  match logic::submit_query(&state, &body.question_id, &body.query).await {
    Some(outcome) => Ok(Json(submit_out(&outcome))),
    None => Err(not_found("Unknown question id")),
  }
}

#[instrument(level = "info", skip(state), fields(topic = %q.topic, refresh = q.refresh))]
pub async fn http_get_theory(
  State(state): State<Arc<AppState>>,
  Query(q): Query<TheoryQuery>,
) -> Result<Json<TheoryOut>, ApiError> {
  require_profile(&state).await?;
  let Some(topic) = topic_by_id(&q.topic) else {
    return Err(not_found("Topic not found"));
  };
  let content = logic::get_theory(&state, topic.id, topic.title, q.refresh).await;
  Ok(Json(TheoryOut { topic_id: topic.id.to_string(), content }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
  let profile = require_profile(&state).await?;
  Ok(Json(logic::leaderboard(&profile)))
}
