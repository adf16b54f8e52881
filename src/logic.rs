//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Grading submissions (AI verdict, canned ungraded fallback on error)
//!   - Applying verdicts to the learner profile (score only when correct)
//!   - Theory resolution (static page, cached copy, fresh AI generation)
//!   - Leaderboard merging (mock roster + live profile, ranks recomputed)

use tracing::{error, info, instrument};

use crate::bank::{mock_leaderboard, ungraded_result, THEORY_ERROR};
use crate::curriculum::context_for;
use crate::domain::{EvaluationResult, LeaderboardEntry, UserProfile};
use crate::state::AppState;
use crate::storage::theory_key;

/// Everything a view needs after a submission: the verdict, the profile as
/// it stands after any score application, and whether a newer question was
/// drawn while this grade was outstanding.
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
  pub result: EvaluationResult,
  pub profile: UserProfile,
  pub stale: bool,
}

/// Grade a submitted query against the question it was drawn for.
/// Returns None only for an unknown question id; provider errors surface as
/// the canned ungraded result, never as an error.
#[instrument(level = "info", skip(state, query), fields(%question_id, query_len = query.len()))]
pub async fn submit_query(state: &AppState, question_id: &str, query: &str) -> Option<SubmitOutcome> {
  // Capture the question at submit time; grading never reads shared
  // mutable "current question" state.
  let served = state.get_question(question_id).await?;
  let question = &served.question;

  let result = if let Some(oa) = &state.openai {
    let curriculum = context_for(&question.topic);
    match oa.evaluate_submission(&state.prompts, question, curriculum, query).await {
      Ok(r) => r,
      Err(e) => {
        error!(target: "quiz", id = %question.id, error = %e, "Grading failed; returning ungraded result");
        ungraded_result()
      }
    }
  } else {
    error!(target: "quiz", id = %question.id, "OPENAI_API_KEY not set; returning ungraded result");
    ungraded_result()
  };

  // Score is applied by this caller, not the evaluator, and only on a
  // correct verdict. Negative awards clamp to zero so the profile total
  // stays monotone.
  let profile = if result.is_correct {
    let points = result.score_awarded.round().max(0.0) as u32;
    state.profile.record_correct_answer(points).await
  } else {
    state.profile.get().await
  };

  let stale = !state.is_current(served.generation);
  info!(target: "quiz", id = %question.id, correct = result.is_correct, score = %format!("{:.1}", result.score_awarded), stale, "Submission evaluated");

  Some(SubmitOutcome { result, profile, stale })
}

/// Resolve theory content for a topic.
///
/// Read order (unless `force_refresh`): static page by exact title, then the
/// per-topic cache, then a fresh AI generation. A forced refresh skips both
/// reads but still writes the cache, so it shadows a static page until the
/// cache entry is cleared externally.
#[instrument(level = "info", skip(state), fields(%topic_id, force_refresh))]
pub async fn get_theory(state: &AppState, topic_id: &str, topic_title: &str, force_refresh: bool) -> String {
  if !force_refresh {
    if let Some(text) = state.theory_static.get(topic_title) {
      info!(target: "sql_arena", %topic_id, source = "static", "Theory served");
      return text.to_string();
    }
    if let Some(cached) = state.storage.get(&theory_key(topic_id)).await {
      info!(target: "sql_arena", %topic_id, source = "cache", "Theory served");
      return cached;
    }
  }

  if let Some(oa) = &state.openai {
    let curriculum = context_for(topic_title);
    match oa.theory_deep_dive(&state.prompts, topic_title, curriculum).await {
      Ok(text) => {
        state.storage.set(&theory_key(topic_id), &text).await;
        info!(target: "sql_arena", %topic_id, source = "openai", text_len = text.len(), "Theory generated and cached");
        text
      }
      Err(e) => {
        error!(target: "sql_arena", %topic_id, error = %e, "Theory generation failed");
        THEORY_ERROR.to_string()
      }
    }
  } else {
    error!(target: "sql_arena", %topic_id, "OPENAI_API_KEY not set; theory unavailable");
    THEORY_ERROR.to_string()
  }
}

/// Merge the live profile into the mock roster and recompute ranks.
/// Ranks are 1-based in descending score order; ties keep roster order.
pub fn leaderboard(profile: &UserProfile) -> Vec<LeaderboardEntry> {
  let mut entries = mock_leaderboard();
  entries.push(LeaderboardEntry {
    name: if profile.name.is_empty() { "You".into() } else { profile.name.clone() },
    score: profile.score,
    rank: 0,
    badges: if profile.score > 1000 { vec!["Rising Star".into()] } else { vec![] },
  });
  entries.sort_by(|a, b| b.score.cmp(&a.score));
  for (i, entry) in entries.iter_mut().enumerate() {
    entry.rank = (i + 1) as u32;
  }
  entries
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use axum::{routing::post, Json, Router};

  use crate::domain::Difficulty;
  use crate::openai::OpenAI;
  use crate::profile::ProfileStore;
  use crate::state::AppState;
  use crate::storage::KvStore;

  async fn offline_state() -> AppState {
    let storage = KvStore::in_memory();
    let profile = ProfileStore::load(storage.clone()).await;
    AppState::for_tests(None, storage, profile)
  }

  /// Serve a fixed chat-completion `content` string and count hits.
  async fn spawn_mock_provider(content: &str) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let content = content.to_string();
    let app = Router::new().route(
      "/v1/chat/completions",
      post(move || {
        let hits = hits_in.clone();
        let content = content.clone();
        async move {
          hits.fetch_add(1, Ordering::SeqCst);
          Json(serde_json::json!({
            "choices": [{ "message": { "content": content } }]
          }))
        }
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("mock provider");
    });
    (format!("http://{addr}/v1"), hits)
  }

  fn mock_openai(base_url: String) -> OpenAI {
    OpenAI {
      client: reqwest::Client::new(),
      api_key: "test-key".into(),
      base_url,
      fast_model: "fast-test".into(),
      strong_model: "strong-test".into(),
    }
  }

  async fn mocked_state(content: &str) -> (AppState, Arc<AtomicUsize>) {
    let (base_url, hits) = spawn_mock_provider(content).await;
    let storage = KvStore::in_memory();
    let profile = ProfileStore::load(storage.clone()).await;
    (AppState::for_tests(Some(mock_openai(base_url)), storage, profile), hits)
  }

  #[tokio::test]
  async fn unknown_question_id_yields_none() {
    let state = offline_state().await;
    assert!(submit_query(&state, "missing", "SELECT 1;").await.is_none());
  }

  #[tokio::test]
  async fn provider_failure_returns_the_exact_ungraded_literal() {
    let state = offline_state().await;
    let (q, _, _) = state.provide_question("window_functions", Difficulty::Intermediate).await;
    let out = submit_query(&state, &q.id, "SELECT 1;").await.expect("known question");
    assert_eq!(out.result, ungraded_result());
    // Nothing applied to the profile on an incorrect/ungraded verdict.
    assert_eq!(out.profile.score, 0);
    assert_eq!(out.profile.streak, 0);
  }

  #[tokio::test]
  async fn grades_resolving_after_a_newer_draw_are_flagged_stale() {
    let state = offline_state().await;
    let (q1, _, _) = state.provide_question("subqueries", Difficulty::Beginner).await;
    let (q2, _, _) = state.provide_question("subqueries", Difficulty::Beginner).await;
    let stale = submit_query(&state, &q1.id, "SELECT 1;").await.expect("q1");
    assert!(stale.stale);
    let fresh = submit_query(&state, &q2.id, "SELECT 1;").await.expect("q2");
    assert!(!fresh.stale);
  }

  #[tokio::test]
  async fn correct_verdict_applies_score_and_streak() {
    let verdict = r#"{"isCorrect":true,"scoreAwarded":88,"explanation":"Clean partition usage.","correctQuery":"SELECT ...","optimizationTip":"Index DEPT_ID.","userFeedback":"Nice.","suggestDifficultyIncrease":true}"#;
    let (state, hits) = mocked_state(verdict).await;
    let (q, _, _) = state.provide_question("window_functions", Difficulty::Intermediate).await;

    let out = submit_query(&state, &q.id, "SELECT DENSE_RANK() OVER (...)").await.expect("graded");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(out.result.is_correct);
    assert!(out.result.suggest_difficulty_increase);
    assert_eq!(out.profile.score, 88);
    assert_eq!(out.profile.streak, 1);
  }

  #[tokio::test]
  async fn malformed_verdict_takes_the_same_path_as_a_network_failure() {
    let (state, _) = mocked_state("{\"isCorrect\":true}").await;
    let (q, _, _) = state.provide_question("subqueries", Difficulty::Advanced).await;
    let out = submit_query(&state, &q.id, "SELECT 1;").await.expect("known question");
    assert_eq!(out.result, ungraded_result());
  }

  #[tokio::test]
  async fn bankless_topic_generates_through_the_provider_once() {
    let generated = r#"{"questionText":"Design a disjoint subtype hierarchy.","schemaContext":"Supertype: EMPLOYEE","hints":["Think discriminators","One subtype per instance"]}"#;
    let (state, hits) = mocked_state(generated).await;
    let (q, _, origin) = state.provide_question("data_modeling", Difficulty::Expert).await;
    assert_eq!(origin, "openai_generated");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(q.question_text, "Design a disjoint subtype hierarchy.");
    assert_eq!(q.hints.len(), 2);
  }

  #[tokio::test]
  async fn theory_prefers_the_static_page_and_never_caches_it() {
    let state = offline_state().await;
    let text = get_theory(&state, "window_functions", "Window Functions", false).await;
    assert!(text.contains("# Window Functions"));
    assert_eq!(state.storage.get(&theory_key("window_functions")).await, None);
  }

  #[tokio::test]
  async fn theory_serves_the_cache_without_a_provider() {
    let state = offline_state().await;
    state.storage.set(&theory_key("joins"), "# Cached joins page").await;
    let text = get_theory(&state, "joins", "Joins & Set Operations", false).await;
    assert_eq!(text, "# Cached joins page");
  }

  #[tokio::test]
  async fn theory_failure_returns_error_markdown_and_skips_the_cache() {
    let state = offline_state().await;
    let text = get_theory(&state, "joins", "Joins & Set Operations", false).await;
    assert_eq!(text, THEORY_ERROR);
    assert_eq!(state.storage.get(&theory_key("joins")).await, None);
  }

  #[tokio::test]
  async fn unknown_topic_generates_once_then_reads_the_cache() {
    let (state, hits) = mocked_state("# Joins\nGenerated tutorial.").await;
    let first = get_theory(&state, "joins", "Joins & Set Operations", false).await;
    assert_eq!(first, "# Joins\nGenerated tutorial.");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
      state.storage.get(&theory_key("joins")).await.as_deref(),
      Some("# Joins\nGenerated tutorial.")
    );

    let second = get_theory(&state, "joins", "Joins & Set Operations", false).await;
    assert_eq!(second, first);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "cache hit must not call the provider");
  }

  #[tokio::test]
  async fn forced_refresh_regenerates_and_shadows_the_cache() {
    let (state, hits) = mocked_state("# Fresh copy").await;
    state.storage.set(&theory_key("joins"), "# Old copy").await;
    let text = get_theory(&state, "joins", "Joins & Set Operations", true).await;
    assert_eq!(text, "# Fresh copy");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.storage.get(&theory_key("joins")).await.as_deref(), Some("# Fresh copy"));
  }

  #[test]
  fn leaderboard_places_a_1700_score_at_rank_four() {
    let profile = UserProfile {
      name: "Ada".into(),
      score: 1700,
      streak: 3,
      difficulty: Difficulty::Advanced,
    };
    let board = leaderboard(&profile);
    assert_eq!(board.len(), 6);
    let me = board.iter().find(|e| e.name == "Ada").expect("merged entry");
    assert_eq!(me.rank, 4);
    assert_eq!(me.badges, vec!["Rising Star".to_string()]);
    assert_eq!(board[2].name, "Charlie_SQL");
    assert_eq!(board[4].name, "Data_Diana");
    for (i, entry) in board.iter().enumerate() {
      assert_eq!(entry.rank, (i + 1) as u32);
    }
  }

  #[test]
  fn leaderboard_labels_an_unnamed_profile_as_you() {
    let board = leaderboard(&UserProfile::default());
    let me = board.iter().find(|e| e.name == "You").expect("merged entry");
    assert_eq!(me.rank, 6);
    assert!(me.badges.is_empty());
  }
}
