//! Minimal OpenAI-compatible client for our use-cases.
//!
//! We only call chat.completions and request either plain text or a strict
//! JSON object. Calls are instrumented and log model names, latencies, and
//! response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Difficulty, EvaluationResult, QuestionKind, QuestionSource, QuizQuestion};
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

/// Shape the provider must return for question generation. Required fields:
/// a missing one is a decode error and takes the same fallback path as a
/// network failure.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
  question_text: String,
  schema_context: String,
  hints: Vec<String>,
}

/// Shape the provider must return for grading. Values are passed through
/// without clamping.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Verdict {
  is_correct: bool,
  score_awarded: f32,
  explanation: String,
  correct_query: String,
  optimization_tip: String,
  user_feedback: String,
  suggest_difficulty_increase: bool,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// Plain-text chat completion. Used for theory deep dives.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: None,
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "sql-arena-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "sql-arena-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text).map_err(|e| format!("JSON parse error: {}", e))
  }

  // --- High-level helpers (domain-specialized) ---

  /// Generate a quiz question grounded in the given curriculum rules.
  #[instrument(
    level = "info",
    skip(self, prompts, curriculum),
    fields(%topic, %difficulty, model = %self.strong_model)
  )]
  pub async fn generate_question(
    &self,
    prompts: &Prompts,
    topic: &str,
    difficulty: Difficulty,
    curriculum: &str,
  ) -> Result<QuizQuestion, String> {
    let user = fill_template(
      &prompts.question_user_template,
      &[
        ("curriculum", curriculum),
        ("topic", topic),
        ("difficulty", difficulty.as_str()),
      ],
    );
    let start = std::time::Instant::now();
    let result = self
      .chat_json::<GeneratedQuestion>(&self.strong_model, &prompts.question_system, &user, 0.9)
      .await;
    let elapsed = start.elapsed();

    let gen = match result {
      Ok(g) => {
        info!(?elapsed, "Question generated");
        g
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during question generation");
        return Err(format!("Question generation failed: {e}"));
      }
    };

    let q = QuizQuestion {
      id: Uuid::new_v4().to_string(),
      topic: topic.to_string(),
      difficulty,
      kind: QuestionKind::QueryWriting,
      source: QuestionSource::Generated,
      question_text: gen.question_text,
      schema_context: gen.schema_context,
      hints: gen.hints,
      options: None,
    };

    info!(
      question_id = %q.id,
      text_preview = %trunc_for_log(&q.question_text, 60),
      hints = q.hints.len(),
      "Generated question ready"
    );

    Ok(q)
  }

  /// Grade a submitted query against the question and curriculum rules.
  #[instrument(level = "info", skip(self, prompts, question, curriculum, query),
               fields(question_id = %question.id, query_len = query.len()))]
  pub async fn evaluate_submission(
    &self,
    prompts: &Prompts,
    question: &QuizQuestion,
    curriculum: &str,
    query: &str,
  ) -> Result<EvaluationResult, String> {
    let user = fill_template(
      &prompts.eval_user_template,
      &[
        ("curriculum", curriculum),
        ("question", &question.question_text),
        ("schema", &question.schema_context),
        ("difficulty", question.difficulty.as_str()),
        ("query", query),
      ],
    );
    let v: Verdict = self
      .chat_json(&self.strong_model, &prompts.eval_system, &user, 0.2)
      .await?;
    Ok(EvaluationResult {
      is_correct: v.is_correct,
      score_awarded: v.score_awarded,
      explanation: v.explanation,
      correct_query: v.correct_query,
      optimization_tip: v.optimization_tip,
      user_feedback: v.user_feedback,
      suggest_difficulty_increase: v.suggest_difficulty_increase,
    })
  }

  /// Long-form markdown tutorial. Plain completion, not JSON constrained.
  #[instrument(level = "info", skip(self, prompts, curriculum), fields(%topic_title, model = %self.fast_model))]
  pub async fn theory_deep_dive(
    &self,
    prompts: &Prompts,
    topic_title: &str,
    curriculum: &str,
  ) -> Result<String, String> {
    let user = fill_template(
      &prompts.theory_user_template,
      &[("topic", topic_title), ("curriculum", curriculum)],
    );
    let text = self
      .chat_plain(&self.fast_model, &prompts.theory_system, &user, 0.4)
      .await?;
    info!(text_len = text.len(), "Theory deep dive received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
