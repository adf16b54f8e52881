//! Domain models used by the backend: topics, the difficulty ladder, quiz
//! questions, evaluation verdicts, and the learner profile.

use serde::{Deserialize, Serialize};

/// Progression ladder. Total order: Beginner < Intermediate < Advanced < Expert.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

impl Difficulty {
  /// Successor on the ladder. Expert is the ceiling and has none.
  pub fn next(self) -> Option<Difficulty> {
    match self {
      Difficulty::Beginner => Some(Difficulty::Intermediate),
      Difficulty::Intermediate => Some(Difficulty::Advanced),
      Difficulty::Advanced => Some(Difficulty::Expert),
      Difficulty::Expert => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Beginner => "Beginner",
      Difficulty::Intermediate => "Intermediate",
      Difficulty::Advanced => "Advanced",
      Difficulty::Expert => "Expert",
    }
  }
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Intermediate }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What kind of question is presented to the learner?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Learner writes a free-form SQL query; graded by the AI provider.
  QueryWriting,
  /// Reserved. Options are carried on the question but no flow uses them yet.
  MultipleChoice,
}

impl Default for QuestionKind {
  fn default() -> Self { QuestionKind::QueryWriting }
}

/// Where did the question come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  StaticBank, // pre-authored (built-in or TOML config)
  Generated,  // generated via the AI provider
  Fallback,   // canned question used when generation fails
}

/// A quiz question as served to the learner. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
  pub id: String,
  pub topic: String,
  pub difficulty: Difficulty,
  pub kind: QuestionKind,
  pub source: QuestionSource,

  pub question_text: String,
  pub schema_context: String,
  pub hints: Vec<String>,

  /// Only for MultipleChoice; unused by current flows.
  #[serde(default)]
  pub options: Option<Vec<String>>,
}

/// Verdict returned by the grading path. Field values from the AI provider
/// are passed through without local validation beyond JSON shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
  pub is_correct: bool,
  pub score_awarded: f32,
  pub explanation: String,
  pub correct_query: String,
  pub optimization_tip: String,
  pub user_feedback: String,
  pub suggest_difficulty_increase: bool,
}

/// The single learner profile. An empty name means no active session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
  pub name: String,
  pub score: u32,
  pub streak: u32,
  pub difficulty: Difficulty,
}

impl Default for UserProfile {
  fn default() -> Self {
    Self {
      name: String::new(),
      score: 0,
      streak: 0,
      difficulty: Difficulty::default(),
    }
  }
}

/// One row of the displayed leaderboard. Rank is computed, never stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
  pub name: String,
  pub score: u32,
  pub rank: u32,
  pub badges: Vec<String>,
}
