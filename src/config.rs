//! Loading arena configuration (prompts + optional extra bank questions)
//! from TOML.
//!
//! See `ArenaConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ArenaConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Static-bank entry accepted in TOML configuration. Merged into the
/// built-in bank at startup under the given topic slug.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  pub topic: String,
  pub difficulty: Difficulty,
  pub question_text: String,
  pub schema_context: String,
  #[serde(default)] pub hints: Vec<String>,
}

/// Prompts used by the AI provider. Defaults reproduce the Class of '26
/// grading persona; override in TOML to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Question generation
  pub question_system: String,
  pub question_user_template: String,
  // Submission grading
  pub eval_system: String,
  pub eval_user_template: String,
  // Theory deep dives (plain markdown, not JSON)
  pub theory_system: String,
  pub theory_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_system: "You are a SQL interview question generator for the Class of '26. Respond ONLY with strict JSON.".into(),
      question_user_template: "Generate a unique, challenging SQL interview question based strictly on the following curriculum context.\n\nCURRICULUM CONTEXT:\n{curriculum}\n\nTopic: {topic}\nDifficulty: {difficulty}\nSource Material Style: LeetCode, FAANG Interview, Academic Exam.\n\nIf difficulty is Expert, combine concepts (e.g., Recursive CTEs with Window Functions, or complex BCNF decomposition).\n\nReturn a JSON object with:\n- questionText: the problem description. Ensure it strictly uses terminology from the curriculum context.\n- schemaContext: text description of the tables, columns, and sample data types involved.\n- hints: an array of 2 short hints.".into(),
      eval_system: "You are a Senior SQL Professor for the Class of '26. Grade submissions strictly against the curriculum. Output JSON only.".into(),
      eval_user_template: "Grade this submission.\n\nCURRICULUM CONTEXT:\n{curriculum}\n\nContext:\nQuestion: {question}\nSchema: {schema}\nDifficulty: {difficulty}\n\nStudent's Answer:\n{query}\n\nTask:\n1. Determine if the query is logically correct based on the Curriculum Rules provided.\n2. Check for syntax errors.\n3. Check for efficiency.\n4. Provide the optimal correct solution using the specific functions mentioned in the curriculum (e.g. if the curriculum mentions NTH_VALUE, prefer that over self-joins).\n\nReturn a JSON object with: isCorrect (boolean), scoreAwarded (number between 0 and 100), explanation (deep dive relating back to the curriculum), correctQuery (the ideal SQL query), optimizationTip (how to make it faster), userFeedback (specific feedback on the student's code), suggestDifficultyIncrease (boolean).".into(),
      theory_system: "You write comprehensive, textbook-quality SQL tutorials in Markdown. Keep content educational, formal, and visually structured. Ensure headers are clearly marked with #.".into(),
      theory_user_template: "Write a comprehensive, textbook-quality tutorial on {topic} in SQL.\n\nCRITICAL: The content MUST be strictly based on these curriculum notes and rules:\n{curriculum}\n\nStructure the response using standard Markdown:\n1. **Title**: Use an H1 (#) for the main title.\n2. **Introduction**: Brief summary of the concept.\n3. **Key Concepts**: Use H2 (##) for sections. Use bolding (**text**) for key terms defined in the curriculum.\n4. **Syntax & Examples**: Use code blocks (```sql) for ALL SQL examples. Use Markdown Tables for comparing concepts (e.g. RANK vs DENSE_RANK).\n5. **Common Pitfalls**: Use a blockquote (>) to highlight traps mentioned in the slides (e.g. \"Fan Traps\").\n6. **Real-world Scenario**: Provide a concrete example (e.g. \"Class of '26 Database\").".into(),
    }
  }
}

/// Attempt to load `ArenaConfig` from ARENA_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_arena_config_from_env() -> Option<ArenaConfig> {
  let path = std::env::var("ARENA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ArenaConfig>(&s) {
      Ok(cfg) => {
        info!(target: "sql_arena", %path, "Loaded arena config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "sql_arena", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "sql_arena", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_prompts_carry_their_placeholders() {
    let p = Prompts::default();
    for key in ["{curriculum}", "{topic}", "{difficulty}"] {
      assert!(p.question_user_template.contains(key), "missing {key}");
    }
    for key in ["{curriculum}", "{question}", "{schema}", "{difficulty}", "{query}"] {
      assert!(p.eval_user_template.contains(key), "missing {key}");
    }
    assert!(p.theory_user_template.contains("{topic}"));
    assert!(p.theory_user_template.contains("{curriculum}"));
  }

  #[test]
  fn toml_bank_entries_parse() {
    let cfg: ArenaConfig = toml::from_str(
      r#"
        [[questions]]
        topic = "window_functions"
        difficulty = "Expert"
        question_text = "Compute a 3-row moving average per region."
        schema_context = "Table: METRICS (region, day, value)"
        hints = ["Use AVG() OVER", "ROWS BETWEEN 2 PRECEDING AND CURRENT ROW"]
      "#,
    )
    .expect("parse");
    assert_eq!(cfg.questions.len(), 1);
    assert_eq!(cfg.questions[0].difficulty, Difficulty::Expert);
    assert!(cfg.questions[0].id.is_none());
  }
}
