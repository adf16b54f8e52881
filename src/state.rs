//! Application state: question bank, served-question registry, prompts,
//! storage, profile, and the optional OpenAI client.
//!
//! This module owns the question-provision policy:
//!   1. static bank (uniform random pick, fresh identity per draw)
//!   2. AI generation grounded in curriculum context
//!   3. hard fallback question
//! A usable question is always returned; callers never see a raw error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::bank::{fallback_question, static_questions, static_theory};
use crate::config::{load_arena_config_from_env, Prompts, QuestionCfg};
use crate::curriculum::context_for;
use crate::domain::{Difficulty, QuestionKind, QuestionSource, QuizQuestion};
use crate::openai::OpenAI;
use crate::profile::ProfileStore;
use crate::storage::KvStore;
use crate::util::now_millis;
use uuid::Uuid;

/// A question as it was handed out, tagged with the draw generation so a
/// late-resolving grade can be flagged stale (see `AppState::is_current`).
#[derive(Clone)]
pub struct ServedQuestion {
    pub question: QuizQuestion,
    pub generation: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bank: HashMap<String, Vec<QuizQuestion>>,
    pub theory_static: HashMap<&'static str, &'static str>,
    pub served: Arc<RwLock<HashMap<String, ServedQuestion>>>,
    question_gen: Arc<AtomicU64>,
    pub storage: KvStore,
    pub profile: ProfileStore,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

/// Fold TOML-config questions into the static bank.
fn merge_config_questions(bank: &mut HashMap<String, Vec<QuizQuestion>>, extra: Vec<QuestionCfg>) {
    for cfg in extra {
        if cfg.question_text.is_empty() || cfg.schema_context.is_empty() {
            warn!(target: "quiz", topic = %cfg.topic, "Skipping config question: empty text or schema");
            continue;
        }
        let q = QuizQuestion {
            id: cfg.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            topic: cfg.topic.clone(),
            difficulty: cfg.difficulty,
            kind: QuestionKind::QueryWriting,
            source: QuestionSource::StaticBank,
            question_text: cfg.question_text,
            schema_context: cfg.schema_context,
            hints: cfg.hints,
            options: None,
        };
        bank.entry(cfg.topic).or_default().push(q);
    }
}

impl AppState {
    /// Build state from env: load config, seed the bank, open storage,
    /// load the profile, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Self {
        let cfg_opt = load_arena_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut bank = static_questions();
        if let Some(cfg) = cfg_opt {
            merge_config_questions(&mut bank, cfg.questions);
        }

        for (topic, questions) in &bank {
            info!(target: "quiz", %topic, count = questions.len(), "Startup question inventory");
        }

        let storage = KvStore::from_env();
        let profile = ProfileStore::load(storage.clone()).await;

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "sql_arena", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "sql_arena", "OpenAI disabled (no OPENAI_API_KEY). Static bank and fallbacks only.");
        }

        Self {
            bank,
            theory_static: static_theory(),
            served: Arc::new(RwLock::new(HashMap::new())),
            question_gen: Arc::new(AtomicU64::new(0)),
            storage,
            profile,
            openai,
            prompts,
        }
    }

    /// Register a handed-out question so a later submission can reference
    /// exactly this question by id.
    #[instrument(level = "debug", skip(self, q), fields(id = %q.id))]
    async fn register(&self, q: QuizQuestion, generation: u64) {
        self.served
            .write()
            .await
            .insert(q.id.clone(), ServedQuestion { question: q, generation });
    }

    /// Selection policy: static bank first, then AI generation, then the
    /// hard fallback. Returns the question, its draw generation, and a
    /// short origin tag for logging.
    #[instrument(level = "info", skip(self), fields(%topic, %difficulty))]
    pub async fn provide_question(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> (QuizQuestion, u64, &'static str) {
        let generation = self.question_gen.fetch_add(1, Ordering::SeqCst) + 1;

        // 1) Static bank: instant and free. The suffix gives every draw a
        // fresh identity even when the same underlying item is redrawn.
        if let Some(list) = self.bank.get(topic) {
            if !list.is_empty() {
                let picked = {
                    let mut rng = rand::thread_rng();
                    list.choose(&mut rng).cloned()
                };
                if let Some(mut q) = picked {
                    q.id = format!("{}_{}_{}", q.id, now_millis(), generation);
                    self.register(q.clone(), generation).await;
                    info!(target: "quiz", %topic, id = %q.id, source = "static_bank", "Question served from bank");
                    return (q, generation, "static_bank");
                }
            }
        }

        // 2) AI generation, grounded in curriculum context.
        if let Some(oa) = &self.openai {
            let curriculum = context_for(topic);
            match oa.generate_question(&self.prompts, topic, difficulty, curriculum).await {
                Ok(q) => {
                    self.register(q.clone(), generation).await;
                    info!(target: "quiz", %topic, id = %q.id, source = "openai_generated", "Question generated");
                    return (q, generation, "openai_generated");
                }
                Err(e) => {
                    error!(target: "quiz", %topic, error = %e, "AI generation failed; using fallback question");
                }
            }
        } else {
            error!(target: "quiz", %topic, "OPENAI_API_KEY not set; using fallback question");
        }

        // 3) Hard fallback.
        let q = fallback_question(topic, difficulty);
        self.register(q.clone(), generation).await;
        warn!(target: "quiz", %topic, id = %q.id, source = "fallback", "Served fallback question");
        (q, generation, "fallback")
    }

    /// Read-only access to a served question by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_question(&self, id: &str) -> Option<ServedQuestion> {
        self.served.read().await.get(id).cloned()
    }

    /// True while no newer question has been drawn since `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.question_gen.load(Ordering::SeqCst) == generation
    }

    #[cfg(test)]
    pub(crate) fn for_tests(openai: Option<OpenAI>, storage: KvStore, profile: ProfileStore) -> Self {
        Self {
            bank: static_questions(),
            theory_static: static_theory(),
            served: Arc::new(RwLock::new(HashMap::new())),
            question_gen: Arc::new(AtomicU64::new(0)),
            storage,
            profile,
            openai,
            prompts: Prompts::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::fallback_question;

    async fn offline_state() -> AppState {
        let storage = KvStore::in_memory();
        let profile = ProfileStore::load(storage.clone()).await;
        AppState::for_tests(None, storage, profile)
    }

    #[tokio::test]
    async fn banked_topic_never_falls_back_and_ids_are_fresh() {
        let state = offline_state().await;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10 {
            let (q, _, origin) = state.provide_question("window_functions", Difficulty::Expert).await;
            assert_eq!(origin, "static_bank");
            assert_eq!(q.source, QuestionSource::StaticBank);
            assert!(q.id.starts_with("wf_1_") || q.id.starts_with("wf_2_"), "unexpected id {}", q.id);
            assert!(seen.insert(q.id.clone()), "duplicate id {}", q.id);
        }
    }

    #[tokio::test]
    async fn bankless_topic_without_provider_yields_the_canonical_fallback() {
        let state = offline_state().await;
        let (q, _, origin) = state.provide_question("data_modeling", Difficulty::Advanced).await;
        assert_eq!(origin, "fallback");
        assert_eq!(q, fallback_question("data_modeling", Difficulty::Advanced));
    }

    #[tokio::test]
    async fn served_questions_are_retrievable_by_id() {
        let state = offline_state().await;
        let (q, generation, _) = state.provide_question("subqueries", Difficulty::Beginner).await;
        let served = state.get_question(&q.id).await.expect("registered");
        assert_eq!(served.question, q);
        assert_eq!(served.generation, generation);
        assert!(state.get_question("nope").await.is_none());
    }

    #[tokio::test]
    async fn generations_increase_and_supersede_older_draws() {
        let state = offline_state().await;
        let (_, g1, _) = state.provide_question("subqueries", Difficulty::Beginner).await;
        assert!(state.is_current(g1));
        let (_, g2, _) = state.provide_question("subqueries", Difficulty::Beginner).await;
        assert!(g2 > g1);
        assert!(!state.is_current(g1));
        assert!(state.is_current(g2));
    }

    #[tokio::test]
    async fn config_questions_merge_into_the_bank() {
        let mut bank = static_questions();
        merge_config_questions(
            &mut bank,
            vec![QuestionCfg {
                id: Some("cfg_1".into()),
                topic: "data_modeling".into(),
                difficulty: Difficulty::Expert,
                question_text: "Model a fleet hierarchy with subtypes.".into(),
                schema_context: "Supertype: VEHICLE".into(),
                hints: vec![],
            }],
        );
        let dm = bank.get("data_modeling").expect("merged topic");
        assert_eq!(dm.len(), 1);
        assert_eq!(dm[0].id, "cfg_1");
        assert_eq!(dm[0].source, QuestionSource::StaticBank);
    }
}
