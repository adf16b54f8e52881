//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//! The wire uses the camelCase field names the SPA expects.

use serde::{Deserialize, Serialize};

use crate::curriculum::{Topic, TopicIcon};
use crate::domain::{
    Difficulty, EvaluationResult, QuestionKind, QuestionSource, QuizQuestion, UserProfile,
};
use crate::logic::SubmitOutcome;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewQuestion {
        topic: String,
    },
    SubmitQuery {
        #[serde(rename = "questionId")]
        question_id: String,
        query: String,
    },
    Theory {
        #[serde(rename = "topicId")]
        topic_id: String,
        #[serde(default)]
        refresh: bool,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: QuestionOut,
    },
    SubmitResult {
        result: EvaluationOut,
        profile: ProfileOut,
        stale: bool,
    },
    Theory {
        #[serde(rename = "topicId")]
        topic_id: String,
        content: String,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for question delivery. Carries the draw
/// generation so clients can discard superseded results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
    pub source: QuestionSource,
    pub question_text: String,
    pub schema_context: String,
    pub hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub generation: u64,
}

/// Convert an internal `QuizQuestion` to the public DTO.
pub fn question_out(q: &QuizQuestion, generation: u64) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        topic: q.topic.clone(),
        difficulty: q.difficulty,
        kind: q.kind.clone(),
        source: q.source.clone(),
        question_text: q.question_text.clone(),
        schema_context: q.schema_context.clone(),
        hints: q.hints.clone(),
        options: q.options.clone(),
        generation,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOut {
    pub is_correct: bool,
    pub score_awarded: f32,
    pub explanation: String,
    pub correct_query: String,
    pub optimization_tip: String,
    pub user_feedback: String,
    pub suggest_difficulty_increase: bool,
}

pub fn evaluation_out(r: &EvaluationResult) -> EvaluationOut {
    EvaluationOut {
        is_correct: r.is_correct,
        score_awarded: r.score_awarded,
        explanation: r.explanation.clone(),
        correct_query: r.correct_query.clone(),
        optimization_tip: r.optimization_tip.clone(),
        user_feedback: r.user_feedback.clone(),
        suggest_difficulty_increase: r.suggest_difficulty_increase,
    }
}

/// Profile snapshot with the field names the SPA stores locally.
#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub name: String,
    #[serde(rename = "currentScore")]
    pub score: u32,
    pub streak: u32,
    #[serde(rename = "selectedDifficulty")]
    pub difficulty: Difficulty,
}

pub fn profile_out(p: &UserProfile) -> ProfileOut {
    ProfileOut {
        name: p.name.clone(),
        score: p.score,
        streak: p.streak,
        difficulty: p.difficulty,
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub result: EvaluationOut,
    pub profile: ProfileOut,
    pub stale: bool,
}

pub fn submit_out(o: &SubmitOutcome) -> SubmitOut {
    SubmitOut {
        result: evaluation_out(&o.result),
        profile: profile_out(&o.profile),
        stale: o.stale,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicOut {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub key_concepts: &'static [&'static str],
    pub icon: TopicIcon,
}

pub fn topic_out(t: &Topic) -> TopicOut {
    TopicOut {
        id: t.id,
        title: t.title,
        description: t.description,
        key_concepts: t.key_concepts,
        icon: t.icon,
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct TheoryQuery {
    pub topic: String,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoryOut {
    pub topic_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct IdentityIn {
    pub name: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"new_question","topic":"subqueries"}"#).expect("parse");
        assert!(matches!(msg, ClientWsMessage::NewQuestion { topic } if topic == "subqueries"));

        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"theory","topicId":"subqueries"}"#).expect("parse");
        assert!(matches!(msg, ClientWsMessage::Theory { refresh: false, .. }));
    }

    #[test]
    fn question_dto_uses_camel_case_keys() {
        let q = crate::bank::fallback_question("subqueries", Difficulty::Beginner);
        let json = serde_json::to_string(&question_out(&q, 7)).expect("serialize");
        assert!(json.contains("\"questionText\""));
        assert!(json.contains("\"schemaContext\""));
        assert!(json.contains("\"generation\":7"));
        assert!(!json.contains("\"options\""));
        assert!(json.contains("\"id\":\"fallback\""));
    }

    #[test]
    fn profile_dto_uses_the_stored_field_names() {
        let p = UserProfile {
            name: "Ada".into(),
            score: 10,
            streak: 2,
            difficulty: Difficulty::Expert,
        };
        let json = serde_json::to_string(&profile_out(&p)).expect("serialize");
        assert!(json.contains("\"currentScore\":10"));
        assert!(json.contains("\"selectedDifficulty\":\"Expert\""));
    }
}
