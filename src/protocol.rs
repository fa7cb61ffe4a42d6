//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Correct answers are never part of a question DTO; they only appear in feedback.

use serde::{Deserialize, Serialize};

use crate::domain::{
  Category, DifficultyLevel, Profile, Question, ReadingKind, RoundResult, VisualCount,
};
use crate::report::ReportSummary;
use crate::session::{Feedback, Phase, QuizRound};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartRound {
        category: Category,
    },
    Answer {
        option: String,
    },
    EndRound,
    GetSummary,
    GetReport,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Round {
        round: RoundOut,
    },
    Feedback {
        accepted: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        feedback: Option<Feedback>,
        #[serde(skip_serializing_if = "Option::is_none")]
        correct_answer: Option<String>,
        score: u32,
    },
    RoundComplete {
        result: RoundResult,
    },
    RoundEnded,
    Summary {
        summary: ReportSummary,
    },
    Report {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Client view of a question.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub category: Category,
    /// Sub-type tag, e.g. "COUNT", "OPPOSITE", "PATTERN".
    pub kind: String,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Text shown on the card: masked word, scrambled letters, sentence, or prompt word.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<String>>,
}

fn kind_tag<T: Serialize>(kind: &T) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Convert a full `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    let mut out = QuestionOut {
        id: q.id().to_string(),
        category: q.category(),
        kind: String::new(),
        prompt: String::new(),
        options: q.option_labels(),
        visual: None,
        image: None,
        display: None,
        sequence: None,
    };
    match q {
        Question::Math(m) => {
            out.kind = kind_tag(&m.kind);
            out.prompt = m.prompt.clone();
            out.visual = m.visual;
        }
        Question::Reading(r) => {
            out.kind = kind_tag(&r.kind);
            out.prompt = r.prompt.clone();
            out.image = Some(r.image.clone());
            out.display = match r.kind {
                ReadingKind::MatchImage | ReadingKind::FirstLetter => None,
                ReadingKind::Scramble => r.scrambled_word.clone(),
                ReadingKind::MatchWord
                | ReadingKind::MissingLetter
                | ReadingKind::Opposite
                | ReadingKind::Sentence => Some(r.word.clone()),
            };
        }
        Question::Logic(l) => {
            out.kind = kind_tag(&l.kind);
            out.prompt = l.prompt.clone();
            out.sequence = Some(l.sequence.clone());
        }
    }
    out
}

/// Round state as seen by the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundOut {
    pub id: String,
    pub category: Category,
    pub difficulty: DifficultyLevel,
    pub index: usize,
    pub total: usize,
    pub score: u32,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RoundResult>,
}

pub fn round_out(id: &str, round: &QuizRound, result: Option<&RoundResult>) -> RoundOut {
    RoundOut {
        id: id.to_string(),
        category: round.category(),
        difficulty: round.difficulty(),
        index: round.index(),
        total: round.len(),
        score: round.score(),
        phase: round.phase(),
        question: round.current().map(to_out),
        result: result.cloned(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartRoundIn {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub option: String,
}
#[derive(Debug, Serialize)]
pub struct AnswerOut {
    /// False when the answer arrived while feedback was showing (or after completion).
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub round: RoundOut,
}

#[derive(Debug, Deserialize)]
pub struct ProfileIn {
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LevelIn {
    pub level: DifficultyLevel,
}

#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub profile: Option<Profile>,
    /// True when no profile exists yet and the client should run setup.
    pub needs_setup: bool,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect_to: Option<String>,
}
#[derive(Debug, Serialize)]
pub struct LoginOut {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportOut {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarsOut {
    pub avatars: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub auth: bool,
    pub store: &'static str,
    pub ai_report: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LogicKind, LogicQuestion, ReadingQuestion};

    #[test]
    fn question_dto_hides_the_answer() {
        let q = Question::Reading(ReadingQuestion {
            id: "r-1".into(),
            kind: ReadingKind::Opposite,
            prompt: "Apa lawan katanya?".into(),
            word: "BESAR".into(),
            image: "🐘".into(),
            scrambled_word: None,
            options: vec!["DINGIN".into(), "KECIL".into(), "TUTUP".into()],
            answer: "KECIL".into(),
        });
        let out = to_out(&q);
        assert_eq!(out.kind, "OPPOSITE");
        assert_eq!(out.display.as_deref(), Some("BESAR"));
        let v = serde_json::to_value(&out).unwrap();
        assert!(v.get("answer").is_none());
    }

    #[test]
    fn logic_dto_carries_sequence() {
        let q = Question::Logic(LogicQuestion {
            id: "l-1".into(),
            kind: LogicKind::Pattern,
            prompt: "Apa urutan selanjutnya?".into(),
            sequence: vec!["🍎".into(), "🍌".into(), "🍎".into(), "?".into()],
            answer: "🍌".into(),
            options: vec!["🍌".into(), "🍇".into(), "🍎".into()],
        });
        let out = to_out(&q);
        assert_eq!(out.kind, "PATTERN");
        assert_eq!(out.sequence.unwrap().len(), 4);
    }

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_round","category":"LOGIKA"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartRound { category: Category::Logic }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","option":"7"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { .. }));
    }
}
