//! Multiple-choice quizzes: scoring, the session state machine and generation

pub mod engine;
pub mod generate;

use serde::{Deserialize, Serialize};

use crate::config::Language;

pub use engine::{Advanced, AnswerOutcome, GenerationOutcome, GenerationTicket, QuizEngine, QuizPhase};
pub use generate::{QUESTIONS_PER_QUIZ, QuizGenerator, parse_quiz_response, placeholder_quiz, quiz_prompt};

/// What to do when a generated quiz cannot be understood
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizFallback {
    /// Stay without a quiz and surface a retryable error
    #[default]
    Error,
    /// Bind a locally built self-check quiz instead
    Placeholder,
}

/// Correct answers out of questions answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    /// `round(100 * correct / total)`, 0 for an empty quiz
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (100.0 * self.correct as f64 / self.total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Feedback bucket for the percentage
    pub fn verdict(&self) -> Verdict {
        match self.percentage() {
            80.. => Verdict::Excellent,
            50..=79 => Verdict::Good,
            _ => Verdict::KeepTrying,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// End-of-quiz feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Excellent,
    Good,
    KeepTrying,
}

impl Verdict {
    pub fn message(&self, language: Language) -> &'static str {
        match (self, language) {
            (Self::Excellent, Language::Arabic) => "عمل مذهل!",
            (Self::Excellent, Language::French) => "Excellent travail !",
            (Self::Good, Language::Arabic) => "جيد جداً!",
            (Self::Good, Language::French) => "Très bien !",
            (Self::KeepTrying, Language::Arabic) => "استمر في المحاولة!",
            (Self::KeepTrying, Language::French) => "Continuez vos efforts !",
        }
    }
}
