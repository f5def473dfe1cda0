//! Quiz session state machine
//!
//! ```text
//! NoQuiz -> Generating -> Ready -> AnswerPending <-> AnswerRevealed -> Finished
//!   ^           |                                                        |
//!   +-- failure +                              restart -> Ready <--------+
//! ```
//!
//! Generation is split into [`QuizEngine::begin_generation`], which hands out
//! a ticket, and [`QuizEngine::complete_generation`], which applies a result
//! only when the ticket is still current. Restarting or cancelling makes
//! every outstanding ticket stale, so a late response is dropped instead of
//! landing in a session it no longer belongs to.

use std::sync::atomic::{AtomicU64, Ordering};

use super::generate::placeholder_quiz;
use super::{QuizFallback, Score};
use crate::catalog::{Question, Quiz};
use crate::claude::ServiceError;
use crate::config::Language;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Where a quiz session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// No question set bound and none requested
    NoQuiz,
    /// A generation request is in flight
    Generating,
    /// Question set bound, first question not yet shown
    Ready,
    /// A question is shown and awaits a selection
    AnswerPending,
    /// The selection and the correct answer are shown
    AnswerRevealed,
    /// Every question has been answered
    Finished,
}

/// Proof of a generation request, checked when its result arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    token: u64,
    material_id: String,
    title: String,
}

impl GenerationTicket {
    /// Material the quiz is for
    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    /// Lesson title to generate questions about
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Result of applying a generation response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The ticket was superseded; nothing changed
    Stale,
    /// The generated quiz is bound and ready
    Bound,
    /// The response was unusable and a placeholder quiz was bound instead
    Placeholder(ServiceError),
    /// No quiz bound; the error is kept for a manual retry
    Failed(ServiceError),
}

/// What a selection revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
}

/// What advancing led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advanced {
    /// Moved to the question at this index
    Question(usize),
    /// The session finished
    Finished {
        score: Score,
        /// True exactly once per session; the caller awards the quiz bonus on it
        first_completion: bool,
    },
}

/// One quiz session for one material
#[derive(Debug, Clone)]
pub struct QuizEngine {
    material_id: String,
    title: String,
    language: Language,
    fallback: QuizFallback,
    quiz: Option<Quiz>,
    placeholder: bool,
    phase: QuizPhase,
    index: usize,
    selected: Option<usize>,
    correct: usize,
    completion_fired: bool,
    pending: Option<u64>,
    last_error: Option<ServiceError>,
}

impl QuizEngine {
    /// A session with no quiz yet
    pub fn new(material_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            material_id: material_id.into(),
            title: title.into(),
            language: Language::default(),
            fallback: QuizFallback::default(),
            quiz: None,
            placeholder: false,
            phase: QuizPhase::NoQuiz,
            index: 0,
            selected: None,
            correct: 0,
            completion_fired: false,
            pending: None,
            last_error: None,
        }
    }

    /// A session over an authored quiz
    ///
    /// The quiz is expected to be valid already; catalog loading checks that.
    /// An empty quiz leaves the session without one.
    pub fn with_quiz(material_id: impl Into<String>, title: impl Into<String>, quiz: Quiz) -> Self {
        let mut engine = Self::new(material_id, title);
        if !quiz.is_empty() {
            engine.bind(quiz, false);
        }
        engine
    }

    /// Choose what happens to malformed generation responses
    pub fn with_fallback(mut self, fallback: QuizFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Language for locally built quizzes
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    fn bind(&mut self, quiz: Quiz, placeholder: bool) {
        self.quiz = Some(quiz);
        self.placeholder = placeholder;
        self.reset_session();
    }

    fn reset_session(&mut self) {
        self.phase = QuizPhase::Ready;
        self.index = 0;
        self.selected = None;
        self.correct = 0;
        self.completion_fired = false;
    }

    /// Material this session belongs to
    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// The bound question set
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// Whether the bound quiz was synthesized locally
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Error from the last failed generation, if any
    pub fn last_error(&self) -> Option<&ServiceError> {
        self.last_error.as_ref()
    }

    /// Zero-based index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions, 0 without a quiz
    pub fn len(&self) -> usize {
        self.quiz.as_ref().map_or(0, Quiz::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The question being shown
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::Ready | QuizPhase::AnswerPending | QuizPhase::AnswerRevealed => {
                self.quiz.as_ref().and_then(|q| q.questions.get(self.index))
            }
            _ => None,
        }
    }

    /// Option picked for the current question
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Running score
    pub fn score(&self) -> Score {
        Score { correct: self.correct, total: self.len() }
    }

    /// Show the first question
    pub fn start(&mut self) {
        if self.phase == QuizPhase::Ready {
            self.phase = QuizPhase::AnswerPending;
        }
    }

    /// Request a generated quiz; only possible while no quiz is bound
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if self.phase != QuizPhase::NoQuiz {
            return None;
        }

        let token = next_token();
        self.pending = Some(token);
        self.phase = QuizPhase::Generating;
        self.last_error = None;
        tracing::debug!("Generating quiz for {} (ticket {})", self.material_id, token);

        Some(GenerationTicket { token, material_id: self.material_id.clone(), title: self.title.clone() })
    }

    /// Abandon the in-flight request; its response will be ignored
    pub fn cancel_generation(&mut self) {
        if self.phase == QuizPhase::Generating {
            self.phase = QuizPhase::NoQuiz;
        }
        self.pending = None;
    }

    /// Apply a generation response
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<Quiz, ServiceError>,
    ) -> GenerationOutcome {
        if self.phase != QuizPhase::Generating || self.pending != Some(ticket.token) {
            tracing::debug!("Ignoring stale quiz response for {}", ticket.material_id);
            return GenerationOutcome::Stale;
        }
        self.pending = None;

        let result = result.and_then(|quiz| {
            quiz.validate().map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
            Ok(quiz)
        });

        match result {
            Ok(quiz) => {
                tracing::info!("Quiz for {} ready with {} questions", self.material_id, quiz.len());
                self.bind(quiz, false);
                GenerationOutcome::Bound
            }
            Err(err @ ServiceError::MalformedResponse(_))
                if self.fallback == QuizFallback::Placeholder =>
            {
                tracing::warn!("Using placeholder quiz for {}: {}", self.material_id, err);
                self.bind(placeholder_quiz(&self.title, self.language), true);
                GenerationOutcome::Placeholder(err)
            }
            Err(err) => {
                tracing::warn!("Quiz generation for {} failed: {}", self.material_id, err);
                self.phase = QuizPhase::NoQuiz;
                self.last_error = Some(err.clone());
                GenerationOutcome::Failed(err)
            }
        }
    }

    /// Pick an option; accepted once per question
    pub fn select(&mut self, option: usize) -> Option<AnswerOutcome> {
        if !matches!(self.phase, QuizPhase::Ready | QuizPhase::AnswerPending) {
            return None;
        }
        let question = self.quiz.as_ref()?.questions.get(self.index)?;
        if option >= question.options.len() {
            return None;
        }

        let is_correct = question.is_correct(option);
        let correct_index = question.correct_index;
        if is_correct {
            self.correct += 1;
        }
        self.selected = Some(option);
        self.phase = QuizPhase::AnswerRevealed;

        Some(AnswerOutcome { selected: option, correct_index, is_correct })
    }

    /// Move past a revealed answer
    pub fn advance(&mut self) -> Option<Advanced> {
        if self.phase != QuizPhase::AnswerRevealed {
            return None;
        }

        if self.index + 1 < self.len() {
            self.index += 1;
            self.selected = None;
            self.phase = QuizPhase::AnswerPending;
            return Some(Advanced::Question(self.index));
        }

        self.phase = QuizPhase::Finished;
        let first_completion = !self.completion_fired;
        self.completion_fired = true;

        Some(Advanced::Finished { score: self.score(), first_completion })
    }

    /// Start the bound quiz over; abandons any in-flight generation
    pub fn restart(&mut self) {
        self.pending = None;
        match self.phase {
            QuizPhase::NoQuiz => {}
            QuizPhase::Generating => self.phase = QuizPhase::NoQuiz,
            _ => self.reset_session(),
        }
    }
}
