//! Generated quizzes: prompt, defensive parsing and the local placeholder
//!
//! Responses are treated as untrusted input. Markdown fences and chatter
//! around the JSON object are stripped, the object must deserialize into the
//! question-set shape, and the result must pass [`Quiz::validate`].

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::engine::GenerationTicket;
use crate::catalog::{Question, Quiz};
use crate::claude::{CompletionRequest, ServiceError, TextGenerator, complete_with_timeout};
use crate::config::Language;

/// Questions requested per generated quiz
pub const QUESTIONS_PER_QUIZ: usize = 5;

static FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));

/// Prompt asking for a quiz about `title`
pub fn quiz_prompt(title: &str, language: Language) -> String {
    format!(
        "Generate a multiple-choice quiz of {count} questions about the lesson: \"{title}\".\n\
         The questions must be written in {language}.\n\
         Return only JSON, with exactly this shape:\n\
         {{\"questions\":[{{\"question\":\"...\",\"options\":[\"...\",\"...\",\"...\",\"...\"],\"correctIndex\":0}}]}}\n\
         Rules:\n\
         - every question has exactly 4 options\n\
         - correctIndex is the index of the correct option (0, 1, 2 or 3)\n\
         - questions are varied and relevant to the lesson",
        count = QUESTIONS_PER_QUIZ,
        title = title,
        language = language.english_name(),
    )
}

/// Cut the JSON object out of a raw response
fn extract_json(raw: &str) -> &str {
    let text = raw.trim();
    let text = FENCED
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str().trim());

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse and validate a generation response
pub fn parse_quiz_response(raw: &str) -> Result<Quiz, ServiceError> {
    let json = extract_json(raw);
    if json.is_empty() {
        return Err(ServiceError::MalformedResponse("empty response".to_string()));
    }

    let quiz: Quiz = serde_json::from_str(json)?;
    quiz.validate().map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    Ok(quiz)
}

/// A self-check quiz built without the generation service
pub fn placeholder_quiz(title: &str, language: Language) -> Quiz {
    let q = |prompt: String, options: [&str; 4]| Question {
        prompt,
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_index: 0,
    };

    let questions = match language {
        Language::Arabic => vec![
            q(
                format!("هل قرأت درس «{}» كاملاً؟", title),
                ["نعم، قرأته كاملاً", "قرأت جزءاً منه", "لم أقرأه بعد", "سأقرؤه لاحقاً"],
            ),
            q(
                format!("ما أفضل طريقة لمراجعة «{}»؟", title),
                [
                    "حل سلسلة تمارين بعد قراءة الدرس",
                    "حفظ العنوان فقط",
                    "تجاهل الأمثلة",
                    "الاكتفاء بالملخص دون فهم",
                ],
            ),
            q(
                "ماذا تفعل إذا لم تفهم فقرة من الدرس؟".to_string(),
                ["أعيد قراءتها وأسأل المساعد", "أتجاوزها نهائياً", "أحفظها دون فهم", "أتوقف عن المراجعة"],
            ),
        ],
        Language::French => vec![
            q(
                format!("Avez-vous lu entièrement la leçon « {} » ?", title),
                ["Oui, en entier", "Une partie seulement", "Pas encore", "Je la lirai plus tard"],
            ),
            q(
                format!("Quelle est la meilleure façon de réviser « {} » ?", title),
                [
                    "Faire une série d'exercices après la leçon",
                    "Retenir seulement le titre",
                    "Ignorer les exemples",
                    "Lire le résumé sans comprendre",
                ],
            ),
            q(
                "Que faire si un paragraphe reste incompris ?".to_string(),
                [
                    "Le relire et interroger l'assistant",
                    "Le sauter définitivement",
                    "L'apprendre par cœur",
                    "Arrêter de réviser",
                ],
            ),
        ],
    };

    Quiz { questions }
}

/// Requests quizzes from a text generator
#[derive(Clone)]
pub struct QuizGenerator {
    generator: Arc<dyn TextGenerator>,
    language: Language,
    timeout: Duration,
}

impl QuizGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, language: Language, timeout: Duration) -> Self {
        Self { generator, language, timeout }
    }

    /// Generate a quiz for the ticket's lesson
    pub async fn generate(&self, ticket: &GenerationTicket) -> Result<Quiz, ServiceError> {
        let request = CompletionRequest::prompt(quiz_prompt(ticket.title(), self.language))
            .with_max_tokens(2048);

        let raw = complete_with_timeout(self.generator.as_ref(), request, self.timeout).await?;
        parse_quiz_response(&raw).inspect_err(|e| {
            tracing::warn!("Unusable quiz response for {}: {}", ticket.material_id(), e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"{"questions":[
        {"question":"f(x)=x², f'(x)=?","options":["2x","x","x²","2"],"correctIndex":0},
        {"question":"∫2x dx=?","options":["2","x²+C","x","2x²"],"correctIndex":1}
    ]}"#;

    #[test]
    fn parses_plain_json() {
        let quiz = parse_quiz_response(VALID).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.questions[1].correct_index, 1);
        assert_eq!(quiz.questions[0].prompt, "f(x)=x², f'(x)=?");
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = format!("```json\n{}\n```", VALID);
        assert_eq!(parse_quiz_response(&raw).unwrap().len(), 2);
    }

    #[test]
    fn strips_surrounding_chatter() {
        let raw = format!("Here is your quiz:\n{}\nGood luck!", VALID);
        assert_eq!(parse_quiz_response(&raw).unwrap().len(), 2);
    }

    #[test]
    fn missing_questions_is_malformed() {
        let result = parse_quiz_response(r#"{"items": []}"#);
        assert!(matches!(result, Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn empty_questions_is_malformed() {
        let result = parse_quiz_response(r#"{"questions": []}"#);
        assert!(matches!(result, Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn three_options_is_malformed() {
        let raw = r#"{"questions":[{"question":"?","options":["a","b","c"],"correctIndex":0}]}"#;
        assert!(matches!(parse_quiz_response(raw), Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn correct_index_out_of_range_is_malformed() {
        let raw = r#"{"questions":[{"question":"?","options":["a","b","c","d"],"correctIndex":4}]}"#;
        assert!(matches!(parse_quiz_response(raw), Err(ServiceError::MalformedResponse(_))));
    }

    #[test]
    fn empty_and_prose_responses_are_malformed() {
        assert!(matches!(parse_quiz_response("   "), Err(ServiceError::MalformedResponse(_))));
        assert!(matches!(
            parse_quiz_response("Sorry, I cannot help with that."),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn prompt_names_title_language_and_shape() {
        let prompt = quiz_prompt("Primitive", Language::French);
        assert!(prompt.contains("\"Primitive\""));
        assert!(prompt.contains("5 questions"));
        assert!(prompt.contains("French"));
        assert!(prompt.contains("correctIndex"));
    }

    struct Canned(Result<String, ServiceError>);

    #[async_trait::async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
            assert!(request.prompt.contains("Primitive"));
            self.0.clone()
        }
    }

    fn ticket() -> GenerationTicket {
        let mut engine = crate::quiz::QuizEngine::new("math-2", "Primitive");
        engine.begin_generation().unwrap()
    }

    #[tokio::test]
    async fn generator_parses_fenced_reply() {
        let canned = Canned(Ok(format!("```\n{}\n```", VALID)));
        let generator = QuizGenerator::new(Arc::new(canned), Language::Arabic, Duration::from_secs(5));

        let quiz = generator.generate(&ticket()).await.unwrap();
        assert_eq!(quiz.len(), 2);
    }

    #[tokio::test]
    async fn generator_passes_service_errors_through() {
        let canned = Canned(Err(ServiceError::QuotaExceeded { retry_after_seconds: None }));
        let generator = QuizGenerator::new(Arc::new(canned), Language::Arabic, Duration::from_secs(5));

        let result = generator.generate(&ticket()).await;
        assert_eq!(result, Err(ServiceError::QuotaExceeded { retry_after_seconds: None }));
    }

    #[test]
    fn placeholder_is_valid() {
        for language in [Language::Arabic, Language::French] {
            let quiz = placeholder_quiz("Primitive", language);
            assert!(quiz.validate().is_ok());
            assert!(quiz.questions[0].prompt.contains("Primitive"));
        }
    }
}
