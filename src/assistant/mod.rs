//! Study assistant conversation
//!
//! A thin boundary over the generation service. The session keeps the
//! transcript, sends the fixed system instruction with a bounded window of
//! recent turns, and turns every failure into an assistant-role message so
//! the user's own message is never lost.

use std::time::Duration;

use thiserror::Error;

use crate::claude::{CompletionRequest, Message, Role, ServiceError, TextGenerator, complete_with_timeout};
use crate::config::Language;

/// Prior turns sent along with each new message
pub const HISTORY_WINDOW: usize = 6;

/// Greeting that opens every transcript
pub fn greeting(language: Language) -> &'static str {
    match language {
        Language::Arabic => {
            "مرحباً! أنا مساعدك التعليمي الذكي. كيف يمكنني مساعدتك اليوم في التحضير للامتحانات؟"
        }
        Language::French => {
            "Bonjour ! Je suis ton assistant d'étude. Comment puis-je t'aider à préparer tes examens aujourd'hui ?"
        }
    }
}

/// Standing instruction given to the model
pub fn system_instruction(language: Language) -> String {
    format!(
        "You are a study assistant for students preparing the Moroccan baccalaureate exam. \
         Be encouraging, clear and concise. Give simple explanations of scientific and \
         mathematical concepts. Always answer in {} unless the student asks otherwise.",
        language.english_name()
    )
}

/// Assistant-role text explaining a failure
pub fn failure_message(err: &ServiceError, language: Language) -> String {
    let text = match (err, language) {
        (ServiceError::MissingCredential, Language::Arabic) => {
            "لم يتم تحديد مفتاح API. عيّن المتغير ANTHROPIC_API_KEY أو استعمل الأمر kasool key set."
        }
        (ServiceError::MissingCredential, Language::French) => {
            "Aucune clé API configurée. Définis ANTHROPIC_API_KEY ou lance kasool key set."
        }
        (ServiceError::InvalidCredential, Language::Arabic) => {
            "مفتاح API غير صالح. تحقق من المفتاح وحاول مرة أخرى."
        }
        (ServiceError::InvalidCredential, Language::French) => {
            "La clé API a été refusée. Vérifie-la puis réessaie."
        }
        (ServiceError::QuotaExceeded { .. }, Language::Arabic) => {
            "تم تجاوز حد الطلبات. حاول مرة أخرى لاحقاً."
        }
        (ServiceError::QuotaExceeded { .. }, Language::French) => {
            "Limite de requêtes atteinte. Réessaie plus tard."
        }
        (ServiceError::TimedOut, Language::Arabic) => "استغرق الطلب وقتاً طويلاً. حاول مرة أخرى.",
        (ServiceError::TimedOut, Language::French) => "La requête a expiré. Réessaie.",
        (ServiceError::TransportFailure(_), Language::Arabic) => {
            "عذراً، واجهت مشكلة في الاتصال. تأكد من اتصالك بالإنترنت."
        }
        (ServiceError::TransportFailure(_), Language::French) => {
            "Problème de connexion. Vérifie ta connexion Internet."
        }
        (_, Language::Arabic) => "عذراً، لم أتمكن من الإجابة. حاول مرة أخرى.",
        (_, Language::French) => "Désolé, je n'ai pas pu répondre. Réessaie.",
    };
    text.to_string()
}

fn empty_reply_message(language: Language) -> &'static str {
    match language {
        Language::Arabic => "عذراً، لم أستطع الإجابة.",
        Language::French => "Désolé, je n'ai pas de réponse.",
    }
}

/// Build the request for `user_text` following `recent_history`
///
/// Only the last [`HISTORY_WINDOW`] turns of the history are sent.
pub fn build_request(language: Language, user_text: &str, recent_history: &[Message]) -> CompletionRequest {
    let start = recent_history.len().saturating_sub(HISTORY_WINDOW);
    CompletionRequest::prompt(user_text)
        .with_system(system_instruction(language))
        .with_history(recent_history[start..].to_vec())
}

/// Single-shot exchange: send `user_text` with context and return the reply
pub async fn send(
    generator: &dyn TextGenerator,
    timeout: Duration,
    language: Language,
    user_text: &str,
    recent_history: &[Message],
) -> Result<String, ServiceError> {
    let request = build_request(language, user_text, recent_history);
    complete_with_timeout(generator, request, timeout).await
}

/// Why a message could not be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message is empty")]
    Blank,
    #[error("still waiting for the previous reply")]
    Busy,
}

/// Proof of an outstanding reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTicket {
    token: u64,
}

/// A conversation with the assistant
#[derive(Debug, Clone)]
pub struct AssistantSession {
    language: Language,
    transcript: Vec<Message>,
    issued: u64,
    pending: Option<u64>,
}

impl AssistantSession {
    /// A fresh session opened with the greeting
    pub fn new(language: Language) -> Self {
        Self {
            language,
            transcript: vec![Message::assistant(greeting(language))],
            issued: 0,
            pending: None,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Every turn so far, greeting included
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Whether a reply is outstanding
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the user's message and build the request for it
    pub fn prepare(&mut self, text: &str) -> Result<(ReplyTicket, CompletionRequest), SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::Blank);
        }
        if self.pending.is_some() {
            return Err(SendError::Busy);
        }

        let request = build_request(self.language, text, &self.transcript);
        self.transcript.push(Message::user(text));

        self.issued += 1;
        self.pending = Some(self.issued);
        Ok((ReplyTicket { token: self.issued }, request))
    }

    /// Append the reply, or an explanation of the failure
    ///
    /// Returns the appended turn, or `None` when the ticket is stale.
    pub fn resolve(
        &mut self,
        ticket: ReplyTicket,
        result: Result<String, ServiceError>,
    ) -> Option<&Message> {
        if self.pending != Some(ticket.token) {
            tracing::debug!("Ignoring stale assistant reply");
            return None;
        }
        self.pending = None;

        let content = match result {
            Ok(text) if text.trim().is_empty() => empty_reply_message(self.language).to_string(),
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                tracing::warn!("Assistant request failed: {}", err);
                failure_message(&err, self.language)
            }
        };

        self.transcript.push(Message::assistant(content));
        self.transcript.last()
    }

    /// Prepare, call the generator and resolve in one step
    pub async fn send(
        &mut self,
        generator: &dyn TextGenerator,
        timeout: Duration,
        text: &str,
    ) -> Result<&Message, SendError> {
        let (ticket, request) = self.prepare(text)?;
        let result = complete_with_timeout(generator, request, timeout).await;
        self.resolve(ticket, result).ok_or(SendError::Busy)
    }

    /// Reset to the greeting; an in-flight reply will be ignored
    pub fn clear(&mut self) {
        self.transcript = vec![Message::assistant(greeting(self.language))];
        self.pending = None;
    }

    /// Number of user turns
    pub fn questions_asked(&self) -> usize {
        self.transcript.iter().filter(|m| m.role == Role::User).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned results and records what it was asked
    struct Scripted {
        replies: Mutex<Vec<Result<String, ServiceError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ServiceError>>) -> Self {
            Self { replies: Mutex::new(replies), seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
            self.seen.lock().unwrap().push(request);
            self.replies.lock().unwrap().remove(0)
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn starts_with_greeting() {
        let session = AssistantSession::new(Language::Arabic);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, Role::Assistant);
        assert_eq!(session.questions_asked(), 0);
    }

    #[test]
    fn blank_messages_rejected() {
        let mut session = AssistantSession::new(Language::Arabic);
        assert_eq!(session.prepare("   ").unwrap_err(), SendError::Blank);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn one_message_at_a_time() {
        let mut session = AssistantSession::new(Language::Arabic);
        session.prepare("first").unwrap();
        assert_eq!(session.prepare("second").unwrap_err(), SendError::Busy);
    }

    #[test]
    fn history_is_bounded() {
        let history: Vec<Message> =
            (0..10).map(|i| Message::user(format!("turn {}", i))).collect();
        let request = build_request(Language::French, "now", &history);

        assert_eq!(request.history.len(), HISTORY_WINDOW);
        assert_eq!(request.history[0].content, "turn 4");
        assert_eq!(request.prompt, "now");
        assert!(request.system.unwrap().contains("French"));
    }

    #[tokio::test]
    async fn reply_is_appended() {
        let generator = Scripted::new(vec![Ok("La dérivée mesure la variation.".into())]);
        let mut session = AssistantSession::new(Language::French);

        let reply = session.send(&generator, TIMEOUT, "C'est quoi une dérivée ?").await.unwrap();
        assert_eq!(reply.content, "La dérivée mesure la variation.");
        assert_eq!(session.transcript().len(), 3);
        assert!(!session.is_waiting());

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].history.len(), 1);
        assert_eq!(seen[0].history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn failure_keeps_user_message() {
        let generator = Scripted::new(vec![Err(ServiceError::MissingCredential)]);
        let mut session = AssistantSession::new(Language::Arabic);

        let reply = session.send(&generator, TIMEOUT, "ما هي المشتقة؟").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.contains("API"));

        let transcript = session.transcript();
        assert_eq!(transcript[1], Message::user("ما هي المشتقة؟"));
        assert_eq!(transcript.len(), 3);
    }

    #[tokio::test]
    async fn empty_reply_becomes_apology() {
        let generator = Scripted::new(vec![Ok("  ".into())]);
        let mut session = AssistantSession::new(Language::French);

        let reply = session.send(&generator, TIMEOUT, "Bonjour").await.unwrap();
        assert_eq!(reply.content, "Désolé, je n'ai pas de réponse.");
    }

    #[test]
    fn clear_drops_pending_reply() {
        let mut session = AssistantSession::new(Language::Arabic);
        let (ticket, _) = session.prepare("سؤال").unwrap();
        session.clear();

        assert!(session.resolve(ticket, Ok("late".into())).is_none());
        assert_eq!(session.transcript().len(), 1);
        assert!(!session.is_waiting());
    }

    #[test]
    fn timeout_and_transport_read_differently() {
        let timeout = failure_message(&ServiceError::TimedOut, Language::French);
        let transport = failure_message(&ServiceError::TransportFailure("x".into()), Language::French);
        let missing = failure_message(&ServiceError::MissingCredential, Language::French);
        assert_ne!(timeout, transport);
        assert_ne!(timeout, missing);
    }

    #[tokio::test]
    async fn free_send_uses_window() {
        let generator = Scripted::new(vec![Ok("ok".into())]);
        let history: Vec<Message> = (0..9).map(|i| Message::assistant(i.to_string())).collect();

        let reply = send(&generator, TIMEOUT, Language::Arabic, "hi", &history).await.unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(generator.seen.lock().unwrap()[0].history.len(), HISTORY_WINDOW);
    }
}
