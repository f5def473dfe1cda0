//! Application facade tying catalog, progress, quizzes and the assistant together
//!
//! [`App`] owns the catalog and the progress tracker. Opening a material
//! returns a [`MaterialViewer`] carrying that material's reading timer and
//! quiz session; progress-raising events on the viewer go back through the
//! app so every write hits the tracker.

pub mod command;
pub mod console;

use std::sync::Arc;
use std::time::Duration;

use crate::assistant::{AssistantSession, SendError};
use crate::catalog::{Catalog, Material, Subject};
use crate::claude::{Message, ServiceError, TextGenerator};
use crate::clock::Clock;
use crate::config::{Config, KeyValueStore, Language};
use crate::progress::{ProgressTracker, ReadingTimer, SubjectSummary};
use crate::quiz::{
    Advanced, AnswerOutcome, GenerationOutcome, QuizEngine, QuizFallback, QuizGenerator,
};
use crate::search::{self, CategoryFilter, SearchHit};

/// One opened material with its reading timer and quiz session
#[derive(Debug, Clone)]
pub struct MaterialViewer {
    material: Material,
    subject_id: String,
    reading: Option<ReadingTimer>,
    quiz: QuizEngine,
}

impl MaterialViewer {
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Owning subject id
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Reading timer; only document materials have one
    pub fn reading(&self) -> Option<&ReadingTimer> {
        self.reading.as_ref()
    }

    pub fn quiz(&self) -> &QuizEngine {
        &self.quiz
    }

    /// Move the reading clock forward (manual clocks only)
    pub fn advance_clock(&mut self, delta: Duration) {
        if let Some(timer) = self.reading.as_mut() {
            timer.advance(delta);
        }
    }
}

/// The study portal
pub struct App<S> {
    catalog: Catalog,
    tracker: ProgressTracker<S>,
    language: Language,
    fallback: QuizFallback,
    timeout: Duration,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl<S: KeyValueStore> App<S> {
    /// Build the app from a catalog, a progress store and configuration
    pub fn new(catalog: Catalog, store: S, config: &Config) -> Self {
        Self {
            catalog,
            tracker: ProgressTracker::new(store, config.progress),
            language: config.language,
            fallback: config.quiz_fallback,
            timeout: config.request_timeout(),
            generator: None,
        }
    }

    /// Enable quiz generation and the assistant
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &ProgressTracker<S> {
        &self.tracker
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether a generation service is configured
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Catalog-wide text search
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        search::search(query, self.catalog.subjects())
    }

    /// A subject's materials narrowed by category and text
    pub fn materials(
        &self,
        subject_id: &str,
        filter: CategoryFilter,
        query: &str,
    ) -> Option<(&Subject, Vec<&Material>)> {
        let subject = self.catalog.subject(subject_id)?;
        Some((subject, search::filter_materials(subject, filter, query)))
    }

    /// Stored progress for a material
    pub fn progress(&self, material_id: &str) -> u8 {
        self.tracker.get_progress(material_id)
    }

    /// Progress totals for a subject
    pub fn subject_summary(&self, subject_id: &str) -> Option<SubjectSummary> {
        self.catalog.subject(subject_id).map(|s| self.tracker.subject_summary(s))
    }

    /// Open a material: mark it opened, start its reading timer, bind its quiz
    pub fn open(&mut self, material_id: &str, clock: Clock) -> Option<MaterialViewer> {
        let (material, subject) = self.catalog.find_material(material_id)?;
        let material = material.clone();
        let subject_id = subject.id.clone();

        let progress = self.tracker.open_material(&material.id);
        tracing::info!("Opened {} ({}%)", material.id, progress);

        let reading = material
            .category
            .is_document()
            .then(|| ReadingTimer::start(material.id.clone(), self.tracker.policy().reading, clock));

        let quiz = match &material.quiz {
            Some(quiz) => QuizEngine::with_quiz(&material.id, &material.title, quiz.clone()),
            None => QuizEngine::new(&material.id, &material.title),
        }
        .with_fallback(self.fallback)
        .with_language(self.language);

        Some(MaterialViewer { material, subject_id, reading, quiz })
    }

    /// Report reading time; returns the stored progress
    pub fn tick_reading(&mut self, viewer: &mut MaterialViewer) -> u8 {
        if let Some(contribution) = viewer.reading.as_mut().and_then(ReadingTimer::tick) {
            return self.tracker.record_reading(&viewer.material.id, contribution);
        }
        self.tracker.get_progress(&viewer.material.id)
    }

    /// Answer the current question
    pub fn select_answer(&mut self, viewer: &mut MaterialViewer, option: usize) -> Option<AnswerOutcome> {
        viewer.quiz.select(option)
    }

    /// Move past a revealed answer, awarding the quiz bonus on first completion
    pub fn advance_quiz(&mut self, viewer: &mut MaterialViewer) -> Option<Advanced> {
        let advanced = viewer.quiz.advance()?;
        if let Advanced::Finished { score, first_completion: true } = advanced {
            tracing::info!("Finished quiz for {} with {}", viewer.material.id, score);
            self.tracker.record_quiz_completion(&viewer.material.id);
        }
        Some(advanced)
    }

    /// Start the viewer's quiz over
    pub fn restart_quiz(&mut self, viewer: &mut MaterialViewer) {
        viewer.quiz.restart();
    }

    /// Generate a quiz for a material that has none
    pub async fn generate_quiz(&self, viewer: &mut MaterialViewer) -> Option<GenerationOutcome> {
        let ticket = viewer.quiz.begin_generation()?;

        let result = match &self.generator {
            Some(generator) => {
                QuizGenerator::new(Arc::clone(generator), self.language, self.timeout)
                    .generate(&ticket)
                    .await
            }
            None => Err(ServiceError::MissingCredential),
        };

        Some(viewer.quiz.complete_generation(&ticket, result))
    }

    /// A new assistant conversation
    pub fn assistant(&self) -> AssistantSession {
        AssistantSession::new(self.language)
    }

    /// Send a message in an assistant conversation
    pub async fn ask<'s>(
        &self,
        session: &'s mut AssistantSession,
        text: &str,
    ) -> Result<&'s Message, SendError> {
        match &self.generator {
            Some(generator) => session.send(generator.as_ref(), self.timeout, text).await,
            None => {
                let (ticket, _) = session.prepare(text)?;
                session.resolve(ticket, Err(ServiceError::MissingCredential)).ok_or(SendError::Busy)
            }
        }
    }

    /// Progress store
    pub fn store(&self) -> &S {
        self.tracker.store()
    }

    /// Give the progress store back
    pub fn into_store(self) -> S {
        self.tracker.into_store()
    }
}
