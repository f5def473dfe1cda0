//! Content model for the study catalog
//!
//! Subjects group materials; a material may carry an authored quiz. Categories
//! and subject icons are closed enumerations so display metadata is checked
//! exhaustively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::links;
use crate::config::Language;

/// Number of options every quiz question must offer
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Kind of material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Full lesson document
    Lesson,
    /// Condensed summary
    Summary,
    /// Recorded explanation
    Video,
    /// Exercise series
    Series,
    /// Past or mock exam
    Exam,
    /// Supervised assignment
    Assignment,
}

impl Category {
    /// All categories in display order
    pub fn all() -> &'static [Category] {
        &[
            Self::Lesson,
            Self::Summary,
            Self::Video,
            Self::Series,
            Self::Exam,
            Self::Assignment,
        ]
    }

    /// Stable key, as written in catalog files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Summary => "summary",
            Self::Video => "video",
            Self::Series => "series",
            Self::Exam => "exam",
            Self::Assignment => "assignment",
        }
    }

    /// Parse a category key
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().iter().copied().find(|c| c.as_str() == s)
    }

    /// Localized plural label for category tabs
    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::Arabic, Self::Lesson) => "الدروس",
            (Language::Arabic, Self::Summary) => "الملخصات",
            (Language::Arabic, Self::Video) => "الفيديوهات",
            (Language::Arabic, Self::Series) => "السلاسل",
            (Language::Arabic, Self::Exam) => "الامتحانات",
            (Language::Arabic, Self::Assignment) => "الفروض",
            (Language::French, Self::Lesson) => "Cours",
            (Language::French, Self::Summary) => "Résumés",
            (Language::French, Self::Video) => "Vidéos",
            (Language::French, Self::Series) => "Séries",
            (Language::French, Self::Exam) => "Examens",
            (Language::French, Self::Assignment) => "Devoirs",
        }
    }

    /// Icon token
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Lesson => "BookOpen",
            Self::Summary => "FileCheck",
            Self::Video => "Youtube",
            Self::Series => "Layers",
            Self::Exam => "GraduationCap",
            Self::Assignment => "FileText",
        }
    }

    /// Accent color token
    pub fn accent(&self) -> &'static str {
        match self {
            Self::Lesson => "blue",
            Self::Summary => "emerald",
            Self::Video => "red",
            Self::Series => "purple",
            Self::Exam => "orange",
            Self::Assignment => "amber",
        }
    }

    /// Whether the material is read as a document (and earns reading progress)
    pub fn is_document(&self) -> bool {
        !matches!(self, Self::Video)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject icon token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectIcon {
    Calculator,
    Zap,
    Dna,
    FlaskConical,
    PenTool,
    BrainCircuit,
    Languages,
    Moon,
    /// Fallback for unknown tokens
    #[default]
    #[serde(other)]
    BookOpen,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question text
    #[serde(rename = "question")]
    pub prompt: String,
    /// Answer options, exactly [`OPTIONS_PER_QUESTION`] of them
    pub options: Vec<String>,
    /// Zero-based index of the correct option
    pub correct_index: usize,
}

impl Question {
    /// Whether `option` is the correct answer
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

/// An ordered question set bound to a material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Questions in play order
    pub questions: Vec<Question>,
}

/// Ways a question set can be malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizShapeError {
    /// No questions at all
    #[error("quiz has no questions")]
    Empty,

    /// A question with no text
    #[error("question {index} has no text")]
    BlankPrompt {
        /// Zero-based question index
        index: usize,
    },

    /// Wrong number of options
    #[error("question {index} has {count} options, expected {OPTIONS_PER_QUESTION}")]
    OptionCount {
        /// Zero-based question index
        index: usize,
        /// Options found
        count: usize,
    },

    /// Correct index outside the option list
    #[error("question {index} marks option {correct_index} as correct but has {options} options")]
    CorrectIndexOutOfRange {
        /// Zero-based question index
        index: usize,
        /// Declared correct option
        correct_index: usize,
        /// Options available
        options: usize,
    },
}

impl Quiz {
    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the quiz has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Check the structural invariants of the question set
    pub fn validate(&self) -> Result<(), QuizShapeError> {
        if self.questions.is_empty() {
            return Err(QuizShapeError::Empty);
        }

        for (index, q) in self.questions.iter().enumerate() {
            if q.prompt.trim().is_empty() {
                return Err(QuizShapeError::BlankPrompt { index });
            }
            if q.options.len() != OPTIONS_PER_QUESTION {
                return Err(QuizShapeError::OptionCount { index, count: q.options.len() });
            }
            if q.correct_index >= q.options.len() {
                return Err(QuizShapeError::CorrectIndexOutOfRange {
                    index,
                    correct_index: q.correct_index,
                    options: q.options.len(),
                });
            }
        }

        Ok(())
    }
}

/// A single piece of study content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Globally unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Kind of material
    #[serde(rename = "type", alias = "category")]
    pub category: Category,
    /// Display date (free-form, e.g. "2026-01-15")
    pub date: String,
    /// Content locator
    #[serde(rename = "fileUrl", alias = "url")]
    pub url: String,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display duration for videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Authored quiz, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
}

impl Material {
    /// URL suitable for an embedded viewer
    pub fn viewer_url(&self) -> String {
        links::preview_url(&self.url)
    }

    /// URL for a direct download
    pub fn download_url(&self) -> String {
        links::download_url(&self.url)
    }

    /// YouTube video id, for video materials with a recognizable link
    pub fn video_id(&self) -> Option<&str> {
        if self.category == Category::Video { links::youtube_id(&self.url) } else { None }
    }
}

/// A top-level academic subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color token
    pub color: String,
    /// Icon token
    #[serde(default)]
    pub icon: SubjectIcon,
    /// Materials in display order
    pub materials: Vec<Material>,
}

impl Subject {
    /// Count materials of a category
    pub fn count(&self, category: Category) -> usize {
        self.materials.iter().filter(|m| m.category == category).count()
    }
}
