//! Study catalog: subjects, materials and authored quizzes
//!
//! The catalog is loaded wholesale at startup and is read-only afterwards.
//! Loading enforces the data-integrity rules the rest of the crate relies on:
//! subject ids and material ids are unique across the whole catalog, and
//! every authored quiz is well formed.

pub mod links;
pub mod model;
pub mod sheet;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use model::{Category, Material, Question, Quiz, QuizShapeError, Subject, SubjectIcon};
pub use sheet::LessonSheet;

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid JSON or has the wrong shape
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two subjects share an id
    #[error("Subject id '{0}' is used more than once")]
    DuplicateSubject(String),

    /// Two materials share an id
    #[error("Material id '{id}' appears in both '{first}' and '{second}'")]
    DuplicateMaterial {
        /// Colliding id
        id: String,
        /// Subject holding the first occurrence
        first: String,
        /// Subject holding the second occurrence
        second: String,
    },

    /// A material with a blank id or title
    #[error("Subject '{subject}' contains a material with a blank id or title")]
    BlankMaterial {
        /// Owning subject
        subject: String,
    },

    /// An authored quiz breaks the question-set invariants
    #[error("Quiz for material '{material}' is invalid: {source}")]
    InvalidQuiz {
        /// Material carrying the quiz
        material: String,
        /// What is wrong with it
        #[source]
        source: QuizShapeError,
    },
}

/// On-disk subject record; materials may be listed directly or as lesson sheets
#[derive(Debug, Deserialize)]
struct SubjectRecord {
    id: String,
    name: String,
    color: String,
    #[serde(default)]
    icon: SubjectIcon,
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    lessons: Vec<LessonSheet>,
    /// Id prefix for expanded lesson sheets (defaults to the subject id)
    #[serde(default)]
    prefix: Option<String>,
}

impl SubjectRecord {
    fn into_subject(self) -> Subject {
        let prefix = self.prefix.as_deref().unwrap_or(&self.id);
        let mut materials = self.materials;
        materials.extend(sheet::expand(prefix, &self.lessons));

        Subject { id: self.id, name: self.name, color: self.color, icon: self.icon, materials }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    subjects: Vec<SubjectRecord>,
}

/// The validated, immutable set of subjects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    subjects: Vec<Subject>,
}

impl Catalog {
    /// Build a catalog from subjects, enforcing integrity rules
    pub fn new(subjects: Vec<Subject>) -> Result<Self, CatalogError> {
        let mut subject_ids = HashSet::new();
        let mut material_owner: HashMap<&str, &str> = HashMap::new();

        for subject in &subjects {
            if !subject_ids.insert(subject.id.as_str()) {
                return Err(CatalogError::DuplicateSubject(subject.id.clone()));
            }

            for material in &subject.materials {
                if material.id.trim().is_empty() || material.title.trim().is_empty() {
                    return Err(CatalogError::BlankMaterial { subject: subject.id.clone() });
                }

                if let Some(first) = material_owner.insert(&material.id, &subject.id) {
                    return Err(CatalogError::DuplicateMaterial {
                        id: material.id.clone(),
                        first: first.to_string(),
                        second: subject.id.clone(),
                    });
                }

                if let Some(quiz) = &material.quiz {
                    quiz.validate().map_err(|source| CatalogError::InvalidQuiz {
                        material: material.id.clone(),
                        source,
                    })?;
                }
            }
        }

        Ok(Self { subjects })
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let subjects = file.subjects.into_iter().map(SubjectRecord::into_subject).collect();
        let catalog = Self::new(subjects)?;

        tracing::info!(
            "Loaded catalog with {} subjects and {} materials",
            catalog.subjects.len(),
            catalog.material_count()
        );

        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&contents)
    }

    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Subjects in catalog order
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Look up a subject by id
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Look up a material and its owning subject by material id
    pub fn find_material(&self, id: &str) -> Option<(&Material, &Subject)> {
        self.materials().find(|(m, _)| m.id == id)
    }

    /// All materials with their subjects, in catalog order
    pub fn materials(&self) -> impl Iterator<Item = (&Material, &Subject)> {
        self.subjects.iter().flat_map(|s| s.materials.iter().map(move |m| (m, s)))
    }

    /// Total number of materials
    pub fn material_count(&self) -> usize {
        self.subjects.iter().map(|s| s.materials.len()).sum()
    }
}
