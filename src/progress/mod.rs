//! Per-material progress tracking
//!
//! Progress is an integer percentage per material, persisted through a
//! [`KeyValueStore`] under `progress_<material id>`. Every write goes through
//! [`ProgressTracker::set_progress`], which clamps to 0..=100 and keeps the
//! maximum of the stored and candidate values. That makes reading-time and
//! quiz-completion writes commutative: any interleaving ends at the same value.

pub mod reading;

use serde::{Deserialize, Serialize};

use crate::catalog::Subject;
use crate::config::{KeyValueStore, Language};

pub use reading::{ReadingPolicy, ReadingTimer};

/// Progress percentage for a fully completed material
pub const COMPLETE: u8 = 100;

/// Fixed amounts applied by the progress signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressPolicy {
    /// Value set when a never-opened material is first opened
    pub opened_marker: u8,
    /// Amount added on finishing a quiz
    pub quiz_bonus: u8,
    /// Reading-time conversion
    pub reading: ReadingPolicy,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self { opened_marker: 5, quiz_bonus: 50, reading: ReadingPolicy::default() }
    }
}

/// Display bucket for a progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressTier {
    NotStarted,
    InProgress,
    Reading,
    Completed,
}

impl ProgressTier {
    /// Bucket a percentage
    pub fn of(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1..=49 => Self::InProgress,
            50..=99 => Self::Reading,
            _ => Self::Completed,
        }
    }

    /// Short label; empty for materials never opened
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Self::NotStarted, _) => "",
            (Self::InProgress, Language::Arabic) => "جاري",
            (Self::InProgress, Language::French) => "En cours",
            (Self::Reading, Language::Arabic) => "قراءة",
            (Self::Reading, Language::French) => "Lecture",
            (Self::Completed, Language::Arabic) => "مكتمل",
            (Self::Completed, Language::French) => "Terminé",
        }
    }
}

/// Aggregate progress over one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectSummary {
    pub total: usize,
    pub started: usize,
    pub completed: usize,
    /// Rounded mean percentage over all materials, 0 for an empty subject
    pub average: u8,
}

/// Reads and raises progress values in a key-value store
#[derive(Debug, Clone)]
pub struct ProgressTracker<S> {
    store: S,
    policy: ProgressPolicy,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Track progress in `store` with the given constants
    pub fn new(store: S, policy: ProgressPolicy) -> Self {
        Self { store, policy }
    }

    /// Storage key for a material
    pub fn key(material_id: &str) -> String {
        format!("progress_{}", material_id)
    }

    /// The constants in effect
    pub fn policy(&self) -> &ProgressPolicy {
        &self.policy
    }

    /// Stored progress; absent or unreadable values count as 0
    pub fn get_progress(&self, material_id: &str) -> u8 {
        self.store
            .get(&Self::key(material_id))
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map_or(0, |v| v.clamp(0, i64::from(COMPLETE)) as u8)
    }

    /// Raise progress to `candidate` if it is higher; returns the stored value
    ///
    /// The candidate is clamped to 0..=100 first, so any input is safe.
    pub fn set_progress(&mut self, material_id: &str, candidate: i64) -> u8 {
        let current = self.get_progress(material_id);
        let candidate = candidate.clamp(0, i64::from(COMPLETE)) as u8;

        if candidate <= current {
            return current;
        }

        self.store.set(&Self::key(material_id), candidate.to_string());
        tracing::debug!("Progress for {} raised {} -> {}", material_id, current, candidate);
        candidate
    }

    /// Mark a material as opened; no effect once it has any progress
    pub fn open_material(&mut self, material_id: &str) -> u8 {
        let current = self.get_progress(material_id);
        if current > 0 {
            return current;
        }
        self.set_progress(material_id, i64::from(self.policy.opened_marker))
    }

    /// Report a reading-time contribution
    pub fn record_reading(&mut self, material_id: &str, contribution: u8) -> u8 {
        self.set_progress(material_id, i64::from(contribution))
    }

    /// Add the quiz bonus on top of current progress, capped at 100
    pub fn record_quiz_completion(&mut self, material_id: &str) -> u8 {
        let current = self.get_progress(material_id);
        let raised = (u16::from(current) + u16::from(self.policy.quiz_bonus)).min(u16::from(COMPLETE));
        let stored = self.set_progress(material_id, i64::from(raised));
        tracing::info!("Quiz completed for {}, progress now {}%", material_id, stored);
        stored
    }

    /// Display bucket for a material
    pub fn tier(&self, material_id: &str) -> ProgressTier {
        ProgressTier::of(self.get_progress(material_id))
    }

    /// Totals for one subject
    pub fn subject_summary(&self, subject: &Subject) -> SubjectSummary {
        let values: Vec<u8> = subject.materials.iter().map(|m| self.get_progress(&m.id)).collect();
        let total = values.len();
        let sum: usize = values.iter().map(|&v| usize::from(v)).sum();

        SubjectSummary {
            total,
            started: values.iter().filter(|&&v| v > 0).count(),
            completed: values.iter().filter(|&&v| v >= COMPLETE).count(),
            average: if total == 0 { 0 } else { ((sum as f64) / (total as f64)).round() as u8 },
        }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Material, SubjectIcon};
    use crate::config::MemoryStore;
    use proptest::prelude::*;

    fn tracker() -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(MemoryStore::new(), ProgressPolicy::default())
    }

    #[test]
    fn absent_progress_is_zero() {
        assert_eq!(tracker().get_progress("math-1"), 0);
    }

    #[test]
    fn stored_under_prefixed_key() {
        let mut t = tracker();
        t.set_progress("math-1", 42);
        assert_eq!(t.store().get("progress_math-1").as_deref(), Some("42"));
    }

    #[test]
    fn never_decreases() {
        let mut t = tracker();
        assert_eq!(t.set_progress("m", 30), 30);
        assert_eq!(t.set_progress("m", 10), 30);
        assert_eq!(t.get_progress("m"), 30);
    }

    #[test]
    fn out_of_range_is_clamped() {
        let mut t = tracker();
        assert_eq!(t.set_progress("m", -20), 0);
        assert_eq!(t.set_progress("m", 250), 100);
    }

    #[test]
    fn garbage_in_store_reads_as_zero() {
        let mut store = MemoryStore::new();
        store.set("progress_m", "lots".into());
        store.set("progress_n", "900".into());
        let t = ProgressTracker::new(store, ProgressPolicy::default());

        assert_eq!(t.get_progress("m"), 0);
        assert_eq!(t.get_progress("n"), 100);
    }

    #[test]
    fn opening_sets_marker_once() {
        let mut t = tracker();
        assert_eq!(t.open_material("m"), 5);
        t.set_progress("m", 30);
        assert_eq!(t.open_material("m"), 30);
    }

    #[test]
    fn quiz_bonus_adds_and_caps() {
        let mut t = tracker();
        t.set_progress("m", 20);
        assert_eq!(t.record_quiz_completion("m"), 70);
        assert_eq!(t.record_quiz_completion("m"), 100);
        assert_eq!(t.record_quiz_completion("m"), 100);
    }

    #[test]
    fn tiers() {
        assert_eq!(ProgressTier::of(0), ProgressTier::NotStarted);
        assert_eq!(ProgressTier::of(5), ProgressTier::InProgress);
        assert_eq!(ProgressTier::of(50), ProgressTier::Reading);
        assert_eq!(ProgressTier::of(100), ProgressTier::Completed);
        assert_eq!(ProgressTier::Completed.label(Language::French), "Terminé");
    }

    #[test]
    fn summary_over_subject() {
        let material = |id: &str| Material {
            id: id.into(),
            title: id.into(),
            category: Category::Lesson,
            date: "2026-01".into(),
            url: "u".into(),
            description: None,
            duration: None,
            quiz: None,
        };
        let subject = Subject {
            id: "math".into(),
            name: "Math".into(),
            color: "c".into(),
            icon: SubjectIcon::Calculator,
            materials: vec![material("a"), material("b"), material("c")],
        };

        let mut t = tracker();
        t.set_progress("a", 100);
        t.set_progress("b", 5);

        let summary = t.subject_summary(&subject);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.started, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.average, 35);
    }

    proptest! {
        #[test]
        fn stored_value_is_running_max(values in prop::collection::vec(-50i64..200, 1..20)) {
            let mut t = tracker();
            for &v in &values {
                t.set_progress("m", v);
            }
            let expected = values.iter().map(|v| (*v).clamp(0, 100)).max().unwrap_or(0);
            prop_assert_eq!(i64::from(t.get_progress("m")), expected);
        }

        #[test]
        fn always_within_bounds(v in any::<i64>()) {
            let mut t = tracker();
            let stored = t.set_progress("m", v);
            prop_assert!(stored <= 100);
        }

        #[test]
        fn write_order_does_not_matter(values in prop::collection::vec(0i64..=100, 1..10)) {
            let mut forward = tracker();
            let mut backward = tracker();
            for &v in &values {
                forward.set_progress("m", v);
            }
            for &v in values.iter().rev() {
                backward.set_progress("m", v);
            }
            prop_assert_eq!(forward.get_progress("m"), backward.get_progress("m"));
        }
    }
}
