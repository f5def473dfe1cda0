//! Catalog search and category filtering
//!
//! Search is plain case-insensitive substring containment over the subject
//! name, material title, description and category key. There is no ranking:
//! hits come back in catalog order. Both search and the category facet are
//! pure functions, cheap enough to rerun on every keystroke.

pub mod highlight;

use crate::catalog::{Catalog, Category, Material, Subject};

pub use highlight::{Segment, highlight};

/// Case fold used for every comparison
pub(crate) fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// A material that matched, with its owning subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub material: &'a Material,
    pub subject: &'a Subject,
}

/// A trimmed, case-folded, non-empty query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    folded: String,
}

impl Query {
    /// Prepare a query; blank input is no query at all
    pub fn new(raw: &str) -> Option<Self> {
        let folded = fold(raw.trim());
        if folded.is_empty() { None } else { Some(Self { folded }) }
    }

    /// The folded query text
    pub fn as_str(&self) -> &str {
        &self.folded
    }

    fn contains(&self, haystack: &str) -> bool {
        fold(haystack).contains(&self.folded)
    }

    /// Whether `material` (owned by `subject`) matches
    pub fn matches(&self, subject: &Subject, material: &Material) -> bool {
        self.contains(&subject.name)
            || self.contains(&material.title)
            || material.description.as_deref().is_some_and(|d| self.contains(d))
            || self.contains(material.category.as_str())
    }
}

/// Search every subject for `query`
///
/// An empty or whitespace-only query means search is inactive and yields
/// no hits.
pub fn search<'a>(query: &str, subjects: &'a [Subject]) -> Vec<SearchHit<'a>> {
    let Some(query) = Query::new(query) else {
        return Vec::new();
    };

    subjects
        .iter()
        .flat_map(|subject| {
            let query = &query;
            subject
                .materials
                .iter()
                .filter(move |material| query.matches(subject, material))
                .map(move |material| SearchHit { material, subject })
        })
        .collect()
}

/// Category facet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Pass everything through
    #[default]
    All,
    /// Keep only one category
    Only(Category),
}

impl CategoryFilter {
    /// Whether a material passes the filter
    pub fn matches(&self, material: &Material) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => material.category == *category,
        }
    }

    /// Parse `"all"` or a category key
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Some(Self::All)
        } else {
            Category::parse(s).map(Self::Only)
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown category: {}. Options: all, lesson, summary, video, series, exam, assignment",
                s
            )
        })
    }
}

/// Narrow a subject's materials by category and text, with AND semantics
///
/// Unlike [`search`], a blank query here does not narrow anything.
pub fn filter_materials<'a>(
    subject: &'a Subject,
    filter: CategoryFilter,
    query: &str,
) -> Vec<&'a Material> {
    let query = Query::new(query);

    subject
        .materials
        .iter()
        .filter(|m| filter.matches(m))
        .filter(|m| query.as_ref().is_none_or(|q| q.matches(subject, m)))
        .collect()
}

/// Hits sharing one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectGroup<'a> {
    pub subject: &'a Subject,
    pub materials: Vec<&'a Material>,
}

/// Group hits under their subjects, keeping first-seen order
pub fn group_by_subject<'a>(hits: &[SearchHit<'a>]) -> Vec<SubjectGroup<'a>> {
    let mut groups: Vec<SubjectGroup<'a>> = Vec::new();

    for hit in hits {
        match groups.iter_mut().find(|g| g.subject.id == hit.subject.id) {
            Some(group) => group.materials.push(hit.material),
            None => groups.push(SubjectGroup { subject: hit.subject, materials: vec![hit.material] }),
        }
    }

    groups
}

/// Owned reference to a hit, stable across catalog borrows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRef {
    pub subject_id: String,
    pub material_id: String,
}

impl From<&SearchHit<'_>> for HitRef {
    fn from(hit: &SearchHit<'_>) -> Self {
        Self { subject_id: hit.subject.id.clone(), material_id: hit.material.id.clone() }
    }
}

/// Proof that a query was issued; results are accepted only for the newest one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    token: u64,
    query: String,
}

impl QueryTicket {
    /// The query text this ticket was issued for
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Current query and the result set that belongs to it
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    latest: u64,
    results: Vec<HitRef>,
}

impl SearchState {
    /// Record a new query text and get a ticket for its results
    pub fn issue(&mut self, query: impl Into<String>) -> QueryTicket {
        self.latest += 1;
        self.query = query.into();
        QueryTicket { token: self.latest, query: self.query.clone() }
    }

    /// Install results for `ticket`; returns false when a newer query superseded it
    pub fn apply(&mut self, ticket: &QueryTicket, hits: &[SearchHit<'_>]) -> bool {
        if ticket.token != self.latest {
            tracing::debug!("Dropping results for stale query {:?}", ticket.query);
            return false;
        }
        self.results = hits.iter().map(HitRef::from).collect();
        true
    }

    /// Issue, run and apply a query in one step
    pub fn run(&mut self, query: &str, catalog: &Catalog) -> &[HitRef] {
        let ticket = self.issue(query);
        let hits = search(ticket.query(), catalog.subjects());
        self.apply(&ticket, &hits);
        &self.results
    }

    /// The most recently issued query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Results for the most recently applied query
    pub fn results(&self) -> &[HitRef] {
        &self.results
    }

    /// Whether a non-blank query is in effect
    pub fn is_active(&self) -> bool {
        Query::new(&self.query).is_some()
    }

    /// Clear the query and its results, invalidating outstanding tickets
    pub fn clear(&mut self) {
        self.latest += 1;
        self.query.clear();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SubjectIcon;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn material(id: &str, title: &str, category: Category, description: Option<&str>) -> Material {
        Material {
            id: id.into(),
            title: title.into(),
            category,
            date: "2026-01".into(),
            url: "https://example.com".into(),
            description: description.map(Into::into),
            duration: None,
            quiz: None,
        }
    }

    fn subjects() -> Vec<Subject> {
        vec![
            Subject {
                id: "math".into(),
                name: "الرياضيات".into(),
                color: "blue".into(),
                icon: SubjectIcon::Calculator,
                materials: vec![
                    material("math-1", "Limite d'une suite", Category::Lesson, Some("Suites numériques")),
                    material("math-2", "Primitive", Category::Summary, None),
                    material("math-3", "Etude des fonctions", Category::Video, None),
                ],
            },
            Subject {
                id: "philo".into(),
                name: "الفلسفة".into(),
                color: "slate".into(),
                icon: SubjectIcon::Moon,
                materials: vec![
                    material("phil-1", "مفهوم الحقيقة", Category::Lesson, Some("دراسة الحقيقة")),
                    material("phil-2", "فحص نموذجي", Category::Exam, None),
                ],
            },
        ]
    }

    fn ids(hits: &[SearchHit]) -> Vec<String> {
        hits.iter().map(|h| h.material.id.clone()).collect()
    }

    #[test]
    fn empty_query_is_inactive() {
        let subjects = subjects();
        assert!(search("", &subjects).is_empty());
        assert!(search("  \t ", &subjects).is_empty());
    }

    #[test]
    fn matches_title_case_insensitively() {
        let subjects = subjects();
        assert_eq!(ids(&search("  PRIMITIVE ", &subjects)), vec!["math-2"]);
    }

    #[test]
    fn matches_description() {
        let subjects = subjects();
        assert_eq!(ids(&search("numériques", &subjects)), vec!["math-1"]);
    }

    #[test]
    fn matches_category_key() {
        let subjects = subjects();
        assert_eq!(ids(&search("exam", &subjects)), vec!["phil-2"]);
        assert_eq!(ids(&search("video", &subjects)), vec!["math-3"]);
        // phil-1 has only Arabic text, so the key is its sole match
        assert_eq!(ids(&search("lesson", &subjects)), vec!["math-1", "phil-1"]);
    }

    #[test]
    fn subject_name_matches_all_its_materials() {
        let subjects = subjects();
        let hits = search("فلسفة", &subjects);

        assert_eq!(ids(&hits), vec!["phil-1", "phil-2"]);
        assert!(hits.iter().all(|h| h.subject.id == "philo"));
    }

    #[test]
    fn results_follow_catalog_order() {
        let subjects = subjects();
        let hits = search("e", &subjects);
        assert_eq!(ids(&hits), vec!["math-1", "math-2", "math-3", "phil-1", "phil-2"]);
    }

    #[test]
    fn category_filter_and_query_combine() {
        let subjects = subjects();
        let math = &subjects[0];

        let lessons = filter_materials(math, CategoryFilter::Only(Category::Lesson), "");
        assert_eq!(lessons.len(), 1);

        let none = filter_materials(math, CategoryFilter::Only(Category::Lesson), "primitive");
        assert!(none.is_empty());

        let summary = filter_materials(math, CategoryFilter::Only(Category::Summary), "primitive");
        assert_eq!(summary[0].id, "math-2");

        assert_eq!(filter_materials(math, CategoryFilter::All, "   ").len(), 3);
    }

    #[test]
    fn category_filter_parse() {
        assert_eq!(CategoryFilter::parse("ALL"), Some(CategoryFilter::All));
        assert_eq!(CategoryFilter::parse("exam"), Some(CategoryFilter::Only(Category::Exam)));
        assert_eq!(CategoryFilter::parse("podcasts"), None);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let subjects = subjects();
        let hits = search("e", &subjects);
        let groups = group_by_subject(&hits);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].subject.id, "math");
        assert_eq!(groups[0].materials.len(), 3);
        assert_eq!(groups[1].subject.id, "philo");
        assert_eq!(groups[1].materials.len(), 2);
    }

    #[test]
    fn stale_results_are_dropped() {
        let subjects = subjects();
        let mut state = SearchState::default();

        let slow = state.issue("primitive");
        let fast = state.issue("فلسفة");

        assert!(state.apply(&fast, &search(fast.query(), &subjects)));
        assert!(!state.apply(&slow, &search(slow.query(), &subjects)));

        assert_eq!(state.query(), "فلسفة");
        assert_eq!(state.results().len(), 2);
        assert!(state.results().iter().all(|r| r.subject_id == "philo"));
    }

    #[test]
    fn clear_invalidates_outstanding_tickets() {
        let subjects = subjects();
        let mut state = SearchState::default();

        let ticket = state.issue("primitive");
        state.clear();

        assert!(!state.apply(&ticket, &search(ticket.query(), &subjects)));
        assert!(!state.is_active());
        assert!(state.results().is_empty());
    }

    proptest! {
        #[test]
        fn every_hit_contains_the_query(query in "[a-zé ]{0,4}") {
            let subjects = subjects();
            let hits = search(&query, &subjects);
            let needle = fold(query.trim());

            if needle.is_empty() {
                prop_assert!(hits.is_empty());
            }

            for hit in hits {
                let fields = [
                    Some(hit.subject.name.as_str()),
                    Some(hit.material.title.as_str()),
                    hit.material.description.as_deref(),
                    Some(hit.material.category.as_str()),
                ];
                prop_assert!(fields.iter().flatten().any(|f| fold(f).contains(&needle)));
            }
        }

        #[test]
        fn search_misses_nothing(query in "[a-z]{1,3}") {
            let subjects = subjects();
            let hit_ids: Vec<_> = search(&query, &subjects).iter().map(|h| h.material.id.clone()).collect();

            for subject in &subjects {
                for material in &subject.materials {
                    let q = Query::new(&query).unwrap();
                    prop_assert_eq!(q.matches(subject, material), hit_ids.contains(&material.id));
                }
            }
        }
    }
}
