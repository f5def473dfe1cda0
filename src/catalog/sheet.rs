//! Lesson sheets: the compact authoring format
//!
//! A sheet names one lesson and links to whichever of its documents exist.
//! Each present link becomes a material with an id derived from the subject
//! prefix, the link kind and the sheet position.

use serde::{Deserialize, Serialize};

use super::model::{Category, Material};

/// One lesson with its optional companion documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSheet {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<String>,
}

impl LessonSheet {
    fn links(&self) -> [(Category, Option<&String>); 6] {
        [
            (Category::Lesson, self.pdf.as_ref()),
            (Category::Summary, self.summary.as_ref()),
            (Category::Video, self.video.as_ref()),
            (Category::Series, self.series.as_ref()),
            (Category::Exam, self.exam.as_ref()),
            (Category::Assignment, self.assignment.as_ref()),
        ]
    }
}

fn id_segment(category: Category) -> &'static str {
    match category {
        Category::Lesson => "lesson",
        Category::Summary => "sum",
        Category::Video => "vid",
        Category::Series => "ser",
        Category::Exam => "exam",
        Category::Assignment => "assign",
    }
}

fn title_for(category: Category, title: &str) -> String {
    match category {
        Category::Lesson => title.to_string(),
        Category::Summary => format!("ملخص: {}", title),
        Category::Video => format!("شرح فيديو: {}", title),
        Category::Series => format!("سلسلة تمارين: {}", title),
        Category::Exam => format!("نماذج امتحانات: {}", title),
        Category::Assignment => format!("فروض محروسة: {}", title),
    }
}

fn date_for(category: Category) -> &'static str {
    match category {
        Category::Exam | Category::Assignment => "2026-02",
        _ => "2026-01",
    }
}

/// Expand sheets into materials, in sheet order then link order
pub fn expand(prefix: &str, sheets: &[LessonSheet]) -> Vec<Material> {
    let mut materials = Vec::new();

    for (index, sheet) in sheets.iter().enumerate() {
        for (category, url) in sheet.links() {
            let Some(url) = url else {
                continue;
            };

            let description = (category == Category::Lesson)
                .then(|| format!("الدرس الكامل لـ {}", sheet.title));

            materials.push(Material {
                id: format!("{}-{}-{}", prefix, id_segment(category), index),
                title: title_for(category, &sheet.title),
                category,
                date: date_for(category).to_string(),
                url: url.clone(),
                description,
                duration: None,
                quiz: None,
            });
        }
    }

    materials
}
