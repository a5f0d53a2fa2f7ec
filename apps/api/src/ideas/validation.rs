//! Normalization applied to every idea before it is written to `blog_ideas`.
//! The column constraints accept only the values in the tables below.

use serde::Serialize;
use tracing::warn;

use crate::ideas::models::{BlogIdea, DEFAULT_WORD_COUNT};

pub const VALID_FORMATS: &[&str] = &[
    "how_to_guide",
    "listicle",
    "case_study",
    "comparison",
    "trend_analysis",
    "tutorial",
    "review",
    "interview",
    "opinion",
    "news_analysis",
    "resource_roundup",
    "checklist",
    "template",
    "interactive_tool",
    "infographic",
];

pub const VALID_DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced", "expert"];

pub const VALID_PRIORITIES: &[&str] = &["high", "medium", "low"];

/// Free-form format labels. Checked after the valid formats themselves, first
/// as exact matches and then as substrings, in this order.
const FORMAT_VARIATIONS: &[(&str, &str)] = &[
    ("how to guide", "how_to_guide"),
    ("how-to guide", "how_to_guide"),
    ("guide", "how_to_guide"),
    ("step by step guide", "how_to_guide"),
    ("beginner guide", "how_to_guide"),
    ("list", "listicle"),
    ("top 10", "listicle"),
    ("numbered list", "listicle"),
    ("tips list", "listicle"),
    ("case study", "case_study"),
    ("study", "case_study"),
    ("versus", "comparison"),
    ("vs", "comparison"),
    ("compare", "comparison"),
    ("trend report", "trend_analysis"),
    ("market analysis", "trend_analysis"),
    ("product review", "review"),
    ("tool review", "review"),
];

const DIFFICULTY_VARIATIONS: &[(&str, &str)] = &[
    ("easy", "beginner"),
    ("basic", "beginner"),
    ("simple", "beginner"),
    ("entry level", "beginner"),
    ("novice", "beginner"),
    ("medium", "intermediate"),
    ("moderate", "intermediate"),
    ("standard", "intermediate"),
    ("hard", "advanced"),
    ("difficult", "advanced"),
    ("complex", "advanced"),
    ("professional", "advanced"),
    ("expert level", "expert"),
    ("master", "expert"),
    ("specialist", "expert"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdeaValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

fn lookup(input: &str, valid: &[&'static str], variations: &[(&str, &'static str)]) -> Option<&'static str> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let exact = valid
        .iter()
        .copied()
        .find(|v| *v == lower)
        .or_else(|| variations.iter().find(|(k, _)| *k == lower).map(|(_, v)| *v));
    exact.or_else(|| {
        valid
            .iter()
            .copied()
            .find(|v| lower.contains(v))
            .or_else(|| {
                variations
                    .iter()
                    .find(|(k, _)| lower.contains(k))
                    .map(|(_, v)| *v)
            })
    })
}

pub fn normalize_content_format(input: &str) -> &'static str {
    lookup(input, VALID_FORMATS, FORMAT_VARIATIONS).unwrap_or("how_to_guide")
}

pub fn normalize_difficulty_level(input: &str) -> &'static str {
    lookup(input, VALID_DIFFICULTIES, DIFFICULTY_VARIATIONS).unwrap_or("intermediate")
}

/// Brings `idea` within the column constraints, reporting every correction.
pub fn validate_blog_idea(idea: &mut BlogIdea) -> IdeaValidation {
    let mut issues = Vec::new();

    let scores: [(&str, &mut i64); 6] = [
        ("overall_quality_score", &mut idea.overall_quality_score),
        ("viral_potential_score", &mut idea.viral_potential_score),
        ("seo_optimization_score", &mut idea.seo_optimization_score),
        ("audience_alignment_score", &mut idea.audience_alignment_score),
        ("content_feasibility_score", &mut idea.content_feasibility_score),
        ("business_impact_score", &mut idea.business_impact_score),
    ];
    for (name, score) in scores {
        if !(0..=100).contains(score) {
            issues.push(format!("Invalid {name} range: {score} (should be 0-100)"));
            *score = (*score).clamp(0, 100);
        }
    }

    if !VALID_FORMATS.contains(&idea.content_format.as_str()) {
        issues.push(format!("Invalid content_format: '{}'", idea.content_format));
        idea.content_format = normalize_content_format(&idea.content_format).to_string();
    }

    if !VALID_DIFFICULTIES.contains(&idea.difficulty_level.as_str()) {
        issues.push(format!("Invalid difficulty_level: '{}'", idea.difficulty_level));
        idea.difficulty_level = normalize_difficulty_level(&idea.difficulty_level).to_string();
    }

    if !VALID_PRIORITIES.contains(&idea.priority_level.as_str()) {
        issues.push(format!("Invalid priority_level: '{}'", idea.priority_level));
        idea.priority_level = "medium".to_string();
    }

    if idea.estimated_word_count <= 0 {
        issues.push(format!(
            "Invalid estimated_word_count: {}",
            idea.estimated_word_count
        ));
        idea.estimated_word_count = DEFAULT_WORD_COUNT;
    }

    if idea.estimated_reading_time <= 0 {
        issues.push(format!(
            "Invalid estimated_reading_time: {}",
            idea.estimated_reading_time
        ));
        idea.estimated_reading_time = (idea.estimated_word_count / 200).max(1);
    }

    if !issues.is_empty() {
        warn!("Validation issues for idea '{}': {issues:?}", idea.title);
    }

    IdeaValidation {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// Caps primary keywords at 5 and secondary at 8, dropping duplicates and any
/// secondary keyword already listed as primary.
pub fn clean_keywords(idea: &mut BlogIdea) {
    let mut primary: Vec<String> = Vec::new();
    for kw in idea.primary_keywords.drain(..) {
        let kw = kw.trim().to_string();
        if !kw.is_empty() && !primary.iter().any(|p| p.eq_ignore_ascii_case(&kw)) {
            primary.push(kw);
        }
    }
    primary.truncate(5);

    let mut secondary: Vec<String> = Vec::new();
    for kw in idea.secondary_keywords.drain(..) {
        let kw = kw.trim().to_string();
        let taken = primary.iter().chain(secondary.iter()).any(|p| p.eq_ignore_ascii_case(&kw));
        if !kw.is_empty() && !taken {
            secondary.push(kw);
        }
    }
    secondary.truncate(8);

    idea.primary_keywords = primary;
    idea.secondary_keywords = secondary;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_normalization() {
        assert_eq!(normalize_content_format("listicle"), "listicle");
        assert_eq!(normalize_content_format("How-To Guide"), "how_to_guide");
        assert_eq!(normalize_content_format("Top 10 list"), "listicle");
        assert_eq!(normalize_content_format("tool_review"), "review");
        assert_eq!(normalize_content_format("beginner_guide"), "how_to_guide");
        assert_eq!(normalize_content_format("podcast"), "how_to_guide");
        assert_eq!(normalize_content_format(""), "how_to_guide");
    }

    #[test]
    fn test_difficulty_normalization() {
        assert_eq!(normalize_difficulty_level("Easy"), "beginner");
        assert_eq!(normalize_difficulty_level("moderate"), "intermediate");
        assert_eq!(normalize_difficulty_level("very complex"), "advanced");
        assert_eq!(normalize_difficulty_level("expert level"), "expert");
        assert_eq!(normalize_difficulty_level("???"), "intermediate");
    }

    #[test]
    fn test_validate_clamps_and_repairs() {
        let mut idea = BlogIdea {
            title: "t".into(),
            overall_quality_score: 140,
            business_impact_score: -3,
            content_format: "case study".into(),
            priority_level: "urgent".into(),
            estimated_word_count: 0,
            estimated_reading_time: 0,
            ..Default::default()
        };
        let result = validate_blog_idea(&mut idea);
        assert!(!result.is_valid);
        assert_eq!(idea.overall_quality_score, 100);
        assert_eq!(idea.business_impact_score, 0);
        assert_eq!(idea.content_format, "case_study");
        assert_eq!(idea.priority_level, "medium");
        assert_eq!(idea.estimated_word_count, 2500);
        assert_eq!(idea.estimated_reading_time, 12);
        assert_eq!(result.issues.len(), 6);
    }

    #[test]
    fn test_valid_idea_has_no_issues() {
        let mut idea = BlogIdea {
            title: "t".into(),
            overall_quality_score: 70,
            ..Default::default()
        };
        let result = validate_blog_idea(&mut idea);
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_clean_keywords_caps_and_dedups() {
        let mut idea = BlogIdea {
            title: "t".into(),
            primary_keywords: vec!["a", "A", "b", "c", "d", "e", "f"]
                .into_iter()
                .map(String::from)
                .collect(),
            secondary_keywords: vec!["b", "x", "x", "y"].into_iter().map(String::from).collect(),
            ..Default::default()
        };
        clean_keywords(&mut idea);
        assert_eq!(idea.primary_keywords, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(idea.secondary_keywords, vec!["x", "y"]);
    }
}
