use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::ideas::planning::{ContentCalendar, StrategicInsights, SuccessPredictions};
use crate::storage::decode_json_column;

pub const DEFAULT_WORD_COUNT: i64 = 2500;

/// One blog idea, as generated, scored and stored in `blog_ideas`.
///
/// List and map fields are stored as JSON text in Supabase; [`BlogIdea::from_value`]
/// accepts both that form and native JSON, so the same reader serves LLM output
/// and database rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogIdea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub content_format: String,
    pub difficulty_level: String,
    pub estimated_word_count: i64,
    pub estimated_reading_time: i64,
    pub overall_quality_score: i64,
    pub viral_potential_score: i64,
    pub seo_optimization_score: i64,
    pub audience_alignment_score: i64,
    pub content_feasibility_score: i64,
    pub business_impact_score: i64,
    pub primary_keywords: Vec<String>,
    pub secondary_keywords: Vec<String>,
    pub featured_snippet_opportunity: bool,
    pub outline: Vec<String>,
    pub key_points: Vec<String>,
    pub engagement_hooks: Vec<String>,
    pub visual_elements: Vec<String>,
    pub call_to_action: String,
    pub business_value: String,
    pub performance_estimates: Value,
    pub generation_source: String,
    #[serde(default)]
    pub source_topic_id: Option<String>,
    #[serde(default)]
    pub source_opportunity_id: Option<String>,
    pub selected: bool,
    pub priority_level: String,
    #[serde(default)]
    pub scheduled_publish_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Default for BlogIdea {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            content_format: "how_to_guide".to_string(),
            difficulty_level: "intermediate".to_string(),
            estimated_word_count: DEFAULT_WORD_COUNT,
            estimated_reading_time: 12,
            overall_quality_score: 0,
            viral_potential_score: 0,
            seo_optimization_score: 0,
            audience_alignment_score: 0,
            content_feasibility_score: 0,
            business_impact_score: 0,
            primary_keywords: Vec::new(),
            secondary_keywords: Vec::new(),
            featured_snippet_opportunity: false,
            outline: Vec::new(),
            key_points: Vec::new(),
            engagement_hooks: Vec::new(),
            visual_elements: Vec::new(),
            call_to_action: String::new(),
            business_value: String::new(),
            performance_estimates: Value::Object(Map::new()),
            generation_source: String::new(),
            source_topic_id: None,
            source_opportunity_id: None,
            selected: false,
            priority_level: "medium".to_string(),
            scheduled_publish_date: None,
            notes: None,
            created_at: None,
        }
    }
}

/// The five component scores plus the weighted overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdeaScores {
    pub viral_potential_score: i64,
    pub seo_optimization_score: i64,
    pub audience_alignment_score: i64,
    pub content_feasibility_score: i64,
    pub business_impact_score: i64,
    pub overall_quality_score: i64,
}

impl IdeaScores {
    pub fn to_json(&self) -> Value {
        json!({
            "viral_potential_score": self.viral_potential_score,
            "seo_optimization_score": self.seo_optimization_score,
            "audience_alignment_score": self.audience_alignment_score,
            "content_feasibility_score": self.content_feasibility_score,
            "business_impact_score": self.business_impact_score,
            "overall_quality_score": self.overall_quality_score,
        })
    }
}

/// Everything one generation run produces for an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct BlogGenerationResult {
    pub ideas: Vec<BlogIdea>,
    pub content_calendar: ContentCalendar,
    pub strategic_insights: StrategicInsights,
    pub success_predictions: SuccessPredictions,
    pub ideas_by_source: BTreeMap<String, usize>,
    pub processing_time_seconds: f64,
}

/// Which model produced a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmInfo {
    pub provider: String,
    pub model: String,
}

fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Integers may arrive as floats or numeric strings from the LLM.
fn integer(row: &Value, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

fn flag(row: &Value, key: &str) -> Option<bool> {
    match row.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
        _ => None,
    }
}

fn string_list(row: &Value, key: &str) -> Vec<String> {
    match decode_json_column(row.get(key), json!([])) {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl BlogIdea {
    /// Reads an idea from LLM output or a stored row. Returns `None` when the
    /// value has no usable title. Missing scores read as 0.
    pub fn from_value(row: &Value) -> Option<Self> {
        let title = text(row, "title")?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let defaults = Self::default();
        let performance_estimates = match decode_json_column(
            row.get("performance_estimates"),
            json!({}),
        ) {
            v @ Value::Object(_) => v,
            _ => json!({}),
        };

        Some(Self {
            id: text(row, "id"),
            title,
            description: text(row, "description").unwrap_or_default(),
            content_format: text(row, "content_format").unwrap_or(defaults.content_format),
            difficulty_level: text(row, "difficulty_level").unwrap_or(defaults.difficulty_level),
            estimated_word_count: integer(row, "estimated_word_count")
                .unwrap_or(DEFAULT_WORD_COUNT),
            estimated_reading_time: integer(row, "estimated_reading_time")
                .unwrap_or(defaults.estimated_reading_time),
            overall_quality_score: integer(row, "overall_quality_score").unwrap_or(0),
            viral_potential_score: integer(row, "viral_potential_score").unwrap_or(0),
            seo_optimization_score: integer(row, "seo_optimization_score").unwrap_or(0),
            audience_alignment_score: integer(row, "audience_alignment_score").unwrap_or(0),
            content_feasibility_score: integer(row, "content_feasibility_score").unwrap_or(0),
            business_impact_score: integer(row, "business_impact_score").unwrap_or(0),
            primary_keywords: string_list(row, "primary_keywords"),
            secondary_keywords: string_list(row, "secondary_keywords"),
            featured_snippet_opportunity: flag(row, "featured_snippet_opportunity")
                .unwrap_or(false),
            outline: string_list(row, "outline"),
            key_points: string_list(row, "key_points"),
            engagement_hooks: string_list(row, "engagement_hooks"),
            visual_elements: string_list(row, "visual_elements"),
            call_to_action: text(row, "call_to_action").unwrap_or_default(),
            business_value: text(row, "business_value").unwrap_or_default(),
            performance_estimates,
            generation_source: text(row, "generation_source").unwrap_or_default(),
            source_topic_id: text(row, "source_topic_id"),
            source_opportunity_id: text(row, "source_opportunity_id"),
            selected: flag(row, "selected").unwrap_or(false),
            priority_level: text(row, "priority_level").unwrap_or(defaults.priority_level),
            scheduled_publish_date: text(row, "scheduled_publish_date"),
            notes: text(row, "notes"),
            created_at: text(row, "created_at"),
        })
    }

    pub fn apply_scores(&mut self, scores: &IdeaScores) {
        self.viral_potential_score = scores.viral_potential_score;
        self.seo_optimization_score = scores.seo_optimization_score;
        self.audience_alignment_score = scores.audience_alignment_score;
        self.content_feasibility_score = scores.content_feasibility_score;
        self.business_impact_score = scores.business_impact_score;
        self.overall_quality_score = scores.overall_quality_score;
    }

    /// Drops any scores the idea arrived with.
    pub fn without_scores(mut self) -> Self {
        self.overall_quality_score = 0;
        self.viral_potential_score = 0;
        self.seo_optimization_score = 0;
        self.audience_alignment_score = 0;
        self.content_feasibility_score = 0;
        self.business_impact_score = 0;
        self
    }

    pub fn scores(&self) -> [i64; 6] {
        [
            self.overall_quality_score,
            self.viral_potential_score,
            self.seo_optimization_score,
            self.audience_alignment_score,
            self.content_feasibility_score,
            self.business_impact_score,
        ]
    }

    /// True when any headline score is still zero and needs backfilling.
    pub fn missing_scores(&self) -> bool {
        self.overall_quality_score == 0
            || self.viral_potential_score == 0
            || self.seo_optimization_score == 0
    }

    /// Row for the `blog_ideas` table. Lists and maps become JSON text and
    /// free-text columns are cut to their column widths.
    pub fn to_record(&self, user_id: Uuid, trend_analysis_id: Uuid, now: &str) -> Value {
        json!({
            "id": self.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
            "user_id": user_id,
            "trend_analysis_id": trend_analysis_id,
            "title": truncate(&self.title, 500),
            "description": truncate(&self.description, 1000),
            "content_format": self.content_format,
            "difficulty_level": self.difficulty_level,
            "estimated_word_count": self.estimated_word_count,
            "estimated_reading_time": self.estimated_reading_time,
            "overall_quality_score": self.overall_quality_score,
            "viral_potential_score": self.viral_potential_score,
            "seo_optimization_score": self.seo_optimization_score,
            "audience_alignment_score": self.audience_alignment_score,
            "content_feasibility_score": self.content_feasibility_score,
            "business_impact_score": self.business_impact_score,
            "primary_keywords": to_json_text(&self.primary_keywords),
            "secondary_keywords": to_json_text(&self.secondary_keywords),
            "featured_snippet_opportunity": self.featured_snippet_opportunity,
            "outline": to_json_text(&self.outline),
            "key_points": to_json_text(&self.key_points),
            "engagement_hooks": to_json_text(&self.engagement_hooks),
            "visual_elements": to_json_text(&self.visual_elements),
            "call_to_action": truncate(&self.call_to_action, 500),
            "business_value": truncate(&self.business_value, 1000),
            "performance_estimates": self.performance_estimates.to_string(),
            "generation_source": truncate(&self.generation_source, 100),
            "source_topic_id": self.source_topic_id,
            "source_opportunity_id": self.source_opportunity_id,
            "selected": self.selected,
            "priority_level": self.priority_level,
            "scheduled_publish_date": self.scheduled_publish_date,
            "notes": self.notes.as_deref().map(|n| truncate(n, 1000)),
            "created_at": now,
            "updated_at": now,
        })
    }
}

fn to_json_text(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Cuts `s` to at most `max` characters on a char boundary.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_reads_json_text_columns() {
        let row = json!({
            "id": "idea-1",
            "title": "Home Yoga Basics",
            "primary_keywords": "[\"yoga\",\"home yoga\"]",
            "outline": ["Intro", "Poses"],
            "performance_estimates": "{\"estimated_monthly_traffic\": 800}",
            "overall_quality_score": 71.6,
            "selected": true
        });
        let idea = BlogIdea::from_value(&row).unwrap();
        assert_eq!(idea.id.as_deref(), Some("idea-1"));
        assert_eq!(idea.primary_keywords, vec!["yoga", "home yoga"]);
        assert_eq!(idea.outline.len(), 2);
        assert_eq!(idea.performance_estimates["estimated_monthly_traffic"], 800);
        assert_eq!(idea.overall_quality_score, 71);
        assert!(idea.selected);
        assert_eq!(idea.viral_potential_score, 0);
    }

    #[test]
    fn test_from_value_requires_title() {
        assert!(BlogIdea::from_value(&json!({"description": "x"})).is_none());
        assert!(BlogIdea::from_value(&json!({"title": "   "})).is_none());
    }

    #[test]
    fn test_from_value_accepts_numeric_strings() {
        let idea = BlogIdea::from_value(&json!({
            "title": "t",
            "estimated_word_count": "1800"
        }))
        .unwrap();
        assert_eq!(idea.estimated_word_count, 1800);
    }

    #[test]
    fn test_to_record_serializes_lists_and_truncates() {
        let idea = BlogIdea {
            title: "x".repeat(600),
            primary_keywords: vec!["a".into()],
            generation_source: "s".repeat(150),
            ..Default::default()
        };
        let record = idea.to_record(Uuid::nil(), Uuid::nil(), "2025-01-01T00:00:00Z");
        assert_eq!(record["title"].as_str().unwrap().chars().count(), 500);
        assert_eq!(record["primary_keywords"], "[\"a\"]");
        assert_eq!(record["generation_source"].as_str().unwrap().len(), 100);
        assert_eq!(record["performance_estimates"], "{}");
    }

    #[test]
    fn test_missing_scores_detects_zero_headline_scores() {
        let mut idea = BlogIdea {
            title: "t".into(),
            overall_quality_score: 70,
            viral_potential_score: 60,
            seo_optimization_score: 0,
            ..Default::default()
        };
        assert!(idea.missing_scores());
        idea.seo_optimization_score = 55;
        assert!(!idea.missing_scores());
    }
}
