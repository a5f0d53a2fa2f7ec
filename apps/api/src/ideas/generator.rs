//! Blog idea generation pipeline.
//!
//! Sources: trending topics, content opportunities, the stored trends
//! analysis (hotspots, related queries, sub-topics) and keyword clusters.
//!
//! Flow: load trend analysis → per-source LLM call (or fallback ideas) →
//!       normalize → dedup → score → SEO pass → estimates → rank → select →
//!       calendar and insights → persist.
//!
//! Scores returned by the model are ignored. Every idea is scored by
//! [`crate::ideas::scoring`] so generated and backfilled ideas agree.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ideas::models::{BlogGenerationResult, BlogIdea, LlmInfo};
use crate::ideas::planning::{
    build_content_calendar, build_strategic_insights, calculate_success_predictions,
};
use crate::ideas::prompts::{
    geographic_prompt, keyword_clusters_prompt, opportunity_prompt, rising_queries_prompt,
    subtopic_analysis_prompt, subtopics_prompt, trending_topic_prompt, PromptContext,
};
use crate::ideas::scoring::{overall_quality_score, score_idea};
use crate::ideas::validation::{clean_keywords, validate_blog_idea};
use crate::llm_client::prompts::JSON_ARRAY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::storage::blog_ideas::save_blog_generation_results;
use crate::storage::trend_analyses::{get_trend_analysis, TrendAnalysisBundle};
use crate::storage::{decode_json_column, SupabaseClient};

pub const MAX_TRENDING_TOPICS: usize = 5;
pub const MAX_OPPORTUNITIES: usize = 3;
const FALLBACK_IDEAS_PER_SOURCE: usize = 2;
pub const TARGET_IDEAS_MIN: usize = 20;
pub const TARGET_IDEAS_MAX: usize = 50;

const TRENDING_INDICATORS: &[&str] = &["2025", "latest", "new", "trending", "best", "ultimate", "complete"];
const SNIPPET_PREFIXES: &[&str] = &["what is", "how to", "why"];

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static FLAT_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));

// ────────────────────────────────────────────────────────────────────────────
// Sources
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    TrendingTopic,
    ContentOpportunity,
    GeographicInsights,
    Subtopics,
    SubtopicAnalysis,
    RisingQueries,
    KeywordClusters,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::TrendingTopic => "trending_topic",
            SourceKind::ContentOpportunity => "content_opportunity",
            SourceKind::GeographicInsights => "geographic_insights",
            SourceKind::Subtopics => "subtopics",
            SourceKind::SubtopicAnalysis => "subtopic_analysis",
            SourceKind::RisingQueries => "rising_queries",
            SourceKind::KeywordClusters => "keyword_clusters",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SourceKind::TrendingTopic => "Trending Topic",
            SourceKind::ContentOpportunity => "Content Opportunity",
            SourceKind::GeographicInsights => "Geographic Insights",
            SourceKind::Subtopics => "Sub-Topics",
            SourceKind::SubtopicAnalysis => "Sub-Topic Analysis",
            SourceKind::RisingQueries => "Rising Queries",
            SourceKind::KeywordClusters => "Keyword Clusters",
        }
    }

    /// Fixed provenance for sources that are not a stored row.
    fn detail(self) -> Option<&'static str> {
        match self {
            SourceKind::TrendingTopic | SourceKind::ContentOpportunity => None,
            SourceKind::GeographicInsights => Some("PyTrends Geographic Analysis"),
            SourceKind::Subtopics => Some("PyTrends Sub-Topic Analysis"),
            SourceKind::SubtopicAnalysis => Some("PyTrends Sub-Topic Performance Analysis"),
            SourceKind::RisingQueries => Some("PyTrends Rising Queries"),
            SourceKind::KeywordClusters => Some("Keyword Intelligence Analysis"),
        }
    }

    fn bucket(self) -> &'static str {
        match self {
            SourceKind::TrendingTopic => "trending_topics",
            SourceKind::ContentOpportunity => "content_opportunities",
            SourceKind::KeywordClusters => "keyword_clusters",
            _ => "pytrends_insights",
        }
    }
}

fn source_title(source: &Value) -> &str {
    source
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Unknown Source")
}

fn source_id(source: &Value) -> Option<String> {
    match source.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Stamps provenance on ideas generated from `source`.
fn tag_ideas(ideas: &mut [BlogIdea], source: &Value, kind: SourceKind) {
    let id = source_id(source);
    for idea in ideas {
        let detail = kind.detail().unwrap_or_else(|| source_title(source));
        idea.generation_source = format!("{}: {detail}", kind.label());
        match kind {
            SourceKind::TrendingTopic => idea.source_topic_id = id.clone(),
            SourceKind::ContentOpportunity => idea.source_opportunity_id = id.clone(),
            _ => {}
        }
    }
}

fn string_fields(items: Option<&Value>, key: &str, limit: usize) -> Vec<Value> {
    items
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get(key).and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty())
                .take(limit)
                .map(|s| Value::String(s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn has_rows(items: Option<&Value>) -> bool {
    items
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty())
}

/// Extra sources derived from the stored trends analysis and keyword
/// intelligence. Each is a synthetic source object carrying the names its
/// prompt lists.
pub fn insight_sources(bundle: &TrendAnalysisBundle) -> Vec<(Value, SourceKind)> {
    let mut sources = Vec::new();
    let pytrends = &bundle.pytrends_analysis;

    let hotspots = pytrends.pointer("/geographic_insights/global_hotspots");
    if has_rows(hotspots) {
        sources.push((
            json!({
                "title": SourceKind::GeographicInsights.label(),
                "countries": string_fields(hotspots, "country", 3),
            }),
            SourceKind::GeographicInsights,
        ));
    }

    let rising = pytrends.pointer("/related_queries_insights/rising_queries");
    let top = pytrends.pointer("/related_queries_insights/top_related_queries");
    if has_rows(rising) || has_rows(top) {
        sources.push((
            json!({
                "title": SourceKind::Subtopics.label(),
                "rising": string_fields(rising, "query", 5),
                "top": string_fields(top, "query", 5),
            }),
            SourceKind::Subtopics,
        ));
    }

    let results = pytrends.pointer("/subtopic_analysis/subtopic_results");
    if has_rows(results) {
        sources.push((
            json!({
                "title": SourceKind::SubtopicAnalysis.label(),
                "subtopics": string_fields(results, "subtopic", 5),
            }),
            SourceKind::SubtopicAnalysis,
        ));
    } else if has_rows(rising) {
        sources.push((
            json!({
                "title": SourceKind::RisingQueries.label(),
                "queries": string_fields(rising, "query", 5),
            }),
            SourceKind::RisingQueries,
        ));
    }

    let extra = decode_json_column(bundle.keyword_intelligence.get("additional_data"), json!({}));
    let clusters: Vec<Value> = extra
        .get("keyword_clusters")
        .and_then(Value::as_object)
        .map(|m| m.keys().take(3).map(|k| Value::String(k.clone())).collect())
        .unwrap_or_default();
    if !clusters.is_empty() {
        sources.push((
            json!({
                "title": SourceKind::KeywordClusters.label(),
                "clusters": clusters,
            }),
            SourceKind::KeywordClusters,
        ));
    }

    sources
}

// ────────────────────────────────────────────────────────────────────────────
// Response parsing
// ────────────────────────────────────────────────────────────────────────────

fn fix_common_json_issues(raw: &str) -> String {
    TRAILING_COMMA
        .replace_all(raw, "$1")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

fn as_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Extracts a JSON array of idea objects from model output. Tries the whole
/// text, a fenced json block, the outermost `[...]` span, and finally any flat
/// `{...}` objects. `None` when nothing parses.
pub fn parse_ideas_response(response: &str) -> Option<Vec<Value>> {
    let cleaned = response.trim();

    if let Some(items) = serde_json::from_str(cleaned).ok().and_then(as_array) {
        return Some(items);
    }

    let fenced = FENCED_JSON
        .captures(cleaned)
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str(m.as_str().trim()).ok())
        .and_then(as_array);
    if fenced.is_some() {
        return fenced;
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            let span = fix_common_json_issues(&cleaned[start..=end]);
            match serde_json::from_str(&span).map(as_array) {
                Ok(Some(items)) => return Some(items),
                Ok(None) => {}
                Err(e) => warn!("JSON array extraction failed: {e}"),
            }
        }
    }

    let objects: Vec<Value> = FLAT_OBJECT
        .find_iter(cleaned)
        .filter_map(|m| serde_json::from_str(&fix_common_json_issues(m.as_str())).ok())
        .collect();
    (!objects.is_empty()).then_some(objects)
}

/// An idea read from model output, with missing fields filled in.
fn idea_from_llm(item: &Value) -> Option<BlogIdea> {
    if !item.is_object() {
        return None;
    }
    let mut idea = BlogIdea::from_value(item)?;
    if idea.description.trim().is_empty() {
        idea.description = "Description not provided".into();
    }
    if idea.business_value.trim().is_empty() {
        idea.business_value = "Provides value to target audience".into();
    }
    if idea.call_to_action.trim().is_empty() {
        idea.call_to_action = "Learn more about this topic".into();
    }
    idea.id = None;
    idea.featured_snippet_opportunity = true;
    idea.selected = false;
    idea.priority_level = "medium".into();
    idea.notes = Some(String::new());
    Some(idea.without_scores())
}

pub fn fallback_ideas(source_title: &str, kind: SourceKind, count: usize) -> Vec<BlogIdea> {
    let lower = source_title.to_lowercase();
    (1..=count)
        .map(|n| BlogIdea {
            title: format!("Blog Idea from {source_title} #{n}"),
            description: format!("A comprehensive guide based on {source_title}"),
            primary_keywords: vec![lower.clone()],
            secondary_keywords: vec![format!("{lower} guide"), format!("{lower} tips")],
            outline: [
                "Introduction",
                "Understanding the Basics",
                "Key Strategies",
                "Implementation Steps",
                "Best Practices",
                "Common Mistakes to Avoid",
                "Conclusion and Next Steps",
            ]
            .map(String::from)
            .to_vec(),
            key_points: [
                "Practical implementation strategies",
                "Real-world examples and case studies",
                "Actionable takeaways for immediate use",
            ]
            .map(String::from)
            .to_vec(),
            business_value: "Helps audience understand and implement effective strategies".into(),
            call_to_action: "Start implementing these strategies in your own work".into(),
            featured_snippet_opportunity: true,
            engagement_hooks: [
                "Have you ever wondered about...",
                "The surprising truth about...",
                "What most people get wrong about...",
            ]
            .map(String::from)
            .to_vec(),
            visual_elements: [
                "Infographic showing key statistics",
                "Step-by-step process diagram",
                "Before/after comparison charts",
            ]
            .map(String::from)
            .to_vec(),
            notes: Some(format!("Generated from {} fallback", kind.as_str())),
            ..Default::default()
        })
        .collect()
}

/// Ideas from one model response, or fallback ideas when it yields none.
pub fn ideas_from_response(response: &str, source: &Value, kind: SourceKind) -> Vec<BlogIdea> {
    let parsed: Vec<BlogIdea> = parse_ideas_response(response)
        .unwrap_or_default()
        .iter()
        .filter_map(idea_from_llm)
        .collect();

    let mut ideas = if parsed.is_empty() {
        warn!(
            "No usable ideas in {} response for '{}', using fallback",
            kind.as_str(),
            source_title(source)
        );
        fallback_ideas(source_title(source), kind, FALLBACK_IDEAS_PER_SOURCE)
    } else {
        parsed
    };
    tag_ideas(&mut ideas, source, kind);
    ideas
}

// ────────────────────────────────────────────────────────────────────────────
// Post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Keeps the first idea per case-insensitive trimmed title.
pub fn deduplicate_ideas(ideas: Vec<BlogIdea>) -> Vec<BlogIdea> {
    let total = ideas.len();
    let mut seen = HashSet::new();
    let unique: Vec<BlogIdea> = ideas
        .into_iter()
        .filter(|idea| {
            let key = idea.title.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect();
    info!("Deduplicated {total} ideas down to {}", unique.len());
    unique
}

pub fn optimize_for_seo(idea: &mut BlogIdea) {
    let original = idea.title.clone();
    let lower = original.to_lowercase();

    if !original.is_empty() && original.chars().count() < 50 && !original.contains("2025") {
        idea.title = format!("{original} (2025 Guide)");
    }

    if let Some(primary) = idea.primary_keywords.first() {
        idea.seo_optimization_score += 10;
        let keyword = primary.to_lowercase();
        if !keyword.is_empty() && lower.contains(&keyword) {
            idea.seo_optimization_score += 5;
        }
    }

    if TRENDING_INDICATORS.iter().any(|w| lower.contains(w)) {
        idea.viral_potential_score += 5;
    }

    if SNIPPET_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        idea.featured_snippet_opportunity = true;
    }

    idea.seo_optimization_score = idea.seo_optimization_score.clamp(0, 100);
    idea.viral_potential_score = idea.viral_potential_score.clamp(0, 100);
}

fn difficulty_multiplier(difficulty: &str) -> f64 {
    match difficulty {
        "beginner" => 1.0,
        "advanced" => 1.5,
        "expert" => 2.0,
        _ => 1.2,
    }
}

pub fn performance_estimates(idea: &BlogIdea) -> Value {
    let viral = idea.viral_potential_score;
    let seo = idea.seo_optimization_score;

    let traffic = if seo >= 80 {
        1000 + viral * 10
    } else if seo >= 60 {
        500 + viral * 5
    } else {
        200 + viral * 2
    };
    let weeks = (8.0 * difficulty_multiplier(&idea.difficulty_level) * (100 - seo) as f64 / 100.0
        + 4.0) as i64;

    json!({
        "viral_potential_score": viral,
        "traffic_potential_score": (traffic / 20).min(100),
        "conversion_potential_score": idea.business_impact_score,
        "estimated_time_to_rank_weeks": weeks.max(4),
        "estimated_monthly_traffic": traffic,
        "estimated_social_shares": (viral / 2).max(5),
        "estimated_backlink_potential": (idea.overall_quality_score / 20).max(1),
    })
}

/// Normalize, dedup, score, optimize and rank raw ideas, then keep the best
/// `min(50, max(20, n))`.
pub fn finalize_ideas(raw: Vec<BlogIdea>) -> Vec<BlogIdea> {
    let mut ideas = deduplicate_ideas(raw);

    for idea in &mut ideas {
        validate_blog_idea(idea);
        clean_keywords(idea);
        idea.apply_scores(&score_idea(idea));
        optimize_for_seo(idea);
        idea.overall_quality_score = overall_quality_score(
            idea.viral_potential_score,
            idea.seo_optimization_score,
            idea.audience_alignment_score,
            idea.content_feasibility_score,
            idea.business_impact_score,
        );
        idea.performance_estimates = performance_estimates(idea);
    }

    ideas.sort_by(|a, b| b.overall_quality_score.cmp(&a.overall_quality_score));
    let target = ideas.len().clamp(TARGET_IDEAS_MIN, TARGET_IDEAS_MAX);
    ideas.truncate(target);
    ideas
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub generation_result_id: Uuid,
    pub result: BlogGenerationResult,
    pub llm: LlmInfo,
}

async fn ideas_for_source(
    llm: Option<&LlmClient>,
    source: &Value,
    kind: SourceKind,
    ctx: &PromptContext<'_>,
) -> Vec<BlogIdea> {
    let Some(llm) = llm else {
        let mut ideas = fallback_ideas(source_title(source), kind, FALLBACK_IDEAS_PER_SOURCE);
        tag_ideas(&mut ideas, source, kind);
        return ideas;
    };

    let prompt = match kind {
        SourceKind::TrendingTopic => trending_topic_prompt(source, ctx),
        SourceKind::ContentOpportunity => opportunity_prompt(source, ctx),
        SourceKind::GeographicInsights => geographic_prompt(source, ctx),
        SourceKind::Subtopics => subtopics_prompt(source, ctx),
        SourceKind::SubtopicAnalysis => subtopic_analysis_prompt(source, ctx),
        SourceKind::RisingQueries => rising_queries_prompt(source, ctx),
        SourceKind::KeywordClusters => keyword_clusters_prompt(source, ctx),
    };
    match llm.call_text(&prompt, JSON_ARRAY_SYSTEM).await {
        Ok(text) => ideas_from_response(&text, source, kind),
        Err(e) => {
            warn!(
                "LLM call failed for {} '{}': {e}",
                kind.as_str(),
                source_title(source)
            );
            ideas_from_response("", source, kind)
        }
    }
}

/// Builds the full generation result for an already loaded analysis.
pub async fn generate_from_bundle(
    llm: Option<&LlmClient>,
    bundle: &TrendAnalysisBundle,
) -> BlogGenerationResult {
    let started = Instant::now();
    let ctx = PromptContext {
        topic: bundle.topic(),
        target_audience: bundle.target_audience(),
    };

    let insights = insight_sources(bundle);
    let sources = bundle
        .trending_topics
        .iter()
        .take(MAX_TRENDING_TOPICS)
        .map(|s| (s, SourceKind::TrendingTopic))
        .chain(
            bundle
                .content_opportunities
                .iter()
                .take(MAX_OPPORTUNITIES)
                .map(|s| (s, SourceKind::ContentOpportunity)),
        )
        .chain(insights.iter().map(|(s, kind)| (s, *kind)));

    let mut raw = Vec::new();
    let mut ideas_by_source: BTreeMap<String, usize> = BTreeMap::new();
    for (source, kind) in sources {
        let ideas = ideas_for_source(llm, source, kind, &ctx).await;
        *ideas_by_source.entry(kind.bucket().to_string()).or_default() += ideas.len();
        raw.extend(ideas);
    }

    let ideas = finalize_ideas(raw);
    let result = BlogGenerationResult {
        content_calendar: build_content_calendar(&ideas, ctx.topic),
        strategic_insights: build_strategic_insights(&ideas),
        success_predictions: calculate_success_predictions(&ideas),
        ideas_by_source,
        processing_time_seconds: (started.elapsed().as_secs_f64() * 100.0).round() / 100.0,
        ideas,
    };
    info!(
        "Blog idea generation completed: {} ideas in {:.2}s",
        result.ideas.len(),
        result.processing_time_seconds
    );
    result
}

/// Loads the analysis, generates ideas and persists them.
pub async fn generate_blog_ideas(
    db: &SupabaseClient,
    llm: Option<&LlmClient>,
    analysis_id: Uuid,
) -> Result<GenerationOutcome, AppError> {
    info!("Starting blog idea generation for analysis {analysis_id}");
    let bundle = get_trend_analysis(db, analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trend analysis {analysis_id} not found")))?;

    if bundle.trending_topics.is_empty() && bundle.content_opportunities.is_empty() {
        return Err(AppError::Validation(
            "Trend analysis has no trending topics or content opportunities".to_string(),
        ));
    }

    let result = generate_from_bundle(llm, &bundle).await;
    let info = LlmInfo {
        provider: llm.map_or("fallback", LlmClient::provider).to_string(),
        model: llm.map_or("none", LlmClient::model).to_string(),
    };
    let generation_result_id = save_blog_generation_results(db, analysis_id, &result, &info).await?;

    Ok(GenerationOutcome {
        generation_result_id,
        result,
        llm: info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn idea_json(title: &str) -> Value {
        json!({
            "title": title,
            "content_format": "listicle",
            "primary_keywords": ["home security", "smart locks"],
            "overall_quality_score": 99
        })
    }

    #[test]
    fn test_parse_direct_array() {
        let items = parse_ideas_response("[{\"title\": \"A\"}]").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_fenced_block_with_prose() {
        let response = "Here you go:\n```json\n[{\"title\": \"A\"}, {\"title\": \"B\"}]\n```\nEnjoy!";
        assert_eq!(parse_ideas_response(response).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_array_span_with_trailing_commas() {
        let response = "Ideas: [{\"title\": \"A\", \"outline\": [\"x\", \"y\",],},] done";
        let items = parse_ideas_response(response).unwrap();
        assert_eq!(items[0]["title"], "A");
    }

    #[test]
    fn test_parse_loose_objects() {
        let response = "first {\"title\": \"A\"} then [broken {\"title\": \"B\"}";
        let items = parse_ideas_response(response).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_unparseable_response_yields_fallback_ideas() {
        let source = json!({"id": "t1", "title": "Smart Locks"});
        let ideas = ideas_from_response("sorry, I cannot help", &source, SourceKind::TrendingTopic);
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].title, "Blog Idea from Smart Locks #1");
        assert_eq!(ideas[1].primary_keywords, vec!["smart locks"]);
        assert_eq!(ideas[0].generation_source, "Trending Topic: Smart Locks");
        assert_eq!(ideas[0].source_topic_id.as_deref(), Some("t1"));
        assert_eq!(ideas[0].notes.as_deref(), Some("Generated from trending_topic fallback"));
    }

    #[test]
    fn test_llm_ideas_get_defaults_and_lose_model_scores() {
        let source = json!({"id": 7, "title": "Buyer guide"});
        let response = json!([idea_json("Best Smart Locks"), {"description": "no title"}]).to_string();
        let ideas = ideas_from_response(&response, &source, SourceKind::ContentOpportunity);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].overall_quality_score, 0);
        assert_eq!(ideas[0].description, "Description not provided");
        assert_eq!(ideas[0].source_opportunity_id.as_deref(), Some("7"));
        assert!(ideas[0].featured_snippet_opportunity);
    }

    #[test]
    fn test_seo_pass_appends_year_and_boosts() {
        let mut idea = BlogIdea {
            title: "Best home security tips".into(),
            primary_keywords: vec!["home security".into()],
            seo_optimization_score: 90,
            viral_potential_score: 98,
            ..Default::default()
        };
        optimize_for_seo(&mut idea);
        assert_eq!(idea.title, "Best home security tips (2025 Guide)");
        assert_eq!(idea.seo_optimization_score, 100);
        assert_eq!(idea.viral_potential_score, 100);
    }

    #[test]
    fn test_performance_estimates_tiers() {
        let idea = BlogIdea {
            title: "x".into(),
            seo_optimization_score: 85,
            viral_potential_score: 70,
            overall_quality_score: 10,
            business_impact_score: 66,
            difficulty_level: "advanced".into(),
            ..Default::default()
        };
        let est = performance_estimates(&idea);
        assert_eq!(est["estimated_monthly_traffic"], 1700);
        assert_eq!(est["traffic_potential_score"], 85);
        assert_eq!(est["estimated_social_shares"], 35);
        assert_eq!(est["estimated_backlink_potential"], 1);
        assert_eq!(est["estimated_time_to_rank_weeks"], 5);
        assert_eq!(est["conversion_potential_score"], 66);
    }

    #[test]
    fn test_finalize_dedups_scores_ranks_and_caps() {
        let mut raw: Vec<BlogIdea> = (0..60)
            .map(|n| BlogIdea {
                title: format!("Idea number {n}"),
                ..Default::default()
            })
            .collect();
        raw.push(BlogIdea {
            title: "  IDEA NUMBER 0 ".into(),
            ..Default::default()
        });

        let ideas = finalize_ideas(raw);
        assert_eq!(ideas.len(), TARGET_IDEAS_MAX);
        assert!(ideas.iter().all(|i| i.overall_quality_score > 0));
        assert!(ideas
            .windows(2)
            .all(|w| w[0].overall_quality_score >= w[1].overall_quality_score));
        assert!(ideas[0].performance_estimates.get("estimated_monthly_traffic").is_some());
    }

    #[tokio::test]
    async fn test_generate_without_llm_uses_fallback_per_source() {
        let bundle = TrendAnalysisBundle {
            trend_analysis_id: Uuid::new_v4(),
            analysis_info: json!({"topic": "home security"}),
            trending_topics: (0..7).map(|n| json!({"title": format!("Topic {n}")})).collect(),
            content_opportunities: vec![json!({"title": "Opportunity"})],
            keyword_intelligence: json!({}),
            pytrends_analysis: json!({}),
            pytrends_enhanced: false,
            pytrends_available: false,
        };
        let result = generate_from_bundle(None, &bundle).await;
        assert_eq!(result.ideas_by_source["trending_topics"], 10);
        assert_eq!(result.ideas_by_source["content_opportunities"], 2);
        assert_eq!(result.ideas.len(), 12);
        assert_eq!(result.content_calendar.publishing_strategy.total_ideas_in_calendar, 12);
    }

    #[tokio::test]
    async fn test_generate_with_llm_parses_each_source() {
        let server = MockServer::start().await;
        let body = json!({
            "choices": [{"message": {"content": json!([
                idea_json("How to secure a smart home"),
                idea_json("Smart lock buying mistakes")
            ]).to_string()}}]
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(2)
            .mount(&server)
            .await;

        let llm = LlmClient::new("sk".into(), &server.uri(), "gpt-4o-mini".into(), 5).unwrap();
        let bundle = TrendAnalysisBundle {
            trend_analysis_id: Uuid::new_v4(),
            analysis_info: json!({"topic": "home security"}),
            trending_topics: vec![json!({"title": "Smart homes"})],
            content_opportunities: vec![json!({"title": "Lock reviews"})],
            keyword_intelligence: json!({}),
            pytrends_analysis: json!({}),
            pytrends_enhanced: false,
            pytrends_available: false,
        };
        let result = generate_from_bundle(Some(&llm), &bundle).await;
        // Same titles from both sources collapse to two ideas.
        assert_eq!(result.ideas.len(), 2);
        assert!(result
            .ideas
            .iter()
            .any(|i| i.title == "How to secure a smart home (2025 Guide)"));
    }

    fn insight_bundle(pytrends: Value) -> TrendAnalysisBundle {
        TrendAnalysisBundle {
            trend_analysis_id: Uuid::new_v4(),
            analysis_info: json!({"topic": "home security"}),
            trending_topics: vec![json!({"title": "Smart homes"})],
            content_opportunities: vec![],
            keyword_intelligence: json!({
                "additional_data": "{\"keyword_clusters\": {\"cameras\": [\"outdoor camera\"], \"locks\": []}}"
            }),
            pytrends_analysis: pytrends,
            pytrends_enhanced: true,
            pytrends_available: true,
        }
    }

    fn trends_section() -> Value {
        json!({
            "geographic_insights": {"global_hotspots": [
                {"country": "United States", "interest": 100},
                {"country": "Canada", "interest": 80}
            ]},
            "related_queries_insights": {
                "rising_queries": [{"query": "video doorbell"}],
                "top_related_queries": [{"query": "smart lock"}]
            },
            "subtopic_analysis": null
        })
    }

    #[test]
    fn test_insight_sources_from_trends_and_keyword_clusters() {
        let sources = insight_sources(&insight_bundle(trends_section()));
        let kinds: Vec<SourceKind> = sources.iter().map(|(_, k)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                SourceKind::GeographicInsights,
                SourceKind::Subtopics,
                SourceKind::RisingQueries,
                SourceKind::KeywordClusters,
            ]
        );
        assert_eq!(sources[0].0["countries"], json!(["United States", "Canada"]));
        assert_eq!(sources[1].0["top"], json!(["smart lock"]));
        assert_eq!(sources[2].0["queries"], json!(["video doorbell"]));
        assert_eq!(sources[3].0["clusters"], json!(["cameras", "locks"]));
    }

    #[test]
    fn test_subtopic_results_replace_rising_queries_source() {
        let mut trends = trends_section();
        trends["subtopic_analysis"] = json!({"subtopic_results": [{"subtopic": "door sensors"}]});
        let sources = insight_sources(&insight_bundle(trends));
        let kinds: Vec<SourceKind> = sources.iter().map(|(_, k)| *k).collect();
        assert!(kinds.contains(&SourceKind::SubtopicAnalysis));
        assert!(!kinds.contains(&SourceKind::RisingQueries));

        let empty = insight_sources(&TrendAnalysisBundle {
            keyword_intelligence: json!({}),
            ..insight_bundle(json!({}))
        });
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_generate_draws_on_trends_and_keyword_clusters() {
        let result = generate_from_bundle(None, &insight_bundle(trends_section())).await;
        assert_eq!(result.ideas_by_source["trending_topics"], 2);
        assert_eq!(result.ideas_by_source["pytrends_insights"], 6);
        assert_eq!(result.ideas_by_source["keyword_clusters"], 2);
        assert_eq!(result.ideas.len(), 10);

        let by_source = |prefix: &str| {
            result
                .ideas
                .iter()
                .find(|i| i.generation_source.starts_with(prefix))
                .unwrap()
        };
        let geo = by_source("Geographic Insights: PyTrends Geographic Analysis");
        let rising = by_source("Rising Queries: PyTrends Rising Queries");
        let clusters = by_source("Keyword Clusters: Keyword Intelligence Analysis");
        assert!(by_source("Sub-Topics: PyTrends Sub-Topic Analysis").source_topic_id.is_none());
        // Geographic and rising sources earn the viral source bonus.
        assert_eq!(geo.viral_potential_score, clusters.viral_potential_score + 10);
        assert_eq!(rising.viral_potential_score, clusters.viral_potential_score + 10);
    }

    #[tokio::test]
    async fn test_generate_prompts_each_insight_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Top Markets: United States, Canada"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": json!([idea_json("Home security across North America")]).to_string()}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "no ideas today"}}]
            })))
            .mount(&server)
            .await;

        let llm = LlmClient::new("sk".into(), &server.uri(), "gpt-4o-mini".into(), 5).unwrap();
        let result = generate_from_bundle(Some(&llm), &insight_bundle(trends_section())).await;
        let geo = result
            .ideas
            .iter()
            .find(|i| i.title.starts_with("Home security across North America"))
            .unwrap();
        assert_eq!(
            geo.generation_source,
            "Geographic Insights: PyTrends Geographic Analysis"
        );
        assert_eq!(result.ideas_by_source["keyword_clusters"], 2);
    }
}
