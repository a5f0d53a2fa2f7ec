//! Axum route handlers for trends analysis and stored trend analyses.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::affiliate::research::research_affiliate_programs;
use crate::errors::{parse_id, AppError};
use crate::state::AppState;
use crate::storage::affiliate::store_affiliate_research;
use crate::storage::trend_analyses::{
    attach_pytrends, get_trend_analysis, list_content_opportunities, list_trend_analyses,
    list_trending_topics, save_trend_analysis_results, set_opportunity_selection,
    set_topic_selection, OpportunityFilters, TopicFilters, TrendAnalysisBundle,
    TrendAnalysisInput,
};
use crate::trends::analyzer::{comprehensive_trends_analysis, enrich_trend_analysis};
use crate::trends::catalog::{format_opportunity, format_topic};
use crate::trends::models::TrendsAnalysis;
use crate::trends::research::{run_trend_research, TrendResearch, TrendResearchParams};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;
const DEFAULT_MIN_AFFILIATE_SCORE: u32 = 30;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeTrendsRequest {
    #[serde(default)]
    pub topic: String,
    pub focus_area: Option<String>,
    #[serde(default)]
    pub trending_topics: Vec<Value>,
    #[serde(default)]
    pub subtopics: Vec<String>,
    /// With `user_id`, the result is also attached to this stored analysis.
    pub trend_analysis_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeTrendsResponse {
    pub success: bool,
    pub analysis: TrendsAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTrendAnalysisRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(flatten)]
    pub analysis: TrendAnalysisInput,
}

#[derive(Debug, Serialize)]
pub struct SaveTrendAnalysisResponse {
    pub success: bool,
    pub trend_analysis_id: Uuid,
    pub pytrends_enhanced: bool,
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub user_id: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub analyses: Vec<Value>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct TrendAnalysisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub bundle: TrendAnalysisBundle,
}

fn default_min_affiliate_score() -> u32 {
    DEFAULT_MIN_AFFILIATE_SCORE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EnhancedResearchRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub user_id: String,
    pub focus_area: Option<String>,
    pub target_audience: Option<String>,
    pub collection: Option<String>,
    #[serde(default = "default_true")]
    pub include_affiliate_research: bool,
    #[serde(default = "default_min_affiliate_score")]
    pub min_affiliate_score: u32,
}

#[derive(Debug, Serialize)]
pub struct AffiliatePhase {
    pub score: u32,
    pub threshold: u32,
    pub threshold_met: bool,
    pub session_id: Option<Uuid>,
    pub programs_found: usize,
    pub research: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
pub struct EnhancedResearchResponse {
    pub success: bool,
    pub trend_analysis_id: Uuid,
    pub trend_research_data: TrendResearch,
    pub affiliate_research_data: Option<AffiliatePhase>,
    pub metadata: Value,
    pub quality_indicators: Value,
}

/// Spelled out rather than flattening [`TopicFilters`] so `selected_only`
/// parses from the query string.
#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub selected_only: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpportunitiesQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub selected_only: bool,
    pub format: Option<String>,
    pub engagement: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub success: bool,
    pub trend_analysis_id: Uuid,
    pub topics: Vec<Value>,
    pub count: usize,
    pub selected_count: usize,
}

#[derive(Debug, Serialize)]
pub struct OpportunitiesResponse {
    pub success: bool,
    pub trend_analysis_id: Uuid,
    pub opportunities: Vec<Value>,
    pub count: usize,
    pub selected_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_true")]
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

fn require_topic(topic: &str) -> Result<(), AppError> {
    if topic.trim().is_empty() {
        return Err(AppError::Validation("Topic is required".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v2/trends/analyze
///
/// Runs the trends analysis. Always succeeds for a non-empty topic; without a
/// trends source the result is the fallback structure.
pub async fn handle_analyze_trends(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTrendsRequest>,
) -> Result<Json<AnalyzeTrendsResponse>, AppError> {
    require_topic(&request.topic)?;

    // Validate the attach target before doing any work.
    let target = match (&request.trend_analysis_id, &request.user_id) {
        (Some(id), Some(user)) => Some((parse_id(id, "trend_analysis_id")?, state.db_for(user)?)),
        _ => None,
    };

    let analysis = comprehensive_trends_analysis(
        state.trends.as_deref(),
        request.topic.trim(),
        request.trending_topics,
        request.focus_area.as_deref().unwrap_or("general"),
        &request.subtopics,
    )
    .await;

    let stored = match target {
        Some((analysis_id, db)) => {
            let value = serde_json::to_value(&analysis).map_err(anyhow::Error::from)?;
            match attach_pytrends(&db, analysis_id, &value).await {
                Ok(true) => Some(true),
                Ok(false) => {
                    return Err(AppError::NotFound(format!(
                        "Trend analysis {analysis_id} not found"
                    )))
                }
                Err(e) => {
                    warn!("Failed to attach trends analysis to {analysis_id}: {e}");
                    Some(false)
                }
            }
        }
        None => None,
    };

    Ok(Json(AnalyzeTrendsResponse {
        success: true,
        analysis,
        stored,
    }))
}

/// POST /api/v2/trend-analyses
///
/// Stores a finished trend analysis. A trends analysis is run and attached
/// first when the body does not carry one.
pub async fn handle_save_trend_analysis(
    State(state): State<AppState>,
    Json(request): Json<SaveTrendAnalysisRequest>,
) -> Result<Json<SaveTrendAnalysisResponse>, AppError> {
    let db = state.db_for(&request.user_id)?;
    let mut input = request.analysis;
    require_topic(&input.topic)?;
    input.topic = input.topic.trim().to_string();

    if input.pytrends_analysis.is_none() {
        enrich_trend_analysis(state.trends.as_deref(), &mut input, &request.subtopics)
            .await
            .map_err(anyhow::Error::from)?;
    }
    let pytrends_enhanced = input
        .pytrends_analysis
        .as_ref()
        .and_then(|p| p.get("pytrends_enhanced"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let trend_analysis_id = save_trend_analysis_results(&db, &input).await?;
    Ok(Json(SaveTrendAnalysisResponse {
        success: true,
        trend_analysis_id,
        pytrends_enhanced,
        confidence_score: input.confidence_score,
    }))
}

/// GET /api/v2/trend-analyses
pub async fn handle_list_trend_analyses(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let db = state.db_for(&query.user_id)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let analyses = list_trend_analyses(&db, limit).await?;
    Ok(Json(ListResponse {
        success: true,
        count: analyses.len(),
        analyses,
    }))
}

/// GET /api/v2/trend-analysis/:analysis_id
pub async fn handle_get_trend_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TrendAnalysisResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let bundle = get_trend_analysis(&db, analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trend analysis {analysis_id} not found")))?;
    Ok(Json(TrendAnalysisResponse {
        success: true,
        bundle,
    }))
}

fn selected_count(rows: &[Value]) -> usize {
    rows.iter()
        .filter(|r| r.get("selected").and_then(Value::as_bool).unwrap_or(false))
        .count()
}

fn non_empty(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// POST /api/v2/enhanced-trend-research
///
/// Affiliate research first (advisory: a low score only adds a warning),
/// then trend research, then storage of the combined analysis.
pub async fn handle_enhanced_trend_research(
    State(state): State<AppState>,
    Json(request): Json<EnhancedResearchRequest>,
) -> Result<Json<EnhancedResearchResponse>, AppError> {
    let db = state.db_for(&request.user_id)?;
    require_topic(&request.topic)?;
    let topic = request.topic.trim();
    let params = TrendResearchParams {
        topic: topic.to_string(),
        focus_area: non_empty(request.focus_area, "general"),
        target_audience: non_empty(request.target_audience, "professional"),
        collection: non_empty(request.collection, "default"),
    };

    let affiliate = if request.include_affiliate_research {
        let research = research_affiliate_programs(state.affiliate.as_ref(), topic, &[]).await;
        let session_id = match store_affiliate_research(&db, &research).await {
            Ok(summary) => Some(summary.session_id),
            Err(e) => {
                warn!("Failed to store affiliate research for '{topic}': {e}");
                None
            }
        };
        let score = research.profitability_analysis.score;
        let threshold_met = score >= request.min_affiliate_score;
        if !threshold_met {
            warn!(
                "Affiliate score {score} for '{topic}' is below {}, continuing with trend research",
                request.min_affiliate_score
            );
        }
        Some(AffiliatePhase {
            score,
            threshold: request.min_affiliate_score,
            threshold_met,
            session_id,
            programs_found: research.total_programs,
            research: serde_json::to_value(&research).map_err(anyhow::Error::from)?,
            warning: (!threshold_met).then(|| {
                format!(
                    "Affiliate profitability score {score} is below the recommended {}",
                    request.min_affiliate_score
                )
            }),
            suggestions: (!threshold_met).then(|| {
                vec![
                    "Try a more specific subtopic",
                    "Explore related niches with higher commissions",
                    "Consider different product categories",
                ]
            }),
        })
    } else {
        None
    };

    let research = run_trend_research(state.llm.as_ref(), state.trends.as_deref(), &params)
        .await
        .map_err(anyhow::Error::from)?;
    let trend_analysis_id = save_trend_analysis_results(&db, &research.to_input(&params)).await?;
    info!("Enhanced trend research for '{topic}' stored as {trend_analysis_id}");

    let metadata = json!({
        "topic": params.topic,
        "focus_area": params.focus_area,
        "target_audience": params.target_audience,
        "collection": params.collection,
        "affiliate_research_included": affiliate.is_some(),
        "processing_time": research.processing_time,
        "generated_at": Utc::now().to_rfc3339(),
    });
    let quality_indicators = json!({
        "trending_topics_count": research.trending_topics.len(),
        "content_opportunities_count": research.content_opportunities.len(),
        "confidence_score": research.confidence_score,
        "pytrends_enhanced": research.pytrends_enhanced,
        "fallback_mode": research.fallback_mode,
        "affiliate_threshold_met": affiliate.as_ref().map(|a| a.threshold_met),
    });

    Ok(Json(EnhancedResearchResponse {
        success: true,
        trend_analysis_id,
        trend_research_data: research,
        affiliate_research_data: affiliate,
        metadata,
        quality_indicators,
    }))
}

/// GET /api/v2/trend-analysis/:analysis_id/topics
pub async fn handle_list_topics(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<TopicsQuery>,
) -> Result<Json<TopicsResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let filters = TopicFilters {
        selected_only: query.selected_only,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };
    let rows = list_trending_topics(&db, analysis_id, &filters).await?;
    let topics: Vec<Value> = rows.iter().map(format_topic).collect();
    Ok(Json(TopicsResponse {
        success: true,
        trend_analysis_id: analysis_id,
        count: topics.len(),
        selected_count: selected_count(&topics),
        topics,
    }))
}

/// GET /api/v2/trend-analysis/:analysis_id/opportunities
pub async fn handle_list_opportunities(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<OpportunitiesQuery>,
) -> Result<Json<OpportunitiesResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let filters = OpportunityFilters {
        selected_only: query.selected_only,
        format: query.format,
        engagement: query.engagement,
    };
    let rows = list_content_opportunities(&db, analysis_id, &filters).await?;
    let opportunities: Vec<Value> = rows.iter().map(format_opportunity).collect();
    Ok(Json(OpportunitiesResponse {
        success: true,
        trend_analysis_id: analysis_id,
        count: opportunities.len(),
        selected_count: selected_count(&opportunities),
        opportunities,
    }))
}

/// PATCH /api/v2/topics/:topic_id/select
pub async fn handle_select_topic(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, AppError> {
    let topic_id = parse_id(&topic_id, "topic_id")?;
    let db = state.db_for(&request.user_id)?;
    let row = set_topic_selection(&db, topic_id, request.selected)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found or access denied".to_string()))?;
    Ok(Json(SelectResponse {
        success: true,
        message: format!(
            "Topic {}",
            if request.selected { "selected" } else { "deselected" }
        ),
        data: format_topic(&row),
    }))
}

/// PATCH /api/v2/opportunities/:opportunity_id/select
pub async fn handle_select_opportunity(
    State(state): State<AppState>,
    Path(opportunity_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity_id")?;
    let db = state.db_for(&request.user_id)?;
    let row = set_opportunity_selection(&db, opportunity_id, request.selected)
        .await?
        .ok_or_else(|| AppError::NotFound("Opportunity not found or access denied".to_string()))?;
    Ok(Json(SelectResponse {
        success: true,
        message: format!(
            "Opportunity {}",
            if request.selected { "selected" } else { "deselected" }
        ),
        data: format_opportunity(&row),
    }))
}
