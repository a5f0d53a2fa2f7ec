//! Axum route handlers for blog ideas, score backfill and monetization.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{parse_id, AppError};
use crate::ideas::backfill::{
    diagnose_analysis, fix_all_user_analyses, fix_missing_scores, Diagnosis, FixAllReport, FixReport,
};
use crate::ideas::generator::generate_blog_ideas;
use crate::ideas::models::{BlogIdea, LlmInfo};
use crate::ideas::monetization::{enhance_ideas_with_monetization, MonetizedIdea};
use crate::ideas::planning::{ContentCalendar, StrategicInsights, SuccessPredictions};
use crate::ideas::validation::VALID_PRIORITIES;
use crate::state::AppState;
use crate::storage::blog_ideas::{
    bulk_update_blog_ideas, delete_blog_idea, get_blog_idea_by_id, get_blog_ideas,
    get_content_calendar, get_strategic_insights, update_blog_idea_selection, BulkUpdateResult,
    IdeaFilters, SelectionUpdate,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationMetadata {
    pub total_ideas_generated: usize,
    pub average_quality_score: f64,
    pub avg_viral_score: f64,
    pub avg_seo_score: f64,
    pub processing_time_seconds: f64,
    pub llm: LlmInfo,
    pub ideas_by_source: BTreeMap<String, usize>,
    pub generation_timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateIdeasResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub generation_result_id: Uuid,
    pub blog_ideas: Vec<BlogIdea>,
    pub content_calendar: ContentCalendar,
    pub strategic_insights: StrategicInsights,
    pub success_predictions: SuccessPredictions,
    pub metadata: GenerationMetadata,
}

/// Query for `GET /api/v2/blog-ideas/:analysis_id`. Spelled out rather than
/// flattening [`IdeaFilters`] because flattened numbers do not parse from
/// query strings.
#[derive(Debug, Deserialize)]
pub struct BlogIdeasQuery {
    #[serde(default)]
    pub user_id: String,
    pub content_format: Option<String>,
    pub min_quality_score: Option<i64>,
    #[serde(default)]
    pub selected_only: bool,
    pub priority_level: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BlogIdeasResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub blog_ideas: Vec<BlogIdea>,
    pub total_ideas: usize,
    pub selected_count: usize,
}

#[derive(Debug, Serialize)]
pub struct BlogIdeaResponse {
    pub success: bool,
    pub blog_idea: BlogIdea,
}

#[derive(Debug, Serialize)]
pub struct DeleteIdeaResponse {
    pub success: bool,
    pub idea_id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectIdeaRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(flatten)]
    pub update: SelectionUpdate,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub updates: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: BulkUpdateResult,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub analysis_id: Uuid,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct DiagnosisResponse {
    pub success: bool,
    pub diagnosis: Diagnosis,
}

#[derive(Debug, Serialize)]
pub struct FixScoresResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: FixReport,
}

#[derive(Debug, Serialize)]
pub struct FixAllScoresResponse {
    pub success: bool,
    pub user_id: String,
    #[serde(flatten)]
    pub report: FixAllReport,
}

#[derive(Debug, Deserialize)]
pub struct MonetizationRequest {
    pub user_id: Option<String>,
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub ideas: Vec<Value>,
    pub target_audience: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonetizationResponse {
    pub success: bool,
    pub enhanced_ideas: Vec<MonetizedIdea>,
    pub total_ideas: usize,
    pub average_monetization_score: f64,
    pub high_priority_count: usize,
}

fn average(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, n) = values.fold((0i64, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        (sum as f64 / n as f64 * 10.0).round() / 10.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v2/generate-blog-ideas/:analysis_id
///
/// Generates, scores and stores ideas for a saved trend analysis.
pub async fn handle_generate_blog_ideas(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<GenerateIdeasResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&request.user_id)?;

    let outcome = generate_blog_ideas(&db, state.llm.as_ref(), analysis_id).await?;
    let result = outcome.result;

    let metadata = GenerationMetadata {
        total_ideas_generated: result.ideas.len(),
        average_quality_score: result
            .strategic_insights
            .overall_quality_assessment
            .average_quality_score,
        avg_viral_score: average(result.ideas.iter().map(|i| i.viral_potential_score)),
        avg_seo_score: average(result.ideas.iter().map(|i| i.seo_optimization_score)),
        processing_time_seconds: result.processing_time_seconds,
        llm: outcome.llm,
        ideas_by_source: result.ideas_by_source,
        generation_timestamp: Utc::now().to_rfc3339(),
    };

    Ok(Json(GenerateIdeasResponse {
        success: true,
        analysis_id,
        generation_result_id: outcome.generation_result_id,
        blog_ideas: result.ideas,
        content_calendar: result.content_calendar,
        strategic_insights: result.strategic_insights,
        success_predictions: result.success_predictions,
        metadata,
    }))
}

/// GET /api/v2/blog-ideas/:analysis_id
pub async fn handle_get_blog_ideas(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<BlogIdeasQuery>,
) -> Result<Json<BlogIdeasResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let filters = IdeaFilters {
        content_format: query.content_format,
        min_quality_score: query.min_quality_score,
        selected_only: query.selected_only,
        priority_level: query.priority_level,
        sort_by: query.sort_by,
        order: query.order,
        limit: query.limit,
    };

    let ideas = get_blog_ideas(&db, analysis_id, &filters).await?;
    Ok(Json(BlogIdeasResponse {
        success: true,
        analysis_id,
        total_ideas: ideas.len(),
        selected_count: ideas.iter().filter(|i| i.selected).count(),
        blog_ideas: ideas,
    }))
}

/// GET /api/v2/blog-idea/:idea_id
pub async fn handle_get_blog_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<BlogIdeaResponse>, AppError> {
    let idea_id = parse_id(&idea_id, "idea_id")?;
    let db = state.db_for(&query.user_id)?;
    let idea = get_blog_idea_by_id(&db, idea_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Blog idea {idea_id} not found")))?;
    Ok(Json(BlogIdeaResponse {
        success: true,
        blog_idea: idea,
    }))
}

/// DELETE /api/v2/blog-idea/:idea_id
pub async fn handle_delete_blog_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DeleteIdeaResponse>, AppError> {
    let idea_id = parse_id(&idea_id, "idea_id")?;
    let db = state.db_for(&query.user_id)?;
    if !delete_blog_idea(&db, idea_id).await? {
        return Err(AppError::NotFound(format!("Blog idea {idea_id} not found")));
    }
    Ok(Json(DeleteIdeaResponse {
        success: true,
        idea_id,
        deleted: true,
    }))
}

/// PATCH /api/v2/blog-idea/:idea_id/select
///
/// Selects or deselects an idea and updates its planning fields.
pub async fn handle_select_blog_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Json(request): Json<SelectIdeaRequest>,
) -> Result<Json<BlogIdeaResponse>, AppError> {
    let idea_id = parse_id(&idea_id, "idea_id")?;
    let db = state.db_for(&request.user_id)?;

    if let Some(priority) = request.update.priority_level.as_deref() {
        if !priority.is_empty() && !VALID_PRIORITIES.contains(&priority) {
            return Err(AppError::Validation(
                "priority_level must be 'high', 'medium', or 'low'".to_string(),
            ));
        }
    }

    let idea = update_blog_idea_selection(&db, idea_id, &request.update)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog idea not found or access denied".to_string()))?;
    Ok(Json(BlogIdeaResponse {
        success: true,
        blog_idea: idea,
    }))
}

/// PATCH /api/v2/blog-ideas/bulk-update
pub async fn handle_bulk_update(
    State(state): State<AppState>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    let db = state.db_for(&request.user_id)?;
    if request.updates.is_empty() {
        return Err(AppError::Validation(
            "updates must be a non-empty list".to_string(),
        ));
    }
    for update in &request.updates {
        let id = update
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Validation("Each update must include an 'id' field".to_string())
            })?;
        parse_id(id, "idea_id")?;
    }
    let result = bulk_update_blog_ideas(&db, &request.updates).await?;
    Ok(Json(BulkUpdateResponse {
        success: result.failed == 0,
        result,
    }))
}

/// GET /api/v2/content-calendar/:analysis_id
pub async fn handle_get_content_calendar(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DocumentResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let calendar = get_content_calendar(&db, analysis_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("No content calendar found for analysis {analysis_id}"))
    })?;
    Ok(Json(DocumentResponse {
        success: true,
        analysis_id,
        data: calendar,
    }))
}

/// GET /api/v2/strategic-insights/:analysis_id
pub async fn handle_get_strategic_insights(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DocumentResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let insights = get_strategic_insights(&db, analysis_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("No strategic insights found for analysis {analysis_id}"))
    })?;
    Ok(Json(DocumentResponse {
        success: true,
        analysis_id,
        data: insights,
    }))
}

/// GET /api/v2/blog-ideas/:analysis_id/diagnose
pub async fn handle_diagnose_scores(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DiagnosisResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&query.user_id)?;
    let diagnosis = diagnose_analysis(&db, analysis_id).await?;
    Ok(Json(DiagnosisResponse {
        success: true,
        diagnosis,
    }))
}

/// POST /api/v2/blog-ideas/:analysis_id/fix-scores
pub async fn handle_fix_scores(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
    Json(request): Json<UserRequest>,
) -> Result<Json<FixScoresResponse>, AppError> {
    let analysis_id = parse_id(&analysis_id, "analysis_id")?;
    let db = state.db_for(&request.user_id)?;
    let report = fix_missing_scores(&db, analysis_id).await?;
    if report.total_ideas == 0 {
        return Err(AppError::NotFound(
            "No blog ideas found for this analysis".to_string(),
        ));
    }
    Ok(Json(FixScoresResponse {
        success: true,
        report,
    }))
}

/// POST /api/v2/blog-ideas/fix-all-scores
pub async fn handle_fix_all_scores(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<FixAllScoresResponse>, AppError> {
    let db = state.db_for(&request.user_id)?;
    let report = fix_all_user_analyses(&db).await?;
    Ok(Json(FixAllScoresResponse {
        success: true,
        user_id: request.user_id,
        report,
    }))
}

/// POST /api/v2/monetization/enhance
///
/// Scores ideas for revenue potential. Ideas come from the body, or from a
/// stored analysis when `analysis_id` and `user_id` are given instead.
pub async fn handle_enhance_monetization(
    State(state): State<AppState>,
    Json(request): Json<MonetizationRequest>,
) -> Result<Json<MonetizationResponse>, AppError> {
    let ideas: Vec<BlogIdea> = if !request.ideas.is_empty() {
        request.ideas.iter().filter_map(BlogIdea::from_value).collect()
    } else if let Some(analysis_id) = request.analysis_id.as_deref() {
        let analysis_id = parse_id(analysis_id, "analysis_id")?;
        let db = state.db_for(request.user_id.as_deref().unwrap_or(""))?;
        get_blog_ideas(&db, analysis_id, &IdeaFilters::default()).await?
    } else {
        return Err(AppError::Validation(
            "Provide either ideas or analysis_id with user_id".to_string(),
        ));
    };

    if ideas.is_empty() {
        return Err(AppError::Validation("No blog ideas to enhance".to_string()));
    }

    let audience = request.target_audience.as_deref().unwrap_or("general");
    let enhanced = enhance_ideas_with_monetization(ideas, audience);
    Ok(Json(MonetizationResponse {
        success: true,
        total_ideas: enhanced.len(),
        average_monetization_score: average(enhanced.iter().map(|i| i.monetization_score)),
        high_priority_count: enhanced
            .iter()
            .filter(|i| i.monetization_priority == "high")
            .count(),
        enhanced_ideas: enhanced,
    }))
}
