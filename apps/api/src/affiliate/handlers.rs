//! Axum route handlers for affiliate research under `/api/v2/affiliate-research`.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::affiliate::models::{AffiliateResearch, ProfitabilityAnalysis, StoredResearch};
use crate::affiliate::research::research_affiliate_programs;
use crate::errors::{parse_id, AppError};
use crate::state::AppState;
use crate::storage::affiliate::{
    delete_old_research, get_affiliate_research_by_session, get_affiliate_research_by_topic,
    get_recent_research, store_affiliate_research, StoredResearchSummary,
};

const DEFAULT_MIN_THRESHOLD: u32 = 10;
/// Cached research with fewer programs than this is researched again.
const MIN_CACHED_PROGRAMS: usize = 3;
const DEFAULT_HISTORY_DAYS: i64 = 7;
const DEFAULT_DAYS_TO_KEEP: i64 = 30;
const MAX_DAYS: i64 = 3650;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_threshold() -> u32 {
    DEFAULT_MIN_THRESHOLD
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default = "default_threshold")]
    pub min_commission_threshold: u32,
    #[serde(default = "default_true")]
    pub use_cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub user_id: String,
}

/// Research loaded from storage instead of a fresh search.
#[derive(Debug, Serialize)]
pub struct CachedResearch {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub programs: Vec<Value>,
    pub total_programs: usize,
    pub profitability_analysis: ProfitabilityAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResearchPayload {
    Fresh(AffiliateResearch),
    Cached(CachedResearch),
}

impl ResearchPayload {
    fn analysis(&self) -> &ProfitabilityAnalysis {
        match self {
            ResearchPayload::Fresh(r) => &r.profitability_analysis,
            ResearchPayload::Cached(r) => &r.profitability_analysis,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThresholdCheck {
    pub min_required: u32,
    pub actual_score: u32,
    pub threshold_met: bool,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub success: bool,
    pub cached: bool,
    pub affiliate_research: ResearchPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_summary: Option<StoredResearchSummary>,
    pub stored: bool,
    pub should_proceed: bool,
    pub threshold_check: ThresholdCheck,
    pub user_id: Uuid,
    pub research_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
pub struct SubtopicsResponse {
    pub success: bool,
    pub topic: String,
    pub subtopics: Vec<String>,
    pub subtopic_count: usize,
    pub user_id: Uuid,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub success: bool,
    pub topic: String,
    pub is_profitable: bool,
    pub profitability_score: u32,
    pub level: &'static str,
    pub total_programs: usize,
    pub avg_commission_rate: f64,
    pub avg_commission_amount: f64,
    pub recommendation: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: String,
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<Value>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default)]
    pub user_id: String,
    pub days_to_keep: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_sessions: usize,
    pub days_to_keep: i64,
}

#[derive(Debug, Deserialize)]
pub struct ByAnalysisQuery {
    #[serde(default)]
    pub trend_analysis_id: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AffiliateResearchData {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub programs: Vec<Value>,
    pub overall_assessment: ProfitabilityAnalysis,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ByAnalysisResponse {
    pub success: bool,
    pub affiliate_research_data: AffiliateResearchData,
    pub trend_analysis_id: Uuid,
    pub retrieved_at: String,
}

fn require_topic(topic: &str) -> Result<&str, AppError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("Topic is required".to_string()));
    }
    Ok(topic)
}

fn require_days(days: i64, field: &str) -> Result<i64, AppError> {
    if days < 0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    if days > MAX_DAYS {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_DAYS}"
        )));
    }
    Ok(days)
}

fn cached_payload(topic: &str, stored: StoredResearch) -> CachedResearch {
    let profitability_analysis = stored.profitability();
    let subtopics = stored.subtopics();
    CachedResearch {
        topic: topic.to_string(),
        subtopics,
        total_programs: stored.programs.len(),
        programs: stored.programs,
        profitability_analysis,
    }
}

fn stored_session_id(stored: &StoredResearch) -> Option<Uuid> {
    stored
        .session
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v2/affiliate-research
///
/// Reuses the user's latest research for the topic when it holds enough
/// programs; otherwise researches and stores. A storage failure after a fresh
/// run still returns the research, with `stored: false`.
pub async fn handle_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, AppError> {
    let db = state.db_for(&request.user_id)?;
    let user_id = db.require_user()?;
    let topic = require_topic(&request.topic)?;

    let mut cached = None;
    if request.use_cached {
        match get_affiliate_research_by_topic(&db, topic).await {
            Ok(Some(stored)) if stored.programs.len() >= MIN_CACHED_PROGRAMS => {
                info!(
                    "Reusing {} stored programs for topic '{topic}'",
                    stored.programs.len()
                );
                cached = Some(stored);
            }
            Ok(_) => {}
            Err(e) => warn!("Cache lookup failed for '{topic}', researching instead: {e}"),
        }
    }

    let (payload, session_id, storage_summary, stored) = match cached {
        Some(stored) => {
            let session_id = stored_session_id(&stored);
            (
                ResearchPayload::Cached(cached_payload(topic, stored)),
                session_id,
                None,
                true,
            )
        }
        None => {
            let research =
                research_affiliate_programs(state.affiliate.as_ref(), topic, &request.subtopics)
                    .await;
            match store_affiliate_research(&db, &research).await {
                Ok(summary) => (
                    ResearchPayload::Fresh(research),
                    Some(summary.session_id),
                    Some(summary),
                    true,
                ),
                Err(e) => {
                    warn!("Failed to store affiliate research for '{topic}': {e}");
                    (ResearchPayload::Fresh(research), None, None, false)
                }
            }
        }
    };

    let score = payload.analysis().score;
    let should_proceed = score >= request.min_commission_threshold;
    let (cancellation_reason, suggestions) = if should_proceed {
        (None, None)
    } else {
        (
            Some("Topic profitability below threshold"),
            Some(vec![
                "Try a more specific subtopic",
                "Explore related niches with higher commissions",
                "Consider different product categories",
            ]),
        )
    };

    Ok(Json(ResearchResponse {
        success: true,
        cached: matches!(payload, ResearchPayload::Cached(_)),
        affiliate_research: payload,
        session_id,
        storage_summary,
        stored,
        should_proceed,
        threshold_check: ThresholdCheck {
            min_required: request.min_commission_threshold,
            actual_score: score,
            threshold_met: should_proceed,
        },
        user_id,
        research_timestamp: Utc::now().to_rfc3339(),
        cancellation_reason,
        suggestions,
    }))
}

/// POST /api/v2/affiliate-research/subtopics
pub async fn handle_subtopics(
    State(state): State<AppState>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<SubtopicsResponse>, AppError> {
    let user_id = state.db_for(&request.user_id)?.require_user()?;
    let topic = require_topic(&request.topic)?;

    let subtopics = state.affiliate.suggest_subtopics(topic).await;
    Ok(Json(SubtopicsResponse {
        success: true,
        topic: topic.to_string(),
        subtopic_count: subtopics.len(),
        subtopics,
        user_id,
        generated_at: Utc::now().to_rfc3339(),
    }))
}

/// POST /api/v2/affiliate-research/validate
///
/// Quick check: one focused search, nothing stored.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    state.db_for(&request.user_id)?;
    let topic = require_topic(&request.topic)?;

    let subtopics = vec![format!("{topic} affiliate program")];
    let research = research_affiliate_programs(state.affiliate.as_ref(), topic, &subtopics).await;
    let analysis = research.profitability_analysis;
    let is_profitable = analysis.level.is_profitable();

    Ok(Json(ValidationResponse {
        success: true,
        topic: topic.to_string(),
        is_profitable,
        profitability_score: analysis.score,
        level: analysis.level.as_str(),
        total_programs: analysis.total_programs,
        avg_commission_rate: analysis.avg_commission_rate,
        avg_commission_amount: analysis.avg_commission_amount,
        recommendation: if is_profitable {
            "proceed"
        } else {
            "consider_alternatives"
        },
    }))
}

/// GET /api/v2/affiliate-research/history
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let db = state.db_for(&query.user_id)?;
    let days = require_days(query.days.unwrap_or(DEFAULT_HISTORY_DAYS), "days")?;
    let history = get_recent_research(&db, days).await?;
    Ok(Json(HistoryResponse {
        success: true,
        count: history.len(),
        history,
    }))
}

/// DELETE /api/v2/affiliate-research/history
pub async fn handle_cleanup(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<CleanupResponse>, AppError> {
    let db = state.db_for(&query.user_id)?;
    let days_to_keep = require_days(
        query.days_to_keep.unwrap_or(DEFAULT_DAYS_TO_KEEP),
        "days_to_keep",
    )?;
    let deleted_sessions = delete_old_research(&db, days_to_keep).await?;
    Ok(Json(CleanupResponse {
        success: true,
        deleted_sessions,
        days_to_keep,
    }))
}

/// GET /api/v2/affiliate-research/get-by-analysis
///
/// `trend_analysis_id` is the research session id handed out when the
/// research was stored.
pub async fn handle_get_by_analysis(
    State(state): State<AppState>,
    Query(query): Query<ByAnalysisQuery>,
) -> Result<Json<ByAnalysisResponse>, AppError> {
    if query.trend_analysis_id.trim().is_empty() {
        return Err(AppError::Validation(
            "trend_analysis_id parameter is required".to_string(),
        ));
    }
    let session_id = parse_id(&query.trend_analysis_id, "trend_analysis_id")?;
    let db = state.db_for(&query.user_id)?;

    let stored = get_affiliate_research_by_session(&db, session_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No affiliate research data found for trend_analysis_id {session_id}"
            ))
        })?;

    let overall_assessment = stored.profitability();
    let subtopics = stored.subtopics();
    let topic = stored
        .session
        .get("topic")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let avg_rate = if stored.analysis.is_some() {
        overall_assessment.avg_commission_rate.to_string()
    } else {
        "N/A".to_string()
    };
    let recommendations = vec![
        format!("Based on {} affiliate programs analyzed", stored.programs.len()),
        format!("Average commission rate: {avg_rate}%"),
        format!("Profitability level: {}", overall_assessment.level.as_str()),
    ];

    Ok(Json(ByAnalysisResponse {
        success: true,
        affiliate_research_data: AffiliateResearchData {
            topic,
            subtopics,
            programs: stored.programs,
            overall_assessment,
            recommendations,
        },
        trend_analysis_id: session_id,
        retrieved_at: Utc::now().to_rfc3339(),
    }))
}
