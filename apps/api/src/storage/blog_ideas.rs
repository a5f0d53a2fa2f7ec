//! Blog idea persistence: `blog_ideas`, `content_calendar` and
//! `blog_generation_results`, all scoped to the client's user.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ideas::models::{BlogGenerationResult, BlogIdea, IdeaScores, LlmInfo};
use crate::storage::{decode_json_column, filter_value, StorageError, SupabaseClient};

use crate::ideas::validation::validate_blog_idea;

const INSERT_BATCH_SIZE: usize = 50;
const DEFAULT_LIMIT: usize = 50;

/// Columns a bulk update may touch. Anything else in an update is dropped.
pub const BULK_UPDATABLE_FIELDS: &[&str] = &[
    "selected",
    "priority_level",
    "scheduled_publish_date",
    "notes",
    "status",
    "title",
    "description",
    "overall_quality_score",
    "viral_potential_score",
    "seo_optimization_score",
    "audience_alignment_score",
    "content_feasibility_score",
    "business_impact_score",
    // keyword enhancement
    "keyword_research_enhanced",
    "traffic_potential_score",
    "competition_score",
    "enhanced_primary_keywords",
    "enhanced_secondary_keywords",
    "keyword_research_data",
    "keyword_suggestions",
    "content_optimization_tips",
    "keyword_source_tools",
    "enhancement_timestamp",
];

const SORTABLE_COLUMNS: &[&str] = &[
    "overall_quality_score",
    "viral_potential_score",
    "seo_optimization_score",
    "audience_alignment_score",
    "content_feasibility_score",
    "business_impact_score",
    "created_at",
    "title",
    "priority_level",
];

const CALENDAR_JSON_FIELDS: &[&str] = &[
    "publishing_strategy",
    "priority_scheduling",
    "seasonal_optimization",
    "content_series_opportunities",
    "format_distribution",
    "estimated_resource_requirements",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaFilters {
    pub content_format: Option<String>,
    pub min_quality_score: Option<i64>,
    #[serde(default)]
    pub selected_only: bool,
    pub priority_level: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionUpdate {
    #[serde(default = "default_selected")]
    pub selected: bool,
    pub priority_level: Option<String>,
    pub scheduled_publish_date: Option<String>,
    pub notes: Option<String>,
}

fn default_selected() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkUpdateResult {
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json_text<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Stores a generation run: the ideas (validated, in batches of 50), the
/// content calendar and the run summary. Returns the summary row id.
///
/// A failed idea batch or summary insert fails the call; a failed calendar
/// insert is logged and skipped.
pub async fn save_blog_generation_results(
    db: &SupabaseClient,
    analysis_id: Uuid,
    result: &BlogGenerationResult,
    llm: &LlmInfo,
) -> Result<Uuid, StorageError> {
    let user_id = db.require_user()?;
    let now = now_rfc3339();

    let records: Vec<Value> = result
        .ideas
        .iter()
        .map(|idea| {
            let mut idea = idea.clone();
            validate_blog_idea(&mut idea);
            idea.to_record(user_id, analysis_id, &now)
        })
        .collect();

    for (n, batch) in records.chunks(INSERT_BATCH_SIZE).enumerate() {
        db.insert("blog_ideas", &Value::Array(batch.to_vec()))
            .await?;
        info!("Saved blog idea batch {} ({} ideas)", n + 1, batch.len());
    }

    let calendar = &result.content_calendar;
    let calendar_row = json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "trend_analysis_id": analysis_id,
        "publishing_strategy": json_text(&calendar.publishing_strategy),
        "priority_scheduling": json_text(&calendar.priority_scheduling),
        "seasonal_optimization": json_text(&calendar.seasonal_optimization),
        "content_series_opportunities": json_text(&calendar.content_series_opportunities),
        "format_distribution": json_text(&calendar.format_distribution),
        "estimated_resource_requirements": json_text(&calendar.estimated_resource_requirements),
        "created_at": now,
        "updated_at": now,
    });
    if let Err(e) = db.insert("content_calendar", &calendar_row).await {
        warn!("Failed to save content calendar for {analysis_id}: {e}");
    }

    let insights = &result.strategic_insights;
    let result_id = Uuid::new_v4();
    let summary_row = json!({
        "id": result_id,
        "user_id": user_id,
        "trend_analysis_id": analysis_id,
        "total_ideas_generated": result.ideas.len(),
        "average_quality_score": insights.overall_quality_assessment.average_quality_score,
        "processing_time_seconds": result.processing_time_seconds,
        "llm_provider": llm.provider,
        "llm_model": llm.model,
        "strategic_insights": json_text(insights),
        "success_predictions": json_text(&result.success_predictions),
        "implementation_recommendations": json_text(&insights.implementation_recommendations),
        "ideas_by_source": json_text(&result.ideas_by_source),
        "quality_tier_distribution": json_text(&insights.overall_quality_assessment.quality_tier_distribution),
        "created_at": now,
    });
    db.insert("blog_generation_results", &summary_row).await?;

    info!(
        "Saved {} blog ideas for analysis {analysis_id}",
        result.ideas.len()
    );
    Ok(result_id)
}

fn ideas_endpoint(db: &SupabaseClient, analysis_id: Uuid, filters: &IdeaFilters) -> Result<String, StorageError> {
    let mut endpoint = format!(
        "blog_ideas?trend_analysis_id=eq.{analysis_id}&{}",
        db.user_filter()?
    );
    if let Some(format) = &filters.content_format {
        endpoint.push_str(&format!("&content_format=eq.{}", filter_value(format)));
    }
    if let Some(min) = filters.min_quality_score {
        endpoint.push_str(&format!("&overall_quality_score=gte.{min}"));
    }
    if filters.selected_only {
        endpoint.push_str("&selected=eq.true");
    }
    if let Some(priority) = &filters.priority_level {
        endpoint.push_str(&format!("&priority_level=eq.{}", filter_value(priority)));
    }

    let sort_by = filters
        .sort_by
        .as_deref()
        .filter(|c| SORTABLE_COLUMNS.contains(c))
        .unwrap_or("overall_quality_score");
    let order = match filters.order.as_deref() {
        Some("asc") => "asc",
        _ => "desc",
    };
    let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);
    endpoint.push_str(&format!("&select=*&order={sort_by}.{order}&limit={limit}"));
    Ok(endpoint)
}

fn parse_ideas(rows: Vec<Value>) -> Vec<BlogIdea> {
    rows.iter().filter_map(BlogIdea::from_value).collect()
}

pub async fn get_blog_ideas(
    db: &SupabaseClient,
    analysis_id: Uuid,
    filters: &IdeaFilters,
) -> Result<Vec<BlogIdea>, StorageError> {
    let rows = db.select(&ideas_endpoint(db, analysis_id, filters)?).await?;
    Ok(parse_ideas(rows))
}

pub async fn get_blog_idea_by_id(
    db: &SupabaseClient,
    idea_id: Uuid,
) -> Result<Option<BlogIdea>, StorageError> {
    let rows = db
        .select(&format!(
            "blog_ideas?id=eq.{idea_id}&{}&select=*",
            db.user_filter()?
        ))
        .await?;
    Ok(parse_ideas(rows).into_iter().next())
}

/// Returns the updated idea, or `None` when no row matched.
pub async fn update_blog_idea_selection(
    db: &SupabaseClient,
    idea_id: Uuid,
    update: &SelectionUpdate,
) -> Result<Option<BlogIdea>, StorageError> {
    let mut body = Map::new();
    body.insert("selected".into(), json!(update.selected));
    body.insert("updated_at".into(), json!(now_rfc3339()));
    if let Some(priority) = update.priority_level.as_deref().filter(|p| !p.is_empty()) {
        body.insert("priority_level".into(), json!(priority));
    }
    if let Some(date) = update.scheduled_publish_date.as_deref().filter(|d| !d.is_empty()) {
        body.insert("scheduled_publish_date".into(), json!(date));
    }
    if let Some(notes) = &update.notes {
        body.insert("notes".into(), json!(notes));
    }

    let rows = db
        .update(
            &format!("blog_ideas?id=eq.{idea_id}&{}", db.user_filter()?),
            &Value::Object(body),
        )
        .await?;
    info!("Updated blog idea {idea_id} selection: {}", update.selected);
    Ok(parse_ideas(rows).into_iter().next())
}

/// Returns whether a row was deleted.
pub async fn delete_blog_idea(db: &SupabaseClient, idea_id: Uuid) -> Result<bool, StorageError> {
    let rows = db
        .delete(&format!("blog_ideas?id=eq.{idea_id}&{}", db.user_filter()?))
        .await?;
    info!("Deleted blog idea {idea_id}");
    Ok(!rows.is_empty())
}

/// Latest calendar for the analysis with its JSON text columns decoded.
pub async fn get_content_calendar(
    db: &SupabaseClient,
    analysis_id: Uuid,
) -> Result<Option<Value>, StorageError> {
    let rows = db
        .select(&format!(
            "content_calendar?trend_analysis_id=eq.{analysis_id}&{}&select=*&order=created_at.desc&limit=1",
            db.user_filter()?
        ))
        .await?;
    let Some(mut row) = rows.into_iter().next() else {
        return Ok(None);
    };
    for field in CALENDAR_JSON_FIELDS {
        let decoded = decode_json_column(row.get(*field), json!({}));
        row[*field] = decoded;
    }
    Ok(Some(row))
}

pub async fn get_strategic_insights(
    db: &SupabaseClient,
    analysis_id: Uuid,
) -> Result<Option<Value>, StorageError> {
    let rows = db
        .select(&format!(
            "blog_generation_results?trend_analysis_id=eq.{analysis_id}&{}&select=*&order=created_at.desc&limit=1",
            db.user_filter()?
        ))
        .await?;
    let Some(row) = rows.into_iter().next() else {
        return Ok(None);
    };

    Ok(Some(json!({
        "generation_metadata": {
            "total_ideas_generated": row.get("total_ideas_generated").cloned().unwrap_or(json!(0)),
            "average_quality_score": row.get("average_quality_score").cloned().unwrap_or(json!(0)),
            "processing_time_seconds": row.get("processing_time_seconds").cloned().unwrap_or(json!(0)),
            "llm_provider": row.get("llm_provider").cloned().unwrap_or(Value::Null),
            "llm_model": row.get("llm_model").cloned().unwrap_or(Value::Null),
            "created_at": row.get("created_at").cloned().unwrap_or(Value::Null),
        },
        "strategic_insights": decode_json_column(row.get("strategic_insights"), json!({})),
        "success_predictions": decode_json_column(row.get("success_predictions"), json!({})),
        "implementation_recommendations": decode_json_column(row.get("implementation_recommendations"), json!([])),
        "ideas_by_source": decode_json_column(row.get("ideas_by_source"), json!({})),
        "quality_tier_distribution": decode_json_column(row.get("quality_tier_distribution"), json!({})),
    })))
}

/// Applies each update to the idea named by its `id`. Keys outside
/// [`BULK_UPDATABLE_FIELDS`] are dropped; one failed row does not stop the rest.
pub async fn bulk_update_blog_ideas(
    db: &SupabaseClient,
    updates: &[Value],
) -> Result<BulkUpdateResult, StorageError> {
    let user_filter = db.user_filter()?;
    let mut result = BulkUpdateResult::default();

    for update in updates {
        let Some(id) = update.get("id").and_then(Value::as_str) else {
            result.failed += 1;
            result.errors.push("Update is missing an id".to_string());
            continue;
        };

        let mut body = Map::new();
        if let Some(fields) = update.as_object() {
            for (key, value) in fields {
                if BULK_UPDATABLE_FIELDS.contains(&key.as_str()) {
                    body.insert(key.clone(), value.clone());
                }
            }
        }
        body.insert("updated_at".into(), json!(now_rfc3339()));

        let endpoint = format!("blog_ideas?id=eq.{}&{user_filter}", filter_value(id));
        match db.update(&endpoint, &Value::Object(body)).await {
            Ok(_) => result.updated += 1,
            Err(e) => {
                warn!("Bulk update failed for idea {id}: {e}");
                result.failed += 1;
                result.errors.push(format!("{id}: {e}"));
            }
        }
    }

    info!(
        "Bulk updated {} blog ideas ({} failed)",
        result.updated, result.failed
    );
    Ok(result)
}

pub async fn update_idea_scores(
    db: &SupabaseClient,
    idea_id: &str,
    scores: &IdeaScores,
) -> Result<(), StorageError> {
    let mut body = scores.to_json();
    body["updated_at"] = json!(now_rfc3339());
    db.update(
        &format!("blog_ideas?id=eq.{}&{}", filter_value(idea_id), db.user_filter()?),
        &body,
    )
    .await?;
    Ok(())
}

/// Distinct analysis ids with stored generation runs, newest first.
pub async fn list_generated_analyses(
    db: &SupabaseClient,
    limit: usize,
) -> Result<Vec<Uuid>, StorageError> {
    let rows = db
        .select(&format!(
            "blog_generation_results?{}&select=trend_analysis_id&order=created_at.desc&limit={limit}",
            db.user_filter()?
        ))
        .await?;

    let mut ids: Vec<Uuid> = Vec::new();
    for row in rows {
        let parsed = row
            .get("trend_analysis_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        if let Some(id) = parsed {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideas::planning::{
        build_content_calendar, build_strategic_insights, calculate_success_predictions,
    };
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER: &str = "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f";
    const ANALYSIS: &str = "0e7d3f9a-1111-4c2b-9a55-0123456789ab";

    fn scoped_client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&server.uri(), "k", 5)
            .unwrap()
            .with_user(USER)
            .unwrap()
    }

    fn analysis_id() -> Uuid {
        Uuid::parse_str(ANALYSIS).unwrap()
    }

    fn generation(count: usize) -> BlogGenerationResult {
        let ideas: Vec<BlogIdea> = (0..count)
            .map(|n| BlogIdea {
                title: format!("Idea {n}"),
                content_format: "Top 10 list".into(),
                overall_quality_score: 75,
                ..Default::default()
            })
            .collect();
        BlogGenerationResult {
            content_calendar: build_content_calendar(&ideas, "yoga"),
            strategic_insights: build_strategic_insights(&ideas),
            success_predictions: calculate_success_predictions(&ideas),
            ideas_by_source: BTreeMap::new(),
            processing_time_seconds: 1.5,
            ideas,
        }
    }

    fn llm() -> LlmInfo {
        LlmInfo {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
        }
    }

    #[tokio::test]
    async fn test_save_inserts_ideas_in_batches_of_fifty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/blog_ideas"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/content_calendar"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/blog_generation_results"))
            .and(body_partial_json(json!({
                "trend_analysis_id": ANALYSIS,
                "total_ideas_generated": 51,
                "llm_provider": "openai"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let id = save_blog_generation_results(&scoped_client(&server), analysis_id(), &generation(51), &llm())
            .await
            .unwrap();
        assert!(!id.is_nil());

        let requests = server.received_requests().await.unwrap();
        let first_batch: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let batch = first_batch.as_array().unwrap();
        assert_eq!(batch.len(), 50);
        // Normalized before insert.
        assert_eq!(batch[0]["content_format"], "listicle");
        assert_eq!(batch[0]["user_id"], USER);
        assert_eq!(batch[0]["outline"], "[]");
    }

    #[tokio::test]
    async fn test_save_fails_when_idea_batch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/blog_ideas"))
            .respond_with(ResponseTemplate::new(400).set_body_string("violates check"))
            .mount(&server)
            .await;

        let err = save_blog_generation_results(&scoped_client(&server), analysis_id(), &generation(2), &llm())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_get_blog_ideas_builds_filters_and_decodes_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/blog_ideas"))
            .and(query_param("trend_analysis_id", format!("eq.{ANALYSIS}")))
            .and(query_param("user_id", format!("eq.{USER}")))
            .and(query_param("overall_quality_score", "gte.70"))
            .and(query_param("selected", "eq.true"))
            .and(query_param("order", "created_at.asc"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "i1", "title": "Yoga at home", "primary_keywords": "[\"yoga\"]"},
                {"id": "i2", "title": ""}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let filters = IdeaFilters {
            min_quality_score: Some(70),
            selected_only: true,
            sort_by: Some("created_at".into()),
            order: Some("asc".into()),
            limit: Some(10),
            ..Default::default()
        };
        let ideas = get_blog_ideas(&scoped_client(&server), analysis_id(), &filters)
            .await
            .unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].primary_keywords, vec!["yoga"]);
    }

    #[test]
    fn test_unknown_sort_column_falls_back_to_quality() {
        let db = SupabaseClient::new("http://localhost", "k", 5)
            .unwrap()
            .with_user(USER)
            .unwrap();
        let filters = IdeaFilters {
            sort_by: Some("id;drop".into()),
            ..Default::default()
        };
        let endpoint = ideas_endpoint(&db, analysis_id(), &filters).unwrap();
        assert!(endpoint.ends_with("&select=*&order=overall_quality_score.desc&limit=50"));
    }

    #[tokio::test]
    async fn test_bulk_update_forwards_whitelisted_fields_only() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/blog_ideas"))
            .and(query_param("id", "eq.i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "i1"}])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/blog_ideas"))
            .and(query_param("id", "eq.i2"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let updates = vec![
            json!({
                "id": "i1",
                "selected": true,
                "title": "Smart locks compared",
                "description": "Five locks, one winner",
                "keyword_research_enhanced": true,
                "enhanced_primary_keywords": ["smart lock"],
                "traffic_potential_score": 71,
                "user_id": "other",
                "trend_analysis_id": "other"
            }),
            json!({"id": "i2", "notes": "x"}),
            json!({"selected": false}),
        ];
        let result = bulk_update_blog_ideas(&scoped_client(&server), &updates)
            .await
            .unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.errors.len(), 2);

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["selected"], true);
        assert_eq!(body["title"], "Smart locks compared");
        assert_eq!(body["description"], "Five locks, one winner");
        assert_eq!(body["keyword_research_enhanced"], true);
        assert_eq!(body["enhanced_primary_keywords"], json!(["smart lock"]));
        assert_eq!(body["traffic_potential_score"], 71);
        assert!(body.get("user_id").is_none());
        assert!(body.get("trend_analysis_id").is_none());
        assert!(body.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn test_get_content_calendar_decodes_json_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/content_calendar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "publishing_strategy": "{\"recommended_frequency\":\"1-2 posts per week\"}",
                "content_series_opportunities": "[\"A\"]"
            }])))
            .mount(&server)
            .await;

        let calendar = get_content_calendar(&scoped_client(&server), analysis_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            calendar["publishing_strategy"]["recommended_frequency"],
            "1-2 posts per week"
        );
        assert_eq!(calendar["content_series_opportunities"], json!(["A"]));
        assert_eq!(calendar["format_distribution"], json!({}));
    }

    #[tokio::test]
    async fn test_strategic_insights_absent_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/blog_generation_results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let insights = get_strategic_insights(&scoped_client(&server), analysis_id())
            .await
            .unwrap();
        assert!(insights.is_none());
    }

    #[tokio::test]
    async fn test_list_generated_analyses_deduplicates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/blog_generation_results"))
            .and(query_param("select", "trend_analysis_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"trend_analysis_id": ANALYSIS},
                {"trend_analysis_id": ANALYSIS},
                {"trend_analysis_id": "not-a-uuid"}
            ])))
            .mount(&server)
            .await;
        let ids = list_generated_analyses(&scoped_client(&server), 50).await.unwrap();
        assert_eq!(ids, vec![analysis_id()]);
    }
}
