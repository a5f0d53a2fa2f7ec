//! Trend analysis persistence. The analysis row carries the PyTrends result in
//! `metadata.pytrends_analysis`; topics, opportunities and keyword intelligence
//! live in their own tables keyed by `trend_analysis_id`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::{decode_json_column, filter_value, StorageError, SupabaseClient};

const TOPIC_SORT_COLUMNS: [&str; 5] = [
    "viral_potential",
    "title",
    "search_volume",
    "competition",
    "created_at",
];

/// A finished trend analysis as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendAnalysisInput {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub focus_area: String,
    #[serde(default)]
    pub trending_topics: Vec<Value>,
    #[serde(default)]
    pub content_opportunities: Vec<Value>,
    pub seo_intelligence: Option<Value>,
    pub pytrends_analysis: Option<Value>,
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub processing_time: f64,
}

/// Everything stored for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysisBundle {
    pub trend_analysis_id: Uuid,
    pub analysis_info: Value,
    pub trending_topics: Vec<Value>,
    pub content_opportunities: Vec<Value>,
    pub keyword_intelligence: Value,
    pub pytrends_analysis: Value,
    pub pytrends_enhanced: bool,
    pub pytrends_available: bool,
}

impl TrendAnalysisBundle {
    pub fn topic(&self) -> &str {
        self.analysis_info
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn target_audience(&self) -> &str {
        self.analysis_info
            .get("target_audience")
            .and_then(Value::as_str)
            .unwrap_or("general audience")
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn field<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| data.get(*k)).filter(|v| !v.is_null())
}

fn or_default(data: &Value, keys: &[&str], default: Value) -> Value {
    field(data, keys).cloned().unwrap_or(default)
}

fn hotspot_count(pytrends: &Value) -> usize {
    pytrends
        .pointer("/geographic_insights/global_hotspots")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn insight_count(pytrends: &Value) -> usize {
    pytrends
        .get("actionable_insights")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn build_metadata(input: &TrendAnalysisInput) -> Value {
    let pytrends = input.pytrends_analysis.clone().unwrap_or_else(|| json!({}));
    json!({
        "confidence_score": input.confidence_score.unwrap_or(85.0),
        "data_sources": input.data_sources,
        "processing_time": input.processing_time,
        "trending_topics_count": input.trending_topics.len(),
        "opportunities_count": input.content_opportunities.len(),
        "pytrends_enhanced": pytrends.get("pytrends_enhanced").and_then(Value::as_bool).unwrap_or(false),
        "pytrends_timestamp": pytrends.get("analysis_timestamp").cloned().unwrap_or(Value::Null),
        "geographic_hotspots_count": hotspot_count(&pytrends),
        "actionable_insights_count": insight_count(&pytrends),
        "pytrends_analysis": pytrends,
    })
}

fn topic_record(n: usize, topic: &Value, user_id: Uuid, analysis_id: Uuid, now: &str) -> Value {
    json!({
        "user_id": user_id,
        "trend_analysis_id": analysis_id,
        "title": or_default(topic, &["trend", "topic", "title"], json!(format!("Trending Topic {}", n + 1))),
        "viral_potential": or_default(topic, &["viral_potential"], json!(0)),
        "keywords": or_default(topic, &["keywords"], json!([])),
        "search_volume": or_default(topic, &["search_volume"], json!("unknown")),
        "competition": or_default(topic, &["competition"], json!("unknown")),
        "selected": false,
        "additional_data": {
            "description": or_default(topic, &["description"], json!("")),
            "relevance": or_default(topic, &["relevance"], json!("")),
            "content_formats": or_default(topic, &["content_formats"], json!([])),
            "content_angles": or_default(topic, &["content_angles"], json!([])),
            "trend_strength": or_default(topic, &["trend_strength"], json!("")),
            "audience_alignment_score": or_default(topic, &["audience_alignment_score"], json!(0)),
            "content_gap_score": or_default(topic, &["content_gap_score"], json!(0)),
            "traffic_potential": or_default(topic, &["traffic_potential"], json!("")),
            "geographic_relevance": or_default(topic, &["geographic_relevance"], json!([])),
            "seasonal_factors": or_default(topic, &["seasonal_factors"], json!("")),
        },
        "created_at": now,
    })
}

fn opportunity_record(n: usize, opp: &Value, user_id: Uuid, analysis_id: Uuid, now: &str) -> Value {
    json!({
        "user_id": user_id,
        "trend_analysis_id": analysis_id,
        "title": or_default(opp, &["opportunity", "title"], json!(format!("Content Opportunity {}", n + 1))),
        "format": or_default(opp, &["format"], json!("unknown")),
        "difficulty": or_default(opp, &["difficulty"], json!(50)),
        "engagement_potential": or_default(opp, &["engagement_potential"], json!("medium")),
        "selected": false,
        "additional_data": {
            "time_investment": or_default(opp, &["time_investment"], json!("")),
            "keywords": or_default(opp, &["keywords"], json!([])),
            "monetization": or_default(opp, &["monetization"], json!("")),
            "distribution": or_default(opp, &["distribution"], json!([])),
            "competitive_advantage": or_default(opp, &["competitive_advantage"], json!("")),
            "target_keywords": or_default(opp, &["target_keywords"], json!([])),
        },
        "created_at": now,
    })
}

fn keyword_record(seo: &Value, user_id: Uuid, analysis_id: Uuid, now: &str) -> Value {
    json!({
        "user_id": user_id,
        "trend_analysis_id": analysis_id,
        "high_volume_keywords": or_default(seo, &["high_volume_keywords"], json!([])),
        "low_competition_keywords": or_default(seo, &["low_competition_keywords"], json!([])),
        "emerging_keywords": or_default(seo, &["emerging_keywords"], json!([])),
        "additional_data": {
            "keyword_clusters": or_default(seo, &["keyword_clusters"], json!({})),
            "semantic_clusters": or_default(seo, &["semantic_keyword_clusters"], json!({})),
            "keyword_difficulty_scores": or_default(seo, &["keyword_difficulty_scores"], json!({})),
            "search_volumes": or_default(seo, &["search_volumes"], json!({})),
            "trend_data": or_default(seo, &["trend_data"], json!({})),
        },
        "created_at": now,
    })
}

/// Creates the analysis row and its children. Only the analysis insert is
/// fatal; the child tables are best effort.
pub async fn save_trend_analysis_results(
    db: &SupabaseClient,
    input: &TrendAnalysisInput,
) -> Result<Uuid, StorageError> {
    let user_id = db.require_user()?;
    let now = now_rfc3339();
    info!("Saving trend analysis for topic '{}'", input.topic);

    let row = json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "topic": input.topic,
        "target_audience": input.target_audience,
        "focus_area": input.focus_area,
        "status": "completed",
        "metadata": build_metadata(input),
        "created_at": now,
        "updated_at": now,
    });
    let inserted = db.insert("trend_analyses", &row).await?;
    let analysis_id = inserted
        .first()
        .and_then(|r| r.get("id"))
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .or_else(|| row["id"].as_str().and_then(|s| Uuid::parse_str(s).ok()))
        .ok_or_else(|| StorageError::Decode("trend analysis insert returned no id".into()))?;

    if input.pytrends_analysis.is_none() {
        warn!("No PyTrends data stored for analysis {analysis_id}");
    }

    if !input.trending_topics.is_empty() {
        let records: Vec<Value> = input
            .trending_topics
            .iter()
            .enumerate()
            .map(|(n, t)| topic_record(n, t, user_id, analysis_id, &now))
            .collect();
        if let Err(e) = db.insert("trending_topics", &Value::Array(records)).await {
            warn!("Failed to save trending topics: {e}");
        }
    }

    if !input.content_opportunities.is_empty() {
        let records: Vec<Value> = input
            .content_opportunities
            .iter()
            .enumerate()
            .map(|(n, o)| opportunity_record(n, o, user_id, analysis_id, &now))
            .collect();
        if let Err(e) = db.insert("content_opportunities", &Value::Array(records)).await {
            warn!("Failed to save content opportunities: {e}");
        }
    }

    if let Some(seo) = &input.seo_intelligence {
        let record = keyword_record(seo, user_id, analysis_id, &now);
        if let Err(e) = db.insert("keyword_intelligence", &record).await {
            warn!("Failed to save keyword intelligence: {e}");
        }
    }

    info!("Trend analysis saved with id {analysis_id}");
    Ok(analysis_id)
}

async fn child_rows(db: &SupabaseClient, table: &str, analysis_id: Uuid) -> Vec<Value> {
    let endpoint = match db.user_filter() {
        Ok(filter) => format!("{table}?trend_analysis_id=eq.{analysis_id}&{filter}&select=*"),
        Err(_) => return Vec::new(),
    };
    match db.select(&endpoint).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to load {table} for {analysis_id}: {e}");
            Vec::new()
        }
    }
}

/// `None` when the analysis does not exist for this user.
pub async fn get_trend_analysis(
    db: &SupabaseClient,
    analysis_id: Uuid,
) -> Result<Option<TrendAnalysisBundle>, StorageError> {
    let rows = db
        .select(&format!(
            "trend_analyses?id=eq.{analysis_id}&{}&select=*",
            db.user_filter()?
        ))
        .await?;
    let Some(analysis) = rows.into_iter().next() else {
        return Ok(None);
    };

    let trending_topics = child_rows(db, "trending_topics", analysis_id).await;
    let content_opportunities = child_rows(db, "content_opportunities", analysis_id).await;
    let keyword_intelligence = child_rows(db, "keyword_intelligence", analysis_id)
        .await
        .into_iter()
        .next()
        .unwrap_or_else(|| json!({}));

    let metadata = decode_json_column(analysis.get("metadata"), json!({}));
    let pytrends = metadata
        .get("pytrends_analysis")
        .filter(|p| p.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));
    let pytrends_available = pytrends.as_object().is_some_and(|m| !m.is_empty());
    let pytrends_enhanced = pytrends
        .get("pytrends_enhanced")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if pytrends_available {
        info!(
            "PyTrends data found for analysis {analysis_id}: {} hotspots, {} insights",
            hotspot_count(&pytrends),
            insight_count(&pytrends)
        );
    }

    Ok(Some(TrendAnalysisBundle {
        trend_analysis_id: analysis_id,
        analysis_info: analysis,
        trending_topics,
        content_opportunities,
        keyword_intelligence,
        pytrends_analysis: pytrends,
        pytrends_enhanced,
        pytrends_available,
    }))
}

pub async fn list_trend_analyses(db: &SupabaseClient, limit: usize) -> Result<Vec<Value>, StorageError> {
    db.select(&format!(
        "trend_analyses?{}&select=*&order=created_at.desc&limit={limit}",
        db.user_filter()?
    ))
    .await
}

/// Merges a PyTrends result into the analysis metadata. Returns `false` when
/// the analysis does not exist for this user.
pub async fn attach_pytrends(
    db: &SupabaseClient,
    analysis_id: Uuid,
    pytrends: &Value,
) -> Result<bool, StorageError> {
    let endpoint = format!("trend_analyses?id=eq.{analysis_id}&{}", db.user_filter()?);
    let rows = db.select(&format!("{endpoint}&select=metadata")).await?;
    let Some(row) = rows.first() else {
        return Ok(false);
    };

    let mut metadata = decode_json_column(row.get("metadata"), json!({}));
    if !metadata.is_object() {
        metadata = json!({});
    }
    let now = now_rfc3339();
    metadata["pytrends_analysis"] = pytrends.clone();
    metadata["pytrends_enhanced"] = json!(pytrends
        .get("pytrends_enhanced")
        .and_then(Value::as_bool)
        .unwrap_or(false));
    metadata["pytrends_timestamp"] = json!(now);
    metadata["geographic_hotspots_count"] = json!(hotspot_count(pytrends));
    metadata["actionable_insights_count"] = json!(insight_count(pytrends));

    db.update(&endpoint, &json!({ "metadata": metadata, "updated_at": now }))
        .await?;
    info!("Attached PyTrends analysis to {analysis_id}");
    Ok(true)
}

#[derive(Debug, Clone, Default)]
pub struct TopicFilters {
    pub selected_only: bool,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OpportunityFilters {
    pub selected_only: bool,
    pub format: Option<String>,
    pub engagement: Option<String>,
}

fn topics_endpoint(
    db: &SupabaseClient,
    analysis_id: Uuid,
    filters: &TopicFilters,
) -> Result<String, StorageError> {
    let mut endpoint = format!(
        "trending_topics?trend_analysis_id=eq.{analysis_id}&{}",
        db.user_filter()?
    );
    if filters.selected_only {
        endpoint.push_str("&selected=eq.true");
    }
    let sort_by = filters
        .sort_by
        .as_deref()
        .filter(|c| TOPIC_SORT_COLUMNS.contains(c))
        .unwrap_or("viral_potential");
    let order = match filters.sort_order.as_deref() {
        Some("asc") => "asc",
        _ => "desc",
    };
    endpoint.push_str(&format!("&select=*&order={sort_by}.{order}"));
    Ok(endpoint)
}

fn opportunities_endpoint(
    db: &SupabaseClient,
    analysis_id: Uuid,
    filters: &OpportunityFilters,
) -> Result<String, StorageError> {
    let mut endpoint = format!(
        "content_opportunities?trend_analysis_id=eq.{analysis_id}&{}",
        db.user_filter()?
    );
    if filters.selected_only {
        endpoint.push_str("&selected=eq.true");
    }
    if let Some(format) = filters.format.as_deref().filter(|f| !f.is_empty()) {
        endpoint.push_str(&format!("&format=eq.{}", filter_value(format)));
    }
    if let Some(engagement) = filters.engagement.as_deref().filter(|e| !e.is_empty()) {
        endpoint.push_str(&format!("&engagement_potential=eq.{}", filter_value(engagement)));
    }
    endpoint.push_str("&select=*&order=difficulty.asc");
    Ok(endpoint)
}

pub async fn list_trending_topics(
    db: &SupabaseClient,
    analysis_id: Uuid,
    filters: &TopicFilters,
) -> Result<Vec<Value>, StorageError> {
    db.select(&topics_endpoint(db, analysis_id, filters)?).await
}

pub async fn list_content_opportunities(
    db: &SupabaseClient,
    analysis_id: Uuid,
    filters: &OpportunityFilters,
) -> Result<Vec<Value>, StorageError> {
    db.select(&opportunities_endpoint(db, analysis_id, filters)?)
        .await
}

/// Sets `selected` on one row of `table`. Returns the updated row, or `None`
/// when the row does not exist for this user.
async fn set_selected(
    db: &SupabaseClient,
    table: &str,
    id: Uuid,
    selected: bool,
) -> Result<Option<Value>, StorageError> {
    let rows = db
        .update(
            &format!("{table}?id=eq.{id}&{}", db.user_filter()?),
            &json!({ "selected": selected, "updated_at": now_rfc3339() }),
        )
        .await?;
    info!("Set {table} {id} selected={selected}");
    Ok(rows.into_iter().next())
}

pub async fn set_topic_selection(
    db: &SupabaseClient,
    topic_id: Uuid,
    selected: bool,
) -> Result<Option<Value>, StorageError> {
    set_selected(db, "trending_topics", topic_id, selected).await
}

pub async fn set_opportunity_selection(
    db: &SupabaseClient,
    opportunity_id: Uuid,
    selected: bool,
) -> Result<Option<Value>, StorageError> {
    set_selected(db, "content_opportunities", opportunity_id, selected).await
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn input() -> TrendAnalysisInput {
        TrendAnalysisInput {
            topic: "home security".into(),
            trending_topics: vec![json!({"trend": "Smart locks", "viral_potential": 80}), json!({})],
            content_opportunities: vec![json!({"opportunity": "Lock buyer guide"})],
            seo_intelligence: Some(json!({"high_volume_keywords": ["smart lock"]})),
            pytrends_analysis: Some(json!({
                "pytrends_enhanced": true,
                "geographic_insights": {"global_hotspots": [{"region": "US"}, {"region": "UK"}]},
                "actionable_insights": [{"type": "timing"}]
            })),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_writes_metadata_and_survives_child_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/trend_analyses"))
            .and(body_partial_json(json!({
                "status": "completed",
                "metadata": {
                    "pytrends_enhanced": true,
                    "geographic_hotspots_count": 2,
                    "actionable_insights_count": 1,
                    "trending_topics_count": 2
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": ANALYSIS}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/trending_topics"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/content_opportunities"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/keyword_intelligence"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let id = save_trend_analysis_results(&scoped_client(&server), &input())
            .await
            .unwrap();
        assert_eq!(id.to_string(), ANALYSIS);

        let requests = server.received_requests().await.unwrap();
        let topics: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(topics[0]["title"], "Smart locks");
        assert_eq!(topics[1]["title"], "Trending Topic 2");
    }

    #[tokio::test]
    async fn test_get_trend_analysis_extracts_pytrends() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trend_analyses"))
            .and(query_param("id", format!("eq.{ANALYSIS}")))
            .and(query_param("user_id", format!("eq.{USER}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": ANALYSIS,
                "topic": "home security",
                "metadata": {"pytrends_analysis": {"pytrends_enhanced": true, "actionable_insights": []}}
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trending_topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"title": "Smart locks"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/content_opportunities"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/keyword_intelligence"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let bundle = get_trend_analysis(&scoped_client(&server), Uuid::parse_str(ANALYSIS).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle.topic(), "home security");
        assert_eq!(bundle.trending_topics.len(), 1);
        assert!(bundle.content_opportunities.is_empty());
        assert!(bundle.pytrends_enhanced);
        assert!(bundle.pytrends_available);
        assert_eq!(bundle.keyword_intelligence, json!({}));
    }

    #[tokio::test]
    async fn test_get_missing_analysis_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trend_analyses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let bundle = get_trend_analysis(&scoped_client(&server), Uuid::new_v4())
            .await
            .unwrap();
        assert!(bundle.is_none());
    }

    #[tokio::test]
    async fn test_attach_pytrends_merges_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/trend_analyses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "metadata": "{\"confidence_score\": 90}"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trend_analyses"))
            .and(body_partial_json(json!({
                "metadata": {"confidence_score": 90, "pytrends_enhanced": false}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .expect(1)
            .mount(&server)
            .await;

        let attached = attach_pytrends(
            &scoped_client(&server),
            Uuid::parse_str(ANALYSIS).unwrap(),
            &json!({"pytrends_enhanced": false, "fallback_mode": true}),
        )
        .await
        .unwrap();
        assert!(attached);
    }

    #[test]
    fn test_topics_endpoint_whitelists_sort_column() {
        let server_uri = "http://localhost:1";
        let db = SupabaseClient::new(server_uri, "k", 5)
            .unwrap()
            .with_user(USER)
            .unwrap();
        let analysis = Uuid::parse_str(ANALYSIS).unwrap();
        let filters = TopicFilters {
            selected_only: true,
            sort_by: Some("user_id;drop".into()),
            sort_order: Some("asc".into()),
        };
        let endpoint = topics_endpoint(&db, analysis, &filters).unwrap();
        assert!(endpoint.contains("&selected=eq.true"));
        assert!(endpoint.ends_with("&select=*&order=viral_potential.asc"));
    }

    #[tokio::test]
    async fn test_list_opportunities_applies_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/content_opportunities"))
            .and(query_param("trend_analysis_id", format!("eq.{ANALYSIS}")))
            .and(query_param("format", "eq.how_to_guide"))
            .and(query_param("engagement_potential", "eq.high"))
            .and(query_param("order", "difficulty.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"title": "Guide"}])))
            .expect(1)
            .mount(&server)
            .await;

        let filters = OpportunityFilters {
            format: Some("how_to_guide".into()),
            engagement: Some("high".into()),
            ..Default::default()
        };
        let rows = list_content_opportunities(
            &scoped_client(&server),
            Uuid::parse_str(ANALYSIS).unwrap(),
            &filters,
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_selection_of_missing_topic_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/trending_topics"))
            .and(query_param("user_id", format!("eq.{USER}")))
            .and(body_partial_json(json!({"selected": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let row = set_topic_selection(&scoped_client(&server), Uuid::new_v4(), false)
            .await
            .unwrap();
        assert!(row.is_none());
    }
}
