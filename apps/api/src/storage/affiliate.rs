//! Affiliate research persistence across four tables:
//! `affiliate_research_sessions`, `affiliate_programs` (shared, keyed by
//! `program_hash`), `affiliate_session_programs` (join) and
//! `affiliate_profitability_analysis`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::affiliate::models::{AffiliateProgram, AffiliateResearch, StoredResearch};
use crate::storage::{decode_json_column, filter_value, StorageError, SupabaseClient};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoredResearchSummary {
    pub session_id: Uuid,
    pub new_programs: usize,
    pub updated_programs: usize,
    pub linked_programs: usize,
}

enum Upsert {
    Created(String),
    Updated(String),
}

/// md5 hex of `"{network}_{name}_{url}"`.
pub fn program_hash(network: &str, name: &str, url: &str) -> String {
    format!("{:x}", md5::compute(format!("{network}_{name}_{url}")))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Clamps to the earliest representable instant when `days` overflows.
fn cutoff(days: i64) -> String {
    let at = Duration::try_days(days)
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    filter_value(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Persists one research run for the scoped user.
///
/// A failed session insert fails the call. Program upserts, links and the
/// analysis row are best effort: failures are logged and skipped.
pub async fn store_affiliate_research(
    db: &SupabaseClient,
    research: &AffiliateResearch,
) -> Result<StoredResearchSummary, StorageError> {
    let user_id = db.require_user()?;
    let session_id = Uuid::new_v4();
    let now = now_rfc3339();
    let analysis = &research.profitability_analysis;

    let session = json!({
        "id": session_id,
        "user_id": user_id,
        "topic": research.topic,
        "subtopics": serde_json::to_string(&research.subtopics).unwrap_or_else(|_| "[]".into()),
        "total_programs": research.total_programs,
        "profitability_score": analysis.score,
        "profitability_level": analysis.level.as_str(),
        "research_timestamp": research.research_timestamp.to_rfc3339(),
        "source": research.source.as_str(),
        "created_at": now,
        "updated_at": now,
    });
    db.insert("affiliate_research_sessions", &session).await?;

    let mut summary = StoredResearchSummary {
        session_id,
        ..Default::default()
    };

    for program in &research.programs {
        let program_id = match upsert_program(db, program).await {
            Ok(Upsert::Created(id)) => {
                summary.new_programs += 1;
                id
            }
            Ok(Upsert::Updated(id)) => {
                summary.updated_programs += 1;
                id
            }
            Err(e) => {
                warn!("Skipping program '{}': {e}", program.program_name);
                continue;
            }
        };

        let link = json!({
            "id": Uuid::new_v4(),
            "research_session_id": session_id,
            "affiliate_program_id": program_id,
            "subtopic": program.subtopic,
            "relevance_score": program.extraction_confidence,
            "created_at": now,
        });
        match db.insert("affiliate_session_programs", &link).await {
            Ok(_) => summary.linked_programs += 1,
            Err(e) => warn!("Failed to link program '{}': {e}", program.program_name),
        }
    }

    let analysis_row = json!({
        "id": Uuid::new_v4(),
        "research_session_id": session_id,
        "profitability_score": analysis.score,
        "profitability_level": analysis.level.as_str(),
        "reason": analysis.reason,
        "total_programs": analysis.total_programs,
        "avg_commission_rate": analysis.avg_commission_rate,
        "avg_commission_amount": analysis.avg_commission_amount,
        "high_value_programs": analysis.high_value_programs,
        "networks_represented": analysis.networks_represented,
        "subtopics_covered": analysis.subtopics_covered,
        "created_at": now,
    });
    if let Err(e) = db
        .insert("affiliate_profitability_analysis", &analysis_row)
        .await
    {
        warn!("Failed to store profitability analysis for {session_id}: {e}");
    }

    info!(
        "Stored affiliate research {session_id}: {} new, {} updated, {} linked",
        summary.new_programs, summary.updated_programs, summary.linked_programs
    );
    Ok(summary)
}

async fn upsert_program(
    db: &SupabaseClient,
    program: &AffiliateProgram,
) -> Result<Upsert, StorageError> {
    let hash = program_hash(&program.network, &program.program_name, &program.program_url);
    let now = now_rfc3339();
    let mut row = json!({
        "program_hash": hash,
        "network": program.network,
        "program_name": program.program_name,
        "description": program.description,
        "commission_rate": program.commission_rate,
        "commission_amount": program.commission_amount,
        "cookie_duration": program.cookie_duration,
        "program_url": program.program_url,
        "approval_required": program.approval_required,
        "promotional_materials": serde_json::to_string(&program.promotional_materials)
            .unwrap_or_else(|_| "[]".into()),
        "extraction_confidence": program.extraction_confidence,
        "source_url": program.source_url,
        "last_updated": now,
        "updated_at": now,
    });

    let existing = db
        .select(&format!("affiliate_programs?program_hash=eq.{hash}&select=id"))
        .await?;

    if let Some(id) = existing.first().and_then(row_id) {
        db.update(&format!("affiliate_programs?id=eq.{id}"), &row)
            .await?;
        return Ok(Upsert::Updated(id));
    }

    let id = Uuid::new_v4().to_string();
    row["id"] = json!(id);
    row["created_at"] = json!(now);
    db.insert("affiliate_programs", &row).await?;
    Ok(Upsert::Created(id))
}

/// Loads the programs and analysis that belong to an already fetched session row.
async fn load_session_details(
    db: &SupabaseClient,
    session: Value,
) -> Result<StoredResearch, StorageError> {
    let session_id = row_id(&session)
        .ok_or_else(|| StorageError::Decode("session row has no id".into()))?;

    let links = db
        .select(&format!(
            "affiliate_session_programs?research_session_id=eq.{session_id}&select=*,affiliate_programs(*)"
        ))
        .await?;
    let programs = links
        .into_iter()
        .filter_map(|mut link| {
            let mut program = link.get_mut("affiliate_programs")?.take();
            if !program.is_object() {
                return None;
            }
            program["promotional_materials"] =
                decode_json_column(program.get("promotional_materials"), json!([]));
            Some(program)
        })
        .collect();

    let analysis = db
        .select(&format!(
            "affiliate_profitability_analysis?research_session_id=eq.{session_id}&select=*"
        ))
        .await?
        .into_iter()
        .next();

    Ok(StoredResearch {
        session,
        programs,
        analysis,
    })
}

/// Latest research session for `topic` owned by the scoped user.
pub async fn get_affiliate_research_by_topic(
    db: &SupabaseClient,
    topic: &str,
) -> Result<Option<StoredResearch>, StorageError> {
    let sessions = db
        .select(&format!(
            "affiliate_research_sessions?topic=eq.{}&{}&select=*&order=created_at.desc&limit=1",
            filter_value(topic),
            db.user_filter()?
        ))
        .await?;

    match sessions.into_iter().next() {
        Some(session) => Ok(Some(load_session_details(db, session).await?)),
        None => Ok(None),
    }
}

pub async fn get_affiliate_research_by_session(
    db: &SupabaseClient,
    session_id: Uuid,
) -> Result<Option<StoredResearch>, StorageError> {
    let sessions = db
        .select(&format!(
            "affiliate_research_sessions?id=eq.{session_id}&{}&select=*",
            db.user_filter()?
        ))
        .await?;

    match sessions.into_iter().next() {
        Some(session) => Ok(Some(load_session_details(db, session).await?)),
        None => Ok(None),
    }
}

/// Sessions created within the last `days` days, newest first.
pub async fn get_recent_research(
    db: &SupabaseClient,
    days: i64,
) -> Result<Vec<Value>, StorageError> {
    db.select(&format!(
        "affiliate_research_sessions?{}&created_at=gte.{}&select=*&order=created_at.desc",
        db.user_filter()?,
        cutoff(days)
    ))
    .await
}

/// Deletes sessions older than `days_to_keep`, together with their links and
/// analysis rows. Returns how many sessions were removed.
pub async fn delete_old_research(
    db: &SupabaseClient,
    days_to_keep: i64,
) -> Result<usize, StorageError> {
    let user_filter = db.user_filter()?;
    let old = db
        .select(&format!(
            "affiliate_research_sessions?{user_filter}&created_at=lt.{}&select=id",
            cutoff(days_to_keep)
        ))
        .await?;

    let mut deleted = 0;
    for session_id in old.iter().filter_map(row_id) {
        db.delete(&format!(
            "affiliate_session_programs?research_session_id=eq.{session_id}"
        ))
        .await?;
        db.delete(&format!(
            "affiliate_profitability_analysis?research_session_id=eq.{session_id}"
        ))
        .await?;
        db.delete(&format!(
            "affiliate_research_sessions?id=eq.{session_id}&{user_filter}"
        ))
        .await?;
        deleted += 1;
    }

    info!("Deleted {deleted} old research sessions");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affiliate::mock::mock_offers;
    use crate::affiliate::profitability::{analyze_profitability, generate_recommendations};
    use crate::affiliate::models::ResearchSource;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER: &str = "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f";

    fn scoped_client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(&server.uri(), "k", 5)
            .unwrap()
            .with_user(USER)
            .unwrap()
    }

    fn make_research(programs: Vec<AffiliateProgram>) -> AffiliateResearch {
        let subtopics = vec!["yoga".to_string()];
        let analysis = analyze_profitability(&programs, &subtopics);
        let recommendations = generate_recommendations(&analysis, &programs);
        AffiliateResearch {
            topic: "yoga".into(),
            subtopics,
            total_programs: programs.len(),
            programs,
            search_results: vec![],
            profitability_analysis: analysis,
            recommendations,
            research_timestamp: Utc::now(),
            source: ResearchSource::Mock,
        }
    }

    #[test]
    fn test_cutoff_saturates_on_overflowing_days() {
        let floor = filter_value(&DateTime::<Utc>::MIN_UTC.to_rfc3339_opts(SecondsFormat::Secs, true));
        assert_eq!(cutoff(1_000_000_000), floor);
        assert_eq!(cutoff(i64::MAX), floor);
        assert_ne!(cutoff(7), floor);
    }

    #[test]
    fn test_program_hash_is_md5_of_triple() {
        assert_eq!(
            program_hash("cj", "Tools", "https://x"),
            format!("{:x}", md5::compute("cj_Tools_https://x"))
        );
        assert_ne!(
            program_hash("cj", "Tools", "https://x"),
            program_hash("cj", "Tools", "https://y")
        );
    }

    #[tokio::test]
    async fn test_store_requires_user_context() {
        let server = MockServer::start().await;
        let db = SupabaseClient::new(&server.uri(), "k", 5).unwrap();
        let err = store_affiliate_research(&db, &make_research(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingUserContext));
    }

    #[tokio::test]
    async fn test_store_creates_new_and_updates_existing_programs() {
        let server = MockServer::start().await;
        let offers = mock_offers("yoga");
        let existing_hash = program_hash(
            &offers[0].network,
            &offers[0].program_name,
            &offers[0].program_url,
        );

        Mock::given(method("POST"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .and(body_partial_json(json!({"user_id": USER, "topic": "yoga", "subtopics": "[\"yoga\"]"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_programs"))
            .and(query_param("program_hash", format!("eq.{existing_hash}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "prog-1"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_programs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/affiliate_programs"))
            .and(query_param("id", "eq.prog-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "prog-1"}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/affiliate_programs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/affiliate_session_programs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/affiliate_profitability_analysis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
            .expect(1)
            .mount(&server)
            .await;

        let research = make_research(vec![offers[0].clone(), offers[3].clone()]);
        let summary = store_affiliate_research(&scoped_client(&server), &research)
            .await
            .unwrap();
        assert_eq!(summary.new_programs, 1);
        assert_eq!(summary.updated_programs, 1);
        assert_eq!(summary.linked_programs, 2);
    }

    #[tokio::test]
    async fn test_store_fails_when_session_insert_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let err = store_affiliate_research(&scoped_client(&server), &make_research(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Http { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_get_by_topic_decodes_promotional_materials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .and(query_param("topic", "eq.home gym"))
            .and(query_param("user_id", format!("eq.{USER}")))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "sess-1", "topic": "home gym", "subtopics": "[\"racks\"]", "profitability_score": 55}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_session_programs"))
            .and(query_param("research_session_id", "eq.sess-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"affiliate_programs": {"id": "p1", "promotional_materials": "[\"banners\"]"}},
                {"affiliate_programs": {"id": "p2", "promotional_materials": "oops"}},
                {"affiliate_programs": null}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_profitability_analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let stored = get_affiliate_research_by_topic(&scoped_client(&server), "home gym")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.programs.len(), 2);
        assert_eq!(stored.programs[0]["promotional_materials"], json!(["banners"]));
        assert_eq!(stored.programs[1]["promotional_materials"], json!([]));
        assert!(stored.analysis.is_none());
        assert_eq!(stored.subtopics(), vec!["racks"]);
    }

    #[tokio::test]
    async fn test_get_by_session_missing_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let found = get_affiliate_research_by_session(&scoped_client(&server), Uuid::new_v4())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_old_research_removes_children_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "s1"}, {"id": "s2"}])),
            )
            .mount(&server)
            .await;
        for table in [
            "affiliate_session_programs",
            "affiliate_profitability_analysis",
            "affiliate_research_sessions",
        ] {
            Mock::given(method("DELETE"))
                .and(path(format!("/rest/v1/{table}")))
                .respond_with(ResponseTemplate::new(204))
                .expect(2)
                .mount(&server)
                .await;
        }

        let deleted = delete_old_research(&scoped_client(&server), 30).await.unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_recent_research_filters_by_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/affiliate_research_sessions"))
            .and(query_param("user_id", format!("eq.{USER}")))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "s1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = get_recent_research(&scoped_client(&server), 7).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
