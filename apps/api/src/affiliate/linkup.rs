//! Live affiliate search through the Linkup `/search` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::affiliate::extract::{extract_program, SearchResult};
use crate::affiliate::models::{AffiliateProgram, ResearchSource};
use crate::affiliate::{AffiliateSource, ResearchError};

const MAX_RESULTS: u32 = 5;
const MAX_SUBTOPICS: usize = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    q: &'a str,
    depth: &'a str,
    output_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_raw_content: Option<bool>,
    max_results: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct LinkupSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LinkupSource {
    pub fn new(api_key: String, base_url: &str, timeout_secs: u64) -> Result<Self, ResearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchResponse, ResearchError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ResearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ResearchError::Decode(e.to_string()))
    }
}

fn fallback_subtopics(topic: &str) -> Vec<String> {
    vec![
        format!("{topic} tools"),
        format!("{topic} courses"),
        format!("{topic} software"),
    ]
}

/// Subtopic patterns used once the search confirms the topic has results.
fn pattern_subtopics(topic: &str) -> Vec<String> {
    [
        format!("{topic} software"),
        format!("{topic} tools"),
        format!("{topic} courses"),
        format!("{topic} training"),
        format!("{topic} books"),
        format!("best {topic}"),
        format!("{topic} for beginners"),
        format!("{topic} reviews"),
    ]
    .into_iter()
    .take(MAX_SUBTOPICS)
    .collect()
}

#[async_trait]
impl AffiliateSource for LinkupSource {
    async fn suggest_subtopics(&self, topic: &str) -> Vec<String> {
        let query = format!("{topic} subtopics niches popular categories");
        let request = SearchRequest {
            q: &query,
            depth: "standard",
            output_type: "searchResults",
            include_raw_content: None,
            max_results: MAX_RESULTS,
        };

        match self.search(&request).await {
            Ok(response) if !response.results.is_empty() => pattern_subtopics(topic),
            Ok(_) => fallback_subtopics(topic),
            Err(e) => {
                warn!("Linkup subtopic discovery failed for '{topic}': {e}");
                fallback_subtopics(topic)
            }
        }
    }

    async fn search_subtopic(
        &self,
        subtopic: &str,
    ) -> Result<(Vec<AffiliateProgram>, ResearchSource), ResearchError> {
        let query = format!("{subtopic} affiliate program");
        let request = SearchRequest {
            q: &query,
            depth: "standard",
            output_type: "searchResults",
            include_raw_content: Some(true),
            max_results: MAX_RESULTS,
        };

        let response = self.search(&request).await?;
        debug!(
            "Linkup returned {} results for '{subtopic}'",
            response.results.len()
        );

        let programs = response
            .results
            .iter()
            .map(|r| extract_program(r, subtopic))
            .collect();
        Ok((programs, ResearchSource::LinkupApi))
    }

    fn source(&self) -> ResearchSource {
        ResearchSource::LinkupApi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> LinkupSource {
        LinkupSource::new("lk-test".to_string(), &server.uri(), 5).unwrap()
    }

    #[tokio::test]
    async fn test_search_subtopic_sends_query_and_extracts_programs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("Authorization", "Bearer lk-test"))
            .and(body_partial_json(json!({
                "q": "yoga mats affiliate program",
                "depth": "standard",
                "outputType": "searchResults",
                "includeRawContent": true,
                "maxResults": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "name": "Mat Co Affiliates",
                        "url": "https://www.shareasale.com/matco",
                        "content": "Earn 15% commission with a 30 day cookie"
                    },
                    {
                        "name": "Other",
                        "url": "https://example.com",
                        "content": "nothing"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (programs, source) = source_for(&server)
            .search_subtopic("yoga mats")
            .await
            .unwrap();
        assert_eq!(source, ResearchSource::LinkupApi);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].program_name, "Mat Co Affiliates");
        assert_eq!(programs[0].network, "shareasale");
        assert_eq!(programs[0].commission_rate, 15.0);
        assert_eq!(programs[1].network, "other");
    }

    #[tokio::test]
    async fn test_search_subtopic_non_2xx_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .search_subtopic("yoga")
            .await
            .unwrap_err();
        match err {
            ResearchError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subtopics_from_successful_search_use_patterns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"q": "chess subtopics niches popular categories"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"name": "x", "url": "https://x.io"}]})),
            )
            .mount(&server)
            .await;

        let subs = source_for(&server).suggest_subtopics("chess").await;
        assert_eq!(subs.len(), 6);
        assert_eq!(subs[0], "chess software");
        assert_eq!(subs[5], "best chess");
    }

    #[tokio::test]
    async fn test_subtopics_fall_back_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let subs = source_for(&server).suggest_subtopics("chess").await;
        assert_eq!(subs, vec!["chess tools", "chess courses", "chess software"]);
    }
}
