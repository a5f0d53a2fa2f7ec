use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::affiliate::mock::mock_offers;
use crate::affiliate::models::{AffiliateProgram, AffiliateResearch, ResearchSource, SubtopicResult};
use crate::affiliate::profitability::{analyze_profitability, generate_recommendations};
use crate::affiliate::AffiliateSource;
use crate::storage::affiliate::program_hash;

/// Subtopics beyond this are listed but not searched.
pub const MAX_SEARCHED_SUBTOPICS: usize = 5;

/// Runs affiliate research for `topic`.
///
/// Empty `subtopics` asks the source for suggestions. Each searched subtopic that
/// fails falls back to mock offers; the research as a whole never fails.
pub async fn research_affiliate_programs(
    source: &dyn AffiliateSource,
    topic: &str,
    subtopics: &[String],
) -> AffiliateResearch {
    let subtopics = if subtopics.is_empty() {
        source.suggest_subtopics(topic).await
    } else {
        subtopics.to_vec()
    };

    let mut all_programs = Vec::new();
    let mut search_results = Vec::new();

    for subtopic in subtopics.iter().take(MAX_SEARCHED_SUBTOPICS) {
        let (programs, used) = match source.search_subtopic(subtopic).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Search failed for '{subtopic}', using mock offers: {e}");
                (mock_offers(subtopic), ResearchSource::Mock)
            }
        };

        if programs.is_empty() {
            continue;
        }
        all_programs.extend(programs.iter().cloned());
        search_results.push(SubtopicResult {
            subtopic: subtopic.clone(),
            programs_found: programs.len(),
            source: used,
            programs,
        });
    }

    let programs = deduplicate_programs(all_programs);
    let profitability_analysis = analyze_profitability(&programs, &subtopics);
    let recommendations = generate_recommendations(&profitability_analysis, &programs);

    let source_used = if search_results
        .iter()
        .any(|r| r.source == ResearchSource::LinkupApi)
    {
        ResearchSource::LinkupApi
    } else {
        ResearchSource::Mock
    };

    info!(
        "Affiliate research for '{topic}': {} programs, score {} ({})",
        programs.len(),
        profitability_analysis.score,
        profitability_analysis.level.as_str()
    );

    AffiliateResearch {
        topic: topic.to_string(),
        subtopics,
        total_programs: programs.len(),
        programs,
        search_results,
        profitability_analysis,
        recommendations,
        research_timestamp: Utc::now(),
        source: source_used,
    }
}

/// Keeps the first program per (network, name, url) and stamps its `unique_id`.
pub fn deduplicate_programs(programs: Vec<AffiliateProgram>) -> Vec<AffiliateProgram> {
    let mut seen = HashSet::new();
    programs
        .into_iter()
        .filter_map(|mut program| {
            let hash = program_hash(&program.network, &program.program_name, &program.program_url);
            if !seen.insert(hash.clone()) {
                return None;
            }
            program.unique_id = Some(hash);
            Some(program)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affiliate::ResearchError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns one fixed program per subtopic; fails for subtopics containing "broken".
    struct StubSource {
        searched: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                searched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AffiliateSource for StubSource {
        async fn suggest_subtopics(&self, topic: &str) -> Vec<String> {
            vec![format!("{topic} a"), format!("{topic} b")]
        }

        async fn search_subtopic(
            &self,
            subtopic: &str,
        ) -> Result<(Vec<AffiliateProgram>, ResearchSource), ResearchError> {
            self.searched.lock().unwrap().push(subtopic.to_string());
            if subtopic.contains("broken") {
                return Err(ResearchError::Decode("bad payload".into()));
            }
            let mut program = mock_offers("shared")[3].clone();
            program.subtopic = subtopic.to_string();
            Ok((vec![program], ResearchSource::LinkupApi))
        }

        fn source(&self) -> ResearchSource {
            ResearchSource::LinkupApi
        }
    }

    fn subtopics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_triples_collapse() {
        let offers = mock_offers("yoga");
        let mut doubled = offers.clone();
        doubled.extend(offers.clone());
        let unique = deduplicate_programs(doubled);
        assert_eq!(unique.len(), offers.len());
        assert!(unique.iter().all(|p| p.unique_id.is_some()));
    }

    #[test]
    fn test_distinct_urls_do_not_collapse() {
        let offers = mock_offers("yoga");
        let mut other = offers[0].clone();
        other.program_url = "https://amazon.com/other".to_string();
        let unique = deduplicate_programs(vec![offers[0].clone(), other]);
        assert_eq!(unique.len(), 2);
    }

    #[tokio::test]
    async fn test_same_program_across_subtopics_is_deduplicated() {
        let stub = StubSource::new();
        let research =
            research_affiliate_programs(&stub, "yoga", &subtopics(&["one", "two"])).await;
        assert_eq!(research.search_results.len(), 2);
        assert_eq!(research.total_programs, 1);
        assert_eq!(research.source, ResearchSource::LinkupApi);
    }

    #[tokio::test]
    async fn test_failed_subtopic_falls_back_to_mock() {
        let stub = StubSource::new();
        let research =
            research_affiliate_programs(&stub, "yoga", &subtopics(&["broken one"])).await;
        assert_eq!(research.search_results.len(), 1);
        assert_eq!(research.search_results[0].source, ResearchSource::Mock);
        assert_eq!(research.search_results[0].programs_found, 7);
        assert_eq!(research.source, ResearchSource::Mock);
    }

    #[tokio::test]
    async fn test_only_first_five_subtopics_searched() {
        let stub = StubSource::new();
        let names = subtopics(&["a", "b", "c", "d", "e", "f", "g"]);
        let research = research_affiliate_programs(&stub, "t", &names).await;
        assert_eq!(stub.searched.lock().unwrap().len(), MAX_SEARCHED_SUBTOPICS);
        assert_eq!(research.subtopics.len(), 7);
        assert_eq!(research.profitability_analysis.subtopics_covered, 7);
    }

    #[tokio::test]
    async fn test_empty_subtopics_uses_suggestions() {
        let stub = StubSource::new();
        let research = research_affiliate_programs(&stub, "chess", &[]).await;
        assert_eq!(research.subtopics, vec!["chess a", "chess b"]);
    }
}
