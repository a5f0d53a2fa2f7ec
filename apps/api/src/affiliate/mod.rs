// Affiliate research: offer discovery (Linkup search or mock networks),
// extraction of commission terms from search content, de-duplication,
// and topic profitability scoring.

pub mod extract;
pub mod handlers;
pub mod linkup;
pub mod mock;
pub mod models;
pub mod profitability;
pub mod research;

use async_trait::async_trait;
use thiserror::Error;

use crate::affiliate::models::{AffiliateProgram, ResearchSource};

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Linkup API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Linkup response: {0}")]
    Decode(String),
}

/// Where affiliate offers come from. `AppState` holds one of these.
#[async_trait]
pub trait AffiliateSource: Send + Sync {
    /// Splits a broad topic into searchable subtopics.
    async fn suggest_subtopics(&self, topic: &str) -> Vec<String>;

    /// Finds affiliate programs for one subtopic. The returned source tag says
    /// whether the programs are real search results or mock offers.
    async fn search_subtopic(
        &self,
        subtopic: &str,
    ) -> Result<(Vec<AffiliateProgram>, ResearchSource), ResearchError>;

    /// The source this implementation nominally serves from.
    fn source(&self) -> ResearchSource;
}
