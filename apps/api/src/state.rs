use std::sync::Arc;

use crate::affiliate::AffiliateSource;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::storage::SupabaseClient;
use crate::trends::TrendsSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Unscoped client. Handlers call `with_user` to get a per-request copy.
    pub db: SupabaseClient,
    /// Linkup when `LINKUP_API_KEY` is set, otherwise the mock networks.
    pub affiliate: Arc<dyn AffiliateSource>,
    /// `None` without `OPENAI_API_KEY`; idea generation then uses fallback ideas.
    pub llm: Option<LlmClient>,
    /// No Google Trends client ships by default, so trends run in fallback mode.
    pub trends: Option<Arc<dyn TrendsSource>>,
}

impl AppState {
    /// Storage client scoped to `user_id`. Rejects empty and non-UUID ids.
    pub fn db_for(&self, user_id: &str) -> Result<SupabaseClient, AppError> {
        Ok(self.db.with_user(user_id)?)
    }
}
