//! Axum route handlers for the keyword modifier enhancer.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::keywords::enhancer::{
    enhance_keywords_with_modifiers, normalize_base_keywords, EnhancedKeywords,
    DEFAULT_MAX_COMBINATIONS,
};
use crate::keywords::export::{integrate_with_existing_system, IntegrationBundle};
use crate::keywords::{ModifierCategory, MODIFIER_CATEGORIES};

const MAX_COMBINATIONS_LIMIT: usize = 20;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: &'static [ModifierCategory],
    pub total_categories: usize,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub base_keywords: Vec<String>,
    pub target_audience: Option<String>,
    pub max_combinations: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: EnhancedKeywords,
}

#[derive(Debug, Deserialize)]
pub struct IntegrateRequest {
    #[serde(default)]
    pub base_keywords: Vec<String>,
    #[serde(default)]
    pub existing_keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IntegrateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: IntegrationBundle,
}

fn require_base_keywords(base: &[String]) -> Result<(), AppError> {
    if normalize_base_keywords(base).is_empty() {
        return Err(AppError::Validation(
            "base_keywords must contain at least one keyword".to_string(),
        ));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v2/keyword-research/categories
pub async fn handle_list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        success: true,
        categories: MODIFIER_CATEGORIES,
        total_categories: MODIFIER_CATEGORIES.len(),
    })
}

/// POST /api/v2/keyword-research/enhance
///
/// Crosses the base keywords with every modifier category.
/// `max_combinations` is per category and must be between 1 and 20.
pub async fn handle_enhance_keywords(
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    require_base_keywords(&request.base_keywords)?;
    let max = request.max_combinations.unwrap_or(DEFAULT_MAX_COMBINATIONS);
    if !(1..=MAX_COMBINATIONS_LIMIT).contains(&max) {
        return Err(AppError::Validation(format!(
            "max_combinations must be between 1 and {MAX_COMBINATIONS_LIMIT}"
        )));
    }

    let audience = request.target_audience.as_deref().unwrap_or("professional");
    let result = enhance_keywords_with_modifiers(&request.base_keywords, audience, max);
    Ok(Json(EnhanceResponse {
        success: true,
        result,
    }))
}

/// POST /api/v2/keyword-research/integrate
pub async fn handle_integrate_keywords(
    Json(request): Json<IntegrateRequest>,
) -> Result<Json<IntegrateResponse>, AppError> {
    require_base_keywords(&request.base_keywords)?;
    let result = integrate_with_existing_system(&request.base_keywords, &request.existing_keywords);
    Ok(Json(IntegrateResponse {
        success: true,
        result,
    }))
}
