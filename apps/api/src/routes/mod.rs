pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::affiliate::handlers as affiliate;
use crate::ideas::handlers as ideas;
use crate::keywords::handlers as keywords;
use crate::state::AppState;
use crate::trends::handlers as trends;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Affiliate research
        .route("/api/v2/affiliate-research", post(affiliate::handle_research))
        .route(
            "/api/v2/affiliate-research/subtopics",
            post(affiliate::handle_subtopics),
        )
        .route(
            "/api/v2/affiliate-research/validate",
            post(affiliate::handle_validate),
        )
        .route(
            "/api/v2/affiliate-research/history",
            get(affiliate::handle_history).delete(affiliate::handle_cleanup),
        )
        .route(
            "/api/v2/affiliate-research/get-by-analysis",
            get(affiliate::handle_get_by_analysis),
        )
        // Trends
        .route("/api/v2/trends/analyze", post(trends::handle_analyze_trends))
        .route(
            "/api/v2/trend-analyses",
            get(trends::handle_list_trend_analyses).post(trends::handle_save_trend_analysis),
        )
        .route(
            "/api/v2/trend-analysis/:analysis_id",
            get(trends::handle_get_trend_analysis),
        )
        .route(
            "/api/v2/enhanced-trend-research",
            post(trends::handle_enhanced_trend_research),
        )
        .route(
            "/api/v2/trend-analysis/:analysis_id/topics",
            get(trends::handle_list_topics),
        )
        .route(
            "/api/v2/trend-analysis/:analysis_id/opportunities",
            get(trends::handle_list_opportunities),
        )
        .route(
            "/api/v2/topics/:topic_id/select",
            patch(trends::handle_select_topic),
        )
        .route(
            "/api/v2/opportunities/:opportunity_id/select",
            patch(trends::handle_select_opportunity),
        )
        // Blog ideas
        .route(
            "/api/v2/generate-blog-ideas/:analysis_id",
            post(ideas::handle_generate_blog_ideas),
        )
        .route(
            "/api/v2/blog-ideas/bulk-update",
            patch(ideas::handle_bulk_update),
        )
        .route(
            "/api/v2/blog-ideas/fix-all-scores",
            post(ideas::handle_fix_all_scores),
        )
        .route(
            "/api/v2/blog-ideas/:analysis_id",
            get(ideas::handle_get_blog_ideas),
        )
        .route(
            "/api/v2/blog-ideas/:analysis_id/diagnose",
            get(ideas::handle_diagnose_scores),
        )
        .route(
            "/api/v2/blog-ideas/:analysis_id/fix-scores",
            post(ideas::handle_fix_scores),
        )
        .route(
            "/api/v2/blog-idea/:idea_id",
            get(ideas::handle_get_blog_idea).delete(ideas::handle_delete_blog_idea),
        )
        .route(
            "/api/v2/blog-idea/:idea_id/select",
            patch(ideas::handle_select_blog_idea),
        )
        .route(
            "/api/v2/content-calendar/:analysis_id",
            get(ideas::handle_get_content_calendar),
        )
        .route(
            "/api/v2/strategic-insights/:analysis_id",
            get(ideas::handle_get_strategic_insights),
        )
        .route(
            "/api/v2/monetization/enhance",
            post(ideas::handle_enhance_monetization),
        )
        // Keyword research
        .route(
            "/api/v2/keyword-research/categories",
            get(keywords::handle_list_categories),
        )
        .route(
            "/api/v2/keyword-research/enhance",
            post(keywords::handle_enhance_keywords),
        )
        .route(
            "/api/v2/keyword-research/integrate",
            post(keywords::handle_integrate_keywords),
        )
        .with_state(state)
}
