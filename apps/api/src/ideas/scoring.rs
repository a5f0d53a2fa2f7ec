//! Heuristic quality scorers for blog ideas.
//!
//! Every scorer starts from a base value, adds fixed bonuses, and clamps the
//! result to 0..=100. The same scorers serve fresh generation and the backfill
//! of stored ideas, so a stored score always matches what a rescore produces.

use crate::ideas::models::{BlogIdea, IdeaScores};

const POWER_WORDS: &[&str] = &["ultimate", "complete", "secret", "mistake", "hack", "best", "top"];
const HOW_TO_WORDS: &[&str] = &["how to", "guide", "step by step"];
const REVENUE_WORDS: &[&str] = &["lead generation", "conversion", "sales"];
const AUTHORITY_WORDS: &[&str] = &["authority", "thought leadership", "brand"];

fn clamp(score: i64) -> i64 {
    score.clamp(0, 100)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Sources that ride an existing trend get a viral lift.
fn source_bonus(generation_source: &str) -> i64 {
    let lower = generation_source.to_lowercase();
    if lower.starts_with("trending") || lower == "trending_topic" {
        15
    } else if lower.starts_with("geographic") || lower.starts_with("rising") {
        10
    } else {
        0
    }
}

pub fn viral_potential_score(idea: &BlogIdea) -> i64 {
    let title = idea.title.to_lowercase();
    let mut score = 50;
    if contains_any(&title, POWER_WORDS) {
        score += 15;
    }
    if contains_any(&title, HOW_TO_WORDS) {
        score += 10;
    }
    score += match idea.content_format.as_str() {
        "listicle" => 15,
        "case_study" => 12,
        "how_to_guide" => 10,
        "comparison" => 8,
        _ => 5,
    };
    score += source_bonus(&idea.generation_source);
    clamp(score)
}

pub fn seo_optimization_score(idea: &BlogIdea) -> i64 {
    let mut score = 40;
    if idea.primary_keywords.len() >= 2 {
        score += 15;
    }
    if idea.secondary_keywords.len() >= 5 {
        score += 10;
    }
    if (50..=70).contains(&idea.title.chars().count()) {
        score += 10;
    }
    score += match idea.estimated_word_count {
        2000..=4000 => 15,
        wc if wc >= 1500 => 8,
        _ => 0,
    };
    if idea.featured_snippet_opportunity {
        score += 10;
    }
    clamp(score)
}

pub fn audience_alignment_score(idea: &BlogIdea) -> i64 {
    let mut score = 60;
    score += match idea.difficulty_level.as_str() {
        "intermediate" => 15,
        "advanced" => 10,
        "beginner" => 5,
        _ => 0,
    };
    score += match idea.content_format.as_str() {
        "case_study" | "trend_analysis" | "comparison" => 12,
        "how_to_guide" | "tutorial" => 8,
        _ => 0,
    };
    clamp(score)
}

pub fn content_feasibility_score(idea: &BlogIdea) -> i64 {
    let mut score = 65;
    score += match idea.estimated_word_count {
        wc if wc <= 2000 => 15,
        wc if wc <= 3000 => 10,
        wc if wc <= 4000 => 5,
        _ => -5,
    };
    score += match idea.difficulty_level.as_str() {
        "beginner" => 10,
        "intermediate" => 5,
        _ => 0,
    };
    score += match idea.outline.len() {
        n if n >= 5 => 10,
        n if n >= 3 => 5,
        _ => 0,
    };
    clamp(score)
}

pub fn business_impact_score(idea: &BlogIdea) -> i64 {
    let value = idea.business_value.to_lowercase();
    let mut score = 55;
    if contains_any(&value, REVENUE_WORDS) {
        score += 20;
    }
    if contains_any(&value, AUTHORITY_WORDS) {
        score += 12;
    }
    if idea.call_to_action.chars().count() > 20 {
        score += 10;
    }
    score += match idea.content_format.as_str() {
        "case_study" => 18,
        "how_to_guide" | "comparison" => 15,
        "tool_review" | "review" => 12,
        "beginner_guide" | "listicle" => 10,
        _ => 8,
    };
    clamp(score)
}

/// .25 viral + .25 seo + .20 audience + .15 feasibility + .15 business, truncated.
pub fn overall_quality_score(viral: i64, seo: i64, audience: i64, feasibility: i64, business: i64) -> i64 {
    let weighted = viral as f64 * 0.25
        + seo as f64 * 0.25
        + audience as f64 * 0.20
        + feasibility as f64 * 0.15
        + business as f64 * 0.15;
    clamp(weighted as i64)
}

pub fn score_idea(idea: &BlogIdea) -> IdeaScores {
    let viral = viral_potential_score(idea);
    let seo = seo_optimization_score(idea);
    let audience = audience_alignment_score(idea);
    let feasibility = content_feasibility_score(idea);
    let business = business_impact_score(idea);
    IdeaScores {
        viral_potential_score: viral,
        seo_optimization_score: seo,
        audience_alignment_score: audience,
        content_feasibility_score: feasibility,
        business_impact_score: business,
        overall_quality_score: overall_quality_score(viral, seo, audience, feasibility, business),
    }
}
