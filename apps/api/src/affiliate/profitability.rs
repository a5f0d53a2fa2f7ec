//! Topic profitability: a capped weighted sum over program count, commission
//! terms, high-value programs and network diversity.

use std::collections::HashSet;

use crate::affiliate::models::{AffiliateProgram, ProfitabilityAnalysis, ProfitabilityLevel};

/// A program paying at least this percentage counts as high value.
const HIGH_VALUE_RATE: f64 = 20.0;

/// (multiplier, cap) per term.
const PROGRAM_COUNT_TERM: (f64, f64) = (3.0, 25.0);
const AVG_RATE_TERM: (f64, f64) = (1.5, 25.0);
const AVG_AMOUNT_TERM: (f64, f64) = (0.1, 20.0);
const HIGH_VALUE_TERM: (f64, f64) = (3.0, 15.0);
const NETWORK_TERM: (f64, f64) = (5.0, 15.0);

fn term(value: f64, (multiplier, cap): (f64, f64)) -> f64 {
    (value * multiplier).min(cap)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores a set of (already de-duplicated) programs.
/// Empty input returns the `poor` sentinel with score 0.
pub fn analyze_profitability(
    programs: &[AffiliateProgram],
    subtopics: &[String],
) -> ProfitabilityAnalysis {
    if programs.is_empty() {
        return ProfitabilityAnalysis {
            score: 0,
            level: ProfitabilityLevel::Poor,
            reason: "No affiliate programs found".to_string(),
            total_programs: 0,
            avg_commission_rate: 0.0,
            avg_commission_amount: 0.0,
            high_value_programs: 0,
            networks_represented: 0,
            subtopics_covered: subtopics.len(),
        };
    }

    let n = programs.len() as f64;
    let avg_rate = programs.iter().map(|p| p.commission_rate).sum::<f64>() / n;
    let avg_amount = programs.iter().map(|p| p.commission_amount).sum::<f64>() / n;
    let high_value = programs
        .iter()
        .filter(|p| p.commission_rate >= HIGH_VALUE_RATE)
        .count();
    let networks: HashSet<&str> = programs.iter().map(|p| p.network.as_str()).collect();

    let raw = term(n, PROGRAM_COUNT_TERM)
        + term(avg_rate, AVG_RATE_TERM)
        + term(avg_amount, AVG_AMOUNT_TERM)
        + term(high_value as f64, HIGH_VALUE_TERM)
        + term(networks.len() as f64, NETWORK_TERM);

    // Caps sum to 100; clamp guards against negative commission input.
    let score = raw.clamp(0.0, 100.0) as u32;
    let level = ProfitabilityLevel::from_score(score);

    ProfitabilityAnalysis {
        score,
        level,
        reason: level.reason().to_string(),
        total_programs: programs.len(),
        avg_commission_rate: round2(avg_rate),
        avg_commission_amount: round2(avg_amount),
        high_value_programs: high_value,
        networks_represented: networks.len(),
        subtopics_covered: subtopics.len(),
    }
}

/// Advice keyed on the profitability level plus the networks present.
pub fn generate_recommendations(
    analysis: &ProfitabilityAnalysis,
    programs: &[AffiliateProgram],
) -> Vec<String> {
    let mut recommendations: Vec<String> = match analysis.level {
        ProfitabilityLevel::Excellent => vec![
            "Proceed with topic - excellent affiliate opportunities available",
            "Focus on high-commission offers with strong promotional materials",
            "Consider creating comparison content for competing products",
        ],
        ProfitabilityLevel::Good => vec![
            "Topic has potential - proceed with strategic approach",
            "Research specific high-commission subtopics more deeply",
            "Consider narrowing focus to most profitable subtopics",
        ],
        ProfitabilityLevel::Moderate => vec![
            "Limited profitability - consider topic refinement",
            "Focus on subtopics with highest commission potential",
            "Consider combining with other monetization methods",
        ],
        ProfitabilityLevel::Poor => vec![
            "Poor profitability - consider alternative topics",
            "Explore related but more profitable niches",
            "Look for higher-value products/services in this space",
        ],
    }
    .into_iter()
    .map(str::to_string)
    .collect();

    let networks: HashSet<&str> = programs.iter().map(|p| p.network.as_str()).collect();
    if networks.contains("clickbank") {
        recommendations
            .push("ClickBank offers high commissions - focus on digital products".to_string());
    }
    if networks.contains("amazon") {
        recommendations
            .push("Amazon offers broad product range - good for review content".to_string());
    }
    if networks.len() > 2 {
        recommendations.push("Multiple networks available - diversify income sources".to_string());
    }

    recommendations
}
