//! Modifier combinations for base keywords, with heuristic volume and
//! competition estimates. No search data is consulted.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::keywords::{category_count, ModifierCategory, SearchIntent, MODIFIER_CATEGORIES};

pub const DEFAULT_MAX_COMBINATIONS: usize = 5;

const BASE_VOLUME: f64 = 100.0;

/// Largest matching multiplier wins.
const VOLUME_MULTIPLIERS: &[(&str, f64)] = &[
    ("implementation", 1.8),
    ("methodology", 1.7),
    ("framework", 1.6),
    ("system", 1.5),
    ("solution", 1.4),
    ("enterprise", 1.9),
    ("integration", 1.6),
    ("optimization", 1.7),
    ("platform", 1.5),
    ("deployment", 1.8),
];

const HIGH_COMPETITION: &[&str] = &["best", "top", "review", "comparison", "2025"];
const MEDIUM_COMPETITION: &[&str] = &["guide", "tips", "tool", "software"];
const LOW_COMPETITION: &[&str] = &["free", "template", "checklist", "planner"];

/// First substring hit wins, so order matters.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("calculator", "interactive_tool"),
    ("tool", "interactive_tool"),
    ("software", "enterprise_solution"),
    ("platform", "enterprise_platform"),
    ("system", "integrated_system"),
    ("solution", "enterprise_solution"),
    ("framework", "implementation_framework"),
    ("methodology", "implementation_methodology"),
    ("template", "implementation_template"),
    ("workflow", "process_workflow"),
    ("integration", "system_integration"),
    ("deployment", "enterprise_deployment"),
    ("implementation", "strategic_implementation"),
    ("architecture", "enterprise_architecture"),
    ("consultation", "strategic_consultation"),
    ("coaching", "executive_coaching"),
    ("training", "professional_training"),
    ("course", "professional_course"),
    ("workshop", "strategy_workshop"),
    ("service", "enterprise_service"),
    ("analysis", "strategic_analysis"),
    ("strategy", "business_strategy"),
    ("optimization", "performance_optimization"),
    ("planning", "strategic_planning"),
    ("management", "enterprise_management"),
    ("organization", "organizational_design"),
    ("scheduling", "project_scheduling"),
    ("budget", "resource_planning"),
    ("forecast", "business_forecasting"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCombination {
    pub original_keyword: String,
    pub enhanced_keyword: String,
    pub modifier: &'static str,
    pub modifier_category: &'static str,
    pub search_intent: SearchIntent,
    pub use_case: &'static str,
    pub estimated_search_volume: u32,
    pub competition_level: Competition,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancedKeywords {
    pub original_keywords: Vec<String>,
    pub target_audience: String,
    pub enhanced_combinations: BTreeMap<String, Vec<KeywordCombination>>,
    pub modifier_usage: BTreeMap<&'static str, usize>,
    pub intent_distribution: BTreeMap<&'static str, usize>,
    /// Always the sum of the combination list lengths.
    pub total_opportunities: usize,
}

/// Trimmed, non-empty, first occurrence kept.
pub fn normalize_base_keywords(base: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    base.iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect()
}

/// The eight phrasings of one base keyword and modifier.
pub fn combination_patterns(base: &str, modifier: &str) -> Vec<String> {
    let patterns = [
        format!("{base} {modifier}"),
        format!("{modifier} for {base}"),
        format!("enterprise {base} {modifier}"),
        format!("{base} {modifier} system"),
        format!("{base} {modifier} solution"),
        format!("advanced {base} {modifier}"),
        format!("{base} {modifier} integration"),
        format!("{base} {modifier} optimization"),
    ];
    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect()
}

/// Long-tail phrasings are discounted. The result is at least 70.
pub fn estimate_volume(keyword: &str) -> u32 {
    let lower = keyword.to_lowercase();
    let mut multiplier = VOLUME_MULTIPLIERS
        .iter()
        .filter(|(pattern, _)| lower.contains(pattern))
        .map(|(_, m)| *m)
        .fold(1.0_f64, f64::max);

    let words = keyword.split_whitespace().count();
    if words > 5 {
        multiplier *= 0.7;
    } else if words > 3 {
        multiplier *= 0.85;
    }
    (BASE_VOLUME * multiplier) as u32
}

pub fn estimate_competition(keyword: &str) -> Competition {
    let lower = keyword.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if hit(HIGH_COMPETITION) {
        Competition::High
    } else if hit(MEDIUM_COMPETITION) {
        Competition::Medium
    } else if hit(LOW_COMPETITION) {
        Competition::Low
    } else {
        Competition::Medium
    }
}

pub fn suggest_content_type(keyword: &str, intent: SearchIntent) -> &'static str {
    let lower = keyword.to_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, content_type)| *content_type)
        .unwrap_or_else(|| intent.default_content_type())
}

fn combination(
    base: &str,
    pattern: String,
    modifier: &'static str,
    category: &ModifierCategory,
) -> KeywordCombination {
    KeywordCombination {
        original_keyword: base.to_string(),
        estimated_search_volume: estimate_volume(&pattern),
        competition_level: estimate_competition(&pattern),
        content_type: suggest_content_type(&pattern, category.intent),
        enhanced_keyword: pattern,
        modifier,
        modifier_category: category.key,
        search_intent: category.intent,
        use_case: category.use_case,
    }
}

/// Up to `max_combinations` variants from each category, highest volume
/// first. Ties keep category order.
pub fn modifier_combinations(base: &str, max_combinations: usize) -> Vec<KeywordCombination> {
    let mut combinations = Vec::new();

    for category in MODIFIER_CATEGORIES {
        let mut seen = HashSet::new();
        let per_category = category
            .modifiers
            .iter()
            .flat_map(|modifier| {
                combination_patterns(base, modifier)
                    .into_iter()
                    .map(move |pattern| (*modifier, pattern))
            })
            .filter(|(_, pattern)| seen.insert(pattern.to_lowercase()))
            .take(max_combinations)
            .map(|(modifier, pattern)| combination(base, pattern, modifier, category));
        combinations.extend(per_category);
    }

    // sort_by is stable
    combinations.sort_by(|a, b| b.estimated_search_volume.cmp(&a.estimated_search_volume));
    combinations.truncate(max_combinations * category_count());
    combinations
}

pub fn enhance_keywords_with_modifiers(
    base_keywords: &[String],
    target_audience: &str,
    max_combinations: usize,
) -> EnhancedKeywords {
    let base = normalize_base_keywords(base_keywords);
    info!(
        "Enhancing {} keywords with modifier combinations (max {max_combinations} per category)",
        base.len()
    );

    let mut enhanced = EnhancedKeywords {
        original_keywords: base.clone(),
        target_audience: target_audience.to_string(),
        enhanced_combinations: BTreeMap::new(),
        modifier_usage: BTreeMap::new(),
        intent_distribution: BTreeMap::new(),
        total_opportunities: 0,
    };

    for keyword in base {
        let combinations = modifier_combinations(&keyword, max_combinations);
        for combo in &combinations {
            *enhanced.modifier_usage.entry(combo.modifier_category).or_default() += 1;
            *enhanced
                .intent_distribution
                .entry(combo.search_intent.as_str())
                .or_default() += 1;
        }
        enhanced.total_opportunities += combinations.len();
        enhanced.enhanced_combinations.insert(keyword, combinations);
    }

    enhanced
}

/// Search-friendly variants for import into a keyword tool. Deduplicated
/// and sorted; `tool` only labels the log line.
pub fn generate_tool_specific_keywords(tool: &str, base_keywords: &[String]) -> Vec<String> {
    let mut keywords = HashSet::new();
    for base in normalize_base_keywords(base_keywords) {
        for category in MODIFIER_CATEGORIES {
            for modifier in category.modifiers {
                keywords.insert(format!("{base} {modifier}"));
                keywords.insert(format!("{modifier} {base}"));
                keywords.insert(format!("best {base} {modifier}"));
                keywords.insert(format!("{base} {modifier} 2025"));
            }
        }
    }
    let mut keywords: Vec<String> = keywords.into_iter().collect();
    keywords.sort();
    info!("Generated {} keywords for {tool}", keywords.len());
    keywords
}
