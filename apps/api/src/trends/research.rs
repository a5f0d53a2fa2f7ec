//! Enhanced trend research: trending topics and content opportunities for a
//! topic, plus rule-based market intelligence and keyword strategy. The model
//! is optional; without it (or when its output does not parse) every section
//! falls back to topic-derived defaults.

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::ideas::generator::parse_ideas_response;
use crate::llm_client::prompts::JSON_ARRAY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::storage::trend_analyses::TrendAnalysisInput;
use crate::trends::analyzer::enrich_trend_analysis;
use crate::trends::TrendsSource;

pub const MAX_TRENDING_TOPICS: usize = 6;
pub const MAX_OPPORTUNITIES: usize = 6;
pub const RESEARCH_CONFIDENCE: f64 = 90.0;

const HIGH_VALUE_TOPICS: [&str; 6] = [
    "security",
    "finance",
    "technology",
    "consulting",
    "legal",
    "healthcare",
];

#[derive(Debug, Clone)]
pub struct TrendResearchParams {
    pub topic: String,
    pub focus_area: String,
    pub target_audience: String,
    pub collection: String,
}

impl TrendResearchParams {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            focus_area: "general".to_string(),
            target_audience: "professional".to_string(),
            collection: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendResearch {
    pub collection: String,
    pub trending_topics: Vec<Value>,
    pub content_opportunities: Vec<Value>,
    pub market_insights: Value,
    pub seo_intelligence: Value,
    pub competitive_gaps: Value,
    pub pytrends_analysis: Value,
    pub pytrends_enhanced: bool,
    pub confidence_score: f64,
    pub data_sources: Vec<String>,
    pub processing_time: f64,
    /// `true` when no model was configured for this run.
    pub fallback_mode: bool,
}

impl TrendResearch {
    /// The storable subset, in the shape `save_trend_analysis_results` takes.
    pub fn to_input(&self, params: &TrendResearchParams) -> TrendAnalysisInput {
        TrendAnalysisInput {
            topic: params.topic.clone(),
            target_audience: params.target_audience.clone(),
            focus_area: params.focus_area.clone(),
            trending_topics: self.trending_topics.clone(),
            content_opportunities: self.content_opportunities.clone(),
            seo_intelligence: Some(self.seo_intelligence.clone()),
            pytrends_analysis: Some(self.pytrends_analysis.clone()),
            confidence_score: Some(self.confidence_score),
            data_sources: self.data_sources.clone(),
            processing_time: self.processing_time,
        }
    }
}

fn mentions_any(topic: &str, words: &[&str]) -> bool {
    let lower = topic.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

// ────────────────────────────────────────────────────────────────────────────
// Prompts
// ────────────────────────────────────────────────────────────────────────────

pub fn trending_topics_prompt(params: &TrendResearchParams) -> String {
    let TrendResearchParams {
        topic,
        focus_area,
        target_audience,
        ..
    } = params;
    format!(
        r#"You are a trend analyst. Analyze trending topics for "{topic}" in the {focus_area} space for {target_audience}.

Return EXACTLY {MAX_TRENDING_TOPICS} trending topics as a JSON array. Each topic must have:
- trend_name: Specific trending topic
- description: Why it's trending (max 100 chars)
- viral_potential: Score 0-100
- keywords: 3-5 related keywords
- content_formats: ["how_to_guide", "listicle", "case_study"] etc.

Example format:
[
  {{
    "trend_name": "AI-Powered {topic}",
    "description": "Growing use of AI in {topic} solutions",
    "viral_potential": 85,
    "keywords": ["AI {topic}", "automated {topic}"],
    "content_formats": ["how_to_guide", "comparison"]
  }}
]

Focus on ACTIONABLE, SPECIFIC trends that are gaining momentum.
Return only valid JSON, no other text."#
    )
}

/// Content formats worth suggesting for the topic's domain.
pub fn topic_formats(topic: &str) -> [&'static str; 6] {
    if mentions_any(topic, &["security", "safety", "protection"]) {
        ["buyer_guide", "comparison", "checklist", "case_study", "how_to_guide", "assessment_tool"]
    } else if mentions_any(topic, &["marketing", "advertising", "sales"]) {
        ["strategy_guide", "template", "case_study", "toolkit", "campaign_analysis", "roi_calculator"]
    } else if mentions_any(topic, &["technology", "software", "ai", "automation"]) {
        [
            "implementation_guide",
            "comparison",
            "tutorial",
            "best_practices",
            "integration_guide",
            "troubleshooting",
        ]
    } else if mentions_any(topic, &["health", "fitness", "wellness"]) {
        ["plan", "guide", "tracker", "assessment", "routine", "nutrition_guide"]
    } else if mentions_any(topic, &["finance", "investment", "money"]) {
        ["calculator", "guide", "strategy", "analysis", "planner", "comparison"]
    } else {
        ["how_to_guide", "buyer_guide", "comparison", "checklist", "case_study", "best_practices"]
    }
}

pub fn opportunities_prompt(params: &TrendResearchParams, trending_topics: &[Value]) -> String {
    let TrendResearchParams {
        topic,
        focus_area,
        target_audience,
        ..
    } = params;
    let trending_context = trending_topics
        .iter()
        .take(3)
        .filter_map(|t| t.get("trend").or_else(|| t.get("trend_name")))
        .filter_map(Value::as_str)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let formats = topic_formats(topic).join(", ");
    format!(
        r#"You are a content strategist specializing in {topic}. Create EXACTLY {MAX_OPPORTUNITIES} content opportunities specifically for "{topic}" that are:

1. DIRECTLY related to {topic} (not generic marketing content)
2. Based on these trending subtopics: {trending_context}
3. Targeted at {target_audience} in the {focus_area} space
4. Actionable and specific to {topic}

STRICT REQUIREMENT: Every opportunity MUST contain the word "{topic}" or closely related terms.

Return as JSON array with this EXACT format:
[
  {{
    "opportunity_title": "Specific {topic} content title",
    "content_format": "how_to_guide",
    "difficulty_score": 45,
    "engagement_potential": "High",
    "keywords": ["keyword1 {topic}", "keyword2 {topic}"],
    "topic_relevance_score": 95,
    "why_relevant": "Explanation of direct connection to {topic}"
  }}
]

Content formats to choose from: {formats}

EXAMPLES for {topic}:
- "Complete {topic} Buyer's Guide for {target_audience}"
- "Top 10 {topic} Mistakes to Avoid"
- "{topic} ROI Calculator and Implementation Framework"
- "How to Choose the Right {topic} Solution for Your Business"

Focus on PRACTICAL, SPECIFIC {topic} content that solves real problems.
Return ONLY valid JSON, no other text."#
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Response parsing
// ────────────────────────────────────────────────────────────────────────────

/// A bare array, or an object wrapping one under `key`.
fn response_items(response: &str, key: &str) -> Option<Vec<Value>> {
    let wrapped = serde_json::from_str::<Value>(response.trim())
        .ok()
        .and_then(|v| v.get(key).and_then(Value::as_array).cloned());
    wrapped.or_else(|| parse_ideas_response(response))
}

fn str_or<'a>(item: &'a Value, key: &str, default: &'a str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn array_or(item: &Value, key: &str, default: Value) -> Value {
    item.get(key)
        .filter(|v| v.as_array().is_some_and(|a| !a.is_empty()))
        .cloned()
        .unwrap_or(default)
}

pub fn parse_trending_topics(response: &str, topic: &str) -> Vec<Value> {
    let topics: Vec<Value> = response_items(response, "trends")
        .unwrap_or_default()
        .iter()
        .filter(|t| t.is_object())
        .take(MAX_TRENDING_TOPICS)
        .enumerate()
        .map(|(i, t)| {
            let fallback_name = format!("Trending {topic} #{}", i + 1);
            let name = str_or(t, "trend_name", &fallback_name).to_string();
            let viral = t
                .get("viral_potential")
                .and_then(Value::as_i64)
                .unwrap_or(70 - 5 * i as i64);
            json!({
                "trend": name,
                "description": str_or(t, "description", &format!("Emerging trend in {topic}")),
                "viral_potential": viral,
                "relevance": "high",
                "search_volume": "medium",
                "competition": "medium",
                "keywords": array_or(t, "keywords", json!([format!("{topic} trend {}", i + 1)])),
                "content_formats": array_or(t, "content_formats", json!(["how_to_guide"])),
                "content_angles": [
                    format!("Complete guide to {name}"),
                    format!("Best practices for {name}"),
                ],
            })
        })
        .collect();

    if topics.is_empty() {
        warn!("No trending topics parsed for '{topic}', using fallback topics");
        return fallback_trending_topics(topic);
    }
    topics
}

fn keywords_text(item: &Value) -> String {
    item.get("keywords")
        .map(Value::to_string)
        .unwrap_or_default()
        .to_lowercase()
}

fn is_about_topic(opportunity: &Value, topic_lower: &str) -> bool {
    let title = str_or(opportunity, "opportunity_title", "").to_lowercase();
    title.contains(topic_lower)
        || topic_lower.split_whitespace().any(|w| title.contains(w))
        || keywords_text(opportunity).contains(topic_lower)
}

/// At least half the opportunities share a whole word with the topic.
fn mostly_relevant(opportunities: &[Value], topic_lower: &str) -> bool {
    if opportunities.is_empty() {
        return false;
    }
    let topic_words: HashSet<&str> = topic_lower.split_whitespace().collect();
    let relevant = opportunities
        .iter()
        .filter(|opp| {
            let title = str_or(opp, "opportunity_title", "").to_lowercase();
            let keywords = keywords_text(opp);
            title
                .split_whitespace()
                .chain(keywords.split_whitespace())
                .any(|w| topic_words.contains(w))
        })
        .count();
    relevant * 2 >= opportunities.len()
}

fn format_adjustment(format: &str) -> i64 {
    match format {
        "interactive_tool" | "calculator" => 20,
        "assessment_tool" | "implementation_guide" => 15,
        "case_study" => 10,
        "comparison" => 5,
        "listicle" => -5,
        "checklist" => -10,
        _ => 0,
    }
}

pub fn opportunity_difficulty(base: i64, format: &str) -> i64 {
    (base + format_adjustment(format)).clamp(20, 90)
}

pub fn time_investment(difficulty: i64) -> &'static str {
    match difficulty {
        d if d >= 70 => "4-6 weeks",
        d if d >= 55 => "3-4 weeks",
        d if d >= 40 => "2-3 weeks",
        _ => "1-2 weeks",
    }
}

fn monetization(topic: &str) -> String {
    if mentions_any(topic, &["security", "finance", "technology", "health"]) {
        format!("High monetization potential through {topic} services, affiliate partnerships, and premium content")
    } else if mentions_any(topic, &["marketing", "business", "consulting"]) {
        format!("Excellent lead generation for {topic} consulting and service offerings")
    } else {
        format!("Medium to high potential for {topic}-related products and services")
    }
}

fn distribution(topic: &str) -> [&'static str; 4] {
    if mentions_any(topic, &["security", "technology"]) {
        ["LinkedIn", "Technical Blogs", "Industry Forums", "YouTube"]
    } else if mentions_any(topic, &["marketing", "business"]) {
        ["LinkedIn", "Marketing Blogs", "Social Media", "Email Newsletter"]
    } else if mentions_any(topic, &["health", "fitness"]) {
        ["Health Blogs", "Social Media", "YouTube", "Podcast"]
    } else {
        ["Blog", "LinkedIn", "Social Media", "Email Newsletter"]
    }
}

fn lead_potential(topic: &str) -> &'static str {
    if mentions_any(topic, &HIGH_VALUE_TOPICS) {
        "Very High"
    } else {
        "High"
    }
}

fn enhance_opportunity(n: usize, opp: &Value, topic: &str) -> Value {
    let format = str_or(opp, "content_format", "how_to_guide");
    let base = opp.get("difficulty_score").and_then(Value::as_i64).unwrap_or(50);
    let difficulty = opportunity_difficulty(base, format);
    json!({
        "opportunity": str_or(opp, "opportunity_title", &format!("{topic} Content Opportunity #{}", n + 1)),
        "format": format,
        "difficulty": difficulty,
        "engagement_potential": str_or(opp, "engagement_potential", "medium"),
        "time_investment": time_investment(difficulty),
        "keywords": array_or(opp, "keywords", json!([format!("{topic} guide")])),
        "monetization": monetization(topic),
        "distribution": distribution(topic),
        "topic_relevance_score": opp.get("topic_relevance_score").cloned().unwrap_or(json!(95)),
        "why_relevant": str_or(opp, "why_relevant", &format!("Directly addresses {topic} needs")),
        "competitive_advantage": format!("Specialized {topic} expertise positioning"),
        "lead_generation_potential": lead_potential(topic),
    })
}

/// Drops opportunities unrelated to the topic. When what is left is not
/// mostly on topic, the fallback opportunities are returned instead.
pub fn parse_content_opportunities(response: &str, topic: &str) -> Vec<Value> {
    let topic_lower = topic.to_lowercase();
    let items = response_items(response, "opportunities").unwrap_or_default();
    let relevant: Vec<Value> = items
        .into_iter()
        .filter(|opp| opp.is_object())
        .filter(|opp| {
            let keep = is_about_topic(opp, &topic_lower);
            if !keep {
                warn!(
                    "Dropping off-topic opportunity '{}'",
                    str_or(opp, "opportunity_title", "unknown")
                );
            }
            keep
        })
        .take(MAX_OPPORTUNITIES)
        .collect();

    if !mostly_relevant(&relevant, &topic_lower) {
        warn!("Opportunities for '{topic}' are not on topic, using fallback opportunities");
        return fallback_content_opportunities(topic);
    }
    relevant
        .iter()
        .enumerate()
        .map(|(n, opp)| enhance_opportunity(n, opp, topic))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Fallbacks and rule-based sections
// ────────────────────────────────────────────────────────────────────────────

pub fn fallback_trending_topics(topic: &str) -> Vec<Value> {
    vec![
        json!({
            "trend": format!("AI-powered {topic}"),
            "description": format!("Integration of AI technologies with {topic}"),
            "viral_potential": 85,
            "relevance": "high",
            "search_volume": "high",
            "competition": "medium",
            "keywords": [format!("AI {topic}"), format!("automated {topic}"), format!("smart {topic}")],
            "content_formats": ["how_to_guide", "comparison"],
            "content_angles": [format!("AI tools for {topic}"), format!("Future of {topic} with AI")],
        }),
        json!({
            "trend": format!("Sustainable {topic}"),
            "description": format!("Eco-friendly approaches to {topic}"),
            "viral_potential": 75,
            "relevance": "high",
            "search_volume": "medium",
            "competition": "low",
            "keywords": [format!("sustainable {topic}"), format!("green {topic}"), format!("eco {topic}")],
            "content_formats": ["case_study", "trend_analysis"],
            "content_angles": [format!("Green {topic} strategies"), format!("Sustainable {topic} benefits")],
        }),
        json!({
            "trend": format!("{topic} automation"),
            "description": format!("Automated solutions for {topic} processes"),
            "viral_potential": 80,
            "relevance": "high",
            "search_volume": "medium",
            "competition": "medium",
            "keywords": [format!("{topic} automation"), format!("automated {topic}"), format!("{topic} tools")],
            "content_formats": ["how_to_guide", "tool_comparison"],
            "content_angles": [format!("Best {topic} automation tools"), format!("Automating {topic} workflows")],
        }),
    ]
}

pub fn fallback_content_opportunities(topic: &str) -> Vec<Value> {
    vec![
        json!({
            "opportunity": format!("Complete {topic} Guide for Beginners"),
            "format": "how_to_guide",
            "difficulty": 40,
            "engagement_potential": "high",
            "time_investment": "2-3 weeks",
            "keywords": [format!("{topic} guide"), format!("beginner {topic}"), format!("how to {topic}")],
            "monetization": "High potential for lead generation and course sales",
            "distribution": ["Blog", "LinkedIn", "Email Newsletter", "YouTube"],
            "competitive_advantage": "Comprehensive yet accessible approach",
        }),
        json!({
            "opportunity": format!("{topic} ROI Calculator and Framework"),
            "format": "interactive_tool",
            "difficulty": 60,
            "engagement_potential": "very_high",
            "time_investment": "3-4 weeks",
            "keywords": [format!("{topic} ROI"), format!("{topic} calculator"), format!("{topic} measurement")],
            "monetization": "Excellent lead capture and premium content potential",
            "distribution": ["Website", "LinkedIn", "Industry Publications"],
            "competitive_advantage": "Practical tool that provides immediate value",
        }),
    ]
}

pub fn market_intelligence(topic: &str, focus_area: &str) -> Value {
    json!({
        "highest_opportunity_audiences": [
            {
                "segment_name": format!("{topic} practitioners"),
                "market_size": "Growing market segment",
                "accessibility": "High via LinkedIn and industry publications",
                "monetization_opportunity": "Medium to high revenue potential",
                "competition_level": "Medium competition",
            },
            {
                "segment_name": format!("Small business owners in {focus_area}"),
                "market_size": "Large underserved market",
                "accessibility": "Medium via social media and forums",
                "monetization_opportunity": "High potential for courses and tools",
                "competition_level": "Low to medium competition",
            }
        ],
        "industry_growth_drivers": [
            format!("Increased demand for {topic} solutions"),
            "Digital transformation acceleration",
            "Remote work driving technology adoption",
            "AI and automation integration",
            "Focus on cost efficiency and ROI",
        ],
        "content_gaps": [
            format!("Practical {topic} implementation guides"),
            format!("Beginner-friendly {topic} content"),
            format!("ROI-focused {topic} strategies"),
            "Case studies with real results",
            "Tool comparisons and recommendations",
        ],
        "competitive_landscape": {
            "positioning_opportunities": format!("Thought leadership in practical {topic}"),
            "content_gaps": format!("Step-by-step {topic} guides"),
            "audience_needs": "Actionable, results-focused content",
        },
        "strategic_recommendations": {
            "priority_focus": format!("Target {topic} practitioners with actionable content"),
            "content_strategy": "Focus on how-to guides and case studies",
            "distribution_strategy": "LinkedIn, industry forums, and email marketing",
        },
        "market_sentiment": "Positive growth trajectory with strong demand for practical solutions",
        "geographic_opportunities": ["North American markets", "European expansion", "APAC emerging markets"],
    })
}

fn push_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>, limit: usize) {
    for item in items {
        if target.len() >= limit {
            break;
        }
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn topic_keywords(topic: &Value) -> Vec<String> {
    topic
        .get("keywords")
        .and_then(Value::as_array)
        .map(|ks| ks.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Keyword buckets built from the trending topics' keywords plus topic
/// templates. Order is stable and duplicates are dropped.
pub fn keyword_strategy(topic: &str, trending_topics: &[Value]) -> Value {
    let mut high_volume = Vec::new();
    let mut emerging = Vec::new();
    for t in trending_topics {
        let keywords = topic_keywords(t);
        push_unique(&mut high_volume, keywords.iter().take(2).cloned(), 15);
        push_unique(&mut emerging, keywords.iter().skip(2).take(2).cloned(), 8);
    }

    let base = [
        format!("{topic} guide"),
        format!("how to {topic}"),
        format!("{topic} strategies"),
        format!("{topic} tips"),
        format!("best {topic} tools"),
        format!("{topic} for beginners"),
        format!("{topic} case study"),
        format!("{topic} ROI"),
    ];
    push_unique(&mut high_volume, base[..5].iter().cloned(), 15);
    let mut low_competition = Vec::new();
    push_unique(&mut low_competition, base[5..].iter().cloned(), 10);
    push_unique(
        &mut emerging,
        [format!("AI {topic}"), format!("{topic} automation")],
        8,
    );

    json!({
        "high_volume_keywords": high_volume,
        "low_competition_keywords": low_competition,
        "emerging_keywords": emerging,
        "keyword_clusters": {
            format!("{topic}_fundamentals"): [format!("{topic} basics"), format!("{topic} guide"), format!("what is {topic}")],
            format!("{topic}_implementation"): [format!("{topic} strategy"), format!("{topic} best practices"), format!("how to {topic}")],
            format!("{topic}_tools"): [format!("{topic} software"), format!("{topic} tools"), format!("best {topic} platforms")],
            format!("{topic}_advanced"): [format!("advanced {topic}"), format!("{topic} optimization"), format!("{topic} ROI")],
        },
    })
}

fn market_insights(market: &Value, seo: &Value, trending_topics: &[Value]) -> Value {
    let formats: Vec<Value> = trending_topics
        .iter()
        .map(|t| {
            t.pointer("/content_formats/0")
                .cloned()
                .unwrap_or_else(|| json!("how_to_guide"))
        })
        .collect();
    let interests: Vec<Value> = seo["high_volume_keywords"]
        .as_array()
        .map(|ks| ks.iter().take(10).cloned().collect())
        .unwrap_or_default();
    json!({
        "high_demand_angles": market["content_gaps"],
        "viral_content_formats": formats,
        "audience_interests": interests,
        "emerging_trends": seo["emerging_keywords"],
        "cross_industry_opportunities": market["geographic_opportunities"],
        "sentiment": market["market_sentiment"],
        "behavior_shifts": market["industry_growth_drivers"],
        "highest_opportunity_audiences": market["highest_opportunity_audiences"],
        "strategic_recommendations": market["strategic_recommendations"],
        "competitive_landscape": market["competitive_landscape"],
    })
}

fn competitive_gaps(market: &Value, topics: usize, opportunities: usize) -> Value {
    let niches: Vec<Value> = market["highest_opportunity_audiences"]
        .as_array()
        .map(|a| a.iter().take(3).map(|s| s["segment_name"].clone()).collect())
        .unwrap_or_default();
    json!({
        "analysis": format!(
            "Strategic analysis reveals opportunities in targeted content creation with {topics} high-potential topics and {opportunities} strategic opportunities identified."
        ),
        "weaknesses": market["content_gaps"],
        "niches": niches,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

async fn ask(llm: Option<&LlmClient>, prompt: &str, what: &str) -> String {
    let Some(llm) = llm else {
        return String::new();
    };
    match llm.call_text(prompt, JSON_ARRAY_SYSTEM).await {
        Ok(text) => text,
        Err(e) => {
            warn!("LLM call for {what} failed: {e}");
            String::new()
        }
    }
}

/// Runs the research and the search-interest enrichment. Never fails for a
/// non-empty topic; model and trends outages degrade to fallback sections.
pub async fn run_trend_research(
    llm: Option<&LlmClient>,
    trends: Option<&dyn TrendsSource>,
    params: &TrendResearchParams,
) -> Result<TrendResearch, serde_json::Error> {
    let started = Instant::now();
    let topic = params.topic.as_str();
    info!("Starting trend research for '{topic}'");

    let topics_text = ask(llm, &trending_topics_prompt(params), "trending topics").await;
    let trending_topics = parse_trending_topics(&topics_text, topic);

    let opps_text = ask(
        llm,
        &opportunities_prompt(params, &trending_topics),
        "content opportunities",
    )
    .await;
    let content_opportunities = parse_content_opportunities(&opps_text, topic);

    let market = market_intelligence(topic, &params.focus_area);
    let seo = keyword_strategy(topic, &trending_topics);

    let mut input = TrendAnalysisInput {
        topic: topic.to_string(),
        target_audience: params.target_audience.clone(),
        focus_area: params.focus_area.clone(),
        trending_topics,
        content_opportunities,
        seo_intelligence: Some(seo.clone()),
        confidence_score: Some(RESEARCH_CONFIDENCE),
        ..Default::default()
    };
    let trends_analysis = enrich_trend_analysis(trends, &mut input, &[]).await?;

    let research = TrendResearch {
        collection: params.collection.clone(),
        market_insights: market_insights(&market, &seo, &input.trending_topics),
        competitive_gaps: competitive_gaps(
            &market,
            input.trending_topics.len(),
            input.content_opportunities.len(),
        ),
        pytrends_analysis: input.pytrends_analysis.take().unwrap_or_else(|| json!({})),
        pytrends_enhanced: trends_analysis.pytrends_enhanced,
        confidence_score: input.confidence_score.unwrap_or(RESEARCH_CONFIDENCE),
        data_sources: ["strategic_prompting", "market_intelligence", "audience_analysis"]
            .map(String::from)
            .to_vec(),
        processing_time: (started.elapsed().as_secs_f64() * 100.0).round() / 100.0,
        fallback_mode: llm.is_none(),
        seo_intelligence: seo,
        trending_topics: input.trending_topics,
        content_opportunities: input.content_opportunities,
    };
    info!(
        "Trend research for '{topic}' produced {} topics and {} opportunities",
        research.trending_topics.len(),
        research.content_opportunities.len()
    );
    Ok(research)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(topic: &str) -> TrendResearchParams {
        TrendResearchParams::new(topic)
    }

    #[test]
    fn test_prompts_carry_topic_and_domain_formats() {
        let p = params("home security");
        assert!(trending_topics_prompt(&p).contains("Return EXACTLY 6 trending topics"));
        let prompt = opportunities_prompt(&p, &[json!({"trend": "Smart locks"})]);
        assert!(prompt.contains("trending subtopics: Smart locks"));
        assert!(prompt.contains("buyer_guide, comparison, checklist"));
        assert_eq!(topic_formats("knitting")[0], "how_to_guide");
    }

    #[test]
    fn test_parse_trending_topics_maps_and_limits() {
        let items: Vec<Value> = (0..8)
            .map(|i| json!({"trend_name": format!("Trend {i}"), "keywords": ["a", "b"]}))
            .collect();
        let topics = parse_trending_topics(&Value::Array(items).to_string(), "solar");
        assert_eq!(topics.len(), 6);
        assert_eq!(topics[0]["trend"], "Trend 0");
        assert_eq!(topics[0]["viral_potential"], 70);
        assert_eq!(topics[2]["viral_potential"], 60);
        assert_eq!(topics[1]["content_formats"], json!(["how_to_guide"]));
        assert_eq!(topics[1]["content_angles"][0], "Complete guide to Trend 1");
    }

    #[test]
    fn test_parse_trending_topics_accepts_wrapped_object() {
        let raw = r#"{"trends": [{"trend_name": "Heat pumps", "viral_potential": 91}]}"#;
        let topics = parse_trending_topics(raw, "solar");
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0]["viral_potential"], 91);
    }

    #[test]
    fn test_unparseable_topics_fall_back() {
        let topics = parse_trending_topics("no json here", "solar");
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0]["trend"], "AI-powered solar");
        assert_eq!(topics[1]["competition"], "low");
    }

    #[test]
    fn test_opportunities_are_filtered_and_enhanced() {
        let raw = json!([
            {"opportunity_title": "Home security camera comparison", "content_format": "comparison", "difficulty_score": 50},
            {"opportunity_title": "Best sourdough recipes", "keywords": ["bread"]},
            {"opportunity_title": "Security checklist for renters", "content_format": "checklist", "difficulty_score": 25}
        ])
        .to_string();
        let opps = parse_content_opportunities(&raw, "home security");
        assert_eq!(opps.len(), 2);
        assert_eq!(opps[0]["difficulty"], 55);
        assert_eq!(opps[0]["time_investment"], "3-4 weeks");
        assert_eq!(opps[0]["distribution"][1], "Technical Blogs");
        assert_eq!(opps[0]["lead_generation_potential"], "Very High");
        assert_eq!(opps[1]["difficulty"], 20);
        assert_eq!(opps[1]["time_investment"], "1-2 weeks");
    }

    #[test]
    fn test_off_topic_opportunities_fall_back() {
        let raw = json!([{"opportunity_title": "Sourdough for beginners"}]).to_string();
        let opps = parse_content_opportunities(&raw, "home security");
        assert_eq!(opps.len(), 2);
        assert_eq!(opps[0]["opportunity"], "Complete home security Guide for Beginners");
        assert_eq!(opps[1]["format"], "interactive_tool");
    }

    #[test]
    fn test_difficulty_and_time_investment_bands() {
        assert_eq!(opportunity_difficulty(80, "calculator"), 90);
        assert_eq!(opportunity_difficulty(30, "listicle"), 25);
        assert_eq!(time_investment(70), "4-6 weeks");
        assert_eq!(time_investment(40), "2-3 weeks");
        assert_eq!(time_investment(39), "1-2 weeks");
    }

    #[test]
    fn test_keyword_strategy_buckets_and_clusters() {
        let topics = vec![
            json!({"keywords": ["solar panels", "solar cost", "solar grants", "solar loans"]}),
            json!({"keywords": ["solar panels", "rooftop solar"]}),
        ];
        let seo = keyword_strategy("solar", &topics);
        let high = seo["high_volume_keywords"].as_array().unwrap();
        assert_eq!(high[0], "solar panels");
        assert_eq!(high[2], "rooftop solar");
        assert_eq!(high.iter().filter(|k| *k == "solar panels").count(), 1);
        assert_eq!(seo["emerging_keywords"][0], "solar grants");
        assert_eq!(seo["low_competition_keywords"][0], "solar for beginners");
        let clusters = seo["keyword_clusters"].as_object().unwrap();
        assert_eq!(clusters.len(), 4);
        assert!(clusters.contains_key("solar_tools"));
    }

    #[tokio::test]
    async fn test_research_without_model_is_complete() {
        let research = run_trend_research(None, None, &params("solar"))
            .await
            .unwrap();
        assert!(research.fallback_mode);
        assert_eq!(research.trending_topics.len(), 3);
        assert_eq!(research.content_opportunities.len(), 2);
        assert!(!research.pytrends_enhanced);
        assert_eq!(research.pytrends_analysis["fallback_mode"], true);
        assert_eq!(research.market_insights["viral_content_formats"][1], "case_study");
        assert_eq!(research.competitive_gaps["niches"][0], "solar practitioners");
        assert_eq!(research.confidence_score, 95.0);

        let input = research.to_input(&params("solar"));
        assert_eq!(input.data_sources.len(), 3);
        assert!(input.seo_intelligence.is_some());
    }
}
