use serde_json::{json, Value};

use crate::llm_client::prompts::BLOG_IDEA_FIELDS;
use crate::storage::decode_json_column;

pub const IDEAS_PER_TRENDING_TOPIC: usize = 3;
pub const IDEAS_PER_OPPORTUNITY: usize = 2;
pub const BONUS_IDEAS_FROM_PYTRENDS: usize = 5;

/// Research context shared by every prompt in one generation run.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub topic: &'a str,
    pub target_audience: &'a str,
}

fn keyword_line(keywords: Option<&Value>) -> String {
    match decode_json_column(keywords, json!([])) {
        Value::Array(items) => items
            .iter()
            .take(5)
            .map(|k| k.as_str().map_or_else(|| k.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn str_field<'a>(row: &'a Value, key: &str, default: &'a str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or(default)
}

pub fn trending_topic_prompt(topic: &Value, ctx: &PromptContext<'_>) -> String {
    let extra = decode_json_column(topic.get("additional_data"), json!({}));
    let description = extra.get("description").and_then(Value::as_str).unwrap_or("");
    let viral = topic
        .get("viral_potential")
        .and_then(Value::as_f64)
        .unwrap_or(70.0);
    let main = ctx.topic;
    let audience = ctx.target_audience;

    format!(
        "Generate {IDEAS_PER_TRENDING_TOPIC} high-quality blog ideas based on this trending topic.

Topic: {title}
Description: {description}
Main Subject: {main}
Target Audience: {audience}
Viral Potential: {viral}%
Keywords: {keywords}

IMPORTANT: Return ONLY a valid JSON array with no additional text, comments, or markdown formatting.

{BLOG_IDEA_FIELDS}

Example format:
[
  {{
    \"title\": \"Complete Guide to {main} for {audience}\",
    \"description\": \"A comprehensive guide that helps {audience} understand and implement {main} strategies.\",
    \"content_format\": \"how_to_guide\",
    \"difficulty_level\": \"intermediate\",
    \"primary_keywords\": [\"{main}\", \"{main} implementation\", \"{main} framework\"],
    \"secondary_keywords\": [\"{main} methodology\", \"{main} case study\", \"{main} step-by-step\"],
    \"outline\": [\"Introduction\", \"Getting Started\", \"Key Strategies\", \"Implementation\", \"Best Practices\", \"Common Mistakes\", \"Conclusion\"],
    \"key_points\": [\"Practical implementation steps\", \"Real-world examples\", \"Actionable takeaways\"],
    \"business_value\": \"Helps {audience} implement effective {main} strategies to achieve better results\",
    \"call_to_action\": \"Start implementing these {main} strategies today\",
    \"estimated_word_count\": 2500,
    \"estimated_reading_time\": 12
  }}
]

Return only the JSON array, no other text.",
        title = str_field(topic, "title", ""),
        keywords = keyword_line(topic.get("keywords")),
    )
}

pub fn opportunity_prompt(opportunity: &Value, ctx: &PromptContext<'_>) -> String {
    let extra = decode_json_column(opportunity.get("additional_data"), json!({}));
    let difficulty = opportunity
        .get("difficulty")
        .and_then(Value::as_f64)
        .unwrap_or(50.0);

    format!(
        "Generate {IDEAS_PER_OPPORTUNITY} high-quality blog ideas based on this content opportunity.

Opportunity: {title}
Format: {format}
Main Subject: {main}
Target Audience: {audience}
Difficulty Score: {difficulty}/100
Engagement Potential: {engagement}
Time Investment: {time}
Keywords: {keywords}

IMPORTANT: Return ONLY a valid JSON array with no additional text, comments, or markdown formatting.

{BLOG_IDEA_FIELDS}

Return only the JSON array, no other text.",
        title = str_field(opportunity, "title", ""),
        format = str_field(opportunity, "format", "how_to_guide"),
        main = ctx.topic,
        audience = ctx.target_audience,
        engagement = str_field(opportunity, "engagement_potential", "medium"),
        time = extra
            .get("time_investment")
            .and_then(Value::as_str)
            .unwrap_or("2-3 weeks"),
        keywords = keyword_line(extra.get("keywords")),
    )
}

/// Joins the string entries of `source[key]`.
fn name_list(source: &Value, key: &str) -> String {
    source
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn bonus_prompt(count: usize, heading: &str, ctx: &PromptContext<'_>, focus: &[&str]) -> String {
    let focus = focus
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Generate {count} blog ideas based on {heading}

Main Topic: {main}
Target Audience: {audience}

Focus on:
{focus}

{BLOG_IDEA_FIELDS}

Return only a valid JSON array of detailed blog ideas, no other text.",
        main = ctx.topic,
        audience = ctx.target_audience,
    )
}

/// `source.countries` holds the top hotspot countries.
pub fn geographic_prompt(source: &Value, ctx: &PromptContext<'_>) -> String {
    bonus_prompt(
        BONUS_IDEAS_FROM_PYTRENDS,
        &format!(
            "geographic trends analysis.\n\nTop Markets: {}",
            name_list(source, "countries")
        ),
        ctx,
        &[
            "Regional market analysis",
            "Geographic-specific strategies",
            "International comparisons",
            "Market entry strategies",
        ],
    )
}

/// `source.top` and `source.rising` hold related query strings.
pub fn subtopics_prompt(source: &Value, ctx: &PromptContext<'_>) -> String {
    bonus_prompt(
        BONUS_IDEAS_FROM_PYTRENDS * 2,
        &format!(
            "sub-topics drawn from related searches.\n\nTop Sub-Topics: {}\nRising Sub-Topics: {}\n\nEach idea should target one sub-topic while relating back to the main topic.",
            name_list(source, "top"),
            name_list(source, "rising")
        ),
        ctx,
        &[
            "Specific aspects and angles of the main topic",
            "Specific user questions and pain points",
            "Different search intents",
            "Topical authority through sub-topic coverage",
            "Trending queries for immediate traffic",
        ],
    )
}

pub fn subtopic_analysis_prompt(source: &Value, ctx: &PromptContext<'_>) -> String {
    bonus_prompt(
        BONUS_IDEAS_FROM_PYTRENDS,
        &format!(
            "sub-topic performance analysis.\n\nHigh-Performing Sub-Topics: {}",
            name_list(source, "subtopics")
        ),
        ctx,
        &[
            "Sub-topics with proven search interest",
            "Comprehensive guides for each sub-topic",
            "Content clusters around successful sub-topics",
            "Competitive content that outperforms existing results",
        ],
    )
}

pub fn rising_queries_prompt(source: &Value, ctx: &PromptContext<'_>) -> String {
    bonus_prompt(
        BONUS_IDEAS_FROM_PYTRENDS,
        &format!(
            "rising search queries.\n\nRising Queries: {}",
            name_list(source, "queries")
        ),
        ctx,
        &[
            "New questions and concerns",
            "Emerging subtopics",
            "Timely insights",
            "Trending questions",
        ],
    )
}

pub fn keyword_clusters_prompt(source: &Value, ctx: &PromptContext<'_>) -> String {
    bonus_prompt(
        BONUS_IDEAS_FROM_PYTRENDS,
        &format!(
            "keyword clusters.\n\nKeyword Clusters: {}",
            name_list(source, "clusters")
        ),
        ctx,
        &[
            "Cluster-specific content strategies",
            "Semantic keyword optimization",
            "Topic authority building",
            "Comprehensive coverage",
        ],
    )
}
