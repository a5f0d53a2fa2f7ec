//! Pulls affiliate program terms out of free-text search results.
//!
//! Everything here is lexical: commission and cookie figures come from a fixed
//! list of regexes (first match wins), the network from URL substrings, and the
//! confidence from which of those signals were found.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::affiliate::models::AffiliateProgram;

/// One search hit as returned by the Linkup `searchResults` output type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    #[serde(alias = "name")]
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(alias = "rawContent")]
    pub raw_content: String,
    pub description: Option<String>,
}

static COMMISSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d+(?:\.\d+)?)%\s*commission",
        r"commission\s*:\s*\$?(\d+(?:\.\d+)?)",
        r"(\d+(?:\.\d+)?)%\s*per\s*(?:sale|conversion)",
        r"earn\s*\$?(\d+(?:\.\d+)?)\s*(?:per|for each)",
        r"(\d+(?:\.\d+)?)%\s*rev\s*share",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static COOKIE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d+(?:\.\d+)?)\s*(?:day|days)\s*cookie",
        r"cookie\s*duration\s*:?\s*(\d+(?:\.\d+)?)\s*(?:day|days)",
        r"(\d+(?:\.\d+)?)\s*day\s*tracking",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// URL substring → network. Checked in order.
const NETWORKS: &[(&str, &str)] = &[
    ("amazon", "amazon"),
    ("shareasale", "shareasale"),
    ("clickbank", "clickbank"),
    ("cj.com", "cj"),
    ("impact.com", "impact"),
    ("rakuten", "rakuten"),
    ("partnerize", "partnerize"),
    ("refersion", "refersion"),
    ("impactradius", "impact"),
];

/// (material, trigger words)
const PROMOTIONAL_MATERIALS: &[(&str, &[&str])] = &[
    ("banners", &["banner", "creative", "graphic"]),
    ("text_links", &["text link", "textlink"]),
    ("email_templates", &["email template", "email creative"]),
    ("social_media_kit", &["social media", "social creative"]),
    ("product_feeds", &["product feed", "data feed"]),
];

const DEFAULT_COOKIE: &str = "30 days";
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Commission found in content: values ≤100 are read as a percentage,
/// larger values as a flat dollar amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commission {
    Rate(f64),
    Amount(f64),
}

pub fn extract_commission(content_lower: &str) -> Option<Commission> {
    COMMISSION_PATTERNS.iter().find_map(|re| {
        let value: f64 = re.captures(content_lower)?.get(1)?.as_str().parse().ok()?;
        Some(if value <= 100.0 {
            Commission::Rate(value)
        } else {
            Commission::Amount(value)
        })
    })
}

pub fn extract_cookie_duration(content_lower: &str) -> Option<String> {
    COOKIE_PATTERNS.iter().find_map(|re| {
        let days = re.captures(content_lower)?.get(1)?.as_str().to_string();
        Some(format!("{days} days"))
    })
}

pub fn identify_network(url: &str) -> &'static str {
    let url_lower = url.to_lowercase();
    NETWORKS
        .iter()
        .find(|(needle, _)| url_lower.contains(needle))
        .map(|(_, network)| *network)
        .unwrap_or("other")
}

pub fn detect_promotional_materials(content_lower: &str) -> Vec<String> {
    PROMOTIONAL_MATERIALS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| content_lower.contains(w)))
        .map(|(material, _)| material.to_string())
        .collect()
}

pub fn calculate_confidence(content: &str, has_rate: bool, has_cookie: bool) -> f64 {
    let mut confidence: f64 = 0.0;
    if has_rate {
        confidence += 0.4;
    }
    if has_cookie {
        confidence += 0.3;
    }
    let lower = content.to_lowercase();
    if ["affiliate", "partner", "commission"]
        .iter()
        .any(|w| lower.contains(w))
    {
        confidence += 0.2;
    }
    if content.chars().count() > 200 {
        confidence += 0.1;
    }
    confidence.min(1.0)
}

/// First 16 hex chars of md5("{title}_{url}").
pub fn program_id(title: &str, url: &str) -> String {
    let digest = format!("{:x}", md5::compute(format!("{title}_{url}")));
    digest[..16].to_string()
}

pub(crate) fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_placeholder_title(title: &str) -> bool {
    matches!(title.trim(), "" | "...")
}

/// Resolves a usable program name when the search hit has no real title.
fn resolve_title(result: &SearchResult, content: &str, subtopic: &str) -> String {
    if !is_placeholder_title(&result.title) {
        return result.title.clone();
    }

    let mut title = reqwest::Url::parse(&result.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| {
            let host = host.trim_start_matches("www.");
            let label = host.split('.').next().unwrap_or_default();
            title_case(&label.replace('-', " "))
        })
        .unwrap_or_default();

    if content.chars().count() > 20 {
        let candidate = content.lines().map(str::trim).find(|line| {
            let len = line.chars().count();
            let lower = line.to_lowercase();
            len > 10
                && len < 100
                && ["program", "affiliate", "partner"]
                    .iter()
                    .any(|w| lower.contains(w))
        });
        if let Some(line) = candidate {
            title = line.chars().take(60).collect::<String>().trim().to_string();
        }
    }

    if is_placeholder_title(&title) {
        title = format!("{} Affiliate Program", title_case(subtopic));
    }
    title
}

/// Builds one program record from a search hit. Never fails: missing figures
/// default to zero commission and a 30 day cookie.
pub fn extract_program(result: &SearchResult, subtopic: &str) -> AffiliateProgram {
    let content = format!("{} {}", result.content, result.raw_content);
    let content_lower = content.to_lowercase();

    let commission = extract_commission(&content_lower);
    let cookie = extract_cookie_duration(&content_lower);
    let (commission_rate, commission_amount) = match commission {
        Some(Commission::Rate(r)) => (r, 0.0),
        Some(Commission::Amount(a)) => (0.0, a),
        None => (0.0, 0.0),
    };
    // A zero rate counts as "not found" for confidence purposes.
    let has_rate = matches!(commission, Some(Commission::Rate(r)) if r != 0.0);

    let title = resolve_title(result, &content, subtopic);

    let description: String = result
        .description
        .clone()
        .unwrap_or_else(|| content.chars().take(200).collect())
        .chars()
        .take(MAX_DESCRIPTION_CHARS)
        .collect();
    let description = if description.trim().is_empty() {
        format!("Affiliate program for {subtopic}")
    } else {
        description
    };

    AffiliateProgram {
        id: program_id(&title, &result.url),
        network: identify_network(&result.url).to_string(),
        program_name: title,
        description,
        commission_rate,
        commission_amount,
        cookie_duration: cookie.clone().unwrap_or_else(|| DEFAULT_COOKIE.to_string()),
        program_url: result.url.clone(),
        subtopic: subtopic.to_string(),
        approval_required: content_lower.contains("approval") || content_lower.contains("apply"),
        promotional_materials: detect_promotional_materials(&content_lower),
        extraction_confidence: calculate_confidence(&content, has_rate, cookie.is_some()),
        source_url: result.url.clone(),
        extracted_at: Utc::now(),
        unique_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(title: &str, url: &str, content: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(COMMISSION_PATTERNS.len(), 5);
        assert_eq!(COOKIE_PATTERNS.len(), 3);
    }

    #[test]
    fn test_commission_percentage_is_rate() {
        assert_eq!(
            extract_commission("earn a 30% commission on every sale"),
            Some(Commission::Rate(30.0))
        );
    }

    #[test]
    fn test_commission_large_value_is_amount() {
        assert_eq!(
            extract_commission("commission: $150 per signup"),
            Some(Commission::Amount(150.0))
        );
    }

    #[test]
    fn test_first_commission_pattern_wins() {
        // Both the "% commission" and "% rev share" patterns match.
        assert_eq!(
            extract_commission("25% rev share or 40% commission"),
            Some(Commission::Rate(40.0))
        );
    }

    #[test]
    fn test_cookie_duration_patterns() {
        assert_eq!(
            extract_cookie_duration("90 day cookie window").as_deref(),
            Some("90 days")
        );
        assert_eq!(
            extract_cookie_duration("cookie duration: 45 days").as_deref(),
            Some("45 days")
        );
        assert_eq!(extract_cookie_duration("no info"), None);
    }

    #[test]
    fn test_identify_network() {
        assert_eq!(identify_network("https://www.ShareASale.com/x"), "shareasale");
        assert_eq!(identify_network("https://cj.com/offer"), "cj");
        assert_eq!(identify_network("https://app.impactradius.com"), "impact");
        assert_eq!(identify_network("https://example.org"), "other");
    }

    #[test]
    fn test_promotional_materials_detected() {
        let m = detect_promotional_materials("banner ads, text link kits and a product feed");
        assert_eq!(m, vec!["banners", "text_links", "product_feeds"]);
    }

    #[test]
    fn test_confidence_caps_at_one() {
        let long = format!("affiliate {}", "x".repeat(300));
        assert!((calculate_confidence(&long, true, true) - 1.0).abs() < 1e-9);
        assert!((calculate_confidence("nothing", false, false)).abs() < 1e-9);
    }

    #[test]
    fn test_program_id_is_16_hex_chars() {
        let id = program_id("Yoga Partners", "https://yoga.example");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, program_id("Yoga Partners", "https://yoga.example"));
    }

    #[test]
    fn test_extract_program_full_record() {
        let result = make_result(
            "Acme Yoga Affiliate",
            "https://www.shareasale.com/acme",
            "Join our affiliate program: 35% commission, 60 day cookie. Banners provided. Apply today.",
        );
        let p = extract_program(&result, "yoga mats");
        assert_eq!(p.network, "shareasale");
        assert_eq!(p.program_name, "Acme Yoga Affiliate");
        assert_eq!(p.commission_rate, 35.0);
        assert_eq!(p.commission_amount, 0.0);
        assert_eq!(p.cookie_duration, "60 days");
        assert!(p.approval_required);
        assert_eq!(p.promotional_materials, vec!["banners"]);
        assert!((p.extraction_confidence - 0.9).abs() < 1e-9);
        assert_eq!(p.subtopic, "yoga mats");
    }

    #[test]
    fn test_title_falls_back_to_domain() {
        let result = make_result("...", "https://www.green-leaf.io/partners", "short");
        let p = extract_program(&result, "tea");
        assert_eq!(p.program_name, "Green Leaf");
        assert_eq!(p.cookie_duration, "30 days");
    }

    #[test]
    fn test_title_prefers_content_line_mentioning_program() {
        let result = make_result(
            "",
            "https://example.com",
            "Welcome to the site\nThe Example Partner Program\nMore text here",
        );
        let p = extract_program(&result, "widgets");
        assert_eq!(p.program_name, "The Example Partner Program");
    }

    #[test]
    fn test_title_falls_back_to_subtopic() {
        let result = make_result("", "not a url", "");
        let p = extract_program(&result, "home gym");
        assert_eq!(p.program_name, "Home Gym Affiliate Program");
        assert_eq!(p.description, "Affiliate program for home gym");
    }

    #[test]
    fn test_description_truncated() {
        let mut result = make_result("T", "https://x.com", "");
        result.description = Some("d".repeat(800));
        let p = extract_program(&result, "s");
        assert_eq!(p.description.chars().count(), 500);
    }
}
