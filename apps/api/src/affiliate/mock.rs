//! Deterministic offer generator used when no Linkup key is configured, and as
//! the per-subtopic fallback when a live search fails.

use async_trait::async_trait;
use chrono::Utc;

use crate::affiliate::extract::{program_id, title_case};
use crate::affiliate::models::{AffiliateProgram, ResearchSource};
use crate::affiliate::{AffiliateSource, ResearchError};

/// Broad topic keyword → curated subtopics. First substring hit wins.
const TOPIC_SUBTOPICS: &[(&str, &[&str])] = &[
    ("fitness", &["home workouts", "gym equipment", "protein supplements", "yoga accessories", "running gear"]),
    ("technology", &["laptops", "smartphones", "software", "gaming", "smart home", "accessories"]),
    ("finance", &["investing", "budgeting tools", "credit cards", "loans", "insurance", "tax software"]),
    ("health", &["supplements", "fitness equipment", "healthy cooking", "mental wellness", "medical devices"]),
    ("travel", &["booking platforms", "travel gear", "accommodation", "flights", "travel insurance", "activities"]),
    ("fashion", &["clothing", "shoes", "accessories", "beauty", "jewelry", "watches"]),
    ("education", &["online courses", "books", "certifications", "learning tools", "tutoring", "study materials"]),
    ("home", &["furniture", "decor", "kitchen", "gardening", "tools", "organization"]),
    ("business", &["software", "marketing tools", "productivity", "finance", "legal", "consulting"]),
    ("cooking", &["kitchen appliances", "cookbooks", "meal kits", "specialty ingredients", "cooking classes"]),
];

const HIGH_VALUE_TERMS: &[&str] = &["software", "course", "training", "system", "program", "tool", "guide"];

/// Amazon pays a flat 4.5% on each of these (name template, price).
const AMAZON_PRODUCTS: &[(&str, f64)] = &[
    ("Premium {} Guide", 29.99),
    ("{} Equipment Set", 149.99),
    ("{} Online Course", 99.99),
];
const AMAZON_RATE: f64 = 4.5;

/// One offer per remaining network.
struct OfferTemplate {
    network: &'static str,
    name: &'static str,
    description: &'static str,
    commission_rate: f64,
    commission_amount: f64,
    cookie_duration: &'static str,
    url_suffix: &'static str,
    materials: &'static [&'static str],
    approval_required: bool,
}

const NETWORK_OFFERS: &[OfferTemplate] = &[
    OfferTemplate {
        network: "shareasale",
        name: "{} Masterclass",
        description: "Comprehensive training program for {}",
        commission_rate: 30.0,
        commission_amount: 89.70,
        cookie_duration: "60 days",
        url_suffix: "course",
        materials: &["banners", "email_templates", "social_media_kit"],
        approval_required: true,
    },
    OfferTemplate {
        network: "clickbank",
        name: "{} Success System",
        description: "Proven system to master {} quickly",
        commission_rate: 75.0,
        commission_amount: 149.25,
        cookie_duration: "60 days",
        url_suffix: "success",
        materials: &["sales_pages", "email_swipes", "banner_ads"],
        approval_required: false,
    },
    OfferTemplate {
        network: "cj",
        name: "Professional {} Tools",
        description: "Enterprise-grade tools for {} professionals",
        commission_rate: 20.0,
        commission_amount: 59.80,
        cookie_duration: "45 days",
        url_suffix: "tools",
        materials: &["product_feeds", "text_links", "banners"],
        approval_required: true,
    },
    OfferTemplate {
        network: "impact",
        name: "{} Certification Program",
        description: "Industry-recognized certification for {} expertise",
        commission_rate: 25.0,
        commission_amount: 124.75,
        cookie_duration: "30 days",
        url_suffix: "certification",
        materials: &["course_catalog", "promotional_videos", "landing_pages"],
        approval_required: false,
    },
];

/// Fixed confidence for generated offers; they are placeholders, not extractions.
const MOCK_CONFIDENCE: f64 = 0.5;

pub struct MockSource;

#[async_trait]
impl AffiliateSource for MockSource {
    async fn suggest_subtopics(&self, topic: &str) -> Vec<String> {
        generate_subtopics(topic)
    }

    async fn search_subtopic(
        &self,
        subtopic: &str,
    ) -> Result<(Vec<AffiliateProgram>, ResearchSource), ResearchError> {
        Ok((mock_offers(subtopic), ResearchSource::Mock))
    }

    fn source(&self) -> ResearchSource {
        ResearchSource::Mock
    }
}

/// Curated subtopics for known topics. Short unknown topics get six generic
/// variants; longer ones are already specific and are returned as-is.
pub fn generate_subtopics(topic: &str) -> Vec<String> {
    let topic_lower = topic.to_lowercase();
    if let Some((_, subtopics)) = TOPIC_SUBTOPICS
        .iter()
        .find(|(key, _)| topic_lower.contains(key))
    {
        return subtopics.iter().map(|s| s.to_string()).collect();
    }

    if topic.split_whitespace().count() <= 2 {
        ["for beginners", "reviews", "comparison", "tools", "courses", "software"]
            .iter()
            .map(|suffix| format!("{topic} {suffix}"))
            .collect()
    } else {
        vec![topic.to_string()]
    }
}

/// Monthly search estimate: 1000, doubled per high-value term, halved for
/// long-tail phrases, ×5 for single words.
pub fn estimate_search_volume(keyword: &str) -> u64 {
    let lower = keyword.to_lowercase();
    let mut volume = 1000.0_f64;
    for term in HIGH_VALUE_TERMS {
        if lower.contains(term) {
            volume *= 2.0;
        }
    }
    match keyword.split_whitespace().count() {
        n if n > 3 => volume *= 0.5,
        1 => volume *= 5.0,
        _ => {}
    }
    volume as u64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::too_many_arguments)]
fn make_program(
    subtopic: &str,
    network: &str,
    name: String,
    description: String,
    (commission_rate, commission_amount): (f64, f64),
    cookie_duration: &str,
    url: String,
    materials: &[&str],
    approval_required: bool,
) -> AffiliateProgram {
    AffiliateProgram {
        id: program_id(&name, &url),
        network: network.to_string(),
        program_name: name,
        description,
        commission_rate,
        commission_amount,
        cookie_duration: cookie_duration.to_string(),
        program_url: url.clone(),
        subtopic: subtopic.to_string(),
        approval_required,
        promotional_materials: materials.iter().map(|m| m.to_string()).collect(),
        extraction_confidence: MOCK_CONFIDENCE,
        source_url: url,
        extracted_at: Utc::now(),
        unique_id: None,
    }
}

/// Seven offers for one subtopic: three Amazon products plus one offer each
/// from ShareASale, ClickBank, CJ and Impact.
pub fn mock_offers(subtopic: &str) -> Vec<AffiliateProgram> {
    let title = title_case(subtopic);
    let slug = subtopic.replace(' ', "");

    let amazon = AMAZON_PRODUCTS.iter().map(|(template, price)| {
        make_program(
            subtopic,
            "amazon",
            template.replace("{}", &title),
            format!("High-quality {subtopic} product with excellent reviews"),
            (AMAZON_RATE, round2(price * AMAZON_RATE / 100.0)),
            "24 hours",
            format!("https://amazon.com/{}", subtopic.replace(' ', "-")),
            &["banners", "text_links", "product_feeds"],
            false,
        )
    });

    let others = NETWORK_OFFERS.iter().map(|offer| {
        make_program(
            subtopic,
            offer.network,
            offer.name.replace("{}", &title),
            offer.description.replace("{}", subtopic),
            (offer.commission_rate, offer.commission_amount),
            offer.cookie_duration,
            format!("https://{slug}{}.com", offer.url_suffix),
            offer.materials,
            offer.approval_required,
        )
    });

    amazon.chain(others).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_topic_uses_curated_subtopics() {
        let subs = generate_subtopics("Home Fitness");
        assert_eq!(subs[0], "home workouts");
        assert_eq!(subs.len(), 5);
    }

    #[test]
    fn test_short_unknown_topic_gets_generic_subtopics() {
        let subs = generate_subtopics("origami");
        assert_eq!(subs.len(), 6);
        assert_eq!(subs[0], "origami for beginners");
        assert_eq!(subs[5], "origami software");
    }

    #[test]
    fn test_specific_topic_returned_as_is() {
        let subs = generate_subtopics("vintage mechanical watch repair");
        assert_eq!(subs, vec!["vintage mechanical watch repair"]);
    }

    #[test]
    fn test_search_volume_estimates() {
        assert_eq!(estimate_search_volume("yoga"), 5000);
        assert_eq!(estimate_search_volume("yoga software"), 2000);
        assert_eq!(estimate_search_volume("best yoga course for seniors"), 1000);
        assert_eq!(estimate_search_volume("yoga mats"), 1000);
    }

    #[test]
    fn test_mock_offers_cover_five_networks() {
        let offers = mock_offers("yoga mats");
        assert_eq!(offers.len(), 7);
        let networks: std::collections::HashSet<_> =
            offers.iter().map(|o| o.network.as_str()).collect();
        assert_eq!(networks.len(), 5);

        let amazon_guide = &offers[0];
        assert_eq!(amazon_guide.program_name, "Premium Yoga Mats Guide");
        assert!((amazon_guide.commission_amount - 1.35).abs() < 1e-9);
        assert_eq!(amazon_guide.program_url, "https://amazon.com/yoga-mats");

        let clickbank = offers.iter().find(|o| o.network == "clickbank").unwrap();
        assert_eq!(clickbank.program_name, "Yoga Mats Success System");
        assert_eq!(clickbank.commission_rate, 75.0);
        assert_eq!(clickbank.program_url, "https://yogamatssuccess.com");
    }

    #[tokio::test]
    async fn test_mock_source_tags_results_as_mock() {
        let (programs, source) = MockSource.search_subtopic("tea").await.unwrap();
        assert_eq!(source, ResearchSource::Mock);
        assert!(!programs.is_empty());
    }
}
