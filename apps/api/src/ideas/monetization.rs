//! Monetization scoring across four revenue channels: affiliate, digital
//! product, service and lead generation.
//!
//! Channel scores are weighted .35 / .25 / .20 / .20 into one 0..=100 score.
//! Revenue estimates scale with the idea's estimated monthly traffic and the
//! channel totals are discounted by 0.7, since no site maximizes every stream.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::ideas::models::BlogIdea;

const AFFILIATE_WEIGHT: f64 = 0.35;
const PRODUCT_WEIGHT: f64 = 0.25;
const SERVICE_WEIGHT: f64 = 0.20;
const LEAD_WEIGHT: f64 = 0.20;
const DIVERSIFICATION_FACTOR: f64 = 0.7;
const DEFAULT_MONTHLY_TRAFFIC: f64 = 500.0;

/// (keyword, title bonus, keyword bonus) tiers.
const HIGH_INTENT: &[&str] = &[
    "buy", "purchase", "price", "cost", "discount", "deal", "coupon", "review", "best", "top",
    "compare", "vs", "alternative", "cheap", "affordable", "premium", "professional", "enterprise",
];
const MEDIUM_INTENT: &[&str] = &[
    "how to", "guide", "tutorial", "tips", "strategies", "methods", "tools", "software",
    "platform", "service", "solution", "system",
];
const PRODUCT_RESEARCH: &[&str] = &[
    "features", "benefits", "pros and cons", "specifications", "demo", "trial", "free",
    "comparison", "test", "results", "case study",
];

struct AffiliateCategory {
    name: &'static str,
    indicators: &'static [&'static str],
    commission: &'static str,
    cookie_duration: &'static str,
    programs: &'static [&'static str],
}

const AFFILIATE_CATEGORIES: &[AffiliateCategory] = &[
    AffiliateCategory {
        name: "saas",
        indicators: &["software", "platform", "tool", "app", "saas", "cloud"],
        commission: "20-30%",
        cookie_duration: "30-90 days",
        programs: &["PartnerStack", "Impact", "Direct vendor programs"],
    },
    AffiliateCategory {
        name: "ecommerce",
        indicators: &["product", "buy", "shop", "store", "amazon", "ecommerce"],
        commission: "3-10%",
        cookie_duration: "24-30 days",
        programs: &["Amazon Associates", "ShareASale", "CJ Affiliate"],
    },
    AffiliateCategory {
        name: "digital_products",
        indicators: &["course", "ebook", "template", "download", "digital"],
        commission: "30-70%",
        cookie_duration: "30-60 days",
        programs: &["ClickBank", "JVZoo", "Gumroad"],
    },
    AffiliateCategory {
        name: "online_courses",
        indicators: &["learn", "course", "training", "education", "tutorial"],
        commission: "20-50%",
        cookie_duration: "30-365 days",
        programs: &["Udemy Affiliate", "Teachable Affiliate", "Thinkific"],
    },
    AffiliateCategory {
        name: "software_tools",
        indicators: &["software", "tool", "plugin", "extension", "app"],
        commission: "15-40%",
        cookie_duration: "30-90 days",
        programs: &["AppSumo", "StackSocial", "Vendor direct programs"],
    },
    AffiliateCategory {
        name: "web_hosting",
        indicators: &["hosting", "domain", "website", "wordpress", "server"],
        commission: "50-200%",
        cookie_duration: "30-60 days",
        programs: &["Bluehost", "SiteGround", "WP Engine"],
    },
    AffiliateCategory {
        name: "marketing_tools",
        indicators: &["marketing", "seo", "social media", "email", "analytics"],
        commission: "20-40%",
        cookie_duration: "30-90 days",
        programs: &["HubSpot", "SEMrush", "Ahrefs", "ConvertKit"],
    },
];

/// (type, indicators, base price, development time, monthly conversion, sale price)
const PRODUCT_TYPES: &[(&str, &[&str], f64, &str, f64, f64)] = &[
    ("ebook", &["guide", "complete", "ultimate", "comprehensive", "handbook"], 19.0, "2-4 weeks", 0.02, 29.0),
    ("course", &["masterclass", "training", "bootcamp", "academy", "workshop"], 99.0, "4-8 weeks", 0.015, 199.0),
    ("template", &["template", "checklist", "worksheet", "planner", "framework"], 39.0, "1-2 weeks", 0.03, 49.0),
    ("tool", &["calculator", "generator", "analyzer", "tracker", "dashboard"], 79.0, "6-12 weeks", 0.01, 99.0),
];

/// (type, indicators, monthly conversion, deal value)
const SERVICE_TYPES: &[(&str, &[&str], f64, f64)] = &[
    ("consulting", &["strategy", "consulting", "advice", "planning", "optimization"], 0.005, 500.0),
    ("coaching", &["coaching", "mentoring", "training", "guidance", "support"], 0.003, 1000.0),
    ("done_for_you", &["implementation", "setup", "management", "service", "solution"], 0.001, 5000.0),
];

const LEAD_MAGNETS: &[(&str, &[&str])] = &[
    ("checklist", &["checklist", "steps", "process", "guide"]),
    ("template", &["template", "framework", "worksheet", "planner"]),
    ("ebook", &["ebook", "guide", "handbook", "manual"]),
    ("calculator", &["calculator", "tool", "estimator", "planner"]),
    ("swipe_file", &["examples", "templates", "samples", "scripts"]),
];

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateOpportunity {
    pub category: &'static str,
    pub commission_rate: &'static str,
    pub cookie_duration: &'static str,
    pub recommended_programs: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateChannel {
    pub score: i64,
    pub estimated_annual_revenue: i64,
    pub relevant_categories: Vec<&'static str>,
    pub opportunities: Vec<AffiliateOpportunity>,
    pub recommended_approach: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductOpportunity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub estimated_price: i64,
    pub development_time: &'static str,
    pub market_demand: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductChannel {
    pub score: i64,
    pub estimated_annual_revenue: i64,
    pub product_types: Vec<ProductOpportunity>,
    pub development_complexity: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceOpportunity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub estimated_price: i64,
    pub delivery_method: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceChannel {
    pub score: i64,
    pub estimated_annual_revenue: i64,
    pub service_types: Vec<ServiceOpportunity>,
    pub scalability: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadMagnet {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub estimated_conversion_rate: f64,
    pub value_proposition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadChannel {
    pub score: i64,
    pub estimated_annual_revenue: i64,
    pub lead_magnet_opportunities: Vec<LeadMagnet>,
    pub nurturing_strategy: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonetizationStrategy {
    pub immediate_actions: Vec<&'static str>,
    #[serde(rename = "30_day_plan")]
    pub thirty_day_plan: Vec<&'static str>,
    #[serde(rename = "90_day_plan")]
    pub ninety_day_plan: Vec<&'static str>,
    pub long_term_strategy: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonetizationAnalysis {
    pub overall_monetization_score: i64,
    pub estimated_annual_revenue: i64,
    pub monetization_priority: &'static str,
    pub affiliate_opportunities: AffiliateChannel,
    pub digital_product_opportunities: ProductChannel,
    pub service_opportunities: ServiceChannel,
    pub lead_generation_opportunities: LeadChannel,
    pub monetization_strategy: MonetizationStrategy,
    pub analysis_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonetizedIdea {
    #[serde(flatten)]
    pub idea: BlogIdea,
    pub monetization_score: i64,
    pub revenue_potential: i64,
    pub monetization_priority: &'static str,
    pub monetization_analysis: MonetizationAnalysis,
}

fn idea_text(idea: &BlogIdea, keywords: &[String]) -> String {
    format!("{} {}", idea.title, keywords.join(" ")).to_lowercase()
}

fn monthly_traffic(idea: &BlogIdea) -> f64 {
    idea.performance_estimates
        .get("estimated_monthly_traffic")
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_MONTHLY_TRAFFIC)
}

/// Title hits count for more than keyword hits, per intent tier.
pub fn commercial_intent_score(title: &str, keywords: &[String]) -> i64 {
    let title = title.to_lowercase();
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    let tiers: [(&[&str], i64, i64); 3] = [
        (HIGH_INTENT, 15, 8),
        (MEDIUM_INTENT, 10, 5),
        (PRODUCT_RESEARCH, 8, 4),
    ];

    let mut score = 0;
    for (words, title_bonus, keyword_bonus) in tiers {
        for word in words {
            if title.contains(word) {
                score += title_bonus;
            }
            score += keywords.iter().filter(|k| k.contains(word)).count() as i64 * keyword_bonus;
        }
    }
    score.min(100)
}

fn affiliate_channel(idea: &BlogIdea) -> AffiliateChannel {
    let keywords: Vec<String> = idea
        .primary_keywords
        .iter()
        .chain(idea.secondary_keywords.iter())
        .cloned()
        .collect();
    let text = idea_text(idea, &keywords);
    let categories: Vec<&AffiliateCategory> = AFFILIATE_CATEGORIES
        .iter()
        .filter(|c| c.indicators.iter().any(|i| text.contains(i)))
        .take(3)
        .collect();

    let revenue = monthly_traffic(idea) * 0.03 * 150.0 * 0.20 * 12.0;
    let recommended_approach = match idea.content_format.as_str() {
        "how_to_guide" => "Include tool tutorials and step-by-step implementations",
        "listicle" => "Create comparison tables with pros/cons for each tool",
        "comparison" => "Detailed feature comparisons with clear winner recommendations",
        "case_study" => "Show real results achieved with specific tools",
        "review" | "tool_review" => "In-depth analysis with hands-on testing and screenshots",
        _ => "Natural product mentions within educational content",
    };

    AffiliateChannel {
        score: (commercial_intent_score(&idea.title, &keywords) + categories.len() as i64 * 10)
            .min(100),
        estimated_annual_revenue: revenue as i64,
        relevant_categories: categories.iter().map(|c| c.name).collect(),
        opportunities: categories
            .iter()
            .map(|c| AffiliateOpportunity {
                category: c.name,
                commission_rate: c.commission,
                cookie_duration: c.cookie_duration,
                recommended_programs: c.programs.to_vec(),
            })
            .collect(),
        recommended_approach,
    }
}

fn product_channel(idea: &BlogIdea) -> ProductChannel {
    let text = idea_text(idea, &idea.primary_keywords);
    let traffic = monthly_traffic(idea);
    let multiplier = match idea.difficulty_level.as_str() {
        "beginner" => 0.8,
        "advanced" => 1.5,
        _ => 1.0,
    };

    let mut monthly = 0.0;
    let mut complexity = 0;
    let product_types: Vec<ProductOpportunity> = PRODUCT_TYPES
        .iter()
        .filter(|(_, indicators, ..)| indicators.iter().any(|i| text.contains(i)))
        .take(2)
        .map(|(kind, indicators, base, dev_time, conversion, price)| {
            monthly += traffic * conversion * price;
            complexity = complexity.max(match *kind {
                "course" => 2,
                "tool" => 3,
                _ => 1,
            });
            ProductOpportunity {
                kind,
                estimated_price: (base * multiplier) as i64,
                development_time: dev_time,
                market_demand: if indicators[..2].iter().any(|i| text.contains(i)) {
                    "high"
                } else {
                    "medium"
                },
            }
        })
        .collect();

    ProductChannel {
        score: (product_types.len() as i64 * 20 + 30).min(100),
        estimated_annual_revenue: (monthly * 12.0) as i64,
        product_types,
        development_complexity: match complexity {
            3 => "High",
            2 => "Medium",
            _ => "Low",
        },
    }
}

fn service_price(kind: &str, audience: &str) -> i64 {
    match (kind, audience) {
        ("consulting", "professional") => 200,
        ("consulting", "small_business") => 100,
        ("coaching", "professional") => 500,
        ("coaching", "entrepreneur") => 300,
        ("coaching", "small_business") => 200,
        ("done_for_you", "professional") => 2000,
        ("done_for_you", "entrepreneur") => 1500,
        ("done_for_you", "small_business") => 1000,
        _ => 150,
    }
}

fn service_channel(idea: &BlogIdea, target_audience: &str) -> ServiceChannel {
    let text = idea_text(idea, &idea.primary_keywords);
    let traffic = monthly_traffic(idea);

    let mut monthly = 0.0;
    let service_types: Vec<ServiceOpportunity> = SERVICE_TYPES
        .iter()
        .filter(|(_, indicators, ..)| indicators.iter().any(|i| text.contains(i)))
        .map(|(kind, _, conversion, value)| {
            monthly += traffic * conversion * value;
            ServiceOpportunity {
                kind,
                estimated_price: service_price(kind, target_audience),
                delivery_method: if *kind == "done_for_you" { "hybrid" } else { "remote" },
            }
        })
        .collect();

    let scalability = if service_types.is_empty() {
        "Limited scalability"
    } else if service_types.iter().any(|s| s.kind == "consulting") {
        "High scalability - Can leverage group programs and digital products"
    } else if service_types.iter().any(|s| s.kind == "coaching") {
        "Medium scalability - Can create courses and group programs"
    } else {
        "Low scalability - Consider productizing services"
    };

    ServiceChannel {
        score: (service_types.len() as i64 * 25 + 20).min(100),
        estimated_annual_revenue: (monthly * 12.0) as i64,
        service_types,
        scalability,
    }
}

fn lead_channel(idea: &BlogIdea) -> LeadChannel {
    let text = idea_text(idea, &idea.primary_keywords);
    let magnets: Vec<LeadMagnet> = LEAD_MAGNETS
        .iter()
        .filter(|(_, indicators)| indicators.iter().any(|i| text.contains(i)))
        .take(2)
        .map(|(kind, _)| LeadMagnet {
            kind,
            estimated_conversion_rate: if *kind == "calculator" { 0.05 } else { 0.08 },
            value_proposition: match *kind {
                "checklist" => format!(
                    "Download the complete {} checklist to ensure you don't miss any crucial steps",
                    idea.title
                ),
                "template" => format!("Get the exact {} template I use to save hours of work", idea.title),
                "ebook" => format!(
                    "Free guide: The complete {} handbook with actionable strategies",
                    idea.title
                ),
                "calculator" => format!(
                    "Use this {} calculator to get instant personalized results",
                    idea.title
                ),
                _ => format!("Exclusive {} resource to accelerate your results", idea.title),
            },
        })
        .collect();

    let nurturing_strategy = if magnets.is_empty() {
        "Direct sales"
    } else if magnets.iter().any(|m| m.kind == "calculator") {
        "Value demonstration"
    } else if magnets.iter().any(|m| matches!(m.kind, "template" | "checklist")) {
        "Implementation support"
    } else {
        "Educational series"
    };

    LeadChannel {
        score: (magnets.len() as i64 * 15 + 40).min(100),
        estimated_annual_revenue: (monthly_traffic(idea) * 0.05 * 25.0 * 12.0) as i64,
        lead_magnet_opportunities: magnets,
        nurturing_strategy,
    }
}

pub fn monetization_priority(score: i64, revenue: i64) -> &'static str {
    if score >= 80 && revenue >= 5000 {
        "High Priority - Immediate Implementation"
    } else if score >= 60 && revenue >= 2000 {
        "Medium Priority - Next 30 Days"
    } else if score >= 40 && revenue >= 1000 {
        "Low Priority - Next 90 Days"
    } else {
        "Research Phase - Validate Market"
    }
}

fn strategy(
    affiliate: &AffiliateChannel,
    product: &ProductChannel,
    service: &ServiceChannel,
    lead: &LeadChannel,
) -> MonetizationStrategy {
    let mut plan = MonetizationStrategy::default();
    if affiliate.score >= 60 {
        plan.immediate_actions.extend([
            "Research and join relevant affiliate programs",
            "Update content with affiliate links",
        ]);
    }
    if lead.score >= 50 {
        plan.immediate_actions.extend([
            "Create lead magnet based on content",
            "Set up email capture system",
        ]);
    }
    if product.score >= 60 {
        plan.thirty_day_plan.extend([
            "Develop digital product outline",
            "Create product landing page",
        ]);
    }
    if service.score >= 70 {
        plan.thirty_day_plan.extend([
            "Create service packages",
            "Set up consultation booking system",
        ]);
    }
    plan.ninety_day_plan = vec![
        "Launch first digital product",
        "Implement advanced affiliate strategies",
        "Develop premium service offerings",
        "Create sales funnels for each revenue stream",
    ];
    plan.long_term_strategy = vec![
        "Build product ecosystem around topic",
        "Develop recurring revenue streams",
        "Create high-ticket service offerings",
        "Build authority and premium pricing",
    ];
    plan
}

pub fn analyze_monetization(idea: &BlogIdea, target_audience: &str) -> MonetizationAnalysis {
    let affiliate = affiliate_channel(idea);
    let product = product_channel(idea);
    let service = service_channel(idea, target_audience);
    let lead = lead_channel(idea);

    let weighted = affiliate.score as f64 * AFFILIATE_WEIGHT
        + product.score as f64 * PRODUCT_WEIGHT
        + service.score as f64 * SERVICE_WEIGHT
        + lead.score as f64 * LEAD_WEIGHT;
    let overall = (weighted as i64).clamp(0, 100);

    let total = affiliate.estimated_annual_revenue
        + product.estimated_annual_revenue
        + service.estimated_annual_revenue
        + lead.estimated_annual_revenue;
    let revenue = (total as f64 * DIVERSIFICATION_FACTOR) as i64;

    MonetizationAnalysis {
        overall_monetization_score: overall,
        estimated_annual_revenue: revenue,
        monetization_priority: monetization_priority(overall, revenue),
        monetization_strategy: strategy(&affiliate, &product, &service, &lead),
        affiliate_opportunities: affiliate,
        digital_product_opportunities: product,
        service_opportunities: service,
        lead_generation_opportunities: lead,
        analysis_timestamp: Utc::now().to_rfc3339(),
    }
}

/// Attaches a monetization analysis to every idea and orders them by
/// monetization score, highest first. Ties keep their input order.
pub fn enhance_ideas_with_monetization(ideas: Vec<BlogIdea>, target_audience: &str) -> Vec<MonetizedIdea> {
    let mut enhanced: Vec<MonetizedIdea> = ideas
        .into_iter()
        .map(|idea| {
            let analysis = analyze_monetization(&idea, target_audience);
            MonetizedIdea {
                monetization_score: analysis.overall_monetization_score,
                revenue_potential: analysis.estimated_annual_revenue,
                monetization_priority: analysis.monetization_priority,
                monetization_analysis: analysis,
                idea,
            }
        })
        .collect();
    enhanced.sort_by(|a, b| b.monetization_score.cmp(&a.monetization_score));
    info!("Enhanced {} ideas with monetization analysis", enhanced.len());
    enhanced
}
