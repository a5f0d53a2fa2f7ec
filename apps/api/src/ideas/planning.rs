//! Portfolio-level summaries built from a ranked idea set: the content
//! calendar, strategic insights and success predictions stored next to the
//! ideas in `content_calendar` and `blog_generation_results`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ideas::models::BlogIdea;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishingStrategy {
    pub recommended_frequency: &'static str,
    pub estimated_timeline: &'static str,
    pub total_ideas_in_calendar: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrioritySchedule {
    pub immediate_priority_ideas: Vec<String>,
    pub quick_win_ideas: Vec<String>,
    pub long_term_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalFocus {
    pub q1_focus: &'static str,
    pub q2_focus: &'static str,
    pub q3_focus: &'static str,
    pub q4_focus: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRequirements {
    pub total_estimated_hours: i64,
    pub average_hours_per_post: f64,
    pub recommended_team_size: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentCalendar {
    pub publishing_strategy: PublishingStrategy,
    pub priority_scheduling: PrioritySchedule,
    pub seasonal_optimization: SeasonalFocus,
    pub content_series_opportunities: Vec<String>,
    pub format_distribution: BTreeMap<String, usize>,
    pub estimated_resource_requirements: ResourceRequirements,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QualityTiers {
    pub excellent: usize,
    pub high: usize,
    pub good: usize,
    pub needs_work: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub average_quality_score: f64,
    pub quality_tier_distribution: QualityTiers,
    pub recommendations: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentStrategyInsights {
    pub format_distribution: BTreeMap<String, usize>,
    pub recommended_mix: &'static str,
    pub content_pillars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessImpact {
    pub high_business_impact_count: usize,
    pub lead_generation_potential: &'static str,
    pub authority_building_score: f64,
    pub competitive_advantage: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategicInsights {
    pub overall_quality_assessment: QualityAssessment,
    pub content_strategy_insights: ContentStrategyInsights,
    pub implementation_recommendations: Vec<&'static str>,
    pub business_impact_analysis: BusinessImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficPrediction {
    pub expected_increase: String,
    pub timeline: &'static str,
    pub high_impact_ideas: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementPrediction {
    pub viral_potential_ideas: usize,
    pub expected_social_shares: i64,
    pub engagement_rate_estimate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessForecast {
    pub lead_generation_potential: &'static str,
    pub authority_building_timeline: &'static str,
    pub roi_expectation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub implementation_risk_level: &'static str,
    pub content_quality_risk: &'static str,
    pub market_fit_confidence: f64,
    pub recommended_monitoring: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessPredictions {
    pub overall_success_probability: f64,
    pub traffic_growth_prediction: TrafficPrediction,
    pub engagement_predictions: EngagementPrediction,
    pub business_impact_forecast: BusinessForecast,
    pub risk_assessment: RiskAssessment,
    pub optimization_opportunities: Vec<&'static str>,
}

fn format_distribution(ideas: &[BlogIdea]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for idea in ideas {
        *counts.entry(idea.content_format.clone()).or_insert(0) += 1;
    }
    counts
}

/// Writing hours at 500 words an hour, scaled by difficulty, plus 3 hours
/// of research and editing.
pub fn estimate_creation_hours(idea: &BlogIdea) -> i64 {
    let multiplier = match idea.difficulty_level.as_str() {
        "beginner" => 1.0,
        "advanced" => 1.6,
        "expert" => 2.0,
        _ => 1.3,
    };
    (idea.estimated_word_count as f64 / 500.0 * multiplier + 3.0) as i64
}

/// `ideas` must already be ranked; the first entries are scheduled first.
pub fn build_content_calendar(ideas: &[BlogIdea], topic: &str) -> ContentCalendar {
    let total = ideas.len();
    let (frequency, timeline) = match total {
        0..=10 => ("1-2 posts per week", "6-8 weeks"),
        11..=20 => ("2-3 posts per week", "8-12 weeks"),
        _ => ("3-4 posts per week", "12-16 weeks"),
    };

    let titles = |filter: &dyn Fn(&BlogIdea) -> bool| -> Vec<String> {
        ideas
            .iter()
            .filter(|i| filter(i))
            .take(3)
            .map(|i| i.title.clone())
            .collect()
    };

    let hours: i64 = ideas.iter().map(estimate_creation_hours).sum();
    let topic = if topic.trim().is_empty() { "Topic" } else { topic };

    ContentCalendar {
        publishing_strategy: PublishingStrategy {
            recommended_frequency: frequency,
            estimated_timeline: timeline,
            total_ideas_in_calendar: total,
        },
        priority_scheduling: PrioritySchedule {
            immediate_priority_ideas: titles(&|i: &BlogIdea| i.overall_quality_score >= 80),
            quick_win_ideas: titles(&|i: &BlogIdea| {
                i.difficulty_level == "beginner" && i.overall_quality_score >= 70
            }),
            long_term_ideas: ideas.iter().skip(10).map(|i| i.title.clone()).collect(),
        },
        seasonal_optimization: SeasonalFocus {
            q1_focus: "Educational and foundational content",
            q2_focus: "Implementation and case studies",
            q3_focus: "Advanced strategies and optimization",
            q4_focus: "Year-end reviews and planning",
        },
        content_series_opportunities: vec![
            format!("Complete {topic} Guide Series"),
            "Tool Reviews and Comparisons Series".to_string(),
            "Case Study Deep-Dive Series".to_string(),
        ],
        format_distribution: format_distribution(ideas),
        estimated_resource_requirements: ResourceRequirements {
            total_estimated_hours: hours,
            average_hours_per_post: if total == 0 {
                0.0
            } else {
                hours as f64 / total as f64
            },
            recommended_team_size: if total <= 15 {
                "1-2 content creators"
            } else {
                "2-3 content creators"
            },
        },
    }
}

fn average_quality(ideas: &[BlogIdea]) -> f64 {
    if ideas.is_empty() {
        return 0.0;
    }
    ideas.iter().map(|i| i.overall_quality_score as f64).sum::<f64>() / ideas.len() as f64
}

pub fn quality_tiers(ideas: &[BlogIdea]) -> QualityTiers {
    let mut tiers = QualityTiers::default();
    for idea in ideas {
        match idea.overall_quality_score {
            s if s >= 85 => tiers.excellent += 1,
            75..=84 => tiers.high += 1,
            65..=74 => tiers.good += 1,
            _ => tiers.needs_work += 1,
        }
    }
    tiers
}

fn quality_recommendations(tiers: &QualityTiers, avg: f64) -> Vec<&'static str> {
    let mut recs = vec![if avg >= 80.0 {
        "Excellent quality foundation - proceed with confidence"
    } else if avg >= 70.0 {
        "Good quality base - minor optimizations recommended"
    } else {
        "Consider regenerating or optimizing lower-scoring ideas"
    }];
    if tiers.excellent >= 5 {
        recs.push("Strong set of high-impact ideas for immediate implementation");
    }
    if tiers.needs_work > tiers.excellent {
        recs.push("Focus on improving lower-quality ideas before implementation");
    }
    recs
}

pub fn build_strategic_insights(ideas: &[BlogIdea]) -> StrategicInsights {
    let avg = average_quality(ideas);
    let tiers = quality_tiers(ideas);

    let mut pillars: Vec<String> = Vec::new();
    for kw in ideas.iter().flat_map(|i| i.primary_keywords.iter().take(2)) {
        if pillars.len() == 5 {
            break;
        }
        if !pillars.contains(kw) {
            pillars.push(kw.clone());
        }
    }

    StrategicInsights {
        overall_quality_assessment: QualityAssessment {
            average_quality_score: round1(avg),
            quality_tier_distribution: tiers,
            recommendations: quality_recommendations(&tiers, avg),
        },
        content_strategy_insights: ContentStrategyInsights {
            format_distribution: format_distribution(ideas),
            recommended_mix: "Balanced approach with emphasis on how-to guides and listicles",
            content_pillars: pillars,
        },
        implementation_recommendations: vec![
            "Start with highest-scoring ideas for immediate impact",
            "Focus on beginner-level content for quick wins",
            "Develop content series around top keywords",
            "Create comprehensive guides for authority building",
            "Optimize for featured snippets and SEO",
        ],
        business_impact_analysis: BusinessImpact {
            high_business_impact_count: ideas
                .iter()
                .filter(|i| i.business_impact_score >= 80)
                .count(),
            lead_generation_potential: if avg >= 75.0 { "High" } else { "Medium" },
            authority_building_score: round1(avg * 0.9),
            competitive_advantage: "Strong content foundation with diverse formats",
        },
    }
}

pub fn calculate_success_predictions(ideas: &[BlogIdea]) -> SuccessPredictions {
    let total = ideas.len();
    let count = |f: fn(&BlogIdea) -> i64| ideas.iter().filter(|i| f(i) >= 80).count();
    let high_quality = count(|i: &BlogIdea| i.overall_quality_score);
    let viral = count(|i: &BlogIdea| i.viral_potential_score);
    let seo = count(|i: &BlogIdea| i.seo_optimization_score);

    let share = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
    let quality_factor = share(high_quality);
    let viral_factor = share(viral);
    let seo_factor = share(seo);

    let probability = (quality_factor * 0.4 + viral_factor * 0.3 + seo_factor * 0.3) * 100.0;

    SuccessPredictions {
        overall_success_probability: round1(probability),
        traffic_growth_prediction: TrafficPrediction {
            expected_increase: format!(
                "{}% increase in organic traffic",
                (seo_factor * 100.0).round() as i64
            ),
            timeline: "3-6 months for full impact",
            high_impact_ideas: high_quality,
        },
        engagement_predictions: EngagementPrediction {
            viral_potential_ideas: viral,
            expected_social_shares: (viral_factor * total as f64 * 50.0).round() as i64,
            engagement_rate_estimate: format!("{}%", round1(viral_factor * 8.0)),
        },
        business_impact_forecast: BusinessForecast {
            lead_generation_potential: if quality_factor >= 0.6 { "High" } else { "Medium" },
            authority_building_timeline: "6-12 months",
            roi_expectation: if probability >= 70.0 {
                "3:1 within 12 months"
            } else {
                "2:1 within 18 months"
            },
        },
        risk_assessment: RiskAssessment {
            implementation_risk_level: if quality_factor >= 0.7 { "Low" } else { "Medium" },
            content_quality_risk: if high_quality >= 10 { "Low" } else { "Medium" },
            market_fit_confidence: round1((quality_factor + viral_factor) * 50.0),
            recommended_monitoring: vec![
                "Track organic traffic growth monthly",
                "Monitor social engagement rates",
                "Measure lead generation conversion",
                "Assess brand authority metrics",
            ],
        },
        optimization_opportunities: if probability < 80.0 {
            vec![
                "Focus on SEO optimization for lower-scoring ideas",
                "Develop content series from high-performing topics",
                "Create pillar content around top keywords",
                "Implement structured data for featured snippets",
            ]
        } else {
            vec![
                "Maintain current quality standards",
                "Scale content production gradually",
                "Develop advanced content formats",
                "Build thought leadership positioning",
            ]
        },
    }
}
