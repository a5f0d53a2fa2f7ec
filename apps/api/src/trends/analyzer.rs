//! Trend analysis over a `TrendsSource`: momentum, geography, seasonality,
//! related queries, then insights and timing derived from those sections.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::storage::trend_analyses::TrendAnalysisInput;
use crate::trends::fallback;
use crate::trends::models::{
    ActionableInsight, CountryHotspot, GeographicInsights, MainTopicAnalysis, MonthInterest,
    PeakPrediction, RelatedQueriesInsights, RisingQuery, SeasonalPatterns, SeasonalSlot,
    StateHotspot, SubtopicAnalysis, SubtopicResult, TimedAction, TimingRecommendations,
    TopicBreakdown, TopQuery, TrendDirection, TrendsAnalysis,
};
use crate::trends::{
    month_name, months_until, InterestPoint, RegionInterest, RelatedQueries, TrendsError,
    TrendsSource,
};

/// Momentum compares the mean of the last four samples with the four before.
const MOMENTUM_WINDOW: usize = 4;
const SEASONAL_VOLATILITY_THRESHOLD: f64 = 0.15;
/// Interest assumed for a month no topic has data for.
const DEFAULT_MONTH_INTEREST: f64 = 50.0;
const MAX_COUNTRIES: usize = 10;
const MAX_STATES: usize = 5;
const MAX_QUERIES: usize = 10;
const GOOD_SUBTOPIC_INTEREST: i64 = 30;

const LARGE_MARKETS: &[&str] = &["United States", "India", "Brazil", "Indonesia", "China"];
const MEDIUM_MARKETS: &[&str] = &[
    "United Kingdom", "Germany", "France", "Japan", "Canada", "Australia",
];

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation; zero below two samples.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn tier(score: i64) -> &'static str {
    if score >= 80 {
        "high"
    } else if score >= 50 {
        "medium"
    } else {
        "low"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interest over time
// ────────────────────────────────────────────────────────────────────────────

/// Falls back when the series is empty.
pub fn analyze_interest(topic: &str, points: &[InterestPoint]) -> MainTopicAnalysis {
    if points.is_empty() {
        warn!("No interest data for topic: {topic}");
        return fallback::main_analysis(topic);
    }
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let current = values[values.len() - 1] as i64;
    let average = mean(&values) as i64;
    let peak = values.iter().cloned().fold(f64::MIN, f64::max) as i64;

    let (momentum, direction) = if values.len() >= 2 * MOMENTUM_WINDOW {
        let n = values.len();
        let recent = mean(&values[n - MOMENTUM_WINDOW..]) as i64;
        let previous = mean(&values[n - 2 * MOMENTUM_WINDOW..n - MOMENTUM_WINDOW]) as i64;
        let momentum = (recent - previous) as f64 / previous.max(1) as f64 * 100.0;
        (momentum, TrendDirection::from_momentum(momentum))
    } else {
        (0.0, TrendDirection::InsufficientData)
    };

    let recommendation = if current >= 70 && direction.is_rising() {
        "Excellent opportunity - high interest with positive momentum"
    } else if current >= 50 {
        "Good opportunity - moderate to high interest"
    } else if direction.is_rising() {
        "Emerging opportunity - growing interest trend"
    } else {
        "Consider trending subtopics or related keywords"
    };

    MainTopicAnalysis {
        topic: topic.to_string(),
        current_interest: current,
        average_interest: average,
        peak_interest: peak,
        trend_direction: direction,
        momentum_percentage: round1(momentum),
        volatility: round1(sample_std(&values)),
        growth_potential: if momentum > 10.0 {
            "high"
        } else if momentum > 0.0 {
            "moderate"
        } else {
            "low"
        },
        recommendation: recommendation.to_string(),
        data_points: values.len(),
        analysis_success: true,
        fallback_used: false,
    }
}

/// First subtopic with the highest current interest.
fn best_subtopic(results: &[SubtopicResult]) -> Option<SubtopicResult> {
    results
        .iter()
        .fold(None::<&SubtopicResult>, |best, r| match best {
            Some(b) if b.analysis.current_interest >= r.analysis.current_interest => Some(b),
            _ => Some(r),
        })
        .cloned()
}

// ────────────────────────────────────────────────────────────────────────────
// Geography
// ────────────────────────────────────────────────────────────────────────────

pub fn market_size(country: &str) -> &'static str {
    if LARGE_MARKETS.contains(&country) {
        "Large"
    } else if MEDIUM_MARKETS.contains(&country) {
        "Medium"
    } else {
        "Small"
    }
}

fn top_regions(mut regions: Vec<RegionInterest>, limit: usize) -> Vec<RegionInterest> {
    regions.sort_by(|a, b| b.value.total_cmp(&a.value));
    regions.truncate(limit);
    regions.retain(|r| r.value > 0.0);
    regions
}

fn geographic_strategy(hotspots: &[CountryHotspot]) -> Vec<String> {
    let Some(top) = hotspots.first() else {
        return vec!["Focus on general English-speaking markets".to_string()];
    };
    let mut strategies = vec![format!(
        "Prioritize {} market with highest interest ({})",
        top.country, top.interest_score
    )];
    let high: Vec<&str> = hotspots
        .iter()
        .filter(|h| h.opportunity_level == "high")
        .map(|h| h.country.as_str())
        .take(3)
        .collect();
    if high.len() > 1 {
        strategies.push(format!("Expand to high-opportunity markets: {}", high.join(", ")));
    }
    strategies
}

fn localization_opportunities(hotspots: &[CountryHotspot]) -> Vec<String> {
    if hotspots.is_empty() {
        return vec!["Create region-neutral content".to_string()];
    }
    hotspots
        .iter()
        .take(3)
        .map(|h| match h.country.as_str() {
            "United States" => "Create US-specific examples and case studies".to_string(),
            "United Kingdom" => {
                "Adapt terminology for UK audience (e.g., 'behaviour' vs 'behavior')".to_string()
            }
            c @ ("Canada" | "Australia") => {
                format!("Include {c}-specific regulations and market conditions")
            }
            c => format!("Research {c}-specific market dynamics"),
        })
        .collect()
}

/// Falls back when no country shows any interest.
pub fn geographic_insights(
    topic: &str,
    countries: Vec<RegionInterest>,
    states: Vec<RegionInterest>,
) -> GeographicInsights {
    let global: Vec<CountryHotspot> = top_regions(countries, MAX_COUNTRIES)
        .into_iter()
        .map(|r| {
            let score = r.value as i64;
            CountryHotspot {
                market_size: market_size(&r.name),
                opportunity_level: tier(score),
                country: r.name,
                interest_score: score,
            }
        })
        .collect();
    if global.is_empty() {
        warn!("No geographic data for topic: {topic}");
        return fallback::geographic_analysis(topic);
    }

    let regional: Vec<StateHotspot> = top_regions(states, MAX_STATES)
        .into_iter()
        .map(|r| {
            let score = r.value as i64;
            StateHotspot {
                state: r.name,
                interest_score: score,
                market_potential: tier(score),
            }
        })
        .collect();

    GeographicInsights {
        geographic_strategy: geographic_strategy(&global),
        content_localization_opportunities: localization_opportunities(&global),
        total_markets_analyzed: global.len(),
        global_hotspots: global,
        us_regional_hotspots: regional,
        analysis_success: true,
        fallback_used: false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Seasonality
// ────────────────────────────────────────────────────────────────────────────

/// Mean interest per calendar month (1..=12) for the months present.
pub fn monthly_averages(points: &[InterestPoint]) -> BTreeMap<u32, f64> {
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for p in points {
        buckets.entry(p.date.month()).or_default().push(p.value);
    }
    buckets.into_iter().map(|(m, v)| (m, mean(&v))).collect()
}

/// One series feeding the seasonal aggregate.
pub struct SeasonalSeries<'a> {
    pub topic: &'a str,
    pub kind: &'static str,
    pub points: &'a [InterestPoint],
}

fn calendar_recommendations(averages: &[(u32, f64)], current_month: u32) -> Vec<String> {
    let (Some(peak), Some(low)) = (averages.first(), averages.last()) else {
        return vec!["Create consistent monthly content schedule".to_string()];
    };
    let mut recommendations = vec![
        format!("Peak content push in {} when interest is highest", month_name(peak.0)),
        format!("Use {} for content preparation and strategy planning", month_name(low.0)),
    ];
    let overall = mean(&averages.iter().map(|(_, v)| *v).collect::<Vec<_>>());
    for i in 1..=3 {
        let month = (current_month + i - 1) % 12 + 1;
        let above = averages
            .iter()
            .any(|(m, v)| *m == month && *v > overall);
        if above {
            recommendations.push(format!(
                "Increase content volume in {} (above average interest)",
                month_name(month)
            ));
        }
    }
    recommendations
}

/// Combines per-topic monthly averages, each weighted by its sample count.
/// Falls back when no series has data.
pub fn seasonal_patterns(
    topic: &str,
    series: &[SeasonalSeries<'_>],
    current_month: u32,
) -> SeasonalPatterns {
    let with_data: Vec<&SeasonalSeries<'_>> =
        series.iter().filter(|s| !s.points.is_empty()).collect();
    if with_data.is_empty() {
        warn!("No seasonal data available for {topic} or its subtopics");
        return fallback::seasonal_analysis(topic, current_month);
    }

    let mut weighted: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for s in &with_data {
        let weight = s.points.len() as f64;
        for (month, avg) in monthly_averages(s.points) {
            let slot = weighted.entry(month).or_insert((0.0, 0.0));
            slot.0 += avg * weight;
            slot.1 += weight;
        }
    }
    let mut averages: Vec<(u32, f64)> = (1..=12)
        .map(|m| {
            let avg = weighted
                .get(&m)
                .map_or(DEFAULT_MONTH_INTEREST, |(sum, w)| sum / w);
            (m, avg)
        })
        .collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1));

    let values: Vec<f64> = averages.iter().map(|(_, v)| *v).collect();
    let m = mean(&values);
    let volatility = if m > 0.0 { population_std(&values) / m } else { 0.0 };

    let peak_months: Vec<MonthInterest> = averages[..3]
        .iter()
        .map(|(month, v)| MonthInterest {
            month: month_name(*month),
            month_number: *month,
            average_interest: round1(*v),
            is_upcoming: Some(*month >= current_month),
        })
        .collect();
    let low_months: Vec<MonthInterest> = averages[averages.len() - 3..]
        .iter()
        .map(|(month, v)| MonthInterest {
            month: month_name(*month),
            month_number: *month,
            average_interest: round1(*v),
            is_upcoming: None,
        })
        .collect();

    let (peak_month, peak_value) = averages[0];
    let months_away = months_until(current_month, peak_month);
    let breakdown: Vec<TopicBreakdown> = with_data
        .iter()
        .map(|s| TopicBreakdown {
            topic: s.topic.to_string(),
            kind: s.kind,
            data_points: s.points.len(),
        })
        .collect();

    SeasonalPatterns {
        has_seasonal_pattern: volatility > SEASONAL_VOLATILITY_THRESHOLD,
        seasonal_volatility: round2(volatility),
        peak_months,
        low_months,
        next_peak_prediction: PeakPrediction {
            month: month_name(peak_month),
            month_number: peak_month,
            months_away,
            preparation_timeline: format!(
                "Start content creation {} months before peak",
                months_away.saturating_sub(2).max(1)
            ),
            expected_interest: round1(peak_value),
        },
        content_calendar_recommendations: calendar_recommendations(&averages, current_month),
        analysis_success: true,
        fallback_used: false,
        data_points: breakdown.iter().map(|b| b.data_points).sum(),
        topics_analyzed: breakdown.len(),
        main_topic_analyzed: breakdown.iter().any(|b| b.kind == "main"),
        subtopics_analyzed: breakdown.iter().filter(|b| b.kind == "subtopic").count(),
        topics_breakdown: breakdown,
        aggregation_method: "weighted_combined_analysis",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Related queries
// ────────────────────────────────────────────────────────────────────────────

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

pub fn query_opportunity(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if contains_any(&q, &["how to", "guide", "tutorial", "tips"])
        || contains_any(&q, &["best", "top", "review", "comparison"])
    {
        "high"
    } else {
        "medium"
    }
}

pub fn search_intent(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if contains_any(&q, &["buy", "price", "cost", "purchase", "cheap"]) {
        "commercial"
    } else if contains_any(&q, &["how to", "what is", "guide", "tutorial"]) {
        "informational"
    } else if contains_any(&q, &["best", "top", "review", "vs", "compare"]) {
        "commercial"
    } else {
        "informational"
    }
}

pub fn query_content_type(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if q.contains("how to") {
        "tutorial"
    } else if contains_any(&q, &["best", "top"]) {
        "listicle"
    } else if contains_any(&q, &["vs", "compare"]) {
        "comparison"
    } else if q.contains("guide") {
        "guide"
    } else {
        "article"
    }
}

/// `Breakout` or more than +200% is very high; more than +100% is high.
pub fn rising_opportunity(growth: &str) -> &'static str {
    if growth.to_lowercase().contains("breakout") {
        return "very_high";
    }
    if !growth.contains('+') {
        return "medium";
    }
    let digits: String = growth.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u64>().unwrap_or(0) {
        n if n > 200 => "very_high",
        n if n > 100 => "high",
        _ => "medium",
    }
}

fn keyword_expansions(top: &[TopQuery]) -> Vec<String> {
    top.iter()
        .take(5)
        .flat_map(|q| {
            [
                format!("{} for beginners", q.query),
                format!("{} 2025", q.query),
                format!("best {}", q.query),
                format!("{} guide", q.query),
            ]
        })
        .take(10)
        .collect()
}

fn query_gaps(top: &[TopQuery], rising: &[RisingQuery]) -> Vec<String> {
    let informational = top.iter().filter(|q| q.search_intent == "informational").count();
    let commercial = top.iter().filter(|q| q.search_intent == "commercial").count();
    let mut gaps = Vec::new();
    if informational > commercial {
        gaps.push("High demand for educational content - create more how-to guides".to_string());
    } else if commercial > informational {
        gaps.push("Strong commercial intent - focus on comparison and review content".to_string());
    }
    if !rising.is_empty() {
        gaps.push(format!(
            "Emerging trends detected - capitalize on {} rising queries",
            rising.len()
        ));
    }
    gaps
}

/// Falls back when the source returned no queries at all.
pub fn related_insights(topic: &str, related: RelatedQueries) -> RelatedQueriesInsights {
    if related.top.is_empty() && related.rising.is_empty() {
        warn!("No related queries for topic: {topic}");
        return fallback::related_queries(topic);
    }

    let top: Vec<TopQuery> = related
        .top
        .into_iter()
        .take(MAX_QUERIES)
        .map(|row| TopQuery {
            content_opportunity: query_opportunity(&row.query),
            search_intent: search_intent(&row.query),
            content_type_suggestion: query_content_type(&row.query),
            interest_score: row.value,
            query: row.query,
        })
        .collect();
    let rising: Vec<RisingQuery> = related
        .rising
        .into_iter()
        .take(MAX_QUERIES)
        .map(|row| RisingQuery {
            opportunity_level: rising_opportunity(&row.growth),
            recommended_content_type: query_content_type(&row.query),
            urgency: if row.growth.to_lowercase().contains("breakout") {
                "high"
            } else {
                "medium"
            },
            query: row.query,
            growth: row.growth,
        })
        .collect();

    RelatedQueriesInsights {
        keyword_expansion_opportunities: keyword_expansions(&top),
        content_gap_analysis: query_gaps(&top, &rising),
        total_queries_found: top.len() + rising.len(),
        top_related_queries: top,
        rising_queries: rising,
        analysis_success: true,
        fallback_used: false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Insights and timing
// ────────────────────────────────────────────────────────────────────────────

pub fn actionable_insights(
    main: &MainTopicAnalysis,
    subtopics: Option<&SubtopicAnalysis>,
    geographic: &GeographicInsights,
    seasonal: &SeasonalPatterns,
    related: &RelatedQueriesInsights,
) -> Vec<ActionableInsight> {
    let mut insights = Vec::new();

    if main.trend_direction.is_rising() {
        insights.push(ActionableInsight {
            kind: "opportunity",
            priority: "high",
            title: "Capitalize on Rising Trend".to_string(),
            description: format!(
                "Search interest is {} with {}% momentum",
                main.trend_direction.as_str(),
                main.momentum_percentage
            ),
            action: "Create content within 2 weeks to ride the trend".to_string(),
            impact: "High organic traffic potential",
            timeframe: "immediate".to_string(),
        });
    }

    if let Some(analysis) = subtopics.filter(|s| !s.subtopic_results.is_empty()) {
        if let Some(best) = analysis
            .best_performing_subtopic
            .as_ref()
            .filter(|b| b.analysis.current_interest > main.current_interest)
        {
            insights.push(ActionableInsight {
                kind: "strategy",
                priority: "high",
                title: "Focus on High-Performing Sub-Topic".to_string(),
                description: format!(
                    "{} shows higher interest ({}) than main topic",
                    best.subtopic, best.analysis.current_interest
                ),
                action: format!("Create content specifically targeting '{}'", best.subtopic),
                impact: "Better targeting and higher engagement",
                timeframe: "immediate".to_string(),
            });
        }
        let good = analysis
            .subtopic_results
            .iter()
            .filter(|s| s.analysis.current_interest > GOOD_SUBTOPIC_INTEREST)
            .count();
        if good > 1 {
            insights.push(ActionableInsight {
                kind: "strategy",
                priority: "medium",
                title: "Multi-Subtopic Content Strategy".to_string(),
                description: format!("Found {good} sub-topics with good interest levels"),
                action: "Create a comprehensive guide covering multiple related sub-topics"
                    .to_string(),
                impact: "Broader content coverage and more keyword opportunities",
                timeframe: "2-3 weeks".to_string(),
            });
        }
    }

    if let Some(top) = geographic.global_hotspots.first() {
        insights.push(ActionableInsight {
            kind: "targeting",
            priority: "medium",
            title: format!("Target {} Market", top.country),
            description: format!("Highest interest score: {}", top.interest_score),
            action: format!("Create content tailored for {} audience", top.country),
            impact: "Geographic-specific traffic boost",
            timeframe: "1-2 weeks".to_string(),
        });
    }

    let next = &seasonal.next_peak_prediction;
    if seasonal.has_seasonal_pattern && next.months_away <= 3 {
        insights.push(ActionableInsight {
            kind: "timing",
            priority: "high",
            title: "Prepare for Seasonal Peak".to_string(),
            description: format!(
                "Peak season in {} ({} months away)",
                next.month, next.months_away
            ),
            action: next.preparation_timeline.clone(),
            impact: "Maximize seasonal traffic opportunity",
            timeframe: format!("{} months", next.months_away),
        });
    }

    let breakout: Vec<&str> = related
        .rising_queries
        .iter()
        .filter(|q| q.urgency == "high")
        .map(|q| q.query.as_str())
        .collect();
    if !breakout.is_empty() {
        insights.push(ActionableInsight {
            kind: "content",
            priority: "high",
            title: "Target Breakout Queries".to_string(),
            description: format!("Found {} rapidly growing search queries", breakout.len()),
            action: format!(
                "Create content around: {}",
                breakout.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            ),
            impact: "Capture emerging search traffic",
            timeframe: "1 week".to_string(),
        });
    }

    insights
}

pub fn timing_recommendations(
    main: &MainTopicAnalysis,
    seasonal: &SeasonalPatterns,
) -> TimingRecommendations {
    let mut timing = TimingRecommendations::default();

    if main.momentum_percentage > 10.0 {
        timing.immediate_actions.push(TimedAction {
            action: "Publish trending content within 48-72 hours".to_string(),
            reason: format!("Strong positive momentum ({}%)", main.momentum_percentage),
            priority: "high",
        });
    }

    if seasonal.has_seasonal_pattern {
        let next = &seasonal.next_peak_prediction;
        if next.months_away <= 3 {
            timing.short_term_planning.push(TimedAction {
                action: format!("Build a content series ahead of the {} peak", next.month),
                reason: format!("Seasonal peak is {} months away", next.months_away),
                priority: "medium",
            });
        }
        for peak in seasonal.peak_months.iter().take(2) {
            timing.seasonal_calendar.push(SeasonalSlot {
                month: peak.month,
                preparation_start: format!("Start content creation 2 months before {}", peak.month),
                content_focus: "Capitalize on seasonal interest spike",
                expected_boost: format!("{}% above average", peak.average_interest),
            });
        }
    }

    if main.growth_potential == "low" {
        timing.long_term_strategy.push(TimedAction {
            action: "Broaden coverage with related subtopics and evergreen content".to_string(),
            reason: format!("Interest is {}", main.trend_direction.as_str()),
            priority: "low",
        });
    }

    timing
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

async fn live_analysis(
    source: &dyn TrendsSource,
    topic: &str,
    focus_area: &str,
    trending_topics: Vec<Value>,
    subtopics: &[String],
    current_month: u32,
    timestamp: String,
) -> Result<TrendsAnalysis, TrendsError> {
    info!("Analyzing main topic trends for '{topic}'");
    let main_points = source.interest_over_time(topic).await?;
    let main = analyze_interest(topic, &main_points);

    let mut subtopic_points = Vec::with_capacity(subtopics.len());
    for subtopic in subtopics {
        subtopic_points.push(source.interest_over_time(subtopic).await?);
    }
    let subtopic_analysis = (!subtopics.is_empty()).then(|| {
        let results: Vec<SubtopicResult> = subtopics
            .iter()
            .zip(&subtopic_points)
            .map(|(s, points)| SubtopicResult {
                subtopic: s.clone(),
                analysis: analyze_interest(s, points),
            })
            .collect();
        SubtopicAnalysis {
            total_subtopics: subtopics.len(),
            best_performing_subtopic: best_subtopic(&results),
            subtopic_results: results,
        }
    });

    info!("Analyzing geographic patterns for '{topic}'");
    let countries = source.interest_by_region(topic).await?;
    let states = match source.interest_by_us_state(topic).await {
        Ok(states) => states,
        Err(e) => {
            warn!("US state interest unavailable for '{topic}': {e}");
            Vec::new()
        }
    };
    let geographic = geographic_insights(topic, countries, states);

    let mut series = vec![SeasonalSeries {
        topic,
        kind: "main",
        points: &main_points,
    }];
    series.extend(
        subtopics
            .iter()
            .zip(&subtopic_points)
            .map(|(s, points)| SeasonalSeries {
                topic: s,
                kind: "subtopic",
                points,
            }),
    );
    let seasonal = seasonal_patterns(topic, &series, current_month);

    info!("Analyzing related queries for '{topic}'");
    let related = related_insights(topic, source.related_queries(topic).await?);

    let insights = actionable_insights(
        &main,
        subtopic_analysis.as_ref(),
        &geographic,
        &seasonal,
        &related,
    );
    let timing = timing_recommendations(&main, &seasonal);

    Ok(TrendsAnalysis {
        pytrends_enhanced: true,
        analysis_timestamp: timestamp,
        topic_analyzed: topic.to_string(),
        focus_area: focus_area.to_string(),
        main_topic_analysis: main,
        subtopic_analysis,
        geographic_insights: geographic,
        seasonal_patterns: seasonal,
        related_queries_insights: related,
        enhanced_trending_topics: trending_topics,
        competitive_intelligence: Value::Object(Default::default()),
        timing_recommendations: timing,
        actionable_insights: insights,
        fallback_mode: false,
        pytrends_available: true,
    })
}

/// Runs the analysis at a fixed month. Never fails: a missing source or any
/// source error yields the fallback structure.
pub async fn analyze_at(
    source: Option<&dyn TrendsSource>,
    topic: &str,
    trending_topics: Vec<Value>,
    focus_area: &str,
    subtopics: &[String],
    current_month: u32,
) -> TrendsAnalysis {
    let timestamp = Utc::now().to_rfc3339();
    let Some(source) = source else {
        warn!("No trends source configured, returning fallback data for '{topic}'");
        return fallback::fallback_analysis(
            topic,
            focus_area,
            trending_topics,
            current_month,
            false,
            timestamp,
        );
    };

    match live_analysis(
        source,
        topic,
        focus_area,
        trending_topics.clone(),
        subtopics,
        current_month,
        timestamp.clone(),
    )
    .await
    {
        Ok(analysis) => {
            info!(
                "Trends analysis for '{topic}' complete with {} insights",
                analysis.actionable_insights.len()
            );
            analysis
        }
        Err(e) => {
            warn!("Trends analysis failed for '{topic}': {e}");
            fallback::fallback_analysis(
                topic,
                focus_area,
                trending_topics,
                current_month,
                true,
                timestamp,
            )
        }
    }
}

pub async fn comprehensive_trends_analysis(
    source: Option<&dyn TrendsSource>,
    topic: &str,
    trending_topics: Vec<Value>,
    focus_area: &str,
    subtopics: &[String],
) -> TrendsAnalysis {
    analyze_at(
        source,
        topic,
        trending_topics,
        focus_area,
        subtopics,
        Utc::now().month(),
    )
    .await
}

/// Attaches a trends analysis to a submitted trend analysis and bumps its
/// confidence: +15 for live data, +5 for fallback, capped at 95. Subtopics
/// default to the `trend` names of the trending topics.
pub async fn enrich_trend_analysis(
    source: Option<&dyn TrendsSource>,
    input: &mut TrendAnalysisInput,
    subtopics: &[String],
) -> Result<TrendsAnalysis, serde_json::Error> {
    let derived: Vec<String>;
    let subtopics = if subtopics.is_empty() {
        derived = input
            .trending_topics
            .iter()
            .filter_map(|t| t.get("trend").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        &derived[..]
    } else {
        subtopics
    };

    let focus = if input.focus_area.is_empty() {
        "general"
    } else {
        input.focus_area.as_str()
    };
    let analysis = comprehensive_trends_analysis(
        source,
        &input.topic,
        input.trending_topics.clone(),
        focus,
        subtopics,
    )
    .await;

    let bump = if analysis.pytrends_enhanced { 15.0 } else { 5.0 };
    input.confidence_score = Some((input.confidence_score.unwrap_or(80.0) + bump).min(95.0));
    input.pytrends_analysis = Some(serde_json::to_value(&analysis)?);
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::{RisingQueryRow, TopQueryRow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;

    /// Weekly samples across a year, peaking in December.
    fn yearly_series(base: f64) -> Vec<InterestPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..52)
            .map(|week| {
                let date = start + chrono::Duration::weeks(week);
                let value = if date.month() == 12 { base + 40.0 } else { base };
                InterestPoint { date, value }
            })
            .collect()
    }

    struct StaticSource {
        fail_related: bool,
    }

    #[async_trait]
    impl TrendsSource for StaticSource {
        async fn interest_over_time(&self, keyword: &str) -> Result<Vec<InterestPoint>, TrendsError> {
            Ok(match keyword {
                "yoga" => yearly_series(40.0),
                "hot yoga" => yearly_series(55.0),
                _ => Vec::new(),
            })
        }

        async fn interest_by_region(&self, _: &str) -> Result<Vec<RegionInterest>, TrendsError> {
            Ok(vec![
                RegionInterest { name: "Canada".into(), value: 70.0 },
                RegionInterest { name: "United States".into(), value: 100.0 },
                RegionInterest { name: "India".into(), value: 85.0 },
                RegionInterest { name: "Chad".into(), value: 0.0 },
            ])
        }

        async fn interest_by_us_state(&self, _: &str) -> Result<Vec<RegionInterest>, TrendsError> {
            Err(TrendsError::RateLimited)
        }

        async fn related_queries(&self, _: &str) -> Result<RelatedQueries, TrendsError> {
            if self.fail_related {
                return Err(TrendsError::Request("boom".into()));
            }
            Ok(RelatedQueries {
                top: vec![
                    TopQueryRow { query: "how to do yoga".into(), value: 100 },
                    TopQueryRow { query: "yoga mat price".into(), value: 60 },
                    TopQueryRow { query: "yoga guide".into(), value: 40 },
                ],
                rising: vec![
                    RisingQueryRow { query: "wall yoga".into(), growth: "Breakout".into() },
                    RisingQueryRow { query: "yoga for runners".into(), growth: "+150%".into() },
                ],
            })
        }
    }

    fn points(values: &[f64]) -> Vec<InterestPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| InterestPoint {
                date: start + chrono::Duration::weeks(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_momentum_thresholds() {
        let rising = analyze_interest("t", &points(&[50.0, 50.0, 50.0, 50.0, 60.0, 60.0, 60.0, 60.0]));
        assert_eq!(rising.momentum_percentage, 20.0);
        assert_eq!(rising.trend_direction, TrendDirection::StronglyRising);
        assert_eq!(rising.growth_potential, "high");

        let stable = analyze_interest("t", &points(&[50.0, 50.0, 50.0, 50.0, 52.0, 52.0, 52.0, 52.0]));
        assert_eq!(stable.trend_direction, TrendDirection::Stable);

        let short = analyze_interest("t", &points(&[10.0, 20.0, 30.0]));
        assert_eq!(short.trend_direction, TrendDirection::InsufficientData);
        assert_eq!(short.current_interest, 30);
        assert_eq!(short.peak_interest, 30);
        assert_eq!(short.average_interest, 20);
    }

    #[test]
    fn test_empty_series_uses_fallback_section() {
        let analysis = analyze_interest("yoga", &[]);
        assert!(analysis.fallback_used);
        assert_eq!(analysis.current_interest, 65);
    }

    #[test]
    fn test_seasonal_detects_december_peak() {
        let main = yearly_series(40.0);
        let series = [SeasonalSeries { topic: "yoga", kind: "main", points: &main }];
        let seasonal = seasonal_patterns("yoga", &series, 10);
        assert_eq!(seasonal.peak_months[0].month_number, 12);
        assert_eq!(seasonal.next_peak_prediction.months_away, 2);
        assert!(seasonal.has_seasonal_pattern);
        assert_eq!(seasonal.peak_months.len(), 3);
        assert_eq!(seasonal.low_months.len(), 3);
        assert!(seasonal.main_topic_analyzed);
        assert_eq!(seasonal.data_points, 52);
    }

    #[test]
    fn test_seasonal_peak_in_current_month_is_a_year_away() {
        let main = yearly_series(40.0);
        let series = [SeasonalSeries { topic: "yoga", kind: "main", points: &main }];
        let seasonal = seasonal_patterns("yoga", &series, 12);
        assert_eq!(seasonal.next_peak_prediction.months_away, 12);
        assert_eq!(
            seasonal.next_peak_prediction.preparation_timeline,
            "Start content creation 10 months before peak"
        );
    }

    #[test]
    fn test_rising_opportunity_levels() {
        assert_eq!(rising_opportunity("Breakout"), "very_high");
        assert_eq!(rising_opportunity("+250%"), "very_high");
        assert_eq!(rising_opportunity("+150%"), "high");
        assert_eq!(rising_opportunity("+90%"), "medium");
        assert_eq!(rising_opportunity("300"), "medium");
    }

    #[test]
    fn test_query_classification() {
        assert_eq!(search_intent("cheap yoga mat"), "commercial");
        assert_eq!(search_intent("how to yoga"), "informational");
        assert_eq!(search_intent("yoga vs pilates"), "commercial");
        assert_eq!(query_content_type("yoga vs pilates"), "comparison");
        assert_eq!(query_content_type("top yoga poses"), "listicle");
        assert_eq!(query_opportunity("yoga mat"), "medium");
    }

    #[tokio::test]
    async fn test_fallback_without_source_has_every_section() {
        let analysis = analyze_at(None, "anything at all", vec![json!({"trend": "x"})], "general", &[], 6).await;
        assert!(!analysis.pytrends_enhanced);
        assert!(analysis.fallback_mode);
        assert!(!analysis.pytrends_available);

        let body = serde_json::to_value(&analysis).unwrap();
        for key in [
            "pytrends_enhanced",
            "analysis_timestamp",
            "topic_analyzed",
            "main_topic_analysis",
            "subtopic_analysis",
            "geographic_insights",
            "seasonal_patterns",
            "related_queries_insights",
            "enhanced_trending_topics",
            "competitive_intelligence",
            "timing_recommendations",
            "actionable_insights",
            "fallback_mode",
            "pytrends_available",
        ] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["geographic_insights"]["global_hotspots"].as_array().unwrap().len(), 4);
        assert_eq!(body["enhanced_trending_topics"][0]["trend"], "x");
        assert_eq!(body["actionable_insights"][0]["type"], "system");
    }

    #[tokio::test]
    async fn test_live_analysis_with_static_source() {
        let source = StaticSource { fail_related: false };
        let subtopics = vec!["hot yoga".to_string(), "aerial yoga".to_string()];
        let analysis = analyze_at(Some(&source as &dyn TrendsSource), "yoga", Vec::new(), "general", &subtopics, 10).await;

        assert!(analysis.pytrends_enhanced);
        assert!(!analysis.fallback_mode);

        let geo = &analysis.geographic_insights;
        assert_eq!(geo.global_hotspots[0].country, "United States");
        assert_eq!(geo.global_hotspots[0].market_size, "Large");
        assert_eq!(geo.global_hotspots.len(), 3);
        assert!(geo.us_regional_hotspots.is_empty());

        let subs = analysis.subtopic_analysis.as_ref().unwrap();
        assert_eq!(subs.total_subtopics, 2);
        assert_eq!(subs.best_performing_subtopic.as_ref().unwrap().subtopic, "hot yoga");
        // "aerial yoga" has no data and does not count towards the seasonal aggregate
        assert_eq!(analysis.seasonal_patterns.subtopics_analyzed, 1);

        let titles: Vec<&str> = analysis.actionable_insights.iter().map(|i| i.title.as_str()).collect();
        assert!(titles.contains(&"Focus on High-Performing Sub-Topic"));
        assert!(titles.contains(&"Target United States Market"));
        assert!(titles.contains(&"Target Breakout Queries"));
        assert!(titles.contains(&"Prepare for Seasonal Peak"));

        let related = &analysis.related_queries_insights;
        assert_eq!(related.total_queries_found, 5);
        assert_eq!(related.rising_queries[0].urgency, "high");
        assert_eq!(related.keyword_expansion_opportunities.len(), 10);
    }

    #[tokio::test]
    async fn test_source_error_falls_back_but_reports_availability() {
        let source = StaticSource { fail_related: true };
        let analysis = analyze_at(Some(&source as &dyn TrendsSource), "yoga", Vec::new(), "general", &[], 3).await;
        assert!(!analysis.pytrends_enhanced);
        assert!(analysis.fallback_mode);
        assert!(analysis.pytrends_available);
    }

    #[tokio::test]
    async fn test_enrich_bumps_confidence_and_derives_subtopics() {
        let mut input = TrendAnalysisInput {
            topic: "yoga".into(),
            trending_topics: vec![json!({"trend": "hot yoga"})],
            confidence_score: Some(85.0),
            ..Default::default()
        };
        let source = StaticSource { fail_related: false };
        let analysis = enrich_trend_analysis(Some(&source as &dyn TrendsSource), &mut input, &[]).await.unwrap();
        assert_eq!(input.confidence_score, Some(95.0));
        assert_eq!(analysis.subtopic_analysis.unwrap().total_subtopics, 1);
        assert_eq!(
            input.pytrends_analysis.as_ref().unwrap()["pytrends_enhanced"],
            json!(true)
        );

        let mut plain = TrendAnalysisInput {
            topic: "yoga".into(),
            ..Default::default()
        };
        enrich_trend_analysis(None, &mut plain, &[]).await.unwrap();
        assert_eq!(plain.confidence_score, Some(85.0));
    }
}
