//! Placeholder sections used when no trends data can be fetched. Numbers are
//! fixed so downstream consumers always see a fully populated structure.

use serde_json::{json, Value};

use crate::trends::analyzer::timing_recommendations;
use crate::trends::models::{
    ActionableInsight, CountryHotspot, GeographicInsights, MainTopicAnalysis, MonthInterest,
    PeakPrediction, RelatedQueriesInsights, RisingQuery, SeasonalPatterns, StateHotspot, TopQuery,
    TrendDirection, TrendsAnalysis,
};
use crate::trends::month_name;

pub fn main_analysis(topic: &str) -> MainTopicAnalysis {
    MainTopicAnalysis {
        topic: topic.to_string(),
        current_interest: 65,
        average_interest: 60,
        peak_interest: 85,
        trend_direction: TrendDirection::Stable,
        momentum_percentage: 5.0,
        volatility: 15.0,
        growth_potential: "moderate",
        recommendation: format!("Focus on long-tail keywords related to {topic}"),
        data_points: 0,
        analysis_success: false,
        fallback_used: true,
    }
}

pub fn geographic_analysis(topic: &str) -> GeographicInsights {
    let country = |name: &str, score, size, level| CountryHotspot {
        country: name.to_string(),
        interest_score: score,
        market_size: size,
        opportunity_level: level,
    };
    let state = |name: &str, score| StateHotspot {
        state: name.to_string(),
        interest_score: score,
        market_potential: "high",
    };
    GeographicInsights {
        global_hotspots: vec![
            country("United States", 85, "Large", "high"),
            country("United Kingdom", 75, "Medium", "medium"),
            country("Canada", 70, "Medium", "medium"),
            country("Australia", 65, "Medium", "medium"),
        ],
        us_regional_hotspots: vec![
            state("California", 90),
            state("New York", 85),
            state("Texas", 80),
        ],
        geographic_strategy: vec![format!("Focus on English-speaking markets for {topic}")],
        content_localization_opportunities: vec![format!("Create US-specific {topic} content")],
        analysis_success: false,
        fallback_used: true,
        total_markets_analyzed: 4,
    }
}

/// Assumes a peak two months out and a trough six months after that.
pub fn seasonal_analysis(topic: &str, current_month: u32) -> SeasonalPatterns {
    let peak = (current_month + 1) % 12 + 1;
    let low = (peak + 5) % 12 + 1;
    SeasonalPatterns {
        has_seasonal_pattern: true,
        seasonal_volatility: 0.25,
        peak_months: vec![MonthInterest {
            month: month_name(peak),
            month_number: peak,
            average_interest: 85.0,
            is_upcoming: Some(true),
        }],
        low_months: vec![MonthInterest {
            month: month_name(low),
            month_number: low,
            average_interest: 45.0,
            is_upcoming: None,
        }],
        next_peak_prediction: PeakPrediction {
            month: month_name(peak),
            month_number: peak,
            months_away: 2,
            preparation_timeline: "Start content creation now".to_string(),
            expected_interest: 85.0,
        },
        content_calendar_recommendations: vec![format!(
            "Prepare {topic} content for {} peak",
            month_name(peak)
        )],
        analysis_success: false,
        fallback_used: true,
        data_points: 0,
        topics_analyzed: 0,
        main_topic_analyzed: false,
        subtopics_analyzed: 0,
        topics_breakdown: Vec::new(),
        aggregation_method: "fallback",
    }
}

pub fn related_queries(topic: &str) -> RelatedQueriesInsights {
    let top = |query: String, score, opportunity, intent, content_type| TopQuery {
        query,
        interest_score: score,
        content_opportunity: opportunity,
        search_intent: intent,
        content_type_suggestion: content_type,
    };
    let rising = |query: String, growth: &str, content_type, urgency| RisingQuery {
        query,
        growth: growth.to_string(),
        opportunity_level: "high",
        recommended_content_type: content_type,
        urgency,
    };
    RelatedQueriesInsights {
        top_related_queries: vec![
            top(format!("best {topic}"), 85, "high", "commercial", "comparison"),
            top(format!("how to {topic}"), 80, "high", "informational", "tutorial"),
            top(format!("{topic} guide"), 75, "medium", "informational", "guide"),
        ],
        rising_queries: vec![
            rising(format!("{topic} 2025"), "+150%", "trend_analysis", "medium"),
            rising(format!("AI {topic}"), "+200%", "how_to_guide", "high"),
        ],
        keyword_expansion_opportunities: vec![
            format!("{topic} tips"),
            format!("{topic} strategies"),
            format!("{topic} tools"),
        ],
        content_gap_analysis: vec![format!("Limited content around beginner {topic} guides")],
        analysis_success: false,
        fallback_used: true,
        total_queries_found: 5,
    }
}

fn setup_insight() -> ActionableInsight {
    ActionableInsight {
        kind: "system",
        priority: "low",
        title: "Connect a Trends Source for Enhanced Analysis".to_string(),
        description: "Live trends data not available - using fallback data".to_string(),
        action: "Configure a Google Trends data source for real interest data".to_string(),
        impact: "More accurate trend analysis",
        timeframe: "setup".to_string(),
    }
}

/// The complete fallback result. `source_available` records whether a source
/// was configured but failed.
pub fn fallback_analysis(
    topic: &str,
    focus_area: &str,
    trending_topics: Vec<Value>,
    current_month: u32,
    source_available: bool,
    timestamp: String,
) -> TrendsAnalysis {
    let main = main_analysis(topic);
    let seasonal = seasonal_analysis(topic, current_month);
    let timing = timing_recommendations(&main, &seasonal);
    TrendsAnalysis {
        pytrends_enhanced: false,
        analysis_timestamp: timestamp,
        topic_analyzed: topic.to_string(),
        focus_area: focus_area.to_string(),
        main_topic_analysis: main,
        subtopic_analysis: None,
        geographic_insights: geographic_analysis(topic),
        seasonal_patterns: seasonal,
        related_queries_insights: related_queries(topic),
        enhanced_trending_topics: trending_topics,
        competitive_intelligence: json!({}),
        timing_recommendations: timing,
        actionable_insights: vec![setup_insight()],
        fallback_mode: true,
        pytrends_available: source_available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_peak_two_months_out_wraps_year() {
        let seasonal = seasonal_analysis("yoga", 11);
        assert_eq!(seasonal.peak_months[0].month_number, 1);
        assert_eq!(seasonal.peak_months[0].month, "Jan");
        assert_eq!(seasonal.low_months[0].month_number, 7);

        let seasonal = seasonal_analysis("yoga", 10);
        assert_eq!(seasonal.next_peak_prediction.month_number, 12);
        assert_eq!(seasonal.low_months[0].month_number, 6);
    }

    #[test]
    fn test_fallback_timing_uses_seasonal_calendar() {
        let analysis = fallback_analysis("yoga", "general", Vec::new(), 3, false, "t".into());
        assert!(analysis.timing_recommendations.immediate_actions.is_empty());
        assert_eq!(analysis.timing_recommendations.seasonal_calendar.len(), 1);
        assert_eq!(analysis.timing_recommendations.seasonal_calendar[0].month, "May");
    }
}
