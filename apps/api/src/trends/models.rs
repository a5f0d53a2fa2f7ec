use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    StronglyRising,
    Rising,
    Stable,
    Declining,
    StronglyDeclining,
    InsufficientData,
}

impl TrendDirection {
    /// Thresholds are exclusive: exactly 15% momentum is `rising`.
    pub fn from_momentum(momentum: f64) -> Self {
        if momentum > 15.0 {
            TrendDirection::StronglyRising
        } else if momentum > 5.0 {
            TrendDirection::Rising
        } else if momentum > -5.0 {
            TrendDirection::Stable
        } else if momentum > -15.0 {
            TrendDirection::Declining
        } else {
            TrendDirection::StronglyDeclining
        }
    }

    pub fn is_rising(self) -> bool {
        matches!(self, TrendDirection::Rising | TrendDirection::StronglyRising)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::StronglyRising => "strongly_rising",
            TrendDirection::Rising => "rising",
            TrendDirection::Stable => "stable",
            TrendDirection::Declining => "declining",
            TrendDirection::StronglyDeclining => "strongly_declining",
            TrendDirection::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainTopicAnalysis {
    pub topic: String,
    pub current_interest: i64,
    pub average_interest: i64,
    pub peak_interest: i64,
    pub trend_direction: TrendDirection,
    pub momentum_percentage: f64,
    pub volatility: f64,
    pub growth_potential: &'static str,
    pub recommendation: String,
    pub data_points: usize,
    pub analysis_success: bool,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtopicResult {
    pub subtopic: String,
    pub analysis: MainTopicAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtopicAnalysis {
    pub total_subtopics: usize,
    pub subtopic_results: Vec<SubtopicResult>,
    pub best_performing_subtopic: Option<SubtopicResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryHotspot {
    pub country: String,
    pub interest_score: i64,
    pub market_size: &'static str,
    pub opportunity_level: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateHotspot {
    pub state: String,
    pub interest_score: i64,
    pub market_potential: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicInsights {
    pub global_hotspots: Vec<CountryHotspot>,
    pub us_regional_hotspots: Vec<StateHotspot>,
    pub geographic_strategy: Vec<String>,
    pub content_localization_opportunities: Vec<String>,
    pub analysis_success: bool,
    pub fallback_used: bool,
    pub total_markets_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthInterest {
    pub month: &'static str,
    pub month_number: u32,
    pub average_interest: f64,
    /// Only set on peak months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_upcoming: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPrediction {
    pub month: &'static str,
    pub month_number: u32,
    pub months_away: u32,
    pub preparation_timeline: String,
    pub expected_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicBreakdown {
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalPatterns {
    pub has_seasonal_pattern: bool,
    pub seasonal_volatility: f64,
    pub peak_months: Vec<MonthInterest>,
    pub low_months: Vec<MonthInterest>,
    pub next_peak_prediction: PeakPrediction,
    pub content_calendar_recommendations: Vec<String>,
    pub analysis_success: bool,
    pub fallback_used: bool,
    pub data_points: usize,
    pub topics_analyzed: usize,
    pub main_topic_analyzed: bool,
    pub subtopics_analyzed: usize,
    pub topics_breakdown: Vec<TopicBreakdown>,
    pub aggregation_method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopQuery {
    pub query: String,
    pub interest_score: i64,
    pub content_opportunity: &'static str,
    pub search_intent: &'static str,
    pub content_type_suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RisingQuery {
    pub query: String,
    pub growth: String,
    pub opportunity_level: &'static str,
    pub recommended_content_type: &'static str,
    pub urgency: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedQueriesInsights {
    pub top_related_queries: Vec<TopQuery>,
    pub rising_queries: Vec<RisingQuery>,
    pub keyword_expansion_opportunities: Vec<String>,
    pub content_gap_analysis: Vec<String>,
    pub analysis_success: bool,
    pub fallback_used: bool,
    pub total_queries_found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionableInsight {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub priority: &'static str,
    pub title: String,
    pub description: String,
    pub action: String,
    pub impact: &'static str,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedAction {
    pub action: String,
    pub reason: String,
    pub priority: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalSlot {
    pub month: &'static str,
    pub preparation_start: String,
    pub content_focus: &'static str,
    pub expected_boost: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingRecommendations {
    pub immediate_actions: Vec<TimedAction>,
    pub short_term_planning: Vec<TimedAction>,
    pub long_term_strategy: Vec<TimedAction>,
    pub seasonal_calendar: Vec<SeasonalSlot>,
}

/// The full result. Fallback and live analyses share this shape, so every key
/// is present either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsAnalysis {
    pub pytrends_enhanced: bool,
    pub analysis_timestamp: String,
    pub topic_analyzed: String,
    pub focus_area: String,
    pub main_topic_analysis: MainTopicAnalysis,
    pub subtopic_analysis: Option<SubtopicAnalysis>,
    pub geographic_insights: GeographicInsights,
    pub seasonal_patterns: SeasonalPatterns,
    pub related_queries_insights: RelatedQueriesInsights,
    pub enhanced_trending_topics: Vec<Value>,
    pub competitive_intelligence: Value,
    pub timing_recommendations: TimingRecommendations,
    pub actionable_insights: Vec<ActionableInsight>,
    pub fallback_mode: bool,
    pub pytrends_available: bool,
}
