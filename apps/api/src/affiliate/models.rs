use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One affiliate program, either extracted from a search result or produced by
/// the mock network generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateProgram {
    pub id: String,
    pub network: String,
    pub program_name: String,
    pub description: String,
    /// Percent, 0 when unknown.
    pub commission_rate: f64,
    /// Flat amount in dollars, 0 when unknown.
    pub commission_amount: f64,
    pub cookie_duration: String,
    pub program_url: String,
    pub subtopic: String,
    pub approval_required: bool,
    pub promotional_materials: Vec<String>,
    /// 0.0..=1.0
    pub extraction_confidence: f64,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    /// md5 of network + name + url, set by de-duplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchSource {
    LinkupApi,
    Mock,
}

impl ResearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchSource::LinkupApi => "linkup_api",
            ResearchSource::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitabilityLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl ProfitabilityLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => ProfitabilityLevel::Excellent,
            50..=69 => ProfitabilityLevel::Good,
            30..=49 => ProfitabilityLevel::Moderate,
            _ => ProfitabilityLevel::Poor,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ProfitabilityLevel::Excellent => "Strong program variety with high commissions",
            ProfitabilityLevel::Good => "Decent program availability with moderate commissions",
            ProfitabilityLevel::Moderate => "Limited programs or lower commission rates",
            ProfitabilityLevel::Poor => "Few programs or very low commissions",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfitabilityLevel::Excellent => "excellent",
            ProfitabilityLevel::Good => "good",
            ProfitabilityLevel::Moderate => "moderate",
            ProfitabilityLevel::Poor => "poor",
        }
    }

    pub fn is_profitable(&self) -> bool {
        matches!(self, ProfitabilityLevel::Excellent | ProfitabilityLevel::Good)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityAnalysis {
    /// 0..=100
    pub score: u32,
    pub level: ProfitabilityLevel,
    pub reason: String,
    pub total_programs: usize,
    pub avg_commission_rate: f64,
    pub avg_commission_amount: f64,
    pub high_value_programs: usize,
    pub networks_represented: usize,
    pub subtopics_covered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtopicResult {
    pub subtopic: String,
    pub programs_found: usize,
    pub source: ResearchSource,
    pub programs: Vec<AffiliateProgram>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateResearch {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub programs: Vec<AffiliateProgram>,
    pub total_programs: usize,
    pub search_results: Vec<SubtopicResult>,
    pub profitability_analysis: ProfitabilityAnalysis,
    pub recommendations: Vec<String>,
    pub research_timestamp: DateTime<Utc>,
    /// `linkup_api` if at least one subtopic came from live search.
    pub source: ResearchSource,
}

/// Research as read back from storage: raw rows, with JSON-text columns decoded.
#[derive(Debug, Clone, Serialize)]
pub struct StoredResearch {
    pub session: Value,
    pub programs: Vec<Value>,
    pub analysis: Option<Value>,
}

impl StoredResearch {
    /// Rebuilds a profitability summary from the stored analysis row, falling back
    /// to the session's score columns when no analysis row exists.
    pub fn profitability(&self) -> ProfitabilityAnalysis {
        let source = self.analysis.as_ref().unwrap_or(&self.session);
        let score = source
            .get("profitability_score")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(100) as u32;
        let level = source
            .get("profitability_level")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_else(|| ProfitabilityLevel::from_score(score));
        let reason = source
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if self.analysis.is_some() {
                    "Analysis not available".to_string()
                } else {
                    "Based on stored analysis".to_string()
                }
            });
        let count = |key: &str, default: usize| {
            source
                .get(key)
                .and_then(Value::as_u64)
                .map(|v| v as usize)
                .unwrap_or(default)
        };
        let float = |key: &str| source.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        ProfitabilityAnalysis {
            score,
            level,
            reason,
            total_programs: count("total_programs", self.programs.len()),
            avg_commission_rate: float("avg_commission_rate"),
            avg_commission_amount: float("avg_commission_amount"),
            high_value_programs: count("high_value_programs", 0),
            networks_represented: count("networks_represented", 0),
            subtopics_covered: count("subtopics_covered", 0),
        }
    }

    pub fn subtopics(&self) -> Vec<String> {
        crate::storage::decode_json_column(self.session.get("subtopics"), Value::Array(vec![]))
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
