// Display views over stored trending topics and content opportunities: the
// scores and labels the selection screens show next to each row.

use serde_json::{json, Value};

use crate::storage::decode_json_column;

fn level_points(level: Option<&str>, high: f64, low: f64) -> f64 {
    match level.map(str::to_lowercase).as_deref() {
        Some("high") => high,
        Some("low") => low,
        _ => 20.0,
    }
}

/// Weighted mix of viral potential, search volume and (inverted) competition.
pub fn opportunity_score(viral: f64, search_volume: Option<&str>, competition: Option<&str>) -> i64 {
    let volume = level_points(search_volume, 30.0, 10.0);
    let openness = level_points(competition, 10.0, 30.0);
    (viral * 0.4 + volume * 0.3 + openness * 0.3).round() as i64
}

pub fn priority_level(viral: f64) -> &'static str {
    if viral >= 80.0 {
        "High"
    } else if viral >= 60.0 {
        "Medium"
    } else {
        "Low"
    }
}

/// A stored topic row with its decoded `additional_data` and derived scores.
pub fn format_topic(row: &Value) -> Value {
    if !row.is_object() {
        return row.clone();
    }
    let mut topic = row.clone();
    let viral = row.get("viral_potential").and_then(Value::as_f64).unwrap_or(0.0);
    let volume = row.get("search_volume").and_then(Value::as_str);
    let competition = row.get("competition").and_then(Value::as_str);
    let quick_win = viral >= 60.0 && competition.is_some_and(|c| c.eq_ignore_ascii_case("low"));

    topic["additional_data"] = decode_json_column(row.get("additional_data"), json!({}));
    topic["keywords"] = decode_json_column(row.get("keywords"), json!([]));
    topic["opportunity_score"] = json!(opportunity_score(viral, volume, competition));
    topic["is_high_potential"] = json!(viral >= 80.0);
    topic["is_quick_win"] = json!(quick_win);
    topic["priority_level"] = json!(priority_level(viral));
    topic
}

pub fn difficulty_level(difficulty: i64) -> (&'static str, &'static str) {
    match difficulty {
        d if d >= 80 => ("Expert", "#ff4444"),
        d if d >= 60 => ("Advanced", "#ff8800"),
        d if d >= 40 => ("Intermediate", "#ffaa00"),
        _ => ("Beginner", "#44aa44"),
    }
}

/// `how_to_guide` becomes `How To Guide`.
pub fn format_display(format: &str) -> String {
    format
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_opportunity(row: &Value) -> Value {
    if !row.is_object() {
        return row.clone();
    }
    let mut opportunity = row.clone();
    let extra = decode_json_column(row.get("additional_data"), json!({}));
    let difficulty = row.get("difficulty").and_then(Value::as_i64).unwrap_or(50);
    let format = row.get("format").and_then(Value::as_str).unwrap_or("unknown");
    let (level, color) = difficulty_level(difficulty);
    let time_investment = extra
        .get("time_investment")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    opportunity["format_display"] = json!(format_display(format));
    opportunity["difficulty_level"] = json!(level);
    opportunity["difficulty_color"] = json!(color);
    opportunity["time_investment"] = json!(time_investment);
    opportunity["additional_data"] = extra;
    opportunity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_scores() {
        let topic = format_topic(&json!({
            "title": "Smart locks",
            "viral_potential": 85,
            "search_volume": "High",
            "competition": "Low",
            "keywords": "[\"smart lock\"]",
            "additional_data": "{\"description\": \"Keyless entry\"}"
        }));
        assert_eq!(topic["opportunity_score"], 52);
        assert_eq!(topic["is_high_potential"], true);
        assert_eq!(topic["is_quick_win"], true);
        assert_eq!(topic["priority_level"], "High");
        assert_eq!(topic["keywords"][0], "smart lock");
        assert_eq!(topic["additional_data"]["description"], "Keyless entry");
    }

    #[test]
    fn test_unknown_levels_count_as_medium() {
        assert_eq!(opportunity_score(50.0, Some("unknown"), None), 32);
        assert_eq!(opportunity_score(70.0, Some("medium"), Some("HIGH")), 37);
        assert_eq!(priority_level(60.0), "Medium");
        assert_eq!(priority_level(59.9), "Low");
    }

    #[test]
    fn test_opportunity_view() {
        let opp = format_opportunity(&json!({
            "title": "ROI calculator",
            "format": "interactive_tool",
            "difficulty": 60,
            "additional_data": {"time_investment": "3-4 weeks"}
        }));
        assert_eq!(opp["format_display"], "Interactive Tool");
        assert_eq!(opp["difficulty_level"], "Advanced");
        assert_eq!(opp["difficulty_color"], "#ff8800");
        assert_eq!(opp["time_investment"], "3-4 weeks");

        let bare = format_opportunity(&json!({"difficulty": 10}));
        assert_eq!(bare["difficulty_level"], "Beginner");
        assert_eq!(bare["time_investment"], "Unknown");
    }
}
