//! Import files for keyword tools and the combined integration bundle.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::keywords::enhancer::{
    enhance_keywords_with_modifiers, generate_tool_specific_keywords, normalize_base_keywords,
    suggest_content_type, EnhancedKeywords, DEFAULT_MAX_COMBINATIONS,
};
use crate::keywords::MODIFIER_CATEGORIES;

pub const CSV_HEADER: [&str; 5] = ["Keyword", "Category", "Intent", "Use Case", "Content Type"];

const EXPORT_TOOLS: [&str; 3] = ["ahrefs", "semrush", "moz"];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_line(fields: &[&str]) -> String {
    fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",")
}

/// One row per base keyword and modifier, every field quoted.
pub fn create_csv_export(base_keywords: &[String]) -> String {
    let mut lines = vec![csv_line(&CSV_HEADER)];
    for base in normalize_base_keywords(base_keywords) {
        for category in MODIFIER_CATEGORIES {
            for modifier in category.modifiers {
                let keyword = format!("{base} {modifier}");
                let content_type = suggest_content_type(&keyword, category.intent);
                lines.push(csv_line(&[
                    keyword.as_str(),
                    category.key,
                    category.intent.as_str(),
                    category.use_case,
                    content_type,
                ]));
            }
        }
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationBundle {
    pub enhanced_keywords: EnhancedKeywords,
    pub tool_specific_exports: BTreeMap<&'static str, Vec<String>>,
    pub csv_export: String,
    /// Tool keywords not already present in the caller's list.
    pub total_new_opportunities: usize,
}

pub fn integrate_with_existing_system(
    base_keywords: &[String],
    existing_keywords: &[String],
) -> IntegrationBundle {
    let enhanced = enhance_keywords_with_modifiers(
        base_keywords,
        "professional",
        DEFAULT_MAX_COMBINATIONS,
    );

    let exports: BTreeMap<&'static str, Vec<String>> = EXPORT_TOOLS
        .iter()
        .map(|tool| (*tool, generate_tool_specific_keywords(tool, base_keywords)))
        .collect();

    let existing: HashSet<String> = existing_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .collect();
    let total_new_opportunities = exports
        .get("ahrefs")
        .map(|keywords| {
            keywords
                .iter()
                .filter(|k| !existing.contains(&k.to_lowercase()))
                .count()
        })
        .unwrap_or(0);

    IntegrationBundle {
        enhanced_keywords: enhanced,
        tool_specific_exports: exports,
        csv_export: create_csv_export(base_keywords),
        total_new_opportunities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal reader for the quoted dialect written above.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        text.lines()
            .map(|line| {
                let mut fields = Vec::new();
                let mut field = String::new();
                let mut in_quotes = false;
                let mut chars = line.chars().peekable();
                while let Some(c) = chars.next() {
                    match (c, in_quotes) {
                        ('"', true) if chars.peek() == Some(&'"') => {
                            field.push('"');
                            chars.next();
                        }
                        ('"', _) => in_quotes = !in_quotes,
                        (',', false) => fields.push(std::mem::take(&mut field)),
                        _ => field.push(c),
                    }
                }
                fields.push(field);
                fields
            })
            .collect()
    }

    #[test]
    fn test_csv_reads_back_row_for_row() {
        let base = vec!["smart \"home\" security".to_string(), "fitness".to_string()];
        let csv = create_csv_export(&base);
        let rows = parse_csv(&csv);

        let modifiers: usize = MODIFIER_CATEGORIES.iter().map(|c| c.modifiers.len()).sum();
        assert_eq!(rows.len(), 1 + 2 * modifiers);
        assert_eq!(rows[0], CSV_HEADER);
        assert!(rows.iter().all(|r| r.len() == 5));
        assert_eq!(rows[1][0], "smart \"home\" security control-panel");
        assert_eq!(rows[1][1], "security_tools");
        assert_eq!(rows[1][2], "commercial");
    }

    #[test]
    fn test_csv_lines_are_newline_joined() {
        let csv = create_csv_export(&["yoga".to_string()]);
        assert!(csv.starts_with("\"Keyword\",\"Category\",\"Intent\",\"Use Case\",\"Content Type\"\n"));
        assert!(!csv.ends_with('\n'));
        assert!(csv.contains("\"yoga coaching\",\"services\",\"commercial\""));
    }

    #[test]
    fn test_integration_counts_only_new_keywords() {
        let base = vec!["yoga".to_string()];
        let fresh = integrate_with_existing_system(&base, &[]);
        let ahrefs = &fresh.tool_specific_exports["ahrefs"];
        assert_eq!(fresh.total_new_opportunities, ahrefs.len());
        assert_eq!(fresh.tool_specific_exports.len(), 3);
        assert_eq!(fresh.tool_specific_exports["moz"], *ahrefs);

        let existing = vec!["Yoga Smart".to_string(), "best yoga kit".to_string()];
        let partial = integrate_with_existing_system(&base, &existing);
        assert_eq!(partial.total_new_opportunities, ahrefs.len() - 2);
        assert!(partial.enhanced_keywords.total_opportunities > 0);
    }
}
