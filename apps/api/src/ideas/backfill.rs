//! Score backfill for stored ideas that were saved with zero scores.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ideas::scoring::score_idea;
use crate::storage::blog_ideas::{
    get_blog_ideas, list_generated_analyses, update_idea_scores, IdeaFilters,
};
use crate::storage::{StorageError, SupabaseClient};

/// Upper bound on ideas read per analysis.
const MAX_IDEAS_PER_ANALYSIS: usize = 1000;
const MAX_ANALYSES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnosis {
    NoIdeas {
        analysis_id: Uuid,
        status: &'static str,
        message: &'static str,
    },
    Report {
        analysis_id: Uuid,
        total_ideas: usize,
        ideas_missing_scores: usize,
        ideas_with_zero_scores: usize,
        score_coverage_percentage: f64,
        needs_fixing: bool,
        diagnosis_timestamp: String,
    },
}

impl Diagnosis {
    pub fn needs_fixing(&self) -> bool {
        matches!(self, Diagnosis::Report { needs_fixing: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixReport {
    pub analysis_id: Uuid,
    pub total_ideas: usize,
    pub ideas_fixed: usize,
    pub ideas_skipped: usize,
    pub ideas_failed: usize,
    pub fix_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixAllReport {
    pub total_analyses_found: usize,
    pub analyses_processed: usize,
    pub total_ideas_fixed: usize,
    pub fix_timestamp: String,
}

fn all_ideas() -> IdeaFilters {
    IdeaFilters {
        limit: Some(MAX_IDEAS_PER_ANALYSIS),
        ..Default::default()
    }
}

pub async fn diagnose_analysis(
    db: &SupabaseClient,
    analysis_id: Uuid,
) -> Result<Diagnosis, StorageError> {
    let ideas = get_blog_ideas(db, analysis_id, &all_ideas()).await?;
    if ideas.is_empty() {
        return Ok(Diagnosis::NoIdeas {
            analysis_id,
            status: "no_ideas",
            message: "No blog ideas found for this analysis",
        });
    }

    let total = ideas.len();
    let missing = ideas.iter().filter(|i| i.missing_scores()).count();
    let zero = ideas.iter().filter(|i| i.overall_quality_score == 0).count();
    let coverage = (total - missing) as f64 / total as f64 * 100.0;

    if missing > 0 {
        warn!("Analysis {analysis_id} has {missing}/{total} ideas with missing scores");
    } else {
        info!("Analysis {analysis_id} has all scores present");
    }

    Ok(Diagnosis::Report {
        analysis_id,
        total_ideas: total,
        ideas_missing_scores: missing,
        ideas_with_zero_scores: zero,
        score_coverage_percentage: (coverage * 10.0).round() / 10.0,
        needs_fixing: missing > 0,
        diagnosis_timestamp: Utc::now().to_rfc3339(),
    })
}

/// Rescores every idea whose overall score is zero. Ideas that already have
/// an overall score are left alone.
pub async fn fix_missing_scores(
    db: &SupabaseClient,
    analysis_id: Uuid,
) -> Result<FixReport, StorageError> {
    let ideas = get_blog_ideas(db, analysis_id, &all_ideas()).await?;
    let mut report = FixReport {
        analysis_id,
        total_ideas: ideas.len(),
        ideas_fixed: 0,
        ideas_skipped: 0,
        ideas_failed: 0,
        fix_timestamp: String::new(),
    };

    for idea in &ideas {
        if idea.overall_quality_score > 0 {
            report.ideas_skipped += 1;
            continue;
        }
        let Some(id) = idea.id.as_deref() else {
            report.ideas_failed += 1;
            continue;
        };
        let scores = score_idea(idea);
        match update_idea_scores(db, id, &scores).await {
            Ok(()) => {
                info!(
                    "Calculated scores for '{}': overall={}",
                    idea.title, scores.overall_quality_score
                );
                report.ideas_fixed += 1;
            }
            Err(e) => {
                warn!("Failed to update scores for idea {id}: {e}");
                report.ideas_failed += 1;
            }
        }
    }

    report.fix_timestamp = Utc::now().to_rfc3339();
    info!(
        "Fixed scores for {} ideas (skipped {})",
        report.ideas_fixed, report.ideas_skipped
    );
    Ok(report)
}

/// Runs the backfill over every analysis with stored generation results.
pub async fn fix_all_user_analyses(db: &SupabaseClient) -> Result<FixAllReport, StorageError> {
    let analyses = list_generated_analyses(db, MAX_ANALYSES).await?;
    let mut processed = 0;
    let mut fixed = 0;

    for analysis_id in &analyses {
        let diagnosis = match diagnose_analysis(db, *analysis_id).await {
            Ok(d) => d,
            Err(e) => {
                warn!("Failed to diagnose analysis {analysis_id}: {e}");
                continue;
            }
        };
        if !diagnosis.needs_fixing() {
            continue;
        }
        match fix_missing_scores(db, *analysis_id).await {
            Ok(report) => {
                processed += 1;
                fixed += report.ideas_fixed;
            }
            Err(e) => warn!("Failed to fix analysis {analysis_id}: {e}"),
        }
    }

    Ok(FixAllReport {
        total_analyses_found: analyses.len(),
        analyses_processed: processed,
        total_ideas_fixed: fixed,
        fix_timestamp: Utc::now().to_rfc3339(),
    })
}
