// Blog idea pipeline: LLM generation from a stored trend analysis, validation
// and canonical scoring, planning artifacts, monetization scoring, and the
// score backfill for ideas saved without scores.

pub mod backfill;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod monetization;
pub mod planning;
pub mod prompts;
pub mod scoring;
pub mod validation;
