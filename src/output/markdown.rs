//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of the catalog:
//! overall counts, employment-type and skill breakdowns, and a table of the
//! most recently stored postings.

use crate::output::stats::{display_label, load_statistics, CatalogStatistics};
use crate::output::OutputResult;
use crate::storage::Storage;
use crate::JobRecord;
use chrono::Utc;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Number of postings listed in the summary table
pub const RECENT_JOBS_LIMIT: usize = 50;

/// A stored posting together with its company name
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub job: JobRecord,
    pub company: String,
}

/// Generates a markdown summary of the catalog and writes it to disk
///
/// # Arguments
///
/// * `storage` - The storage backend to summarize
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to query storage or write the file
pub fn generate_markdown_summary(storage: &dyn Storage, output_path: &Path) -> OutputResult<()> {
    let stats = load_statistics(storage)?;
    let rows = load_recent_rows(storage, RECENT_JOBS_LIMIT)?;
    let markdown = format_markdown_summary(&stats, &rows, &Utc::now().to_rfc3339());

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!(
        "Wrote catalog summary ({} recent jobs) to {}",
        rows.len(),
        output_path.display()
    );
    Ok(())
}

/// Loads recent postings and resolves each company name once
fn load_recent_rows(storage: &dyn Storage, limit: usize) -> OutputResult<Vec<SummaryRow>> {
    let mut names: HashMap<i64, String> = HashMap::new();
    let mut rows = Vec::new();

    for job in storage.list_recent_jobs(limit)? {
        let company = match names.get(&job.company_id) {
            Some(name) => name.clone(),
            None => {
                let name = storage.get_company(job.company_id)?.name;
                names.insert(job.company_id, name.clone());
                name
            }
        };
        rows.push(SummaryRow { job, company });
    }

    Ok(rows)
}

/// Formats catalog statistics and recent postings as markdown
///
/// # Arguments
///
/// * `stats` - Catalog statistics
/// * `rows` - Recent postings, newest first
/// * `generated_at` - Timestamp printed in the header
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(
    stats: &CatalogStatistics,
    rows: &[SummaryRow],
    generated_at: &str,
) -> String {
    let mut md = String::new();

    // Header with overall counts
    md.push_str("# Job Catalog Summary\n\n");
    md.push_str(&format!("- **Generated**: {}\n", generated_at));
    md.push_str(&format!("- **Total Jobs**: {}\n", stats.total_jobs));
    md.push_str(&format!(
        "- **Total Companies**: {}\n\n",
        stats.total_companies
    ));

    // Breakdown tables
    if !stats.jobs_by_employment_type.is_empty() {
        md.push_str("## Employment Types\n\n");
        md.push_str("| Type | Jobs |\n");
        md.push_str("|------|------|\n");
        for (employment_type, count) in &stats.jobs_by_employment_type {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(display_label(employment_type)),
                count
            ));
        }
        md.push('\n');
    }

    if !stats.top_skills.is_empty() {
        md.push_str("## Top Skills\n\n");
        md.push_str("| Skill | Jobs |\n");
        md.push_str("|-------|------|\n");
        for (skill, count) in &stats.top_skills {
            md.push_str(&format!("| {} | {} |\n", escape_cell(skill), count));
        }
        md.push('\n');
    }

    // Recent postings, newest first
    md.push_str("## Recent Jobs\n\n");
    if rows.is_empty() {
        md.push_str("No jobs stored yet.\n");
        return md;
    }

    md.push_str("| Company | Title | Location | Deadline | Skills |\n");
    md.push_str("|---------|-------|----------|----------|--------|\n");
    for row in rows {
        md.push_str(&format!(
            "| {} | [{}]({}) | {} | {} | {} |\n",
            escape_cell(&row.company),
            escape_cell(&row.job.title),
            row.job.link,
            escape_cell(&row.job.location),
            escape_cell(&row.job.deadline),
            escape_cell(&row.job.skills.join(", "))
        ));
    }

    md
}

/// Keeps pipes and line breaks in scraped text from breaking the table
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}
