//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::output::OutputResult;
use crate::storage::Storage;

/// Number of skill tags listed in statistics
pub const TOP_SKILLS_LIMIT: usize = 10;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Total number of stored job postings
    pub total_jobs: u64,

    /// Total number of stored companies
    pub total_companies: u64,

    /// Most frequent skill tags with the number of postings carrying each
    pub top_skills: Vec<(String, u64)>,

    /// Posting counts grouped by employment type, largest first
    pub jobs_by_employment_type: Vec<(String, u64)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> OutputResult<CatalogStatistics> {
    Ok(CatalogStatistics {
        total_jobs: storage.count_jobs()?,
        total_companies: storage.count_companies()?,
        top_skills: storage.top_skills(TOP_SKILLS_LIMIT)?,
        jobs_by_employment_type: storage.count_jobs_by_employment_type()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", stats.total_jobs);
    println!("  Total companies: {}", stats.total_companies);
    println!();

    if !stats.jobs_by_employment_type.is_empty() {
        println!("Jobs by Employment Type:");
        for (employment_type, count) in &stats.jobs_by_employment_type {
            println!(
                "  {}: {} ({:.1}%)",
                display_label(employment_type),
                count,
                percentage(*count, stats.total_jobs)
            );
        }
        println!();
    }

    if !stats.top_skills.is_empty() {
        println!("Top Skills:");
        for (skill, count) in &stats.top_skills {
            println!("  {}: {}", skill, count);
        }
        println!();
    }
}

/// Empty extracted fields are stored as "", which prints badly
pub(crate) fn display_label(value: &str) -> &str {
    if value.is_empty() {
        "(unspecified)"
    } else {
        value
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewJob;
    use crate::storage::SqliteStorage;

    fn job(company_id: i64, link: &str, employment_type: &str, skills: &[&str]) -> NewJob {
        NewJob {
            company_id,
            title: "Backend Engineer".to_string(),
            link: link.to_string(),
            location: "Seoul".to_string(),
            experience: String::new(),
            education: String::new(),
            employment_type: employment_type.to_string(),
            deadline: String::new(),
            sector: String::new(),
            salary: String::new(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_load_statistics_empty_catalog() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_jobs, 0);
        assert_eq!(stats.total_companies, 0);
        assert!(stats.top_skills.is_empty());
        assert!(stats.jobs_by_employment_type.is_empty());
    }

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let acme = storage.insert_or_get_company("Acme").unwrap().id();
        let globex = storage.insert_or_get_company("Globex").unwrap().id();

        storage
            .insert_job(&job(acme, "https://jobs.example.com/1", "정규직", &["Rust", "AWS"]))
            .unwrap();
        storage
            .insert_job(&job(globex, "https://jobs.example.com/2", "정규직", &["Rust"]))
            .unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.total_companies, 2);
        assert_eq!(stats.top_skills[0], ("Rust".to_string(), 2));
        assert_eq!(
            stats.jobs_by_employment_type,
            vec![("정규직".to_string(), 2)]
        );
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label(""), "(unspecified)");
        assert_eq!(display_label("계약직"), "계약직");
    }
}
