//! Storage traits and error types
//!
//! This module defines the trait interface for catalog storage backends and
//! associated error types.

use crate::model::{CompanyLookup, CompanyRecord, InsertOutcome, JobRecord, NewJob};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true when the store itself is unusable, as opposed to a
    /// failure confined to one statement
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DiskFull
                    | ErrorCode::ReadOnly
                    | ErrorCode::PermissionDenied
                    | ErrorCode::OutOfMemory
            ),
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog storage backends
///
/// The crawler reaches the store only through this interface: find-by-key,
/// create, and the transaction boundary of a run.
pub trait Storage {
    // ===== Run Transaction =====

    /// Opens a transaction that spans every following write until
    /// `commit_run` or `rollback_run`
    fn begin_run(&mut self) -> StorageResult<()>;

    /// Commits the run transaction
    fn commit_run(&mut self) -> StorageResult<()>;

    /// Discards every write made since `begin_run`
    fn rollback_run(&mut self) -> StorageResult<()>;

    // ===== Companies =====

    /// Gets a company by its name
    fn find_company_by_name(&self, name: &str) -> StorageResult<Option<CompanyRecord>>;

    /// Gets a company by id
    fn get_company(&self, company_id: i64) -> StorageResult<CompanyRecord>;

    /// Returns the company with this name, inserting it first if absent
    ///
    /// A unique-constraint race lost to another writer resolves to
    /// `CompanyLookup::Existing`.
    fn insert_or_get_company(&mut self, name: &str) -> StorageResult<CompanyLookup>;

    // ===== Jobs =====

    /// Gets a job posting by its source link
    fn find_job_by_link(&self, link: &str) -> StorageResult<Option<JobRecord>>;

    /// Inserts a job posting with its skill tags
    ///
    /// A posting whose link is already stored yields `InsertOutcome::Duplicate`
    /// and leaves the stored posting untouched.
    fn insert_job(&mut self, job: &NewJob) -> StorageResult<InsertOutcome>;

    /// Gets the most recently stored job postings, newest first
    fn list_recent_jobs(&self, limit: usize) -> StorageResult<Vec<JobRecord>>;

    // ===== Statistics =====

    /// Gets total job count
    fn count_jobs(&self) -> StorageResult<u64>;

    /// Gets total company count
    fn count_companies(&self) -> StorageResult<u64>;

    /// Gets the most frequent skill tags with their job counts
    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Gets job counts per employment type, most common first
    fn count_jobs_by_employment_type(&self) -> StorageResult<Vec<(String, u64)>>;
}
