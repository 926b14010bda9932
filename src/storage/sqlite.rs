//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{CompanyLookup, CompanyRecord, InsertOutcome, JobRecord, NewJob};
use crate::storage::schema::{get_schema_version, initialize_schema};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

const JOB_COLUMNS: &str = "id, company_id, title, link, location, experience, education,
     employment_type, deadline, sector, salary, views, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the catalog database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        // Other writers (the API, a second crawl) may hold the lock briefly
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the connection, reporting any error SQLite raises on close
    pub fn close(self) -> StorageResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| StorageError::Sqlite(e))
    }

    /// Reads the schema version recorded in the database
    pub fn schema_version(&self) -> StorageResult<u32> {
        Ok(get_schema_version(&self.conn)?)
    }

    fn load_skills(&self, job_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT skill FROM job_skills WHERE job_id = ?1 ORDER BY position")?;

        let skills = stmt
            .query_map(params![job_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(skills)
    }

    fn with_skills(&self, mut job: JobRecord) -> StorageResult<JobRecord> {
        job.skills = self.load_skills(job.id)?;
        Ok(job)
    }
}

/// Maps a `jobs` row selected with `JOB_COLUMNS`; skills are loaded separately
fn row_to_job(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        location: row.get(4)?,
        experience: row.get(5)?,
        education: row.get(6)?,
        employment_type: row.get(7)?,
        deadline: row.get(8)?,
        sector: row.get(9)?,
        salary: row.get(10)?,
        skills: Vec::new(),
        views: row.get::<_, i64>(11)? as u64,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn row_to_company(row: &Row<'_>) -> rusqlite::Result<CompanyRecord> {
    Ok(CompanyRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        industry: row.get(2)?,
        size: row.get(3)?,
        location: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Returns true for a UNIQUE or PRIMARY KEY violation
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Turns other constraint failures into `ConstraintViolation`
fn classify(err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, message)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(
                message.clone().unwrap_or_else(|| err.to_string()),
            )
        }
        _ => StorageError::Sqlite(err),
    }
}

impl Storage for SqliteStorage {
    // ===== Run Transaction =====

    fn begin_run(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit_run(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_run(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ===== Companies =====

    fn find_company_by_name(&self, name: &str) -> StorageResult<Option<CompanyRecord>> {
        let company = self
            .conn
            .query_row(
                "SELECT id, name, industry, size, location, created_at
                 FROM companies WHERE name = ?1",
                params![name],
                row_to_company,
            )
            .optional()?;

        Ok(company)
    }

    fn get_company(&self, company_id: i64) -> StorageResult<CompanyRecord> {
        self.conn
            .query_row(
                "SELECT id, name, industry, size, location, created_at
                 FROM companies WHERE id = ?1",
                params![company_id],
                row_to_company,
            )
            .optional()?
            .ok_or(StorageError::CompanyNotFound(company_id))
    }

    fn insert_or_get_company(&mut self, name: &str) -> StorageResult<CompanyLookup> {
        // Reuse an existing company by name
        if let Some(existing) = self.find_company_by_name(name)? {
            return Ok(CompanyLookup::Existing(existing.id));
        }

        // Otherwise create it; a lost race falls back to the winner's row
        let now = Utc::now().to_rfc3339();
        match self.conn.execute(
            "INSERT INTO companies (name, created_at) VALUES (?1, ?2)",
            params![name, now],
        ) {
            Ok(_) => Ok(CompanyLookup::Created(self.conn.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("Company '{}' inserted concurrently, reusing it", name);
                self.find_company_by_name(name)?
                    .map(|company| CompanyLookup::Existing(company.id))
                    .ok_or_else(|| {
                        StorageError::Database(format!(
                            "company '{}' conflicted on insert but cannot be read back",
                            name
                        ))
                    })
            }
            Err(e) => Err(classify(e)),
        }
    }

    // ===== Jobs =====

    fn find_job_by_link(&self, link: &str) -> StorageResult<Option<JobRecord>> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE link = ?1", JOB_COLUMNS),
                params![link],
                row_to_job,
            )
            .optional()?;

        job.map(|job| self.with_skills(job)).transpose()
    }

    fn insert_job(&mut self, job: &NewJob) -> StorageResult<InsertOutcome> {
        let now = Utc::now().to_rfc3339();

        // Job row and skill rows land together or not at all
        let sp = self.conn.savepoint()?;

        let inserted = sp.execute(
            "INSERT INTO jobs (company_id, title, link, location, experience, education,
             employment_type, deadline, sector, salary, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                job.company_id,
                job.title,
                job.link,
                job.location,
                job.experience,
                job.education,
                job.employment_type,
                job.deadline,
                job.sector,
                job.salary,
                now
            ],
        );

        // A taken link is a duplicate; dropping the savepoint rolls it back
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(InsertOutcome::Duplicate),
            Err(e) => return Err(classify(e)),
        }

        // Skills keep their listing order via `position`
        let job_id = sp.last_insert_rowid();
        {
            let mut stmt =
                sp.prepare("INSERT INTO job_skills (job_id, position, skill) VALUES (?1, ?2, ?3)")?;
            for (position, skill) in job.skills.iter().enumerate() {
                stmt.execute(params![job_id, position as i64, skill])?;
            }
        }

        sp.commit()?;
        Ok(InsertOutcome::Inserted(job_id))
    }

    fn list_recent_jobs(&self, limit: usize) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs ORDER BY id DESC LIMIT ?1",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map(params![limit as i64], row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;

        jobs.into_iter().map(|job| self.with_skills(job)).collect()
    }

    // ===== Statistics =====

    fn count_jobs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_companies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT skill, COUNT(DISTINCT job_id) AS jobs FROM job_skills
             GROUP BY skill ORDER BY jobs DESC, skill ASC LIMIT ?1",
        )?;

        let skills = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(skills)
    }

    fn count_jobs_by_employment_type(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT employment_type, COUNT(*) AS jobs FROM jobs
             GROUP BY employment_type ORDER BY jobs DESC, employment_type ASC",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
