//! Job posting record definitions
//!
//! A job posting's natural key is its source `link`; no two stored postings
//! share one.

/// A job posting ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub company_id: i64,
    pub title: String,
    pub link: String,
    pub location: String,
    pub experience: String,
    pub education: String,
    pub employment_type: String,
    pub deadline: String,
    pub sector: String,
    pub salary: String,
    pub skills: Vec<String>,
}

/// A stored job posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub link: String,
    pub location: String,
    pub experience: String,
    pub education: String,
    pub employment_type: String,
    pub deadline: String,
    pub sector: String,
    pub salary: String,
    pub skills: Vec<String>,
    pub views: u64,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of inserting a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id
    Inserted(i64),

    /// A posting with the same link already exists; nothing was written
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}
