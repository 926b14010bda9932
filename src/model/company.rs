//! Company record definitions
//!
//! Companies are identified by their display name and created lazily the
//! first time a listing mentions them.

/// A stored company
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
}

/// Outcome of resolving a company by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyLookup {
    /// The company was already stored
    Existing(i64),

    /// The company was inserted by this call
    Created(i64),
}

impl CompanyLookup {
    /// Returns the company id regardless of how it was resolved
    pub fn id(&self) -> i64 {
        match self {
            Self::Existing(id) | Self::Created(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
