//! Catalog records written by the crawler
//!
//! # Components
//!
//! - `NewJob` / `JobRecord`: a job posting before and after insertion, keyed by its source link
//! - `CompanyRecord` / `CompanyLookup`: a company keyed by name and the outcome of resolving one

mod company;
mod job;

pub use company::{CompanyLookup, CompanyRecord};
pub use job::{InsertOutcome, JobRecord, NewJob};
