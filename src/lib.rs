//! # Wellbeing Dashboard
//!
//! Aggregation engine behind the student mental-health survey dashboard:
//! - Academic-year bucketing of capture dates
//! - Course to department inference
//! - Multi-select filtering by year, university and survey dimension
//! - Per-dimension counts split by predicted outcome
//! - Filter option enumeration with live counts
//! - Data service client, configuration and markdown reports

pub mod academic_year;
pub mod aggregate;
pub mod client;
pub mod config;
pub mod departments;
pub mod dimension;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;

pub use academic_year::AcademicYear;
pub use dimension::Dimension;
pub use engine::{Dashboard, Status};
pub use error::{Error, Result};
pub use filter::{FilterState, Scope};
pub use models::SurveyRecord;
