//! Redressal: a university grievance-redressal backend.
//!
//! Students submit complaints, administrators triage and resolve them. The
//! core is the distribution engine, which matches each complaint to an
//! admin through a tiered specialization/locality fallback, tracks admin
//! caseload, and supports manual reassignment with a full audit trail.

pub mod config;
pub mod database;
pub mod distribution;
pub mod error;
pub mod intake;
pub mod models;
pub mod stats;
