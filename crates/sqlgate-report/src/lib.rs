//! # sqlgate-report
//!
//! Audit-ready verdict reporting for the sqlgate governance layer.
//!
//! ## Overview
//!
//! [`VerdictReporter`] serializes a `ValidationVerdict` into an
//! [`AuditReport`]: the structured record written to the audit log and the
//! boolean gate the calling agent uses to decide whether to execute the
//! query.  Each report commits to its verdict via a SHA-256 digest over the
//! canonical verdict JSON.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlgate_report::VerdictReporter;
//!
//! let reporter = VerdictReporter::new();
//! let report = reporter.report(&verdict);
//! if report.allowed() {
//!     // forward the query for execution
//! }
//! audit_log.write(&reporter.to_json(&report)?);
//! ```

pub mod report;

pub use report::{verdict_digest, AuditReport, VerdictReporter};
