//! # sqlgate-contracts
//!
//! Shared types, schemas, and contracts for the sqlgate governance layer.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod config;
pub mod contract;
pub mod error;
pub mod finding;
pub mod verdict;

pub use config::GuardrailConfig;
pub use contract::{ColumnType, RenderedQuery, ResponseSchema, TemplateContract};
pub use error::{SqlgateError, SqlgateResult};
pub use finding::{ContractCheck, ContractViolation, GuardrailFinding, RuleCategory, Severity};
pub use verdict::{Decision, ValidationVerdict};
