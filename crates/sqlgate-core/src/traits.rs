//! Core trait definitions for the sqlgate validation pipeline.
//!
//! These four traits define the complete trust boundary:
//!
//! - `ContractRegistry` — trusted source of declared template contracts
//! - `ContractChecker`  — trusted consistency check on a declared contract
//! - `RuleEngine`       — trusted guardrail sweep over rendered SQL text
//! - `SqlRenderer`      — untrusted external renderer (consumed, never run
//!                        by the pipeline; its output is what gets checked)
//!
//! The pipeline wires them together in the correct order.  A query is never
//! approved unless the registry, the checker, and every blocking rule agree.

use sqlgate_contracts::{
    contract::{ResponseSchema, TemplateContract},
    error::SqlgateResult,
    finding::{ContractCheck, GuardrailFinding},
};

/// The read-only source of declared template contracts.
///
/// Implementations are **trusted** and must be safe to share across threads;
/// the pipeline may resolve contracts for many tenants concurrently.
pub trait ContractRegistry: Send + Sync {
    /// Look up the contract for `template_id`.
    ///
    /// Returns `SqlgateError::ContractNotFound` for unknown ids and
    /// `SqlgateError::UpstreamUnavailable` when the backing store cannot be
    /// reached.  Both are converted to BLOCK verdicts by the pipeline — an
    /// ungoverned template must never execute.
    fn get(&self, template_id: &str) -> SqlgateResult<TemplateContract>;
}

/// The contract consistency checker.
///
/// Verifies that a resolved contract is internally consistent and conforms
/// to the agent-facing response schema.  Implementations must collect every
/// violation in one pass rather than stopping at the first.
pub trait ContractChecker: Send + Sync {
    /// Check `contract` against `expected`.  Never fails — inconsistency is
    /// data, not an error.
    fn check(&self, contract: &TemplateContract, expected: &ResponseSchema) -> ContractCheck;
}

/// The guardrail rule engine.
///
/// Runs every rule against the rendered SQL text and returns one finding per
/// rule, passed or failed.  Rules are pure and order-insensitive for
/// correctness; order only affects report readability.
pub trait RuleEngine: Send + Sync {
    /// Evaluate all rules against `sql_text` for `tenant_id` under the
    /// resolved `contract`.
    fn evaluate(
        &self,
        sql_text: &str,
        contract: &TemplateContract,
        tenant_id: &str,
    ) -> Vec<GuardrailFinding>;
}

/// The external SQL-template renderer.
///
/// Implementations are **untrusted** from the pipeline's perspective: the
/// pipeline only consumes their output text and treats any failure or
/// timeout as `SqlgateError::UpstreamUnavailable` (fail closed).
pub trait SqlRenderer: Send + Sync {
    /// Render `template_id` with the given parameter map into SQL text.
    fn render(&self, template_id: &str, params: &serde_json::Value) -> SqlgateResult<String>;
}
