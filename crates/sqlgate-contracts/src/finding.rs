//! Guardrail finding and contract-check result types.
//!
//! Every guardrail rule produces exactly one `GuardrailFinding` per
//! evaluation — passed or failed — so a verdict shows the complete rule
//! sweep.  `ContractCheck` is the contract validator's output: all
//! violations found, never just the first.

use serde::{Deserialize, Serialize};

/// The category a guardrail rule belongs to.
///
/// Serialized lowercase to match the audit output contract
/// (`"security" | "performance" | "governance" | "structural"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Security,
    Performance,
    Governance,
    Structural,
}

/// How a failed rule affects the overall verdict.
///
/// Serialized SCREAMING_SNAKE_CASE (`"BLOCKING" | "WARNING"`) per the audit
/// output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// A failure forces the overall decision to BLOCK.
    Blocking,
    /// A failure is surfaced in the findings but never blocks on its own.
    Warning,
}

/// One rule's verdict on one rendered query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailFinding {
    /// Stable rule identifier, referenced in audit logs (e.g.
    /// "tenant-filter-bound").
    pub rule_id: String,

    /// The category the rule belongs to.
    pub category: RuleCategory,

    /// Severity of a failure of this rule.
    pub severity: Severity,

    /// True if the rule was satisfied.
    pub passed: bool,

    /// Human-readable explanation of what was (or was not) found.
    pub message: String,
}

impl GuardrailFinding {
    /// True if this finding is a failed BLOCKING check — the condition that
    /// forces the overall decision to BLOCK.
    pub fn blocks(&self) -> bool {
        !self.passed && self.severity == Severity::Blocking
    }
}

/// One failed consistency check on a declared contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractViolation {
    /// Stable check identifier (e.g. "projection-mismatch").
    pub check_id: String,

    /// Human-readable explanation of the inconsistency.
    pub message: String,
}

/// The contract validator's full result for one template.
///
/// `ok` is true only when `violations` is empty.  The validator does not
/// short-circuit — every violation is reported in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCheck {
    /// True when the contract passed every consistency check.
    pub ok: bool,

    /// All violations found.  Empty on pass.
    pub violations: Vec<ContractViolation>,
}

impl ContractCheck {
    /// Build a check result from the collected violations.
    pub fn from_violations(violations: Vec<ContractViolation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }
}
