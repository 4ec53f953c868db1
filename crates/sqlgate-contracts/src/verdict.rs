//! The validation verdict: the pipeline's single output type.
//!
//! sqlgate is fail-closed: the decision is ALLOW if and only if the contract
//! check passed AND no BLOCKING finding failed.  Everything else — unknown
//! template, upstream failure, any failed blocking rule — is BLOCK.

use serde::{Deserialize, Serialize};

use crate::finding::GuardrailFinding;

/// The gate decision for one rendered query.
///
/// Serialized SCREAMING_SNAKE_CASE (`"ALLOW" | "BLOCK"`) per the audit
/// output contract.  BLOCK is an expected, first-class outcome — never an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// The query may be forwarded to the warehouse.
    Allow,
    /// The query must not execute.  At least one finding explains why.
    Block,
}

/// The aggregated result of one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// The template the query was rendered from.
    pub template_id: String,

    /// The tenant the query would run for.
    pub tenant_id: String,

    /// ALLOW or BLOCK, per the invariant below.
    pub decision: Decision,

    /// True when the declared contract passed all consistency checks
    /// (including resolution and version cross-check).
    pub contract_ok: bool,

    /// Every finding produced during this validation, in rule order.
    /// Contract violations appear here with rule ids prefixed `contract/`.
    pub findings: Vec<GuardrailFinding>,
}

impl ValidationVerdict {
    /// Aggregate findings into a verdict, enforcing the decision invariant:
    /// `Allow` iff `contract_ok` and no finding is a failed BLOCKING check.
    pub fn aggregate(
        template_id: impl Into<String>,
        tenant_id: impl Into<String>,
        contract_ok: bool,
        findings: Vec<GuardrailFinding>,
    ) -> Self {
        let blocked = !contract_ok || findings.iter().any(GuardrailFinding::blocks);
        Self {
            template_id: template_id.into(),
            tenant_id: tenant_id.into(),
            decision: if blocked { Decision::Block } else { Decision::Allow },
            contract_ok,
            findings,
        }
    }

    /// True when the decision is ALLOW.
    pub fn allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// Iterate only the findings that failed.
    pub fn failures(&self) -> impl Iterator<Item = &GuardrailFinding> {
        self.findings.iter().filter(|f| !f.passed)
    }
}
