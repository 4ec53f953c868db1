//! The sqlgate validation pipeline: the fail-closed verdict aggregator.
//!
//! The pipeline enforces the sqlgate validation model:
//!
//!   Resolve contract → Check contract → (external render) → Guardrail sweep
//!   → Aggregate → Verdict
//!
//! The fail-closed invariant is absolute: an unknown template, an
//! unavailable upstream, or any failed BLOCKING finding produces a BLOCK
//! verdict.  The pipeline never throws for a BLOCK — for any request that is
//! syntactically intact it returns a verdict, and every BLOCK carries at
//! least one human-readable finding.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sqlgate_contracts::{
    contract::{RenderedQuery, ResponseSchema},
    error::{SqlgateError, SqlgateResult},
    finding::{GuardrailFinding, RuleCategory, Severity},
    verdict::ValidationVerdict,
};

use crate::traits::{ContractChecker, ContractRegistry, RuleEngine, SqlRenderer};

/// Rule id recorded when contract resolution itself fails.
const RULE_CONTRACT_RESOLVE: &str = "contract/resolve";

/// Rule id recorded when the external renderer fails or times out.
const RULE_UPSTREAM_RENDER: &str = "upstream/render";

/// Rule id recorded when the caller's pinned version disagrees with the
/// registry.
const RULE_VERSION_MISMATCH: &str = "contract/version-mismatch";

/// The central pipeline that turns one rendered query into one verdict.
///
/// Holds only read-only trusted components behind `Arc`, so one pipeline can
/// serve arbitrarily many concurrent validations across templates and
/// tenants without locking.  Validation is a pure computation once its
/// inputs are available — identical inputs yield identical verdicts.
pub struct ValidationPipeline {
    registry: Arc<dyn ContractRegistry>,
    checker: Arc<dyn ContractChecker>,
    engine: Arc<dyn RuleEngine>,
}

impl ValidationPipeline {
    /// Create a pipeline over the given trusted components.
    pub fn new(
        registry: Arc<dyn ContractRegistry>,
        checker: Arc<dyn ContractChecker>,
        engine: Arc<dyn RuleEngine>,
    ) -> Self {
        Self {
            registry,
            checker,
            engine,
        }
    }

    /// Validate one rendered query against its declared contract and the
    /// agent-facing response schema.
    ///
    /// # Pipeline
    ///
    /// 1. Reject syntactically incomplete requests (`InvalidRequest`) — the
    ///    only error path out of this function.
    /// 2. Resolve the contract.  `ContractNotFound` or an unavailable
    ///    registry → immediate BLOCK verdict with a single structural
    ///    finding.
    /// 3. Cross-check the caller's pinned template version, if any.
    /// 4. Run the contract checker.
    /// 5. Run every guardrail rule **unconditionally** — even when the
    ///    contract already failed — so the caller gets the complete picture
    ///    in one round trip.
    /// 6. Aggregate per the verdict invariant.
    ///
    /// # Errors
    ///
    /// Returns `SqlgateError::InvalidRequest` when `template_id` or
    /// `tenant_id` is empty.  All other failures are captured as findings
    /// inside the verdict.
    pub fn validate(
        &self,
        query: &RenderedQuery,
        expected: &ResponseSchema,
    ) -> SqlgateResult<ValidationVerdict> {
        if query.template_id.trim().is_empty() {
            return Err(SqlgateError::InvalidRequest {
                reason: "template_id is empty".to_string(),
            });
        }
        if query.tenant_id.trim().is_empty() {
            return Err(SqlgateError::InvalidRequest {
                reason: "tenant_id is empty".to_string(),
            });
        }

        debug!(
            template_id = %query.template_id,
            tenant_id = %query.tenant_id,
            "validation starting"
        );

        // ── Step 1: Resolve the contract ─────────────────────────────────────
        //
        // Resolution failure is terminal: without a contract there is nothing
        // to check the SQL against, so the verdict is an immediate BLOCK.
        let contract = match self.registry.get(&query.template_id) {
            Ok(contract) => contract,
            Err(e) => {
                warn!(
                    template_id = %query.template_id,
                    error = %e,
                    "contract resolution failed; blocking"
                );
                return Ok(Self::blocked(query, RULE_CONTRACT_RESOLVE, e.to_string()));
            }
        };

        // ── Step 2: Version cross-check ──────────────────────────────────────
        let mut findings: Vec<GuardrailFinding> = Vec::new();
        let mut version_ok = true;

        if let Some(pinned) = &query.template_version {
            if *pinned != contract.version {
                version_ok = false;
                findings.push(GuardrailFinding {
                    rule_id: RULE_VERSION_MISMATCH.to_string(),
                    category: RuleCategory::Structural,
                    severity: Severity::Blocking,
                    passed: false,
                    message: format!(
                        "caller rendered against version '{}' but the registry holds '{}'",
                        pinned, contract.version
                    ),
                });
            }
        }

        // ── Step 3: Contract consistency check ───────────────────────────────
        let check = self.checker.check(&contract, expected);
        for violation in &check.violations {
            findings.push(GuardrailFinding {
                rule_id: format!("contract/{}", violation.check_id),
                category: RuleCategory::Structural,
                severity: Severity::Blocking,
                passed: false,
                message: violation.message.clone(),
            });
        }

        // ── Step 4: Guardrail sweep ──────────────────────────────────────────
        //
        // Runs even when the contract already failed, so one verdict carries
        // both the contract and the SQL findings.
        findings.extend(
            self.engine
                .evaluate(&query.sql_text, &contract, &query.tenant_id),
        );

        // ── Step 5: Aggregate ────────────────────────────────────────────────
        let contract_ok = check.ok && version_ok;
        let verdict = ValidationVerdict::aggregate(
            query.template_id.clone(),
            query.tenant_id.clone(),
            contract_ok,
            findings,
        );

        info!(
            template_id = %verdict.template_id,
            tenant_id = %verdict.tenant_id,
            decision = ?verdict.decision,
            contract_ok = verdict.contract_ok,
            failures = verdict.failures().count(),
            "validation complete"
        );

        Ok(verdict)
    }

    /// Render via the external renderer, then validate the result.
    ///
    /// A renderer failure or timeout is surfaced as a BLOCK verdict with an
    /// `upstream/render` structural finding — never as a silent ALLOW and
    /// never as an error.  Retries, if any, belong to the caller's
    /// orchestration of the renderer.
    pub fn validate_rendered(
        &self,
        renderer: &dyn SqlRenderer,
        template_id: &str,
        tenant_id: &str,
        template_version: Option<String>,
        params: &serde_json::Value,
        expected: &ResponseSchema,
    ) -> SqlgateResult<ValidationVerdict> {
        let sql_text = match renderer.render(template_id, params) {
            Ok(sql) => sql,
            Err(e) => {
                warn!(
                    template_id = %template_id,
                    error = %e,
                    "render failed; blocking"
                );
                let query = RenderedQuery {
                    template_id: template_id.to_string(),
                    tenant_id: tenant_id.to_string(),
                    sql_text: String::new(),
                    template_version,
                };
                return Ok(Self::blocked(&query, RULE_UPSTREAM_RENDER, e.to_string()));
            }
        };

        let query = RenderedQuery {
            template_id: template_id.to_string(),
            tenant_id: tenant_id.to_string(),
            sql_text,
            template_version,
        };
        self.validate(&query, expected)
    }

    /// Build the immediate-BLOCK verdict used when resolution or rendering
    /// fails: `contract_ok = false` and a single failed structural finding.
    fn blocked(query: &RenderedQuery, rule_id: &str, message: String) -> ValidationVerdict {
        ValidationVerdict::aggregate(
            query.template_id.clone(),
            query.tenant_id.clone(),
            false,
            vec![GuardrailFinding {
                rule_id: rule_id.to_string(),
                category: RuleCategory::Structural,
                severity: Severity::Blocking,
                passed: false,
                message,
            }],
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
