//! Audit-ready verdict reporting.
//!
//! `VerdictReporter` turns a `ValidationVerdict` into an `AuditReport`: the
//! structured record the calling agent logs and gates on.  The report
//! carries a SHA-256 digest over the canonical verdict JSON so two reports
//! for identical verdicts are comparable even though their report ids and
//! timestamps differ.
//!
//! Reporting never fails for a BLOCK decision — BLOCK is an expected,
//! first-class outcome, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use sqlgate_contracts::{
    error::{SqlgateError, SqlgateResult},
    finding::{GuardrailFinding, Severity},
    verdict::{Decision, ValidationVerdict},
};

/// The audit record produced for one validation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Unique id for this report instance.
    pub report_id: Uuid,

    /// Wall-clock time (UTC) the report was generated.
    pub generated_at: DateTime<Utc>,

    /// The template the verdict covers.
    pub template_id: String,

    /// The tenant the verdict covers.
    pub tenant_id: String,

    /// ALLOW or BLOCK.
    pub decision: Decision,

    /// Whether the declared contract passed its consistency checks.
    pub contract_ok: bool,

    /// Count of failed BLOCKING findings.
    pub blocking_failures: usize,

    /// Count of failed WARNING findings (surfaced, never blocking).
    pub warnings: usize,

    /// Every finding from the validation, in rule order.
    pub findings: Vec<GuardrailFinding>,

    /// SHA-256 (hex) over the canonical verdict JSON.  Identical verdicts
    /// yield identical digests regardless of report id or timestamp.
    pub digest: String,
}

impl AuditReport {
    /// The boolean gate: true when the query may be forwarded for execution.
    pub fn allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// Compute the SHA-256 digest (lowercase hex) of a verdict's canonical JSON.
///
/// # Panics
///
/// Panics if the verdict cannot be serialized to JSON — which cannot happen
/// for the well-formed `ValidationVerdict` type.
pub fn verdict_digest(verdict: &ValidationVerdict) -> String {
    // serde_json::to_vec produces deterministic JSON for the same value, so
    // the digest is a stable commitment to the verdict content.
    let json = serde_json::to_vec(verdict)
        .expect("ValidationVerdict must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(&json);
    hex::encode(hasher.finalize())
}

/// The sqlgate verdict reporter.
#[derive(Debug, Default)]
pub struct VerdictReporter;

impl VerdictReporter {
    pub fn new() -> Self {
        Self
    }

    /// Build the audit report for `verdict`.
    pub fn report(&self, verdict: &ValidationVerdict) -> AuditReport {
        let blocking_failures = verdict
            .findings
            .iter()
            .filter(|f| !f.passed && f.severity == Severity::Blocking)
            .count();
        let warnings = verdict
            .findings
            .iter()
            .filter(|f| !f.passed && f.severity == Severity::Warning)
            .count();

        let report = AuditReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            template_id: verdict.template_id.clone(),
            tenant_id: verdict.tenant_id.clone(),
            decision: verdict.decision,
            contract_ok: verdict.contract_ok,
            blocking_failures,
            warnings,
            findings: verdict.findings.clone(),
            digest: verdict_digest(verdict),
        };

        info!(
            report_id = %report.report_id,
            template_id = %report.template_id,
            tenant_id = %report.tenant_id,
            decision = ?report.decision,
            blocking_failures = report.blocking_failures,
            warnings = report.warnings,
            "audit report generated"
        );

        report
    }

    /// Serialize a report to compact JSON for the audit log.
    pub fn to_json(&self, report: &AuditReport) -> SqlgateResult<String> {
        serde_json::to_string(report).map_err(|e| SqlgateError::ConfigError {
            reason: format!("failed to serialize audit report: {}", e),
        })
    }

    /// Serialize a report to pretty JSON for operator tooling.
    pub fn to_json_pretty(&self, report: &AuditReport) -> SqlgateResult<String> {
        serde_json::to_string_pretty(report).map_err(|e| SqlgateError::ConfigError {
            reason: format!("failed to serialize audit report: {}", e),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use sqlgate_contracts::{
        finding::{GuardrailFinding, RuleCategory, Severity},
        verdict::{Decision, ValidationVerdict},
    };

    use super::{verdict_digest, VerdictReporter};

    fn finding(rule_id: &str, severity: Severity, passed: bool) -> GuardrailFinding {
        GuardrailFinding {
            rule_id: rule_id.to_string(),
            category: RuleCategory::Performance,
            severity,
            passed,
            message: "checked".to_string(),
        }
    }

    fn verdict(findings: Vec<GuardrailFinding>) -> ValidationVerdict {
        ValidationVerdict::aggregate("ar_spike_14v60", "t-acme", true, findings)
    }

    #[test]
    fn report_counts_blocking_and_warning_failures() {
        let v = verdict(vec![
            finding("a", Severity::Blocking, false),
            finding("b", Severity::Blocking, true),
            finding("c", Severity::Warning, false),
            finding("d", Severity::Warning, false),
        ]);

        let report = VerdictReporter::new().report(&v);

        assert_eq!(report.blocking_failures, 1);
        assert_eq!(report.warnings, 2);
        assert_eq!(report.decision, Decision::Block);
        assert!(!report.allowed());
    }

    #[test]
    fn block_is_reported_not_thrown() {
        let v = verdict(vec![finding("a", Severity::Blocking, false)]);
        let reporter = VerdictReporter::new();

        // Reporting and serializing a BLOCK must both succeed.
        let report = reporter.report(&v);
        let json = reporter.to_json(&report).unwrap();
        assert!(json.contains("\"BLOCK\""));
    }

    #[test]
    fn digest_is_deterministic_for_identical_verdicts() {
        let a = verdict(vec![finding("a", Severity::Blocking, true)]);
        let b = verdict(vec![finding("a", Severity::Blocking, true)]);

        assert_eq!(verdict_digest(&a), verdict_digest(&b));
        assert_eq!(verdict_digest(&a).len(), 64);

        // Reports carry distinct ids but the same digest.
        let reporter = VerdictReporter::new();
        let ra = reporter.report(&a);
        let rb = reporter.report(&b);
        assert_ne!(ra.report_id, rb.report_id);
        assert_eq!(ra.digest, rb.digest);
    }

    #[test]
    fn digest_changes_with_verdict_content() {
        let a = verdict(vec![finding("a", Severity::Blocking, true)]);
        let b = verdict(vec![finding("a", Severity::Blocking, false)]);

        assert_ne!(verdict_digest(&a), verdict_digest(&b));
    }

    #[test]
    fn json_carries_the_wire_contract_fields() {
        let v = verdict(vec![finding("partition-pruning", Severity::Blocking, true)]);
        let report = VerdictReporter::new().report(&v);
        let json = VerdictReporter::new().to_json(&report).unwrap();

        assert!(json.contains("\"template_id\":\"ar_spike_14v60\""));
        assert!(json.contains("\"tenant_id\":\"t-acme\""));
        assert!(json.contains("\"decision\":\"ALLOW\""));
        assert!(json.contains("\"category\":\"performance\""));
        assert!(json.contains("\"severity\":\"BLOCKING\""));
    }
}
