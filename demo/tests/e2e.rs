//! End-to-end validation scenarios through the full sqlgate stack:
//! TOML registry → contract validator → guardrail engine → pipeline →
//! reporter.

use std::sync::Arc;

use sqlgate_contracts::{
    config::GuardrailConfig,
    contract::{ColumnType, RenderedQuery, ResponseSchema},
    finding::{RuleCategory, Severity},
    verdict::{Decision, ValidationVerdict},
};
use sqlgate_core::ValidationPipeline;
use sqlgate_guardrails::GuardrailEngine;
use sqlgate_registry::{ContractValidator, TomlContractRegistry};
use sqlgate_report::{verdict_digest, VerdictReporter};

const CATALOG: &str = r#"
[[templates]]
template_id = "ar_spike_14v60"
version = "v1"
required_filters = ["tenant_id", "as_of_date"]
projected_columns = ["customer_id", "overdue_14d", "overdue_prev_60d", "spike_pct"]
partition_columns = ["yyyy_mm"]
date_bounded = true

[[templates]]
template_id = "ar_aging"
version = "v1"
required_filters = ["tenant_id", "as_of_date"]
projected_columns = ["customer_id", "overdue_14d"]
partition_columns = ["yyyy_mm"]
date_bounded = true
"#;

fn pipeline() -> ValidationPipeline {
    let config = GuardrailConfig::default();
    let registry = TomlContractRegistry::from_toml_str(CATALOG, &config).unwrap();
    let validator = ContractValidator::new(&config);
    let engine = GuardrailEngine::new(config).unwrap();
    ValidationPipeline::new(Arc::new(registry), Arc::new(validator), Arc::new(engine))
}

fn spike_schema() -> ResponseSchema {
    ResponseSchema::from_pairs([
        ("customer_id", ColumnType::String),
        ("overdue_14d", ColumnType::Number),
        ("overdue_prev_60d", ColumnType::Number),
        ("spike_pct", ColumnType::Number),
    ])
}

fn spike_query(sql: &str) -> RenderedQuery {
    RenderedQuery {
        template_id: "ar_spike_14v60".to_string(),
        tenant_id: "t-acme".to_string(),
        sql_text: sql.to_string(),
        template_version: Some("v1".to_string()),
    }
}

fn blocking_failures(verdict: &ValidationVerdict) -> Vec<&str> {
    verdict
        .findings
        .iter()
        .filter(|f| !f.passed && f.severity == Severity::Blocking)
        .map(|f| f.rule_id.as_str())
        .collect()
}

/// Scenario 1: a fully compliant rendering of ar_spike_14v60 is allowed with
/// a clean contract and zero blocking failures.
#[test]
fn compliant_spike_query_is_allowed() {
    let verdict = pipeline()
        .validate(
            &spike_query(
                "SELECT customer_id, overdue_14d, overdue_prev_60d, spike_pct \
                 FROM ar_comparative_analysis \
                 WHERE tenant_id = @tenant_id \
                   AND as_of_date BETWEEN @start AND @end \
                   AND yyyy_mm IN (@parts)",
            ),
            &spike_schema(),
        )
        .unwrap();

    assert_eq!(verdict.decision, Decision::Allow);
    assert!(verdict.contract_ok);
    assert!(blocking_failures(&verdict).is_empty());

    let report = VerdictReporter::new().report(&verdict);
    assert!(report.allowed());
    assert_eq!(report.blocking_failures, 0);
}

/// Scenario 2: SELECT * with a hardcoded tenant literal is blocked, with
/// both the wildcard and the literal-tenant findings present.
#[test]
fn wildcard_with_literal_tenant_is_blocked() {
    let verdict = pipeline()
        .validate(
            &spike_query("SELECT * FROM ar_comparative_analysis WHERE tenant_id='acme'"),
            &spike_schema(),
        )
        .unwrap();

    assert_eq!(verdict.decision, Decision::Block);

    let failed = blocking_failures(&verdict);
    assert!(failed.contains(&"no-wildcard-projection"));
    assert!(failed.contains(&"tenant-filter-bound"));

    let tenant_finding = verdict
        .findings
        .iter()
        .find(|f| f.rule_id == "tenant-filter-bound")
        .unwrap();
    assert!(tenant_finding.message.contains("not a literal"));
}

/// Scenario 3: a join with no tenant filter in the ON condition or any
/// subsequent WHERE is blocked with a security finding.
#[test]
fn unscoped_join_is_blocked() {
    let verdict = pipeline()
        .validate(
            &spike_query(
                "SELECT i.customer_id, i.overdue_14d \
                 FROM ar_invoices i \
                 JOIN customers c ON c.customer_id = i.customer_id",
            ),
            &spike_schema(),
        )
        .unwrap();

    assert_eq!(verdict.decision, Decision::Block);

    let join_finding = verdict
        .findings
        .iter()
        .find(|f| f.rule_id == "no-unscoped-joins")
        .unwrap();
    assert!(!join_finding.passed);
    assert_eq!(join_finding.category, RuleCategory::Security);
}

/// Scenario 4: the contract projects fewer columns than the response schema
/// requires — contract_ok is false and the decision is BLOCK regardless of
/// the guardrail outcome.
#[test]
fn projection_drift_blocks_regardless_of_sql() {
    let query = RenderedQuery {
        template_id: "ar_aging".to_string(),
        tenant_id: "t-acme".to_string(),
        // The SQL itself is fully compliant.
        sql_text: "SELECT customer_id, overdue_14d \
                   FROM curated_ar \
                   WHERE tenant_id = @tenant_id \
                     AND as_of_date BETWEEN @start AND @end \
                     AND yyyy_mm IN (@parts)"
            .to_string(),
        template_version: Some("v1".to_string()),
    };
    let schema = ResponseSchema::from_pairs([
        ("customer_id", ColumnType::String),
        ("overdue_14d", ColumnType::Number),
        ("spike_pct", ColumnType::Number),
    ]);

    let verdict = pipeline().validate(&query, &schema).unwrap();

    assert!(!verdict.contract_ok);
    assert_eq!(verdict.decision, Decision::Block);
    let drift = verdict
        .findings
        .iter()
        .find(|f| f.rule_id == "contract/projection-mismatch")
        .unwrap();
    assert!(drift.message.contains("spike_pct"));
}

/// A tenant filter that exists only inside a comment must not satisfy the
/// security rule, end to end.
#[test]
fn commented_tenant_filter_is_blocked() {
    let verdict = pipeline()
        .validate(
            &spike_query(
                "SELECT customer_id, overdue_14d, overdue_prev_60d, spike_pct \
                 FROM ar_comparative_analysis \
                 -- WHERE tenant_id = @tenant_id\n \
                 WHERE as_of_date BETWEEN @start AND @end AND yyyy_mm IN (@parts)",
            ),
            &spike_schema(),
        )
        .unwrap();

    assert_eq!(verdict.decision, Decision::Block);
    assert!(blocking_failures(&verdict).contains(&"tenant-filter-bound"));
}

/// Validation is a pure computation: identical inputs produce bit-identical
/// verdicts and identical digests.
#[test]
fn validation_is_idempotent() {
    let p = pipeline();
    let query = spike_query(
        "SELECT customer_id, overdue_14d, overdue_prev_60d, spike_pct \
         FROM ar_comparative_analysis \
         WHERE tenant_id = @tenant_id \
           AND as_of_date BETWEEN @start AND @end \
           AND yyyy_mm IN (@parts)",
    );

    let first = p.validate(&query, &spike_schema()).unwrap();
    let second = p.validate(&query, &spike_schema()).unwrap();

    assert_eq!(first, second);
    assert_eq!(verdict_digest(&first), verdict_digest(&second));
}

/// An unknown template blocks with a single structural finding — never a
/// permissive default.
#[test]
fn unknown_template_blocks() {
    let query = RenderedQuery {
        template_id: "ar_ghost".to_string(),
        tenant_id: "t-acme".to_string(),
        sql_text: "SELECT 1 FROM t".to_string(),
        template_version: None,
    };

    let verdict = pipeline().validate(&query, &spike_schema()).unwrap();

    assert_eq!(verdict.decision, Decision::Block);
    assert_eq!(verdict.findings.len(), 1);
    assert_eq!(verdict.findings[0].rule_id, "contract/resolve");
    assert!(!verdict.findings[0].message.is_empty());
}
