//! Contract consistency validation.
//!
//! `ContractValidator` checks a resolved `TemplateContract` for internal
//! consistency and for conformance to the agent-facing response schema.
//! All violations are collected in one pass — the validator never stops at
//! the first failure, so one report covers the whole contract.

use std::collections::BTreeSet;

use tracing::debug;

use sqlgate_contracts::{
    config::GuardrailConfig,
    contract::{ResponseSchema, TemplateContract},
    finding::{ContractCheck, ContractViolation},
};
use sqlgate_core::traits::ContractChecker;

/// The sqlgate contract validator.
///
/// Holds only the configured column names; checking is a pure function of
/// the contract and the expected schema.
#[derive(Debug)]
pub struct ContractValidator {
    tenant_column: String,
    temporal_column: String,
}

impl ContractValidator {
    /// Create a validator using the configured tenant and temporal column
    /// names.
    pub fn new(config: &GuardrailConfig) -> Self {
        Self {
            tenant_column: config.tenant_column.clone(),
            temporal_column: config.temporal_column.clone(),
        }
    }

    fn violation(check_id: &str, message: String) -> ContractViolation {
        ContractViolation {
            check_id: check_id.to_string(),
            message,
        }
    }
}

impl ContractChecker for ContractValidator {
    /// Check `contract` against `expected`.
    ///
    /// Checks, each producing a named violation on failure:
    /// - `required-filters-empty` — the contract declares no required filters.
    /// - `tenant-filter-missing` — the tenant-scoping column is not required.
    /// - `temporal-filter-missing` — a date-bounded template does not require
    ///   the temporal-scoping column.
    /// - `projection-mismatch` — the projected column set differs from the
    ///   response schema's key set in either direction (two-way set
    ///   equality, not a subset check).
    /// - `partition-columns-empty` — the contract declares no partition
    ///   columns.
    fn check(&self, contract: &TemplateContract, expected: &ResponseSchema) -> ContractCheck {
        let mut violations = Vec::new();

        if contract.required_filters.is_empty() {
            violations.push(Self::violation(
                "required-filters-empty",
                format!(
                    "template '{}' declares no required filters",
                    contract.template_id
                ),
            ));
        } else {
            if !contract.required_filters.contains(&self.tenant_column) {
                violations.push(Self::violation(
                    "tenant-filter-missing",
                    format!(
                        "template '{}' does not require the tenant-scoping column '{}'",
                        contract.template_id, self.tenant_column
                    ),
                ));
            }
            if contract.date_bounded && !contract.required_filters.contains(&self.temporal_column) {
                violations.push(Self::violation(
                    "temporal-filter-missing",
                    format!(
                        "date-bounded template '{}' does not require the temporal column '{}'",
                        contract.template_id, self.temporal_column
                    ),
                ));
            }
        }

        // Two-way set equality between projected columns and the schema keys.
        let projected: BTreeSet<&str> = contract
            .projected_columns
            .iter()
            .map(String::as_str)
            .collect();
        let schema_keys: BTreeSet<&str> = expected.column_names().collect();

        if projected != schema_keys {
            let missing: Vec<&str> = schema_keys.difference(&projected).copied().collect();
            let extra: Vec<&str> = projected.difference(&schema_keys).copied().collect();
            violations.push(Self::violation(
                "projection-mismatch",
                format!(
                    "template '{}' projection does not match the response schema \
                     (missing from projection: [{}]; not in schema: [{}])",
                    contract.template_id,
                    missing.join(", "),
                    extra.join(", ")
                ),
            ));
        }

        if contract.partition_columns.is_empty() {
            violations.push(Self::violation(
                "partition-columns-empty",
                format!(
                    "template '{}' declares no partition columns",
                    contract.template_id
                ),
            ));
        }

        debug!(
            template_id = %contract.template_id,
            violations = violations.len(),
            "contract check complete"
        );

        ContractCheck::from_violations(violations)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sqlgate_contracts::{
        config::GuardrailConfig,
        contract::{ColumnType, ResponseSchema, TemplateContract},
    };
    use sqlgate_core::traits::ContractChecker;

    use super::ContractValidator;

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn validator() -> ContractValidator {
        ContractValidator::new(&GuardrailConfig::default())
    }

    fn contract() -> TemplateContract {
        TemplateContract {
            template_id: "ar_spike_14v60".to_string(),
            version: "v1".to_string(),
            required_filters: BTreeSet::from(["tenant_id".to_string(), "as_of_date".to_string()]),
            projected_columns: vec![
                "customer_id".to_string(),
                "overdue_14d".to_string(),
                "overdue_prev_60d".to_string(),
                "spike_pct".to_string(),
            ],
            partition_columns: BTreeSet::from(["yyyy_mm".to_string()]),
            date_bounded: true,
        }
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::from_pairs([
            ("customer_id", ColumnType::String),
            ("overdue_14d", ColumnType::Number),
            ("overdue_prev_60d", ColumnType::Number),
            ("spike_pct", ColumnType::Number),
        ])
    }

    fn check_ids(check: &sqlgate_contracts::finding::ContractCheck) -> Vec<&str> {
        check.violations.iter().map(|v| v.check_id.as_str()).collect()
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[test]
    fn consistent_contract_passes() {
        let check = validator().check(&contract(), &schema());
        assert!(check.ok, "violations: {:?}", check.violations);
        assert!(check.violations.is_empty());
    }

    // ── Required filters ──────────────────────────────────────────────────────

    #[test]
    fn empty_required_filters_fails() {
        let mut c = contract();
        c.required_filters.clear();

        let check = validator().check(&c, &schema());
        assert!(!check.ok);
        assert!(check_ids(&check).contains(&"required-filters-empty"));
    }

    #[test]
    fn missing_tenant_filter_fails() {
        let mut c = contract();
        c.required_filters.remove("tenant_id");

        let check = validator().check(&c, &schema());
        assert!(check_ids(&check).contains(&"tenant-filter-missing"));
    }

    #[test]
    fn date_bounded_template_requires_temporal_filter() {
        let mut c = contract();
        c.required_filters.remove("as_of_date");

        let check = validator().check(&c, &schema());
        assert!(check_ids(&check).contains(&"temporal-filter-missing"));
    }

    #[test]
    fn undated_template_skips_temporal_check() {
        let mut c = contract();
        c.required_filters.remove("as_of_date");
        c.date_bounded = false;

        let check = validator().check(&c, &schema());
        assert!(check.ok, "violations: {:?}", check.violations);
    }

    // ── Projection set equality (two-way) ─────────────────────────────────────

    #[test]
    fn removed_projection_column_fails() {
        let mut c = contract();
        c.projected_columns.retain(|col| col != "spike_pct");

        let check = validator().check(&c, &schema());
        assert!(!check.ok);
        let v = check
            .violations
            .iter()
            .find(|v| v.check_id == "projection-mismatch")
            .expect("projection-mismatch violation");
        assert!(v.message.contains("spike_pct"));
    }

    #[test]
    fn extra_projection_column_fails() {
        let mut c = contract();
        c.projected_columns.push("internal_debug_col".to_string());

        let check = validator().check(&c, &schema());
        let v = check
            .violations
            .iter()
            .find(|v| v.check_id == "projection-mismatch")
            .expect("projection-mismatch violation");
        assert!(v.message.contains("internal_debug_col"));
    }

    #[test]
    fn renamed_projection_column_fails() {
        let mut c = contract();
        c.projected_columns = c
            .projected_columns
            .iter()
            .map(|col| {
                if col == "spike_pct" {
                    "spike_percent".to_string()
                } else {
                    col.clone()
                }
            })
            .collect();

        let check = validator().check(&c, &schema());
        assert!(check_ids(&check).contains(&"projection-mismatch"));
    }

    #[test]
    fn projection_order_is_irrelevant() {
        let mut c = contract();
        c.projected_columns.reverse();

        let check = validator().check(&c, &schema());
        assert!(check.ok, "violations: {:?}", check.violations);
    }

    // ── Partitions ────────────────────────────────────────────────────────────

    #[test]
    fn empty_partition_columns_fails() {
        let mut c = contract();
        c.partition_columns.clear();

        let check = validator().check(&c, &schema());
        assert!(check_ids(&check).contains(&"partition-columns-empty"));
    }

    // ── No short-circuit ──────────────────────────────────────────────────────

    #[test]
    fn all_violations_are_reported_in_one_pass() {
        let mut c = contract();
        c.required_filters.clear();
        c.partition_columns.clear();
        c.projected_columns.push("extra".to_string());

        let check = validator().check(&c, &schema());
        let ids = check_ids(&check);
        assert!(ids.contains(&"required-filters-empty"));
        assert!(ids.contains(&"partition-columns-empty"));
        assert!(ids.contains(&"projection-mismatch"));
    }
}
