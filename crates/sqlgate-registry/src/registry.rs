//! TOML-driven template contract registry.
//!
//! `TomlContractRegistry` loads a catalog of `TemplateContract`s from a TOML
//! document and implements the `ContractRegistry` trait from sqlgate-core.
//!
//! The entire catalog is validated once at load time — authoring mistakes
//! (duplicate ids, missing tenant filter, empty projections) surface as
//! `ConfigError` before any query is ever validated, not ad hoc per request.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use sqlgate_contracts::{
    config::GuardrailConfig,
    contract::TemplateContract,
    error::{SqlgateError, SqlgateResult},
};
use sqlgate_core::traits::ContractRegistry;

/// The top-level structure deserialized from a TOML catalog file.
///
/// Example:
/// ```toml
/// [[templates]]
/// template_id = "ar_spike_14v60"
/// version = "v1"
/// required_filters = ["tenant_id", "as_of_date"]
/// projected_columns = ["customer_id", "overdue_14d", "overdue_prev_60d", "spike_pct"]
/// partition_columns = ["yyyy_mm"]
/// date_bounded = true
/// ```
#[derive(Debug, Deserialize)]
struct Catalog {
    /// All published template contracts.
    templates: Vec<TemplateContract>,
}

/// A `ContractRegistry` implementation backed by an immutable in-memory map.
///
/// Construct via `from_toml_str` or `from_file`, then share behind an `Arc`
/// with the pipeline.  The map is never mutated after load, so lookups are
/// lock-free and safe from any thread.
#[derive(Debug)]
pub struct TomlContractRegistry {
    contracts: HashMap<String, TemplateContract>,
}

impl TomlContractRegistry {
    /// Parse `s` as a TOML catalog and validate every entry.
    ///
    /// Returns `SqlgateError::ConfigError` if the TOML is malformed, a
    /// template id is duplicated, or any contract fails the load-time
    /// authoring checks.
    pub fn from_toml_str(s: &str, config: &GuardrailConfig) -> SqlgateResult<Self> {
        let catalog: Catalog = toml::from_str(s).map_err(|e| SqlgateError::ConfigError {
            reason: format!("failed to parse contract catalog TOML: {}", e),
        })?;

        let mut contracts = HashMap::with_capacity(catalog.templates.len());
        for contract in catalog.templates {
            Self::lint(&contract, config)?;

            if contracts
                .insert(contract.template_id.clone(), contract.clone())
                .is_some()
            {
                return Err(SqlgateError::ConfigError {
                    reason: format!(
                        "duplicate template id '{}' in contract catalog",
                        contract.template_id
                    ),
                });
            }
        }

        debug!(templates = contracts.len(), "contract catalog loaded");
        Ok(Self { contracts })
    }

    /// Read the file at `path` and parse it as a TOML contract catalog.
    pub fn from_file(path: &Path, config: &GuardrailConfig) -> SqlgateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SqlgateError::ConfigError {
            reason: format!("failed to read catalog file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents, config)
    }

    /// Number of contracts in the catalog.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// True when the catalog holds no contracts.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Load-time authoring checks for one catalog entry.
    ///
    /// These are publisher mistakes, not per-query conditions, so they fail
    /// the whole load: an id-less or tenant-unscoped contract must never
    /// reach the pipeline in the first place.
    fn lint(contract: &TemplateContract, config: &GuardrailConfig) -> SqlgateResult<()> {
        if contract.template_id.trim().is_empty() {
            return Err(SqlgateError::ConfigError {
                reason: "catalog entry with empty template_id".to_string(),
            });
        }
        if contract.version.trim().is_empty() {
            return Err(SqlgateError::ConfigError {
                reason: format!("template '{}' has an empty version", contract.template_id),
            });
        }
        if contract.projected_columns.is_empty() {
            return Err(SqlgateError::ConfigError {
                reason: format!(
                    "template '{}' declares no projected columns",
                    contract.template_id
                ),
            });
        }
        if !contract.required_filters.contains(&config.tenant_column) {
            return Err(SqlgateError::ConfigError {
                reason: format!(
                    "template '{}' does not require the tenant-scoping column '{}'",
                    contract.template_id, config.tenant_column
                ),
            });
        }

        // Naming lint only — a partition column that does not follow the
        // configured pattern is suspicious but not fatal at load time.
        for column in &contract.partition_columns {
            if !column.contains(&config.partition_pattern) {
                warn!(
                    template_id = %contract.template_id,
                    column = %column,
                    pattern = %config.partition_pattern,
                    "partition column does not match the configured naming pattern"
                );
            }
        }

        Ok(())
    }
}

impl ContractRegistry for TomlContractRegistry {
    /// Look up `template_id` in the loaded catalog.
    ///
    /// Returns `SqlgateError::ContractNotFound` for unknown ids — upstream
    /// this is always a BLOCKING condition, never a permissive default.
    fn get(&self, template_id: &str) -> SqlgateResult<TemplateContract> {
        self.contracts
            .get(template_id)
            .cloned()
            .ok_or_else(|| SqlgateError::ContractNotFound {
                template_id: template_id.to_string(),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
