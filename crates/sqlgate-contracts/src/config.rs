//! Guardrail configuration: the explicit, enumerated option surface.
//!
//! Everything the rules can be tuned with lives here and is passed in at
//! construction time.  There is no ambient environment lookup anywhere in
//! the engine — a deliberate departure from the ad hoc fixtures this design
//! replaces.

use serde::{Deserialize, Serialize};

/// Recognized guardrail options.
///
/// Deserialized from TOML by the hosting application (see
/// `sqlgate-guardrails`); every field has a default so a partial
/// configuration file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    /// The tenant-scoping column every query must filter on.
    pub tenant_column: String,

    /// The temporal-scoping column date-bounded templates must filter on.
    pub temporal_column: String,

    /// Naming pattern for partition columns (catalog-lint only; the rules
    /// themselves use each contract's declared partition columns).
    pub partition_pattern: String,

    /// Tables that require an `allow-restricted: <table>` marker to query.
    pub restricted_tables: Vec<String>,

    /// Column names that require an `allow-pii: <column>` marker to project
    /// or filter on.
    pub pii_columns: Vec<String>,

    /// Template ids whose backing tables are large enough that a missing
    /// date bound escalates from WARNING to BLOCKING.
    pub large_table_templates: Vec<String>,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            tenant_column: "tenant_id".to_string(),
            temporal_column: "as_of_date".to_string(),
            partition_pattern: "yyyy_mm".to_string(),
            restricted_tables: Vec::new(),
            pii_columns: Vec::new(),
            large_table_templates: Vec::new(),
        }
    }
}

impl GuardrailConfig {
    /// True when `template_id` is flagged as backed by a large table.
    pub fn is_large_table(&self, template_id: &str) -> bool {
        self.large_table_templates.iter().any(|t| t == template_id)
    }
}
