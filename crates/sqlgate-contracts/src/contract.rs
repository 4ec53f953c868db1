//! Template contract and rendered-query types.
//!
//! A `TemplateContract` is what a query template *promises*: which filters
//! every rendering must carry, which columns it outputs, and which partition
//! keys it prunes on.  A `RenderedQuery` is one concrete rendering submitted
//! for validation.  The validator reads contracts, never writes them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The declared contract for one named query template.
///
/// Published by the template-authoring process and immutable thereafter.
/// A version mismatch between a caller's pinned version and the registry's
/// is a contract violation, never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContract {
    /// Unique, immutable template identifier (e.g. "ar_spike_14v60").
    pub template_id: String,

    /// Version tag of the published contract (e.g. "v1").
    pub version: String,

    /// Column names that MUST appear as equality/range predicates in every
    /// rendering.  Always includes the tenant-scoping column.
    pub required_filters: BTreeSet<String>,

    /// Columns the template guarantees to output, in declaration order.
    /// Must equal the agent-facing response schema's key set exactly.
    pub projected_columns: Vec<String>,

    /// Partition-pruning columns (e.g. a year-month key).  At least one must
    /// be referenced in the rendered SQL's filtering clause.
    pub partition_columns: BTreeSet<String>,

    /// True when the template is date-bounded and must carry the temporal
    /// scoping filter.
    #[serde(default)]
    pub date_bounded: bool,
}

/// One rendered SQL statement submitted for validation.
///
/// `tenant_id` is caller-supplied and authoritative — the validator never
/// trusts a tenant id that appears only inside the SQL text.  The query is
/// owned by the pipeline for the duration of one validation call and is not
/// persisted here; persistence is the caller's audit-log responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedQuery {
    /// The template this SQL was rendered from.
    pub template_id: String,

    /// The authenticated tenant on whose behalf the query would run.
    pub tenant_id: String,

    /// The rendered SQL text.
    pub sql_text: String,

    /// Contract version the caller rendered against, if pinned.
    /// When present it must match the registry's version.
    #[serde(default)]
    pub template_version: Option<String>,
}

/// The type of one column in the agent-facing response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
}

/// The response schema the calling agent promises to its own consumers.
///
/// The contract validator checks `TemplateContract::projected_columns`
/// against this key set with two-way set equality — no extra columns, no
/// missing columns, order irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Column name → declared type, sorted by name.
    pub columns: BTreeMap<String, ColumnType>,
}

impl ResponseSchema {
    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        Self {
            columns: pairs.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    /// Iterate the schema's column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
