//! The declarative guardrail rule table.
//!
//! Every rule is one row: stable id → category → severity → predicate.
//! Predicates are pure functions over the prepared SQL text and the rule
//! context; they return `Some(message)` on failure and `None` on pass.
//! Adding or tuning a rule means editing this table, nothing else.
//!
//! All patterns are compiled once into `SqlPatterns` at engine construction
//! and match against the comment-stripped, lowercased text.

use regex::Regex;

use sqlgate_contracts::{
    config::GuardrailConfig,
    contract::TemplateContract,
    error::{SqlgateError, SqlgateResult},
    finding::{RuleCategory, Severity},
};

use crate::sql::{find_word, referenced_tables, SqlText};

/// The compiled pattern set shared by all rule predicates.
///
/// Built from the guardrail configuration so the tenant and temporal column
/// names are baked into the patterns.  Matching happens on the lowered,
/// comment-stripped text, so the patterns themselves are lowercase.
#[derive(Debug)]
pub(crate) struct SqlPatterns {
    /// `tenant_col = @param` — the only acceptable tenant predicate.
    pub tenant_bound: Regex,
    /// `tenant_col = 'literal'` or `tenant_col = 123` — hardcoded tenant.
    pub tenant_literal: Regex,
    /// `tenant_col =` / `tenant_col in` — any tenant predicate, used for
    /// join-scoping checks where column-to-column equality also counts.
    pub tenant_predicate: Regex,
    pub where_kw: Regex,
    pub join_kw: Regex,
    /// `SELECT *` projection.
    pub select_star: Regex,
    /// `EXISTS (SELECT * …` — the one permitted wildcard position.
    pub exists_star: Regex,
    /// String concatenation adjacent to a parameter token.
    pub concat_param: Regex,
    /// Dynamic-execution constructs.
    pub dynamic_exec: Regex,
    /// Parameter-bound comparison or BETWEEN on the temporal column.
    pub temporal_bound: Regex,
    /// GROUP BY or an aggregate function call.
    pub aggregation: Regex,
    /// Explicit row limit clause.
    pub row_limit: Regex,
    pub select_kw: Regex,
}

impl SqlPatterns {
    /// Compile the pattern set for `config`.
    ///
    /// Returns `SqlgateError::ConfigError` if a configured column name
    /// produces an uncompilable pattern.
    pub fn compile(config: &GuardrailConfig) -> SqlgateResult<Self> {
        let tenant = regex::escape(&config.tenant_column.to_ascii_lowercase());
        let temporal = regex::escape(&config.temporal_column.to_ascii_lowercase());

        let build = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SqlgateError::ConfigError {
                reason: format!("failed to compile guardrail pattern '{}': {}", pattern, e),
            })
        };

        Ok(Self {
            tenant_bound: build(&format!(r"\b{tenant}\s*=\s*@\w+"))?,
            tenant_literal: build(&format!(r"\b{tenant}\s*=\s*('[^']*'|\d+)"))?,
            tenant_predicate: build(&format!(r"\b{tenant}\s*(=|\bin\b)"))?,
            where_kw: build(r"\bwhere\b")?,
            join_kw: build(r"\bjoin\b")?,
            select_star: build(r"\bselect\s+\*")?,
            exists_star: build(r"\bexists\s*\(\s*select\s+\*")?,
            concat_param: build(r"(\|\|\s*@\w+|@\w+\s*\|\||'\s*\+\s*@\w+|@\w+\s*\+\s*')")?,
            dynamic_exec: build(r"\b(execute\s+immediate\b|exec\s*\(|execute\s*\()")?,
            temporal_bound: build(&format!(
                r"\b{temporal}\s*(between\s+@\w+\s+and\s+@\w+|(>=|<=|<|>|=)\s*@\w+)"
            ))?,
            aggregation: build(r"\bgroup\s+by\b|\b(count|sum|avg|min|max)\s*\(")?,
            row_limit: build(r"\blimit\s+(\d+|@\w+)|\bfetch\s+first\b|\btop\s+(\d+|@\w+)")?,
            select_kw: build(r"\bselect\b")?,
        })
    }
}

/// Everything a rule predicate may consult.
pub(crate) struct RuleContext<'a> {
    pub contract: &'a TemplateContract,
    pub tenant_id: &'a str,
    pub config: &'a GuardrailConfig,
    pub patterns: &'a SqlPatterns,
    /// True when the template is on the configured large-table list.
    pub large_table: bool,
}

type CheckFn = fn(&SqlText, &RuleContext<'_>) -> Option<String>;
type SeverityFn = fn(&RuleContext<'_>) -> Severity;

/// One row of the rule table.
pub(crate) struct RuleDef {
    pub id: &'static str,
    pub category: RuleCategory,
    pub severity: SeverityFn,
    /// Finding message when the rule passes.
    pub pass_message: &'static str,
    pub check: CheckFn,
}

/// The ordered rule table.  Order affects report readability only.
pub(crate) const RULES: &[RuleDef] = &[
    RuleDef {
        id: "tenant-filter-bound",
        category: RuleCategory::Security,
        severity: blocking,
        pass_message: "tenant-scoping column is bound to a parameter in a WHERE clause",
        check: check_tenant_filter_bound,
    },
    RuleDef {
        id: "no-unscoped-joins",
        category: RuleCategory::Security,
        severity: blocking,
        pass_message: "every JOIN is tenant-scoped at its own statement level",
        check: check_unscoped_joins,
    },
    RuleDef {
        id: "no-wildcard-projection",
        category: RuleCategory::Security,
        severity: blocking,
        pass_message: "projection is an explicit column list",
        check: check_wildcard_projection,
    },
    RuleDef {
        id: "no-dynamic-sql",
        category: RuleCategory::Security,
        severity: blocking,
        pass_message: "no string-built or dynamically executed SQL",
        check: check_dynamic_sql,
    },
    RuleDef {
        id: "date-bound-present",
        category: RuleCategory::Performance,
        severity: date_bound_severity,
        pass_message: "temporal scoping filter is present and parameter-bound",
        check: check_date_bound,
    },
    RuleDef {
        id: "partition-pruning",
        category: RuleCategory::Performance,
        severity: blocking,
        pass_message: "a partition column is referenced in a filtering position",
        check: check_partition_pruning,
    },
    RuleDef {
        id: "bounded-result-set",
        category: RuleCategory::Performance,
        severity: warning,
        pass_message: "result set is bounded or aggregated",
        check: check_bounded_result_set,
    },
    RuleDef {
        id: "restricted-table-access",
        category: RuleCategory::Governance,
        severity: blocking,
        pass_message: "no restricted table accessed without authorization",
        check: check_restricted_tables,
    },
    RuleDef {
        id: "pii-column-access",
        category: RuleCategory::Governance,
        severity: blocking,
        pass_message: "no PII column referenced without approval",
        check: check_pii_columns,
    },
    RuleDef {
        id: "well-formed-statement",
        category: RuleCategory::Structural,
        severity: blocking,
        pass_message: "statement has a SELECT list and a FROM clause",
        check: check_well_formed,
    },
];

// ── Severity functions ────────────────────────────────────────────────────────

fn blocking(_: &RuleContext<'_>) -> Severity {
    Severity::Blocking
}

fn warning(_: &RuleContext<'_>) -> Severity {
    Severity::Warning
}

/// A missing date bound is a WARNING, escalated to BLOCKING for templates
/// flagged as backed by a large table.
fn date_bound_severity(ctx: &RuleContext<'_>) -> Severity {
    if ctx.large_table {
        Severity::Blocking
    } else {
        Severity::Warning
    }
}

// ── Security predicates ───────────────────────────────────────────────────────

/// The tenant-scoping column must be bound to an `@param` inside a WHERE
/// clause.  A quoted or numeric literal is a hardcoded tenant and fails on
/// its own, even if a bound predicate also exists elsewhere.
fn check_tenant_filter_bound(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let p = ctx.patterns;
    let col = &ctx.config.tenant_column;

    if p.tenant_literal.is_match(&text.lowered) {
        return Some(format!(
            "tenant filter on '{}' must be a bound parameter, not a literal",
            col
        ));
    }

    let where_start = match p.where_kw.find(&text.lowered) {
        Some(m) => m.start(),
        None => {
            return Some(format!(
                "no WHERE clause binds '{}' for tenant '{}'",
                col, ctx.tenant_id
            ))
        }
    };

    let bound_in_where = p
        .tenant_bound
        .find_iter(&text.lowered)
        .any(|m| m.start() > where_start);

    if bound_in_where {
        None
    } else {
        Some(format!(
            "no equality predicate binding '{}' to a parameter inside a WHERE clause",
            col
        ))
    }
}

/// Every JOIN must be tenant-scoped at its own statement nesting level:
/// either the tenant column appears in the join's ON condition, or a WHERE
/// at the same paren depth later in the statement filters on it.  A tenant
/// filter inside an unrelated sub-select does not clear an outer join —
/// a deliberate tightening over any-later-WHERE matching, flagged for
/// domain-owner review.
fn check_unscoped_joins(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let p = ctx.patterns;
    let lowered = &text.lowered;

    for join in p.join_kw.find_iter(lowered) {
        let depth = text.depth_at(join.start());

        // The join clause runs from the JOIN keyword to the next structural
        // keyword at the same depth.
        let clause_end = clause_boundary(text, join.end(), depth);
        let clause = &lowered[join.end()..clause_end];

        if p.tenant_predicate.is_match(clause) {
            continue; // scoped in the ON condition
        }

        // Otherwise a WHERE at the join's own depth must filter on the
        // tenant column, also at that depth.
        let covered = p.where_kw.find_iter(lowered).any(|w| {
            w.start() > join.start()
                && text.depth_at(w.start()) == depth
                && p.tenant_predicate
                    .find_iter(lowered)
                    .any(|t| t.start() > w.end() && text.depth_at(t.start()) == depth)
        });

        if !covered {
            let table = referenced_tables(lowered)
                .into_iter()
                .find(|(pos, _)| *pos >= join.end())
                .map(|(_, name)| name)
                .unwrap_or_else(|| "<unknown>".to_string());
            return Some(format!(
                "JOIN on '{}' has no tenant filter in its ON condition or a same-level WHERE",
                table
            ));
        }
    }
    None
}

/// `SELECT *` is forbidden — explicit column lists keep the contract's
/// projected-column guarantee enforceable.  The only exemption is a wildcard
/// inside an `EXISTS (SELECT * …)` existence probe.
fn check_wildcard_projection(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let p = ctx.patterns;
    let exempt: Vec<std::ops::Range<usize>> = p
        .exists_star
        .find_iter(&text.lowered)
        .map(|m| m.range())
        .collect();

    for star in p.select_star.find_iter(&text.lowered) {
        let inside_exists = exempt
            .iter()
            .any(|r| r.start <= star.start() && star.end() <= r.end);
        if !inside_exists {
            return Some(
                "SELECT * is not allowed; project an explicit column list".to_string(),
            );
        }
    }
    None
}

/// String concatenation adjacent to a parameter token, or a dynamic
/// execution construct, bypasses the parameter-binding guarantee entirely.
fn check_dynamic_sql(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let p = ctx.patterns;
    if p.concat_param.is_match(&text.lowered) {
        return Some(
            "string concatenation adjacent to a parameter token (injection risk)".to_string(),
        );
    }
    if p.dynamic_exec.is_match(&text.lowered) {
        return Some("dynamic execution construct is not allowed".to_string());
    }
    None
}

// ── Performance predicates ────────────────────────────────────────────────────

/// A date-bounded contract requires a parameter-bound comparison or BETWEEN
/// on the temporal column.  Not applicable to undated templates.
fn check_date_bound(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    if !ctx.contract.date_bounded {
        return None;
    }
    if ctx.patterns.temporal_bound.is_match(&text.lowered) {
        None
    } else {
        Some(format!(
            "no parameter-bound range or comparison on '{}'",
            ctx.config.temporal_column
        ))
    }
}

/// At least one of the contract's partition columns must appear in a
/// filtering position — full-partition scans are disallowed by policy.
fn check_partition_pruning(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let columns = &ctx.contract.partition_columns;
    if columns.is_empty() {
        return Some("contract declares no partition columns to prune on".to_string());
    }

    let where_start = match ctx.patterns.where_kw.find(&text.lowered) {
        Some(m) => m.start(),
        None => {
            return Some(format!(
                "no WHERE clause references a partition column ({})",
                join_names(columns.iter())
            ))
        }
    };

    let pruned = columns.iter().any(|col| {
        find_word(&text.lowered, &col.to_ascii_lowercase())
            .iter()
            .any(|&pos| pos > where_start)
    });

    if pruned {
        None
    } else {
        Some(format!(
            "no partition column ({}) referenced in a filtering position",
            join_names(columns.iter())
        ))
    }
}

/// A join without aggregation needs an explicit row limit or a documented
/// `allow-unbounded` exemption marker.
fn check_bounded_result_set(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let p = ctx.patterns;
    if !p.join_kw.is_match(&text.lowered)
        || p.aggregation.is_match(&text.lowered)
        || p.row_limit.is_match(&text.lowered)
        || text.has_marker("allow-unbounded")
    {
        return None;
    }
    Some(
        "join without aggregation has no row limit (add LIMIT or an allow-unbounded exemption)"
            .to_string(),
    )
}

// ── Governance predicates ─────────────────────────────────────────────────────

/// Deny-listed tables require an `allow-restricted: <table>` comment marker.
fn check_restricted_tables(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let referenced = referenced_tables(&text.lowered);
    let mut unauthorized = Vec::new();

    for table in &ctx.config.restricted_tables {
        let lowered_table = table.to_ascii_lowercase();
        let accessed = referenced
            .iter()
            .any(|(_, name)| *name == lowered_table || name.ends_with(&format!(".{lowered_table}")));
        if accessed && !text.has_marker(&format!("allow-restricted: {lowered_table}")) {
            unauthorized.push(table.as_str());
        }
    }

    if unauthorized.is_empty() {
        None
    } else {
        Some(format!(
            "restricted table(s) [{}] accessed without an allow-restricted marker",
            unauthorized.join(", ")
        ))
    }
}

/// PII-listed columns require an `allow-pii: <column>` comment marker.
/// Matching runs on the comment-stripped text, so a PII name appearing only
/// inside a comment does not trigger (or satisfy) this rule.
fn check_pii_columns(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    let mut unapproved = Vec::new();

    for column in &ctx.config.pii_columns {
        let lowered_column = column.to_ascii_lowercase();
        if !find_word(&text.lowered, &lowered_column).is_empty()
            && !text.has_marker(&format!("allow-pii: {lowered_column}"))
        {
            unapproved.push(column.as_str());
        }
    }

    if unapproved.is_empty() {
        None
    } else {
        Some(format!(
            "PII column(s) [{}] referenced without an allow-pii marker",
            unapproved.join(", ")
        ))
    }
}

// ── Structural predicate ──────────────────────────────────────────────────────

/// Basic shape: non-empty statement, SELECT with a non-empty column list,
/// and a FROM clause naming a table.  A malformed statement is never
/// forwarded to the warehouse.
fn check_well_formed(text: &SqlText, ctx: &RuleContext<'_>) -> Option<String> {
    if text.stripped.trim().is_empty() {
        return Some("empty statement".to_string());
    }

    let select = match ctx.patterns.select_kw.find(&text.lowered) {
        Some(m) => m,
        None => return Some("statement has no SELECT".to_string()),
    };
    let select_depth = text.depth_at(select.start());

    let from_pos = find_word(&text.lowered, "from")
        .into_iter()
        .find(|&pos| pos > select.end() && text.depth_at(pos) == select_depth);
    let from_pos = match from_pos {
        Some(pos) => pos,
        None => return Some("statement has no FROM clause".to_string()),
    };

    let column_list = text.lowered[select.end()..from_pos]
        .trim()
        .trim_start_matches("distinct")
        .trim();
    if column_list.is_empty() {
        return Some("SELECT has an empty column list".to_string());
    }

    if referenced_tables(&text.lowered).is_empty() {
        return Some("FROM clause names no table".to_string());
    }

    None
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// End of the clause starting at `start`: the first structural keyword at
/// `depth`, or the end of the statement.
fn clause_boundary(text: &SqlText, start: usize, depth: u32) -> usize {
    let mut end = text.lowered.len();
    for kw in ["join", "where", "group", "order", "limit", "union"] {
        for pos in find_word(&text.lowered, kw) {
            if pos > start && text.depth_at(pos) == depth && pos < end {
                end = pos;
            }
        }
    }
    end
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(", ")
}
