//! sqlgate — Governance Layer Demo CLI
//!
//! Runs one or all of the validation scenarios against a reference contract
//! catalog.  Each scenario uses real sqlgate components (registry, contract
//! validator, guardrail engine, pipeline, reporter) wired together exactly
//! as the agent orchestration layer would.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- clean-query
//!   cargo run -p demo -- wildcard-leak
//!   cargo run -p demo -- cross-tenant-join
//!   cargo run -p demo -- contract-drift

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sqlgate_contracts::{
    contract::{ColumnType, RenderedQuery, ResponseSchema},
    config::GuardrailConfig,
    error::SqlgateResult,
};
use sqlgate_core::ValidationPipeline;
use sqlgate_guardrails::GuardrailEngine;
use sqlgate_registry::{ContractValidator, TomlContractRegistry};
use sqlgate_report::VerdictReporter;

/// The reference contract catalog used by every scenario.
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

// ── CLI definition ────────────────────────────────────────────────────────────

/// sqlgate — SQL governance layer demo.
///
/// Each subcommand validates one rendered query through the full pipeline
/// and prints the audit report.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "sqlgate governance layer demo",
    long_about = "Validates rendered SQL through the sqlgate pipeline:\n\
                  contract resolution, contract consistency checks, and the\n\
                  guardrail rule sweep, ending in an ALLOW/BLOCK audit report."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: fully compliant rendering → ALLOW.
    CleanQuery,
    /// Scenario 2: SELECT * with a hardcoded tenant literal → BLOCK.
    WildcardLeak,
    /// Scenario 3: JOIN with no tenant scoping anywhere → BLOCK.
    CrossTenantJoin,
    /// Scenario 4: contract projection drifted from the response schema → BLOCK.
    ContractDrift,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::CleanQuery => run_clean_query(),
        Command::WildcardLeak => run_wildcard_leak(),
        Command::CrossTenantJoin => run_cross_tenant_join(),
        Command::ContractDrift => run_contract_drift(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Pipeline wiring ───────────────────────────────────────────────────────────

fn build_pipeline() -> SqlgateResult<ValidationPipeline> {
    let config = GuardrailConfig::default();
    let registry = TomlContractRegistry::from_toml_str(CATALOG, &config)?;
    let validator = ContractValidator::new(&config);
    let engine = GuardrailEngine::new(config)?;

    Ok(ValidationPipeline::new(
        Arc::new(registry),
        Arc::new(validator),
        Arc::new(engine),
    ))
}

fn spike_schema() -> ResponseSchema {
    ResponseSchema::from_pairs([
        ("customer_id", ColumnType::String),
        ("overdue_14d", ColumnType::Number),
        ("overdue_prev_60d", ColumnType::Number),
        ("spike_pct", ColumnType::Number),
    ])
}

fn validate_and_print(name: &str, query: RenderedQuery, schema: &ResponseSchema) -> SqlgateResult<()> {
    println!("── Scenario: {name} ──");

    let pipeline = build_pipeline()?;
    let verdict = pipeline.validate(&query, schema)?;

    let reporter = VerdictReporter::new();
    let report = reporter.report(&verdict);
    println!("{}", reporter.to_json_pretty(&report)?);
    println!(
        "gate: {}",
        if report.allowed() { "forward for execution" } else { "rejected" }
    );
    println!();
    Ok(())
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> SqlgateResult<()> {
    run_clean_query()?;
    run_wildcard_leak()?;
    run_cross_tenant_join()?;
    run_contract_drift()?;
    Ok(())
}

fn run_clean_query() -> SqlgateResult<()> {
    let query = RenderedQuery {
        template_id: "ar_spike_14v60".to_string(),
        tenant_id: "t-acme".to_string(),
        sql_text: "SELECT customer_id, overdue_14d, overdue_prev_60d, spike_pct \
                   FROM curated_ar \
                   WHERE tenant_id = @tenant_id \
                     AND as_of_date BETWEEN @start AND @end \
                     AND yyyy_mm IN (@parts)"
            .to_string(),
        template_version: Some("v1".to_string()),
    };
    validate_and_print("clean query (expect ALLOW)", query, &spike_schema())
}

fn run_wildcard_leak() -> SqlgateResult<()> {
    // The rendering a naive template produces: wildcard projection and a
    // tenant id interpolated as a literal instead of a bound parameter.
    let query = RenderedQuery {
        template_id: "ar_spike_14v60".to_string(),
        tenant_id: "t-acme".to_string(),
        sql_text: "SELECT * FROM ar_comparative_analysis WHERE tenant_id='acme'".to_string(),
        template_version: Some("v1".to_string()),
    };
    validate_and_print("wildcard + literal tenant (expect BLOCK)", query, &spike_schema())
}

fn run_cross_tenant_join() -> SqlgateResult<()> {
    let query = RenderedQuery {
        template_id: "ar_spike_14v60".to_string(),
        tenant_id: "t-acme".to_string(),
        sql_text: "SELECT i.customer_id, i.overdue_14d \
                   FROM ar_invoices i \
                   JOIN customers c ON c.customer_id = i.customer_id"
            .to_string(),
        template_version: Some("v1".to_string()),
    };
    validate_and_print("cross-tenant join (expect BLOCK)", query, &spike_schema())
}

fn run_contract_drift() -> SqlgateResult<()> {
    // ar_aging projects two columns, but the agent-facing schema has since
    // grown spike_pct — the contract check must catch the drift.
    let query = RenderedQuery {
        template_id: "ar_aging".to_string(),
        tenant_id: "t-acme".to_string(),
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
    validate_and_print("contract drift (expect BLOCK)", query, &schema)
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("sqlgate — SQL Governance Layer");
    println!("Reference Demo");
    println!("==============================");
    println!();
    println!("sqlgate validation pipeline per query:");
    println!("  [1] Resolve the template contract from the registry");
    println!("  [2] Contract consistency check against the response schema");
    println!("  [3] Guardrail rule sweep over the comment-stripped SQL");
    println!("  [4] Aggregate: ALLOW only if the contract holds and no");
    println!("      BLOCKING rule failed");
    println!("  [5] Audit report with SHA-256 verdict digest");
    println!();
}
