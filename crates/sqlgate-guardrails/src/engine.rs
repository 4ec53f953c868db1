//! The guardrail rule engine.
//!
//! `GuardrailEngine` implements the `RuleEngine` trait from sqlgate-core.
//! Evaluation is a full sweep: the rendered SQL is prepared once (comments
//! stripped, depth map computed), then every rule in the table runs and
//! emits exactly one finding — passed or failed — so the verdict shows the
//! complete picture.  Rules never see the raw SQL; only the prepared text.

use std::path::Path;

use tracing::{debug, warn};

use sqlgate_contracts::{
    config::GuardrailConfig,
    contract::TemplateContract,
    error::{SqlgateError, SqlgateResult},
    finding::GuardrailFinding,
};
use sqlgate_core::traits::RuleEngine;

use crate::rules::{RuleContext, SqlPatterns, RULES};
use crate::sql::SqlText;

/// The sqlgate guardrail engine.
///
/// Construct once per configuration and share behind an `Arc`; the engine
/// holds only the config and the compiled pattern set, so evaluation is
/// lock-free and safe from any thread.
#[derive(Debug)]
pub struct GuardrailEngine {
    config: GuardrailConfig,
    patterns: SqlPatterns,
}

impl GuardrailEngine {
    /// Build an engine for `config`, compiling the pattern set.
    ///
    /// Returns `SqlgateError::ConfigError` if a configured column name
    /// produces an uncompilable pattern.
    pub fn new(config: GuardrailConfig) -> SqlgateResult<Self> {
        let patterns = SqlPatterns::compile(&config)?;
        Ok(Self { config, patterns })
    }

    /// Parse `s` as a TOML guardrail configuration and build an engine.
    pub fn from_config_toml(s: &str) -> SqlgateResult<Self> {
        let config: GuardrailConfig =
            toml::from_str(s).map_err(|e| SqlgateError::ConfigError {
                reason: format!("failed to parse guardrail config TOML: {}", e),
            })?;
        Self::new(config)
    }

    /// Read the file at `path` and parse it as TOML guardrail configuration.
    pub fn from_config_file(path: &Path) -> SqlgateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SqlgateError::ConfigError {
            reason: format!(
                "failed to read guardrail config '{}': {}",
                path.display(),
                e
            ),
        })?;
        Self::from_config_toml(&contents)
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }
}

impl RuleEngine for GuardrailEngine {
    /// Run every rule in the table against `sql_text`.
    ///
    /// Comments are stripped before any rule matches; governance rules read
    /// the retained comment text for their markers.  One finding per rule,
    /// in table order.
    fn evaluate(
        &self,
        sql_text: &str,
        contract: &TemplateContract,
        tenant_id: &str,
    ) -> Vec<GuardrailFinding> {
        let text = SqlText::parse(sql_text);
        let ctx = RuleContext {
            contract,
            tenant_id,
            config: &self.config,
            patterns: &self.patterns,
            large_table: self.config.is_large_table(&contract.template_id),
        };

        let mut findings = Vec::with_capacity(RULES.len());
        for rule in RULES {
            let severity = (rule.severity)(&ctx);
            let failure = (rule.check)(&text, &ctx);

            match &failure {
                Some(message) => warn!(
                    rule_id = rule.id,
                    template_id = %contract.template_id,
                    %message,
                    "guardrail rule failed"
                ),
                None => debug!(rule_id = rule.id, "guardrail rule passed"),
            }

            findings.push(GuardrailFinding {
                rule_id: rule.id.to_string(),
                category: rule.category,
                severity,
                passed: failure.is_none(),
                message: failure.unwrap_or_else(|| rule.pass_message.to_string()),
            });
        }
        findings
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
