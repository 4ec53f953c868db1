//! # sqlgate-guardrails
//!
//! The guardrail rule engine for the sqlgate governance layer.
//!
//! ## Overview
//!
//! This crate provides [`GuardrailEngine`], which implements the
//! [`sqlgate_core::traits::RuleEngine`] trait.  Rules live in one ordered,
//! declarative table (`rule id → category → severity → predicate`) covering
//! four categories: security, performance, governance, and structural
//! validity.  Every rule emits a finding, passed or failed, so a verdict
//! shows the complete sweep.
//!
//! SQL comments are stripped before any rule matches — a tenant filter that
//! exists only inside a comment never satisfies a security rule.  Comment
//! text is retained separately for the governance markers
//! (`allow-restricted: <table>`, `allow-pii: <column>`, `allow-unbounded`).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sqlgate_contracts::GuardrailConfig;
//! use sqlgate_guardrails::GuardrailEngine;
//!
//! let engine = GuardrailEngine::new(GuardrailConfig::default())?;
//! let findings = engine.evaluate(sql_text, &contract, "t-acme");
//! ```

pub mod engine;
mod rules;
pub mod sql;

pub use engine::GuardrailEngine;
pub use sql::SqlText;
