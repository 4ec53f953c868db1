//! # sqlgate-registry
//!
//! The TOML-driven template contract registry and the contract validator
//! for the sqlgate governance layer.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`TomlContractRegistry`] — implements
//!   [`sqlgate_core::traits::ContractRegistry`].  Contracts are declared in
//!   a TOML catalog and validated once at load time, so authoring mistakes
//!   fail fast instead of surfacing per query.
//! - [`ContractValidator`] — implements
//!   [`sqlgate_core::traits::ContractChecker`].  Checks a resolved contract
//!   for internal consistency and two-way conformance with the agent-facing
//!   response schema, collecting every violation in one pass.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sqlgate_contracts::GuardrailConfig;
//! use sqlgate_registry::{ContractValidator, TomlContractRegistry};
//!
//! let config = GuardrailConfig::default();
//! let registry = TomlContractRegistry::from_file(Path::new("catalog.toml"), &config)?;
//! let validator = ContractValidator::new(&config);
//! ```

pub mod registry;
pub mod validate;

pub use registry::TomlContractRegistry;
pub use validate::ContractValidator;
