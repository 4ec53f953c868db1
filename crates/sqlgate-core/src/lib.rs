//! # sqlgate-core
//!
//! The fail-closed validation pipeline for the sqlgate governance layer.
//!
//! This crate provides:
//! - The four core traits (`ContractRegistry`, `ContractChecker`,
//!   `RuleEngine`, `SqlRenderer`)
//! - The `ValidationPipeline` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqlgate_core::{ValidationPipeline, traits::ContractRegistry};
//!
//! let pipeline = ValidationPipeline::new(registry, checker, engine);
//! let verdict = pipeline.validate(&query, &expected_schema)?;
//! ```

pub mod pipeline;
pub mod traits;

pub use pipeline::ValidationPipeline;
