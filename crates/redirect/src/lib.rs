#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`validate`]: Field value validators (`Validator`, `ValueError`)
//! - [`registry`]: Recognized annotation fields (`Field`, `FieldSpec`, `FieldRegistry`, `RedirectDefaults`)
//! - [`resolver`]: Per-field resolution (`AnnotationResolver`, `ResolvedField`)
//! - [`redirect`]: Configuration object and builder (`RedirectConfig`, `RedirectConfigBuilder`)
//! - [`render`]: Invocation rendering (`render`, `RedirectInvocation`, `ToolPaths`)
//! - [`runner`]: External process abstraction (`CommandRunner` trait, `ProcessCommandRunner`)
//! - [`executor`]: Redirect setup execution (`RedirectExecutor`)
//! - [`error`]: Domain error types (`RedirectError`, `ValidationError`)
//!
//! # Architecture
//!
//! ```text
//! annotations --> RedirectConfigBuilder
//!                      |
//!                 AnnotationResolver.resolve()  (per field, FieldRegistry)
//!                      |
//!                 RedirectConfig
//!                      |
//!                 render() --> RedirectInvocation
//!                      |
//!                 RedirectExecutor.execute() --> CommandRunner --> nsenter
//! ```

pub mod error;
pub mod executor;
pub mod redirect;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod runner;
pub mod validate;

// --- Public API Re-exports ---

// Configuration builder
pub use redirect::{RedirectConfig, RedirectConfigBuilder};

// Registry
pub use registry::{Field, FieldRegistry, FieldSpec, RedirectDefaults};

// Resolver
pub use resolver::{AnnotationResolver, ResolvedField};

// Validation
pub use validate::{Validator, ValueError};

// Rendering
pub use render::{RedirectInvocation, ToolPaths, render};

// Execution
pub use executor::RedirectExecutor;
pub use runner::{CommandOutput, CommandRunner, ProcessCommandRunner};

// Error
pub use error::{RedirectError, ValidationError};
