#![deny(clippy::all)]

//! fast-typescript
//!
//! Compiles TypeScript inside a bundler with a fast transpiler (oxc, esbuild
//! or swc) while reading `tsconfig.json` chains and resolving imports exactly
//! the way the TypeScript compiler does.
//!
//! A host creates one [`FastTypescript`] per plugin instance, calls
//! [`FastTypescript::build_start`] at the start of every build and routes its
//! resolve and transform hooks through the returned [`BuildSession`].

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod resolve;
pub mod transformers;
mod util;

// Re-exports
pub use config::{ConfigOption, ConfigSource};
pub use context::{CollectingContext, Location, PluginContext, PluginWarning};
pub use error::{ConfigSourceError, LoadError, PluginError};
pub use plugin::{BuildSession, FastTypescript};
pub use resolve::ResolveIdResult;
pub use transformers::{TransformResult, TransformerName, TransformerRegistry};
pub use util::readme;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
