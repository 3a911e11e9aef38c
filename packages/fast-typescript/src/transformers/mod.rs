//! Transformers
//!
//! Pluggable transpilation backends. A build selects one by name at startup,
//! loads it once and hands it the frozen compiler options; the backend then
//! turns each TypeScript source into JavaScript plus a source map.

mod api;
mod registry;

pub mod esbuild;
pub mod oxc;
pub mod process;
pub mod swc;

#[cfg(test)]
mod test;

pub use api::{unknown_transformer_message, TransformOutcome, TransformResult, Transformer, TransformerName};
pub use registry::{ActiveTransformer, LoadedTransformer, SelectedTransformer, TransformerFactory, TransformerRegistry};
