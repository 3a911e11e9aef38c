// Transformer API
//
// The contract every backend implements.

use crate::context::PluginContext;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use ts::CompilerOptions;

/// Backends this crate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformerName {
    #[default]
    Oxc,
    Esbuild,
    Swc,
}

impl TransformerName {
    pub const ALL: &'static [TransformerName] = &[TransformerName::Oxc, TransformerName::Esbuild, TransformerName::Swc];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerName::Oxc => "oxc",
            TransformerName::Esbuild => "esbuild",
            TransformerName::Swc => "swc",
        }
    }

    /// Exact, case-sensitive match.
    pub fn parse(name: &str) -> Option<TransformerName> {
        Self::ALL.iter().copied().find(|known| known.as_str() == name)
    }
}

impl fmt::Display for TransformerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformerName::parse(s).ok_or_else(|| unknown_transformer_message(s))
    }
}

/// `Unknown transformer name "x"`, with the name JSON-quoted.
pub fn unknown_transformer_message(name: &str) -> String {
    let quoted = serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name));
    format!("Unknown transformer name {}", quoted)
}

/// What a backend made of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Success { code: String, map: Option<String> },
    /// Not a file this backend handles.
    Skip,
    Failure(String),
}

/// Transformed code returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub code: String,
    /// Source map as JSON text.
    pub map: Option<String>,
}

/// A transform backend.
///
/// `configure` runs once per build before any `transform`; `transform` is
/// then called concurrently for different files and must not mutate state.
pub trait Transformer: Send + Sync {
    fn name(&self) -> TransformerName;

    /// Maps compiler options onto backend options. Errors are fatal to the build.
    fn configure(&mut self, ctx: &dyn PluginContext, options: &CompilerOptions) -> Result<(), String>;

    fn transform(&self, ctx: &dyn PluginContext, source: &str, path: &str) -> TransformOutcome;
}
