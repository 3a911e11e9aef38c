//! TypeScript-compatible compiler model.
//!
//! This crate is the shared compatibility layer the plugin treats as the
//! reference compiler: compiler options, `tsconfig.json` reading with
//! `extends` chains, include/exclude matching and module resolution.

use serde::{Serialize, Serializer};
use std::fmt;

pub mod config_file;
pub mod extension;
pub mod matcher;
pub mod module_resolution;
pub mod options;
pub mod package_json;
pub mod path;
pub mod sys;
pub mod testing;

pub use config_file::*;
pub use extension::*;
pub use module_resolution::*;
pub use options::*;
pub use sys::*;

/// Version of the compiler whose semantics this crate follows.
pub const VERSION: &str = "5.6.3";

// --- Enums ---

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => [$canonical:literal $(, $alias:literal)*]),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            /// Spellings accepted in a configuration file.
            pub const VALUES: &'static [&'static str] = &[$($canonical $(, $alias)*),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical),*
                }
            }

            /// Parses a configuration-file spelling, ignoring case.
            pub fn parse(value: &str) -> Option<Self> {
                match value.to_ascii_lowercase().as_str() {
                    $($canonical $(| $alias)* => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Language level of the emitted code. Variants are ordered.
    pub enum ScriptTarget {
        ES3 => ["es3"],
        ES5 => ["es5"],
        ES2015 => ["es2015", "es6"],
        ES2016 => ["es2016"],
        ES2017 => ["es2017"],
        ES2018 => ["es2018"],
        ES2019 => ["es2019"],
        ES2020 => ["es2020"],
        ES2021 => ["es2021"],
        ES2022 => ["es2022"],
        ES2023 => ["es2023"],
        ESNext => ["esnext"],
    }
}

impl ScriptTarget {
    /// Upper-case spelling used in messages (`ES2015`, `ESNext`).
    pub fn display_name(&self) -> String {
        match self {
            ScriptTarget::ESNext => "ESNext".to_string(),
            other => other.as_str().to_ascii_uppercase(),
        }
    }
}

string_enum! {
    pub enum ModuleKind {
        None => ["none"],
        CommonJS => ["commonjs"],
        AMD => ["amd"],
        UMD => ["umd"],
        System => ["system"],
        ES2015 => ["es2015", "es6"],
        ES2020 => ["es2020"],
        ES2022 => ["es2022"],
        ESNext => ["esnext"],
        Node16 => ["node16"],
        NodeNext => ["nodenext"],
        Preserve => ["preserve"],
    }
}

string_enum! {
    pub enum JsxEmit {
        Preserve => ["preserve"],
        React => ["react"],
        ReactNative => ["react-native"],
        ReactJSX => ["react-jsx"],
        ReactJSXDev => ["react-jsxdev"],
    }
}

string_enum! {
    pub enum ModuleResolutionKind {
        Classic => ["classic"],
        Node10 => ["node10", "node"],
        Node16 => ["node16"],
        NodeNext => ["nodenext"],
        Bundler => ["bundler"],
    }
}

string_enum! {
    pub enum ModuleDetectionKind {
        Legacy => ["legacy"],
        Auto => ["auto"],
        Force => ["force"],
    }
}

string_enum! {
    pub enum NewLineKind {
        CarriageReturnLineFeed => ["crlf"],
        LineFeed => ["lf"],
    }
}

string_enum! {
    pub enum ImportsNotUsedAsValues {
        Remove => ["remove"],
        Preserve => ["preserve"],
        Error => ["error"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        f.write_str(s)
    }
}

// --- Diagnostic Structures ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticMessageChain {
    String(String),
    Chain {
        message_text: String,
        category: DiagnosticCategory,
        code: i32,
        next: Option<Vec<DiagnosticMessageChain>>,
    },
}

impl DiagnosticMessageChain {
    pub fn new(message: impl Into<String>) -> Self {
        Self::String(message.into())
    }
}

impl From<String> for DiagnosticMessageChain {
    fn from(s: String) -> Self {
        DiagnosticMessageChain::String(s)
    }
}

impl From<&str> for DiagnosticMessageChain {
    fn from(s: &str) -> Self {
        DiagnosticMessageChain::String(s.to_string())
    }
}

impl fmt::Display for DiagnosticMessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticMessageChain::String(s) => write!(f, "{}", s),
            DiagnosticMessageChain::Chain { message_text, .. } => write!(f, "{}", message_text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: i32,
    /// Configuration file the diagnostic is attributed to, if any.
    pub file: Option<String>,
    pub message_text: DiagnosticMessageChain,
}

impl Diagnostic {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: None,
            message_text: DiagnosticMessageChain::new(message),
        }
    }

    pub fn warning(code: i32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            file: None,
            message_text: DiagnosticMessageChain::new(message),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file)?;
        }
        write!(
            f,
            "{} TS{}: {}",
            self.category,
            self.code,
            flatten_diagnostic_message_text(&self.message_text, "\n")
        )
    }
}

// --- Utilities ---

pub fn make_diagnostic_chain(
    message_text: String,
    next: Option<Vec<DiagnosticMessageChain>>,
) -> DiagnosticMessageChain {
    DiagnosticMessageChain::Chain {
        category: DiagnosticCategory::Message,
        code: 0,
        message_text,
        next,
    }
}

pub fn add_diagnostic_chain(
    message_text: DiagnosticMessageChain,
    add: Vec<DiagnosticMessageChain>,
) -> DiagnosticMessageChain {
    match message_text {
        DiagnosticMessageChain::String(s) => make_diagnostic_chain(s, Some(add)),
        DiagnosticMessageChain::Chain {
            message_text,
            category,
            code,
            next,
        } => {
            let mut next_vec = next.unwrap_or_default();
            next_vec.extend(add);
            DiagnosticMessageChain::Chain {
                message_text,
                category,
                code,
                next: Some(next_vec),
            }
        }
    }
}

/// Flattens a message chain into text, indenting each nested level by two spaces.
pub fn flatten_diagnostic_message_text(chain: &DiagnosticMessageChain, new_line: &str) -> String {
    fn walk(chain: &DiagnosticMessageChain, new_line: &str, indent: usize, out: &mut String) {
        if indent > 0 {
            out.push_str(new_line);
            out.push_str(&"  ".repeat(indent));
        }
        match chain {
            DiagnosticMessageChain::String(s) => out.push_str(s),
            DiagnosticMessageChain::Chain {
                message_text, next, ..
            } => {
                out.push_str(message_text);
                for child in next.iter().flatten() {
                    walk(child, new_line, indent + 1, out);
                }
            }
        }
    }

    let mut out = String::new();
    walk(chain, new_line, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enum_spellings_case_insensitively() {
        assert_eq!(ScriptTarget::parse("ES2015"), Some(ScriptTarget::ES2015));
        assert_eq!(ScriptTarget::parse("es6"), Some(ScriptTarget::ES2015));
        assert_eq!(ScriptTarget::parse("ESNext"), Some(ScriptTarget::ESNext));
        assert_eq!(ScriptTarget::parse("es1"), None);
        assert_eq!(ModuleResolutionKind::parse("Node"), Some(ModuleResolutionKind::Node10));
        assert_eq!(JsxEmit::parse("react-jsxdev"), Some(JsxEmit::ReactJSXDev));
    }

    #[test]
    fn targets_are_ordered() {
        assert!(ScriptTarget::ES3 < ScriptTarget::ES5);
        assert!(ScriptTarget::ES2022 < ScriptTarget::ESNext);
        assert_eq!(ScriptTarget::ES2015.display_name(), "ES2015");
        assert_eq!(ScriptTarget::ESNext.display_name(), "ESNext");
    }

    #[test]
    fn flattens_nested_chains() {
        let chain = make_diagnostic_chain(
            "outer".to_string(),
            Some(vec![DiagnosticMessageChain::new("inner")]),
        );
        assert_eq!(flatten_diagnostic_message_text(&chain, "\n"), "outer\n  inner");
    }
}
