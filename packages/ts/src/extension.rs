//! File extensions understood by the compiler.

use bitflags::bitflags;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Ts,
    Tsx,
    Dts,
    Js,
    Jsx,
    Json,
    Mts,
    Cts,
    Dmts,
    Dcts,
    Mjs,
    Cjs,
}

impl Extension {
    /// Longest spellings first so `.d.ts` wins over `.ts`.
    pub const ALL: &'static [Extension] = &[
        Extension::Dts,
        Extension::Dmts,
        Extension::Dcts,
        Extension::Ts,
        Extension::Tsx,
        Extension::Mts,
        Extension::Cts,
        Extension::Js,
        Extension::Jsx,
        Extension::Mjs,
        Extension::Cjs,
        Extension::Json,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Ts => ".ts",
            Extension::Tsx => ".tsx",
            Extension::Dts => ".d.ts",
            Extension::Js => ".js",
            Extension::Jsx => ".jsx",
            Extension::Json => ".json",
            Extension::Mts => ".mts",
            Extension::Cts => ".cts",
            Extension::Dmts => ".d.mts",
            Extension::Dcts => ".d.cts",
            Extension::Mjs => ".mjs",
            Extension::Cjs => ".cjs",
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self, Extension::Dts | Extension::Dmts | Extension::Dcts)
    }

    pub fn is_typescript(&self) -> bool {
        matches!(
            self,
            Extension::Ts
                | Extension::Tsx
                | Extension::Mts
                | Extension::Cts
                | Extension::Dts
                | Extension::Dmts
                | Extension::Dcts
        )
    }

    pub fn is_javascript(&self) -> bool {
        matches!(
            self,
            Extension::Js | Extension::Jsx | Extension::Mjs | Extension::Cjs
        )
    }

    /// Extension of `path`, preferring declaration spellings.
    pub fn of(path: &str) -> Option<Extension> {
        Self::ALL
            .iter()
            .copied()
            .find(|ext| path.len() > ext.as_str().len() && path.ends_with(ext.as_str()))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_declaration_extension(path: &str) -> bool {
    Extension::of(path).is_some_and(|ext| ext.is_declaration())
}

/// Strips a known extension, or returns `path` unchanged.
pub fn remove_file_extension(path: &str) -> &str {
    match Extension::of(path) {
        Some(ext) => &path[..path.len() - ext.as_str().len()],
        None => path,
    }
}

bitflags! {
    /// Families of extensions a resolution pass may produce.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Extensions: u8 {
        const TYPESCRIPT = 1 << 0;
        const JAVASCRIPT = 1 << 1;
        const DECLARATION = 1 << 2;
        const JSON = 1 << 3;
    }
}

impl Extensions {
    pub fn allows(&self, ext: Extension) -> bool {
        if ext.is_declaration() {
            self.contains(Extensions::DECLARATION)
        } else if ext.is_typescript() {
            self.contains(Extensions::TYPESCRIPT)
        } else if ext.is_javascript() {
            self.contains(Extensions::JAVASCRIPT)
        } else {
            self.contains(Extensions::JSON)
        }
    }

    /// Candidate extensions to append to an extensionless path, in priority order.
    pub fn candidates(&self, module_suffix_kind: Option<Extension>) -> Vec<Extension> {
        let mut out = Vec::new();
        match module_suffix_kind {
            Some(Extension::Mjs) | Some(Extension::Mts) => {
                if self.contains(Extensions::TYPESCRIPT) {
                    out.push(Extension::Mts);
                }
                if self.contains(Extensions::DECLARATION) {
                    out.push(Extension::Dmts);
                }
                if self.contains(Extensions::JAVASCRIPT) {
                    out.push(Extension::Mjs);
                }
            }
            Some(Extension::Cjs) | Some(Extension::Cts) => {
                if self.contains(Extensions::TYPESCRIPT) {
                    out.push(Extension::Cts);
                }
                if self.contains(Extensions::DECLARATION) {
                    out.push(Extension::Dcts);
                }
                if self.contains(Extensions::JAVASCRIPT) {
                    out.push(Extension::Cjs);
                }
            }
            _ => {
                if self.contains(Extensions::TYPESCRIPT) {
                    out.extend([Extension::Ts, Extension::Tsx]);
                }
                if self.contains(Extensions::DECLARATION) {
                    out.push(Extension::Dts);
                }
                if self.contains(Extensions::JAVASCRIPT) {
                    out.extend([Extension::Js, Extension::Jsx]);
                }
            }
        }
        out
    }
}
