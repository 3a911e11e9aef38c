//! Import resolution
//!
//! Resolves specifiers imported from TypeScript sources with the reference
//! compiler's rules, so that paths, baseUrl and `.js` → `.ts` mapping behave
//! the way the type checker sees them.

mod cache;


pub use cache::ResolveIdCache;
pub use crate::util::extname;

use std::path::PathBuf;
use tracing::debug;
use ts::{resolve_module_name, CompilerOptions, ModuleResolutionCache, System};

const TS_SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];
const TS_DECLARATION_EXTENSIONS: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Prefix bundlers put on ids of modules that exist only in memory.
pub const VIRTUAL_MODULE_PREFIX: char = '\0';

/// Answer to a host resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveIdResult {
    /// Not ours: let the host's own resolution apply.
    PassThrough,
    /// Resolvable, but only to type declarations, which are never bundled.
    Declined,
    Resolved(PathBuf),
}

/// `.ts`, `.tsx`, `.mts` or `.cts`, but not a declaration file.
pub fn is_ts_source_file(path: &str) -> bool {
    let ext = extname(path);
    !is_declaration_extension(ext) && TS_SOURCE_EXTENSIONS.iter().any(|source| ext.ends_with(source))
}

/// `.d.ts`, `.d.mts` or `.d.cts`, including `name.generated.d.ts`.
pub fn is_ts_declaration_file(path: &str) -> bool {
    is_declaration_extension(extname(path))
}

fn is_declaration_extension(ext: &str) -> bool {
    TS_DECLARATION_EXTENSIONS.iter().any(|decl| ext.ends_with(decl))
}

/// Whether a request is ours to answer at all.
pub fn should_resolve(specifier: &str, importer: Option<&str>, is_entry: bool) -> bool {
    match importer {
        Some(importer) => {
            !is_entry && is_ts_source_file(importer) && !specifier.starts_with(VIRTUAL_MODULE_PREFIX)
        }
        None => false,
    }
}

/// One uncached lookup through the reference resolver.
pub fn resolve_import(
    specifier: &str,
    importer: &str,
    options: &CompilerOptions,
    system: &dyn System,
    module_cache: Option<&ModuleResolutionCache>,
) -> ResolveIdResult {
    let resolution = resolve_module_name(specifier, importer, options, system, module_cache);
    let result = match resolution.resolved_module {
        Some(module) if module.extension.is_declaration() => ResolveIdResult::Declined,
        Some(module) => ResolveIdResult::Resolved(PathBuf::from(module.resolved_file_name)),
        None => ResolveIdResult::PassThrough,
    };
    debug!(specifier, importer, ?result, "resolved import");
    result
}
