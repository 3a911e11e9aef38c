//! Module Resolution
//!
//! Maps an import specifier to a file the way the compiler does: `paths`
//! and `baseUrl`, relative lookups with extension substitution, and
//! `node_modules` packages (including `@types` and `exports`).

use crate::extension::{Extension, Extensions};
use crate::package_json::{mangle_scoped_package_name, parse_package_specifier, resolve_package_exports, PackageJson};
use crate::path::{
    ancestor_directories, combine_paths, get_base_file_name, get_directory_path,
    is_external_module_name_relative, normalize_path, path_is_relative,
};
use crate::sys::System;
use crate::{CompilerOptions, ModuleResolutionKind};
use dashmap::DashMap;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModuleFull {
    pub resolved_file_name: String,
    /// Path before symbolic links were resolved, when it differs.
    pub original_path: Option<String>,
    pub extension: Extension,
    pub is_external_library_import: bool,
    pub resolved_using_ts_extension: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedModuleWithFailedLookupLocations {
    pub resolved_module: Option<ResolvedModuleFull>,
    pub failed_lookup_locations: Vec<String>,
}

/// Results shared across lookups made with one set of options.
///
/// Keyed by (containing directory, module name). Safe to share between threads.
#[derive(Debug)]
pub struct ModuleResolutionCache {
    current_directory: String,
    resolution_kind: ModuleResolutionKind,
    entries: DashMap<(String, String), ResolvedModuleWithFailedLookupLocations>,
}

impl ModuleResolutionCache {
    pub fn new(current_directory: &str, options: &CompilerOptions) -> Self {
        Self {
            current_directory: normalize_path(current_directory),
            resolution_kind: options.get_emit_module_resolution_kind(),
            entries: DashMap::new(),
        }
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    pub fn resolution_kind(&self) -> ModuleResolutionKind {
        self.resolution_kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn get(&self, directory: &str, module_name: &str) -> Option<ResolvedModuleWithFailedLookupLocations> {
        self.entries
            .get(&(directory.to_string(), module_name.to_string()))
            .map(|entry| entry.value().clone())
    }

    fn set(&self, directory: &str, module_name: &str, result: &ResolvedModuleWithFailedLookupLocations) {
        self.entries
            .insert((directory.to_string(), module_name.to_string()), result.clone());
    }
}

struct Resolved {
    path: String,
    extension: Extension,
    using_ts_extension: bool,
}

struct Resolver<'a> {
    options: &'a CompilerOptions,
    host: &'a dyn System,
    kind: ModuleResolutionKind,
    conditions: Vec<String>,
    failed_lookup_locations: Vec<String>,
}

/// Extension families tried for each member of the JavaScript family, in order.
fn substitutions(ext: Extension) -> &'static [Extension] {
    match ext {
        Extension::Js => &[Extension::Ts, Extension::Tsx, Extension::Dts],
        Extension::Jsx => &[Extension::Tsx, Extension::Dts],
        Extension::Mjs => &[Extension::Mts, Extension::Dmts],
        Extension::Cjs => &[Extension::Cts, Extension::Dcts],
        _ => &[],
    }
}

impl<'a> Resolver<'a> {
    fn new(options: &'a CompilerOptions, host: &'a dyn System, containing_file: &str) -> Self {
        let kind = options.get_emit_module_resolution_kind();
        let mut conditions = vec!["types".to_string()];
        conditions.push(if containing_file.ends_with(".cts") || containing_file.ends_with(".cjs") {
            "require".to_string()
        } else {
            "import".to_string()
        });
        if matches!(kind, ModuleResolutionKind::Node16 | ModuleResolutionKind::NodeNext) {
            conditions.push("node".to_string());
        }
        conditions.extend(options.custom_conditions.iter().flatten().cloned());

        Self {
            options,
            host,
            kind,
            conditions,
            failed_lookup_locations: Vec::new(),
        }
    }

    fn file_exists(&mut self, path: &str) -> bool {
        if self.host.file_exists(path) {
            true
        } else {
            self.failed_lookup_locations.push(path.to_string());
            false
        }
    }

    fn try_file(&mut self, path: &str, extensions: Extensions) -> Option<Resolved> {
        let extension = Extension::of(path)?;
        if !extensions.allows(extension) || !self.file_exists(path) {
            return None;
        }
        Some(Resolved {
            path: path.to_string(),
            extension,
            using_ts_extension: false,
        })
    }

    /// `<stem><suffix><ext>` for every candidate extension and module suffix.
    fn try_adding_extensions(&mut self, stem: &str, extensions: Extensions, original: Option<Extension>) -> Option<Resolved> {
        let suffixes: Vec<String> = match &self.options.module_suffixes {
            Some(suffixes) if !suffixes.is_empty() => suffixes.clone(),
            _ => vec![String::new()],
        };
        for ext in extensions.candidates(original) {
            for suffix in &suffixes {
                let candidate = format!("{}{}{}", stem, suffix, ext.as_str());
                if let Some(found) = self.try_file(&candidate, extensions) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn load_module_from_file(&mut self, candidate: &str, extensions: Extensions) -> Option<Resolved> {
        match Extension::of(candidate) {
            Some(ext) if ext.is_javascript() => {
                let stem = &candidate[..candidate.len() - ext.as_str().len()];
                for replacement in substitutions(ext) {
                    let path = format!("{}{}", stem, replacement.as_str());
                    if let Some(found) = self.try_file(&path, extensions) {
                        return Some(found);
                    }
                }
                if let Some(found) = self.try_file(candidate, extensions) {
                    return Some(found);
                }
                // `./foo.js` may still name `foo.js.ts`.
                self.try_adding_extensions(candidate, extensions, None)
            }
            Some(ext) if ext.is_typescript() => {
                let mut found = self.try_file(candidate, extensions)?;
                found.using_ts_extension = !ext.is_declaration();
                Some(found)
            }
            Some(Extension::Json) => self
                .try_file(candidate, extensions)
                .or_else(|| self.try_adding_extensions(candidate, extensions, None)),
            _ => self.try_adding_extensions(candidate, extensions, None),
        }
    }

    fn read_package_json(&mut self, directory: &str) -> Option<PackageJson> {
        let path = combine_paths(directory, "package.json");
        if !self.file_exists(&path) {
            return None;
        }
        self.host.read_file(&path).and_then(|text| PackageJson::parse(&text))
    }

    fn load_directory(&mut self, directory: &str, extensions: Extensions) -> Option<Resolved> {
        if self.host.directory_exists(directory) {
            if let Some(package) = self.read_package_json(directory) {
                let mut entries = Vec::new();
                if extensions.intersects(Extensions::TYPESCRIPT | Extensions::DECLARATION) {
                    entries.extend(package.types.clone());
                }
                entries.extend(package.main.clone());
                for entry in entries {
                    let path = normalize_path(&combine_paths(directory, &entry));
                    let found = self
                        .load_module_from_file(&path, extensions)
                        .or_else(|| self.load_index(&path, extensions));
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }
        self.load_index(directory, extensions)
    }

    fn load_index(&mut self, directory: &str, extensions: Extensions) -> Option<Resolved> {
        self.try_adding_extensions(&combine_paths(directory, "index"), extensions, None)
    }

    fn load_file_or_directory(&mut self, candidate: &str, extensions: Extensions) -> Option<Resolved> {
        self.load_module_from_file(candidate, extensions)
            .or_else(|| self.load_directory(candidate, extensions))
    }

    fn try_paths(&mut self, module_name: &str, extensions: Extensions) -> Option<Resolved> {
        let options = self.options;
        let paths = options.paths.as_ref()?;
        let base = options
            .base_url
            .clone()
            .or_else(|| options.paths_base_path.clone())
            .unwrap_or_else(|| self.host.get_current_directory());

        let (targets, star) = match paths.get(module_name) {
            Some(targets) if !module_name.contains('*') => (targets.clone(), String::new()),
            _ => {
                let mut best: Option<(usize, &Vec<String>, &str)> = None;
                for (pattern, targets) in paths {
                    let Some((prefix, suffix)) = pattern.split_once('*') else {
                        continue;
                    };
                    if module_name.len() >= prefix.len() + suffix.len()
                        && module_name.starts_with(prefix)
                        && module_name.ends_with(suffix)
                        && best.map_or(true, |(len, _, _)| prefix.len() > len)
                    {
                        let matched = &module_name[prefix.len()..module_name.len() - suffix.len()];
                        best = Some((prefix.len(), targets, matched));
                    }
                }
                let (_, targets, matched) = best?;
                (targets.clone(), matched.to_string())
            }
        };

        for target in targets {
            let substituted = target.replacen('*', &star, 1);
            let candidate = normalize_path(&combine_paths(&base, &substituted));
            trace!(module = module_name, candidate = %candidate, "trying paths mapping");
            if let Some(found) = self.load_file_or_directory(&candidate, extensions) {
                return Some(found);
            }
        }
        None
    }

    fn load_from_package(&mut self, node_modules: &str, module_name: &str, extensions: Extensions) -> Option<Resolved> {
        let (package_name, subpath) = parse_package_specifier(module_name);
        let package_dir = combine_paths(node_modules, package_name);

        if self.options.get_resolve_package_json_exports() && self.host.directory_exists(&package_dir) {
            if let Some(exports) = self.read_package_json(&package_dir).and_then(|pkg| pkg.exports) {
                let subpath = if subpath.is_empty() {
                    ".".to_string()
                } else {
                    format!("./{}", subpath)
                };
                // A package with `exports` hides everything it does not export.
                let target = resolve_package_exports(&exports, &subpath, &self.conditions)?;
                let path = normalize_path(&combine_paths(&package_dir, &target));
                return self.load_module_from_file(&path, extensions);
            }
        }

        self.load_file_or_directory(&combine_paths(node_modules, module_name), extensions)
    }

    fn load_from_node_modules(&mut self, module_name: &str, directory: &str, extensions: Extensions, types_only: bool) -> Option<Resolved> {
        let types_name = mangle_scoped_package_name(module_name);
        for dir in ancestor_directories(directory) {
            if get_base_file_name(&dir) == "node_modules" {
                continue;
            }
            let node_modules = combine_paths(&dir, "node_modules");
            if !self.host.directory_exists(&node_modules) {
                continue;
            }
            if !types_only {
                if let Some(found) = self.load_from_package(&node_modules, module_name, extensions) {
                    return Some(found);
                }
            }
            if extensions.contains(Extensions::DECLARATION) {
                let types_dir = combine_paths(&node_modules, "@types");
                if self.host.directory_exists(&types_dir) {
                    if let Some(found) = self.load_from_package(&types_dir, &types_name, Extensions::DECLARATION) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    fn resolve_with(&mut self, module_name: &str, directory: &str, extensions: Extensions) -> Option<Resolved> {
        if !path_is_relative(module_name) {
            if let Some(found) = self.try_paths(module_name, extensions) {
                return Some(found);
            }
        }

        if is_external_module_name_relative(module_name) {
            let candidate = normalize_path(&combine_paths(directory, module_name));
            return self.load_file_or_directory(&candidate, extensions);
        }

        if let Some(base_url) = self.options.base_url.clone() {
            let candidate = normalize_path(&combine_paths(&base_url, module_name));
            if let Some(found) = self.load_file_or_directory(&candidate, extensions) {
                return Some(found);
            }
        }

        if self.kind == ModuleResolutionKind::Classic {
            for dir in ancestor_directories(directory) {
                let candidate = combine_paths(&dir, module_name);
                if let Some(found) = self.load_module_from_file(&candidate, extensions) {
                    return Some(found);
                }
            }
            return self.load_from_node_modules(module_name, directory, extensions, true);
        }

        self.load_from_node_modules(module_name, directory, extensions, false)
    }

    fn resolve(&mut self, module_name: &str, directory: &str) -> Option<Resolved> {
        let mut passes = vec![Extensions::TYPESCRIPT | Extensions::DECLARATION];
        if self.options.get_allow_js() {
            passes.push(Extensions::JAVASCRIPT);
        }
        if self.options.resolve_json_module == Some(true) && self.kind != ModuleResolutionKind::Classic {
            passes.push(Extensions::JSON);
        }
        passes
            .into_iter()
            .find_map(|extensions| self.resolve_with(module_name, directory, extensions))
    }
}

/// Resolves `module_name` imported from `containing_file`.
pub fn resolve_module_name(
    module_name: &str,
    containing_file: &str,
    options: &CompilerOptions,
    host: &dyn System,
    cache: Option<&ModuleResolutionCache>,
) -> ResolvedModuleWithFailedLookupLocations {
    let directory = get_directory_path(&normalize_path(containing_file));
    if let Some(cached) = cache.and_then(|cache| cache.get(&directory, module_name)) {
        trace!(module = module_name, directory = %directory, "module resolution cache hit");
        return cached;
    }

    let mut resolver = Resolver::new(options, host, containing_file);
    let resolved = resolver.resolve(module_name, &directory);
    let resolved_module = resolved.map(|found| {
        let external = !is_external_module_name_relative(module_name);
        let (resolved_file_name, original_path) = if external && options.preserve_symlinks != Some(true) {
            let real = host.realpath(&found.path);
            let original = (real != found.path).then(|| found.path.clone());
            (real, original)
        } else {
            (found.path.clone(), None)
        };
        ResolvedModuleFull {
            is_external_library_import: found.path.contains("/node_modules/"),
            resolved_file_name,
            original_path,
            extension: found.extension,
            resolved_using_ts_extension: found.using_ts_extension,
        }
    });

    let result = ResolvedModuleWithFailedLookupLocations {
        resolved_module,
        failed_lookup_locations: resolver.failed_lookup_locations,
    };
    if let Some(cache) = cache {
        cache.set(&directory, module_name, &result);
    }
    result
}
