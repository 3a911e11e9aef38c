//! Include/Exclude Matching
//!
//! Expands a configuration's `files`, `include` and `exclude` into the list of
//! root file names.

use crate::config_file::ParseConfigHost;
use crate::extension::Extension;
use crate::path::{combine_paths, contains_path, get_normalized_absolute_path, normalize_path};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;
use smallvec::SmallVec;

/// Directories never entered by a wildcard unless an include names them.
const PACKAGE_FOLDERS: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

pub const DEFAULT_INCLUDE: &str = "**/*";

#[derive(Debug)]
struct IncludePattern {
    /// Directory the walk for this pattern starts in.
    root: String,
    glob: globset::GlobMatcher,
    allows_json: bool,
}

/// Compiled `include`/`exclude` specs for one configuration directory.
#[derive(Debug)]
pub struct FileMatcher {
    includes: Vec<IncludePattern>,
    excludes: GlobSet,
    allow_js: bool,
    case_sensitive: bool,
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

fn build_glob(pattern: &str, case_sensitive: bool) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(!case_sensitive)
        .build()
}

/// Absolute glob for `spec`, escaping the literal base it is resolved against.
fn absolute_pattern(spec: &str, base_path: &str) -> String {
    let spec = normalize_path(spec);
    if crate::path::is_rooted_disk_path(&spec) {
        return spec;
    }
    normalize_path(&combine_paths(&globset::escape(base_path), &spec))
}

/// An include spec whose last segment has no wildcard and no extension names a directory.
fn is_directory_spec(spec: &str) -> bool {
    let last = spec.rsplit('/').next().unwrap_or(spec);
    !has_wildcard(last) && !last.contains('.')
}

impl FileMatcher {
    pub fn new(
        includes: &[String],
        excludes: &[String],
        base_path: &str,
        allow_js: bool,
        case_sensitive: bool,
    ) -> Result<Self, globset::Error> {
        let mut include_patterns = Vec::with_capacity(includes.len());
        for spec in includes {
            let mut pattern = absolute_pattern(spec, base_path);
            let literal = get_normalized_absolute_path(spec, base_path);
            let directory = is_directory_spec(spec);
            if directory {
                pattern = format!("{}/**/*", pattern.trim_end_matches('/'));
            }

            let root_segments: SmallVec<[&str; 8]> = literal
                .split('/')
                .take_while(|segment| !has_wildcard(segment))
                .collect();
            let mut root = root_segments.join("/");
            if !directory && root == literal {
                // A literal file spec walks its parent directory.
                root = crate::path::get_directory_path(&literal);
            }
            if root.is_empty() {
                root = "/".to_string();
            }

            include_patterns.push(IncludePattern {
                root,
                glob: build_glob(&pattern, case_sensitive)?.compile_matcher(),
                allows_json: spec.ends_with(".json"),
            });
        }

        let mut exclude_set = GlobSetBuilder::new();
        for spec in excludes {
            let pattern = absolute_pattern(spec, base_path);
            exclude_set.add(build_glob(&pattern, case_sensitive)?);
            exclude_set.add(build_glob(
                &format!("{}/**", pattern.trim_end_matches('/')),
                case_sensitive,
            )?);
        }

        Ok(Self {
            includes: include_patterns,
            excludes: exclude_set.build()?,
            allow_js,
            case_sensitive,
        })
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excludes.is_match(path)
    }

    fn is_supported(&self, file: &str, allows_json: bool) -> bool {
        match Extension::of(file) {
            Some(ext) if ext.is_typescript() => true,
            Some(ext) if ext.is_javascript() => self.allow_js,
            Some(Extension::Json) => allows_json,
            _ => false,
        }
    }

    /// Walks the host and returns every matching file, visiting each
    /// directory's files before its subdirectories.
    pub fn match_files(&self, host: &dyn ParseConfigHost) -> Vec<String> {
        let mut found = IndexSet::new();
        for include in &self.includes {
            self.visit(host, &include.root, include, &mut found);
        }
        remove_lower_priority_duplicates(found.into_iter().collect())
    }

    fn visit(
        &self,
        host: &dyn ParseConfigHost,
        dir: &str,
        include: &IncludePattern,
        found: &mut IndexSet<String>,
    ) {
        let (files, directories) = host.read_directory_entries(dir);
        for file in files {
            if file.starts_with('.') {
                continue;
            }
            let path = combine_paths(dir, &file);
            if include.glob.is_match(&path)
                && !self.is_excluded(&path)
                && self.is_supported(&path, include.allows_json)
            {
                found.insert(path);
            }
        }

        for directory in directories {
            if directory.starts_with('.') {
                continue;
            }
            let path = combine_paths(dir, &directory);
            let named_by_include = contains_path(&path, &include.root, self.case_sensitive);
            if PACKAGE_FOLDERS.contains(&directory.as_str()) && !named_by_include {
                continue;
            }
            if self.is_excluded(&path) {
                continue;
            }
            self.visit(host, &path, include, found);
        }
    }
}

/// Drops `x.d.ts`/`x.js` when `x.ts` was also matched, and `x.js` when `x.d.ts` was.
fn remove_lower_priority_duplicates(files: Vec<String>) -> Vec<String> {
    let families: [&[Extension]; 3] = [
        &[Extension::Ts, Extension::Tsx, Extension::Dts, Extension::Js, Extension::Jsx],
        &[Extension::Mts, Extension::Dmts, Extension::Mjs],
        &[Extension::Cts, Extension::Dcts, Extension::Cjs],
    ];

    let present: IndexSet<&str> = files.iter().map(String::as_str).collect();
    files
        .iter()
        .filter(|file| {
            let Some(ext) = Extension::of(file) else {
                return true;
            };
            let Some(family) = families.iter().find(|family| family.contains(&ext)) else {
                return true;
            };
            let stem = &file[..file.len() - ext.as_str().len()];
            let rank = |e: &Extension| match e {
                Extension::Ts | Extension::Tsx | Extension::Mts | Extension::Cts => 0,
                e if e.is_declaration() => 1,
                _ => 2,
            };
            let own = rank(&ext);
            !family.iter().any(|other| {
                rank(other) < own && present.contains(format!("{}{}", stem, other.as_str()).as_str())
            })
        })
        .cloned()
        .collect()
}
