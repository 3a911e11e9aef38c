//! Configuration Files
//!
//! Reading `tsconfig.json` text, following `extends` chains and turning the
//! merged result into compiler options plus the project's root file names.

use crate::matcher::{FileMatcher, DEFAULT_INCLUDE};
use crate::options::verify_compiler_options;
use crate::package_json::{parse_package_specifier, PackageJson};
use crate::path::{
    ancestor_directories, combine_paths, get_base_file_name, get_directory_path,
    get_normalized_absolute_path, is_rooted_disk_path, normalize_path, normalize_slashes,
    path_is_relative,
};
use crate::sys::System;
use crate::{CompilerOptions, Diagnostic};
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::trace;

/// Folders excluded when a configuration declares no `exclude`.
const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

pub type WatchOptions = IndexMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct ReadConfigResult {
    pub config: Option<Value>,
    pub error: Option<Diagnostic>,
}

/// File-system access needed while parsing a configuration.
pub trait ParseConfigHost {
    fn use_case_sensitive_file_names(&self) -> bool;

    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>);

    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> Option<String>;
}

/// `ParseConfigHost` reading straight from a `System`.
pub struct SystemHost<'a> {
    system: &'a dyn System,
}

impl<'a> SystemHost<'a> {
    pub fn new(system: &'a dyn System) -> Self {
        Self { system }
    }
}

impl ParseConfigHost for SystemHost<'_> {
    fn use_case_sensitive_file_names(&self) -> bool {
        self.system.use_case_sensitive_file_names()
    }

    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>) {
        self.system.read_directory_entries(path)
    }

    fn file_exists(&self, path: &str) -> bool {
        self.system.file_exists(path)
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.system.directory_exists(path)
    }

    fn read_file(&self, path: &str) -> Option<String> {
        self.system.read_file(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    /// Absolute path of the referenced project (directory or config file).
    pub path: String,
    pub original_path: String,
    pub prepend: bool,
    pub circular: bool,
}

/// Result of parsing a configuration and everything it extends.
#[derive(Debug, Clone, Default)]
pub struct ParsedCommandLine {
    pub options: CompilerOptions,
    pub file_names: Vec<String>,
    pub project_references: Vec<ProjectReference>,
    pub watch_options: Option<WatchOptions>,
    /// The root configuration JSON as given.
    pub raw: Value,
    pub errors: Vec<Diagnostic>,
}

/// Parses configuration text. Comments and trailing commas are accepted.
pub fn parse_config_file_text_to_json(file_name: &str, text: &str) -> ReadConfigResult {
    if text.trim().is_empty() {
        return ReadConfigResult {
            config: Some(Value::Object(Map::new())),
            error: None,
        };
    }

    match json5::from_str::<Value>(text) {
        Ok(config @ Value::Object(_)) => ReadConfigResult {
            config: Some(config),
            error: None,
        },
        Ok(_) => ReadConfigResult {
            config: None,
            error: Some(
                Diagnostic::error(
                    5092,
                    format!(
                        "The root value of a '{}' file must be an object.",
                        get_base_file_name(file_name)
                    ),
                )
                .with_file(file_name),
            ),
        },
        Err(err) => ReadConfigResult {
            config: None,
            error: Some(
                Diagnostic::error(
                    5014,
                    format!("Failed to parse file '{}': {}.", file_name, err.to_string().trim_end_matches('.')),
                )
                .with_file(file_name),
            ),
        },
    }
}

/// Reads and parses the configuration file at `file_name`.
pub fn read_config_file(file_name: &str, read_file: impl FnOnce(&str) -> Option<String>) -> ReadConfigResult {
    match read_file(file_name) {
        Some(text) => parse_config_file_text_to_json(file_name, &text),
        None => ReadConfigResult {
            config: None,
            error: Some(Diagnostic::error(5083, format!("Cannot read file '{}'.", file_name))),
        },
    }
}

/// `files`/`include`/`exclude`, made absolute against the declaring file.
#[derive(Debug, Clone, Default)]
struct FileSpecs {
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl FileSpecs {
    fn inherit(&mut self, base: &FileSpecs) {
        if self.files.is_none() {
            self.files = base.files.clone();
        }
        if self.include.is_none() {
            self.include = base.include.clone();
        }
        if self.exclude.is_none() {
            self.exclude = base.exclude.clone();
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ParsedConfig {
    options: CompilerOptions,
    watch_options: Option<WatchOptions>,
    specs: FileSpecs,
}

impl ParsedConfig {
    /// Layers `self` over `base`.
    fn inherit(&mut self, base: &ParsedConfig) {
        self.options.extend_from(&base.options);
        self.specs.inherit(&base.specs);
        if let Some(base_watch) = &base.watch_options {
            let mut merged = base_watch.clone();
            for (key, value) in self.watch_options.take().unwrap_or_default() {
                merged.insert(key, value);
            }
            self.watch_options = Some(merged);
        }
    }
}

struct ConfigParser<'a> {
    host: &'a dyn ParseConfigHost,
    /// Files currently being resolved, outermost first.
    stack: Vec<String>,
    errors: Vec<Diagnostic>,
}

fn wrong_type(name: &str, expected: &str, file: Option<&str>) -> Diagnostic {
    let diagnostic = Diagnostic::error(
        5024,
        format!("Compiler option '{}' requires a value of type {}.", name, expected),
    );
    match file {
        Some(file) => diagnostic.with_file(file),
        None => diagnostic,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

impl<'a> ConfigParser<'a> {
    fn report(&mut self, diagnostic: Diagnostic, file: Option<&str>) {
        self.errors.push(match (file, &diagnostic.file) {
            (Some(file), None) => diagnostic.with_file(file),
            _ => diagnostic,
        });
    }

    fn parse(&mut self, json: &Value, base_dir: &str, file: Option<&str>) -> ParsedConfig {
        let mut parsed = ParsedConfig::default();
        let Some(object) = json.as_object() else {
            return parsed;
        };

        match object.get("compilerOptions") {
            Some(Value::Object(options)) => {
                for (name, value) in options {
                    if let Err(diagnostic) = parsed.options.set_from_json(name, value, base_dir) {
                        self.report(diagnostic, file);
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => self.report(wrong_type("compilerOptions", "object", file), file),
        }

        match object.get("watchOptions") {
            Some(Value::Object(watch)) => {
                parsed.watch_options = Some(watch.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
            }
            Some(Value::Null) | None => {}
            Some(_) => self.report(wrong_type("watchOptions", "object", file), file),
        }

        for (key, slot) in [
            ("files", &mut parsed.specs.files),
            ("include", &mut parsed.specs.include),
            ("exclude", &mut parsed.specs.exclude),
        ] {
            match object.get(key) {
                Some(Value::Null) | None => {}
                Some(value) => match string_list(value) {
                    Some(specs) => {
                        *slot = Some(
                            specs
                                .iter()
                                .map(|spec| get_normalized_absolute_path(spec, base_dir))
                                .collect(),
                        );
                    }
                    None => self.errors.push(wrong_type(key, "Array", file)),
                },
            }
        }

        let extends: Vec<String> = match object.get("extends") {
            Some(Value::String(name)) => vec![name.clone()],
            Some(value @ Value::Array(_)) => match string_list(value) {
                Some(names) => names,
                None => {
                    self.report(wrong_type("extends", "string or Array", file), file);
                    Vec::new()
                }
            },
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                self.report(wrong_type("extends", "string or Array", file), file);
                Vec::new()
            }
        };

        if extends.is_empty() {
            return parsed;
        }

        let mut base = ParsedConfig::default();
        for name in extends {
            if let Some(extended) = self.parse_extended(&name, base_dir, file) {
                let mut layered = extended;
                layered.inherit(&base);
                base = layered;
            }
        }
        parsed.inherit(&base);
        parsed
    }

    fn parse_extended(&mut self, name: &str, base_dir: &str, file: Option<&str>) -> Option<ParsedConfig> {
        let Some(path) = resolve_extends_path(name, base_dir, self.host) else {
            self.report(Diagnostic::error(6053, format!("File '{}' not found.", name)), file);
            return None;
        };

        let same = |a: &String| {
            if self.host.use_case_sensitive_file_names() {
                *a == path
            } else {
                a.eq_ignore_ascii_case(&path)
            }
        };
        if self.stack.iter().any(same) {
            let mut cycle = self.stack.clone();
            cycle.push(path.clone());
            self.report(
                Diagnostic::error(
                    18000,
                    format!(
                        "Circularity detected while resolving configuration: {}",
                        cycle.join(" -> ")
                    ),
                ),
                file,
            );
            return None;
        }

        trace!(config = %path, "reading extended configuration");
        let host = self.host;
        let result = read_config_file(&path, |p| host.read_file(p));
        let config = match (result.config, result.error) {
            (_, Some(error)) => {
                self.report(error, file);
                return None;
            }
            (Some(config), None) => config,
            (None, None) => return None,
        };

        self.stack.push(path.clone());
        let parsed = self.parse(&config, &get_directory_path(&path), Some(&path));
        self.stack.pop();
        Some(parsed)
    }
}

/// Locates the file an `extends` entry names.
///
/// Relative and rooted names resolve against `base_dir` (adding `.json` when
/// the bare name does not exist). Other names are looked up in `node_modules`
/// directories from `base_dir` upwards.
pub fn resolve_extends_path(name: &str, base_dir: &str, host: &dyn ParseConfigHost) -> Option<String> {
    let name = normalize_slashes(name);
    if is_rooted_disk_path(&name) || path_is_relative(&name) {
        let candidate = get_normalized_absolute_path(&name, base_dir);
        if host.file_exists(&candidate) {
            return Some(candidate);
        }
        if !candidate.ends_with(".json") {
            let with_json = format!("{}.json", candidate);
            if host.file_exists(&with_json) {
                return Some(with_json);
            }
        }
        return None;
    }

    let (package_name, subpath) = parse_package_specifier(&name);
    for dir in ancestor_directories(base_dir) {
        let node_modules = combine_paths(&dir, "node_modules");
        if !host.directory_exists(&node_modules) {
            continue;
        }
        let package_dir = combine_paths(&node_modules, package_name);

        if subpath.is_empty() {
            let manifest = host
                .read_file(&combine_paths(&package_dir, "package.json"))
                .and_then(|text| PackageJson::parse(&text));
            if let Some(tsconfig) = manifest.and_then(|pkg| pkg.tsconfig) {
                let candidate = normalize_path(&combine_paths(&package_dir, &tsconfig));
                if host.file_exists(&candidate) {
                    return Some(candidate);
                }
            }
            let candidate = combine_paths(&package_dir, "tsconfig.json");
            if host.file_exists(&candidate) {
                return Some(candidate);
            }
        } else {
            let candidate = normalize_path(&combine_paths(&node_modules, &name));
            if host.file_exists(&candidate) {
                return Some(candidate);
            }
            if !candidate.ends_with(".json") && host.file_exists(&format!("{}.json", candidate)) {
                return Some(format!("{}.json", candidate));
            }
            let nested = combine_paths(&candidate, "tsconfig.json");
            if host.file_exists(&nested) {
                return Some(nested);
            }
        }

        let flat = format!("{}.json", combine_paths(&node_modules, &name));
        if host.file_exists(&flat) {
            return Some(flat);
        }
    }
    None
}

fn parse_project_references(json: &Value, base_path: &str, file: Option<&str>, errors: &mut Vec<Diagnostic>) -> Vec<ProjectReference> {
    let Some(references) = json.get("references") else {
        return Vec::new();
    };
    let Some(items) = references.as_array() else {
        let mut diagnostic = wrong_type("references", "Array", None);
        if let Some(file) = file {
            diagnostic = diagnostic.with_file(file);
        }
        errors.push(diagnostic);
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items {
        match item.get("path").and_then(Value::as_str) {
            Some(original) => out.push(ProjectReference {
                path: get_normalized_absolute_path(original, base_path),
                original_path: original.to_string(),
                prepend: item.get("prepend").and_then(Value::as_bool).unwrap_or(false),
                circular: item.get("circular").and_then(Value::as_bool).unwrap_or(false),
            }),
            None => errors.push(Diagnostic::error(
                5024,
                "Compiler option 'references.path' requires a value of type string.",
            )),
        }
    }
    out
}

/// Parses a configuration object whose relative paths are based on `base_path`.
///
/// `config_file_name` names the file `json` came from; it takes part in
/// circularity detection and is attached to diagnostics.
pub fn parse_json_config_file_content(
    json: &Value,
    host: &dyn ParseConfigHost,
    base_path: &str,
    existing_options: Option<&CompilerOptions>,
    config_file_name: Option<&str>,
) -> ParsedCommandLine {
    let base_path = normalize_path(base_path);
    let config_file_name = config_file_name.map(|name| get_normalized_absolute_path(name, &base_path));

    let mut parser = ConfigParser {
        host,
        stack: config_file_name.iter().cloned().collect(),
        errors: Vec::new(),
    };
    let parsed = parser.parse(json, &base_path, config_file_name.as_deref());
    let mut errors = parser.errors;

    let mut options = parsed.options;
    if let Some(existing) = existing_options {
        options.extend_from(existing);
    }
    options.config_file_path = config_file_name.clone();

    for diagnostic in verify_compiler_options(&options) {
        errors.push(match &config_file_name {
            Some(file) => diagnostic.with_file(file.clone()),
            None => diagnostic,
        });
    }

    let file_names = get_file_names(&parsed.specs, &options, &base_path, host, &mut errors);
    let project_references =
        parse_project_references(json, &base_path, config_file_name.as_deref(), &mut errors);

    ParsedCommandLine {
        options,
        file_names,
        project_references,
        watch_options: parsed.watch_options,
        raw: json.clone(),
        errors,
    }
}

fn get_file_names(
    specs: &FileSpecs,
    options: &CompilerOptions,
    base_path: &str,
    host: &dyn ParseConfigHost,
    errors: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let mut file_names: IndexSet<String> = specs.files.iter().flatten().cloned().collect();

    let include = match (&specs.include, &specs.files) {
        (Some(include), _) => include.clone(),
        (None, None) => vec![get_normalized_absolute_path(DEFAULT_INCLUDE, base_path)],
        (None, Some(_)) => Vec::new(),
    };
    if include.is_empty() {
        return file_names.into_iter().collect();
    }

    let exclude = specs.exclude.clone().unwrap_or_else(|| {
        let mut defaults: Vec<String> = DEFAULT_EXCLUDES
            .iter()
            .map(|dir| combine_paths(base_path, dir))
            .collect();
        defaults.extend(options.out_dir.iter().cloned());
        defaults.extend(options.declaration_dir.iter().cloned());
        defaults
    });

    match FileMatcher::new(
        &include,
        &exclude,
        base_path,
        options.get_allow_js(),
        host.use_case_sensitive_file_names(),
    ) {
        Ok(matcher) => file_names.extend(matcher.match_files(host)),
        Err(err) => errors.push(Diagnostic::error(
            5010,
            format!("File specification is invalid: {}.", err),
        )),
    }

    file_names.into_iter().collect()
}
