//! Config chain loader.
//!
//! Reads the root configuration and everything it `extends`, remembering
//! which files took part so the host can watch them.

use super::source::ConfigSource;
use crate::error::PluginError;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use ts::path::{get_directory_path, normalize_path};
use ts::{
    flatten_diagnostic_message_text, parse_json_config_file_content, read_config_file, CompilerOptions,
    Diagnostic, DiagnosticCategory, ParseConfigHost, ProjectReference, System, SystemHost, WatchOptions,
};

/// Loaded when the host passes `true` or nothing.
pub const DEFAULT_CONFIG_FILE: &str = "./tsconfig.json";

/// Name diagnostics are attributed to for inline configuration.
pub const INLINE_CONFIG_NAME: &str = "<configObject>";

const PACKAGE_MANIFEST: &str = "package.json";

/// Configuration files read while loading, in the order they were read.
///
/// Duplicates are kept; registering a file twice with a watcher is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChain {
    files: Vec<PathBuf>,
}

impl ConfigChain {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, file: impl Into<PathBuf>) {
        self.files.push(file.into());
    }
}

/// Merged configuration ready for normalization.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub options: CompilerOptions,
    /// Directory relative paths are resolved against.
    pub base_path: String,
    pub chain: ConfigChain,
    /// Non-fatal diagnostics, all of which must reach the host.
    pub warnings: Vec<Diagnostic>,
    pub file_names: Vec<String>,
    pub project_references: Vec<ProjectReference>,
    pub watch_options: Option<WatchOptions>,
}

/// Records every file read through it except package manifests.
struct RecordingHost<'a> {
    inner: SystemHost<'a>,
    read: RefCell<Vec<String>>,
}

impl<'a> RecordingHost<'a> {
    fn new(system: &'a dyn System) -> Self {
        Self {
            inner: SystemHost::new(system),
            read: RefCell::new(Vec::new()),
        }
    }

    fn into_files(self) -> Vec<String> {
        self.read.into_inner()
    }
}

impl ParseConfigHost for RecordingHost<'_> {
    fn use_case_sensitive_file_names(&self) -> bool {
        self.inner.use_case_sensitive_file_names()
    }

    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>) {
        self.inner.read_directory_entries(path)
    }

    fn file_exists(&self, path: &str) -> bool {
        self.inner.file_exists(path)
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.inner.directory_exists(path)
    }

    fn read_file(&self, path: &str) -> Option<String> {
        if !path.ends_with(PACKAGE_MANIFEST) {
            trace!(file = path, "config chain read");
            self.read.borrow_mut().push(normalize_path(path));
        }
        self.inner.read_file(path)
    }
}

fn diagnostic_text(diagnostic: &Diagnostic) -> String {
    flatten_diagnostic_message_text(&diagnostic.message_text, "\n")
}

/// Aborts on the first error and keeps every warning.
fn split_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, PluginError> {
    if let Some(error) = diagnostics.iter().find(|d| d.is_error()) {
        return Err(PluginError::StartupConfiguration(diagnostic_text(error)));
    }
    Ok(diagnostics
        .into_iter()
        .filter(|d| d.category == DiagnosticCategory::Warning)
        .collect())
}

/// Loads `source` and the configurations it extends.
pub fn load_config_chain(source: ConfigSource, system: &dyn System) -> Result<LoadedConfig, PluginError> {
    match source {
        ConfigSource::UseDefault => load_file(DEFAULT_CONFIG_FILE, system),
        ConfigSource::Path(path) => load_file(&path, system),
        ConfigSource::Disabled => {
            debug!("tsconfig disabled, using empty compiler options");
            Ok(LoadedConfig {
                base_path: normalize_path(&system.get_current_directory()),
                ..LoadedConfig::default()
            })
        }
        ConfigSource::InlineObject(json) => {
            let base_path = normalize_path(&system.get_current_directory());
            debug!(base = %base_path, "loading inline tsconfig");
            parse_chain(&json, base_path, INLINE_CONFIG_NAME, ConfigChain::default(), system)
        }
    }
}

fn load_file(path: &str, system: &dyn System) -> Result<LoadedConfig, PluginError> {
    let root = system.resolve_path(path);
    let base_path = get_directory_path(&root);
    debug!(config = %root, "loading tsconfig");

    let mut chain = ConfigChain::default();
    chain.push(root.clone());

    let read = read_config_file(&root, |file| system.read_file(file));
    if let Some(error) = read.error {
        return Err(PluginError::StartupConfiguration(diagnostic_text(&error)));
    }
    let json = read.config.unwrap_or_else(|| serde_json::json!({}));
    parse_chain(&json, base_path, &root, chain, system)
}

fn parse_chain(
    json: &serde_json::Value,
    base_path: String,
    config_file_name: &str,
    mut chain: ConfigChain,
    system: &dyn System,
) -> Result<LoadedConfig, PluginError> {
    let host = RecordingHost::new(system);
    let parsed = parse_json_config_file_content(json, &host, &base_path, None, Some(config_file_name));
    for file in host.into_files() {
        chain.push(file);
    }
    let warnings = split_diagnostics(parsed.errors)?;
    debug!(files = chain.len(), warnings = warnings.len(), "tsconfig chain loaded");

    Ok(LoadedConfig {
        options: parsed.options,
        base_path,
        chain,
        warnings,
        file_names: parsed.file_names,
        project_references: parsed.project_references,
        watch_options: parsed.watch_options,
    })
}
