//! Host Context
//!
//! The surface a bundler exposes to the plugin: a warning stream, file
//! watching and whether the current build is a watch-mode rebuild.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 1-based line, 0-based column, the way bundlers report positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A non-fatal message surfaced to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginWarning {
    pub message: String,
    pub loc: Option<Location>,
}

impl PluginWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loc: None,
        }
    }

    pub fn with_loc(mut self, line: u32, column: u32) -> Self {
        self.loc = Some(Location { line, column });
        self
    }
}

impl From<String> for PluginWarning {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for PluginWarning {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl fmt::Display for PluginWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "{} ({}:{})", self.message, loc.line, loc.column),
            None => f.write_str(&self.message),
        }
    }
}

/// Callbacks the host provides. Shared between concurrent transforms.
pub trait PluginContext: Send + Sync {
    fn warn(&self, warning: PluginWarning);

    fn add_watch_file(&self, _path: &Path) {}

    fn watch_mode(&self) -> bool {
        false
    }
}

impl<T: PluginContext + ?Sized> PluginContext for &T {
    fn warn(&self, warning: PluginWarning) {
        (**self).warn(warning)
    }

    fn add_watch_file(&self, path: &Path) {
        (**self).add_watch_file(path)
    }

    fn watch_mode(&self) -> bool {
        (**self).watch_mode()
    }
}

/// Context that keeps everything it is given, for hosts that report later.
#[derive(Debug, Default)]
pub struct CollectingContext {
    watch_mode: bool,
    warnings: Mutex<Vec<PluginWarning>>,
    watch_files: Mutex<Vec<PathBuf>>,
}

impl CollectingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watching() -> Self {
        Self {
            watch_mode: true,
            ..Self::default()
        }
    }

    pub fn warnings(&self) -> Vec<PluginWarning> {
        self.warnings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn watch_files(&self) -> Vec<PathBuf> {
        self.watch_files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl PluginContext for CollectingContext {
    fn warn(&self, warning: PluginWarning) {
        self.warnings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(warning);
    }

    fn add_watch_file(&self, path: &Path) {
        self.watch_files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_path_buf());
    }

    fn watch_mode(&self) -> bool {
        self.watch_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_display_includes_location() {
        let warning = PluginWarning::new("Unexpected token").with_loc(3, 7);
        assert_eq!(warning.to_string(), "Unexpected token (3:7)");
        assert_eq!(PluginWarning::from("plain").to_string(), "plain");
    }

    #[test]
    fn collecting_context_records_in_order() {
        let ctx = CollectingContext::watching();
        ctx.warn("first".into());
        ctx.warn("second".into());
        ctx.add_watch_file(Path::new("/p/tsconfig.json"));
        assert!(ctx.watch_mode());
        assert_eq!(
            ctx.warnings().iter().map(|w| w.message.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        assert_eq!(ctx.watch_files(), vec![PathBuf::from("/p/tsconfig.json")]);
        assert!(!CollectingContext::new().watch_mode());
    }
}
