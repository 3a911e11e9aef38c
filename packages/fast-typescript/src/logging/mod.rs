//! Logging
//!
//! Level-gated loggers and a [`PluginContext`] that reports through them.

mod console_logger;
mod logger;


pub use console_logger::ConsoleLogger;
pub use logger::{LogLevel, Logger, NullLogger};

use crate::context::{PluginContext, PluginWarning};
use std::path::Path;

/// Host context for standalone use: warnings are written to a [`Logger`].
pub struct LoggingContext<L: Logger> {
    logger: L,
    watch_mode: bool,
}

impl<L: Logger> LoggingContext<L> {
    pub fn new(logger: L) -> Self {
        Self {
            logger,
            watch_mode: false,
        }
    }

    pub fn with_watch_mode(mut self, watch_mode: bool) -> Self {
        self.watch_mode = watch_mode;
        self
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }
}

impl<L: Logger> PluginContext for LoggingContext<L> {
    fn warn(&self, warning: PluginWarning) {
        self.logger.warn(&warning.to_string());
    }

    fn add_watch_file(&self, path: &Path) {
        self.logger.debug(&format!("watching {}", path.display()));
    }

    fn watch_mode(&self) -> bool {
        self.watch_mode
    }
}
