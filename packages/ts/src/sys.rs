//! Host System
//!
//! The file-system surface the compiler reads configuration files, source
//! directories and packages through.

use crate::path::{get_normalized_absolute_path, normalize_slashes};
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only view of the host file system.
pub trait System: Send + Sync {
    fn use_case_sensitive_file_names(&self) -> bool;

    fn get_current_directory(&self) -> String;

    fn file_exists(&self, path: &str) -> bool;

    fn directory_exists(&self, path: &str) -> bool;

    /// File contents, or `None` when the file cannot be read.
    fn read_file(&self, path: &str) -> Option<String>;

    /// Immediate children of `path` as `(files, directories)` base names,
    /// each sorted. Missing directories yield two empty lists.
    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>);

    /// Canonical path with symbolic links resolved. Falls back to `path`.
    fn realpath(&self, path: &str) -> String {
        path.to_string()
    }

    fn resolve_path(&self, path: &str) -> String {
        get_normalized_absolute_path(path, &self.get_current_directory())
    }
}

impl<T: System + ?Sized> System for &T {
    fn use_case_sensitive_file_names(&self) -> bool {
        (**self).use_case_sensitive_file_names()
    }
    fn get_current_directory(&self) -> String {
        (**self).get_current_directory()
    }
    fn file_exists(&self, path: &str) -> bool {
        (**self).file_exists(path)
    }
    fn directory_exists(&self, path: &str) -> bool {
        (**self).directory_exists(path)
    }
    fn read_file(&self, path: &str) -> Option<String> {
        (**self).read_file(path)
    }
    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>) {
        (**self).read_directory_entries(path)
    }
    fn realpath(&self, path: &str) -> String {
        (**self).realpath(path)
    }
}

/// `System` backed by `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealSystem {
    current_directory: Option<String>,
}

impl RealSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the current directory instead of asking the process.
    pub fn with_current_directory(dir: impl AsRef<Path>) -> Self {
        Self {
            current_directory: Some(normalize_slashes(&dir.as_ref().to_string_lossy())),
        }
    }
}

impl System for RealSystem {
    fn use_case_sensitive_file_names(&self) -> bool {
        !cfg!(any(target_os = "windows", target_os = "macos"))
    }

    fn get_current_directory(&self) -> String {
        if let Some(dir) = &self.current_directory {
            return dir.clone();
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        normalize_slashes(&cwd.to_string_lossy())
    }

    fn file_exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn directory_exists(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn read_file(&self, path: &str) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>) {
        let mut files = Vec::new();
        let mut directories = Vec::new();
        let Ok(entries) = fs::read_dir(path) else {
            return (files, directories);
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            // Follow symlinks so linked packages look like directories.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => directories.push(name),
                Ok(meta) if meta.is_file() => files.push(name),
                _ => {}
            }
        }
        files.sort();
        directories.sort();
        (files, directories)
    }

    fn realpath(&self, path: &str) -> String {
        match fs::canonicalize(path) {
            Ok(real) => normalize_slashes(&real.to_string_lossy()),
            Err(_) => path.to_string(),
        }
    }
}
