// Backend Processes
//
// Locating and running transpiler executables installed through npm.

use crate::error::LoadError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, trace};

static INLINE_SOURCE_MAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^//# sourceMappingURL=data:application/json;(?:charset=utf-8;)?base64,([A-Za-z0-9+/=]+)[ \t]*\r?\n?").unwrap()
});

/// A backend executable and the version it reported.
#[derive(Debug, Clone)]
pub struct Executable {
    pub path: PathBuf,
    pub version: String,
}

fn executable_names(name: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{}.cmd", name), format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

/// Looks for `name` in `$env_var`, then `node_modules/.bin` from `cwd`
/// upwards, then `PATH`.
pub fn find_executable(name: &str, env_var: &str, cwd: Option<&Path>) -> Option<PathBuf> {
    if let Some(pinned) = env::var_os(env_var).filter(|value| !value.is_empty()) {
        trace!(executable = name, variable = env_var, "using pinned executable");
        return Some(PathBuf::from(pinned));
    }

    let names = executable_names(name);
    if let Some(cwd) = cwd {
        for dir in cwd.ancestors() {
            let bin = dir.join("node_modules").join(".bin");
            if let Some(found) = names.iter().map(|n| bin.join(n)).find(|p| p.is_file()) {
                return Some(found);
            }
        }
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| names.iter().map(|n| dir.join(n)).find(|p| p.is_file()))
}

/// Finds and probes `name` with `--version`.
///
/// A missing executable is a missing dependency; anything else that goes
/// wrong is reported as is.
pub fn locate(name: &str, env_var: &str, dependency: &str, hint: &str) -> Result<Executable, LoadError> {
    let cwd = env::current_dir().ok();
    let path = find_executable(name, env_var, cwd.as_deref()).ok_or_else(|| LoadError::missing(dependency, hint))?;

    let output = match Command::new(&path).arg("--version").stdin(Stdio::null()).output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(LoadError::missing(dependency, hint)),
        Err(err) => return Err(LoadError::Other(format!("Failed to run {}: {}", path.display(), err))),
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LoadError::Other(format!(
            "{} --version failed: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(executable = %path.display(), version = %version, "backend executable found");
    Ok(Executable { path, version })
}

/// Runs `exe` with `args`, feeding `input` on stdin.
pub fn run_with_stdin<I, S>(exe: &Path, args: I, input: &str) -> io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Write from a second thread so a full stdout pipe cannot stall the child.
    let mut stdin = child.stdin.take();
    std::thread::scope(|scope| {
        let writer = scope.spawn(move || match stdin.as_mut() {
            Some(pipe) => pipe.write_all(input.as_bytes()),
            None => Ok(()),
        });
        let output = child.wait_with_output();
        match writer.join() {
            Ok(Err(err)) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
            _ => output,
        }
    })
}

/// Splits a trailing inline source map comment off `code`.
pub fn split_inline_source_map(code: &str) -> (String, Option<String>) {
    let Some(captures) = INLINE_SOURCE_MAP.captures_iter(code).last() else {
        return (code.to_string(), None);
    };
    let (Some(whole), Some(payload)) = (captures.get(0), captures.get(1)) else {
        return (code.to_string(), None);
    };

    let map = STANDARD
        .decode(payload.as_str())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());
    if map.is_none() {
        return (code.to_string(), None);
    }

    let mut stripped = String::with_capacity(code.len());
    stripped.push_str(&code[..whole.start()]);
    stripped.push_str(&code[whole.end()..]);
    (stripped, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_inline_maps() {
        let map = r#"{"version":3,"sources":["a.ts"],"mappings":"AAAA"}"#;
        let code = format!(
            "export const a = 1;\n//# sourceMappingURL=data:application/json;base64,{}\n",
            STANDARD.encode(map)
        );
        let (stripped, extracted) = split_inline_source_map(&code);
        assert_eq!(stripped, "export const a = 1;\n");
        assert_eq!(extracted.as_deref(), Some(map));
    }

    #[test]
    fn keeps_code_without_maps() {
        let (code, map) = split_inline_source_map("let x;\n//# sourceMappingURL=x.js.map\n");
        assert_eq!(code, "let x;\n//# sourceMappingURL=x.js.map\n");
        assert!(map.is_none());
    }

    #[test]
    fn finds_executables_in_node_modules_bin() {
        let dir = tempfile::TempDir::new().unwrap();
        let bin = dir.path().join("node_modules").join(".bin");
        std::fs::create_dir_all(&bin).unwrap();
        let names = executable_names("fake-transpiler");
        std::fs::write(bin.join(&names[0]), "").unwrap();
        let nested = dir.path().join("packages").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_executable("fake-transpiler", "FAST_TS_TEST_UNSET_BINARY", Some(&nested));
        assert_eq!(found, Some(bin.join(&names[0])));
        assert_eq!(
            find_executable("surely-not-installed-anywhere", "FAST_TS_TEST_UNSET_BINARY", Some(&nested)),
            None
        );
    }

    #[test]
    fn missing_executables_are_missing_dependencies() {
        let err = locate(
            "surely-not-installed-anywhere",
            "FAST_TS_TEST_UNSET_BINARY",
            "surely-not-installed",
            "Install it.",
        )
        .unwrap_err();
        assert_eq!(err, LoadError::missing("surely-not-installed", "Install it."));
    }
}
