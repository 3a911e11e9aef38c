//! Path Utilities
//!
//! Paths in this crate are plain strings using `/` as the separator, the way
//! configuration files and module specifiers spell them. Windows drive
//! prefixes (`C:/`) are recognised as roots.

pub const DIRECTORY_SEPARATOR: char = '/';

/// Convert Windows-style separators to POSIX separators.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Length of the root portion of `path` (`/`, `C:/`, `C:`), or 0 when relative.
pub fn get_root_length(path: &str) -> usize {
    let bytes = path.as_bytes();
    if bytes.first() == Some(&b'/') {
        return 1;
    }
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.get(2) == Some(&b'/') {
            return 3;
        }
        return 2;
    }
    0
}

pub fn is_rooted_disk_path(path: &str) -> bool {
    get_root_length(path) > 0
}

/// `./x`, `../x`, `.` and `..`.
pub fn path_is_relative(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

/// Module names that are resolved against the importing file rather than
/// through `node_modules` or `paths`.
pub fn is_external_module_name_relative(module_name: &str) -> bool {
    path_is_relative(module_name) || is_rooted_disk_path(module_name)
}

/// Resolves `.` and `..` segments and collapses repeated separators.
///
/// Leading `..` segments of a relative path are kept; above a root they are
/// dropped.
pub fn normalize_path(path: &str) -> String {
    let normalized = normalize_slashes(path);
    let root_len = get_root_length(&normalized);
    let (root, rest) = normalized.split_at(root_len);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if root.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if root.is_empty() {
        joined
    } else if root.ends_with('/') {
        format!("{}{}", root, joined)
    } else {
        format!("{}/{}", root, joined)
    }
}

/// Joins `relative` onto `base` unless `relative` is already rooted.
pub fn combine_paths(base: &str, relative: &str) -> String {
    let relative = normalize_slashes(relative);
    if relative.is_empty() {
        return normalize_slashes(base);
    }
    if is_rooted_disk_path(&relative) || base.is_empty() {
        return relative;
    }
    let base = normalize_slashes(base);
    if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

pub fn get_normalized_absolute_path(file_name: &str, current_directory: &str) -> String {
    normalize_path(&combine_paths(current_directory, file_name))
}

/// Everything before the last separator. The parent of a root is the root.
pub fn get_directory_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let root_len = get_root_length(&path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.len() <= root_len {
        return path[..root_len].to_string();
    }
    match trimmed.rfind('/') {
        Some(idx) if idx + 1 > root_len => trimmed[..idx].to_string(),
        Some(_) => path[..root_len].to_string(),
        None => String::new(),
    }
}

pub fn get_base_file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

pub fn ensure_trailing_directory_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

pub fn file_extension_is(path: &str, extension: &str) -> bool {
    path.len() > extension.len() && path.ends_with(extension)
}

/// Whether `child` is `parent` or lies beneath it.
pub fn contains_path(parent: &str, child: &str, case_sensitive: bool) -> bool {
    let (parent, child) = if case_sensitive {
        (parent.to_string(), child.to_string())
    } else {
        (parent.to_lowercase(), child.to_lowercase())
    };
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        return child.starts_with('/');
    }
    child == parent || child.starts_with(&format!("{}/", parent))
}

/// Every ancestor directory of `directory`, nearest first, including itself.
pub fn ancestor_directories(directory: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = normalize_path(directory);
    loop {
        result.push(current.clone());
        let parent = get_directory_path(&current);
        if parent == current || parent.is_empty() {
            break;
        }
        current = parent;
    }
    result
}
