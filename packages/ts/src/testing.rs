//! In-memory `System` used by tests across the workspace.

use crate::path::{combine_paths, get_normalized_absolute_path, normalize_path};
use crate::sys::System;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Debug)]
enum Entity {
    Folder(Folder),
    File(String),
    SymLink(String),
}

type Folder = BTreeMap<String, Entity>;

const MAX_LINK_DEPTH: usize = 40;

/// A POSIX file tree held in memory. Clones share the same tree.
#[derive(Clone, Debug)]
pub struct InMemorySystem {
    cwd: String,
    tree: Arc<Mutex<Folder>>,
}

impl Default for InMemorySystem {
    fn default() -> Self {
        Self::new("/")
    }
}

impl InMemorySystem {
    pub fn new(cwd: &str) -> Self {
        let system = Self {
            cwd: normalize_path(cwd),
            tree: Arc::new(Mutex::new(Folder::new())),
        };
        system.mkdirp(cwd);
        system
    }

    /// Builds a tree from `(path, contents)` pairs; relative paths land under `cwd`.
    pub fn with_files(cwd: &str, files: &[(&str, &str)]) -> Self {
        let system = Self::new(cwd);
        for (path, content) in files {
            system.write_file(path, content);
        }
        system
    }

    fn lock(&self) -> MutexGuard<'_, Folder> {
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn split(&self, path: &str) -> Vec<String> {
        get_normalized_absolute_path(path, &self.cwd)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn mkdirp(&self, path: &str) {
        let segments = self.split(path);
        let mut tree = self.lock();
        let mut current = &mut *tree;
        for segment in segments {
            let entry = current
                .entry(segment)
                .or_insert_with(|| Entity::Folder(Folder::new()));
            if !matches!(entry, Entity::Folder(_)) {
                *entry = Entity::Folder(Folder::new());
            }
            let Entity::Folder(next) = entry else {
                return;
            };
            current = next;
        }
    }

    /// Writes a file, creating missing parent directories.
    pub fn write_file(&self, path: &str, content: &str) {
        self.insert(path, Entity::File(content.to_string()));
    }

    /// Creates a symbolic link at `path` pointing to `target`.
    pub fn symlink(&self, target: &str, path: &str) {
        self.insert(path, Entity::SymLink(target.to_string()));
    }

    pub fn remove(&self, path: &str) {
        let mut segments = self.split(path);
        let Some(name) = segments.pop() else {
            return;
        };
        let mut tree = self.lock();
        if let Some(folder) = folder_at_mut(&mut tree, &segments) {
            folder.remove(&name);
        }
    }

    fn insert(&self, path: &str, entity: Entity) {
        let mut segments = self.split(path);
        let Some(name) = segments.pop() else {
            return;
        };
        self.mkdirp(&format!("/{}", segments.join("/")));
        let mut tree = self.lock();
        if let Some(folder) = folder_at_mut(&mut tree, &segments) {
            folder.insert(name, entity);
        }
    }

    /// Resolves every link along `path`, returning the real segments.
    fn canonical(&self, tree: &Folder, segments: &[String], depth: usize) -> Option<Vec<String>> {
        let mut real: Vec<String> = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            let folder = folder_at(tree, &real)?;
            match folder.get(segment)? {
                Entity::SymLink(target) => {
                    if depth >= MAX_LINK_DEPTH {
                        return None;
                    }
                    let link_dir = format!("/{}", real.join("/"));
                    let mut next = self.split(&combine_paths(&link_dir, target));
                    next.extend(segments[i + 1..].iter().cloned());
                    return self.canonical(tree, &next, depth + 1);
                }
                Entity::File(_) if i + 1 < segments.len() => return None,
                _ => real.push(segment.clone()),
            }
        }
        Some(real)
    }

    fn with_entity<R>(&self, path: &str, f: impl FnOnce(Option<&Entity>, bool) -> R) -> R {
        let tree = self.lock();
        let segments = self.split(path);
        match self.canonical(&tree, &segments, 0) {
            Some(real) => match real.split_last() {
                Some((name, parent)) => {
                    let entity = folder_at(&tree, parent).and_then(|folder| folder.get(name));
                    f(entity, false)
                }
                None => f(None, true),
            },
            None => f(None, false),
        }
    }
}

fn folder_at<'a>(tree: &'a Folder, segments: &[String]) -> Option<&'a Folder> {
    let mut current = tree;
    for segment in segments {
        match current.get(segment)? {
            Entity::Folder(next) => current = next,
            _ => return None,
        }
    }
    Some(current)
}

fn folder_at_mut<'a>(tree: &'a mut Folder, segments: &[String]) -> Option<&'a mut Folder> {
    let mut current = tree;
    for segment in segments {
        match current.get_mut(segment)? {
            Entity::Folder(next) => current = next,
            _ => return None,
        }
    }
    Some(current)
}

impl System for InMemorySystem {
    fn use_case_sensitive_file_names(&self) -> bool {
        true
    }

    fn get_current_directory(&self) -> String {
        self.cwd.clone()
    }

    fn file_exists(&self, path: &str) -> bool {
        self.with_entity(path, |entity, _| matches!(entity, Some(Entity::File(_))))
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.with_entity(path, |entity, is_root| {
            is_root || matches!(entity, Some(Entity::Folder(_)))
        })
    }

    fn read_file(&self, path: &str) -> Option<String> {
        self.with_entity(path, |entity, _| match entity {
            Some(Entity::File(content)) => Some(content.clone()),
            _ => None,
        })
    }

    fn read_directory_entries(&self, path: &str) -> (Vec<String>, Vec<String>) {
        let tree = self.lock();
        let segments = self.split(path);
        let Some(real) = self.canonical(&tree, &segments, 0) else {
            return (Vec::new(), Vec::new());
        };
        let Some(folder) = folder_at(&tree, &real) else {
            return (Vec::new(), Vec::new());
        };

        let mut files = Vec::new();
        let mut directories = Vec::new();
        for (name, entity) in folder {
            match entity {
                Entity::File(_) => files.push(name.clone()),
                Entity::Folder(_) => directories.push(name.clone()),
                Entity::SymLink(_) => {
                    let mut link = real.clone();
                    link.push(name.clone());
                    let target = self
                        .canonical(&tree, &link, 0)
                        .and_then(|t| {
                            let (last, parent) = t.split_last()?;
                            folder_at(&tree, parent)?.get(last).cloned()
                        });
                    match target {
                        Some(Entity::File(_)) => files.push(name.clone()),
                        Some(Entity::Folder(_)) => directories.push(name.clone()),
                        _ => {}
                    }
                }
            }
        }
        (files, directories)
    }

    fn realpath(&self, path: &str) -> String {
        let tree = self.lock();
        let segments = self.split(path);
        match self.canonical(&tree, &segments, 0) {
            Some(real) => format!("/{}", real.join("/")),
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_files() {
        let sys = InMemorySystem::with_files("/proj", &[("tsconfig.json", "{}"), ("/proj/src/a.ts", "a")]);
        assert_eq!(sys.read_file("/proj/tsconfig.json").as_deref(), Some("{}"));
        assert_eq!(sys.read_file("src/a.ts").as_deref(), Some("a"));
        assert!(sys.directory_exists("/proj/src"));
        assert!(sys.directory_exists("/"));
        assert!(!sys.file_exists("/proj/src"));
        assert!(sys.read_file("/proj/missing.ts").is_none());
    }

    #[test]
    fn lists_directory_entries_sorted() {
        let sys = InMemorySystem::with_files("/", &[("/p/b.ts", ""), ("/p/a.ts", ""), ("/p/lib/c.ts", "")]);
        let (files, dirs) = sys.read_directory_entries("/p");
        assert_eq!(files, vec!["a.ts", "b.ts"]);
        assert_eq!(dirs, vec!["lib"]);
        assert_eq!(sys.read_directory_entries("/nope"), (vec![], vec![]));
    }

    #[test]
    fn follows_symlinks() {
        let sys = InMemorySystem::with_files("/", &[("/real/pkg/index.ts", "x")]);
        sys.symlink("/real/pkg", "/proj/node_modules/pkg");
        assert!(sys.file_exists("/proj/node_modules/pkg/index.ts"));
        assert_eq!(sys.realpath("/proj/node_modules/pkg/index.ts"), "/real/pkg/index.ts");
        let (_, dirs) = sys.read_directory_entries("/proj/node_modules");
        assert_eq!(dirs, vec!["pkg"]);
    }

    #[test]
    fn removes_files() {
        let sys = InMemorySystem::with_files("/", &[("/a.ts", "")]);
        sys.remove("/a.ts");
        assert!(!sys.file_exists("/a.ts"));
    }
}
