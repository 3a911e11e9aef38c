//! Package Manifests
//!
//! The parts of `package.json` module resolution and `extends` lookups read.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    #[serde(alias = "typings")]
    pub types: Option<String>,
    /// Configuration file a bare-name `extends` of this package points at.
    pub tsconfig: Option<String>,
    pub exports: Option<Value>,
    #[serde(rename = "type")]
    pub module_type: Option<String>,
}

impl PackageJson {
    /// Lenient parse: malformed manifests read as empty.
    pub fn parse(content: &str) -> Option<PackageJson> {
        serde_json::from_str(content).ok()
    }
}

/// Splits `@scope/name/sub/path` into `("@scope/name", "sub/path")`.
///
/// The subpath is empty when the specifier names the package itself.
pub fn parse_package_specifier(specifier: &str) -> (&str, &str) {
    let split_at = if specifier.starts_with('@') {
        specifier
            .match_indices('/')
            .nth(1)
            .map(|(idx, _)| idx)
    } else {
        specifier.find('/')
    };
    match split_at {
        Some(idx) => (&specifier[..idx], &specifier[idx + 1..]),
        None => (specifier, ""),
    }
}

/// `@scope/name` → `scope__name`, the layout `@types` packages use.
pub fn mangle_scoped_package_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(rest) if rest.contains('/') => rest.replacen('/', "__", 1),
        _ => name.to_string(),
    }
}

fn is_conditional_sugar(exports: &Value) -> bool {
    match exports {
        Value::Object(map) => !map.keys().any(|key| key.starts_with('.')),
        _ => true,
    }
}

/// Resolves `subpath` (`"."` or `"./x"`) through an `exports` field.
///
/// Returns the package-relative target with any `*` substituted.
pub fn resolve_package_exports(exports: &Value, subpath: &str, conditions: &[String]) -> Option<String> {
    if is_conditional_sugar(exports) {
        return if subpath == "." {
            resolve_export_target(exports, None, conditions)
        } else {
            None
        };
    }

    let Value::Object(map) = exports else {
        return None;
    };

    if let Some(target) = map.get(subpath) {
        if !subpath.contains('*') {
            return resolve_export_target(target, None, conditions);
        }
    }

    // Longest matching prefix wins among `*` patterns.
    let mut best: Option<(usize, &Value, &str)> = None;
    for (key, target) in map {
        let Some((prefix, suffix)) = key.split_once('*') else {
            continue;
        };
        if subpath.len() >= prefix.len() + suffix.len()
            && subpath.starts_with(prefix)
            && subpath.ends_with(suffix)
        {
            let matched = &subpath[prefix.len()..subpath.len() - suffix.len()];
            if best.map_or(true, |(len, _, _)| prefix.len() > len) {
                best = Some((prefix.len(), target, matched));
            }
        }
    }

    best.and_then(|(_, target, matched)| resolve_export_target(target, Some(matched), conditions))
}

fn resolve_export_target(target: &Value, pattern_match: Option<&str>, conditions: &[String]) -> Option<String> {
    match target {
        Value::String(s) => {
            if !s.starts_with("./") {
                return None;
            }
            Some(match pattern_match {
                Some(m) => s.replace('*', m),
                None => s.clone(),
            })
        }
        Value::Object(map) => map.iter().find_map(|(condition, nested)| {
            if condition == "default" || conditions.iter().any(|c| c == condition) {
                resolve_export_target(nested, pattern_match, conditions)
            } else {
                None
            }
        }),
        Value::Array(items) => items
            .iter()
            .find_map(|item| resolve_export_target(item, pattern_match, conditions)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conditions() -> Vec<String> {
        vec!["types".to_string(), "import".to_string()]
    }

    #[test]
    fn splits_specifiers() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", ""));
        assert_eq!(parse_package_specifier("lodash/fp/map"), ("lodash", "fp/map"));
        assert_eq!(parse_package_specifier("@types/node"), ("@types/node", ""));
        assert_eq!(parse_package_specifier("@scope/pkg/sub"), ("@scope/pkg", "sub"));
        assert_eq!(mangle_scoped_package_name("@scope/pkg"), "scope__pkg");
        assert_eq!(mangle_scoped_package_name("pkg"), "pkg");
    }

    #[test]
    fn reads_typings_alias_and_tsconfig() {
        let pkg = PackageJson::parse(r#"{"typings": "index.d.ts", "tsconfig": "base.json"}"#).unwrap();
        assert_eq!(pkg.types.as_deref(), Some("index.d.ts"));
        assert_eq!(pkg.tsconfig.as_deref(), Some("base.json"));
        assert!(PackageJson::parse("{ nope").is_none());
    }

    #[test]
    fn resolves_string_and_sugar_exports() {
        assert_eq!(
            resolve_package_exports(&json!("./index.js"), ".", &conditions()).as_deref(),
            Some("./index.js")
        );
        let sugar = json!({"types": "./index.d.ts", "default": "./index.js"});
        assert_eq!(
            resolve_package_exports(&sugar, ".", &conditions()).as_deref(),
            Some("./index.d.ts")
        );
        assert_eq!(resolve_package_exports(&sugar, "./x", &conditions()), None);
    }

    #[test]
    fn resolves_subpaths_and_patterns() {
        let exports = json!({
            ".": {"require": "./cjs/index.cjs", "import": "./esm/index.mjs"},
            "./utils": "./utils/index.js",
            "./features/*": {"types": "./types/features/*.d.ts"},
            "./features/private/*": null
        });
        assert_eq!(
            resolve_package_exports(&exports, ".", &conditions()).as_deref(),
            Some("./esm/index.mjs")
        );
        assert_eq!(
            resolve_package_exports(&exports, "./utils", &conditions()).as_deref(),
            Some("./utils/index.js")
        );
        assert_eq!(
            resolve_package_exports(&exports, "./features/a", &conditions()).as_deref(),
            Some("./types/features/a.d.ts")
        );
        assert_eq!(resolve_package_exports(&exports, "./features/private/x", &conditions()), None);
        assert_eq!(resolve_package_exports(&exports, "./missing", &conditions()), None);
    }
}
