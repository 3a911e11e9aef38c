//! Small helpers shared by the configuration and backend modules.

use std::path::Path;

const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");

/// `See <homepage>#<anchor> for details.` pointing into the README.
pub fn readme(anchor: &str) -> String {
    let anchor = kebab_case(anchor.trim_start_matches('#'));
    if anchor.is_empty() {
        format!("See {} for details.", HOMEPAGE)
    } else {
        format!("See {}#{} for details.", HOMEPAGE, anchor)
    }
}

fn kebab_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev_lower = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('-');
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch.to_ascii_lowercase());
        } else {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Extension including every dot-separated part: `index.d.ts` → `.d.ts`.
///
/// Leading dots belong to the name (`.config.rc` → `.rc`, `.eslintrc` → ``).
pub fn extname(path: &str) -> &str {
    let base = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    let base = base.rsplit(['/', '\\']).next().unwrap_or(base);
    let body = base.trim_start_matches('.');
    match body.find('.') {
        Some(dot) => &body[dot..],
        None => "",
    }
}
