//! Fuzzy matching of process names against a user query.
//!
//! Process listings truncate command names (the kernel keeps 15 characters of
//! `comm`, `ps -c` on macOS does the same), report them with or without a path,
//! and macOS application bundles show up under several spellings. A name
//! matches when any of the rules below holds; all comparisons are
//! case-insensitive.

/// Width at which process listings truncate command names.
pub const TRUNCATED_NAME_LEN: usize = 15;

/// Executable suffixes ignored when comparing basenames.
pub const EXECUTABLE_SUFFIXES: [&str; 4] = [".exe", ".app", ".bin", ".run"];

/// Returns true if `process_name` should be treated as an instance of `query`.
///
/// Empty names and empty queries never match.
pub fn matches(process_name: &str, query: &str) -> bool {
    if process_name.is_empty() || query.is_empty() {
        return false;
    }

    let name = process_name.to_lowercase();
    let target = query.to_lowercase();

    name == target
        || is_truncation_match(&name, &target)
        || is_prefix_match(&name, &target)
        || is_basename_match(&name, &target)
        || is_app_name_match(&name, &target)
}

/// Recovers names cut at the listing width, in either direction.
fn is_truncation_match(name: &str, target: &str) -> bool {
    if name.chars().count() >= TRUNCATED_NAME_LEN && target.starts_with(name) {
        return true;
    }

    if target.chars().count() > TRUNCATED_NAME_LEN {
        let head: String = target.chars().take(TRUNCATED_NAME_LEN).collect();
        if name.starts_with(&head) {
            return true;
        }
    }

    false
}

fn is_prefix_match(name: &str, target: &str) -> bool {
    target.starts_with(name) || name.starts_with(target)
}

fn is_basename_match(name: &str, target: &str) -> bool {
    normalize_basename(name) == normalize_basename(target)
}

/// "Foo.app" runs as "Foo"; "App Name" may run as "AppName".
fn is_app_name_match(name: &str, target: &str) -> bool {
    if let Some(app) = target.strip_suffix(".app") {
        if name == app {
            return true;
        }
    }

    if target.contains(' ') {
        let compact = target.replace(' ', "");
        if name == compact {
            return true;
        }
    }

    false
}

/// Strips the path prefix and one known executable suffix.
pub fn normalize_basename(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    EXECUTABLE_SUFFIXES
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix))
        .unwrap_or(base)
}
