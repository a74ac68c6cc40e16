//! Local path scrubbing for diagnostics that leave the process.

/// Marker substituted for every stripped path prefix.
pub const REDACTED_ROOT: &str = ".";

/// Replace every occurrence of the given absolute path prefixes with [`REDACTED_ROOT`].
///
/// Longer prefixes are applied first so a nested checkout is not left half
/// rewritten by its parent directory. Trailing separators on the prefixes are
/// ignored and empty or root-only prefixes are skipped.
pub fn redact_paths<S: AsRef<str>>(trace: &str, prefixes: &[S]) -> String {
    let mut normalized: Vec<&str> = prefixes
        .iter()
        .map(|prefix| prefix.as_ref().trim_end_matches(['/', '\\']))
        .filter(|prefix| !prefix.is_empty())
        .collect();
    normalized.sort_unstable_by_key(|prefix| std::cmp::Reverse(prefix.len()));
    normalized.dedup();

    normalized
        .into_iter()
        .fold(trace.to_owned(), |redacted, prefix| redacted.replace(prefix, REDACTED_ROOT))
}

/// Prefixes that are always worth stripping from traces produced by this build.
///
/// Includes the process working directory and the workspace root the crate was
/// compiled from, which is where backtrace source paths point.
pub fn default_prefixes() -> Vec<String> {
    let mut prefixes = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        prefixes.push(cwd.display().to_string());
    }

    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    if let Some(workspace_root) = manifest_dir.parent() {
        prefixes.push(workspace_root.display().to_string());
    }

    if let Some(home) = std::env::var_os("CARGO_HOME") {
        prefixes.push(std::path::PathBuf::from(home).display().to_string());
    }

    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_configured_prefixes() {
        let trace = "at /home/ace/bot/ace-utils/src/router.rs:42:9\nat /home/ace/bot/ace-bot/src/main.rs:10:1";
        let redacted = redact_paths(trace, &["/home/ace/bot"]);

        assert_eq!(
            redacted,
            "at ./ace-utils/src/router.rs:42:9\nat ./ace-bot/src/main.rs:10:1"
        );
        assert!(!redacted.contains("/home/ace"));
    }

    #[test]
    fn longest_prefix_wins_and_trailing_separator_is_ignored() {
        let trace = "/srv/build/.cargo/registry/src/tokio-1.40/src/lib.rs";
        let redacted = redact_paths(trace, &["/srv/build/", "/srv/build/.cargo/registry/src"]);

        assert_eq!(redacted, "./tokio-1.40/src/lib.rs");
    }

    #[test]
    fn empty_and_root_prefixes_are_skipped() {
        let trace = "/usr/lib/libc.so";
        assert_eq!(redact_paths(trace, &["", "/"]), trace);
    }

    #[test]
    fn text_without_paths_is_untouched() {
        let trace = "Unhandled: socket closed";
        assert_eq!(redact_paths(trace, &["/home/ace"]), trace);
    }
}
