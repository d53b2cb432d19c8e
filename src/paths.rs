//! Filesystem path detection for rendered content.
//!
//! The engine's replies routinely name files it found on the user's
//! machine, usually inside bold or inline-code spans. This module decides
//! whether a rendered text fragment looks like a filesystem path so the
//! renderer can wire it to an open action.
//!
//! The heuristic is deliberately permissive: a bold label misclassified
//! as a path is a clickable-but-harmless span, while a missed real path
//! breaks the user's main workflow of opening files the engine found.

/// Returns true if `token` looks like a filesystem path.
///
/// A token qualifies when it is at least three characters long and any of
/// the following hold after trimming surrounding whitespace:
///
/// - it starts with `/` (POSIX absolute path),
/// - it starts with a single ASCII drive letter followed by `:` and a
///   separator (`C:/` or `C:\`, case-insensitive),
/// - it starts with `\\` (UNC network path),
/// - it contains `:/` or `:\` anywhere (mixed-separator or embedded
///   drive references).
///
/// The length check runs against the raw token, before trimming. Pure
/// string inspection; never panics.
///
/// # Examples
///
/// ```
/// # use omnimind::paths::is_path_like;
/// assert!(is_path_like("/Users/a"));
/// assert!(is_path_like("C:\\Windows"));
/// assert!(!is_path_like("hello"));
/// assert!(!is_path_like("ab"));
/// ```
pub fn is_path_like(token: &str) -> bool {
    if token.len() < 3 {
        return false;
    }
    let s = token.trim();
    s.starts_with('/')
        || has_drive_prefix(s)
        || s.starts_with("\\\\")
        || s.contains(":/")
        || s.contains(":\\")
}

/// Returns the normalized open target for `token`, when it classifies as
/// a path.
///
/// Normalization is trimming only: the engine emits paths verbatim and
/// the open endpoint resolves them on its side.
pub fn open_target(token: &str) -> Option<String> {
    if is_path_like(token) {
        Some(token.trim().to_string())
    } else {
        None
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}
