//! Object key transforms
//!
//! Pure string functions over "/"-delimited object keys, where a trailing
//! slash marks a directory prefix. These back every destination-resolution
//! decision in the mutation and orchestration layers.
//!
//! Contract: never panics; malformed input produces a best-effort string
//! (empty in, empty-ish out).

/// Last non-empty "/"-separated segment of a key.
///
/// `"a/b/c.txt"` -> `"c.txt"`, `"a/b/"` -> `"b"`, `"c.txt"` -> `"c.txt"`.
pub fn last_segment(key: &str) -> &str {
    key.split('/').rev().find(|s| !s.is_empty()).unwrap_or("")
}

/// Compute the destination key for copying/moving `source_key` under
/// `destination_prefix`.
///
/// A directory source keeps its trailing slash: `"a/b/"` into `"x/y/"`
/// becomes `"x/y/b/"`. A file source carries its file name: `"a/b/c.txt"`
/// into `"x/y/"` becomes `"x/y/c.txt"`. When `destination_prefix` does not
/// end with a slash it is treated as the complete target key (rename flows
/// supply the final key directly).
pub fn destination_from_source(source_key: &str, destination_prefix: &str) -> String {
    if !destination_prefix.ends_with('/') {
        return destination_prefix.to_string();
    }

    let name = last_segment(source_key);
    if source_key.ends_with('/') && !name.is_empty() {
        format!("{destination_prefix}{name}/")
    } else {
        format!("{destination_prefix}{name}")
    }
}

/// Replace the last non-empty segment of `key` with `new_name`.
///
/// Directory-ness is preserved; directory results are normalized to carry
/// both a leading and a trailing slash: `"a/b/"` renamed to `"new"` yields
/// `"/a/new/"`. File results are joined without a leading slash:
/// `"a/b/c.txt"` renamed to `"new.txt"` yields `"a/b/new.txt"`.
pub fn rename_trailing_segment(key: &str, new_name: &str) -> String {
    let is_dir = key.ends_with('/');
    let mut segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(last) = segments.last_mut() {
        *last = new_name;
    } else {
        segments.push(new_name);
    }

    if is_dir {
        format!("/{}/", segments.join("/"))
    } else {
        segments.join("/")
    }
}

/// Rewrite a descendant key from one directory prefix to another.
///
/// Longest-prefix replacement: the leading `old_prefix` of `child_key` is
/// replaced by `new_prefix`. A child that does not start with `old_prefix`
/// is returned unchanged.
pub fn rewrite_prefix(child_key: &str, old_prefix: &str, new_prefix: &str) -> String {
    match child_key.strip_prefix(old_prefix) {
        Some(rest) => format!("{new_prefix}{rest}"),
        None => child_key.to_string(),
    }
}

/// Second-to-last "/"-separated segment of a prefix.
///
/// A common-prefix listing entry like `"docs/reports/"` displays as
/// `"reports"`.
pub fn split_parent_segment(prefix: &str) -> String {
    let parts: Vec<&str> = prefix.split('/').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].to_string()
    } else {
        String::new()
    }
}

/// Join a child name onto a directory prefix.
pub fn child_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}/{name}")
    }
}

/// Strip the display-level leading slash so the key is usable against the
/// backend; the root marker `"/"` maps to the empty root prefix.
pub fn trim_root(key: &str) -> &str {
    key.trim_start_matches('/')
}

/// Heuristic directory classification for listing entries.
///
/// A trailing slash is authoritative. Without one, an extensionless last
/// segment is treated as a directory. This is inherently ambiguous for
/// extensionless files and must only drive display classification, never
/// operation dispatch.
pub fn is_directory_key(key: &str) -> bool {
    key.ends_with('/') || !last_segment(key).contains('.')
}
