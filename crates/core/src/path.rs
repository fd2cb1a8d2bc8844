//! Helpers for element paths such as
//! `//ldml/localeDisplayNames/languages/language[@type="oc"]`
//!
//! A path addresses one record in a locale. The "full" form of a path also
//! carries non-distinguishing attributes (`draft`, `references`) on its last
//! element. Competing proposals live under `alt="proposed-…"` variants of a
//! base path.

use crate::{CoreError, CoreResult, Status};

pub const DRAFT: &str = "draft";
pub const ALT: &str = "alt";
pub const REFERENCES: &str = "references";

const PROPOSED: &str = "proposed";

fn needle(name: &str) -> String {
    format!("[@{}=\"", name)
}

/// Check that a path is well formed: rooted at `//`, balanced brackets and
/// quotes.
pub fn validate(path: &str) -> CoreResult<()> {
    if !path.starts_with("//") || path.len() <= 2 {
        return Err(CoreError::malformed_path(path));
    }
    let mut depth = 0i32;
    let mut in_quotes = false;
    for c in path.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => {
                depth -= 1;
                if depth < 0 {
                    return Err(CoreError::malformed_path(path));
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                return Err(CoreError::malformed_path(path));
            }
            _ => {}
        }
    }
    if depth != 0 || in_quotes {
        return Err(CoreError::malformed_path(path));
    }
    Ok(())
}

pub fn is_well_formed(path: &str) -> bool {
    validate(path).is_ok()
}

/// Value of the last occurrence of attribute `name`
pub fn attribute<'a>(path: &'a str, name: &str) -> Option<&'a str> {
    let needle = needle(name);
    let start = path.rfind(&needle)? + needle.len();
    let end = path[start..].find('"')? + start;
    Some(&path[start..end])
}

/// Remove every occurrence of attribute `name`
pub fn remove_attribute(path: &str, name: &str) -> String {
    let needle = needle(name);
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(idx) = rest.find(&needle) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + needle.len()..];
        match after.find("\"]") {
            Some(end) => rest = &after[end + 2..],
            None => {
                out.push_str(&rest[idx..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Set attribute `name` on the last element, replacing any previous value
pub fn set_attribute(path: &str, name: &str, value: &str) -> String {
    let mut out = remove_attribute(path, name);
    out.push_str(&format!("[@{}=\"{}\"]", name, value));
    out
}

/// The path with non-distinguishing attributes stripped
pub fn distinguishing(full_path: &str) -> String {
    remove_attribute(&remove_attribute(full_path, DRAFT), REFERENCES)
}

/// Full path for a path resolved at `status`. Approved values carry no
/// `draft` attribute; a missing status means there is no value at all.
pub fn with_draft(path: &str, status: Status) -> Option<String> {
    match status.as_draft() {
        None if status == Status::Missing => None,
        None => Some(remove_attribute(path, DRAFT)),
        Some(draft) => Some(set_attribute(path, DRAFT, draft)),
    }
}

/// Status recorded in a full path
pub fn status_of(full_path: &str) -> Status {
    Status::from_draft(attribute(full_path, DRAFT))
}

pub fn alt(path: &str) -> Option<&str> {
    attribute(path, ALT)
}

pub fn references(path: &str) -> Option<&str> {
    attribute(path, REFERENCES)
}

/// Whether the path is a proposal variant of some base path
pub fn is_proposed(path: &str) -> bool {
    alt(path).map_or(false, |a| a.starts_with(PROPOSED) || a.contains("-proposed"))
}

/// Strip the proposal marker from an `alt` attribute.
///
/// `alt="proposed-x1"` is removed entirely; `alt="short-proposed-x1"`
/// becomes `alt="short"`.
pub fn base_path(path: &str) -> String {
    match alt(path) {
        Some(a) if a.starts_with(PROPOSED) => remove_attribute(path, ALT),
        Some(a) => match a.find("-proposed") {
            Some(idx) => {
                let kept = a[..idx].to_string();
                replace_attribute_in_place(path, ALT, &kept)
            }
            None => path.to_string(),
        },
        None => path.to_string(),
    }
}

fn replace_attribute_in_place(path: &str, name: &str, value: &str) -> String {
    let needle = needle(name);
    let Some(idx) = path.rfind(&needle) else {
        return path.to_string();
    };
    let start = idx + needle.len();
    match path[start..].find('"') {
        Some(end) => format!("{}{}{}", &path[..start], value, &path[start + end..]),
        None => path.to_string(),
    }
}
