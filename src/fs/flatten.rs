//! Flattened name transform
//!
//! Turns a relative path such as `a/b/c/report.final.txt` into an extension
//! bucket (`txt`) and a flat file name (`abcreport.final.txt`): every parent
//! directory contributes only its first character.
//!
//! The scheme is lossy. `x/y/a.txt` and `xa/yb/a.txt` both become `xya.txt`
//! in the `txt` bucket, and whichever copy lands last wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// A file path relative to the source root, `/`-separated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    /// Wrap an already `/`-separated relative path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Build from a platform path relative to the scan root.
    ///
    /// Returns `None` for empty paths and paths with root, prefix, `.` or
    /// `..` components. Non-UTF-8 segments are converted lossily.
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_string_lossy()),
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// The path as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated segments
    pub fn segments(&self) -> std::str::Split<'_, char> {
        self.0.split('/')
    }

    /// Final segment (the file name)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Destination bucket and flat file name for one relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlattenedTarget {
    /// Extension without its leading dot, empty when there is none
    pub extension: String,
    /// Flattened file name, extension included
    pub name: String,
}

/// Split a file name into stem and dotted suffix at the last `.`.
///
/// Leading dots never start an extension, so `.bashrc` has none. A trailing
/// bare dot is a suffix of `"."` with an empty extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(dot) if file_name[..dot].chars().any(|c| c != '.') => file_name.split_at(dot),
        _ => (file_name, ""),
    }
}

/// Compute the flattened target for a relative path.
///
/// Pure and deterministic: no filesystem access.
pub fn flatten(path: &RelativePath) -> FlattenedTarget {
    let (leading, file_name) = match path.as_str().rsplit_once('/') {
        Some((dirs, file)) => (Some(dirs), file),
        None => (None, path.as_str()),
    };

    let (stem, suffix) = split_extension(file_name);

    let mut name = String::with_capacity(file_name.len() + 8);
    if let Some(dirs) = leading {
        // empty segments contribute nothing
        name.extend(dirs.split('/').filter_map(|segment| segment.chars().next()));
    }
    name.push_str(stem);
    name.push_str(suffix);

    FlattenedTarget {
        extension: suffix.strip_prefix('.').unwrap_or("").to_string(),
        name,
    }
}
