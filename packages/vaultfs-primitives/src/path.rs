use std::{fmt, str::FromStr};

use crate::{EntryName, EntryNameError, impl_str_serde};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Path must be absolute ({0})")]
    NotAbsolute(String),

    #[error("Invalid path segment ({0})")]
    InvalidSegment(String),
}

impl From<EntryNameError> for PathError {
    fn from(error: EntryNameError) -> Self {
        let EntryNameError::SyntaxError(segment) = error;
        PathError::InvalidSegment(segment)
    }
}

/// A normalised absolute path: the sequence of entry names walked from the
/// user manifest root. Parsing tolerates a single trailing slash; everything
/// else (empty segments, dot entries, raw separators inside a name) is
/// rejected so a constructed `FsPath` is always in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FsPath {
    parts: Vec<EntryName>,
}

impl FsPath {
    pub fn root() -> FsPath {
        FsPath { parts: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[EntryName] {
        &self.parts
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Final segment; `None` for the root.
    pub fn name(&self) -> Option<&EntryName> {
        self.parts.last()
    }

    /// The root is its own parent, as with POSIX `/..`.
    pub fn parent(&self) -> FsPath {
        let mut parts = self.parts.clone();
        parts.pop();

        FsPath { parts }
    }

    pub fn join(&self, name: EntryName) -> FsPath {
        let mut parts = self.parts.clone();
        parts.push(name);

        FsPath { parts }
    }

    /// Prefix relation: does `self` live inside (or equal) `other`?
    pub fn starts_with(&self, other: &FsPath) -> bool {
        self.parts.len() >= other.parts.len() && self.parts[..other.parts.len()] == other.parts[..]
    }

    /// Every prefix from the root down to `self` included. Reverse it to
    /// walk back up.
    pub fn prefixes(&self) -> impl DoubleEndedIterator<Item = FsPath> + '_ {
        (0..=self.parts.len()).map(|depth| FsPath {
            parts: self.parts[..depth].to_vec(),
        })
    }
}

impl FromStr for FsPath {
    type Err = PathError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some(relative) = raw.strip_prefix('/') else {
            return Err(PathError::NotAbsolute(raw.to_string()));
        };

        let relative = relative.strip_suffix('/').unwrap_or(relative);

        if relative.is_empty() {
            return if raw == "/" {
                Ok(FsPath::root())
            } else {
                Err(PathError::InvalidSegment(String::new()))
            };
        }

        let parts = relative
            .split('/')
            .map(EntryName::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FsPath { parts })
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }

        for part in &self.parts {
            write!(f, "/{}", part)?;
        }

        Ok(())
    }
}

impl_str_serde!(FsPath);
