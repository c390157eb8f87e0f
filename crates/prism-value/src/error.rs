use std::fmt;

/// An error raised while parsing or resolving a value path.
///
/// Every variant carries the full path text so callers can log the failure
/// without keeping the original string around.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// The path text does not match the path grammar.
    Syntax {
        path: String,
        /// Byte offset into `path` where parsing stopped.
        offset: usize,
        message: String,
    },
    /// A segment was applied to a value of the wrong type
    /// (indexing a scalar, field access on a sequence, ...).
    Type {
        path: String,
        /// The path prefix up to and including the offending segment.
        segment: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A mapping key is absent or an index is out of range.
    NotFound {
        path: String,
        /// The path prefix up to and including the offending segment.
        segment: String,
    },
}

impl PathError {
    pub(crate) fn syntax(path: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.to_string(),
            offset,
            message: message.into(),
        }
    }

    /// Returns the path text the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Syntax { path, .. } | Self::Type { path, .. } | Self::NotFound { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { path, offset, message } => {
                write!(f, "path syntax error in {path:?} at byte {offset}: {message}")
            }
            Self::Type { path, segment, expected, found } => write!(
                f,
                "path type error in {path:?}: `{segment}` expected {expected}, found {found}"
            ),
            Self::NotFound { path, segment } => {
                write!(f, "path not found in {path:?}: `{segment}` does not exist")
            }
        }
    }
}

impl std::error::Error for PathError {}
