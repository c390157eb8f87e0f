use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::PathError;
use crate::parser::parse_path;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping lookup by key.
    Field(String),
    /// Sequence lookup by position.
    Index(usize),
}

/// A parsed value path such as `u_Lights[0].color`.
///
/// Parse once and reuse: every resolver entry point accepts either a `Path`
/// or path text (see [`ToPath`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    source: String,
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(src: &str) -> Result<Self, PathError> {
        parse_path(src)
    }

    pub(crate) fn from_parts(source: String, segments: Vec<Segment>) -> Self {
        Self { source, segments }
    }

    /// Builds a path from segments. An empty list addresses the root value.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let source = render(&segments);
        Self { source, segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the first segment and the remaining path.
    pub fn split_first(&self) -> Option<(&Segment, Path)> {
        let (first, rest) = self.segments.split_first()?;
        Some((first, Path::from_segments(rest.to_vec())))
    }

    /// The original path text (or a canonical rendering for built paths).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Canonical text of the first `len` segments; used in error reports.
    pub(crate) fn prefix(&self, len: usize) -> String {
        render(&self.segments[..len.min(self.segments.len())])
    }
}

fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

// ── ToPath ────────────────────────────────────────────────────────────────

/// Anything that can be turned into a [`Path`]: path text or a parsed path.
pub trait ToPath {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError>;
}

impl ToPath for Path {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        Ok(Cow::Borrowed(self))
    }
}

impl ToPath for str {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        parse_path(self).map(Cow::Owned)
    }
}

impl ToPath for String {
    fn to_path(&self) -> Result<Cow<'_, Path>, PathError> {
        self.as_str().to_path()
    }
}
