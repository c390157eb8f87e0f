use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use prism_value::{Path, Segment, ToPath, Value};

use crate::error::{Error, Result};

use super::kind::ResourceKind;
use super::shape;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Resource`].
///
/// The renderer keys its GPU caches by this id, never by address.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed, mutable handle over a payload destined for the GPU.
///
/// Every successful mutation bumps [`version`](Self::version) and marks the
/// resource dirty; the next draw that includes it uploads the new contents
/// and clears the flag. The kind is fixed at creation.
///
/// Not `Clone`: a copy would share the id and alias the GPU cache entry.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    kind: ResourceKind,
    label: Option<String>,
    payload: Value,
    version: u64,
    dirty: Cell<bool>,
}

impl Resource {
    /// Creates a resource, validating `payload` against `kind`.
    pub fn new(kind: ResourceKind, payload: impl Into<Value>) -> Result<Self> {
        let payload = payload.into();
        shape::validate(kind, &payload).map_err(|reason| Error::shape(kind, reason))?;

        Ok(Self {
            id: ResourceId::next(),
            kind,
            label: None,
            payload,
            version: 0,
            dirty: Cell::new(true),
        })
    }

    pub fn vertex_data(payload: impl Into<Value>) -> Result<Self> {
        Self::new(ResourceKind::VertexData, payload)
    }

    pub fn index_data(payload: impl Into<Value>) -> Result<Self> {
        Self::new(ResourceKind::IndexData, payload)
    }

    pub fn uniforms(payload: impl Into<Value>) -> Result<Self> {
        Self::new(ResourceKind::Uniform, payload)
    }

    pub fn textures(payload: impl Into<Value>) -> Result<Self> {
        Self::new(ResourceKind::Texture, payload)
    }

    /// Attaches a debug label, used in logs and GPU object names.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Number of successful mutations since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True until the renderer has uploaded the current contents.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Reads the value at `path`. Does not affect the dirty flag.
    pub fn get<P>(&self, path: &P) -> Result<&Value>
    where
        P: ToPath + ?Sized,
    {
        Ok(self.payload.get(path)?)
    }

    /// Writes `value` at `path` and marks the resource dirty.
    ///
    /// Path errors are returned unchanged and leave the payload as it was.
    /// The touched top-level entry is re-validated against the kind; a shape
    /// violation is rolled back and reported as [`Error::ResourceShape`].
    pub fn set<P>(&mut self, path: &P, value: impl Into<Value>) -> Result<&mut Self>
    where
        P: ToPath + ?Sized,
    {
        let path = path.to_path()?;
        let previous = self.payload.set(&*path, value.into())?;

        if let Err(reason) = self.validate_touched(&path) {
            self.roll_back(&path, previous);
            return Err(Error::shape(self.kind, reason));
        }

        self.touch();
        Ok(self)
    }

    /// Swaps the whole payload after validating it.
    pub fn replace(&mut self, payload: impl Into<Value>) -> Result<&mut Self> {
        let payload = payload.into();
        shape::validate(self.kind, &payload).map_err(|reason| Error::shape(self.kind, reason))?;
        self.payload = payload;
        self.touch();
        Ok(self)
    }

    pub(crate) fn mark_clean(&self) {
        self.dirty.set(false);
    }

    fn touch(&mut self) {
        self.version += 1;
        self.dirty.set(true);
    }

    fn validate_touched(&self, path: &Path) -> std::result::Result<(), String> {
        match (path.segments().first(), &self.payload) {
            (Some(Segment::Field(key)), Value::Object(map)) => match map.get(key) {
                Some(entry) => shape::validate_entry(self.kind, key, entry),
                None => shape::validate(self.kind, &self.payload),
            },
            _ => shape::validate(self.kind, &self.payload),
        }
    }

    fn roll_back(&mut self, path: &Path, previous: Option<Value>) {
        let restored = match previous {
            Some(old) => self.payload.set(path, old).map(|_| ()),
            None => {
                let parent = Path::from_segments(path.segments()[..path.segments().len() - 1].to_vec());
                self.payload.get_mut(&parent).map(|v| {
                    if let Value::Array(items) = v {
                        items.pop();
                    }
                })
            }
        };
        if let Err(e) = restored {
            log::error!("resource {}: failed to roll back `{path}`: {e}", self.id);
        }
    }
}
