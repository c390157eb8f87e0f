use crate::error::{Error, Result};
use crate::resource::{Resource, ResourceId, ResourceKind};

/// One positional slot a plugin expects at draw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDecl {
    pub name: String,
    pub kind: ResourceKind,
    /// Optional slots may be absent, e.g. maps that are still loading.
    pub required: bool,
}

impl SlotDecl {
    pub fn required(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self { name: name.into(), kind, required: true }
    }

    pub fn optional(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self { name: name.into(), kind, required: false }
    }
}

/// Ordered slot declarations of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    slots: Vec<SlotDecl>,
}

impl Schema {
    pub fn new(slots: Vec<SlotDecl>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[SlotDecl] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Matches positional resources against the declared slots.
    ///
    /// `None` entries are absent resources; missing trailing entries count as
    /// absent too. Fails with [`Error::SchemaMismatch`] when a present resource
    /// has the wrong kind, a required slot is absent, or more resources than
    /// slots are given.
    pub fn bind<'r>(&self, plugin: &str, resources: &[Option<&'r Resource>]) -> Result<BoundState<'r>> {
        if resources.len() > self.slots.len() {
            return Err(Error::mismatch(
                plugin,
                format!("slot {}", self.slots.len()),
                format!("{} resources given, {} slots declared", resources.len(), self.slots.len()),
            ));
        }

        let mut bound = Vec::with_capacity(self.slots.len());
        for (i, decl) in self.slots.iter().enumerate() {
            let resource = resources.get(i).copied().flatten();
            match resource {
                Some(r) if r.kind() != decl.kind => {
                    return Err(Error::mismatch(
                        plugin,
                        slot_location(i, decl),
                        format!("expected {}, got {} resource {}", decl.kind, r.kind(), r.id()),
                    ));
                }
                None if decl.required => {
                    return Err(Error::mismatch(
                        plugin,
                        slot_location(i, decl),
                        format!("required {} resource is absent", decl.kind),
                    ));
                }
                None => log::trace!("plugin `{plugin}`: optional slot {i} (`{}`) absent", decl.name),
                Some(_) => {}
            }
            bound.push(resource);
        }

        Ok(BoundState { slots: bound })
    }
}

fn slot_location(index: usize, decl: &SlotDecl) -> String {
    format!("slot {index} (`{}`)", decl.name)
}

/// Result of a successful bind: one entry per declared slot, in order.
#[derive(Debug, Clone)]
pub struct BoundState<'r> {
    slots: Vec<Option<&'r Resource>>,
}

impl<'r> BoundState<'r> {
    pub fn get(&self, slot: usize) -> Option<&'r Resource> {
        self.slots.get(slot).copied().flatten()
    }

    /// Present resources with their slot index, in slot order.
    pub fn present(&self) -> impl Iterator<Item = (usize, &'r Resource)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|r| (i, r)))
    }

    /// Present resources of `kind`, in slot order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &'r Resource> + '_ {
        self.present()
            .map(|(_, r)| r)
            .filter(move |r| r.kind() == kind)
    }

    pub fn ids(&self) -> Vec<Option<ResourceId>> {
        self.slots.iter().map(|r| r.map(Resource::id)).collect()
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn absent(&self) -> usize {
        self.slots.iter().filter(|r| r.is_none()).count()
    }
}
