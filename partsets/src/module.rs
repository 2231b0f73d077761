//! Module graph with per-node capability maps.
//!
//! A design is an arena of named nodes: modules, transparent interface
//! containers, and parameters. Behaviour is attached to modules as
//! capabilities in an extensible map keyed by [`CapabilityKind`]; lookup
//! is by identifier, never by downcasting.

use crate::picker::{PickedPart, PickerCap, Pinmap};
use crate::solver::Solver;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle to a node in a [`Design`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ModuleId(usize);

/// What a node in the design graph is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A part-bearing building block.
    Module,
    /// A transparent electrical interface container.
    Interface,
    /// A named, addressable parameter of its parent module.
    Parameter,
}

/// Identifier of a capability slot; each module carries at most one
/// capability per slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CapabilityKind {
    /// Knows how to pick a part.
    Picker,
    /// A part decision has been made.
    PartPicked,
    /// The node exists only to contain children.
    SkipSelfPick,
    /// The module has a footprint.
    Footprint,
    /// A footprint pinmap was chosen during picking.
    PinmapAttach,
}

/// A capability attached to a module.
#[derive(Clone)]
pub enum Capability {
    /// Knows how to pick a part for its module.
    Picker(PickerCap),
    /// A part decision has been made.
    PartPicked(PickedPart),
    /// Node exists only to contain children and is never picked itself.
    SkipSelfPick,
    /// Module has a footprint.
    Footprint,
    /// Footprint pinmap chosen during picking.
    PinmapAttach(Pinmap),
}

impl Capability {
    /// The slot this capability occupies.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Picker(_) => CapabilityKind::Picker,
            Self::PartPicked(_) => CapabilityKind::PartPicked,
            Self::SkipSelfPick => CapabilityKind::SkipSelfPick,
            Self::Footprint => CapabilityKind::Footprint,
            Self::PinmapAttach(_) => CapabilityKind::PinmapAttach,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartPicked(part) => f.debug_tuple("PartPicked").field(part).finish(),
            Self::PinmapAttach(pinmap) => f.debug_tuple("PinmapAttach").field(pinmap).finish(),
            other => write!(f, "{:?}", other.kind()),
        }
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    kind: NodeKind,
    parent: Option<ModuleId>,
    children: Vec<ModuleId>,
    capabilities: FxHashMap<CapabilityKind, Capability>,
    specialized_by: Option<ModuleId>,
}

/// Arena holding every node of a design.
#[derive(Debug, Default)]
pub struct Design {
    nodes: Vec<Node>,
}

impl Design {
    /// Empty design.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add_node(&mut self, parent: Option<ModuleId>, name: &str, kind: NodeKind) -> ModuleId {
        let id = ModuleId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_owned(),
            kind,
            parent,
            children: Vec::new(),
            capabilities: FxHashMap::default(),
            specialized_by: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Add a module below `parent`, or a root module.
    pub fn add_module(&mut self, parent: Option<ModuleId>, name: &str) -> ModuleId {
        self.add_node(parent, name, NodeKind::Module)
    }

    /// Add a transparent interface container below `parent`.
    pub fn add_interface(&mut self, parent: ModuleId, name: &str) -> ModuleId {
        self.add_node(Some(parent), name, NodeKind::Interface)
    }

    /// Add a named parameter below `parent`.
    pub fn add_parameter(&mut self, parent: ModuleId, name: &str) -> ModuleId {
        self.add_node(Some(parent), name, NodeKind::Parameter)
    }

    /// Kind of the node.
    #[must_use]
    pub fn kind(&self, id: ModuleId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Local name of the node.
    #[must_use]
    pub fn name(&self, id: ModuleId) -> &str {
        &self.nodes[id.0].name
    }

    /// Dotted path from the root.
    #[must_use]
    pub fn full_name(&self, id: ModuleId) -> String {
        let mut parts = vec![self.name(id)];
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            parts.push(self.name(node));
            cursor = self.parent(node);
        }
        parts.reverse();
        parts.join(".")
    }

    /// Parent node, `None` for roots.
    #[must_use]
    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.nodes[id.0].parent
    }

    /// Direct children in insertion order.
    #[must_use]
    pub fn children(&self, id: ModuleId) -> &[ModuleId] {
        &self.nodes[id.0].children
    }

    /// Direct children of the given kind, in insertion order.
    pub fn children_of_kind(
        &self,
        id: ModuleId,
        kind: NodeKind,
    ) -> impl Iterator<Item = ModuleId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.kind(*child) == kind)
    }

    /// Named parameters of a module, in declaration order.
    pub fn parameters(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.children_of_kind(id, NodeKind::Parameter)
    }

    /// Attach `capability`, replacing any previous one in the same slot.
    pub fn add_capability(&mut self, id: ModuleId, capability: Capability) {
        self.nodes[id.0]
            .capabilities
            .insert(capability.kind(), capability);
    }

    /// True when the node carries a capability in the given slot.
    #[must_use]
    pub fn has_capability(&self, id: ModuleId, kind: CapabilityKind) -> bool {
        self.nodes[id.0].capabilities.contains_key(&kind)
    }

    /// The capability in the given slot, if any.
    #[must_use]
    pub fn capability(&self, id: ModuleId, kind: CapabilityKind) -> Option<&Capability> {
        self.nodes[id.0].capabilities.get(&kind)
    }

    /// Nearest node, starting at `id` itself, carrying a capability in the
    /// given slot.
    #[must_use]
    pub fn self_or_ancestor_with(&self, id: ModuleId, kind: CapabilityKind) -> Option<ModuleId> {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if self.has_capability(node, kind) {
                return Some(node);
            }
            cursor = self.parent(node);
        }
        None
    }

    /// Record that `special` replaces `general`.
    pub fn specialize(&mut self, general: ModuleId, special: ModuleId) {
        debug_assert!(general != special);
        self.nodes[general.0].specialized_by = Some(special);
    }

    /// Follow specialisation links to the most special version of `id`.
    #[must_use]
    pub fn most_special(&self, id: ModuleId) -> ModuleId {
        let mut cursor = id;
        while let Some(special) = self.nodes[cursor.0].specialized_by {
            cursor = special;
        }
        cursor
    }

    /// True when no more special version of `id` exists.
    #[must_use]
    pub fn is_most_special(&self, id: ModuleId) -> bool {
        self.nodes[id.0].specialized_by.is_none()
    }

    /// Mark a module as needing no pick; it carries the remove pseudo-part
    /// from here on.
    pub fn mark_no_pick_needed(&mut self, id: ModuleId) {
        self.add_capability(id, Capability::PartPicked(PickedPart::Remove));
    }

    /// Human-readable parameter summary of a module, one line per
    /// parameter.
    #[must_use]
    pub fn pretty_params(&self, id: ModuleId, solver: &dyn Solver) -> String {
        self.parameters(id)
            .map(|param| {
                let domain = solver
                    .describe(param)
                    .unwrap_or_else(|| "unconstrained".to_owned());
                format!("{}: {domain}", self.name(param))
            })
            .join("\n")
    }
}
