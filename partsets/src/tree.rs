//! Ordered rooted tree of modules awaiting a pick.

use crate::module::ModuleId;

/// Ordered tree keyed by module; a module appears at most once in the
/// whole tree. Entries keep insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PickTree {
    entries: Vec<(ModuleId, PickTree)>,
}

impl PickTree {
    /// Empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// True when the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Direct entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(ModuleId, Self)] {
        &self.entries
    }

    /// Modules of the direct level, in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.entries.iter().map(|(module, _)| *module)
    }

    /// True when `module` appears anywhere in the tree.
    #[must_use]
    pub fn contains(&self, module: ModuleId) -> bool {
        self.entries
            .iter()
            .any(|(entry, subtree)| *entry == module || subtree.contains(module))
    }

    /// Insert a direct entry.
    pub fn insert(&mut self, module: ModuleId, subtree: Self) {
        debug_assert!(!self.contains(module));
        self.entries.push((module, subtree));
    }

    /// Append every direct entry of `other`.
    pub fn merge(&mut self, other: Self) {
        for (module, subtree) in other.entries {
            self.insert(module, subtree);
        }
    }

    /// Remove and return the most recently inserted entry.
    pub fn pop(&mut self) -> Option<(ModuleId, Self)> {
        self.entries.pop()
    }

    /// Subtree rooted at `module`, wherever it appears.
    #[must_use]
    pub fn subtree(&self, module: ModuleId) -> Option<&Self> {
        for (entry, sub) in &self.entries {
            if *entry == module {
                return Some(sub);
            }
            if let Some(found) = sub.subtree(module) {
                return Some(found);
            }
        }
        None
    }

    /// Number of leaf modules in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, sub)| if sub.is_empty() { 1 } else { sub.leaf_count() })
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::module::Design;

    #[test]
    fn insertion_order_and_lookup() {
        let mut design = Design::new();
        let a = design.add_module(None, "a");
        let b = design.add_module(None, "b");
        let c = design.add_module(None, "c");

        let mut inner = PickTree::new();
        inner.insert(c, PickTree::new());

        let mut tree = PickTree::new();
        tree.insert(a, inner);
        tree.insert(b, PickTree::new());

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.top_level().collect::<Vec<_>>(), [a, b]);
        assert!(tree.contains(c));
        assert!(tree.subtree(c).unwrap().is_empty());
        assert_eq!(tree.subtree(a).unwrap().len(), 1);
    }

    #[test]
    fn pop_is_lifo() {
        let mut design = Design::new();
        let a = design.add_module(None, "a");
        let b = design.add_module(None, "b");

        let mut tree = PickTree::new();
        tree.insert(a, PickTree::new());
        tree.insert(b, PickTree::new());

        assert_eq!(tree.pop().map(|(module, _)| module), Some(b));
        assert_eq!(tree.pop().map(|(module, _)| module), Some(a));
        assert_eq!(tree.pop(), None);
    }

    #[test]
    fn leaf_counting() {
        let mut design = Design::new();
        let a = design.add_module(None, "a");
        let b = design.add_module(None, "b");
        let c = design.add_module(None, "c");
        let d = design.add_module(None, "d");

        // a ├ b
        //   └ c ─ d
        let mut c_tree = PickTree::new();
        c_tree.insert(d, PickTree::new());
        let mut a_tree = PickTree::new();
        a_tree.insert(b, PickTree::new());
        a_tree.insert(c, c_tree);
        let mut tree = PickTree::new();
        tree.insert(a, a_tree);

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.subtree(c).unwrap().leaf_count(), 1);
        assert_eq!(tree.subtree(b).unwrap().leaf_count(), 0);
    }
}
