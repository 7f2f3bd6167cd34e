use crate::types::Type;

/// One binding in the scope tree.
#[derive(Debug, Clone)]
pub struct ScopeNode {
    pub name: String,
    pub ty: Type,
    /// Stable slot number for downstream runtime use: the root binding is
    /// 0 and each child is its parent's index plus one.
    pub stack_index: usize,
    parent: Option<usize>,
}

/// An opaque handle to a scope state; restoring it is an O(1) repoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(Option<usize>);

/// A persistent chain of named, typed bindings. A scope is just a
/// reference to its deepest node; the chain up to the root is the full
/// set of visible bindings. Nodes live in an arena and are never deleted:
/// leaving a scope, rolling back a failed `let`, and resuming a REPL
/// round are all snapshot restores.
///
/// Lookup acts on the nearest node with a matching name, so a later
/// registration shadows an earlier one until its snapshot is restored.
/// Duplicate detection is the caller's business; some callers batch
/// registrations on purpose and want a single combined error.
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
    current: Option<usize>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new leaf bound to `name` and makes it current. Returns
    /// the binding's stack index.
    pub fn register(&mut self, name: impl Into<String>, ty: Type) -> usize {
        let stack_index = match self.current {
            Some(leaf) => self.nodes[leaf].stack_index + 1,
            None => 0,
        };
        self.nodes.push(ScopeNode {
            name: name.into(),
            ty,
            stack_index,
            parent: self.current,
        });
        self.current = Some(self.nodes.len() - 1);
        stack_index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The type of the nearest visible binding for `name`.
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.find(name).map(|idx| &self.nodes[idx].ty)
    }

    /// Overwrites the type of the nearest visible binding for `name`.
    /// Returns false if no such binding is visible.
    pub fn set(&mut self, name: &str, ty: Type) -> bool {
        match self.find(name) {
            Some(idx) => {
                self.nodes[idx].ty = ty;
                true
            }
            None => false,
        }
    }

    pub fn get_index(&self, name: &str) -> Option<usize> {
        self.find(name).map(|idx| self.nodes[idx].stack_index)
    }

    pub fn take_snapshot(&self) -> Snapshot {
        Snapshot(self.current)
    }

    pub fn restore_snapshot(&mut self, snapshot: Snapshot) {
        self.current = snapshot.0;
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    fn find(&self, name: &str) -> Option<usize> {
        let mut cursor = self.current;
        while let Some(idx) = cursor {
            if self.nodes[idx].name == name {
                return Some(idx);
            }
            cursor = self.nodes[idx].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn register_assigns_sequential_stack_indices() {
        let mut tree = ScopeTree::new();
        assert_eq!(tree.register("a", Type::Integer), 0);
        assert_eq!(tree.register("b", Type::Str), 1);
        assert_eq!(tree.register("c", Type::Boolean), 2);
        assert_eq!(tree.get_index("b"), Some(1));
    }

    #[test]
    fn lookup_walks_toward_the_root() {
        let mut tree = ScopeTree::new();
        tree.register("a", Type::Integer);
        tree.register("b", Type::Str);
        assert!(tree.contains("a"));
        assert_eq!(tree.get("a"), Some(&Type::Integer));
        assert_eq!(tree.get("missing"), None);
    }

    #[test]
    fn nearest_registration_shadows() {
        let mut tree = ScopeTree::new();
        tree.register("x", Type::Integer);
        let snap = tree.take_snapshot();
        tree.register("x", Type::Str);
        assert_eq!(tree.get("x"), Some(&Type::Str));
        tree.restore_snapshot(snap);
        assert_eq!(tree.get("x"), Some(&Type::Integer));
    }

    #[test]
    fn restore_is_a_rollback() {
        let mut tree = ScopeTree::new();
        tree.register("keep", Type::Integer);
        let snap = tree.take_snapshot();
        tree.register("gone", Type::Str);
        tree.restore_snapshot(snap);
        assert!(tree.contains("keep"));
        assert!(!tree.contains("gone"));
    }

    #[test]
    fn snapshots_survive_later_registrations() {
        let mut tree = ScopeTree::new();
        tree.register("a", Type::Integer);
        let snap = tree.take_snapshot();
        tree.register("b", Type::Str);
        tree.restore_snapshot(snap);
        // A fresh branch forks from the restored point.
        tree.register("c", Type::Boolean);
        assert!(tree.contains("a"));
        assert!(tree.contains("c"));
        assert!(!tree.contains("b"));
    }

    #[test]
    fn set_overwrites_nearest_binding() {
        let mut tree = ScopeTree::new();
        tree.register("a", Type::Unknown);
        assert!(tree.set("a", Type::Integer));
        assert_eq!(tree.get("a"), Some(&Type::Integer));
        assert!(!tree.set("nope", Type::Integer));
    }
}
