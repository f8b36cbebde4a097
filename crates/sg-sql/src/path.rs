//! Ancestry-aware traversal over query node trees

use crate::node::QueryNode;
use std::ops::ControlFlow;
use std::rc::Rc;

/// Immutable handle on a node reached during traversal.
///
/// Each path knows its parent path and the property key it was reached
/// through. Paths are shared with `Rc` so that references collected during
/// extraction can keep pointing at their node and its ancestry.
#[derive(Debug)]
pub struct QueryNodePath<'a> {
    node: &'a QueryNode,
    parent: Option<Rc<QueryNodePath<'a>>>,
    parent_prop_key: Option<&'static str>,
}

impl<'a> QueryNodePath<'a> {
    /// Path for the root of a tree
    pub fn root(node: &'a QueryNode) -> Rc<Self> {
        Rc::new(Self {
            node,
            parent: None,
            parent_prop_key: None,
        })
    }

    /// Path for `node`, reached from this path through `prop_key`
    pub fn child(self: &Rc<Self>, node: &'a QueryNode, prop_key: &'static str) -> Rc<Self> {
        Rc::new(Self {
            node,
            parent: Some(Rc::clone(self)),
            parent_prop_key: Some(prop_key),
        })
    }

    pub fn node(&self) -> &'a QueryNode {
        self.node
    }

    pub fn parent(&self) -> Option<&Rc<QueryNodePath<'a>>> {
        self.parent.as_ref()
    }

    /// Property key of the parent node this path was reached through
    pub fn parent_prop_key(&self) -> Option<&'static str> {
        self.parent_prop_key
    }

    /// Ancestor paths, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &QueryNodePath<'a>> {
        std::iter::successors(self.parent.as_deref(), |path| path.parent.as_deref())
    }

    /// Nearest enclosing statement, excluding this node
    pub fn parent_statement(&self) -> Option<&QueryNodePath<'a>> {
        self.ancestors().find(|path| path.node.is_statement())
    }

    /// Property key under which this node's branch hangs off its nearest
    /// enclosing statement, e.g. `returningList`
    pub fn statement_clause(&self) -> Option<&'static str> {
        std::iter::once(self)
            .chain(self.ancestors())
            .find(|path| {
                path.parent
                    .as_ref()
                    .is_some_and(|parent| parent.node.is_statement())
            })
            .and_then(|path| path.parent_prop_key)
    }

    pub fn node_type(&self) -> &'static str {
        self.node.kind_name()
    }

    /// Byte offset of the node in the generated query string
    pub fn location(&self) -> Option<usize> {
        self.node.location()
    }

    /// Whether both paths point at the same node
    pub fn is_same_node(&self, other: &QueryNodePath<'_>) -> bool {
        std::ptr::eq(self.node, other.node)
    }

    /// Readable route from the root, e.g. `SelectStmt > fromClause > RangeVar`
    pub fn describe(&self) -> String {
        let segments: Vec<String> = self
            .ancestors()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .chain(std::iter::once(self))
            .map(|path| match path.parent_prop_key {
                Some(key) => format!("{key} > {}", path.node_type()),
                None => path.node_type().to_string(),
            })
            .collect();
        segments.join(" > ")
    }
}

/// What the traversal does after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Descend into the node's children
    Continue,
    /// Do not descend, continue with the next sibling
    SkipChildren,
    /// Abort the whole traversal
    Stop,
}

/// Walk the tree below `path` in pre-order, calling `visit` for every node
/// including `path` itself.
///
/// Returns `ControlFlow::Break` if `visit` asked to stop.
pub fn traverse<'a, F>(path: &Rc<QueryNodePath<'a>>, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&Rc<QueryNodePath<'a>>) -> Traversal,
{
    match visit(path) {
        Traversal::Stop => return ControlFlow::Break(()),
        Traversal::SkipChildren => return ControlFlow::Continue(()),
        Traversal::Continue => {}
    }

    for (key, child) in path.node.children() {
        traverse(&path.child(child, key), visit)?;
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
#[path = "path_test.rs"]
mod tests;
