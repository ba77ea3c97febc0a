//! Arena used to assemble category forests without recursion.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::node::CategoryNode;

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct TreeNode {
    /// Node payload; `children` of the payload stay empty inside the arena
    pub data: CategoryNode,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

/// Arena-based forest.
///
/// Nodes reference each other by generational index, so the nested
/// output can be produced bottom-up without holding links between nodes.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: CategoryNode, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal across all roots, children left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Post-order traversal across all roots: children before their parent.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Longest root-to-leaf chain, in nodes.
    pub fn depth(&self) -> usize {
        let mut depth_of: HashMap<Index, usize> = HashMap::new();
        let mut max_depth = 0;
        for (idx, node) in self.iter() {
            let depth = node
                .parent
                .and_then(|p| depth_of.get(&p))
                .map_or(1, |d| d + 1);
            depth_of.insert(idx, depth);
            max_depth = max_depth.max(depth);
        }
        max_depth
    }

    /// Consume the arena into nested nodes, preserving child order.
    #[instrument(level = "debug", skip(self), fields(nodes = self.arena.len()))]
    pub fn into_nested(self) -> Vec<CategoryNode> {
        let order: Vec<Index> = self.iter_postorder().map(|(idx, _)| idx).collect();
        let mut arena = self.arena;
        let mut built: HashMap<Index, CategoryNode> = HashMap::with_capacity(order.len());

        for idx in order {
            if let Some(node) = arena.remove(idx) {
                let mut data = node.data;
                data.children = node
                    .children
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect();
                built.insert(idx, data);
            }
        }

        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots.iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
