//! Expansion and selection state for the tree tab.
//!
//! Only the rows that fit on screen are walked, starting from `top`, so a
//! capture with millions of events materializes a screenful of nodes.

use std::collections::HashSet;

use usbwatch::tree::{EventTree, NodeId};

pub struct Outline {
    expanded: HashSet<NodeId>,
    selected: Option<NodeId>,
    top: Option<NodeId>,
}

impl Outline {
    pub fn new(tree: &mut EventTree) -> Self {
        let first = tree.first_child(tree.root()).ok();
        Self {
            expanded: HashSet::new(),
            selected: first,
            top: first,
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn select(&mut self, node: NodeId) {
        self.selected = Some(node);
    }

    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.expanded.contains(&node)
    }

    /// Row after `node` in display order, skipping collapsed subtrees.
    pub fn next_visible(&self, tree: &mut EventTree, node: NodeId) -> Option<NodeId> {
        if self.is_expanded(node) {
            if let Ok(child) = tree.first_child(node) {
                return Some(child);
            }
        }
        let mut current = node;
        loop {
            if let Ok(next) = tree.next_sibling(current) {
                return Some(next);
            }
            current = tree.parent_of(current)?;
            if current == tree.root() {
                return None;
            }
        }
    }

    pub fn previous_visible(&self, tree: &mut EventTree, node: NodeId) -> Option<NodeId> {
        match tree.previous_sibling(node) {
            Ok(prev) => Some(self.last_visible_descendant(tree, prev)),
            Err(_) => tree.parent_of(node).filter(|&p| p != tree.root()),
        }
    }

    fn last_visible_descendant(&self, tree: &mut EventTree, node: NodeId) -> NodeId {
        let mut current = node;
        while self.is_expanded(current) {
            let count = tree.child_count(current);
            match count.checked_sub(1).map(|last| tree.child_at(current, last)) {
                Some(Ok(child)) => current = child,
                _ => break,
            }
        }
        current
    }

    pub fn select_next(&mut self, tree: &mut EventTree, steps: usize) {
        let Some(mut current) = self.selected else {
            return;
        };
        for _ in 0..steps {
            match self.next_visible(tree, current) {
                Some(next) => current = next,
                None => break,
            }
        }
        self.selected = Some(current);
    }

    pub fn select_previous(&mut self, tree: &mut EventTree, steps: usize) {
        let Some(mut current) = self.selected else {
            return;
        };
        for _ in 0..steps {
            match self.previous_visible(tree, current) {
                Some(prev) => current = prev,
                None => break,
            }
        }
        self.selected = Some(current);
    }

    pub fn select_first(&mut self, tree: &mut EventTree) {
        if let Ok(first) = tree.first_child(tree.root()) {
            self.selected = Some(first);
        }
    }

    pub fn select_last(&mut self, tree: &mut EventTree) {
        let root = tree.root();
        let Some(last) = tree.child_count(root).checked_sub(1) else {
            return;
        };
        if let Ok(node) = tree.child_at(root, last) {
            self.selected = Some(self.last_visible_descendant(tree, node));
        }
    }

    /// Expands the selection, or steps into it when already expanded.
    pub fn expand_selected(&mut self, tree: &mut EventTree) {
        let Some(node) = self.selected else {
            return;
        };
        if !tree.has_children(node) {
            return;
        }
        if self.expanded.insert(node) {
            return;
        }
        if let Ok(child) = tree.first_child(node) {
            self.selected = Some(child);
        }
    }

    /// Collapses the selection, or moves to its parent when already collapsed.
    pub fn collapse_selected(&mut self, tree: &EventTree) {
        let Some(node) = self.selected else {
            return;
        };
        if self.expanded.remove(&node) {
            return;
        }
        if let Some(parent) = tree.parent_of(node).filter(|&p| p != tree.root()) {
            self.selected = Some(parent);
        }
    }

    /// Rows to draw in a viewport `height` lines tall, scrolled so the
    /// selection is on screen.
    pub fn rows(&mut self, tree: &mut EventTree, height: usize) -> Vec<NodeId> {
        let Some(selected) = self.selected else {
            return Vec::new();
        };
        if height == 0 {
            return Vec::new();
        }
        let top = match self.top {
            Some(top) if tree.path_of(top) <= tree.path_of(selected) => top,
            _ => selected,
        };
        self.top = Some(top);

        let window = self.window(tree, top, height);
        if window.contains(&selected) {
            return window;
        }

        // Below the viewport: scroll so the selection sits on the last line.
        let mut top = selected;
        for _ in 1..height {
            match self.previous_visible(tree, top) {
                Some(prev) => top = prev,
                None => break,
            }
        }
        self.top = Some(top);
        self.window(tree, top, height)
    }

    fn window(&self, tree: &mut EventTree, top: NodeId, height: usize) -> Vec<NodeId> {
        let mut rows = Vec::with_capacity(height);
        let mut current = Some(top);
        while let Some(node) = current {
            if rows.len() >= height {
                break;
            }
            rows.push(node);
            current = self.next_visible(tree, node);
        }
        rows
    }
}
