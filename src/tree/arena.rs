use std::collections::HashMap;

/// Stable handle to a materialized tree node.
///
/// Handles index the arena of the [`EventTree`](super::EventTree) that
/// issued them; they stay valid, and keep denoting the same node, for as
/// long as that tree lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node stands for. The payload is the item id: an index into the
/// capture array named by the variant (a global transfer index for
/// transfers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Transfer(usize),
    Transaction(usize),
    Packet(usize),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    /// Navigation only; ownership runs root to leaf through `children`.
    pub parent: Option<NodeId>,
    pub ordinal: usize,
    children: HashMap<usize, NodeId>,
}

/// Owns every materialized node. The per-node child maps double as the
/// identity registry: a (parent, ordinal) pair is bound to one handle the
/// first time it is asked for and that binding never changes.
#[derive(Debug)]
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                ordinal: 0,
                children: HashMap::new(),
            }],
        }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn cached_child(&self, parent: NodeId, ordinal: usize) -> Option<NodeId> {
        self.get(parent).children.get(&ordinal).copied()
    }

    /// Insert-if-absent: an existing binding wins and `kind` is dropped.
    pub fn insert_child(&mut self, parent: NodeId, ordinal: usize, kind: NodeKind) -> NodeId {
        if let Some(existing) = self.cached_child(parent, ordinal) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            ordinal,
            children: HashMap::new(),
        });
        self.nodes[parent.0].children.insert(ordinal, id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
