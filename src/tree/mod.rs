//! Lazily materialized event tree.
//!
//! Level one is the event timeline; transfers expand to their transactions
//! and transactions to their packets. Nodes are created the first time a
//! (parent, ordinal) slot is asked for and live as long as the tree, so a
//! front end may key selection and expansion state off [`NodeId`]s.

mod arena;

use std::sync::Arc;

use tracing::trace;

use crate::capture::{Capture, EventKind};
use crate::error::{ViewError, ViewResult};
use crate::format;

use arena::NodeArena;
pub use arena::{NodeId, NodeKind};

pub struct EventTree {
    capture: Arc<Capture>,
    arena: NodeArena,
}

impl EventTree {
    pub fn new(capture: Arc<Capture>) -> Self {
        Self {
            capture,
            arena: NodeArena::new(),
        }
    }

    pub fn capture(&self) -> &Arc<Capture> {
        &self.capture
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.arena.get(node).kind
    }

    /// Position among siblings; `None` for the root.
    pub fn ordinal(&self, node: NodeId) -> Option<usize> {
        let n = self.arena.get(node);
        n.parent.map(|_| n.ordinal)
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).parent
    }

    /// Number of nodes materialized so far, root included.
    pub fn materialized(&self) -> usize {
        self.arena.len()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        let cap = &self.capture;
        match self.kind(node) {
            NodeKind::Root => cap.events().len(),
            NodeKind::Transfer(id) => cap.transfer(id).map_or(0, |t| t.transfer.num_transactions),
            NodeKind::Transaction(id) => cap.transactions().get(id).map_or(0, |t| t.num_packets),
            NodeKind::Packet(_) => 0,
        }
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        self.child_count(node) > 0
    }

    fn resolve_child(&self, parent: NodeKind, ordinal: usize) -> Option<NodeKind> {
        let cap = &self.capture;
        match parent {
            NodeKind::Root => {
                let event = cap.events().get(ordinal)?;
                Some(match event.kind {
                    EventKind::Packet => NodeKind::Packet(event.index),
                    EventKind::Transaction => NodeKind::Transaction(event.index),
                    EventKind::Transfer => NodeKind::Transfer(event.index),
                })
            }
            NodeKind::Transfer(id) => {
                let transfer = cap.transfer(id)?;
                transfer.transaction_ids.get(ordinal).copied().map(NodeKind::Transaction)
            }
            NodeKind::Transaction(id) => {
                let transaction = cap.transactions().get(id)?;
                Some(NodeKind::Packet(transaction.first_packet_index + ordinal))
            }
            NodeKind::Packet(_) => None,
        }
    }

    pub fn child_at(&mut self, node: NodeId, ordinal: usize) -> ViewResult<NodeId> {
        let count = self.child_count(node);
        if ordinal >= count {
            return Err(ViewError::OutOfRange { index: ordinal, count });
        }
        if let Some(child) = self.arena.cached_child(node, ordinal) {
            return Ok(child);
        }
        let kind = self
            .resolve_child(self.kind(node), ordinal)
            .ok_or(ViewError::OutOfRange { index: ordinal, count })?;
        let child = self.arena.insert_child(node, ordinal, kind);
        trace!(parent = node.index(), ordinal, ?kind, "materialized node");
        Ok(child)
    }

    pub fn first_child(&mut self, node: NodeId) -> ViewResult<NodeId> {
        self.child_at(node, 0)
    }

    /// Ordinals from the root down to `node`; empty for the root.
    pub fn path_of(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.arena.get(current).parent {
            path.push(self.arena.get(current).ordinal);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn node_at_path(&mut self, path: &[usize]) -> ViewResult<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, &ordinal| self.child_at(node, ordinal))
    }

    pub fn next_sibling(&mut self, node: NodeId) -> ViewResult<NodeId> {
        let n = self.arena.get(node);
        let (parent, ordinal) = match n.parent {
            Some(parent) => (parent, n.ordinal),
            None => return Err(ViewError::NoSibling { ordinal: 0 }),
        };
        if ordinal + 1 >= self.child_count(parent) {
            return Err(ViewError::NoSibling { ordinal });
        }
        self.child_at(parent, ordinal + 1)
    }

    pub fn previous_sibling(&mut self, node: NodeId) -> ViewResult<NodeId> {
        let n = self.arena.get(node);
        let (parent, ordinal) = match n.parent {
            Some(parent) if n.ordinal > 0 => (parent, n.ordinal),
            _ => return Err(ViewError::NoSibling { ordinal: n.ordinal }),
        };
        self.child_at(parent, ordinal - 1)
    }

    /// One-line summary of a node for the tree view.
    pub fn describe(&self, node: NodeId) -> String {
        let cap = &self.capture;
        match self.kind(node) {
            NodeKind::Root => format!("Capture: {} events", cap.events().len()),
            NodeKind::Transfer(id) => {
                let Some(transfer) = cap.transfer(id) else {
                    return format!("Transfer {id}");
                };
                let Some(first) = cap.transfer_first_packet(&transfer) else {
                    return format!("Transfer {id}");
                };
                let mut text = format::describe_transfer(
                    first.pid,
                    transfer.endpoint.address,
                    transfer.endpoint.endpoint,
                    transfer.transfer.num_transactions,
                );
                if !transfer.transfer.complete {
                    text.push_str(" (incomplete)");
                }
                text
            }
            NodeKind::Transaction(id) => {
                let Some(transaction) = cap.transactions().get(id) else {
                    return format!("Transaction {id}");
                };
                let Some(first) = cap.transaction_packets(transaction).first() else {
                    return format!("Transaction {id}");
                };
                let mut text = format::describe_transaction(first.pid, transaction.num_packets);
                if !transaction.complete {
                    text.push_str(" (incomplete)");
                }
                text
            }
            NodeKind::Packet(id) => match cap.packets().get(id) {
                Some(packet) => format::describe_packet(packet.pid, packet.length),
                None => format!("Packet {id}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureBuilder, Pid};

    /// One transfer of one SETUP transaction (three packets), timeline
    /// holding just that transfer.
    fn single_transfer() -> EventTree {
        let mut b = CaptureBuilder::new();
        let setup = b.token(100, Pid::SETUP, 1, 0);
        b.data(200, Pid::DATA0, &[0; 8]);
        b.handshake(300, Pid::ACK);
        let t = b.transaction(setup, 3, true);
        let ep = b.endpoint(1, 0);
        let x = b.transfer(ep, &[t], true);
        b.event(EventKind::Transfer, x);
        EventTree::new(Arc::new(b.build().unwrap()))
    }

    /// Timeline: idle SOF transaction, control transfer (2 transactions),
    /// stray packet, bulk IN transfer (3 transactions, last NAKed).
    fn mixed() -> EventTree {
        let mut b = CaptureBuilder::new();
        let mut ts = 0;
        let mut next = || {
            ts += 10;
            ts
        };

        let sof = b.sof(next(), 1);
        b.sof(next(), 2);
        let idle = b.transaction(sof, 2, true);
        b.event(EventKind::Transaction, idle);

        let ctrl = b.endpoint(3, 0);
        let s = b.token(next(), Pid::SETUP, 3, 0);
        b.data(next(), Pid::DATA0, &[0x80, 6, 0, 1, 0, 0, 18, 0]);
        b.handshake(next(), Pid::ACK);
        let t_setup = b.transaction(s, 3, true);
        let i = b.token(next(), Pid::IN, 3, 0);
        b.data(next(), Pid::DATA1, &[18, 1]);
        b.handshake(next(), Pid::ACK);
        let t_in = b.transaction(i, 3, true);
        let x_ctrl = b.transfer(ctrl, &[t_setup, t_in], true);
        b.event(EventKind::Transfer, x_ctrl);

        let stray = b.handshake(next(), Pid::STALL);
        b.event(EventKind::Packet, stray);

        let bulk = b.endpoint(3, 1);
        let mut ids = Vec::new();
        for _ in 0..2 {
            let i = b.token(next(), Pid::IN, 3, 1);
            b.data(next(), Pid::DATA0, &[1, 2, 3]);
            b.handshake(next(), Pid::ACK);
            ids.push(b.transaction(i, 3, true));
        }
        let i = b.token(next(), Pid::IN, 3, 1);
        b.handshake(next(), Pid::NAK);
        ids.push(b.transaction(i, 2, true));
        let x_bulk = b.transfer(bulk, &ids, false);
        b.event(EventKind::Transfer, x_bulk);

        EventTree::new(Arc::new(b.build().unwrap()))
    }

    /// Materializes every node depth-first and returns them.
    fn expand_all(tree: &mut EventTree) -> Vec<NodeId> {
        let mut out = vec![tree.root()];
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            for i in 0..tree.child_count(node) {
                let child = tree.child_at(node, i).unwrap();
                out.push(child);
                stack.push(child);
            }
        }
        out
    }

    #[test]
    fn single_transfer_scenario() {
        let mut tree = single_transfer();
        let root = tree.root();
        assert_eq!(tree.child_count(root), 1);

        let transfer = tree.child_at(root, 0).unwrap();
        assert_eq!(tree.kind(transfer), NodeKind::Transfer(0));
        assert_eq!(tree.child_count(transfer), 1);

        let transaction = tree.child_at(transfer, 0).unwrap();
        assert_eq!(tree.kind(transaction), NodeKind::Transaction(0));
        assert_eq!(tree.child_count(transaction), 3);

        let packets: Vec<NodeId> = (0..3).map(|i| tree.child_at(transaction, i).unwrap()).collect();
        for (i, &p) in packets.iter().enumerate() {
            assert_eq!(tree.kind(p), NodeKind::Packet(i));
            assert_eq!(tree.child_count(p), 0);
        }
        assert_eq!(tree.path_of(packets[2]), vec![0, 0, 2]);
    }

    #[test]
    fn path_round_trip_is_identity() {
        let mut tree = mixed();
        for node in expand_all(&mut tree) {
            let path = tree.path_of(node);
            assert_eq!(tree.node_at_path(&path).unwrap(), node);
        }
    }

    #[test]
    fn repeated_navigation_does_not_allocate() {
        let mut tree = mixed();
        let nodes = expand_all(&mut tree);
        let size = tree.materialized();
        assert_eq!(size, nodes.len());
        let again = expand_all(&mut tree);
        assert_eq!(nodes, again);
        assert_eq!(tree.materialized(), size);
    }

    #[test]
    fn child_at_bounds() {
        let mut tree = mixed();
        for node in expand_all(&mut tree) {
            let count = tree.child_count(node);
            assert_eq!(
                tree.child_at(node, count),
                Err(ViewError::OutOfRange { index: count, count })
            );
        }
    }

    #[test]
    fn siblings_agree_with_child_at() {
        let mut tree = mixed();
        for node in expand_all(&mut tree) {
            let Some(parent) = tree.parent_of(node) else { continue };
            let i = tree.ordinal(node).unwrap();
            let count = tree.child_count(parent);
            if i + 1 < count {
                let expected = tree.child_at(parent, i + 1).unwrap();
                assert_eq!(tree.next_sibling(node).unwrap(), expected);
            } else {
                assert_eq!(tree.next_sibling(node), Err(ViewError::NoSibling { ordinal: i }));
            }
            if i > 0 {
                let expected = tree.child_at(parent, i - 1).unwrap();
                assert_eq!(tree.previous_sibling(node).unwrap(), expected);
            } else {
                assert_eq!(tree.previous_sibling(node), Err(ViewError::NoSibling { ordinal: 0 }));
            }
        }
    }

    #[test]
    fn root_has_no_parent_or_siblings() {
        let mut tree = mixed();
        let root = tree.root();
        assert_eq!(tree.parent_of(root), None);
        assert_eq!(tree.ordinal(root), None);
        assert!(tree.path_of(root).is_empty());
        assert_eq!(tree.node_at_path(&[]).unwrap(), root);
        assert!(tree.next_sibling(root).is_err());
        assert!(tree.previous_sibling(root).is_err());
    }

    #[test]
    fn node_at_path_stops_at_first_bad_ordinal() {
        let mut tree = mixed();
        assert_eq!(
            tree.node_at_path(&[1, 5, 0]),
            Err(ViewError::OutOfRange { index: 5, count: 2 })
        );
        assert_eq!(
            tree.node_at_path(&[2, 0]),
            Err(ViewError::OutOfRange { index: 0, count: 0 })
        );
    }

    #[test]
    fn transfer_children_follow_transaction_ids() {
        let mut tree = mixed();
        let bulk = tree.node_at_path(&[3]).unwrap();
        assert_eq!(tree.kind(bulk), NodeKind::Transfer(1));
        let kinds: Vec<NodeKind> = (0..3)
            .map(|i| {
                let child = tree.child_at(bulk, i).unwrap();
                tree.kind(child)
            })
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Transaction(3), NodeKind::Transaction(4), NodeKind::Transaction(5)]
        );
        let nak = tree.node_at_path(&[3, 2, 1]).unwrap();
        assert_eq!(tree.kind(nak), NodeKind::Packet(16));
        assert_eq!(tree.capture().packets()[16].pid, Pid::NAK);
    }

    #[test]
    fn materialization_is_lazy() {
        let mut b = CaptureBuilder::new();
        for i in 0..100_000u64 {
            let p = b.handshake(i, Pid::ACK);
            b.event(EventKind::Packet, p);
        }
        let mut tree = EventTree::new(Arc::new(b.build().unwrap()));
        assert_eq!(tree.child_count(tree.root()), 100_000);
        let last = tree.child_at(tree.root(), 99_999).unwrap();
        assert_eq!(tree.materialized(), 2);
        let prev = tree.previous_sibling(last).unwrap();
        assert_eq!(tree.path_of(prev), vec![99_998]);
        assert_eq!(tree.materialized(), 3);
    }

    #[test]
    fn descriptions() {
        let mut tree = mixed();
        let root = tree.root();
        assert_eq!(tree.describe(root), "Capture: 4 events");
        let idle = tree.node_at_path(&[0]).unwrap();
        assert_eq!(tree.describe(idle), "Idle period with 2 SOF packets");
        let ctrl = tree.node_at_path(&[1]).unwrap();
        assert_eq!(tree.describe(ctrl), "Control transfer on 3.0 with 2 transactions");
        let setup = tree.node_at_path(&[1, 0]).unwrap();
        assert_eq!(tree.describe(setup), "SETUP transaction, 3 packets");
        let data = tree.node_at_path(&[1, 0, 1]).unwrap();
        assert_eq!(tree.describe(data), "DATA0 packet, 11 bytes");
        let stray = tree.node_at_path(&[2]).unwrap();
        assert_eq!(tree.describe(stray), "STALL packet, 1 bytes");
        let bulk = tree.node_at_path(&[3]).unwrap();
        assert_eq!(
            tree.describe(bulk),
            "Bulk transfer from 3.1 to host with 3 transactions (incomplete)"
        );
    }
}
