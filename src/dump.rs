use std::io::{self, Write};
use std::sync::Arc;

use usbwatch::capture::Capture;
use usbwatch::tables::TableProjection;
use usbwatch::tree::{EventTree, NodeId};

use crate::config::View;

pub fn write_view<W: Write>(out: &mut W, capture: Arc<Capture>, view: View) -> io::Result<()> {
    match view.table() {
        Some(kind) => write_table(out, kind.projection(&capture).as_ref()),
        None => write_tree(out, &mut EventTree::new(capture)),
    }
}

/// Header line of column labels, then one tab-separated line per row.
pub fn write_table<W: Write>(out: &mut W, table: &dyn TableProjection) -> io::Result<()> {
    writeln!(out, "{}", table.column_labels().join("\t"))?;
    for row in 0..table.row_count() {
        let cells = table.row(row).map_err(io::Error::other)?;
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

/// Every node depth-first, one per line, indented by a tab per level.
pub fn write_tree<W: Write>(out: &mut W, tree: &mut EventTree) -> io::Result<()> {
    let mut stack: Vec<(NodeId, usize)> = Vec::new();
    let root = tree.root();
    push_children(tree, root, 0, &mut stack)?;
    while let Some((node, depth)) = stack.pop() {
        writeln!(out, "{}{}", "\t".repeat(depth), tree.describe(node))?;
        push_children(tree, node, depth + 1, &mut stack)?;
    }
    Ok(())
}

fn push_children(
    tree: &mut EventTree,
    node: NodeId,
    depth: usize,
    stack: &mut Vec<(NodeId, usize)>,
) -> io::Result<()> {
    for ordinal in (0..tree.child_count(node)).rev() {
        let child = tree.child_at(node, ordinal).map_err(io::Error::other)?;
        stack.push((child, depth));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbwatch::capture::{CaptureBuilder, EventKind, Pid};

    fn capture() -> Arc<Capture> {
        let mut b = CaptureBuilder::new();
        let first = b.token(100, Pid::IN, 5, 1);
        b.data(110, Pid::DATA0, b"ok");
        b.handshake(120, Pid::ACK);
        let t = b.transaction(first, 3, true);
        let ep = b.endpoint(5, 1);
        let x = b.transfer(ep, &[t], true);
        b.event(EventKind::Transfer, x);
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn table_dump_is_tab_separated() {
        let mut out = Vec::new();
        write_view(&mut out, capture(), View::Packets).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Packet Index\tTimestamp\tAddr\tEP\tPID\tLength\tData");
        assert_eq!(lines[2], "1\t0.000000010\t\t\tDATA0\t5\t6F 6B");
    }

    #[test]
    fn tree_dump_is_depth_first() {
        let mut out = Vec::new();
        write_view(&mut out, capture(), View::Tree).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Bulk transfer from 5.1 to host with 1 transactions",
                "\tIN transaction, 3 packets",
                "\t\tIN packet, 3 bytes",
                "\t\tDATA0 packet, 5 bytes",
                "\t\tACK packet, 1 bytes",
            ]
        );
    }
}
