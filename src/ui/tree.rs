use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use usbwatch::format;
use usbwatch::tree::{NodeId, NodeKind};

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(12)])
        .split(area);

    render_outline(f, app, chunks[0]);
    render_detail(f, app, chunks[1]);
}

fn render_outline(f: &mut Frame, app: &mut App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let rows = app.outline.rows(&mut app.tree, visible_height);
    let selected = app.outline.selected();

    let lines: Vec<Line> = rows
        .iter()
        .map(|&node| {
            let depth = app.tree.path_of(node).len().saturating_sub(1);
            let marker = if !app.tree.has_children(node) {
                "  "
            } else if app.outline.is_expanded(node) {
                "▾ "
            } else {
                "▸ "
            };
            let style = if Some(node) == selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw("  ".repeat(depth)),
                Span::styled(marker, Style::default().fg(Color::DarkGray)),
                Span::styled(app.tree.describe(node), kind_style(app.tree.kind(node))),
            ])
            .style(style)
        })
        .collect();

    let title = format!(" Events ({}) ", app.capture.events().len());
    let outline = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(outline, area);
}

fn kind_style(kind: NodeKind) -> Style {
    match kind {
        NodeKind::Root => Style::default(),
        NodeKind::Transfer(_) => Style::default().fg(Color::Cyan),
        NodeKind::Transaction(_) => Style::default().fg(Color::Green),
        NodeKind::Packet(_) => Style::default().fg(Color::White),
    }
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let block = |title: String| {
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
    };

    let Some(node) = app.outline.selected() else {
        let hint = Paragraph::new(" This capture has no events")
            .style(Style::default().fg(Color::DarkGray))
            .block(block(" Detail ".into()));
        f.render_widget(hint, area);
        return;
    };

    match app.tree.kind(node) {
        NodeKind::Packet(index) => {
            let Some(packet) = app.capture.packets().get(index) else {
                return;
            };
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(area);
            let fields = Paragraph::new(super::table::packet_lines(app, index, packet))
                .block(block(format!(" Packet {index} ")));
            f.render_widget(fields, chunks[0]);
            super::render_hex_ascii(f, app.capture.payload(packet), chunks[1]);
        }
        kind => {
            let detail = Paragraph::new(summary_lines(app, node, kind))
                .block(block(" Detail ".into()));
            f.render_widget(detail, area);
        }
    }
}

fn summary_lines(app: &App, node: NodeId, kind: NodeKind) -> Vec<Line<'static>> {
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {name:<13}"), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };
    let path = app
        .tree
        .path_of(node)
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(".");
    let cap = &app.capture;
    let origin = cap.origin_ns();

    let mut lines = vec![field("Path", path), field("Summary", app.tree.describe(node))];
    match kind {
        NodeKind::Transfer(id) => {
            let Some(transfer) = cap.transfer(id) else {
                return lines;
            };
            lines.push(field("Transfer", id.to_string()));
            lines.push(field(
                "Device",
                format!("{}.{}", transfer.endpoint.address, transfer.endpoint.endpoint),
            ));
            if let Some(first) = cap.transfer_first_packet(&transfer) {
                lines.push(field("Start", format::relative_timestamp(first.timestamp_ns, origin)));
            }
            lines.push(field(
                "Transactions",
                format::join_indices(transfer.transaction_ids, format::MAX_LISTED_INDICES),
            ));
        }
        NodeKind::Transaction(id) => {
            let Some(transaction) = cap.transactions().get(id) else {
                return lines;
            };
            let range = transaction.packet_range();
            lines.push(field("Transaction", id.to_string()));
            lines.push(field("Packets", format!("{}..{}", range.start, range.end)));
            if let Some(first) = cap.transaction_packets(transaction).first() {
                lines.push(field("Start", format::relative_timestamp(first.timestamp_ns, origin)));
            }
            lines.push(field("Complete", transaction.complete.to_string()));
        }
        NodeKind::Root | NodeKind::Packet(_) => {}
    }
    lines
}
