use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use usbwatch::capture::{Packet, PacketFields};
use usbwatch::format;
use usbwatch::tables::{TableKind, TableProjection};

/// Widest a non-final column is allowed to grow.
const MAX_COLUMN_WIDTH: usize = 32;

pub fn render(f: &mut Frame, app: &App, kind: TableKind, area: Rect) {
    if kind == TableKind::Packets {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(10)])
            .split(area);
        render_rows(f, app, kind, chunks[0]);
        render_packet_detail(f, app, chunks[1]);
    } else {
        render_rows(f, app, kind, area);
    }
}

fn render_rows(f: &mut Frame, app: &App, kind: TableKind, area: Rect) {
    let projection = kind.projection(&app.capture);
    let table: &dyn TableProjection = projection.as_ref();

    let visible_height = area.height.saturating_sub(3) as usize; // borders + header
    let total = table.row_count();
    let selected = app.selected_row(kind).min(total.saturating_sub(1));
    let offset = (selected + 1).saturating_sub(visible_height);

    // Only the rows on screen are derived.
    let cells: Vec<Vec<String>> = (offset..total.min(offset + visible_height))
        .filter_map(|row| table.row(row).ok())
        .collect();

    let labels = table.column_labels();
    let widths: Vec<Constraint> = labels
        .iter()
        .enumerate()
        .map(|(col, label)| {
            if col + 1 == labels.len() {
                return Constraint::Min(10);
            }
            let widest = cells
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(label.len()))
                .max()
                .unwrap_or(0);
            Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16)
        })
        .collect();

    let header = Row::new(
        labels
            .iter()
            .map(|label| Cell::from(*label).style(Style::default().fg(Color::Cyan).bold())),
    )
    .height(1);

    let rows: Vec<Row> = cells
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if offset + i == selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let mut cells: Vec<Cell> = row.into_iter().map(Cell::from).collect();
            if let Some(first) = cells.first_mut() {
                *first = first.clone().style(Style::default().fg(Color::DarkGray));
            }
            Row::new(cells).style(style)
        })
        .collect();

    let widget = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" {} ({total}) ", table.title()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(widget, area);
}

fn render_packet_detail(f: &mut Frame, app: &App, area: Rect) {
    let row = app.selected_row(TableKind::Packets);
    let Some(packet) = app.capture.packets().get(row) else {
        let hint = Paragraph::new(" No packets in this capture")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .title(" Packet Detail ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(hint, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let fields = Paragraph::new(packet_lines(app, row, packet)).block(
        Block::default()
            .title(format!(" Packet {row} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(fields, chunks[0]);

    super::render_hex_ascii(f, app.capture.payload(packet), chunks[1]);
}

/// Decoded fields of a packet, one per line.
pub(crate) fn packet_lines(app: &App, index: usize, packet: &Packet) -> Vec<Line<'static>> {
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {name:<10}"), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        field("Index", index.to_string()),
        field(
            "Time",
            format::relative_timestamp(packet.timestamp_ns, app.capture.origin_ns()),
        ),
        field("PID", format!("{} (0x{:02X})", packet.pid.name(), packet.pid.0)),
        field("Length", packet.length.to_string()),
    ];
    match packet.fields {
        PacketFields::Sof { frame_number, crc } => {
            lines.push(field("Frame", frame_number.to_string()));
            lines.push(field("CRC5", format!("0x{crc:02X}")));
        }
        PacketFields::Token { address, endpoint, crc } => {
            lines.push(field("Device", format!("{address}.{endpoint}")));
            lines.push(field("CRC5", format!("0x{crc:02X}")));
        }
        PacketFields::Data { crc } => lines.push(field("CRC16", format!("0x{crc:04X}"))),
        PacketFields::None => {}
    }
    lines
}
