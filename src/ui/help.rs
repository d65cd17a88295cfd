use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered(area, 70, 75);

    f.render_widget(Clear, popup);

    let block = Block::default()
        .title(" USBWatch Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let lines = build_help_lines();

    let visible_height = inner.height.saturating_sub(1) as usize;
    let max_scroll = lines.len().saturating_sub(visible_height);
    let offset = app.help_scroll.min(max_scroll);

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(offset)
        .take(visible_height)
        .collect();

    let content = Paragraph::new(visible);
    let content_area = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
    f.render_widget(content, content_area);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("↑↓", Style::default().fg(Color::Yellow).bold()),
        Span::raw(":Scroll  "),
        Span::styled("?", Style::default().fg(Color::Yellow).bold()),
        Span::raw("/"),
        Span::styled("Esc", Style::default().fg(Color::Yellow).bold()),
        Span::raw(":Close"),
    ]))
    .alignment(Alignment::Center);
    let footer_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
    f.render_widget(footer, footer_area);
}

/// `percent_x` by `percent_y` of `area`, centred, at least 60x20 where it fits.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (area.width * percent_x / 100).max(60).min(area.width);
    let height = (area.height * percent_y / 100).max(20).min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Cyan).bold(),
    ))
}

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{key:<14}"),
            Style::default().fg(Color::Yellow).bold(),
        ),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}

fn build_help_lines() -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(section_header("GLOBAL KEYS"));
    lines.push(key_line("q / Ctrl+C", "Quit"));
    lines.push(key_line("1-5", "Switch tab (Tree/Packets/Transactions/Transfers/Events)"));
    lines.push(key_line("Tab", "Next tab"));
    lines.push(key_line("↑↓", "Move selection"));
    lines.push(key_line("PgUp/PgDn", "Move selection by a page"));
    lines.push(key_line("Home/End", "First/last row"));
    lines.push(key_line("?", "Toggle this help overlay"));
    lines.push(Line::raw(""));

    lines.push(section_header("TREE (Tab 1)"));
    lines.push(key_line("→ / Enter", "Expand node, or step into an expanded one"));
    lines.push(key_line("←", "Collapse node, or go to its parent"));
    lines.push(key_line("▸ / ▾", "Collapsed / expanded node"));
    lines.push(Line::raw(""));

    lines.push(section_header("PACKETS (Tab 2)"));
    lines.push(key_line("↑↓", "Select packet; fields and payload shown below"));
    lines.push(Line::raw(""));

    lines.push(section_header("EVENTS (Tab 5)"));
    lines.push(key_line("Enter", "Show the selected event in the tree"));
    lines.push(Line::raw(""));

    lines.push(section_header("COLUMNS"));
    lines.push(key_line("Timestamp", "Seconds since the first packet of the capture"));
    lines.push(key_line("Addr / EP", "Device address and endpoint from the token packet"));
    lines.push(key_line("Result", "Handshake PID, or ERR for an incomplete transaction"));
    lines.push(key_line("Type", "CONTROL, BULK IN or BULK OUT from the opening PID"));

    lines
}
