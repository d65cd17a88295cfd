pub mod help;
pub mod table;
pub mod tree;

use crate::app::{App, Tab};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(8),    // body
            Constraint::Length(2), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    match app.current_tab.table() {
        Some(kind) => table::render(f, app, kind, chunks[1]),
        None => tree::render(f, app, chunks[1]),
    }
    render_footer(f, app.current_tab, chunks[2]);

    if app.show_help {
        help::render(f, app, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let now = chrono::Local::now().format("%H:%M:%S").to_string();

    let mut spans = vec![
        Span::styled(" USBWatch ", Style::default().fg(Color::Cyan).bold()),
        Span::raw("│ "),
    ];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, Style::default().fg(Color::Yellow).bold()));
        } else {
            spans.push(Span::raw(label));
        }
        spans.push(Span::raw("  "));
    }
    spans.push(Span::raw(format!(
        "│ {}  ({} events, {} pkts, {} endpoints)  ",
        app.capture_name,
        app.capture.events().len(),
        app.capture.packets().len(),
        app.capture.endpoints().len()
    )));
    spans.push(Span::styled(now, Style::default().fg(Color::DarkGray)));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(header, area);
}

fn render_footer(f: &mut Frame, tab: Tab, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).bold());

    let mut spans = vec![
        key(" q"),
        Span::raw(":Quit  "),
        key("↑↓"),
        Span::raw(":Move  "),
        key("PgUp/PgDn"),
        Span::raw(":Page  "),
    ];
    match tab {
        Tab::Tree => {
            spans.push(key("→/Enter"));
            spans.push(Span::raw(":Expand  "));
            spans.push(key("←"));
            spans.push(Span::raw(":Collapse  "));
        }
        Tab::Events => {
            spans.push(key("Enter"));
            spans.push(Span::raw(":Show in tree  "));
        }
        _ => {}
    }
    spans.push(key("1-5"));
    spans.push(Span::raw(":Tab  "));
    spans.push(key("?"));
    spans.push(Span::raw(":Help"));

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

/// Hex and ASCII panes side by side.
pub(crate) fn render_hex_ascii(f: &mut Frame, payload: &[u8], area: Rect) {
    use ratatui::widgets::Wrap;
    use usbwatch::format;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let hex = Paragraph::new(format::hex_dump(payload))
        .style(Style::default().fg(Color::Green))
        .block(
            Block::default()
                .title(format!(" Hex Dump ({} bytes) ", payload.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(hex, chunks[0]);

    let ascii = Paragraph::new(format::ascii_dump(payload))
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .title(" ASCII ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(ascii, chunks[1]);
}
