use crate::config::{Config, View};
use crate::event::{AppEvent, EventHandler};
use crate::outline::Outline;
use crate::ui;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use std::sync::Arc;
use tracing::debug;
use usbwatch::capture::Capture;
use usbwatch::tables::TableKind;
use usbwatch::tree::EventTree;

/// Rows moved by PageUp/PageDown.
const PAGE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tree,
    Packets,
    Transactions,
    Transfers,
    Events,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Tree,
        Tab::Packets,
        Tab::Transactions,
        Tab::Transfers,
        Tab::Events,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Tree => "Tree",
            Tab::Packets => "Packets",
            Tab::Transactions => "Transactions",
            Tab::Transfers => "Transfers",
            Tab::Events => "Events",
        }
    }

    pub fn table(self) -> Option<TableKind> {
        match self {
            Tab::Tree => None,
            Tab::Packets => Some(TableKind::Packets),
            Tab::Transactions => Some(TableKind::Transactions),
            Tab::Transfers => Some(TableKind::Transfers),
            Tab::Events => Some(TableKind::Events),
        }
    }
}

impl From<View> for Tab {
    fn from(view: View) -> Self {
        match view {
            View::Tree => Tab::Tree,
            View::Packets => Tab::Packets,
            View::Transactions => Tab::Transactions,
            View::Transfers => Tab::Transfers,
            View::Events => Tab::Events,
        }
    }
}

pub struct App {
    pub capture: Arc<Capture>,
    pub capture_name: String,
    pub tree: EventTree,
    pub outline: Outline,
    pub current_tab: Tab,
    /// Selected row per table, indexed like `TableKind::ALL`.
    pub table_selected: [usize; 4],
    pub show_help: bool,
    pub help_scroll: usize,
}

impl App {
    pub fn new(capture: Arc<Capture>, capture_name: String, tab: Tab) -> Self {
        let mut tree = EventTree::new(Arc::clone(&capture));
        let outline = Outline::new(&mut tree);
        Self {
            capture,
            capture_name,
            tree,
            outline,
            current_tab: tab,
            table_selected: [0; 4],
            show_help: false,
            help_scroll: 0,
        }
    }

    fn table_slot(kind: TableKind) -> usize {
        match kind {
            TableKind::Packets => 0,
            TableKind::Transactions => 1,
            TableKind::Transfers => 2,
            TableKind::Events => 3,
        }
    }

    pub fn selected_row(&self, kind: TableKind) -> usize {
        self.table_selected[Self::table_slot(kind)]
    }

    fn row_count(&self, kind: TableKind) -> usize {
        kind.projection(&self.capture).row_count()
    }

    fn move_row(&mut self, kind: TableKind, down: bool, steps: usize) {
        let max = self.row_count(kind).saturating_sub(1);
        let slot = &mut self.table_selected[Self::table_slot(kind)];
        *slot = if down {
            (*slot + steps).min(max)
        } else {
            slot.saturating_sub(steps)
        };
    }

    fn jump_row(&mut self, kind: TableKind, last: bool) {
        let row = if last {
            self.row_count(kind).saturating_sub(1)
        } else {
            0
        };
        self.table_selected[Self::table_slot(kind)] = row;
    }

    /// Shows the selected event row as a node in the tree tab.
    fn open_event_in_tree(&mut self) {
        let row = self.selected_row(TableKind::Events);
        match self.tree.node_at_path(&[row]) {
            Ok(node) => {
                self.outline.select(node);
                self.current_tab = Tab::Tree;
            }
            Err(e) => debug!(row, error = %e, "no tree node for event row"),
        }
    }

    fn scroll(&mut self, down: bool, steps: usize) {
        match self.current_tab.table() {
            Some(kind) => self.move_row(kind, down, steps),
            None if down => self.outline.select_next(&mut self.tree, steps),
            None => self.outline.select_previous(&mut self.tree, steps),
        }
    }

    /// Applies a key press. Returns `false` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.show_help {
            match key.code {
                KeyCode::Char('?') | KeyCode::Esc => {
                    self.show_help = false;
                    self.help_scroll = 0;
                }
                KeyCode::Up => self.help_scroll = self.help_scroll.saturating_sub(1),
                KeyCode::Down => self.help_scroll += 1,
                KeyCode::Char('q') => return false,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return false
                }
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.current_tab = Tab::ALL[index];
            }
            KeyCode::Tab => {
                let index = Tab::ALL.iter().position(|&t| t == self.current_tab).unwrap_or(0);
                self.current_tab = Tab::ALL[(index + 1) % Tab::ALL.len()];
            }
            KeyCode::Up => self.scroll(false, 1),
            KeyCode::Down => self.scroll(true, 1),
            KeyCode::PageUp => self.scroll(false, PAGE),
            KeyCode::PageDown => self.scroll(true, PAGE),
            KeyCode::Home => match self.current_tab.table() {
                Some(kind) => self.jump_row(kind, false),
                None => self.outline.select_first(&mut self.tree),
            },
            KeyCode::End => match self.current_tab.table() {
                Some(kind) => self.jump_row(kind, true),
                None => self.outline.select_last(&mut self.tree),
            },
            KeyCode::Enter | KeyCode::Right if self.current_tab == Tab::Tree => {
                self.outline.expand_selected(&mut self.tree)
            }
            KeyCode::Left if self.current_tab == Tab::Tree => {
                self.outline.collapse_selected(&self.tree)
            }
            KeyCode::Enter if self.current_tab == Tab::Events => self.open_event_in_tree(),
            _ => {}
        }
        true
    }
}

pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    capture: Arc<Capture>,
    config: &Config,
) -> Result<()> {
    let name = config
        .capture
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.capture.display().to_string());
    let mut app = App::new(capture, name, config.view.into());
    let mut events = EventHandler::new(config.tick_ms);

    loop {
        terminal.draw(|f| ui::render(f, &mut app))?;

        match events.next().await? {
            AppEvent::Key(key) => {
                if !app.handle_key(key) {
                    debug!(materialized = app.tree.materialized(), "quitting");
                    return Ok(());
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbwatch::capture::{CaptureBuilder, EventKind, Pid};
    use usbwatch::tree::NodeKind;

    fn app() -> App {
        let mut b = CaptureBuilder::new();
        for i in 0..30u64 {
            let t = b.token(i * 100, Pid::IN, 2, 1);
            b.handshake(i * 100 + 10, Pid::NAK);
            let id = b.transaction(t, 2, true);
            b.event(EventKind::Transaction, id);
        }
        App::new(Arc::new(b.build().unwrap()), "test.json".into(), Tab::Tree)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(press(&mut app, KeyCode::Char('c')));
    }

    #[test]
    fn number_keys_switch_tabs() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_tab, Tab::Transactions);
        press(&mut app, KeyCode::Char('5'));
        assert_eq!(app.current_tab, Tab::Events);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_tab, Tab::Tree);
    }

    #[test]
    fn table_selection_is_clamped_per_table() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected_row(TableKind::Packets), 40);
        press(&mut app, KeyCode::End);
        assert_eq!(app.selected_row(TableKind::Packets), 59);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_row(TableKind::Packets), 59);

        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.selected_row(TableKind::Transactions), 0);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_row(TableKind::Transactions), 0);
        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected_row(TableKind::Transactions), 29);
    }

    #[test]
    fn tree_keys_expand_and_collapse() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        let node = app.outline.selected().unwrap();
        assert_eq!(app.tree.kind(node), NodeKind::Transaction(1));
        press(&mut app, KeyCode::Right);
        assert!(app.outline.is_expanded(node));
        press(&mut app, KeyCode::Enter);
        let child = app.outline.selected().unwrap();
        assert_eq!(app.tree.kind(child), NodeKind::Packet(2));
        press(&mut app, KeyCode::Left);
        assert_eq!(app.outline.selected(), Some(node));
        press(&mut app, KeyCode::Left);
        assert!(!app.outline.is_expanded(node));
    }

    #[test]
    fn enter_on_event_row_opens_tree_node() {
        let mut app = app();
        press(&mut app, KeyCode::Char('5'));
        for _ in 0..7 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.current_tab, Tab::Tree);
        let node = app.outline.selected().unwrap();
        assert_eq!(app.tree.path_of(node), vec![7]);
    }

    #[test]
    fn help_swallows_navigation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Tree);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        assert_eq!(app.help_scroll, 0);
    }
}
