use super::{check_row, column, TableProjection};
use crate::capture::{Capture, EventKind};
use crate::error::ViewResult;
use crate::format;

const LABELS: &[&str] = &["Event Index", "Timestamp", "Type", "Type Index", "Subtype"];

#[derive(Clone, Copy)]
enum Column {
    Index,
    Timestamp,
    Type,
    TypeIndex,
    Subtype,
}

const COLUMNS: [Column; 5] = [
    Column::Index,
    Column::Timestamp,
    Column::Type,
    Column::TypeIndex,
    Column::Subtype,
];

pub struct EventTable<'a> {
    capture: &'a Capture,
}

impl<'a> EventTable<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }
}

impl TableProjection for EventTable<'_> {
    fn title(&self) -> &'static str {
        "Events"
    }

    fn column_labels(&self) -> &'static [&'static str] {
        LABELS
    }

    fn row_count(&self) -> usize {
        self.capture.events().len()
    }

    fn cell(&self, row: usize, col: usize) -> ViewResult<String> {
        check_row(row, self.row_count())?;
        let column = column(&COLUMNS, col)?;
        let event = &self.capture.events()[row];
        let packet = self.capture.event_packet(event);

        Ok(match column {
            Column::Index => row.to_string(),
            Column::Type => event.kind.label().to_string(),
            Column::TypeIndex => event.index.to_string(),
            Column::Timestamp => packet
                .map(|p| format::relative_timestamp(p.timestamp_ns, self.capture.origin_ns()))
                .unwrap_or_default(),
            Column::Subtype => match (event.kind, packet) {
                (EventKind::Packet | EventKind::Transaction, Some(p)) => p.pid.name().to_string(),
                (EventKind::Transfer, Some(p)) => format::transfer_type_label(p.pid).to_string(),
                (_, None) => String::new(),
            },
        })
    }
}
