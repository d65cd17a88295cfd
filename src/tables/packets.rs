use super::{check_row, column, token_cell, TableProjection};
use crate::capture::Capture;
use crate::error::ViewResult;
use crate::format;

const LABELS: &[&str] = &["Packet Index", "Timestamp", "Addr", "EP", "PID", "Length", "Data"];

#[derive(Clone, Copy)]
enum Column {
    Index,
    Timestamp,
    Addr,
    Ep,
    Pid,
    Length,
    Data,
}

const COLUMNS: [Column; 7] = [
    Column::Index,
    Column::Timestamp,
    Column::Addr,
    Column::Ep,
    Column::Pid,
    Column::Length,
    Column::Data,
];

pub struct PacketTable<'a> {
    capture: &'a Capture,
}

impl<'a> PacketTable<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }
}

impl TableProjection for PacketTable<'_> {
    fn title(&self) -> &'static str {
        "Packets"
    }

    fn column_labels(&self) -> &'static [&'static str] {
        LABELS
    }

    fn row_count(&self) -> usize {
        self.capture.packets().len()
    }

    fn cell(&self, row: usize, col: usize) -> ViewResult<String> {
        check_row(row, self.row_count())?;
        let column = column(&COLUMNS, col)?;
        let packet = &self.capture.packets()[row];
        Ok(match column {
            Column::Index => row.to_string(),
            Column::Timestamp => {
                format::relative_timestamp(packet.timestamp_ns, self.capture.origin_ns())
            }
            Column::Addr => token_cell(packet.token(), |(address, _)| address),
            Column::Ep => token_cell(packet.token(), |(_, endpoint)| endpoint),
            Column::Pid => packet.pid.name().to_string(),
            Column::Length => packet.length.to_string(),
            Column::Data if packet.pid.is_data() => format::hex_bytes(self.capture.payload(packet)),
            Column::Data => String::new(),
        })
    }
}
