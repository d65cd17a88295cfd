use super::{check_row, column, token_cell, TableProjection};
use crate::capture::Capture;
use crate::error::ViewResult;
use crate::format;

const LABELS: &[&str] = &[
    "Transaction Index",
    "Timestamp",
    "Duration",
    "Type",
    "Addr",
    "EP",
    "Packet Idx",
    "Packets",
    "Result",
    "Data Bytes",
    "Data",
];

/// Result shown for transactions the decoder could not complete.
pub const INCOMPLETE_RESULT: &str = "ERR";

#[derive(Clone, Copy)]
enum Column {
    Index,
    Timestamp,
    Duration,
    Type,
    Addr,
    Ep,
    PacketIdx,
    Packets,
    Result,
    DataBytes,
    Data,
}

const COLUMNS: [Column; 11] = [
    Column::Index,
    Column::Timestamp,
    Column::Duration,
    Column::Type,
    Column::Addr,
    Column::Ep,
    Column::PacketIdx,
    Column::Packets,
    Column::Result,
    Column::DataBytes,
    Column::Data,
];

pub struct TransactionTable<'a> {
    capture: &'a Capture,
}

impl<'a> TransactionTable<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }
}

impl TableProjection for TransactionTable<'_> {
    fn title(&self) -> &'static str {
        "Transactions"
    }

    fn column_labels(&self) -> &'static [&'static str] {
        LABELS
    }

    fn row_count(&self) -> usize {
        self.capture.transactions().len()
    }

    fn cell(&self, row: usize, col: usize) -> ViewResult<String> {
        check_row(row, self.row_count())?;
        let column = column(&COLUMNS, col)?;
        let transaction = &self.capture.transactions()[row];
        let packets = self.capture.transaction_packets(transaction);
        let (Some(first), Some(last)) = (packets.first(), packets.last()) else {
            return Ok(String::new());
        };
        // The payload, if any, rides in the packet after the token.
        let data_packet = packets.get(1).filter(|p| p.pid.is_data());

        Ok(match column {
            Column::Index => row.to_string(),
            Column::Timestamp => {
                format::relative_timestamp(first.timestamp_ns, self.capture.origin_ns())
            }
            Column::Duration => last.timestamp_ns.saturating_sub(first.timestamp_ns).to_string(),
            Column::Type => first.pid.name().to_string(),
            Column::Addr => token_cell(first.token(), |(address, _)| address),
            Column::Ep => token_cell(first.token(), |(_, endpoint)| endpoint),
            Column::PacketIdx => transaction.first_packet_index.to_string(),
            Column::Packets => transaction.num_packets.to_string(),
            Column::Result if !transaction.complete => INCOMPLETE_RESULT.to_string(),
            Column::Result => last.pid.name().to_string(),
            Column::DataBytes => data_packet
                .map(|p| p.payload_len().to_string())
                .unwrap_or_default(),
            Column::Data => data_packet
                .map(|p| format::hex_bytes(self.capture.payload(p)))
                .unwrap_or_default(),
        })
    }
}
