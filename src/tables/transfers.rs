use super::{check_row, column, TableProjection};
use crate::capture::Capture;
use crate::error::ViewResult;
use crate::format;

const LABELS: &[&str] = &[
    "Transfer Index",
    "Timestamp",
    "Duration",
    "Type",
    "Addr",
    "EP",
    "Transactions",
    "Transaction Indices",
];

#[derive(Clone, Copy)]
enum Column {
    Index,
    Timestamp,
    Duration,
    Type,
    Addr,
    Ep,
    Transactions,
    TransactionIndices,
}

const COLUMNS: [Column; 8] = [
    Column::Index,
    Column::Timestamp,
    Column::Duration,
    Column::Type,
    Column::Addr,
    Column::Ep,
    Column::Transactions,
    Column::TransactionIndices,
];

pub struct TransferTable<'a> {
    capture: &'a Capture,
}

impl<'a> TransferTable<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }
}

impl TableProjection for TransferTable<'_> {
    fn title(&self) -> &'static str {
        "Transfers"
    }

    fn column_labels(&self) -> &'static [&'static str] {
        LABELS
    }

    fn row_count(&self) -> usize {
        self.capture.num_transfers()
    }

    fn cell(&self, row: usize, col: usize) -> ViewResult<String> {
        check_row(row, self.row_count())?;
        let column = column(&COLUMNS, col)?;
        let Some(transfer) = self.capture.transfer(row) else {
            return Ok(String::new());
        };
        let first = self.capture.transfer_first_packet(&transfer);
        let last = self.capture.transfer_last_packet(&transfer);

        Ok(match column {
            Column::Index => row.to_string(),
            Column::Timestamp => first
                .map(|p| format::relative_timestamp(p.timestamp_ns, self.capture.origin_ns()))
                .unwrap_or_default(),
            Column::Duration => match (first, last) {
                (Some(first), Some(last)) => {
                    last.timestamp_ns.saturating_sub(first.timestamp_ns).to_string()
                }
                _ => String::new(),
            },
            Column::Type => first
                .map(|p| format::transfer_type_label(p.pid).to_string())
                .unwrap_or_default(),
            Column::Addr => transfer.endpoint.address.to_string(),
            Column::Ep => transfer.endpoint.endpoint.to_string(),
            Column::Transactions => transfer.transfer.num_transactions.to_string(),
            Column::TransactionIndices => {
                format::join_indices(transfer.transaction_ids, format::MAX_LISTED_INDICES)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureBuilder, Pid};
    use crate::tables::fixtures;

    #[test]
    fn classifies_by_opening_pid() {
        let cap = fixtures::capture(true);
        let table = TransferTable::new(&cap);
        assert_eq!(table.cell_by_label(0, "Type").unwrap(), "CONTROL");
        assert_eq!(table.cell_by_label(1, "Type").unwrap(), "BULK OUT");
        assert_eq!(table.cell_by_label(1, "Addr").unwrap(), "7");
        assert_eq!(table.cell_by_label(1, "EP").unwrap(), "2");
        assert_eq!(table.cell_by_label(0, "Duration").unwrap(), "1000");
    }

    #[test]
    fn transaction_indices_capped_at_one_hundred() {
        let mut b = CaptureBuilder::new();
        let mut ids = Vec::new();
        for i in 0..150u64 {
            let p = b.token(i * 100, Pid::IN, 2, 1);
            b.handshake(i * 100 + 50, Pid::NAK);
            ids.push(b.transaction(p, 2, true));
        }
        let ep = b.endpoint(2, 1);
        b.transfer(ep, &ids, true);
        let cap = b.build().unwrap();

        let table = TransferTable::new(&cap);
        let cell = table.cell_by_label(0, "Transaction Indices").unwrap();
        let listed: Vec<&str> = cell.split(", ").collect();
        assert_eq!(listed.len(), 100);
        assert_eq!(listed[0], "0");
        assert_eq!(listed[99], "99");
        assert_eq!(table.cell_by_label(0, "Transactions").unwrap(), "150");
        assert_eq!(table.cell_by_label(0, "Type").unwrap(), "BULK IN");
        assert_eq!(table.cell_by_label(0, "Duration").unwrap(), "14950");
    }
}
