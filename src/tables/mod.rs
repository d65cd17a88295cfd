//! Flat per-record views of a capture.
//!
//! Every projection borrows the capture and derives each cell on demand
//! from index arithmetic; nothing is cached. Blank cells are empty strings.

mod events;
mod packets;
mod transactions;
mod transfers;

use crate::capture::Capture;
use crate::error::{ViewError, ViewResult};

pub use events::EventTable;
pub use packets::PacketTable;
pub use transactions::TransactionTable;
pub use transfers::TransferTable;

pub trait TableProjection {
    fn title(&self) -> &'static str;

    fn column_labels(&self) -> &'static [&'static str];

    fn column_count(&self) -> usize {
        self.column_labels().len()
    }

    fn row_count(&self) -> usize;

    fn cell(&self, row: usize, col: usize) -> ViewResult<String>;

    fn cell_by_label(&self, row: usize, label: &str) -> ViewResult<String> {
        let col = self
            .column_labels()
            .iter()
            .position(|l| *l == label)
            .ok_or_else(|| ViewError::UnknownColumn(label.to_string()))?;
        self.cell(row, col)
    }

    fn row(&self, row: usize) -> ViewResult<Vec<String>> {
        (0..self.column_count()).map(|col| self.cell(row, col)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Packets,
    Transactions,
    Transfers,
    Events,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Packets,
        TableKind::Transactions,
        TableKind::Transfers,
        TableKind::Events,
    ];

    pub fn projection<'a>(self, capture: &'a Capture) -> Box<dyn TableProjection + 'a> {
        match self {
            TableKind::Packets => Box::new(PacketTable::new(capture)),
            TableKind::Transactions => Box::new(TransactionTable::new(capture)),
            TableKind::Transfers => Box::new(TransferTable::new(capture)),
            TableKind::Events => Box::new(EventTable::new(capture)),
        }
    }
}

fn check_row(row: usize, count: usize) -> ViewResult<()> {
    if row < count {
        Ok(())
    } else {
        Err(ViewError::OutOfRange { index: row, count })
    }
}

fn column<C: Copy>(all: &[C], col: usize) -> ViewResult<C> {
    all.get(col).copied().ok_or(ViewError::OutOfRange {
        index: col,
        count: all.len(),
    })
}

fn token_cell(token: Option<(u8, u8)>, pick: fn((u8, u8)) -> u8) -> String {
    token.map(|t| pick(t).to_string()).unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_counts_match_arrays() {
        let cap = fixtures::capture(true);
        assert_eq!(TableKind::Packets.projection(&cap).row_count(), cap.packets().len());
        assert_eq!(
            TableKind::Transactions.projection(&cap).row_count(),
            cap.transactions().len()
        );
        assert_eq!(TableKind::Transfers.projection(&cap).row_count(), cap.num_transfers());
        assert_eq!(TableKind::Events.projection(&cap).row_count(), cap.events().len());
    }

    #[test]
    fn timestamps_never_decrease() {
        let cap = fixtures::capture(true);
        for kind in TableKind::ALL {
            let table = kind.projection(&cap);
            let stamps: Vec<f64> = (0..table.row_count())
                .map(|row| table.cell_by_label(row, "Timestamp").unwrap().parse().unwrap())
                .collect();
            assert!(
                stamps.windows(2).all(|w| w[0] <= w[1]),
                "{} timestamps out of order: {stamps:?}",
                table.title()
            );
        }
    }

    #[test]
    fn out_of_range_cells() {
        let cap = fixtures::capture(true);
        for kind in TableKind::ALL {
            let table = kind.projection(&cap);
            let rows = table.row_count();
            let cols = table.column_count();
            assert_eq!(
                table.cell(rows, 0),
                Err(ViewError::OutOfRange { index: rows, count: rows })
            );
            assert_eq!(
                table.cell(0, cols),
                Err(ViewError::OutOfRange { index: cols, count: cols })
            );
            assert_eq!(
                table.cell_by_label(0, "Bogus"),
                Err(ViewError::UnknownColumn("Bogus".into()))
            );
        }
    }

    #[test]
    fn rows_have_one_cell_per_column() {
        let cap = fixtures::capture(true);
        for kind in TableKind::ALL {
            let table = kind.projection(&cap);
            assert_eq!(table.row(0).unwrap().len(), table.column_count());
        }
    }
}
