//! Display derivations shared by the event tree and the tables.
//!
//! Everything here is a pure function of capture values.

use crate::capture::Pid;

/// PID names indexed by the low nibble of the PID byte.
pub const PID_NAMES: [&str; 16] = [
    "RSVD", "OUT", "ACK", "DATA0", "PING", "SOF", "NYET", "DATA2", "SPLIT", "IN", "NAK", "DATA1",
    "ERR", "SETUP", "STALL", "MDATA",
];

/// Most transaction indices listed in a single transfer cell.
pub const MAX_LISTED_INDICES: usize = 100;

pub fn pid_name(pid: u8) -> &'static str {
    PID_NAMES[(pid & 0x0F) as usize]
}

/// Seconds since `origin_ns`, nanosecond precision.
pub fn relative_timestamp(timestamp_ns: u64, origin_ns: u64) -> String {
    let offset_ns = timestamp_ns.saturating_sub(origin_ns);
    format!("{:.9}", offset_ns as f64 / 1e9)
}

/// "0A FF 12"
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Offset-prefixed hex dump, 16 bytes per line.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| format!("{:04x}  {}", i * 16, hex_bytes(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Printable ASCII for the same 16-byte lines as [`hex_dump`].
pub fn ascii_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!("{:04x}  {}", i * 16, ascii)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-joined list of at most `limit` indices.
pub fn join_indices(indices: &[usize], limit: usize) -> String {
    indices
        .iter()
        .take(limit)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coarse transfer classification by the PID that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Control,
    BulkIn,
    BulkOut,
}

impl TransferType {
    pub fn classify(first: Pid) -> Option<Self> {
        match first {
            Pid::SETUP => Some(TransferType::Control),
            Pid::IN => Some(TransferType::BulkIn),
            Pid::OUT => Some(TransferType::BulkOut),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransferType::Control => "CONTROL",
            TransferType::BulkIn => "BULK IN",
            TransferType::BulkOut => "BULK OUT",
        }
    }
}

/// Transfer type label, or empty when the opening PID is not recognised.
pub fn transfer_type_label(first: Pid) -> &'static str {
    TransferType::classify(first).map_or("", TransferType::label)
}

pub fn describe_transfer(first: Pid, address: u8, endpoint: u8, num_transactions: usize) -> String {
    match TransferType::classify(first) {
        Some(TransferType::Control) => {
            format!("Control transfer on {address}.{endpoint} with {num_transactions} transactions")
        }
        Some(TransferType::BulkIn) => format!(
            "Bulk transfer from {address}.{endpoint} to host with {num_transactions} transactions"
        ),
        Some(TransferType::BulkOut) => format!(
            "Bulk transfer from host to {address}.{endpoint} with {num_transactions} transactions"
        ),
        None => format!("Unexpected transfer start PID {}", first.name()),
    }
}

pub fn describe_transaction(first: Pid, num_packets: usize) -> String {
    if first == Pid::SOF {
        format!("Idle period with {num_packets} SOF packets")
    } else {
        format!("{} transaction, {num_packets} packets", first.name())
    }
}

pub fn describe_packet(pid: Pid, length: u16) -> String {
    format!("{} packet, {length} bytes", pid.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_name_masks_high_nibble() {
        assert_eq!(pid_name(0x2D), "SETUP");
        assert_eq!(pid_name(0x0D), "SETUP");
        assert_eq!(pid_name(0xFF), "MDATA");
        for byte in 0..=u8::MAX {
            assert!(PID_NAMES.contains(&pid_name(byte)));
        }
    }

    #[test]
    fn relative_timestamp_has_nine_digits() {
        assert_eq!(relative_timestamp(1_500_000_000, 500_000_000), "1.000000000");
        assert_eq!(relative_timestamp(1_000_000_123, 1_000_000_000), "0.000000123");
        assert_eq!(relative_timestamp(0, 0), "0.000000000");
    }

    #[test]
    fn relative_timestamp_before_origin_clamps() {
        assert_eq!(relative_timestamp(5, 10), "0.000000000");
    }

    #[test]
    fn hex_is_uppercase_and_spaced() {
        assert_eq!(hex_bytes(&[0x0a, 0xff, 0x12]), "0A FF 12");
        assert_eq!(hex_bytes(&[]), "");
    }

    #[test]
    fn hex_dump_wraps_at_sixteen() {
        let bytes: Vec<u8> = (0..20).collect();
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("0010  10 11 12 13"));
    }

    #[test]
    fn ascii_dump_replaces_unprintable() {
        assert_eq!(ascii_dump(b"Hi\x00!"), "0000  Hi.!");
    }

    #[test]
    fn join_indices_truncates() {
        let ids: Vec<usize> = (0..150).collect();
        let joined = join_indices(&ids, MAX_LISTED_INDICES);
        assert_eq!(joined.split(", ").count(), 100);
        assert!(joined.ends_with("98, 99"));
        assert_eq!(join_indices(&[7, 9], MAX_LISTED_INDICES), "7, 9");
    }

    #[test]
    fn transfer_types() {
        assert_eq!(transfer_type_label(Pid::SETUP), "CONTROL");
        assert_eq!(transfer_type_label(Pid::IN), "BULK IN");
        assert_eq!(transfer_type_label(Pid::OUT), "BULK OUT");
        assert_eq!(transfer_type_label(Pid::PING), "");
    }

    #[test]
    fn summaries() {
        assert_eq!(
            describe_transfer(Pid::SETUP, 3, 0, 2),
            "Control transfer on 3.0 with 2 transactions"
        );
        assert_eq!(
            describe_transfer(Pid::OUT, 3, 2, 1),
            "Bulk transfer from host to 3.2 with 1 transactions"
        );
        assert_eq!(
            describe_transfer(Pid::ACK, 3, 2, 1),
            "Unexpected transfer start PID ACK"
        );
        assert_eq!(describe_transaction(Pid::SOF, 12), "Idle period with 12 SOF packets");
        assert_eq!(describe_transaction(Pid::IN, 3), "IN transaction, 3 packets");
        assert_eq!(describe_packet(Pid::DATA0, 11), "DATA0 packet, 11 bytes");
    }
}
