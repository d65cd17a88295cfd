use tracing::debug;

use super::{
    Capture, CaptureParts, Endpoint, Event, EventKind, Packet, PacketFields, Pid, Transaction,
    Transfer, TransferIndexEntry, DATA_OVERHEAD,
};
use crate::error::CaptureError;

/// Append-only assembly of a capture.
///
/// Records are pushed in capture order and referenced by the indices the
/// push methods return. Nothing is checked until [`build`](Self::build),
/// which freezes the arrays into a [`Capture`] or reports the first
/// broken invariant. CRC fields are left zero.
#[derive(Debug, Default)]
pub struct CaptureBuilder {
    parts: CaptureParts,
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_packet(
        &mut self,
        timestamp_ns: u64,
        pid: Pid,
        length: u16,
        fields: PacketFields,
    ) -> usize {
        let index = self.parts.packets.len();
        self.parts.packets.push(Packet {
            timestamp_ns,
            data_offset: self.parts.data.len(),
            length,
            pid,
            fields,
        });
        index
    }

    /// SETUP, IN, OUT or PING token addressed to `address`.`endpoint`.
    pub fn token(&mut self, timestamp_ns: u64, pid: Pid, address: u8, endpoint: u8) -> usize {
        let fields = PacketFields::Token { address, endpoint, crc: 0 };
        self.push_packet(timestamp_ns, pid, 3, fields)
    }

    pub fn sof(&mut self, timestamp_ns: u64, frame_number: u16) -> usize {
        let fields = PacketFields::Sof { frame_number, crc: 0 };
        self.push_packet(timestamp_ns, Pid::SOF, 3, fields)
    }

    /// DATAx packet; `payload` goes to the shared data region.
    pub fn data(&mut self, timestamp_ns: u64, pid: Pid, payload: &[u8]) -> usize {
        let length = u16::try_from(payload.len() + DATA_OVERHEAD).unwrap_or(u16::MAX);
        let index = self.push_packet(timestamp_ns, pid, length, PacketFields::Data { crc: 0 });
        self.parts.data.extend_from_slice(payload);
        index
    }

    pub fn handshake(&mut self, timestamp_ns: u64, pid: Pid) -> usize {
        self.push_packet(timestamp_ns, pid, 1, PacketFields::None)
    }

    pub fn transaction(
        &mut self,
        first_packet_index: usize,
        num_packets: usize,
        complete: bool,
    ) -> usize {
        let index = self.parts.transactions.len();
        self.parts.transactions.push(Transaction {
            first_packet_index,
            num_packets,
            complete,
        });
        index
    }

    pub fn endpoint(&mut self, address: u8, endpoint: u8) -> usize {
        let index = self.parts.endpoints.len();
        self.parts.endpoints.push(Endpoint { address, endpoint });
        self.parts.endpoint_traffic.push(Default::default());
        index
    }

    /// Closes a transfer on `endpoint_id` made of the given transactions and
    /// returns its global transfer index.
    pub fn transfer(
        &mut self,
        endpoint_id: usize,
        transaction_ids: &[usize],
        complete: bool,
    ) -> usize {
        if self.parts.endpoint_traffic.len() <= endpoint_id {
            self.parts
                .endpoint_traffic
                .resize_with(endpoint_id + 1, Default::default);
        }
        let traffic = &mut self.parts.endpoint_traffic[endpoint_id];
        let transfer_id = traffic.transfers.len();
        traffic.transfers.push(Transfer {
            id_offset: traffic.transaction_ids.len(),
            num_transactions: transaction_ids.len(),
            complete,
        });
        traffic.transaction_ids.extend_from_slice(transaction_ids);

        let index = self.parts.transfer_index.len();
        self.parts.transfer_index.push(TransferIndexEntry {
            endpoint_id,
            transfer_id,
        });
        index
    }

    pub fn event(&mut self, kind: EventKind, index: usize) -> usize {
        let position = self.parts.events.len();
        self.parts.events.push(Event { kind, index });
        position
    }

    pub fn build(self) -> Result<Capture, CaptureError> {
        debug!(
            packets = self.parts.packets.len(),
            transactions = self.parts.transactions.len(),
            transfers = self.parts.transfer_index.len(),
            events = self.parts.events.len(),
            "freezing capture"
        );
        Capture::from_parts(self.parts)
    }
}
