//! Decoded capture data.
//!
//! A [`Capture`] is a structure of flat arrays produced by the decoding
//! backend: packets, transactions, per-endpoint transfers, endpoints, a
//! global transfer index, the merged event timeline and the payload bytes.
//! It is assembled once (through [`CaptureBuilder`] or a snapshot file),
//! checked, and never mutated afterwards.

mod builder;
mod load;
mod pid;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

pub use builder::CaptureBuilder;
pub use load::{from_reader, load};
pub use pid::{Pid, PidType};

/// Bytes of a data packet that are not stored in the payload region: the
/// PID byte and the CRC16.
pub const DATA_OVERHEAD: usize = 3;

/// Decoded sub-fields that follow the PID byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PacketFields {
    #[default]
    None,
    Sof { frame_number: u16, crc: u8 },
    Token { address: u8, endpoint: u8, crc: u8 },
    Data { crc: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub timestamp_ns: u64,
    pub data_offset: usize,
    /// On-wire length, PID byte and CRC included.
    pub length: u16,
    pub pid: Pid,
    #[serde(default)]
    pub fields: PacketFields,
}

impl Packet {
    /// Device address and endpoint number, for SETUP/IN/OUT tokens only.
    pub fn token(&self) -> Option<(u8, u8)> {
        if !self.pid.carries_address() {
            return None;
        }
        match self.fields {
            PacketFields::Token { address, endpoint, .. } => Some((address, endpoint)),
            _ => None,
        }
    }

    pub fn payload_len(&self) -> usize {
        if self.pid.is_data() {
            (self.length as usize).saturating_sub(DATA_OVERHEAD)
        } else {
            0
        }
    }

    fn payload_range(&self) -> Range<usize> {
        self.data_offset..self.data_offset.saturating_add(self.payload_len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub first_packet_index: usize,
    pub num_packets: usize,
    pub complete: bool,
}

impl Transaction {
    pub fn packet_range(&self) -> Range<usize> {
        self.first_packet_index..self.first_packet_index.saturating_add(self.num_packets)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id_offset: usize,
    pub num_transactions: usize,
    pub complete: bool,
}

impl Transfer {
    fn id_range(&self) -> Range<usize> {
        self.id_offset..self.id_offset.saturating_add(self.num_transactions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: u8,
    pub endpoint: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTraffic {
    pub transfers: Vec<Transfer>,
    pub transaction_ids: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIndexEntry {
    pub endpoint_id: usize,
    pub transfer_id: usize,
}

/// Which array an [`Event`] points into. Serialized as the backend's
/// numeric tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventKind {
    Packet,
    Transaction,
    Transfer,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Packet => "PKT",
            EventKind::Transaction => "TRN",
            EventKind::Transfer => "XFR",
        }
    }
}

impl TryFrom<u8> for EventKind {
    type Error = CaptureError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(EventKind::Packet),
            1 => Ok(EventKind::Transaction),
            2 => Ok(EventKind::Transfer),
            other => Err(CaptureError::InvalidTag(other)),
        }
    }
}

impl From<EventKind> for u8 {
    fn from(kind: EventKind) -> u8 {
        match kind {
            EventKind::Packet => 0,
            EventKind::Transaction => 1,
            EventKind::Transfer => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub index: usize,
}

/// A transfer resolved through the global transfer index.
#[derive(Debug, Clone, Copy)]
pub struct TransferRef<'a> {
    pub endpoint_id: usize,
    pub endpoint: &'a Endpoint,
    pub transfer: &'a Transfer,
    /// Global transaction indices belonging to this transfer, in order.
    pub transaction_ids: &'a [usize],
}

/// Raw arrays as they come from the backend, before any checking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CaptureParts {
    pub endpoints: Vec<Endpoint>,
    pub endpoint_traffic: Vec<EndpointTraffic>,
    pub transfer_index: Vec<TransferIndexEntry>,
    pub transactions: Vec<Transaction>,
    pub packets: Vec<Packet>,
    pub events: Vec<Event>,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// An immutable, checked capture.
#[derive(Debug, Serialize)]
pub struct Capture {
    endpoints: Vec<Endpoint>,
    endpoint_traffic: Vec<EndpointTraffic>,
    transfer_index: Vec<TransferIndexEntry>,
    transactions: Vec<Transaction>,
    packets: Vec<Packet>,
    events: Vec<Event>,
    data: Vec<u8>,
}

impl Capture {
    pub(crate) fn from_parts(parts: CaptureParts) -> Result<Self, CaptureError> {
        check(&parts)?;
        let CaptureParts {
            endpoints,
            endpoint_traffic,
            transfer_index,
            transactions,
            packets,
            events,
            data,
        } = parts;
        Ok(Self {
            endpoints,
            endpoint_traffic,
            transfer_index,
            transactions,
            packets,
            events,
            data,
        })
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn num_transfers(&self) -> usize {
        self.transfer_index.len()
    }

    /// Timestamp every relative time in the views is measured from.
    pub fn origin_ns(&self) -> u64 {
        self.packets.first().map_or(0, |p| p.timestamp_ns)
    }

    pub fn transfer(&self, index: usize) -> Option<TransferRef<'_>> {
        let entry = self.transfer_index.get(index)?;
        let endpoint = self.endpoints.get(entry.endpoint_id)?;
        let traffic = self.endpoint_traffic.get(entry.endpoint_id)?;
        let transfer = traffic.transfers.get(entry.transfer_id)?;
        let transaction_ids = traffic.transaction_ids.get(transfer.id_range())?;
        Some(TransferRef {
            endpoint_id: entry.endpoint_id,
            endpoint,
            transfer,
            transaction_ids,
        })
    }

    pub fn transaction_packets(&self, transaction: &Transaction) -> &[Packet] {
        self.packets
            .get(transaction.packet_range())
            .unwrap_or_default()
    }

    /// First packet of a transfer's first transaction.
    pub fn transfer_first_packet(&self, transfer: &TransferRef<'_>) -> Option<&Packet> {
        let id = *transfer.transaction_ids.first()?;
        let transaction = self.transactions.get(id)?;
        self.packets.get(transaction.first_packet_index)
    }

    /// Last packet of a transfer's last transaction.
    pub fn transfer_last_packet(&self, transfer: &TransferRef<'_>) -> Option<&Packet> {
        let id = *transfer.transaction_ids.last()?;
        let transaction = self.transactions.get(id)?;
        self.transaction_packets(transaction).last()
    }

    /// The packet an event resolves to: itself, or the first packet of the
    /// transaction/transfer it names.
    pub fn event_packet(&self, event: &Event) -> Option<&Packet> {
        match event.kind {
            EventKind::Packet => self.packets.get(event.index),
            EventKind::Transaction => {
                let transaction = self.transactions.get(event.index)?;
                self.packets.get(transaction.first_packet_index)
            }
            EventKind::Transfer => self.transfer_first_packet(&self.transfer(event.index)?),
        }
    }

    pub fn payload(&self, packet: &Packet) -> &[u8] {
        self.data.get(packet.payload_range()).unwrap_or_default()
    }
}

fn check(parts: &CaptureParts) -> Result<(), CaptureError> {
    if parts.endpoint_traffic.len() != parts.endpoints.len() {
        return Err(CaptureError::inconsistent(format!(
            "{} endpoints but traffic for {}",
            parts.endpoints.len(),
            parts.endpoint_traffic.len()
        )));
    }

    for (i, pair) in parts.packets.windows(2).enumerate() {
        if pair[1].timestamp_ns < pair[0].timestamp_ns {
            return Err(CaptureError::inconsistent(format!(
                "packet {} timestamp goes backwards",
                i + 1
            )));
        }
    }
    for (i, packet) in parts.packets.iter().enumerate() {
        let end = packet.data_offset.checked_add(packet.payload_len());
        if end.map_or(true, |end| end > parts.data.len()) {
            return Err(CaptureError::inconsistent(format!(
                "packet {i} payload outside data region"
            )));
        }
    }

    for (i, transaction) in parts.transactions.iter().enumerate() {
        if transaction.num_packets == 0 {
            return Err(CaptureError::inconsistent(format!("transaction {i} has no packets")));
        }
        let end = transaction
            .first_packet_index
            .checked_add(transaction.num_packets);
        if end.map_or(true, |end| end > parts.packets.len()) {
            return Err(CaptureError::inconsistent(format!(
                "transaction {i} refers past the last packet"
            )));
        }
    }

    for (ep, traffic) in parts.endpoint_traffic.iter().enumerate() {
        if let Some(&id) = traffic
            .transaction_ids
            .iter()
            .find(|&&id| id >= parts.transactions.len())
        {
            return Err(CaptureError::inconsistent(format!(
                "endpoint {ep} lists unknown transaction {id}"
            )));
        }
        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(traffic.transfers.len());
        for (t, transfer) in traffic.transfers.iter().enumerate() {
            if transfer.num_transactions == 0 {
                return Err(CaptureError::inconsistent(format!(
                    "endpoint {ep} transfer {t} has no transactions"
                )));
            }
            let end = transfer.id_offset.checked_add(transfer.num_transactions);
            match end {
                Some(end) if end <= traffic.transaction_ids.len() => {
                    ranges.push(transfer.id_offset..end)
                }
                _ => {
                    return Err(CaptureError::inconsistent(format!(
                        "endpoint {ep} transfer {t} refers past its transaction ids"
                    )))
                }
            }
        }
        ranges.sort_by_key(|r| r.start);
        if ranges.windows(2).any(|pair| pair[0].end > pair[1].start) {
            return Err(CaptureError::inconsistent(format!(
                "endpoint {ep} has overlapping transfers"
            )));
        }
    }

    for (i, entry) in parts.transfer_index.iter().enumerate() {
        let known = parts
            .endpoint_traffic
            .get(entry.endpoint_id)
            .is_some_and(|traffic| entry.transfer_id < traffic.transfers.len());
        if !known {
            return Err(CaptureError::inconsistent(format!(
                "transfer index entry {i} points nowhere"
            )));
        }
    }

    for (i, event) in parts.events.iter().enumerate() {
        let len = match event.kind {
            EventKind::Packet => parts.packets.len(),
            EventKind::Transaction => parts.transactions.len(),
            EventKind::Transfer => parts.transfer_index.len(),
        };
        if event.index >= len {
            return Err(CaptureError::inconsistent(format!(
                "event {i} ({}) index {} out of range",
                event.kind.label(),
                event.index
            )));
        }
    }

    Ok(())
}
