use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format;

const PID_TYPE_MASK: u8 = 0b0011;

/// Low two bits of a PID byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidType {
    Special,
    Token,
    Handshake,
    Data,
}

/// A raw USB packet identifier byte, as decoded off the bus.
///
/// The byte is kept verbatim (including the check nibble) so that values a
/// broken device put on the wire can still be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u8);

impl Pid {
    pub const RSVD: Pid = Pid(0xF0);
    pub const OUT: Pid = Pid(0xE1);
    pub const ACK: Pid = Pid(0xD2);
    pub const DATA0: Pid = Pid(0xC3);
    pub const PING: Pid = Pid(0xB4);
    pub const SOF: Pid = Pid(0xA5);
    pub const NYET: Pid = Pid(0x96);
    pub const DATA2: Pid = Pid(0x87);
    pub const SPLIT: Pid = Pid(0x78);
    pub const IN: Pid = Pid(0x69);
    pub const NAK: Pid = Pid(0x5A);
    pub const DATA1: Pid = Pid(0x4B);
    pub const ERR: Pid = Pid(0x3C);
    pub const SETUP: Pid = Pid(0x2D);
    pub const STALL: Pid = Pid(0x1E);
    pub const MDATA: Pid = Pid(0x0F);

    pub fn name(self) -> &'static str {
        format::pid_name(self.0)
    }

    pub fn pid_type(self) -> PidType {
        match self.0 & PID_TYPE_MASK {
            0b00 => PidType::Special,
            0b01 => PidType::Token,
            0b10 => PidType::Handshake,
            _ => PidType::Data,
        }
    }

    pub fn is_data(self) -> bool {
        self.pid_type() == PidType::Data
    }

    /// SETUP, IN and OUT: the token PIDs whose packets carry a device
    /// address and endpoint number.
    pub fn carries_address(self) -> bool {
        matches!(self, Pid::SETUP | Pid::IN | Pid::OUT)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_types() {
        assert_eq!(Pid::SETUP.pid_type(), PidType::Token);
        assert_eq!(Pid::SOF.pid_type(), PidType::Token);
        assert_eq!(Pid::ACK.pid_type(), PidType::Handshake);
        assert_eq!(Pid::STALL.pid_type(), PidType::Handshake);
        assert_eq!(Pid::DATA0.pid_type(), PidType::Data);
        assert_eq!(Pid::MDATA.pid_type(), PidType::Data);
        assert_eq!(Pid::PING.pid_type(), PidType::Special);
    }

    #[test]
    fn only_setup_in_out_carry_address() {
        assert!(Pid::SETUP.carries_address());
        assert!(Pid::IN.carries_address());
        assert!(Pid::OUT.carries_address());
        assert!(!Pid::SOF.carries_address());
        assert!(!Pid::PING.carries_address());
        assert!(!Pid::DATA1.carries_address());
    }

    #[test]
    fn display_uses_name_table() {
        assert_eq!(Pid::DATA1.to_string(), "DATA1");
        assert_eq!(Pid::NYET.to_string(), "NYET");
    }
}
