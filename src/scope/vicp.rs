//! VICP framing for LeCroy ethernet remote control
//!
//! Every VICP packet is an 8-byte header followed by the payload:
//! operation flags, protocol version, sequence number, one spare byte, and a
//! big-endian u32 payload length. A logical response may span several
//! packets; the EOI flag marks the last one.

use super::ScopeError;

/// Default VICP TCP port
pub const DEFAULT_PORT: u16 = 1861;

/// Header size in bytes
pub const HEADER_SIZE: usize = 8;

/// Supported VICP protocol version
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Operation flag bits
pub mod op {
    /// Payload carries device data
    pub const DATA: u8 = 0x80;
    /// Switch the instrument to remote mode
    pub const REMOTE: u8 = 0x40;
    /// Lock out the front panel
    pub const LOCKOUT: u8 = 0x20;
    /// Device clear
    pub const CLEAR: u8 = 0x10;
    /// Service request pending
    pub const SRQ: u8 = 0x08;
    /// Last packet of a logical message
    pub const EOI: u8 = 0x01;
}

/// A decoded VICP packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub operation: u8,
    pub version: u8,
    pub sequence: u8,
    pub length: u32,
}

impl Header {
    /// Header for an outgoing command packet
    pub fn command(sequence: u8, length: u32) -> Self {
        Self {
            operation: op::DATA | op::EOI | op::REMOTE,
            version: PROTOCOL_VERSION,
            sequence,
            length,
        }
    }

    /// True if this packet terminates the logical message
    pub fn is_eoi(&self) -> bool {
        self.operation & op::EOI != 0
    }

    /// True if the packet carries data
    pub fn is_data(&self) -> bool {
        self.operation & op::DATA != 0
    }

    /// True if the instrument is signalling a service request
    pub fn is_srq(&self) -> bool {
        self.operation & op::SRQ != 0
    }

    /// Serialize to the 8-byte wire form
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.operation;
        buf[1] = self.version;
        buf[2] = self.sequence;
        // buf[3] is spare, always zero
        buf[4..8].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Parse a header from its 8-byte wire form
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, ScopeError> {
        let version = buf[1];
        if version != PROTOCOL_VERSION {
            return Err(ScopeError::Protocol(format!(
                "unsupported VICP version {version}"
            )));
        }
        Ok(Self {
            operation: buf[0],
            version,
            sequence: buf[2],
            length: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_header_flags() {
        let header = Header::command(3, 10);
        assert!(header.is_data());
        assert!(header.is_eoi());
        assert!(!header.is_srq());
        assert_eq!(header.sequence, 3);
        assert_eq!(header.length, 10);
    }

    #[test]
    fn header_roundtrip() {
        let header = Header::command(42, 0x0102_0304);
        let bytes = header.to_bytes();
        assert_eq!(bytes[0], op::DATA | op::EOI | op::REMOTE);
        assert_eq!(bytes[1], PROTOCOL_VERSION);
        assert_eq!(bytes[2], 42);
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..8], &[0x01, 0x02, 0x03, 0x04]);

        let parsed = Header::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut bytes = Header::command(0, 0).to_bytes();
        bytes[1] = 0x7f;
        let err = Header::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn eoi_detection_on_partial_message() {
        let partial = Header {
            operation: op::DATA,
            version: PROTOCOL_VERSION,
            sequence: 1,
            length: 512,
        };
        assert!(!partial.is_eoi());
    }
}
