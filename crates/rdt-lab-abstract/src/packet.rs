use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::PacketError;

/// TCP Header flags
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

/// Size of an encoded [`TcpHeader`] on the wire.
pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TcpHeader {
    /// Sequence Number
    pub seq_num: u32,
    /// Acknowledgment Number
    pub ack_num: u32,
    /// Flag bits, see [`flags`]
    pub flags: u8,
    /// Window Size (carried only, never enforced by the reference protocols)
    pub window_size: u16,
    /// Checksum, meaningful only once computed over the final header and payload
    pub checksum: u16,
    /// Urgent Pointer
    pub urgent_ptr: u16,
}

impl TcpHeader {
    pub fn new(seq: u32, ack: u32, flags: u8, wnd: u16) -> Self {
        Self {
            seq_num: seq,
            ack_num: ack,
            flags,
            window_size: wnd,
            ..Default::default()
        }
    }

    pub fn is_syn(&self) -> bool {
        self.flags & flags::SYN != 0
    }
    pub fn is_ack(&self) -> bool {
        self.flags & flags::ACK != 0
    }
    pub fn is_fin(&self) -> bool {
        self.flags & flags::FIN != 0
    }
    pub fn is_rst(&self) -> bool {
        self.flags & flags::RST != 0
    }

    /// Append the big-endian wire form of this header to `buf`.
    ///
    /// Layout: `seq:u32 | ack:u32 | flags:u8 | reserved:u8 | window:u16 | checksum:u16 | urgent:u16`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.seq_num);
        buf.put_u32(self.ack_num);
        buf.put_u8(self.flags);
        buf.put_u8(0);
        buf.put_u16(self.window_size);
        buf.put_u16(self.checksum);
        buf.put_u16(self.urgent_ptr);
    }

    /// Read a header from the front of `buf`, advancing it past the header.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, PacketError> {
        if buf.remaining() < HEADER_LEN {
            return Err(PacketError::Truncated {
                needed: HEADER_LEN,
                got: buf.remaining(),
            });
        }
        let seq_num = buf.get_u32();
        let ack_num = buf.get_u32();
        let flags = buf.get_u8();
        let reserved = buf.get_u8();
        if reserved != 0 {
            return Err(PacketError::Reserved(reserved));
        }
        Ok(Self {
            seq_num,
            ack_num,
            flags,
            window_size: buf.get_u16(),
            checksum: buf.get_u16(),
            urgent_ptr: buf.get_u16(),
        })
    }
}

/// A header plus an owned, immutable payload.
///
/// No validation happens here: a packet may carry a stale or wrong checksum,
/// and it is up to the protocol to detect that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Packet {
    pub header: TcpHeader,
    pub payload: Bytes,
}

impl Packet {
    /// Build a packet, copying `payload` so the caller's buffer stays independent.
    pub fn new(header: TcpHeader, payload: &[u8]) -> Self {
        Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    pub fn new_simple(seq: u32, ack: u32, flags: u8, payload: &[u8]) -> Self {
        Self::new(TcpHeader::new(seq, ack, flags, 0), payload)
    }

    /// Create a pure ACK packet
    pub fn new_ack(seq: u32, ack: u32, window: u16) -> Self {
        Self {
            header: TcpHeader::new(seq, ack, flags::ACK, window),
            payload: Bytes::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        self.header.encode(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PacketError> {
        let mut buf = data;
        let header = TcpHeader::decode(&mut buf)?;
        Ok(Self::new(header, buf))
    }
}

/// Sequence space of the alternating-bit protocols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeqBit {
    #[default]
    Zero,
    One,
}

impl SeqBit {
    pub fn flip(self) -> Self {
        match self {
            SeqBit::Zero => SeqBit::One,
            SeqBit::One => SeqBit::Zero,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            SeqBit::Zero => 0,
            SeqBit::One => 1,
        }
    }

    /// True if a raw header field carries this bit.
    pub fn matches(self, raw: u32) -> bool {
        raw == self.as_u32()
    }
}

/// Rejects any raw value other than 0 or 1; the RDT3 receiver relies on this
/// to tell a foreign sequence number apart from a duplicate.
impl TryFrom<u32> for SeqBit {
    type Error = PacketError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SeqBit::Zero),
            1 => Ok(SeqBit::One),
            other => Err(PacketError::InvalidSequence(other)),
        }
    }
}

impl From<SeqBit> for u32 {
    fn from(bit: SeqBit) -> Self {
        bit.as_u32()
    }
}
