//! Stream header, packet kinds and checksum helpers for RDFZ streams.

/// Leading magic of every stream.
pub const MAGIC: &[u8; 4] = b"RDFZ";
/// Current format version.
pub const VERSION: u16 = 1;
/// Header flag: a CRC-32 of the body follows the EOF packet.
pub const FLAG_CRC: u16 = 0x0001;
/// Header flag: the body is a zstd frame.
pub const FLAG_ZSTD: u16 = 0x0002;
/// Packet ids at or above this value encode an IRI under prefix `id - PREFIX_BASE`.
pub const PREFIX_BASE: u64 = 6;

/// Kinds of packets in an RDFZ body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Eof,
    BNode,
    Literal,
    LangLiteral,
    TypedLiteral,
    NewPrefix,
    /// IRI whose namespace is the prefix with this number.
    Iri(u64),
}

impl PacketKind {
    /// Decode a packet id.
    pub fn from_u64(v: u64) -> Self {
        use PacketKind::*;
        match v {
            0 => Eof,
            1 => BNode,
            2 => Literal,
            3 => LangLiteral,
            4 => TypedLiteral,
            5 => NewPrefix,
            n => Iri(n - PREFIX_BASE),
        }
    }

    /// Encode as a packet id.
    pub fn to_u64(self) -> u64 {
        use PacketKind::*;
        match self {
            Eof => 0,
            BNode => 1,
            Literal => 2,
            LangLiteral => 3,
            TypedLiteral => 4,
            NewPrefix => 5,
            Iri(n) => n + PREFIX_BASE,
        }
    }
}

/// Parsed fixed-size stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version_u16: u16,
    pub flags_u16: u16,
}

impl Header {
    pub const LEN: usize = 8;

    pub fn new(flags_u16: u16) -> Self {
        Header {
            magic: *MAGIC,
            version_u16: VERSION,
            flags_u16,
        }
    }

    /// Parse a header from the first 8 bytes of `buf`.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[0..4]);
        Some(Header {
            magic,
            version_u16: u16::from_le_bytes([buf[4], buf[5]]),
            flags_u16: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0..4].copy_from_slice(&self.magic);
        out[4..6].copy_from_slice(&self.version_u16.to_le_bytes());
        out[6..8].copy_from_slice(&self.flags_u16.to_le_bytes());
        out
    }

    pub fn has_crc(&self) -> bool {
        self.flags_u16 & FLAG_CRC != 0
    }

    pub fn is_zstd(&self) -> bool {
        self.flags_u16 & FLAG_ZSTD != 0
    }
}

/// Incremental IEEE CRC-32.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Crc32 { state: 0xFFFF_FFFF }
    }
}

impl Crc32 {
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &b in data {
            let mut x = (crc ^ (b as u32)) & 0xFF;
            for _ in 0..8 {
                let lsb = x & 1;
                x >>= 1;
                if lsb != 0 {
                    x ^= 0xEDB88320;
                }
            }
            crc = (crc >> 8) ^ x;
        }
        self.state = crc;
    }

    pub fn finish(&self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}

/// Compute IEEE CRC-32 of a whole buffer.
pub fn crc32_ieee(data: &[u8]) -> u32 {
    let mut c = Crc32::default();
    c.update(data);
    c.finish()
}
