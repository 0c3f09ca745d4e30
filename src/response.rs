//! Typed interpretation of raw replies
//!
//! Replies carry no type tag. The command that was sent decides, through its
//! [`ResponseShape`], how the bytes are read.

use core::str::Utf8Error;

use crate::command::ResponseShape;
use crate::types::SourceSet;

/// Byte ending a text reply on the wire
pub const TEXT_TERMINATOR: u8 = b'\n';

/// Marker written after the data of a text reply in the caller's buffer
pub const TEXT_END_MARKER: u8 = 0;

/// A decoded fixed-width reply
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodedValue {
    /// One byte read bit by bit
    Flags(SourceSet),
    /// One byte inside its command's domain
    Byte(u8),
    /// Unsigned 16-bit count or duration
    Word(u16),
}

/// Reasons a fixed-width reply cannot be decoded
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Byte outside the domain of the reply
    OutOfDomain(u8),
    /// Shape is not fixed-width, or the byte count does not match it
    Shape,
}

impl DecodedValue {
    /// Decode `raw` according to `shape`
    pub fn decode(shape: ResponseShape, raw: &[u8]) -> Result<Self, DecodeError> {
        if shape.width() != Some(raw.len()) {
            return Err(DecodeError::Shape);
        }
        match shape {
            ResponseShape::Flags => Ok(DecodedValue::Flags(SourceSet::from_bits(raw[0]))),
            ResponseShape::Byte(domain) => {
                if domain.contains(raw[0]) {
                    Ok(DecodedValue::Byte(raw[0]))
                } else {
                    Err(DecodeError::OutOfDomain(raw[0]))
                }
            }
            ResponseShape::Word => Ok(DecodedValue::Word(decode_word([raw[0], raw[1]]))),
            ResponseShape::None | ResponseShape::Text => Err(DecodeError::Shape),
        }
    }

    /// Bitmask value, if this is one
    pub const fn as_flags(self) -> Option<SourceSet> {
        match self {
            DecodedValue::Flags(flags) => Some(flags),
            _ => None,
        }
    }

    /// Single byte value, if this is one
    pub const fn as_byte(self) -> Option<u8> {
        match self {
            DecodedValue::Byte(byte) => Some(byte),
            _ => None,
        }
    }

    /// 16-bit value, if this is one
    pub const fn as_word(self) -> Option<u16> {
        match self {
            DecodedValue::Word(word) => Some(word),
            _ => None,
        }
    }
}

/// Combine a two-byte reply, high byte first
pub const fn decode_word(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// A text reply held in the caller's buffer
///
/// The buffer also holds a [`TEXT_END_MARKER`] right after the data.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Text<'b> {
    bytes: &'b [u8],
    truncated: bool,
}

impl<'b> Text<'b> {
    pub(crate) const fn new(bytes: &'b [u8], truncated: bool) -> Self {
        Self { bytes, truncated }
    }

    /// Data bytes, without terminator or end marker
    pub const fn as_bytes(&self) -> &'b [u8] {
        self.bytes
    }

    /// Data bytes as UTF-8; short names are plain ASCII in practice
    pub fn as_str(&self) -> Result<&'b str, Utf8Error> {
        core::str::from_utf8(self.bytes)
    }

    /// The terminator never arrived: the buffer filled up or the module
    /// went quiet first. The data is a prefix of the real reply.
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Number of data bytes
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// The module sent only a terminator
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
