//! Zero-copy RLP decoding.
//!
//! An [`RlpItem`] is a view over exactly one encoded item inside a buffer
//! owned by the caller. Decoding a list walks the payload with a cursor and
//! hands out sub-views, nothing is copied.

use alloy_primitives::{Address, U256};

use crate::error::RlpError;

const STRING_SHORT_START: u8 = 0x80;
const STRING_LONG_START: u8 = 0xb8;
const LIST_SHORT_START: u8 = 0xc0;
const LIST_LONG_START: u8 = 0xf8;

/// Location of an item's payload relative to its first byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Header {
    payload_offset: usize,
    payload_len: usize,
    is_list: bool,
}

impl Header {
    /// Reads the header at the start of `buf` and checks the whole item fits.
    fn decode(buf: &[u8]) -> Result<Self, RlpError> {
        let byte0 = *buf.first().ok_or(RlpError::Empty)?;

        let header = match byte0 {
            0x00..=0x7f => Header {
                payload_offset: 0,
                payload_len: 1,
                is_list: false,
            },
            0x80..=0xb7 => Header {
                payload_offset: 1,
                payload_len: (byte0 - STRING_SHORT_START) as usize,
                is_list: false,
            },
            0xb8..=0xbf => {
                Self::decode_long(buf, (byte0 - STRING_LONG_START) as usize + 1, false)?
            }
            0xc0..=0xf7 => Header {
                payload_offset: 1,
                payload_len: (byte0 - LIST_SHORT_START) as usize,
                is_list: true,
            },
            0xf8..=0xff => Self::decode_long(buf, (byte0 - LIST_LONG_START) as usize + 1, true)?,
        };

        let total = header.total_len()?;
        if total > buf.len() {
            return Err(RlpError::Truncated {
                declared: total,
                available: buf.len(),
            });
        }
        Ok(header)
    }

    fn decode_long(buf: &[u8], len_of_len: usize, is_list: bool) -> Result<Self, RlpError> {
        let needed = 1 + len_of_len;
        if buf.len() < needed {
            return Err(RlpError::HeaderTruncated {
                needed,
                available: buf.len(),
            });
        }
        if len_of_len > core::mem::size_of::<usize>() {
            return Err(RlpError::LengthOverflow);
        }
        let payload_len = buf[1..needed]
            .iter()
            .fold(0usize, |len, &byte| (len << 8) | byte as usize);

        Ok(Header {
            payload_offset: needed,
            payload_len,
            is_list,
        })
    }

    fn total_len(&self) -> Result<usize, RlpError> {
        self.payload_offset
            .checked_add(self.payload_len)
            .ok_or(RlpError::LengthOverflow)
    }
}

/// Read-only view of one RLP item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RlpItem<'a> {
    raw: &'a [u8],
    header: Header,
}

impl<'a> RlpItem<'a> {
    /// Interprets the whole of `raw` as a single item.
    ///
    /// Fails if the header is malformed, the declared length runs past the
    /// end of `raw`, or `raw` holds trailing bytes after the item.
    pub fn new(raw: &'a [u8]) -> Result<Self, RlpError> {
        let (item, rest) = Self::split_first(raw)?;
        if !rest.is_empty() {
            return Err(RlpError::LengthMismatch {
                item: item.len(),
                view: raw.len(),
            });
        }
        Ok(item)
    }

    /// Splits the first complete item off `buf`, returning it with the rest.
    pub fn split_first(buf: &'a [u8]) -> Result<(Self, &'a [u8]), RlpError> {
        let header = Header::decode(buf)?;
        let (raw, rest) = buf.split_at(header.payload_offset + header.payload_len);
        Ok((RlpItem { raw, header }, rest))
    }

    /// Total encoded length, header included.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn payload_offset(&self) -> usize {
        self.header.payload_offset
    }

    pub fn payload_len(&self) -> usize {
        self.header.payload_len
    }

    pub fn is_list(&self) -> bool {
        self.header.is_list
    }

    /// True for the canonical empty string `0x80` and empty list `0xc0`.
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 1 && (self.raw[0] == STRING_SHORT_START || self.raw[0] == LIST_SHORT_START)
    }

    /// The item's full encoding.
    pub fn as_raw(&self) -> &'a [u8] {
        self.raw
    }

    /// The payload without its header, for strings and lists alike.
    pub fn payload(&self) -> &'a [u8] {
        &self.raw[self.header.payload_offset..]
    }

    /// The payload of a byte string.
    pub fn to_bytes(&self) -> Result<&'a [u8], RlpError> {
        if self.is_list() {
            return Err(RlpError::ExpectedString);
        }
        Ok(self.payload())
    }

    /// Iterates over the children of a list.
    pub fn iter(&self) -> Result<RlpIter<'a>, RlpError> {
        if !self.is_list() {
            return Err(RlpError::ExpectedList);
        }
        Ok(RlpIter {
            remaining: self.payload(),
        })
    }

    /// Decodes the children of a list.
    pub fn to_list(&self) -> Result<Vec<RlpItem<'a>>, RlpError> {
        self.iter()?.collect()
    }

    /// Big-endian unsigned integer of at most 32 payload bytes.
    pub fn to_uint(&self) -> Result<U256, RlpError> {
        let bytes = self.to_bytes()?;
        if bytes.len() > 32 {
            return Err(RlpError::UintTooLong(bytes.len()));
        }
        Ok(U256::from_be_slice(bytes))
    }

    /// A single byte item; any non-zero payload byte is `true`.
    pub fn to_boolean(&self) -> Result<bool, RlpError> {
        if self.is_list() {
            return Err(RlpError::ExpectedString);
        }
        if self.raw.len() != 1 {
            return Err(RlpError::InvalidBoolean(self.raw.len()));
        }
        Ok(self.payload().iter().any(|&b| b != 0))
    }

    /// A 20-byte address behind a one byte length prefix.
    pub fn to_address(&self) -> Result<Address, RlpError> {
        let bytes = self.to_bytes()?;
        if self.raw.len() != 21 || bytes.len() != 20 {
            return Err(RlpError::InvalidAddress(self.raw.len()));
        }
        Ok(Address::from_slice(bytes))
    }
}

/// Cursor over the children of a list item.
///
/// Stops after yielding the first error.
#[derive(Clone, Debug)]
pub struct RlpIter<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for RlpIter<'a> {
    type Item = Result<RlpItem<'a>, RlpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match RlpItem::split_first(self.remaining) {
            Ok((item, rest)) => {
                self.remaining = rest;
                Some(Ok(item))
            }
            Err(e) => {
                self.remaining = &[];
                Some(Err(e))
            }
        }
    }
}
