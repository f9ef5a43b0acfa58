use core::ops::Deref;

use crate::error::NibbleError;

/// Marker appended to a nibble path that ends a leaf key.
pub const TERMINATOR: u8 = 16;

/// Sequence of nibbles, optionally ending with [`TERMINATOR`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NibblePath(Vec<u8>);

impl NibblePath {
    /// Whether the path ends a leaf key.
    pub fn is_terminated(&self) -> bool {
        self.0.last() == Some(&TERMINATOR)
    }

    /// The nibbles without the terminator.
    pub fn without_terminator(&self) -> &[u8] {
        match self.0.split_last() {
            Some((&TERMINATOR, rest)) => rest,
            _ => &self.0,
        }
    }
}

impl Deref for NibblePath {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Expand `bytes` into nibbles, dropping the first `skip` and optionally
/// appending the terminator.
pub fn decode_nibbles(bytes: &[u8], skip: usize, terminate: bool) -> Result<NibblePath, NibbleError> {
    let available = bytes.len() * 2;
    if skip > available {
        return Err(NibbleError::SkipOutOfRange { skip, available });
    }

    let mut nibbles = Vec::with_capacity(available - skip + terminate as usize);
    for i in skip..available {
        let byte = bytes[i / 2];
        nibbles.push(if i % 2 == 0 { byte >> 4 } else { byte & 0x0F });
    }
    if terminate {
        nibbles.push(TERMINATOR);
    }
    Ok(NibblePath(nibbles))
}

/// Decode a compact (hex-prefix) path.
/// Returns (is_leaf, nibbles); leaf paths carry the terminator.
pub fn compact_decode(encoded: &[u8]) -> Result<(bool, NibblePath), NibbleError> {
    let first = *encoded.first().ok_or(NibbleError::EmptyCompactPath)?;

    // Flag nibble:
    // 0x0: extension, even length
    // 0x1: extension, odd length
    // 0x2: leaf, even length
    // 0x3: leaf, odd length
    let (is_leaf, skip) = match first >> 4 {
        0 => (false, 2),
        1 => (false, 1),
        2 => (true, 2),
        3 => (true, 1),
        flag => return Err(NibbleError::InvalidCompactFlag(flag)),
    };

    let path = decode_nibbles(encoded, skip, is_leaf)?;
    Ok((is_leaf, path))
}

/// Encode nibbles with compact encoding. A trailing terminator is dropped;
/// `is_leaf` alone selects the flag.
pub fn compact_encode(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let nibbles = match nibbles.split_last() {
        Some((&TERMINATOR, rest)) => rest,
        _ => nibbles,
    };
    let odd_len = nibbles.len() % 2 == 1;
    let flag = ((is_leaf as u8) << 1) | odd_len as u8;

    let mut encoded = Vec::with_capacity(nibbles.len() / 2 + 1);
    let rest = if odd_len {
        encoded.push((flag << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        encoded.push(flag << 4);
        nibbles
    };
    for pair in rest.chunks(2) {
        encoded.push((pair[0] << 4) | pair[1]);
    }
    encoded
}

/// Length of the longest run where `a[offset + i] == b[i]`, starting at i = 0.
pub fn shared_prefix_length(offset: usize, a: &[u8], b: &[u8]) -> usize {
    a.get(offset..)
        .unwrap_or_default()
        .iter()
        .zip(b)
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nibbles() {
        let data = [0x12, 0x34, 0xab];
        assert_eq!(&*decode_nibbles(&data, 0, false).unwrap(), &[1, 2, 3, 4, 10, 11]);
        assert_eq!(&*decode_nibbles(&data, 1, false).unwrap(), &[2, 3, 4, 10, 11]);
        assert_eq!(&*decode_nibbles(&data, 2, true).unwrap(), &[3, 4, 10, 11, TERMINATOR]);
        assert_eq!(&*decode_nibbles(&data, 6, true).unwrap(), &[TERMINATOR]);
    }

    #[test]
    fn test_decode_nibbles_skip_out_of_range() {
        assert_eq!(
            decode_nibbles(&[0x12], 3, false),
            Err(NibbleError::SkipOutOfRange { skip: 3, available: 2 })
        );
    }

    #[test]
    fn test_compact_decode_extension_even() {
        let (is_leaf, path) = compact_decode(&[0x00, 0x12, 0x34]).unwrap();
        assert!(!is_leaf);
        assert_eq!(&*path, &[1, 2, 3, 4]);
        assert_eq!(path.len() % 2, 0);
    }

    #[test]
    fn test_compact_decode_extension_odd() {
        let (is_leaf, path) = compact_decode(&[0x11, 0x23]).unwrap();
        assert!(!is_leaf);
        assert_eq!(&*path, &[1, 2, 3]);
    }

    #[test]
    fn test_compact_decode_leaf_even() {
        let (is_leaf, path) = compact_decode(&[0x20, 0x12, 0x34]).unwrap();
        assert!(is_leaf);
        assert!(path.is_terminated());
        assert_eq!(&*path, &[1, 2, 3, 4, TERMINATOR]);
        assert_eq!(path.without_terminator(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_compact_decode_leaf_odd() {
        let (is_leaf, path) = compact_decode(&[0x31, 0x23]).unwrap();
        assert!(is_leaf);
        assert_eq!(&*path, &[1, 2, 3, TERMINATOR]);
    }

    #[test]
    fn test_compact_decode_invalid() {
        assert_eq!(compact_decode(&[]), Err(NibbleError::EmptyCompactPath));
        assert_eq!(compact_decode(&[0x41, 0x23]), Err(NibbleError::InvalidCompactFlag(4)));
    }

    #[test]
    fn test_compact_encode() {
        assert_eq!(compact_encode(&[1, 2, 3, 4], true), vec![0x20, 0x12, 0x34]);
        assert_eq!(compact_encode(&[1, 2, 3], true), vec![0x31, 0x23]);
        assert_eq!(compact_encode(&[1, 2, 3, 4], false), vec![0x00, 0x12, 0x34]);
        assert_eq!(compact_encode(&[1, 2, 3], false), vec![0x11, 0x23]);
        assert_eq!(compact_encode(&[0xa, 0xb, TERMINATOR], true), vec![0x20, 0xab]);
        assert_eq!(compact_encode(&[], true), vec![0x20]);
    }

    #[test]
    fn test_compact_encode_decode() {
        let nibbles = [5, 0, 15, 9, 1];
        let (is_leaf, path) = compact_decode(&compact_encode(&nibbles, true)).unwrap();
        assert!(is_leaf);
        assert_eq!(path.without_terminator(), &nibbles);
    }

    #[test]
    fn test_shared_prefix_length() {
        assert_eq!(shared_prefix_length(0, &[1, 2, 3], &[1, 2, 4]), 2);
        assert_eq!(shared_prefix_length(0, &[], &[1]), 0);
        assert_eq!(shared_prefix_length(1, &[9, 1, 2, 3], &[1, 2, 3, 4]), 3);
        assert_eq!(shared_prefix_length(0, &[1, 2], &[1, 2, 3, 4]), 2);
        assert_eq!(shared_prefix_length(5, &[1, 2], &[1]), 0);
    }
}
