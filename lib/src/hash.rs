use sha3::{Digest, Keccak256};

use crate::types::H256;

/// Root of the empty trie, `keccak256(rlp(""))`.
pub const EMPTY_TRIE_ROOT: H256 = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Hash function used to link trie nodes.
pub trait Hasher {
    fn hash(data: &[u8]) -> H256;
}

/// Concrete `Hasher` impl for the Keccak-256 hash
#[derive(Default, Debug, Clone, PartialEq)]
pub struct KeccakHasher;

impl Hasher for KeccakHasher {
    fn hash(data: &[u8]) -> H256 {
        keccak256(data)
    }
}

/// Compute Keccak256 hash
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// How a node is referenced by its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeReference<'a> {
    /// Encodings shorter than 32 bytes are embedded as-is.
    Inline(&'a [u8]),
    Hashed(H256),
}

impl NodeReference<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            NodeReference::Inline(bytes) => bytes,
            NodeReference::Hashed(hash) => hash,
        }
    }
}

/// The trie's variable-length "hash": the input itself when shorter than
/// 32 bytes, its digest otherwise.
pub fn mpt_hash<H: Hasher>(data: &[u8]) -> NodeReference<'_> {
    if data.len() < 32 {
        NodeReference::Inline(data)
    } else {
        NodeReference::Hashed(H::hash(data))
    }
}

/// `hash(mpt_hash(data))`, a fixed-width stand-in for comparing references.
pub fn mpt_hash_hash<H: Hasher>(data: &[u8]) -> H256 {
    H::hash(mpt_hash::<H>(data).as_bytes())
}
