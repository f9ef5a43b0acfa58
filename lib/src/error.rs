use thiserror::Error;

/// Failure to interpret a byte range as an RLP item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RlpError {
    #[error("RLP input is empty")]
    Empty,
    #[error("RLP length header needs {needed} bytes, only {available} available")]
    HeaderTruncated { needed: usize, available: usize },
    #[error("RLP item declares {declared} bytes, only {available} available")]
    Truncated { declared: usize, available: usize },
    #[error("RLP length header does not fit in usize")]
    LengthOverflow,
    #[error("RLP item spans {item} bytes but its view holds {view}")]
    LengthMismatch { item: usize, view: usize },
    #[error("expected an RLP list, found a byte string")]
    ExpectedList,
    #[error("expected an RLP byte string, found a list")]
    ExpectedString,
    #[error("RLP integer of {0} bytes does not fit in 256 bits")]
    UintTooLong(usize),
    #[error("RLP address item must be 21 bytes, got {0}")]
    InvalidAddress(usize),
    #[error("RLP boolean item must be a single byte, got {0}")]
    InvalidBoolean(usize),
}

/// Failure to expand or decode a nibble path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NibbleError {
    #[error("cannot skip {skip} nibbles out of {available}")]
    SkipOutOfRange { skip: usize, available: usize },
    #[error("compact path is empty")]
    EmptyCompactPath,
    #[error("invalid compact path flag nibble {0:#x}")]
    InvalidCompactFlag(u8),
}

/// Where a proof walk stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A leaf or extension whose path diverges from the key.
    Divergent,
    /// A leaf node.
    Leaf,
    /// A branch slot selected by the key is empty.
    EmptyBranchSlot,
    /// The key ended at a branch.
    BranchValue,
}

impl core::fmt::Display for Termination {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Termination::Divergent => "divergent leaf/extension",
            Termination::Leaf => "leaf",
            Termination::EmptyBranchSlot => "empty branch slot",
            Termination::BranchValue => "branch value",
        };
        f.write_str(name)
    }
}

/// Invalid proof or malformed input. Exclusion is never reported here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed RLP: {0}")]
    Rlp(#[from] RlpError),
    #[error("malformed path: {0}")]
    Nibble(#[from] NibbleError),
    #[error("root node hash does not match the trusted root")]
    RootMismatch,
    #[error("node at depth {depth} does not match the reference held by its parent")]
    HashMismatch { depth: usize },
    #[error("node at depth {depth} has {arity} elements, expected 2 or 17")]
    InvalidArity { depth: usize, arity: usize },
    #[error("{kind} at depth {depth} is not the last proof node")]
    PrematureTermination { depth: usize, kind: Termination },
    #[error("extension at depth {depth} is the last proof node")]
    TrailingExtension { depth: usize },
    #[error("branch selector {nibble} at depth {depth} is not a nibble")]
    InvalidBranchNibble { depth: usize, nibble: u8 },
    #[error("empty proof is only valid for the empty trie root")]
    NonEmptyRoot,
}

/// Failure to interpret a proven value as a transaction receipt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("malformed RLP: {0}")]
    Rlp(#[from] RlpError),
    #[error("receipt has {0} fields, expected 4")]
    ReceiptArity(usize),
    #[error("log {index} has {arity} fields, expected 3")]
    LogArity { index: usize, arity: usize },
    #[error("log {index} topic is {len} bytes, expected 32")]
    TopicLength { index: usize, len: usize },
}
