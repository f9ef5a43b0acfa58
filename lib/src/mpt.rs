use tracing::debug;

use crate::error::{ProofError, Termination};
use crate::hash::{mpt_hash_hash, Hasher, KeccakHasher, EMPTY_TRIE_ROOT};
use crate::path::{compact_decode, decode_nibbles, shared_prefix_length, NibblePath};
use crate::rlp_item::RlpItem;
use crate::types::{Exclusion, MPTProofInput, Outcome, ProofNodes, H256};

/// A proof node, classified once right after list decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofNode<'a> {
    /// `[compact path, value]`, path carries the terminator.
    Leaf { path: NibblePath, value: RlpItem<'a> },
    /// `[compact path, child reference]`
    Extension { path: NibblePath, child: RlpItem<'a> },
    /// 16 child slots followed by the value slot.
    Branch {
        children: [RlpItem<'a>; 16],
        value: RlpItem<'a>,
    },
}

impl<'a> ProofNode<'a> {
    /// Classifies `item` by its element count.
    pub fn decode(item: &RlpItem<'a>, depth: usize) -> Result<Self, ProofError> {
        let elements = item.to_list()?;
        match elements.len() {
            2 => {
                let (is_leaf, path) = compact_decode(elements[0].to_bytes()?)?;
                if is_leaf {
                    Ok(ProofNode::Leaf {
                        path,
                        value: elements[1],
                    })
                } else {
                    Ok(ProofNode::Extension {
                        path,
                        child: elements[1],
                    })
                }
            }
            17 => Ok(ProofNode::Branch {
                children: core::array::from_fn(|i| elements[i]),
                value: elements[16],
            }),
            arity => Err(ProofError::InvalidArity { depth, arity }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProofNode::Leaf { .. } => "leaf",
            ProofNode::Extension { .. } => "extension",
            ProofNode::Branch { .. } => "branch",
        }
    }
}

/// Fixed-width reference to the child a node points at.
///
/// A string element holds the child's hash, a list element is the child
/// itself, embedded because its encoding is under 32 bytes.
fn child_reference<H: Hasher>(child: &RlpItem<'_>) -> H256 {
    if child.is_list() {
        H::hash(child.as_raw())
    } else {
        H::hash(child.payload())
    }
}

/// Ends the walk at `depth`, which is only allowed on the last proof node.
fn terminate<'a>(
    depth: usize,
    is_last: bool,
    kind: Termination,
    exclusion: Exclusion,
) -> Result<Outcome<'a>, ProofError> {
    if !is_last {
        return Err(ProofError::PrematureTermination { depth, kind });
    }
    debug!(depth, ?exclusion, "proof of exclusion");
    Ok(Outcome::Excluded(exclusion))
}

/// Verify a Merkle Patricia Trie proof
///
/// # Arguments
/// * `root` - The trusted root hash of the trie
/// * `key` - The raw key, expanded to nibbles before the walk
/// * `stack` - Decoded proof nodes, root first
///
/// # Returns
/// The value bound to `key`, or the reason it is provably absent. Any proof
/// that is malformed or breaks the hash chain is an error. Values are
/// returned as their RLP payload, for list-shaped values too.
///
/// A stack that ends on a branch whose selected child is present yields
/// [`Exclusion::ProofExhausted`]. That outcome says the proof stops short,
/// callers needing a hard absence guarantee should reject it.
pub fn verify_stack<'a, H: Hasher>(
    root: &H256,
    key: &[u8],
    stack: &[RlpItem<'a>],
) -> Result<Outcome<'a>, ProofError> {
    let key = decode_nibbles(key, 0, true)?;
    let mut cursor = 0;

    let Some(last) = stack.len().checked_sub(1) else {
        if *root != EMPTY_TRIE_ROOT {
            return Err(ProofError::NonEmptyRoot);
        }
        debug!("empty proof against the empty trie root");
        return Ok(Outcome::Excluded(Exclusion::EmptyTrie));
    };

    // hash(mpt_hash(child)) recorded by the previous node
    let mut expected = [0u8; 32];

    for (depth, item) in stack.iter().enumerate() {
        let encoded = item.as_raw();
        if depth == 0 {
            if H::hash(encoded) != *root {
                return Err(ProofError::RootMismatch);
            }
        } else if mpt_hash_hash::<H>(encoded) != expected {
            return Err(ProofError::HashMismatch { depth });
        }

        let is_last = depth == last;
        let node = ProofNode::decode(item, depth)?;
        debug!(depth, kind = node.kind(), cursor, "verifying proof node");

        match node {
            ProofNode::Leaf { path, value } => {
                let shared = shared_prefix_length(cursor, &key, &path);
                cursor += shared;
                if shared < path.len() {
                    return terminate(depth, is_last, Termination::Divergent, Exclusion::Divergent);
                }
                if !is_last {
                    return Err(ProofError::PrematureTermination {
                        depth,
                        kind: Termination::Leaf,
                    });
                }
                if cursor < key.len() {
                    return Ok(Outcome::Excluded(Exclusion::LeafPathIncomplete));
                }
                debug!(depth, "proof of inclusion");
                return Ok(Outcome::Included(value.payload()));
            }
            ProofNode::Extension { path, child } => {
                let shared = shared_prefix_length(cursor, &key, &path);
                cursor += shared;
                if shared < path.len() {
                    return terminate(depth, is_last, Termination::Divergent, Exclusion::Divergent);
                }
                if is_last {
                    return Err(ProofError::TrailingExtension { depth });
                }
                expected = child_reference::<H>(&child);
            }
            ProofNode::Branch { children, value } => {
                match key.get(cursor..).unwrap_or_default() {
                    // the cursor ran off the end of the key at this branch
                    [] => {
                        if !is_last {
                            return Err(ProofError::PrematureTermination {
                                depth,
                                kind: Termination::BranchValue,
                            });
                        }
                        if value.is_empty() {
                            return Ok(Outcome::Excluded(Exclusion::EmptyBranchValue));
                        }
                        debug!(depth, "proof of inclusion in branch value");
                        return Ok(Outcome::Included(value.payload()));
                    }
                    // a lone terminator lands here and is rejected as a selector
                    [nibble, ..] => {
                        let nibble = *nibble;
                        if nibble > 0x0F {
                            return Err(ProofError::InvalidBranchNibble { depth, nibble });
                        }
                        cursor += 1;

                        let child = &children[nibble as usize];
                        if child.is_empty() {
                            return terminate(
                                depth,
                                is_last,
                                Termination::EmptyBranchSlot,
                                Exclusion::EmptyBranchSlot,
                            );
                        }
                        expected = child_reference::<H>(child);
                    }
                }
            }
        }
    }

    debug!(cursor, "proof exhausted before the key resolved");
    Ok(Outcome::Excluded(Exclusion::ProofExhausted))
}

/// Verify a proof given as one RLP list whose items are the nodes.
pub fn verify_proof<'a, H: Hasher>(
    root: &H256,
    key: &[u8],
    proof: &'a [u8],
) -> Result<Outcome<'a>, ProofError> {
    let stack = RlpItem::new(proof)?.to_list()?;
    verify_stack::<H>(root, key, &stack)
}

/// Verify a proof given as individually encoded nodes.
pub fn verify_nodes<'a, H: Hasher, N: AsRef<[u8]>>(
    root: &H256,
    key: &[u8],
    nodes: &'a [N],
) -> Result<Outcome<'a>, ProofError> {
    let stack = nodes
        .iter()
        .map(|node| RlpItem::new(node.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    verify_stack::<H>(root, key, &stack)
}

impl MPTProofInput {
    /// Verify this input against its own root with Keccak-256.
    pub fn verify(&self) -> Result<Outcome<'_>, ProofError> {
        let root = self.root.0;
        match &self.proof {
            ProofNodes::Nodes(nodes) => verify_nodes::<KeccakHasher, _>(&root, &self.key, nodes),
            ProofNodes::Rlp(proof) => verify_proof::<KeccakHasher>(&root, &self.key, proof),
        }
    }
}
