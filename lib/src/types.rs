use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// 32-byte hash type
pub type H256 = [u8; 32];

/// Why a proof shows the key to be absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Empty proof against the empty trie root.
    EmptyTrie,
    /// A leaf or extension path splits away from the key.
    Divergent,
    /// The branch slot selected by the key is empty.
    EmptyBranchSlot,
    /// The key ends at a branch whose value slot is empty.
    EmptyBranchValue,
    /// A leaf matched but the key continues past it.
    LeafPathIncomplete,
    /// The proof ran out of nodes without resolving the key.
    ProofExhausted,
}

/// Result of a successful proof walk.
///
/// Values borrow from the proof buffer they were read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    Included(&'a [u8]),
    Excluded(Exclusion),
}

impl<'a> Outcome<'a> {
    pub fn is_included(&self) -> bool {
        matches!(self, Outcome::Included(_))
    }

    pub fn value(&self) -> Option<&'a [u8]> {
        match self {
            Outcome::Included(value) => Some(*value),
            Outcome::Excluded(_) => None,
        }
    }

    /// Flattens to bytes, empty for every kind of exclusion.
    pub fn into_value(self) -> &'a [u8] {
        self.value().unwrap_or_default()
    }
}

/// The nodes of a proof, in either of the two layouts callers supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofNodes {
    /// Individually encoded nodes, root first (the `eth_getProof` layout).
    Nodes(Vec<Bytes>),
    /// One RLP list whose items are the nodes, root first.
    Rlp(Bytes),
}

/// Input for MPT proof verification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MPTProofInput {
    pub root: B256,
    pub key: Bytes,
    pub proof: ProofNodes,
}

/// Output from MPT proof verification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MPTVerificationResult {
    pub root: B256,
    pub key: Bytes,
    pub included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<Exclusion>,
    pub value: Bytes,
}

impl MPTVerificationResult {
    pub fn new(root: H256, key: &[u8], outcome: Outcome<'_>) -> Self {
        let exclusion = match outcome {
            Outcome::Included(_) => None,
            Outcome::Excluded(reason) => Some(reason),
        };
        Self {
            root: B256::from(root),
            key: Bytes::copy_from_slice(key),
            included: outcome.is_included(),
            exclusion,
            value: Bytes::copy_from_slice(outcome.into_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_flattening() {
        let included = Outcome::Included(b"value");
        assert_eq!(included.into_value(), b"value");
        assert_eq!(Outcome::Excluded(Exclusion::Divergent).into_value(), &[] as &[u8]);
        assert_eq!(Outcome::Excluded(Exclusion::EmptyBranchValue).value(), None);
    }

    #[test]
    fn test_input_accepts_node_list() {
        let json = r#"{
            "root": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "key": "0x1234",
            "proof": ["0xc20102", "0x80"]
        }"#;
        let input: MPTProofInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.key.as_ref(), &[0x12, 0x34]);
        match input.proof {
            ProofNodes::Nodes(nodes) => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(nodes[0].as_ref(), &[0xc2, 0x01, 0x02]);
            }
            ProofNodes::Rlp(_) => panic!("expected node list"),
        }
    }

    #[test]
    fn test_input_accepts_rlp_list() {
        let json = r#"{
            "root": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
            "key": "0x",
            "proof": "0xc0"
        }"#;
        let input: MPTProofInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.proof, ProofNodes::Rlp(Bytes::from_static(&[0xc0])));
    }

    #[test]
    fn test_result_serialization() {
        let result = MPTVerificationResult::new([0u8; 32], &[0xab], Outcome::Excluded(Exclusion::EmptyBranchSlot));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["included"], false);
        assert_eq!(json["exclusion"], "empty_branch_slot");
        assert_eq!(json["value"], "0x");
    }
}
