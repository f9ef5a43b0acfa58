//! Verification of Merkle Patricia Trie proofs against a trusted root.
//!
//! The proof walker checks, node by node, that each node hashes to the
//! reference its parent holds, then follows the key's nibbles down to a
//! value or to a proof that the key is absent.

use alloy_sol_types::sol;

pub mod error;
pub mod hash;
pub mod mpt;
pub mod path;
pub mod receipt;
pub mod rlp_item;
pub mod types;

pub use error::*;
pub use hash::*;
pub use mpt::*;
pub use path::*;
pub use receipt::*;
pub use rlp_item::*;
pub use types::*;

sol! {
    /// The verification result encoded as a struct for Solidity consumers.
    struct ProofVerificationOutput {
        bool included;
        bytes32 root;
        bytes key;
        bytes value;
    }
}

impl From<&MPTVerificationResult> for ProofVerificationOutput {
    fn from(result: &MPTVerificationResult) -> Self {
        ProofVerificationOutput {
            included: result.included,
            root: result.root,
            key: result.key.clone(),
            value: result.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_abi_encoded_output() {
        let result = MPTVerificationResult::new([0x11; 32], &[0x12, 0x34], Outcome::Included(b"value"));
        let encoded = ProofVerificationOutput::from(&result).abi_encode();

        assert_eq!(encoded.len() % 32, 0);
        assert!(encoded.windows(32).any(|word| word == [0x11; 32]));
        assert!(encoded.windows(5).any(|chunk| chunk == b"value"));
    }
}
