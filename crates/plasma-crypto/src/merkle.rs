//! # Merkle Tree — Block Transaction Commitments
//!
//! A binary Merkle tree over the identity ids of a block's transactions.
//! The root is what a header commits to; an inclusion proof lets a
//! withdrawal show that a transaction was part of a submitted block.
//!
//! ## Algorithm
//!
//! - Node: `keccak256(min(a, b) || max(a, b))`. The pair is sorted
//!   bytewise before hashing, so a proof is a flat list of siblings with no
//!   left/right flags, matching the usual on-chain `MerkleProof.verify`.
//! - Odd level: the lone last node is promoted to the next level
//!   unchanged. It is not paired with itself.
//! - A single-leaf tree has the leaf as its root and an empty proof.
//!
//! ## Security Invariant
//!
//! Leaves are transaction identity ids (signatures included), never
//! signing hashes. Two transactions that differ only in signatures have
//! distinct leaves.

use plasma_core::{keccak256, CodecError, Decodable, Encodable, Hash256, PlasmaError, Rlp};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Node hashing
// ---------------------------------------------------------------------------

/// Combine two nodes: hash of the sorted concatenation.
pub fn hash_pair(a: &Hash256, b: &Hash256) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_bytes());
    buf[32..].copy_from_slice(hi.as_bytes());
    keccak256(&buf)
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

/// Sibling digests from leaf to root.
///
/// Levels where the path node was promoted without a sibling contribute
/// nothing, so a proof may be shorter than the tree depth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof(Vec<Hash256>);

impl MerkleProof {
    /// Wrap a sibling list.
    pub fn new(siblings: Vec<Hash256>) -> Self {
        Self(siblings)
    }

    /// Sibling digests, leaf end first.
    pub fn siblings(&self) -> &[Hash256] {
        &self.0
    }

    /// Number of siblings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the proof of a single-leaf tree.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recompute the root implied by this proof for `leaf`.
    pub fn compute_root(&self, leaf: &Hash256) -> Hash256 {
        self.0.iter().fold(*leaf, |acc, sibling| hash_pair(&acc, sibling))
    }

    /// Concatenated sibling bytes, the flat form the root-chain verifier takes.
    pub fn to_flat_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|h| h.as_bytes().iter().copied()).collect()
    }

    /// Parse the flat concatenated form.
    pub fn from_flat_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() % 32 != 0 {
            return Err(CodecError::WrongLength {
                expected: (bytes.len() / 32 + 1) * 32,
                found: bytes.len(),
            });
        }
        let siblings = bytes
            .chunks_exact(32)
            .map(|chunk| {
                let mut out = [0u8; 32];
                out.copy_from_slice(chunk);
                Hash256::from_bytes(out)
            })
            .collect();
        Ok(Self(siblings))
    }
}

impl Encodable for MerkleProof {
    fn to_rlp(&self) -> Rlp {
        self.0.to_rlp()
    }
}

impl Decodable for MerkleProof {
    fn from_rlp(item: &Rlp) -> Result<Self, CodecError> {
        Ok(Self(Vec::<Hash256>::from_rlp(item)?))
    }
}

/// True iff `proof` reconstructs `root` from `leaf`.
pub fn verify_proof(root: &Hash256, leaf: &Hash256, proof: &MerkleProof) -> bool {
    proof.compute_root(leaf) == *root
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A fully materialized Merkle tree.
///
/// `levels[0]` holds the leaves; the last level holds exactly the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    /// Build a tree over `leaves` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::EmptyTree` if `leaves` is empty.
    pub fn new(leaves: Vec<Hash256>) -> Result<Self, PlasmaError> {
        if leaves.is_empty() {
            return Err(PlasmaError::EmptyTree);
        }
        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|l| l.len() > 1) {
            let next = level
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    lone => lone[0],
                })
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// The root digest.
    pub fn root(&self) -> Hash256 {
        // `new` guarantees a non-empty top level.
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    /// The leaves in build order.
    pub fn leaves(&self) -> &[Hash256] {
        &self.levels[0]
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Always false; a tree has at least one leaf.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Inclusion proof for the first occurrence of `leaf`.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::LeafNotFound` if `leaf` is not in the tree.
    pub fn proof(&self, leaf: &Hash256) -> Result<MerkleProof, PlasmaError> {
        let index = self
            .leaves()
            .iter()
            .position(|l| l == leaf)
            .ok_or(PlasmaError::LeafNotFound(*leaf))?;
        self.proof_at(index)
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::LeafIndexOutOfRange` past the last leaf.
    pub fn proof_at(&self, index: usize) -> Result<MerkleProof, PlasmaError> {
        if index >= self.len() {
            return Err(PlasmaError::LeafIndexOutOfRange {
                index,
                count: self.len(),
            });
        }
        let mut siblings = Vec::with_capacity(self.depth());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            if let Some(node) = level.get(sibling) {
                siblings.push(*node);
            }
            position /= 2;
        }
        Ok(MerkleProof(siblings))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn leaf_set() -> impl Strategy<Value = Vec<Hash256>> {
        prop::collection::vec(any::<[u8; 32]>().prop_map(Hash256::from_bytes), 1..40)
    }

    proptest! {
        #[test]
        fn every_leaf_proves(leaves in leaf_set()) {
            let tree = MerkleTree::new(leaves.clone()).unwrap();
            for leaf in &leaves {
                let proof = tree.proof(leaf).unwrap();
                prop_assert!(verify_proof(&tree.root(), leaf, &proof));
            }
        }

        #[test]
        fn mutated_leaf_fails(
            leaves in leaf_set(),
            pick in any::<prop::sample::Index>(),
            byte in 0usize..32,
            bit in 0u8..8,
        ) {
            let tree = MerkleTree::new(leaves.clone()).unwrap();
            let leaf = leaves[pick.index(leaves.len())];
            let proof = tree.proof(&leaf).unwrap();
            let mut bytes = *leaf.as_bytes();
            bytes[byte] ^= 1 << bit;
            prop_assert!(!verify_proof(&tree.root(), &Hash256::from_bytes(bytes), &proof));
        }

        #[test]
        fn mutated_sibling_fails(
            leaves in leaf_set(),
            pick in any::<prop::sample::Index>(),
            byte in 0usize..32,
            bit in 0u8..8,
        ) {
            let tree = MerkleTree::new(leaves.clone()).unwrap();
            let leaf = leaves[pick.index(leaves.len())];
            let proof = tree.proof(&leaf).unwrap();
            prop_assume!(!proof.is_empty());
            let mut siblings = proof.siblings().to_vec();
            let target = byte % siblings.len();
            let mut bytes = *siblings[target].as_bytes();
            bytes[byte] ^= 1 << bit;
            siblings[target] = Hash256::from_bytes(bytes);
            prop_assert!(!verify_proof(&tree.root(), &leaf, &MerkleProof::new(siblings)));
        }
    }
}
