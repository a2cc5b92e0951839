//! Resolution of a name to its profile under a trusted root hash.
//!
//! The directory keeps its entries in a binary prefix tree (CONIKS). The path of an entry is the
//! bit string of its index, read from the most significant bit of the first byte, and the index
//! of a name is its VRF output. A lookup proof carries the sibling hashes along that path and the
//! leaf found at its end, from which the root hash is recomputed:
//! - empty branch: `H("E" || nonce || prefix || len(prefix))`
//! - leaf: `H("L" || nonce || index || depth || entry_hash)`
//! - internal node: `H("I" || child0 || child1 || prefix || len(prefix))`
//!
//! where `H` is SHAKE256 with 32 bytes of output, prefixes are packed most significant bit
//! first, and lengths and depths are 32-bit little-endian.
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::config::RealmConfig;
use super::constants::*;
use super::errors::{LookupError, ProofError};
use super::hash::shake256;
use super::time::Timestamp;
use super::vrf;

/// A hash of a tree node
pub type NodeHash = [u8; MERKLE_HASH_BYTES];

/// Path of an index through the tree, together with the leaf at its end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeProof {
    /// Sibling hashes from the root down. `None` stands for an empty branch.
    pub neighbors: Vec<Option<NodeHash>>,
    /// Index of the leaf at the end of the path, if there is one
    pub existing_index: Option<[u8; MERKLE_INDEX_BYTES]>,
    /// Entry hash stored in that leaf
    pub existing_entry_hash: Option<NodeHash>,
}

/// A directory entry. Only its commitment to the profile is interpreted here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Wire encoding, whose hash the tree stores
    pub encoding: Vec<u8>,
    /// `SHAKE256(profile.encoding)`, 64 bytes
    pub profile_commitment: Vec<u8>,
}

/// The profile a name resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Wire encoding, including the nonce that hides it inside the commitment
    pub encoding: Vec<u8>,
    /// The profile must not be used after this time
    pub expiration_time: Timestamp,
    /// Public keys by application
    pub keys: BTreeMap<String, Vec<u8>>,
}

/// Everything the directory returns to prove what a name maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupProof {
    /// The name the proof was made for, or empty
    pub user_id: String,
    /// VRF output of the name
    pub index: [u8; MERKLE_INDEX_BYTES],
    /// VRF proof of `index`
    pub index_proof: Vec<u8>,
    /// Tree path of `index`
    pub tree_proof: TreeProof,
    /// The entry stored under `index`, if the name is present
    pub entry: Option<Entry>,
    /// The profile `entry` commits to
    pub profile: Option<Profile>,
}

fn bit_at(index: &[u8; MERKLE_INDEX_BYTES], i: usize) -> bool {
    index[i / 8] & (0x80 >> (i % 8)) != 0
}

/// The first `len` bits of `index`, packed most significant bit first, with the unused low bits
/// of the last byte cleared.
fn prefix_bytes(index: &[u8; MERKLE_INDEX_BYTES], len: usize) -> Vec<u8> {
    let mut prefix = index[..(len + 7) / 8].to_vec();
    if len % 8 != 0 {
        if let Some(last) = prefix.last_mut() {
            *last &= 0xff << (8 - len % 8);
        }
    }
    prefix
}

fn depth_bytes(depth: usize) -> [u8; 4] {
    (depth as u32).to_le_bytes()
}

/// Hash of an empty branch at the given prefix
pub fn hash_empty_branch(nonce: &[u8], prefix: &[u8], prefix_len: usize) -> NodeHash {
    shake256(&[
        MERKLE_NODEID_EMPTY_BRANCH,
        nonce,
        prefix,
        &depth_bytes(prefix_len)[..],
    ])
}

/// Hash of a leaf holding `entry_hash` under `index` at `depth`
pub fn hash_leaf(
    nonce: &[u8],
    index: &[u8; MERKLE_INDEX_BYTES],
    depth: usize,
    entry_hash: &NodeHash,
) -> NodeHash {
    shake256(&[
        MERKLE_NODEID_LEAF,
        nonce,
        &index[..],
        &depth_bytes(depth)[..],
        &entry_hash[..],
    ])
}

/// Hash of an internal node with the given child hashes at the given prefix
pub fn hash_internal_node(
    children: [&NodeHash; 2],
    prefix: &[u8],
    prefix_len: usize,
) -> NodeHash {
    shake256(&[
        MERKLE_NODEID_INTERNAL,
        &children[0][..],
        &children[1][..],
        prefix,
        &depth_bytes(prefix_len)[..],
    ])
}

/// Recompute the root hash of the tree from the path of `index` described by `proof`.
pub fn recompute_root(
    nonce: &[u8],
    index: &[u8; MERKLE_INDEX_BYTES],
    proof: &TreeProof,
) -> Result<NodeHash, ProofError> {
    let depth = proof.neighbors.len();
    if depth > MERKLE_INDEX_BITS {
        return Err(ProofError::TooManyNeighbors(depth));
    }

    let mut hash = match (&proof.existing_entry_hash, &proof.existing_index) {
        (Some(entry_hash), Some(existing_index)) => {
            hash_leaf(nonce, existing_index, depth, entry_hash)
        }
        (Some(_), None) => return Err(ProofError::MissingExistingIndex),
        (None, _) => hash_empty_branch(nonce, &prefix_bytes(index, depth), depth),
    };

    for (level, neighbor) in proof.neighbors.iter().enumerate().rev() {
        let sibling = match neighbor {
            Some(h) => *h,
            None => {
                let mut sibling_prefix = prefix_bytes(index, level + 1);
                sibling_prefix[level / 8] ^= 0x80 >> (level % 8);
                hash_empty_branch(nonce, &sibling_prefix, level + 1)
            }
        };
        let children = if bit_at(index, level) {
            [&sibling, &hash]
        } else {
            [&hash, &sibling]
        };
        hash = hash_internal_node(children, &prefix_bytes(index, level), level);
    }

    Ok(hash)
}

/// Resolves names against root hashes of one realm.
#[derive(Clone, Debug)]
pub struct MerkleResolver {
    realm: Arc<RealmConfig>,
}

impl MerkleResolver {
    /// Resolver for the realm described by `realm`
    pub fn new(realm: Arc<RealmConfig>) -> Self {
        MerkleResolver { realm }
    }

    /// The realm parameters in use
    pub fn realm(&self) -> &Arc<RealmConfig> {
        &self.realm
    }

    /// Check that `proof` proves what `name` maps to in the tree with root `root_hash`.
    ///
    /// Returns the profile of `name`, `None` if the proof shows that `name` is not in the tree,
    /// or the first check that failed. Expiration is not checked here.
    pub fn try_resolve<'a>(
        &self,
        root_hash: &[u8; ROOT_HASH_SIZE],
        name: &str,
        proof: &'a LookupProof,
    ) -> Result<Option<&'a Profile>, ProofError> {
        if !proof.user_id.is_empty() && proof.user_id != name {
            return Err(ProofError::UserIdMismatch {
                got: proof.user_id.clone(),
                want: name.to_string(),
            });
        }

        if !vrf::verify(
            &self.realm.vrf_public,
            name.as_bytes(),
            &proof.index,
            &proof.index_proof,
        ) {
            return Err(ProofError::VrfVerificationFailed);
        }

        let tree_proof = &proof.tree_proof;
        let recomputed = recompute_root(&self.realm.tree_nonce, &proof.index, tree_proof)?;
        if recomputed != *root_hash {
            return Err(ProofError::RootHashMismatch);
        }

        if tree_proof.existing_index != Some(proof.index) {
            // the path ends in an empty branch or in the leaf of another index
            if proof.entry.is_some() {
                return Err(ProofError::UnexpectedEntry);
            }
            if proof.profile.is_some() {
                return Err(ProofError::UnexpectedProfile);
            }
            return Ok(None);
        }

        let entry = proof.entry.as_ref().ok_or(ProofError::MissingEntry)?;
        let entry_hash: NodeHash = shake256(&[&entry.encoding[..]]);
        if tree_proof.existing_entry_hash != Some(entry_hash) {
            return Err(ProofError::EntryHashMismatch);
        }

        let profile = proof.profile.as_ref().ok_or(ProofError::MissingProfile)?;
        let commitment: [u8; PROFILE_COMMITMENT_SIZE] = shake256(&[&profile.encoding[..]]);
        if entry.profile_commitment[..] != commitment[..] {
            return Err(ProofError::CommitmentMismatch);
        }

        Ok(Some(profile))
    }

    /// The profile `name` maps to under `root_hash`, if `proof` proves one.
    ///
    /// Every proof failure is reported as `Ok(None)`, like a proven absence. A proven profile
    /// whose expiration time is before `now` is an error.
    pub fn resolve_against_root(
        &self,
        root_hash: &[u8; ROOT_HASH_SIZE],
        name: &str,
        proof: &LookupProof,
        now: Timestamp,
    ) -> Result<Option<Profile>, LookupError> {
        let profile = match self.try_resolve(root_hash, name, proof) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("name proven absent");
                return Ok(None);
            }
            Err(err) => {
                debug!(reason = %err, "lookup proof rejected");
                return Ok(None);
            }
        };

        if profile.expiration_time.is_before(now) {
            return Err(LookupError::ExpiredProfile {
                expiration: profile.expiration_time,
                now,
            });
        }

        Ok(Some(profile.clone()))
    }
}
