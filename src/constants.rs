//! Crate specific constants

/// Byte size of the VRF public key
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Byte size of the output of the VRF function
pub const VRF_SIZE: usize = 32;
/// Byte size of the encoded intermediate point `ii` carried in the proof
pub const INTERMEDIATE_SIZE: usize = 32;
/// Byte size of the proof, `c || t || ii`
pub const PROOF_SIZE: usize = 32 + 32 + INTERMEDIATE_SIZE;
/// Byte size of a compressed curve point
pub const POINT_SIZE: usize = 32;

/// Prefix prepended to a server message before its signature is checked
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"msg\x00";
/// Byte size of a state root hash
pub const ROOT_HASH_SIZE: usize = 32;

/// Byte size of every node hash in the directory tree
pub const MERKLE_HASH_BYTES: usize = 32;
/// Byte size of a tree index (the VRF output of a name)
pub const MERKLE_INDEX_BYTES: usize = 32;
/// Depth limit of the tree, one level per index bit
pub const MERKLE_INDEX_BITS: usize = MERKLE_INDEX_BYTES * 8;
/// Domain separator of internal nodes
pub const MERKLE_NODEID_INTERNAL: &[u8] = b"I";
/// Domain separator of leaves
pub const MERKLE_NODEID_LEAF: &[u8] = b"L";
/// Domain separator of empty branches
pub const MERKLE_NODEID_EMPTY_BRANCH: &[u8] = b"E";

/// Byte size of an entry's commitment to its profile
pub const PROFILE_COMMITMENT_SIZE: usize = 64;
