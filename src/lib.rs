#![warn(missing_docs, rust_2018_idioms)]
#![allow(non_snake_case)]
//! Verification core of a coname key directory client.
//!
//! A lookup is trusted in two steps. [`consensus::ConsensusVerifier`] checks that enough known
//! servers recently signed the same state root hash. [`merkle::MerkleResolver`] then checks the
//! proof that binds a name to its profile under that root: the name's VRF output
//! ([`vrf::verify`]) gives its index in the directory tree, and the tree path of that index must
//! hash up to the root. [`client::Client`] chains both.
//!
//! Realms that publish signed epoch heads use [`consensus::RatificationVerifier`] in place of
//! the consensus step.
pub mod client;
pub mod config;
pub mod consensus;
pub mod constants;
pub mod curve;
pub mod elligator;
pub mod errors;
pub mod field;
pub mod hash;
pub mod merkle;
pub mod time;
pub mod vrf;

pub use client::{Client, ClientReply};
pub use config::{
    ClientConfig, ConsensusConfig, QuorumRequirement, RatificationConfig, RealmConfig, ServerKeys,
};
pub use consensus::{
    check_quorum, verify_ed25519, ConsensusVerifier, EpochHead, RatificationVerifier,
    ServerMessage, ServerMessageDecoder, SignedEpochHead, SignedServerMessage,
    TimestampedEpochHead,
};
pub use errors::{
    ConfigError, ConsensusError, DecodeError, LookupError, PointError, ProofError, VrfError,
};
pub use merkle::{Entry, LookupProof, MerkleResolver, Profile, TreeProof};
pub use time::Timestamp;
