use thiserror::Error;

use crate::time::Timestamp;

/// Failures of arithmetic in the base field
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FieldError {
    #[error("field element is not invertible")]
    NonInvertible,
}

/// Failures when decoding or validating a curve point
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PointError {
    #[error("invalid length: expected {expected} got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Decompression failed")]
    DecompressionFailed,
    #[error("point encoding is not canonical")]
    NonCanonical,
    #[error("point is the identity")]
    Identity,
    #[error("point is not on the curve")]
    NotOnCurve,
    #[error("point is not in the prime order subgroup")]
    NotInPrimeOrderSubgroup,
}

/// Internal failures of VRF verification. `vrf::verify` turns every one of them into `false`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum VrfError {
    #[error("VRF verification failed")]
    VerificationFailed,
    #[error("invalid length: expected {expected} got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error(transparent)]
    Point(#[from] PointError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Failure of the external wire decoder
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("malformed server message: {0}")]
    Malformed(String),
}

/// Reasons a set of signed server statements cannot be trusted
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConsensusError {
    #[error("not enough consensus signatures: have {have}, need {need}")]
    NotEnoughConsensusSignatures { have: usize, need: usize },
    #[error("not enough freshness signatures: have {have}, need {need}")]
    NotEnoughFreshnessSignatures { have: usize, need: usize },
    #[error("state hashes differ")]
    ConflictingStateHashes,
    #[error("malformed signed statement: {0}")]
    MalformedMessage(&'static str),
    #[error("no valid signed statements")]
    NoValidStatements,
    #[error("epoch heads don't match")]
    EpochHeadMismatch,
    #[error("epoch head does not match realm: {got} != {want}")]
    RealmMismatch { got: String, want: String },
    #[error("epoch expired at {expiration:?}, now is {now:?}")]
    EpochExpired { expiration: Timestamp, now: Timestamp },
    #[error("ratifications do not satisfy the quorum")]
    QuorumNotSatisfied,
}

/// Reasons a lookup proof does not prove a name's profile under a root hash
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProofError {
    #[error("proof specifies different user ID: {got} != {want}")]
    UserIdMismatch { got: String, want: String },
    #[error("VRF verification failed")]
    VrfVerificationFailed,
    #[error("tree proof has {0} neighbors, more than the index has bits")]
    TooManyNeighbors(usize),
    #[error("tree proof has an entry hash but no index")]
    MissingExistingIndex,
    #[error("root hashes mismatch")]
    RootHashMismatch,
    #[error("non-empty entry did not match verified lookup result <null>")]
    UnexpectedEntry,
    #[error("non-empty profile did not match verified lookup result <null>")]
    UnexpectedProfile,
    #[error("tree proof has a leaf but no entry was supplied")]
    MissingEntry,
    #[error("tree proof has a leaf but no profile was supplied")]
    MissingProfile,
    #[error("entry hash did not match verified lookup result")]
    EntryHashMismatch,
    #[error("profile does not match the commitment in the entry")]
    CommitmentMismatch,
}

/// Failures of a directory lookup that the caller must report distinctly from "not found"
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LookupError {
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[error("profile expired at {expiration:?}, now is {now:?}")]
    ExpiredProfile { expiration: Timestamp, now: Timestamp },
}

/// Invalid verifier configuration
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("invalid public key for server {0}")]
    InvalidServerKey(String),
    #[error("quorum names verifier {0} without a key")]
    UnknownVerifier(String),
    #[error("{required} {kind} signatures required but only {servers} servers are known")]
    UnreachableThreshold {
        kind: &'static str,
        required: usize,
        servers: usize,
    },
}
