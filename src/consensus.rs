//! Consensus and freshness check over statements signed by the directory servers.
//!
//! Each server periodically signs a statement `(server, hash_of_state, time)`. A root hash is
//! trusted when enough distinct known servers signed it, enough of them recently, and no validly
//! signed statement claims a different state.
//!
//! Realms that publish epoch heads are checked by [`RatificationVerifier`] instead: all heads must
//! be the same unexpired head of the configured realm, and the verifiers that signed it must
//! satisfy a [`QuorumRequirement`].
use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;
use std::sync::Arc;

use ed25519_dalek::{PublicKey, Signature};
use tracing::{debug, warn};

use super::config::{ConsensusConfig, QuorumRequirement, RatificationConfig};
use super::constants::{ROOT_HASH_SIZE, SIGNED_MESSAGE_PREFIX};
use super::errors::{ConsensusError, DecodeError};
use super::time::Timestamp;

/// A statement as received from the wire: the encoded message and a signature over it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedServerMessage {
    /// Identifier of the sending server, as given by the envelope. Not authenticated; the
    /// identifier inside the signed message is the one that counts.
    pub server: Option<String>,
    /// Encoded `ServerMessage`
    pub message: Option<Vec<u8>>,
    /// Ed25519 signature over `"msg\0" || message`
    pub signature: Option<Vec<u8>>,
}

/// A decoded server statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerMessage {
    /// Identifier of the signing server
    pub server: Option<String>,
    /// Root hash of the directory state the server vouches for
    pub hash_of_state: Option<Vec<u8>>,
    /// When the statement was made
    pub time: Timestamp,
}

/// Decoder of the wire encoding of a `ServerMessage`.
pub trait ServerMessageDecoder {
    /// Decode one message
    fn decode(&self, bytes: &[u8]) -> Result<ServerMessage, DecodeError>;
}

impl<D: ServerMessageDecoder + ?Sized> ServerMessageDecoder for Arc<D> {
    fn decode(&self, bytes: &[u8]) -> Result<ServerMessage, DecodeError> {
        (**self).decode(bytes)
    }
}

/// Check an Ed25519 signature. Malformed keys or signatures are reported as invalid.
pub fn verify_ed25519(public_key: &[u8], msg: &[u8], sig: &[u8]) -> bool {
    match PublicKey::from_bytes(public_key) {
        Ok(key) => verify_with_key(&key, msg, sig),
        Err(_) => false,
    }
}

fn verify_with_key(key: &PublicKey, msg: &[u8], sig: &[u8]) -> bool {
    match Signature::try_from(sig) {
        Ok(signature) => key.verify_strict(msg, &signature).is_ok(),
        Err(_) => false,
    }
}

/// Checks signed statements against a consensus configuration.
#[derive(Clone, Debug)]
pub struct ConsensusVerifier<D> {
    config: Arc<ConsensusConfig>,
    decoder: D,
}

impl<D: ServerMessageDecoder> ConsensusVerifier<D> {
    /// Verifier over `config`, decoding statements with `decoder`.
    pub fn new(config: Arc<ConsensusConfig>, decoder: D) -> Self {
        ConsensusVerifier { config, decoder }
    }

    /// The configuration in use
    pub fn config(&self) -> &Arc<ConsensusConfig> {
        &self.config
    }

    /// [`ConsensusVerifier::verify_consensus_at`] the current wall-clock time.
    pub fn verify_consensus(
        &self,
        signed_msgs: &[SignedServerMessage],
    ) -> Result<[u8; ROOT_HASH_SIZE], ConsensusError> {
        self.verify_consensus_at(signed_msgs, Timestamp::now())
    }

    /// Returns the root hash vouched for by the statements in `signed_msgs` if
    /// - at least `consensus_signatures_required` distinct known servers signed it,
    /// - at least `freshness_signatures_required` of them signed it no longer than
    ///   `freshness_threshold` before `now`,
    /// - no validly signed statement claims a different root hash.
    ///
    /// Statements that are incomplete, undecodable, from unknown servers, or badly signed are
    /// ignored.
    pub fn verify_consensus_at(
        &self,
        signed_msgs: &[SignedServerMessage],
        now: Timestamp,
    ) -> Result<[u8; ROOT_HASH_SIZE], ConsensusError> {
        let config = &self.config;

        let mut root_hash: Option<[u8; ROOT_HASH_SIZE]> = None;
        let mut consensus_servers = BTreeSet::new();
        let mut freshness_servers = BTreeSet::new();

        for signed_msg in signed_msgs {
            let (message, signature) = match (&signed_msg.message, &signed_msg.signature) {
                (Some(m), Some(s)) if !m.is_empty() && !s.is_empty() => (m, s),
                _ => {
                    debug!("skipping statement without message or signature");
                    continue;
                }
            };

            let deserialized = match self.decoder.decode(message) {
                Ok(deserialized) => deserialized,
                Err(err) => {
                    debug!(reason = %err, "skipping undecodable statement");
                    continue;
                }
            };

            let server = match deserialized.server {
                Some(ref server) => server.clone(),
                None => {
                    debug!("skipping statement without server");
                    continue;
                }
            };

            let key = match config.server_keys.get(&server) {
                Some(key) => key,
                None => {
                    debug!(server = %server, "skipping statement from unknown server");
                    continue;
                }
            };

            let message_to_verify = [SIGNED_MESSAGE_PREFIX, &message[..]].concat();
            if !verify_with_key(key, &message_to_verify, signature) {
                debug!(server = %server, "skipping statement with invalid signature");
                continue;
            }

            let hash_of_state = match deserialized.hash_of_state.as_deref() {
                Some(hash) if hash.len() == ROOT_HASH_SIZE => {
                    let mut h = [0u8; ROOT_HASH_SIZE];
                    h.copy_from_slice(hash);
                    h
                }
                Some(_) => {
                    warn!(server = %server, "signed statement with a malformed state hash");
                    return Err(ConsensusError::MalformedMessage("state hash is not 32 bytes"));
                }
                None => {
                    warn!(server = %server, "signed statement without a state hash");
                    return Err(ConsensusError::MalformedMessage("missing state hash"));
                }
            };

            match root_hash {
                None => root_hash = Some(hash_of_state),
                Some(ref root) if *root != hash_of_state => {
                    warn!(server = %server, "signed statements disagree on the state hash");
                    return Err(ConsensusError::ConflictingStateHashes);
                }
                Some(_) => {}
            }

            if !deserialized
                .time
                .saturating_add(config.freshness_threshold)
                .is_before(now)
            {
                freshness_servers.insert(server.clone());
            }
            consensus_servers.insert(server);
        }

        if consensus_servers.len() < config.consensus_signatures_required {
            return Err(ConsensusError::NotEnoughConsensusSignatures {
                have: consensus_servers.len(),
                need: config.consensus_signatures_required,
            });
        }
        if freshness_servers.len() < config.freshness_signatures_required {
            return Err(ConsensusError::NotEnoughFreshnessSignatures {
                have: freshness_servers.len(),
                need: config.freshness_signatures_required,
            });
        }

        root_hash.ok_or(ConsensusError::NoValidStatements)
    }
}

/// Summary of the directory state in one epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochHead {
    /// Realm the epoch belongs to
    pub realm: String,
    /// Epoch number
    pub epoch: u64,
    /// Root hash of the tree in this epoch
    pub root_hash: Vec<u8>,
    /// When the epoch was issued
    pub issue_time: Timestamp,
    /// Hash of the previous epoch's summary
    pub previous_summary_hash: Vec<u8>,
    /// Wire encoding, compared across ratifications
    pub encoding: Vec<u8>,
}

/// An epoch head as stamped by one verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampedEpochHead {
    /// The ratified head
    pub head: EpochHead,
    /// When it was stamped
    pub timestamp: Timestamp,
    /// Wire encoding, the message the signatures are over
    pub encoding: Vec<u8>,
}

/// A timestamped epoch head with Ed25519 signatures by verifier identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEpochHead {
    /// The signed head
    pub head: TimestampedEpochHead,
    /// Signatures over `head.encoding`
    pub signatures: BTreeMap<String, Vec<u8>>,
}

/// Whether the verifiers in `have` satisfy `want`.
pub fn check_quorum(want: &QuorumRequirement, have: &BTreeSet<String>) -> bool {
    let candidates = want
        .candidates
        .iter()
        .filter(|verifier| have.contains(verifier.as_str()))
        .count();
    let subexpressions = want
        .subexpressions
        .iter()
        .filter(|sub| check_quorum(sub, have))
        .count();
    candidates + subexpressions >= want.threshold
}

/// Checks signed epoch heads against a ratification policy.
#[derive(Clone, Debug)]
pub struct RatificationVerifier {
    config: Arc<RatificationConfig>,
}

impl RatificationVerifier {
    /// Verifier over `config`
    pub fn new(config: Arc<RatificationConfig>) -> Self {
        RatificationVerifier { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &Arc<RatificationConfig> {
        &self.config
    }

    /// [`RatificationVerifier::verify_ratifications_at`] the current wall-clock time.
    pub fn verify_ratifications(
        &self,
        ratifications: &[SignedEpochHead],
    ) -> Result<[u8; ROOT_HASH_SIZE], ConsensusError> {
        self.verify_ratifications_at(ratifications, Timestamp::now())
    }

    /// Returns the root hash of the epoch head ratified by `ratifications` if
    /// - every ratification carries the same head,
    /// - the head belongs to the configured realm,
    /// - `now` is not past the head's issue time plus `epoch_time_to_live`,
    /// - the verifiers with a valid signature satisfy the quorum.
    ///
    /// Invalid signatures and signatures by verifiers without a key are ignored.
    pub fn verify_ratifications_at(
        &self,
        ratifications: &[SignedEpochHead],
        now: Timestamp,
    ) -> Result<[u8; ROOT_HASH_SIZE], ConsensusError> {
        let config = &self.config;
        let first = match ratifications.first() {
            Some(first) => &first.head.head,
            None => return Err(ConsensusError::NoValidStatements),
        };

        if ratifications
            .iter()
            .any(|seh| seh.head.head.encoding != first.encoding)
        {
            warn!("ratified epoch heads differ");
            return Err(ConsensusError::EpochHeadMismatch);
        }

        if first.realm != config.realm_name {
            return Err(ConsensusError::RealmMismatch {
                got: first.realm.clone(),
                want: config.realm_name.clone(),
            });
        }

        let expiration = first.issue_time.saturating_add(config.epoch_time_to_live);
        if expiration.is_before(now) {
            return Err(ConsensusError::EpochExpired { expiration, now });
        }

        let mut have = BTreeSet::new();
        for (verifier, key) in config.public_keys.iter() {
            let signed = ratifications.iter().any(|seh| match seh.signatures.get(verifier) {
                Some(sig) => verify_with_key(key, &seh.head.encoding, sig),
                None => false,
            });
            if signed {
                have.insert(verifier.to_string());
            } else {
                debug!(verifier = %verifier, "no valid ratification");
            }
        }

        if let Some(quorum) = &config.quorum {
            if !check_quorum(quorum, &have) {
                return Err(ConsensusError::QuorumNotSatisfied);
            }
        }

        if first.root_hash.len() != ROOT_HASH_SIZE {
            return Err(ConsensusError::MalformedMessage("root hash is not 32 bytes"));
        }
        let mut root_hash = [0u8; ROOT_HASH_SIZE];
        root_hash.copy_from_slice(&first.root_hash);
        Ok(root_hash)
    }
}
