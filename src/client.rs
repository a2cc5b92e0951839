//! End-to-end lookup: trust a root hash by consensus, then resolve a name under it.
use std::sync::Arc;

use tracing::debug;

use super::config::ClientConfig;
use super::consensus::{ConsensusVerifier, ServerMessageDecoder, SignedServerMessage};
use super::errors::LookupError;
use super::merkle::{LookupProof, MerkleResolver, Profile};
use super::time::Timestamp;

/// What the directory returns for a lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientReply {
    /// Signed statements of the servers about the current state
    pub stated_confirmations: Vec<SignedServerMessage>,
    /// Proof of what the name maps to in that state
    pub lookup_proof: LookupProof,
}

/// Verifying lookup client.
#[derive(Clone, Debug)]
pub struct Client<D> {
    consensus: ConsensusVerifier<D>,
    resolver: MerkleResolver,
}

impl<D: ServerMessageDecoder> Client<D> {
    /// Client for `config`, decoding server statements with `decoder`.
    pub fn new(config: ClientConfig, decoder: D) -> Self {
        Client {
            consensus: ConsensusVerifier::new(Arc::new(config.consensus), decoder),
            resolver: MerkleResolver::new(Arc::new(config.realm)),
        }
    }

    /// [`Client::lookup_from_reply_at`] the current wall-clock time.
    pub fn lookup_from_reply(
        &self,
        name: &str,
        reply: &ClientReply,
    ) -> Result<Option<Profile>, LookupError> {
        self.lookup_from_reply_at(name, reply, Timestamp::now())
    }

    /// The profile of `name` proven by `reply`, `None` if the name is absent or the proof does not
    /// hold, or an error if the servers do not vouch for the state or the profile has expired.
    pub fn lookup_from_reply_at(
        &self,
        name: &str,
        reply: &ClientReply,
        now: Timestamp,
    ) -> Result<Option<Profile>, LookupError> {
        let root_hash = self
            .consensus
            .verify_consensus_at(&reply.stated_confirmations, now)?;
        debug!(root = ?root_hash, "state confirmed by consensus");

        self.resolver
            .resolve_against_root(&root_hash, name, &reply.lookup_proof, now)
    }
}
