//! Verifier configuration. Every value here is immutable once built; verifiers hold it behind an
//! `Arc`, so refreshing the server keys means building a new configuration.
use std::collections::BTreeMap;
use std::time::Duration;

use ed25519_dalek::PublicKey;

use super::constants::PUBLIC_KEY_SIZE;
use super::errors::ConfigError;

/// Known Ed25519 public keys of the directory servers, by server identifier.
#[derive(Clone, Debug, Default)]
pub struct ServerKeys(BTreeMap<String, PublicKey>);

impl ServerKeys {
    /// Register the key of `server`. Fails if `key` is not a valid Ed25519 public key.
    pub fn insert(&mut self, server: &str, key: &[u8]) -> Result<&mut Self, ConfigError> {
        if key.len() != PUBLIC_KEY_SIZE {
            return Err(ConfigError::InvalidServerKey(server.to_string()));
        }
        let key = PublicKey::from_bytes(key)
            .map_err(|_| ConfigError::InvalidServerKey(server.to_string()))?;
        self.0.insert(server.to_string(), key);
        Ok(self)
    }

    /// The key of `server`, if known
    pub fn get(&self, server: &str) -> Option<&PublicKey> {
        self.0.get(server)
    }

    /// Number of known servers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no server is known
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Known servers and their keys, ordered by identifier
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PublicKey)> {
        self.0.iter().map(|(server, key)| (server.as_str(), key))
    }
}

/// Parameters of the consensus and freshness check.
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// How long after its timestamp a server statement still counts as fresh
    pub freshness_threshold: Duration,
    /// Distinct servers that must have made a fresh statement
    pub freshness_signatures_required: usize,
    /// Distinct servers that must agree on the state
    pub consensus_signatures_required: usize,
    /// Keys statements are checked against
    pub server_keys: ServerKeys,
}

impl ConsensusConfig {
    /// Build a configuration and check it with [`ConsensusConfig::validate`].
    pub fn new(
        freshness_threshold: Duration,
        freshness_signatures_required: usize,
        consensus_signatures_required: usize,
        server_keys: ServerKeys,
    ) -> Result<Self, ConfigError> {
        let config = ConsensusConfig {
            freshness_threshold,
            freshness_signatures_required,
            consensus_signatures_required,
            server_keys,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that the known servers can never meet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let servers = self.server_keys.len();
        if self.consensus_signatures_required > servers {
            return Err(ConfigError::UnreachableThreshold {
                kind: "consensus",
                required: self.consensus_signatures_required,
                servers,
            });
        }
        if self.freshness_signatures_required > servers {
            return Err(ConfigError::UnreachableThreshold {
                kind: "freshness",
                required: self.freshness_signatures_required,
                servers,
            });
        }
        Ok(())
    }
}

/// Parameters of the realm a name is looked up in.
#[derive(Clone, Debug)]
pub struct RealmConfig {
    /// VRF public key binding names to tree indices
    pub vrf_public: [u8; PUBLIC_KEY_SIZE],
    /// Nonce mixed into every node hash of the tree
    pub tree_nonce: Vec<u8>,
}

/// Nested threshold over verifier identifiers: satisfied when at least `threshold` of the
/// candidates ratified, counting every satisfied subexpression as one more.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuorumRequirement {
    /// How many candidates and subexpressions must be satisfied
    pub threshold: usize,
    /// Verifiers that count directly
    pub candidates: Vec<String>,
    /// Nested requirements that count as one each
    pub subexpressions: Vec<QuorumRequirement>,
}

impl QuorumRequirement {
    /// Every candidate named here or in a subexpression
    pub fn verifiers(&self) -> Vec<&str> {
        let mut verifiers: Vec<&str> = self.candidates.iter().map(String::as_str).collect();
        for sub in &self.subexpressions {
            verifiers.extend(sub.verifiers());
        }
        verifiers
    }

    fn validate(&self, keys: &ServerKeys) -> Result<(), ConfigError> {
        let parts = self.candidates.len() + self.subexpressions.len();
        if self.threshold > parts {
            return Err(ConfigError::UnreachableThreshold {
                kind: "quorum",
                required: self.threshold,
                servers: parts,
            });
        }
        if let Some(unknown) = self.candidates.iter().find(|c| keys.get(c).is_none()) {
            return Err(ConfigError::UnknownVerifier(unknown.clone()));
        }
        self.subexpressions
            .iter()
            .try_for_each(|sub| sub.validate(keys))
    }
}

/// Parameters of the ratification check on signed epoch heads.
#[derive(Clone, Debug)]
pub struct RatificationConfig {
    /// Realm every ratified head must belong to
    pub realm_name: String,
    /// How long after its issue time an epoch head may still be used
    pub epoch_time_to_live: Duration,
    /// Keys of the verifiers
    pub public_keys: ServerKeys,
    /// Who must have signed. `None` puts no requirement on the signatures.
    pub quorum: Option<QuorumRequirement>,
}

impl RatificationConfig {
    /// Build a configuration and check it with [`RatificationConfig::validate`].
    pub fn new(
        realm_name: &str,
        epoch_time_to_live: Duration,
        public_keys: ServerKeys,
        quorum: Option<QuorumRequirement>,
    ) -> Result<Self, ConfigError> {
        let config = RatificationConfig {
            realm_name: realm_name.to_string(),
            epoch_time_to_live,
            public_keys,
            quorum,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject quorums naming verifiers without a key, or with thresholds they cannot meet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.quorum {
            Some(quorum) => quorum.validate(&self.public_keys),
            None => Ok(()),
        }
    }
}

/// Everything a lookup client needs
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Consensus and freshness parameters
    pub consensus: ConsensusConfig,
    /// Realm parameters
    pub realm: RealmConfig,
}
