#![allow(dead_code)]
use coname_verify::hash::shake256;
use coname_verify::merkle::{recompute_root, Entry, LookupProof, NodeHash, Profile, TreeProof};
use coname_verify::vrf::hash_to_curve;
use coname_verify::{
    ClientConfig, ConsensusConfig, DecodeError, RealmConfig, ServerKeys, ServerMessage,
    ServerMessageDecoder, SignedServerMessage, Timestamp,
};
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;

pub const TREE_NONCE: &[u8] = b"test realm tree nonce";
pub const SECOND: i64 = 1_000_000_000;

/// VRF prover of the directory, only needed to produce fixtures.
pub struct TestVrf {
    secret: Scalar,
    pub public: [u8; 32],
}

impl TestVrf {
    pub fn from_seed(seed: u8) -> Self {
        let secret = Scalar::random(&mut ChaCha20Rng::from_seed([seed; 32]));
        let public = (&secret * &ED25519_BASEPOINT_TABLE).compress().to_bytes();
        TestVrf { secret, public }
    }

    /// Returns `(vrf, proof)` for `m`.
    pub fn prove(&self, m: &[u8]) -> ([u8; 32], Vec<u8>) {
        let hm = *hash_to_curve(m).unwrap().as_edwards();
        let ii = (self.secret * hm).compress().to_bytes();

        let r_hash: [u8; 64] = shake256(&[&self.secret.to_bytes()[..], m]);
        let r = Scalar::from_bytes_mod_order_wide(&r_hash);
        let gr = (&r * &ED25519_BASEPOINT_TABLE).compress().to_bytes();
        let hr = (r * hm).compress().to_bytes();

        let c_hash: [u8; 64] = shake256(&[&gr[..], &hr[..], m]);
        let c = Scalar::from_bytes_mod_order_wide(&c_hash);
        let t = r - c * self.secret;

        let proof = [&c.to_bytes()[..], &t.to_bytes()[..], &ii[..]].concat();
        let vrf: [u8; 32] = shake256(&[&ii[..], m]);
        (vrf, proof)
    }
}

pub fn server_keypair(seed: u8) -> Keypair {
    let secret = SecretKey::from_bytes(&[seed; 32]).unwrap();
    let public = PublicKey::from(&secret);
    Keypair { secret, public }
}

/// Length-prefixed stand-in for the wire encoding of a `ServerMessage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestCodec;

fn encode_field(out: &mut Vec<u8>, field: Option<&[u8]>) {
    match field {
        Some(bytes) => {
            out.push(1);
            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
        }
        None => out.push(0),
    }
}

fn decode_field<'a>(bytes: &mut &'a [u8]) -> Result<Option<&'a [u8]>, DecodeError> {
    let truncated = || DecodeError::Malformed("truncated".to_string());
    let (&present, rest) = bytes.split_first().ok_or_else(truncated)?;
    if present == 0 {
        *bytes = rest;
        return Ok(None);
    }
    let (&len, rest) = rest.split_first().ok_or_else(truncated)?;
    if rest.len() < len as usize {
        return Err(truncated());
    }
    let (field, rest) = rest.split_at(len as usize);
    *bytes = rest;
    Ok(Some(field))
}

impl TestCodec {
    pub fn encode(msg: &ServerMessage) -> Vec<u8> {
        let mut out = Vec::new();
        encode_field(&mut out, msg.server.as_ref().map(|s| s.as_bytes()));
        encode_field(&mut out, msg.hash_of_state.as_deref());
        out.extend_from_slice(&msg.time.as_nanos().to_le_bytes());
        out
    }
}

impl ServerMessageDecoder for TestCodec {
    fn decode(&self, mut bytes: &[u8]) -> Result<ServerMessage, DecodeError> {
        let server = decode_field(&mut bytes)?
            .map(|s| String::from_utf8(s.to_vec()))
            .transpose()
            .map_err(|_| DecodeError::Malformed("server is not UTF-8".to_string()))?;
        let hash_of_state = decode_field(&mut bytes)?.map(|h| h.to_vec());
        if bytes.len() != 8 {
            return Err(DecodeError::Malformed("bad timestamp".to_string()));
        }
        let mut time = [0u8; 8];
        time.copy_from_slice(bytes);
        Ok(ServerMessage {
            server,
            hash_of_state,
            time: Timestamp::from_nanos(i64::from_le_bytes(time)),
        })
    }
}

/// Statement by `server` about `hash_of_state` at `time`, signed with `keypair`.
pub fn signed_statement(
    keypair: &Keypair,
    server: &str,
    hash_of_state: &[u8],
    time: Timestamp,
) -> SignedServerMessage {
    let message = TestCodec::encode(&ServerMessage {
        server: Some(server.to_string()),
        hash_of_state: Some(hash_of_state.to_vec()),
        time,
    });
    sign_message(keypair, server, message)
}

pub fn sign_message(keypair: &Keypair, server: &str, message: Vec<u8>) -> SignedServerMessage {
    let signed = [&b"msg\x00"[..], &message[..]].concat();
    let signature = keypair.sign(&signed).to_bytes().to_vec();
    SignedServerMessage {
        server: Some(server.to_string()),
        message: Some(message),
        signature: Some(signature),
    }
}

pub const SERVERS: [&str; 3] = ["alpha", "beta", "gamma"];

/// Keys of `SERVERS`, seeded 1, 2 and 3
pub fn server_keys() -> ServerKeys {
    let mut keys = ServerKeys::default();
    for (i, server) in SERVERS.iter().enumerate() {
        keys.insert(server, server_keypair(i as u8 + 1).public.as_bytes())
            .unwrap();
    }
    keys
}

/// Two fresh signatures out of two agreeing servers, fresh for one minute.
pub fn consensus_config() -> ConsensusConfig {
    ConsensusConfig::new(Duration::from_secs(60), 2, 2, server_keys()).unwrap()
}

pub fn client_config(vrf: &TestVrf) -> ClientConfig {
    ClientConfig {
        consensus: consensus_config(),
        realm: RealmConfig {
            vrf_public: vrf.public,
            tree_nonce: TREE_NONCE.to_vec(),
        },
    }
}

pub fn profile(expiration: Timestamp) -> Profile {
    let mut keys = BTreeMap::new();
    keys.insert("pgp".to_string(), b"-----BEGIN PGP PUBLIC KEY BLOCK-----".to_vec());
    Profile {
        encoding: b"\x0a\x10profile nonce 01\x12\x03pgp".to_vec(),
        expiration_time: expiration,
        keys,
    }
}

/// Proof that `name` maps to `profile` in a tree where it sits `neighbors.len()` levels deep.
/// Returns the proof and the root hash of that tree.
pub fn presence_proof(
    vrf: &TestVrf,
    name: &str,
    profile: Profile,
    neighbors: Vec<Option<NodeHash>>,
) -> (LookupProof, NodeHash) {
    let (index, index_proof) = vrf.prove(name.as_bytes());
    let commitment: [u8; 64] = shake256(&[&profile.encoding[..]]);
    let entry = Entry {
        encoding: [&b"entry:"[..], &commitment[..]].concat(),
        profile_commitment: commitment.to_vec(),
    };
    let entry_hash: NodeHash = shake256(&[&entry.encoding[..]]);
    let tree_proof = TreeProof {
        neighbors,
        existing_index: Some(index),
        existing_entry_hash: Some(entry_hash),
    };
    let root = recompute_root(TREE_NONCE, &index, &tree_proof).unwrap();
    let proof = LookupProof {
        user_id: name.to_string(),
        index,
        index_proof,
        tree_proof,
        entry: Some(entry),
        profile: Some(profile),
    };
    (proof, root)
}

/// Proof that `name` is absent, its path ending in an empty branch.
pub fn absence_proof(
    vrf: &TestVrf,
    name: &str,
    neighbors: Vec<Option<NodeHash>>,
) -> (LookupProof, NodeHash) {
    let (index, index_proof) = vrf.prove(name.as_bytes());
    let tree_proof = TreeProof {
        neighbors,
        existing_index: None,
        existing_entry_hash: None,
    };
    let root = recompute_root(TREE_NONCE, &index, &tree_proof).unwrap();
    let proof = LookupProof {
        user_id: name.to_string(),
        index,
        index_proof,
        tree_proof,
        entry: None,
        profile: None,
    };
    (proof, root)
}
