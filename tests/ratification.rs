mod common;

use common::*;
use coname_verify::{
    ConsensusError, EpochHead, MerkleResolver, QuorumRequirement, RatificationConfig,
    RatificationVerifier, SignedEpochHead, Timestamp, TimestampedEpochHead,
};
use ed25519_dalek::Signer;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const REALM: &str = "example.com";
const ROOT: [u8; 32] = [0x42; 32];
const NOW: Timestamp = Timestamp::from_nanos(1_700_000_000 * SECOND);
const TTL: Duration = Duration::from_secs(3600);

fn quorum(
    threshold: usize,
    candidates: &[&str],
    subexpressions: Vec<QuorumRequirement>,
) -> QuorumRequirement {
    QuorumRequirement {
        threshold,
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
        subexpressions,
    }
}

fn verifier(quorum: Option<QuorumRequirement>) -> RatificationVerifier {
    let config = RatificationConfig::new(REALM, TTL, server_keys(), quorum).unwrap();
    RatificationVerifier::new(Arc::new(config))
}

fn head(realm: &str, root: &[u8], issue_time: Timestamp) -> EpochHead {
    let encoding = [
        realm.as_bytes(),
        &[0u8][..],
        root,
        &issue_time.as_nanos().to_le_bytes()[..],
    ]
    .concat();
    EpochHead {
        realm: realm.to_string(),
        epoch: 7,
        root_hash: root.to_vec(),
        issue_time,
        previous_summary_hash: vec![0x11; 64],
        encoding,
    }
}

/// `head` stamped and signed by the servers at `signers` (indices into `SERVERS`).
fn ratified(head: &EpochHead, signers: &[usize]) -> SignedEpochHead {
    let encoding = [&head.encoding[..], &b"ts"[..]].concat();
    let signatures: BTreeMap<_, _> = signers
        .iter()
        .map(|&i| {
            let sig = server_keypair(i as u8 + 1).sign(&encoding).to_bytes().to_vec();
            (SERVERS[i].to_string(), sig)
        })
        .collect();
    SignedEpochHead {
        head: TimestampedEpochHead {
            head: head.clone(),
            timestamp: head.issue_time,
            encoding,
        },
        signatures,
    }
}

fn issued_seconds_ago(secs: i64) -> Timestamp {
    Timestamp::from_nanos(NOW.as_nanos() - secs * SECOND)
}

#[test]
fn all_verifiers_ratified() {
    let head = head(REALM, &ROOT, issued_seconds_ago(60));
    let sehs = vec![ratified(&head, &[0]), ratified(&head, &[1, 2])];
    let all = quorum(3, &SERVERS, vec![]);
    assert_eq!(verifier(Some(all)).verify_ratifications_at(&sehs, NOW), Ok(ROOT));
}

#[test]
fn nested_quorum() {
    // alpha, plus one of beta or gamma
    let want = quorum(2, &["alpha"], vec![quorum(1, &["beta", "gamma"], vec![])]);
    let head = head(REALM, &ROOT, issued_seconds_ago(60));

    let alpha_gamma = vec![ratified(&head, &[0, 2])];
    assert_eq!(
        verifier(Some(want.clone())).verify_ratifications_at(&alpha_gamma, NOW),
        Ok(ROOT)
    );

    let beta_gamma = vec![ratified(&head, &[1]), ratified(&head, &[2])];
    assert_eq!(
        verifier(Some(want)).verify_ratifications_at(&beta_gamma, NOW),
        Err(ConsensusError::QuorumNotSatisfied)
    );
}

#[test]
fn no_quorum_configured() {
    let head = head(REALM, &ROOT, issued_seconds_ago(60));
    let unsigned = vec![ratified(&head, &[])];
    assert_eq!(verifier(None).verify_ratifications_at(&unsigned, NOW), Ok(ROOT));
}

#[test]
fn other_realm() {
    let head = head("evil.example", &ROOT, issued_seconds_ago(60));
    let sehs = vec![ratified(&head, &[0, 1, 2])];
    assert_eq!(
        verifier(None).verify_ratifications_at(&sehs, NOW),
        Err(ConsensusError::RealmMismatch {
            got: "evil.example".to_string(),
            want: REALM.to_string(),
        })
    );
}

#[test]
fn expired_epoch() {
    let ttl_secs = TTL.as_secs() as i64;

    let at_expiry = head(REALM, &ROOT, issued_seconds_ago(ttl_secs));
    let sehs = vec![ratified(&at_expiry, &[0, 1, 2])];
    assert_eq!(verifier(None).verify_ratifications_at(&sehs, NOW), Ok(ROOT));

    let issue_time = Timestamp::from_nanos(NOW.as_nanos() - ttl_secs * SECOND - 1);
    let expired = head(REALM, &ROOT, issue_time);
    let sehs = vec![ratified(&expired, &[0, 1, 2])];
    assert_eq!(
        verifier(None).verify_ratifications_at(&sehs, NOW),
        Err(ConsensusError::EpochExpired {
            expiration: Timestamp::from_nanos(NOW.as_nanos() - 1),
            now: NOW,
        })
    );
}

#[test]
fn differing_heads() {
    let one = head(REALM, &ROOT, issued_seconds_ago(60));
    let other = head(REALM, &[0x24; 32], issued_seconds_ago(60));
    let sehs = vec![ratified(&one, &[0]), ratified(&other, &[1])];
    assert_eq!(
        verifier(None).verify_ratifications_at(&sehs, NOW),
        Err(ConsensusError::EpochHeadMismatch)
    );
}

#[test]
fn no_ratifications() {
    assert_eq!(
        verifier(None).verify_ratifications_at(&[], NOW),
        Err(ConsensusError::NoValidStatements)
    );
}

#[test]
fn bad_signatures_do_not_count() {
    let want = quorum(2, &SERVERS, vec![]);
    let head = head(REALM, &ROOT, issued_seconds_ago(60));

    let mut forged = ratified(&head, &[0, 1]);
    let beta_sig = forged.signatures.get_mut("beta").unwrap();
    beta_sig[0] ^= 1;
    assert_eq!(
        verifier(Some(want.clone())).verify_ratifications_at(&[forged.clone()], NOW),
        Err(ConsensusError::QuorumNotSatisfied)
    );

    // a valid signature elsewhere makes up for it
    let sehs = vec![forged, ratified(&head, &[2])];
    assert_eq!(verifier(Some(want)).verify_ratifications_at(&sehs, NOW), Ok(ROOT));
}

#[test]
fn short_root_hash() {
    let head = head(REALM, &ROOT[..16], issued_seconds_ago(60));
    let sehs = vec![ratified(&head, &[0, 1, 2])];
    assert!(matches!(
        verifier(None).verify_ratifications_at(&sehs, NOW),
        Err(ConsensusError::MalformedMessage(_))
    ));
}

#[test]
fn ratified_root_resolves_names() {
    let vrf = TestVrf::from_seed(9);
    let expiration = Timestamp::from_nanos(NOW.as_nanos() + 86_400 * SECOND);
    let (proof, root) = presence_proof(&vrf, "alice@example.com", profile(expiration), vec![
        Some([0x55; 32]),
        None,
    ]);

    let head = head(REALM, &root, issued_seconds_ago(60));
    let sehs = vec![ratified(&head, &[0, 1])];
    let want = quorum(2, &SERVERS, vec![]);
    let ratified_root = verifier(Some(want))
        .verify_ratifications_at(&sehs, NOW)
        .unwrap();

    let resolver = MerkleResolver::new(Arc::new(client_config(&vrf).realm));
    assert_eq!(
        resolver.resolve_against_root(&ratified_root, "alice@example.com", &proof, NOW),
        Ok(Some(profile(expiration)))
    );
}
