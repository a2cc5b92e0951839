//! Verification of the directory's VRF, which maps a name to its index in the key tree.
//!
//! The construction is the one of the CONIKS/coname Go implementation: an EC-VRF over
//! edwards25519 with SHAKE256 as hash and Elligator2 as hash-to-curve. A proof is
//! `c || t || ii`, where `c` and `t` are little-endian integers and `ii` is the compressed
//! intermediate point `x·H(m)`. The VRF output is `SHAKE256(ii || m)`.
#![allow(non_snake_case)]

use curve25519_dalek::scalar::Scalar;
use num_bigint::BigUint;
use tracing::trace;

use super::constants::*;
use super::curve::{scalar_from_biguint, CurvePoint, CURVE_PARAMS};
use super::elligator::hash_to_edwards;
use super::errors::VrfError;
use super::hash::shake256;

/// VRF proof, which is formed by two integers and an encoded point
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VrfProof {
    c: BigUint,
    t: BigUint,
    ii_bytes: [u8; INTERMEDIATE_SIZE],
}

impl VrfProof {
    /// Parse a proof from exactly `PROOF_SIZE` bytes. The point is not decoded here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VrfError> {
        if bytes.len() != PROOF_SIZE {
            return Err(VrfError::InvalidLength {
                expected: PROOF_SIZE,
                got: bytes.len(),
            });
        }
        let mut ii_bytes = [0u8; INTERMEDIATE_SIZE];
        ii_bytes.copy_from_slice(&bytes[64..]);

        Ok(Self {
            c: BigUint::from_bytes_le(&bytes[..32]),
            t: BigUint::from_bytes_le(&bytes[32..64]),
            ii_bytes,
        })
    }

    /// The Fiat-Shamir challenge `c`
    pub fn challenge(&self) -> &BigUint {
        &self.c
    }

    /// The response `t`
    pub fn response(&self) -> &BigUint {
        &self.t
    }

    /// The encoded intermediate point `ii`
    pub fn intermediate(&self) -> &[u8; INTERMEDIATE_SIZE] {
        &self.ii_bytes
    }

    /// The VRF output this proof commits to, `SHAKE256(ii || m)`.
    pub fn output(&self, m: &[u8]) -> [u8; VRF_SIZE] {
        shake256(&[&self.ii_bytes[..], m])
    }

    /// Check the proof against public key `pk`, message `m` and claimed output `vrf`.
    /// - Recompute the output from `ii` and compare it with `vrf`
    /// - Decode `P = pk` and `ii`, both must be valid prime order points
    /// - `A = c·P + t·B`, `B' = c·ii + t·H(m)`
    /// - Recompute the challenge `SHAKE256(A || B' || m) mod l` and compare it with `c`
    pub fn verify(&self, pk: &[u8], m: &[u8], vrf: &[u8]) -> Result<(), VrfError> {
        if pk.len() != PUBLIC_KEY_SIZE {
            return Err(VrfError::InvalidLength {
                expected: PUBLIC_KEY_SIZE,
                got: pk.len(),
            });
        }
        if self.output(m)[..] != vrf[..] {
            return Err(VrfError::VerificationFailed);
        }

        let P = CurvePoint::from_bytes_base_group(pk)?;
        let ii = CurvePoint::from_bytes_base_group(&self.ii_bytes)?;

        // every point below is in the prime order subgroup, so reducing the scalars is exact
        let c = scalar_from_biguint(&self.c);
        let t = scalar_from_biguint(&self.t);

        let A = CurvePoint::double_scalar_mul_basepoint(&c, &P, &t);

        let hm = hash_to_curve(m)?;
        // B' is computed with zero base point scalars, these terms contribute nothing
        let hmtP = CurvePoint::double_scalar_mul_basepoint(&t, &hm, &Scalar::zero());
        let iicP = CurvePoint::double_scalar_mul_basepoint(&c, &ii, &Scalar::zero());
        let B = iicP.add(&hmtP);

        let cH: [u8; 64] = shake256(&[&A.to_bytes()[..], &B.to_bytes()[..], m]);
        let c_ref = BigUint::from_bytes_le(&cH) % &CURVE_PARAMS.ed25519.order;

        if c_ref == self.c {
            Ok(())
        } else {
            Err(VrfError::VerificationFailed)
        }
    }
}

/// Hash a message to a point of the prime order subgroup: Elligator2 on `SHAKE256(m)`, then
/// clear the cofactor with three doublings.
pub fn hash_to_curve(m: &[u8]) -> Result<CurvePoint, VrfError> {
    let hmb: [u8; 32] = shake256(&[m]);
    let hm = hash_to_edwards(&hmb)?;
    Ok(hm.double().double().double())
}

/// Returns true iff `proof` shows that `vrf` is the VRF output of message `m` under public key
/// `pk`. Never panics and never errors: malformed input of any kind is simply not valid.
pub fn verify(pk: &[u8], m: &[u8], vrf: &[u8], proof: &[u8]) -> bool {
    if proof.len() != PROOF_SIZE || vrf.len() != VRF_SIZE || pk.len() != PUBLIC_KEY_SIZE {
        return false;
    }

    match VrfProof::from_bytes(proof).and_then(|proof| proof.verify(pk, m, vrf)) {
        Ok(()) => true,
        Err(err) => {
            trace!(reason = %err, "VRF proof rejected");
            false
        }
    }
}
