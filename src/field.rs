//! Arithmetic in GF(2^255 - 19), the base field shared by edwards25519 and curve25519.
//!
//! `curve25519-dalek` keeps its field elements private, but the Elligator2 map and the explicit
//! curve-equation check need them, so they are implemented here over `BigUint`. None of this is
//! constant time: it only ever touches public values (hashes of names, public keys, proofs).
use std::ops::{Add, Mul, Neg, Sub};

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::errors::FieldError;

lazy_static! {
    /// q = 2^255 - 19
    pub(crate) static ref MODULUS: BigUint = (BigUint::one() << 255) - 19u32;
    /// sqrt(-1) = 2^((q - 1) / 4)
    static ref SQRT_M1: FieldElement = FieldElement::from(2u64).pow(&((modulus() - 1u32) >> 2));
}

fn modulus() -> &'static BigUint {
    &MODULUS
}

/// Element of GF(q), always fully reduced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The additive identity
    pub fn zero() -> Self {
        FieldElement(BigUint::zero())
    }

    /// The multiplicative identity
    pub fn one() -> Self {
        FieldElement(BigUint::one())
    }

    /// Reduce an arbitrary integer into the field.
    pub fn from_biguint(value: &BigUint) -> Self {
        FieldElement(value % modulus())
    }

    /// Interpret `bytes` as a little-endian integer and reduce it modulo q. Unlike point
    /// decoding, non-canonical inputs are accepted.
    pub fn from_bytes_le(bytes: &[u8]) -> Self {
        Self::from_biguint(&BigUint::from_bytes_le(bytes))
    }

    /// Canonical 32-byte little-endian encoding.
    pub fn to_bytes_le(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = self.0.to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    /// The reduced value
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Whether this is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// "Negative" in the ed25519 sense: the canonical encoding is odd.
    pub fn is_negative(&self) -> bool {
        self.0.bit(0)
    }

    /// `self^2`
    pub fn square(&self) -> Self {
        self * self
    }

    /// `self^exponent`
    pub fn pow(&self, exponent: &BigUint) -> Self {
        FieldElement(self.0.modpow(exponent, modulus()))
    }

    /// Multiplicative inverse, by Fermat: `self^(q - 2)`.
    pub fn invert(&self) -> Result<Self, FieldError> {
        if self.is_zero() {
            return Err(FieldError::NonInvertible);
        }
        Ok(self.pow(&(modulus() - 2u32)))
    }

    /// Quadratic character `self^((q - 1) / 2)`: one for non-zero squares, minus one for
    /// non-squares, zero for zero.
    pub fn chi(&self) -> Self {
        self.pow(&((modulus() - 1u32) >> 1))
    }

    /// A square root of `self`, or `None` if `self` is not a square. Uses q = 5 (mod 8).
    /// The root returned is not normalised to either sign.
    pub fn sqrt(&self) -> Option<Self> {
        let candidate = self.pow(&((modulus() + 3u32) >> 3));
        let check = candidate.square();
        if &check == self {
            Some(candidate)
        } else if check == -self {
            Some(&candidate * &*SQRT_M1)
        } else {
            None
        }
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_biguint(&BigUint::from(value))
    }
}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn add(self, other: &'b FieldElement) -> FieldElement {
        FieldElement((&self.0 + &other.0) % modulus())
    }
}

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn sub(self, other: &'b FieldElement) -> FieldElement {
        // both operands are below q, so adding q first keeps the subtraction unsigned
        FieldElement((modulus() + &self.0 - &other.0) % modulus())
    }
}

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn mul(self, other: &'b FieldElement) -> FieldElement {
        FieldElement((&self.0 * &other.0) % modulus())
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        &FieldElement::zero() - self
    }
}
