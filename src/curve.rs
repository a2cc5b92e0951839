//! Curve parameters and points on edwards25519.
//!
//! Group operations are delegated to `curve25519-dalek`. What this module adds is the validation
//! a VRF verifier needs on attacker supplied encodings (canonical, not the identity, on the curve,
//! in the prime order subgroup) as checked `Result`s, plus reconstruction of a point from the
//! sign of `x` and a `y` coordinate, which the Elligator2 map ends with.
use curve25519_dalek::{
    constants::{ED25519_BASEPOINT_COMPRESSED, ED25519_BASEPOINT_POINT, X25519_BASEPOINT},
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::{Identity, IsIdentity},
};
use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::One;

use super::constants::POINT_SIZE;
use super::errors::PointError;
use super::field::{FieldElement, MODULUS};

/// The two curve models that take part in verification
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Curve {
    /// Twisted Edwards `a·x² + y² = 1 + b·x²·y²`, with `a = -1` and `b = d`
    Ed25519,
    /// Montgomery `b·v² = u³ + a·u² + u`, with `a = A = 486662` and `b = 1`
    Curve25519,
}

/// Domain parameters of one curve.
#[derive(Clone, Debug)]
pub struct CurveParams {
    /// Which curve model the coefficients belong to
    pub curve: Curve,
    /// Prime modulus of the base field
    pub q: BigUint,
    /// First curve coefficient, see [`Curve`]
    pub a: FieldElement,
    /// Second curve coefficient, see [`Curve`]
    pub b: FieldElement,
    /// Order of the prime order subgroup generated by the base point
    pub order: BigUint,
    /// Encoding of the base point in the curve's usual convention (compressed `y` and sign for
    /// edwards25519, `u` for curve25519)
    pub base: [u8; 32],
}

/// Parameters of both curves
#[derive(Clone, Debug)]
pub struct Curves {
    /// edwards25519
    pub ed25519: CurveParams,
    /// curve25519
    pub curve25519: CurveParams,
}

lazy_static! {
    /// Process-wide curve constants, computed once and never mutated.
    pub static ref CURVE_PARAMS: Curves = {
        let q = MODULUS.clone();
        // l = 2^252 + 27742317777372353535851937790883648493
        let order: BigUint = (BigUint::one() << 252u32)
            + BigUint::from(27_742_317_777_372_353_535_851_937_790_883_648_493u128);
        // d = -121665 / 121666, 121666 is non-zero so Fermat inversion is total here
        let d = &-&FieldElement::from(121_665) * &FieldElement::from(121_666).pow(&(&q - 2u32));

        Curves {
            ed25519: CurveParams {
                curve: Curve::Ed25519,
                q: q.clone(),
                a: -&FieldElement::one(),
                b: d,
                order: order.clone(),
                base: ED25519_BASEPOINT_COMPRESSED.to_bytes(),
            },
            curve25519: CurveParams {
                curve: Curve::Curve25519,
                q,
                a: FieldElement::from(486_662),
                b: FieldElement::one(),
                order,
                base: X25519_BASEPOINT.to_bytes(),
            },
        }
    };
}

lazy_static! {
    /// Affine coordinates of the base point, `y = 4/5` and the even `x`.
    static ref BASEPOINT_AFFINE: (FieldElement, FieldElement) = (
        FieldElement::from_bytes_le(&BASEPOINT_X),
        split_encoding(ED25519_BASEPOINT_COMPRESSED.to_bytes()).1,
    );
}

const BASEPOINT_X: [u8; 32] = [
    0x1a, 0xd5, 0x25, 0x8f, 0x60, 0x2d, 0x56, 0xc9, 0xb2, 0xa7, 0x25, 0x95, 0x60, 0xc7, 0x2c, 0x69,
    0x5c, 0xdc, 0xd6, 0xfd, 0x31, 0xe2, 0xa4, 0xc0, 0xfe, 0x53, 0x6e, 0xcd, 0xd3, 0x36, 0x69, 0x21,
];

/// Split a compressed encoding into the sign bit of `x` and `y`.
fn split_encoding(mut bytes: [u8; POINT_SIZE]) -> (u8, FieldElement) {
    let sign = bytes[31] >> 7;
    bytes[31] &= 0x7f;
    (sign, FieldElement::from_bytes_le(&bytes))
}

/// Reduce an integer modulo the group order into a dalek `Scalar`. Multiplying a point of the
/// prime order subgroup by the result is the same as multiplying it by `value`.
pub fn scalar_from_biguint(value: &BigUint) -> Scalar {
    let reduced = value % &CURVE_PARAMS.ed25519.order;
    let mut bytes = [0u8; 32];
    let le = reduced.to_bytes_le();
    bytes[..le.len()].copy_from_slice(&le);
    Scalar::from_bytes_mod_order(bytes)
}

/// A point on edwards25519.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CurvePoint(EdwardsPoint);

impl CurvePoint {
    /// The standard base point `B`
    pub fn basepoint() -> Self {
        CurvePoint(ED25519_BASEPOINT_POINT)
    }

    /// The neutral element
    pub fn identity() -> Self {
        CurvePoint(EdwardsPoint::identity())
    }

    /// Decode a compressed point. Fails on a wrong length or when no point has this encoding.
    /// Non-canonical encodings are accepted, see [`CurvePoint::from_bytes_base_group`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        if bytes.len() != POINT_SIZE {
            return Err(PointError::InvalidLength {
                expected: POINT_SIZE,
                got: bytes.len(),
            });
        }
        CompressedEdwardsY::from_slice(bytes)
            .decompress()
            .map(CurvePoint)
            .ok_or(PointError::DecompressionFailed)
    }

    /// Decode a point and check that it is a valid public value: canonically encoded, not the
    /// identity, on the curve, and `n·P` is the identity for the group order `n`. The curve
    /// equation is checked on coordinates recovered through the group law, see
    /// [`CurvePoint::affine`].
    pub fn from_bytes_base_group(bytes: &[u8]) -> Result<Self, PointError> {
        let point = Self::from_bytes(bytes)?;

        if point.to_bytes()[..] != bytes[..] {
            return Err(PointError::NonCanonical);
        }
        if point.is_identity() {
            return Err(PointError::Identity);
        }
        if !point.is_on_curve() {
            return Err(PointError::NotOnCurve);
        }
        if !point.0.is_torsion_free() {
            return Err(PointError::NotInPrimeOrderSubgroup);
        }

        Ok(point)
    }

    /// Reconstruct the point with the given `y` whose `x` has parity `parity` (0 or 1).
    pub fn from_parity_and_y(parity: u8, y: &FieldElement) -> Result<Self, PointError> {
        let mut bytes = y.to_bytes_le();
        bytes[31] |= (parity & 1) << 7;

        // decompression fails exactly when no curve point has this y
        Self::from_bytes(&bytes).map_err(|_| PointError::NotOnCurve)
    }

    /// Canonical compressed encoding
    pub fn to_bytes(&self) -> [u8; POINT_SIZE] {
        self.0.compress().to_bytes()
    }

    /// Affine `(x, y)` coordinates.
    ///
    /// `y` is read from the encoding. `x` is not solved from the curve equation: with
    /// `s = y·y_B` and `t = x·x_B`, the addition law gives
    /// `y(P + B)·(1 - d·s·t) = s + t`, which is solved for `t` using the `y` of `P + B` as
    /// computed by the group arithmetic. `P - B` is the fallback when that equation is
    /// degenerate.
    pub fn affine(&self) -> Option<(FieldElement, FieldElement)> {
        let (_, y) = split_encoding(self.to_bytes());
        let one = FieldElement::one();
        let s = &y * &BASEPOINT_AFFINE.1;
        let k = &CURVE_PARAMS.ed25519.b * &s;

        let sum = self.0 + ED25519_BASEPOINT_POINT;
        let diff = self.0 - ED25519_BASEPOINT_POINT;
        let (_, y_sum) = split_encoding(sum.compress().to_bytes());
        let (_, y_diff) = split_encoding(diff.compress().to_bytes());
        // t·(1 + k·y(P + B)) = y(P + B) - s and t·(1 + k·y(P - B)) = s - y(P - B)
        let t = match (&one + &(&k * &y_sum)).invert() {
            Ok(inv) => &(&y_sum - &s) * &inv,
            Err(_) => &(&s - &y_diff) * &(&one + &(&k * &y_diff)).invert().ok()?,
        };
        let x = &t * &BASEPOINT_AFFINE.0.invert().ok()?;
        Some((x, y))
    }

    /// Evaluate the twisted Edwards equation on the affine coordinates, and check that the sign
    /// of `x` is the one in the encoding.
    pub fn is_on_curve(&self) -> bool {
        let params = &CURVE_PARAMS.ed25519;
        let (sign, _) = split_encoding(self.to_bytes());
        match self.affine() {
            Some((x, y)) => {
                if !x.is_zero() && x.is_negative() != (sign == 1) {
                    return false;
                }
                let x2 = x.square();
                let y2 = y.square();
                let lhs = &(&params.a * &x2) + &y2;
                let rhs = &FieldElement::one() + &(&params.b * &(&x2 * &y2));
                lhs == rhs
            }
            None => false,
        }
    }

    /// Whether this is the point at infinity (the neutral element)
    pub fn is_identity(&self) -> bool {
        self.0.is_identity()
    }

    /// Group addition
    pub fn add(&self, other: &CurvePoint) -> CurvePoint {
        CurvePoint(self.0 + other.0)
    }

    /// `self + self`
    pub fn double(&self) -> CurvePoint {
        self.add(self)
    }

    /// Additive inverse
    pub fn negate(&self) -> CurvePoint {
        CurvePoint(-self.0)
    }

    /// Variable time scalar multiplication by an arbitrary non-negative integer. The scalar is
    /// not reduced, so this is exact for points outside the prime order subgroup too.
    pub fn multiply(&self, scalar: &BigUint) -> CurvePoint {
        if scalar.bits() < 255 {
            let mut bytes = [0u8; 32];
            let le = scalar.to_bytes_le();
            bytes[..le.len()].copy_from_slice(&le);
            return CurvePoint(Scalar::from_bits(bytes) * self.0);
        }

        let mut acc = EdwardsPoint::identity();
        for i in (0..scalar.bits()).rev() {
            acc = acc + acc;
            if scalar.bit(i) {
                acc = acc + self.0;
            }
        }
        CurvePoint(acc)
    }

    /// Variable time `a·A + b·B`, where `B` is the base point.
    pub fn double_scalar_mul_basepoint(a: &Scalar, A: &CurvePoint, b: &Scalar) -> CurvePoint {
        CurvePoint(EdwardsPoint::vartime_double_scalar_mul_basepoint(a, &A.0, b))
    }

    /// The underlying dalek point
    pub fn as_edwards(&self) -> &EdwardsPoint {
        &self.0
    }
}

impl From<EdwardsPoint> for CurvePoint {
    fn from(point: EdwardsPoint) -> Self {
        CurvePoint(point)
    }
}
