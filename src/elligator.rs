//! Elligator2 map from a uniform 32-byte string to a point of edwards25519, as used by the
//! directory's VRF: the string is mapped to a curve25519 `u` coordinate, moved to the birationally
//! equivalent edwards25519 `y`, and the sign of `x` comes from the string's top bit.
//!
//! See section 5.2 of <http://elligator.cr.yp.to/elligator-20130828.pdf>. This is not constant
//! time and must not be used with secret inputs.
use super::curve::{CurvePoint, CURVE_PARAMS};
use super::errors::VrfError;
use super::field::FieldElement;

/// Map a representative `r` to the curve25519 `u` coordinate `v = -A / (1 + 2r²)` if that is on
/// the curve, and to `-A - v` otherwise. The non-square used by the map is `2`.
pub fn representative_to_montgomery_x(r: &FieldElement) -> Result<FieldElement, VrfError> {
    let a = &CURVE_PARAMS.curve25519.a;
    let one = FieldElement::one();

    let rr = r.square();
    let v = -&(a * &(&(&rr + &rr) + &one).invert()?);

    // e = chi(v³ + A·v² + v)
    let v2 = v.square();
    let v3 = &v2 * &v;
    let e = (&(&v3 + &(a * &v2)) + &v).chi();

    if e == -&one {
        Ok(&(-a) - &v)
    } else {
        Ok(v)
    }
}

/// Birational map from a curve25519 `u` coordinate to the edwards25519 `y = (u - 1) / (u + 1)`.
pub fn montgomery_x_to_edwards_y(x: &FieldElement) -> Result<FieldElement, VrfError> {
    let one = FieldElement::one();
    Ok(&(x - &one) * &(x + &one).invert()?)
}

/// Map 32 bytes to a point of edwards25519. The result may have a small order component; callers
/// clear it by multiplying by the cofactor.
pub fn hash_to_edwards(h: &[u8; 32]) -> Result<CurvePoint, VrfError> {
    let mut hh = *h;
    let parity = hh[31] >> 7;
    hh[31] &= 0x7f;

    let representative = FieldElement::from_bytes_le(&hh);
    let u = representative_to_montgomery_x(&representative)?;
    let y = montgomery_x_to_edwards_y(&u)?;

    Ok(CurvePoint::from_parity_and_y(parity, &y)?)
}
