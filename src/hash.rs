//! SHAKE256 with a fixed output length, the only hash used by the directory protocol.
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

/// SHAKE256 over the concatenation of `parts`, squeezed to `N` bytes.
pub fn shake256<const N: usize>(parts: &[&[u8]]) -> [u8; N] {
    let mut hasher = Shake256::default();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; N];
    hasher.finalize_xof().read(&mut output);
    output
}
