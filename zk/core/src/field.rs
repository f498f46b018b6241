use crate::{ZkError, ZkResult};
use ark_ff::{BigInteger, PrimeField};

pub use ark_bn254::Fr;

pub const FIELD_BYTES: usize = 32;

/// Big-endian, zero-padded to 32 bytes.
pub fn fr_to_bytes(value: &Fr) -> [u8; FIELD_BYTES] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    let start = FIELD_BYTES.saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(FIELD_BYTES)..]);
    out
}

/// Parses up to 32 big-endian bytes. Values at or above the modulus are
/// rejected rather than reduced.
pub fn fr_from_bytes(bytes: &[u8]) -> ZkResult<Fr> {
    if bytes.len() > FIELD_BYTES {
        return Err(ZkError::Encoding(format!(
            "field element is {} bytes, max {}",
            bytes.len(),
            FIELD_BYTES
        )));
    }
    let mut padded = [0u8; FIELD_BYTES];
    padded[FIELD_BYTES - bytes.len()..].copy_from_slice(bytes);
    let value = Fr::from_be_bytes_mod_order(&padded);
    if fr_to_bytes(&value) != padded {
        return Err(ZkError::OutOfField);
    }
    Ok(value)
}

pub fn fr_to_hex(value: &Fr) -> String {
    hex::encode(fr_to_bytes(value))
}

pub fn fr_from_hex(encoded: &str) -> ZkResult<Fr> {
    let bytes = hex::decode(encoded).map_err(|e| ZkError::Encoding(e.to_string()))?;
    fr_from_bytes(&bytes)
}
