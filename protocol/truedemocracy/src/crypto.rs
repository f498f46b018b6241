use crate::error::{Error, Result};
use crate::params::PUB_KEY_LEN;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Message a global key signs to bind a fresh domain key to `caller`.
pub fn onboarding_message(caller: &str, domain: &str, domain_pub_key_hex: &str) -> String {
    format!("ONBOARD:{caller}:{domain}:{domain_pub_key_hex}")
}

/// Payload a domain key signs for one rating.
pub fn vote_payload(domain: &str, issue: &str, suggestion: &str, rating: i32) -> String {
    format!("{domain}|{issue}|{suggestion}|{rating}")
}

pub fn decode_pub_key_hex(encoded: &str) -> Result<[u8; PUB_KEY_LEN]> {
    let bytes = hex::decode(encoded).map_err(|_| Error::invalid("public key is not hex"))?;
    <[u8; PUB_KEY_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| Error::invalid("public key must be 32 bytes"))
}

/// `Ok(false)` for a well-formed but wrong signature; malformed key or
/// signature bytes are `InvalidRequest`.
pub fn verify_signature(
    pub_key: &[u8; PUB_KEY_LEN],
    message: &[u8],
    signature_hex: &str,
) -> Result<bool> {
    let key = VerifyingKey::from_bytes(pub_key)
        .map_err(|_| Error::invalid("public key is not a valid ed25519 point"))?;
    let sig_bytes =
        hex::decode(signature_hex).map_err(|_| Error::invalid("signature is not hex"))?;
    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|_| Error::invalid("signature must be 64 bytes"))?;
    Ok(key.verify(message, &signature).is_ok())
}
