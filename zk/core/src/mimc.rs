//! MiMC-x⁵ block cipher over the BN254 scalar field in Miyaguchi–Preneel
//! mode. The circuit gadget consumes [`round_constants`] directly, so the
//! native and in-circuit digests agree for every input.

use crate::field::{fr_from_bytes, fr_to_bytes, Fr, FIELD_BYTES};
use crate::ZkResult;
use ark_ff::{Field, PrimeField, Zero};
use std::sync::OnceLock;

pub const MIMC_ROUNDS: usize = 110;

const CONSTANTS_SEED: &[u8] = b"truedemocracy/mimc-bn254/x5";

static CONSTANTS: OnceLock<Vec<Fr>> = OnceLock::new();

/// `c_i = blake3(seed ‖ i) mod p` for `i in 0..MIMC_ROUNDS`.
pub fn round_constants() -> &'static [Fr] {
    CONSTANTS.get_or_init(|| {
        (0..MIMC_ROUNDS as u32)
            .map(|i| {
                let mut hasher = blake3::Hasher::new();
                hasher.update(CONSTANTS_SEED);
                hasher.update(&i.to_be_bytes());
                Fr::from_be_bytes_mod_order(hasher.finalize().as_bytes())
            })
            .collect()
    })
}

fn encrypt(key: Fr, message: Fr) -> Fr {
    let mut x = message;
    for c in round_constants() {
        let t = x + key + c;
        let t2 = t.square();
        x = t2.square() * t;
    }
    x + key
}

/// `h₀ = 0`, `hᵢ = E_{hᵢ₋₁}(mᵢ) + hᵢ₋₁ + mᵢ`.
pub fn mimc_hash(inputs: &[Fr]) -> Fr {
    inputs.iter().fold(Fr::zero(), |h, m| encrypt(h, *m) + h + m)
}

/// Byte-level entry point: each input is a canonical big-endian field element.
pub fn mimc_hash_bytes(inputs: &[[u8; FIELD_BYTES]]) -> ZkResult<[u8; FIELD_BYTES]> {
    let elements = inputs
        .iter()
        .map(|bytes| fr_from_bytes(bytes))
        .collect::<ZkResult<Vec<_>>>()?;
    Ok(fr_to_bytes(&mimc_hash(&elements)))
}
