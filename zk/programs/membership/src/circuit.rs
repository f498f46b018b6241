use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use zk_core::{round_constants, Fr, MERKLE_TREE_DEPTH};

/// In-circuit MiMC; same rounds and constants as `zk_core::mimc_hash`.
pub fn mimc_gadget(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let constants = round_constants();
    let mut h = FpVar::<Fr>::zero();
    for m in inputs {
        let mut x = m.clone();
        for c in constants {
            let t = &x + &h + *c;
            let t2 = t.square()?;
            let t4 = t2.square()?;
            x = &t4 * &t;
        }
        h = &x + &h + &h + m;
    }
    Ok(h)
}

/// Proves knowledge of an identity secret whose commitment sits in the tree
/// under `merkle_root`, and that `nullifier_hash` was derived from it for
/// `external_nullifier`.
///
/// Public inputs, in allocation order: `merkle_root`, `nullifier_hash`,
/// `external_nullifier`.
#[derive(Debug, Clone)]
pub struct MembershipCircuit {
    pub merkle_root: Fr,
    pub nullifier_hash: Fr,
    pub external_nullifier: Fr,
    pub identity_secret: Fr,
    pub siblings: Vec<Fr>,
    pub path_indices: Vec<bool>,
}

impl MembershipCircuit {
    /// Shape-only instance for key generation.
    pub fn blank() -> Self {
        Self {
            merkle_root: Fr::from(0u64),
            nullifier_hash: Fr::from(0u64),
            external_nullifier: Fr::from(0u64),
            identity_secret: Fr::from(0u64),
            siblings: vec![Fr::from(0u64); MERKLE_TREE_DEPTH],
            path_indices: vec![false; MERKLE_TREE_DEPTH],
        }
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.siblings.len() != MERKLE_TREE_DEPTH
            || self.path_indices.len() != MERKLE_TREE_DEPTH
        {
            return Err(SynthesisError::Unsatisfiable);
        }

        let root = FpVar::new_input(cs.clone(), || Ok(self.merkle_root))?;
        let nullifier_hash = FpVar::new_input(cs.clone(), || Ok(self.nullifier_hash))?;
        let external_nullifier = FpVar::new_input(cs.clone(), || Ok(self.external_nullifier))?;
        let secret = FpVar::new_witness(cs.clone(), || Ok(self.identity_secret))?;

        let mut node = mimc_gadget(&[secret.clone()])?;
        for (sibling, is_right) in self.siblings.iter().zip(&self.path_indices) {
            let sibling = FpVar::new_witness(cs.clone(), || Ok(*sibling))?;
            // Boolean witnesses carry their own b·(1−b)=0 constraint.
            let is_right = Boolean::new_witness(cs.clone(), || Ok(*is_right))?;
            let left = FpVar::conditionally_select(&is_right, &sibling, &node)?;
            let right = FpVar::conditionally_select(&is_right, &node, &sibling)?;
            node = mimc_gadget(&[left, right])?;
        }
        node.enforce_equal(&root)?;

        let derived = mimc_gadget(&[secret, external_nullifier])?;
        derived.enforce_equal(&nullifier_hash)?;
        Ok(())
    }
}
