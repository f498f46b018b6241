use crate::field::Fr;
use crate::mimc::mimc_hash;
use crate::{ZkError, ZkResult};
use ark_ff::Zero;

pub const MERKLE_TREE_DEPTH: usize = 20;

/// `z₀ = MiMC(0)`, `zᵢ = MiMC(zᵢ₋₁, zᵢ₋₁)`; `depth + 1` entries.
pub fn zero_hashes(depth: usize) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(depth + 1);
    let mut current = mimc_hash(&[Fr::zero()]);
    zeros.push(current);
    for _ in 0..depth {
        current = mimc_hash(&[current, current]);
        zeros.push(current);
    }
    zeros
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Fr>,
    /// 0 when the running node is the left child at that level.
    pub path_indices: Vec<u8>,
}

/// Sparse fixed-depth tree. Only populated nodes are materialised; a
/// trailing odd node pairs with the zero hash of its level.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: usize,
    levels: Vec<Vec<Fr>>,
    zeros: Vec<Fr>,
}

impl MerkleTree {
    pub fn build_from_leaves(depth: usize, leaves: &[Fr]) -> ZkResult<Self> {
        let capacity = 1usize.checked_shl(depth as u32).unwrap_or(usize::MAX);
        if leaves.len() > capacity {
            return Err(ZkError::TreeFull(leaves.len()));
        }
        let zeros = zero_hashes(depth);
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves.to_vec());
        for level in 0..depth {
            let nodes = &levels[level];
            let next = nodes
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(zeros[level]);
                    mimc_hash(&[pair[0], right])
                })
                .collect();
            levels.push(next);
        }
        Ok(Self {
            depth,
            levels,
            zeros,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn root(&self) -> Fr {
        self.levels[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.depth])
    }

    pub fn generate_proof(&self, index: usize) -> ZkResult<MerkleProof> {
        if index >= self.len() {
            return Err(ZkError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut idx = index;
        for level in 0..self.depth {
            let sibling = self.levels[level]
                .get(idx ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(sibling);
            path_indices.push((idx & 1) as u8);
            idx >>= 1;
        }
        Ok(MerkleProof {
            siblings,
            path_indices,
        })
    }
}

/// Recomputes the root from `leaf` along the path and compares.
pub fn verify_proof(root: &Fr, leaf: &Fr, siblings: &[Fr], path_indices: &[u8]) -> bool {
    if siblings.len() != path_indices.len() {
        return false;
    }
    let mut current = *leaf;
    for (sibling, bit) in siblings.iter().zip(path_indices) {
        current = match bit {
            0 => mimc_hash(&[current, *sibling]),
            1 => mimc_hash(&[*sibling, current]),
            _ => return false,
        };
    }
    current == *root
}
